//! Caller identity.
//!
//! Authentication happens in the proxy in front of this service, which forwards the
//! caller's numeric id in the `x-user-id` header.

use crate::{
    core::user,
    entities::user as user_entity,
    errors::{Error, Result},
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sea_orm::DatabaseConnection;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller. Rejects the request with 401 when the header is missing
/// or not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(Self)
            .ok_or(Error::Unauthenticated)
    }
}

impl AuthUser {
    /// Loads the caller's account. An id that matches no user is treated as
    /// unauthenticated.
    pub async fn load(self, db: &DatabaseConnection) -> Result<user_entity::Model> {
        user::get_user_by_id(db, self.0)
            .await?
            .ok_or(Error::Unauthenticated)
    }

    /// Succeeds when the caller is `owner_id` or an admin.
    pub async fn ensure_self_or_admin(self, db: &DatabaseConnection, owner_id: i64) -> Result<()> {
        if self.0 == owner_id {
            return Ok(());
        }
        if self.load(db).await?.is_admin {
            return Ok(());
        }
        Err(Error::unauthorized("this resource belongs to another user"))
    }
}
