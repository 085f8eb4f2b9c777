use super::{AppState, auth::AuthUser, extract::ApiJson};
use crate::{
    core::referral::{self, NewReferral},
    entities::ReferralModel,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

pub async fn create_referral(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(new_referral): ApiJson<NewReferral>,
) -> Result<(StatusCode, Json<ReferralModel>)> {
    let created = referral::create_referral(&state.db, caller.0, new_referral).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Admin only.
pub async fn mark_commission_paid(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(referral_id): Path<i64>,
) -> Result<Json<ReferralModel>> {
    if !caller.load(&state.db).await?.is_admin {
        return Err(Error::unauthorized("only admins can settle commissions"));
    }
    Ok(Json(
        referral::mark_commission_paid(&state.db, referral_id).await?,
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::api::test_support::*;
    use crate::entities::ReferralModel;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_referral_routes() {
        let (server, db) = test_server().await;
        let alice = create_test_user(&db, "alice").await.unwrap();
        let bob = create_test_user(&db, "bob").await.unwrap();
        let admin = create_admin_user(&db, "admin").await.unwrap();

        let (name, value) = as_user(alice.id);
        let response = server
            .post("/api/referrals")
            .add_header(name, value)
            .json(&json!({ "referred_id": bob.id, "commission_cents": 25 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ReferralModel = response.json();

        let path = format!("/api/referrals/{}/paid", created.id);
        let (name, value) = as_user(alice.id);
        server
            .patch(&path)
            .add_header(name, value)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let (name, value) = as_user(admin.id);
        let paid: ReferralModel = server.patch(&path).add_header(name, value).await.json();
        assert!(paid.commission_paid);

        let (name, value) = as_user(admin.id);
        server
            .patch(&path)
            .add_header(name, value)
            .await
            .assert_status(StatusCode::CONFLICT);
    }
}
