//! Referral bookkeeping.
//!
//! Commission payout itself is settled outside the marketplace. Here it is only
//! flagged as paid.

use crate::{
    core::user,
    entities::{Referral, referral},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, SqlErr, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for [`create_referral`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewReferral {
    pub referred_id: i64,
    #[serde(default)]
    pub commission_cents: Option<i64>,
}

/// Records that `referrer_id` brought `referred_id` to the marketplace.
///
/// # Errors
/// `Error::Validation` for self-referral, a negative commission or a user that was
/// already referred. `Error::NotFound` if either user does not exist.
#[instrument(skip(db))]
pub async fn create_referral(
    db: &DatabaseConnection,
    referrer_id: i64,
    new_referral: NewReferral,
) -> Result<referral::Model> {
    if referrer_id == new_referral.referred_id {
        return Err(Error::validation("Users cannot refer themselves"));
    }
    if new_referral.commission_cents.is_some_and(|c| c < 0) {
        return Err(Error::validation("Commission cannot be negative"));
    }
    user::require_user(db, referrer_id).await?;
    user::require_user(db, new_referral.referred_id).await?;

    let saved = referral::ActiveModel {
        referrer_id: Set(referrer_id),
        referred_id: Set(new_referral.referred_id),
        commission_paid: Set(false),
        commission_cents: Set(new_referral.commission_cents),
        created_at: Set(Utc::now()),
        paid_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            Error::validation("This user was already referred")
        }
        _ => Error::Database(e),
    })?;

    info!(referral_id = saved.id, "Referral recorded");
    Ok(saved)
}

/// Flags a referral's commission as paid.
///
/// # Errors
/// `Error::AlreadyProcessed` if it was already paid.
pub async fn mark_commission_paid(
    db: &DatabaseConnection,
    referral_id: i64,
) -> Result<referral::Model> {
    let result = Referral::update_many()
        .set(referral::ActiveModel {
            commission_paid: Set(true),
            paid_at: Set(Some(Utc::now())),
            ..Default::default()
        })
        .filter(referral::Column::Id.eq(referral_id))
        .filter(referral::Column::CommissionPaid.eq(false))
        .exec(db)
        .await?;

    let current = Referral::find_by_id(referral_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Referral",
            id: referral_id,
        })?;
    if result.rows_affected == 0 {
        return Err(Error::AlreadyProcessed {
            entity: "Referral",
            id: referral_id,
        });
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_referral_rules() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;
        let carol = create_test_user(&db, "carol").await?;

        let own = create_referral(
            &db,
            alice.id,
            NewReferral {
                referred_id: alice.id,
                commission_cents: None,
            },
        )
        .await;
        assert!(matches!(own, Err(Error::Validation { .. })));

        let referral = create_referral(
            &db,
            alice.id,
            NewReferral {
                referred_id: bob.id,
                commission_cents: Some(50),
            },
        )
        .await?;
        assert!(!referral.commission_paid);

        let again = create_referral(
            &db,
            carol.id,
            NewReferral {
                referred_id: bob.id,
                commission_cents: None,
            },
        )
        .await;
        assert!(matches!(again, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_commission_paid_once() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;
        let referral = create_referral(
            &db,
            alice.id,
            NewReferral {
                referred_id: bob.id,
                commission_cents: Some(50),
            },
        )
        .await?;

        let paid = mark_commission_paid(&db, referral.id).await?;
        assert!(paid.commission_paid);
        assert!(paid.paid_at.is_some());

        let twice = mark_commission_paid(&db, referral.id).await;
        assert!(matches!(twice, Err(Error::AlreadyProcessed { .. })));

        let missing = mark_commission_paid(&db, 999).await;
        assert!(matches!(missing, Err(Error::NotFound { entity: "Referral", .. })));
        Ok(())
    }
}
