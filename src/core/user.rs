//! User business logic - Accounts, balances and per-user statistics.
//!
//! Balances are only touched through [`credit_balance_atomic`] and
//! [`debit_balance_atomic`], which express the change as a single SQL
//! `UPDATE ... SET balance_cents = balance_cents ± n` so concurrent requests cannot
//! lose an update.

use crate::{
    entities::{
        SubmissionStatus, TaskSubmission, TransactionType, User, task_submission, user,
    },
    errors::{Error, Result},
};
use sea_orm::{Set, SqlErr, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::ValidateEmail;

/// Input for [`create_user`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// A user together with their earnings and submission counters.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    #[serde(flatten)]
    pub user: user::Model,
    /// Sum of all `earning` transactions, in cents
    pub total_earnings_cents: i64,
    /// Number of approved submissions
    pub total_tasks_completed: u64,
    /// Number of submissions still waiting for review
    pub pending_tasks: u64,
}

/// Creates a regular (non-admin) user with a zero balance.
///
/// # Errors
/// Returns `Error::Validation` if the username is shorter than 3 characters or the
/// email is malformed, and `Error::AlreadyExists` if either is already taken.
#[instrument(skip(db))]
pub async fn create_user<C>(db: &C, new_user: NewUser) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let username = new_user.username.trim().to_string();
    if username.chars().count() < 3 {
        return Err(Error::validation("Username must be at least 3 characters"));
    }
    let email = new_user.email.trim().to_string();
    if !email.validate_email() {
        return Err(Error::validation("Please enter a valid email"));
    }

    let user = user::ActiveModel {
        username: Set(username.clone()),
        email: Set(email.clone()),
        country: Set(new_user.country),
        is_admin: Set(false),
        balance_cents: Set(0),
        pending_balance_cents: Set(0),
        total_tasks: Set(0),
        rank: Set(None),
        is_top_worker: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| match e.sql_err() {
        // SQLite names the violated column, e.g. "UNIQUE constraint failed: users.email"
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("email") => {
            Error::AlreadyExists {
                entity: "User",
                field: "email",
                value: email,
            }
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::AlreadyExists {
            entity: "User",
            field: "username",
            value: username,
        },
        _ => Error::Database(e),
    })?;

    info!(user_id = user.id, "Created user {}", user.username);
    Ok(user)
}

/// Finds a user by id, returning `None` if it does not exist.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Like [`get_user_by_id`] but treats a missing user as `Error::NotFound`.
pub async fn require_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    get_user_by_id(db, user_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "User",
            id: user_id,
        })
}

/// Atomically adds `amount_cents` to a user's balance.
///
/// Executes `UPDATE users SET balance_cents = balance_cents + ? WHERE id = ?`.
pub async fn credit_balance_atomic<C>(db: &C, user_id: i64, amount_cents: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    if amount_cents <= 0 {
        return Err(Error::validation("Credit amount must be positive"));
    }

    let result = User::update_many()
        .col_expr(
            user::Column::BalanceCents,
            Expr::col(user::Column::BalanceCents).add(amount_cents),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "User",
            id: user_id,
        });
    }
    Ok(())
}

/// Atomically subtracts `amount_cents` from a user's balance if it is large enough.
///
/// The sufficiency check is part of the same statement
/// (`... WHERE id = ? AND balance_cents >= ?`), so the balance can never go negative
/// even when two debits race.
///
/// # Errors
/// `Error::InsufficientBalance` if the balance is too small, `Error::NotFound` if the
/// user does not exist.
pub async fn debit_balance_atomic<C>(db: &C, user_id: i64, amount_cents: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    if amount_cents <= 0 {
        return Err(Error::validation("Debit amount must be positive"));
    }

    let result = User::update_many()
        .col_expr(
            user::Column::BalanceCents,
            Expr::col(user::Column::BalanceCents).sub(amount_cents),
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::BalanceCents.gte(amount_cents))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let user = require_user(db, user_id).await?;
        return Err(Error::InsufficientBalance {
            current: user.balance_cents,
            required: amount_cents,
        });
    }
    Ok(())
}

/// Bumps the approved-task counter of a worker by one.
pub(crate) async fn increment_total_tasks<C>(db: &C, user_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    User::update_many()
        .col_expr(
            user::Column::TotalTasks,
            Expr::col(user::Column::TotalTasks).add(1),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Returns the user with total earnings and approved/pending submission counts.
pub async fn get_user_stats(db: &DatabaseConnection, user_id: i64) -> Result<UserStats> {
    let user = require_user(db, user_id).await?;

    let total_earnings_cents =
        crate::core::transaction::sum_for_user(db, user_id, TransactionType::Earning).await?;

    let total_tasks_completed = TaskSubmission::find()
        .filter(task_submission::Column::WorkerId.eq(user_id))
        .filter(task_submission::Column::Status.eq(SubmissionStatus::Approved))
        .count(db)
        .await?;

    let pending_tasks = TaskSubmission::find()
        .filter(task_submission::Column::WorkerId.eq(user_id))
        .filter(task_submission::Column::Status.eq(SubmissionStatus::Pending))
        .count(db)
        .await?;

    Ok(UserStats {
        user,
        total_earnings_cents,
        total_tasks_completed,
        pending_tasks,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_user(
            &db,
            NewUser {
                username: "ab".to_string(),
                email: "ab@example.com".to_string(),
                country: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_user(
            &db,
            NewUser {
                username: "worker".to_string(),
                email: "not-an-email".to_string(),
                country: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "worker1").await?;

        assert_eq!(user.username, "worker1");
        assert_eq!(user.balance_cents, 0);
        assert!(!user.is_admin);
        assert_eq!(get_user_by_id(&db, user.id).await?, Some(user));
        assert!(get_user_by_id(&db, 999).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_username_fails() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "worker1").await?;
        let result = create_user(
            &db,
            NewUser {
                username: "worker1".to_string(),
                email: "other@example.com".to_string(),
                country: None,
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::AlreadyExists {
                field: "username",
                ..
            })
        ));

        let result = create_user(
            &db,
            NewUser {
                username: "worker2".to_string(),
                email: "worker1@example.com".to_string(),
                country: None,
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::AlreadyExists { field: "email", .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_and_debit_balance() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_funded_user(&db, "worker1", 1_500).await?;

        credit_balance_atomic(&db, user.id, 250).await?;
        assert_eq!(require_user(&db, user.id).await?.balance_cents, 1_750);

        debit_balance_atomic(&db, user.id, 1_750).await?;
        assert_eq!(require_user(&db, user.id).await?.balance_cents, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_debit_never_goes_negative() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_funded_user(&db, "worker1", 1_500).await?;

        let result = debit_balance_atomic(&db, user.id, 2_000).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientBalance {
                current: 1_500,
                required: 2_000
            })
        ));
        assert_eq!(require_user(&db, user.id).await?.balance_cents, 1_500);
        Ok(())
    }

    #[tokio::test]
    async fn test_balance_updates_on_missing_user() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            credit_balance_atomic(&db, 42, 100).await,
            Err(Error::NotFound { entity: "User", id: 42 })
        ));
        assert!(matches!(
            debit_balance_atomic(&db, 42, 100).await,
            Err(Error::NotFound { entity: "User", id: 42 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_user_stats_for_new_user() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "worker1").await?;

        let stats = get_user_stats(&db, user.id).await?;
        assert_eq!(stats.total_earnings_cents, 0);
        assert_eq!(stats.total_tasks_completed, 0);
        assert_eq!(stats.pending_tasks, 0);
        Ok(())
    }
}
