//! Incoming payments from task creators.
//!
//! Payment capture happens upstream at the provider; this module only records the
//! settled payment and its ledger entry.

use crate::{
    core::{money::format_cents, task as task_core, transaction, user},
    entities::{Payment, PaymentMethod, PaymentStatus, TransactionType, payment},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for [`create_payment`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    #[serde(default)]
    pub task_id: Option<i64>,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    /// Provider reference, unique across payments
    #[serde(default)]
    pub external_reference: Option<String>,
}

/// Records a completed payment and appends a `payment` ledger entry.
///
/// # Errors
/// `Error::Validation` for a non-positive amount or a reused provider reference,
/// `Error::NotFound` for an unknown payer or task.
#[instrument(skip(db, new_payment), fields(amount_cents = new_payment.amount_cents))]
pub async fn create_payment(
    db: &DatabaseConnection,
    user_id: i64,
    new_payment: NewPayment,
) -> Result<payment::Model> {
    if new_payment.amount_cents <= 0 {
        return Err(Error::validation("Payment amount must be positive"));
    }

    let txn = db.begin().await?;

    user::require_user(&txn, user_id).await?;
    if let Some(task_id) = new_payment.task_id {
        task_core::require_task(&txn, task_id).await?;
    }

    let saved = payment::ActiveModel {
        user_id: Set(user_id),
        task_id: Set(new_payment.task_id),
        amount_cents: Set(new_payment.amount_cents),
        payment_method: Set(new_payment.payment_method),
        status: Set(PaymentStatus::Completed),
        external_reference: Set(new_payment.external_reference),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            Error::validation("Payment reference was already recorded")
        }
        _ => Error::Database(e),
    })?;

    let description = match saved.task_id {
        Some(task_id) => format!(
            "Payment of {} for task #{task_id}",
            format_cents(saved.amount_cents)
        ),
        None => format!("Payment of {}", format_cents(saved.amount_cents)),
    };
    transaction::record_transaction(
        &txn,
        user_id,
        TransactionType::Payment,
        saved.amount_cents,
        description,
        Some(saved.id),
    )
    .await?;

    txn.commit().await?;

    info!(payment_id = saved.id, user_id, "Payment recorded");
    Ok(saved)
}

/// Lists a user's payments, newest first.
pub async fn get_payments_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(payment::Column::UserId.eq(user_id))
        .order_by_desc(payment::Column::CreatedAt)
        .order_by_desc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn payment_for(task_id: Option<i64>, reference: Option<&str>) -> NewPayment {
        NewPayment {
            task_id,
            amount_cents: 200,
            payment_method: PaymentMethod::Payoneer,
            external_reference: reference.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_payment_records_ledger_entry() -> Result<()> {
        let (db, creator, _worker, task) = setup_with_task().await?;

        let spec = payment_for(Some(task.id), Some("PAY-1"));
        let paid = create_payment(&db, creator.id, spec).await?;
        assert_eq!(paid.status, PaymentStatus::Completed);

        let ledger =
            transaction::get_transactions_for_related(&db, TransactionType::Payment, paid.id)
                .await?;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].amount_cents, 200);
        assert_eq!(ledger[0].user_id, creator.id);

        // The creator's spendable balance is not touched
        assert_eq!(user::require_user(&db, creator.id).await?.balance_cents, 0);
        assert_eq!(get_payments_for_user(&db, creator.id).await?, vec![paid]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_payment_validation() -> Result<()> {
        let (db, creator, _worker, task) = setup_with_task().await?;

        let zero = create_payment(
            &db,
            creator.id,
            NewPayment {
                amount_cents: 0,
                ..payment_for(None, None)
            },
        )
        .await;
        assert!(matches!(zero, Err(Error::Validation { .. })));

        let unknown_task = create_payment(&db, creator.id, payment_for(Some(999), None)).await;
        assert!(matches!(unknown_task, Err(Error::NotFound { entity: "Task", .. })));

        create_payment(&db, creator.id, payment_for(Some(task.id), Some("PAY-1"))).await?;
        let reused =
            create_payment(&db, creator.id, payment_for(Some(task.id), Some("PAY-1"))).await;
        assert!(matches!(reused, Err(Error::Validation { .. })));

        assert_eq!(
            transaction::sum_for_user(&db, creator.id, TransactionType::Payment).await?,
            200
        );
        Ok(())
    }
}
