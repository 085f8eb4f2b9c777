//! Transaction business logic - The append-only money ledger.
//!
//! Ledger rows are written by the review and settlement operations inside the same
//! database transaction as the balance change they describe. Nothing here updates or
//! deletes a row.

use crate::{
    entities::{Transaction, TransactionType, transaction},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Appends a ledger entry.
///
/// # Arguments
/// * `user_id` - User whose balance moved
/// * `transaction_type` - Direction and cause of the movement
/// * `amount_cents` - Size of the movement, must be positive
/// * `description` - Human-readable description
/// * `related_id` - Submission, withdrawal request or payment behind the entry
pub async fn record_transaction<C>(
    db: &C,
    user_id: i64,
    transaction_type: TransactionType,
    amount_cents: i64,
    description: String,
    related_id: Option<i64>,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    if amount_cents <= 0 {
        return Err(Error::validation(format!(
            "Ledger amounts must be positive, got {amount_cents}"
        )));
    }

    let model = transaction::ActiveModel {
        user_id: Set(user_id),
        transaction_type: Set(transaction_type),
        amount_cents: Set(amount_cents),
        description: Set(description),
        related_id: Set(related_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Retrieves a user's ledger, newest first, optionally restricted to one type.
pub async fn get_transactions_for_user(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_type: Option<TransactionType>,
) -> Result<Vec<transaction::Model>> {
    let mut query = Transaction::find().filter(transaction::Column::UserId.eq(user_id));
    if let Some(transaction_type) = transaction_type {
        query = query.filter(transaction::Column::TransactionType.eq(transaction_type));
    }

    query
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds all ledger entries that reference `related_id` with the given type.
pub async fn get_transactions_for_related<C>(
    db: &C,
    transaction_type: TransactionType,
    related_id: i64,
) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::TransactionType.eq(transaction_type))
        .filter(transaction::Column::RelatedId.eq(related_id))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sums a user's entries of one type, in cents.
pub async fn sum_for_user(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_type: TransactionType,
) -> Result<i64> {
    let total: Option<i64> = Transaction::find()
        .select_only()
        .column_as(transaction::Column::AmountCents.sum(), "total")
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::TransactionType.eq(transaction_type))
        .into_tuple::<Option<i64>>()
        .one(db)
        .await?
        .flatten();
    Ok(total.unwrap_or(0))
}
