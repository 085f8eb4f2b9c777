//! Withdrawal settlement - Cashing out earned balance.
//!
//! Opening a request debits the balance right away, so the same money cannot be
//! requested twice. An admin then approves (money leaves the platform) or rejects
//! (the amount is refunded with a `refund` ledger entry).

use crate::{
    config::MarketplaceConfig,
    core::{money::format_cents, notification, transaction, user},
    entities::{
        NotificationType, PaymentMethod, TransactionType, WithdrawalRequest, WithdrawalStatus,
        withdrawal_request,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Input for [`request_withdrawal`].
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalSpec {
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_details: serde_json::Value,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Admin verdict on a pending withdrawal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalOutcome {
    Approved,
    Rejected,
}

/// Opens a withdrawal request.
///
/// In one database transaction the balance is debited, a `pending` request is stored
/// and a `withdrawal` ledger entry is appended.
///
/// # Errors
/// - `Error::BelowMinimum` if the amount is under the configured minimum
/// - `Error::Validation` if the payment details are not a JSON object
/// - `Error::InsufficientBalance` if the user cannot cover the amount
/// - `Error::NotFound` if the user does not exist
#[instrument(skip(db, rules, spec), fields(amount_cents = spec.amount_cents))]
pub async fn request_withdrawal(
    db: &DatabaseConnection,
    rules: &MarketplaceConfig,
    user_id: i64,
    spec: WithdrawalSpec,
) -> Result<withdrawal_request::Model> {
    if spec.amount_cents < rules.min_withdrawal_cents {
        return Err(Error::BelowMinimum {
            amount: spec.amount_cents,
            minimum: rules.min_withdrawal_cents,
        });
    }
    if !spec.payment_details.is_object() {
        return Err(Error::validation("Payment details must be a JSON object"));
    }

    let txn = db.begin().await?;

    user::debit_balance_atomic(&txn, user_id, spec.amount_cents).await?;

    let request = withdrawal_request::ActiveModel {
        user_id: Set(user_id),
        amount_cents: Set(spec.amount_cents),
        payment_method: Set(spec.payment_method),
        payment_details: Set(spec.payment_details),
        notes: Set(spec.notes.filter(|n| !n.trim().is_empty())),
        status: Set(WithdrawalStatus::Pending),
        created_at: Set(Utc::now()),
        processed_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    transaction::record_transaction(
        &txn,
        user_id,
        TransactionType::Withdrawal,
        request.amount_cents,
        format!(
            "Withdrawal request via {:?} for {}",
            request.payment_method,
            format_cents(request.amount_cents)
        ),
        Some(request.id),
    )
    .await?;

    txn.commit().await?;

    info!(withdrawal_id = request.id, user_id, "Withdrawal requested");
    Ok(request)
}

/// Approves or rejects a pending withdrawal request.
///
/// Rejection refunds the amount and appends a `refund` ledger entry. Either way the
/// user receives a `withdrawal` notification.
///
/// # Errors
/// - `Error::Unauthorized` if `admin_id` is not an admin
/// - `Error::NotFound` if the request does not exist
/// - `Error::AlreadyProcessed` if the request is no longer pending
#[instrument(skip(db))]
pub async fn process_withdrawal(
    db: &DatabaseConnection,
    admin_id: i64,
    withdrawal_id: i64,
    outcome: WithdrawalOutcome,
) -> Result<withdrawal_request::Model> {
    let txn = db.begin().await?;

    let admin = user::require_user(&txn, admin_id).await?;
    if !admin.is_admin {
        warn!(admin_id, withdrawal_id, "Non-admin tried to process a withdrawal");
        return Err(Error::unauthorized("only admins can process withdrawals"));
    }

    let request = WithdrawalRequest::find_by_id(withdrawal_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Withdrawal",
            id: withdrawal_id,
        })?;

    let status = match outcome {
        WithdrawalOutcome::Approved => WithdrawalStatus::Approved,
        WithdrawalOutcome::Rejected => WithdrawalStatus::Rejected,
    };
    let transition = WithdrawalRequest::update_many()
        .set(withdrawal_request::ActiveModel {
            status: Set(status),
            processed_at: Set(Some(Utc::now())),
            ..Default::default()
        })
        .filter(withdrawal_request::Column::Id.eq(withdrawal_id))
        .filter(withdrawal_request::Column::Status.eq(WithdrawalStatus::Pending))
        .exec(&txn)
        .await?;
    if transition.rows_affected == 0 {
        return Err(Error::AlreadyProcessed {
            entity: "Withdrawal",
            id: withdrawal_id,
        });
    }

    let amount = format_cents(request.amount_cents);
    let content = match outcome {
        WithdrawalOutcome::Approved => {
            format!("Your withdrawal of {amount} has been approved and is on its way")
        }
        WithdrawalOutcome::Rejected => {
            user::credit_balance_atomic(&txn, request.user_id, request.amount_cents).await?;
            transaction::record_transaction(
                &txn,
                request.user_id,
                TransactionType::Refund,
                request.amount_cents,
                format!("Refund of rejected withdrawal #{withdrawal_id}"),
                Some(withdrawal_id),
            )
            .await?;
            format!("Your withdrawal of {amount} was rejected and refunded to your balance")
        }
    };
    notification::notify(
        &txn,
        request.user_id,
        NotificationType::Withdrawal,
        content,
        Some(withdrawal_id),
    )
    .await?;

    let processed = WithdrawalRequest::find_by_id(withdrawal_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Withdrawal",
            id: withdrawal_id,
        })?;
    txn.commit().await?;

    info!(withdrawal_id, status = ?processed.status, "Withdrawal processed");
    Ok(processed)
}

/// Lists a user's withdrawal requests, newest first.
pub async fn get_withdrawals_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<withdrawal_request::Model>> {
    WithdrawalRequest::find()
        .filter(withdrawal_request::Column::UserId.eq(user_id))
        .order_by_desc(withdrawal_request::Column::CreatedAt)
        .order_by_desc(withdrawal_request::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
