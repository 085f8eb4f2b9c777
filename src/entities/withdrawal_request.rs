//! Withdrawal request entity - A worker asking to cash out part of their balance.
//!
//! The balance is debited when the request is opened. Rejection refunds it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payout channel chosen by the worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "payoneer")]
    Payoneer,
    #[sea_orm(string_value = "wise")]
    Wise,
    #[sea_orm(string_value = "skrill")]
    Skrill,
    #[sea_orm(string_value = "neteller")]
    Neteller,
    #[sea_orm(string_value = "western_union")]
    WesternUnion,
    #[sea_orm(string_value = "moneygram")]
    Moneygram,
    #[sea_orm(string_value = "xoom")]
    Xoom,
    #[sea_orm(string_value = "bank")]
    Bank,
    #[sea_orm(string_value = "crypto")]
    Crypto,
}

/// Processing state of a withdrawal request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// Waiting for an admin
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Paid out
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Refused and refunded
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Withdrawal request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "withdrawal_requests")]
pub struct Model {
    /// Unique identifier for the request
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User cashing out
    pub user_id: i64,
    /// Requested amount in cents
    pub amount_cents: i64,
    /// Payout channel
    pub payment_method: PaymentMethod,
    /// Channel-specific account details, stored as given
    pub payment_details: Json,
    /// Optional note from the user
    pub notes: Option<String>,
    /// Current processing state
    pub status: WithdrawalStatus,
    /// When the request was opened
    pub created_at: DateTimeUtc,
    /// When an admin approved or rejected the request
    pub processed_at: Option<DateTimeUtc>,
}

/// Defines relationships between `WithdrawalRequest` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each request belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
