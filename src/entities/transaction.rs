//! Transaction entity - The append-only money ledger.
//!
//! Each row records one balance movement for a user. `amount_cents` is always positive;
//! the direction is implied by `transaction_type`. Rows are never updated or deleted.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of ledger movement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credit for an approved submission
    #[sea_orm(string_value = "earning")]
    Earning,
    /// Debit for a withdrawal request
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    /// Credit returning a rejected withdrawal
    #[sea_orm(string_value = "refund")]
    Refund,
    /// Creator paying for a task
    #[sea_orm(string_value = "payment")]
    Payment,
}

impl std::str::FromStr for TransactionType {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earning" => Ok(Self::Earning),
            "withdrawal" => Ok(Self::Withdrawal),
            "refund" => Ok(Self::Refund),
            "payment" => Ok(Self::Payment),
            other => Err(crate::errors::Error::validation(format!(
                "Unknown transaction type '{other}'"
            ))),
        }
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User whose balance moved
    pub user_id: i64,
    /// Direction and cause of the movement
    pub transaction_type: TransactionType,
    /// Size of the movement in cents, always positive
    pub amount_cents: i64,
    /// Human-readable description of the transaction
    pub description: String,
    /// Submission, withdrawal request or payment that caused this entry
    pub related_id: Option<i64>,
    /// When the transaction was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user
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
