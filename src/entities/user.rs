//! User entity - Represents both task creators and workers.
//!
//! Monetary fields are integer cents. `balance_cents` is only ever changed through
//! atomic column expressions in `core::user`, never by writing a computed value.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across the marketplace
    #[sea_orm(unique)]
    pub username: String,
    /// Contact email, unique across the marketplace
    #[sea_orm(unique)]
    pub email: String,
    /// Optional country of residence
    pub country: Option<String>,
    /// Admins may review any submission and process withdrawals
    pub is_admin: bool,
    /// Withdrawable balance in cents, never negative
    pub balance_cents: i64,
    /// Balance awaiting clearance in cents, never negative
    pub pending_balance_cents: i64,
    /// Number of approved submissions credited to this user
    pub total_tasks: i32,
    /// Leaderboard rank, if ranked
    pub rank: Option<i32>,
    /// Whether the user is featured as a top worker
    pub is_top_worker: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Tasks created by this user
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
    /// Submissions made by this user as a worker
    #[sea_orm(has_many = "super::task_submission::Entity")]
    Submissions,
    /// Ledger entries for this user
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// Withdrawal requests opened by this user
    #[sea_orm(has_many = "super::withdrawal_request::Entity")]
    WithdrawalRequests,
    /// Notifications addressed to this user
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::task_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::withdrawal_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WithdrawalRequests.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
