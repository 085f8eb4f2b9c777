//! Referral entity - Records who brought a new user to the marketplace.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Referral database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub referrer_id: i64,
    /// A user can only be referred once
    #[sea_orm(unique)]
    pub referred_id: i64,
    pub commission_paid: bool,
    pub commission_cents: Option<i64>,
    pub created_at: DateTimeUtc,
    pub paid_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
