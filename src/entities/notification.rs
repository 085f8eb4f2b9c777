//! Notification entity - Side-effect records read by the notification bell.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What the notification is about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// A worker submitted proof on the recipient's task
    #[sea_orm(string_value = "submission")]
    Submission,
    /// The recipient's submission was approved
    #[sea_orm(string_value = "approval")]
    Approval,
    /// The recipient's submission was rejected
    #[sea_orm(string_value = "rejection")]
    Rejection,
    /// The recipient received a message
    #[sea_orm(string_value = "message")]
    Message,
    /// The recipient's withdrawal request was processed
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
}

/// Notification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recipient
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub content: String,
    /// Id of the submission, message or withdrawal this refers to
    pub related_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
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
