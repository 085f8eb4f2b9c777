//! Task submission entity - A worker's claim that they completed a task.
//!
//! Submissions start `pending` and move exactly once to `approved` or `rejected`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review state of a submission.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Waiting for the creator's review
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted and paid
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Refused, optionally with feedback
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Task submission database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task_submissions")]
pub struct Model {
    /// Unique identifier for the submission
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Task being claimed
    pub task_id: i64,
    /// Worker claiming completion
    pub worker_id: i64,
    /// Free-text proof (email used, screenshot link, ...)
    pub proof: String,
    /// Current review state
    pub status: SubmissionStatus,
    /// When the submission was made
    pub created_at: DateTimeUtc,
    /// Set once, when the submission leaves `pending`
    pub reviewed_at: Option<DateTimeUtc>,
    /// Reviewer's note, set on rejection
    pub feedback: Option<String>,
}

/// Defines relationships between `TaskSubmission` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each submission targets one task
    #[sea_orm(
        belongs_to = "super::task::Entity",
        from = "Column::TaskId",
        to = "super::task::Column::Id"
    )]
    Task,
    /// Each submission is made by one worker
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::WorkerId",
        to = "super::user::Column::Id"
    )]
    Worker,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Worker.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
