//! Task entity - A paid job posted by a creator and completed by workers.
//!
//! A task asks for `quantity` completions at `price_per_task_cents` each.
//! `completed_count` only grows, one step per approved submission, and never
//! passes `quantity`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a worker is asked to do.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Subscribe to a channel
    #[sea_orm(string_value = "subscribe")]
    Subscribe,
    /// Like a post or video
    #[sea_orm(string_value = "like")]
    Like,
    /// Watch a video
    #[sea_orm(string_value = "watch")]
    Watch,
    /// Join a group or community
    #[sea_orm(string_value = "join")]
    Join,
    /// Sign up for a service
    #[sea_orm(string_value = "signup")]
    Signup,
    /// Install an app
    #[sea_orm(string_value = "app_download")]
    AppDownload,
    /// Write an app store review
    #[sea_orm(string_value = "app_review")]
    AppReview,
    /// Leave a five star rating
    #[sea_orm(string_value = "five_star")]
    FiveStar,
    /// Use an app for a minimum time
    #[sea_orm(string_value = "app_usage_time")]
    AppUsageTime,
    /// Small mobile development job
    #[sea_orm(string_value = "app_developer")]
    AppDeveloper,
    /// Small website development job
    #[sea_orm(string_value = "web_developer")]
    WebDeveloper,
}

impl std::str::FromStr for TaskType {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "subscribe" => Ok(Self::Subscribe),
            "like" => Ok(Self::Like),
            "watch" => Ok(Self::Watch),
            "join" => Ok(Self::Join),
            "signup" => Ok(Self::Signup),
            "app_download" => Ok(Self::AppDownload),
            "app_review" => Ok(Self::AppReview),
            "five_star" => Ok(Self::FiveStar),
            "app_usage_time" => Ok(Self::AppUsageTime),
            "app_developer" => Ok(Self::AppDeveloper),
            "web_developer" => Ok(Self::WebDeveloper),
            other => Err(crate::errors::Error::validation(format!(
                "Unknown task type '{other}'"
            ))),
        }
    }
}

/// Lifecycle of a task.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepting submissions
    #[sea_orm(string_value = "active")]
    Active,
    /// Reached its quantity or closed by the creator
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Withdrawn by the creator
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Task database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    /// Unique identifier for the task
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who posted and pays for the task
    pub creator_id: i64,
    /// Short headline shown in listings
    pub title: String,
    /// Instructions for the worker
    pub description: String,
    /// Kind of work requested
    pub task_type: TaskType,
    /// Platform the work happens on (youtube, facebook, play store, ...)
    pub platform: String,
    /// Link the worker should act on
    pub url: String,
    /// Number of completions wanted
    pub quantity: i32,
    /// Number of approved completions so far
    pub completed_count: i32,
    /// Reward per approved completion, in cents
    pub price_per_task_cents: i64,
    /// `quantity * price_per_task_cents` at creation time
    pub total_price_cents: i64,
    /// Current lifecycle state
    pub status: TaskStatus,
    /// Optional preview image
    pub image_url: Option<String>,
    /// When the task was posted
    pub created_at: DateTimeUtc,
    /// Optional deadline
    pub expires_at: Option<DateTimeUtc>,
}

/// Defines relationships between Task and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each task belongs to its creator
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatorId",
        to = "super::user::Column::Id"
    )]
    Creator,
    /// One task has many submissions
    #[sea_orm(has_many = "super::task_submission::Entity")]
    Submissions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::task_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
