//! Task lifecycle - Creating, listing and completing tasks.
//!
//! Tasks are created `active` with `completed_count = 0`. The only path that moves
//! `completed_count` is [`record_completion`], called by the submission review engine,
//! which increments it with a guarded SQL expression so it can never pass `quantity`.

use crate::{
    entities::{Task, TaskStatus, TaskType, task},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use validator::ValidateUrl;

/// Everything a creator provides when posting a task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSpec {
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub platform: String,
    pub url: String,
    pub quantity: i32,
    pub price_per_task_cents: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for [`update_task`]. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub image_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Listing parameters for [`get_tasks`].
#[derive(Debug, Clone)]
pub struct TaskFilter {
    /// Task types to include; empty means all types
    pub types: Vec<TaskType>,
    /// 1-based page number
    pub page: u64,
    /// Page size
    pub limit: u64,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            page: 1,
            limit: 10,
        }
    }
}

/// One page of a task listing.
#[derive(Debug, Clone, Serialize)]
pub struct TaskPage {
    pub tasks: Vec<task::Model>,
    /// Number of matching tasks. For multi-type listings this is the sum of the
    /// per-type totals.
    pub total: u64,
}

fn validate_spec(spec: &TaskSpec) -> Result<()> {
    if spec.title.trim().chars().count() < 3 {
        return Err(Error::validation("Title must be at least 3 characters"));
    }
    if spec.platform.trim().is_empty() {
        return Err(Error::validation("Platform is required"));
    }
    if spec.quantity < 1 {
        return Err(Error::validation("Quantity must be at least 1"));
    }
    if spec.price_per_task_cents <= 0 {
        return Err(Error::validation("Price per task must be greater than zero"));
    }
    validate_url(&spec.url)?;
    if let Some(image_url) = &spec.image_url {
        validate_url(image_url)?;
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    let has_web_scheme = url.starts_with("http://") || url.starts_with("https://");
    if !has_web_scheme || !url.validate_url() {
        return Err(Error::validation(format!("Please enter a valid URL: '{url}'")));
    }
    Ok(())
}

/// Creates a new active task owned by `creator_id`.
///
/// Validates the title, platform, quantity (≥ 1), price (> 0) and URL before anything
/// is written. The total price is fixed at creation as `quantity * price_per_task`.
///
/// # Errors
/// `Error::Validation` for malformed input, `Error::NotFound` for an unknown creator.
#[instrument(skip(db, spec), fields(task_type = ?spec.task_type))]
pub async fn create_task<C>(db: &C, creator_id: i64, spec: TaskSpec) -> Result<task::Model>
where
    C: ConnectionTrait,
{
    validate_spec(&spec)?;
    crate::core::user::require_user(db, creator_id).await?;

    let total_price_cents = i64::from(spec.quantity)
        .checked_mul(spec.price_per_task_cents)
        .ok_or_else(|| Error::validation("Total price is too large"))?;

    let task = task::ActiveModel {
        creator_id: Set(creator_id),
        title: Set(spec.title.trim().to_string()),
        description: Set(spec.description),
        task_type: Set(spec.task_type),
        platform: Set(spec.platform.trim().to_string()),
        url: Set(spec.url.trim().to_string()),
        quantity: Set(spec.quantity),
        completed_count: Set(0),
        price_per_task_cents: Set(spec.price_per_task_cents),
        total_price_cents: Set(total_price_cents),
        status: Set(TaskStatus::Active),
        image_url: Set(spec.image_url),
        created_at: Set(Utc::now()),
        expires_at: Set(spec.expires_at),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(task_id = task.id, creator_id, "Created task '{}'", task.title);
    Ok(task)
}

/// Finds a task by id. An unknown id is `Ok(None)`, not an error.
pub async fn get_task<C>(db: &C, task_id: i64) -> Result<Option<task::Model>>
where
    C: ConnectionTrait,
{
    Task::find_by_id(task_id).one(db).await.map_err(Into::into)
}

/// Like [`get_task`] but treats a missing task as `Error::NotFound`.
pub async fn require_task<C>(db: &C, task_id: i64) -> Result<task::Model>
where
    C: ConnectionTrait,
{
    get_task(db, task_id).await?.ok_or(Error::NotFound {
        entity: "Task",
        id: task_id,
    })
}

/// Row offset of a 1-based `page`. SQLite takes the offset as a signed 64-bit
/// integer, so anything past `i64::MAX` is out of range too.
fn page_offset(page: u64, limit: u64) -> Result<u64> {
    page.saturating_sub(1)
        .checked_mul(limit)
        .filter(|offset| i64::try_from(*offset).is_ok())
        .ok_or_else(|| Error::validation(format!("Page {page} is out of range")))
}

async fn fetch_page(
    db: &DatabaseConnection,
    task_type: Option<TaskType>,
    offset: u64,
    limit: u64,
) -> Result<TaskPage> {
    let mut query = Task::find();
    if let Some(task_type) = task_type {
        query = query.filter(task::Column::TaskType.eq(task_type));
    }

    let total = query.clone().count(db).await?;
    let tasks = query
        .order_by_desc(task::Column::CreatedAt)
        .order_by_desc(task::Column::Id)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;

    Ok(TaskPage { tasks, total })
}

/// Lists tasks newest first.
///
/// With zero or one requested type this is a single paginated query. With several
/// types, each type's page is fetched on its own, the pages are merged and re-sorted
/// by creation time, and the requested window is cut from the merged list. `total`
/// is then the sum of the per-type totals. Callers get correct ordering inside the
/// window, but the total and deep pages are approximate.
///
/// `page` and `limit` are clamped to at least 1 and `limit` to at most `max_page_size`.
///
/// # Errors
/// `Error::Validation` if `page` is so large that its row offset overflows.
#[instrument(skip(db))]
pub async fn get_tasks(
    db: &DatabaseConnection,
    filter: TaskFilter,
    max_page_size: u64,
) -> Result<TaskPage> {
    let page = filter.page.max(1);
    let limit = filter.limit.clamp(1, max_page_size.max(1));
    let offset = page_offset(page, limit)?;

    let mut types = filter.types;
    let mut seen = std::collections::HashSet::new();
    types.retain(|t| seen.insert(*t));

    if types.len() <= 1 {
        return fetch_page(db, types.first().copied(), offset, limit).await;
    }

    let mut merged = Vec::new();
    let mut total = 0;
    for task_type in types {
        let type_page = fetch_page(db, Some(task_type), offset, limit).await?;
        debug!(?task_type, fetched = type_page.tasks.len(), "Fetched page for type");
        merged.extend(type_page.tasks);
        total += type_page.total;
    }

    merged.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let start = usize::try_from(offset).unwrap_or(usize::MAX);
    let window = usize::try_from(limit).unwrap_or(usize::MAX);
    let tasks = merged.into_iter().skip(start).take(window).collect();

    Ok(TaskPage { tasks, total })
}

/// Lists the tasks a creator has posted, newest first.
pub async fn get_tasks_for_creator(
    db: &DatabaseConnection,
    creator_id: i64,
) -> Result<Vec<task::Model>> {
    Task::find()
        .filter(task::Column::CreatorId.eq(creator_id))
        .order_by_desc(task::Column::CreatedAt)
        .order_by_desc(task::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to a task.
///
/// No lifecycle rules are enforced here; `completed_count` is not patchable and only
/// moves through approved submissions.
///
/// # Errors
/// `Error::NotFound` for an unknown task, `Error::Validation` for a too-short title or
/// malformed image URL.
#[instrument(skip(db))]
pub async fn update_task(
    db: &DatabaseConnection,
    task_id: i64,
    patch: TaskPatch,
) -> Result<task::Model> {
    let existing = require_task(db, task_id).await?;
    let mut active: task::ActiveModel = existing.into();

    if let Some(title) = patch.title {
        if title.trim().chars().count() < 3 {
            return Err(Error::validation("Title must be at least 3 characters"));
        }
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = patch.description {
        active.description = Set(description);
    }
    if let Some(status) = patch.status {
        active.status = Set(status);
    }
    if let Some(image_url) = patch.image_url {
        validate_url(&image_url)?;
        active.image_url = Set(Some(image_url));
    }
    if let Some(expires_at) = patch.expires_at {
        active.expires_at = Set(Some(expires_at));
    }

    let updated = active.update(db).await?;
    info!(task_id, status = %updated.status, "Updated task");
    Ok(updated)
}

/// Counts one approved completion against a task.
///
/// The increment is one guarded statement, roughly
///
/// ```sql
/// UPDATE tasks SET completed_count = completed_count + 1
/// WHERE id = ? AND completed_count < quantity
/// ```
///
/// so concurrent approvals can neither lose an increment nor overshoot `quantity`.
/// When `auto_complete` is set and the last slot was just filled, the task moves to
/// `completed`.
///
/// # Errors
/// `Error::TaskFull` if the task already reached its quantity, `Error::NotFound` if
/// it does not exist.
pub async fn record_completion<C>(db: &C, task_id: i64, auto_complete: bool) -> Result<task::Model>
where
    C: ConnectionTrait,
{
    let result = Task::update_many()
        .col_expr(
            task::Column::CompletedCount,
            Expr::col(task::Column::CompletedCount).add(1),
        )
        .filter(task::Column::Id.eq(task_id))
        .filter(Expr::col(task::Column::CompletedCount).lt(Expr::col(task::Column::Quantity)))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let task = require_task(db, task_id).await?;
        warn!(task_id, quantity = task.quantity, "Task has no open slots left");
        return Err(Error::TaskFull {
            task_id,
            quantity: task.quantity,
        });
    }

    if auto_complete {
        let completed = Task::update_many()
            .set(task::ActiveModel {
                status: Set(TaskStatus::Completed),
                ..Default::default()
            })
            .filter(task::Column::Id.eq(task_id))
            .filter(task::Column::Status.eq(TaskStatus::Active))
            .filter(
                Expr::col(task::Column::CompletedCount).gte(Expr::col(task::Column::Quantity)),
            )
            .exec(db)
            .await?;
        if completed.rows_affected > 0 {
            info!(task_id, "Task reached its quantity and is now completed");
        }
    }

    require_task(db, task_id).await
}
