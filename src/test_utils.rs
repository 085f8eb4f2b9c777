//! Shared test utilities for `TaskMarket`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        task::{self, TaskSpec},
        user::{self, NewUser},
    },
    entities::{self, TaskType},
    errors::{Error, Result},
};
use sea_orm::{ActiveModelTrait, ConnectOptions, DatabaseConnection, Set};
use std::future::Future;
use tempfile::TempDir;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database behind a pool of several connections.
///
/// `sqlite::memory:` runs on a single connection, so concurrent operations on it
/// are serialized. Use this setup when requests must really overlap. The database
/// lives as long as the returned directory.
pub async fn setup_shared_test_db() -> Result<(DatabaseConnection, TempDir)> {
    init_test_tracing();
    let dir = tempfile::tempdir()?;
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("taskmarket.db").display()
    );
    let mut options = ConnectOptions::new(url);
    options.max_connections(8).min_connections(2);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((db, dir))
}

/// Re-runs `op` while it fails with a database error, the way a client retries
/// after `SQLITE_BUSY`. Business errors are returned immediately.
pub async fn retry_when_busy<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for _ in 0..20 {
        match op().await {
            Err(Error::Database(e)) => {
                tracing::debug!("Retrying after database error: {e}");
                tokio::task::yield_now().await;
            }
            other => return other,
        }
    }
    op().await
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Creates a regular user named `username` with a zero balance.
///
/// # Defaults
/// * `email`: `"<username>@example.com"`
/// * `country`: None
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    user::create_user(
        db,
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            country: None,
        },
    )
    .await
}

/// Creates a user with the admin flag set.
pub async fn create_admin_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    let created = create_test_user(db, username).await?;
    let mut active: entities::user::ActiveModel = created.into();
    active.is_admin = Set(true);
    Ok(active.update(db).await?)
}

/// Creates a user whose balance starts at `balance_cents`.
pub async fn create_funded_user(
    db: &DatabaseConnection,
    username: &str,
    balance_cents: i64,
) -> Result<entities::user::Model> {
    let created = create_test_user(db, username).await?;
    let mut active: entities::user::ActiveModel = created.into();
    active.balance_cents = Set(balance_cents);
    Ok(active.update(db).await?)
}

/// A valid task specification of the given type.
///
/// # Defaults
/// * `quantity`: 100
/// * `price_per_task_cents`: 2 ($0.02, so the total is $2.00)
/// * `url`: `"https://youtube.com/@example"`
pub fn test_task_spec(task_type: TaskType) -> TaskSpec {
    TaskSpec {
        title: "Subscribe to channel".to_string(),
        description: "Subscribe and send a screenshot as proof".to_string(),
        task_type,
        platform: "youtube".to_string(),
        url: "https://youtube.com/@example".to_string(),
        quantity: 100,
        price_per_task_cents: 2,
        image_url: None,
        expires_at: None,
    }
}

/// Creates a task from [`test_task_spec`] owned by `creator_id`.
pub async fn create_test_task(
    db: &DatabaseConnection,
    creator_id: i64,
) -> Result<entities::task::Model> {
    task::create_task(db, creator_id, test_task_spec(TaskType::Subscribe)).await
}

/// Sets up a creator, a worker and one active task.
/// Returns (db, creator, worker, task) for submission-related tests.
pub async fn setup_with_task() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::user::Model,
    entities::task::Model,
)> {
    let db = setup_test_db().await?;
    let creator = create_test_user(&db, "creator").await?;
    let worker = create_test_user(&db, "worker").await?;
    let task = create_test_task(&db, creator.id).await?;
    Ok((db, creator, worker, task))
}
