//! Database configuration module for `TaskMarket`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated with `Schema::create_table_from_entity` so the schema always
//! matches the entity definitions without hand-written DDL.

use crate::entities::{
    Message, Notification, Payment, Referral, Task, TaskSubmission, Transaction, User,
    WithdrawalRequest,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/taskmarket.sqlite?mode=rwc";

/// At most one open (pending or approved) submission per worker and task.
const OPEN_SUBMISSION_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     idx_task_submissions_open_per_worker ON task_submissions (task_id, worker_id) \
     WHERE status <> 'rejected'";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table_for<C, E>(db: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all marketplace tables from the entity definitions.
///
/// Safe to call on every startup; existing tables are left untouched.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    create_table_for(db, User).await?;
    create_table_for(db, Task).await?;
    create_table_for(db, TaskSubmission).await?;
    create_table_for(db, Transaction).await?;
    create_table_for(db, WithdrawalRequest).await?;
    create_table_for(db, Notification).await?;
    create_table_for(db, Message).await?;
    create_table_for(db, Payment).await?;
    create_table_for(db, Referral).await?;

    info!("Database tables ready");
    Ok(())
}

/// Adds the partial unique index that stops a worker from holding two open
/// submissions for the same task. Rejected submissions are excluded, so a worker
/// may try again after a rejection.
pub async fn create_submission_uniqueness_index<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    db.execute_unprepared(OPEN_SUBMISSION_INDEX).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{TaskModel, UserModel, WithdrawalRequestModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<TaskModel> = Task::find().limit(1).all(&db).await?;
        let _: Vec<WithdrawalRequestModel> = WithdrawalRequest::find().limit(1).all(&db).await?;
        let _ = Referral::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        create_submission_uniqueness_index(&db).await?;
        create_submission_uniqueness_index(&db).await?;
        Ok(())
    }
}
