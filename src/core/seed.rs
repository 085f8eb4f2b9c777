//! Seeds a fresh database with the users and tasks listed in config.toml.

use crate::{
    config::settings::{SeedConfig, SeedTask, SeedUser},
    core::{
        task::{self as task_core, TaskSpec},
        user::{self, NewUser},
    },
    entities::{TaskStatus, User, task, user as user_entity},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{info, instrument};

/// What [`seed_from_config`] inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub tasks: usize,
}

/// Inserts the configured seed data if the users table is empty.
///
/// All rows go in one database transaction: an invalid entry leaves the database
/// untouched.
///
/// # Errors
/// `Error::Config` for a seed task that names an unknown creator, and the usual
/// validation errors of [`user::create_user`] and [`task_core::create_task`].
#[instrument(skip_all)]
pub async fn seed_from_config(db: &DatabaseConnection, seed: &SeedConfig) -> Result<SeedReport> {
    if seed.users.is_empty() && seed.tasks.is_empty() {
        return Ok(SeedReport::default());
    }
    if User::find().count(db).await? > 0 {
        info!("Database already has users, skipping seed");
        return Ok(SeedReport::default());
    }

    let txn = db.begin().await?;

    let mut ids_by_username = HashMap::new();
    for seed_user in &seed.users {
        let created = seed_one_user(&txn, seed_user).await?;
        ids_by_username.insert(created.username.clone(), created.id);
    }

    for seed_task in &seed.tasks {
        let creator_id = *ids_by_username
            .get(&seed_task.creator)
            .ok_or_else(|| Error::Config {
                message: format!(
                    "seed task '{}' names unknown creator '{}'",
                    seed_task.title, seed_task.creator
                ),
            })?;
        seed_one_task(&txn, creator_id, seed_task).await?;
    }

    txn.commit().await?;

    let report = SeedReport {
        users: seed.users.len(),
        tasks: seed.tasks.len(),
    };
    info!(users = report.users, tasks = report.tasks, "Seeded database");
    Ok(report)
}

async fn seed_one_user<C>(db: &C, seed_user: &SeedUser) -> Result<user_entity::Model>
where
    C: ConnectionTrait,
{
    if seed_user.balance_cents < 0 {
        return Err(Error::Config {
            message: format!("seed user '{}' has a negative balance", seed_user.username),
        });
    }

    let created = user::create_user(
        db,
        NewUser {
            username: seed_user.username.clone(),
            email: seed_user.email.clone(),
            country: seed_user.country.clone(),
        },
    )
    .await?;

    let mut active: user_entity::ActiveModel = created.into();
    active.is_admin = Set(seed_user.is_admin);
    active.balance_cents = Set(seed_user.balance_cents);
    active.is_top_worker = Set(seed_user.is_top_worker);
    active.rank = Set(seed_user.rank);
    active.update(db).await.map_err(Into::into)
}

async fn seed_one_task<C>(db: &C, creator_id: i64, seed_task: &SeedTask) -> Result<task::Model>
where
    C: ConnectionTrait,
{
    if !(0..=seed_task.quantity).contains(&seed_task.completed_count) {
        return Err(Error::Config {
            message: format!(
                "seed task '{}' has completed_count outside 0..={}",
                seed_task.title, seed_task.quantity
            ),
        });
    }

    let created = task_core::create_task(
        db,
        creator_id,
        TaskSpec {
            title: seed_task.title.clone(),
            description: seed_task.description.clone(),
            task_type: seed_task.task_type,
            platform: seed_task.platform.clone(),
            url: seed_task.url.clone(),
            quantity: seed_task.quantity,
            price_per_task_cents: seed_task.price_per_task_cents,
            image_url: None,
            expires_at: None,
        },
    )
    .await?;

    // A full task takes no more approvals, so it cannot stay active
    let default_status = if seed_task.completed_count == seed_task.quantity {
        TaskStatus::Completed
    } else {
        TaskStatus::Active
    };

    let mut active: task::ActiveModel = created.into();
    active.completed_count = Set(seed_task.completed_count);
    active.status = Set(seed_task.status.unwrap_or(default_status));
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::AppConfig;
    use crate::entities::{Task, TaskType};
    use crate::test_utils::*;

    const SEED: &str = r#"
        [[seed.users]]
        username = "admin"
        email = "admin@example.com"
        is_admin = true

        [[seed.users]]
        username = "worker"
        email = "worker@example.com"
        balance_cents = 1500
        is_top_worker = true
        rank = 1

        [[seed.tasks]]
        creator = "admin"
        title = "Join our server"
        description = "Join and say hi"
        task_type = "join"
        platform = "discord"
        url = "https://discord.gg/example"
        quantity = 50
        price_per_task_cents = 5
        completed_count = 12
    "#;

    #[tokio::test]
    async fn test_seed_inserts_users_and_tasks_once() -> Result<()> {
        let db = setup_test_db().await?;
        let config: AppConfig = toml::from_str(SEED).unwrap();

        let report = seed_from_config(&db, &config.seed).await?;
        assert_eq!(report, SeedReport { users: 2, tasks: 1 });

        let users = User::find().all(&db).await?;
        let worker = users.iter().find(|u| u.username == "worker").unwrap();
        assert_eq!(worker.balance_cents, 1_500);
        assert!(worker.is_top_worker);
        assert!(users.iter().any(|u| u.username == "admin" && u.is_admin));

        let tasks = Task::find().all(&db).await?;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_type, TaskType::Join);
        assert_eq!(tasks[0].completed_count, 12);
        assert_eq!(tasks[0].total_price_cents, 250);

        let second = seed_from_config(&db, &config.seed).await?;
        assert_eq!(second, SeedReport::default());
        assert_eq!(User::find().count(&db).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_seeded_full_task_is_completed() -> Result<()> {
        let db = setup_test_db().await?;
        let mut config: AppConfig = toml::from_str(SEED).unwrap();
        config.seed.tasks[0].completed_count = 50;

        seed_from_config(&db, &config.seed).await?;

        let tasks = Task::find().all(&db).await?;
        assert_eq!(tasks[0].completed_count, 50);
        assert_eq!(tasks[0].status, TaskStatus::Completed);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_rejects_bad_entries_atomically() -> Result<()> {
        let db = setup_test_db().await?;
        let mut config: AppConfig = toml::from_str(SEED).unwrap();
        config.seed.tasks[0].completed_count = 51;

        let result = seed_from_config(&db, &config.seed).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        assert_eq!(User::find().count(&db).await?, 0);

        config.seed.tasks[0].completed_count = 0;
        config.seed.tasks[0].creator = "nobody".to_string();
        let result = seed_from_config(&db, &config.seed).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        assert_eq!(User::find().count(&db).await?, 0);
        Ok(())
    }
}
