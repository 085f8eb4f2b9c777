//! Notification relay - Fire-and-forget records consumed by unread counters.
//!
//! [`notify`] is generic over the connection so review and settlement code can emit
//! notifications inside their own database transaction.

use crate::{
    entities::{Notification, NotificationType, notification},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// Inserts an unread notification for `user_id`.
pub async fn notify<C>(
    db: &C,
    user_id: i64,
    notification_type: NotificationType,
    content: String,
    related_id: Option<i64>,
) -> Result<notification::Model>
where
    C: ConnectionTrait,
{
    let model = notification::ActiveModel {
        user_id: Set(user_id),
        notification_type: Set(notification_type),
        content: Set(content),
        related_id: Set(related_id),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!(
        user_id,
        notification_id = model.id,
        "Queued {notification_type:?} notification"
    );
    Ok(model)
}

/// Finds a notification by id, returning `None` if it does not exist.
pub async fn get_notification(
    db: &DatabaseConnection,
    notification_id: i64,
) -> Result<Option<notification::Model>> {
    Notification::find_by_id(notification_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Marks a notification as read. Marking an already-read notification is a no-op.
///
/// # Errors
/// `Error::NotFound` if the notification does not exist.
pub async fn mark_read(
    db: &DatabaseConnection,
    notification_id: i64,
) -> Result<notification::Model> {
    let existing = get_notification(db, notification_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Notification",
            id: notification_id,
        })?;

    if existing.is_read {
        return Ok(existing);
    }

    let mut active: notification::ActiveModel = existing.into();
    active.is_read = Set(true);
    active.update(db).await.map_err(Into::into)
}

/// Counts the unread notifications addressed to `user_id`.
pub async fn unread_count(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Lists every notification for `user_id`, newest first.
pub async fn get_notifications_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_notify_and_unread_count() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "worker1").await?;

        assert_eq!(unread_count(&db, user.id).await?, 0);

        let first = notify(
            &db,
            user.id,
            NotificationType::Approval,
            "approved".to_string(),
            Some(7),
        )
        .await?;
        notify(
            &db,
            user.id,
            NotificationType::Rejection,
            "rejected".to_string(),
            None,
        )
        .await?;

        assert!(!first.is_read);
        assert_eq!(first.related_id, Some(7));
        assert_eq!(unread_count(&db, user.id).await?, 2);

        let listed = get_notifications_for_user(&db, user.id).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1], first);
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "worker1").await?;
        let note = notify(
            &db,
            user.id,
            NotificationType::Message,
            "hello".to_string(),
            None,
        )
        .await?;

        let read = mark_read(&db, note.id).await?;
        assert!(read.is_read);
        assert_eq!(unread_count(&db, user.id).await?, 0);

        let again = mark_read(&db, note.id).await?;
        assert!(again.is_read);
        assert_eq!(unread_count(&db, user.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_read_unknown_notification() -> Result<()> {
        let db = setup_test_db().await?;
        let result = mark_read(&db, 404).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "Notification",
                id: 404
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_unread_count_is_per_user() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;

        notify(&db, alice.id, NotificationType::Message, "hi".to_string(), None).await?;
        assert_eq!(unread_count(&db, alice.id).await?, 1);
        assert_eq!(unread_count(&db, bob.id).await?, 0);
        Ok(())
    }
}
