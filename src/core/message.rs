//! Direct messages between users, usually scoped to a task.

use crate::{
    core::{notification, task as task_core, user},
    entities::{Message, NotificationType, message},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Input for [`send_message`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub receiver_id: i64,
    #[serde(default)]
    pub task_id: Option<i64>,
    pub content: String,
}

/// Stores a message and notifies the receiver.
///
/// # Errors
/// `Error::Validation` for empty content or a message to oneself, `Error::NotFound`
/// for an unknown receiver or task.
#[instrument(skip(db, new_message), fields(receiver_id = new_message.receiver_id))]
pub async fn send_message(
    db: &DatabaseConnection,
    sender_id: i64,
    new_message: NewMessage,
) -> Result<message::Model> {
    let content = new_message.content.trim().to_string();
    if content.is_empty() {
        return Err(Error::validation("Message cannot be empty"));
    }
    if sender_id == new_message.receiver_id {
        return Err(Error::validation("Cannot send a message to yourself"));
    }

    let txn = db.begin().await?;

    let sender = user::require_user(&txn, sender_id).await?;
    user::require_user(&txn, new_message.receiver_id).await?;
    if let Some(task_id) = new_message.task_id {
        task_core::require_task(&txn, task_id).await?;
    }

    let saved = message::ActiveModel {
        sender_id: Set(sender_id),
        receiver_id: Set(new_message.receiver_id),
        task_id: Set(new_message.task_id),
        content: Set(content),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    notification::notify(
        &txn,
        saved.receiver_id,
        NotificationType::Message,
        format!("New message from {}", sender.username),
        Some(saved.id),
    )
    .await?;

    txn.commit().await?;
    debug!(message_id = saved.id, "Message sent");
    Ok(saved)
}

/// Returns a task's messages oldest first and marks the ones addressed to
/// `reader_id` as read.
pub async fn get_conversation(
    db: &DatabaseConnection,
    task_id: i64,
    reader_id: i64,
) -> Result<Vec<message::Model>> {
    Message::update_many()
        .set(message::ActiveModel {
            is_read: Set(true),
            ..Default::default()
        })
        .filter(message::Column::TaskId.eq(task_id))
        .filter(message::Column::ReceiverId.eq(reader_id))
        .filter(message::Column::IsRead.eq(false))
        .exec(db)
        .await?;

    Message::find()
        .filter(message::Column::TaskId.eq(task_id))
        .order_by_asc(message::Column::CreatedAt)
        .order_by_asc(message::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Whether `user_id` sent or received any message about `task_id`.
pub async fn is_participant(
    db: &DatabaseConnection,
    task_id: i64,
    user_id: i64,
) -> Result<bool> {
    let count = Message::find()
        .filter(message::Column::TaskId.eq(task_id))
        .filter(
            Condition::any()
                .add(message::Column::SenderId.eq(user_id))
                .add(message::Column::ReceiverId.eq(user_id)),
        )
        .count(db)
        .await?;
    Ok(count > 0)
}

pub async fn get_message(
    db: &DatabaseConnection,
    message_id: i64,
) -> Result<Option<message::Model>> {
    Message::find_by_id(message_id).one(db).await.map_err(Into::into)
}

/// Marks one message as read; repeating is a no-op.
pub async fn mark_message_read(db: &DatabaseConnection, message_id: i64) -> Result<message::Model> {
    let existing = get_message(db, message_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Message",
            id: message_id,
        })?;
    if existing.is_read {
        return Ok(existing);
    }

    let mut active: message::ActiveModel = existing.into();
    active.is_read = Set(true);
    active.update(db).await.map_err(Into::into)
}

pub async fn unread_message_count(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    Message::find()
        .filter(message::Column::ReceiverId.eq(user_id))
        .filter(message::Column::IsRead.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}
