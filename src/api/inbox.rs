//! Notifications and direct messages of the calling user.

use super::{AppState, auth::AuthUser, extract::ApiJson};
use crate::{
    core::{
        message::{self, NewMessage},
        notification, task,
    },
    entities::{MessageModel, NotificationModel},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    count: u64,
}

pub async fn send_message(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(new_message): ApiJson<NewMessage>,
) -> Result<(StatusCode, Json<MessageModel>)> {
    let sent = message::send_message(&state.db, caller.0, new_message).await?;
    Ok((StatusCode::CREATED, Json(sent)))
}

/// Open to the task's creator, anyone who has messaged about the task, and admins.
pub async fn conversation(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(task_id): Path<i64>,
) -> Result<Json<Vec<MessageModel>>> {
    let existing = task::require_task(&state.db, task_id).await?;
    let allowed = existing.creator_id == caller.0
        || message::is_participant(&state.db, task_id, caller.0).await?
        || caller.load(&state.db).await?.is_admin;
    if !allowed {
        return Err(Error::unauthorized("only participants can read this conversation"));
    }
    Ok(Json(
        message::get_conversation(&state.db, task_id, caller.0).await?,
    ))
}

pub async fn mark_message_read(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(message_id): Path<i64>,
) -> Result<Json<MessageModel>> {
    let existing = message::get_message(&state.db, message_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Message",
            id: message_id,
        })?;
    if existing.receiver_id != caller.0 {
        return Err(Error::unauthorized("only the receiver can mark a message read"));
    }
    Ok(Json(message::mark_message_read(&state.db, message_id).await?))
}

pub async fn unread_message_count(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<UnreadCount>> {
    let count = message::unread_message_count(&state.db, caller.0).await?;
    Ok(Json(UnreadCount { count }))
}

pub async fn notifications(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<NotificationModel>>> {
    Ok(Json(
        notification::get_notifications_for_user(&state.db, caller.0).await?,
    ))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<NotificationModel>> {
    let existing = notification::get_notification(&state.db, notification_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Notification",
            id: notification_id,
        })?;
    if existing.user_id != caller.0 {
        return Err(Error::unauthorized("this notification belongs to another user"));
    }
    Ok(Json(notification::mark_read(&state.db, notification_id).await?))
}

pub async fn unread_notification_count(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<UnreadCount>> {
    let count = notification::unread_count(&state.db, caller.0).await?;
    Ok(Json(UnreadCount { count }))
}
