//! HTTP interface - An axum router over the core operations.

/// Caller identity extractor
pub mod auth;
/// Error to HTTP response mapping
pub mod error;
/// Request extractors with crate error rejections
pub mod extract;
mod inbox;
mod referrals;
mod submissions;
mod tasks;
mod users;
mod wallet;

use crate::config::AppConfig;
use axum::{
    Json, Router,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the `/api` router with request tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/users", post(users::create_user))
        .route("/users/:id/stats", get(users::user_stats))
        .route("/users/:id/tasks", get(users::user_tasks))
        .route("/users/:id/submissions", get(users::user_submissions))
        .route("/users/:id/transactions", get(users::user_transactions))
        .route("/users/:id/withdrawals", get(users::user_withdrawals))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/tasks/:id", get(tasks::get_task).patch(tasks::update_task))
        .route("/tasks/:id/submissions", get(tasks::task_submissions))
        .route("/task-submissions", post(submissions::submit))
        .route("/task-submissions/:id", patch(submissions::review))
        .route("/withdrawals", post(wallet::request_withdrawal))
        .route("/withdrawals/:id", patch(wallet::process_withdrawal))
        .route("/payments", post(wallet::create_payment))
        .route("/referrals", post(referrals::create_referral))
        .route("/referrals/:id/paid", patch(referrals::mark_commission_paid))
        .route("/messages", post(inbox::send_message))
        .route("/messages/conversation/:task_id", get(inbox::conversation))
        .route("/messages/:id/read", patch(inbox::mark_message_read))
        .route("/messages/unread/count", get(inbox::unread_message_count))
        .route("/notifications", get(inbox::notifications))
        .route("/notifications/:id/read", patch(inbox::mark_notification_read))
        .route("/notifications/unread/count", get(inbox::unread_notification_count));

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;

    /// A test server over a fresh in-memory database.
    pub async fn test_server() -> (TestServer, DatabaseConnection) {
        let db = setup_test_db().await.unwrap();
        let state = AppState::new(db.clone(), AppConfig::default());
        let server = TestServer::new(router(state)).unwrap();
        (server, db)
    }

    /// The identity header for `user_id`.
    pub fn as_user(user_id: i64) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static(auth::USER_ID_HEADER),
            HeaderValue::from(user_id),
        )
    }
}
