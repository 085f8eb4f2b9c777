use super::{AppState, auth::AuthUser, extract::ApiJson};
use crate::{
    core::{
        payment::{self, NewPayment},
        withdrawal::{self, WithdrawalOutcome, WithdrawalSpec},
    },
    entities::{PaymentModel, WithdrawalRequestModel},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    status: WithdrawalOutcome,
}

pub async fn request_withdrawal(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(spec): ApiJson<WithdrawalSpec>,
) -> Result<(StatusCode, Json<WithdrawalRequestModel>)> {
    let request =
        withdrawal::request_withdrawal(&state.db, &state.config.marketplace, caller.0, spec)
            .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn process_withdrawal(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(withdrawal_id): Path<i64>,
    ApiJson(request): ApiJson<ProcessRequest>,
) -> Result<Json<WithdrawalRequestModel>> {
    let processed =
        withdrawal::process_withdrawal(&state.db, caller.0, withdrawal_id, request.status).await?;
    Ok(Json(processed))
}

pub async fn create_payment(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(new_payment): ApiJson<NewPayment>,
) -> Result<(StatusCode, Json<PaymentModel>)> {
    let created = payment::create_payment(&state.db, caller.0, new_payment).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::api::test_support::*;
    use crate::core::user;
    use crate::entities::{WithdrawalRequestModel, WithdrawalStatus};
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    fn withdrawal_body(amount_cents: i64) -> serde_json::Value {
        json!({
            "amount_cents": amount_cents,
            "payment_method": "skrill",
            "payment_details": { "email": "alice@example.com" }
        })
    }

    #[tokio::test]
    async fn test_withdrawal_lifecycle_over_http() {
        let (server, db) = test_server().await;
        let alice = create_funded_user(&db, "alice", 1_500).await.unwrap();
        let admin = create_admin_user(&db, "admin").await.unwrap();

        let (name, value) = as_user(alice.id);
        server
            .post("/api/withdrawals")
            .add_header(name, value)
            .json(&withdrawal_body(2_000))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let (name, value) = as_user(alice.id);
        server
            .post("/api/withdrawals")
            .add_header(name, value)
            .json(&withdrawal_body(500))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let (name, value) = as_user(alice.id);
        let response = server
            .post("/api/withdrawals")
            .add_header(name, value)
            .json(&withdrawal_body(1_000))
            .await;
        response.assert_status(StatusCode::CREATED);
        let request: WithdrawalRequestModel = response.json();
        assert_eq!(user::require_user(&db, alice.id).await.unwrap().balance_cents, 500);

        let path = format!("/api/withdrawals/{}", request.id);
        let (name, value) = as_user(alice.id);
        server
            .patch(&path)
            .add_header(name, value)
            .json(&json!({ "status": "approved" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let (name, value) = as_user(admin.id);
        let rejected: WithdrawalRequestModel = server
            .patch(&path)
            .add_header(name, value)
            .json(&json!({ "status": "rejected" }))
            .await
            .json();
        assert_eq!(rejected.status, WithdrawalStatus::Rejected);
        assert_eq!(user::require_user(&db, alice.id).await.unwrap().balance_cents, 1_500);

        let (name, value) = as_user(admin.id);
        server
            .patch(&path)
            .add_header(name, value)
            .json(&json!({ "status": "approved" }))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_malformed_withdrawal_body_is_a_validation_error() {
        let (server, db) = test_server().await;
        let alice = create_funded_user(&db, "alice", 1_500).await.unwrap();

        let bodies = [
            json!({
                "amount_cents": 1_000,
                "payment_method": "paypal",
                "payment_details": { "email": "alice@example.com" }
            }),
            json!({
                "amount_cents": "ten dollars",
                "payment_method": "skrill",
                "payment_details": {}
            }),
            json!({ "payment_method": "skrill", "payment_details": {} }),
        ];

        for body in bodies {
            let (name, value) = as_user(alice.id);
            let response = server
                .post("/api/withdrawals")
                .add_header(name, value)
                .json(&body)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let error: Value = response.json();
            assert!(error["error"].as_str().unwrap().starts_with("Validation error"));
        }
        assert_eq!(user::require_user(&db, alice.id).await.unwrap().balance_cents, 1_500);
    }

    #[tokio::test]
    async fn test_create_payment_route() {
        let (server, db) = test_server().await;
        let creator = create_test_user(&db, "creator").await.unwrap();
        let task = create_test_task(&db, creator.id).await.unwrap();

        let (name, value) = as_user(creator.id);
        server
            .post("/api/payments")
            .add_header(name, value)
            .json(&json!({
                "task_id": task.id,
                "amount_cents": task.total_price_cents,
                "payment_method": "payoneer",
                "external_reference": "PO-123"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let (name, value) = as_user(creator.id);
        server
            .post("/api/payments")
            .add_header(name, value)
            .json(&json!({ "task_id": 999, "amount_cents": 100, "payment_method": "payoneer" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
