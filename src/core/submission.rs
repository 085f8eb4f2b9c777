//! Submission review engine - Worker proof and the creator's verdict on it.
//!
//! A submission moves `pending → approved` or `pending → rejected` exactly once. The
//! transition is a conditional update (`... WHERE status = 'pending'`), so two
//! reviewers racing on one submission cannot both win. Approval bundles the status
//! change, the task's completion count, the worker's ledger entry, the balance credit
//! and the worker's notification into a single database transaction.

use crate::{
    config::MarketplaceConfig,
    core::{money::format_cents, notification, task as task_core, transaction, user},
    entities::{
        NotificationType, SubmissionStatus, TaskStatus, TaskSubmission, TransactionType,
        task_submission,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// The two verdicts a reviewer can give.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Approved,
    Rejected,
}

impl From<ReviewOutcome> for SubmissionStatus {
    fn from(outcome: ReviewOutcome) -> Self {
        match outcome {
            ReviewOutcome::Approved => Self::Approved,
            ReviewOutcome::Rejected => Self::Rejected,
        }
    }
}

/// Records a worker's proof for an active task and notifies the task's creator.
///
/// # Errors
/// - `Error::Validation` if the proof is shorter than 3 characters
/// - `Error::NotFound` if the task or worker does not exist
/// - `Error::TaskNotActive` if the task is completed or cancelled
/// - `Error::Unauthorized` if the worker created the task
/// - `Error::DuplicateSubmission` if the worker already has a pending or approved
///   submission for the task and duplicates are not allowed
#[instrument(skip(db, rules, proof))]
pub async fn submit(
    db: &DatabaseConnection,
    rules: &MarketplaceConfig,
    task_id: i64,
    worker_id: i64,
    proof: String,
) -> Result<task_submission::Model> {
    let proof = proof.trim().to_string();
    if proof.chars().count() < 3 {
        return Err(Error::validation("Proof must be at least 3 characters"));
    }

    let txn = db.begin().await?;

    let task = task_core::require_task(&txn, task_id).await?;
    if task.status != TaskStatus::Active {
        warn!(task_id, status = %task.status, "Submission for inactive task refused");
        return Err(Error::TaskNotActive {
            task_id,
            status: task.status.to_string(),
        });
    }
    user::require_user(&txn, worker_id).await?;
    if task.creator_id == worker_id {
        return Err(Error::unauthorized("creators cannot submit to their own task"));
    }

    if !rules.allow_duplicate_submissions {
        let open = TaskSubmission::find()
            .filter(task_submission::Column::TaskId.eq(task_id))
            .filter(task_submission::Column::WorkerId.eq(worker_id))
            .filter(task_submission::Column::Status.ne(SubmissionStatus::Rejected))
            .count(&txn)
            .await?;
        if open > 0 {
            return Err(Error::DuplicateSubmission { task_id, worker_id });
        }
    }

    let submission = task_submission::ActiveModel {
        task_id: Set(task_id),
        worker_id: Set(worker_id),
        proof: Set(proof),
        status: Set(SubmissionStatus::Pending),
        created_at: Set(Utc::now()),
        reviewed_at: Set(None),
        feedback: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            Error::DuplicateSubmission { task_id, worker_id }
        }
        _ => Error::Database(e),
    })?;

    notification::notify(
        &txn,
        task.creator_id,
        NotificationType::Submission,
        format!("New submission for task: {}", task.title),
        Some(submission.id),
    )
    .await?;

    txn.commit().await?;

    info!(submission_id = submission.id, task_id, worker_id, "Submission received");
    Ok(submission)
}

/// Finds a submission by id, returning `None` if it does not exist.
pub async fn get_submission<C>(db: &C, submission_id: i64) -> Result<Option<task_submission::Model>>
where
    C: ConnectionTrait,
{
    TaskSubmission::find_by_id(submission_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_submission<C>(db: &C, submission_id: i64) -> Result<task_submission::Model>
where
    C: ConnectionTrait,
{
    get_submission(db, submission_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Submission",
            id: submission_id,
        })
}

/// Approves or rejects a pending submission.
///
/// On approval, in one database transaction:
/// 1. the submission becomes `approved` with `reviewed_at = now`
/// 2. the task's `completed_count` grows by one (capped at `quantity`)
/// 3. an `earning` transaction for the task price is appended for the worker
/// 4. the worker's balance and task counter grow atomically
/// 5. the worker receives an `approval` notification
///
/// On rejection the submission becomes `rejected` with the feedback stored, and the
/// worker receives a `rejection` notification. If any step fails nothing is applied.
///
/// # Errors
/// - `Error::NotFound` if the submission or reviewer does not exist
/// - `Error::Unauthorized` if the reviewer is neither the task's creator nor an admin
/// - `Error::AlreadyReviewed` if the submission is no longer pending
/// - `Error::TaskFull` if approving would exceed the task's quantity
#[instrument(skip(db, rules, feedback))]
pub async fn review(
    db: &DatabaseConnection,
    rules: &MarketplaceConfig,
    reviewer_id: i64,
    submission_id: i64,
    outcome: ReviewOutcome,
    feedback: Option<String>,
) -> Result<task_submission::Model> {
    let feedback = feedback
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty());

    let txn = db.begin().await?;

    let submission = require_submission(&txn, submission_id).await?;
    let task = task_core::require_task(&txn, submission.task_id).await?;
    let reviewer = user::require_user(&txn, reviewer_id).await?;
    if task.creator_id != reviewer_id && !reviewer.is_admin {
        warn!(reviewer_id, task_id = task.id, "Reviewer does not own the task");
        return Err(Error::unauthorized(
            "only the task's creator or an admin can review its submissions",
        ));
    }
    if submission.status != SubmissionStatus::Pending {
        return Err(Error::AlreadyReviewed {
            submission_id,
            status: submission.status.to_string(),
        });
    }

    let transition = TaskSubmission::update_many()
        .set(task_submission::ActiveModel {
            status: Set(outcome.into()),
            reviewed_at: Set(Some(Utc::now())),
            feedback: Set(feedback.clone()),
            ..Default::default()
        })
        .filter(task_submission::Column::Id.eq(submission_id))
        .filter(task_submission::Column::Status.eq(SubmissionStatus::Pending))
        .exec(&txn)
        .await?;
    if transition.rows_affected == 0 {
        let current = require_submission(&txn, submission_id).await?;
        return Err(Error::AlreadyReviewed {
            submission_id,
            status: current.status.to_string(),
        });
    }

    let worker_id = submission.worker_id;
    match outcome {
        ReviewOutcome::Approved => {
            let price = task.price_per_task_cents;
            task_core::record_completion(&txn, task.id, rules.auto_complete_tasks).await?;
            transaction::record_transaction(
                &txn,
                worker_id,
                TransactionType::Earning,
                price,
                format!("Earnings from task #{}: {}", task.id, task.title),
                Some(submission_id),
            )
            .await?;
            user::credit_balance_atomic(&txn, worker_id, price).await?;
            user::increment_total_tasks(&txn, worker_id).await?;
            notification::notify(
                &txn,
                worker_id,
                NotificationType::Approval,
                format!(
                    "Your submission for task #{} has been approved! You earned {}",
                    task.id,
                    format_cents(price)
                ),
                Some(submission_id),
            )
            .await?;
        }
        ReviewOutcome::Rejected => {
            let content = match &feedback {
                Some(feedback) => format!(
                    "Your submission for task #{} has been rejected. {feedback}",
                    task.id
                ),
                None => format!("Your submission for task #{} has been rejected.", task.id),
            };
            notification::notify(
                &txn,
                worker_id,
                NotificationType::Rejection,
                content,
                Some(submission_id),
            )
            .await?;
        }
    }

    let reviewed = require_submission(&txn, submission_id).await?;
    txn.commit().await?;

    info!(
        submission_id,
        task_id = task.id,
        worker_id,
        status = %reviewed.status,
        "Submission reviewed"
    );
    Ok(reviewed)
}

/// Lists a worker's submissions, newest first.
pub async fn get_submissions_for_worker(
    db: &DatabaseConnection,
    worker_id: i64,
) -> Result<Vec<task_submission::Model>> {
    TaskSubmission::find()
        .filter(task_submission::Column::WorkerId.eq(worker_id))
        .order_by_desc(task_submission::Column::CreatedAt)
        .order_by_desc(task_submission::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists a task's submissions, newest first.
pub async fn get_submissions_for_task(
    db: &DatabaseConnection,
    task_id: i64,
) -> Result<Vec<task_submission::Model>> {
    TaskSubmission::find()
        .filter(task_submission::Column::TaskId.eq(task_id))
        .order_by_desc(task_submission::Column::CreatedAt)
        .order_by_desc(task_submission::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
