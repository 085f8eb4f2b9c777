//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the marketplace tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod message;
pub mod notification;
pub mod payment;
pub mod referral;
pub mod task;
pub mod task_submission;
pub mod transaction;
pub mod user;
pub mod withdrawal_request;

// Re-export specific types to avoid conflicts
pub use message::{Column as MessageColumn, Entity as Message, Model as MessageModel};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
    NotificationType,
};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel, PaymentStatus};
pub use referral::{Column as ReferralColumn, Entity as Referral, Model as ReferralModel};
pub use task::{Column as TaskColumn, Entity as Task, Model as TaskModel, TaskStatus, TaskType};
pub use task_submission::{
    Column as TaskSubmissionColumn, Entity as TaskSubmission, Model as TaskSubmissionModel,
    SubmissionStatus,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionType,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use withdrawal_request::{
    Column as WithdrawalRequestColumn, Entity as WithdrawalRequest,
    Model as WithdrawalRequestModel, PaymentMethod, WithdrawalStatus,
};
