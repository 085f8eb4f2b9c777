//! Core business logic for the marketplace, independent of the HTTP layer.

/// Direct messages between users
pub mod message;
/// Cent formatting
pub mod money;
/// Notification records and unread counters
pub mod notification;
/// Incoming payments from task creators
pub mod payment;
/// Referral bookkeeping
pub mod referral;
/// First-run seeding from config.toml
pub mod seed;
/// Submissions and their review
pub mod submission;
/// Task creation, listing and completion counting
pub mod task;
/// The append-only money ledger
pub mod transaction;
/// Accounts, balances and statistics
pub mod user;
/// Withdrawal requests and their settlement
pub mod withdrawal;
