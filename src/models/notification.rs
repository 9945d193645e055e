//! Notification model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationStatus {
    /// Appended to the log, not yet handed to the delivery collaborator
    Created,
    /// Handed over for delivery; actual delivery outcome is not modelled
    Sent,
}

/// An informational message for a member, created when an overdue loan is
/// detected. The notification log is append-only and per-process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: u32,
    /// Recipient user id
    pub user_id: u32,
    pub message: String,
    pub status: NotificationStatus,
}
