//! Notification-delivery collaborator
//!
//! Delivery is fire-and-forget: the core marks a notification `Sent` right
//! after handing it over, whatever happens downstream. Delivery failure is
//! deliberately not modelled.

use crate::models::User;

#[cfg_attr(test, mockall::automock)]
pub trait NotificationSender: Send + Sync {
    fn send(&self, recipient: &User, message: &str);
}

/// Logs the rendered message instead of delivering it anywhere, the
/// default channel for a process without a mail or push integration
#[derive(Default)]
pub struct LogNotificationSender;

impl NotificationSender for LogNotificationSender {
    fn send(&self, recipient: &User, message: &str) {
        tracing::info!(
            recipient = %recipient.email,
            "Sending overdue notification: {}",
            message
        );
    }
}
