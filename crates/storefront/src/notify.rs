//! User-facing notifications.

use std::fmt;

use solana_sdk::signature::Signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        })
    }
}

/// A message for the person using the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub description: Option<String>,
    /// Transaction that caused the notification, if any.
    pub txid: Option<Signature>,
}

impl Notification {
    fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            description: None,
            txid: None,
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn with_txid(mut self, txid: Signature) -> Self {
        self.txid = Some(txid);
        self
    }
}

/// Receives notifications. Implementations must not block.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications as structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        let description = notification.description.as_deref().unwrap_or_default();
        let txid = notification.txid.map(|txid| txid.to_string()).unwrap_or_default();
        match notification.kind {
            NotificationKind::Error => {
                tracing::warn!(description = %description, txid = %txid, "{}", notification.message);
            }
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!(
                    kind = %notification.kind,
                    description = %description,
                    txid = %txid,
                    "{}",
                    notification.message
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let txid = Signature::default();
        let notification = Notification::success("Design created")
            .with_description("Sunset Tee")
            .with_txid(txid);
        assert_eq!(notification.kind, NotificationKind::Success);
        assert_eq!(notification.description.as_deref(), Some("Sunset Tee"));
        assert_eq!(notification.txid, Some(txid));

        let notification = Notification::error("Failed");
        assert_eq!(notification.kind, NotificationKind::Error);
        assert!(notification.description.is_none());
    }
}
