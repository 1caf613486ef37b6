use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a banner stays visible after it was issued
pub const NOTIFICATION_TTL_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A transient success or error banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
            issued_at: now,
        }
    }

    pub fn error(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
            issued_at: now,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(NOTIFICATION_TTL_SECS)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Milliseconds left before the banner must disappear, zero once expired
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at() - now).num_milliseconds().max(0)
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}
