use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::errors::{StoreError, SESSION_EXPIRED_MESSAGE, SYSTEM_ERROR_MESSAGE};

/// Severity of a notice as rendered by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
}

// User-facing notifications emitted by stores and the checkout
// orchestrator. The host application decides how to render them
// (toast, banner, redirect to login on SessionExpired).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Notice {
    Toast {
        kind: NoticeKind,
        message: String,
        at: DateTime<Utc>,
    },
    SessionExpired {
        message: String,
    },
    SystemFault {
        status: u16,
        message: String,
    },
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice::Toast {
            kind: NoticeKind::Success,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice::Toast {
            kind: NoticeKind::Error,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notice::Toast {
            kind: NoticeKind::Warning,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn session_expired() -> Self {
        Notice::SessionExpired {
            message: SESSION_EXPIRED_MESSAGE.to_string(),
        }
    }

    pub fn system_fault(status: u16) -> Self {
        Notice::SystemFault {
            status,
            message: SYSTEM_ERROR_MESSAGE.to_string(),
        }
    }

    /// Error notice carrying the richest message the failure offers.
    pub fn from_error(err: &StoreError) -> Self {
        match err {
            StoreError::SessionExpired => Notice::session_expired(),
            StoreError::RemoteCall { status, .. } if *status >= 500 => Notice::system_fault(*status),
            other => Notice::error(other.user_message()),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Toast { message, .. } => message,
            Notice::SessionExpired { message } => message,
            Notice::SystemFault { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoticeSender {
    sender: mpsc::Sender<Notice>,
}

impl NoticeSender {
    pub fn new(sender: mpsc::Sender<Notice>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, notice: Notice) -> Result<(), String> {
        self.sender
            .send(notice)
            .await
            .map_err(|e| format!("Failed to send notice: {}", e))
    }

    /// Sends a notice, logging instead of propagating when the receiver
    /// is gone. Notification delivery must never fail a store operation.
    pub async fn send_or_log(&self, notice: Notice) {
        if let Err(e) = self.send(notice).await {
            warn!("Dropping notice: {}", e);
        }
    }
}

/// Builds the notice channel shared by every store and the orchestrator.
pub fn notice_channel(capacity: usize) -> (NoticeSender, mpsc::Receiver<Notice>) {
    let (tx, rx) = mpsc::channel(capacity);
    (NoticeSender::new(tx), rx)
}
