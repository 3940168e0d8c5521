use thiserror::Error;

/// Messages surfaced to the storefront when nothing more specific is known.
pub const FALLBACK_ERROR_MESSAGE: &str = "Đã xảy ra lỗi, vui lòng thử lại sau";
pub const SYSTEM_ERROR_MESSAGE: &str = "Hệ thống đang gặp sự cố, vui lòng thử lại sau";
pub const SESSION_EXPIRED_MESSAGE: &str = "Phiên đăng nhập đã hết hạn, vui lòng đăng nhập lại";

/// Unified error type for every operation in the crate.
///
/// Remote failures keep the richest message available (server-provided
/// message first, transport error second) so notices shown to staff and
/// shoppers stay actionable.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Remote call failed ({status}): {message}")]
    RemoteCall { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {message}")]
    Validation { fields: Vec<String>, message: String },

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Payment rejected ({code}): {reason}")]
    PaymentRejected { code: String, reason: String },

    #[error("Session expired")]
    SessionExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Mirror error: {0}")]
    Mirror(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Message suitable for an end-user notice.
    ///
    /// Transport-level noise (connection resets, DNS failures) is folded
    /// into the generic Vietnamese fallback; server-authored messages and
    /// gateway reasons pass through unchanged.
    pub fn user_message(&self) -> String {
        match self {
            StoreError::RemoteCall { status, message } => {
                if *status >= 500 || message.is_empty() {
                    SYSTEM_ERROR_MESSAGE.to_string()
                } else {
                    message.clone()
                }
            }
            StoreError::Network(_) => FALLBACK_ERROR_MESSAGE.to_string(),
            StoreError::Validation { message, .. } => message.clone(),
            StoreError::Gateway(message) => message.clone(),
            StoreError::PaymentRejected { reason, .. } => reason.clone(),
            StoreError::SessionExpired => SESSION_EXPIRED_MESSAGE.to_string(),
            StoreError::NotFound(what) => format!("Không tìm thấy {what}"),
            StoreError::InvalidOperation(message) => message.clone(),
            _ => FALLBACK_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn validation(fields: impl IntoIterator<Item = impl Into<String>>, message: impl Into<String>) -> Self {
        StoreError::Validation {
            fields: fields.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// True when retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Network(_) | StoreError::RemoteCall { status: 500.., .. }
        )
    }

    /// True for failures the remote client has already turned into a
    /// notice (session expiry, server faults); stores skip their own
    /// notification for these to avoid double toasts.
    pub fn reported_at_transport(&self) -> bool {
        matches!(
            self,
            StoreError::SessionExpired | StoreError::RemoteCall { status: 500.., .. }
        )
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            StoreError::Network(format!("connection failed: {err}"))
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

impl From<crate::cache::MirrorError> for StoreError {
    fn from(err: crate::cache::MirrorError) -> Self {
        StoreError::Mirror(err.to_string())
    }
}
