use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{keys, MirrorStore};

/// Authenticated session as persisted between page loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Holds the current session in memory and mirrors it durably, so a
/// login survives gateway redirects and restarts. The remote client
/// clears it when the backend answers 401.
pub struct SessionStore {
    mirror: Arc<dyn MirrorStore>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new(mirror: Arc<dyn MirrorStore>) -> Self {
        Self {
            mirror,
            current: RwLock::new(None),
        }
    }

    /// Loads the persisted session, if any, into memory. Corrupt or
    /// missing entries leave the store signed out.
    pub async fn restore(&self) -> Option<Session> {
        let raw = match self.mirror.load(keys::SESSION).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "session restore failed");
                return None;
            }
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                debug!(user_id = %session.user_id, "session restored");
                *self.current.write().unwrap() = Some(session.clone());
                Some(session)
            }
            Err(e) => {
                warn!(error = %e, "discarding corrupt session entry");
                None
            }
        }
    }

    pub async fn set(&self, session: Session) {
        *self.current.write().unwrap() = Some(session.clone());
        match serde_json::to_string(&session) {
            Ok(json) => {
                if let Err(e) = self.mirror.save(keys::SESSION, &json).await {
                    warn!(error = %e, "session persist failed");
                }
            }
            Err(e) => warn!(error = %e, "session serialize failed"),
        }
    }

    pub async fn clear(&self) {
        *self.current.write().unwrap() = None;
        if let Err(e) = self.mirror.remove(keys::SESSION).await {
            warn!(error = %e, "session mirror clear failed");
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().unwrap().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.token.clone())
    }

    pub fn user_id(&self) -> Option<String> {
        self.current
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.user_id.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().unwrap().is_some()
    }
}
