// Thin JSON client over the store backend. Owns bearer injection,
// timeout policy, and the translation of HTTP failures into the
// crate's error taxonomy.

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::errors::StoreError;
use crate::events::{Notice, NoticeSender};

pub mod session;

pub use session::{Session, SessionStore};

/// Error envelope the backend uses; some endpoints say `message`,
/// older ones say `error`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionStore>,
    notices: NoticeSender,
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        session: Arc<SessionStore>,
        notices: NoticeSender,
    ) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .build()
            .map_err(StoreError::from)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            notices,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let request = self.http.get(self.url(path));
        self.execute(path, request).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.post(self.url(path)).json(body);
        self.execute(path, request).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.put(self.url(path)).json(body);
        self.execute(path, request).await
    }

    /// DELETE, discarding whatever body the backend chooses to send.
    pub async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let request = self.authorize(self.http.delete(self.url(path)));
        let response = request.send().await?;
        self.check(path, response).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = self.authorize(request).send().await?;
        let response = self.check(path, response).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            // Some mutating endpoints answer 200 with no body.
            return serde_json::from_value(Value::Null).map_err(Into::into);
        }
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// Maps non-success statuses into the error taxonomy. A 401 clears
    /// the stored session and notifies; a 5xx raises a system notice.
    /// Both still surface as errors to the caller.
    async fn check(&self, path: &str, response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            debug!(path, status = status.as_u16(), "request ok");
            return Ok(response);
        }

        let message = Self::error_message(response).await;
        warn!(path, status = status.as_u16(), message, "request failed");

        if status == StatusCode::UNAUTHORIZED {
            self.session.clear().await;
            self.notices.send_or_log(Notice::session_expired()).await;
            return Err(StoreError::SessionExpired);
        }
        if status.is_server_error() {
            self.notices
                .send_or_log(Notice::system_fault(status.as_u16()))
                .await;
        }
        Err(StoreError::RemoteCall {
            status: status.as_u16(),
            message,
        })
    }

    /// Pulls the richest message out of an error response: the JSON
    /// envelope's text when present, the HTTP reason phrase otherwise.
    async fn error_message(response: Response) -> String {
        let status = response.status();
        let fallback = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
        match response.bytes().await {
            Ok(bytes) if !bytes.is_empty() => {
                match serde_json::from_slice::<ApiErrorBody>(&bytes) {
                    Ok(body) => body
                        .message
                        .or(body.error)
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .unwrap_or(fallback),
                    Err(_) => fallback,
                }
            }
            _ => fallback,
        }
    }
}
