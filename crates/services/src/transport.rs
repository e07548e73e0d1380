use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use storage::repository::TokenStore;
use url::Url;

use crate::config::ApiConfig;
use crate::error::TransportError;

/// HTTP client that attaches the stored session token to every request.
///
/// The token is read from the store on each call, so a logout takes effect on
/// the very next request. A missing or blank token sends no `Authorization`
/// header at all.
#[derive(Clone)]
pub struct AuthorizedTransport {
    client: Client,
    api_root: Url,
    tokens: Arc<dyn TokenStore>,
}

impl AuthorizedTransport {
    /// Build a transport for the configured service.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the HTTP client cannot be built or the API
    /// root cannot be derived from the base URL.
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            api_root: config.api_root()?,
            tokens,
        })
    }

    #[must_use]
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Start a request to `path` (relative to the API root) with credentials
    /// resolved from the store right now.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the path does not form a valid URL or the
    /// token store cannot be read.
    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, TransportError> {
        let url = self.api_root.join(path.trim_start_matches('/'))?;
        let mut builder = self.client.request(method, url);
        if let Some(token) = self.tokens.get().await? {
            if !token.is_blank() {
                builder = builder.bearer_auth(token.as_str());
            }
        }
        Ok(builder)
    }

    /// POST `body` as JSON and decode a JSON response.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Remote` for non-success statuses (with the
    /// service's `detail` message), `TransportError::InvalidResponse` when the
    /// body does not match `R`, and `TransportError::Http` for network failures.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!(path, "sending request");
        let response = self
            .request(Method::POST, path)
            .await?
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(status, &body);
            tracing::debug!(path, %status, %detail, "request rejected");
            return Err(TransportError::Remote { status, detail });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| TransportError::InvalidResponse(err.to_string()))
    }
}

/// Pull a human-readable message out of an error body.
///
/// Services answer `{"detail": ...}`; anything else falls back to the raw text
/// or the status reason.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        match map.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
