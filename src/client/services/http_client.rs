//! Transport wrapper shared by all API services.
//!
//! Performs the HTTP call, unwraps the `{code, data, message}` envelope and
//! turns every failure into an [`ApiError`]. Each failure also raises one
//! error toast through the configured [`Notifier`]. Nothing is retried.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::client::config::ClientConfig;
use crate::client::services::notifier::{Notifier, Toast};
use crate::common::envelope::{ApiError, ApiErrorKind, ApiResult, Envelope};

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Builds a client with a cookie jar (the backend keeps a server-side
    /// session) and the fixed request deadline from `config`.
    pub fn new(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::new(ApiErrorKind::Network, format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, config.api_base_url.clone(), notifier))
    }

    pub fn with_client(client: Client, base_url: String, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), notifier }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.notifier.clone()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        self.send::<(), T>(Method::GET, path, query, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    /// POST without a request body (path-parameter endpoints).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send::<(), T>(Method::POST, path, &[], None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send::<(), T>(Method::DELETE, path, &[], None).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, query: &[(&str, String)], body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let result = self.try_send(method.clone(), path, query, body).await;
        if let Err(e) = &result {
            warn!("[HTTP] {} {} failed ({:?}): {}", method, path, e.kind, e.message);
            self.notifier.notify(Toast::error(e.message.clone()));
        }
        result
    }

    async fn try_send<B, T>(&self, method: Method, path: &str, query: &[(&str, String)], body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path, query)?;
        debug!("[HTTP] {} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let server_message = serde_json::from_str::<Envelope>(&text)
                .ok()
                .and_then(|env| env.server_message());
            return Err(ApiError::from_status(status.as_u16(), server_message));
        }

        let envelope: Envelope = serde_json::from_str(&text)
            .map_err(|e| ApiError::new(ApiErrorKind::Decode, format!("Malformed response: {}", e)))?;
        envelope.into_result()
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Url> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&joined)
            .map_err(|e| ApiError::new(ApiErrorKind::Network, format!("Invalid request URL '{}': {}", joined, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::new(ApiErrorKind::Timeout, ApiErrorKind::Timeout.default_message())
    } else if e.is_decode() {
        ApiError::new(ApiErrorKind::Decode, format!("Malformed response: {}", e))
    } else {
        debug!("[HTTP] transport error: {}", e);
        ApiError::new(ApiErrorKind::Network, ApiErrorKind::Network.default_message())
    }
}
