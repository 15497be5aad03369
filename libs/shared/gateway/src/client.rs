use std::sync::Arc;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    multipart::Form,
    Client, Method, RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::AppError;

use crate::session::Session;

/// REST gateway to the practice backend.
///
/// Every endpoint answers with a JSON envelope `{success, error?, ...}`.
/// Calls resolve to the envelope deserialized into `T` on success and to an
/// [`AppError`] otherwise; no call panics or leaves the session touched.
pub struct BackendClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl BackendClient {
    pub fn new(config: &AppConfig, session: Arc<Session>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    fn get_headers(&self, json_body: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if json_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if let Some(token) = self.session.token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => error!("Session token contains invalid header characters, sending unauthenticated"),
            }
        }

        headers
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn get<T, Q>(&self, endpoint: &str, query: &Q) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let req = self
            .client
            .request(Method::GET, self.url(endpoint))
            .headers(self.get_headers(true))
            .query(query);
        self.execute(Method::GET, endpoint, req).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_with_body(Method::POST, endpoint, body).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_with_body(Method::PUT, endpoint, body).await
    }

    pub async fn delete<T>(&self, endpoint: &str) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let req = self
            .client
            .request(Method::DELETE, self.url(endpoint))
            .headers(self.get_headers(true));
        self.execute(Method::DELETE, endpoint, req).await
    }

    /// Multipart upload; the content type (with boundary) is set by reqwest.
    pub async fn upload<T>(&self, endpoint: &str, form: Form) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let req = self
            .client
            .request(Method::POST, self.url(endpoint))
            .headers(self.get_headers(false))
            .multipart(form);
        self.execute(Method::POST, endpoint, req).await
    }

    async fn request_with_body<T, B>(&self, method: Method, endpoint: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let req = self
            .client
            .request(method.clone(), self.url(endpoint))
            .headers(self.get_headers(true))
            .json(body);
        self.execute(method, endpoint, req).await
    }

    async fn execute<T>(&self, method: Method, endpoint: &str, req: RequestBuilder) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        debug!("Making {} request to {}", method, endpoint);

        let response = req.send().await.map_err(|e| {
            error!("API request failed: {}", e);
            AppError::Transport(e.to_string())
        })?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let envelope = parse_envelope(status.as_u16(), &raw)?;

        if !status.is_success() {
            error!("API error ({}): {}", status, raw);
            return Err(AppError::Rejected {
                status: Some(status.as_u16()),
                message: envelope_error(&envelope),
            });
        }

        if envelope.get("success").and_then(Value::as_bool) == Some(false) {
            debug!("Backend declined {} {}: {}", method, endpoint, raw);
            return Err(AppError::Rejected {
                status: None,
                message: envelope_error(&envelope),
            });
        }

        serde_json::from_value(envelope).map_err(|e| {
            error!("Unexpected response shape from {}: {}", endpoint, e);
            AppError::Malformed {
                status: status.as_u16(),
                raw,
            }
        })
    }

    /// Public download link for a stored upload.
    pub fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/uploads.php?action=get_file&file_path={}",
            self.base_url,
            urlencoding::encode(file_path)
        )
    }
}

fn parse_envelope(status: u16, raw: &str) -> Result<Value, AppError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    serde_json::from_str(raw).map_err(|_| {
        error!("Invalid JSON from server: {}", raw);
        AppError::Malformed {
            status,
            raw: raw.to_string(),
        }
    })
}

fn envelope_error(envelope: &Value) -> Option<String> {
    envelope
        .get("error")
        .or_else(|| envelope.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
