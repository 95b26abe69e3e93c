//! Typed HTTP client for the claims-validation backend.
//!
//! One `reqwest::Client` is built at startup and shared by every flow.  All
//! responses are read as text first so a non-2xx status can surface its body
//! verbatim (the upload flow shows the validation endpoint's body as the
//! user-facing error) and a 2xx body that fails to parse is reported as a
//! decode error rather than a transport one.
//!
//! No retries anywhere — every failure is surfaced once and the user
//! re-invokes the action.

pub mod types;

use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use self::types::{
    ClearTenantResponse, HealthResponse, LoginRequest, LoginResponse, MetricsResponse,
    RefinedResponse, ResultsResponse, SaveSettingsRequest, SettingsResponse, UploadRequest,
    UploadResponse, ValidateResponse,
};

/// Chunk size for the streamed upload body.  Small enough that progress
/// events are frequent even for modest files.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

// ─── Error taxonomy ───────────────────────────────────────────────────────────

/// Every way a backend call can fail, per the console's error policy.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network/transport failure (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx response; the body is preserved for display.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// 2xx response whose body could not be parsed.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    /// A selected file could not be read.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Upload invoked without a claims file.
    #[error("missing claims file")]
    MissingClaimsFile,
}

impl ApiError {
    /// The message shown to the user.  For status errors this is the raw
    /// response body when present, falling back to `generic` when empty.
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            ApiError::Status { body, .. } if !body.trim().is_empty() => body.trim().to_string(),
            ApiError::Status { .. } => generic.to_string(),
            other => other.to_string(),
        }
    }
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Shared client for every backend endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ─── Auth ────────────────────────────────────────────────────────────────

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.post_json(
            "/login",
            &LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    // ─── Upload / validate ───────────────────────────────────────────────────

    /// POST the upload body as a chunked stream, reporting cumulative bytes
    /// sent and the total body size after each chunk.
    ///
    /// The callback fires as the request body is polled, which is as close to
    /// wire progress as a client-side JSON upload gets.
    pub async fn upload<F>(
        &self,
        request: &UploadRequest,
        mut on_progress: F,
    ) -> Result<UploadResponse, ApiError>
    where
        F: FnMut(u64, u64) + Send + 'static,
    {
        let body = serde_json::to_vec(request)?;
        let total = body.len() as u64;
        debug!(tenant = %request.tenant_id, bytes = total, "starting upload");

        let chunks: Vec<Vec<u8>> = body
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(<[u8]>::to_vec)
            .collect();
        let mut sent = 0u64;
        let stream = futures_util::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            on_progress(sent, total);
            Ok::<Vec<u8>, std::io::Error>(chunk)
        });

        let resp = self
            .http
            .post(self.url("/upload"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn validate(&self, tenant: &str) -> Result<ValidateResponse, ApiError> {
        let resp = self
            .http
            .post(self.url(&format!("/validate/{tenant}")))
            .send()
            .await?;
        decode(resp).await
    }

    // ─── Reads ───────────────────────────────────────────────────────────────

    pub async fn results(&self, tenant: &str) -> Result<ResultsResponse, ApiError> {
        self.get_json(&format!("/results/{tenant}")).await
    }

    pub async fn metrics(&self, tenant: &str) -> Result<MetricsResponse, ApiError> {
        self.get_json(&format!("/metrics/{tenant}")).await
    }

    pub async fn refined(&self, tenant: &str) -> Result<RefinedResponse, ApiError> {
        self.get_json(&format!("/refined/{tenant}")).await
    }

    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get_json("/health").await
    }

    // ─── Settings ────────────────────────────────────────────────────────────

    pub async fn settings(&self, tenant: &str) -> Result<SettingsResponse, ApiError> {
        self.get_json(&format!("/settings/{tenant}")).await
    }

    pub async fn save_settings(
        &self,
        tenant: &str,
        request: &SaveSettingsRequest,
    ) -> Result<serde_json::Value, ApiError> {
        self.post_json(&format!("/settings/{tenant}"), request).await
    }

    // ─── Maintenance ─────────────────────────────────────────────────────────

    pub async fn clear_tenant(&self, tenant: &str) -> Result<ClearTenantResponse, ApiError> {
        let resp = self
            .http
            .delete(self.url(&format!("/tenant/{tenant}")))
            .send()
            .await?;
        decode(resp).await
    }

    // ─── Private ─────────────────────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.http.get(self.url(path)).send().await?;
        decode(resp).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self.http.post(self.url(path)).json(body).send().await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/health"), "http://localhost:8000/health");
    }

    #[test]
    fn test_status_error_user_message_prefers_body() {
        let err = ApiError::Status {
            status: 404,
            body: "No claims found for tenant".into(),
        };
        assert_eq!(
            err.user_message("Validation failed"),
            "No claims found for tenant"
        );

        let err = ApiError::Status {
            status: 500,
            body: "  ".into(),
        };
        assert_eq!(err.user_message("Validation failed"), "Validation failed");
    }

    #[test]
    fn test_missing_claims_file_message() {
        assert_eq!(
            ApiError::MissingClaimsFile.to_string(),
            "missing claims file"
        );
    }
}
