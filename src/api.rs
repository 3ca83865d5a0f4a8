use crate::models::{ApplicationReceipt, Credentials, Grant, GrantSummary, NewApplication};
use crate::session::Session;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, info};

const CONNECT_TIMEOUT_SECS: u64 = 5;
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("not signed in or session rejected")]
    Unauthorized,

    #[error("API responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("API request failed: {0}")]
    Request(String),

    #[error("API response parse failed: {0}")]
    Decode(String),

    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim().trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = send(self.http.get(url)).await?;
        decode_json(response).await
    }

    /// An anonymous session is rejected without touching the network.
    pub async fn get_json_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        session: &Session,
    ) -> Result<T, ApiError> {
        if session.is_anonymous() {
            return Err(ApiError::Unauthorized);
        }
        let url = self.url(path);
        debug!(%url, "GET (authenticated)");
        let response = send(self.http.get(url).bearer_auth(session.token())).await?;
        decode_json(response).await
    }

    pub async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        session: Option<&Session>,
    ) -> Result<String, ApiError> {
        let url = self.url(path);
        let mut request = self.http.post(&url).json(body);
        if let Some(session) = session {
            if session.is_anonymous() {
                return Err(ApiError::Unauthorized);
            }
            request = request.bearer_auth(session.token());
        }
        debug!(%url, authenticated = session.is_some(), "POST");
        let response = send(request).await?;
        response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))
    }

    pub async fn list_grants(&self, session: &Session) -> Result<Vec<GrantSummary>, ApiError> {
        self.get_json_authed("/grants", session).await
    }

    pub async fn grant(&self, id: i64) -> Result<Grant, ApiError> {
        self.get_json(&format!("/grants/{id}")).await
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.post_json("/users/register", credentials, None).await?;
        Ok(())
    }

    pub async fn create_application(
        &self,
        session: &Session,
        grant_id: i64,
    ) -> Result<Option<i64>, ApiError> {
        let body = self
            .post_json("/applications", &NewApplication { grant_id }, Some(session))
            .await?;
        let receipt = serde_json::from_str::<ApplicationReceipt>(&body).ok();
        if let Some(receipt) = &receipt {
            info!(
                application_id = receipt.id,
                grant_id,
                status = receipt.status.as_deref().unwrap_or("unknown"),
                "application created"
            );
        }
        Ok(receipt.map(|r| r.id))
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Unauthorized);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: sanitize_body(&error_detail(&body).unwrap_or(body)),
    })
}

/// The API reports failures as `{"detail": "..."}`; prefer that text when present.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("detail")?.as_str().map(str::to_string)
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
