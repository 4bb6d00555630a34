//! Authenticated HTTP transport to the CRM REST API.
//!
//! Every call goes through one of the JSON helpers below so that non-2xx
//! responses and unparseable bodies are normalized into [`CrmError`] in a
//! single place. Expected failure modes (404, 409, 401, 429) get their own
//! variants; everything else becomes [`CrmError::Api`] carrying the error
//! body's message and, when present, its structured `propertyName` hint.

use crate::error::{CrmError, CrmResult};
use crate::schema::{FieldDefinition, FieldGroup};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-request timeout applied to the underlying HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const GROUPS_PATH: &str = "/crm/v3/properties/deals/groups";
const PROPERTIES_PATH: &str = "/crm/v3/properties/deals";

/// Error body shape returned by the CRM for failed requests.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(rename = "propertyName")]
    property_name: Option<String>,
}

/// Authenticated transport for the CRM's schema and data endpoints.
pub struct CrmGateway {
    base_url: String,
    access_token: String,
    http_client: Client,
}

impl CrmGateway {
    /// Create a gateway with its own HTTP client and request timeout.
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> CrmResult<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(CrmError::InvalidConfig(
                "CRM access token is not configured".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent("sow-portal/1.0")
            .build()
            .map_err(|e| CrmError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
            http_client,
        })
    }

    /// Create a gateway with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        http_client: Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            http_client,
        }
    }

    /// Base URL this gateway talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Schema management ─────────────────────────────────────────────

    /// Create the field group. A 409 surfaces as [`CrmError::Conflict`],
    /// which callers treat as "already exists".
    pub async fn create_field_group(&self, group: &FieldGroup) -> CrmResult<()> {
        let _: serde_json::Value = self.post_json(GROUPS_PATH, group).await?;
        Ok(())
    }

    /// Create a single field. A 409 surfaces as [`CrmError::Conflict`].
    pub async fn create_field(&self, field: &FieldDefinition) -> CrmResult<()> {
        let _: serde_json::Value = self.post_json(PROPERTIES_PATH, field).await?;
        Ok(())
    }

    // ── Generic JSON helpers ──────────────────────────────────────────

    /// GET with query parameters, deserializing a JSON response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> CrmResult<T> {
        debug!(path, "CRM GET");
        let mut builder = self
            .http_client
            .get(self.url(path))
            .bearer_auth(&self.access_token);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let response = builder.send().await?;
        self.handle_response(response).await
    }

    /// POST a JSON body, deserializing a JSON response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> CrmResult<T> {
        debug!(path, "CRM POST");
        let response = self
            .http_client
            .post(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// PATCH a JSON body, deserializing a JSON response.
    pub async fn patch_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> CrmResult<T> {
        debug!(path, "CRM PATCH");
        let response = self
            .http_client
            .patch(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// POST a multipart form (file uploads), deserializing a JSON response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> CrmResult<T> {
        debug!(path, "CRM POST (multipart)");
        let response = self
            .http_client
            .post(self.url(path))
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        self.handle_response(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── Response handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> CrmResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| CrmError::Parse(format!("failed to parse response: {e}")))
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> CrmResult<T> {
        let status = response.status();

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        match status {
            StatusCode::NOT_FOUND => Err(CrmError::NotFound(error_detail(&body, status))),
            StatusCode::CONFLICT => Err(CrmError::Conflict(error_detail(&body, status))),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(retry_after_secs = ?retry_after, "CRM rate limited the request");
                Err(CrmError::RateLimited {
                    retry_after_secs: retry_after,
                })
            }
            StatusCode::UNAUTHORIZED => Err(CrmError::Auth(format!(
                "CRM rejected the access token (401): {}",
                error_detail(&body, status)
            ))),
            _ => {
                let parsed: Option<ApiErrorBody> = serde_json::from_str(&body).ok();
                let (detail, property_hint) = match parsed {
                    Some(parsed) => (
                        parsed.message.unwrap_or_else(|| error_detail(&body, status)),
                        parsed.property_name,
                    ),
                    None => (error_detail(&body, status), None),
                };
                Err(CrmError::Api {
                    status: status.as_u16(),
                    detail,
                    property_hint,
                })
            }
        }
    }
}

/// Best human-readable detail for an error body: the body's `message` field
/// when it parses, the raw body otherwise, or the HTTP status for empty bodies.
fn error_detail(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = parsed.message {
            return message;
        }
    }
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        body.to_string()
    }
}
