//! Self-healing wrapper for schema-dependent CRM operations.
//!
//! Handles one specific failure mode: an operation fails because a custom
//! field it relies on no longer exists remotely (someone deleted it in the
//! CRM UI). The wrapper classifies the failure, forces a fresh provisioning
//! pass, and retries the operation exactly once. Everything else propagates
//! unchanged after a single invocation.

use crate::error::{CrmError, CrmResult};
use crate::provisioner::SchemaProvisioner;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// Ceiling for one wrapped operation attempt.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Message substrings meaning "this field does not exist on the remote
/// object type", matched case-insensitively.
///
/// Kept deliberately narrow: a bare field-name token like `propertyName`
/// would also match ordinary value-validation errors and cause spurious
/// reset/retry cycles, so it is excluded from this list. The structured
/// hint the CRM attaches to some error bodies is handled separately in
/// [`is_schema_field_error`].
const SCHEMA_FIELD_ERROR_PATTERNS: &[&str] = &[
    "property not found",
    "does not exist",
    "invalid property",
    "unknown property",
    "property_doesnt_exist",
];

/// Classify an error as a schema-missing-field failure.
///
/// Only [`CrmError::Api`] can classify: a missing deal is a 404
/// ([`CrmError::NotFound`]), so "deal does not exist" can never trigger the
/// healing path, and timeouts, rate limits, auth failures and transport
/// errors are structurally excluded. An `Api` error classifies when either
/// the error body carried a structured `propertyName` hint or its message
/// contains one of `SCHEMA_FIELD_ERROR_PATTERNS`.
#[must_use]
pub fn is_schema_field_error(error: &CrmError) -> bool {
    match error {
        CrmError::Api {
            detail,
            property_hint,
            ..
        } => {
            if property_hint.is_some() {
                return true;
            }
            let message = detail.to_lowercase();
            SCHEMA_FIELD_ERROR_PATTERNS
                .iter()
                .any(|pattern| message.contains(pattern))
        }
        _ => false,
    }
}

/// Wraps remote operations with the repair-and-retry-once strategy.
#[derive(Clone)]
pub struct SelfHealing {
    provisioner: SchemaProvisioner,
    operation_timeout: Duration,
}

impl SelfHealing {
    #[must_use]
    pub fn new(provisioner: SchemaProvisioner) -> Self {
        Self {
            provisioner,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Override the per-attempt timeout ceiling.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// The provisioner this wrapper repairs the schema with.
    #[must_use]
    pub fn provisioner(&self) -> &SchemaProvisioner {
        &self.provisioner
    }

    /// Run `operation`, repairing the schema and retrying once if it fails
    /// with a missing-field error.
    ///
    /// Non-schema failures are returned unchanged after exactly one
    /// invocation; a second schema failure is returned after exactly two.
    /// Each attempt is bounded by the operation timeout; an elapsed timeout
    /// is an ordinary failure and never triggers the healing path.
    pub async fn run<T, F, Fut>(&self, label: &str, operation: F) -> CrmResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = CrmResult<T>>,
    {
        self.provisioner.ensure_provisioned().await;

        let first_error = match self.attempt(label, &operation).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !is_schema_field_error(&first_error) {
            return Err(first_error);
        }

        warn!(
            operation = label,
            error = %first_error,
            "operation failed with a missing-field error, re-provisioning schema"
        );
        self.provisioner.reset_state().await;
        let report = self.provisioner.ensure_provisioned().await;
        if !report.fields_created.is_empty() {
            info!(
                operation = label,
                recreated = ?report.fields_created,
                "recreated missing fields"
            );
        }

        match self.attempt(label, &operation).await {
            Ok(value) => {
                info!(operation = label, "operation succeeded on retry");
                Ok(value)
            }
            Err(retry_error) => {
                error!(operation = label, error = %retry_error, "operation failed on retry");
                Err(retry_error)
            }
        }
    }

    async fn attempt<T, F, Fut>(&self, label: &str, operation: &F) -> CrmResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = CrmResult<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(CrmError::Timeout {
                label: label.to_string(),
                seconds: self.operation_timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(detail: &str) -> CrmError {
        CrmError::Api {
            status: 400,
            detail: detail.to_string(),
            property_hint: None,
        }
    }

    // ── True positives ────────────────────────────────────────────────

    #[test]
    fn classifies_property_not_found() {
        assert!(is_schema_field_error(&api_error(
            "property not found: sow_token"
        )));
    }

    #[test]
    fn classifies_does_not_exist() {
        assert!(is_schema_field_error(&api_error(
            "Property sow_status does not exist"
        )));
    }

    #[test]
    fn classifies_invalid_property() {
        assert!(is_schema_field_error(&api_error("invalid property: sow_pin")));
    }

    #[test]
    fn classifies_unknown_property() {
        assert!(is_schema_field_error(&api_error("unknown property requested")));
    }

    #[test]
    fn classifies_error_code_case_insensitively() {
        assert!(is_schema_field_error(&api_error(
            "PROPERTY_DOESNT_EXIST: sow_accepted_date"
        )));
    }

    #[test]
    fn classifies_structured_property_hint_with_bland_message() {
        let error = CrmError::Api {
            status: 400,
            detail: "Validation error".to_string(),
            property_hint: Some("sow_rejected_date".to_string()),
        };
        assert!(is_schema_field_error(&error));
    }

    // ── Adversarial near-misses ───────────────────────────────────────

    #[test]
    fn value_validation_errors_do_not_classify() {
        assert!(!is_schema_field_error(&api_error(
            "value must be a string for sow_pin"
        )));
    }

    #[test]
    fn rate_limit_messages_do_not_classify() {
        assert!(!is_schema_field_error(&api_error("rate limit exceeded")));
        assert!(!is_schema_field_error(&CrmError::RateLimited {
            retry_after_secs: Some(10),
        }));
    }

    #[test]
    fn missing_deal_does_not_classify_despite_phrase_overlap() {
        // A 404 body saying "deal does not exist" contains a matched phrase
        // but arrives as NotFound, which never classifies.
        assert!(!is_schema_field_error(&CrmError::NotFound(
            "deal does not exist".to_string()
        )));
    }

    #[test]
    fn auth_conflict_timeout_and_parse_do_not_classify() {
        assert!(!is_schema_field_error(&CrmError::Auth(
            "invalid access token".to_string()
        )));
        assert!(!is_schema_field_error(&CrmError::Conflict(
            "property already exists".to_string()
        )));
        assert!(!is_schema_field_error(&CrmError::Timeout {
            label: "search_deals".to_string(),
            seconds: 30,
        }));
        assert!(!is_schema_field_error(&CrmError::Parse(
            "unexpected end of input".to_string()
        )));
    }
}
