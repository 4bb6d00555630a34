//! Idempotent CRM schema provisioning.
//!
//! Ensures every field in the static schema exists remotely before the rest
//! of the app touches it, making deployment zero-configuration.
//!
//! Safety guarantees:
//! - never modifies or deletes an existing field or group (409 = skip)
//! - only creates what is missing
//! - a single bad field never blocks the rest of the run
//!
//! Concurrency: the first caller stores a shared pending future in the state;
//! concurrent callers clone and await that same future, so one run is in
//! flight at most and creation calls are never duplicated under load.

use crate::error::CrmError;
use crate::gateway::CrmGateway;
use crate::schema::{FieldDefinition, FieldGroup, REQUIRED_FIELDS, SOW_FIELD_GROUP};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Ceiling for one full provisioning pass.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one provisioning run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningReport {
    /// True iff no unexpected errors occurred. Conflicts do not count.
    pub succeeded: bool,
    /// Whether this run created the field group.
    pub group_created: bool,
    /// Names of fields created by this run, in creation order.
    pub fields_created: Vec<String>,
    /// Names of fields that already existed remotely.
    pub fields_already_present: Vec<String>,
    /// One `"<field>: <detail>"` entry per non-conflict failure.
    pub errors: Vec<String>,
    /// When the run finished.
    pub completed_at: DateTime<Utc>,
}

type SharedRun = Shared<BoxFuture<'static, ProvisioningReport>>;

#[derive(Default)]
struct StateInner {
    provisioned: bool,
    in_flight: Option<SharedRun>,
    last_report: Option<ProvisioningReport>,
}

/// Process-wide provisioning cache state.
///
/// An explicit, injectable object rather than hidden module statics, so tests
/// can create isolated instances. Constructed unprovisioned; mutated only by
/// the provisioner's single-flight path; never persisted outside the process.
#[derive(Default)]
pub struct ProvisioningState {
    inner: Mutex<StateInner>,
}

impl ProvisioningState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Guarantees that every [`FieldDefinition`] in the static schema exists
/// remotely, without ever modifying or deleting anything.
#[derive(Clone)]
pub struct SchemaProvisioner {
    gateway: Arc<CrmGateway>,
    state: Arc<ProvisioningState>,
    group: FieldGroup,
    fields: &'static [FieldDefinition],
    run_timeout: Duration,
}

impl SchemaProvisioner {
    /// Create a provisioner for the SOW schema with a fresh state.
    #[must_use]
    pub fn new(gateway: Arc<CrmGateway>) -> Self {
        Self::with_state(gateway, Arc::new(ProvisioningState::new()))
    }

    /// Create a provisioner backed by an existing (possibly shared) state.
    #[must_use]
    pub fn with_state(gateway: Arc<CrmGateway>, state: Arc<ProvisioningState>) -> Self {
        Self {
            gateway,
            state,
            group: SOW_FIELD_GROUP,
            fields: REQUIRED_FIELDS,
            run_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }

    /// Override the schema to provision.
    #[must_use]
    pub fn with_schema(mut self, group: FieldGroup, fields: &'static [FieldDefinition]) -> Self {
        self.group = group;
        self.fields = fields;
        self
    }

    /// Override the run timeout ceiling.
    #[must_use]
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Ensure all required fields exist, returning the governing report.
    ///
    /// Idempotent and safe to call concurrently:
    /// - already provisioned: returns the retained report, zero remote calls
    /// - run in flight: awaits that same run instead of starting another
    /// - otherwise: starts a run, retains its report, and transitions to
    ///   provisioned only when the run succeeded
    ///
    /// Per-field failures are folded into the report; this function itself
    /// never fails.
    pub async fn ensure_provisioned(&self) -> ProvisioningReport {
        let run = {
            let mut inner = self.state.inner.lock().await;
            if inner.provisioned {
                if let Some(report) = &inner.last_report {
                    return report.clone();
                }
            }
            match &inner.in_flight {
                Some(run) => run.clone(),
                None => {
                    let provisioner = self.clone();
                    let run = async move { provisioner.run_provisioning().await }
                        .boxed()
                        .shared();
                    inner.in_flight = Some(run.clone());
                    run
                }
            }
        };

        let report = run.clone().await;

        // Settle the state exactly once per run. If reset_state() cleared the
        // in-flight handle while we ran, the outcome is stale and discarded.
        let mut inner = self.state.inner.lock().await;
        let current = inner
            .in_flight
            .as_ref()
            .is_some_and(|f| Shared::ptr_eq(f, &run));
        if current {
            inner.in_flight = None;
            inner.provisioned = report.succeeded;
            inner.last_report = Some(report.clone());
            if !report.succeeded {
                error!(
                    errors = ?report.errors,
                    "schema provisioning failed, will retry on next call"
                );
            }
        }
        report
    }

    /// Result of the most recent provisioning run, if any.
    pub async fn last_report(&self) -> Option<ProvisioningReport> {
        self.state.inner.lock().await.last_report.clone()
    }

    /// Whether the schema is currently known to be provisioned.
    pub async fn is_provisioned(&self) -> bool {
        self.state.inner.lock().await.provisioned
    }

    /// Force provisioning to run again on the next call.
    ///
    /// Discards the retained report and the in-flight handle. An in-flight
    /// run is not cancelled, but its outcome will no longer be recorded, and
    /// callers arriving after the reset trigger a fresh run.
    pub async fn reset_state(&self) {
        let mut inner = self.state.inner.lock().await;
        inner.provisioned = false;
        inner.in_flight = None;
        inner.last_report = None;
    }

    async fn run_provisioning(&self) -> ProvisioningReport {
        match tokio::time::timeout(self.run_timeout, self.provision_all()).await {
            Ok(report) => report,
            Err(_) => {
                warn!(
                    timeout_secs = self.run_timeout.as_secs(),
                    "schema provisioning run timed out"
                );
                ProvisioningReport {
                    succeeded: false,
                    group_created: false,
                    fields_created: Vec::new(),
                    fields_already_present: Vec::new(),
                    errors: vec![format!(
                        "provisioning run timed out after {}s",
                        self.run_timeout.as_secs()
                    )],
                    completed_at: Utc::now(),
                }
            }
        }
    }

    async fn provision_all(&self) -> ProvisioningReport {
        info!("verifying CRM field schema");

        let group_created = match self.gateway.create_field_group(&self.group).await {
            Ok(()) => {
                info!(group = self.group.key, "created field group");
                true
            }
            // Already exists.
            Err(CrmError::Conflict(_)) => false,
            Err(e) => {
                // Non-fatal: fields fall back to the default group.
                warn!(group = self.group.key, error = %e, "field group creation failed");
                false
            }
        };

        let mut fields_created = Vec::new();
        let mut fields_already_present = Vec::new();
        let mut errors = Vec::new();

        for field in self.fields {
            match self.gateway.create_field(field).await {
                Ok(()) => {
                    info!(field = field.name, "created field");
                    fields_created.push(field.name.to_string());
                }
                Err(CrmError::Conflict(_)) => {
                    fields_already_present.push(field.name.to_string());
                }
                Err(e) => errors.push(format!("{}: {e}", field.name)),
            }
        }

        if !fields_created.is_empty() {
            info!(count = fields_created.len(), "created missing fields");
        }
        info!("schema verification complete");

        ProvisioningReport {
            succeeded: errors.is_empty(),
            group_created,
            fields_created,
            fields_already_present,
            errors,
            completed_at: Utc::now(),
        }
    }
}
