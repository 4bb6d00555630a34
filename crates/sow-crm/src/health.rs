//! Operational health summary for the CRM integration.
//!
//! Combines the provisioner's cached state and last report into one
//! serializable shape. How much of it gets disclosed to a caller is the
//! health endpoint's concern, not this module's.

use crate::provisioner::{ProvisioningReport, SchemaProvisioner};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of provisioning/connectivity state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    /// True when the last provisioning run completed without errors.
    pub healthy: bool,
    /// Whether the schema cache is currently in the provisioned state.
    pub provisioned: bool,
    pub checked_at: DateTime<Utc>,
    /// Most recent provisioning report, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<ProvisioningReport>,
}

impl HealthSummary {
    /// Coarse status string for unauthenticated callers.
    #[must_use]
    pub fn status(&self) -> &'static str {
        if self.healthy {
            "healthy"
        } else {
            "degraded"
        }
    }
}

/// Exposes provisioning status for operational monitoring.
pub struct HealthReporter {
    provisioner: SchemaProvisioner,
}

impl HealthReporter {
    #[must_use]
    pub fn new(provisioner: SchemaProvisioner) -> Self {
        Self { provisioner }
    }

    /// Run (or reuse) provisioning and summarize the outcome.
    pub async fn summary(&self) -> HealthSummary {
        let report = self.provisioner.ensure_provisioned().await;
        HealthSummary {
            healthy: report.succeeded,
            provisioned: self.provisioner.is_provisioned().await,
            checked_at: Utc::now(),
            last_run: self.provisioner.last_report().await,
        }
    }
}
