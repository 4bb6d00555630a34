//! CRM client layer for the SOW approval portal.
//!
//! The portal stores everything about a customer's scope-of-work on custom
//! fields of a CRM deal record. This crate owns that relationship:
//!
//! - [`schema`] - static declarative list of the custom fields the portal needs
//! - [`gateway`] - authenticated HTTP transport to the CRM REST API
//! - [`provisioner`] - idempotent, concurrency-safe schema provisioning
//! - [`healing`] - self-healing wrapper that repairs missing-field failures
//! - [`records`] - deal-level operations (search, get, update, PIN check)
//! - [`sow`] - the SOW display model mapped from raw deal properties
//! - [`files`] - file upload and note attachment (not schema-dependent)
//! - [`health`] - provisioning/connectivity summary for health checks

pub mod error;
pub mod files;
pub mod gateway;
pub mod healing;
pub mod health;
pub mod provisioner;
pub mod records;
pub mod schema;
pub mod sow;

pub use error::{CrmError, CrmResult};
pub use gateway::CrmGateway;
pub use healing::{is_schema_field_error, SelfHealing};
pub use health::{HealthReporter, HealthSummary};
pub use provisioner::{ProvisioningReport, ProvisioningState, SchemaProvisioner};
pub use records::{DealClient, PinVerification};
pub use sow::{SowData, SowStatus};
