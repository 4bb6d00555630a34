//! Application state shared across all request handlers.

use crate::config::Config;
use sow_crm::files::FilesClient;
use sow_crm::gateway::DEFAULT_REQUEST_TIMEOUT;
use sow_crm::{CrmGateway, DealClient, HealthReporter, SchemaProvisioner, SelfHealing};
use std::sync::Arc;

/// Application state shared across all handlers.
///
/// Cloned per request; the inner clients are behind `Arc` so cloning is cheap.
/// All clients share one gateway and one provisioning state, so a schema
/// repair triggered by any operation is visible everywhere.
#[derive(Clone)]
pub struct AppState {
    pub deals: Arc<DealClient>,
    pub files: Arc<FilesClient>,
    pub health: Arc<HealthReporter>,

    /// Key unlocking full health diagnostics. None disables disclosure.
    pub health_check_api_key: Option<String>,
}

impl AppState {
    /// Build the full client stack from configuration.
    pub fn from_config(config: &Config) -> Result<Self, sow_crm::CrmError> {
        let gateway = Arc::new(CrmGateway::new(
            config.crm_base_url.clone(),
            config.crm_access_token.clone(),
            DEFAULT_REQUEST_TIMEOUT,
        )?);
        let provisioner = SchemaProvisioner::new(Arc::clone(&gateway));
        let healing = SelfHealing::new(provisioner.clone());

        Ok(Self {
            deals: Arc::new(DealClient::new(Arc::clone(&gateway), healing)),
            files: Arc::new(FilesClient::new(Arc::clone(&gateway))),
            health: Arc::new(HealthReporter::new(provisioner)),
            health_check_api_key: config.health_check_api_key.clone(),
        })
    }
}
