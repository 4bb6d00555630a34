//! Mock CRM server using wiremock for integration testing.
//!
//! Simulates the CRM's schema-management and deal endpoints with
//! configurable success, conflict, and failure scenarios.

#![allow(dead_code)]

use serde_json::{json, Value};
use sow_crm::{CrmGateway, DealClient, SchemaProvisioner, SelfHealing};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GROUPS_PATH: &str = "/crm/v3/properties/deals/groups";
pub const PROPERTIES_PATH: &str = "/crm/v3/properties/deals";
pub const SEARCH_PATH: &str = "/crm/v3/objects/deals/search";

/// A mock CRM server plus constructors for clients pointed at it.
pub struct MockCrmServer {
    server: MockServer,
}

impl MockCrmServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Verify all mounted expectations now instead of on drop.
    pub async fn verify(&self) {
        self.server.verify().await;
    }

    pub fn gateway(&self) -> Arc<CrmGateway> {
        Arc::new(
            CrmGateway::new(self.uri(), "test-token", Duration::from_secs(5))
                .expect("gateway construction"),
        )
    }

    pub fn provisioner(&self) -> SchemaProvisioner {
        SchemaProvisioner::new(self.gateway())
    }

    /// A deal client whose provisioner and gateway share this server.
    pub fn client(&self) -> DealClient {
        let gateway = self.gateway();
        let provisioner = SchemaProvisioner::new(Arc::clone(&gateway));
        DealClient::new(gateway, SelfHealing::new(provisioner))
    }

    // ── Schema management mocks ───────────────────────────────────────

    /// Group creation succeeds, expected exactly `expect` times.
    pub async fn mock_group_created(&self, expect: u64) {
        Mock::given(method("POST"))
            .and(path(GROUPS_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "name": "sow_approval",
                "label": "SOW Approval",
            })))
            .expect(expect)
            .named("create field group")
            .mount(&self.server)
            .await;
    }

    /// Group already exists (409).
    pub async fn mock_group_conflict(&self) {
        Mock::given(method("POST"))
            .and(path(GROUPS_PATH))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "status": "error",
                "message": "Property group already exists",
                "category": "OBJECT_ALREADY_EXISTS",
            })))
            .named("field group conflict")
            .mount(&self.server)
            .await;
    }

    /// Group creation fails with a server error.
    pub async fn mock_group_failure(&self) {
        Mock::given(method("POST"))
            .and(path(GROUPS_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "status": "error",
                "message": "internal error",
            })))
            .named("field group failure")
            .mount(&self.server)
            .await;
    }

    /// Every field creation succeeds, expected exactly `expect` times.
    pub async fn mock_fields_created(&self, expect: u64) {
        Mock::given(method("POST"))
            .and(path(PROPERTIES_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "name": "created",
            })))
            .expect(expect)
            .named("create field")
            .mount(&self.server)
            .await;
    }

    /// Every field already exists (409).
    pub async fn mock_fields_conflict(&self) {
        Mock::given(method("POST"))
            .and(path(PROPERTIES_PATH))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "status": "error",
                "message": "Property already exists",
                "category": "OBJECT_ALREADY_EXISTS",
            })))
            .named("field conflict")
            .mount(&self.server)
            .await;
    }

    /// Creation of one named field fails; mounted at higher priority than
    /// the catch-all field mocks.
    pub async fn mock_field_failure(&self, field_name: &str) {
        Mock::given(method("POST"))
            .and(path(PROPERTIES_PATH))
            .and(body_partial_json(json!({ "name": field_name })))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "status": "error",
                "message": "internal error",
            })))
            .with_priority(1)
            .named("field failure")
            .mount(&self.server)
            .await;
    }

    /// Conflict-everything provisioning: schema is already fully present.
    /// The common baseline for tests that exercise deal operations.
    pub async fn mock_schema_already_present(&self) {
        self.mock_group_conflict().await;
        self.mock_fields_conflict().await;
    }

    // ── Deal endpoint mocks ───────────────────────────────────────────

    /// Search returns the given deals.
    pub async fn mock_search_results(&self, results: Vec<Value>) {
        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": results.len(),
                "results": results,
            })))
            .named("deal search")
            .mount(&self.server)
            .await;
    }

    /// The first search fails with a missing-property error body; mounted at
    /// higher priority and consumed after one use.
    pub async fn mock_search_schema_error_once(&self) {
        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": "error",
                "message": "Property \"sow_token\" does not exist",
                "propertyName": "sow_token",
            })))
            .up_to_n_times(1)
            .with_priority(1)
            .named("search schema error")
            .mount(&self.server)
            .await;
    }

    /// GET deal by id returns the given deal.
    pub async fn mock_get_deal(&self, deal_id: &str, deal: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/crm/v3/objects/deals/{deal_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(deal))
            .named("get deal")
            .mount(&self.server)
            .await;
    }

    /// PATCH deal by id returns the given deal.
    pub async fn mock_update_deal(&self, deal_id: &str, deal: Value) {
        Mock::given(method("PATCH"))
            .and(path(format!("/crm/v3/objects/deals/{deal_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(deal))
            .named("update deal")
            .mount(&self.server)
            .await;
    }

    /// Raw access for tests that mount bespoke mocks.
    pub fn server(&self) -> &MockServer {
        &self.server
    }
}

/// Build a deal JSON body with the given id and properties.
pub fn deal_json(id: &str, properties: &[(&str, &str)]) -> Value {
    let props: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
        .collect();
    json!({
        "id": id,
        "properties": props,
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-02T00:00:00Z",
    })
}
