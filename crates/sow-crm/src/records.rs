//! Deal-level CRM operations.
//!
//! Every operation that depends on the dynamic schema (search, get, update)
//! is routed through [`SelfHealing::run`], so a field deleted out from under
//! the portal is recreated and the call retried once. File and note calls
//! live in [`crate::files`] and are deliberately not wrapped.

use crate::error::CrmResult;
use crate::gateway::CrmGateway;
use crate::healing::SelfHealing;
use crate::schema::display_properties;
use crate::sow::{SowData, SowStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const SEARCH_PATH: &str = "/crm/v3/objects/deals/search";
const DEALS_PATH: &str = "/crm/v3/objects/deals";

const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Comparison operator for a search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    HasProperty,
    NotHasProperty,
    ContainsToken,
    NotContainsToken,
}

/// One property comparison in a search request.
#[derive(Debug, Clone, Serialize)]
pub struct SearchFilter {
    #[serde(rename = "propertyName")]
    pub property_name: String,
    pub operator: FilterOperator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl SearchFilter {
    /// Equality filter on a property.
    #[must_use]
    pub fn eq(property_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            operator: FilterOperator::Eq,
            value: Some(value.into()),
        }
    }
}

/// AND-combined group of filters. Groups themselves are OR-combined.
#[derive(Debug, Clone, Serialize)]
pub struct SearchFilterGroup {
    pub filters: Vec<SearchFilter>,
}

/// A filtered deal search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    #[serde(rename = "filterGroups")]
    pub filter_groups: Vec<SearchFilterGroup>,
    pub properties: Vec<String>,
    pub limit: u32,
}

impl SearchRequest {
    /// Search on a single filter with the given property list.
    #[must_use]
    pub fn single(filter: SearchFilter, properties: Vec<String>) -> Self {
        Self {
            filter_groups: vec![SearchFilterGroup {
                filters: vec![filter],
            }],
            properties,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Override the result limit.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// A CRM deal record: one customer's solar project.
#[derive(Debug, Clone, Deserialize)]
pub struct Deal {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, Option<String>>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

impl Deal {
    /// Non-empty value of a property, if present.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }
}

/// Response shape of the deal search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub total: u64,
    pub results: Vec<Deal>,
}

/// Outcome of verifying a PIN against a deal's stored credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinVerification {
    /// Token and PIN match a deal awaiting review.
    Verified { deal_id: String },
    /// No deal carries this token.
    UnknownToken,
    /// The deal exists but is no longer in `needs_review`; rejected even
    /// with a correct PIN so a finalized SOW cannot be re-approved.
    AlreadyFinalized {
        deal_id: String,
        status: Option<SowStatus>,
    },
    /// The supplied PIN does not match.
    WrongPin,
}

/// Domain-level deal operations for the SOW approval portal.
pub struct DealClient {
    gateway: Arc<CrmGateway>,
    healing: SelfHealing,
}

impl DealClient {
    #[must_use]
    pub fn new(gateway: Arc<CrmGateway>, healing: SelfHealing) -> Self {
        Self { gateway, healing }
    }

    /// Run a filtered deal search.
    pub async fn search_deals(&self, request: &SearchRequest) -> CrmResult<SearchResponse> {
        self.healing
            .run("search_deals", || {
                let gateway = Arc::clone(&self.gateway);
                let body = request.clone();
                async move { gateway.post_json(SEARCH_PATH, &body).await }
            })
            .await
    }

    /// Find the deal whose `sow_token` equals `token`, with the full display
    /// property list. Returns the first match or `None`.
    pub async fn find_deal_by_token(&self, token: &str) -> CrmResult<Option<Deal>> {
        let properties = display_properties()
            .into_iter()
            .map(str::to_string)
            .collect();
        let request =
            SearchRequest::single(SearchFilter::eq("sow_token", token), properties).with_limit(1);
        let response = self.search_deals(&request).await?;
        debug!(total = response.total, "token lookup complete");
        Ok(response.results.into_iter().next())
    }

    /// Fetch a deal by id with the given property list.
    pub async fn get_deal(&self, deal_id: &str, properties: &[&str]) -> CrmResult<Deal> {
        let label = format!("get_deal({deal_id})");
        let path = format!("{DEALS_PATH}/{deal_id}");
        let property_list = properties.join(",");
        self.healing
            .run(&label, || {
                let gateway = Arc::clone(&self.gateway);
                let path = path.clone();
                let query = vec![("properties", property_list.clone())];
                async move { gateway.get_json(&path, &query).await }
            })
            .await
    }

    /// Apply a partial property update to a deal.
    pub async fn update_deal(
        &self,
        deal_id: &str,
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> CrmResult<Deal> {
        let label = format!("update_deal({deal_id})");
        let path = format!("{DEALS_PATH}/{deal_id}");
        let body = serde_json::json!({ "properties": properties });
        self.healing
            .run(&label, || {
                let gateway = Arc::clone(&self.gateway);
                let path = path.clone();
                let body = body.clone();
                async move { gateway.patch_json(&path, &body).await }
            })
            .await
    }

    /// Verify a PIN for a token, gating on the deal's lifecycle status.
    ///
    /// Only deals currently in `needs_review` can verify; anything else is
    /// reported as already finalized regardless of the PIN.
    pub async fn verify_pin(&self, token: &str, pin: &str) -> CrmResult<PinVerification> {
        let Some(deal) = self.find_deal_by_token(token).await? else {
            return Ok(PinVerification::UnknownToken);
        };

        let status = deal.property("sow_status").and_then(SowStatus::parse);
        if status != Some(SowStatus::NeedsReview) {
            return Ok(PinVerification::AlreadyFinalized {
                deal_id: deal.id,
                status,
            });
        }

        if deal.property("sow_pin") != Some(pin) {
            return Ok(PinVerification::WrongPin);
        }

        Ok(PinVerification::Verified { deal_id: deal.id })
    }

    /// SOW display data for a token, or `None` when the token is unknown.
    pub async fn sow_data(&self, token: &str) -> CrmResult<Option<SowData>> {
        Ok(self
            .find_deal_by_token(token)
            .await?
            .map(|deal| SowData::from_deal(&deal)))
    }
}
