//! SOW display model mapped from raw deal properties.
//!
//! The portal frontend consumes this shape as JSON; field names serialize in
//! camelCase. Mapping is lenient: missing or malformed properties default to
//! empty strings, `None`, or are skipped rather than failing the whole deal.

use crate::records::Deal;
use crate::schema::ADDER_PROPERTIES;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle of a deal's SOW: `not_ready → needs_review → {approved | rejected}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SowStatus {
    NotReady,
    NeedsReview,
    Approved,
    Rejected,
}

impl SowStatus {
    /// Parse the raw `sow_status` property value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_ready" => Some(Self::NotReady),
            "needs_review" => Some(Self::NeedsReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Wire value stored in the CRM.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotReady => "not_ready",
            Self::NeedsReview => "needs_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for SowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status as shown to the homeowner. Anything that is not finalized
/// displays as pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Pending,
    Approved,
    Rejected,
}

/// Customer contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// Sales representative details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRep {
    pub name: String,
    pub email: String,
}

/// Solar system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemDetails {
    pub size: String,
    pub panel_type: String,
    pub panel_count: String,
    pub inverter_type: String,
    pub inverter_count: String,
    pub battery_type: Option<String>,
    pub battery_count: Option<String>,
}

/// Financing terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingDetails {
    pub lender: String,
    pub term_length: String,
    pub finance_type: String,
    pub interest_rate: String,
    pub total_contract_amount: String,
    pub dealer_fee_amount: Option<String>,
}

/// Commission breakdown (price-per-watt figures).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionBreakdown {
    pub gross_ppw: String,
    pub total_adders_ppw: String,
    pub net_ppw: String,
    pub total_commission: String,
}

/// Everything the portal renders for one SOW.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SowData {
    pub deal_id: String,
    pub token: String,
    pub status: DisplayStatus,
    pub generated_at: String,
    pub approved_at: Option<String>,
    pub rejected_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub customer: Customer,
    pub sales_rep: SalesRep,
    pub setter: String,
    pub lead_source: String,
    pub system: SystemDetails,
    pub financing: FinancingDetails,
    /// Priced adders only, keyed by property name.
    pub adders: BTreeMap<String, f64>,
    pub adders_total: f64,
    pub commission: CommissionBreakdown,
    pub proposal_image_url: String,
    pub plan_file_url: String,
}

impl SowData {
    /// Map a raw deal onto the display model.
    #[must_use]
    pub fn from_deal(deal: &Deal) -> Self {
        let text = |name: &str| deal.property(name).unwrap_or_default().to_string();
        let opt = |name: &str| deal.property(name).map(str::to_string);

        let status = match deal.property("sow_status").and_then(SowStatus::parse) {
            Some(SowStatus::Approved) => DisplayStatus::Approved,
            Some(SowStatus::Rejected) => DisplayStatus::Rejected,
            _ => DisplayStatus::Pending,
        };

        let mut adders = BTreeMap::new();
        for name in ADDER_PROPERTIES {
            if let Some(value) = parse_number(deal.property(name)) {
                adders.insert((*name).to_string(), value);
            }
        }

        Self {
            deal_id: deal.id.clone(),
            token: text("sow_token"),
            status,
            generated_at: deal
                .property("sow_needs_review_date")
                .map_or_else(|| Utc::now().to_rfc3339(), str::to_string),
            approved_at: opt("sow_accepted_date"),
            rejected_at: opt("sow_rejected_date"),
            rejection_reason: opt("sow_rejected_reason"),
            customer: Customer {
                name: text("dealname"),
                phone: text("customer_phone"),
                email: text("customer_email"),
                address: text("customer_address"),
            },
            sales_rep: SalesRep {
                name: text("sales_rep_name"),
                email: text("sales_rep_email"),
            },
            setter: text("setter"),
            lead_source: text("lead_source"),
            system: SystemDetails {
                size: text("system_size"),
                panel_type: text("panel_type"),
                panel_count: text("panel_count"),
                inverter_type: text("inverter_type"),
                inverter_count: text("inverter_count"),
                battery_type: opt("battery_type"),
                battery_count: opt("battery_count"),
            },
            financing: FinancingDetails {
                lender: text("lender"),
                term_length: text("term_length"),
                finance_type: text("finance_type"),
                interest_rate: text("interest_rate"),
                total_contract_amount: text("total_contract_amount"),
                dealer_fee_amount: opt("dealer_fee_amount"),
            },
            adders,
            adders_total: parse_number(deal.property("adders_total")).unwrap_or(0.0),
            commission: CommissionBreakdown {
                gross_ppw: text("gross_ppw"),
                total_adders_ppw: text("total_adders_ppw"),
                net_ppw: text("net_ppw"),
                total_commission: text("total_commission"),
            },
            proposal_image_url: text("proposal_image"),
            plan_file_url: text("plan_file"),
        }
    }
}

/// Parse a property value to a number, `None` for missing or malformed.
fn parse_number(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.trim().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn deal_with(properties: &[(&str, &str)]) -> Deal {
        let properties: HashMap<String, Option<String>> = properties
            .iter()
            .map(|(k, v)| ((*k).to_string(), Some((*v).to_string())))
            .collect();
        Deal {
            id: "deal-1".to_string(),
            properties,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn status_parses_all_lifecycle_values() {
        assert_eq!(SowStatus::parse("not_ready"), Some(SowStatus::NotReady));
        assert_eq!(SowStatus::parse("needs_review"), Some(SowStatus::NeedsReview));
        assert_eq!(SowStatus::parse("approved"), Some(SowStatus::Approved));
        assert_eq!(SowStatus::parse("rejected"), Some(SowStatus::Rejected));
        assert_eq!(SowStatus::parse("garbage"), None);
    }

    #[test]
    fn needs_review_displays_as_pending() {
        let deal = deal_with(&[("sow_status", "needs_review")]);
        assert_eq!(SowData::from_deal(&deal).status, DisplayStatus::Pending);
    }

    #[test]
    fn finalized_statuses_display_as_themselves() {
        let approved = deal_with(&[("sow_status", "approved")]);
        assert_eq!(SowData::from_deal(&approved).status, DisplayStatus::Approved);
        let rejected = deal_with(&[("sow_status", "rejected")]);
        assert_eq!(SowData::from_deal(&rejected).status, DisplayStatus::Rejected);
    }

    #[test]
    fn adders_collect_only_parseable_values() {
        let deal = deal_with(&[
            ("mpu", "1500"),
            ("new_roof", "not-a-number"),
            ("adders_total", "1500.50"),
        ]);
        let sow = SowData::from_deal(&deal);
        assert_eq!(sow.adders.get("mpu"), Some(&1500.0));
        assert!(!sow.adders.contains_key("new_roof"));
        assert!((sow.adders_total - 1500.50).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_properties_default_without_failing() {
        let deal = deal_with(&[("sow_token", "tok-1")]);
        let sow = SowData::from_deal(&deal);
        assert_eq!(sow.token, "tok-1");
        assert_eq!(sow.customer.name, "");
        assert_eq!(sow.system.battery_type, None);
        assert_eq!(sow.adders_total, 0.0);
        assert_eq!(sow.status, DisplayStatus::Pending);
    }

    #[test]
    fn serializes_camel_case_for_the_frontend() {
        let deal = deal_with(&[("sow_token", "tok-1"), ("sales_rep_name", "Ada")]);
        let json = serde_json::to_value(SowData::from_deal(&deal)).unwrap();
        assert!(json.get("dealId").is_some());
        assert!(json.get("salesRep").is_some());
        assert!(json.get("addersTotal").is_some());
        assert_eq!(json["salesRep"]["name"], "Ada");
    }

    #[test]
    fn parse_number_handles_edge_inputs() {
        assert_eq!(parse_number(None), None);
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(Some("abc")), None);
        assert_eq!(parse_number(Some("12.5")), Some(12.5));
        assert_eq!(parse_number(Some(" 7 ")), Some(7.0));
    }
}
