//! Static SOW field schema.
//!
//! Declarative list of the custom deal fields the portal depends on, plus the
//! field group they live under. Pure data: the provisioner walks this list in
//! declaration order and creates whatever is missing remotely. Serialization
//! matches the CRM property-create wire shape exactly (`type`, `fieldType`,
//! `groupName`, `options`, `hasUniqueValue`).

use serde::Serialize;

/// Remote value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValueType {
    #[serde(rename = "string")]
    Text,
    Number,
    Date,
    DateTime,
    Enumeration,
    Bool,
}

/// Editing control the CRM renders for a field. Passed through verbatim;
/// irrelevant to provisioning logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldInputShape {
    Text,
    Textarea,
    Select,
    Date,
    File,
    Number,
    #[serde(rename = "booleancheckbox")]
    Checkbox,
}

/// One option of an enumeration field.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumerationOption {
    pub label: &'static str,
    pub value: &'static str,
    pub display_order: u32,
}

/// Declarative definition of one custom deal field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDefinition {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub value_type: FieldValueType,
    #[serde(rename = "fieldType")]
    pub input_shape: FieldInputShape,
    #[serde(rename = "groupName")]
    pub group_key: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(rename = "options", skip_serializing_if = "Option::is_none")]
    pub enumeration_options: Option<&'static [EnumerationOption]>,
    #[serde(rename = "hasUniqueValue", skip_serializing_if = "Option::is_none")]
    pub unique_value: Option<bool>,
}

/// A named category grouping related fields in the CRM schema UI.
#[derive(Debug, Clone, Serialize)]
pub struct FieldGroup {
    #[serde(rename = "name")]
    pub key: &'static str,
    pub label: &'static str,
    #[serde(rename = "displayOrder")]
    pub display_order: u32,
}

/// The group all SOW fields belong to.
pub const SOW_FIELD_GROUP: FieldGroup = FieldGroup {
    key: "sow_approval",
    label: "SOW Approval",
    display_order: 1,
};

const STATUS_OPTIONS: &[EnumerationOption] = &[
    EnumerationOption { label: "Not Ready", value: "not_ready", display_order: 0 },
    EnumerationOption { label: "Needs Review", value: "needs_review", display_order: 1 },
    EnumerationOption { label: "Approved", value: "approved", display_order: 2 },
    EnumerationOption { label: "Rejected", value: "rejected", display_order: 3 },
];

/// All fields the portal requires, in creation order.
pub const REQUIRED_FIELDS: &[FieldDefinition] = &[
    FieldDefinition {
        name: "sow_token",
        label: "SOW Token",
        value_type: FieldValueType::Text,
        input_shape: FieldInputShape::Text,
        group_key: SOW_FIELD_GROUP.key,
        description: Some("Unique token used in SOW approval URL"),
        enumeration_options: None,
        unique_value: Some(true),
    },
    FieldDefinition {
        name: "sow_pin",
        label: "SOW PIN",
        value_type: FieldValueType::Text,
        input_shape: FieldInputShape::Text,
        group_key: SOW_FIELD_GROUP.key,
        description: Some("4-digit PIN for SOW authentication"),
        enumeration_options: None,
        unique_value: None,
    },
    FieldDefinition {
        name: "sow_status",
        label: "SOW Status",
        value_type: FieldValueType::Enumeration,
        input_shape: FieldInputShape::Select,
        group_key: SOW_FIELD_GROUP.key,
        description: Some("Current status of the SOW approval process"),
        enumeration_options: Some(STATUS_OPTIONS),
        unique_value: None,
    },
    FieldDefinition {
        name: "sow_needs_review_date",
        label: "SOW Needs Review Date",
        value_type: FieldValueType::DateTime,
        input_shape: FieldInputShape::Date,
        group_key: SOW_FIELD_GROUP.key,
        description: Some("Date when SOW was set to needs review status"),
        enumeration_options: None,
        unique_value: None,
    },
    FieldDefinition {
        name: "sow_accepted_date",
        label: "SOW Accepted Date",
        value_type: FieldValueType::DateTime,
        input_shape: FieldInputShape::Date,
        group_key: SOW_FIELD_GROUP.key,
        description: Some("Date when SOW was approved"),
        enumeration_options: None,
        unique_value: None,
    },
    FieldDefinition {
        name: "sow_rejected_date",
        label: "SOW Rejected Date",
        value_type: FieldValueType::DateTime,
        input_shape: FieldInputShape::Date,
        group_key: SOW_FIELD_GROUP.key,
        description: Some("Date when SOW was rejected"),
        enumeration_options: None,
        unique_value: None,
    },
    FieldDefinition {
        name: "sow_rejected_reason",
        label: "SOW Rejected Reason",
        value_type: FieldValueType::Text,
        input_shape: FieldInputShape::Textarea,
        group_key: SOW_FIELD_GROUP.key,
        description: Some("Reason provided for rejecting the SOW"),
        enumeration_options: None,
        unique_value: None,
    },
    FieldDefinition {
        name: "accepted_sow",
        label: "Accepted SOW",
        value_type: FieldValueType::Text,
        input_shape: FieldInputShape::File,
        group_key: SOW_FIELD_GROUP.key,
        description: Some("PDF snapshot of accepted SOW"),
        enumeration_options: None,
        unique_value: None,
    },
    FieldDefinition {
        name: "rejected_sow",
        label: "Rejected SOW",
        value_type: FieldValueType::Text,
        input_shape: FieldInputShape::File,
        group_key: SOW_FIELD_GROUP.key,
        description: Some("PDF snapshot of rejected SOW"),
        enumeration_options: None,
        unique_value: None,
    },
];

/// Core display properties fetched for every SOW lookup, excluding adders.
const CORE_DISPLAY_PROPERTIES: &[&str] = &[
    // Core SOW
    "sow_token",
    "sow_pin",
    "sow_status",
    "sow_needs_review_date",
    "sow_accepted_date",
    "sow_rejected_date",
    "sow_rejected_reason",
    // Customer
    "dealname",
    "customer_phone",
    "customer_email",
    "customer_address",
    // Sales
    "sales_rep_name",
    "sales_rep_email",
    "setter",
    "lead_source",
    // System
    "system_size",
    "panel_type",
    "panel_count",
    "inverter_type",
    "inverter_count",
    "battery_type",
    "battery_count",
    // Financing
    "lender",
    "term_length",
    "finance_type",
    "interest_rate",
    "total_contract_amount",
    "dealer_fee_amount",
    // Commission
    "gross_ppw",
    "total_adders_ppw",
    "net_ppw",
    "total_commission",
    // Files
    "proposal_image",
    "plan_file",
];

/// Per-line-item adder properties. Values are dollar amounts stored as
/// strings; `adders_total` is fetched separately.
pub const ADDER_PROPERTIES: &[&str] = &[
    "additional_wire_run",
    "battery_adder",
    "battery_inside_garage",
    "battery_on_mobile_home",
    "concrete_coated",
    "detach_and_reset",
    "ground_mount",
    "high_roof",
    "inverter_adder",
    "level2_charger_install",
    "lightreach_adder",
    "metal_roof",
    "meter_main",
    "mpu",
    "misc_electrical",
    "module_adder",
    "mounting_adder",
    "new_roof",
    "project_hats",
    "span_smart_panel",
    "solar_insure",
    "solar_insure_with_battery",
    "steep_roof",
    "structural_reinforcement",
    "tesla_ev_charger",
    "tier2_insurance",
    "tile_roof_metal_shingle",
    "travel_adder",
    "tree_trimming",
    "trench_over_100ft",
    "wallbox_charger",
    "subpanel_100a",
];

/// Every property requested when fetching a deal for SOW display.
pub fn display_properties() -> Vec<&'static str> {
    CORE_DISPLAY_PROPERTIES
        .iter()
        .chain(ADDER_PROPERTIES.iter())
        .chain(std::iter::once(&"adders_total"))
        .copied()
        .collect()
}
