//! Form sections. Each one is owned and mutated by a single form step.
//!
//! Free-text values stay as strings exactly as the agent typed them; numeric
//! interpretation (amounts, percentages) happens in validation and in the
//! cover-sheet mapper.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AgentRole;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentData {
    pub role: Option<AgentRole>,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyData {
    pub mls_number: String,
    pub address: String,
    pub sale_price: String,
    /// Occupancy status, e.g. `VACANT` or `OCCUPIED`.
    pub status: String,
    pub county: String,
    pub property_type: String,
    pub closing_date: String,
    pub is_winterized: bool,
    pub update_mls: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommissionData {
    pub total_commission_percentage: String,
    pub listing_agent_percentage: String,
    pub buyers_agent_percentage: String,
    pub has_broker_fee: bool,
    pub broker_fee_amount: String,
    pub has_sellers_assist: bool,
    pub sellers_assist: String,
    pub is_referral: bool,
    pub referral_party: String,
    pub referral_fee: String,
    pub broker_ein: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyDetailsData {
    pub resale_cert_required: bool,
    pub hoa_name: String,
    pub co_required: bool,
    pub municipality: String,
    pub first_right_of_refusal: bool,
    pub first_right_name: String,
    pub attorney_representation: bool,
    pub attorney_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarrantyData {
    pub home_warranty: bool,
    pub warranty_company: String,
    pub warranty_cost: String,
    pub paid_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TitleCompanyData {
    pub title_company_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentsData {
    pub confirm_documents: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalInfoData {
    pub special_instructions: String,
    pub urgent_issues: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignatureData {
    pub signature: String,
    pub agent_name: String,
    pub terms_accepted: bool,
    pub info_confirmed: bool,
    pub date_submitted: Option<DateTime<Utc>>,
}
