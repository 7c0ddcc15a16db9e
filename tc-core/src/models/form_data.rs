use serde::{Deserialize, Serialize};

use super::{
    AdditionalInfoData, AgentData, AgentRole, Client, CommissionData, DocumentsData,
    PropertyData, PropertyDetailsData, SignatureData, TitleCompanyData, WarrantyData,
};

/// Everything an agent enters across the multi-step form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionFormData {
    pub agent_data: AgentData,
    pub property_data: PropertyData,
    pub clients: Vec<Client>,
    pub commission_data: CommissionData,
    pub property_details_data: PropertyDetailsData,
    pub warranty_data: WarrantyData,
    pub title_company_data: TitleCompanyData,
    pub documents_data: DocumentsData,
    pub additional_info_data: AdditionalInfoData,
    pub signature_data: SignatureData,
}

impl TransactionFormData {
    /// A blank form seeded with one empty client.
    pub fn new() -> Self {
        Self {
            agent_data: AgentData::default(),
            property_data: PropertyData::default(),
            clients: vec![Client::new()],
            commission_data: CommissionData::default(),
            property_details_data: PropertyDetailsData::default(),
            warranty_data: WarrantyData::default(),
            title_company_data: TitleCompanyData::default(),
            documents_data: DocumentsData::default(),
            additional_info_data: AdditionalInfoData::default(),
            signature_data: SignatureData::default(),
        }
    }

    pub fn role(&self) -> Option<AgentRole> {
        self.agent_data.role
    }

    pub fn client(
        &self,
        id: &str,
    ) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }
}

impl Default for TransactionFormData {
    fn default() -> Self {
        Self::new()
    }
}

/// Sections that can be patched wholesale. Clients are edited through the
/// dedicated add/remove/update operations instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormSection {
    #[serde(rename = "agentData")]
    Agent,
    #[serde(rename = "propertyData")]
    Property,
    #[serde(rename = "commissionData")]
    Commission,
    #[serde(rename = "propertyDetailsData")]
    PropertyDetails,
    #[serde(rename = "warrantyData")]
    Warranty,
    #[serde(rename = "titleCompanyData")]
    TitleCompany,
    #[serde(rename = "documentsData")]
    Documents,
    #[serde(rename = "additionalInfoData")]
    AdditionalInfo,
    #[serde(rename = "signatureData")]
    Signature,
}

impl FormSection {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Agent => "agentData",
            Self::Property => "propertyData",
            Self::Commission => "commissionData",
            Self::PropertyDetails => "propertyDetailsData",
            Self::Warranty => "warrantyData",
            Self::TitleCompany => "titleCompanyData",
            Self::Documents => "documentsData",
            Self::AdditionalInfo => "additionalInfoData",
            Self::Signature => "signatureData",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agentData" => Some(Self::Agent),
            "propertyData" => Some(Self::Property),
            "commissionData" => Some(Self::Commission),
            "propertyDetailsData" => Some(Self::PropertyDetails),
            "warrantyData" => Some(Self::Warranty),
            "titleCompanyData" => Some(Self::TitleCompany),
            "documentsData" => Some(Self::Documents),
            "additionalInfoData" => Some(Self::AdditionalInfo),
            "signatureData" => Some(Self::Signature),
            _ => None,
        }
    }
}
