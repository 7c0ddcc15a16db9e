mod agent_role;
mod client;
mod form_data;
mod sections;
mod step;
mod transaction;

pub use agent_role::AgentRole;
pub use client::{Client, ClientField, ClientType};
pub use form_data::{FormSection, TransactionFormData};
pub use sections::{
    AdditionalInfoData, AgentData, CommissionData, DocumentsData, PropertyData,
    PropertyDetailsData, SignatureData, TitleCompanyData, WarrantyData,
};
pub use step::{FormStep, TOTAL_STEPS, clamp_step};
pub use transaction::{Attachment, TransactionRecord};
