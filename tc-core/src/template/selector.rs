use thiserror::Error;

use crate::models::AgentRole;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown agent role: '{0}'")]
    UnknownRole(String),

    #[error("Template '{name}' not found in {dir}")]
    NotFound { name: String, dir: String },

    #[error("Failed to read template '{name}': {reason}")]
    Io { name: String, reason: String },

    #[error("Failed to fill template: {0}")]
    Render(String),
}

/// The three cover-sheet layouts, one per side of the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverSheetTemplate {
    Seller,
    Buyer,
    DualAgent,
}

impl CoverSheetTemplate {
    pub const ALL: [CoverSheetTemplate; 3] = [Self::Seller, Self::Buyer, Self::DualAgent];

    pub fn from_role(role: AgentRole) -> Self {
        match role {
            AgentRole::ListingAgent => Self::Seller,
            AgentRole::BuyersAgent => Self::Buyer,
            AgentRole::DualAgent => Self::DualAgent,
        }
    }

    /// Resolve a template from the role string a client sent.
    ///
    /// Anything other than the three wire names is rejected before any
    /// other work happens.
    pub fn for_role(role: &str) -> Result<Self, TemplateError> {
        AgentRole::parse(role)
            .map(Self::from_role)
            .ok_or_else(|| TemplateError::UnknownRole(role.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Seller => "Seller",
            Self::Buyer => "Buyer",
            Self::DualAgent => "DualAgent",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.html", self.name())
    }
}
