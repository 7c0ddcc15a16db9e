use serde::{Deserialize, Serialize};

/// The agent's side of the transaction. Drives conditional validation in
/// every step after the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    #[serde(rename = "LISTING AGENT")]
    ListingAgent,
    #[serde(rename = "BUYERS AGENT")]
    BuyersAgent,
    #[serde(rename = "DUAL AGENT")]
    DualAgent,
}

impl AgentRole {
    pub const ALL: [AgentRole; 3] = [Self::ListingAgent, Self::BuyersAgent, Self::DualAgent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListingAgent => "LISTING AGENT",
            Self::BuyersAgent => "BUYERS AGENT",
            Self::DualAgent => "DUAL AGENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "LISTING AGENT" => Some(Self::ListingAgent),
            "BUYERS AGENT" => Some(Self::BuyersAgent),
            "DUAL AGENT" => Some(Self::DualAgent),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ListingAgent => "Listing Agent",
            Self::BuyersAgent => "Buyer's Agent",
            Self::DualAgent => "Dual Agent",
        }
    }

    /// Listing and dual agents represent the seller side.
    pub fn represents_seller(&self) -> bool {
        matches!(self, Self::ListingAgent | Self::DualAgent)
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
