use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which side of the deal a client sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClientType {
    Buyer,
    Seller,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "BUYER",
            Self::Seller => "SELLER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUYER" => Some(Self::Buyer),
            "SELLER" => Some(Self::Seller),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub marital_status: String,
    #[serde(rename = "type")]
    pub client_type: Option<ClientType>,
}

impl Client {
    /// An empty client with a freshly generated id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            marital_status: String::new(),
            client_type: None,
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Editable client attributes, addressed by name from the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientField {
    Name,
    Email,
    Phone,
    Address,
    MaritalStatus,
    #[serde(rename = "type")]
    Type,
}

impl ClientField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::MaritalStatus => "maritalStatus",
            Self::Type => "type",
        }
    }
}
