//! Mapping between semantic field names and the opaque field ids a hosted
//! table uses.
//!
//! The map is a TOML file:
//!
//! ```toml
//! [fields]
//! form_json = "fldq3Zc1"
//! cover_sheet = "fldP9x2b"
//! agent_name = "fld7yT0a"
//! ```
//!
//! `form_json` and `cover_sheet` are required. Every other semantic field is
//! optional and only written when mapped.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tc_core::{Attachment, TransactionFormData};
use thiserror::Error;

pub const FORM_JSON: &str = "form_json";
pub const COVER_SHEET: &str = "cover_sheet";
pub const UPDATED_AT: &str = "updated_at";

const REQUIRED: [&str; 2] = [FORM_JSON, COVER_SHEET];

type Extractor = fn(&TransactionFormData) -> String;

/// Columns lifted out of the form so the table is readable by people.
const LIFTED: [(&str, Extractor); 12] = [
    ("agent_role", |f| f.role().map(|r| r.as_str().to_string()).unwrap_or_default()),
    ("agent_name", |f| f.signature_data.agent_name.clone()),
    ("agent_email", |f| f.agent_data.email.clone()),
    ("agent_phone", |f| f.agent_data.phone.clone()),
    ("property_address", |f| f.property_data.address.clone()),
    ("mls_number", |f| f.property_data.mls_number.clone()),
    ("sale_price", |f| f.property_data.sale_price.clone()),
    ("closing_date", |f| f.property_data.closing_date.clone()),
    ("county", |f| f.property_data.county.clone()),
    ("client_names", |f| {
        f.clients
            .iter()
            .map(|c| c.name.trim())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }),
    ("title_company", |f| f.title_company_data.title_company_name.clone()),
    ("date_submitted", |f| {
        f.signature_data
            .date_submitted
            .map(|d| d.to_rfc3339())
            .unwrap_or_default()
    }),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldMapError {
    #[error("failed to read field map {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid field map: {0}")]
    Parse(String),

    #[error("field map is missing required field '{0}'")]
    Missing(&'static str),
}

#[derive(Debug, Deserialize)]
struct FieldMapFile {
    fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    fields: BTreeMap<String, String>,
}

impl FieldMap {
    pub fn from_toml_str(text: &str) -> Result<Self, FieldMapError> {
        let file: FieldMapFile =
            toml::from_str(text).map_err(|e| FieldMapError::Parse(e.to_string()))?;
        Self::new(file.fields)
    }

    pub fn load(path: &Path) -> Result<Self, FieldMapError> {
        let text = std::fs::read_to_string(path).map_err(|e| FieldMapError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn new(fields: BTreeMap<String, String>) -> Result<Self, FieldMapError> {
        for key in REQUIRED {
            if fields.get(key).is_none_or(|id| id.trim().is_empty()) {
                return Err(FieldMapError::Missing(key));
            }
        }
        Ok(Self { fields })
    }

    pub fn id(
        &self,
        semantic: &str,
    ) -> Option<&str> {
        self.fields.get(semantic).map(String::as_str)
    }

    fn required_id(
        &self,
        semantic: &str,
    ) -> &str {
        // Presence is checked in `new`.
        self.id(semantic).unwrap_or_default()
    }

    pub fn cover_sheet_id(&self) -> &str {
        self.required_id(COVER_SHEET)
    }

    /// Field payload for a create or update request.
    pub fn encode(
        &self,
        form: &TransactionFormData,
    ) -> Result<Map<String, Value>, serde_json::Error> {
        let mut out = Map::new();
        out.insert(
            self.required_id(FORM_JSON).to_string(),
            Value::String(serde_json::to_string(form)?),
        );
        for (semantic, extract) in LIFTED {
            if let Some(id) = self.id(semantic) {
                out.insert(id.to_string(), Value::String(extract(form)));
            }
        }
        Ok(out)
    }

    /// Read the form back out of a record's fields.
    pub fn decode_form(
        &self,
        fields: &Map<String, Value>,
    ) -> Result<TransactionFormData, String> {
        let raw = fields
            .get(self.required_id(FORM_JSON))
            .and_then(Value::as_str)
            .ok_or_else(|| format!("record has no '{FORM_JSON}' field"))?;
        serde_json::from_str(raw).map_err(|e| format!("invalid form JSON: {e}"))
    }

    pub fn decode_attachments(
        &self,
        fields: &Map<String, Value>,
    ) -> Vec<Attachment> {
        fields
            .get(self.cover_sheet_id())
            .and_then(|v| serde_json::from_value::<Vec<Attachment>>(v.clone()).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tc_core::AgentRole;

    use super::*;

    const SAMPLE: &str = r#"
        [fields]
        form_json = "fldForm"
        cover_sheet = "fldPdf"
        agent_role = "fldRole"
        property_address = "fldAddr"
        client_names = "fldClients"
    "#;

    fn sample_form() -> TransactionFormData {
        let mut form = TransactionFormData::new();
        form.agent_data.role = Some(AgentRole::BuyersAgent);
        form.property_data.address = "9 Elm St".to_string();
        form.clients[0].name = "Pat Lee".to_string();
        form
    }

    #[test]
    fn parses_toml_map() {
        let map = FieldMap::from_toml_str(SAMPLE).unwrap();
        assert_eq!(map.id("agent_role"), Some("fldRole"));
        assert_eq!(map.id("county"), None);
        assert_eq!(map.cover_sheet_id(), "fldPdf");
    }

    #[test]
    fn required_fields_must_be_mapped() {
        let err = FieldMap::from_toml_str("[fields]\nform_json = \"fldForm\"\n").unwrap_err();
        assert_eq!(err, FieldMapError::Missing(COVER_SHEET));

        let err = FieldMap::from_toml_str("[fields]\nform_json = \"\"\ncover_sheet = \"x\"\n")
            .unwrap_err();
        assert_eq!(err, FieldMapError::Missing(FORM_JSON));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            FieldMap::from_toml_str("fields = 3"),
            Err(FieldMapError::Parse(_))
        ));
    }

    #[test]
    fn encode_writes_only_mapped_fields() {
        let map = FieldMap::from_toml_str(SAMPLE).unwrap();

        let fields = map.encode(&sample_form()).unwrap();

        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["fldAddr", "fldClients", "fldForm", "fldRole"]);
        assert_eq!(fields["fldRole"], json!("BUYERS AGENT"));
        assert_eq!(fields["fldClients"], json!("Pat Lee"));
    }

    #[test]
    fn decode_reads_back_encoded_form() {
        let map = FieldMap::from_toml_str(SAMPLE).unwrap();
        let form = sample_form();

        let fields = map.encode(&form).unwrap();

        assert_eq!(map.decode_form(&fields).unwrap(), form);
    }

    #[test]
    fn decode_attachments_ignores_extra_keys() {
        let map = FieldMap::from_toml_str(SAMPLE).unwrap();
        let fields = json!({
            "fldPdf": [
                { "id": "att1", "url": "https://files.example/a.pdf", "filename": "a.pdf", "size": 10 }
            ]
        });

        let attachments = map.decode_attachments(fields.as_object().unwrap());

        assert_eq!(
            attachments,
            vec![Attachment {
                url: "https://files.example/a.pdf".to_string(),
                filename: "a.pdf".to_string(),
            }]
        );
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        assert!(FieldMap::load(&path).is_ok());
        assert!(matches!(
            FieldMap::load(&dir.path().join("missing.toml")),
            Err(FieldMapError::Read { .. })
        ));
    }
}
