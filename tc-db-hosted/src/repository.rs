use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tc_core::{
    Attachment, RepositoryError, TransactionFormData, TransactionRecord, TransactionRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::field_map::{FieldMap, UPDATED_AT};
use crate::http::check;
use crate::storage::{StorageClient, sanitize_filename};

#[derive(Debug, Deserialize)]
struct RemoteRecord {
    id: String,
    #[serde(rename = "createdTime")]
    created_time: DateTime<Utc>,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    records: Vec<RemoteRecord>,
    #[serde(default)]
    offset: Option<String>,
}

/// Transactions kept in a hosted table (Airtable-style REST API). Field ids
/// come from a [`FieldMap`]; attachments are uploaded to object storage and
/// linked by url.
pub struct HostedRepository {
    http: reqwest::Client,
    base_url: Url,
    table: String,
    api_key: String,
    fields: FieldMap,
    storage: Option<StorageClient>,
}

fn connection_error(e: reqwest::Error) -> RepositoryError {
    RepositoryError::Connection(e.to_string())
}

fn decode_error(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Database(format!("unexpected response from record store: {e}"))
}

impl HostedRepository {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        table: &str,
        api_key: &str,
        fields: FieldMap,
        storage: Option<StorageClient>,
    ) -> Result<Self, RepositoryError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            RepositoryError::Configuration(format!("invalid record store url '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RepositoryError::Configuration(format!(
                "record store url '{base_url}' cannot be a base"
            )));
        }
        Ok(Self {
            http,
            base_url,
            table: table.to_string(),
            api_key: api_key.to_string(),
            fields,
            storage,
        })
    }

    /// `<base>/<table>` or `<base>/<table>/<record>`, with segments encoded.
    pub fn table_url(
        &self,
        record: Option<&str>,
    ) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.table);
            if let Some(record) = record {
                segments.push(record);
            }
        }
        url
    }

    fn into_record(
        &self,
        remote: RemoteRecord,
    ) -> Result<TransactionRecord, RepositoryError> {
        let form = self.fields.decode_form(&remote.fields).map_err(|e| {
            RepositoryError::Database(format!("record '{}': {e}", remote.id))
        })?;
        let attachments = self.fields.decode_attachments(&remote.fields);
        let updated_at = self
            .fields
            .id(UPDATED_AT)
            .and_then(|id| remote.fields.get(id))
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(remote.created_time);

        Ok(TransactionRecord {
            id: remote.id,
            form,
            attachments,
            created_at: remote.created_time,
            updated_at,
        })
    }

    async fn fetch_remote(
        &self,
        id: &str,
    ) -> Result<RemoteRecord, RepositoryError> {
        let response = self
            .http
            .get(self.table_url(Some(id)))
            .bearer_auth(&self.api_key)
            .query(&[("returnFieldsByFieldId", "true")])
            .send()
            .await
            .map_err(connection_error)?;
        check(response).await?.json().await.map_err(decode_error)
    }

    async fn write_fields(
        &self,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<RemoteRecord, RepositoryError> {
        let body = json!({
            "fields": fields,
            "typecast": true,
            "returnFieldsByFieldId": true,
        });
        let request = match id {
            Some(id) => self.http.patch(self.table_url(Some(id))),
            None => self.http.post(self.table_url(None)),
        };
        let response = request
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        check(response).await?.json().await.map_err(decode_error)
    }

    fn encode(
        &self,
        form: &TransactionFormData,
    ) -> Result<Map<String, Value>, RepositoryError> {
        self.fields
            .encode(form)
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }
}

#[async_trait]
impl TransactionRepository for HostedRepository {
    async fn create_transaction(
        &self,
        form: &TransactionFormData,
    ) -> Result<TransactionRecord, RepositoryError> {
        let remote = self.write_fields(None, self.encode(form)?).await?;
        info!(record_id = %remote.id, "record created in hosted table");
        self.into_record(remote)
    }

    async fn get_transaction(
        &self,
        id: &str,
    ) -> Result<TransactionRecord, RepositoryError> {
        let remote = self.fetch_remote(id).await?;
        self.into_record(remote)
    }

    async fn update_transaction(
        &self,
        id: &str,
        form: &TransactionFormData,
    ) -> Result<TransactionRecord, RepositoryError> {
        let remote = self.write_fields(Some(id), self.encode(form)?).await?;
        self.into_record(remote)
    }

    async fn delete_transaction(
        &self,
        id: &str,
    ) -> Result<(), RepositoryError> {
        let response = self
            .http
            .delete(self.table_url(Some(id)))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(connection_error)?;
        check(response).await?;
        Ok(())
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, RepositoryError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(self.table_url(None))
                .bearer_auth(&self.api_key)
                .query(&[("returnFieldsByFieldId", "true")]);
            if let Some(offset) = &offset {
                request = request.query(&[("offset", offset.as_str())]);
            }

            let response = request.send().await.map_err(connection_error)?;
            let page: RecordPage = check(response).await?.json().await.map_err(decode_error)?;
            debug!(count = page.records.len(), "fetched record page");

            for remote in page.records {
                records.push(self.into_record(remote)?);
            }
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn store_document(
        &self,
        filename: &str,
        pdf: &[u8],
    ) -> Result<Attachment, RepositoryError> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            RepositoryError::Configuration("file storage is not configured".to_string())
        })?;

        let filename = sanitize_filename(filename);
        let object_path = format!("cover-sheets/{}/{}", Uuid::new_v4(), filename);
        let url = storage.upload(&object_path, pdf, "application/pdf").await?;

        Ok(Attachment { url, filename })
    }

    async fn link_attachment(
        &self,
        id: &str,
        attachment: &Attachment,
    ) -> Result<(), RepositoryError> {
        let remote = self.fetch_remote(id).await?;
        let mut attachments = self.fields.decode_attachments(&remote.fields);
        attachments.push(attachment.clone());

        let mut fields = Map::new();
        fields.insert(
            self.fields.cover_sheet_id().to_string(),
            serde_json::to_value(&attachments).map_err(decode_error)?,
        );
        self.write_fields(Some(id), fields).await?;

        info!(record_id = id, filename = %attachment.filename, "attachment linked");
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        let response = self
            .http
            .get(self.table_url(None))
            .bearer_auth(&self.api_key)
            .query(&[("maxRecords", "1")])
            .send()
            .await
            .map_err(connection_error)?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tc_core::AgentRole;
    use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const FIELDS: &str = r#"
        [fields]
        form_json = "fldForm"
        cover_sheet = "fldPdf"
        property_address = "fldAddr"
    "#;

    fn sample_form() -> TransactionFormData {
        let mut form = TransactionFormData::new();
        form.agent_data.role = Some(AgentRole::ListingAgent);
        form.property_data.address = "1 Elm St".to_string();
        form
    }

    fn remote_json(
        id: &str,
        created: &str,
        form: &TransactionFormData,
        attachments: Value,
    ) -> Value {
        json!({
            "id": id,
            "createdTime": created,
            "fields": {
                "fldForm": serde_json::to_string(form).unwrap(),
                "fldAddr": form.property_data.address,
                "fldPdf": attachments,
            }
        })
    }

    fn repo(
        server: &MockServer,
        storage: Option<StorageClient>,
    ) -> HostedRepository {
        HostedRepository::new(
            reqwest::Client::new(),
            &format!("{}/v0/appTest", server.uri()),
            "Transactions",
            "key123",
            FieldMap::from_toml_str(FIELDS).unwrap(),
            storage,
        )
        .unwrap()
    }

    #[test]
    fn table_url_encodes_segments() {
        let repo = HostedRepository::new(
            reqwest::Client::new(),
            "https://api.example.com/v0/appX/",
            "Transaction Desk",
            "k",
            FieldMap::from_toml_str(FIELDS).unwrap(),
            None,
        )
        .unwrap();

        assert_eq!(
            repo.table_url(Some("rec1")).as_str(),
            "https://api.example.com/v0/appX/Transaction%20Desk/rec1"
        );
    }

    #[test]
    fn invalid_base_url_is_configuration_error() {
        let result = HostedRepository::new(
            reqwest::Client::new(),
            "not a url",
            "T",
            "k",
            FieldMap::from_toml_str(FIELDS).unwrap(),
            None,
        );
        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }

    #[tokio::test]
    async fn create_posts_mapped_fields() {
        let server = MockServer::start().await;
        let form = sample_form();
        Mock::given(method("POST"))
            .and(path("/v0/appTest/Transactions"))
            .and(body_partial_json(json!({ "fields": { "fldAddr": "1 Elm St" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_json(
                "recNew",
                "2025-05-01T12:00:00.000Z",
                &form,
                json!([]),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let record = repo(&server, None).create_transaction(&form).await.unwrap();

        assert_eq!(record.id, "recNew");
        assert_eq!(record.form, form);
        assert!(record.attachments.is_empty());
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/appTest/Transactions/recMissing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = repo(&server, None).get_transaction("recMissing").await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn list_follows_offsets_and_sorts_newest_first() {
        let server = MockServer::start().await;
        let form = sample_form();
        Mock::given(method("GET"))
            .and(path("/v0/appTest/Transactions"))
            .and(query_param("offset", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [remote_json("recB", "2025-05-02T00:00:00.000Z", &form, json!([]))]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v0/appTest/Transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [remote_json("recA", "2025-05-01T00:00:00.000Z", &form, json!([]))],
                "offset": "page2"
            })))
            .mount(&server)
            .await;

        let records = repo(&server, None).list_transactions().await.unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["recB", "recA"]);
    }

    #[tokio::test]
    async fn store_document_without_storage_is_configuration_error() {
        let server = MockServer::start().await;

        let result = repo(&server, None).store_document("a.pdf", b"%PDF").await;

        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }

    #[tokio::test]
    async fn attach_uploads_then_appends_attachment() {
        let server = MockServer::start().await;
        let form = sample_form();
        let existing = json!([{ "url": "https://old.example/a.pdf", "filename": "a.pdf" }]);

        Mock::given(method("GET"))
            .and(path("/v0/appTest/Transactions/rec1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_json(
                "rec1",
                "2025-05-01T00:00:00.000Z",
                &form,
                existing.clone(),
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/object/pdfs/cover-sheets/[0-9a-f-]+/Cover_Sheet\.pdf$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/v0/appTest/Transactions/rec1"))
            .and(body_partial_json(json!({ "fields": { "fldPdf": [
                { "url": "https://old.example/a.pdf", "filename": "a.pdf" }
            ] } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_json(
                "rec1",
                "2025-05-01T00:00:00.000Z",
                &form,
                existing,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let storage = StorageClient::new(
            reqwest::Client::new(),
            &format!("{}/storage", server.uri()),
            "pdfs",
            "storage-key",
        );
        let result = repo(&server, Some(storage))
            .attach_cover_sheet("rec1", "Cover Sheet.pdf", b"%PDF")
            .await;

        let attachment = result.unwrap();
        assert_eq!(attachment.filename, "Cover_Sheet.pdf");
        assert!(attachment.url.contains("/storage/object/public/pdfs/cover-sheets/"));
    }
}
