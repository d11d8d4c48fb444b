use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::item::{Item, ItemKind};
use crate::core::profile::ProfileRecord;

use super::error::BackendError;
use super::auth::TokenCell;
use super::traits::{DocumentStore, ItemQuery, NewItem, Snapshot, SnapshotReceiver};

const ITEMS: &str = "items";
const USERS: &str = "users";

/// Document-store REST client. Live queries are polled: the structured query
/// re-runs on an interval and a snapshot is emitted whenever the result set
/// changed, which preserves the full-replacement snapshot contract.
#[derive(Clone)]
pub struct RestDocumentStore {
    http: Client,
    project_id: String,
    tokens: Arc<TokenCell>,
    poll_interval: Duration,
}

impl RestDocumentStore {
    pub fn new(
        http: Client,
        project_id: String,
        tokens: Arc<TokenCell>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http,
            project_id,
            tokens,
            poll_interval,
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            self.project_id
        )
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!(
            "projects/{}/databases/(default)/documents/{}/{}",
            self.project_id, collection, id
        )
    }

    fn bearer(&self) -> Result<String, BackendError> {
        match self.tokens.get() {
            Some(token) => Ok(format!("Bearer {}", token)),
            None => Err(BackendError::NotSignedIn),
        }
    }

    /// Create a document with a server-assigned `createdAt` in one commit.
    async fn commit_with_created_at(
        &self,
        collection: &str,
        id: &str,
        fields: Value,
    ) -> Result<(), BackendError> {
        let body = json!({
            "writes": [{
                "update": {
                    "name": self.document_name(collection, id),
                    "fields": fields,
                },
                "updateTransforms": [{
                    "fieldPath": "createdAt",
                    "setToServerValue": "REQUEST_TIME",
                }],
            }],
        });

        let resp = self
            .http
            .post(format!("{}:commit", self.documents_url()))
            .header(AUTHORIZATION, self.bearer()?)
            .json(&body)
            .send()
            .await?;
        check_status(resp).await.map(|_| ())
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn create_item(&self, item: NewItem) -> Result<String, BackendError> {
        let id = Uuid::new_v4().to_string();

        let mut fields = serde_json::Map::new();
        fields.insert("userId".to_string(), string_value(&item.owner_id));
        fields.insert("type".to_string(), string_value(item.kind.as_str()));
        fields.insert("content".to_string(), string_value(&item.content));
        if let Some(status) = &item.status {
            fields.insert("status".to_string(), string_value(status));
        }

        self.commit_with_created_at(ITEMS, &id, Value::Object(fields))
            .await?;
        Ok(id)
    }

    async fn update_status(&self, id: &str, status: &str) -> Result<(), BackendError> {
        let url = format!(
            "{}/{}/{}?updateMask.fieldPaths=status&currentDocument.exists=true",
            self.documents_url(),
            ITEMS,
            id
        );
        let body = json!({ "fields": { "status": string_value(status) } });

        let resp = self
            .http
            .patch(url)
            .header(AUTHORIZATION, self.bearer()?)
            .json(&body)
            .send()
            .await?;
        check_status(resp).await.map(|_| ())
    }

    async fn delete_item(&self, id: &str) -> Result<(), BackendError> {
        let url = format!("{}/{}/{}", self.documents_url(), ITEMS, id);
        let resp = self
            .http
            .delete(url)
            .header(AUTHORIZATION, self.bearer()?)
            .send()
            .await?;
        check_status(resp).await.map(|_| ())
    }

    async fn set_profile(&self, uid: &str, profile: &ProfileRecord) -> Result<(), BackendError> {
        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), string_value(&profile.name));
        fields.insert("email".to_string(), string_value(&profile.email));
        if let Some(image) = &profile.profile_image {
            fields.insert("profile_image".to_string(), string_value(image));
        }

        self.commit_with_created_at(USERS, uid, Value::Object(fields))
            .await
    }

    async fn update_profile_fields(
        &self,
        uid: &str,
        name: Option<&str>,
        profile_image: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut mask = Vec::new();
        let mut fields = serde_json::Map::new();
        if let Some(name) = name {
            mask.push("updateMask.fieldPaths=name");
            fields.insert("name".to_string(), string_value(name));
        }
        if let Some(image) = profile_image {
            mask.push("updateMask.fieldPaths=profile_image");
            fields.insert("profile_image".to_string(), string_value(image));
        }
        if mask.is_empty() {
            return Ok(());
        }

        let url = format!(
            "{}/{}/{}?{}&currentDocument.exists=true",
            self.documents_url(),
            USERS,
            uid,
            mask.join("&")
        );
        let resp = self
            .http
            .patch(url)
            .header(AUTHORIZATION, self.bearer()?)
            .json(&json!({ "fields": Value::Object(fields) }))
            .send()
            .await?;
        check_status(resp).await.map(|_| ())
    }

    async fn profile(&self, uid: &str) -> Result<Option<ProfileRecord>, BackendError> {
        let url = format!("{}/{}/{}", self.documents_url(), USERS, uid);
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, self.bearer()?)
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: Value = serde_json::from_str(&check_status(resp).await?)
            .map_err(|e| BackendError::Network(format!("malformed document: {}", e)))?;

        let fields = doc.get("fields").cloned().unwrap_or(Value::Null);
        Ok(Some(ProfileRecord {
            name: string_field(&fields, "name").unwrap_or_default(),
            email: string_field(&fields, "email").unwrap_or_default(),
            profile_image: string_field(&fields, "profile_image"),
            created_at: timestamp_field(&fields, "createdAt"),
        }))
    }

    async fn run_query(&self, query: &ItemQuery) -> Result<Snapshot, BackendError> {
        let body = json!({ "structuredQuery": structured_query(query) });
        let resp = self
            .http
            .post(format!("{}:runQuery", self.documents_url()))
            .header(AUTHORIZATION, self.bearer()?)
            .json(&body)
            .send()
            .await?;
        let text = check_status(resp).await?;

        let rows: Vec<Value> = serde_json::from_str(&text)
            .map_err(|e| BackendError::Network(format!("malformed query response: {}", e)))?;

        let mut items = Vec::new();
        for row in &rows {
            if let Some(doc) = row.get("document") {
                match document_to_item(doc) {
                    Some(item) => items.push(item),
                    None => log::warn!("Skipping undecodable item document"),
                }
            }
        }
        Ok(items)
    }

    fn subscribe(&self, query: ItemQuery) -> SnapshotReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = self.clone();

        tokio::spawn(async move {
            let mut last: Option<Snapshot> = None;
            loop {
                if tx.is_closed() {
                    break;
                }
                match store.run_query(&query).await {
                    Ok(snapshot) => {
                        if last.as_ref() != Some(&snapshot) {
                            if tx.send(Ok(snapshot.clone())).is_err() {
                                break;
                            }
                            last = Some(snapshot);
                        }
                    }
                    Err(e) => {
                        // A dead query stays dead, matching the one-shot
                        // error delivery of the platform's listeners.
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
                tokio::time::sleep(store.poll_interval).await;
            }
        });

        rx
    }
}

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn string_field(fields: &Value, name: &str) -> Option<String> {
    fields
        .get(name)?
        .get("stringValue")?
        .as_str()
        .map(|s| s.to_string())
}

fn timestamp_field(fields: &Value, name: &str) -> Option<DateTime<Utc>> {
    let raw = fields.get(name)?.get("timestampValue")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Build the structured query for one of the three list subscriptions:
/// owner + kind, optionally a status IN restriction, newest first.
fn structured_query(query: &ItemQuery) -> Value {
    let mut filters = vec![
        field_equals("userId", &query.owner_id),
        field_equals("type", query.kind.as_str()),
    ];
    if let Some(statuses) = &query.statuses {
        let values: Vec<Value> = statuses.iter().map(|s| string_value(s)).collect();
        filters.push(json!({
            "fieldFilter": {
                "field": { "fieldPath": "status" },
                "op": "IN",
                "value": { "arrayValue": { "values": values } },
            }
        }));
    }

    json!({
        "from": [{ "collectionId": ITEMS }],
        "where": {
            "compositeFilter": { "op": "AND", "filters": filters }
        },
        "orderBy": [{
            "field": { "fieldPath": "createdAt" },
            "direction": "DESCENDING",
        }],
    })
}

fn field_equals(path: &str, value: &str) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": path },
            "op": "EQUAL",
            "value": { "stringValue": value },
        }
    })
}

fn document_to_item(doc: &Value) -> Option<Item> {
    let name = doc.get("name")?.as_str()?;
    let id = name.rsplit('/').next()?.to_string();
    let fields = doc.get("fields")?;

    let kind = ItemKind::from_str(&string_field(fields, "type")?)?;
    Some(Item {
        id,
        owner_id: string_field(fields, "userId")?,
        kind,
        content: string_field(fields, "content").unwrap_or_default(),
        status: string_field(fields, "status"),
        created_at: timestamp_field(fields, "createdAt"),
    })
}

/// Read the body, mapping non-success responses to the error taxonomy. A
/// `FAILED_PRECONDITION` on a composite query means the index is missing and
/// must stay distinguishable.
async fn check_status(resp: reqwest::Response) -> Result<String, BackendError> {
    let status = resp.status();
    let text = resp.text().await?;
    if status.is_success() {
        return Ok(text);
    }
    Err(decode_store_error(status.as_u16(), &text))
}

fn decode_store_error(status: u16, body: &str) -> BackendError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| {
        if let Some(arr) = v.as_array() {
            arr.first()?.get("error")
        } else {
            v.get("error")
        }
    });

    if let Some(error) = error {
        let code = error.get("status").and_then(|s| s.as_str()).unwrap_or("");
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or(body)
            .to_string();
        if code == "FAILED_PRECONDITION" {
            return BackendError::IndexRequired(message);
        }
        return BackendError::Api { status, message };
    }

    BackendError::Api {
        status,
        message: body.to_string(),
    }
}
