//! The document-store seam the gateway talks to.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use super::collection::Collection;
use super::error::GatewayError;
use super::filter::DocumentFilter;

/// Fields owned by the store. They are stripped from bodies and patches and
/// re-attached on read.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// A document as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub body: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Flattens the document into `{id, createdAt, updatedAt, ...body}`.
    pub fn into_value(self) -> Value {
        let mut body = self.body;
        body.insert("id".to_string(), Value::String(self.id));
        body.insert(
            "createdAt".to_string(),
            Value::String(format_timestamp(self.created_at)),
        );
        body.insert(
            "updatedAt".to_string(),
            Value::String(format_timestamp(self.updated_at)),
        );
        Value::Object(body)
    }
}

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Change notification published after every successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub collection: Collection,
    pub id: String,
    pub kind: ChangeKind,
}

/// Backend document store.
///
/// Implementations stamp `createdAt`/`updatedAt` themselves, treat ids as
/// opaque, and publish a [`ChangeEvent`] for every successful write.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Inserts a document under a freshly assigned id.
    async fn insert(
        &self,
        collection: Collection,
        body: Map<String, Value>,
    ) -> Result<StoredDocument, GatewayError>;

    async fn find(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, GatewayError>;

    async fn query(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<Vec<StoredDocument>, GatewayError>;

    /// Shallow-merges `patch` into an existing document. Fails with
    /// `NotFound` when the id is unknown.
    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<StoredDocument, GatewayError>;

    /// Removes a document. Unknown ids succeed without effect.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), GatewayError>;

    /// Receiver for change notifications on every collection.
    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("parse_timestamp: failed to parse '{}': {}", s, e);
            DateTime::<Utc>::default()
        })
}

/// Removes store-owned keys from a caller-supplied body or patch.
pub fn strip_reserved(mut body: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_FIELDS {
        body.remove(key);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_into_value_attaches_store_fields() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut body = Map::new();
        body.insert("name".to_string(), Value::from("Alpha"));
        let doc = StoredDocument {
            id: "p1".to_string(),
            body,
            created_at: ts,
            updated_at: ts,
        };

        let value = doc.into_value();
        assert_eq!(value["id"], "p1");
        assert_eq!(value["name"], "Alpha");
        assert_eq!(value["createdAt"], "2026-03-01T12:00:00.000000Z");
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let b = a + chrono::Duration::microseconds(1500);
        assert!(format_timestamp(a) < format_timestamp(b));
        assert_eq!(parse_timestamp(&format_timestamp(b)), b);
    }

    #[test]
    fn test_strip_reserved() {
        let mut body = Map::new();
        body.insert("id".to_string(), Value::from("forged"));
        body.insert("createdAt".to_string(), Value::from("1999"));
        body.insert("name".to_string(), Value::from("ok"));
        let body = strip_reserved(body);
        assert_eq!(body.len(), 1);
        assert!(body.contains_key("name"));
    }
}
