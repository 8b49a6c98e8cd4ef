//! SQLite-backed document store.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use super::collection::Collection;
use super::document::{
    format_timestamp, parse_timestamp, strip_reserved, ChangeEvent, ChangeKind, DocumentStore,
    StoredDocument,
};
use super::error::GatewayError;
use super::filter::DocumentFilter;
use crate::db::document_repo::{self, DocumentRow};
use crate::db::{Database, DatabaseError};

/// Capacity of the change channel. Slow listeners that fall further behind
/// get a lag notice and re-query.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Document store persisting JSON bodies in the local SQLite database.
pub struct SqliteDocumentStore {
    db: Database,
    changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteDocumentStore {
    pub fn new(db: Database) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { db, changes }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn publish(&self, collection: Collection, id: &str, kind: ChangeKind) {
        // No active listeners is fine.
        let _ = self.changes.send(ChangeEvent {
            collection,
            id: id.to_string(),
            kind,
        });
    }
}

/// Runs a synchronous repository call off the async executor.
async fn blocking<F, T>(f: F) -> Result<T, GatewayError>
where
    F: FnOnce() -> Result<T, DatabaseError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GatewayError::TaskJoin(e.to_string()))?
        .map_err(classify)
}

/// Separates access failures from other transport errors.
fn classify(err: DatabaseError) -> GatewayError {
    use rusqlite::ErrorCode;
    match &err {
        DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(code, _))
            if matches!(
                code.code,
                ErrorCode::ReadOnly
                    | ErrorCode::PermissionDenied
                    | ErrorCode::AuthorizationForStatementDenied
            ) =>
        {
            GatewayError::PermissionDenied(err.to_string())
        }
        _ => GatewayError::Database(err),
    }
}

fn to_document(row: DocumentRow) -> Result<StoredDocument, GatewayError> {
    let body: Map<String, Value> = serde_json::from_str(&row.body)?;
    Ok(StoredDocument {
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
        id: row.id,
        body,
    })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(
        &self,
        collection: Collection,
        body: Map<String, Value>,
    ) -> Result<StoredDocument, GatewayError> {
        let body = strip_reserved(body);
        let now = format_timestamp(Utc::now());
        let row = DocumentRow {
            id: uuid::Uuid::new_v4().to_string(),
            body: serde_json::to_string(&body)?,
            created_at: now.clone(),
            updated_at: now,
        };

        let db = self.db.clone();
        let inserted = row.clone();
        blocking(move || document_repo::insert(&db, collection.as_str(), &inserted)).await?;

        log::debug!("Inserted {} document {}", collection, row.id);
        self.publish(collection, &row.id, ChangeKind::Created);
        to_document(row)
    }

    async fn find(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, GatewayError> {
        let db = self.db.clone();
        let id = id.to_string();
        let row = blocking(move || document_repo::find_by_id(&db, collection.as_str(), &id)).await?;
        row.map(to_document).transpose()
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<Vec<StoredDocument>, GatewayError> {
        let db = self.db.clone();
        let filter = filter.clone();
        let rows = blocking(move || {
            document_repo::query(
                &db,
                collection.as_str(),
                &filter,
                collection.default_order(),
            )
        })
        .await?;
        rows.into_iter().map(to_document).collect()
    }

    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<StoredDocument, GatewayError> {
        let patch = strip_reserved(patch);
        let now = format_timestamp(Utc::now());
        let db = self.db.clone();
        let doc_id = id.to_string();
        let row = blocking(move || {
            document_repo::merge(&db, collection.as_str(), &doc_id, &patch, &now)
        })
        .await?;

        match row {
            Some(row) => {
                self.publish(collection, id, ChangeKind::Updated);
                to_document(row)
            }
            None => Err(GatewayError::NotFound {
                collection,
                id: id.to_string(),
            }),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), GatewayError> {
        let db = self.db.clone();
        let doc_id = id.to_string();
        let removed =
            blocking(move || document_repo::delete(&db, collection.as_str(), &doc_id)).await?;

        if removed {
            self.publish(collection, id, ChangeKind::Deleted);
        } else {
            log::debug!("Delete of unknown {} document {} ignored", collection, id);
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_store() -> SqliteDocumentStore {
        SqliteDocumentStore::new(Database::open_in_memory().expect("in-memory db"))
    }

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let store = test_store();
        let doc = store
            .insert(Collection::Projects, body(json!({"name": "Alpha"})))
            .await
            .unwrap();

        assert!(!doc.id.is_empty());
        assert_eq!(doc.created_at, doc.updated_at);
        assert_eq!(doc.body["name"], "Alpha");
    }

    #[tokio::test]
    async fn test_insert_ignores_caller_supplied_id() {
        let store = test_store();
        let doc = store
            .insert(
                Collection::Tasks,
                body(json!({"id": "forged", "name": "x", "projectId": "p1"})),
            )
            .await
            .unwrap();
        assert_ne!(doc.id, "forged");
        assert!(!doc.body.contains_key("id"));
    }

    #[tokio::test]
    async fn test_merge_unknown_id_is_not_found() {
        let store = test_store();
        let err = store
            .merge(Collection::Employees, "ghost", Map::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_writes_publish_changes() {
        let store = test_store();
        let mut rx = store.changes();

        let doc = store
            .insert(Collection::Categories, body(json!({"name": "Design"})))
            .await
            .unwrap();
        store
            .merge(Collection::Categories, &doc.id, body(json!({"color": "#fff"})))
            .await
            .unwrap();
        store.delete(Collection::Categories, &doc.id).await.unwrap();
        store.delete(Collection::Categories, &doc.id).await.unwrap();

        let kinds: Vec<ChangeKind> = vec![
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
        ];
        assert_eq!(
            kinds,
            vec![ChangeKind::Created, ChangeKind::Updated, ChangeKind::Deleted]
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_query_respects_collection_order() {
        let store = test_store();
        store
            .insert(Collection::Employees, body(json!({"name": "Zed"})))
            .await
            .unwrap();
        store
            .insert(Collection::Employees, body(json!({"name": "Ada"})))
            .await
            .unwrap();

        let docs = store
            .query(Collection::Employees, &DocumentFilter::default())
            .await
            .unwrap();
        assert_eq!(docs[0].body["name"], "Ada");
        assert_eq!(docs[1].body["name"], "Zed");
    }
}
