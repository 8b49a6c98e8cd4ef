//! Typed entity operations over a [`DocumentStore`].

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::Instrument;

use super::collection::Document;
use super::document::{DocumentStore, StoredDocument};
use super::error::GatewayError;
use super::filter::DocumentFilter;
use super::sqlite::SqliteDocumentStore;
use crate::db::Database;
use crate::model::{Project, Task};
use crate::subscription::Subscription;

/// Remote data gateway. Holds no entity state; every call goes to the store.
///
/// Cloning is cheap (inner `Arc`).
#[derive(Clone)]
pub struct DataGateway {
    store: Arc<dyn DocumentStore>,
}

fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, GatewayError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(GatewayError::Serialization(serde::ser::Error::custom(
            format!("expected a JSON object, got {}", other),
        ))),
    }
}

fn decode<E: Document>(doc: StoredDocument) -> Result<E, GatewayError> {
    Ok(serde_json::from_value(doc.into_value())?)
}

impl DataGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Gateway over the local SQLite document store.
    pub fn sqlite(db: Database) -> Self {
        Self::new(Arc::new(SqliteDocumentStore::new(db)))
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Inserts a document and returns its new id.
    pub async fn create<E: Document>(&self, draft: &E::Draft) -> Result<String, GatewayError> {
        let fields = to_fields(draft)?;
        let doc = self
            .store
            .insert(E::COLLECTION, fields)
            .instrument(tracing::info_span!("gateway.create", collection = %E::COLLECTION))
            .await?;
        log::info!("Created {} document {}", E::COLLECTION, doc.id);
        Ok(doc.id)
    }

    /// Every document of the collection in its default order.
    pub async fn list<E: Document>(&self) -> Result<Vec<E>, GatewayError> {
        self.list_filtered(&DocumentFilter::default()).await
    }

    /// Documents matching `filter`.
    ///
    /// Documents that no longer decode into `E` are skipped with a warning
    /// so one bad record does not blank a whole view.
    pub async fn list_filtered<E: Document>(
        &self,
        filter: &DocumentFilter,
    ) -> Result<Vec<E>, GatewayError> {
        let docs = self.store.query(E::COLLECTION, filter).await?;
        let mut items = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = doc.id.clone();
            match decode::<E>(doc) {
                Ok(item) => items.push(item),
                Err(e) => log::warn!("Skipping malformed {} document {}: {}", E::COLLECTION, id, e),
            }
        }
        Ok(items)
    }

    /// A single document; unknown ids are `NotFound`.
    pub async fn get<E: Document>(&self, id: &str) -> Result<E, GatewayError> {
        match self.store.find(E::COLLECTION, id).await? {
            Some(doc) => decode(doc),
            None => Err(GatewayError::NotFound {
                collection: E::COLLECTION,
                id: id.to_string(),
            }),
        }
    }

    /// Merges the set fields of `patch` into the document and refreshes
    /// `updatedAt`. An empty patch only touches `updatedAt`.
    pub async fn update<E: Document>(&self, id: &str, patch: &E::Patch) -> Result<(), GatewayError> {
        let fields = to_fields(patch)?;
        self.store
            .merge(E::COLLECTION, id, fields)
            .instrument(tracing::info_span!("gateway.update", collection = %E::COLLECTION))
            .await?;
        log::info!("Updated {} document {}", E::COLLECTION, id);
        Ok(())
    }

    /// Removes the document. Dependent documents are left in place.
    pub async fn delete<E: Document>(&self, id: &str) -> Result<(), GatewayError> {
        self.store
            .delete(E::COLLECTION, id)
            .instrument(tracing::info_span!("gateway.delete", collection = %E::COLLECTION))
            .await?;
        log::info!("Deleted {} document {}", E::COLLECTION, id);
        Ok(())
    }

    /// Live query. `callback` receives the full matching collection once
    /// right away and again after every change to the collection.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<E, F>(&self, filter: DocumentFilter, callback: F) -> Subscription
    where
        E: Document,
        F: Fn(Vec<E>) + Send + Sync + 'static,
    {
        // Subscribe before the first query so no change slips between them.
        let mut changes = self.store.changes();
        let gateway = self.clone();

        Subscription::spawn(E::COLLECTION.as_str(), move |cancelled| async move {
            let deliver = |items: Result<Vec<E>, GatewayError>| match items {
                Ok(_) if cancelled.is_set() => {}
                Ok(items) => callback(items),
                Err(e) => log::warn!("Live query on {} failed: {}", E::COLLECTION, e),
            };

            deliver(gateway.list_filtered::<E>(&filter).await);

            loop {
                match changes.recv().await {
                    Ok(event) if event.collection == E::COLLECTION => {
                        deliver(gateway.list_filtered::<E>(&filter).await);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!(
                            "Live query on {} lagged by {} events, re-querying",
                            E::COLLECTION,
                            skipped
                        );
                        deliver(gateway.list_filtered::<E>(&filter).await);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Tasks referencing a project.
    pub async fn tasks_for_project(&self, project_id: &str) -> Result<Vec<Task>, GatewayError> {
        self.list_filtered(&DocumentFilter::new().eq("projectId", project_id))
            .await
    }

    /// Projects created by a user.
    pub async fn projects_for_user(&self, uid: &str) -> Result<Vec<Project>, GatewayError> {
        self.list_filtered(&DocumentFilter::new().eq("createdBy", uid))
            .await
    }

    /// Projects whose assignee snapshots include the employee.
    pub async fn projects_assigned_to(
        &self,
        employee_id: &str,
    ) -> Result<Vec<Project>, GatewayError> {
        self.list_filtered(&DocumentFilter::new().array_contains_key("assignedTo", "id", employee_id))
            .await
    }
}
