//! Session-scoped application state.
//!
//! One [`AppStore`] exists per signed-in user. It holds the four collections
//! as shared snapshots, replaces them wholesale after every write, and
//! optionally keeps them fresh through gateway live queries.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::Instrument;

use super::error::StoreError;
use super::events::StoreEvent;
use crate::gateway::{Collection, DataGateway, Document, DocumentFilter, GatewayError};
use crate::model::{
    Category, CategoryPatch, Employee, EmployeePatch, Identity, NewCategory, NewEmployee,
    NewProject, NewTask, Project, ProjectPatch, Task, TaskPatch,
};
use crate::subscription::Subscription;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Which projects a session loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreScope {
    /// Only projects created by the signed-in user.
    #[default]
    Owner,
    /// Every project in the backend.
    All,
}

/// Point-in-time view of the store. Cloning only bumps reference counts.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub projects: Arc<Vec<Project>>,
    pub tasks: Arc<Vec<Task>>,
    pub categories: Arc<Vec<Category>>,
    pub employees: Arc<Vec<Employee>>,
    /// Set only while [`AppStore::load_all`] runs.
    pub loading: bool,
    /// The most recent error message, if any.
    pub error: Option<String>,
}

/// Maps an entity type to its slot in the snapshot.
trait Cached: Document {
    fn slot(snapshot: &StoreSnapshot) -> &Arc<Vec<Self>>;
    fn slot_mut(snapshot: &mut StoreSnapshot) -> &mut Arc<Vec<Self>>;
}

macro_rules! cached {
    ($ty:ty, $field:ident) => {
        impl Cached for $ty {
            fn slot(snapshot: &StoreSnapshot) -> &Arc<Vec<Self>> {
                &snapshot.$field
            }

            fn slot_mut(snapshot: &mut StoreSnapshot) -> &mut Arc<Vec<Self>> {
                &mut snapshot.$field
            }
        }
    };
}

cached!(Project, projects);
cached!(Task, tasks);
cached!(Category, categories);
cached!(Employee, employees);

pub struct AppStore {
    gateway: DataGateway,
    identity: Identity,
    scope: StoreScope,
    state: RwLock<StoreSnapshot>,
    events: broadcast::Sender<StoreEvent>,
    live: Mutex<Vec<Subscription>>,
    torn_down: AtomicBool,
}

impl AppStore {
    pub fn new(gateway: DataGateway, identity: Identity, scope: StoreScope) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            gateway,
            identity,
            scope,
            state: RwLock::new(StoreSnapshot::default()),
            events,
            live: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn scope(&self) -> StoreScope {
        self.scope
    }

    pub fn gateway(&self) -> &DataGateway {
        &self.gateway
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreSnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.read().clone()
    }

    pub fn projects(&self) -> Arc<Vec<Project>> {
        Arc::clone(&self.read().projects)
    }

    pub fn tasks(&self) -> Arc<Vec<Task>> {
        Arc::clone(&self.read().tasks)
    }

    pub fn categories(&self) -> Arc<Vec<Category>> {
        Arc::clone(&self.read().categories)
    }

    pub fn employees(&self) -> Arc<Vec<Employee>> {
        Arc::clone(&self.read().employees)
    }

    pub fn loading(&self) -> bool {
        self.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn clear_error(&self) {
        self.set_error(None);
    }

    /// Change notifications. Receivers that fall behind see `Lagged` and
    /// should re-read the snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    fn emit(&self, event: StoreEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn set_loading(&self, loading: bool) {
        self.write().loading = loading;
        self.emit(StoreEvent::LoadingChanged(loading));
    }

    fn set_error(&self, error: Option<String>) {
        self.write().error = error.clone();
        self.emit(StoreEvent::ErrorChanged(error));
    }

    fn record_error(&self, err: &GatewayError) {
        log::error!("Store operation failed: {}", err);
        self.set_error(Some(err.to_string()));
    }

    fn replace<E: Cached>(&self, items: Vec<E>) {
        *E::slot_mut(&mut self.write()) = Arc::new(items);
        self.emit(StoreEvent::CollectionReplaced(E::COLLECTION));
    }

    /// Filter applied when loading a collection for this session.
    pub fn filter_for(&self, collection: Collection) -> DocumentFilter {
        match (collection, self.scope) {
            (Collection::Projects, StoreScope::Owner) => {
                DocumentFilter::new().eq("createdBy", self.identity.uid.as_str())
            }
            _ => DocumentFilter::default(),
        }
    }

    async fn fetch<E: Cached>(&self) -> Result<(), GatewayError> {
        let items = self
            .gateway
            .list_filtered::<E>(&self.filter_for(E::COLLECTION))
            .await?;
        self.replace(items);
        Ok(())
    }

    /// Loads every collection. A collection that fails stays as it was
    /// (empty on first load) and its error lands in the error slot; the
    /// other collections still load.
    pub async fn load_all(&self) {
        let uid = self.identity.uid.clone();
        async {
            self.set_loading(true);
            let (projects, tasks, categories, employees) = tokio::join!(
                self.fetch::<Project>(),
                self.fetch::<Task>(),
                self.fetch::<Category>(),
                self.fetch::<Employee>(),
            );

            for (collection, result) in [
                (Collection::Projects, projects),
                (Collection::Tasks, tasks),
                (Collection::Categories, categories),
                (Collection::Employees, employees),
            ] {
                if let Err(e) = result {
                    log::error!("Failed to load {}: {}", collection, e);
                    self.set_error(Some(e.to_string()));
                }
            }
            self.set_loading(false);
        }
        .instrument(tracing::info_span!("store.load_all", uid = %uid))
        .await
    }

    /// Reloads one collection wholesale.
    pub async fn reload(&self, collection: Collection) -> Result<(), StoreError> {
        let result = match collection {
            Collection::Projects => self.fetch::<Project>().await,
            Collection::Tasks => self.fetch::<Task>().await,
            Collection::Categories => self.fetch::<Category>().await,
            Collection::Employees => self.fetch::<Employee>().await,
        };
        result.map_err(|e| {
            self.record_error(&e);
            StoreError::from(e)
        })
    }

    /// Runs a gateway write, then reloads the collection. A failed write is
    /// recorded and returned. A failed reload after a successful write is
    /// recorded but does not fail the write.
    async fn mutate<T, Fut>(&self, collection: Collection, op: Fut) -> Result<T, StoreError>
    where
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        if self.is_torn_down() {
            return Err(StoreError::TornDown);
        }
        match op.await {
            Ok(value) => {
                if let Err(e) = self.reload(collection).await {
                    log::warn!("Reload of {} after write failed: {}", collection, e);
                }
                Ok(value)
            }
            Err(e) => {
                self.record_error(&e);
                Err(e.into())
            }
        }
    }

    pub async fn create_project(&self, mut draft: NewProject) -> Result<String, StoreError> {
        draft
            .created_by
            .get_or_insert_with(|| self.identity.uid.clone());
        if draft.created_by_name.is_none() {
            draft.created_by_name = self.identity.display_name.clone();
        }
        if draft.created_by_email.is_none() {
            draft.created_by_email = self.identity.email.clone();
        }
        self.mutate(Collection::Projects, self.gateway.create::<Project>(&draft))
            .await
    }

    pub async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<(), StoreError> {
        self.mutate(Collection::Projects, self.gateway.update::<Project>(id, patch))
            .await
    }

    /// Deletes the project only. Its tasks stay in the task collection.
    pub async fn delete_project(&self, id: &str) -> Result<(), StoreError> {
        self.mutate(Collection::Projects, self.gateway.delete::<Project>(id))
            .await
    }

    pub async fn create_task(&self, mut draft: NewTask) -> Result<String, StoreError> {
        draft
            .created_by
            .get_or_insert_with(|| self.identity.uid.clone());
        if draft.created_by_name.is_none() {
            draft.created_by_name = Some(self.identity.label().to_string());
        }
        self.mutate(Collection::Tasks, self.gateway.create::<Task>(&draft))
            .await
    }

    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        self.mutate(Collection::Tasks, self.gateway.update::<Task>(id, patch))
            .await
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        self.mutate(Collection::Tasks, self.gateway.delete::<Task>(id))
            .await
    }

    pub async fn create_category(&self, draft: NewCategory) -> Result<String, StoreError> {
        self.mutate(Collection::Categories, self.gateway.create::<Category>(&draft))
            .await
    }

    pub async fn update_category(&self, id: &str, patch: &CategoryPatch) -> Result<(), StoreError> {
        self.mutate(Collection::Categories, self.gateway.update::<Category>(id, patch))
            .await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), StoreError> {
        self.mutate(Collection::Categories, self.gateway.delete::<Category>(id))
            .await
    }

    pub async fn create_employee(&self, mut draft: NewEmployee) -> Result<String, StoreError> {
        draft
            .created_by
            .get_or_insert_with(|| self.identity.uid.clone());
        self.mutate(Collection::Employees, self.gateway.create::<Employee>(&draft))
            .await
    }

    /// Updates the employee document. Snapshots already copied onto
    /// projects keep their old values.
    pub async fn update_employee(&self, id: &str, patch: &EmployeePatch) -> Result<(), StoreError> {
        self.mutate(Collection::Employees, self.gateway.update::<Employee>(id, patch))
            .await
    }

    pub async fn delete_employee(&self, id: &str) -> Result<(), StoreError> {
        self.mutate(Collection::Employees, self.gateway.delete::<Employee>(id))
            .await
    }

    async fn lookup<E: Cached>(&self, id: &str) -> Result<E, StoreError> {
        let cached = E::slot(&self.read()).iter().find(|e| e.id() == id).cloned();
        match cached {
            Some(item) => Ok(item),
            None => Ok(self.gateway.get::<E>(id).await?),
        }
    }

    /// A project from the snapshot, falling back to the gateway.
    pub async fn project(&self, id: &str) -> Result<Project, StoreError> {
        self.lookup(id).await
    }

    /// A task from the snapshot, falling back to the gateway.
    pub async fn task(&self, id: &str) -> Result<Task, StoreError> {
        self.lookup(id).await
    }

    pub async fn category(&self, id: &str) -> Result<Category, StoreError> {
        self.lookup(id).await
    }

    pub async fn employee(&self, id: &str) -> Result<Employee, StoreError> {
        self.lookup(id).await
    }

    fn live_query<E: Cached>(self: &Arc<Self>) -> Subscription {
        let store: Weak<AppStore> = Arc::downgrade(self);
        self.gateway
            .subscribe::<E, _>(self.filter_for(E::COLLECTION), move |items| {
                if let Some(store) = store.upgrade() {
                    store.replace(items);
                }
            })
    }

    /// Registers one live query per collection. Calling it again while
    /// queries are active does nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_live_sync(self: &Arc<Self>) {
        if self.is_torn_down() {
            log::warn!("Live sync requested on a torn-down store");
            return;
        }
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if !live.is_empty() {
            log::debug!("Live sync already running");
            return;
        }
        live.push(self.live_query::<Project>());
        live.push(self.live_query::<Task>());
        live.push(self.live_query::<Category>());
        live.push(self.live_query::<Employee>());
        log::info!("Live sync started for {}", self.identity.label());
    }

    /// Number of registered live queries.
    pub fn live_query_count(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Cancels live queries and rejects further writes.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
        let subscriptions =
            std::mem::take(&mut *self.live.lock().unwrap_or_else(PoisonError::into_inner));
        let count = subscriptions.len();
        for mut subscription in subscriptions {
            subscription.cancel();
        }
        log::info!(
            "Store for {} torn down ({} live queries cancelled)",
            self.identity.label(),
            count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: uid.to_string(),
            display_name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            photo_url: None,
        }
    }

    fn store(scope: StoreScope) -> AppStore {
        let gateway = DataGateway::sqlite(Database::open_in_memory().unwrap());
        AppStore::new(gateway, identity("u1"), scope)
    }

    #[tokio::test]
    async fn test_create_project_stamps_creator_and_reloads() {
        let store = store(StoreScope::Owner);
        let id = store
            .create_project(NewProject {
                name: "Website".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let projects = store.projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, id);
        assert_eq!(projects[0].created_by.as_deref(), Some("u1"));
        assert_eq!(projects[0].created_by_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(projects[0].created_by_email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_owner_scope_filters_projects() {
        let owner = store(StoreScope::Owner);
        owner
            .gateway()
            .create::<Project>(&NewProject {
                name: "Someone else's".to_string(),
                created_by: Some("u2".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        owner.load_all().await;
        assert!(owner.projects().is_empty());

        let all = AppStore::new(owner.gateway().clone(), identity("u1"), StoreScope::All);
        all.load_all().await;
        assert_eq!(all.projects().len(), 1);
        assert!(!all.loading());
    }

    #[tokio::test]
    async fn test_failed_update_records_error_and_returns_it() {
        let store = store(StoreScope::All);
        let err = store
            .update_task("missing", &TaskPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.error(), Some(err.to_string()));

        store.clear_error();
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_lookup_falls_back_to_gateway() {
        let store = store(StoreScope::All);
        let id = store
            .gateway()
            .create::<Task>(&NewTask {
                name: "Hidden".to_string(),
                project_id: "p1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(store.tasks().is_empty());
        assert_eq!(store.task(&id).await.unwrap().name, "Hidden");
        assert!(store.task("ghost").await.unwrap_err().is_not_found());
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_events_emitted() {
        let store = store(StoreScope::All);
        let mut events = store.subscribe();
        store.load_all().await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen.first(), Some(&StoreEvent::LoadingChanged(true)));
        assert_eq!(seen.last(), Some(&StoreEvent::LoadingChanged(false)));
        assert_eq!(
            seen.iter()
                .filter(|e| matches!(e, StoreEvent::CollectionReplaced(_)))
                .count(),
            4
        );
    }

    #[tokio::test]
    async fn test_live_sync_is_idempotent_and_teardown_rejects_writes() {
        let store = Arc::new(store(StoreScope::All));
        store.start_live_sync();
        store.start_live_sync();
        assert_eq!(store.live_query_count(), 4);

        store.teardown();
        assert_eq!(store.live_query_count(), 0);
        let err = store
            .create_category(NewCategory::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TornDown));
    }
}
