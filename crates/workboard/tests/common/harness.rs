//! Test harness for isolated store execution.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, watch};

use workboard::gateway::{
    ChangeEvent, Collection, DataGateway, DocumentFilter, DocumentStore, GatewayError,
    SqliteDocumentStore, StoredDocument,
};
use workboard::identity::{IdentityError, IdentityProvider, Session};
use workboard::model::Identity;
use workboard::{AppStore, Database, StoreScope};

/// SQLite document store that fails on demand.
///
/// Reads fail per collection; writes fail globally. Failures surface as
/// `PermissionDenied`, the same as a read-only backend. Reads can also be
/// held until released, to observe state while a load is in flight.
pub struct FailingStore {
    inner: SqliteDocumentStore,
    failing_reads: Mutex<HashSet<Collection>>,
    failing_writes: AtomicBool,
    reads_paused: watch::Sender<bool>,
}

impl FailingStore {
    pub fn new(db: Database) -> Self {
        Self {
            inner: SqliteDocumentStore::new(db),
            failing_reads: Mutex::new(HashSet::new()),
            failing_writes: AtomicBool::new(false),
            reads_paused: watch::channel(false).0,
        }
    }

    pub fn pause_reads(&self, paused: bool) {
        self.reads_paused.send_replace(paused);
    }

    async fn wait_for_reads(&self) {
        let mut paused = self.reads_paused.subscribe();
        let _ = paused.wait_for(|p| !*p).await;
    }

    pub fn fail_reads(&self, collection: Collection, fail: bool) {
        let mut reads = self.failing_reads.lock().unwrap();
        if fail {
            reads.insert(collection);
        } else {
            reads.remove(&collection);
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.failing_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self, collection: Collection) -> Result<(), GatewayError> {
        if self.failing_reads.lock().unwrap().contains(&collection) {
            return Err(GatewayError::PermissionDenied(format!(
                "reads on {} are disabled",
                collection
            )));
        }
        Ok(())
    }

    fn check_write(&self, collection: Collection) -> Result<(), GatewayError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::PermissionDenied(format!(
                "writes to {} are disabled",
                collection
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert(
        &self,
        collection: Collection,
        body: Map<String, Value>,
    ) -> Result<StoredDocument, GatewayError> {
        self.check_write(collection)?;
        self.inner.insert(collection, body).await
    }

    async fn find(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, GatewayError> {
        self.wait_for_reads().await;
        self.check_read(collection)?;
        self.inner.find(collection, id).await
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<Vec<StoredDocument>, GatewayError> {
        self.wait_for_reads().await;
        self.check_read(collection)?;
        self.inner.query(collection, filter).await
    }

    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<StoredDocument, GatewayError> {
        self.check_write(collection)?;
        self.inner.merge(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), GatewayError> {
        self.check_write(collection)?;
        self.inner.delete(collection, id).await
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.changes()
    }
}

/// Identity provider whose user can be switched between calls.
pub struct FakeProvider {
    user: Mutex<Identity>,
}

impl FakeProvider {
    pub fn new(uid: &str) -> Self {
        Self {
            user: Mutex::new(user(uid)),
        }
    }

    pub fn switch_to(&self, uid: &str) {
        *self.user.lock().unwrap() = user(uid);
    }

    fn session(&self) -> Session {
        Session {
            identity: self.user.lock().unwrap().clone(),
            access_token: SecretString::from("access"),
            refresh_token: Some(SecretString::from("refresh")),
            expires_at: None,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn sign_in(&self) -> Result<Session, IdentityError> {
        Ok(self.session())
    }

    async fn refresh(&self, _session: &Session) -> Result<Session, IdentityError> {
        Ok(self.session())
    }
}

pub fn user(uid: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        display_name: Some(format!("User {}", uid)),
        email: Some(format!("{}@example.com", uid)),
        photo_url: None,
    }
}

/// Isolated environment: in-memory database behind a `FailingStore`.
pub struct TestHarness {
    pub backend: Arc<FailingStore>,
    pub gateway: DataGateway,
    pub identity: Identity,
}

impl TestHarness {
    /// Harness signed in as `u1`.
    pub fn new() -> Self {
        Self::for_user("u1")
    }

    pub fn for_user(uid: &str) -> Self {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let backend = Arc::new(FailingStore::new(db));
        let gateway = DataGateway::new(backend.clone());
        Self {
            backend,
            gateway,
            identity: user(uid),
        }
    }

    /// A store over the shared backend, not yet loaded.
    pub fn store(&self, scope: StoreScope) -> Arc<AppStore> {
        Arc::new(AppStore::new(
            self.gateway.clone(),
            self.identity.clone(),
            scope,
        ))
    }

    /// A store with every collection loaded.
    pub async fn loaded_store(&self) -> Arc<AppStore> {
        let store = self.store(StoreScope::Owner);
        store.load_all().await;
        store
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
