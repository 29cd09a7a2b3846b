//! Fire-and-forget persistence of committed positions.
//!
//! Local edits are applied and recorded in history before anything is
//! handed to the store. A store failure is logged and never rolls local
//! state back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, trace, warn};

use crate::error::PersistError;

/// The plain tuple handed to the external data layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl PositionUpdate {
    pub fn new(id: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            x: position.x,
            y: position.y,
            z: position.z,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

pub type PersistFuture = Pin<Box<dyn Future<Output = Result<(), PersistError>> + Send + 'static>>;

/// The caller-supplied asynchronous "apply position" hook.
pub trait PositionStore: Send + Sync {
    fn apply(&self, update: PositionUpdate) -> PersistFuture;
}

impl<F> PositionStore for F
where
    F: Fn(PositionUpdate) -> PersistFuture + Send + Sync,
{
    fn apply(&self, update: PositionUpdate) -> PersistFuture {
        self(update)
    }
}

#[derive(Clone, Default)]
pub struct PositionPersister {
    store: Option<Arc<dyn PositionStore>>,
    handle: Option<Handle>,
}

impl PositionPersister {
    /// Use the runtime we are created on, if any.
    pub fn new(store: Arc<dyn PositionStore>) -> Self {
        Self {
            store: Some(store),
            handle: Handle::try_current().ok(),
        }
    }

    pub fn with_handle(store: Arc<dyn PositionStore>, handle: Handle) -> Self {
        Self {
            store: Some(store),
            handle: Some(handle),
        }
    }

    /// A persister that drops every update.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Hand an update to the store without waiting on it. The returned
    /// handle is only useful to callers that want to observe completion.
    pub fn persist(&self, update: PositionUpdate) -> Option<JoinHandle<()>> {
        let store = self.store.as_ref()?;
        let Some(handle) = self.handle.as_ref() else {
            warn!("no async runtime, position of {} not persisted", update.id);
            return None;
        };

        trace!("persisting {} at ({}, {}, {})", update.id, update.x, update.y, update.z);
        let id = update.id.clone();
        let fut = store.apply(update);
        Some(handle.spawn(async move {
            if let Err(err) = fut.await {
                error!("failed to persist position of {id}: {err}");
            }
        }))
    }
}

impl std::fmt::Debug for PositionPersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionPersister")
            .field("store", &self.store.is_some())
            .field("runtime", &self.handle.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn recording() -> (Arc<Mutex<Vec<PositionUpdate>>>, Arc<dyn PositionStore>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let store = move |update: PositionUpdate| -> PersistFuture {
            let sink = sink.clone();
            Box::pin(async move {
                sink.lock().expect("lock").push(update);
                Ok(())
            })
        };
        (seen, Arc::new(store))
    }

    #[test]
    fn wire_shape_is_plain_tuple() {
        let update = PositionUpdate::new("a", Vec3::new(1.0, 0.0, -2.5));
        let json = serde_json::to_value(&update).expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "id": "a", "x": 1.0, "y": 0.0, "z": -2.5 })
        );
    }

    #[tokio::test]
    async fn updates_reach_the_store() {
        let (seen, store) = recording();
        let persister = PositionPersister::new(store);

        let task = persister
            .persist(PositionUpdate::new("a", Vec3::X))
            .expect("spawned");
        task.await.expect("join");

        assert_eq!(
            *seen.lock().expect("lock"),
            vec![PositionUpdate::new("a", Vec3::X)]
        );
    }

    #[tokio::test]
    async fn rejection_is_swallowed() {
        let store: Arc<dyn PositionStore> = Arc::new(|_update: PositionUpdate| -> PersistFuture {
            Box::pin(async { Err(PersistError::Rejected("offline".to_string())) })
        });
        let persister = PositionPersister::new(store);
        let task = persister
            .persist(PositionUpdate::new("a", Vec3::ZERO))
            .expect("spawned");
        assert!(task.await.is_ok());
    }

    #[test]
    fn no_runtime_skips() {
        let (seen, store) = recording();
        let persister = PositionPersister::new(store);
        assert!(persister.persist(PositionUpdate::new("a", Vec3::ONE)).is_none());
        assert!(seen.lock().expect("lock").is_empty());

        assert!(PositionPersister::none().persist(PositionUpdate::new("a", Vec3::ONE)).is_none());
    }
}
