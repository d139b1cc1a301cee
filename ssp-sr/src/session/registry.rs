//! Active session registry
//!
//! Sessions live in memory only. A process restart abandons in-flight
//! sessions; every completed trial was already appended to the external
//! store, so nothing durable is lost.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::engine::SessionEngine;

/// Shared map of active sessions keyed by session id
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<SessionEngine>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, engine: Arc<SessionEngine>) {
        self.sessions.write().await.insert(engine.id(), engine);
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<SessionEngine>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::SurveySession;
    use crate::store::{RetryPolicy, RowStore};
    use async_trait::async_trait;
    use ssp_common::catalog::StimulusDescriptor;
    use ssp_common::events::EventBus;
    use ssp_common::{time, Result};

    struct NullStore;

    #[async_trait]
    impl RowStore for NullStore {
        async fn append_row(&self, _row: &[String]) -> Result<()> {
            Ok(())
        }
    }

    fn test_engine() -> Arc<SessionEngine> {
        let session = SurveySession::new(
            Uuid::new_v4(),
            "P_111111".to_string(),
            vec![StimulusDescriptor {
                id: "S01".to_string(),
                visual_ref: "i.jpg".to_string(),
                audio_ref: "a.wav".to_string(),
            }],
            0,
            None,
            time::now(),
        );
        Arc::new(SessionEngine::new(
            session,
            Arc::new(NullStore),
            RetryPolicy::default(),
            EventBus::new(8),
        ))
    }

    #[tokio::test]
    async fn insert_then_get_returns_same_engine() {
        let registry = SessionRegistry::new();
        let engine = test_engine();
        let id = engine.id();

        registry.insert(engine.clone()).await;
        assert_eq!(registry.count().await, 1);

        let found = registry.get(id).await.unwrap();
        assert_eq!(found.id(), id);
    }

    #[tokio::test]
    async fn unknown_id_returns_none() {
        let registry = SessionRegistry::new();
        assert!(registry.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn sessions_are_independent_entries() {
        let registry = SessionRegistry::new();
        let a = test_engine();
        let b = test_engine();
        registry.insert(a.clone()).await;
        registry.insert(b.clone()).await;

        assert_eq!(registry.count().await, 2);
        assert_eq!(registry.get(a.id()).await.unwrap().id(), a.id());
        assert_eq!(registry.get(b.id()).await.unwrap().id(), b.id());
    }
}
