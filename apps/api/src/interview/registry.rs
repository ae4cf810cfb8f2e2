//! In-memory registry of live interview sessions.
//!
//! One engine per session, one writer per engine: handlers lock the
//! per-session `Mutex` for the duration of a turn, which is the explicit
//! concurrency guard against overlapping submissions.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::interview::engine::InterviewEngine;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<InterviewEngine>>>>>,
}

impl SessionRegistry {
    pub async fn insert(&self, session_id: Uuid, engine: InterviewEngine) {
        self.inner
            .write()
            .await
            .insert(session_id, Arc::new(Mutex::new(engine)));
    }

    pub async fn get(&self, session_id: Uuid) -> Option<Arc<Mutex<InterviewEngine>>> {
        self.inner.read().await.get(&session_id).cloned()
    }

    /// Drops a finished session from the registry. The durable row remains.
    pub async fn remove(&self, session_id: Uuid) {
        self.inner.write().await.remove(&session_id);
    }

    /// Evicts engines whose last client interaction is at least
    /// `max_idle_secs` old. Sessions remain registered only while scoring
    /// is pending, so abandoned interviews would otherwise pin their
    /// engines for the process lifetime. An engine locked by an in-flight
    /// request is skipped; the next sweep gets it. Returns the eviction
    /// count.
    pub async fn evict_idle(&self, max_idle_secs: i64) -> usize {
        let mut map = self.inner.write().await;
        let stale: Vec<Uuid> = map
            .iter()
            .filter_map(|(id, engine)| match engine.try_lock() {
                Ok(engine) if engine.idle_secs() >= max_idle_secs => Some(*id),
                _ => None,
            })
            .collect();
        for id in &stale {
            map.remove(id);
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::engine::DEFAULT_MAX_QUESTIONS;
    use crate::interview::speech::NullSpeech;
    use crate::llm::CompletionService;
    use crate::models::session::{Mode, SessionSetup, Turn};
    use async_trait::async_trait;

    struct NoCompletion;

    #[async_trait]
    impl CompletionService for NoCompletion {
        async fn complete(
            &self,
            _system: &str,
            _prompt: &str,
        ) -> Result<String, crate::errors::AppError> {
            Ok("ok".to_string())
        }
    }

    struct NoStore;

    #[async_trait]
    impl crate::interview::engine::TranscriptStore for NoStore {
        async fn save_turns(
            &self,
            _session_id: Uuid,
            _turns: &[Turn],
        ) -> Result<(), crate::errors::AppError> {
            Ok(())
        }

        async fn save_metrics(
            &self,
            _session_id: Uuid,
            _question_count: u32,
            _duration_secs: i64,
        ) -> Result<(), crate::errors::AppError> {
            Ok(())
        }
    }

    fn fresh_engine(session_id: Uuid) -> InterviewEngine {
        InterviewEngine::new(
            session_id,
            Uuid::new_v4(),
            SessionSetup {
                mode: Mode::Viva,
                role: None,
                subject: Some("DBMS".to_string()),
                difficulty: None,
                year: None,
            },
            String::new(),
            DEFAULT_MAX_QUESTIONS,
            Arc::new(NoCompletion),
            Arc::new(NoStore),
            Arc::new(NullSpeech::default()),
        )
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = SessionRegistry::default();
        let session_id = Uuid::new_v4();

        registry.insert(session_id, fresh_engine(session_id)).await;
        assert!(registry.get(session_id).await.is_some());

        registry.remove(session_id).await;
        assert!(registry.get(session_id).await.is_none());
    }

    #[tokio::test]
    async fn test_idle_sweep_evicts_abandoned_sessions() {
        let registry = SessionRegistry::default();
        let session_id = Uuid::new_v4();
        registry.insert(session_id, fresh_engine(session_id)).await;

        // A fresh engine is within any reasonable idle window.
        assert_eq!(registry.evict_idle(3600).await, 0);
        assert!(registry.get(session_id).await.is_some());

        // Zero-second window: everything counts as abandoned.
        assert_eq!(registry.evict_idle(0).await, 1);
        assert!(registry.get(session_id).await.is_none());
    }

    #[tokio::test]
    async fn test_idle_sweep_skips_locked_engines() {
        let registry = SessionRegistry::default();
        let session_id = Uuid::new_v4();
        registry.insert(session_id, fresh_engine(session_id)).await;

        let engine = registry.get(session_id).await.unwrap();
        let guard = engine.lock().await;
        assert_eq!(registry.evict_idle(0).await, 0);
        drop(guard);

        assert_eq!(registry.evict_idle(0).await, 1);
    }
}
