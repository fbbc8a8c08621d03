//! In-memory attempt store.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use certprep_core::error::RepositoryError;
use certprep_core::model::Attempt;
use certprep_core::traits::AttemptRepository;

/// Keeps attempts for the lifetime of the process.
///
/// Useful for tests and for practice runs that should leave no trace.
#[derive(Default)]
pub struct InMemoryAttemptStore {
    attempts: RwLock<Vec<Attempt>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `attempts`.
    pub fn with_attempts(attempts: Vec<Attempt>) -> Self {
        Self {
            attempts: RwLock::new(attempts),
        }
    }

    /// Number of stored attempts.
    pub async fn len(&self) -> usize {
        self.attempts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.attempts.read().await.is_empty()
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, attempt: &Attempt) -> Result<(), RepositoryError> {
        let mut attempts = self.attempts.write().await;
        if attempts.iter().any(|a| a.id == attempt.id) {
            return Err(RepositoryError::Duplicate(attempt.id));
        }
        attempts.push(attempt.clone());
        tracing::debug!("stored attempt {} in memory", attempt.id);
        Ok(())
    }

    async fn list_attempts(
        &self,
        assessment_id: &str,
        user_id: &str,
    ) -> Result<Vec<Attempt>, RepositoryError> {
        let mut matching: Vec<Attempt> = self
            .attempts
            .read()
            .await
            .iter()
            .filter(|a| a.assessment_id == assessment_id && a.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by_key(|a| a.started_at);
        Ok(matching)
    }

    async fn find_attempt(&self, id: Uuid) -> Result<Option<Attempt>, RepositoryError> {
        Ok(self
            .attempts
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn save_and_list_by_user() {
        let store = InMemoryAttemptStore::new();
        let now = Utc::now();
        let later = Attempt::begin("quiz", "alice", now);
        let earlier = Attempt::begin("quiz", "alice", now - Duration::minutes(5));
        store.save(&later).await.unwrap();
        store.save(&earlier).await.unwrap();
        store
            .save(&Attempt::begin("quiz", "bob", now))
            .await
            .unwrap();
        store
            .save(&Attempt::begin("other", "alice", now))
            .await
            .unwrap();

        let listed = store.list_attempts("quiz", "alice").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, earlier.id);
        assert_eq!(listed[1].id, later.id);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn duplicate_save_is_rejected() {
        let store = InMemoryAttemptStore::new();
        let attempt = Attempt::begin("quiz", "alice", Utc::now());
        store.save(&attempt).await.unwrap();
        let err = store.save(&attempt).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(id) if id == attempt.id));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn find_by_id() {
        let attempt = Attempt::begin("quiz", "alice", Utc::now());
        let store = InMemoryAttemptStore::with_attempts(vec![attempt.clone()]);
        assert!(store.find_attempt(attempt.id).await.unwrap().is_some());
        assert!(store.find_attempt(Uuid::new_v4()).await.unwrap().is_none());
    }
}
