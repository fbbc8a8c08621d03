//! JSON file attempt store.
//!
//! All attempts live in one pretty-printed JSON array. Each save rewrites the
//! file through a sibling temp file and a rename, so a crash mid-write leaves
//! the previous contents intact.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use certprep_core::error::RepositoryError;
use certprep_core::model::Attempt;
use certprep_core::traits::AttemptRepository;

/// Attempt store backed by a single JSON file.
pub struct JsonFileAttemptStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileAttemptStore {
    /// Use the file at `path`. It is created on the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<Attempt>, RepositoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn write_all(&self, attempts: &[Attempt]) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(attempts)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for JsonFileAttemptStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn save(&self, attempt: &Attempt) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut attempts = self.read_all().await?;
        if attempts.iter().any(|a| a.id == attempt.id) {
            return Err(RepositoryError::Duplicate(attempt.id));
        }
        attempts.push(attempt.clone());
        self.write_all(&attempts).await?;
        tracing::debug!(
            "stored attempt {} in {} ({} total)",
            attempt.id,
            self.path.display(),
            attempts.len()
        );
        Ok(())
    }

    async fn list_attempts(
        &self,
        assessment_id: &str,
        user_id: &str,
    ) -> Result<Vec<Attempt>, RepositoryError> {
        let mut matching: Vec<Attempt> = self
            .read_all()
            .await?
            .into_iter()
            .filter(|a| a.assessment_id == assessment_id && a.user_id == user_id)
            .collect();
        matching.sort_by_key(|a| a.started_at);
        Ok(matching)
    }

    async fn find_attempt(&self, id: Uuid) -> Result<Option<Attempt>, RepositoryError> {
        Ok(self.read_all().await?.into_iter().find(|a| a.id == id))
    }
}
