//! Retry wrapper for attempt repositories.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use certprep_core::error::RepositoryError;
use certprep_core::model::Attempt;
use certprep_core::traits::AttemptRepository;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Retries transient `save` failures with exponential backoff.
///
/// Reads are passed through unchanged. A save that reports
/// [`RepositoryError::Duplicate`] after a retry is treated as success, since
/// the earlier try must have landed.
pub struct RetryingRepository {
    inner: Arc<dyn AttemptRepository>,
    max_retries: u32,
    retry_delay: Duration,
}

impl RetryingRepository {
    pub fn new(inner: Arc<dyn AttemptRepository>, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            retry_delay,
        }
    }
}

#[async_trait]
impl AttemptRepository for RetryingRepository {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn save(&self, attempt: &Attempt) -> Result<(), RepositoryError> {
        let mut delay = self.retry_delay;
        let mut retry = 0;
        loop {
            match self.inner.save(attempt).await {
                Ok(()) => return Ok(()),
                Err(RepositoryError::Duplicate(_)) if retry > 0 => return Ok(()),
                Err(e) if e.is_transient() && retry < self.max_retries => {
                    retry += 1;
                    tracing::warn!(
                        "saving attempt {} failed ({e}), retry {retry}/{} in {}ms",
                        attempt.id,
                        self.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn list_attempts(
        &self,
        assessment_id: &str,
        user_id: &str,
    ) -> Result<Vec<Attempt>, RepositoryError> {
        self.inner.list_attempts(assessment_id, user_id).await
    }

    async fn find_attempt(&self, id: Uuid) -> Result<Option<Attempt>, RepositoryError> {
        self.inner.find_attempt(id).await
    }
}
