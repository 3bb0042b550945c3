use async_trait::async_trait;
use jiff::Timestamp;
use pinhole_core::repository::{ReadRepository, Repository, Result, VisitUpdate};
use pinhole_core::{Lookup, ShortCode, ShortLink, StorageError, Visit};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// A repository decorator that bounds every operation with a timeout.
///
/// An operation that does not finish in time fails with
/// [`StorageError::Timeout`], which the services surface as a retryable
/// `StoreUnavailable` error.
#[derive(Debug, Clone)]
pub struct TimeoutRepository<R> {
    inner: R,
    timeout: Duration,
}

impl<R> TimeoutRepository<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Returns a reference to the inner repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "storage operation timed out"
                );
                Err(StorageError::Timeout(format!(
                    "{operation} exceeded {:?}",
                    self.timeout
                )))
            }
        }
    }
}

#[async_trait]
impl<R: ReadRepository> ReadRepository for TimeoutRepository<R> {
    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        self.bounded("exists", self.inner.exists(code)).await
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Lookup<ShortLink>> {
        self.bounded("find_by_code", self.inner.find_by_code(code))
            .await
    }

    async fn find_active_by_url(&self, url: &str, now: Timestamp) -> Result<Lookup<ShortLink>> {
        self.bounded(
            "find_active_by_url",
            self.inner.find_active_by_url(url, now),
        )
        .await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ShortLink>> {
        self.bounded("list_recent", self.inner.list_recent(limit))
            .await
    }

    async fn find_expired(&self, now: Timestamp) -> Result<Vec<ShortLink>> {
        self.bounded("find_expired", self.inner.find_expired(now))
            .await
    }
}

#[async_trait]
impl<R: Repository> Repository for TimeoutRepository<R> {
    async fn insert(&self, record: ShortLink) -> Result<ShortLink> {
        self.bounded("insert", self.inner.insert(record)).await
    }

    async fn update(&self, record: &ShortLink) -> Result<()> {
        self.bounded("update", self.inner.update(record)).await
    }

    async fn increment_visits(
        &self,
        code: &ShortCode,
        expected: u64,
        visit: Option<Visit>,
    ) -> Result<VisitUpdate> {
        self.bounded(
            "increment_visits",
            self.inner.increment_visits(code, expected, visit),
        )
        .await
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        self.bounded("delete", self.inner.delete(code)).await
    }

    async fn delete_if_expired(&self, code: &ShortCode, now: Timestamp) -> Result<bool> {
        self.bounded("delete_if_expired", self.inner.delete_if_expired(code, now))
            .await
    }
}
