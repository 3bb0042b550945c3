use crate::error::StorageError;
use crate::link::{ShortLink, Visit};
use crate::lookup::Lookup;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// The outcome of a compare-and-swap visit increment.
#[derive(Debug, Clone, PartialEq)]
pub enum VisitUpdate {
    /// The counter matched and was incremented; carries the updated record.
    Applied(ShortLink),
    /// Another resolution won the race; carries the current record.
    Stale(ShortLink),
}

/// A read-only view of a repository.
///
/// This trait provides only the read operations from [`Repository`],
/// allowing the status and sweep paths to stay read-only.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Checks whether a short code is present, expired or not.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Retrieves the record for a given short code, expired or not.
    async fn find_by_code(&self, code: &ShortCode) -> Result<Lookup<ShortLink>>;

    /// Retrieves the active record for a target URL: non-custom and not
    /// expired at `now`.
    async fn find_active_by_url(&self, url: &str, now: Timestamp) -> Result<Lookup<ShortLink>>;

    /// Lists up to `limit` records, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<ShortLink>>;

    /// Lists records whose `expires_at` is at or before `now`.
    async fn find_expired(&self, now: Timestamp) -> Result<Vec<ShortLink>>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new record.
    ///
    /// Uniqueness of the code is enforced here as a compare-and-set on the
    /// key: returns `Err(Conflict)` if the code is already present. Callers
    /// must not rely on a prior [`ReadRepository::exists`] check.
    async fn insert(&self, record: ShortLink) -> Result<ShortLink>;

    /// Persists the mutable policy fields of an existing record
    /// (`expires_at`, `max_visits`, `expiration_mode`, `owner_id`).
    ///
    /// Returns `Err(NotFound)` if the record no longer exists.
    async fn update(&self, record: &ShortLink) -> Result<()>;

    /// Increments `visit_count` if it still equals `expected`, recording
    /// `visit` as the latest visit.
    ///
    /// Returns `Err(NotFound)` if the record no longer exists.
    async fn increment_visits(
        &self,
        code: &ShortCode,
        expected: u64,
        visit: Option<Visit>,
    ) -> Result<VisitUpdate>;

    /// Deletes the record for a given short code.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;

    /// Deletes the record only if its `expires_at` is at or before `now`,
    /// checked atomically with the removal.
    ///
    /// Returns `false` if the record is gone or its expiry has moved past
    /// `now`.
    async fn delete_if_expired(&self, code: &ShortCode, now: Timestamp) -> Result<bool>;
}

#[async_trait]
impl<R: ReadRepository + ?Sized> ReadRepository for Arc<R> {
    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        (**self).exists(code).await
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Lookup<ShortLink>> {
        (**self).find_by_code(code).await
    }

    async fn find_active_by_url(&self, url: &str, now: Timestamp) -> Result<Lookup<ShortLink>> {
        (**self).find_active_by_url(url, now).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ShortLink>> {
        (**self).list_recent(limit).await
    }

    async fn find_expired(&self, now: Timestamp) -> Result<Vec<ShortLink>> {
        (**self).find_expired(now).await
    }
}

#[async_trait]
impl<R: Repository + ?Sized> Repository for Arc<R> {
    async fn insert(&self, record: ShortLink) -> Result<ShortLink> {
        (**self).insert(record).await
    }

    async fn update(&self, record: &ShortLink) -> Result<()> {
        (**self).update(record).await
    }

    async fn increment_visits(
        &self,
        code: &ShortCode,
        expected: u64,
        visit: Option<Visit>,
    ) -> Result<VisitUpdate> {
        (**self).increment_visits(code, expected, visit).await
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        (**self).delete(code).await
    }

    async fn delete_if_expired(&self, code: &ShortCode, now: Timestamp) -> Result<bool> {
        (**self).delete_if_expired(code, now).await
    }
}
