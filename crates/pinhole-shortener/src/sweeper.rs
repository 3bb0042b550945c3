use async_trait::async_trait;
use jiff::Timestamp;
use pinhole_core::{CleanupAction, CleanupReport, Repository, ShortenerError, Sweeper};
use std::sync::Arc;
use tracing::{debug, info};

/// Administrative sweep over records whose expiry date has passed.
#[derive(Debug)]
pub struct CleanupService<R> {
    repository: Arc<R>,
}

impl<R> Clone for CleanupService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: Repository> CleanupService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: Repository> Sweeper for CleanupService<R> {
    async fn sweep(
        &self,
        action: CleanupAction,
        now: Timestamp,
    ) -> Result<CleanupReport, ShortenerError> {
        let expired = self.repository.find_expired(now).await?;

        let count = match action {
            CleanupAction::Mark => expired.len(),
            CleanupAction::Delete => {
                let mut removed = 0;
                for link in &expired {
                    // A concurrent delete or expiry refresh may have happened
                    // since the listing.
                    if self.repository.delete_if_expired(&link.code, now).await? {
                        debug!(code = %link.code, "expired link removed");
                        removed += 1;
                    } else {
                        debug!(code = %link.code, "expired link changed before removal, kept");
                    }
                }
                removed
            }
        };

        info!(?action, count, "cleanup sweep finished");
        Ok(CleanupReport { action, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;
    use pinhole_core::repository::{Result, VisitUpdate};
    use pinhole_core::{ExpirationMode, Lookup, ReadRepository, ShortCode, ShortLink, Visit};
    use pinhole_storage::InMemoryRepository;

    /// Pushes the expiry of `refresh` an hour ahead right after every
    /// expired listing, as a concurrent reuse request would.
    struct RefreshingRepository {
        inner: InMemoryRepository,
        refresh: ShortCode,
    }

    #[async_trait]
    impl ReadRepository for RefreshingRepository {
        async fn exists(&self, code: &ShortCode) -> Result<bool> {
            self.inner.exists(code).await
        }

        async fn find_by_code(&self, code: &ShortCode) -> Result<Lookup<ShortLink>> {
            self.inner.find_by_code(code).await
        }

        async fn find_active_by_url(
            &self,
            url: &str,
            now: Timestamp,
        ) -> Result<Lookup<ShortLink>> {
            self.inner.find_active_by_url(url, now).await
        }

        async fn list_recent(&self, limit: usize) -> Result<Vec<ShortLink>> {
            self.inner.list_recent(limit).await
        }

        async fn find_expired(&self, now: Timestamp) -> Result<Vec<ShortLink>> {
            let expired = self.inner.find_expired(now).await?;
            if let Lookup::Found(mut link) = self.inner.find_by_code(&self.refresh).await? {
                link.expires_at = Some(now + SignedDuration::from_hours(1));
                self.inner.update(&link).await?;
            }
            Ok(expired)
        }
    }

    #[async_trait]
    impl Repository for RefreshingRepository {
        async fn insert(&self, record: ShortLink) -> Result<ShortLink> {
            self.inner.insert(record).await
        }

        async fn update(&self, record: &ShortLink) -> Result<()> {
            self.inner.update(record).await
        }

        async fn increment_visits(
            &self,
            code: &ShortCode,
            expected: u64,
            visit: Option<Visit>,
        ) -> Result<VisitUpdate> {
            self.inner.increment_visits(code, expected, visit).await
        }

        async fn delete(&self, code: &ShortCode) -> Result<bool> {
            self.inner.delete(code).await
        }

        async fn delete_if_expired(&self, code: &ShortCode, now: Timestamp) -> Result<bool> {
            self.inner.delete_if_expired(code, now).await
        }
    }

    async fn seeded() -> Arc<InMemoryRepository> {
        let repo = Arc::new(InMemoryRepository::new());
        let now = Timestamp::now();
        for (code, offset) in [("past01", -60), ("past02", -1), ("future", 3600)] {
            let link = ShortLink::builder()
                .code(ShortCode::new_unchecked(code))
                .target_url(format!("https://{code}.example"))
                .expiration_mode(ExpirationMode::Date)
                .expires_at(now + SignedDuration::from_secs(offset))
                .build();
            repo.insert(link).await.unwrap();
        }
        let forever = ShortLink::builder()
            .code(ShortCode::new_unchecked("never1"))
            .target_url("https://never.example")
            .build();
        repo.insert(forever).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn mark_only_counts() {
        let repo = seeded().await;
        let sweeper = CleanupService::new(Arc::clone(&repo));

        let report = sweeper
            .sweep(CleanupAction::Mark, Timestamp::now())
            .await
            .unwrap();

        assert_eq!(report.action, CleanupAction::Mark);
        assert_eq!(report.count, 2);
        assert_eq!(repo.len(), 4);
    }

    #[tokio::test]
    async fn delete_removes_expired_links() {
        let repo = seeded().await;
        let sweeper = CleanupService::new(Arc::clone(&repo));

        let report = sweeper
            .sweep(CleanupAction::Delete, Timestamp::now())
            .await
            .unwrap();

        assert_eq!(report.count, 2);
        assert_eq!(repo.len(), 2);
        assert!(!repo.exists(&ShortCode::new_unchecked("past01")).await.unwrap());
        assert!(repo.exists(&ShortCode::new_unchecked("future")).await.unwrap());

        let again = sweeper
            .sweep(CleanupAction::Delete, Timestamp::now())
            .await
            .unwrap();
        assert_eq!(again.count, 0);
    }

    #[tokio::test]
    async fn delete_keeps_link_refreshed_mid_sweep() {
        let repo = Arc::new(RefreshingRepository {
            inner: InMemoryRepository::new(),
            refresh: ShortCode::new_unchecked("past02"),
        });
        let now = Timestamp::now();
        for (code, offset) in [("past01", -60), ("past02", -1)] {
            let link = ShortLink::builder()
                .code(ShortCode::new_unchecked(code))
                .target_url(format!("https://{code}.example"))
                .expiration_mode(ExpirationMode::Date)
                .expires_at(now + SignedDuration::from_secs(offset))
                .build();
            repo.insert(link).await.unwrap();
        }
        let sweeper = CleanupService::new(Arc::clone(&repo));

        let report = sweeper.sweep(CleanupAction::Delete, now).await.unwrap();

        assert_eq!(report.count, 1);
        assert!(!repo.exists(&ShortCode::new_unchecked("past01")).await.unwrap());
        let kept = repo
            .find_by_code(&ShortCode::new_unchecked("past02"))
            .await
            .unwrap()
            .found()
            .unwrap();
        assert!(!kept.is_expired_at(now));
    }
}
