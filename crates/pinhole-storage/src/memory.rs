use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use pinhole_core::repository::{ReadRepository, Repository, Result, VisitUpdate};
use pinhole_core::{Lookup, ShortCode, ShortLink, StorageError, Visit};
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory storage entry for a short link.
#[derive(Debug, Clone)]
struct StoredLink {
    link: ShortLink,
    /// Insertion order, used for newest-first listing.
    seq: u64,
}

/// In-memory implementation of the Repository trait using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking.
///
/// Besides the code-keyed records, the repository keeps an index from target
/// URL to the code of the newest non-custom record for that URL. A
/// non-custom insert holds the index entry while it checks for an active
/// record, so two concurrent shortenings of the same URL cannot both create
/// one. Lock order is always index first, records second.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    links: DashMap<String, StoredLink>,
    active_urls: DashMap<String, String>,
    sequence: AtomicU64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            links: DashMap::with_capacity(capacity),
            active_urls: DashMap::with_capacity(capacity),
            sequence: AtomicU64::new(0),
        }
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Drops the index entry of a removed record.
    fn forget(&self, code: &ShortCode, removed: Option<(String, StoredLink)>) -> bool {
        let Some((_, stored)) = removed else {
            return false;
        };

        if !stored.link.is_custom {
            self.active_urls
                .remove_if(&stored.link.target_url, |_, indexed| indexed == code.as_str());
        }
        true
    }

    fn insert_link(&self, record: ShortLink) -> Result<ShortLink> {
        match self.links.entry(record.code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(record.code.to_string())),
            Entry::Vacant(slot) => {
                let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
                slot.insert(StoredLink {
                    link: record.clone(),
                    seq,
                });
                Ok(record)
            }
        }
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.links.contains_key(code.as_str()))
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Lookup<ShortLink>> {
        let link = self
            .links
            .get(code.as_str())
            .map(|stored| stored.link.clone());
        Ok(link.into())
    }

    async fn find_active_by_url(&self, url: &str, now: Timestamp) -> Result<Lookup<ShortLink>> {
        let Some(code) = self.active_urls.get(url).map(|code| code.value().clone()) else {
            return Ok(Lookup::NotFound);
        };

        let link = self.links.get(&code).map(|stored| stored.link.clone());
        Ok(Lookup::from(link).filter(|link| link.is_active_at(now)))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ShortLink>> {
        let mut links: Vec<(u64, ShortLink)> = self
            .links
            .iter()
            .map(|stored| (stored.value().seq, stored.value().link.clone()))
            .collect();

        links.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        Ok(links
            .into_iter()
            .take(limit)
            .map(|(_, link)| link)
            .collect())
    }

    async fn find_expired(&self, now: Timestamp) -> Result<Vec<ShortLink>> {
        let mut expired: Vec<ShortLink> = self
            .links
            .iter()
            .filter(|stored| {
                stored
                    .value()
                    .link
                    .expires_at
                    .is_some_and(|at| at <= now)
            })
            .map(|stored| stored.value().link.clone())
            .collect();

        expired.sort_by_key(|link| link.expires_at);
        Ok(expired)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, record: ShortLink) -> Result<ShortLink> {
        if record.is_custom {
            return self.insert_link(record);
        }

        let now = Timestamp::now();
        match self.active_urls.entry(record.target_url.clone()) {
            Entry::Occupied(mut slot) => {
                if let Some(existing) = self.links.get(slot.get().as_str()) {
                    if existing.link.is_active_at(now) {
                        return Err(StorageError::ActiveUrlExists(Box::new(
                            existing.link.clone(),
                        )));
                    }
                }
                let code = record.code.as_str().to_owned();
                let link = self.insert_link(record)?;
                slot.insert(code);
                Ok(link)
            }
            Entry::Vacant(slot) => {
                let code = record.code.as_str().to_owned();
                let link = self.insert_link(record)?;
                slot.insert(code);
                Ok(link)
            }
        }
    }

    async fn update(&self, record: &ShortLink) -> Result<()> {
        let Some(mut stored) = self.links.get_mut(record.code.as_str()) else {
            return Err(StorageError::NotFound(record.code.to_string()));
        };

        stored.link.expires_at = record.expires_at;
        stored.link.max_visits = record.max_visits;
        stored.link.expiration_mode = record.expiration_mode;
        stored.link.owner_id = record.owner_id.clone();
        Ok(())
    }

    async fn increment_visits(
        &self,
        code: &ShortCode,
        expected: u64,
        visit: Option<Visit>,
    ) -> Result<VisitUpdate> {
        let Some(mut stored) = self.links.get_mut(code.as_str()) else {
            return Err(StorageError::NotFound(code.to_string()));
        };

        if stored.link.visit_count != expected {
            return Ok(VisitUpdate::Stale(stored.link.clone()));
        }

        stored.link.visit_count += 1;
        if visit.is_some() {
            stored.link.last_visit = visit;
        }
        Ok(VisitUpdate::Applied(stored.link.clone()))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let removed = self.links.remove(code.as_str());
        Ok(self.forget(code, removed))
    }

    async fn delete_if_expired(&self, code: &ShortCode, now: Timestamp) -> Result<bool> {
        let removed = self.links.remove_if(code.as_str(), |_, stored| {
            stored.link.expires_at.is_some_and(|at| at <= now)
        });
        Ok(self.forget(code, removed))
    }
}
