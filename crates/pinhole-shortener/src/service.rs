use crate::config::{ShortenerConfig, MAX_RECENT_LIMIT};
use crate::policy::{self, ResolvedExpiration};
use crate::target::{normalize_target_url, validate_alias};
use async_trait::async_trait;
use jiff::Timestamp;
use pinhole_core::{
    LinkStatus, Lookup, Repository, ShortCode, ShortLink, ShortenParams, Shortener,
    ShortenerError, StorageError,
};
use pinhole_generator::Generator;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

type Result<T> = std::result::Result<T, ShortenerError>;

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository` and a `Generator` to handle:
/// - Target URL normalization and validation
/// - Custom alias reservation
/// - Reuse of the active link for an already shortened URL
/// - Collision-free code allocation with a bounded number of attempts
/// - Expiration policy resolution
///
/// Uniqueness of codes is guaranteed by the repository's `insert`; the
/// `exists` check before each insert only avoids needless round trips.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    config: ShortenerConfig,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            config: self.config.clone(),
        }
    }
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    pub fn new(repository: Arc<R>, generator: G) -> Self {
        Self::with_config(repository, generator, ShortenerConfig::default())
    }

    pub fn with_config(
        repository: Arc<R>,
        generator: G,
        config: ShortenerConfig,
    ) -> Self {
        Self {
            repository,
            generator: Arc::new(generator),
            config,
        }
    }

    pub fn config(&self) -> &ShortenerConfig {
        &self.config
    }

    /// Inserts a record under a caller-chosen alias.
    async fn claim_alias(
        &self,
        alias: &str,
        target_url: String,
        expiration: &ResolvedExpiration,
        owner_id: Option<String>,
        now: Timestamp,
    ) -> Result<ShortLink> {
        let code = validate_alias(alias, &self.config.reserved_aliases)?;

        if self.repository.exists(&code).await? {
            debug!(code = %code, "alias already taken");
            return Err(ShortenerError::AliasTaken(code.to_string()));
        }

        let record = new_record(code, target_url, expiration, owner_id, true, now);
        match self.repository.insert(record).await {
            Ok(link) => Ok(link),
            Err(StorageError::Conflict(code)) => {
                debug!(code = %code, "alias claimed concurrently");
                Err(ShortenerError::AliasTaken(code))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the active link for a URL, moving its expiry date if the
    /// request carries a different one.
    async fn reuse(
        &self,
        mut link: ShortLink,
        expiration: &ResolvedExpiration,
    ) -> Result<ShortLink> {
        let Some(expires_at) = expiration.expires_at else {
            debug!(code = %link.code, "reusing active link");
            return Ok(link);
        };

        if link.expires_at == Some(expires_at) {
            return Ok(link);
        }

        debug!(
            code = %link.code,
            previous = ?link.expires_at,
            expires_at = %expires_at,
            "refreshing expiry of active link"
        );
        link.expires_at = Some(expires_at);
        link.expiration_mode = link.expiration_mode.with_date();
        self.repository.update(&link).await?;

        Ok(link)
    }

    /// Generates codes until one can be inserted.
    async fn allocate(
        &self,
        target_url: String,
        expiration: &ResolvedExpiration,
        owner_id: Option<String>,
        now: Timestamp,
    ) -> Result<ShortLink> {
        let attempts = self.config.max_generation_attempts;

        for attempt in 1..=attempts {
            let code: ShortCode = self.generator.generate().into();

            if self.repository.exists(&code).await? {
                trace!(code = %code, attempt, "generated code already in use");
                continue;
            }

            let record = new_record(
                code,
                target_url.clone(),
                expiration,
                owner_id.clone(),
                false,
                now,
            );
            match self.repository.insert(record).await {
                Ok(link) => return Ok(link),
                Err(StorageError::Conflict(code)) => {
                    warn!(code = %code, attempt, "generated code collided on insert, retrying");
                }
                Err(StorageError::ActiveUrlExists(existing)) => {
                    debug!(code = %existing.code, "url shortened concurrently");
                    return self.reuse(*existing, expiration).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        error!(attempts, "exhausted short code generation attempts");
        Err(ShortenerError::CodeSpaceExhausted(attempts))
    }
}

fn new_record(
    code: ShortCode,
    target_url: String,
    expiration: &ResolvedExpiration,
    owner_id: Option<String>,
    is_custom: bool,
    now: Timestamp,
) -> ShortLink {
    ShortLink {
        code,
        target_url,
        created_at: now,
        expires_at: expiration.expires_at,
        visit_count: 0,
        max_visits: expiration.max_visits,
        expiration_mode: expiration.mode,
        is_custom,
        owner_id,
        last_visit: None,
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortLink> {
        let ShortenParams {
            target_url,
            alias,
            expiration_mode,
            expiry_value,
            max_visits,
            owner_id,
        } = params;

        let target_url = normalize_target_url(&target_url)?;
        let now = Timestamp::now();

        let expiration = policy::resolve(expiration_mode, expiry_value, max_visits, now);
        for degradation in &expiration.degradations {
            warn!(url = %target_url, %degradation, "expiration policy degraded");
        }

        let link = match alias {
            Some(alias) => {
                self.claim_alias(&alias, target_url, &expiration, owner_id, now)
                    .await?
            }
            None => match self.repository.find_active_by_url(&target_url, now).await? {
                Lookup::Found(existing) => self.reuse(existing, &expiration).await?,
                Lookup::NotFound => {
                    self.allocate(target_url, &expiration, owner_id, now)
                        .await?
                }
            },
        };

        info!(
            code = %link.code,
            url = %link.target_url,
            mode = %link.expiration_mode,
            custom = link.is_custom,
            "short link ready"
        );
        Ok(link)
    }

    async fn status(&self, code: &ShortCode) -> Result<Lookup<LinkStatus>> {
        trace!(code = %code, "status lookup");
        let now = Timestamp::now();

        Ok(self
            .repository
            .find_by_code(code)
            .await?
            .map(|link| LinkStatus {
                expired: link.is_expired_at(now),
                link,
            }))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ShortLink>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        Ok(self.repository.list_recent(limit.min(MAX_RECENT_LIMIT)).await?)
    }

    async fn delete(&self, code: &ShortCode, requester: Option<&str>) -> Result<bool> {
        let Lookup::Found(link) = self.repository.find_by_code(code).await? else {
            trace!(code = %code, "nothing to delete");
            return Ok(false);
        };

        if let Some(owner) = link.owner_id.as_deref() {
            if requester != Some(owner) {
                warn!(code = %code, "delete refused for non-owner");
                return Err(ShortenerError::Unauthorized(format!(
                    "{code} belongs to another owner"
                )));
            }
        }

        let deleted = self.repository.delete(code).await?;
        if deleted {
            info!(code = %code, "short link deleted");
        }
        Ok(deleted)
    }
}
