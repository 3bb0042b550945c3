use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use pinhole_core::{
    Lookup, Redirector, Repository, Resolution, ShortCode, ShortenerError, StorageError, Visit,
    VisitUpdate,
};
use tracing::{debug, trace};

/// Service for handling URL redirects.
///
/// Fetches the record, checks expiration and counts the visit. A lost
/// compare-and-swap re-evaluates the fresh record before retrying, so a
/// link whose visit limit was reached by a concurrent request resolves to
/// [`Resolution::Expired`] instead of counting one visit too many.
#[derive(Debug)]
pub struct RedirectorService<R> {
    repository: Arc<R>,
}

impl<R> Clone for RedirectorService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: Repository> RedirectorService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: Repository> Redirector for RedirectorService<R> {
    async fn resolve(
        &self,
        code: &ShortCode,
        visit: Option<Visit>,
    ) -> Result<Resolution, ShortenerError> {
        trace!(code = %code, "resolving short code");

        let Lookup::Found(mut link) = self.repository.find_by_code(code).await? else {
            trace!(code = %code, "short code not found");
            return Ok(Resolution::NotFound);
        };

        loop {
            if link.is_expired_at(Timestamp::now()) {
                debug!(code = %code, visits = link.visit_count, "short link expired");
                return Ok(Resolution::Expired);
            }

            match self
                .repository
                .increment_visits(code, link.visit_count, visit.clone())
                .await
            {
                Ok(VisitUpdate::Applied(updated)) => {
                    debug!(
                        code = %code,
                        url = %updated.target_url,
                        visits = updated.visit_count,
                        "resolved short code"
                    );
                    return Ok(Resolution::Redirect(updated.target_url));
                }
                Ok(VisitUpdate::Stale(current)) => {
                    trace!(
                        code = %code,
                        expected = link.visit_count,
                        actual = current.visit_count,
                        "visit counter moved, re-evaluating"
                    );
                    link = current;
                }
                Err(StorageError::NotFound(_)) => {
                    debug!(code = %code, "short link deleted during resolution");
                    return Ok(Resolution::NotFound);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
