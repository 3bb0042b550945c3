use crate::error::ShortenerError;
use crate::link::Visit;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// The outcome of resolving a short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The link is live; the caller should redirect to the target URL.
    Redirect(String),
    NotFound,
    Expired,
}

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code, counting the visit if the link is live.
    ///
    /// Expired links are reported as [`Resolution::Expired`] and left untouched.
    async fn resolve(
        &self,
        code: &ShortCode,
        visit: Option<Visit>,
    ) -> Result<Resolution, ShortenerError>;
}
