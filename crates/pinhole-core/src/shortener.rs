use crate::error::ShortenerError;
use crate::expiration::ExpirationMode;
use crate::link::ShortLink;
use crate::lookup::Lookup;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use serde::Serialize;
use typed_builder::TypedBuilder;

type Result<T> = std::result::Result<T, ShortenerError>;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenParams {
    /// The URL to shorten; a missing scheme defaults to `http://`.
    #[builder(setter(into))]
    pub target_url: String,
    /// Optional caller-chosen code.
    #[builder(default, setter(strip_option, into))]
    pub alias: Option<String>,
    #[builder(default)]
    pub expiration_mode: ExpirationMode,
    /// Lifetime in days; values below one are taken as fractions of a day
    /// at minute precision.
    #[builder(default, setter(strip_option))]
    pub expiry_value: Option<f64>,
    #[builder(default, setter(strip_option))]
    pub max_visits: Option<i64>,
    #[builder(default, setter(strip_option, into))]
    pub owner_id: Option<String>,
}

/// A record snapshot together with its computed expiration state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStatus {
    #[serde(flatten)]
    pub link: ShortLink,
    pub expired: bool,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates (or reuses) a short link for the given parameters.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortLink>;

    /// Returns the full record snapshot for a code, expired or not.
    async fn status(&self, code: &ShortCode) -> Result<Lookup<LinkStatus>>;

    /// Lists the most recently created links, newest first.
    ///
    /// A limit of zero yields an empty list.
    async fn recent(&self, limit: usize) -> Result<Vec<ShortLink>>;

    /// Deletes a link on behalf of `requester`.
    ///
    /// Links with an owner may only be deleted by that owner.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, code: &ShortCode, requester: Option<&str>) -> Result<bool>;
}
