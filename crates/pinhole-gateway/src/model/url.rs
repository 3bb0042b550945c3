use super::lenient;
use jiff::Timestamp;
use pinhole_core::{ExpirationMode, LinkStatus, ShortLink, ShortenParams, Visit};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub target_url: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub alias: Option<String>,
    #[serde(default, deserialize_with = "lenient::mode")]
    pub expiration_mode: ExpirationMode,
    /// Lifetime in days.
    #[serde(default, deserialize_with = "lenient::float")]
    pub expiry_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub max_visits: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub owner_id: Option<String>,
}

impl From<CreateUrlRequest> for ShortenParams {
    fn from(request: CreateUrlRequest) -> Self {
        ShortenParams {
            target_url: request.target_url,
            alias: request.alias.map(|alias| alias.trim().to_string()),
            expiration_mode: request.expiration_mode,
            expiry_value: request.expiry_value,
            max_visits: request.max_visits,
            owner_id: request.owner_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateUrlResponse {
    pub code: String,
    pub short_url: String,
    pub target_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_visits: Option<u64>,
    pub is_custom: bool,
    pub expiration_mode: ExpirationMode,
}

impl CreateUrlResponse {
    pub fn new(link: ShortLink, base_url: &str) -> Self {
        Self {
            short_url: link.code.to_url(base_url),
            code: link.code.to_string(),
            target_url: link.target_url,
            expires_at: link.expires_at,
            max_visits: link.max_visits,
            is_custom: link.is_custom,
            expiration_mode: link.expiration_mode,
        }
    }
}

/// Full snapshot of a link, including visit analytics.
#[derive(Debug, Serialize)]
pub struct UrlStatusResponse {
    pub code: String,
    pub short_url: String,
    pub target_url: String,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub visit_count: u64,
    pub max_visits: Option<u64>,
    pub expiration_mode: ExpirationMode,
    pub is_custom: bool,
    pub owner_id: Option<String>,
    pub last_visit: Option<Visit>,
    pub expired: bool,
}

impl UrlStatusResponse {
    pub fn new(status: LinkStatus, base_url: &str) -> Self {
        let LinkStatus { link, expired } = status;
        Self {
            short_url: link.code.to_url(base_url),
            code: link.code.to_string(),
            target_url: link.target_url,
            created_at: link.created_at,
            expires_at: link.expires_at,
            visit_count: link.visit_count,
            max_visits: link.max_visits,
            expiration_mode: link.expiration_mode,
            is_custom: link.is_custom,
            owner_id: link.owner_id,
            last_visit: link.last_visit,
            expired,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct UrlSummary {
    pub code: String,
    pub short_url: String,
    pub target_url: String,
    pub created_at: Timestamp,
    pub visit_count: u64,
}

impl UrlSummary {
    pub fn new(link: ShortLink, base_url: &str) -> Self {
        Self {
            short_url: link.code.to_url(base_url),
            code: link.code.to_string(),
            target_url: link.target_url,
            created_at: link.created_at,
            visit_count: link.visit_count,
        }
    }
}
