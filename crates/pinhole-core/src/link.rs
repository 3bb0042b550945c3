use crate::expiration::{self, ExpirationMode};
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Request metadata captured on a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct Visit {
    #[builder(default, setter(strip_option, into))]
    pub referrer: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub user_agent: Option<String>,
    /// Source address of the request, as reported by the transport.
    #[builder(default, setter(strip_option, into))]
    pub source: Option<String>,
    #[builder(default = Timestamp::now())]
    pub at: Timestamp,
}

/// A stored mapping from a short code to its target URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct ShortLink {
    /// Primary key.
    pub code: ShortCode,
    /// The destination URL, always carrying a scheme and host.
    #[builder(setter(into))]
    pub target_url: String,
    #[builder(default = Timestamp::now())]
    pub created_at: Timestamp,
    #[builder(default, setter(strip_option))]
    pub expires_at: Option<Timestamp>,
    #[builder(default)]
    pub visit_count: u64,
    #[builder(default, setter(strip_option))]
    pub max_visits: Option<u64>,
    #[builder(default)]
    pub expiration_mode: ExpirationMode,
    /// `true` when the code was supplied by the caller.
    #[builder(default)]
    pub is_custom: bool,
    #[builder(default, setter(strip_option, into))]
    pub owner_id: Option<String>,
    /// Metadata of the most recent successful resolution.
    #[builder(default, setter(strip_option))]
    pub last_visit: Option<Visit>,
}

impl ShortLink {
    /// Whether the link is expired at the given instant.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        expiration::is_expired(
            self.expiration_mode,
            self.expires_at,
            self.max_visits,
            self.visit_count,
            now,
        )
    }

    /// Whether the link is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    /// Whether the link counts as the active record for its target URL.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        !self.is_custom && !self.is_expired_at(now)
    }
}
