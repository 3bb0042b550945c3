mod admin;
mod health;
mod lenient;
mod url;

pub use admin::CleanupRequest;
pub use health::HealthResponse;
pub use url::{CreateUrlRequest, CreateUrlResponse, RecentQuery, UrlStatusResponse, UrlSummary};
