mod admin;
mod health;
mod redirect;
mod url;

pub use admin::cleanup_handler;
pub use health::health_handler;
pub use redirect::redirect_handler;
pub use url::{create_url_handler, delete_url_handler, get_url_handler, recent_urls_handler};

use crate::error::Result;
use pinhole_core::{ShortCode, ShortenerError};

/// Codes that cannot be valid are reported as absent.
fn parse_code(raw: &str) -> Result<ShortCode> {
    ShortCode::new(raw).map_err(|_| ShortenerError::NotFound(raw.to_string()).into())
}
