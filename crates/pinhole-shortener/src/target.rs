use crate::config::ReservedAliases;
use pinhole_core::{ShortCode, ShortenerError};
use url::Url;

pub const ALIAS_MIN_LENGTH: usize = 3;
pub const ALIAS_MAX_LENGTH: usize = 30;

const DEFAULT_SCHEME: &str = "http://";

/// Returns `true` if `url` starts with `scheme://`.
fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Normalizes a target URL: a missing scheme defaults to `http://`.
///
/// The returned string is the caller's input (trimmed, possibly prefixed),
/// not a re-serialized form, so `example.com` becomes `http://example.com`.
pub fn normalize_target_url(raw: &str) -> Result<String, ShortenerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ShortenerError::InvalidUrl(
            "URL cannot be empty".to_string(),
        ));
    }

    let normalized = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{trimmed}")
    };

    let parsed = Url::parse(&normalized)
        .map_err(|e| ShortenerError::InvalidUrl(format!("{normalized}: {e}")))?;

    if !parsed.host_str().is_some_and(|host| !host.is_empty()) {
        return Err(ShortenerError::InvalidUrl(format!(
            "URL must have a valid scheme and host: {normalized}"
        )));
    }

    Ok(normalized)
}

/// Validates a caller-supplied alias and turns it into a short code.
pub fn validate_alias(alias: &str, reserved: &ReservedAliases) -> Result<ShortCode, ShortenerError> {
    if alias.len() < ALIAS_MIN_LENGTH || alias.len() > ALIAS_MAX_LENGTH {
        return Err(ShortenerError::InvalidAlias(format!(
            "length must be between {} and {}, got {}",
            ALIAS_MIN_LENGTH,
            ALIAS_MAX_LENGTH,
            alias.len()
        )));
    }

    if !ShortCode::is_valid_charset(alias) {
        return Err(ShortenerError::InvalidAlias(format!(
            "must contain only alphanumeric characters, hyphens, or underscores: '{alias}'"
        )));
    }

    if reserved.contains(alias) {
        return Err(ShortenerError::InvalidAlias(format!(
            "'{alias}' is a reserved word"
        )));
    }

    ShortCode::new(alias)
}
