use pinhole_core::ShortenerError;
use subtle::ConstantTimeEq;

const BEARER_PREFIX: &str = "Bearer ";

/// Checks the bearer token on administrative requests.
///
/// Without a configured token every request is refused.
#[derive(Clone, Default)]
pub struct AdminGuard {
    token: Option<String>,
}

impl std::fmt::Debug for AdminGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGuard")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl AdminGuard {
    pub fn new(token: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        Self { token }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Validates an `Authorization` header value.
    pub fn authorize(&self, header: Option<&str>) -> Result<(), ShortenerError> {
        let Some(expected) = self.token.as_deref() else {
            return Err(ShortenerError::Unauthorized(
                "administrative access is disabled".to_string(),
            ));
        };

        let presented = header
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .ok_or_else(|| ShortenerError::Unauthorized("missing bearer token".to_string()))?;

        if constant_time_compare(presented, expected) {
            Ok(())
        } else {
            Err(ShortenerError::Unauthorized("invalid bearer token".to_string()))
        }
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_token() {
        let guard = AdminGuard::new(Some("s3cret".to_string()));
        assert!(guard.authorize(Some("Bearer s3cret")).is_ok());
    }

    #[test]
    fn rejects_wrong_or_missing_token() {
        let guard = AdminGuard::new(Some("s3cret".to_string()));
        assert!(guard.authorize(Some("Bearer nope")).is_err());
        assert!(guard.authorize(Some("s3cret")).is_err());
        assert!(guard.authorize(None).is_err());
    }

    #[test]
    fn unconfigured_guard_refuses_everything() {
        let guard = AdminGuard::new(Some("  ".to_string()));
        assert!(!guard.is_configured());
        assert!(matches!(
            guard.authorize(Some("Bearer  ")),
            Err(ShortenerError::Unauthorized(_))
        ));
        assert!(AdminGuard::default().authorize(None).is_err());
    }

    #[test]
    fn debug_hides_token() {
        let guard = AdminGuard::new(Some("s3cret".to_string()));
        assert!(!format!("{guard:?}").contains("s3cret"));
    }
}
