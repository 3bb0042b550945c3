use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Selects which expiration checks apply to a short link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpirationMode {
    /// The link never expires.
    #[default]
    Never,
    /// The link expires once `expires_at` has passed.
    Date,
    /// The link expires once `visit_count` reaches `max_visits`.
    Visits,
    /// The link expires when either the date or the visit condition holds.
    Both,
}

impl ExpirationMode {
    /// Whether the time-based check applies.
    pub fn checks_date(self) -> bool {
        matches!(self, Self::Date | Self::Both)
    }

    /// Whether the visit-based check applies.
    pub fn checks_visits(self) -> bool {
        matches!(self, Self::Visits | Self::Both)
    }

    /// Returns the mode with the time-based check enabled.
    pub fn with_date(self) -> Self {
        match self {
            Self::Never | Self::Date => Self::Date,
            Self::Visits | Self::Both => Self::Both,
        }
    }

    /// Returns the mode with the time-based check removed.
    pub fn without_date(self) -> Self {
        match self {
            Self::Never | Self::Date => Self::Never,
            Self::Visits | Self::Both => Self::Visits,
        }
    }

    /// Returns the mode with the visit-based check removed.
    pub fn without_visits(self) -> Self {
        match self {
            Self::Never | Self::Visits => Self::Never,
            Self::Date | Self::Both => Self::Date,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Date => "date",
            Self::Visits => "visits",
            Self::Both => "both",
        }
    }
}

impl Display for ExpirationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpirationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "date" => Ok(Self::Date),
            "visits" => Ok(Self::Visits),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown expiration mode '{other}'")),
        }
    }
}

/// Evaluates whether a link with the given fields is expired at `now`.
///
/// This is a pure function: it is recomputed on every query and never
/// cached on the record.
pub fn is_expired(
    mode: ExpirationMode,
    expires_at: Option<Timestamp>,
    max_visits: Option<u64>,
    visit_count: u64,
    now: Timestamp,
) -> bool {
    let date_expired = mode.checks_date() && expires_at.is_some_and(|at| now >= at);
    let visits_expired = mode.checks_visits() && max_visits.is_some_and(|max| visit_count >= max);
    date_expired || visits_expired
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn past() -> Timestamp {
        Timestamp::now() - SignedDuration::from_secs(1)
    }

    fn future() -> Timestamp {
        Timestamp::now() + SignedDuration::from_hours(1)
    }

    #[test]
    fn never_ignores_both_conditions() {
        let now = Timestamp::now();
        assert!(!is_expired(ExpirationMode::Never, Some(past()), Some(1), 5, now));
    }

    #[test]
    fn date_mode_checks_only_the_date() {
        let now = Timestamp::now();
        assert!(is_expired(ExpirationMode::Date, Some(past()), None, 0, now));
        assert!(!is_expired(ExpirationMode::Date, Some(future()), Some(1), 9, now));
    }

    #[test]
    fn visits_mode_checks_only_the_counter() {
        let now = Timestamp::now();
        assert!(is_expired(ExpirationMode::Visits, None, Some(1), 1, now));
        assert!(!is_expired(ExpirationMode::Visits, Some(past()), Some(2), 1, now));
    }

    #[test]
    fn both_mode_expires_on_either_condition() {
        let now = Timestamp::now();
        assert!(is_expired(ExpirationMode::Both, Some(past()), Some(10), 0, now));
        assert!(is_expired(ExpirationMode::Both, Some(future()), Some(3), 3, now));
        assert!(!is_expired(ExpirationMode::Both, Some(future()), Some(3), 2, now));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let at = Timestamp::now();
        assert!(is_expired(ExpirationMode::Date, Some(at), None, 0, at));
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("BOTH".parse::<ExpirationMode>().unwrap(), ExpirationMode::Both);
        assert_eq!(ExpirationMode::Visits.to_string(), "visits");
        assert!("sometimes".parse::<ExpirationMode>().is_err());
    }

    #[test]
    fn mode_transitions() {
        assert_eq!(ExpirationMode::Never.with_date(), ExpirationMode::Date);
        assert_eq!(ExpirationMode::Visits.with_date(), ExpirationMode::Both);
        assert_eq!(ExpirationMode::Both.without_visits(), ExpirationMode::Date);
        assert_eq!(ExpirationMode::Both.without_date(), ExpirationMode::Visits);
        assert_eq!(ExpirationMode::Visits.without_visits(), ExpirationMode::Never);
    }
}
