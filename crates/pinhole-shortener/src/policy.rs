//! Resolution of a requested expiration mode against the supplied values.
//!
//! Invalid values never fail a request. Instead the affected check is dropped
//! from the mode (BOTH→DATE, VISITS→NEVER for a bad visit limit; BOTH→VISITS,
//! DATE→NEVER for a bad lifetime) and the drop is reported back as a
//! [`Degradation`] for the caller to log.

use jiff::{SignedDuration, Timestamp};
use pinhole_core::ExpirationMode;
use std::fmt::Display;

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;
const SECONDS_PER_DAY: f64 = MINUTES_PER_DAY * 60.0;

/// A check that was dropped because its value was unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum Degradation {
    /// The lifetime was missing, non-positive, non-finite or out of range.
    Expiry {
        from: ExpirationMode,
        to: ExpirationMode,
        value: Option<f64>,
    },
    /// The visit limit was missing or non-positive.
    MaxVisits {
        from: ExpirationMode,
        to: ExpirationMode,
        value: Option<i64>,
    },
}

impl Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expiry { from, to, value } => {
                write!(f, "expiry value {value:?} unusable, mode {from} -> {to}")
            }
            Self::MaxVisits { from, to, value } => {
                write!(f, "max visits {value:?} unusable, mode {from} -> {to}")
            }
        }
    }
}

/// The effective expiration fields for a new or refreshed record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedExpiration {
    pub mode: ExpirationMode,
    pub expires_at: Option<Timestamp>,
    pub max_visits: Option<u64>,
    pub degradations: Vec<Degradation>,
}

/// Converts a lifetime in days into a duration.
///
/// Values below one day are taken at minute precision, with a floor of one
/// minute; longer values at second precision.
pub fn expiry_duration(days: f64) -> Option<SignedDuration> {
    if !days.is_finite() || days <= 0.0 {
        return None;
    }

    if days < 1.0 {
        let minutes = (days * MINUTES_PER_DAY).round().max(1.0);
        Some(SignedDuration::from_mins(minutes as i64))
    } else {
        Some(SignedDuration::from_secs((days * SECONDS_PER_DAY).round() as i64))
    }
}

/// Resolves the requested mode against the supplied values at `now`.
pub fn resolve(
    requested: ExpirationMode,
    expiry_value: Option<f64>,
    max_visits: Option<i64>,
    now: Timestamp,
) -> ResolvedExpiration {
    let mut mode = requested;
    let mut degradations = Vec::new();
    let mut expires_at = None;
    let mut visit_limit = None;

    if mode.checks_date() {
        expires_at = expiry_value
            .and_then(expiry_duration)
            .and_then(|duration| now.checked_add(duration).ok());
        if expires_at.is_none() {
            let degraded = mode.without_date();
            degradations.push(Degradation::Expiry {
                from: mode,
                to: degraded,
                value: expiry_value,
            });
            mode = degraded;
        }
    }

    if mode.checks_visits() {
        visit_limit = max_visits
            .filter(|limit| *limit > 0)
            .and_then(|limit| u64::try_from(limit).ok());
        if visit_limit.is_none() {
            let degraded = mode.without_visits();
            degradations.push(Degradation::MaxVisits {
                from: mode,
                to: degraded,
                value: max_visits,
            });
            mode = degraded;
        }
    }

    ResolvedExpiration {
        mode,
        expires_at,
        max_visits: visit_limit,
        degradations,
    }
}
