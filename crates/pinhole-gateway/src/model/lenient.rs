//! Field deserializers that turn unusable values into absence instead of
//! rejecting the whole request body. Every rejected value is logged.

use pinhole_core::ExpirationMode;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn whole(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parses a present value, logging it when it is unusable.
fn accept<T>(
    value: Option<Value>,
    kind: &str,
    parse: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = value?;
    let parsed = parse(&value);
    if parsed.is_none() {
        warn!(%value, expected = kind, "ignoring unusable request field");
    }
    parsed
}

pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(accept(value, "number", number))
}

pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(accept(value, "integer", whole))
}

/// An unknown or missing mode falls back to [`ExpirationMode::Never`].
pub fn mode<'de, D>(deserializer: D) -> Result<ExpirationMode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let mode = accept(value, "expiration mode", |value| {
        value.as_str().and_then(|s| s.parse::<ExpirationMode>().ok())
    });
    Ok(mode.unwrap_or_default())
}

/// Blank strings count as absent.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "float")]
        value: Option<f64>,
        #[serde(default, deserialize_with = "integer")]
        visits: Option<i64>,
        #[serde(default, deserialize_with = "mode")]
        mode: ExpirationMode,
    }

    fn fields(body: serde_json::Value) -> Fields {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let parsed = fields(json!({"value": " 1.5 ", "visits": "3", "mode": "both"}));
        assert_eq!(parsed.value, Some(1.5));
        assert_eq!(parsed.visits, Some(3));
        assert_eq!(parsed.mode, ExpirationMode::Both);
    }

    #[test]
    fn misspelled_mode_falls_back_to_never() {
        let parsed = fields(json!({"mode": "vists", "visits": 1}));
        assert_eq!(parsed.mode, ExpirationMode::Never);
        assert_eq!(parsed.visits, Some(1));
    }

    #[test]
    fn unusable_values_become_absent() {
        let parsed = fields(json!({"value": "soon", "visits": 2.5, "mode": 7}));
        assert_eq!(parsed.value, None);
        assert_eq!(parsed.visits, None);
        assert_eq!(parsed.mode, ExpirationMode::Never);

        let parsed = fields(json!({"value": null, "visits": null, "mode": null}));
        assert_eq!(parsed.value, None);
        assert_eq!(parsed.visits, None);
        assert_eq!(parsed.mode, ExpirationMode::Never);
    }
}
