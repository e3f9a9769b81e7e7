//! Both ad APIs encode 64-bit integers as JSON strings (`"1234"`), and omit
//! metrics that have no value for a row.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn parse_int<E: serde::de::Error>(value: Value) -> Result<Option<i64>, E> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| E::custom(format!("expected an integer, got {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| E::custom(format!("expected an integer string, got \"{s}\""))),
        other => Err(E::custom(format!("expected an integer, got {other}"))),
    }
}

/// Integer from a number or numeric string; missing/null/empty is 0.
pub(crate) fn int_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_int(Value::deserialize(deserializer)?)?.unwrap_or(0))
}

/// Non-negative count from a number or numeric string; missing is 0.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = int_or_zero(deserializer)?;
    u64::try_from(n).map_err(|_| serde::de::Error::custom(format!("negative count {n}")))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "super::int_or_zero")]
        micros: i64,
        #[serde(default, deserialize_with = "super::count")]
        clicks: u64,
    }

    #[test]
    fn accepts_strings_numbers_and_absence() {
        let row: Row = serde_json::from_str(r#"{"micros": "12500000", "clicks": 7}"#).unwrap();
        assert_eq!(row.micros, 12_500_000);
        assert_eq!(row.clicks, 7);

        let row: Row = serde_json::from_str("{}").unwrap();
        assert_eq!((row.micros, row.clicks), (0, 0));
    }

    #[test]
    fn rejects_garbage_and_negative_counts() {
        assert!(serde_json::from_str::<Row>(r#"{"micros": "12.5"}"#).is_err());
        assert!(serde_json::from_str::<Row>(r#"{"clicks": "-1"}"#).is_err());
    }
}
