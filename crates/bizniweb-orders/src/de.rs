//! Lenient field deserializers.
//!
//! The order API is inconsistent about scalar types: IDs, order numbers,
//! EANs and house numbers arrive as strings on some orders and as numbers
//! on others, and list fields are sometimes `null` instead of `[]`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a string, number, or boolean and keeps its textual form.
pub(crate) fn string_or_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    opt_string_or_scalar(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a string or number, got null"))
}

/// Like [`string_or_scalar`] but maps `null` to `None`.
pub(crate) fn opt_string_or_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar, got {other}"
        ))),
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "super::string_or_scalar")]
        id: String,
        #[serde(default, deserialize_with = "super::opt_string_or_scalar")]
        ean: Option<String>,
        #[serde(default, deserialize_with = "super::null_as_default")]
        tags: Vec<String>,
    }

    #[test]
    fn numeric_id_becomes_string() {
        let p: Probe = serde_json::from_str(r#"{"id": 42, "ean": 8588000000001}"#).unwrap();
        assert_eq!(p.id, "42");
        assert_eq!(p.ean.as_deref(), Some("8588000000001"));
        assert!(p.tags.is_empty());
    }

    #[test]
    fn null_list_becomes_empty() {
        let p: Probe = serde_json::from_str(r#"{"id": "a", "ean": null, "tags": null}"#).unwrap();
        assert!(p.ean.is_none());
        assert!(p.tags.is_empty());
    }

    #[test]
    fn null_id_is_rejected() {
        assert!(serde_json::from_str::<Probe>(r#"{"id": null}"#).is_err());
    }
}
