//! Field deserializers for values produced by a language model.
//!
//! The service fills its response from generated JSON, so a field may come
//! back as `null` and a count may come back as `1500.0`. Neither should cost
//! the user a finished analysis.

use serde::{Deserialize, Deserializer};

/// `null` reads as the field's default.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A non-negative count that may arrive as an integer or a float.
/// `null`, negative and non-finite values read as zero.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or_default();
    Ok(if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    })
}

/// Same as [`count`] for narrower fields such as an hour of the day.
pub fn small_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count(deserializer)?.min(u32::MAX as u64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        #[serde(deserialize_with = "or_default")]
        name: String,
        #[serde(deserialize_with = "or_default")]
        tags: Vec<String>,
        #[serde(deserialize_with = "count")]
        total: u64,
        #[serde(deserialize_with = "small_count")]
        hour: u32,
    }

    #[test]
    fn null_reads_as_default() {
        let s: Sample =
            serde_json::from_str(r#"{"name":null,"tags":null,"total":null,"hour":null}"#).unwrap();
        assert_eq!(s.name, "");
        assert!(s.tags.is_empty());
        assert_eq!(s.total, 0);
        assert_eq!(s.hour, 0);
    }

    #[test]
    fn counts_accept_integral_floats() {
        let s: Sample = serde_json::from_str(r#"{"total":1500.0,"hour":21.0}"#).unwrap();
        assert_eq!(s.total, 1500);
        assert_eq!(s.hour, 21);
    }

    #[test]
    fn counts_round_and_floor_at_zero() {
        let s: Sample = serde_json::from_str(r#"{"total":12.6,"hour":-3}"#).unwrap();
        assert_eq!(s.total, 13);
        assert_eq!(s.hour, 0);
    }

    #[test]
    fn wrong_types_still_fail() {
        assert!(serde_json::from_str::<Sample>(r#"{"total":"many"}"#).is_err());
    }
}
