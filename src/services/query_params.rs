use std::fmt::Display;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};

/// Deserialize an optional query value, treating `?key=` like an absent key.
/// Use with `#[serde(default, deserialize_with = "empty_as_none")]`.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[derive(Debug, Deserialize)]
    struct Params {
        #[serde(default, deserialize_with = "empty_as_none")]
        min: Option<i64>,
    }

    fn parse(uri: &'static str) -> Result<Option<i64>, String> {
        let uri = Uri::from_static(uri);
        Query::<Params>::try_from_uri(&uri)
            .map(|Query(p)| p.min)
            .map_err(|e| e.to_string())
    }

    #[test]
    fn blank_or_missing_is_none() {
        assert_eq!(parse("/x"), Ok(None));
        assert_eq!(parse("/x?min="), Ok(None));
        assert_eq!(parse("/x?min=%20"), Ok(None));
    }

    #[test]
    fn present_value_is_parsed() {
        assert_eq!(parse("/x?min=15"), Ok(Some(15)));
        assert!(parse("/x?min=lots").is_err());
    }
}
