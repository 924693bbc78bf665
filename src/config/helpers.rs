use std::str::FromStr;

use crate::error::ConfigError;

/// Read an environment variable, treating empty values as unset.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode {
            key: key.to_string(),
        }),
    }
}

/// Parse an optional value with a default, reporting the key on failure.
pub(crate) fn parse_optional<T>(
    key: &str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_default() {
        let value: u64 = parse_optional("TIMEOUT", None, 30).unwrap();
        assert_eq!(value, 30);
    }

    #[test]
    fn test_parse_optional_trims() {
        let value: u64 = parse_optional("TIMEOUT", Some(" 45 ".to_string()), 30).unwrap();
        assert_eq!(value, 45);
    }

    #[test]
    fn test_parse_optional_invalid() {
        let err = parse_optional::<u64>("TIMEOUT", Some("soon".to_string()), 30).unwrap_err();
        assert!(err.to_string().contains("TIMEOUT"));
    }
}
