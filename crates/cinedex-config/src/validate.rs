//! Validation helpers and parsing utilities for configuration values.

use url::Url;

use crate::defaults::PAGE_SIZES;
use crate::error::{ConfigError, ConfigResult};

/// Parse an absolute `http`/`https` URL, trimming a trailing slash so that
/// endpoint paths can be appended verbatim.
///
/// # Errors
/// Returns [`ConfigError::InvalidField`] when the value does not parse or uses
/// another scheme.
pub fn parse_http_url(section: &'static str, field: &'static str, raw: &str) -> ConfigResult<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url =
        Url::parse(trimmed).map_err(|_| ConfigError::invalid(section, field, raw, "not a URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            section,
            field,
            raw,
            "scheme must be http or https",
        ));
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::invalid(section, field, raw, "not a base URL"));
    }
    Ok(url)
}

/// Validate a language tag of the form `ll-RR` (for example `en-US`).
///
/// # Errors
/// Returns [`ConfigError::InvalidField`] for any other shape.
pub fn parse_language(raw: &str) -> ConfigResult<String> {
    let value = raw.trim();
    let valid = value.split_once('-').is_some_and(|(lang, region)| {
        lang.len() == 2
            && region.len() == 2
            && lang.chars().all(|ch| ch.is_ascii_lowercase())
            && region.chars().all(|ch| ch.is_ascii_uppercase())
    });
    if valid {
        Ok(value.to_string())
    } else {
        Err(ConfigError::invalid(
            "api",
            "language",
            raw,
            "expected a tag like en-US",
        ))
    }
}

/// Parse an unsigned integer bounded to `min..=max`.
///
/// # Errors
/// Returns [`ConfigError::InvalidField`] when the value is not a number or
/// falls outside the range.
pub fn parse_bounded_u64(
    section: &'static str,
    field: &'static str,
    raw: &str,
    min: u64,
    max: u64,
) -> ConfigResult<u64> {
    let value = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::invalid(section, field, raw, "must be an unsigned integer"))?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::invalid(section, field, raw, "out of range"))
    }
}

/// Parse a page size, accepting only the sizes the paginator supports.
///
/// # Errors
/// Returns [`ConfigError::InvalidField`] for any other value.
pub fn parse_page_size(raw: &str) -> ConfigResult<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|size| PAGE_SIZES.contains(size))
        .ok_or_else(|| {
            ConfigError::invalid("browse", "page_size", raw, "must be one of 6, 12, 24, 48")
        })
}

/// Reject blank strings.
///
/// # Errors
/// Returns [`ConfigError::InvalidField`] when the value is empty after trimming.
pub fn parse_non_empty(section: &'static str, field: &'static str, raw: &str) -> ConfigResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        Err(ConfigError::invalid(section, field, raw, "must not be empty"))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_url_rejects_other_schemes() {
        assert!(parse_http_url("api", "base_url", "https://api.example.org/3/").is_ok());
        let err = parse_http_url("api", "base_url", "ftp://example.org").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "base_url",
                reason: "scheme must be http or https",
                ..
            }
        ));
        assert!(parse_http_url("api", "base_url", "not a url").is_err());
    }

    #[test]
    fn http_url_drops_trailing_slash() {
        let url = parse_http_url("api", "base_url", "https://api.example.org/3/").unwrap();
        assert_eq!(url.as_str(), "https://api.example.org/3");
    }

    #[test]
    fn language_requires_region() {
        assert_eq!(parse_language(" pt-PT ").unwrap(), "pt-PT");
        assert!(parse_language("pt").is_err());
        assert!(parse_language("PT-pt").is_err());
        assert!(parse_language("eng-USA").is_err());
    }

    #[test]
    fn bounded_integers_enforce_range() {
        assert_eq!(parse_bounded_u64("http", "timeout_ms", "250", 1, 1_000).unwrap(), 250);
        assert!(parse_bounded_u64("http", "timeout_ms", "0", 1, 1_000).is_err());
        assert!(parse_bounded_u64("http", "timeout_ms", "-4", 1, 1_000).is_err());
    }

    #[test]
    fn page_size_accepts_supported_values_only() {
        for size in PAGE_SIZES {
            assert_eq!(parse_page_size(&size.to_string()).unwrap(), size);
        }
        assert!(parse_page_size("10").is_err());
    }
}
