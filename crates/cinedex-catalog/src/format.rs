//! Display formatting for raw catalog fields.
//!
//! Every function is pure and total: absent or blank input renders as
//! [`FALLBACK`].

use chrono::NaiveDate;
use url::Url;

/// Rendered in place of a missing value.
pub const FALLBACK: &str = "—";

/// Default truncation length for overviews.
pub const OVERVIEW_LIMIT: usize = 150;

/// Trimmed text, or the fallback when blank.
#[must_use]
pub fn format_string(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => FALLBACK.to_string(),
    }
}

/// Integer with comma thousands separators.
#[must_use]
pub fn format_number(value: Option<i64>) -> String {
    value.map_or_else(|| FALLBACK.to_string(), group_thousands)
}

/// `YYYY-MM-DD` rendered as `March 5, 2024`.
#[must_use]
pub fn format_date(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .map_or_else(|| FALLBACK.to_string(), |date| format_naive_date(Some(date)))
}

/// Already-parsed date rendered as `March 5, 2024`.
#[must_use]
pub fn format_naive_date(value: Option<NaiveDate>) -> String {
    value.map_or_else(
        || FALLBACK.to_string(),
        |date| date.format("%B %-d, %Y").to_string(),
    )
}

/// Vote average as `7.3/10`.
#[must_use]
pub fn format_rating(value: Option<f64>) -> String {
    match value {
        Some(rating) if rating.is_finite() => format!("{rating:.1}/10"),
        _ => FALLBACK.to_string(),
    }
}

/// Minutes as `2h 5m`, or `45m` under an hour. Zero counts as absent.
#[must_use]
pub fn format_duration(minutes: Option<u32>) -> String {
    match minutes {
        None | Some(0) => FALLBACK.to_string(),
        Some(total) if total < 60 => format!("{total}m"),
        Some(total) => format!("{}h {}m", total / 60, total % 60),
    }
}

/// Yes/no badge.
#[must_use]
pub fn format_boolean(value: Option<bool>) -> String {
    match value {
        Some(true) => "✓ Yes".to_string(),
        Some(false) => "✗ No".to_string(),
        None => FALLBACK.to_string(),
    }
}

/// Cut `text` to `max_chars` characters and append `...` when it was longer.
#[must_use]
pub fn truncate_text(text: Option<&str>, max_chars: usize) -> String {
    let Some(text) = text.filter(|text| !text.is_empty()) else {
        return FALLBACK.to_string();
    };
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Whole US dollars, as reported for budgets and revenue. Zero counts as
/// absent.
#[must_use]
pub fn format_currency(value: Option<i64>) -> String {
    match value {
        None | Some(0) => FALLBACK.to_string(),
        Some(amount) if amount < 0 => format!("-${}", group_thousands(amount.unsigned_abs())),
        Some(amount) => format!("${}", group_thousands(amount.unsigned_abs())),
    }
}

fn group_thousands(value: impl Into<i128>) -> String {
    let value: i128 = value.into();
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Image slot, which fixes the rendition size requested from the image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Portrait cover art.
    Poster,
    /// Wide background art.
    Backdrop,
    /// Person headshot.
    Profile,
}

impl ImageKind {
    /// CDN size segment.
    #[must_use]
    pub const fn size(self) -> &'static str {
        match self {
            Self::Poster => "w342",
            Self::Backdrop => "w1280",
            Self::Profile => "w185",
        }
    }

    /// Inline SVG shown when no image path exists.
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Poster => concat!(
                "data:image/svg+xml,%3Csvg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 342 513\"%3E",
                "%3Crect fill=\"%23222\" width=\"342\" height=\"513\"/%3E",
                "%3Ctext x=\"50%25\" y=\"50%25\" font-size=\"24\" fill=\"%23666\" text-anchor=\"middle\" ",
                "dominant-baseline=\"middle\"%3ENo poster%3C/text%3E%3C/svg%3E"
            ),
            Self::Backdrop => concat!(
                "data:image/svg+xml,%3Csvg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 1280 720\"%3E",
                "%3Crect fill=\"%23222\" width=\"1280\" height=\"720\"/%3E",
                "%3Ctext x=\"50%25\" y=\"50%25\" font-size=\"48\" fill=\"%23666\" text-anchor=\"middle\" ",
                "dominant-baseline=\"middle\"%3EImage unavailable%3C/text%3E%3C/svg%3E"
            ),
            Self::Profile => concat!(
                "data:image/svg+xml,%3Csvg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 185 278\"%3E",
                "%3Crect fill=\"%23222\" width=\"185\" height=\"278\"/%3E",
                "%3Ctext x=\"50%25\" y=\"50%25\" font-size=\"18\" fill=\"%23666\" text-anchor=\"middle\" ",
                "dominant-baseline=\"middle\"%3ENo photo%3C/text%3E%3C/svg%3E"
            ),
        }
    }
}

/// `{base}/{size}{path}`, or `None` when the path is absent or blank.
#[must_use]
pub fn image_url(base: &Url, path: Option<&str>, kind: ImageKind) -> Option<String> {
    let path = path.map(str::trim).filter(|path| !path.is_empty())?;
    let base = base.as_str().trim_end_matches('/');
    let separator = if path.starts_with('/') { "" } else { "/" };
    Some(format!("{base}/{}{separator}{path}", kind.size()))
}

/// Like [`image_url`] but substitutes the kind's placeholder.
#[must_use]
pub fn image_or_placeholder(base: &Url, path: Option<&str>, kind: ImageKind) -> String {
    image_url(base, path, kind).unwrap_or_else(|| kind.placeholder().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdn() -> Url {
        Url::parse("https://image.tmdb.org/t/p").unwrap()
    }

    #[test]
    fn strings_trim_and_fall_back() {
        assert_eq!(format_string(Some("  Dune ")), "Dune");
        assert_eq!(format_string(Some("   ")), FALLBACK);
        assert_eq!(format_string(None), FALLBACK);
    }

    #[test]
    fn numbers_group_thousands() {
        assert_eq!(format_number(Some(0)), "0");
        assert_eq!(format_number(Some(999)), "999");
        assert_eq!(format_number(Some(1_000)), "1,000");
        assert_eq!(format_number(Some(-1_234_567)), "-1,234,567");
        assert_eq!(format_number(None), FALLBACK);
    }

    #[test]
    fn dates_render_long_form() {
        assert_eq!(format_date(Some("2024-03-05")), "March 5, 2024");
        assert_eq!(format_date(Some("")), FALLBACK);
        assert_eq!(format_date(Some("soon")), FALLBACK);
        assert_eq!(format_date(None), FALLBACK);
    }

    #[test]
    fn ratings_and_durations() {
        assert_eq!(format_rating(Some(7.26)), "7.3/10");
        assert_eq!(format_rating(Some(f64::NAN)), FALLBACK);
        assert_eq!(format_duration(Some(125)), "2h 5m");
        assert_eq!(format_duration(Some(45)), "45m");
        assert_eq!(format_duration(Some(60)), "1h 0m");
        assert_eq!(format_duration(Some(0)), FALLBACK);
    }

    #[test]
    fn booleans_and_currency() {
        assert_eq!(format_boolean(Some(true)), "✓ Yes");
        assert_eq!(format_boolean(None), FALLBACK);
        assert_eq!(format_currency(Some(165_000_000)), "$165,000,000");
        assert_eq!(format_currency(Some(0)), FALLBACK);
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_text(Some("short"), 10), "short");
        assert_eq!(truncate_text(Some("abcdef"), 3), "abc...");
        assert_eq!(truncate_text(Some("ééééé"), 2), "éé...");
        assert_eq!(truncate_text(Some(""), 3), FALLBACK);
    }

    #[test]
    fn image_urls_use_kind_sizes() {
        assert_eq!(
            image_url(&cdn(), Some("/abc.jpg"), ImageKind::Poster).as_deref(),
            Some("https://image.tmdb.org/t/p/w342/abc.jpg")
        );
        assert_eq!(
            image_url(&cdn(), Some("/abc.jpg"), ImageKind::Backdrop).as_deref(),
            Some("https://image.tmdb.org/t/p/w1280/abc.jpg")
        );
        assert_eq!(image_url(&cdn(), None, ImageKind::Profile), None);
    }

    #[test]
    fn missing_images_get_placeholders() {
        let poster = image_or_placeholder(&cdn(), Some(" "), ImageKind::Poster);
        assert!(poster.starts_with("data:image/svg+xml,"));
        assert!(poster.contains("No poster"));
        assert_ne!(
            ImageKind::Backdrop.placeholder(),
            ImageKind::Profile.placeholder()
        );
    }
}
