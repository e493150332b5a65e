//! Provider-shaped JSON builders.

use serde_json::{Value, json};

/// Minimal movie record.
#[must_use]
pub fn movie(id: u64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "original_title": title,
        "overview": format!("Overview of {title}"),
        "poster_path": format!("/poster-{id}.jpg"),
        "release_date": "",
        "popularity": 0.0,
        "vote_average": 0.0,
        "vote_count": 0,
        "genre_ids": [],
        "original_language": "en",
        "adult": false
    })
}

/// Minimal series record.
#[must_use]
pub fn series(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "original_name": name,
        "overview": format!("Overview of {name}"),
        "poster_path": null,
        "first_air_date": "",
        "popularity": 0.0,
        "vote_average": 0.0,
        "vote_count": 0,
        "genre_ids": [],
        "original_language": "en",
        "origin_country": ["US"]
    })
}

/// Set `field` on a record built by [`movie`] or [`series`].
#[must_use]
pub fn with(mut record: Value, field: &str, value: impl Into<Value>) -> Value {
    if let Value::Object(map) = &mut record {
        map.insert(field.to_string(), value.into());
    }
    record
}

/// Single-page list response.
#[must_use]
pub fn page(results: Vec<Value>) -> Value {
    let total = results.len();
    json!({
        "page": 1,
        "results": results,
        "total_pages": u32::from(total > 0),
        "total_results": total
    })
}

/// Provider error body.
#[must_use]
pub fn provider_error(code: u32, message: &str) -> Value {
    json!({
        "success": false,
        "status_code": code,
        "status_message": message
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_overrides_fields() {
        let record = with(movie(1, "Heat"), "popularity", 12.5);
        assert_eq!(record["popularity"], 12.5);
        assert_eq!(record["title"], "Heat");
    }

    #[test]
    fn page_reports_totals() {
        let body = page(vec![movie(1, "A"), movie(2, "B")]);
        assert_eq!(body["total_results"], 2);
        assert_eq!(body["total_pages"], 1);
        assert_eq!(page(Vec::new())["total_pages"], 0);
    }
}
