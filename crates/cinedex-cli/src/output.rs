//! Output renderers and formatting helpers for CLI commands.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::io::Write;

use anyhow::anyhow;
use cinedex_catalog::format::{
    FALLBACK, ImageKind, OVERVIEW_LIMIT, format_boolean, format_currency, format_duration,
    format_naive_date, format_number, format_rating, format_string, image_or_placeholder,
    truncate_text,
};
use cinedex_catalog::genres::{GENRES, genre_name};
use cinedex_catalog::model::{Genre, MovieDetails, NamedEntity, SeriesDetails};
use cinedex_catalog::{MediaItem, MediaItemDetails, MediaType, PaginationView};
use cinedex_config::CatalogConfig;
use serde::Serialize;
use serde_json::json;
use url::Url;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

const TITLE_WIDTH: usize = 48;

/// One page of titles ready for rendering.
pub(crate) struct Listing<'a> {
    pub(crate) heading: String,
    pub(crate) view: PaginationView<'a, MediaItem>,
    pub(crate) favorites: &'a BTreeSet<u64>,
    pub(crate) total_results: u64,
}

#[derive(Serialize)]
struct ListingJson<'a> {
    page: usize,
    page_size: usize,
    total_pages: usize,
    total_items: usize,
    total_results: u64,
    items: Vec<ItemJson<'a>>,
}

#[derive(Serialize)]
struct ItemJson<'a> {
    #[serde(flatten)]
    item: &'a MediaItem,
    favorite: bool,
}

#[derive(Serialize)]
struct DetailsJson<'a> {
    #[serde(flatten)]
    details: &'a MediaItemDetails,
    favorite: bool,
}

#[derive(Serialize)]
struct ConfigJson<'a> {
    #[serde(flatten)]
    config: &'a CatalogConfig,
    api_key_configured: bool,
}

pub(crate) fn write_text(out: &mut dyn Write, text: &str) -> CliResult<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
}

fn write_json(out: &mut dyn Write, value: &impl Serialize) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    write_text(out, &format!("{text}\n"))
}

fn push_line(text: &mut String, line: impl Display) {
    text.push_str(&line.to_string());
    text.push('\n');
}

/// `Movies` or `Series`.
pub(crate) const fn media_heading(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movie => "Movies",
        MediaType::Series => "Series",
    }
}

pub(crate) fn render_listing(
    out: &mut dyn Write,
    listing: &Listing<'_>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let view = &listing.view;
            let payload = ListingJson {
                page: view.current_page,
                page_size: view.page_size.get(),
                total_pages: view.total_pages,
                total_items: view.total_items,
                total_results: listing.total_results,
                items: view
                    .items
                    .iter()
                    .map(|item| ItemJson {
                        item,
                        favorite: listing.favorites.contains(&item.id()),
                    })
                    .collect(),
            };
            write_json(out, &payload)
        }
        OutputFormat::Table => write_text(out, &listing_table(listing)),
    }
}

/// Table rendering shared by one-shot commands and the explore session.
pub(crate) fn listing_table(listing: &Listing<'_>) -> String {
    let view = &listing.view;
    let mut text = String::new();
    push_line(&mut text, &listing.heading);
    if view.total_items == 0 {
        push_line(&mut text, "No results.");
        return text;
    }

    push_line(
        &mut text,
        format_args!(
            "{:>8}  {:<6}  {:<18}  {:>7}  {} TITLE",
            "ID", "TYPE", "RELEASED", "RATING", " "
        ),
    );
    for item in view.items {
        let marker = if listing.favorites.contains(&item.id()) {
            "★"
        } else {
            " "
        };
        push_line(
            &mut text,
            format_args!(
                "{:>8}  {:<6}  {:<18}  {:>7}  {} {}",
                item.id(),
                item.media_type().label(),
                format_naive_date(item.release_date()),
                format_rating(Some(item.vote_average())),
                marker,
                truncate_text(Some(item.title()), TITLE_WIDTH)
            ),
        );
        if !item.overview().trim().is_empty() {
            push_line(
                &mut text,
                format_args!(
                    "{:>10}{}",
                    "",
                    truncate_text(Some(item.overview()), OVERVIEW_LIMIT)
                ),
            );
        }
    }
    push_line(
        &mut text,
        format_args!(
            "page {} of {} (items {}-{} of {}; {} reported)",
            view.current_page,
            view.total_pages,
            view.first_position(),
            view.last_position(),
            view.total_items,
            format_number(i64::try_from(listing.total_results).ok())
        ),
    );
    text
}

fn joined_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        FALLBACK.to_string()
    } else {
        names.join(", ")
    }
}

fn genre_names(genres: &[Genre]) -> String {
    joined_names(genres.iter().map(|genre| genre.name.as_str()))
}

fn entity_names(entities: &[NamedEntity]) -> String {
    joined_names(entities.iter().map(|entity| entity.name.as_str()))
}

fn count(value: u64) -> String {
    format_number(i64::try_from(value).ok())
}

fn money(value: Option<u64>) -> String {
    format_currency(value.and_then(|amount| i64::try_from(amount).ok()))
}

fn movie_lines(text: &mut String, movie: &MovieDetails, image_base: &Url) {
    push_line(text, format_args!("{} (movie {})", movie.title, movie.id));
    push_line(text, format_args!("original title: {}", format_string(Some(&movie.original_title))));
    push_line(text, format_args!("tagline: {}", format_string(movie.tagline.as_deref())));
    push_line(text, format_args!("overview: {}", format_string(Some(&movie.overview))));
    push_line(text, format_args!("released: {}", format_naive_date(movie.release_date)));
    push_line(text, format_args!("runtime: {}", format_duration(movie.runtime)));
    push_line(
        text,
        format_args!(
            "rating: {} ({} votes)",
            format_rating(Some(movie.vote_average)),
            count(movie.vote_count)
        ),
    );
    push_line(text, format_args!("genres: {}", genre_names(&movie.genres)));
    push_line(text, format_args!("status: {}", format_string(movie.status.as_deref())));
    push_line(text, format_args!("budget: {}", money(movie.budget)));
    push_line(text, format_args!("revenue: {}", money(movie.revenue)));
    push_line(
        text,
        format_args!("companies: {}", entity_names(&movie.production_companies)),
    );
    push_line(text, format_args!("language: {}", format_string(Some(&movie.original_language))));
    push_line(text, format_args!("homepage: {}", format_string(movie.homepage.as_deref())));
    push_line(
        text,
        format_args!(
            "poster: {}",
            image_or_placeholder(image_base, movie.poster_path.as_deref(), ImageKind::Poster)
        ),
    );
    push_line(
        text,
        format_args!(
            "backdrop: {}",
            image_or_placeholder(image_base, movie.backdrop_path.as_deref(), ImageKind::Backdrop)
        ),
    );
}

fn series_lines(text: &mut String, series: &SeriesDetails, image_base: &Url) {
    push_line(text, format_args!("{} (tv {})", series.name, series.id));
    push_line(text, format_args!("original name: {}", format_string(Some(&series.original_name))));
    push_line(text, format_args!("tagline: {}", format_string(series.tagline.as_deref())));
    push_line(text, format_args!("overview: {}", format_string(Some(&series.overview))));
    push_line(text, format_args!("first aired: {}", format_naive_date(series.first_air_date)));
    push_line(text, format_args!("last aired: {}", format_naive_date(series.last_air_date)));
    push_line(
        text,
        format_args!(
            "seasons: {} / episodes: {}",
            format_number(series.number_of_seasons.map(i64::from)),
            format_number(series.number_of_episodes.map(i64::from))
        ),
    );
    push_line(
        text,
        format_args!(
            "episode runtime: {}",
            format_duration(series.episode_run_time.first().copied())
        ),
    );
    push_line(
        text,
        format_args!(
            "rating: {} ({} votes)",
            format_rating(Some(series.vote_average)),
            count(series.vote_count)
        ),
    );
    push_line(text, format_args!("genres: {}", genre_names(&series.genres)));
    push_line(text, format_args!("networks: {}", entity_names(&series.networks)));
    push_line(text, format_args!("status: {}", format_string(series.status.as_deref())));
    push_line(
        text,
        format_args!("in production: {}", format_boolean(Some(series.in_production))),
    );
    push_line(text, format_args!("language: {}", format_string(Some(&series.original_language))));
    push_line(
        text,
        format_args!(
            "poster: {}",
            image_or_placeholder(image_base, series.poster_path.as_deref(), ImageKind::Poster)
        ),
    );
    push_line(
        text,
        format_args!(
            "backdrop: {}",
            image_or_placeholder(image_base, series.backdrop_path.as_deref(), ImageKind::Backdrop)
        ),
    );
}

pub(crate) fn render_details(
    out: &mut dyn Write,
    details: &MediaItemDetails,
    favorite: bool,
    image_base: &Url,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, &DetailsJson { details, favorite }),
        OutputFormat::Table => {
            let mut text = String::new();
            match details {
                MediaItemDetails::Movie(movie) => movie_lines(&mut text, movie, image_base),
                MediaItemDetails::Series(series) => series_lines(&mut text, series, image_base),
            }
            push_line(&mut text, format_args!("favorite: {}", format_boolean(Some(favorite))));
            write_text(out, &text)
        }
    }
}

pub(crate) fn render_genres(
    out: &mut dyn Write,
    media_type: Option<MediaType>,
    format: OutputFormat,
) -> CliResult<()> {
    let selected: Vec<_> = GENRES
        .iter()
        .filter(|genre| match media_type {
            Some(MediaType::Movie) => genre.movie,
            Some(MediaType::Series) => genre.tv,
            None => true,
        })
        .collect();
    match format {
        OutputFormat::Json => {
            let payload: Vec<_> = selected
                .iter()
                .map(|genre| {
                    json!({
                        "id": genre.id,
                        "name": genre.name,
                        "movie": genre.movie,
                        "tv": genre.tv,
                    })
                })
                .collect();
            write_json(out, &payload)
        }
        OutputFormat::Table => {
            let mut text = String::new();
            push_line(&mut text, format_args!("{:>6}  {:<20} {:<6} TV", "ID", "NAME", "MOVIE"));
            for genre in selected {
                push_line(
                    &mut text,
                    format_args!(
                        "{:>6}  {:<20} {:<6} {}",
                        genre.id,
                        genre.name,
                        if genre.movie { "yes" } else { "no" },
                        if genre.tv { "yes" } else { "no" }
                    ),
                );
            }
            write_text(out, &text)
        }
    }
}

pub(crate) fn render_favorites(
    out: &mut dyn Write,
    ids: &BTreeSet<u64>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, ids),
        OutputFormat::Table => {
            let mut text = String::new();
            if ids.is_empty() {
                push_line(&mut text, "No favorites yet.");
            }
            for id in ids {
                push_line(&mut text, id);
            }
            write_text(out, &text)
        }
    }
}

pub(crate) fn render_toggle(
    out: &mut dyn Write,
    id: u64,
    favorite: bool,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, &json!({ "id": id, "favorite": favorite })),
        OutputFormat::Table => {
            let line = if favorite {
                format!("added {id} to favorites\n")
            } else {
                format!("removed {id} from favorites\n")
            };
            write_text(out, &line)
        }
    }
}

pub(crate) fn render_config(
    out: &mut dyn Write,
    config: &CatalogConfig,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(
            out,
            &ConfigJson {
                config,
                api_key_configured: config.api.has_api_key(),
            },
        ),
        OutputFormat::Table => {
            let mut text = String::new();
            push_line(&mut text, format_args!("api url: {}", config.api.base_url));
            push_line(&mut text, format_args!("image url: {}", config.api.image_base_url));
            push_line(
                &mut text,
                format_args!(
                    "api key: {}",
                    if config.api.has_api_key() { "configured" } else { "not set" }
                ),
            );
            push_line(&mut text, format_args!("language: {}", config.api.language));
            push_line(&mut text, format_args!("timeout: {} ms", config.http.timeout_ms));
            push_line(&mut text, format_args!("retries: {}", config.http.retries));
            push_line(&mut text, format_args!("page size: {}", config.browse.page_size));
            push_line(&mut text, format_args!("debounce: {} ms", config.browse.debounce_ms));
            push_line(
                &mut text,
                format_args!("favorites file: {}", config.storage.favorites_path.display()),
            );
            write_text(out, &text)
        }
    }
}

/// Genre ids rendered as names where known.
pub(crate) fn genre_labels(ids: &BTreeSet<u32>) -> String {
    let labels: Vec<String> = ids
        .iter()
        .map(|id| genre_name(*id).map_or_else(|| id.to_string(), str::to_string))
        .collect();
    labels.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_catalog::{PageSize, Pagination};
    use serde_json::Value;

    fn items() -> Vec<MediaItem> {
        serde_json::from_value(json!([
            {"media_type": "movie", "id": 1, "title": "Heat", "release_date": "1995-12-15",
             "vote_average": 7.9, "overview": "A group of high-end professional thieves."},
            {"media_type": "tv", "id": 2, "name": "Twin Peaks", "vote_average": 8.4},
        ]))
        .unwrap()
    }

    #[test]
    fn table_marks_favorites_and_formats_fields() {
        let items = items();
        let favorites = BTreeSet::from([2]);
        let listing = Listing {
            heading: "Popular movies".into(),
            view: Pagination::new(PageSize::default()).view(&items),
            favorites: &favorites,
            total_results: 1_234,
        };
        let text = listing_table(&listing);
        let heat = text.lines().find(|line| line.contains("Heat")).unwrap();
        assert!(heat.contains("December 15, 1995"));
        assert!(heat.contains("7.9/10"));
        assert!(!heat.contains('★'));
        let peaks = text.lines().find(|line| line.contains("Twin Peaks")).unwrap();
        assert!(peaks.contains('★'));
        assert!(peaks.contains("series"));
        assert!(peaks.contains(FALLBACK));
        assert!(text.contains("professional thieves"));
        assert!(text.contains("page 1 of 1 (items 1-2 of 2; 1,234 reported)"));
    }

    #[test]
    fn empty_listing_says_so() {
        let items: Vec<MediaItem> = Vec::new();
        let favorites = BTreeSet::new();
        let listing = Listing {
            heading: "Movies matching \"zzz\"".into(),
            view: Pagination::new(PageSize::default()).view(&items),
            favorites: &favorites,
            total_results: 0,
        };
        assert_eq!(listing_table(&listing), "Movies matching \"zzz\"\nNo results.\n");
    }

    #[test]
    fn json_listing_flattens_items_with_favorite_flag() {
        let items = items();
        let favorites = BTreeSet::from([1]);
        let listing = Listing {
            heading: String::new(),
            view: Pagination::new(PageSize::default()).view(&items),
            favorites: &favorites,
            total_results: 2,
        };
        let mut out = Vec::new();
        render_listing(&mut out, &listing, OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["page_size"], 12);
        assert_eq!(value["items"][0]["title"], "Heat");
        assert_eq!(value["items"][0]["favorite"], true);
        assert_eq!(value["items"][1]["media_type"], "tv");
        assert_eq!(value["items"][1]["favorite"], false);
    }

    #[test]
    fn series_details_use_placeholders_and_fallbacks() {
        let details: SeriesDetails = serde_json::from_value(json!({
            "id": 1399,
            "name": "Game of Thrones",
            "number_of_seasons": 8,
            "episode_run_time": [60],
            "in_production": false,
            "networks": [{"id": 49, "name": "HBO"}]
        }))
        .unwrap();
        let base = Url::parse("https://image.tmdb.org/t/p").unwrap();
        let mut out = Vec::new();
        render_details(
            &mut out,
            &MediaItemDetails::Series(details),
            true,
            &base,
            OutputFormat::Table,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("seasons: 8 / episodes: —"));
        assert!(text.contains("episode runtime: 1h"));
        assert!(text.contains("networks: HBO"));
        assert!(text.contains("in production: ✗ No"));
        assert!(text.contains(&format!("poster: {}", ImageKind::Poster.placeholder())));
        assert!(text.contains("favorite: ✓ Yes"));
    }

    #[test]
    fn config_table_hides_the_key() {
        let config = cinedex_config::ConfigLoader::from_lookup(|name: &str| {
            (name == "CINEDEX_API_KEY").then(|| "hunter2".to_string())
        })
        .load()
        .unwrap();
        let mut out = Vec::new();
        render_config(&mut out, &config, OutputFormat::Table).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("api key: configured"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn genre_labels_fall_back_to_ids() {
        assert_eq!(genre_labels(&BTreeSet::from([28, 4242])), "Action, 4242");
    }
}
