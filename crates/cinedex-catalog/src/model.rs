//! Catalog data model shared by the service, pipeline and controller.
//!
//! # Design
//! - Movies and series share most fields but are never duck-typed: every
//!   consumer matches on [`MediaItem`].
//! - Provider payloads are loose (nulls, empty date strings); decoding is
//!   lenient so one odd record never fails a whole page.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Media type selector; also the endpoint path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MediaType {
    /// Feature films.
    #[default]
    #[serde(rename = "movie")]
    Movie,
    /// Television series.
    #[serde(rename = "tv")]
    Series,
}

impl MediaType {
    /// Provider path segment for this media type.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "tv",
        }
    }

    /// Human label used in listings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" | "film" => Ok(Self::Movie),
            "tv" | "series" | "show" => Ok(Self::Series),
            other => Err(format!("unknown media type '{other}' (expected movie or tv)")),
        }
    }
}

/// Sort orders offered by the provider and mirrored client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// Most popular first.
    #[default]
    #[serde(rename = "popularity.desc")]
    PopularityDesc,
    /// Least popular first.
    #[serde(rename = "popularity.asc")]
    PopularityAsc,
    /// Highest rated first.
    #[serde(rename = "vote_average.desc")]
    VoteAverageDesc,
    /// Lowest rated first.
    #[serde(rename = "vote_average.asc")]
    VoteAverageAsc,
    /// Newest first.
    #[serde(rename = "release_date.desc")]
    ReleaseDateDesc,
    /// Oldest first.
    #[serde(rename = "release_date.asc")]
    ReleaseDateAsc,
}

impl SortKey {
    /// Every supported sort key in presentation order.
    pub const ALL: [Self; 6] = [
        Self::PopularityDesc,
        Self::PopularityAsc,
        Self::VoteAverageDesc,
        Self::VoteAverageAsc,
        Self::ReleaseDateDesc,
        Self::ReleaseDateAsc,
    ];

    /// Wire value sent as `sort_by`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PopularityDesc => "popularity.desc",
            Self::PopularityAsc => "popularity.asc",
            Self::VoteAverageDesc => "vote_average.desc",
            Self::VoteAverageAsc => "vote_average.asc",
            Self::ReleaseDateDesc => "release_date.desc",
            Self::ReleaseDateAsc => "release_date.asc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|key| key.as_str()).collect();
                format!("unknown sort key '{wanted}' (expected one of {})", known.join(", "))
            })
    }
}

/// A film as returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// Provider identifier, unique among movies.
    pub id: u64,
    /// Localised title.
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    /// Title in the original language.
    #[serde(default, deserialize_with = "nullable")]
    pub original_title: String,
    /// Synopsis.
    #[serde(default, deserialize_with = "nullable")]
    pub overview: String,
    /// Relative poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Relative backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Theatrical release date; `None` when missing or unparseable.
    #[serde(default, deserialize_with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
    /// Provider popularity score.
    #[serde(default, deserialize_with = "nullable")]
    pub popularity: f64,
    /// Average rating on a 0–10 scale.
    #[serde(default, deserialize_with = "nullable")]
    pub vote_average: f64,
    /// Number of votes behind `vote_average`.
    #[serde(default, deserialize_with = "nullable")]
    pub vote_count: u64,
    /// Genre identifiers.
    #[serde(default, deserialize_with = "nullable")]
    pub genre_ids: Vec<u32>,
    /// ISO 639-1 code of the original language.
    #[serde(default, deserialize_with = "nullable")]
    pub original_language: String,
    /// Adult content flag.
    #[serde(default, deserialize_with = "nullable")]
    pub adult: bool,
}

/// A television series as returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Provider identifier, unique among series.
    pub id: u64,
    /// Localised name.
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// Name in the original language.
    #[serde(default, deserialize_with = "nullable")]
    pub original_name: String,
    /// Synopsis.
    #[serde(default, deserialize_with = "nullable")]
    pub overview: String,
    /// Relative poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Relative backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// First broadcast date; `None` when missing or unparseable.
    #[serde(default, deserialize_with = "lenient_date")]
    pub first_air_date: Option<NaiveDate>,
    /// Provider popularity score.
    #[serde(default, deserialize_with = "nullable")]
    pub popularity: f64,
    /// Average rating on a 0–10 scale.
    #[serde(default, deserialize_with = "nullable")]
    pub vote_average: f64,
    /// Number of votes behind `vote_average`.
    #[serde(default, deserialize_with = "nullable")]
    pub vote_count: u64,
    /// Genre identifiers.
    #[serde(default, deserialize_with = "nullable")]
    pub genre_ids: Vec<u32>,
    /// ISO 639-1 code of the original language.
    #[serde(default, deserialize_with = "nullable")]
    pub original_language: String,
    /// Production countries.
    #[serde(default, deserialize_with = "nullable")]
    pub origin_country: Vec<String>,
}

/// A catalog entry, discriminated by `media_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "media_type")]
pub enum MediaItem {
    /// A film.
    #[serde(rename = "movie")]
    Movie(Movie),
    /// A television series.
    #[serde(rename = "tv")]
    Series(Series),
}

impl MediaItem {
    /// Provider identifier (unique only within one media type).
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::Movie(movie) => movie.id,
            Self::Series(series) => series.id,
        }
    }

    /// Variant discriminant.
    #[must_use]
    pub const fn media_type(&self) -> MediaType {
        match self {
            Self::Movie(_) => MediaType::Movie,
            Self::Series(_) => MediaType::Series,
        }
    }

    /// Title for movies, name for series.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Movie(movie) => &movie.title,
            Self::Series(series) => &series.name,
        }
    }

    /// Release date for movies, first air date for series.
    #[must_use]
    pub const fn release_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Movie(movie) => movie.release_date,
            Self::Series(series) => series.first_air_date,
        }
    }

    /// Provider popularity score.
    #[must_use]
    pub const fn popularity(&self) -> f64 {
        match self {
            Self::Movie(movie) => movie.popularity,
            Self::Series(series) => series.popularity,
        }
    }

    /// Average rating on a 0–10 scale.
    #[must_use]
    pub const fn vote_average(&self) -> f64 {
        match self {
            Self::Movie(movie) => movie.vote_average,
            Self::Series(series) => series.vote_average,
        }
    }

    /// Genre identifiers attached to the item.
    #[must_use]
    pub fn genre_ids(&self) -> &[u32] {
        match self {
            Self::Movie(movie) => &movie.genre_ids,
            Self::Series(series) => &series.genre_ids,
        }
    }

    /// Synopsis.
    #[must_use]
    pub fn overview(&self) -> &str {
        match self {
            Self::Movie(movie) => &movie.overview,
            Self::Series(series) => &series.overview,
        }
    }

    /// Relative poster path, when the provider has one.
    #[must_use]
    pub fn poster_path(&self) -> Option<&str> {
        match self {
            Self::Movie(movie) => movie.poster_path.as_deref(),
            Self::Series(series) => series.poster_path.as_deref(),
        }
    }
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultPage {
    /// 1-based page number.
    pub page: u32,
    /// Items in provider order.
    #[serde(rename = "results")]
    pub items: Vec<MediaItem>,
    /// Number of pages the provider reports.
    pub total_pages: u32,
    /// Number of results the provider reports.
    pub total_results: u64,
}

impl SearchResultPage {
    /// Page returned for blank searches.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            page: 1,
            items: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }
}

/// Genre reference embedded in detail payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// Genre identifier.
    pub id: u32,
    /// Localised genre name.
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

/// Company or network reference embedded in detail payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    /// Provider identifier.
    pub id: u64,
    /// Display name.
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

/// Extended movie record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    /// Provider identifier.
    pub id: u64,
    /// Localised title.
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    /// Title in the original language.
    #[serde(default, deserialize_with = "nullable")]
    pub original_title: String,
    /// Synopsis.
    #[serde(default, deserialize_with = "nullable")]
    pub overview: String,
    /// Marketing tagline.
    #[serde(default)]
    pub tagline: Option<String>,
    /// Relative poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Relative backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Theatrical release date.
    #[serde(default, deserialize_with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Production budget in US dollars.
    #[serde(default)]
    pub budget: Option<u64>,
    /// Box office revenue in US dollars.
    #[serde(default)]
    pub revenue: Option<u64>,
    /// Release status (e.g. `Released`).
    #[serde(default)]
    pub status: Option<String>,
    /// Genres with names.
    #[serde(default, deserialize_with = "nullable")]
    pub genres: Vec<Genre>,
    /// Production companies.
    #[serde(default, deserialize_with = "nullable")]
    pub production_companies: Vec<NamedEntity>,
    /// Official site.
    #[serde(default)]
    pub homepage: Option<String>,
    /// Provider popularity score.
    #[serde(default, deserialize_with = "nullable")]
    pub popularity: f64,
    /// Average rating on a 0–10 scale.
    #[serde(default, deserialize_with = "nullable")]
    pub vote_average: f64,
    /// Number of votes behind `vote_average`.
    #[serde(default, deserialize_with = "nullable")]
    pub vote_count: u64,
    /// ISO 639-1 code of the original language.
    #[serde(default, deserialize_with = "nullable")]
    pub original_language: String,
    /// Adult content flag.
    #[serde(default, deserialize_with = "nullable")]
    pub adult: bool,
}

/// Extended series record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDetails {
    /// Provider identifier.
    pub id: u64,
    /// Localised name.
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// Name in the original language.
    #[serde(default, deserialize_with = "nullable")]
    pub original_name: String,
    /// Synopsis.
    #[serde(default, deserialize_with = "nullable")]
    pub overview: String,
    /// Marketing tagline.
    #[serde(default)]
    pub tagline: Option<String>,
    /// Relative poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Relative backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// First broadcast date.
    #[serde(default, deserialize_with = "lenient_date")]
    pub first_air_date: Option<NaiveDate>,
    /// Latest broadcast date.
    #[serde(default, deserialize_with = "lenient_date")]
    pub last_air_date: Option<NaiveDate>,
    /// Season count.
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    /// Episode count across all seasons.
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
    /// Typical episode runtimes in minutes.
    #[serde(default, deserialize_with = "nullable")]
    pub episode_run_time: Vec<u32>,
    /// Production status (e.g. `Ended`).
    #[serde(default)]
    pub status: Option<String>,
    /// Whether new episodes are still being produced.
    #[serde(default, deserialize_with = "nullable")]
    pub in_production: bool,
    /// Genres with names.
    #[serde(default, deserialize_with = "nullable")]
    pub genres: Vec<Genre>,
    /// Broadcasting networks.
    #[serde(default, deserialize_with = "nullable")]
    pub networks: Vec<NamedEntity>,
    /// Provider popularity score.
    #[serde(default, deserialize_with = "nullable")]
    pub popularity: f64,
    /// Average rating on a 0–10 scale.
    #[serde(default, deserialize_with = "nullable")]
    pub vote_average: f64,
    /// Number of votes behind `vote_average`.
    #[serde(default, deserialize_with = "nullable")]
    pub vote_count: u64,
    /// ISO 639-1 code of the original language.
    #[serde(default, deserialize_with = "nullable")]
    pub original_language: String,
}

/// Extended record for a single catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "media_type")]
pub enum MediaItemDetails {
    /// Film details.
    #[serde(rename = "movie")]
    Movie(MovieDetails),
    /// Series details.
    #[serde(rename = "tv")]
    Series(SeriesDetails),
}

impl MediaItemDetails {
    /// Provider identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::Movie(details) => details.id,
            Self::Series(details) => details.id,
        }
    }
}

/// User-controlled query state; replaced wholesale on each interaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParameters {
    /// Free-text search term; `None` browses popular titles.
    pub text: Option<String>,
    /// Media type being browsed.
    pub media_type: MediaType,
    /// Client-side sort order.
    pub sort_key: SortKey,
    /// Selected genres; empty keeps everything.
    pub genre_ids: BTreeSet<u32>,
}

impl QueryParameters {
    /// Trimmed search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// Server-side filters for the discovery endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscoverFilters {
    /// Provider sort order.
    pub sort_key: SortKey,
    /// Genres that must be present (`with_genres`).
    pub genre_ids: Vec<u32>,
    /// Inclusive lower release year.
    pub year_from: Option<i32>,
    /// Inclusive upper release year.
    pub year_to: Option<i32>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()))
}
