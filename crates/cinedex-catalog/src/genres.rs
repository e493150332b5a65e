//! Static genre table published by the provider.

use crate::model::MediaType;

/// One provider genre and the media types it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenreEntry {
    /// Provider genre identifier.
    pub id: u32,
    /// English display name.
    pub name: &'static str,
    /// Used by movie listings.
    pub movie: bool,
    /// Used by series listings.
    pub tv: bool,
}

const fn entry(id: u32, name: &'static str, movie: bool, tv: bool) -> GenreEntry {
    GenreEntry { id, name, movie, tv }
}

/// Every genre known to the provider.
pub static GENRES: [GenreEntry; 27] = [
    entry(28, "Action", true, false),
    entry(12, "Adventure", true, false),
    entry(16, "Animation", true, true),
    entry(35, "Comedy", true, true),
    entry(80, "Crime", true, true),
    entry(99, "Documentary", true, true),
    entry(18, "Drama", true, true),
    entry(10751, "Family", true, true),
    entry(14, "Fantasy", true, false),
    entry(36, "History", true, false),
    entry(27, "Horror", true, false),
    entry(10402, "Music", true, false),
    entry(9648, "Mystery", true, true),
    entry(10749, "Romance", true, false),
    entry(878, "Science Fiction", true, false),
    entry(10770, "TV Movie", true, false),
    entry(53, "Thriller", true, false),
    entry(10752, "War", true, false),
    entry(37, "Western", true, true),
    entry(10759, "Action & Adventure", false, true),
    entry(10762, "Kids", false, true),
    entry(10763, "News", false, true),
    entry(10764, "Reality", false, true),
    entry(10765, "Sci-Fi & Fantasy", false, true),
    entry(10766, "Soap", false, true),
    entry(10767, "Talk", false, true),
    entry(10768, "War & Politics", false, true),
];

/// Display name for a genre id.
#[must_use]
pub fn genre_name(id: u32) -> Option<&'static str> {
    GENRES.iter().find(|genre| genre.id == id).map(|genre| genre.name)
}

/// Genres that apply to the given media type, in table order.
pub fn genres_for(media_type: MediaType) -> impl Iterator<Item = &'static GenreEntry> {
    GENRES.iter().filter(move |genre| match media_type {
        MediaType::Movie => genre.movie,
        MediaType::Series => genre.tv,
    })
}

/// Resolve a numeric id or a case-insensitive genre name.
#[must_use]
pub fn resolve_genre(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    if let Ok(id) = trimmed.parse::<u32>() {
        return Some(id);
    }
    GENRES
        .iter()
        .find(|genre| genre.name.eq_ignore_ascii_case(trimmed))
        .map(|genre| genre.id)
}
