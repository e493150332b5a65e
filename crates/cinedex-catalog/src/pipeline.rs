//! Pure list transforms applied to fetched results: genre filter, stable
//! sort and favorites filter.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::model::{MediaItem, SortKey};

/// Keep items carrying at least one selected genre. An empty selection keeps
/// everything.
#[must_use]
pub fn filter_by_genres(items: Vec<MediaItem>, selected: &BTreeSet<u32>) -> Vec<MediaItem> {
    if selected.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| item.genre_ids().iter().any(|id| selected.contains(id)))
        .collect()
}

/// Stable in-place sort. Missing release dates order as 1970-01-01.
pub fn sort_items(items: &mut [MediaItem], key: SortKey) {
    items.sort_by(|a, b| compare(a, b, key));
}

/// Keep only items whose id is a favorite.
#[must_use]
pub fn filter_favorites(items: &[MediaItem], favorites: &BTreeSet<u64>) -> Vec<MediaItem> {
    items
        .iter()
        .filter(|item| favorites.contains(&item.id()))
        .cloned()
        .collect()
}

/// Genre filter followed by sort.
#[must_use]
pub fn prepare(items: Vec<MediaItem>, genres: &BTreeSet<u32>, key: SortKey) -> Vec<MediaItem> {
    let mut items = filter_by_genres(items, genres);
    sort_items(&mut items, key);
    items
}

fn compare(a: &MediaItem, b: &MediaItem, key: SortKey) -> Ordering {
    match key {
        SortKey::PopularityDesc => b.popularity().total_cmp(&a.popularity()),
        SortKey::PopularityAsc => a.popularity().total_cmp(&b.popularity()),
        SortKey::VoteAverageDesc => b.vote_average().total_cmp(&a.vote_average()),
        SortKey::VoteAverageAsc => a.vote_average().total_cmp(&b.vote_average()),
        SortKey::ReleaseDateDesc => date_key(b).cmp(&date_key(a)),
        SortKey::ReleaseDateAsc => date_key(a).cmp(&date_key(b)),
    }
}

fn date_key(item: &MediaItem) -> NaiveDate {
    item.release_date().unwrap_or_default()
}
