//! Application state controller.
//!
//! # Design
//! - The controller never awaits. Parameter changes return a [`QueryTicket`];
//!   the caller drives [`QueryTicket::run`] and feeds the resulting
//!   [`QueryOutcome`] back through [`CatalogController::apply`].
//! - Starting a query cancels the previous token. `apply` only accepts the
//!   outcome of the active, uncancelled ticket, so the last request wins no
//!   matter in which order responses arrive.
//! - Sorting is client-side only; a genre change re-queries.

use std::collections::BTreeSet;

use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::error::{FetchError, FetchResult};
use crate::favorites::FavoritesStore;
use crate::model::{MediaItem, MediaType, QueryParameters, SearchResultPage, SortKey};
use crate::pagination::{PageSize, Pagination, PaginationView};
use crate::pipeline;
use crate::service::CatalogService;

/// Request lifecycle as seen by the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A query is in flight.
    Loading,
    /// The last query succeeded.
    Loaded,
    /// The last query failed.
    Failed {
        /// User-facing description.
        message: String,
    },
}

#[derive(Debug, Clone)]
enum QueryRequest {
    Search { term: String, media_type: MediaType },
    Popular { media_type: MediaType },
}

/// A query issued by the controller, ready to be run.
#[derive(Debug)]
pub struct QueryTicket {
    id: Uuid,
    service: CatalogService,
    request: QueryRequest,
    cancel: CancelToken,
}

impl QueryTicket {
    /// Correlation id, also attached to log spans.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Token that aborts this query.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Perform the request.
    pub async fn run(self) -> QueryOutcome {
        let span = info_span!("catalog.query", query_id = %self.id);
        let result = async {
            match &self.request {
                QueryRequest::Search { term, media_type } => {
                    self.service
                        .search_by_text(term, *media_type, 1, &self.cancel)
                        .await
                }
                QueryRequest::Popular { media_type } => {
                    self.service.popular(*media_type, 1, &self.cancel).await
                }
            }
        }
        .instrument(span)
        .await;
        QueryOutcome {
            id: self.id,
            cancel: self.cancel,
            result,
        }
    }
}

/// Result of a [`QueryTicket`], to be handed to [`CatalogController::apply`].
#[derive(Debug)]
pub struct QueryOutcome {
    id: Uuid,
    cancel: CancelToken,
    result: FetchResult<SearchResultPage>,
}

impl QueryOutcome {
    /// Id of the ticket that produced this outcome.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Raw request result.
    #[must_use]
    pub const fn result(&self) -> &FetchResult<SearchResultPage> {
        &self.result
    }
}

/// What [`CatalogController::apply`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The outcome updated the state.
    Accepted,
    /// The outcome was stale or cancelled and was dropped.
    Discarded,
}

#[derive(Debug)]
struct ActiveQuery {
    id: Uuid,
    cancel: CancelToken,
    phase_before: Phase,
}

/// Owns query parameters, results, favorites and paging for one session.
#[derive(Debug)]
pub struct CatalogController {
    service: CatalogService,
    favorites: FavoritesStore,
    params: QueryParameters,
    phase: Phase,
    items: Vec<MediaItem>,
    visible: Vec<MediaItem>,
    show_favorites: bool,
    pagination: Pagination,
    active: Option<ActiveQuery>,
    total_results: u64,
}

impl CatalogController {
    /// Idle controller with default parameters.
    #[must_use]
    pub fn new(service: CatalogService, favorites: FavoritesStore, page_size: PageSize) -> Self {
        Self {
            service,
            favorites,
            params: QueryParameters::default(),
            phase: Phase::Idle,
            items: Vec::new(),
            visible: Vec::new(),
            show_favorites: false,
            pagination: Pagination::new(page_size),
            active: None,
            total_results: 0,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Current query parameters.
    #[must_use]
    pub const fn params(&self) -> &QueryParameters {
        &self.params
    }

    /// Items currently listed: fetched results, narrowed to favorites while
    /// the favorites view is on.
    #[must_use]
    pub fn items(&self) -> &[MediaItem] {
        &self.visible
    }

    /// Result count the provider reported for the last accepted query.
    #[must_use]
    pub const fn total_results(&self) -> u64 {
        self.total_results
    }

    /// Favorites set.
    #[must_use]
    pub const fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    /// Whether `id` is a favorite.
    #[must_use]
    pub fn is_favorite(&self, id: u64) -> bool {
        self.favorites.contains(id)
    }

    /// Whether the favorites view is on.
    #[must_use]
    pub const fn showing_favorites(&self) -> bool {
        self.show_favorites
    }

    /// Whether a query is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.active.is_some()
    }

    /// Replace the search text and re-query. Blank text browses popular
    /// titles.
    pub fn set_search_text(&mut self, text: impl Into<String>) -> QueryTicket {
        let text = text.into();
        self.params.text = if text.trim().is_empty() { None } else { Some(text) };
        self.begin()
    }

    /// Switch media type and re-query.
    pub fn set_media_type(&mut self, media_type: MediaType) -> QueryTicket {
        self.params.media_type = media_type;
        self.begin()
    }

    /// Replace the genre selection and re-query.
    pub fn set_genres(&mut self, genre_ids: BTreeSet<u32>) -> QueryTicket {
        self.params.genre_ids = genre_ids;
        self.begin()
    }

    /// Re-run the current query.
    pub fn refresh(&mut self) -> QueryTicket {
        self.begin()
    }

    /// Re-sort the loaded list without touching the network.
    pub fn set_sort(&mut self, sort_key: SortKey) {
        self.params.sort_key = sort_key;
        pipeline::sort_items(&mut self.items, sort_key);
        self.rebuild_visible();
        self.pagination.reset();
    }

    /// Turn the favorites view on (local filter) or off (re-query).
    pub fn set_favorites_view(&mut self, enabled: bool) -> Option<QueryTicket> {
        if enabled == self.show_favorites {
            return None;
        }
        self.show_favorites = enabled;
        self.pagination.reset();
        if enabled {
            self.rebuild_visible();
            None
        } else {
            Some(self.begin())
        }
    }

    /// Flip `id` in the favorites set and persist it. Returns whether `id` is
    /// a favorite afterwards.
    pub fn toggle_favorite(&mut self, id: u64) -> bool {
        let now_favorite = self.favorites.toggle(id);
        info!(id, favorite = now_favorite, "favorite toggled");
        if self.show_favorites {
            self.rebuild_visible();
        }
        now_favorite
    }

    /// Abort the in-flight query and restore the phase it replaced.
    pub fn cancel_active(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        active.cancel.cancel();
        debug!(query_id = %active.id, "query cancelled");
        self.phase = active.phase_before;
        true
    }

    /// Merge a finished query into the state.
    pub fn apply(&mut self, outcome: QueryOutcome) -> Applied {
        let Some(active) = self.active.take_if(|active| active.id == outcome.id) else {
            debug!(query_id = %outcome.id, "discarding superseded query outcome");
            return Applied::Discarded;
        };
        if outcome.cancel.is_cancelled() || matches!(outcome.result, Err(FetchError::Cancelled)) {
            debug!(query_id = %outcome.id, "discarding cancelled query outcome");
            self.phase = active.phase_before;
            return Applied::Discarded;
        }

        match outcome.result {
            Ok(page) => {
                self.total_results = page.total_results;
                self.items = pipeline::prepare(page.items, &self.params.genre_ids, self.params.sort_key);
                self.phase = Phase::Loaded;
                info!(
                    query_id = %outcome.id,
                    fetched = self.items.len(),
                    total_results = self.total_results,
                    "query applied"
                );
            }
            Err(err) => {
                warn!(query_id = %outcome.id, error = %err, "query failed");
                self.items.clear();
                self.total_results = 0;
                self.phase = Phase::Failed {
                    message: err.user_message(),
                };
            }
        }
        self.rebuild_visible();
        self.pagination.reset();
        Applied::Accepted
    }

    /// Current page of [`Self::items`].
    #[must_use]
    pub fn page(&self) -> PaginationView<'_, MediaItem> {
        self.pagination.view(&self.visible)
    }

    /// Advance one page; no-op on the last page.
    pub fn next_page(&mut self) -> bool {
        self.pagination.next(self.visible.len())
    }

    /// Step back one page; no-op on the first page.
    pub fn previous_page(&mut self) -> bool {
        self.pagination.previous()
    }

    /// Jump to `page`, clamped to the available pages.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.pagination.go_to_page(page, self.visible.len())
    }

    /// Change the page size and return to page 1.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.pagination.set_page_size(page_size);
    }

    fn begin(&mut self) -> QueryTicket {
        let phase_before = match self.active.take() {
            Some(previous) => {
                previous.cancel.cancel();
                debug!(query_id = %previous.id, "query superseded");
                previous.phase_before
            }
            None => self.phase.clone(),
        };
        let id = Uuid::new_v4();
        let cancel = CancelToken::new();
        let media_type = self.params.media_type;
        let request = match self.params.search_term() {
            Some(term) => QueryRequest::Search {
                term: term.to_string(),
                media_type,
            },
            None => QueryRequest::Popular { media_type },
        };
        debug!(query_id = %id, ?request, "query started");
        self.phase = Phase::Loading;
        self.active = Some(ActiveQuery {
            id,
            cancel: cancel.clone(),
            phase_before,
        });
        QueryTicket {
            id,
            service: self.service.clone(),
            request,
            cancel,
        }
    }

    fn rebuild_visible(&mut self) {
        self.visible = if self.show_favorites {
            pipeline::filter_favorites(&self.items, self.favorites.ids())
        } else {
            self.items.clone()
        };
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use cinedex_config::ConfigLoader;
    use serde_json::{Value, json};
    use url::Url;

    use super::*;
    use crate::http::{RequestOptions, Transport, TransportError, TransportResponse};
    use crate::storage::MemoryStore;

    struct EchoTransport;

    #[async_trait]
    impl Transport for EchoTransport {
        async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
            let query = url
                .query_pairs()
                .find(|(key, _)| key == "query")
                .map(|(_, value)| value.into_owned());
            let body = match query.as_deref() {
                Some("broken") => {
                    return Ok(TransportResponse::json(
                        401,
                        &json!({"status_message": "Invalid API key"}),
                    ));
                }
                Some(term) => json!({"results": [movie(1, term, 3.0), movie(2, term, 9.0)]}),
                None => json!({"results": [movie(10, "popular", 1.0), movie(11, "popular", 2.0)]}),
            };
            Ok(TransportResponse::json(200, &body))
        }
    }

    fn movie(id: u64, title: &str, popularity: f64) -> Value {
        json!({"id": id, "title": title, "popularity": popularity, "genre_ids": [18]})
    }

    fn controller() -> CatalogController {
        let config = ConfigLoader::from_lookup(|_| None).load().unwrap();
        let service = CatalogService::new(Arc::new(EchoTransport), &config.api, RequestOptions::default());
        let favorites = FavoritesStore::load(Box::new(MemoryStore::new()), "favorites");
        CatalogController::new(service, favorites, PageSize::default())
    }

    fn ids(controller: &CatalogController) -> Vec<u64> {
        controller.items().iter().map(MediaItem::id).collect()
    }

    #[tokio::test]
    async fn empty_text_browses_popular_sorted() {
        let mut controller = controller();
        assert_eq!(controller.phase(), &Phase::Idle);
        let ticket = controller.refresh();
        assert_eq!(controller.phase(), &Phase::Loading);
        assert_eq!(controller.apply(ticket.run().await), Applied::Accepted);
        assert_eq!(controller.phase(), &Phase::Loaded);
        assert_eq!(ids(&controller), [11, 10]);
    }

    #[tokio::test]
    async fn superseded_outcome_is_discarded() {
        let mut controller = controller();
        let first = controller.set_search_text("first");
        let second = controller.set_search_text("second");
        assert!(first.cancel_token().is_cancelled());

        let second_outcome = second.run().await;
        let first_outcome = first.run().await;
        assert_eq!(controller.apply(second_outcome), Applied::Accepted);
        assert_eq!(controller.apply(first_outcome), Applied::Discarded);
        assert_eq!(controller.items()[0].title(), "second");
    }

    #[tokio::test]
    async fn cancel_restores_previous_phase() {
        let mut controller = controller();
        let ticket = controller.refresh();
        controller.apply(ticket.run().await);

        let ticket = controller.set_search_text("again");
        assert!(controller.cancel_active());
        assert_eq!(controller.phase(), &Phase::Loaded);
        assert_eq!(controller.apply(ticket.run().await), Applied::Discarded);
        assert!(!controller.cancel_active());
    }

    #[tokio::test]
    async fn failure_clears_list_with_user_message() {
        let mut controller = controller();
        let ticket = controller.refresh();
        controller.apply(ticket.run().await);
        let ticket = controller.set_search_text("broken");
        assert_eq!(controller.apply(ticket.run().await), Applied::Accepted);
        assert_eq!(
            controller.phase(),
            &Phase::Failed {
                message: "Invalid API key".into()
            }
        );
        assert!(controller.items().is_empty());
    }

    #[tokio::test]
    async fn sort_is_local_and_favorites_view_filters() {
        let mut controller = controller();
        let ticket = controller.refresh();
        controller.apply(ticket.run().await);

        controller.set_sort(SortKey::PopularityAsc);
        assert_eq!(ids(&controller), [10, 11]);
        assert!(!controller.is_loading());

        assert!(controller.toggle_favorite(11));
        assert!(controller.set_favorites_view(true).is_none());
        assert_eq!(ids(&controller), [11]);
        assert!(!controller.toggle_favorite(11));
        assert!(controller.items().is_empty());

        let ticket = controller.set_favorites_view(false).unwrap();
        controller.apply(ticket.run().await);
        assert_eq!(ids(&controller), [10, 11]);
    }
}
