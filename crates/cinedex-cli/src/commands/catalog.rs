use std::collections::BTreeSet;
use std::io::Write;

use cinedex_catalog::{
    CancelToken, DiscoverFilters, MediaItem, MediaType, Pagination, SearchResultPage, pipeline,
};
use tracing::instrument;

use crate::cli::{DetailsArgs, DiscoverArgs, FeedArgs, GenresArgs, SearchArgs, ViewArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{
    Listing, media_heading, render_config, render_details, render_genres, render_listing,
};

/// Fixed list endpoints.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Feed {
    Popular(MediaType),
    NowPlaying,
    Upcoming,
}

impl Feed {
    fn heading(self) -> String {
        match self {
            Self::Popular(media_type) => {
                format!("Popular {}", media_heading(media_type).to_lowercase())
            }
            Self::NowPlaying => "Now playing".to_string(),
            Self::Upcoming => "Upcoming".to_string(),
        }
    }
}

#[instrument(name = "cli.search", skip(ctx, args, out), fields(term = %args.term))]
pub(crate) async fn handle_search(
    ctx: &AppContext,
    args: SearchArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let page = ctx
        .service
        .search_by_text(&args.term, args.media_type, args.page, &CancelToken::new())
        .await
        .map_err(|err| CliError::fetch(&err))?;
    let heading = format!(
        "{} matching \"{}\"",
        media_heading(args.media_type),
        args.term.trim()
    );
    show_page(ctx, heading, page, &args.view, out)
}

#[instrument(name = "cli.feed", skip(ctx, args, out))]
pub(crate) async fn handle_feed(
    ctx: &AppContext,
    feed: Feed,
    args: FeedArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let token = CancelToken::new();
    let result = match feed {
        Feed::Popular(media_type) => ctx.service.popular(media_type, args.page, &token).await,
        Feed::NowPlaying => ctx.service.now_playing(args.page, &token).await,
        Feed::Upcoming => ctx.service.upcoming(args.page, &token).await,
    };
    let page = result.map_err(|err| CliError::fetch(&err))?;
    show_page(ctx, feed.heading(), page, &args.view, out)
}

#[instrument(name = "cli.discover", skip(ctx, args, out))]
pub(crate) async fn handle_discover(
    ctx: &AppContext,
    args: DiscoverArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    if let (Some(from), Some(to)) = (args.year_from, args.year_to)
        && from > to
    {
        return Err(CliError::validation(format!(
            "--year-from ({from}) must not be later than --year-to ({to})"
        )));
    }
    let filters = DiscoverFilters {
        sort_key: args.sort,
        genre_ids: args.genres,
        year_from: args.year_from,
        year_to: args.year_to,
    };
    let page = ctx
        .service
        .discover(args.media_type, args.page, &filters, &CancelToken::new())
        .await
        .map_err(|err| CliError::fetch(&err))?;
    let heading = format!(
        "Discover {} by {}",
        media_heading(args.media_type).to_lowercase(),
        filters.sort_key
    );
    show_items(ctx, heading, &page.items, page.total_results, args.view_page, out)
}

#[instrument(name = "cli.details", skip(ctx, out))]
pub(crate) async fn handle_details(
    ctx: &AppContext,
    args: DetailsArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    if args.id == 0 {
        return Err(CliError::validation("id must be a positive integer"));
    }
    let details = ctx
        .service
        .details(args.media_type, args.id, &CancelToken::new())
        .await
        .map_err(|err| CliError::fetch(&err))?;
    let favorite = ctx.favorites().contains(details.id());
    render_details(
        out,
        &details,
        favorite,
        &ctx.config.api.image_base_url,
        ctx.output,
    )
}

pub(crate) fn handle_genres(
    ctx: &AppContext,
    args: &GenresArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    render_genres(out, args.media_type, ctx.output)
}

pub(crate) fn handle_config(ctx: &AppContext, out: &mut dyn Write) -> CliResult<()> {
    render_config(out, &ctx.config, ctx.output)
}

/// Apply the client-side genre filter and sort, then render one page.
fn show_page(
    ctx: &AppContext,
    heading: String,
    page: SearchResultPage,
    view: &ViewArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let selected: BTreeSet<u32> = view.genres.iter().copied().collect();
    let mut items = pipeline::filter_by_genres(page.items, &selected);
    if let Some(sort_key) = view.sort {
        pipeline::sort_items(&mut items, sort_key);
    }
    show_items(ctx, heading, &items, page.total_results, view.view_page, out)
}

fn show_items(
    ctx: &AppContext,
    heading: String,
    items: &[MediaItem],
    total_results: u64,
    view_page: usize,
    out: &mut dyn Write,
) -> CliResult<()> {
    let mut pagination = Pagination::new(ctx.page_size());
    pagination.go_to_page(view_page, items.len());
    let favorites = ctx.favorites();
    let listing = Listing {
        heading,
        view: pagination.view(items),
        favorites: favorites.ids(),
        total_results,
    };
    render_listing(out, &listing, ctx.output)
}
