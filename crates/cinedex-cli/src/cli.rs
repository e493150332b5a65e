//! Command-line front-end for browsing the TMDB catalog.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use cinedex_catalog::genres::resolve_genre;
use cinedex_catalog::{MediaType, PageSize, ReqwestTransport, SortKey};
use cinedex_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::io::BufReader;

use crate::client::{AppContext, CliError, CliResult, Lookup, load_config};
use crate::commands::catalog::{
    Feed, handle_config, handle_details, handle_discover, handle_feed, handle_genres,
    handle_search,
};
use crate::commands::explore::handle_explore;
use crate::commands::favorites::{handle_favorites_list, handle_favorites_toggle};

/// Parses CLI arguments, executes the requested command and reports errors.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: cli.global.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL),
        format: cli.global.log_format.unwrap_or_else(LogFormat::infer),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let mut stdout = io::stdout();
    let result = execute(cli, Arc::new(|name: &str| std::env::var(name).ok()), &mut stdout).await;
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

/// Resolve configuration and dispatch one parsed command.
pub(crate) async fn execute(cli: Cli, env: Lookup, out: &mut dyn Write) -> CliResult<()> {
    let config = load_config(&cli.global, env)?;
    let transport = ReqwestTransport::new()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
    let ctx = AppContext::new(config, Arc::new(transport), cli.global.output);

    match cli.command {
        Command::Search(args) => handle_search(&ctx, args, out).await,
        Command::Popular(args) => handle_feed(&ctx, Feed::Popular(args.media_type), args.feed, out).await,
        Command::NowPlaying(args) => handle_feed(&ctx, Feed::NowPlaying, args, out).await,
        Command::Upcoming(args) => handle_feed(&ctx, Feed::Upcoming, args, out).await,
        Command::Discover(args) => handle_discover(&ctx, args, out).await,
        Command::Details(args) => handle_details(&ctx, args, out).await,
        Command::Favorites(favorites) => match favorites {
            FavoritesCommand::List => handle_favorites_list(&ctx, out),
            FavoritesCommand::Toggle(args) => handle_favorites_toggle(&ctx, &args, out),
        },
        Command::Genres(args) => handle_genres(&ctx, &args, out),
        Command::Config => handle_config(&ctx, out),
        Command::Explore => {
            let input = BufReader::new(tokio::io::stdin());
            handle_explore(&ctx, input, out).await
        }
    }
}

#[derive(Parser)]
#[command(name = "cinedex", about = "Browse movies and series from The Movie Database")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Flags shared by every command; each overrides its `CINEDEX_*` variable.
#[derive(Args, Debug, Clone)]
pub(crate) struct GlobalArgs {
    #[arg(long, global = true, help = "Provider REST base URL")]
    pub(crate) api_url: Option<String>,
    #[arg(long, global = true, help = "Provider API key")]
    pub(crate) api_key: Option<String>,
    #[arg(long, global = true, help = "Response language, e.g. en-US")]
    pub(crate) language: Option<String>,
    #[arg(long, global = true, help = "Per-attempt request deadline in milliseconds")]
    pub(crate) timeout_ms: Option<u64>,
    #[arg(long, global = true, help = "Extra attempts after a deadline expiry")]
    pub(crate) retries: Option<u32>,
    #[arg(long, global = true, help = "JSON file holding favorites")]
    pub(crate) favorites_file: Option<PathBuf>,
    #[arg(long, global = true, help = "Items per page (6, 12, 24 or 48)")]
    pub(crate) page_size: Option<PageSize>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(long, global = true, help = "Log format: json, pretty or auto")]
    pub(crate) log_format: Option<LogFormat>,
    #[arg(long, global = true, help = "Log level filter when RUST_LOG is unset")]
    pub(crate) log_level: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Search titles by text.
    Search(SearchArgs),
    /// Popular titles.
    Popular(PopularArgs),
    /// Movies currently in theatres.
    NowPlaying(FeedArgs),
    /// Movies releasing soon.
    Upcoming(FeedArgs),
    /// Browse with server-side sort, genre and year filters.
    Discover(DiscoverArgs),
    /// Full record for one title.
    Details(DetailsArgs),
    /// Manage the local favorites list.
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// List known genres.
    Genres(GenresArgs),
    /// Show the effective configuration.
    Config,
    /// Interactive session reading commands from stdin.
    Explore,
}

#[derive(Subcommand)]
pub(crate) enum FavoritesCommand {
    /// Print favorite ids.
    List,
    /// Add or remove one id.
    Toggle(FavoriteToggleArgs),
}

/// Client-side shaping of a fetched page.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ViewArgs {
    #[arg(long, help = "Re-sort results, e.g. vote_average.desc")]
    pub(crate) sort: Option<SortKey>,
    #[arg(
        long = "genre",
        value_parser = parse_genre,
        help = "Keep titles in this genre (id or name); repeatable"
    )]
    pub(crate) genres: Vec<u32>,
    #[arg(long, default_value_t = 1, help = "Page of the filtered list to show")]
    pub(crate) view_page: usize,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct SearchArgs {
    #[arg(help = "Search text")]
    pub(crate) term: String,
    #[arg(long = "type", default_value = "movie", help = "movie or tv")]
    pub(crate) media_type: MediaType,
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=500),
        help = "Provider result page"
    )]
    pub(crate) page: u32,
    #[command(flatten)]
    pub(crate) view: ViewArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct FeedArgs {
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=500),
        help = "Provider result page"
    )]
    pub(crate) page: u32,
    #[command(flatten)]
    pub(crate) view: ViewArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct PopularArgs {
    #[arg(long = "type", default_value = "movie", help = "movie or tv")]
    pub(crate) media_type: MediaType,
    #[command(flatten)]
    pub(crate) feed: FeedArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct DiscoverArgs {
    #[arg(long = "type", default_value = "movie", help = "movie or tv")]
    pub(crate) media_type: MediaType,
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=500),
        help = "Provider result page"
    )]
    pub(crate) page: u32,
    #[arg(long, default_value_t = SortKey::PopularityDesc, help = "Provider sort order")]
    pub(crate) sort: SortKey,
    #[arg(
        long = "genre",
        value_parser = parse_genre,
        help = "Require this genre (id or name); repeatable"
    )]
    pub(crate) genres: Vec<u32>,
    #[arg(long, help = "Earliest release year")]
    pub(crate) year_from: Option<i32>,
    #[arg(long, help = "Latest release year")]
    pub(crate) year_to: Option<i32>,
    #[arg(long, default_value_t = 1, help = "Page of the results to show")]
    pub(crate) view_page: usize,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct DetailsArgs {
    #[arg(help = "Provider identifier")]
    pub(crate) id: u64,
    #[arg(long = "type", default_value = "movie", help = "movie or tv")]
    pub(crate) media_type: MediaType,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct GenresArgs {
    #[arg(long = "type", help = "Limit to movie or tv genres")]
    pub(crate) media_type: Option<MediaType>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct FavoriteToggleArgs {
    #[arg(help = "Provider identifier")]
    pub(crate) id: u64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub(crate) fn parse_genre(input: &str) -> Result<u32, String> {
    resolve_genre(input).ok_or_else(|| format!("unknown genre '{}'", input.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::{Value, json};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cinedex").chain(args.iter().copied())).unwrap()
    }

    fn no_env() -> Lookup {
        Arc::new(|_: &str| None)
    }

    async fn run_capture(args: &[&str]) -> (CliResult<()>, String) {
        let mut out = Vec::new();
        let result = execute(parse(args), no_env(), &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    fn movie(id: u64, title: &str, rating: f64, genres: &[u32]) -> Value {
        json!({
            "id": id,
            "title": title,
            "vote_average": rating,
            "release_date": "2021-09-15",
            "genre_ids": genres
        })
    }

    #[test]
    fn parses_search_with_view_options() {
        let cli = parse(&[
            "--page-size",
            "6",
            "search",
            "dune",
            "--type",
            "tv",
            "--genre",
            "Drama",
            "--genre",
            "10765",
            "--sort",
            "vote_average.desc",
        ]);
        assert_eq!(cli.global.page_size, PageSize::new(6));
        let Command::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.term, "dune");
        assert_eq!(args.media_type, MediaType::Series);
        assert_eq!(args.view.genres, vec![18, 10765]);
        assert_eq!(args.view.sort, Some(SortKey::VoteAverageDesc));
        assert_eq!(args.page, 1);
    }

    #[test]
    fn rejects_unknown_genres_and_page_sizes() {
        assert!(Cli::try_parse_from(["cinedex", "search", "x", "--genre", "cooking"]).is_err());
        assert!(Cli::try_parse_from(["cinedex", "--page-size", "10", "popular"]).is_err());
        assert!(Cli::try_parse_from(["cinedex", "popular", "--page", "0"]).is_err());
    }

    #[tokio::test]
    async fn search_renders_filtered_sorted_table() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/3/search/movie")
                .query_param("query", "dune")
                .query_param("api_key", "k");
            then.status(200).json_body(json!({
                "page": 1,
                "results": [
                    movie(1, "Dune", 7.8, &[878, 12]),
                    movie(2, "Dune Drifter", 4.1, &[878]),
                    movie(3, "Dune Documentary", 8.3, &[99]),
                ],
                "total_pages": 1,
                "total_results": 3
            }));
        });

        let api_url = server.url("/3");
        let (result, text) = run_capture(&[
            "--api-url",
            &api_url,
            "--api-key",
            "k",
            "search",
            "dune",
            "--genre",
            "science fiction",
            "--sort",
            "vote_average.asc",
        ])
        .await;
        result.unwrap();
        mock.assert();

        let rows: Vec<&str> = text.lines().filter(|line| line.contains("Dune")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("Dune Drifter"));
        assert!(!text.contains("Documentary"));
        assert!(text.contains("page 1 of 1"));
        assert!(text.contains("September 15, 2021"));
    }

    #[tokio::test]
    async fn details_json_output_is_tagged() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/3/movie/603");
            then.status(200).json_body(json!({
                "id": 603,
                "title": "The Matrix",
                "runtime": 136,
                "budget": 63000000,
                "genres": [{"id": 28, "name": "Action"}]
            }));
        });

        let api_url = server.url("/3");
        let (result, text) =
            run_capture(&["--api-url", &api_url, "--output", "json", "details", "603"]).await;
        result.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["media_type"], "movie");
        assert_eq!(value["title"], "The Matrix");
        assert_eq!(value["favorite"], false);
    }

    #[tokio::test]
    async fn provider_errors_exit_with_failure_code() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/3/tv/42");
            then.status(404).json_body(json!({
                "status_code": 34,
                "status_message": "The resource you requested could not be found."
            }));
        });

        let api_url = server.url("/3");
        let (result, _) = run_capture(&["--api-url", &api_url, "details", "42", "--type", "tv"]).await;
        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.display_message(), "The requested title could not be found.");
    }

    #[tokio::test]
    async fn view_page_past_the_end_shows_the_last_page() {
        let server = MockServer::start_async().await;
        let results: Vec<Value> = (1..=14)
            .map(|id| movie(id, &format!("Soon {id}"), 0.0, &[]))
            .collect();
        server.mock(|when, then| {
            when.method(GET).path("/3/movie/upcoming");
            then.status(200).json_body(json!({
                "page": 1,
                "results": results,
                "total_pages": 1,
                "total_results": 14
            }));
        });

        let api_url = server.url("/3");
        let (result, text) = run_capture(&[
            "--api-url",
            &api_url,
            "--page-size",
            "6",
            "upcoming",
            "--view-page",
            "9",
        ])
        .await;
        result.unwrap();
        assert!(text.contains("page 3 of 3 (items 13-14 of 14"));
        assert!(text.contains("Soon 14"));
        assert!(!text.contains("Soon 12"));
    }

    #[tokio::test]
    async fn favorites_toggle_persists_between_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("favorites.json");
        let file = file.to_str().unwrap();

        let (result, text) = run_capture(&["--favorites-file", file, "favorites", "toggle", "603"]).await;
        result.unwrap();
        assert!(text.contains("added 603"));

        let (result, text) =
            run_capture(&["--favorites-file", file, "--output", "json", "favorites", "list"]).await;
        result.unwrap();
        let ids: Vec<u64> = serde_json::from_str(&text).unwrap();
        assert_eq!(ids, vec![603]);

        let (result, text) = run_capture(&["--favorites-file", file, "favorites", "toggle", "603"]).await;
        result.unwrap();
        assert!(text.contains("removed 603"));
    }

    #[tokio::test]
    async fn config_output_never_includes_the_api_key() {
        let (result, text) = run_capture(&["--api-key", "secret-value", "--output", "json", "config"]).await;
        result.unwrap();
        assert!(!text.contains("secret-value"));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["api_key_configured"], true);
        assert_eq!(value["api"]["language"], "en-US");
    }
}
