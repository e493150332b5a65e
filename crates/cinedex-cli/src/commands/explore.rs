//! Interactive browsing session over line-oriented input.
//!
//! # Design
//! - A reader task parses lines. Search text goes to the [`Debouncer`];
//!   everything else goes to a command channel.
//! - The session loop owns the [`CatalogController`] and never blocks on the
//!   network: tickets run in a [`JoinSet`] and their outcomes are applied as
//!   they finish, so a superseded query can never overwrite newer results.
//! - The session ends on `:quit`, or once input is exhausted and nothing is
//!   pending.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::anyhow;
use cinedex_catalog::genres::resolve_genre;
use cinedex_catalog::{
    Applied, CatalogController, Debouncer, MediaType, PageSize, Phase, QueryOutcome, QueryTicket,
    SearchInput, SortKey,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::client::{AppContext, CliError, CliResult};
use crate::output::{Listing, genre_labels, listing_table, media_heading, write_text};

const COMMAND_BUFFER: usize = 32;

const HELP: &str = "\
Type to search (results follow after a short pause). Commands:
  :go <text>       search immediately
  :type movie|tv   switch media type
  :sort <key>      re-sort, e.g. vote_average.desc
  :genre [a,b]     filter by genre ids or names; empty clears
  :fav <id>        toggle a favorite
  :favs            toggle the favorites view
  :next / :prev    change page
  :page <n>        jump to a page
  :size <n>        page size (6, 12, 24 or 48)
  :retry           re-run the current query
  :cancel          abort the running query
  :help            show this text
  :quit            leave
";

/// A parsed non-search input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionCommand {
    MediaType(MediaType),
    Sort(SortKey),
    Genres(BTreeSet<u32>),
    Favorite(u64),
    FavoritesView,
    Next,
    Previous,
    Page(usize),
    PageSize(PageSize),
    Retry,
    Cancel,
    Help,
    Quit,
}

/// Classification of one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputLine {
    Search(SearchInput),
    Command(SessionCommand),
}

type CommandResult = Result<SessionCommand, String>;

/// What the session loop does after a command.
enum Reaction {
    Query(QueryTicket),
    Render,
    Print(String),
    Quit,
}

pub(crate) fn parse_line(line: &str) -> Result<InputLine, String> {
    let Some(command) = line.trim_start().strip_prefix(':') else {
        return Ok(InputLine::Search(SearchInput::Typed(line.to_string())));
    };
    let (name, argument) = command
        .trim()
        .split_once(char::is_whitespace)
        .map_or((command.trim(), ""), |(name, rest)| (name, rest.trim()));

    let parsed = match name {
        "go" => return Ok(InputLine::Search(SearchInput::Submitted(argument.to_string()))),
        "type" => SessionCommand::MediaType(argument.parse()?),
        "sort" => SessionCommand::Sort(argument.parse()?),
        "genre" | "genres" => SessionCommand::Genres(parse_genres(argument)?),
        "fav" => SessionCommand::Favorite(parse_positive(argument, "favorite id")?),
        "favs" | "favorites" => SessionCommand::FavoritesView,
        "next" | "n" => SessionCommand::Next,
        "prev" | "p" => SessionCommand::Previous,
        "page" => {
            let page = parse_positive(argument, "page")?;
            SessionCommand::Page(usize::try_from(page).map_err(|err| err.to_string())?)
        }
        "size" => SessionCommand::PageSize(argument.parse()?),
        "retry" => SessionCommand::Retry,
        "cancel" => SessionCommand::Cancel,
        "help" | "h" => SessionCommand::Help,
        "quit" | "q" | "exit" => SessionCommand::Quit,
        other => return Err(format!("unknown command ':{other}' (try :help)")),
    };
    Ok(InputLine::Command(parsed))
}

fn parse_genres(argument: &str) -> Result<BTreeSet<u32>, String> {
    argument
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| resolve_genre(part).ok_or_else(|| format!("unknown genre '{part}'")))
        .collect()
}

fn parse_positive(argument: &str, what: &str) -> Result<u64, String> {
    match argument.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(format!("{what} must be a positive integer")),
    }
}

async fn read_input<R>(
    input: R,
    search: mpsc::Sender<SearchInput>,
    commands: mpsc::Sender<CommandResult>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read session input");
                break;
            }
        };
        let delivered = match parse_line(&line) {
            Ok(InputLine::Search(text)) => search.send(text).await.is_ok(),
            Ok(InputLine::Command(command)) => commands.send(Ok(command)).await.is_ok(),
            Err(message) => commands.send(Err(message)).await.is_ok(),
        };
        if !delivered {
            break;
        }
    }
    debug!("session input closed");
}

fn react(controller: &mut CatalogController, command: SessionCommand) -> Reaction {
    match command {
        SessionCommand::MediaType(media_type) => {
            Reaction::Query(controller.set_media_type(media_type))
        }
        SessionCommand::Sort(sort_key) => {
            controller.set_sort(sort_key);
            Reaction::Render
        }
        SessionCommand::Genres(genre_ids) => Reaction::Query(controller.set_genres(genre_ids)),
        SessionCommand::Favorite(id) => {
            let now_favorite = controller.toggle_favorite(id);
            let verb = if now_favorite { "added" } else { "removed" };
            Reaction::Print(format!("{verb} {id} (favorites: {})\n", controller.favorites().len()))
        }
        SessionCommand::FavoritesView => {
            match controller.set_favorites_view(!controller.showing_favorites()) {
                Some(ticket) => Reaction::Query(ticket),
                None => Reaction::Render,
            }
        }
        SessionCommand::Next => {
            if controller.next_page() {
                Reaction::Render
            } else {
                Reaction::Print("already on the last page\n".to_string())
            }
        }
        SessionCommand::Previous => {
            if controller.previous_page() {
                Reaction::Render
            } else {
                Reaction::Print("already on the first page\n".to_string())
            }
        }
        SessionCommand::Page(page) => {
            if controller.go_to_page(page) {
                Reaction::Render
            } else {
                Reaction::Print(format!(
                    "already on page {}\n",
                    controller.page().current_page
                ))
            }
        }
        SessionCommand::PageSize(page_size) => {
            controller.set_page_size(page_size);
            Reaction::Render
        }
        SessionCommand::Retry => Reaction::Query(controller.refresh()),
        SessionCommand::Cancel => {
            let message = if controller.cancel_active() {
                "query cancelled\n"
            } else {
                "nothing to cancel\n"
            };
            Reaction::Print(message.to_string())
        }
        SessionCommand::Help => Reaction::Print(HELP.to_string()),
        SessionCommand::Quit => Reaction::Quit,
    }
}

fn session_heading(controller: &CatalogController) -> String {
    let params = controller.params();
    let mut heading = match params.search_term() {
        Some(term) => format!("{} matching \"{term}\"", media_heading(params.media_type)),
        None => format!(
            "Popular {}",
            media_heading(params.media_type).to_lowercase()
        ),
    };
    if !params.genre_ids.is_empty() {
        heading.push_str(&format!(" | genres: {}", genre_labels(&params.genre_ids)));
    }
    heading.push_str(&format!(" | sorted by {}", params.sort_key));
    if controller.showing_favorites() {
        heading.push_str(" | favorites only");
    }
    heading
}

fn render_state(controller: &CatalogController, out: &mut dyn Write) -> CliResult<()> {
    let text = match controller.phase() {
        Phase::Idle => return Ok(()),
        Phase::Loading => "loading...\n".to_string(),
        Phase::Failed { message } => format!("error: {message} (:retry to try again)\n"),
        Phase::Loaded if controller.showing_favorites() && controller.items().is_empty() => {
            format!(
                "{}\nNo favorites among the loaded titles.\n",
                session_heading(controller)
            )
        }
        Phase::Loaded => listing_table(&Listing {
            heading: session_heading(controller),
            view: controller.page(),
            favorites: controller.favorites().ids(),
            total_results: controller.total_results(),
        }),
    };
    write_text(out, &text)
}

fn dispatch(
    in_flight: &mut JoinSet<QueryOutcome>,
    ticket: QueryTicket,
    out: &mut dyn Write,
) -> CliResult<()> {
    debug!(query_id = %ticket.id(), "query dispatched");
    in_flight.spawn(ticket.run());
    write_text(out, "loading...\n")
}

/// Run an interactive session until `:quit` or end of input.
pub(crate) async fn handle_explore<R>(
    ctx: &AppContext,
    input: R,
    out: &mut dyn Write,
) -> CliResult<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let mut controller = CatalogController::new(ctx.service.clone(), ctx.favorites(), ctx.page_size());
    let (search_tx, mut debouncer) = Debouncer::channel(ctx.config.browse.debounce());
    let (command_tx, mut commands) = mpsc::channel(COMMAND_BUFFER);
    let reader = tokio::spawn(read_input(input, search_tx, command_tx));
    let mut in_flight = JoinSet::new();
    let mut search_open = true;
    let mut commands_open = true;

    write_text(out, "Type :help for commands.\n")?;
    dispatch(&mut in_flight, controller.refresh(), out)?;

    loop {
        tokio::select! {
            biased;
            Some(joined) = in_flight.join_next() => {
                let outcome = joined
                    .map_err(|err| CliError::failure(anyhow!("query task failed: {err}")))?;
                if controller.apply(outcome) == Applied::Accepted {
                    render_state(&controller, out)?;
                }
            }
            settled = debouncer.next(), if search_open => match settled {
                Some(text) => dispatch(&mut in_flight, controller.set_search_text(text), out)?,
                None => search_open = false,
            },
            command = commands.recv(), if commands_open => match command {
                None => commands_open = false,
                Some(Err(message)) => write_text(out, &format!("error: {message}\n"))?,
                Some(Ok(command)) => match react(&mut controller, command) {
                    Reaction::Query(ticket) => dispatch(&mut in_flight, ticket, out)?,
                    Reaction::Render => render_state(&controller, out)?,
                    Reaction::Print(text) => write_text(out, &text)?,
                    Reaction::Quit => break,
                },
            },
            else => break,
        }
    }

    controller.cancel_active();
    in_flight.abort_all();
    reader.abort();
    Ok(())
}
