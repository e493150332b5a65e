use std::io::Write;

use crate::cli::FavoriteToggleArgs;
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_favorites, render_toggle};

pub(crate) fn handle_favorites_list(ctx: &AppContext, out: &mut dyn Write) -> CliResult<()> {
    let favorites = ctx.favorites();
    render_favorites(out, favorites.ids(), ctx.output)
}

pub(crate) fn handle_favorites_toggle(
    ctx: &AppContext,
    args: &FavoriteToggleArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    if args.id == 0 {
        return Err(CliError::validation("favorite id must be a positive integer"));
    }
    let mut favorites = ctx.favorites();
    let now_favorite = favorites.toggle(args.id);
    render_toggle(out, args.id, now_favorite, ctx.output)
}
