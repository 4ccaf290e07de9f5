//! typebundle - bundle a TypeScript package for Node.js.
//!
//! Parses arguments, initialises logging and dispatches to the one-shot build
//! or the watch loop.

use clap::Parser;
use miette::Result;
use typebundle_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);
    ui::init_quiet(args.quiet);

    commands::execute(args.build)
        .await
        .map_err(error::cli_error_to_miette)
}
