//! Command-line interface definition.
//!
//! `typebundle` has no subcommands: a single positional input plus flags.
//! Flags left unset fall through to the configuration file, environment
//! variables and defaults (see [`crate::config`]).

mod args;
mod validation;

use clap::Parser;

pub use args::{BuildArgs, DtsBackend};
pub use validation::parse_target;

/// Bundle a TypeScript package for Node.js
#[derive(Parser, Debug)]
#[command(
    name = "typebundle",
    version,
    about = "Bundle a TypeScript package for Node.js",
    long_about = "typebundle compiles a TypeScript or JavaScript package into CommonJS\n\
                  (and optionally ESM) bundles for Node.js. Dependencies and Node.js\n\
                  built-ins stay external, and .d.ts declarations are written alongside."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(flatten)]
    pub build: BuildArgs,
}
