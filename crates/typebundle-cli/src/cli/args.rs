use clap::{Args, ValueEnum};
use std::path::PathBuf;

use crate::cli::validation::parse_target;

/// Declaration backend selectable from the command line.
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum DtsBackend {
    /// OXC isolated declarations (fast, requires explicit export types)
    #[value(name = "isolated")]
    Isolated,

    /// The TypeScript compiler from node_modules/.bin or PATH
    #[value(name = "tsc")]
    Tsc,
}

impl From<DtsBackend> for typebundle_bundler::DeclarationBackend {
    fn from(backend: DtsBackend) -> Self {
        match backend {
            DtsBackend::Isolated => Self::Isolated,
            DtsBackend::Tsc => Self::Tsc,
        }
    }
}

/// Build arguments.
///
/// Every field is optional so that unset flags do not override the
/// configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Entry file or glob pattern
    ///
    /// A glob (quote it to keep the shell from expanding it) builds every
    /// matching file as a separate entry.
    ///
    /// Examples:
    ///   typebundle src/index.ts
    ///   typebundle 'src/commands/*.ts'
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,

    /// Output directory for bundles [default: dist]
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Minify the output
    #[arg(short = 'c', long)]
    pub compress: bool,

    /// Also emit an ES module bundle (<name>.mjs)
    #[arg(long)]
    pub esm: bool,

    /// Node.js version to compile for: current, esnext, 18, 20.11, node18 [default: current]
    #[arg(short = 't', long, value_name = "VERSION", value_parser = parse_target)]
    pub target: Option<String>,

    /// Output directory for declarations [default: the output directory]
    #[arg(long, value_name = "DIR")]
    pub types: Option<PathBuf>,

    /// Rebuild when files change
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Skip declaration generation
    #[arg(long)]
    pub no_dts: bool,

    /// How declarations are generated [default: isolated]
    #[arg(long, value_enum, value_name = "BACKEND", conflicts_with = "no_dts")]
    pub dts_backend: Option<DtsBackend>,

    /// Path to a configuration file [default: typebundle.config.json]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Package root containing package.json [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}
