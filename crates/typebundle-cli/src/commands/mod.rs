//! Command implementations.
//!
//! - [`build`] - one-shot build of every entry
//! - [`watch`] - initial build, then rebuild on change
//!
//! [`execute`] loads the configuration and picks one of them.

pub mod build;
pub(crate) mod utils;
pub mod watch;

use crate::cli::BuildArgs;
use crate::config::TypebundleConfig;
use crate::error::Result;

/// Run typebundle with parsed command-line arguments.
///
/// Configuration is merged from defaults, the config file, `TYPEBUNDLE_*`
/// variables and `args`, in increasing priority.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let config = TypebundleConfig::load(&args)?;
    config.validate()?;

    let cwd = utils::get_cwd(&config)?;
    utils::validate_output_dirs(&config, &cwd)?;

    if config.watch {
        watch::execute(&config, &cwd).await
    } else {
        build::execute(&config, &cwd).await.map(|_| ())
    }
}
