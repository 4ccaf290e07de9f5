use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format as _, Json, Serialized},
    value::{Dict, Map, Value},
};
use serde::Serialize;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use typebundle_bundler::DeclarationBackend;

use crate::cli::BuildArgs;
use crate::config::TypebundleConfig;
use crate::error::{ConfigError, Result};

/// Config file looked up in the package root when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "typebundle.config.json";

const ENV_PREFIX: &str = "TYPEBUNDLE_";

/// Keys whose environment values are taken verbatim, even when they look
/// like numbers (`TYPEBUNDLE_TARGET=18`, `TYPEBUNDLE_OUTPUT=2024`).
const STRING_KEYS: &[&str] = &["input", "output", "target", "types", "cwd"];

/// Flags the user actually passed. Unset fields are skipped so they never
/// override lower layers.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    esm: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    types: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    watch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dts_backend: Option<DeclarationBackend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<PathBuf>,
}

impl From<&BuildArgs> for CliOverrides {
    fn from(args: &BuildArgs) -> Self {
        Self {
            input: args.input.clone(),
            output: args.output.clone(),
            compress: args.compress.then_some(true),
            esm: args.esm.then_some(true),
            target: args.target.clone(),
            types: args.types.clone(),
            watch: args.watch.then_some(true),
            dts: args.no_dts.then_some(false),
            dts_backend: args.dts_backend.map(Into::into),
            cwd: args.cwd.clone(),
        }
    }
}

impl TypebundleConfig {
    /// Load configuration, looking for the config file relative to the
    /// process working directory.
    pub fn load(args: &BuildArgs) -> Result<Self> {
        let base = std::env::current_dir()?;
        Self::load_from(args, &base)
    }

    /// Load configuration with relative paths resolved against `base`.
    pub fn load_from(args: &BuildArgs, base: &Path) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = config_file(args, base)? {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(EnvOverrides(env_provider()));
        figment = figment.merge(Serialized::defaults(CliOverrides::from(args)));

        figment
            .extract()
            .map_err(|e| ConfigError::Extract(e.to_string()).into())
    }
}

/// Explicit `--config` must exist; the default file is optional.
fn config_file(args: &BuildArgs, base: &Path) -> Result<Option<PathBuf>> {
    if let Some(path) = &args.config {
        let path = if path.is_absolute() {
            path.clone()
        } else {
            base.join(path)
        };
        if !path.is_file() {
            return Err(ConfigError::NotFound(path).into());
        }
        return Ok(Some(path));
    }

    let root = match &args.cwd {
        Some(cwd) if cwd.is_absolute() => cwd.clone(),
        Some(cwd) => base.join(cwd),
        None => base.to_path_buf(),
    };
    let default_path = root.join(CONFIG_FILE_NAME);
    Ok(default_path.is_file().then_some(default_path))
}

/// `TYPEBUNDLE_OUTPUT`, `TYPEBUNDLE_DTS_BACKEND`, ... mapped onto config keys.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).lowercase(false).filter_map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        let mapped = match key.as_str() {
            "input" | "output" | "compress" | "esm" | "target" | "types" | "watch" | "dts"
            | "cwd" => key,
            "dts_backend" => "dtsBackend".to_string(),
            _ => return None,
        };
        Some(mapped.into())
    })
}

/// `TYPEBUNDLE_*` variables, with path and version keys kept as strings.
struct EnvOverrides(Env);

impl Provider for EnvOverrides {
    fn metadata(&self) -> Metadata {
        self.0.metadata()
    }

    fn data(&self) -> std::result::Result<Map<Profile, Dict>, figment::Error> {
        let mut dict = Dict::new();
        for (key, raw) in self.0.iter() {
            let value = if STRING_KEYS.contains(&key.as_str()) {
                Value::from(raw)
            } else {
                raw.parse::<Value>().unwrap_or_else(|never: Infallible| match never {})
            };
            dict.insert(key.as_str().to_string(), value);
        }
        Ok(Profile::Default.collect(dict))
    }
}
