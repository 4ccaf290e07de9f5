//! Node.js target handling.
//!
//! - `NodeTarget`: which Node.js release the emitted syntax must run on
//! - `is_node_builtin`: built-in modules that are always left external

use std::fmt;
use std::process::Command;
use std::str::FromStr;

use crate::{Error, Result};

/// Node.js release the output is lowered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeTarget {
    /// Whatever `node --version` reports at build time
    #[default]
    Current,
    /// No syntax lowering
    EsNext,
    /// A specific release
    Version { major: u32, minor: u32, patch: u32 },
}

impl NodeTarget {
    /// Parse a target string.
    ///
    /// Accepts `current`, `esnext`, `18`, `18.17`, `18.17.1`, `v18`, `node18`
    /// and `node18.17.0`. Values are case-insensitive.
    ///
    /// ```
    /// use typebundle_bundler::NodeTarget;
    ///
    /// assert_eq!(
    ///     NodeTarget::parse("node18").unwrap(),
    ///     NodeTarget::Version { major: 18, minor: 0, patch: 0 }
    /// );
    /// assert_eq!(NodeTarget::parse("esnext").unwrap(), NodeTarget::EsNext);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "current" => return Ok(Self::Current),
            "esnext" => return Ok(Self::EsNext),
            _ => {}
        }

        let version = lower.strip_prefix("node").unwrap_or(&lower);
        let version = version.strip_prefix('v').unwrap_or(version);
        parse_version(version).ok_or_else(|| Error::InvalidTarget(s.to_string()))
    }

    /// Replace `Current` with the version of the installed `node` binary.
    ///
    /// Falls back to `EsNext` when no `node` binary can be queried.
    pub fn resolve(self) -> Self {
        match self {
            Self::Current => match detect_installed_node() {
                Some(version) => {
                    tracing::debug!(node = %version, "resolved current Node.js version");
                    version
                }
                None => {
                    tracing::warn!("could not run `node --version`; emitting esnext syntax");
                    Self::EsNext
                }
            },
            other => other,
        }
    }

    /// Target string understood by the OXC transformer, `None` for no lowering.
    pub fn oxc_target(&self) -> Option<String> {
        match self {
            Self::Version {
                major,
                minor,
                patch,
            } => Some(format!("node{major}.{minor}.{patch}")),
            Self::EsNext | Self::Current => None,
        }
    }
}

impl FromStr for NodeTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for NodeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::EsNext => write!(f, "esnext"),
            Self::Version {
                major,
                minor,
                patch,
            } => write!(f, "node{major}.{minor}.{patch}"),
        }
    }
}

fn parse_version(s: &str) -> Option<NodeTarget> {
    let mut parts = s.split('.');
    let major = parts.next()?.parse::<u32>().ok()?;
    let minor = parts.next().map(str::parse::<u32>).transpose().ok()?.unwrap_or(0);
    let patch = parts.next().map(str::parse::<u32>).transpose().ok()?.unwrap_or(0);
    if parts.next().is_some() {
        return None;
    }
    Some(NodeTarget::Version {
        major,
        minor,
        patch,
    })
}

fn detect_installed_node() -> Option<NodeTarget> {
    let output = Command::new("node").arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8(output.stdout).ok()?;
    parse_version(stdout.trim().trim_start_matches('v'))
}

/// Node.js built-in modules, including the subpath modules Node ships.
static NODE_BUILTINS: phf::Set<&'static str> = phf::phf_set! {
    "assert", "assert/strict", "async_hooks", "buffer", "child_process", "cluster",
    "console", "constants", "crypto", "dgram", "diagnostics_channel", "dns",
    "dns/promises", "domain", "events", "fs", "fs/promises", "http", "http2", "https",
    "inspector", "inspector/promises", "module", "net", "os", "path", "path/posix",
    "path/win32", "perf_hooks", "process", "punycode", "querystring", "readline",
    "readline/promises", "repl", "stream", "stream/consumers", "stream/promises",
    "stream/web", "string_decoder", "sys", "timers", "timers/promises", "tls",
    "trace_events", "tty", "url", "util", "util/types", "v8", "vm", "wasi",
    "worker_threads", "zlib",
};

/// Whether `specifier` names a Node.js built-in module.
///
/// Every `node:`-prefixed specifier counts, as does any subpath of a
/// built-in (`fs/promises`, `util/types`).
pub fn is_node_builtin(specifier: &str) -> bool {
    if specifier.starts_with("node:") {
        return true;
    }
    if NODE_BUILTINS.contains(specifier) {
        return true;
    }
    specifier
        .split_once('/')
        .is_some_and(|(head, _)| NODE_BUILTINS.contains(head))
}
