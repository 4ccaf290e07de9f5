//! Hashbang handling.
//!
//! A `#!` line is not valid input for the transpiler, so it is cut from every
//! module before transformation. The entry module's line is kept and written
//! back as the first line of each output file.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use path_clean::PathClean;
use rolldown_plugin::{
    HookTransformArgs, HookTransformOutput, HookTransformReturn, HookUsage, Plugin,
    SharedTransformPluginContext,
};

use crate::plugins::registry::{PhasedPlugin, PluginPhase};

/// Shared slot the entry's hashbang line is stored in.
pub type BannerSlot = Arc<Mutex<Option<String>>>;

/// Split a leading `#!` line from `code`.
///
/// Returns the hashbang line (without newline) and the remaining source. The
/// line break is kept in the remainder so line numbers do not shift.
pub fn split_hashbang(code: &str) -> Option<(&str, &str)> {
    if !code.starts_with("#!") {
        return None;
    }
    match code.find('\n') {
        Some(pos) => Some((code[..pos].trim_end_matches('\r'), &code[pos..])),
        None => Some((code, "")),
    }
}

/// Prepend `banner` to `code` as its own line.
pub fn apply_banner(banner: Option<&str>, code: String) -> String {
    match banner {
        Some(line) => format!("{line}\n{code}"),
        None => code,
    }
}

/// Rolldown plugin stripping hashbangs and capturing the entry's one.
#[derive(Debug, Clone)]
pub struct HashbangPlugin {
    entry: PathBuf,
    banner: BannerSlot,
}

impl HashbangPlugin {
    pub fn new(entry: impl AsRef<Path>) -> Self {
        Self {
            entry: entry.as_ref().clean(),
            banner: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle to the captured banner, readable after the build finishes.
    pub fn banner(&self) -> BannerSlot {
        Arc::clone(&self.banner)
    }

    fn process(&self, id: &str, code: &str) -> Option<String> {
        let (line, rest) = split_hashbang(code)?;
        if Path::new(id).clean() == self.entry {
            *self.banner.lock() = Some(line.to_string());
        }
        Some(rest.to_string())
    }
}

impl Plugin for HashbangPlugin {
    fn name(&self) -> Cow<'static, str> {
        "typebundle:hashbang".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let stripped = self.process(args.id, args.code);

        async move {
            Ok(stripped.map(|code| HookTransformOutput {
                code: Some(code),
                map: None,
                side_effects: None,
                module_type: None,
            }))
        }
    }
}

impl PhasedPlugin for HashbangPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Prepare
    }
}
