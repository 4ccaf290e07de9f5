//! Plugin registry with execution phases.
//!
//! Rolldown runs hooks in registration order, so the registry sorts plugins by
//! phase before handing them over.

use crate::SharedPluginable;
use rolldown_plugin::Plugin;
use std::sync::Arc;

/// Plugin execution phases
///
/// Plugins are executed in phase order (lower numbers first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginPhase {
    /// Module resolution (externals)
    Resolve = 0,

    /// Source clean-up that must happen before parsing (hashbang removal)
    Prepare = 10,

    /// Syntax lowering
    Transform = 20,
}

/// A Rolldown plugin that knows which phase it belongs to.
pub trait PhasedPlugin: Plugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Transform
    }
}

/// Plugin registry that maintains plugins in phase order
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<(PluginPhase, String, SharedPluginable)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin; ordering is applied once in `into_rolldown_plugins()`.
    pub fn add<P: PhasedPlugin + 'static>(&mut self, plugin: P) {
        let phase = plugin.phase();
        let name = plugin.name().into_owned();
        let plugin: SharedPluginable = Arc::new(plugin);
        self.plugins.push((phase, name, plugin));
    }

    /// Convert to Rolldown plugins sorted by phase.
    ///
    /// The sort is stable, so plugins within a phase keep insertion order.
    pub fn into_rolldown_plugins(mut self) -> Vec<SharedPluginable> {
        self.plugins.sort_by_key(|(phase, _, _)| *phase);
        self.plugins.into_iter().map(|(_, _, plugin)| plugin).collect()
    }

    /// Plugin names in execution order.
    pub fn names(&self) -> Vec<String> {
        let mut ordered: Vec<_> = self.plugins.iter().collect();
        ordered.sort_by_key(|(phase, _, _)| *phase);
        ordered
            .into_iter()
            .map(|(_, name, _)| name.clone())
            .collect()
    }
}
