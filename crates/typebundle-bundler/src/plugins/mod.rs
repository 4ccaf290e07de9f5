//! Plugin system for typebundle-bundler.
//!
//! Every build uses the same three plugins, ordered by [`PluginPhase`]:
//! externals, then hashbang removal, then syntax lowering.

pub mod externals;
pub mod hashbang;
pub mod registry;
pub mod transpile;

pub use externals::{ExternalPlugin, ExternalPolicy, Resolution};
pub use hashbang::{BannerSlot, HashbangPlugin};
pub use registry::{PhasedPlugin, PluginPhase, PluginRegistry};
pub use transpile::TranspilePlugin;
