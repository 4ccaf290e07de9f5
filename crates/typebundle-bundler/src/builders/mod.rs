//! Build planning and execution.

pub mod executor;
pub mod plan;

pub use executor::{BuildReport, EntryBuild, EntryReport, build_entry, run, run_each};
pub use plan::{BuildPlan, BundlerConfig, EntryPlan, ModuleFormat, OutputTarget};
