//! Syntax lowering for a Node.js target.
//!
//! Runs the OXC transformer over first-party TypeScript and JavaScript
//! modules so the bundle only uses syntax the target release understands.
//! Modules from `node_modules` are left to Rolldown untouched.

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, bail};
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use rolldown_common::ModuleType;
use rolldown_plugin::{
    HookTransformArgs, HookTransformOutput, HookTransformReturn, HookUsage, Plugin,
    SharedTransformPluginContext,
};

use crate::plugins::registry::{PhasedPlugin, PluginPhase};
use crate::{Error, Result};

const TRANSPILED_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Whether a module id should be lowered.
pub fn should_transpile(id: &str) -> bool {
    if id.starts_with('\0') || id.contains("/node_modules/") || id.contains("\\node_modules\\") {
        return false;
    }
    if id.ends_with(".d.ts") {
        return false;
    }
    Path::new(id)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TRANSPILED_EXTENSIONS.contains(&ext))
}

/// Parse, lower and print one module.
pub fn transpile(source: &str, path: &Path, options: &TransformOptions) -> anyhow::Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Unsupported source file: {}", path.display()))?;

    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        let messages: Vec<String> = parsed.errors.iter().map(|e| e.to_string()).collect();
        bail!("Failed to parse {}: {}", path.display(), messages.join(", "));
    }

    let mut program = parsed.program;
    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();

    let transformed =
        Transformer::new(&allocator, path, options).build_with_scoping(scoping, &mut program);
    if !transformed.errors.is_empty() {
        let messages: Vec<String> = transformed.errors.iter().map(|e| e.to_string()).collect();
        bail!("Failed to transform {}: {}", path.display(), messages.join(", "));
    }

    Ok(Codegen::new().build(&program).code)
}

/// Rolldown plugin lowering module syntax to a fixed OXC target.
#[derive(Debug, Clone)]
pub struct TranspilePlugin {
    target: String,
}

impl TranspilePlugin {
    /// Create the plugin for an OXC target string such as `node18.0.0`.
    pub fn new(target: impl Into<String>) -> Result<Self> {
        let target = target.into();
        TransformOptions::from_target(&target)
            .map_err(|e| Error::InvalidTarget(format!("{target}: {e}")))?;
        Ok(Self { target })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn options(&self) -> anyhow::Result<TransformOptions> {
        TransformOptions::from_target(&self.target).map_err(|e| anyhow::anyhow!("{e}"))
    }
}

impl Plugin for TranspilePlugin {
    fn name(&self) -> Cow<'static, str> {
        "typebundle:transpile".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let id = args.id.to_string();
        let code = args.code.to_string();
        let options = self.options();

        async move {
            if !should_transpile(&id) {
                return Ok(None);
            }

            let options = options?;
            let lowered = transpile(&code, Path::new(&id), &options)?;
            tracing::trace!(module = %id, "transpiled module");

            Ok(Some(HookTransformOutput {
                code: Some(lowered),
                map: None,
                side_effects: None,
                module_type: Some(ModuleType::Js),
            }))
        }
    }
}

impl PhasedPlugin for TranspilePlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Transform
    }
}
