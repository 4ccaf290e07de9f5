use typebundle_bundler::NodeTarget;

/// Validate a `--target` value, keeping the original spelling.
///
/// Valid: current, esnext, 18, 18.17, 18.17.1, v20, node18
/// Invalid: es2020, node, 18.x
///
/// # Errors
///
/// Returns an error message naming the accepted forms.
pub fn parse_target(s: &str) -> Result<String, String> {
    NodeTarget::parse(s).map(|_| s.to_string()).map_err(|_| {
        format!("Invalid Node.js target '{s}': expected a version like 18 or 20.11, 'current' or 'esnext'")
    })
}
