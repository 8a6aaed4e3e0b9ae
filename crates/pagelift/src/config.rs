//! Configuration loading and resolution.

use std::path::PathBuf;
use tracing::warn;

/// Environment variable overriding [`RecognizerConfig::max_depth`].
pub const ENV_MAX_DEPTH: &str = "PAGELIFT_MAX_DEPTH";
/// Environment variable overriding [`RecognizerConfig::max_nodes`].
pub const ENV_MAX_NODES: &str = "PAGELIFT_MAX_NODES";
/// Environment variable naming an extra pattern catalogue file.
pub const ENV_PATTERNS: &str = "PAGELIFT_PATTERNS";

/// Limits and tunables for a recognition pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerConfig {
    /// Deepest DOM level (root = 0) the engine descends to.
    pub max_depth: usize,
    /// Most nodes read in one pass.
    pub max_nodes: usize,
    /// How close (px) a footer's bottom edge must sit to the document end
    /// for the positional footer heuristic.
    pub footer_proximity_px: f64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_nodes: 20_000,
            footer_proximity_px: 200.0,
        }
    }
}

impl RecognizerConfig {
    /// Defaults overridden by `PAGELIFT_MAX_DEPTH` / `PAGELIFT_MAX_NODES`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(depth) = read_limit(ENV_MAX_DEPTH) {
            config.max_depth = depth;
        }
        if let Some(nodes) = read_limit(ENV_MAX_NODES) {
            config.max_nodes = nodes;
        }
        config
    }
}

fn read_limit(var: &str) -> Option<usize> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            warn!("ignoring {var}={raw:?}: expected a positive integer");
            None
        }
    }
}

/// Envelope settings for exported Elementor documents.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub title: String,
    /// Elementor template format version.
    pub version: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: "Imported page".to_string(),
            version: "0.4".to_string(),
        }
    }
}

/// Resolve the extra pattern catalogue path.
///
/// Explicit path, then `PAGELIFT_PATTERNS`, then `.pagelift/patterns.json`
/// in the working directory. `None` means built-in patterns only.
pub fn resolve_patterns_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var(ENV_PATTERNS) {
        if !env_path.trim().is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let cwd_patterns = PathBuf::from(".pagelift/patterns.json");
    if cwd_patterns.exists() {
        return Some(cwd_patterns);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RecognizerConfig::default();
        assert_eq!(config.max_depth, 128);
        assert_eq!(config.max_nodes, 20_000);
        assert_eq!(config.footer_proximity_px, 200.0);
        assert_eq!(ExportConfig::default().version, "0.4");
    }

    #[test]
    fn test_explicit_patterns_path_wins() {
        assert_eq!(
            resolve_patterns_path(Some("custom.json")),
            Some(PathBuf::from("custom.json"))
        );
    }
}
