//! Pipeline configuration: parsed from YAML/JSON/TOML into [`PipelineConfig`].
//!
//! Every section has defaults, so an empty document (or no file at all)
//! yields a usable configuration. CLI flags are applied on top by the binary.

use std::path::Path;

use serde::{Deserialize, Serialize};
use snipcat_sandbox_js::JsSandboxConfig;

use crate::error::CatalogueError;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (`.yaml` / `.yml`).
    Yaml,
    /// JSON format (`.json`).
    Json,
    /// TOML format (`.toml`).
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, CatalogueError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(CatalogueError::ConfigParse(format!(
                "unsupported config file extension: {}",
                path.display()
            ))),
        }
    }
}

/// Top-level configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extract: ExtractConfig,
    pub validate: ValidateConfig,
    pub sandbox: SandboxSection,
    pub policy: PolicyConfig,
}

/// How section headings are recognized in the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Line comment marker
    pub comment_prefix: String,
    /// One pattern per heading depth, outermost first. Matched against the
    /// comment text with the prefix and surrounding whitespace removed.
    pub heading_patterns: Vec<String>,
    /// Decorative comment lines (`// ======`) that are ignored
    pub rule_pattern: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            comment_prefix: "//".to_string(),
            heading_patterns: vec![
                // All-caps titles: "VARIABLES & DATA TYPES", "ES6+ FEATURES"
                r"^[^a-z]*[A-Z][^a-z]*$".to_string(),
                r"^\S.*$".to_string(),
            ],
            rule_pattern: r"^[=\-*#~_]{3,}$".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
    /// Accept import/export snippets by re-parsing them with the module goal
    pub allow_module_syntax: bool,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            allow_module_syntax: true,
        }
    }
}

/// Execution settings. Engine limits and stub bindings are flattened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSection {
    /// Per-snippet wall-clock timeout
    pub timeout_ms: u64,
    /// Sections executed concurrently
    pub max_workers: usize,
    #[serde(flatten)]
    pub engine: JsSandboxConfig,
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            max_workers: 4,
            engine: JsSandboxConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Snippets whose runtime error is intentional. Each entry is a label,
    /// a `section/.../label` path, or a section path prefix.
    pub expected_failures: Vec<String>,
}

/// Parse configuration content.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<PipelineConfig, CatalogueError> {
    match format {
        ConfigFormat::Yaml => {
            if content.trim().is_empty() {
                return Ok(PipelineConfig::default());
            }
            serde_saphyr::from_str(content).map_err(|e| CatalogueError::ConfigParse(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| CatalogueError::ConfigParse(e.to_string()))
        }
        ConfigFormat::Toml => {
            // TOML → serde_json::Value first so JSON-valued fields
            // (binding bodies, global values) deserialize uniformly.
            let toml_val: toml::Value =
                toml::from_str(content).map_err(|e| CatalogueError::ConfigParse(e.to_string()))?;
            serde_json::from_value(toml_value_to_json(toml_val))
                .map_err(|e| CatalogueError::ConfigParse(e.to_string()))
        }
    }
}

/// Read and parse a configuration file, choosing the format by extension.
pub fn load_config(path: &Path) -> Result<PipelineConfig, CatalogueError> {
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, format)
}

fn toml_value_to_json(val: toml::Value) -> serde_json::Value {
    match val {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_value_to_json).collect())
        }
        toml::Value::Table(tbl) => serde_json::Value::Object(
            tbl.into_iter()
                .map(|(k, v)| (k, toml_value_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
    }
}
