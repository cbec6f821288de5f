//! Application configuration for StylePress.
//!
//! User config lives at `~/.stylepress/stylepress.toml`.
//! Caller-supplied values override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StylePressError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "stylepress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".stylepress";

// ---------------------------------------------------------------------------
// Config structs (matching stylepress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Vision refinement loop settings.
    #[serde(default)]
    pub refinement: RefinementConfig,

    /// Generative/scoring collaborator settings.
    #[serde(default)]
    pub collaborator: CollaboratorConfig,

    /// Role classification keyword tables.
    #[serde(default)]
    pub keywords: RoleKeywords,
}

/// `[refinement]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementConfig {
    /// Overall score (0–100) at or above which the loop converges.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Maximum number of refinement iterations (refiner calls).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Stylesheet truncation bound for refinement requests, in characters.
    #[serde(default = "default_max_stylesheet_chars")]
    pub max_stylesheet_chars: usize,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            max_iterations: default_max_iterations(),
            max_stylesheet_chars: default_max_stylesheet_chars(),
        }
    }
}

fn default_score_threshold() -> f64 {
    90.0
}
fn default_max_iterations() -> u32 {
    3
}
fn default_max_stylesheet_chars() -> usize {
    24_000
}

/// `[collaborator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    /// Vision-capable generative endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model ID for generative refinement and scoring.
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".into()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_timeout_secs() -> u64 {
    60
}

// ---------------------------------------------------------------------------
// Role classification keyword tables
// ---------------------------------------------------------------------------

/// `[keywords]` section — the term sets the blueprint architect matches
/// headings and content against, in classification priority order.
///
/// Kept as config data rather than hard-coded so the vocabulary can be
/// swapped per language without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleKeywords {
    #[serde(default = "default_introduction_terms")]
    pub introduction: Vec<String>,
    #[serde(default = "default_definition_terms")]
    pub definition: Vec<String>,
    #[serde(default = "default_faq_terms")]
    pub faq: Vec<String>,
    #[serde(default = "default_steps_terms")]
    pub steps: Vec<String>,
    #[serde(default = "default_comparison_terms")]
    pub comparison: Vec<String>,
    #[serde(default = "default_summary_terms")]
    pub summary: Vec<String>,
    #[serde(default = "default_testimonial_terms")]
    pub testimonial: Vec<String>,
    #[serde(default = "default_data_terms")]
    pub data: Vec<String>,
    #[serde(default = "default_cta_terms")]
    pub cta: Vec<String>,
}

impl Default for RoleKeywords {
    fn default() -> Self {
        Self {
            introduction: default_introduction_terms(),
            definition: default_definition_terms(),
            faq: default_faq_terms(),
            steps: default_steps_terms(),
            comparison: default_comparison_terms(),
            summary: default_summary_terms(),
            testimonial: default_testimonial_terms(),
            data: default_data_terms(),
            cta: default_cta_terms(),
        }
    }
}

fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| (*t).to_string()).collect()
}

fn default_introduction_terms() -> Vec<String> {
    terms(&["introduction", "overview", "getting started", "why "])
}
fn default_definition_terms() -> Vec<String> {
    terms(&["what is", "what are", "definition", "meaning of"])
}
fn default_faq_terms() -> Vec<String> {
    terms(&["faq", "frequently asked", "common questions", "q&a"])
}
fn default_steps_terms() -> Vec<String> {
    terms(&["how to", "step by step", "step-by-step", "guide", "process", "tutorial"])
}
fn default_comparison_terms() -> Vec<String> {
    terms(&["comparison", "versus", " vs ", " vs.", "compared to", "differences between"])
}
fn default_summary_terms() -> Vec<String> {
    terms(&["conclusion", "summary", "takeaway", "key points", "in short", "wrapping up"])
}
fn default_testimonial_terms() -> Vec<String> {
    terms(&["testimonial", "what our", "customer stories", "reviews"])
}
fn default_data_terms() -> Vec<String> {
    terms(&["statistics", "by the numbers", "research shows", "data"])
}
fn default_cta_terms() -> Vec<String> {
    terms(&["get started", "contact us", "request a", "sign up", "book a"])
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.stylepress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| StylePressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.stylepress/stylepress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| StylePressError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        StylePressError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Check that the collaborator API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.collaborator.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(StylePressError::config(format!(
            "collaborator API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("score_threshold"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.refinement.max_iterations, 3);
        assert!((parsed.refinement.score_threshold - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn keyword_tables_have_defaults() {
        let keywords = RoleKeywords::default();
        assert!(keywords.faq.iter().any(|t| t == "frequently asked"));
        assert!(keywords.definition.iter().any(|t| t == "what is"));
        assert!(keywords.summary.iter().any(|t| t == "conclusion"));
    }

    #[test]
    fn keyword_tables_overridable_from_toml() {
        let toml_str = r#"
[keywords]
faq = ["veelgestelde vragen"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.keywords.faq, vec!["veelgestelde vragen"]);
        // Unspecified tables keep their defaults
        assert!(config.keywords.summary.iter().any(|t| t == "summary"));
    }

    #[test]
    fn refinement_overrides_from_toml() {
        let toml_str = r#"
[refinement]
score_threshold = 85.0
max_iterations = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!((config.refinement.score_threshold - 85.0).abs() < f64::EPSILON);
        assert_eq!(config.refinement.max_iterations, 5);
        assert_eq!(config.refinement.max_stylesheet_chars, 24_000);
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.collaborator.api_key_env = "SP_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
