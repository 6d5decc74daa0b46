//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::Result;
use crate::error::Error;

/// Environment variable consulted when no API key is stored in the config file
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Completion provider to use ("gemini")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Gemini API key
    #[serde(default)]
    pub gemini_api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Directory holding one API specification per file
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens per answer
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_catalog_dir() -> PathBuf {
    config_dir().join("catalog")
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    8192
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            gemini_api_key: String::new(),
            model: default_model(),
            catalog_dir: default_catalog_dir(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl Config {
    /// API key from the config file, falling back to `GEMINI_API_KEY`
    pub fn resolved_api_key(&self) -> String {
        if !self.gemini_api_key.is_empty() {
            return self.gemini_api_key.clone();
        }
        std::env::var(API_KEY_ENV).unwrap_or_default()
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".apicenter-chat")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from the default location
pub fn load() -> Result<Config> {
    load_from(&config_path())
}

/// Load configuration from `path`
pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Config not found at {:?}. Run 'apicenter-chat onboard' first.",
            path
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<()> {
    save_to(config, &config_path())
}

/// Save configuration to `path`
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    // Create parent directory
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Interactive first-run setup
pub fn onboard() -> Result<()> {
    use crate::ui;
    use inquire::{Confirm, Text};

    ui::print_header("Setup Wizard", "gemini");
    println!("  Welcome! Let's connect a model and an API catalog.\n");

    let mut config = Config::default();

    // 1. API key
    let key = Text::new("Enter your Gemini API Key (leave empty to use GEMINI_API_KEY):")
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    config.gemini_api_key = key.trim().to_string();

    // 2. Catalog directory
    ui::print_step(&format!("Default catalog directory is {:?}", config.catalog_dir));
    let keep_default = Confirm::new("Use default catalog directory?")
        .with_default(true)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;

    if !keep_default {
        let path = Text::new("Enter catalog directory:")
            .prompt()
            .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
        config.catalog_dir = PathBuf::from(path.trim());
    }

    ui::print_thinking("Creating catalog directory");
    std::fs::create_dir_all(&config.catalog_dir)?;

    // 3. Save
    ui::print_thinking("Saving configuration");
    save(&config)?;

    println!();
    ui::print_success("Setup complete!");
    ui::print_step(&format!(
        "Drop OpenAPI documents into {:?}, then run 'apicenter-chat chat'.",
        config.catalog_dir
    ));

    Ok(())
}
