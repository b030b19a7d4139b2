//! Configuration file support

use chatapt_ai::GenerationOptions;
use chatapt_ai::providers::gemini::{API_KEY_ENV_VARS, DEFAULT_MODEL};
use chatapt_core::{ConversationConfig, MAX_HISTORY_SIZE};
use chatapt_core::orchestrator::DEFAULT_MAX_OUTPUT_TOKENS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Prompts offered before the first message
pub const DEFAULT_TEMPLATES: &[&str] = &[
    "Halo",
    "Apa kabar?",
    "Ada yang bisa dibantu?",
    "Apa itu Android Compose?",
];

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Configuration for chatapt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini model id
    pub model: Option<String>,
    /// API base URL including the version segment
    pub base_url: Option<String>,
    /// API key (environment variables are preferred)
    pub api_key: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    /// Turns kept as prompt context
    pub history_size: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    /// Where the message log lives
    pub data_dir: Option<PathBuf>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    pub templates: Option<Vec<String>>,
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatapt")
    }

    /// `$CHATAPT_CONFIG_PATH`, or `config.toml` in [`Self::config_dir`]
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CHATAPT_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load the config file, falling back to defaults when it is missing or broken
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Write the example config if no file exists yet
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, example_config())?;
        Ok(path)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Directory holding the message log and the TUI log file
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("chatapt")
        })
    }

    pub fn templates(&self) -> Vec<String> {
        match &self.templates {
            Some(templates) => templates.clone(),
            None => DEFAULT_TEMPLATES.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_output_tokens: Some(self.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS)),
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
        }
    }

    pub fn conversation_config(&self) -> ConversationConfig {
        ConversationConfig {
            generation: self.generation_options(),
            history_size: self.history_size.unwrap_or(MAX_HISTORY_SIZE),
            templates: self.templates(),
        }
    }

    /// API key from the command line, then this config, then the environment
    pub fn get_api_key(&self, from_args: Option<&str>) -> Option<String> {
        let provided = from_args
            .filter(|k| !k.trim().is_empty())
            .or(self.api_key.as_deref());
        chatapt_ai::providers::get_api_key(provided, API_KEY_ENV_VARS).ok()
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# chatapt configuration file
# Place at ~/.config/chatapt/config.toml (Linux) or set CHATAPT_CONFIG_PATH

# Gemini model to use
model = "gemini-2.0-flash"

# API base URL, including the version segment
# base_url = "https://generativelanguage.googleapis.com/v1beta"

# Generation options
max_output_tokens = 50
# temperature = 0.7
# top_p = 0.95
# top_k = 40

# Number of recent turns sent as context
history_size = 10

# Request timeout in seconds
request_timeout_secs = 60

# Where messages.jsonl is stored (defaults to the platform data dir)
# data_dir = "~/.local/share/chatapt"

# Whether to use TUI mode by default
# Set to false for simple stdin/stdout mode
tui = true

# Prompts offered before the first message
templates = ["Halo", "Apa kabar?", "Ada yang bisa dibantu?", "Apa itu Android Compose?"]

# API key (optional - GOOGLE_API_KEY or GEMINI_API_KEY also work)
# It's recommended to use environment variables instead for security
# api_key = "..."
"#
}
