// Application settings
// Loaded from ~/.config/pathgrid/settings.json (or $PATHGRID_CONFIG)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the settings file location
pub const CONFIG_ENV: &str = "PATHGRID_CONFIG";

/// AI provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIProvider {
    /// Problem generation disabled (file-based problems only)
    None,
    /// Local model via Ollama's OpenAI-compatible API
    Local,
    /// OpenAI API (default)
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
}

impl AIProvider {
    /// Returns true if problem generation is enabled
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AIProvider::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AIProvider::None => "none",
            AIProvider::Local => "local",
            AIProvider::OpenAI => "openai",
        }
    }

    /// Returns the default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            AIProvider::None => "",
            AIProvider::Local => "llama3:8b",
            AIProvider::OpenAI => "gpt-3.5-turbo",
        }
    }

    /// Base URL of the chat-completions API
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            AIProvider::None => "",
            AIProvider::Local => "http://localhost:11434/v1",
            AIProvider::OpenAI => "https://api.openai.com/v1",
        }
    }

    pub fn needs_api_key(&self) -> bool {
        matches!(self, AIProvider::OpenAI)
    }
}

/// AI-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AISettings {
    /// Selected AI provider
    pub provider: AIProvider,

    /// Model identifier (empty = provider default)
    pub model: String,

    /// Custom API base URL (empty = provider default)
    pub endpoint: Option<String>,

    /// Sampling temperature for problem generation
    pub temperature: f32,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            provider: AIProvider::OpenAI,
            model: String::new(),
            endpoint: None,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

impl AISettings {
    /// Get the effective model (user-specified or provider default)
    pub fn effective_model(&self) -> &str {
        if self.model.is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    /// Get the effective API base URL, without a trailing slash
    pub fn effective_endpoint(&self) -> &str {
        match self.endpoint.as_deref() {
            Some(e) if !e.trim().is_empty() => e.trim_end_matches('/'),
            _ => self.provider.default_endpoint(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Playback
    #[serde(rename = "playback.visitedTickMs")]
    pub visited_tick_ms: u64,

    #[serde(rename = "playback.pathDelayMs")]
    pub path_delay_ms: u64,

    #[serde(rename = "playback.pathTickMs")]
    pub path_tick_ms: u64,

    // Execution
    #[serde(rename = "execution.instructionLimit")]
    pub instruction_limit: Option<u64>, // None = unlimited

    // Editor
    #[serde(rename = "editor.command")]
    pub editor_command: Option<String>, // None = $VISUAL / $EDITOR / vi

    #[serde(rename = "editor.solutionFile")]
    pub solution_file: String,

    // AI
    #[serde(rename = "ai", default)]
    pub ai: AISettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Playback
            visited_tick_ms: 20,
            path_delay_ms: 100,
            path_tick_ms: 50,
            // Execution
            instruction_limit: None,
            // Editor
            editor_command: None,
            solution_file: "solution.lua".to_string(),
            // AI
            ai: AISettings::default(),
        }
    }
}

const DEFAULT_CONFIG: &str = r#"{
    // Playback speed (milliseconds)
    "playback.visitedTickMs": 20,
    "playback.pathDelayMs": 100,
    "playback.pathTickMs": 50,

    // Stop solutions after this many Lua instructions (null = no limit).
    // Checked every 10000 instructions, so the limit rounds up to that step.
    "execution.instructionLimit": null,

    // Editor launched with the `e` key (null = $VISUAL, then $EDITOR, then vi)
    "editor.command": null,
    "editor.solutionFile": "solution.lua",

    // Problem generation
    // Provider options: "none", "local", "openai"
    // API keys are stored in system keychain or PATHGRID_OPENAI_KEY, not in this file
    "ai": {
        "provider": "openai",
        "model": "",
        "temperature": 0.7,
        "timeout_secs": 60
    }
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pathgrid");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults.
    /// Writes a commented default file on first run.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        Self::load_from(&path)
    }

    /// Load settings from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings text. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
