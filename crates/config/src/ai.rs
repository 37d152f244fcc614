// AI configuration and secrets management
//
// API keys are looked up in:
// 1. System keychain (preferred)
// 2. Environment variables (fallback for CI/headless)
//
// Keys are NEVER stored in settings.json

use std::env;

use crate::settings::{AIProvider, AISettings};

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "pathgrid";

/// Conventional OpenAI variable, checked last for the openai provider
const OPENAI_STANDARD_ENV: &str = "OPENAI_API_KEY";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key retrieved from system keychain
    Keychain,
    /// Key retrieved from environment variable
    Environment,
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
    /// Keychain failure other than "no entry", if any
    pub keychain_error: Option<String>,
}

/// Get the environment variable name for a provider
pub fn env_var_name(provider: &str) -> String {
    format!("PATHGRID_{}_KEY", provider.to_uppercase())
}

/// Get the keychain account name for a provider
fn keychain_account(provider: &str) -> String {
    format!("ai/{}", provider.to_lowercase())
}

#[cfg(feature = "keychain")]
fn keychain_lookup(provider: &str) -> Result<Option<String>, String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider))
        .map_err(|e| format!("Failed to access keychain: {}", e))?;
    match entry.get_password() {
        Ok(key) => Ok(Some(key)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(format!("Failed to read key from keychain: {}", e)),
    }
}

#[cfg(not(feature = "keychain"))]
fn keychain_lookup(_provider: &str) -> Result<Option<String>, String> {
    Ok(None)
}

fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok().filter(|key| !key.is_empty())
}

/// Get an API key for the specified provider
///
/// Checks in order:
/// 1. System keychain
/// 2. Environment variable (PATHGRID_OPENAI_KEY, etc.)
/// 3. OPENAI_API_KEY, for the openai provider only
pub fn get_api_key(provider: &str) -> KeyLookup {
    let mut keychain_error = None;
    match keychain_lookup(provider) {
        Ok(Some(key)) => {
            return KeyLookup { key: Some(key), source: KeySource::Keychain, keychain_error: None };
        }
        Ok(None) => {}
        Err(e) => {
            log::debug!("keychain lookup for {} failed: {}", provider, e);
            keychain_error = Some(e);
        }
    }

    let mut names = vec![env_var_name(provider)];
    if provider.eq_ignore_ascii_case(AIProvider::OpenAI.name()) {
        names.push(OPENAI_STANDARD_ENV.to_string());
    }
    for name in names {
        if let Some(key) = env_lookup(&name) {
            return KeyLookup { key: Some(key), source: KeySource::Environment, keychain_error };
        }
    }

    KeyLookup { key: None, source: KeySource::None, keychain_error }
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "test").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

// ============================================================================
// Resolved AI Configuration (single source of truth)
// ============================================================================

/// The effective AI configuration, fully resolved from all sources.
#[derive(Debug, Clone)]
pub struct ResolvedAIConfig {
    pub provider: AIProvider,
    /// Effective model (resolved from settings or provider default)
    pub model: String,
    /// Effective API base URL
    pub endpoint: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// API key (if available and provider needs one)
    pub api_key: Option<String>,
    /// Source of the API key
    pub key_source: KeySource,
    /// Overall status
    pub status: AIConfigStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

/// Status of the AI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIConfigStatus {
    /// Problem generation is disabled (provider = none)
    Disabled,
    /// Configuration is usable
    Ready,
    /// Provider needs an API key and none was found
    MissingKey,
    /// Keychain access failed and no fallback key was found
    Error,
}

impl AIConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Ready => "ready",
            Self::MissingKey => "missing_key",
            Self::Error => "error",
        }
    }
}

impl ResolvedAIConfig {
    /// Resolve the effective AI configuration from settings.
    pub fn from_settings(settings: &AISettings) -> Self {
        Self::resolve(settings, get_api_key)
    }

    /// Resolution with an injectable key lookup.
    fn resolve(settings: &AISettings, lookup_key: impl Fn(&str) -> KeyLookup) -> Self {
        let provider = settings.provider;

        let mut config = Self {
            provider,
            model: settings.effective_model().to_string(),
            endpoint: settings.effective_endpoint().to_string(),
            temperature: settings.temperature,
            timeout_secs: settings.timeout_secs,
            api_key: None,
            key_source: KeySource::None,
            status: AIConfigStatus::Ready,
            blocking_reason: None,
        };

        if !provider.is_enabled() {
            config.status = AIConfigStatus::Disabled;
            config.blocking_reason = Some("provider=none".to_string());
            return config;
        }

        if provider.needs_api_key() {
            let lookup = lookup_key(provider.name());
            match (lookup.key, lookup.keychain_error) {
                (Some(key), _) => {
                    config.api_key = Some(key);
                    config.key_source = lookup.source;
                }
                (None, Some(err)) => {
                    config.status = AIConfigStatus::Error;
                    config.blocking_reason = Some(err);
                }
                (None, None) => {
                    config.status = AIConfigStatus::MissingKey;
                    config.blocking_reason = Some(format!(
                        "No API key found. Set via keychain or {}",
                        env_var_name(provider.name())
                    ));
                }
            }
        }

        config
    }

    /// Provider display name
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}
