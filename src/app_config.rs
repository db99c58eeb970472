use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Voice pool and assignment settings
    #[serde(default)]
    pub voices: VoicesConfig,

    /// Timeline / playback settings
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Speech synthesis config
    pub tts: TtsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Speech synthesis provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    // @provider: ElevenLabs
    #[default]
    ElevenLabs,
    // @provider: Inworld
    Inworld,
}

impl TtsProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::ElevenLabs => "ElevenLabs",
            Self::Inworld => "Inworld",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::ElevenLabs => "elevenlabs".to_string(),
            Self::Inworld => "inworld".to_string(),
        }
    }
}

// Implement Display trait for TtsProvider
impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TtsProvider
impl std::str::FromStr for TtsProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "elevenlabs" => Ok(Self::ElevenLabs),
            "inworld" => Ok(Self::Inworld),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max concurrent synthesis requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Max chars per synthesized span
    #[serde(default = "default_max_chars_per_span")]
    pub max_chars_per_span: usize,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Output sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TtsProvider) -> Self {
        match provider_type {
            TtsProvider::ElevenLabs => Self {
                provider_type: "elevenlabs".to_string(),
                model: default_elevenlabs_model(),
                api_key: String::new(),
                endpoint: default_elevenlabs_endpoint(),
                concurrent_requests: default_concurrent_requests(),
                max_chars_per_span: default_max_chars_per_span(),
                timeout_secs: default_timeout_secs(),
                sample_rate: default_sample_rate(),
            },
            TtsProvider::Inworld => Self {
                provider_type: "inworld".to_string(),
                model: default_inworld_model(),
                api_key: String::new(),
                endpoint: default_inworld_endpoint(),
                concurrent_requests: default_concurrent_requests(),
                max_chars_per_span: default_max_chars_per_span(),
                timeout_secs: default_timeout_secs(),
                sample_rate: default_inworld_sample_rate(),
            },
        }
    }
}

/// Voice pool and assignment configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VoicesConfig {
    /// Number of voices drawn from the provider when no explicit pool is given
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Explicit ordered voice pool; when non-empty it overrides pool_size
    #[serde(default)]
    pub pool: Vec<String>,

    /// How many sequence indices a voice stays locked to its last speaker
    #[serde(default = "default_recency_window")]
    pub recency_window: usize,

    /// Whether assignments persist across runs via the voice store
    #[serde(default)]
    pub persist_assignments: bool,

    /// Optional path for the voice store database
    #[serde(default)]
    pub store_path: Option<std::path::PathBuf>,
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            pool: Vec::new(),
            recency_window: default_recency_window(),
            persist_assignments: false,
            store_path: None,
        }
    }
}

/// Timeline assembly configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaybackConfig {
    /// Silence inserted between two authored items, in milliseconds
    #[serde(default = "default_turn_gap_ms")]
    pub turn_gap_ms: u64,

    /// Duration of the silence clip substituted for a failed span
    #[serde(default = "default_silence_fallback_ms")]
    pub silence_fallback_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            turn_gap_ms: default_turn_gap_ms(),
            silence_fallback_ms: default_silence_fallback_ms(),
        }
    }
}

/// Speech synthesis service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TtsConfig {
    /// Synthesis provider to use
    #[serde(default)]
    pub provider: TtsProvider,

    /// Available synthesis providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common synthesis settings
    #[serde(default)]
    pub common: TtsCommonConfig,
}

/// Common synthesis settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TtsCommonConfig {
    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Delay in milliseconds between consecutive requests (0 disables)
    #[serde(default)]
    pub rate_limit_delay_ms: u64,

    /// Whether identical spans reuse the in-memory clip cache
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for TtsCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            rate_limit_delay_ms: 0,
            cache_enabled: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_max_chars_per_span() -> usize {
    2500
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_pool_size() -> usize {
    8
}

fn default_recency_window() -> usize {
    4
}

fn default_turn_gap_ms() -> u64 {
    600
}

fn default_silence_fallback_ms() -> u64 {
    1200
}

fn default_true() -> bool {
    true
}

fn default_elevenlabs_endpoint() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_inworld_endpoint() -> String {
    "https://api.inworld.ai".to_string()
}

fn default_elevenlabs_model() -> String {
    "eleven_v3".to_string()
}

fn default_inworld_model() -> String {
    "inworld-tts-1".to_string()
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_inworld_sample_rate() -> u32 {
    48000
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.voices.pool.is_empty() && self.voices.pool_size == 0 {
            return Err(anyhow!("Voice pool size must be at least 1"));
        }

        // Every hosted provider needs an API key from config or environment
        let api_key = self.tts.get_api_key();
        if api_key.is_empty() {
            return Err(anyhow!(
                "API key is required for the {} provider (config or {})",
                self.tts.provider.display_name(),
                self.tts.provider.api_key_env_var()
            ));
        }

        Ok(())
    }
}

impl TtsProvider {
    /// Environment variable consulted when the config carries no API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::ElevenLabs => "ELEVENLABS_API_KEY",
            Self::Inworld => "INWORLD_API_TOKEN",
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            voices: VoicesConfig::default(),
            playback: PlaybackConfig::default(),
            tts: TtsConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TtsConfig {
    pub fn optimal_concurrent_requests(&self) -> usize {
        // Check if the provider exists in the available_providers
        if let Some(provider_config) = self.get_active_provider_config() {
            return provider_config.concurrent_requests.max(1);
        }

        // Default fallback
        default_concurrent_requests()
    }

    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get a specific provider configuration by type for testing
    pub fn get_provider_config(&self, provider_type: &TtsProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TtsProvider::ElevenLabs => default_elevenlabs_model(),
            TtsProvider::Inworld => default_inworld_model(),
        }
    }

    /// Get the API key for the active provider, falling back to the environment
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        std::env::var(self.provider.api_key_env_var()).unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TtsProvider::ElevenLabs => default_elevenlabs_endpoint(),
            TtsProvider::Inworld => default_inworld_endpoint(),
        }
    }

    /// Get the max chars per span for the active provider
    pub fn get_max_chars_per_span(&self) -> usize {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.max_chars_per_span > 0 {
                return provider_config.max_chars_per_span;
            }
        }

        // Default fallback
        default_max_chars_per_span()
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.timeout_secs > 0 {
                return provider_config.timeout_secs;
            }
        }

        default_timeout_secs()
    }

    /// Get the output sample rate for the active provider
    pub fn get_sample_rate(&self) -> u32 {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.sample_rate > 0 {
                return provider_config.sample_rate;
            }
        }

        match self.provider {
            TtsProvider::ElevenLabs => default_sample_rate(),
            TtsProvider::Inworld => default_inworld_sample_rate(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: TtsProvider::default(),
            available_providers: Vec::new(),
            common: TtsCommonConfig::default(),
        };

        // Add default providers
        config
            .available_providers
            .push(ProviderConfig::new(TtsProvider::ElevenLabs));
        config
            .available_providers
            .push(ProviderConfig::new(TtsProvider::Inworld));

        config
    }
}
