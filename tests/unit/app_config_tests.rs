/*!
 * Tests for application configuration
 */

use threadvox::app_config::{Config, ProviderConfig, TtsProvider};

use crate::common;

#[test]
fn test_default_config_shouldListBothProviders() {
    let config = Config::default();

    assert_eq!(config.tts.provider, TtsProvider::ElevenLabs);
    assert_eq!(config.tts.available_providers.len(), 2);
    assert!(config
        .tts
        .available_providers
        .iter()
        .any(|p| p.provider_type == "elevenlabs"));
    assert!(config
        .tts
        .available_providers
        .iter()
        .any(|p| p.provider_type == "inworld"));
}

#[test]
fn test_default_config_shouldCarrySanePipelineDefaults() {
    let config = Config::default();

    assert_eq!(config.voices.pool_size, 8);
    assert_eq!(config.voices.recency_window, 4);
    assert!(!config.voices.persist_assignments);
    assert_eq!(config.playback.turn_gap_ms, 600);
    assert_eq!(config.tts.common.retry_count, 3);
    assert_eq!(config.tts.common.retry_backoff_ms, 1000);
}

#[test]
fn test_get_model_withActiveProvider_shouldUseProviderEntry() {
    let mut config = common::test_config(&["v1"]);
    if let Some(provider) = config
        .tts
        .available_providers
        .iter_mut()
        .find(|p| p.provider_type == "elevenlabs")
    {
        provider.model = "eleven_turbo_v2".to_string();
    }

    assert_eq!(config.tts.get_model(), "eleven_turbo_v2");
}

#[test]
fn test_get_model_withEmptyEntry_shouldFallBackToProviderDefault() {
    let mut config = common::test_config(&["v1"]);
    config.tts.available_providers.clear();

    assert_eq!(config.tts.get_model(), "eleven_v3");

    config.tts.provider = TtsProvider::Inworld;
    assert_eq!(config.tts.get_model(), "inworld-tts-1");
}

#[test]
fn test_get_endpoint_shouldFallBackPerProvider() {
    let mut config = Config::default();
    config.tts.available_providers.clear();

    assert_eq!(config.tts.get_endpoint(), "https://api.elevenlabs.io");

    config.tts.provider = TtsProvider::Inworld;
    assert_eq!(config.tts.get_endpoint(), "https://api.inworld.ai");
}

#[test]
fn test_get_sample_rate_shouldDifferPerProvider() {
    let mut config = Config::default();
    config.tts.available_providers.clear();

    assert_eq!(config.tts.get_sample_rate(), 44100);

    config.tts.provider = TtsProvider::Inworld;
    assert_eq!(config.tts.get_sample_rate(), 48000);
}

#[test]
fn test_optimal_concurrent_requests_shouldComeFromProviderConfig() {
    let mut config = common::test_config(&["v1"]);
    if let Some(provider) = config
        .tts
        .available_providers
        .iter_mut()
        .find(|p| p.provider_type == "elevenlabs")
    {
        provider.concurrent_requests = 7;
    }

    assert_eq!(config.tts.optimal_concurrent_requests(), 7);
}

#[test]
fn test_provider_config_new_shouldMatchProviderDefaults() {
    let elevenlabs = ProviderConfig::new(TtsProvider::ElevenLabs);
    assert_eq!(elevenlabs.provider_type, "elevenlabs");
    assert_eq!(elevenlabs.model, "eleven_v3");
    assert_eq!(elevenlabs.sample_rate, 44100);

    let inworld = ProviderConfig::new(TtsProvider::Inworld);
    assert_eq!(inworld.provider_type, "inworld");
    assert_eq!(inworld.endpoint, "https://api.inworld.ai");
    assert_eq!(inworld.sample_rate, 48000);
}

#[test]
fn test_config_serde_roundTrip_shouldPreserveSettings() {
    let mut config = common::test_config(&["v1", "v2"]);
    config.playback.turn_gap_ms = 450;
    config.voices.persist_assignments = true;

    let serialized = serde_json::to_string_pretty(&config).unwrap();
    let deserialized: Config = serde_json::from_str(&serialized).unwrap();

    assert_eq!(deserialized.playback.turn_gap_ms, 450);
    assert!(deserialized.voices.persist_assignments);
    assert_eq!(deserialized.voices.pool, vec!["v1", "v2"]);
    assert_eq!(deserialized.tts.provider, TtsProvider::ElevenLabs);
}

#[test]
fn test_config_deserialize_withMinimalJson_shouldApplyDefaults() {
    let config: Config = serde_json::from_str(r#"{"tts": {}}"#).unwrap();

    assert_eq!(config.voices.pool_size, 8);
    assert_eq!(config.playback.silence_fallback_ms, 1200);
    assert_eq!(config.tts.provider, TtsProvider::ElevenLabs);
}

#[test]
fn test_validate_withZeroPoolAndNoVoices_shouldFail() {
    let mut config = common::test_config(&[]);
    config.voices.pool_size = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withApiKeyConfigured_shouldSucceed() {
    let config = common::test_config(&["v1"]);

    assert!(config.validate().is_ok());
}

#[test]
fn test_provider_from_str_shouldParseKnownNames() {
    assert_eq!("elevenlabs".parse::<TtsProvider>().unwrap(), TtsProvider::ElevenLabs);
    assert_eq!("Inworld".parse::<TtsProvider>().unwrap(), TtsProvider::Inworld);
    assert!("espeak".parse::<TtsProvider>().is_err());
}
