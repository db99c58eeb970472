/*!
 * Core speech synthesis service.
 *
 * This module contains the main SynthesisService struct and its
 * implementation, which turns one styled span bound to one voice into a raw
 * audio clip via the configured TTS backend. Throttling and transient
 * failures are retried with exponential backoff inside an explicit bounded
 * loop; rejected input is terminal for the span and reported to the caller,
 * which substitutes silence rather than aborting the run.
 */

use anyhow::{Result, anyhow};
use log::{debug, error};
use rand::Rng;
use std::time::{Duration, Instant};

use crate::app_config::{TtsConfig, TtsProvider as ConfigTtsProvider};
use crate::errors::{ProviderError, SynthesisError};
use crate::providers::elevenlabs::{ElevenLabs, ElevenLabsRequest};
use crate::providers::inworld::{Inworld, InworldRequest};
use crate::providers::mock::{MockProvider, MockRequest, MOCK_SAMPLE_RATE};
use crate::providers::{Provider, SpeechAudio, StyleDirectives};
use crate::tags::StyledSpan;
use super::cache::ClipCache;
use super::timeline::AudioClip;

/// Usage statistics for tracking API consumption
#[derive(Clone, Debug)]
pub struct SynthUsageStats {
    /// Number of spans synthesized (cache hits included)
    pub spans: u64,

    /// Characters of text sent to the backend
    pub characters: u64,

    /// Audio produced
    pub audio_duration: Duration,

    /// Start time of tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl Default for SynthUsageStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthUsageStats {
    /// Create a new empty usage stats instance
    pub fn new() -> Self {
        Self {
            spans: 0,
            characters: 0,
            audio_duration: Duration::from_secs(0),
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider: String::new(),
            model: String::new(),
        }
    }

    /// Create new usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            provider,
            model,
            ..Self::new()
        }
    }

    /// Record one synthesized span
    pub fn add_span(&mut self, characters: usize, audio_duration: Duration, api_duration: Duration) {
        self.spans += 1;
        self.characters += characters as u64;
        self.audio_duration += audio_duration;
        self.api_duration += api_duration;
    }

    /// Audio seconds produced per minute of API time
    pub fn audio_seconds_per_minute(&self) -> f64 {
        let api_minutes = self.api_duration.as_secs_f64() / 60.0;
        if api_minutes > 0.0 {
            self.audio_duration.as_secs_f64() / api_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of API usage
    pub fn summary(&self) -> String {
        let elapsed_minutes = self.start_time.elapsed().as_secs_f64() / 60.0;
        let api_minutes = self.api_duration.as_secs_f64() / 60.0;

        format!(
            "Synthesis Usage Summary:\n\
             Provider: {}\n\
             Model: {}\n\
             Spans: {}\n\
             Characters: {}\n\
             Audio produced: {:.2} s\n\
             Elapsed time: {:.2} minutes\n\
             API request time: {:.2} minutes\n\
             Audio seconds per API minute: {:.2}",
            self.provider,
            self.model,
            self.spans,
            self.characters,
            self.audio_duration.as_secs_f64(),
            elapsed_minutes,
            api_minutes,
            self.audio_seconds_per_minute()
        )
    }
}

/// Synthesis provider implementation variants
enum SpeechProviderImpl {
    /// ElevenLabs hosted TTS
    ElevenLabs {
        /// Client instance
        client: ElevenLabs,
    },

    /// Inworld hosted TTS
    Inworld {
        /// Client instance
        client: Inworld,
    },

    /// In-process mock (tests and benches)
    Mock {
        /// Client instance
        client: MockProvider,
    },
}

/// Synthesis options for customizing the synthesis process
pub struct SynthesisOptions {
    /// Maximum number of concurrent requests
    pub max_concurrent_requests: usize,

    /// Maximum characters accepted per span before rejection
    pub max_chars_per_span: usize,

    /// Retry attempts after the initial call
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled per retry
    pub retry_backoff_ms: u64,

    /// Pacing delay before each request, in milliseconds (0 disables)
    pub rate_limit_delay_ms: u64,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            max_chars_per_span: 2500,
            retry_count: 3,
            retry_backoff_ms: 1000,
            rate_limit_delay_ms: 0,
        }
    }
}

/// Log entry for capturing synthesis process logs
#[derive(Clone)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
}

/// Main speech synthesis service
pub struct SynthesisService {
    /// Provider implementation
    provider: SpeechProviderImpl,

    /// Configuration for the synthesis service
    pub config: TtsConfig,

    /// Synthesis options
    pub options: SynthesisOptions,

    /// Clip cache for identical spans within a run
    pub cache: ClipCache,
}

impl SynthesisService {
    /// Create a new synthesis service with the given configuration
    pub fn new(config: TtsConfig) -> Result<Self> {
        let timeout_secs = config.get_timeout_secs();
        let provider = match config.provider {
            ConfigTtsProvider::ElevenLabs => SpeechProviderImpl::ElevenLabs {
                client: ElevenLabs::new_with_config(
                    config.get_api_key(),
                    config.get_endpoint(),
                    timeout_secs,
                )
                .map_err(|e| anyhow!("Failed to build ElevenLabs client: {}", e))?,
            },
            ConfigTtsProvider::Inworld => SpeechProviderImpl::Inworld {
                client: Inworld::new_with_config(
                    config.get_api_key(),
                    config.get_endpoint(),
                    timeout_secs,
                )
                .map_err(|e| anyhow!("Failed to build Inworld client: {}", e))?,
            },
        };

        let options = SynthesisOptions {
            max_concurrent_requests: config.optimal_concurrent_requests(),
            max_chars_per_span: config.get_max_chars_per_span(),
            retry_count: config.common.retry_count,
            retry_backoff_ms: config.common.retry_backoff_ms,
            rate_limit_delay_ms: config.common.rate_limit_delay_ms,
        };
        let cache = ClipCache::new(config.common.cache_enabled);

        Ok(Self {
            provider,
            config,
            options,
            cache,
        })
    }

    /// Create a service backed by a mock provider (tests and benches)
    pub fn with_mock(mock: MockProvider, options: SynthesisOptions) -> Self {
        Self {
            provider: SpeechProviderImpl::Mock { client: mock },
            config: TtsConfig::default(),
            options,
            cache: ClipCache::new(true),
        }
    }

    /// Output sample rate of the configured provider
    pub fn sample_rate(&self) -> u32 {
        match &self.provider {
            SpeechProviderImpl::Mock { .. } => MOCK_SAMPLE_RATE,
            _ => self.config.get_sample_rate(),
        }
    }

    /// Test the connection to the synthesis provider
    pub async fn test_connection(&self) -> Result<()> {
        match &self.provider {
            SpeechProviderImpl::ElevenLabs { client } => client
                .test_connection()
                .await
                .map_err(|e| anyhow!("Failed to connect to ElevenLabs API: {}", e)),
            SpeechProviderImpl::Inworld { client } => client
                .test_connection()
                .await
                .map_err(|e| anyhow!("Failed to connect to Inworld API: {}", e)),
            SpeechProviderImpl::Mock { client } => client
                .test_connection()
                .await
                .map_err(|e| anyhow!("Mock provider refused connection: {}", e)),
        }
    }

    /// Fetch up to `limit` voice identities from the provider, in listing order
    pub async fn fetch_voice_pool(&self, limit: usize) -> Result<Vec<String>> {
        let voices = match &self.provider {
            SpeechProviderImpl::ElevenLabs { client } => client
                .fetch_voices()
                .await
                .map_err(|e| anyhow!("Failed to fetch ElevenLabs voices: {}", e))?
                .into_iter()
                .map(|v| v.voice_id)
                .collect::<Vec<_>>(),
            SpeechProviderImpl::Inworld { client } => client
                .fetch_voices()
                .await
                .map_err(|e| anyhow!("Failed to fetch Inworld voices: {}", e))?,
            SpeechProviderImpl::Mock { .. } => {
                (1..=limit).map(|i| format!("mock-voice-{}", i)).collect()
            }
        };

        if voices.is_empty() {
            return Err(anyhow!("Provider returned no voices"));
        }

        Ok(voices.into_iter().take(limit.max(1)).collect())
    }

    /// Synthesize one styled span bound to one voice.
    ///
    /// Throttled and transient failures retry with exponential backoff up to
    /// the configured attempt cap; rejected input returns immediately. The
    /// error carried out is terminal for the span either way.
    pub async fn synthesize_span(
        &self,
        span: &StyledSpan,
        voice_id: &str,
    ) -> Result<AudioClip, SynthesisError> {
        // Nothing to speak; an empty clip keeps positions aligned
        if span.text.trim().is_empty() {
            return Ok(AudioClip {
                samples: Vec::new(),
                sample_rate: self.sample_rate(),
                source_span: span.clone(),
            });
        }

        if span.text.chars().count() > self.options.max_chars_per_span {
            return Err(SynthesisError::Provider(ProviderError::InputRejected(
                format!(
                    "Span of {} chars exceeds the {}-char limit",
                    span.text.chars().count(),
                    self.options.max_chars_per_span
                ),
            )));
        }

        let style = StyleDirectives::from_span(span);

        if let Some(audio) = self.cache.get(&span.text, voice_id, &style) {
            return Ok(AudioClip::from_audio(audio, span.clone()));
        }

        let attempts_allowed = self.options.retry_count + 1;
        let mut attempt: u32 = 0;
        let mut last_error: Option<ProviderError> = None;

        while attempt < attempts_allowed {
            if self.options.rate_limit_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.options.rate_limit_delay_ms)).await;
            }

            match self.dispatch(&span.text, voice_id, &style).await {
                Ok(audio) => {
                    self.cache.store(&span.text, voice_id, &style, &audio);
                    return Ok(AudioClip::from_audio(audio, span.clone()));
                }
                Err(e) => {
                    if !e.is_retryable() {
                        debug!("Terminal synthesis error for voice {}: {}", voice_id, e);
                        return Err(SynthesisError::Provider(e));
                    }
                    error!(
                        "Synthesis error: {} - attempt {}/{}",
                        e,
                        attempt + 1,
                        attempts_allowed
                    );
                    last_error = Some(e);
                }
            }

            attempt += 1;

            // If we have more attempts left, wait with exponential backoff
            if attempt < attempts_allowed {
                let backoff_ms = self.options.retry_backoff_ms * (1u64 << (attempt - 1));
                let jitter = rand::rng().random_range(0..=backoff_ms / 4);
                tokio::time::sleep(Duration::from_millis(backoff_ms + jitter)).await;
            }
        }

        Err(SynthesisError::RetriesExhausted {
            attempts: attempts_allowed,
            last: last_error.unwrap_or_else(|| {
                ProviderError::RequestFailed("Synthesis failed with no recorded error".to_string())
            }),
        })
    }

    // One provider call. Styling maps to each backend's capabilities;
    // backends with no expressive channel fall back to plain narration.
    async fn dispatch(
        &self,
        text: &str,
        voice_id: &str,
        style: &StyleDirectives,
    ) -> Result<SpeechAudio, ProviderError> {
        match &self.provider {
            SpeechProviderImpl::ElevenLabs { client } => {
                let request = ElevenLabsRequest::new(voice_id, text, self.config.get_model())
                    .with_style(style);
                client.synthesize(request).await
            }
            SpeechProviderImpl::Inworld { client } => {
                let request = InworldRequest::new(
                    voice_id,
                    text,
                    self.config.get_model(),
                    self.config.get_sample_rate(),
                );
                client.synthesize(request).await
            }
            SpeechProviderImpl::Mock { client } => {
                let request = MockRequest {
                    text: text.to_string(),
                    voice_id: voice_id.to_string(),
                    style: style.clone(),
                };
                client.synthesize(request).await
            }
        }
    }

    /// A silence clip at the provider's sample rate
    pub fn silence_clip(&self, duration: Duration) -> AudioClip {
        AudioClip::silence(self.sample_rate(), duration)
    }
}
