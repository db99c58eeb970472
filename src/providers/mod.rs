/*!
 * Provider implementations for speech synthesis backends.
 *
 * This module contains client implementations for the supported TTS
 * services:
 * - ElevenLabs: hosted expressive TTS (inline audio-tag styling)
 * - Inworld: hosted TTS with streamed LINEAR16 chunks
 * - Mock: in-process provider for tests and benches
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::io::Cursor;
use url::Url;

use crate::errors::ProviderError;
use crate::tags::{StyledSpan, TagCategory};

/// Raw audio returned by a backend for one styled span
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    /// 16-bit mono PCM samples
    pub samples: Vec<i16>,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl SpeechAudio {
    /// Duration of the audio
    pub fn duration(&self) -> std::time::Duration {
        if self.sample_rate == 0 {
            return std::time::Duration::ZERO;
        }
        std::time::Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Expressive styling derived from a span's tags, at most one per category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDirectives {
    /// Emotional coloring keyword
    pub emotion: Option<String>,

    /// Delivery mode keyword
    pub delivery: Option<String>,

    /// Vocal reaction keyword
    pub reaction: Option<String>,

    /// Environmental sound effect keyword
    pub sound_effect: Option<String>,

    /// Accent / singing keyword
    pub accent: Option<String>,
}

impl StyleDirectives {
    /// Derive directives from a styled span.
    ///
    /// Same-category overlap is impossible by construction in the parser, so
    /// the first tag of each category is the only one.
    pub fn from_span(span: &StyledSpan) -> Self {
        let mut directives = Self::default();
        for tag in &span.tags {
            let slot = match tag.category {
                TagCategory::Emotion => &mut directives.emotion,
                TagCategory::Delivery => &mut directives.delivery,
                TagCategory::Reaction => &mut directives.reaction,
                TagCategory::SoundEffect => &mut directives.sound_effect,
                TagCategory::AccentStyle => &mut directives.accent,
            };
            if slot.is_none() {
                *slot = Some(tag.keyword.clone());
            }
        }
        directives
    }

    /// Whether no styling applies (plain narration)
    pub fn is_plain(&self) -> bool {
        self.emotion.is_none()
            && self.delivery.is_none()
            && self.reaction.is_none()
            && self.sound_effect.is_none()
            && self.accent.is_none()
    }

    /// Active keywords in a fixed category order
    pub fn keywords(&self) -> Vec<&str> {
        [
            &self.emotion,
            &self.delivery,
            &self.reaction,
            &self.sound_effect,
            &self.accent,
        ]
        .into_iter()
        .filter_map(|k| k.as_deref())
        .collect()
    }
}

/// Common trait for all TTS providers
///
/// This trait defines the interface that all provider implementations must
/// follow, allowing them to be used interchangeably by the synthesis service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Synthesize one request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to synthesize
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn synthesize(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract the audio payload from the provider response
    fn extract_audio(response: &Self::Response) -> SpeechAudio;
}

/// Classify a non-success HTTP status into the provider error taxonomy
pub(crate) fn classify_status(status_code: u16, message: String) -> ProviderError {
    match status_code {
        429 => ProviderError::Throttled(message),
        401 | 403 => ProviderError::AuthenticationError(message),
        400 | 413 | 422 => ProviderError::InputRejected(message),
        _ => ProviderError::ApiError {
            status_code,
            message,
        },
    }
}

/// Validate and normalize a provider endpoint URL
pub(crate) fn normalize_endpoint(endpoint: &str) -> Result<String, ProviderError> {
    if endpoint.is_empty() {
        return Err(ProviderError::RequestFailed(
            "Endpoint cannot be empty".to_string(),
        ));
    }

    let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };

    Url::parse(&with_scheme)
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

    Ok(with_scheme.trim_end_matches('/').to_string())
}

/// Decode a WAV payload into 16-bit mono PCM.
///
/// Multi-channel audio is downmixed by averaging; float samples are scaled.
pub(crate) fn decode_wav(bytes: &[u8]) -> Result<SpeechAudio, ProviderError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| ProviderError::ParseError(format!("Invalid WAV response: {}", e)))?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Int => {
            if spec.bits_per_sample != 16 {
                return Err(ProviderError::ParseError(format!(
                    "Unsupported WAV bit depth: {}",
                    spec.bits_per_sample
                )));
            }
            reader
                .into_samples::<i16>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ProviderError::ParseError(format!("Corrupt WAV samples: {}", e)))?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ProviderError::ParseError(format!("Corrupt WAV samples: {}", e)))?,
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / frame.len() as i32) as i16
            })
            .collect()
    };

    Ok(SpeechAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

pub mod elevenlabs;
pub mod inworld;
pub mod mock;
