use std::time::Duration;
use serde::{Serialize, Deserialize};
use async_trait::async_trait;
use reqwest::Client;
use log::error;

use crate::errors::ProviderError;
use super::{classify_status, decode_wav, normalize_endpoint, Provider, SpeechAudio, StyleDirectives};

/// ElevenLabs client for interacting with the ElevenLabs TTS API
#[derive(Debug)]
pub struct ElevenLabs {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
}

/// ElevenLabs text-to-speech request
#[derive(Debug, Serialize)]
pub struct ElevenLabsRequest {
    /// Voice identifier, carried in the request path rather than the body
    #[serde(skip)]
    voice_id: String,

    /// Text to speak, with inline audio tags re-emitted from directives
    text: String,

    /// The model to use
    model_id: String,

    /// Voice rendering settings
    voice_settings: VoiceSettings,
}

/// Voice rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Voice stability (lower is more expressive)
    pub stability: f32,

    /// Similarity to the reference voice
    pub similarity_boost: f32,

    /// Style exaggeration
    pub style: f32,

    /// Whether to boost speaker similarity
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// One voice entry from the voices listing
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceInfo {
    /// Voice identifier
    pub voice_id: String,

    /// Human-readable voice name
    #[serde(default)]
    pub name: String,
}

/// Voices listing response
#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceInfo>,
}

impl ElevenLabsRequest {
    /// Create a new plain-narration request
    pub fn new(voice_id: impl Into<String>, text: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            text: text.into(),
            model_id: model_id.into(),
            voice_settings: VoiceSettings::default(),
        }
    }

    /// Apply expressive directives.
    ///
    /// The v3 models take styling as inline audio tags, so active keywords
    /// are re-emitted as a tag prefix ahead of the spoken text. Emotion and
    /// delivery directives additionally raise the style exaggeration so the
    /// cue is audible on less expressive voices.
    pub fn with_style(mut self, directives: &StyleDirectives) -> Self {
        if directives.is_plain() {
            return self;
        }

        let mut prefix = String::new();
        for keyword in directives.keywords() {
            prefix.push_str(&format!("[{}] ", keyword));
        }
        self.text = format!("{}{}", prefix, self.text);

        if directives.emotion.is_some() || directives.delivery.is_some() {
            self.voice_settings.style = 0.4;
            self.voice_settings.stability = 0.35;
        }
        self
    }

    /// Override the voice settings
    pub fn voice_settings(mut self, settings: VoiceSettings) -> Self {
        self.voice_settings = settings;
        self
    }

    /// The voice this request is bound to
    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    /// The text payload as it will be sent
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl ElevenLabs {
    /// Create a new ElevenLabs client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new_with_config(api_key, endpoint, 120)
    }

    /// Create a new ElevenLabs client with a request timeout
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let endpoint = normalize_endpoint(&endpoint.into())?;

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint,
        })
    }

    /// Synthesize one request into raw audio
    pub async fn synthesize(&self, request: ElevenLabsRequest) -> Result<SpeechAudio, ProviderError> {
        let api_url = format!("{}/v1/text-to-speech/{}", self.endpoint, request.voice_id);

        let response = self.client.post(&api_url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/wav")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to send request to ElevenLabs API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("ElevenLabs API error ({}): {}", status, error_text);
            return Err(classify_status(status.as_u16(), error_text));
        }

        let audio_bytes = response.bytes().await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read ElevenLabs audio body: {}", e)))?;

        decode_wav(&audio_bytes)
    }

    /// List available voice identities
    pub async fn fetch_voices(&self) -> Result<Vec<VoiceInfo>, ProviderError> {
        let api_url = format!("{}/v1/voices", self.endpoint);

        let response = self.client.get(&api_url)
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to query ElevenLabs voices: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("ElevenLabs API error ({}): {}", status, error_text);
            return Err(classify_status(status.as_u16(), error_text));
        }

        let listing = response.json::<VoicesResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse ElevenLabs voices response: {}", e)))?;

        Ok(listing.voices)
    }
}

#[async_trait]
impl Provider for ElevenLabs {
    type Request = ElevenLabsRequest;
    type Response = SpeechAudio;

    async fn synthesize(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        ElevenLabs::synthesize(self, request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.fetch_voices().await.map(|_| ())
    }

    fn extract_audio(response: &Self::Response) -> SpeechAudio {
        response.clone()
    }
}
