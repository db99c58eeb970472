use std::time::Duration;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Buf;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::error;

use crate::errors::ProviderError;
use super::{classify_status, normalize_endpoint, Provider, SpeechAudio};

// Each streamed chunk is a standalone WAV; its header is this many bytes and
// must be stripped before the PCM payloads are concatenated.
const WAV_HEADER_LEN: usize = 44;

/// Inworld client for interacting with the Inworld TTS API
#[derive(Debug)]
pub struct Inworld {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication (Basic scheme)
    api_key: String,
    /// API endpoint URL
    endpoint: String,
}

/// Inworld synthesis request
#[derive(Debug, Serialize)]
pub struct InworldRequest {
    /// Text to speak; Inworld has no expressive-tag channel, so this is the
    /// plain span text regardless of directives
    text: String,

    /// Voice identifier
    #[serde(rename = "voiceId")]
    voice_id: String,

    /// The model to use
    #[serde(rename = "modelId")]
    model_id: String,

    /// Requested audio encoding
    audio_config: AudioConfig,
}

/// Audio encoding parameters
#[derive(Debug, Serialize)]
struct AudioConfig {
    audio_encoding: String,
    sample_rate_hertz: u32,
}

// One line of the streamed JSONL response
#[derive(Debug, Deserialize)]
struct StreamLine {
    result: StreamResult,
}

#[derive(Debug, Deserialize)]
struct StreamResult {
    #[serde(rename = "audioContent")]
    audio_content: String,
}

/// Voices listing response
#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<InworldVoice>,
}

#[derive(Debug, Deserialize)]
struct InworldVoice {
    #[serde(rename = "voiceId")]
    voice_id: String,
}

impl InworldRequest {
    /// Create a new synthesis request
    pub fn new(
        voice_id: impl Into<String>,
        text: impl Into<String>,
        model_id: impl Into<String>,
        sample_rate: u32,
    ) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            model_id: model_id.into(),
            audio_config: AudioConfig {
                audio_encoding: "LINEAR16".to_string(),
                sample_rate_hertz: sample_rate,
            },
        }
    }

    /// The requested sample rate
    pub fn sample_rate(&self) -> u32 {
        self.audio_config.sample_rate_hertz
    }
}

impl Inworld {
    /// Create a new Inworld client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new_with_config(api_key, endpoint, 120)
    }

    /// Create a new Inworld client with a request timeout
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

    /// Synthesize one request into raw audio.
    ///
    /// The response body is JSON-lines; each line carries a base64 WAV chunk
    /// whose header is stripped so the LINEAR16 payloads concatenate into one
    /// continuous clip.
    pub async fn synthesize(&self, request: InworldRequest) -> Result<SpeechAudio, ProviderError> {
        let api_url = format!("{}/tts/v1/voice:stream", self.endpoint);
        let sample_rate = request.sample_rate();

        let response = self.client.post(&api_url)
            .header("Authorization", format!("Basic {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to send request to Inworld API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Inworld API error ({}): {}", status, error_text);
            return Err(classify_status(status.as_u16(), error_text));
        }

        let body = response.text().await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read Inworld response body: {}", e)))?;

        let mut pcm: Vec<u8> = Vec::new();
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let chunk: StreamLine = serde_json::from_str(line)
                .map_err(|e| ProviderError::ParseError(format!("Invalid Inworld stream line: {}", e)))?;

            let audio_chunk = BASE64.decode(chunk.result.audio_content.as_bytes())
                .map_err(|e| ProviderError::ParseError(format!("Invalid base64 audio chunk: {}", e)))?;

            if audio_chunk.len() > WAV_HEADER_LEN {
                pcm.extend_from_slice(&audio_chunk[WAV_HEADER_LEN..]);
            }
        }

        Ok(Self::pcm_to_audio(&pcm, sample_rate))
    }

    // LINEAR16 is little-endian 16-bit mono PCM
    fn pcm_to_audio(pcm: &[u8], sample_rate: u32) -> SpeechAudio {
        let mut buf = pcm;
        let mut samples = Vec::with_capacity(pcm.len() / 2);
        while buf.remaining() >= 2 {
            samples.push(buf.get_i16_le());
        }
        SpeechAudio {
            samples,
            sample_rate,
        }
    }

    /// List available voice identities
    pub async fn fetch_voices(&self) -> Result<Vec<String>, ProviderError> {
        let api_url = format!("{}/tts/v1/voices", self.endpoint);

        let response = self.client.get(&api_url)
            .header("Authorization", format!("Basic {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to query Inworld voices: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Inworld API error ({}): {}", status, error_text);
            return Err(classify_status(status.as_u16(), error_text));
        }

        let listing = response.json::<VoicesResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Inworld voices response: {}", e)))?;

        Ok(listing.voices.into_iter().map(|v| v.voice_id).collect())
    }
}

#[async_trait]
impl Provider for Inworld {
    type Request = InworldRequest;
    type Response = SpeechAudio;

    async fn synthesize(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        Inworld::synthesize(self, request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.fetch_voices().await.map(|_| ())
    }

    fn extract_audio(response: &Self::Response) -> SpeechAudio {
        response.clone()
    }
}
