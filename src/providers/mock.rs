/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds with synthetic audio
 * - `MockProvider::throttled_then_success(n)` - Rate-limited n times, then succeeds
 * - `MockProvider::rejecting()` - Always rejects the input (never retryable)
 * - `MockProvider::failing()` - Always fails with a server error
 * - `MockProvider::scheduled(f)` - Per-request delay schedule for ordering tests
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{Provider, SpeechAudio, StyleDirectives};

/// Synthetic samples emitted per input character
pub const SAMPLES_PER_CHAR: usize = 64;

/// Default sample rate of mock audio
pub const MOCK_SAMPLE_RATE: u32 = 16_000;

/// Mock request for testing
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// The text to synthesize
    pub text: String,
    /// Voice identifier
    pub voice_id: String,
    /// Expressive directives
    pub style: StyleDirectives,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with synthetic audio
    Working,
    /// Returns Throttled for the first N requests, then succeeds
    ThrottledThenSuccess { failures: usize },
    /// Fails intermittently (every Nth request) with a retryable server error
    Intermittent { fail_every: usize },
    /// Always fails with a server error
    Failing,
    /// Always rejects the input (terminal, never retried)
    Rejecting,
    /// Simulates slow responses with a fixed delay
    Slow { delay_ms: u64 },
    /// Delay taken from the schedule function, per request arrival order
    Scheduled,
}

/// Mock provider for testing synthesis behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared across clones
    request_count: Arc<AtomicUsize>,
    /// Per-request delay schedule in milliseconds (for Scheduled behavior)
    delay_schedule: Option<fn(usize) -> u64>,
    /// Sample rate of emitted audio
    sample_rate: u32,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            delay_schedule: None,
            sample_rate: MOCK_SAMPLE_RATE,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that is throttled for the first `failures` requests
    pub fn throttled_then_success(failures: usize) -> Self {
        Self::new(MockBehavior::ThrottledThenSuccess { failures })
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that always rejects the input
    pub fn rejecting() -> Self {
        Self::new(MockBehavior::Rejecting)
    }

    /// Create a mock with a fixed per-request delay
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a mock whose Nth request sleeps `schedule(n)` milliseconds.
    ///
    /// A decreasing schedule forces completion order to be the reverse of
    /// dispatch order, which is what the assembly-ordering tests need.
    pub fn scheduled(schedule: fn(usize) -> u64) -> Self {
        let mut provider = Self::new(MockBehavior::Scheduled);
        provider.delay_schedule = Some(schedule);
        provider
    }

    /// Override the sample rate of emitted audio
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Deterministic synthetic audio for a request: every sample carries the
    /// character count, so clips remain identifiable after concatenation.
    pub fn synthetic_audio(text: &str, sample_rate: u32) -> SpeechAudio {
        let chars = text.chars().count();
        SpeechAudio {
            samples: vec![chars as i16; chars * SAMPLES_PER_CHAR],
            sample_rate,
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            delay_schedule: self.delay_schedule,
            sample_rate: self.sample_rate,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = SpeechAudio;

    async fn synthesize(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(Self::synthetic_audio(&request.text, self.sample_rate)),

            MockBehavior::ThrottledThenSuccess { failures } => {
                if count < failures {
                    Err(ProviderError::Throttled(format!(
                        "Simulated rate limit (request #{})",
                        count + 1
                    )))
                } else {
                    Ok(Self::synthetic_audio(&request.text, self.sample_rate))
                }
            }

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(Self::synthetic_audio(&request.text, self.sample_rate))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Rejecting => Err(ProviderError::InputRejected(
                "Simulated input rejection".to_string(),
            )),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(Self::synthetic_audio(&request.text, self.sample_rate))
            }

            MockBehavior::Scheduled => {
                if let Some(schedule) = self.delay_schedule {
                    let delay_ms = schedule(count);
                    tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                }
                Ok(Self::synthetic_audio(&request.text, self.sample_rate))
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
            _ => Ok(()),
        }
    }

    fn extract_audio(response: &Self::Response) -> SpeechAudio {
        response.clone()
    }
}
