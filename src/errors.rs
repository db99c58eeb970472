/*!
 * Error types for the threadvox application.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to a TTS backend
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails (network-level)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response or decoding its audio fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Rate-limit rejection from the backend (HTTP 429)
    #[error("Rate limited by backend: {0}")]
    Throttled(String),

    /// The backend rejected the input itself (malformed or oversized text)
    #[error("Input rejected by backend: {0}")]
    InputRejected(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether a retry with backoff can possibly succeed.
    ///
    /// Throttling and transient failures are retryable; rejections of the
    /// input itself and authentication problems are terminal for the span.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Throttled(_) => true,
            Self::RequestFailed(_) => true,
            Self::ParseError(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::InputRejected(_) => false,
            Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors that can occur while synthesizing a single styled span
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// Terminal provider error (not retried)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// All retry attempts were consumed without success
    #[error("Synthesis failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// The error from the final attempt
        last: ProviderError,
    },
}

impl SynthesisError {
    /// The underlying provider error, regardless of how it got here.
    pub fn provider_error(&self) -> &ProviderError {
        match self {
            Self::Provider(e) => e,
            Self::RetriesExhausted { last, .. } => last,
        }
    }
}

/// Errors that abort timeline assembly (and the whole run)
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// A clip's sample rate disagrees with the rest of the timeline
    #[error("Sample rate mismatch in turn {turn}: expected {expected} Hz, found {found} Hz")]
    FormatMismatch {
        /// Sample rate established by the first clip
        expected: u32,
        /// Offending clip's sample rate
        found: u32,
        /// Index of the turn containing the offending clip
        turn: usize,
    },

    /// There was nothing to assemble
    #[error("No authored items supplied, nothing to narrate")]
    EmptyInput,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a TTS provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from span synthesis
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Error from timeline assembly
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// Error in configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
