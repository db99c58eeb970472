/*!
 * Tests for the synthesis service: retry policy, caching, usage stats
 */

use std::time::Duration;
use threadvox::errors::{ProviderError, SynthesisError};
use threadvox::providers::mock::{MockProvider, MOCK_SAMPLE_RATE, SAMPLES_PER_CHAR};
use threadvox::synthesis::{SynthUsageStats, SynthesisService};
use threadvox::tags::{StyledSpan, TagParser};

use crate::common;

#[tokio::test]
async fn test_synthesize_span_withWorkingProvider_shouldReturnClip() {
    let service = SynthesisService::with_mock(MockProvider::working(), common::fast_options(3));
    let span = StyledSpan::plain("hello");

    let clip = service.synthesize_span(&span, "v1").await.unwrap();

    assert_eq!(clip.sample_rate, MOCK_SAMPLE_RATE);
    assert_eq!(clip.samples.len(), 5 * SAMPLES_PER_CHAR);
    assert_eq!(clip.source_span, span);
}

#[tokio::test]
async fn test_synthesize_span_withThrottledProvider_shouldRetryUntilSuccess() {
    let mock = MockProvider::throttled_then_success(2);
    let counter = mock.clone();
    let service = SynthesisService::with_mock(mock, common::fast_options(3));

    let clip = service
        .synthesize_span(&StyledSpan::plain("hello"), "v1")
        .await
        .unwrap();

    assert!(!clip.is_empty());
    // Two throttled attempts plus the successful third
    assert_eq!(counter.request_count(), 3);
}

#[tokio::test]
async fn test_synthesize_span_withRejectingProvider_shouldNotRetry() {
    let mock = MockProvider::rejecting();
    let counter = mock.clone();
    let service = SynthesisService::with_mock(mock, common::fast_options(3));

    let error = service
        .synthesize_span(&StyledSpan::plain("hello"), "v1")
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        SynthesisError::Provider(ProviderError::InputRejected(_))
    ));
    assert_eq!(counter.request_count(), 1);
}

#[tokio::test]
async fn test_synthesize_span_withAlwaysFailingProvider_shouldExhaustRetries() {
    let mock = MockProvider::failing();
    let counter = mock.clone();
    let service = SynthesisService::with_mock(mock, common::fast_options(2));

    let error = service
        .synthesize_span(&StyledSpan::plain("hello"), "v1")
        .await
        .unwrap_err();

    match error {
        SynthesisError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(last, ProviderError::ApiError { status_code: 500, .. }));
        }
        other => panic!("Expected RetriesExhausted, got {:?}", other),
    }
    assert_eq!(counter.request_count(), 3);
}

#[tokio::test]
async fn test_synthesize_span_withOversizedText_shouldRejectWithoutCalling() {
    let mock = MockProvider::working();
    let counter = mock.clone();
    let mut options = common::fast_options(3);
    options.max_chars_per_span = 10;
    let service = SynthesisService::with_mock(mock, options);

    let error = service
        .synthesize_span(&StyledSpan::plain("way too many characters here"), "v1")
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        SynthesisError::Provider(ProviderError::InputRejected(_))
    ));
    assert_eq!(counter.request_count(), 0);
}

#[tokio::test]
async fn test_synthesize_span_withBlankText_shouldYieldEmptyClipWithoutCalling() {
    let mock = MockProvider::working();
    let counter = mock.clone();
    let service = SynthesisService::with_mock(mock, common::fast_options(3));

    let clip = service
        .synthesize_span(&StyledSpan::plain("   "), "v1")
        .await
        .unwrap();

    assert!(clip.is_empty());
    assert_eq!(counter.request_count(), 0);
}

#[tokio::test]
async fn test_synthesize_span_withIdenticalSpans_shouldHitClipCache() {
    let mock = MockProvider::working();
    let counter = mock.clone();
    let service = SynthesisService::with_mock(mock, common::fast_options(3));
    let span = StyledSpan::plain("repeated content");

    let first = service.synthesize_span(&span, "v1").await.unwrap();
    let second = service.synthesize_span(&span, "v1").await.unwrap();

    assert_eq!(first.samples, second.samples);
    assert_eq!(counter.request_count(), 1);

    let (hits, misses, hit_rate) = service.cache.stats();
    assert_eq!(hits, 1);
    assert_eq!(misses, 1);
    assert!(hit_rate > 0.49 && hit_rate < 0.51);
}

#[tokio::test]
async fn test_synthesize_span_withDifferentVoices_shouldMissClipCache() {
    let mock = MockProvider::working();
    let counter = mock.clone();
    let service = SynthesisService::with_mock(mock, common::fast_options(3));
    let span = StyledSpan::plain("same text");

    service.synthesize_span(&span, "v1").await.unwrap();
    service.synthesize_span(&span, "v2").await.unwrap();

    assert_eq!(counter.request_count(), 2);
}

#[tokio::test]
async fn test_synthesize_span_withStyledVsPlainSpan_shouldCacheSeparately() {
    let mock = MockProvider::working();
    let counter = mock.clone();
    let service = SynthesisService::with_mock(mock, common::fast_options(3));

    let styled = TagParser::parse("[excited]same words[/excited]")
        .into_iter()
        .next()
        .unwrap();
    let plain = StyledSpan::plain("same words");
    assert_eq!(styled.text, plain.text);

    service.synthesize_span(&styled, "v1").await.unwrap();
    service.synthesize_span(&plain, "v1").await.unwrap();

    assert_eq!(counter.request_count(), 2);
}

#[tokio::test]
async fn test_fetch_voice_pool_withMockProvider_shouldReturnRequestedCount() {
    let service = SynthesisService::with_mock(MockProvider::working(), common::fast_options(0));

    let pool = service.fetch_voice_pool(3).await.unwrap();

    assert_eq!(pool, vec!["mock-voice-1", "mock-voice-2", "mock-voice-3"]);
}

#[test]
fn test_silence_clip_shouldMatchRequestedDuration() {
    let service = SynthesisService::with_mock(MockProvider::working(), common::fast_options(0));

    let clip = service.silence_clip(Duration::from_millis(500));

    assert_eq!(clip.sample_rate, MOCK_SAMPLE_RATE);
    assert_eq!(clip.samples.len(), MOCK_SAMPLE_RATE as usize / 2);
    assert!(clip.samples.iter().all(|&s| s == 0));
}

#[test]
fn test_usage_stats_addSpan_shouldAccumulate() {
    let mut stats = SynthUsageStats::with_provider_info("mock".to_string(), "mock-1".to_string());

    stats.add_span(10, Duration::from_secs(2), Duration::from_millis(500));
    stats.add_span(5, Duration::from_secs(1), Duration::from_millis(250));

    assert_eq!(stats.spans, 2);
    assert_eq!(stats.characters, 15);
    assert_eq!(stats.audio_duration, Duration::from_secs(3));
    assert_eq!(stats.api_duration, Duration::from_millis(750));

    let summary = stats.summary();
    assert!(summary.contains("mock"));
    assert!(summary.contains("Spans: 2"));
}
