/*!
 * Concurrent synthesis dispatch.
 *
 * Fans styled-span jobs out to the synthesis service with bounded
 * parallelism and gathers the results back into authored order. Each job
 * carries its position, so out-of-order completion of the underlying network
 * calls can never reorder the output audio. Span-level failures are demoted
 * to silence outcomes here; nothing in this module aborts the run.
 */

use anyhow::Result;
use log::warn;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::Semaphore;
use futures::stream::{self, StreamExt};

use crate::tags::StyledSpan;
use super::core::{LogEntry, SynthesisService, SynthUsageStats};
use super::timeline::AudioClip;

/// One unit of synthesis work: a styled span bound to a voice and position
#[derive(Debug, Clone)]
pub struct SpanJob {
    /// Index of the authored item this span belongs to
    pub item_index: usize,

    /// Index of the span within its item
    pub span_index: usize,

    /// Sequence index of the authored item (playback order)
    pub sequence_index: usize,

    /// The span to synthesize
    pub span: StyledSpan,

    /// The voice the span is bound to
    pub voice_id: String,
}

/// Result of one span job
#[derive(Debug)]
pub enum SpanOutcome {
    /// Synthesis produced a clip
    Clip(AudioClip),

    /// Synthesis failed terminally; the orchestrator substitutes silence
    Silence {
        /// Why the span could not be synthesized
        reason: String,
    },
}

impl SpanOutcome {
    /// Whether this outcome is a silence substitution
    pub fn is_silence(&self) -> bool {
        matches!(self, Self::Silence { .. })
    }
}

/// Dispatcher running span jobs with bounded parallelism
pub struct SynthesisDispatcher {
    /// The synthesis service to use
    service: Arc<SynthesisService>,

    /// Maximum number of concurrent requests
    max_concurrent_requests: usize,
}

impl SynthesisDispatcher {
    /// Create a new dispatcher over a shared synthesis service
    pub fn new(service: Arc<SynthesisService>) -> Self {
        Self {
            max_concurrent_requests: service.options.max_concurrent_requests.max(1),
            service,
        }
    }

    /// Run all jobs and return (job, outcome) pairs in job order.
    ///
    /// Jobs run concurrently up to the configured limit; the returned vector
    /// is sorted by dispatch index regardless of completion order. Dropping
    /// the returned future abandons all in-flight requests.
    pub async fn synthesize_all(
        &self,
        jobs: Vec<SpanJob>,
        log_capture: Arc<StdMutex<Vec<LogEntry>>>,
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Result<(Vec<(SpanJob, SpanOutcome)>, SynthUsageStats)> {
        let mut stats = SynthUsageStats::with_provider_info(
            self.service.config.provider.to_string(),
            self.service.config.get_model(),
        );

        // Create a semaphore to limit concurrent requests
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));

        // Track progress
        let total_jobs = jobs.len();
        let processed_jobs = Arc::new(AtomicUsize::new(0));

        // Process jobs concurrently
        let results = stream::iter(jobs.into_iter().enumerate())
            .map(|(job_index, job)| {
                let service = self.service.clone();
                let semaphore = semaphore.clone();
                let log_capture = log_capture.clone();
                let processed_jobs = processed_jobs.clone();
                let progress_callback = progress_callback.clone();

                async move {
                    // Acquire a permit from the semaphore
                    let _permit = semaphore.acquire().await.unwrap();

                    let start_time = Instant::now();
                    let result = service.synthesize_span(&job.span, &job.voice_id).await;
                    let api_duration = start_time.elapsed();

                    // Update progress
                    let current = processed_jobs.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(current, total_jobs);

                    let outcome = match result {
                        Ok(clip) => {
                            let mut logs = log_capture.lock().unwrap();
                            logs.push(LogEntry {
                                level: "INFO".to_string(),
                                message: format!(
                                    "Span {}/{} of item {} completed in {:?}",
                                    job.span_index + 1,
                                    total_jobs,
                                    job.sequence_index,
                                    api_duration
                                ),
                            });
                            SpanOutcome::Clip(clip)
                        }
                        Err(e) => {
                            let reason = e.to_string();
                            warn!(
                                "Substituting silence for span {} of item {}: {}",
                                job.span_index, job.sequence_index, reason
                            );
                            let mut logs = log_capture.lock().unwrap();
                            logs.push(LogEntry {
                                level: "WARN".to_string(),
                                message: format!(
                                    "Silence substituted for span {} of item {}: {}",
                                    job.span_index, job.sequence_index, reason
                                ),
                            });
                            SpanOutcome::Silence { reason }
                        }
                    };

                    (job_index, job, outcome, api_duration)
                }
            })
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        // Sort results by dispatch index to restore authored order
        let mut sorted_results = results;
        sorted_results.sort_by_key(|(idx, _, _, _)| *idx);

        let mut ordered = Vec::with_capacity(sorted_results.len());
        for (_, job, outcome, api_duration) in sorted_results {
            if let SpanOutcome::Clip(clip) = &outcome {
                stats.add_span(job.span.text.chars().count(), clip.duration(), api_duration);
            }
            ordered.push((job, outcome));
        }

        Ok((ordered, stats))
    }
}
