use anyhow::{Result, Context};
use log::{error, warn, info, debug};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use indicatif::{ProgressBar, ProgressStyle, MultiProgress};
use uuid::Uuid;

use crate::app_config::Config;
use crate::errors::AssemblyError;
use crate::file_utils::FileManager;
use crate::synthesis::{
    LogEntry, SpanJob, SpanOutcome, SynthesisDispatcher, SynthesisService, SynthUsageStats,
    Timeline, TimelineAssembler, Turn,
};
use crate::tags::TagParser;
use crate::thread_processor::ThreadCollection;
use crate::voice_registry::VoiceRegistry;
use crate::voice_store::VoiceStore;

// @module: Application controller for thread narration

/// Outcome of one completed pipeline run
#[derive(Debug)]
pub struct NarrationReport {
    /// Run identifier
    pub run_id: String,

    /// Authored items narrated
    pub items: usize,

    /// Spans dispatched to synthesis
    pub spans_total: usize,

    /// Spans replaced by silence placeholders
    pub spans_silenced: usize,

    /// Duration of the assembled narration
    pub audio_duration: std::time::Duration,

    /// API usage accumulated over the run
    pub usage: SynthUsageStats,
}

/// Main application controller for thread narration
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.voices.pool.is_empty() || self.config.voices.pool_size > 0
    }

    /// Run the main workflow with an input thread file and output directory
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(input_file, output_dir, &multi_progress, force_overwrite).await
    }

    /// Run the controller with progress reporting
    async fn run_with_progress(
        &self,
        input_file: PathBuf,
        output_dir: PathBuf,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<()> {
        // Start timing the process
        let start_time = std::time::Instant::now();

        // Check if the input file exists
        if !input_file.exists() {
            return Err(anyhow::anyhow!("Input file does not exist: {:?}", input_file));
        }

        // Ensure the output directory exists
        FileManager::ensure_dir(&output_dir)?;

        // Check if a narration already exists
        let output_path = FileManager::generate_output_path(&input_file, &output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, narration already exists (use -f to force overwrite)");
            return Ok(());
        }

        // Load the thread
        let thread = ThreadCollection::from_json_file(&input_file)?;
        if thread.is_empty() {
            return Err(AssemblyError::EmptyInput.into());
        }
        info!(
            "Loaded {} items from {} authors",
            thread.items.len(),
            thread.distinct_author_count()
        );

        // Build the synthesis service
        self.config.validate()?;
        let service = Arc::new(SynthesisService::new(self.config.tts.clone())?);

        // Resolve the voice pool: explicit config pool, or drawn from the provider
        let pool = if !self.config.voices.pool.is_empty() {
            self.config.voices.pool.clone()
        } else {
            service.fetch_voice_pool(self.config.voices.pool_size).await?
        };
        let registry = VoiceRegistry::new(pool, self.config.voices.recency_window)?;

        // Optionally preload persisted assignments so authors keep their voices
        let store = if self.config.voices.persist_assignments {
            let store = match &self.config.voices.store_path {
                Some(path) => VoiceStore::open(path)?,
                None => VoiceStore::open_default()?,
            };
            registry.preload(&store.load_all()?);
            Some(store)
        } else {
            None
        };

        // Narrate
        let (timeline, report) = self
            .run_pipeline(service, &registry, &thread, multi_progress, &output_dir)
            .await?;

        // A completed run always yields exactly one artifact
        timeline.write_wav(&output_path)?;
        info!("Success: {}", output_path.display());

        // Record this run's assignments for future runs
        if let Some(store) = store {
            store.record_all(&registry.assignments(), &report.run_id)?;
            debug!("Recorded {} voice assignments", registry.assignments().len());
        }

        if report.spans_silenced > 0 {
            warn!(
                "{} of {} spans were replaced by silence",
                report.spans_silenced, report.spans_total
            );
        }

        info!(
            "Narration complete: {} items, {:.1} s of audio in {}",
            report.items,
            report.audio_duration.as_secs_f64(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(())
    }

    /// Drive the full pipeline over a loaded thread.
    ///
    /// Resolves voices, parses tags, dispatches synthesis with bounded
    /// concurrency, and assembles the timeline. Span failures become silence
    /// placeholders; only assembly-level errors (or an empty thread) abort.
    pub async fn run_pipeline(
        &self,
        service: Arc<SynthesisService>,
        registry: &VoiceRegistry,
        thread: &ThreadCollection,
        multi_progress: &MultiProgress,
        output_dir: &std::path::Path,
    ) -> Result<(Timeline, NarrationReport)> {
        if thread.is_empty() {
            return Err(AssemblyError::EmptyInput.into());
        }

        let run_id = Uuid::new_v4().to_string();

        // Build one job per styled span, in authored order
        let mut jobs: Vec<SpanJob> = Vec::new();
        for (item_index, item) in thread.items.iter().enumerate() {
            let voice_id = registry.assign(&item.author_id, item.sequence_index);
            let spans = TagParser::parse(&item.text);
            for (span_index, span) in spans.into_iter().enumerate() {
                jobs.push(SpanJob {
                    item_index,
                    span_index,
                    sequence_index: item.sequence_index,
                    span,
                    voice_id: voice_id.clone(),
                });
            }
        }
        let spans_total = jobs.len();

        // Create a progress bar for synthesis tracking
        let progress_bar = multi_progress.add(ProgressBar::new(spans_total as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} spans ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        info!(
            "🚀 threadvox: {} - {}",
            self.config.tts.provider.display_name(),
            self.config.tts.get_model()
        );
        info!("Synthesizing, please wait…");
        progress_bar.set_message("Synthesizing");

        // Create log capture for storing warnings during synthesis
        let log_capture: Arc<StdMutex<Vec<LogEntry>>> = Arc::new(StdMutex::new(Vec::new()));
        let log_capture_clone = Arc::clone(&log_capture);

        let dispatcher = SynthesisDispatcher::new(service.clone());

        // Clone the progress_bar for use in the callback
        let pb = progress_bar.clone();
        let (outcomes, usage) = dispatcher
            .synthesize_all(jobs, log_capture_clone, move |completed, _total| {
                pb.set_position(completed as u64);
            })
            .await?;

        // Finish and clear the progress bar so captured logs print cleanly
        progress_bar.finish_and_clear();

        // Silence placeholders use the timeline's rate, taken from the first
        // real clip so one failed span cannot skew the artifact format
        let reference_rate = outcomes
            .iter()
            .find_map(|(_, outcome)| match outcome {
                SpanOutcome::Clip(clip) => Some(clip.sample_rate),
                SpanOutcome::Silence { .. } => None,
            })
            .unwrap_or_else(|| service.sample_rate());
        let fallback = std::time::Duration::from_millis(self.config.playback.silence_fallback_ms);

        let mut turns: Vec<Turn> = thread
            .items
            .iter()
            .map(|item| Turn {
                item: item.clone(),
                clips: Vec::new(),
            })
            .collect();

        let mut spans_silenced = 0usize;
        for (job, outcome) in outcomes {
            let clip = match outcome {
                SpanOutcome::Clip(clip) => clip,
                SpanOutcome::Silence { .. } => {
                    spans_silenced += 1;
                    crate::synthesis::AudioClip::silence(reference_rate, fallback)
                }
            };
            turns[job.item_index].clips.push(clip);
        }

        // Surface captured logs now that the progress bar is gone
        let logs = log_capture.lock().unwrap().clone();
        let error_logs = logs.iter().filter(|log| log.level == "ERROR").count();
        let warning_logs = logs.iter().filter(|log| log.level == "WARN").count();
        if error_logs > 0 || warning_logs > 0 {
            info!(
                "Synthesis completed with {} errors and {} warnings.",
                error_logs, warning_logs
            );

            if log::max_level() >= log::LevelFilter::Debug {
                for log in &logs {
                    match log.level.as_str() {
                        "ERROR" => error!("{}", log.message),
                        "WARN" => warn!("{}", log.message),
                        _ => debug!("{}", log.message),
                    }
                }
            }

            let log_file_path = output_dir.join("threadvox.issues.log");
            let context = format!(
                "{} - {}",
                self.config.tts.provider.display_name(),
                self.config.tts.get_model()
            );
            let lines: Vec<String> = std::iter::once(context)
                .chain(logs.iter().map(|l| format!("{}: {}", l.level, l.message)))
                .collect();
            if let Err(e) = FileManager::append_to_log_file(&log_file_path, &lines) {
                warn!("Failed to write logs to file: {}", e);
            } else {
                info!("Logs written to {}", log_file_path.display());
            }
        }

        // Assemble strictly in authored order
        let assembler = TimelineAssembler::new(self.config.playback.turn_gap_ms);
        let timeline = assembler.assemble(&turns)?;

        if usage.spans > 0 {
            info!("🔢 {}", usage.summary());
        }

        let report = NarrationReport {
            run_id,
            items: thread.items.len(),
            spans_total,
            spans_silenced,
            audio_duration: timeline.duration(),
            usage,
        };

        Ok((timeline, report))
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Run the workflow in folder mode, processing all thread files in a directory
    /// Files that already have a narration will be skipped
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        // Start timing the process
        let start_time = std::time::Instant::now();

        // Check if the input directory exists
        if !input_dir.exists() {
            return Err(anyhow::anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        // Find all thread JSON files in the directory (recursive)
        let thread_files = FileManager::find_thread_files(&input_dir);
        if thread_files.is_empty() {
            return Err(anyhow::anyhow!("No thread files found in directory: {:?}", input_dir));
        }

        // Create multi-progress instance for multiple file processing
        let multi_progress = MultiProgress::new();

        // Create a progress bar for folder processing
        let folder_pb = multi_progress.add(ProgressBar::new(thread_files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        let mut processed = 0usize;
        let mut failed = 0usize;
        for thread_file in &thread_files {
            let output_dir = thread_file
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));

            match self
                .run_with_progress(thread_file.clone(), output_dir, &multi_progress, force_overwrite)
                .await
            {
                Ok(()) => processed += 1,
                Err(e) => {
                    error!("Error processing {:?}: {}", thread_file, e);
                    failed += 1;
                }
            }
            folder_pb.inc(1);
        }
        folder_pb.finish_and_clear();

        info!(
            "Finished processing {} files ({} failed) in {}",
            processed,
            failed,
            Self::format_duration(start_time.elapsed())
        );

        Ok(())
    }
}
