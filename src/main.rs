// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Result, anyhow, Context};
use log::{LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::app_config::{Config, TtsProvider};
use app_controller::Controller;

mod app_config;
mod file_utils;
mod thread_processor;
mod tags;
mod voice_registry;
mod voice_store;
mod synthesis;
mod providers;
mod app_controller;
mod errors;

/// CLI Wrapper for TtsProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTtsProvider {
    ElevenLabs,
    Inworld,
}

impl From<CliTtsProvider> for TtsProvider {
    fn from(cli_provider: CliTtsProvider) -> Self {
        match cli_provider {
            CliTtsProvider::ElevenLabs => TtsProvider::ElevenLabs,
            CliTtsProvider::Inworld => TtsProvider::Inworld,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Narrate a thread file with AI voices (default command)
    Narrate(NarrateArgs),

    /// Generate shell completions for threadvox
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct NarrateArgs {
    /// Input thread JSON file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output directory for the narration artifact (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Synthesis provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTtsProvider>,

    /// Model name to use for synthesis
    #[arg(short, long)]
    model: Option<String>,

    /// Voice pool size
    #[arg(short = 'n', long)]
    voice_pool_size: Option<usize>,

    /// Silence between authored items, in milliseconds
    #[arg(short = 'g', long)]
    turn_gap_ms: Option<u64>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// threadvox - Thread narration with AI voices
///
/// Turns authored social-media threads into one narrated audio file where
/// each author speaks with a consistent synthetic voice and inline cues
/// become expressive speech styling.
#[derive(Parser, Debug)]
#[command(name = "threadvox")]
#[command(author = "threadvox Team")]
#[command(version = "1.0.0")]
#[command(about = "AI-voiced narration for social-media threads")]
#[command(long_about = "threadvox loads a thread export (Reddit comments, tweet transcripts) and
narrates it with AI voices, one consistent voice per author.

EXAMPLES:
    threadvox thread.json                       # Narrate using default config
    threadvox -f thread.json                    # Force overwrite existing output
    threadvox -p inworld thread.json            # Use a specific provider
    threadvox -n 4 thread.json                  # Limit the voice pool to 4 voices
    threadvox -g 800 thread.json                # 800 ms of silence between turns
    threadvox --log-level debug /threads/       # Process a directory with debug logging
    threadvox completions bash > threadvox.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    elevenlabs - ElevenLabs API (requires ELEVENLABS_API_KEY)
    inworld    - Inworld API (requires INWORLD_API_TOKEN)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input thread JSON file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output directory for the narration artifact (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Synthesis provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTtsProvider>,

    /// Model name to use for synthesis
    #[arg(short, long)]
    model: Option<String>,

    /// Voice pool size
    #[arg(short = 'n', long)]
    voice_pool_size: Option<usize>,

    /// Silence between authored items, in milliseconds
    #[arg(short = 'g', long)]
    turn_gap_ms: Option<u64>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");

            let mut stderr = std::io::stderr();
            let emoji = Self::get_emoji_for_level(record.level());
            let _ = match record.level() {
                Level::Error => writeln!(stderr, "\x1B[1;31m{} {} {}\x1B[0m", now, emoji, record.args()),
                Level::Warn => writeln!(stderr, "\x1B[1;33m{} {} {}\x1B[0m", now, emoji, record.args()),
                Level::Info => writeln!(stderr, "\x1B[1;32m{} {} {}\x1B[0m", now, emoji, record.args()),
                Level::Debug => writeln!(stderr, "\x1B[1;36m{} {} {}\x1B[0m", now, emoji, record.args()),
                Level::Trace => writeln!(stderr, "\x1B[1;35m{} {} {}\x1B[0m", now, emoji, record.args()),
            };
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "threadvox", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Narrate(args)) => run_narrate(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            let narrate_args = NarrateArgs {
                input_path,
                output_dir: cli.output_dir,
                force_overwrite: cli.force_overwrite,
                provider: cli.provider,
                model: cli.model,
                voice_pool_size: cli.voice_pool_size,
                turn_gap_ms: cli.turn_gap_ms,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_narrate(narrate_args).await
        }
    }
}

async fn run_narrate(options: NarrateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter_for(&config_log_level));
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        // Load existing configuration
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader::<_, Config>(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        // Write a default configuration so the user has something to edit
        let config = Config::default();
        let serialized = serde_json::to_string_pretty(&config)?;
        std::fs::write(config_path, serialized)
            .context(format!("Failed to write default config file: {}", config_path))?;
        config
    };

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.tts.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        let provider_str = config.tts.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .tts
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model.clone();
        }
    }

    if let Some(pool_size) = options.voice_pool_size {
        config.voices.pool_size = pool_size;
    }

    if let Some(turn_gap_ms) = options.turn_gap_ms {
        config.playback.turn_gap_ms = turn_gap_ms;
    }

    // Apply the config's log level unless the CLI already set one
    if options.log_level.is_none() {
        log::set_max_level(level_filter_for(&config.log_level));
    }

    let controller = Controller::with_config(config)?;

    let input_path = options.input_path;
    if input_path.is_dir() {
        controller.run_folder(input_path, options.force_overwrite).await
    } else {
        let output_dir = options
            .output_dir
            .or_else(|| input_path.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        controller.run(input_path, output_dir, options.force_overwrite).await
    }
}

fn level_filter_for(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}
