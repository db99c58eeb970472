/*!
 * Timeline assembly.
 *
 * Orders synthesized clips strictly by authored sequence, inserts the
 * configured silence gap between turns, and concatenates everything into one
 * uniform-format audio stream. Clips inside a turn run back to back so one
 * author's sentence flow is preserved. A clip whose sample rate disagrees
 * with the rest of the timeline aborts the run: silently corrupted audio is
 * worse than a failed run.
 */

use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use log::debug;

use crate::errors::AssemblyError;
use crate::tags::StyledSpan;
use crate::thread_processor::AuthoredItem;
use crate::providers::SpeechAudio;

/// One synthesized audio segment
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// 16-bit mono PCM samples
    pub samples: Vec<i16>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// The styled span this clip speaks (empty for silence placeholders)
    pub source_span: StyledSpan,
}

impl AudioClip {
    /// Wrap provider audio with its source span
    pub fn from_audio(audio: SpeechAudio, source_span: StyledSpan) -> Self {
        Self {
            samples: audio.samples,
            sample_rate: audio.sample_rate,
            source_span,
        }
    }

    /// A silence clip of the given duration
    pub fn silence(sample_rate: u32, duration: Duration) -> Self {
        let sample_count = (duration.as_secs_f64() * sample_rate as f64).round() as usize;
        Self {
            samples: vec![0; sample_count],
            sample_rate,
            source_span: StyledSpan::plain(""),
        }
    }

    /// Duration of the clip
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Whether the clip holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One authored item's ordered clips
#[derive(Debug)]
pub struct Turn {
    /// The authored item this turn narrates
    pub item: AuthoredItem,

    /// Clips in span order
    pub clips: Vec<AudioClip>,
}

/// The assembled narration, consumed exactly once to produce the artifact
#[derive(Debug)]
pub struct Timeline {
    samples: Vec<i16>,
    sample_rate: u32,

    /// Number of clips placed
    pub clip_count: usize,

    /// Number of inter-turn gaps inserted
    pub gap_count: usize,
}

impl Timeline {
    /// Sample rate of the assembled stream
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total duration of the assembled stream
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// The assembled samples, consuming the timeline
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// Borrow the assembled samples (tests)
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Write the timeline to a 16-bit mono WAV file, consuming it
    pub fn write_wav<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let path = path.as_ref();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create output file: {:?}", path))?;

        for sample in &self.samples {
            writer.write_sample(*sample)?;
        }
        writer
            .finalize()
            .with_context(|| format!("Failed to finalize output file: {:?}", path))?;

        debug!("Wrote {:?} ({} Hz)", path, spec.sample_rate);
        Ok(())
    }
}

/// Assembles ordered turns into one timeline
pub struct TimelineAssembler {
    /// Silence inserted between two authored items
    turn_gap: Duration,
}

impl TimelineAssembler {
    /// Create an assembler with the given inter-turn gap
    pub fn new(turn_gap_ms: u64) -> Self {
        Self {
            turn_gap: Duration::from_millis(turn_gap_ms),
        }
    }

    /// Concatenate turns in order into one timeline.
    ///
    /// Clips within a turn are back to back; the configured gap separates
    /// adjacent turns regardless of author repetition. All clips must share
    /// one sample rate; zero turns or zero clips is fatal.
    pub fn assemble(&self, turns: &[Turn]) -> Result<Timeline, AssemblyError> {
        if turns.is_empty() {
            return Err(AssemblyError::EmptyInput);
        }

        let sample_rate = turns
            .iter()
            .flat_map(|t| t.clips.iter())
            .map(|c| c.sample_rate)
            .next()
            .ok_or(AssemblyError::EmptyInput)?;

        // Verify format uniformity before touching any samples
        for (turn_index, turn) in turns.iter().enumerate() {
            for clip in &turn.clips {
                if clip.sample_rate != sample_rate {
                    return Err(AssemblyError::FormatMismatch {
                        expected: sample_rate,
                        found: clip.sample_rate,
                        turn: turn_index,
                    });
                }
            }
        }

        let gap_samples = (self.turn_gap.as_secs_f64() * sample_rate as f64).round() as usize;

        let mut samples = Vec::new();
        let mut clip_count = 0usize;
        let mut gap_count = 0usize;

        for (turn_index, turn) in turns.iter().enumerate() {
            if turn_index > 0 {
                samples.extend(std::iter::repeat_n(0i16, gap_samples));
                gap_count += 1;
            }
            for clip in &turn.clips {
                samples.extend_from_slice(&clip.samples);
                clip_count += 1;
            }
        }

        Ok(Timeline {
            samples,
            sample_rate,
            clip_count,
            gap_count,
        })
    }
}
