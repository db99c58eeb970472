/*!
 * Tests for timeline assembly
 */

use std::time::Duration;
use threadvox::errors::AssemblyError;
use threadvox::synthesis::{AudioClip, TimelineAssembler, Turn};
use threadvox::tags::StyledSpan;
use threadvox::thread_processor::AuthoredItem;

use crate::common;

const RATE: u32 = 16_000;

fn clip(value: i16, samples: usize) -> AudioClip {
    AudioClip::from_audio(common::flat_audio(value, samples, RATE), StyledSpan::plain("x"))
}

fn turn(author: &str, index: usize, clips: Vec<AudioClip>) -> Turn {
    Turn {
        item: AuthoredItem::new(author, "text", index),
        clips,
    }
}

#[test]
fn test_assemble_withNoTurns_shouldFailWithEmptyInput() {
    let assembler = TimelineAssembler::new(100);

    let result = assembler.assemble(&[]);

    assert!(matches!(result, Err(AssemblyError::EmptyInput)));
}

#[test]
fn test_assemble_withThreeTurns_shouldInsertExactlyTwoGaps() {
    // 100 ms at 16 kHz is 1600 samples of silence per gap
    let assembler = TimelineAssembler::new(100);
    let turns = vec![
        turn("alice", 0, vec![clip(1, 100)]),
        turn("bob", 1, vec![clip(2, 100)]),
        turn("alice", 2, vec![clip(3, 100)]),
    ];

    let timeline = assembler.assemble(&turns).unwrap();

    assert_eq!(timeline.gap_count, 2);
    assert_eq!(timeline.clip_count, 3);
    assert_eq!(timeline.samples().len(), 3 * 100 + 2 * 1600);
}

#[test]
fn test_assemble_shouldPlaceClipsInTurnOrderWithGapsBetween() {
    let assembler = TimelineAssembler::new(100);
    let turns = vec![
        turn("alice", 0, vec![clip(1, 10)]),
        turn("bob", 1, vec![clip(2, 10)]),
    ];

    let timeline = assembler.assemble(&turns).unwrap();
    let samples = timeline.samples();

    assert!(samples[..10].iter().all(|&s| s == 1));
    assert!(samples[10..10 + 1600].iter().all(|&s| s == 0));
    assert!(samples[10 + 1600..].iter().all(|&s| s == 2));
}

#[test]
fn test_assemble_withinTurn_shouldConcatenateClipsWithoutGap() {
    let assembler = TimelineAssembler::new(250);
    let turns = vec![turn("alice", 0, vec![clip(1, 10), clip(2, 10), clip(3, 10)])];

    let timeline = assembler.assemble(&turns).unwrap();
    let samples = timeline.samples();

    assert_eq!(samples.len(), 30);
    assert_eq!(timeline.gap_count, 0);
    assert!(samples[..10].iter().all(|&s| s == 1));
    assert!(samples[10..20].iter().all(|&s| s == 2));
    assert!(samples[20..30].iter().all(|&s| s == 3));
}

#[test]
fn test_assemble_withZeroGapConfigured_shouldAddNoSilence() {
    let assembler = TimelineAssembler::new(0);
    let turns = vec![
        turn("alice", 0, vec![clip(1, 10)]),
        turn("bob", 1, vec![clip(2, 10)]),
    ];

    let timeline = assembler.assemble(&turns).unwrap();

    assert_eq!(timeline.samples().len(), 20);
    assert_eq!(timeline.gap_count, 1);
}

#[test]
fn test_assemble_withMismatchedSampleRate_shouldAbort() {
    let assembler = TimelineAssembler::new(100);
    let odd_clip = AudioClip::from_audio(
        common::flat_audio(9, 50, 22_050),
        StyledSpan::plain("x"),
    );
    let turns = vec![
        turn("alice", 0, vec![clip(1, 100)]),
        turn("bob", 1, vec![odd_clip]),
    ];

    let result = assembler.assemble(&turns);

    match result {
        Err(AssemblyError::FormatMismatch { expected, found, turn }) => {
            assert_eq!(expected, RATE);
            assert_eq!(found, 22_050);
            assert_eq!(turn, 1);
        }
        other => panic!("Expected FormatMismatch, got {:?}", other),
    }
}

#[test]
fn test_assemble_withOnlyEmptyTurns_shouldFailWithEmptyInput() {
    let assembler = TimelineAssembler::new(100);
    let turns = vec![turn("alice", 0, Vec::new())];

    assert!(matches!(
        assembler.assemble(&turns),
        Err(AssemblyError::EmptyInput)
    ));
}

#[test]
fn test_silence_clip_shouldRoundDurationToSamples() {
    let silence = AudioClip::silence(RATE, Duration::from_millis(250));

    assert_eq!(silence.samples.len(), 4000);
    assert_eq!(silence.duration(), Duration::from_millis(250));
    assert!(silence.samples.iter().all(|&s| s == 0));
}

#[test]
fn test_timeline_duration_shouldReflectSampleCount() {
    let assembler = TimelineAssembler::new(0);
    let turns = vec![turn("alice", 0, vec![clip(1, RATE as usize)])];

    let timeline = assembler.assemble(&turns).unwrap();

    assert_eq!(timeline.duration(), Duration::from_secs(1));
    assert_eq!(timeline.sample_rate(), RATE);
}

#[test]
fn test_write_wav_shouldProduceReadableMonoFile() {
    let assembler = TimelineAssembler::new(0);
    let turns = vec![turn("alice", 0, vec![clip(7, 123)])];
    let timeline = assembler.assemble(&turns).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("narration.wav");
    timeline.write_wav(&path).unwrap();

    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.len(), 123);
}
