/*!
 * Tests for provider request building and style mapping
 */

use threadvox::providers::elevenlabs::ElevenLabsRequest;
use threadvox::providers::inworld::InworldRequest;
use threadvox::providers::StyleDirectives;
use threadvox::synthesis::cache::fingerprint;
use threadvox::tags::TagParser;

fn span_styles(markup: &str) -> StyleDirectives {
    let spans = TagParser::parse(markup);
    StyleDirectives::from_span(&spans[0])
}

#[test]
fn test_style_directives_fromPlainSpan_shouldBePlain() {
    let style = span_styles("no markup at all");

    assert!(style.is_plain());
    assert!(style.keywords().is_empty());
}

#[test]
fn test_style_directives_fromTaggedSpan_shouldFillCategorySlots() {
    let style = span_styles("[excited][whispers]hello[/whispers][/excited]");

    assert_eq!(style.emotion.as_deref(), Some("excited"));
    assert_eq!(style.delivery.as_deref(), Some("whispers"));
    assert!(style.reaction.is_none());
    assert_eq!(style.keywords(), vec!["excited", "whispers"]);
}

#[test]
fn test_elevenlabs_request_withPlainStyle_shouldLeaveTextUntouched() {
    let request = ElevenLabsRequest::new("v1", "hello there", "eleven_v3")
        .with_style(&StyleDirectives::default());

    assert_eq!(request.text(), "hello there");
    assert_eq!(request.voice_id(), "v1");
}

#[test]
fn test_elevenlabs_request_withDirectives_shouldPrefixInlineAudioTags() {
    let style = span_styles("[excited][gunshot]run![/gunshot][/excited]");
    let request = ElevenLabsRequest::new("v1", "run!", "eleven_v3").with_style(&style);

    assert_eq!(request.text(), "[excited] [gunshot] run!");
}

#[test]
fn test_inworld_request_shouldCarryRequestedSampleRate() {
    let request = InworldRequest::new("voice-a", "bonjour", "inworld-tts-1", 48000);

    assert_eq!(request.sample_rate(), 48000);
}

#[test]
fn test_fingerprint_shouldSeparateTextVoiceAndStyle() {
    let plain = StyleDirectives::default();
    let styled = span_styles("[sad]x[/sad]");

    let base = fingerprint("hello", "v1", &plain);

    assert_eq!(base, fingerprint("hello", "v1", &plain));
    assert_ne!(base, fingerprint("hello!", "v1", &plain));
    assert_ne!(base, fingerprint("hello", "v2", &plain));
    assert_ne!(base, fingerprint("hello", "v1", &styled));
}
