/*!
 * Tests for expressive tag parsing
 */

use threadvox::tags::{lookup_keyword, StyledSpan, TagCategory, TagParser};

/// Concatenated span text must equal the input with recognized markup removed
fn round_trip(input: &str, expected_spoken: &str) {
    let spans = TagParser::parse(input);
    let spoken: String = spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(spoken, expected_spoken, "round trip failed for {:?}", input);
}

#[test]
fn test_parse_withPairedEmotionTag_shouldYieldStyledAndPlainSpans() {
    let spans = TagParser::parse("[excited]Great game![/excited] see you tomorrow");

    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].text, "Great game!");
    assert_eq!(spans[0].tags.len(), 1);
    assert_eq!(spans[0].tags[0].category, TagCategory::Emotion);
    assert_eq!(spans[0].tags[0].keyword, "excited");
    assert_eq!(spans[1].text, " see you tomorrow");
    assert!(spans[1].tags.is_empty());
}

#[test]
fn test_parse_withUnmatchedOpenTag_shouldKeepMarkerAsLiteralText() {
    let spans = TagParser::parse("[whispers] be very quiet");

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, "[whispers] be very quiet");
    assert!(spans[0].tags.is_empty());
}

#[test]
fn test_parse_withUnmatchedCloseTag_shouldKeepMarkerAsLiteralText() {
    let spans = TagParser::parse("so loud [/shouts] right");

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, "so loud [/shouts] right");
    assert!(spans[0].tags.is_empty());
}

#[test]
fn test_parse_withUnknownBracketedToken_shouldTreatAsLiteralText() {
    let spans = TagParser::parse("[banana]not a tag[/banana]");

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, "[banana]not a tag[/banana]");
    assert!(spans[0].tags.is_empty());
}

#[test]
fn test_parse_withCaseInsensitiveKeyword_shouldMatchPair() {
    let spans = TagParser::parse("[Excited]yes![/EXCITED]");

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, "yes!");
    assert_eq!(spans[0].tags[0].keyword, "excited");
}

#[test]
fn test_parse_withMultiWordKeyword_shouldRecognizeDirective() {
    let spans = TagParser::parse("[clears throat]ahem[/clears throat] okay");

    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].text, "ahem");
    assert_eq!(spans[0].tags[0].category, TagCategory::Reaction);
    assert_eq!(spans[0].tags[0].keyword, "clears throat");
    assert_eq!(spans[1].text, " okay");
}

#[test]
fn test_parse_withSameCategoryNesting_shouldDemoteInnerOpenToLiteral() {
    // "sad" is already active, so the inner "excited" open (same category)
    // stays in the spoken text, as does its now-unmatched close
    let spans = TagParser::parse("[sad]a [excited]b[/excited] c[/sad]");

    let spoken: String = spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(spoken, "a [excited]b[/excited] c");
    for span in &spans {
        assert_eq!(span.tags.len(), 1);
        assert_eq!(span.tags[0].keyword, "sad");
    }
}

#[test]
fn test_parse_withDifferentCategoryOverlap_shouldApplyBothDirectives() {
    let spans = TagParser::parse("[sad]x [whispers]y[/sad] z[/whispers]");

    assert_eq!(spans.len(), 3);
    assert_eq!(spans[0].text, "x ");
    assert_eq!(spans[0].tags.len(), 1);
    assert_eq!(spans[0].tags[0].keyword, "sad");

    assert_eq!(spans[1].text, "y");
    assert_eq!(spans[1].tags.len(), 2);
    let keywords: Vec<&str> = spans[1].tags.iter().map(|t| t.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["sad", "whispers"]);

    assert_eq!(spans[2].text, " z");
    assert_eq!(spans[2].tags.len(), 1);
    assert_eq!(spans[2].tags[0].keyword, "whispers");
}

#[test]
fn test_parse_withAdjacentMarkers_shouldNotEmitEmptySpans() {
    let spans = TagParser::parse("[excited][whispers]hey[/whispers][/excited]");

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, "hey");
    assert_eq!(spans[0].tags.len(), 2);
}

#[test]
fn test_parse_withEmptyInput_shouldYieldNoSpans() {
    assert!(TagParser::parse("").is_empty());
}

#[test]
fn test_parse_withPlainText_shouldYieldSingleSpan() {
    let spans = TagParser::parse("just words here");

    assert_eq!(spans, vec![StyledSpan::plain("just words here")]);
}

#[test]
fn test_parse_withSoundEffectPair_shouldStripMarkup() {
    let spans = TagParser::parse("then [gunshot]bang[/gunshot] happened");

    assert_eq!(spans.len(), 3);
    assert_eq!(spans[1].text, "bang");
    assert_eq!(spans[1].tags[0].category, TagCategory::SoundEffect);
}

#[test]
fn test_parse_tagOffsets_shouldCoverFullSpanText() {
    let spans = TagParser::parse("[tired]a long sentence[/tired]");

    assert_eq!(spans.len(), 1);
    let tag = &spans[0].tags[0];
    assert_eq!(tag.start, 0);
    assert_eq!(tag.end, spans[0].text.len());
}

#[test]
fn test_parse_roundTrip_overContent() {
    // Recognized paired markup disappears; everything else survives verbatim
    round_trip("plain text, no tags at all", "plain text, no tags at all");
    round_trip("[excited]Great game![/excited] see you", "Great game! see you");
    round_trip("[whispers] unclosed stays", "[whispers] unclosed stays");
    round_trip("[sad]a[/sad][sad]b[/sad]", "ab");
    round_trip(
        "[strong French accent]bonjour[/strong French accent]!",
        "bonjour!",
    );
    round_trip("mixed [nope] and [sighs]ugh[/sighs]", "mixed [nope] and ugh");
    round_trip("[]", "[]");
    round_trip("a [ b ] c", "a [ b ] c");
}

#[test]
fn test_lookup_keyword_withVocabulary_shouldClassifyCategories() {
    assert_eq!(lookup_keyword("excited").unwrap().0, TagCategory::Emotion);
    assert_eq!(lookup_keyword("robotically").unwrap().0, TagCategory::Delivery);
    assert_eq!(lookup_keyword("giggles").unwrap().0, TagCategory::Reaction);
    assert_eq!(lookup_keyword("distant echo").unwrap().0, TagCategory::SoundEffect);
    assert_eq!(lookup_keyword("sings").unwrap().0, TagCategory::AccentStyle);
    assert_eq!(lookup_keyword("Strong French Accent").unwrap().0, TagCategory::AccentStyle);
    assert!(lookup_keyword("banana").is_none());
}
