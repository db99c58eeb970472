/*!
 * Expressive tag parsing.
 *
 * Authored text carries inline cues like `[excited]...[/excited]` or
 * `[gunshot]`-style markers. This module splits raw text into styled spans:
 * contiguous runs of spoken text annotated with the expressive directives
 * active over them. Markup that is not recognized, or not correctly paired,
 * is spoken literally rather than dropped.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

// Bracketed token, open or close form. Brackets are ASCII so match
// boundaries are always valid char boundaries.
static TAG_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(/?)([^\[\]]+)\]").unwrap()
});

/// Category of an expressive directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagCategory {
    /// Overall emotional coloring of the span
    Emotion,
    /// Vocal delivery mode (whispering, shouting, ...)
    Delivery,
    /// Non-verbal vocal reaction (laughing, sighing, ...)
    Reaction,
    /// Environmental sound effect mixed into the narration
    SoundEffect,
    /// Accent or singing styling
    AccentStyle,
}

impl TagCategory {
    /// Lowercase identifier used in logs and cache fingerprints
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emotion => "emotion",
            Self::Delivery => "delivery",
            Self::Reaction => "reaction",
            Self::SoundEffect => "sound_effect",
            Self::AccentStyle => "accent_style",
        }
    }
}

impl fmt::Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// The fixed recognized vocabulary. Keys are lowercase; lookup is
// case-insensitive on the keyword, exact otherwise.
static TAG_VOCABULARY: Lazy<HashMap<&'static str, TagCategory>> = Lazy::new(|| {
    let mut vocab = HashMap::new();
    for keyword in ["curious", "crying", "excited", "sad", "tired", "sarcastic", "amazed"] {
        vocab.insert(keyword, TagCategory::Emotion);
    }
    for keyword in ["whispers", "shouts", "robotically"] {
        vocab.insert(keyword, TagCategory::Delivery);
    }
    for keyword in [
        "laughs",
        "sighs",
        "clears throat",
        "exhales",
        "wheezing",
        "snorts",
        "gasp",
        "giggles",
    ] {
        vocab.insert(keyword, TagCategory::Reaction);
    }
    for keyword in [
        "gunshot",
        "applause",
        "clapping",
        "explosion",
        "heartbeat",
        "thunder",
        "door slams",
        "rainfall",
        "distant echo",
    ] {
        vocab.insert(keyword, TagCategory::SoundEffect);
    }
    for keyword in ["strong french accent", "sings"] {
        vocab.insert(keyword, TagCategory::AccentStyle);
    }
    vocab
});

/// Look up a keyword in the recognized vocabulary.
///
/// Returns the category and the canonical (lowercase) keyword, or None for
/// any bracketed token outside the fixed set.
pub fn lookup_keyword(keyword: &str) -> Option<(TagCategory, String)> {
    let canonical = keyword.trim().to_lowercase();
    TAG_VOCABULARY
        .get(canonical.as_str())
        .map(|category| (*category, canonical))
}

/// One expressive directive attached to a styled span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanTag {
    /// Directive category
    pub category: TagCategory,

    /// Canonical keyword, e.g. "excited"
    pub keyword: String,

    /// Start offset of the styled range within the span text
    pub start: usize,

    /// End offset of the styled range within the span text
    pub end: usize,
}

/// A contiguous run of spoken text with the directives active over it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    /// Literal spoken text, markup already removed
    pub text: String,

    /// Active directives in activation order; each covers the full span text
    pub tags: Vec<SpanTag>,
}

impl StyledSpan {
    /// Create a span with no directives
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
        }
    }

    /// Whether any directive is active over this span
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Tags of one category, in activation order
    pub fn tags_in_category(&self, category: TagCategory) -> impl Iterator<Item = &SpanTag> {
        self.tags.iter().filter(move |t| t.category == category)
    }
}

// A recognized token found in the raw text
#[derive(Debug)]
struct TagToken {
    start: usize,
    end: usize,
    closing: bool,
    keyword: String,
    category: TagCategory,
}

// A confirmed open/close pair
#[derive(Debug)]
struct Directive {
    category: TagCategory,
    keyword: String,
    open_start: usize,
    open_end: usize,
    close_start: usize,
    close_end: usize,
}

/// Parser turning raw authored text into styled spans
pub struct TagParser;

impl TagParser {
    /// Parse raw text into styled spans.
    ///
    /// Concatenating the returned spans' text reproduces the input with only
    /// recognized, correctly paired markup removed. Unmatched markers and
    /// unknown bracketed tokens stay in the spoken text. Never fails.
    pub fn parse(text: &str) -> Vec<StyledSpan> {
        if text.is_empty() {
            return Vec::new();
        }

        let tokens = Self::scan_tokens(text);
        let directives = Self::pair_tokens(&tokens);

        if directives.is_empty() {
            return vec![StyledSpan::plain(text)];
        }

        Self::build_spans(text, &directives)
    }

    // Collect bracketed tokens whose keyword is in the vocabulary. Anything
    // else is literal text and never becomes a token at all.
    fn scan_tokens(text: &str) -> Vec<TagToken> {
        let mut tokens = Vec::new();
        for captures in TAG_TOKEN_REGEX.captures_iter(text) {
            let whole = captures.get(0).unwrap();
            let closing = !captures.get(1).unwrap().as_str().is_empty();
            let raw_keyword = captures.get(2).unwrap().as_str();

            if let Some((category, keyword)) = lookup_keyword(raw_keyword) {
                tokens.push(TagToken {
                    start: whole.start(),
                    end: whole.end(),
                    closing,
                    keyword,
                    category,
                });
            }
        }
        tokens
    }

    // Match opens to closes. At most one open per category may be pending:
    // a same-category open while one is pending is demoted to literal text,
    // as is a close with no matching open. Unclosed opens at end of input
    // stay literal.
    fn pair_tokens(tokens: &[TagToken]) -> Vec<Directive> {
        let mut pending: HashMap<TagCategory, &TagToken> = HashMap::new();
        let mut confirmed: Vec<Directive> = Vec::new();

        for token in tokens {
            if !token.closing {
                pending.entry(token.category).or_insert(token);
            } else {
                let matches = pending
                    .get(&token.category)
                    .is_some_and(|open| open.keyword == token.keyword);
                if matches {
                    let open = pending.remove(&token.category).unwrap();
                    confirmed.push(Directive {
                        category: token.category,
                        keyword: token.keyword.clone(),
                        open_start: open.start,
                        open_end: open.end,
                        close_start: token.start,
                        close_end: token.end,
                    });
                }
            }
        }

        confirmed.sort_by_key(|d| d.open_start);
        confirmed
    }

    // Sweep the text left to right. Each confirmed marker is a boundary:
    // its characters are removed, and the active directive set changes.
    // Consecutive segments with an identical active set merge into one span.
    fn build_spans(text: &str, directives: &[Directive]) -> Vec<StyledSpan> {
        #[derive(Debug)]
        struct MarkerEvent {
            start: usize,
            end: usize,
            directive: usize,
            opens: bool,
        }

        let mut events: Vec<MarkerEvent> = Vec::with_capacity(directives.len() * 2);
        for (idx, directive) in directives.iter().enumerate() {
            events.push(MarkerEvent {
                start: directive.open_start,
                end: directive.open_end,
                directive: idx,
                opens: true,
            });
            events.push(MarkerEvent {
                start: directive.close_start,
                end: directive.close_end,
                directive: idx,
                opens: false,
            });
        }
        events.sort_by_key(|e| e.start);

        let mut spans: Vec<StyledSpan> = Vec::new();
        // Directive indices in activation order
        let mut active: Vec<usize> = Vec::new();
        let mut cursor = 0usize;

        let flush = |segment: &str, active: &[usize], spans: &mut Vec<StyledSpan>| {
            if segment.is_empty() {
                return;
            }
            let tags_of = |active: &[usize], text_len: usize| -> Vec<SpanTag> {
                active
                    .iter()
                    .map(|&idx| SpanTag {
                        category: directives[idx].category,
                        keyword: directives[idx].keyword.clone(),
                        start: 0,
                        end: text_len,
                    })
                    .collect()
            };

            let same_set = spans.last().is_some_and(|last: &StyledSpan| {
                let mut previous: Vec<(TagCategory, &str)> = last
                    .tags
                    .iter()
                    .map(|t| (t.category, t.keyword.as_str()))
                    .collect();
                let mut current: Vec<(TagCategory, &str)> = active
                    .iter()
                    .map(|&idx| (directives[idx].category, directives[idx].keyword.as_str()))
                    .collect();
                previous.sort();
                current.sort();
                previous == current
            });

            if same_set {
                let last = spans.last_mut().unwrap();
                last.text.push_str(segment);
                let text_len = last.text.len();
                for tag in &mut last.tags {
                    tag.end = text_len;
                }
            } else {
                let text = segment.to_string();
                let tags = tags_of(active, text.len());
                spans.push(StyledSpan { text, tags });
            }
        };

        for event in &events {
            flush(&text[cursor..event.start], &active, &mut spans);
            if event.opens {
                active.push(event.directive);
            } else {
                active.retain(|&idx| idx != event.directive);
            }
            cursor = event.end;
        }
        flush(&text[cursor..], &active, &mut spans);

        spans
    }
}
