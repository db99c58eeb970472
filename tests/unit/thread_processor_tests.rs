/*!
 * Tests for thread loading and ordering
 */

use std::path::PathBuf;
use threadvox::thread_processor::{AuthoredItem, ThreadCollection};

use crate::common;

#[test]
fn test_parse_reddit_json_withReplies_shouldFollowTraversalOrder() {
    let items = ThreadCollection::parse_reddit_json(common::reddit_export_json()).unwrap();

    assert_eq!(items.len(), 4);
    assert_eq!(items[0].author_id, "alice");
    assert_eq!(items[0].text, "Top level comment");
    assert_eq!(items[1].author_id, "bob");
    assert_eq!(items[2].author_id, "carol");
    assert_eq!(items[3].author_id, "dave");

    let indices: Vec<usize> = items.iter().map(|i| i.sequence_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[test]
fn test_parse_reddit_json_withMissingAuthors_shouldUseFallbackNames() {
    let json = r#"[
        {"comment": "orphan comment", "replies": [{"reply": "orphan reply"}]}
    ]"#;

    let items = ThreadCollection::parse_reddit_json(json).unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].author_id, "UnknownUser");
    assert_eq!(items[1].author_id, "UnknownReply");
}

#[test]
fn test_parse_reddit_json_withEmptyTexts_shouldSkipEntries() {
    let json = r#"[
        {"user_posted": "alice", "comment": "  "},
        {"user_posted": "bob", "comment": "real one", "replies": [
            {"user_replying": "carol", "reply": ""}
        ]}
    ]"#;

    let items = ThreadCollection::parse_reddit_json(json).unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].author_id, "bob");
    assert_eq!(items[0].sequence_index, 0);
}

#[test]
fn test_parse_transcript_json_withTimestamps_shouldCarryThemThrough() {
    let items = ThreadCollection::parse_transcript_json(common::transcript_json()).unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].timestamp, Some(100));
    assert_eq!(items[1].author_id, "bob");
}

#[test]
fn test_parse_json_str_shouldAutoDetectShape() {
    let reddit = ThreadCollection::parse_json_str(common::reddit_export_json()).unwrap();
    assert_eq!(reddit.len(), 4);

    let transcript = ThreadCollection::parse_json_str(common::transcript_json()).unwrap();
    assert_eq!(transcript.len(), 2);
}

#[test]
fn test_parse_json_str_withInvalidJson_shouldFail() {
    assert!(ThreadCollection::parse_json_str("not json").is_err());
    assert!(ThreadCollection::parse_json_str("{\"not\": \"an array\"}").is_err());
}

#[test]
fn test_from_items_shouldSortBySequenceIndexThenTimestamp() {
    let mut late = AuthoredItem::new("bob", "second", 1);
    late.timestamp = Some(50);
    let mut later = AuthoredItem::new("carol", "third", 1);
    later.timestamp = Some(90);
    let first = AuthoredItem::new("alice", "first", 0);

    let collection =
        ThreadCollection::from_items(PathBuf::from("t.json"), vec![later, first, late]);

    let texts: Vec<&str> = collection.items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
}

#[test]
fn test_distinct_author_count_shouldIgnoreRepeats() {
    let collection =
        ThreadCollection::from_items(PathBuf::from("t.json"), common::sample_items());

    assert_eq!(collection.distinct_author_count(), 3);
}

#[test]
fn test_new_validated_withEmptyText_shouldFail() {
    assert!(AuthoredItem::new_validated("alice", "   ", 0, None).is_err());
    assert!(AuthoredItem::new_validated("", "text", 0, None).is_err());
    assert!(AuthoredItem::new_validated("alice", "text", 0, None).is_ok());
}
