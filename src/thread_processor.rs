use std::fmt;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow, Context};
use log::{warn, debug};
use serde::Deserialize;
use serde_json::Value;

use crate::file_utils::FileManager;

// @module: Authored item loading and ordering

/// One unit of source text with a known author and playback position
#[derive(Debug, Clone)]
pub struct AuthoredItem {
    // @field: Author identity, unique per real author
    pub author_id: String,

    // @field: Raw authored text, may carry expressive markup
    pub text: String,

    // @field: Position in total playback order
    pub sequence_index: usize,

    // @field: Optional source timestamp (unix seconds), tie-breaker only
    pub timestamp: Option<i64>,
}

impl AuthoredItem {
    /// Creates a new authored item - used by tests and external consumers
    #[allow(dead_code)]
    pub fn new(author_id: impl Into<String>, text: impl Into<String>, sequence_index: usize) -> Self {
        AuthoredItem {
            author_id: author_id.into(),
            text: text.into(),
            sequence_index,
            timestamp: None,
        }
    }

    // @creates: Validated authored item
    // @validates: Non-empty author and text
    pub fn new_validated(
        author_id: impl Into<String>,
        text: impl Into<String>,
        sequence_index: usize,
        timestamp: Option<i64>,
    ) -> Result<Self> {
        let author_id = author_id.into();
        if author_id.trim().is_empty() {
            return Err(anyhow!("Empty author id for item {}", sequence_index));
        }

        let text = text.into();
        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(anyhow!("Empty text for item {}", sequence_index));
        }

        Ok(AuthoredItem {
            author_id,
            text: trimmed_text.to_string(),
            sequence_index,
            timestamp,
        })
    }
}

impl fmt::Display for AuthoredItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{} {}: {}", self.sequence_index, self.author_id, self.text)
    }
}

// Reddit export shapes, as produced by the upstream thread fetcher
#[derive(Debug, Deserialize)]
struct RedditComment {
    user_posted: Option<String>,
    comment: Option<String>,
    #[serde(default)]
    replies: Option<Vec<RedditReply>>,
}

#[derive(Debug, Deserialize)]
struct RedditReply {
    user_replying: Option<String>,
    reply: Option<String>,
}

// Generic transcript shape: a flat array of authored entries
#[derive(Debug, Deserialize)]
struct TranscriptEntry {
    author: String,
    text: String,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Collection of authored items with source metadata
#[derive(Debug)]
pub struct ThreadCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// Items in total playback order
    pub items: Vec<AuthoredItem>,
}

impl ThreadCollection {
    /// Create an empty collection for a source file
    pub fn new(source_file: PathBuf) -> Self {
        ThreadCollection {
            source_file,
            items: Vec::new(),
        }
    }

    /// Build a collection from pre-indexed items, applying the total order:
    /// sequence_index first, then timestamp, then input order (stable sort).
    pub fn from_items(source_file: PathBuf, mut items: Vec<AuthoredItem>) -> Self {
        items.sort_by_key(|item| (item.sequence_index, item.timestamp));
        ThreadCollection { source_file, items }
    }

    /// Load a thread from a JSON file, auto-detecting the export shape
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)
            .with_context(|| format!("Failed to read thread file: {:?}", path))?;

        let items = Self::parse_json_str(&content)
            .with_context(|| format!("Failed to parse thread file: {:?}", path))?;

        debug!("Loaded {} authored items from {:?}", items.len(), path);
        Ok(ThreadCollection {
            source_file: path.to_path_buf(),
            items,
        })
    }

    /// Parse thread JSON, auto-detecting Reddit export vs generic transcript
    pub fn parse_json_str(content: &str) -> Result<Vec<AuthoredItem>> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| anyhow!("Thread file is not valid JSON: {}", e))?;

        let entries = value
            .as_array()
            .ok_or_else(|| anyhow!("Thread file must contain a JSON array"))?;

        // A Reddit export entry carries "comment"/"user_posted"; a generic
        // transcript entry carries "author"/"text".
        let looks_reddit = entries
            .iter()
            .any(|entry| entry.get("comment").is_some() || entry.get("user_posted").is_some());

        if looks_reddit {
            Self::parse_reddit_json(content)
        } else {
            Self::parse_transcript_json(content)
        }
    }

    /// Parse a Reddit comment export: top-level comments each followed by
    /// their replies, traversal order defining the playback order.
    pub fn parse_reddit_json(content: &str) -> Result<Vec<AuthoredItem>> {
        let comments: Vec<RedditComment> = serde_json::from_str(content)
            .map_err(|e| anyhow!("Invalid Reddit export JSON: {}", e))?;

        let mut items = Vec::new();
        let mut skipped = 0usize;

        for comment in comments {
            let author = comment
                .user_posted
                .unwrap_or_else(|| "UnknownUser".to_string());
            match comment.comment {
                Some(text) if !text.trim().is_empty() => {
                    let index = items.len();
                    items.push(AuthoredItem::new_validated(author, text, index, None)?);
                }
                _ => skipped += 1,
            }

            for reply in comment.replies.unwrap_or_default() {
                let author = reply
                    .user_replying
                    .unwrap_or_else(|| "UnknownReply".to_string());
                match reply.reply {
                    Some(text) if !text.trim().is_empty() => {
                        let index = items.len();
                        items.push(AuthoredItem::new_validated(author, text, index, None)?);
                    }
                    _ => skipped += 1,
                }
            }
        }

        if skipped > 0 {
            warn!("Skipped {} empty entries in Reddit export", skipped);
        }

        Ok(items)
    }

    /// Parse a generic transcript: flat array of {author, text, timestamp?}
    pub fn parse_transcript_json(content: &str) -> Result<Vec<AuthoredItem>> {
        let entries: Vec<TranscriptEntry> = serde_json::from_str(content)
            .map_err(|e| anyhow!("Invalid transcript JSON: {}", e))?;

        let mut items = Vec::new();
        for entry in entries {
            if entry.text.trim().is_empty() {
                continue;
            }
            let index = items.len();
            items.push(AuthoredItem::new_validated(
                entry.author,
                entry.text,
                index,
                entry.timestamp,
            )?);
        }

        Ok(items)
    }

    /// Number of distinct authors in the thread
    pub fn distinct_author_count(&self) -> usize {
        let mut authors: Vec<&str> = self.items.iter().map(|i| i.author_id.as_str()).collect();
        authors.sort();
        authors.dedup();
        authors.len()
    }

    /// Whether the collection holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
