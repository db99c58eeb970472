/*!
 * Synthesized clip caching.
 *
 * Threads are full of repeated short posts ("lol", "this"); identical span
 * text bound to the same voice and styling produces identical audio, so a
 * second synthesis call is wasted API budget. The cache is keyed by a SHA-256
 * fingerprint over (text, voice, style keywords) and scoped to one run.
 */

use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use log::debug;
use sha2::{Digest, Sha256};

use crate::providers::{SpeechAudio, StyleDirectives};

/// Fingerprint of one synthesis request
pub fn fingerprint(text: &str, voice_id: &str, style: &StyleDirectives) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0u8]);
    hasher.update(voice_id.as_bytes());
    for keyword in style.keywords() {
        hasher.update([0u8]);
        hasher.update(keyword.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Clip cache for storing and retrieving synthesized audio
pub struct ClipCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<String, SpeechAudio>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Whether caching is enabled
    enabled: bool,
}

impl ClipCache {
    /// Create a new clip cache
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            enabled,
        }
    }

    /// Get a clip from the cache
    pub fn get(&self, text: &str, voice_id: &str, style: &StyleDirectives) -> Option<SpeechAudio> {
        if !self.enabled {
            return None;
        }

        let key = fingerprint(text, voice_id, style);
        let cache = self.cache.read();

        match cache.get(&key) {
            Some(audio) => {
                let mut hits = self.hits.write();
                *hits += 1;

                debug!(
                    "Clip cache hit for '{}' (voice {})",
                    truncate_text(text, 30),
                    voice_id
                );

                Some(audio.clone())
            }
            None => {
                let mut misses = self.misses.write();
                *misses += 1;
                None
            }
        }
    }

    /// Store a clip in the cache
    pub fn store(&self, text: &str, voice_id: &str, style: &StyleDirectives, audio: &SpeechAudio) {
        if !self.enabled {
            return;
        }

        let key = fingerprint(text, voice_id, style);
        let mut cache = self.cache.write();
        cache.insert(key, audio.clone());
    }

    /// Get cache statistics
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;

        debug!("Clip cache cleared");
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for ClipCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Clone for ClipCache {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
            enabled: self.enabled,
        }
    }
}

/// Truncate text to a maximum length with ellipsis
fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_length).collect::<String>())
    }
}
