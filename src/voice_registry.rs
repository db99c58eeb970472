/*!
 * Voice assignment registry.
 *
 * Maps author identities to synthetic voice identities, stably within one
 * pipeline run. The first time an author is seen the registry draws the next
 * unused voice from a finite ordered pool; every later lookup returns the
 * identical voice. When distinct authors outnumber the pool, voices are
 * recycled, preferring voices that have not spoken within a recency window so
 * adjacent turns do not share a voice. The registry never fails once built:
 * with every voice locked it degrades to round-robin reuse.
 *
 * One registry instance is owned by one pipeline run and shared by reference
 * with all synthesis dispatch sites; the internal mutex serializes lookups so
 * two spans of the same author always observe the same assignment.
 */

use std::collections::HashMap;
use anyhow::{Result, anyhow};
use log::debug;
use parking_lot::Mutex;

/// A voice drawn from the pool for one author, immutable once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceAssignment {
    /// Author the voice is bound to (normalized key kept alongside)
    pub author_id: String,

    /// Voice identity from the pool
    pub voice_id: String,

    /// Sequence index of the item that triggered the assignment
    pub assigned_at_sequence_index: usize,
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Normalized author id -> assignment
    assignments: HashMap<String, VoiceAssignment>,

    /// Voice id -> last sequence index at which it spoke
    last_spoken: HashMap<String, usize>,

    /// Round-robin cursor for the all-voices-locked fallback
    next_slot: usize,
}

/// Author-to-voice allocator over a finite ordered pool
#[derive(Debug)]
pub struct VoiceRegistry {
    pool: Vec<String>,
    recency_window: usize,
    state: Mutex<RegistryState>,
}

// Consistent casing when looking up assignments, matching how author handles
// vary between fetches of the same thread.
fn normalize_author(author_id: &str) -> String {
    author_id.trim().to_lowercase()
}

impl VoiceRegistry {
    /// Create a registry over an ordered voice pool.
    ///
    /// The pool must be non-empty; duplicates are removed preserving first
    /// occurrence so pool order stays meaningful.
    pub fn new(pool: Vec<String>, recency_window: usize) -> Result<Self> {
        let mut seen = HashMap::new();
        let pool: Vec<String> = pool
            .into_iter()
            .filter(|voice| seen.insert(voice.clone(), ()).is_none())
            .collect();

        if pool.is_empty() {
            return Err(anyhow!("Voice pool must contain at least one voice"));
        }

        Ok(Self {
            pool,
            recency_window,
            state: Mutex::new(RegistryState::default()),
        })
    }

    /// Number of voices in the pool
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Resolve the voice for an author at a given sequence index.
    ///
    /// Idempotent per author within a run. Never fails: allocation degrades
    /// from unused voice, to first unlocked voice in pool order, to
    /// round-robin reuse.
    pub fn assign(&self, author_id: &str, sequence_index: usize) -> String {
        let key = normalize_author(author_id);
        let mut state = self.state.lock();

        if let Some(existing) = state.assignments.get(&key) {
            let voice_id = existing.voice_id.clone();
            state.last_spoken.insert(voice_id.clone(), sequence_index);
            return voice_id;
        }

        let voice_id = self.pick_voice(&state, sequence_index);
        debug!(
            "Assigned voice '{}' to author '{}' at item {}",
            voice_id, author_id, sequence_index
        );

        state.assignments.insert(
            key,
            VoiceAssignment {
                author_id: author_id.to_string(),
                voice_id: voice_id.clone(),
                assigned_at_sequence_index: sequence_index,
            },
        );
        state.last_spoken.insert(voice_id.clone(), sequence_index);
        if let Some(slot) = self.pool.iter().position(|v| *v == voice_id) {
            state.next_slot = (slot + 1) % self.pool.len();
        }

        voice_id
    }

    // Allocation policy, in order: first pool voice never assigned; first
    // pool voice outside the recency window; round-robin reuse.
    fn pick_voice(&self, state: &RegistryState, sequence_index: usize) -> String {
        let in_use: Vec<&str> = state
            .assignments
            .values()
            .map(|a| a.voice_id.as_str())
            .collect();

        if let Some(unused) = self.pool.iter().find(|v| !in_use.contains(&v.as_str())) {
            return unused.clone();
        }

        // Recycle: skip voices that spoke within the recency window
        let unlocked = self.pool.iter().find(|voice| {
            match state.last_spoken.get(voice.as_str()) {
                Some(&last) => sequence_index.saturating_sub(last) > self.recency_window,
                None => true,
            }
        });
        if let Some(voice) = unlocked {
            return voice.clone();
        }

        // Everything is locked: reuse rather than fail
        self.pool[state.next_slot % self.pool.len()].clone()
    }

    /// Pre-load assignments (from a persisted store) before the run starts.
    ///
    /// Voices not present in this registry's pool are ignored, so a store
    /// written against a different pool cannot inject unknown voices.
    pub fn preload(&self, assignments: &[VoiceAssignment]) {
        let mut state = self.state.lock();
        for assignment in assignments {
            if !self.pool.iter().any(|v| *v == assignment.voice_id) {
                debug!(
                    "Ignoring persisted voice '{}' not present in pool",
                    assignment.voice_id
                );
                continue;
            }
            state
                .assignments
                .entry(normalize_author(&assignment.author_id))
                .or_insert_with(|| assignment.clone());
        }
    }

    /// Look up an existing assignment without allocating
    pub fn lookup(&self, author_id: &str) -> Option<VoiceAssignment> {
        self.state
            .lock()
            .assignments
            .get(&normalize_author(author_id))
            .cloned()
    }

    /// Snapshot of all assignments, ordered by assignment time
    pub fn assignments(&self) -> Vec<VoiceAssignment> {
        let state = self.state.lock();
        let mut all: Vec<VoiceAssignment> = state.assignments.values().cloned().collect();
        all.sort_by_key(|a| a.assigned_at_sequence_index);
        all
    }

    /// Number of distinct voices currently assigned
    pub fn assigned_voice_count(&self) -> usize {
        let state = self.state.lock();
        let mut voices: Vec<&str> = state
            .assignments
            .values()
            .map(|a| a.voice_id.as_str())
            .collect();
        voices.sort();
        voices.dedup();
        voices.len()
    }
}
