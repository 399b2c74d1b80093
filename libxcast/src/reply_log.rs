//! Bounded log of recent replies
//!
//! Replies are never deduplicated; the same tweet may be answered more than
//! once. Instead every successful reply is appended here so an agent loop
//! can see what it already said before replying again.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::store::StateFile;

pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_CAPACITY: usize = 200;
pub const DEFAULT_MAX_TEXT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyLogEntry {
    #[serde(default)]
    pub target_tweet_id: String,
    pub text: String,
    pub timestamp: Timestamp,
}

pub struct ReplyLog {
    file: StateFile,
    clock: Arc<dyn Clock>,
    ttl_secs: f64,
    capacity: usize,
    max_text_chars: usize,
}

impl ReplyLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            file: StateFile::new(path),
            clock,
            ttl_secs: DEFAULT_TTL_SECS as f64,
            capacity: DEFAULT_CAPACITY,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }

    pub fn with_limits(mut self, ttl_secs: u64, capacity: usize, max_text_chars: usize) -> Self {
        self.ttl_secs = ttl_secs as f64;
        self.capacity = capacity;
        self.max_text_chars = max_text_chars;
        self
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    /// Append a reply, dropping expired entries and the oldest entries
    /// beyond capacity. Persistence is best-effort.
    pub fn append(&self, target_tweet_id: &str, text: &str) {
        let _lock = self.file.lock_exclusive();
        let now = self.clock.now();
        let mut entries: Vec<ReplyLogEntry> = self.file.load_or_default();
        entries.retain(|entry| now - entry.timestamp < self.ttl_secs);

        entries.push(ReplyLogEntry {
            target_tweet_id: target_tweet_id.to_string(),
            text: truncate_chars(text, self.max_text_chars),
            timestamp: now,
        });

        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }

        tracing::debug!(
            "Logged reply to {:?} ({} in log)",
            target_tweet_id,
            entries.len()
        );
        self.file.save_best_effort(&entries);
    }

    /// Replies younger than the TTL, oldest first. Never writes the file.
    pub fn recent(&self) -> Vec<ReplyLogEntry> {
        let _lock = self.file.lock_shared();
        let now = self.clock.now();
        let mut entries: Vec<ReplyLogEntry> = self.file.load_or_default();
        entries.retain(|entry| now - entry.timestamp < self.ttl_secs);
        entries
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
