//! Action dedup store
//!
//! Remembers when each idempotent write action (like, retweet, follow,
//! bookmark) was last performed against a target, so that repeating it
//! within the freshness window can be skipped without touching the network.
//!
//! Only the allow-listed actions are fingerprinted. Posting-style actions
//! (post, reply, quote, thread, delete) and the undo actions are never
//! checked. Replies are tracked by the reply log instead.
//!
//! # Examples
//!
//! ```no_run
//! use libxcast::dedup::DedupStore;
//!
//! let store = DedupStore::new("/tmp/xcast/action_dedup.json");
//! if !store.is_duplicate("like", &["12345"]) {
//!     // ... perform the like ...
//!     store.record("like", &["12345"]);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::store::StateFile;

/// Actions whose effect is idempotent per target.
pub const DEDUP_ACTIONS: &[&str] = &["like", "retweet", "follow", "bookmark"];

pub const DEFAULT_TTL_SECS: u64 = 6 * 60 * 60;
pub const DEFAULT_CAPACITY: usize = 500;

/// Persisted form: fingerprint -> performed_at.
type DedupMap = BTreeMap<String, Timestamp>;

/// Derive the dedup key for an action, or `None` when the action is never
/// deduplicated (or has no target).
pub fn fingerprint<S: AsRef<str>>(action: &str, args: &[S]) -> Option<String> {
    if !DEDUP_ACTIONS.contains(&action) {
        return None;
    }
    let target = args.first()?.as_ref();
    Some(format!("{}:{}", action, target))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupEntry {
    pub fingerprint: String,
    pub performed_at: Timestamp,
}

pub struct DedupStore {
    file: StateFile,
    clock: Arc<dyn Clock>,
    ttl_secs: f64,
    capacity: usize,
}

impl DedupStore {
    /// Store at `path` using wall-clock time and the default limits.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            file: StateFile::new(path),
            clock,
            ttl_secs: DEFAULT_TTL_SECS as f64,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Override the freshness window and entry cap.
    pub fn with_limits(mut self, ttl_secs: u64, capacity: usize) -> Self {
        self.ttl_secs = ttl_secs as f64;
        self.capacity = capacity;
        self
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    /// True when the same action against the same target was recorded less
    /// than one TTL ago. Never writes the state file.
    pub fn is_duplicate<S: AsRef<str>>(&self, action: &str, args: &[S]) -> bool {
        let Some(key) = fingerprint(action, args) else {
            return false;
        };

        let entries = self.load_live();
        let duplicate = entries.contains_key(&key);
        if duplicate {
            tracing::debug!("Dedup hit for {}", key);
        }
        duplicate
    }

    /// Remember that the action was just performed. No-op for actions
    /// outside the allow-list. Persistence is best-effort.
    pub fn record<S: AsRef<str>>(&self, action: &str, args: &[S]) {
        let Some(key) = fingerprint(action, args) else {
            return;
        };

        let _lock = self.file.lock_exclusive();
        let now = self.clock.now();
        let mut entries: DedupMap = self.file.load_or_default();
        prune_expired(&mut entries, now, self.ttl_secs);
        entries.insert(key.clone(), now);
        evict_oldest(&mut entries, self.capacity);

        tracing::debug!("Recorded {} ({} tracked)", key, entries.len());
        self.file.save_best_effort(&entries);
    }

    /// Live entries, oldest first.
    pub fn entries(&self) -> Vec<DedupEntry> {
        let mut entries: Vec<DedupEntry> = self
            .load_live()
            .into_iter()
            .map(|(fingerprint, performed_at)| DedupEntry {
                fingerprint,
                performed_at,
            })
            .collect();
        entries.sort_by(|a, b| {
            a.performed_at
                .total_cmp(&b.performed_at)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });
        entries
    }

    fn load_live(&self) -> DedupMap {
        let _lock = self.file.lock_shared();
        let mut entries: DedupMap = self.file.load_or_default();
        prune_expired(&mut entries, self.clock.now(), self.ttl_secs);
        entries
    }
}

fn prune_expired(entries: &mut DedupMap, now: Timestamp, ttl_secs: f64) {
    entries.retain(|_, performed_at| now - *performed_at < ttl_secs);
}

/// Drop the oldest entries until at most `capacity` remain.
fn evict_oldest(entries: &mut DedupMap, capacity: usize) {
    if entries.len() <= capacity {
        return;
    }

    let mut by_age: Vec<(String, Timestamp)> =
        entries.iter().map(|(k, v)| (k.clone(), *v)).collect();
    by_age.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let excess = entries.len() - capacity;
    for (key, _) in by_age.into_iter().take(excess) {
        entries.remove(&key);
    }
}
