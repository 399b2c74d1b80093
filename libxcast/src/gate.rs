//! Dedup gate around write actions
//!
//! The gate is the only place the two stores meet the network client:
//!
//! 1. a recent identical action short-circuits to a successful skip without
//!    contacting the client,
//! 2. a successful action is recorded in the dedup store (a no-op outside
//!    the allow-list) and, for replies, appended to the reply log,
//! 3. a failed action records nothing.

use std::sync::Arc;

use crate::action::{Action, ActionResult, Request};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::dedup::DedupStore;
use crate::error::Result;
use crate::platforms::{perform, SocialClient};
use crate::reply_log::ReplyLog;

pub struct DedupGate {
    dedup: DedupStore,
    replies: ReplyLog,
}

impl DedupGate {
    pub fn new(dedup: DedupStore, replies: ReplyLog) -> Self {
        Self { dedup, replies }
    }

    /// Stores at the configured paths and limits, on wall-clock time.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    pub fn from_config_with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let dedup = DedupStore::with_clock(config.dedup_path()?, clock.clone())
            .with_limits(config.dedup.ttl_secs, config.dedup.capacity);
        let replies = ReplyLog::with_clock(config.reply_log_path()?, clock).with_limits(
            config.reply_log.ttl_secs,
            config.reply_log.capacity,
            config.reply_log.max_text_chars,
        );
        Ok(Self::new(dedup, replies))
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }

    pub fn replies(&self) -> &ReplyLog {
        &self.replies
    }

    /// The skip result when this action was already performed recently.
    pub fn check(&self, action: &Action) -> Option<ActionResult> {
        if !self.dedup.is_duplicate(action.name(), action.args()) {
            return None;
        }
        tracing::info!(
            "Skipping {} {}: already done",
            action.name(),
            action.target().unwrap_or_default()
        );
        Some(ActionResult::Skipped {
            kind: action.kind(),
            target: action.target().unwrap_or_default().to_string(),
        })
    }

    /// Record a successful action.
    pub fn commit(&self, action: &Action, result: &ActionResult) {
        if result.is_skipped() {
            return;
        }
        self.dedup.record(action.name(), action.args());
        if let Request::Reply { tweet_id, text } = action.request() {
            self.replies.append(tweet_id, text);
        }
    }

    /// Perform the action without the duplicate check, committing on
    /// success.
    pub async fn execute<C: SocialClient + ?Sized>(
        &self,
        client: &C,
        action: &Action,
    ) -> Result<ActionResult> {
        let result = perform(client, action).await?;
        self.commit(action, &result);
        Ok(result)
    }

    /// Check, then perform and commit.
    pub async fn run<C: SocialClient + ?Sized>(
        &self,
        client: &C,
        action: &Action,
    ) -> Result<ActionResult> {
        if let Some(skipped) = self.check(action) {
            return Ok(skipped);
        }
        self.execute(client, action).await
    }
}
