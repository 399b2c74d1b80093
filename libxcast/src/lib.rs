//! xcast - agent-facing command-line access to X/Twitter
//!
//! This library holds everything behind the `xcast-act` and
//! `xcast-replies` binaries: the verb table, the network client seam, and
//! the two local stores that keep an agent from repeating itself (a dedup
//! cache for idempotent write actions and a bounded log of recent replies).

pub mod action;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod error;
pub mod gate;
pub mod logging;
pub mod platforms;
pub mod reply_log;
pub mod report;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use action::{Action, ActionKind, ActionResult};
pub use config::Config;
pub use dedup::{DedupEntry, DedupStore};
pub use error::{PlatformError, Result, XcastError};
pub use gate::DedupGate;
pub use reply_log::{ReplyLog, ReplyLogEntry};
pub use types::{Tweet, User};
