//! Subprocess-backed Twitter client
//!
//! Each call runs the configured bridge program once:
//!
//! ```text
//! <bridge_command...> <operation> <args...>
//! ```
//!
//! with the session cookies, proxy, and language passed through the
//! environment (`TWITTER_AUTH_TOKEN`, `TWITTER_CT0`, `TWITTER_PROXY`,
//! `TWITTER_COOKIES_FILE`, `TWITTER_LANGUAGE`). The bridge prints one JSON
//! document on stdout. A document with an `error` field is a failure;
//! `"kind": "auth"` marks rejected cookies.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::config::TwitterConfig;
use crate::error::{PlatformError, Result};
use crate::platforms::SocialClient;
use crate::session::Session;
use crate::types::{Tweet, User};

pub struct BridgeClient {
    program: String,
    leading_args: Vec<String>,
    env: Vec<(&'static str, String)>,
    timeout: Duration,
}

impl BridgeClient {
    pub fn new(config: &TwitterConfig, session: &Session, cookies_path: &Path) -> Result<Self> {
        let (program, leading_args) = config.bridge_command.split_first().ok_or_else(|| {
            PlatformError::Request("twitter.bridge_command is empty".to_string())
        })?;

        let mut env = vec![
            ("TWITTER_AUTH_TOKEN", session.auth_token().to_string()),
            ("TWITTER_CT0", session.ct0().to_string()),
            (
                "TWITTER_COOKIES_FILE",
                cookies_path.to_string_lossy().to_string(),
            ),
            ("TWITTER_LANGUAGE", config.language.clone()),
        ];
        if let Some(proxy) = &config.proxy {
            env.push(("TWITTER_PROXY", proxy.clone()));
        }

        Ok(Self {
            program: program.clone(),
            leading_args: leading_args.to_vec(),
            env,
            timeout: Duration::from_secs(config.bridge_timeout_secs),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one bridge operation and return its JSON output.
    async fn call(&self, operation: &str, args: &[&str]) -> Result<Value> {
        tracing::debug!(operation, "Calling bridge {}", self.program);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args).arg(operation).args(args);
        cmd.envs(self.env.iter().map(|(k, v)| (*k, v.as_str())));
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            PlatformError::Network(format!("Failed to start bridge '{}': {}", self.program, e))
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                PlatformError::Network(format!(
                    "{} timed out after {}s",
                    operation,
                    self.timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| PlatformError::Network(format!("Bridge I/O failed: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: Option<Value> = serde_json::from_str(stdout.trim()).ok();

        if let Some(error) = parsed.as_ref().and_then(error_of) {
            return Err(error.into());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlatformError::Request(format!(
                "{} failed ({}): {}",
                operation,
                output.status,
                stderr.trim()
            ))
            .into());
        }

        parsed.ok_or_else(|| {
            PlatformError::Response(format!("{} returned invalid JSON: {}", operation, stdout.trim()))
                .into()
        })
    }

    async fn call_as<T: DeserializeOwned>(&self, operation: &str, args: &[&str]) -> Result<T> {
        let value = self.call(operation, args).await?;
        serde_json::from_value(value).map_err(|e| {
            PlatformError::Response(format!("{} returned unexpected data: {}", operation, e)).into()
        })
    }
}

/// Translate a bridge error document into a platform error.
fn error_of(value: &Value) -> Option<PlatformError> {
    let message = match value.get("error")? {
        Value::String(s) => s.clone(),
        Value::Null => return None,
        other => other.to_string(),
    };
    match value.get("kind").and_then(Value::as_str) {
        Some("auth") => Some(PlatformError::Authentication(message)),
        _ => Some(PlatformError::Request(message)),
    }
}

#[async_trait]
impl SocialClient for BridgeClient {
    async fn create_tweet(
        &self,
        text: &str,
        reply_to: Option<&str>,
        attachment_url: Option<&str>,
    ) -> Result<String> {
        let mut args = vec![text];
        if let Some(reply_to) = reply_to {
            args.extend(["--reply-to", reply_to]);
        }
        if let Some(url) = attachment_url {
            args.extend(["--attachment-url", url]);
        }

        let value = self.call("create_tweet", &args).await?;
        match value.get("id") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(PlatformError::Response("create_tweet returned no id".to_string()).into()),
        }
    }

    async fn favorite_tweet(&self, tweet_id: &str) -> Result<()> {
        self.call("favorite_tweet", &[tweet_id]).await.map(|_| ())
    }

    async fn unfavorite_tweet(&self, tweet_id: &str) -> Result<()> {
        self.call("unfavorite_tweet", &[tweet_id]).await.map(|_| ())
    }

    async fn retweet(&self, tweet_id: &str) -> Result<()> {
        self.call("retweet", &[tweet_id]).await.map(|_| ())
    }

    async fn delete_retweet(&self, tweet_id: &str) -> Result<()> {
        self.call("delete_retweet", &[tweet_id]).await.map(|_| ())
    }

    async fn follow_user(&self, user_id: &str) -> Result<()> {
        self.call("follow_user", &[user_id]).await.map(|_| ())
    }

    async fn unfollow_user(&self, user_id: &str) -> Result<()> {
        self.call("unfollow_user", &[user_id]).await.map(|_| ())
    }

    async fn bookmark_tweet(&self, tweet_id: &str) -> Result<()> {
        self.call("bookmark_tweet", &[tweet_id]).await.map(|_| ())
    }

    async fn delete_bookmark(&self, tweet_id: &str) -> Result<()> {
        self.call("delete_bookmark", &[tweet_id]).await.map(|_| ())
    }

    async fn delete_tweet(&self, tweet_id: &str) -> Result<()> {
        self.call("delete_tweet", &[tweet_id]).await.map(|_| ())
    }

    async fn search_tweet(&self, query: &str, count: usize) -> Result<Vec<Tweet>> {
        let count = count.to_string();
        self.call_as("search_tweet", &[query, count.as_str()]).await
    }

    async fn get_timeline(&self, count: usize) -> Result<Vec<Tweet>> {
        let count = count.to_string();
        self.call_as("get_timeline", &[count.as_str()]).await
    }

    async fn get_user_by_screen_name(&self, screen_name: &str) -> Result<User> {
        self.call_as("get_user_by_screen_name", &[screen_name]).await
    }

    async fn get_user_tweets(&self, user_id: &str, count: usize) -> Result<Vec<Tweet>> {
        let count = count.to_string();
        self.call_as("get_user_tweets", &[user_id, count.as_str()]).await
    }

    async fn get_tweets_by_ids(&self, ids: &[String]) -> Result<Vec<Tweet>> {
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        self.call_as("get_tweets_by_ids", &ids).await
    }
}
