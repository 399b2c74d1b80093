//! Platform webhook
//!
//! Successful write actions are forwarded to `POST {url}/api/v1/social-actions`
//! so the hosting platform can show what the agent did. Reporting is
//! fire-and-forget: nothing here can fail the command.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;

use crate::action::{Action, ActionKind, ActionResult};
use crate::config::ReportConfig;
use crate::platforms::SocialClient;
use crate::types::Tweet;

const REPORT_PATH: &str = "/api/v1/social-actions";

/// Body of one webhook call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub platform: &'static str,
    pub action_type: &'static str,
    pub content: String,
    pub external_id: String,
    pub external_url: Option<String>,
    pub parent_external_id: String,
    pub parent_external_url: Option<String>,
    pub parent_content: Option<String>,
    pub parent_author: Option<String>,
    pub parent_author_name: Option<String>,
    pub parent_author_avatar: Option<String>,
    pub posted_at: String,
}

impl ActionReport {
    /// Build the payload for a completed action. `parent` is the referenced
    /// tweet when it could be fetched.
    pub fn build(
        kind: ActionKind,
        result: &ActionResult,
        parent: Option<&Tweet>,
        posted_at: DateTime<Utc>,
    ) -> Self {
        let external_id = result.external_id().unwrap_or_default().to_string();
        let parent_external_id = result.parent_id().unwrap_or_default().to_string();

        let external_url = if external_id.is_empty() {
            None
        } else if matches!(kind, ActionKind::Follow | ActionKind::Unfollow) {
            Some(format!("https://x.com/intent/user?user_id={}", external_id))
        } else {
            Some(format!("https://x.com/i/status/{}", external_id))
        };

        let author = parent.and_then(|t| t.user.as_ref());
        let parent_external_url = match (parent_external_id.as_str(), author) {
            ("", _) => None,
            (id, Some(author)) if !author.screen_name.is_empty() => {
                Some(format!("https://x.com/{}/status/{}", author.screen_name, id))
            }
            (id, _) => Some(format!("https://x.com/i/status/{}", id)),
        };

        Self {
            platform: "x",
            action_type: kind.as_str(),
            content: result.text().to_string(),
            external_id,
            external_url,
            parent_external_id,
            parent_external_url,
            parent_content: parent.map(|t| t.text.clone()),
            parent_author: author.map(|a| a.screen_name.clone()),
            parent_author_name: author.and_then(|a| a.name.clone()),
            parent_author_avatar: author.and_then(|a| a.profile_image_url.clone()),
            posted_at: posted_at.to_rfc3339(),
        }
    }
}

/// Tweet whose metadata enriches the report: the target of like, retweet,
/// and bookmark, or the parent of a reply or quote.
pub fn referenced_tweet_id<'a>(action: &'a Action, result: &'a ActionResult) -> Option<&'a str> {
    match action.kind() {
        ActionKind::Like | ActionKind::Retweet | ActionKind::Bookmark => action.target(),
        ActionKind::Reply | ActionKind::Quote => result.parent_id(),
        _ => None,
    }
}

pub struct Reporter {
    http: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl Reporter {
    /// `None` unless both the URL and the API key are configured.
    pub fn from_config(config: &ReportConfig) -> Option<Self> {
        Self::with_builder(config, reqwest::Client::builder())
    }

    fn with_builder(config: &ReportConfig, builder: reqwest::ClientBuilder) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }
        let url = config.url.as_deref()?;
        let api_key = config.api_key.clone()?;

        let http = match builder
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
        {
            Ok(http) => http,
            Err(e) => {
                tracing::debug!("Report client unavailable: {}", e);
                return None;
            }
        };

        Some(Self {
            http,
            endpoint: format!("{}{}", url.trim_end_matches('/'), REPORT_PATH),
            api_key: SecretString::from(api_key),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send(&self, report: &ActionReport) -> Result<(), reqwest::Error> {
        self.http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(report)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Report a completed action. Skips and non-reportable actions are
    /// ignored; every failure is logged and dropped.
    pub async fn report<C: SocialClient + ?Sized>(
        &self,
        client: &C,
        action: &Action,
        result: &ActionResult,
    ) {
        if result.is_skipped() || !action.kind().is_reportable() {
            return;
        }

        let parent = match referenced_tweet_id(action, result) {
            Some(id) => match client.get_tweets_by_ids(&[id.to_string()]).await {
                Ok(tweets) => tweets.into_iter().next(),
                Err(e) => {
                    tracing::debug!("Could not fetch referenced tweet {}: {}", id, e);
                    None
                }
            },
            None => None,
        };

        let report = ActionReport::build(action.kind(), result, parent.as_ref(), Utc::now());
        match self.send(&report).await {
            Ok(()) => tracing::debug!("Reported {} to {}", action.name(), self.endpoint),
            Err(e) => tracing::debug!("Report to {} failed: {}", self.endpoint, e),
        }
    }
}
