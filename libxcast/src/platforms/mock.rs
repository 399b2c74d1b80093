//! Mock client implementation for testing
//!
//! Records every call as a short string (`"favorite_tweet 123"`) and serves
//! canned tweets and users, so gate and CLI logic can be verified without
//! credentials or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{PlatformError, Result};
use crate::platforms::SocialClient;
use crate::types::{Tweet, User};

#[derive(Debug, Clone, Default)]
pub struct MockClient {
    /// Error returned by every call when set
    failure: Option<PlatformError>,

    /// Served by `get_timeline`, `search_tweet`, and `get_user_tweets`
    timeline: Vec<Tweet>,

    /// Served by `get_tweets_by_ids` when the id matches
    known_tweets: Vec<Tweet>,

    /// Log of calls made (shared between clones)
    calls: Arc<Mutex<Vec<String>>>,

    /// Counter for ids handed out by `create_tweet`
    created: Arc<Mutex<u64>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client whose every call fails with `error`.
    pub fn failing(error: PlatformError) -> Self {
        Self {
            failure: Some(error),
            ..Default::default()
        }
    }

    pub fn with_timeline(mut self, tweets: Vec<Tweet>) -> Self {
        self.timeline = tweets;
        self
    }

    /// Tweets resolvable through `get_tweets_by_ids`.
    pub fn with_known_tweets(mut self, tweets: Vec<Tweet>) -> Self {
        self.known_tweets = tweets;
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn log(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
        match &self.failure {
            Some(error) => Err(error.clone().into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SocialClient for MockClient {
    async fn create_tweet(
        &self,
        text: &str,
        reply_to: Option<&str>,
        attachment_url: Option<&str>,
    ) -> Result<String> {
        let mut call = format!("create_tweet {}", text);
        if let Some(reply_to) = reply_to {
            call.push_str(&format!(" reply_to={}", reply_to));
        }
        if let Some(url) = attachment_url {
            call.push_str(&format!(" attachment_url={}", url));
        }
        self.log(call)?;

        let mut created = self.created.lock().unwrap_or_else(PoisonError::into_inner);
        *created += 1;
        Ok(format!("mock-{}", *created))
    }

    async fn favorite_tweet(&self, tweet_id: &str) -> Result<()> {
        self.log(format!("favorite_tweet {}", tweet_id))
    }

    async fn unfavorite_tweet(&self, tweet_id: &str) -> Result<()> {
        self.log(format!("unfavorite_tweet {}", tweet_id))
    }

    async fn retweet(&self, tweet_id: &str) -> Result<()> {
        self.log(format!("retweet {}", tweet_id))
    }

    async fn delete_retweet(&self, tweet_id: &str) -> Result<()> {
        self.log(format!("delete_retweet {}", tweet_id))
    }

    async fn follow_user(&self, user_id: &str) -> Result<()> {
        self.log(format!("follow_user {}", user_id))
    }

    async fn unfollow_user(&self, user_id: &str) -> Result<()> {
        self.log(format!("unfollow_user {}", user_id))
    }

    async fn bookmark_tweet(&self, tweet_id: &str) -> Result<()> {
        self.log(format!("bookmark_tweet {}", tweet_id))
    }

    async fn delete_bookmark(&self, tweet_id: &str) -> Result<()> {
        self.log(format!("delete_bookmark {}", tweet_id))
    }

    async fn delete_tweet(&self, tweet_id: &str) -> Result<()> {
        self.log(format!("delete_tweet {}", tweet_id))
    }

    async fn search_tweet(&self, query: &str, count: usize) -> Result<Vec<Tweet>> {
        self.log(format!("search_tweet {} {}", query, count))?;
        Ok(self.timeline.iter().take(count).cloned().collect())
    }

    async fn get_timeline(&self, count: usize) -> Result<Vec<Tweet>> {
        self.log(format!("get_timeline {}", count))?;
        Ok(self.timeline.clone())
    }

    async fn get_user_by_screen_name(&self, screen_name: &str) -> Result<User> {
        self.log(format!("get_user_by_screen_name {}", screen_name))?;
        Ok(User {
            id: format!("id-{}", screen_name),
            name: screen_name.to_string(),
            screen_name: screen_name.to_string(),
            description: String::new(),
            followers_count: 0,
            following_count: 0,
            statuses_count: 0,
        })
    }

    async fn get_user_tweets(&self, user_id: &str, count: usize) -> Result<Vec<Tweet>> {
        self.log(format!("get_user_tweets {} {}", user_id, count))?;
        Ok(self.timeline.iter().take(count).cloned().collect())
    }

    async fn get_tweets_by_ids(&self, ids: &[String]) -> Result<Vec<Tweet>> {
        self.log(format!("get_tweets_by_ids {}", ids.join(",")))?;
        Ok(self
            .known_tweets
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }
}
