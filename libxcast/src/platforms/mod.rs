//! Social network client abstraction
//!
//! `SocialClient` lists the network operations the CLI verbs need. The
//! production implementation (`bridge::BridgeClient`) hands each call to an
//! external helper process; `mock::MockClient` serves tests.
//!
//! # Examples
//!
//! ```no_run
//! use libxcast::action::Action;
//! use libxcast::platforms::{mock::MockClient, perform};
//!
//! # async fn example() -> libxcast::Result<()> {
//! let client = MockClient::new();
//! let action = Action::parse("like", vec!["12345".to_string()])?;
//! let result = perform(&client, &action).await?;
//! println!("{}", result.to_json());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::action::{quote_url, Action, ActionKind, ActionResult, Request};
use crate::error::{Result, XcastError};
use crate::types::{Tweet, User};

pub mod bridge;

// Available in all builds so integration tests can use it
pub mod mock;

#[async_trait]
pub trait SocialClient: Send + Sync {
    /// Publish a tweet, optionally as a reply or with a quoted tweet URL.
    /// Returns the new tweet's id.
    async fn create_tweet(
        &self,
        text: &str,
        reply_to: Option<&str>,
        attachment_url: Option<&str>,
    ) -> Result<String>;

    async fn favorite_tweet(&self, tweet_id: &str) -> Result<()>;

    async fn unfavorite_tweet(&self, tweet_id: &str) -> Result<()>;

    async fn retweet(&self, tweet_id: &str) -> Result<()>;

    async fn delete_retweet(&self, tweet_id: &str) -> Result<()>;

    async fn follow_user(&self, user_id: &str) -> Result<()>;

    async fn unfollow_user(&self, user_id: &str) -> Result<()>;

    async fn bookmark_tweet(&self, tweet_id: &str) -> Result<()>;

    async fn delete_bookmark(&self, tweet_id: &str) -> Result<()>;

    async fn delete_tweet(&self, tweet_id: &str) -> Result<()>;

    /// Latest tweets matching `query`.
    async fn search_tweet(&self, query: &str, count: usize) -> Result<Vec<Tweet>>;

    async fn get_timeline(&self, count: usize) -> Result<Vec<Tweet>>;

    async fn get_user_by_screen_name(&self, screen_name: &str) -> Result<User>;

    async fn get_user_tweets(&self, user_id: &str, count: usize) -> Result<Vec<Tweet>>;

    async fn get_tweets_by_ids(&self, ids: &[String]) -> Result<Vec<Tweet>>;
}

/// Run an action against the client and shape the result.
pub async fn perform<C: SocialClient + ?Sized>(client: &C, action: &Action) -> Result<ActionResult> {
    let result = match action.request() {
        Request::Post { text } => ActionResult::Tweeted {
            tweet_id: client.create_tweet(text, None, None).await?,
            text: text.clone(),
            reply_to: None,
            quoted: None,
        },
        Request::Reply { tweet_id, text } => ActionResult::Tweeted {
            tweet_id: client.create_tweet(text, Some(tweet_id.as_str()), None).await?,
            text: text.clone(),
            reply_to: Some(tweet_id.clone()),
            quoted: None,
        },
        Request::Quote { quoted, text } => {
            let url = quote_url(quoted);
            ActionResult::Tweeted {
                tweet_id: client.create_tweet(text, None, Some(url.as_str())).await?,
                text: text.clone(),
                reply_to: None,
                quoted: Some(quoted.clone()),
            }
        }
        Request::Target { id } => {
            let kind = action.kind();
            match kind {
                ActionKind::Like => client.favorite_tweet(id).await?,
                ActionKind::Unlike => client.unfavorite_tweet(id).await?,
                ActionKind::Retweet => client.retweet(id).await?,
                ActionKind::Unretweet => client.delete_retweet(id).await?,
                ActionKind::Follow => client.follow_user(id).await?,
                ActionKind::Unfollow => client.unfollow_user(id).await?,
                ActionKind::Bookmark => client.bookmark_tweet(id).await?,
                ActionKind::Unbookmark => client.delete_bookmark(id).await?,
                ActionKind::Delete => client.delete_tweet(id).await?,
                other => {
                    return Err(XcastError::InvalidInput(format!(
                        "{} does not take a single target",
                        other
                    )))
                }
            }
            ActionResult::Done {
                kind,
                target: id.clone(),
            }
        }
        Request::Search { query, count } => ActionResult::Tweets {
            tweets: client.search_tweet(query, *count).await?,
            with_author: true,
        },
        Request::Timeline { count } => {
            let mut tweets = client.get_timeline(*count).await?;
            tweets.truncate(*count);
            ActionResult::Tweets {
                tweets,
                with_author: true,
            }
        }
        Request::User { username } => {
            ActionResult::Profile(client.get_user_by_screen_name(username).await?)
        }
        Request::UserTweets { username, count } => {
            let user = client.get_user_by_screen_name(username).await?;
            ActionResult::Tweets {
                tweets: client.get_user_tweets(&user.id, *count).await?,
                with_author: false,
            }
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::mock::MockClient;
    use super::*;
    use crate::error::PlatformError;

    fn action(verb: &str, args: &[&str]) -> Action {
        Action::parse(verb, args.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[tokio::test]
    async fn test_reply_uses_reply_to() {
        let client = MockClient::new();
        let result = perform(&client, &action("reply", &["100", "good", "point"]))
            .await
            .unwrap();

        assert_eq!(result.parent_id(), Some("100"));
        assert_eq!(result.text(), "good point");
        assert_eq!(client.calls(), vec!["create_tweet good point reply_to=100"]);
    }

    #[tokio::test]
    async fn test_quote_builds_status_url() {
        let client = MockClient::new();
        perform(&client, &action("quote", &["77", "look"])).await.unwrap();

        assert_eq!(
            client.calls(),
            vec!["create_tweet look attachment_url=https://x.com/i/status/77"]
        );
    }

    #[tokio::test]
    async fn test_single_target_dispatch() {
        let cases = [
            ("like", "favorite_tweet 1"),
            ("unlike", "unfavorite_tweet 1"),
            ("retweet", "retweet 1"),
            ("unretweet", "delete_retweet 1"),
            ("follow", "follow_user 1"),
            ("unfollow", "unfollow_user 1"),
            ("bookmark", "bookmark_tweet 1"),
            ("unbookmark", "delete_bookmark 1"),
            ("delete", "delete_tweet 1"),
        ];
        for (verb, expected) in cases {
            let client = MockClient::new();
            let result = perform(&client, &action(verb, &["1"])).await.unwrap();
            assert_eq!(client.calls(), vec![expected.to_string()]);
            assert_eq!(result.external_id(), Some("1"));
        }
    }

    #[tokio::test]
    async fn test_timeline_truncates_to_count() {
        let client = MockClient::new().with_timeline(vec![
            Tweet::new("1", "a"),
            Tweet::new("2", "b"),
            Tweet::new("3", "c"),
        ]);
        let result = perform(&client, &action("timeline", &["2"])).await.unwrap();

        match result {
            ActionResult::Tweets { tweets, with_author } => {
                assert_eq!(tweets.len(), 2);
                assert!(with_author);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_user_tweets_resolves_user_id() {
        let client = MockClient::new();
        perform(&client, &action("user_tweets", &["jack", "5"])).await.unwrap();

        assert_eq!(
            client.calls(),
            vec!["get_user_by_screen_name jack", "get_user_tweets id-jack 5"]
        );
    }

    #[tokio::test]
    async fn test_client_failure_propagates() {
        let client = MockClient::failing(PlatformError::Request("rate limited".to_string()));
        let err = perform(&client, &action("like", &["1"])).await.unwrap_err();

        assert!(matches!(err, XcastError::Platform(PlatformError::Request(_))));
    }
}
