//! CLI verbs and their results
//!
//! `Action::parse` turns a verb and its positional arguments into a typed
//! request. The raw arguments are kept alongside because the dedup
//! fingerprint is derived from them.

use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, XcastError};
use crate::types::{Tweet, User};

const DEFAULT_SEARCH_COUNT: usize = 20;
const DEFAULT_TIMELINE_COUNT: usize = 50;
const DEFAULT_USER_TWEETS_COUNT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Post,
    Reply,
    Quote,
    Like,
    Unlike,
    Retweet,
    Unretweet,
    Follow,
    Unfollow,
    Bookmark,
    Unbookmark,
    Delete,
    Search,
    Timeline,
    User,
    UserTweets,
}

impl ActionKind {
    pub const ALL: [ActionKind; 16] = [
        ActionKind::Post,
        ActionKind::Reply,
        ActionKind::Quote,
        ActionKind::Like,
        ActionKind::Unlike,
        ActionKind::Retweet,
        ActionKind::Unretweet,
        ActionKind::Follow,
        ActionKind::Unfollow,
        ActionKind::Bookmark,
        ActionKind::Unbookmark,
        ActionKind::Delete,
        ActionKind::Search,
        ActionKind::Timeline,
        ActionKind::User,
        ActionKind::UserTweets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Post => "post",
            ActionKind::Reply => "reply",
            ActionKind::Quote => "quote",
            ActionKind::Like => "like",
            ActionKind::Unlike => "unlike",
            ActionKind::Retweet => "retweet",
            ActionKind::Unretweet => "unretweet",
            ActionKind::Follow => "follow",
            ActionKind::Unfollow => "unfollow",
            ActionKind::Bookmark => "bookmark",
            ActionKind::Unbookmark => "unbookmark",
            ActionKind::Delete => "delete",
            ActionKind::Search => "search",
            ActionKind::Timeline => "timeline",
            ActionKind::User => "user",
            ActionKind::UserTweets => "user_tweets",
        }
    }

    /// Actions forwarded to the platform webhook.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            ActionKind::Post
                | ActionKind::Reply
                | ActionKind::Quote
                | ActionKind::Like
                | ActionKind::Retweet
                | ActionKind::Follow
                | ActionKind::Unfollow
                | ActionKind::Bookmark
                | ActionKind::Delete
        )
    }

    /// Result key for single-target actions (`{"liked": "<id>"}`).
    fn past_tense(&self) -> Option<&'static str> {
        match self {
            ActionKind::Like => Some("liked"),
            ActionKind::Unlike => Some("unliked"),
            ActionKind::Retweet => Some("retweeted"),
            ActionKind::Unretweet => Some("unretweeted"),
            ActionKind::Follow => Some("followed"),
            ActionKind::Unfollow => Some("unfollowed"),
            ActionKind::Bookmark => Some("bookmarked"),
            ActionKind::Unbookmark => Some("unbookmarked"),
            ActionKind::Delete => Some("deleted"),
            _ => None,
        }
    }

    fn targets_user(&self) -> bool {
        matches!(self, ActionKind::Follow | ActionKind::Unfollow)
    }
}

impl FromStr for ActionKind {
    type Err = XcastError;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| XcastError::InvalidInput(format!("Unknown action: {}", s)))
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the network client is asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Post { text: String },
    Reply { tweet_id: String, text: String },
    Quote { quoted: String, text: String },
    /// like/unlike/retweet/unretweet/bookmark/unbookmark/delete (tweet id)
    /// and follow/unfollow (user id).
    Target { id: String },
    Search { query: String, count: usize },
    Timeline { count: usize },
    User { username: String },
    UserTweets { username: String, count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    kind: ActionKind,
    args: Vec<String>,
    request: Request,
}

impl Action {
    pub fn parse(verb: &str, args: Vec<String>) -> Result<Self> {
        let kind: ActionKind = verb.parse()?;
        let request = parse_request(kind, &args)?;
        Ok(Self {
            kind,
            args,
            request,
        })
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Positional arguments as given on the command line.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// First positional argument, the object of single-target actions.
    pub fn target(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

fn usage(msg: &str) -> XcastError {
    XcastError::InvalidInput(msg.to_string())
}

fn parse_count(arg: Option<&String>, default: usize) -> Result<usize> {
    match arg {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| XcastError::InvalidInput(format!("Count must be a number: {}", raw))),
    }
}

fn is_count(arg: &str) -> bool {
    !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit())
}

fn parse_request(kind: ActionKind, args: &[String]) -> Result<Request> {
    let request = match kind {
        ActionKind::Post => {
            let text = args.join(" ");
            if text.is_empty() {
                return Err(usage("Text required"));
            }
            Request::Post { text }
        }
        ActionKind::Reply => {
            if args.len() < 2 {
                return Err(usage("Usage: reply <tweet_id> <text>"));
            }
            Request::Reply {
                tweet_id: args[0].clone(),
                text: args[1..].join(" "),
            }
        }
        ActionKind::Quote => {
            if args.len() < 2 {
                return Err(usage("Usage: quote <tweet_url_or_id> <text>"));
            }
            Request::Quote {
                quoted: args[0].clone(),
                text: args[1..].join(" "),
            }
        }
        ActionKind::Search => {
            if args.join(" ").is_empty() {
                return Err(usage("Query required"));
            }
            let (query_args, count) = match args.split_last() {
                Some((last, rest)) if !rest.is_empty() && is_count(last) => {
                    match last.parse::<usize>() {
                        Ok(count) => (rest, count),
                        Err(_) => (args, DEFAULT_SEARCH_COUNT),
                    }
                }
                _ => (args, DEFAULT_SEARCH_COUNT),
            };
            Request::Search {
                query: query_args.join(" "),
                count,
            }
        }
        ActionKind::Timeline => Request::Timeline {
            count: parse_count(args.first(), DEFAULT_TIMELINE_COUNT)?,
        },
        ActionKind::User => Request::User {
            username: args
                .first()
                .cloned()
                .ok_or_else(|| usage("Username required"))?,
        },
        ActionKind::UserTweets => Request::UserTweets {
            username: args
                .first()
                .cloned()
                .ok_or_else(|| usage("Username required"))?,
            count: parse_count(args.get(1), DEFAULT_USER_TWEETS_COUNT)?,
        },
        single => {
            let missing = if single.targets_user() {
                "User ID required"
            } else {
                "Tweet ID required"
            };
            Request::Target {
                id: args.first().cloned().ok_or_else(|| usage(missing))?,
            }
        }
    };
    Ok(request)
}

/// Turn a quote reference into the attachment URL the client expects.
pub fn quote_url(reference: &str) -> String {
    if reference.starts_with("http") {
        reference.to_string()
    } else {
        format!("https://x.com/i/status/{}", reference)
    }
}

/// Outcome of an action, rendered as the JSON printed on stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// post, reply, or quote created a new tweet.
    Tweeted {
        tweet_id: String,
        text: String,
        reply_to: Option<String>,
        quoted: Option<String>,
    },
    /// A single-target action succeeded.
    Done { kind: ActionKind, target: String },
    /// search, timeline, or user_tweets. `with_author` adds the `user` field.
    Tweets { tweets: Vec<Tweet>, with_author: bool },
    Profile(User),
    /// The dedup store already saw this action recently.
    Skipped { kind: ActionKind, target: String },
}

impl ActionResult {
    /// Id of the tweet or user this action produced or touched.
    pub fn external_id(&self) -> Option<&str> {
        match self {
            ActionResult::Tweeted { tweet_id, .. } => Some(tweet_id.as_str()),
            ActionResult::Done { target, .. } => Some(target.as_str()),
            _ => None,
        }
    }

    /// Id of the tweet replied to or quoted.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            ActionResult::Tweeted { reply_to, quoted, .. } => {
                reply_to.as_deref().or(quoted.as_deref())
            }
            _ => None,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ActionResult::Tweeted { text, .. } => text.as_str(),
            _ => "",
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ActionResult::Skipped { .. })
    }

    pub fn to_json(&self) -> Value {
        match self {
            ActionResult::Tweeted {
                tweet_id,
                text,
                reply_to,
                quoted,
            } => {
                let mut body = json!({ "ok": true, "tweet_id": tweet_id, "text": text });
                if let Some(reply_to) = reply_to {
                    body["reply_to"] = json!(reply_to);
                }
                if let Some(quoted) = quoted {
                    body["quoted"] = json!(quoted);
                }
                body
            }
            ActionResult::Done { kind, target } => {
                let mut body = json!({ "ok": true });
                body[kind.past_tense().unwrap_or(kind.as_str())] = json!(target);
                body
            }
            ActionResult::Tweets { tweets, with_author } => {
                let tweets: Vec<Value> = tweets
                    .iter()
                    .map(|t| {
                        let mut item = json!({
                            "id": t.id,
                            "text": t.text,
                            "created_at": t.created_at,
                            "likes": t.favorite_count,
                            "retweets": t.retweet_count,
                        });
                        if *with_author {
                            item["user"] = json!(t.user.as_ref().map(|u| &u.screen_name));
                        }
                        item
                    })
                    .collect();
                json!({ "ok": true, "tweets": tweets })
            }
            ActionResult::Profile(user) => json!({
                "ok": true,
                "user": {
                    "id": user.id,
                    "name": user.name,
                    "username": user.screen_name,
                    "bio": user.description,
                    "followers": user.followers_count,
                    "following": user.following_count,
                    "tweets": user.statuses_count,
                }
            }),
            ActionResult::Skipped { kind, target } => json!({
                "ok": true,
                "skipped": true,
                "reason": "already done",
                "action": kind.as_str(),
                "target": target,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TweetAuthor;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn parse_err(verb: &str, items: &[&str]) -> String {
        match Action::parse(verb, args(items)) {
            Err(XcastError::InvalidInput(msg)) => msg,
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(parse_err("dance", &[]), "Unknown action: dance");
    }

    #[test]
    fn test_reportable_actions() {
        let reportable: Vec<&str> = ActionKind::ALL
            .into_iter()
            .filter(|k| k.is_reportable())
            .map(|k| k.as_str())
            .collect();
        assert_eq!(
            reportable,
            vec!["post", "reply", "quote", "like", "retweet", "follow", "unfollow", "bookmark", "delete"]
        );
    }

    #[test]
    fn test_post_joins_words() {
        let action = Action::parse("post", args(&["hello", "world"])).unwrap();
        assert_eq!(
            action.request(),
            &Request::Post {
                text: "hello world".to_string()
            }
        );
        assert_eq!(parse_err("post", &[]), "Text required");
        assert_eq!(parse_err("post", &[""]), "Text required");
    }

    #[test]
    fn test_reply_and_quote() {
        let action = Action::parse("reply", args(&["123", "nice", "thread"])).unwrap();
        assert_eq!(
            action.request(),
            &Request::Reply {
                tweet_id: "123".to_string(),
                text: "nice thread".to_string()
            }
        );
        assert_eq!(action.target(), Some("123"));
        assert_eq!(parse_err("reply", &["123"]), "Usage: reply <tweet_id> <text>");
        assert_eq!(parse_err("quote", &["123"]), "Usage: quote <tweet_url_or_id> <text>");
    }

    #[test]
    fn test_quote_url() {
        assert_eq!(quote_url("123"), "https://x.com/i/status/123");
        assert_eq!(
            quote_url("https://x.com/jack/status/20"),
            "https://x.com/jack/status/20"
        );
    }

    #[test]
    fn test_single_target_errors() {
        for verb in ["like", "unlike", "retweet", "unretweet", "bookmark", "unbookmark", "delete"] {
            assert_eq!(parse_err(verb, &[]), "Tweet ID required");
        }
        assert_eq!(parse_err("follow", &[]), "User ID required");
        assert_eq!(parse_err("unfollow", &[]), "User ID required");
    }

    #[test]
    fn test_search_count() {
        let action = Action::parse("search", args(&["rust", "lang", "5"])).unwrap();
        assert_eq!(
            action.request(),
            &Request::Search {
                query: "rust lang".to_string(),
                count: 5
            }
        );

        // A lone number is the query, not a count.
        let action = Action::parse("search", args(&["2024"])).unwrap();
        assert_eq!(
            action.request(),
            &Request::Search {
                query: "2024".to_string(),
                count: 20
            }
        );

        assert_eq!(parse_err("search", &[]), "Query required");
    }

    #[test]
    fn test_timeline_and_user_tweets_counts() {
        let action = Action::parse("timeline", vec![]).unwrap();
        assert_eq!(action.request(), &Request::Timeline { count: 50 });

        let action = Action::parse("timeline", args(&["10"])).unwrap();
        assert_eq!(action.request(), &Request::Timeline { count: 10 });

        assert!(parse_err("timeline", &["lots"]).contains("Count must be a number"));

        let action = Action::parse("user_tweets", args(&["jack", "3"])).unwrap();
        assert_eq!(
            action.request(),
            &Request::UserTweets {
                username: "jack".to_string(),
                count: 3
            }
        );
        assert_eq!(parse_err("user_tweets", &[]), "Username required");
        assert_eq!(parse_err("user", &[]), "Username required");
    }

    #[test]
    fn test_result_json_shapes() {
        let reply = ActionResult::Tweeted {
            tweet_id: "9".to_string(),
            text: "hi".to_string(),
            reply_to: Some("1".to_string()),
            quoted: None,
        };
        assert_eq!(
            reply.to_json(),
            json!({"ok": true, "tweet_id": "9", "reply_to": "1", "text": "hi"})
        );
        assert_eq!(reply.parent_id(), Some("1"));

        let liked = ActionResult::Done {
            kind: ActionKind::Like,
            target: "5".to_string(),
        };
        assert_eq!(liked.to_json(), json!({"ok": true, "liked": "5"}));
        assert_eq!(liked.external_id(), Some("5"));

        let skipped = ActionResult::Skipped {
            kind: ActionKind::Follow,
            target: "7".to_string(),
        };
        assert_eq!(
            skipped.to_json(),
            json!({"ok": true, "skipped": true, "reason": "already done", "action": "follow", "target": "7"})
        );
    }

    #[test]
    fn test_tweeted_json_omits_unset_parents() {
        let post = ActionResult::Tweeted {
            tweet_id: "9".to_string(),
            text: "hi".to_string(),
            reply_to: None,
            quoted: None,
        };
        let body = post.to_json();
        assert_eq!(body, json!({"ok": true, "tweet_id": "9", "text": "hi"}));
        assert!(body.get("reply_to").is_none());
        assert!(body.get("quoted").is_none());

        let quote = ActionResult::Tweeted {
            tweet_id: "10".to_string(),
            text: "look".to_string(),
            reply_to: None,
            quoted: Some("4".to_string()),
        };
        assert_eq!(
            quote.to_json(),
            json!({"ok": true, "tweet_id": "10", "quoted": "4", "text": "look"})
        );
    }

    #[test]
    fn test_tweets_json_author_field() {
        let mut tweet = Tweet::new("1", "hello");
        tweet.user = Some(TweetAuthor {
            screen_name: "jack".to_string(),
            name: None,
            profile_image_url: None,
        });
        tweet.favorite_count = 3;

        let with_author = ActionResult::Tweets {
            tweets: vec![tweet.clone()],
            with_author: true,
        };
        assert_eq!(with_author.to_json()["tweets"][0]["user"], json!("jack"));
        assert_eq!(with_author.to_json()["tweets"][0]["likes"], json!(3));

        let without = ActionResult::Tweets {
            tweets: vec![tweet],
            with_author: false,
        };
        assert!(without.to_json()["tweets"][0].get("user").is_none());
    }
}
