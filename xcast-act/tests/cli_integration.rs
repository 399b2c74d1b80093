//! CLI integration tests for xcast-act
//!
//! The network side is a small shell script standing in for the bridge
//! program; it appends each call to `calls.log` so tests can see whether
//! the network was contacted at all.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const BRIDGE_SCRIPT: &str = r#"
dir=$(dirname "$0")
echo "$*" >> "$dir/calls.log"
case "$1" in
    create_tweet) echo '{"id": "999"}' ;;
    get_timeline) echo '[{"id": "1", "text": "hello", "user": {"screen_name": "jack"}}]' ;;
    favorite_tweet)
        if [ "$2" = "expired" ]; then
            echo '{"error": "cookies expired", "kind": "auth"}'
            exit 1
        fi
        echo '{}' ;;
    follow_user)
        echo "upstream exploded" >&2
        exit 1 ;;
    *) echo '{}' ;;
esac
"#;

struct TestEnv {
    dir: TempDir,
    config_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_extra_config("")
    }

    fn with_extra_config(extra: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let state_dir = dir.path().join("state");
        let bridge = dir.path().join("bridge.sh");
        fs::write(&bridge, BRIDGE_SCRIPT).unwrap();

        let config_path = dir.path().join("config.toml");
        let config = format!(
            r#"
env_file = "{env}"

[state]
dir = "{state}"

[twitter]
bridge_command = ["sh", "{bridge}"]
bridge_timeout_secs = 10
cookies_file = "{cookies}"
{extra}
"#,
            env = toml_path(&dir.path().join("missing.env")),
            state = toml_path(&state_dir),
            bridge = toml_path(&bridge),
            cookies = toml_path(&dir.path().join("cookies.json")),
            extra = extra,
        );
        fs::write(&config_path, config).unwrap();

        Self { dir, config_path }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Command with config pointing into the temp dir and no ambient
    /// credentials or webhook settings.
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("xcast-act").unwrap();
        cmd.env("XCAST_CONFIG", &self.config_path)
            .env_remove("TWITTER_AUTH_TOKEN")
            .env_remove("TWITTER_CT0")
            .env_remove("TWITTER_PROXY")
            .env_remove("PLATFORM_API_URL")
            .env_remove("PLATFORM_API_KEY");
        cmd
    }

    fn authed_cmd(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env("TWITTER_AUTH_TOKEN", "test-token")
            .env("TWITTER_CT0", "test-ct0");
        cmd
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.path("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn state_json(&self, name: &str) -> Value {
        let content = fs::read_to_string(self.path("state").join(name)).unwrap();
        serde_json::from_str(&content).unwrap()
    }
}

fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs_f64()
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help_flag_output() {
    Command::cargo_bin("xcast-act")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Perform an X/Twitter action"))
        .stdout(predicate::str::contains("--no-report"))
        .stdout(predicate::str::contains("--pretty"))
        .stdout(predicate::str::contains("EXIT CODES"));
}

#[test]
fn test_version_flag_output() {
    Command::cargo_bin("xcast-act")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("xcast-act"));
}

#[test]
fn test_unknown_action_exit_code_3() {
    let env = TestEnv::new();
    env.cmd()
        .arg("dance")
        .assert()
        .code(3)
        .stdout(predicate::str::contains(r#"{"error":"Unknown action: dance"}"#));
}

#[test]
fn test_missing_target_exit_code_3() {
    let env = TestEnv::new();
    env.cmd()
        .arg("like")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Tweet ID required"));
}

#[test]
fn test_missing_cookies_exit_code_2() {
    let env = TestEnv::new();
    env.cmd()
        .args(["like", "123"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("No Twitter cookies found"));

    assert!(env.calls().is_empty());
}

#[test]
fn test_recent_duplicate_is_skipped_without_credentials() {
    let env = TestEnv::new();
    let state_dir = env.path("state");
    fs::create_dir_all(&state_dir).unwrap();
    fs::write(
        state_dir.join("action_dedup.json"),
        serde_json::json!({ "like:123": now() - 60.0 }).to_string(),
    )
    .unwrap();

    let output = env.cmd().args(["like", "123"]).output().unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["skipped"], true);
    assert_eq!(json["reason"], "already done");
    assert_eq!(json["action"], "like");
    assert_eq!(json["target"], "123");
    assert!(env.calls().is_empty());
}

#[test]
fn test_stale_record_does_not_skip() {
    let env = TestEnv::new();
    let state_dir = env.path("state");
    fs::create_dir_all(&state_dir).unwrap();
    fs::write(
        state_dir.join("action_dedup.json"),
        serde_json::json!({ "like:123": now() - 21_601.0 }).to_string(),
    )
    .unwrap();

    let output = env.authed_cmd().args(["like", "123"]).output().unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!({"ok": true, "liked": "123"}));
    assert_eq!(env.calls(), vec!["favorite_tweet 123"]);
}

#[test]
fn test_like_twice_hits_network_once() {
    let env = TestEnv::new();

    env.authed_cmd().args(["like", "555"]).assert().success();
    let second = env.authed_cmd().args(["like", "555"]).output().unwrap();

    assert!(second.status.success());
    assert_eq!(stdout_json(&second)["skipped"], true);
    assert_eq!(env.calls(), vec!["favorite_tweet 555"]);

    let dedup = env.state_json("action_dedup.json");
    assert!(dedup.get("like:555").is_some());
}

#[test]
fn test_reply_end_to_end() {
    let env = TestEnv::new();

    let output = env
        .authed_cmd()
        .args(["reply", "100", "good", "point"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({"ok": true, "tweet_id": "999", "reply_to": "100", "text": "good point"})
    );
    assert_eq!(env.calls(), vec!["create_tweet good point --reply-to 100"]);

    let log = env.state_json("reply_log.json");
    let entries = log.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["target_tweet_id"], "100");
    assert_eq!(entries[0]["text"], "good point");

    // Replies are not deduplicated
    env.authed_cmd()
        .args(["reply", "100", "good", "point"])
        .assert()
        .success();
    assert_eq!(env.calls().len(), 2);
}

#[test]
fn test_env_cookies_are_saved_for_next_run() {
    let env = TestEnv::new();

    env.authed_cmd().args(["unlike", "1"]).assert().success();
    assert!(env.path("cookies.json").exists());

    // No environment cookies this time
    env.cmd().args(["unlike", "1"]).assert().success();
    assert_eq!(env.calls().len(), 2);
}

#[test]
fn test_rejected_cookies_exit_code_2() {
    let env = TestEnv::new();

    env.authed_cmd()
        .args(["like", "expired"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("cookies expired"));
}

#[test]
fn test_failed_action_records_nothing() {
    let env = TestEnv::new();

    env.authed_cmd()
        .args(["follow", "42"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("upstream exploded"));

    assert!(!env.path("state").join("action_dedup.json").exists());

    // Still not deduplicated on retry
    env.authed_cmd().args(["follow", "42"]).assert().code(1);
    assert_eq!(env.calls().len(), 2);
}

#[test]
fn test_timeline_output() {
    let env = TestEnv::new();

    let output = env.authed_cmd().args(["timeline", "5"]).output().unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["tweets"][0]["id"], "1");
    assert_eq!(json["tweets"][0]["user"], "jack");
    assert_eq!(env.calls(), vec!["get_timeline 5"]);
}

#[test]
fn test_unreachable_webhook_does_not_fail_action() {
    let env = TestEnv::with_extra_config(
        r#"
[report]
url = "http://127.0.0.1:1"
api_key = "key"
timeout_secs = 1
"#,
    );

    env.authed_cmd().args(["retweet", "77"]).assert().success();
    // Metadata for the retweeted tweet was looked up for the report
    assert_eq!(env.calls(), vec!["retweet 77", "get_tweets_by_ids 77"]);
}

#[test]
fn test_no_report_flag() {
    let env = TestEnv::with_extra_config(
        r#"
[report]
url = "http://127.0.0.1:1"
api_key = "key"
"#,
    );

    env.authed_cmd()
        .args(["--no-report", "retweet", "77"])
        .assert()
        .success();
    assert_eq!(env.calls(), vec!["retweet 77"]);
}

#[test]
fn test_flags_after_action_are_not_text() {
    let env = TestEnv::with_extra_config(
        r#"
[report]
url = "http://127.0.0.1:1"
api_key = "key"
"#,
    );

    let output = env
        .authed_cmd()
        .args(["post", "hello", "--no-report"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["text"], "hello");
    assert_eq!(env.calls(), vec!["create_tweet hello"]);

    env.authed_cmd()
        .args(["retweet", "77", "--no-report", "--pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"retweeted\": \"77\""));
    assert_eq!(env.calls(), vec!["create_tweet hello", "retweet 77"]);
}

#[test]
fn test_text_starting_with_dash_after_separator() {
    let env = TestEnv::new();

    let output = env
        .authed_cmd()
        .args(["post", "--", "-1 for this idea"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["text"], "-1 for this idea");
    assert_eq!(env.calls(), vec!["create_tweet -1 for this idea"]);
}

#[test]
fn test_pretty_output() {
    let env = TestEnv::new();

    env.authed_cmd()
        .args(["--pretty", "delete", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"ok\": true"))
        .stdout(predicate::str::contains("\n  \"deleted\": \"9\""));
}
