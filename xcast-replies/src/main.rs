use anyhow::{Context, Result};
use clap::Parser;
use libxcast::{Config, DedupEntry, DedupGate, ReplyLogEntry};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "xcast-replies")]
#[command(version, about = "Show replies recently sent by xcast-act")]
#[command(long_about = r#"Show replies recently sent by xcast-act, so an agent can check what it
already said before replying again.

Only replies from the last 24 hours are kept (at most 200, text truncated to
200 characters).

EXAMPLES:
    # Last 20 replies, oldest first
    xcast-replies

    # Everything said in one thread
    xcast-replies --target 1790000000000000000 --format json

    # Feed an agent loop one object per line
    xcast-replies --format jsonl --limit 50

    # Actions that xcast-act would currently skip as duplicates
    xcast-replies --dedup

OUTPUT FORMATS:
    text  - One line per entry: time | target | text (default)
    json  - JSON array
    jsonl - JSON lines, one object per line

EXIT CODES:
    0 - Success (including empty results)
    1 - Error (configuration could not be loaded)
"#)]
struct Args {
    /// Maximum number of entries to print (the most recent ones)
    #[arg(short, long, default_value = "20", value_name = "N")]
    limit: usize,

    /// Only replies to this tweet
    #[arg(short, long, value_name = "ID")]
    target: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Show live dedup entries instead of replies
    #[arg(long)]
    dedup: bool,

    /// Path to the configuration file
    #[arg(long, env = "XCAST_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Keep the `limit` most recent entries, preserving oldest-first order.
fn tail<T>(mut entries: Vec<T>, limit: usize) -> Vec<T> {
    let excess = entries.len().saturating_sub(limit);
    entries.drain(..excess);
    entries
}

fn format_time(timestamp: f64) -> String {
    chrono::DateTime::from_timestamp(timestamp.floor() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn print_structured<T: Serialize>(entries: &[T], format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(entries)?),
        _ => {
            for entry in entries {
                println!("{}", serde_json::to_string(entry)?);
            }
        }
    }
    Ok(())
}

fn print_replies(entries: &[ReplyLogEntry], format: &str) -> Result<()> {
    if format != "text" {
        return print_structured(entries, format);
    }
    for entry in entries {
        let target = if entry.target_tweet_id.is_empty() {
            "-"
        } else {
            entry.target_tweet_id.as_str()
        };
        println!(
            "{} | {} | {}",
            format_time(entry.timestamp),
            target,
            entry.text.replace('\n', " ")
        );
    }
    Ok(())
}

fn print_dedup(entries: &[DedupEntry], format: &str) -> Result<()> {
    if format != "text" {
        return print_structured(entries, format);
    }
    for entry in entries {
        println!("{} | {}", format_time(entry.performed_at), entry.fingerprint);
    }
    Ok(())
}

fn main() -> Result<()> {
    libxcast::logging::init_default();

    let args = Args::parse();
    tracing::debug!("xcast-replies started with args: {:?}", args);

    let config =
        Config::load_from(args.config.as_deref()).context("Failed to load configuration")?;
    let gate = DedupGate::from_config(&config).context("Failed to locate state files")?;

    if args.dedup {
        let entries = tail(gate.dedup().entries(), args.limit);
        return print_dedup(&entries, &args.format);
    }

    let mut entries = gate.replies().recent();
    if let Some(target) = &args.target {
        entries.retain(|entry| &entry.target_tweet_id == target);
    }
    print_replies(&tail(entries, args.limit), &args.format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_most_recent_in_order() {
        assert_eq!(tail(vec![1, 2, 3, 4], 2), vec![3, 4]);
        assert_eq!(tail(vec![1, 2], 5), vec![1, 2]);
        assert!(tail(vec![1, 2], 0).is_empty());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "1970-01-01 00:00:00");
        assert_eq!(format_time(1_700_000_000.75), "2023-11-14 22:13:20");
    }
}
