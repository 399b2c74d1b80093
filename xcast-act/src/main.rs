//! xcast-act - Perform one X/Twitter action and print the result as JSON

use clap::Parser;
use libxcast::action::{Action, ActionResult};
use libxcast::logging::LoggingConfig;
use libxcast::platforms::bridge::BridgeClient;
use libxcast::report::Reporter;
use libxcast::session::Session;
use libxcast::{Config, DedupGate, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "xcast-act")]
#[command(version)]
#[command(about = "Perform an X/Twitter action and print the result as JSON")]
#[command(long_about = "\
xcast-act - Perform an X/Twitter action and print the result as JSON

ACTIONS:
    post <text>                     reply <tweet_id> <text>
    quote <tweet_url_or_id> <text>  delete <tweet_id>
    like | unlike <tweet_id>        retweet | unretweet <tweet_id>
    bookmark | unbookmark <tweet_id>
    follow | unfollow <user_id>
    search <query> [count]          timeline [count]
    user <username>                 user_tweets <username> [count]

    like, retweet, follow, and bookmark are skipped (reported as
    {\"ok\": true, \"skipped\": true, ...}) when the same action against the
    same target succeeded within the last 6 hours.

    Options are recognised anywhere on the line. Text that starts with
    '-' goes after '--':  xcast-act post -- \"-1 for this idea\"

CONFIGURATION:
    Configuration file: ~/.config/xcast/config.toml (or XCAST_CONFIG)
    Session cookies: TWITTER_AUTH_TOKEN and TWITTER_CT0, read from the
    environment or ~/.config/xcast/.env and saved for later runs.

EXIT CODES:
    0 - Success (including skipped duplicates)
    1 - Action or configuration failed
    2 - Authentication error
    3 - Invalid input
")]
struct Cli {
    /// Action to perform
    action: String,

    /// Action arguments (put text starting with `-` after `--`)
    args: Vec<String>,

    /// Path to the configuration file
    #[arg(long, env = "XCAST_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not forward the action to the platform webhook
    #[arg(long)]
    no_report: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    match run(&cli).await {
        Ok(result) => print_json(&result.to_json(), cli.pretty),
        Err(e) => {
            tracing::debug!("{} failed: {}", cli.action, e);
            print_json(&serde_json::json!({ "error": e.agent_message() }), cli.pretty);
            std::process::exit(e.exit_code());
        }
    }
}

fn print_json(value: &serde_json::Value, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!("Failed to render output: {}", e),
    }
}

async fn run(cli: &Cli) -> Result<ActionResult> {
    let action = Action::parse(&cli.action, cli.args.clone())?;
    let config = Config::load_from(cli.config.as_deref())?;
    let gate = DedupGate::from_config(&config)?;

    if let Some(skipped) = gate.check(&action) {
        return Ok(skipped);
    }

    let cookies_path = config.cookies_path()?;
    let session = Session::resolve(&cookies_path)?;
    let client = BridgeClient::new(&config.twitter, &session, &cookies_path)?;

    let result = gate.execute(&client, &action).await?;

    if !cli.no_report {
        if let Some(reporter) = Reporter::from_config(&config.report) {
            reporter.report(&client, &action, &result).await;
        }
    }

    Ok(result)
}
