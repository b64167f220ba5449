//! # Heartbeads Comments CLI (`hbc`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hbc get <node-id>` | Threaded comments on one beads issue |
//! | `hbc list` | Comments across all issues, optionally filtered by glob |
//! | `hbc add <node-id> <text>` | Post a comment or reply |
//!
//! ## Examples
//!
//! ```bash
//! hbc get hb-123
//! hbc get hb-123 --json
//! hbc list --pattern 'hb-1*' --limit 10
//! hbc add hb-123 "Looks good" --reply-to at://did:plc:abc/org.impactindexer.review.comment/3k
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use heartbeads_comments::config::{self, Config};
use heartbeads_comments::fetch::CommentFetcher;
use heartbeads_comments::format::{format_json, format_text};
use heartbeads_comments::models::FetchSelection;
use heartbeads_comments::publish::{CommentPublisher, NewComment, Session, XrpcPublisher};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Heartbeads Comments: read and post threaded comments on beads issues.
#[derive(Parser)]
#[command(
    name = "hbc",
    about = "Read and post threaded comments on beads issues",
    version
)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline progress to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show threaded comments on one beads issue.
    Get {
        /// Beads issue ID (e.g. `hb-123`).
        node_id: String,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Show comments across all beads issues.
    List {
        /// Only include issues whose ID matches this glob.
        #[arg(long)]
        pattern: Option<String>,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Post a comment on a beads issue.
    ///
    /// Requires `HB_DID` and `HB_ACCESS_TOKEN` in the environment.
    Add {
        /// Beads issue ID.
        node_id: String,

        /// Comment text. Multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Content URI of the comment being replied to.
        #[arg(long)]
        reply_to: Option<String>,
    },
}

#[derive(Args)]
struct ReadArgs {
    /// Output as JSON.
    #[arg(long)]
    json: bool,

    /// Maximum number of root comments (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// GraphQL indexer URL.
    #[arg(long, env = "INDEXER_URL")]
    indexer_url: Option<String>,

    /// Profile API URL.
    #[arg(long, env = "PROFILE_API_URL")]
    profile_api_url: Option<String>,
}

impl ReadArgs {
    fn apply(&self, cfg: &mut Config) {
        if let Some(url) = &self.indexer_url {
            cfg.indexer.url = url.clone();
        }
        if let Some(url) = &self.profile_api_url {
            cfg.profiles.url = url.clone();
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "heartbeads_comments=debug,hbc=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut cfg = config::load_or_default(cli.config.as_deref())?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Get { node_id, read } => {
            read.apply(&mut cfg);
            let selection = FetchSelection::for_node(node_id).with_limit(read.limit);
            run_read(&cfg, &selection, read.json, &cancel).await?;
        }
        Commands::List { pattern, read } => {
            read.apply(&mut cfg);
            let selection = FetchSelection {
                node_id: None,
                pattern,
                limit: read.limit,
            };
            run_read(&cfg, &selection, read.json, &cancel).await?;
        }
        Commands::Add {
            node_id,
            text,
            reply_to,
        } => {
            let session = Session::from_env()?;
            let publisher =
                XrpcPublisher::new(cfg.http.build_client()?, cfg.publish.pds_url.clone(), session);
            let comment = NewComment {
                node_id,
                text: text.join(" "),
                reply_to,
            };
            let posted = publisher.publish(&comment, &cancel).await?;
            println!("Comment posted: {}", posted.uri);
        }
    }

    Ok(())
}

async fn run_read(
    cfg: &Config,
    selection: &FetchSelection,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    config::validate(cfg)?;
    let comments = CommentFetcher::from_config(cfg)?
        .fetch_comments(selection, cancel)
        .await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        format_json(&mut out, &comments)?;
    } else {
        format_text(&mut out, &comments)?;
    }
    Ok(())
}
