//! share_transfer CLI - Inspect and transfer 115 share links.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use share_transfer::config::{DEFAULT_BATCH_INTERVAL, DEFAULT_BATCH_SIZE};
use share_transfer::web_api::WEB_API_BASE;
use share_transfer::{ManagerConfig, ShareFileNode, ShareManager, WebApiClient};

/// CLI tool for checking and transferring 115 share links.
#[derive(Parser)]
#[command(name = "share_transfer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account cookie string (UID=...; CID=...; SEID=...).
    #[arg(long, env = "P115_COOKIES", hide_env_values = true)]
    cookies: String,

    /// Custom User-Agent header.
    #[arg(long, env = "P115_USER_AGENT")]
    user_agent: Option<String>,

    /// Base interval between API calls, in seconds (±30% jitter).
    #[arg(long, env = "P115_MIN_INTERVAL", default_value_t = 1.5)]
    min_interval: f64,

    /// Pause before descending into a share subdirectory, in seconds.
    #[arg(long, env = "P115_RECURSION_DELAY", default_value_t = 1.0)]
    recursion_delay: f64,

    /// Lifetime of cached directory ids, in seconds.
    #[arg(long, env = "P115_PATH_CACHE_TTL", default_value_t = 3600)]
    path_cache_ttl: u64,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the cookie is still accepted.
    Login,

    /// Check whether a share link is still valid.
    Status {
        /// Share link.
        url: String,
    },

    /// List the folder tree of a share.
    Tree {
        /// Share link.
        url: String,

        /// Maximum directory depth.
        #[arg(long, short = 'd', default_value_t = 3)]
        depth: u32,

        /// Only descend into directories of this season.
        #[arg(long, short = 's')]
        season: Option<u32>,

        /// Descend into every directory, even when a season is given.
        #[arg(long)]
        no_prune: bool,
    },

    /// Transfer a whole share, or one item of it.
    Transfer {
        /// Share link.
        url: String,

        /// Destination path in your storage.
        #[arg(long, short = 't')]
        to: String,

        /// Item id inside the share ("0" transfers everything).
        #[arg(long, short = 'f', default_value = "0")]
        file_id: String,
    },

    /// Transfer many items of a share in batches.
    Batch {
        /// Share link.
        url: String,

        /// Item ids inside the share.
        #[arg(required = true)]
        ids: Vec<String>,

        /// Destination path in your storage.
        #[arg(long, short = 't')]
        to: String,

        /// Items per request.
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Pause between batches, in seconds (±30% jitter).
        #[arg(long, default_value_t = DEFAULT_BATCH_INTERVAL.as_secs_f64())]
        interval: f64,
    },

    /// List a directory in your storage.
    Ls {
        /// Directory path.
        #[arg(default_value = "/")]
        path: String,
    },

    /// Resolve a directory path to its id, creating it when missing.
    Mkdir {
        /// Directory path.
        path: String,
    },
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("Invalid --{}: {}", flag, value))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_tree(nodes: &[ShareFileNode], indent: usize) {
    for node in nodes {
        println!("{}{}", "  ".repeat(indent), node);
        if let Some(children) = &node.children {
            print_tree(children, indent + 1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let api = WebApiClient::with_options(
        &cli.cookies,
        cli.user_agent.as_deref(),
        WEB_API_BASE,
    )
    .context("Failed to create API client")?;

    let mut config = ManagerConfig::default()
        .with_min_interval(seconds(cli.min_interval, "min-interval")?)
        .with_recursion_delay(seconds(cli.recursion_delay, "recursion-delay")?)
        .with_path_cache_ttl(Duration::from_secs(cli.path_cache_ttl));
    if let Commands::Tree { no_prune: true, .. } = cli.command {
        config = config.with_season_pruning(false);
    }

    let manager = ShareManager::new(Arc::new(api), config);

    match cli.command {
        Commands::Login => {
            if manager.check_login().await {
                println!("Login OK");
            } else {
                anyhow::bail!("Login check failed, refresh the cookie");
            }
        }

        Commands::Status { url } => {
            let status = manager.check_share_status(&url).await;
            if cli.json {
                print_json(&status)?;
            } else {
                println!("Status: {}", status.status_text());
                if status.is_valid {
                    println!("Title:  {}", status.share_info.title);
                    println!("Files:  {}", status.file_count);
                    println!("Owner:  {}", status.share_info.user_name);
                } else if status.error_code != 0 {
                    println!("Errno:  {}", status.error_code);
                }
            }
        }

        Commands::Tree {
            url, depth, season, ..
        } => {
            let tree = manager.list_share_tree(&url, depth, season).await;
            if cli.json {
                print_json(&tree)?;
            } else if tree.is_empty() {
                println!("No files found.");
            } else {
                println!("{:<20} {:>10} {:<6} {}", "ID", "SIZE", "TYPE", "NAME");
                println!("{}", "-".repeat(60));
                print_tree(&tree, 0);
            }
        }

        Commands::Transfer { url, to, file_id } => {
            print!("Transferring {} to {}... ", file_id, to);
            if manager.transfer(&url, &file_id, &to).await {
                println!("OK");
            } else {
                println!("FAILED");
                anyhow::bail!("Transfer failed");
            }
        }

        Commands::Batch {
            url,
            ids,
            to,
            batch_size,
            interval,
        } => {
            let result = manager
                .transfer_batch(&url, &ids, &to, batch_size, seconds(interval, "interval")?)
                .await;
            if cli.json {
                print_json(&result)?;
            } else {
                println!(
                    "Done: {} succeeded, {} failed",
                    result.succeeded.len(),
                    result.failed.len()
                );
                for id in &result.failed {
                    eprintln!("  Failed: {}", id);
                }
            }
        }

        Commands::Ls { path } => {
            let entries = manager.list_immediate_children(&path).await;
            if cli.json {
                print_json(&entries)?;
            } else if entries.is_empty() {
                println!("No files found.");
            } else {
                for entry in entries {
                    let kind = if entry.is_dir { "dir" } else { "file" };
                    println!("{:<20} {:<6} {}", entry.id, kind, entry.name);
                }
            }
        }

        Commands::Mkdir { path } => {
            let id = manager
                .resolve(&path, true)
                .await
                .with_context(|| format!("Failed to resolve or create: {}", path))?;
            println!("{}\t{}", id, path);
        }
    }

    tracing::debug!("API calls issued: {}", manager.api_call_count());
    Ok(())
}
