//! Operator CLI for checking StackPath credentials and purging by hand.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stackpurge_core::logging::init_logging_with;
use stackpurge_core::{CoreConfig, PurgeTarget, StackPathClient};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "stackpurge", version, about = "Purge the StackPath CDN cache")]
struct Cli {
    /// JSON config file; STACKPATH_* environment variables override it
    #[arg(short, long, env = "STACKPURGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level, including gateway request/response bodies
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange the configured credentials for an access token
    Token,
    /// List stacks visible to the configured credentials
    Stacks,
    /// Purge one or more URLs, or the whole site with --all
    Purge {
        urls: Vec<String>,
        /// Recursively purge everything below --root-url
        #[arg(long, requires = "root_url", conflicts_with = "urls")]
        all: bool,
        #[arg(long)]
        root_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging_with(if cli.verbose { "debug" } else { "warn" });

    let cfg = match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "loading config file");
            CoreConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
        None => {
            debug!("loading config from environment");
            CoreConfig::from_env().context("invalid STACKPATH_* environment")?
        }
    };
    let client = StackPathClient::new(&cfg).context("failed to build stackpath client")?;

    match cli.command {
        Command::Token => {
            let Some(_token) = client.get_token().await else {
                bail!("no access token: check client_id and client_secret");
            };
            println!("credentials ok");
        }
        Command::Stacks => {
            let token = client.get_token().await;
            if token.is_none() {
                bail!("no access token: check client_id and client_secret");
            }
            let stacks = client.get_stacks(token.as_deref()).await;
            let selected = cfg.stackpath.stack_id();
            for (id, name) in &stacks {
                let marker = if selected == Some(id.as_str()) { "*" } else { " " };
                println!("{marker} {id}\t{name}");
            }
        }
        Command::Purge {
            urls,
            all,
            root_url,
        } => {
            let target = match (all, root_url) {
                (true, Some(root_url)) => PurgeTarget::Site { root_url },
                _ if urls.is_empty() => bail!("nothing to purge: pass URLs or --all"),
                _ => PurgeTarget::Urls(urls),
            };
            debug!(purge = ?target, "purge target chosen");
            let Some(response) = client.purge_cache(target).await else {
                bail!("purge not sent: credentials or stack_id missing");
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
