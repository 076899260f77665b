//! akimachi CLI
//!
//! One invocation = one run of the pipeline, typically under an external
//! scheduler. Exit code is non-zero only when a fetch fails.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use akimachi::{
    error::{AppError, Result},
    fetch::{HttpFetcher, RetryPolicy, RetryingFetcher},
    models::{Config, StoreBackend},
    notify::WebhookNotifier,
    pipeline,
    store::{FileStore, IssueStore, SnapshotStore},
    utils::http,
};

/// akimachi - facility availability watcher
#[derive(Parser, Debug)]
#[command(
    name = "akimachi",
    version,
    about = "Watches facility-reservation feeds for newly opened slots"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "akimachi.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check one feed: fetch, diff, notify, persist
    Check {
        /// Feed id from the configuration
        feed: String,
    },

    /// Check every configured feed in turn
    CheckAll,

    /// Validate the configuration file
    Validate,

    /// Show stored snapshot state per feed
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build the configured snapshot store backend.
fn create_store(config: &Config, client: &reqwest::Client) -> Box<dyn SnapshotStore> {
    match config.store.backend {
        StoreBackend::File => Box::new(FileStore::new(&config.store.dir)),
        StoreBackend::Issue => Box::new(IssueStore::from_env(
            client.clone(),
            &config.store.api_base,
            &config.feeds,
        )),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("akimachi starting...");

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Check { feed } => {
            let feed = config
                .feed(&feed)
                .cloned()
                .ok_or_else(|| AppError::config(format!("Unknown feed '{feed}'")))?;

            let client = http::create_client(&config.http)?;
            let store = create_store(&config, &client);
            let notifier = WebhookNotifier::from_env(client.clone());
            let fetcher = RetryingFetcher::new(
                HttpFetcher::new(client),
                RetryPolicy::from_config(&config.retry),
            );

            let report = pipeline::run_check(&feed, &fetcher, store.as_ref(), &notifier).await?;
            log::info!(
                "Check complete: {} slots, {} new, notified={}, saved={}",
                report.slot_count,
                report.new_count,
                report.notified,
                report.saved
            );
        }

        Command::CheckAll => {
            if config.feeds.is_empty() {
                return Err(AppError::config("No feeds configured"));
            }

            let client = http::create_client(&config.http)?;
            let store = create_store(&config, &client);
            let notifier = WebhookNotifier::from_env(client.clone());
            let fetcher = RetryingFetcher::new(
                HttpFetcher::new(client),
                RetryPolicy::from_config(&config.retry),
            );

            let reports =
                pipeline::run_all(&config.feeds, &fetcher, store.as_ref(), &notifier).await?;
            for report in &reports {
                log::info!(
                    "{}: {} slots, {} new, notified={}, saved={}",
                    report.feed_id,
                    report.slot_count,
                    report.new_count,
                    report.notified,
                    report.saved
                );
            }
            log::info!("All {} feeds checked", reports.len());
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} feeds)", config.feeds.len());
        }

        Command::Info => {
            log::info!("Store backend: {:?} ({})", config.store.backend, config.store.dir);

            let client = http::create_client(&config.http)?;
            let store = create_store(&config, &client);

            for feed in &config.feeds {
                match store.load(&feed.id).await {
                    Some(snapshot) => log::info!(
                        "{}: {} slots, full={}, checked at {}",
                        feed.id,
                        snapshot.slot_count(),
                        snapshot.is_full(),
                        snapshot.checked_at
                    ),
                    None => log::info!("{}: no snapshot yet", feed.id),
                }
            }
        }
    }

    log::info!("Done!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::parse_from(["akimachi", "--verbose", "check", "nishiogi"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Check { feed } if feed == "nishiogi"));
    }
}
