//! UserPosts - profile + posts aggregation service
//!
//! Looks up a user's profile and posts concurrently from a REST upstream
//! and serves the combined document over HTTP, failing as a unit when
//! either lookup fails.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, bind failure, etc.)
//!   2 - `--once` aggregation failed

mod aggregator;
mod cli;
mod config;
mod error;
mod http;
mod models;
mod upstream;

use aggregator::Aggregator;
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use models::UserId;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use upstream::{HttpPostsFetcher, HttpProfileFetcher, UpstreamClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args)?;

    info!("UserPosts v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Fatal: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .userposts.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG`, when set,
/// takes precedence over the flags.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Build the aggregator from config, then serve or run once.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let aggregator = Arc::new(build_aggregator(&config)?);
    info!(
        "Upstream: {} (request timeout {}s, deadline {}ms)",
        config.upstream.base_url,
        config.upstream.timeout_seconds,
        aggregator.deadline().as_millis()
    );

    if let Some(id) = args.once {
        return run_once(&aggregator, id).await;
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
        signal.cancel();
    });

    http::serve(&config.server.bind, aggregator, shutdown).await?;
    Ok(0)
}

/// Wire the HTTP-backed fetchers into an aggregator. Both fetchers share
/// one upstream client.
fn build_aggregator(config: &Config) -> Result<Aggregator> {
    let client = UpstreamClient::new(
        &config.upstream.base_url,
        config.upstream.timeout(),
        &config.upstream.user_agent,
    )?;

    Ok(Aggregator::new(
        Arc::new(HttpProfileFetcher::new(client.clone())),
        Arc::new(HttpPostsFetcher::new(client)),
        config.aggregate.deadline(),
    ))
}

/// Handle --once: aggregate a single id and print the result.
async fn run_once(aggregator: &Aggregator, id: UserId) -> Result<i32> {
    match aggregator.aggregate(id).await {
        Ok(result) => {
            let out = serde_json::to_string_pretty(&result)
                .context("Failed to serialize aggregate result")?;
            println!("{}", out);
            Ok(0)
        }
        Err(failure) => {
            let out = serde_json::to_string_pretty(&http::error_body(&failure))
                .context("Failed to serialize error body")?;
            eprintln!("{}", out);
            Ok(2)
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Source;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_end_to_end_against_mock_upstream() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/1");
                then.status(200)
                    .json_body(json!({"id": 1, "name": "A", "username": "a", "email": "a@x.com"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts").query_param("userId", "1");
                then.status(200)
                    .json_body(json!([{"userId": 1, "id": 1, "title": "t", "body": "b"}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/999");
                then.status(200).json_body(json!({}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts").query_param("userId", "999");
                then.status(200)
                    .json_body(json!([{"userId": 999, "id": 5, "title": "t", "body": "b"}]));
            })
            .await;

        let mut config = Config::default();
        config.upstream.base_url = server.base_url();
        config.aggregate.deadline_ms = 5_000;
        let aggregator = build_aggregator(&config).unwrap();

        let result = aggregator.aggregate(UserId(1)).await.unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "id": 1,
                "userInfo": {"name": "A", "username": "a", "email": "a@x.com"},
                "posts": [{"id": 1, "title": "t", "body": "b"}]
            })
        );

        // Posts exist for 999, but the empty profile still fails the whole call.
        let failure = aggregator.aggregate(UserId(999)).await.unwrap_err();
        assert_eq!(failure.kind(), "not_found");
        assert_eq!(failure.side(), Some(Source::Profile));

        assert_eq!(run_once(&aggregator, UserId(999)).await.unwrap(), 2);
        assert_eq!(run_once(&aggregator, UserId(1)).await.unwrap(), 0);
    }
}
