//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

use crate::models::UserId;

/// UserPosts - profile + posts aggregation service
///
/// Serves `GET /v1/user-posts/{id}`, which looks up a user's profile and
/// posts concurrently from a REST upstream and returns them as one document.
///
/// Examples:
///   userposts
///   userposts --bind 127.0.0.1:8080 --deadline-ms 3000
///   userposts --once 1
///   userposts --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to listen on (overrides config)
    #[arg(short, long, value_name = "ADDR", env = "USERPOSTS_BIND")]
    pub bind: Option<String>,

    /// Upstream REST API base URL (overrides config)
    #[arg(short, long, value_name = "URL", env = "USERPOSTS_UPSTREAM_URL")]
    pub upstream_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .userposts.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Per-request upstream timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Deadline for one aggregation (both lookups) in milliseconds
    #[arg(long, value_name = "MS")]
    pub deadline_ms: Option<u64>,

    /// Run one aggregation for this user id, print the JSON and exit
    #[arg(long, value_name = "ID")]
    pub once: Option<UserId>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .userposts.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.upstream_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Upstream URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref bind) = self.bind {
            if bind.parse::<std::net::SocketAddr>().is_err() {
                return Err(format!("Invalid bind address: {}", bind));
            }
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.deadline_ms == Some(0) {
            return Err("Deadline must be at least 1 millisecond".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            bind: None,
            upstream_url: None,
            config: None,
            timeout: None,
            deadline_ms: None,
            once: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_once() {
        let args =
            Args::try_parse_from(["userposts", "--once", "7", "--deadline-ms", "500"]).unwrap();
        assert_eq!(args.once, Some(UserId(7)));
        assert_eq!(args.deadline_ms, Some(500));

        assert!(Args::try_parse_from(["userposts", "--once", "seven"]).is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.upstream_url = Some("ftp://example.com".to_string());
        assert!(args.validate().is_err());

        args.upstream_url = Some("http://localhost:3000".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_bind_and_zero_values() {
        let mut args = make_args();
        args.bind = Some("not-an-addr".to_string());
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.deadline_ms = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
