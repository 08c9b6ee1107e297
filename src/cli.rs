//! Command-line interface parsing for storepick
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into the runtime configuration for the lister, cache and background
//! refresh.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::data::openai::DEFAULT_BASE_URL;
use crate::data::RetryPolicy;
use crate::refresh::RefreshConfig;
use crate::selector::SelectorConfig;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A duration option was zero
    #[error("--{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// Fewer than one attempt was requested
    #[error("--max-attempts must be at least 1")]
    NoAttempts,

    /// No API key was supplied
    #[error("no API key: pass --api-key or set OPENAI_API_KEY")]
    MissingApiKey,
}

/// storepick - pick the newest vector store for each name
#[derive(Parser, Debug)]
#[command(name = "storepick")]
#[command(about = "List vector stores newest first, one per name, and export a selection")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand that talks to the API
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// API key used as the bearer token
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// API root of an OpenAI-compatible server
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Seconds a fetched list is reused before refreshing
    #[arg(long, default_value_t = 300, global = true)]
    pub ttl_secs: u64,

    /// Seconds allowed for one full listing
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Attempts per page request, including the first
    #[arg(long, default_value_t = 3, global = true)]
    pub max_attempts: u32,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the newest stores, one per name
    ///
    /// Examples:
    ///   storepick list              # Newest 4 stores
    ///   storepick list -n 10        # Newest 10 stores
    ///   storepick list --json       # Machine-readable output
    List {
        /// Number of stores to show
        #[arg(short = 'n', long, default_value_t = 4)]
        count: usize,

        /// Ignore the cache and fetch again
        #[arg(long)]
        refresh: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Resolve a pick (rank or exact name) to its store id
    Select {
        /// Number of stores to choose from
        #[arg(short = 'n', long, default_value_t = 4)]
        count: usize,

        /// 1-based rank or exact store name
        pick: String,
    },

    /// Save the newest stores to a snapshot file
    Export {
        /// Number of stores to save
        #[arg(short = 'n', long, default_value_t = 4)]
        count: usize,

        /// Output file, defaults to the platform data directory
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Print a previously exported snapshot
    Inspect {
        /// Snapshot file to read
        path: PathBuf,
    },

    /// Refresh periodically and print each new selection
    Watch {
        /// Number of stores to show
        #[arg(short = 'n', long, default_value_t = 4)]
        count: usize,

        /// Seconds between refreshes
        #[arg(long, default_value_t = 300)]
        interval: u64,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// API root
    pub base_url: String,
    /// Bearer token, required only by commands that call the API
    pub api_key: Option<String>,
    /// Cache settings
    pub selector: SelectorConfig,
    /// Per-page retry settings
    pub retry: RetryPolicy,
}

impl RuntimeConfig {
    /// Creates a RuntimeConfig from parsed connection arguments.
    ///
    /// # Returns
    /// * `Ok(RuntimeConfig)` with validated settings
    /// * `Err(CliError)` if a duration is zero or no attempt is allowed
    pub fn from_args(args: &ConnectionArgs) -> Result<Self, CliError> {
        if args.ttl_secs == 0 {
            return Err(CliError::ZeroDuration("ttl-secs"));
        }
        if args.timeout_secs == 0 {
            return Err(CliError::ZeroDuration("timeout-secs"));
        }
        if args.max_attempts == 0 {
            return Err(CliError::NoAttempts);
        }

        Ok(RuntimeConfig {
            base_url: args.base_url.clone(),
            api_key: args.api_key.clone().filter(|key| !key.trim().is_empty()),
            selector: SelectorConfig {
                ttl: Duration::from_secs(args.ttl_secs),
                fetch_timeout: Duration::from_secs(args.timeout_secs),
            },
            retry: RetryPolicy {
                max_attempts: args.max_attempts,
                ..RetryPolicy::default()
            },
        })
    }

    /// The API key, or an error for commands that need one
    pub fn require_api_key(&self) -> Result<&str, CliError> {
        self.api_key.as_deref().ok_or(CliError::MissingApiKey)
    }
}

/// Builds the background refresh settings for `watch`
pub fn refresh_config(count: usize, interval_secs: u64) -> Result<RefreshConfig, CliError> {
    if interval_secs == 0 {
        return Err(CliError::ZeroDuration("interval"));
    }
    Ok(RefreshConfig {
        interval: Duration::from_secs(interval_secs),
        count,
        enabled: true,
    })
}
