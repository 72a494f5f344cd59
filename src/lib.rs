//! QueryCache operations console
//!
//! Polls aggregate statistics from a QueryCache service, runs ad-hoc queries
//! against it, and exposes both to a browser through a local JSON API. The
//! same views can be printed in a terminal through the one-shot subcommands.

use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::core::{
    api_client::HttpCacheApi, config::ConsoleConfig, playground::QueryPlayground,
    stats_poller::StatsPoller,
};

pub mod core;
pub mod logging;
pub mod web;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
    #[arg(
        long,
        global = true,
        env = "QUERYCACHE_API_URL",
        default_value = DEFAULT_API_URL,
        help = "Base URL of the QueryCache service"
    )]
    pub api_url: String,
    #[arg(
        long,
        global = true,
        env = "QUERYCACHE_REFRESH_SECS",
        default_value_t = DEFAULT_REFRESH_SECS,
        help = "Seconds between statistics refreshes"
    )]
    pub refresh_secs: u64,
    #[arg(
        short,
        long,
        global = true,
        env = "QUERYCACHE_CONSOLE_PORT",
        default_value_t = DEFAULT_PORT,
        help = "Port the console API listens on"
    )]
    pub port: u16,
    #[arg(long, global = true, default_value = "info", help = "Log filter, overridden by RUST_LOG")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the console API for the browser dashboard (default)
    Serve,
    /// Show the live dashboard in the terminal until interrupted
    Watch,
    /// Print the current statistics once
    Stats,
    /// Execute a query and print the result
    Query { sql: String },
    /// Clear the service cache
    ClearCache {
        #[arg(long, help = "Also delete persisted cache records")]
        clear_db: bool,
    },
    /// Show how the service classifies a query
    Parse { sql: String },
    /// Invalidate cached queries touching the tables of a write query
    Invalidate { sql: String },
    /// Check the service health endpoint
    Health,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub api: HttpCacheApi,
    pub poller: Arc<StatsPoller<HttpCacheApi>>,
    pub playground: Arc<QueryPlayground<HttpCacheApi>>,
}

impl AppState {
    /// Wire both components to one client. The poller is created idle.
    pub fn new(config: &ConsoleConfig) -> Self {
        let api = HttpCacheApi::new(&config.api_url);

        Self {
            poller: Arc::new(StatsPoller::new(api.clone(), config)),
            playground: Arc::new(QueryPlayground::new(api.clone(), config)),
            api,
        }
    }
}

/// Constants used throughout the application
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REFRESH_SECS: u64 = 5;
pub const DEFAULT_SQL: &str = "SELECT * FROM products LIMIT 10";
