//! Application configuration loaded from environment variables.

use serde::Deserialize;
use url::Url;

use crate::session::{BetPercentages, DEFAULT_MAX_BET_PERCENTAGE, DEFAULT_MIN_BET_PERCENTAGE};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,

    /// Public origin used to build share links and preview URLs.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    // === Session Defaults ===
    /// Minimum bet as a percentage of the first bet.
    #[serde(default = "default_min_pct")]
    pub default_min_bet_percentage: u32,

    /// Maximum bet as a percentage of the first bet.
    #[serde(default = "default_max_pct")]
    pub default_max_bet_percentage: u32,

    // === Change Feed ===
    /// Buffered change notifications before slow subscribers lag.
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,

    /// Attempts for a single refresh triggered by the feed.
    #[serde(default = "default_refresh_attempts")]
    pub refresh_max_attempts: u32,

    /// Initial backoff between refresh attempts.
    #[serde(default = "default_refresh_delay")]
    pub refresh_initial_delay_ms: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_min_pct() -> u32 {
    DEFAULT_MIN_BET_PERCENTAGE
}

fn default_max_pct() -> u32 {
    DEFAULT_MAX_BET_PERCENTAGE
}

fn default_feed_capacity() -> usize {
    1024
}

fn default_refresh_attempts() -> u32 {
    3
}

fn default_refresh_delay() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            rust_log: default_log_level(),
            verbose: false,
            public_base_url: default_public_base_url(),
            default_min_bet_percentage: default_min_pct(),
            default_max_bet_percentage: default_max_pct(),
            feed_capacity: default_feed_capacity(),
            refresh_max_attempts: default_refresh_attempts(),
            refresh_initial_delay_ms: default_refresh_delay(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.default_min_bet_percentage) {
            return Err("DEFAULT_MIN_BET_PERCENTAGE must be between 1 and 100".to_string());
        }

        if self.default_max_bet_percentage < 100 {
            return Err("DEFAULT_MAX_BET_PERCENTAGE must be at least 100".to_string());
        }

        if self.feed_capacity == 0 {
            return Err("FEED_CAPACITY must be greater than 0".to_string());
        }

        if self.refresh_max_attempts == 0 {
            return Err("REFRESH_MAX_ATTEMPTS must be at least 1".to_string());
        }

        if let Err(e) = Url::parse(&self.public_base_url) {
            return Err(format!("PUBLIC_BASE_URL is not a valid URL: {}", e));
        }

        Ok(())
    }

    /// Percentages applied when a draft leaves them unset.
    pub fn default_percentages(&self) -> BetPercentages {
        BetPercentages {
            min: self.default_min_bet_percentage,
            max: self.default_max_bet_percentage,
        }
    }

    /// Tracing filter directives. Verbose output, from the config or the
    /// command line, wins over `RUST_LOG`.
    pub fn log_filter(&self, verbose: bool) -> String {
        if verbose || self.verbose {
            "frenbet=debug,info".to_string()
        } else {
            self.rust_log.clone()
        }
    }

    /// Public base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }
}
