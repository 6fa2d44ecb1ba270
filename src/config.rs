//! Configuration management for the election system
//!
//! Loads storage, ballot and logging settings from environment variables with validation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// SQLite connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL (`sqlite://votebox.db`, `sqlite::memory:`)
    pub url: String,

    /// Upper bound on pooled connections
    pub max_connections: u32,

    /// How long SQLite waits on a locked database before failing (milliseconds)
    pub busy_timeout_ms: u64,

    /// How long a caller waits for a pooled connection before failing (seconds)
    pub acquire_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://votebox.db".to_string());

        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", "5")?;
        let busy_timeout_ms = parse_var("DATABASE_BUSY_TIMEOUT_MS", "5000")?;
        let acquire_timeout_seconds = parse_var("DATABASE_ACQUIRE_TIMEOUT_SECS", "10")?;

        let config = Self {
            url,
            max_connections,
            busy_timeout_ms,
            acquire_timeout_seconds,
        };
        config.validate()?;
        Ok(config)
    }

    /// In-memory database for tests
    pub fn for_testing() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            busy_timeout_ms: 1000,
            acquire_timeout_seconds: 5,
        }
    }

    /// True when the database lives only as long as its connection
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::configuration("DATABASE_URL must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(Error::configuration(
                "DATABASE_MAX_CONNECTIONS must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Ballot rules enforced by the candidate registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElectionRules {
    /// Lowest ballot number a candidate may hold
    pub ballot_number_min: i64,

    /// Highest ballot number a candidate may hold
    pub ballot_number_max: i64,

    /// Offices candidates may run for; `None` accepts any office name
    pub offices: Option<Vec<String>>,
}

impl Default for ElectionRules {
    fn default() -> Self {
        Self {
            ballot_number_min: 10,
            ballot_number_max: 999,
            offices: None,
        }
    }
}

impl ElectionRules {
    /// Load ballot rules from environment variables
    pub fn from_env() -> Result<Self> {
        let ballot_number_min = parse_var("BALLOT_NUMBER_MIN", "10")?;
        let ballot_number_max = parse_var("BALLOT_NUMBER_MAX", "999")?;

        let offices = std::env::var("ELECTION_OFFICES").ok().and_then(|raw| {
            let offices: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|office| !office.is_empty())
                .map(str::to_string)
                .collect();
            (!offices.is_empty()).then_some(offices)
        });

        let rules = Self {
            ballot_number_min,
            ballot_number_max,
            offices,
        };
        rules.validate()?;
        Ok(rules)
    }

    /// Check the rules are internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.ballot_number_min > self.ballot_number_max {
            return Err(Error::configuration(format!(
                "BALLOT_NUMBER_MIN ({}) exceeds BALLOT_NUMBER_MAX ({})",
                self.ballot_number_min, self.ballot_number_max
            )));
        }
        if self.ballot_number_min < 0 {
            return Err(Error::configuration("BALLOT_NUMBER_MIN must not be negative"));
        }
        Ok(())
    }

    pub fn ballot_number_in_range(&self, ballot_number: i64) -> bool {
        (self.ballot_number_min..=self.ballot_number_max).contains(&ballot_number)
    }

    pub fn allows_office(&self, office: &str) -> bool {
        match &self.offices {
            Some(offices) => offices.iter().any(|allowed| allowed == office),
            None => true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub rules: ElectionRules,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let database = DatabaseConfig::from_env()?;
        let rules = ElectionRules::from_env()?;

        let logging = LoggingConfig {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        };

        Ok(Self {
            database,
            rules,
            logging,
        })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            database: DatabaseConfig::for_testing(),
            rules: ElectionRules::default(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T> {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| Error::configuration(format!("Invalid {name}")))
}
