//! Configuration for maildrip

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// SMTP relay configuration
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Dispatch scheduler configuration
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database backend: only "postgres" is supported
    #[serde(default = "default_db_backend")]
    pub backend: String,

    /// Database URL
    pub url: Option<String>,

    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_db_backend() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

/// Outbound SMTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Relay host
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// Relay port
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Username for SMTP AUTH
    pub username: Option<String>,

    /// Password for SMTP AUTH
    pub password: Option<String>,

    /// Use implicit TLS
    #[serde(default)]
    pub use_tls: bool,

    /// Use STARTTLS
    #[serde(default = "default_use_starttls")]
    pub use_starttls: bool,

    /// Envelope/header From address for outgoing mail
    #[serde(default = "default_from_address")]
    pub from_address: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            use_tls: false,
            use_starttls: default_use_starttls(),
            from_address: default_from_address(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

fn default_use_starttls() -> bool {
    true
}

fn default_from_address() -> String {
    "noreply@localhost".to_string()
}

/// Dispatch scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Seconds between dispatch passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// IANA timezone name used when evaluating schedules
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timezone: default_timezone(),
        }
    }
}

fn default_interval_secs() -> u64 {
    30
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl DispatchConfig {
    /// Parse the configured timezone name
    pub fn tz(&self) -> crate::Result<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| crate::Error::Config(format!("Unknown timezone: {}", self.timezone)))
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> crate::Result<Self> {
        let paths = [
            std::path::PathBuf::from("./config.toml"),
            std::path::PathBuf::from("/etc/maildrip/config.toml"),
        ];

        for path in paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(crate::Error::Config(
            "No configuration file found".to_string(),
        ))
    }
}
