//! Configuration management for the inventory server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with INV_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub jwt: JwtConfig,

    /// Ledger and listing behaviour
    pub inventory: InventoryConfig,

    /// Report export rendering
    pub export: ExportConfig,

    /// LAN bootstrap for shop-floor devices
    pub lan: LanConfig,

    /// First administrator, created when the users table is empty
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    pub max_connections: u32,

    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// When false, a stock-out larger than the remaining quantity is rejected
    pub allow_negative_stock: bool,

    pub report_page_size: u32,

    pub list_page_size: u32,

    pub audit_page_size: u32,

    /// Window applied to the stock-out listing when no dates are given
    pub stock_out_default_days: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// Directory holding the TTF files for PDF rendering
    pub font_dir: String,

    /// Font family name, e.g. `LiberationSans` for `LiberationSans-Regular.ttf`
    pub font_family: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LanConfig {
    pub hostname: String,
    pub port: u16,
    pub hosts_file: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BootstrapConfig {
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("INV_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 43200)?
            .set_default("inventory.allow_negative_stock", true)?
            .set_default("inventory.report_page_size", 15)?
            .set_default("inventory.list_page_size", 10)?
            .set_default("inventory.audit_page_size", 20)?
            .set_default("inventory.stock_out_default_days", 30)?
            .set_default("export.font_dir", "./fonts")?
            .set_default("export.font_family", "LiberationSans")?
            .set_default("lan.hostname", "pamela-inventory.local")?
            .set_default("lan.port", 8000)?
            .set_default("lan.hosts_file", default_hosts_file())?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (INV_ prefix)
            .add_source(
                Environment::with_prefix("INV")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn default_hosts_file() -> &'static str {
    if cfg!(windows) {
        r"C:\Windows\System32\drivers\etc\hosts"
    } else {
        "/etc/hosts"
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            allow_negative_stock: true,
            report_page_size: 15,
            list_page_size: 10,
            audit_page_size: 20,
            stock_out_default_days: 30,
        }
    }
}

impl Default for LanConfig {
    fn default() -> Self {
        Self {
            hostname: "pamela-inventory.local".to_string(),
            port: 8000,
            hosts_file: default_hosts_file().to_string(),
        }
    }
}
