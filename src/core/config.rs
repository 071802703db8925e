//! Configuration management

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use config::{
    builder::DefaultState, Config as ConfigBuilder, ConfigBuilder as Builder,
    ConfigError as BuilderError, Environment, File,
};
use clap::Parser;

/// Environment variable prefix, e.g. `SWEETSHOP_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "SWEETSHOP";

/// Placeholder secret shipped in the defaults; a warning is logged when it is in use
pub const DEFAULT_JWT_SECRET: &str = "change-this-secret-in-production";

/// Cost range accepted by bcrypt
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid security configuration: {0}")]
    InvalidSecurity(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration with precedence: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        Self::load_with_args(&cli_args)
    }

    /// Same as [`Config::load`] with already parsed arguments
    pub fn load_with_args(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;

        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(
                    config_path.display().to_string()
                ));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        builder = builder.add_source(Self::environment());

        if let Some(host) = &cli_args.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(db_path) = &cli_args.database {
            builder = builder.set_override("database.path", db_path.display().to_string())?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let config: Config = Self::defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults, the lowest priority layer
    fn defaults() -> Result<Builder<DefaultState>, ConfigError> {
        let builder = ConfigBuilder::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.request_timeout", 30)?
            .set_default("database.path", "./data/sweetshop.db")?
            .set_default("database.connection_pool_size", 10)?
            .set_default("database.busy_timeout", 5000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("logging.output", "stdout")?
            .set_default("logging.max_backups", 5)?
            .set_default("security.jwt_secret", DEFAULT_JWT_SECRET)?
            .set_default("security.token_ttl_hours", 24)?
            .set_default("security.bcrypt_cost", 12)?
            .set_default("security.allowed_origins", vec!["*"])?
            .set_default("security.allow_credentials", true)?
            .set_default("security.enable_hsts", false)?
            .set_default("security.hsts_max_age", 31536000)?;
        Ok(builder)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("security.allowed_origins")
            .try_parsing(true)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.security.validate()?;
        Ok(())
    }
}

/// Command-line arguments for configuration override
#[derive(Debug, Default, Parser)]
#[command(name = "sweet-shop")]
#[command(about = "Sweet Shop Backend Server", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database file path
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: u64, // seconds
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidServer("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidServer("port must be greater than 0".to_string()));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidServer("request_timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub connection_pool_size: usize,
    pub busy_timeout: u64, // milliseconds
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDatabase("path cannot be empty".to_string()));
        }

        if self.connection_pool_size == 0 {
            return Err(ConfigError::InvalidDatabase("connection_pool_size must be greater than 0".to_string()));
        }

        if self.busy_timeout == 0 {
            return Err(ConfigError::InvalidDatabase("busy_timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_file: Option<PathBuf>,
    pub max_backups: usize,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("level must be one of: {:?}", valid_levels)
            ));
        }

        let valid_formats = ["json", "text"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("format must be one of: {:?}", valid_formats)
            ));
        }

        let valid_outputs = ["stdout", "file"];
        if !valid_outputs.contains(&self.output.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("output must be one of: {:?}", valid_outputs)
            ));
        }

        if self.output == "file" && self.log_file.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_file must be specified when output is 'file'".to_string()
            ));
        }

        if self.max_backups == 0 {
            return Err(ConfigError::InvalidLogging("max_backups must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    pub bcrypt_cost: u32,
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
    pub enable_hsts: bool,
    pub hsts_max_age: u64, // seconds
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::InvalidSecurity("jwt_secret cannot be empty".to_string()));
        }

        if self.token_ttl_hours == 0 {
            return Err(ConfigError::InvalidSecurity("token_ttl_hours must be greater than 0".to_string()));
        }

        if !BCRYPT_COST_RANGE.contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidSecurity(format!(
                "bcrypt_cost must be between {} and {}",
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end()
            )));
        }

        if self.allowed_origins.is_empty() {
            return Err(ConfigError::InvalidSecurity("allowed_origins cannot be empty".to_string()));
        }

        if self.enable_hsts && self.hsts_max_age == 0 {
            return Err(ConfigError::InvalidSecurity("hsts_max_age must be greater than 0 when enable_hsts is true".to_string()));
        }

        if self.admin_username.is_some() != self.admin_password.is_some() {
            return Err(ConfigError::InvalidSecurity(
                "admin_username and admin_password must be set together".to_string()
            ));
        }

        Ok(())
    }

    /// True when every origin is accepted
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("sweetshop.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_from_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "");

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.connection_pool_size, 10);
        assert_eq!(config.security.token_ttl_hours, 24);
        assert_eq!(config.security.bcrypt_cost, 12);
        assert!(config.security.allows_any_origin());
        assert!(config.security.admin_username.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[server]
port = 9090

[security]
jwt_secret = "s3cret"
allowed_origins = ["https://shop.example.com"]
admin_username = "root"
admin_password = "hunter2"
"#,
        );

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.security.jwt_secret, "s3cret");
        assert!(!config.security.allows_any_origin());
        assert_eq!(config.security.admin_username.as_deref(), Some("root"));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_logging_level_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[logging]\nlevel = \"verbose\"\n");

        let result = Config::from_file(&path);
        assert!(matches!(result, Err(ConfigError::InvalidLogging(_))));
    }

    #[test]
    fn test_file_output_requires_log_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[logging]\noutput = \"file\"\n");

        let result = Config::from_file(&path);
        assert!(matches!(result, Err(ConfigError::InvalidLogging(_))));
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[security]\nbcrypt_cost = 2\n");

        let result = Config::from_file(&path);
        assert!(matches!(result, Err(ConfigError::InvalidSecurity(_))));
    }

    #[test]
    fn test_admin_credentials_must_be_paired() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[security]\nadmin_username = \"root\"\n");

        let result = Config::from_file(&path);
        assert!(matches!(result, Err(ConfigError::InvalidSecurity(_))));
    }

    #[test]
    fn test_cli_args_override_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[server]\nport = 9090\n");

        let args = CliArgs {
            config: Some(path),
            port: Some(7070),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        let config = Config::load_with_args(&args).unwrap();
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.logging.level, "debug");
    }
}
