//! YAML configuration.
//!
//! The file path comes from the first CLI argument, falling back to
//! `config.yaml`. Malformed configuration is a startup failure.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub read_timeout: u64,
    /// Response timeout in seconds.
    #[serde(default = "default_timeout")]
    pub write_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime in seconds.
    #[serde(default = "default_token_expire")]
    pub token_expire: u64,
    /// Master key wrapping share secrets at rest, 32 bytes hex-encoded.
    pub master_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `stdout` or a file path.
    #[serde(default = "default_log_output")]
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_token_expire() -> u64 {
    86_400
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_output() -> String {
    "stdout".to_string()
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "please-change-password".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: default_log_output(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

impl Config {
    /// Load and parse the configuration file.
    pub fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path}"))?;
        let config: Config =
            serde_yaml::from_str(&raw).with_context(|| format!("failed to parse {path}"))?;
        config.master_key()?;
        Ok(config)
    }

    /// Decode the share-wrapping master key.
    pub fn master_key(&self) -> Result<[u8; 32]> {
        let bytes = hex::decode(&self.auth.master_key).context("auth.master_key is not hex")?;
        bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("auth.master_key must be 32 bytes (64 hex chars)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
server:
  port: 8080
  read_timeout: 10
database:
  path: /tmp/cosign-test.db
auth:
  token_expire: 3600
  master_key: "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"
log:
  level: debug
admin:
  username: root
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.read_timeout, 10);
        assert_eq!(config.server.write_timeout, 30);
        assert_eq!(config.auth.token_expire, 3600);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.output, "stdout");
        assert_eq!(config.admin.username, "root");
        assert_eq!(config.admin.password, "please-change-password");
        assert_eq!(config.master_key().unwrap().len(), 32);
    }

    #[test]
    fn rejects_bad_master_key() {
        let yaml = r#"
server:
  port: 8080
database:
  path: /tmp/x
auth:
  master_key: "abcd"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.master_key().is_err());
    }
}
