//! Runtime configuration for the labrig CLI.
//!
//! A `Config` is resolved exactly once per invocation by merging four layers
//! (built-in defaults, the YAML config file, environment variables, and
//! explicitly-supplied command-line flags) and is then passed by reference
//! into every component that needs it. Nothing re-reads the environment or
//! flags after resolution.

mod file;
mod resolver;

pub use resolver::{config_file_path, resolve, EnvSource, Overrides, ProcessEnv};

use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Directory under the user's home that holds the config file and the
/// fallback token file.
pub const APP_DIR: &str = ".labrig";

/// Config file name inside [`APP_DIR`].
const CONFIG_FILE: &str = "config.yaml";

/// Fallback token file name inside [`APP_DIR`].
const TOKEN_FILE: &str = "token.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// How token storage is selected: the OS keychain, the fallback file, or
/// probe-and-decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Use the keychain when the probe succeeds, else the token file.
    #[default]
    Auto,
    /// Prefer the keychain; degrade to the token file if it is unavailable.
    On,
    /// Always use the token file.
    Off,
}

impl FromStr for BackendMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            _ => Err(()),
        }
    }
}

/// Whether JSON output gets ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Colorize when stdout is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for ColorMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err(()),
        }
    }
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the API, without a trailing slash.
    pub api_base: String,
    /// Path prefix prepended to every endpoint; empty or starting with `/`.
    pub api_prefix: String,
    /// Verify TLS certificates. Off by default for lab deployments with
    /// self-signed certificates.
    pub verify_tls: bool,
    /// Token cache file, used when the keychain is unavailable or disabled.
    pub token_file: PathBuf,
    /// Rewrite `localhost`/`127.0.0.1` machine hosts to the docker gateway
    /// name before registration.
    pub rewrite_localhost: bool,
    /// Hostname substituted when rewriting localhost.
    pub docker_host_gateway_name: String,
    /// Token storage selection.
    pub keychain: BackendMode,
    /// JSON output colorization.
    pub color: ColorMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://localhost/api".to_string(),
            api_prefix: String::new(),
            verify_tls: false,
            token_file: default_token_file(),
            rewrite_localhost: true,
            docker_host_gateway_name: "host.docker.internal".to_string(),
            keychain: BackendMode::Auto,
            color: ColorMode::Auto,
        }
    }
}

impl Config {
    /// Normalize fields after resolution: no trailing slash on the base URL,
    /// and a non-empty prefix always starts with `/`.
    pub fn normalize(&mut self) {
        while self.api_base.ends_with('/') {
            self.api_base.pop();
        }
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            self.api_prefix.insert(0, '/');
        }
    }
}

/// Default location of the config file: `~/.labrig/config.yaml`.
pub fn default_config_file() -> PathBuf {
    app_dir().join(CONFIG_FILE)
}

/// Default location of the fallback token file: `~/.labrig/token.json`.
pub fn default_token_file() -> PathBuf {
    app_dir().join(TOKEN_FILE)
}

fn app_dir() -> PathBuf {
    // A missing home directory degrades to a path relative to the current
    // directory rather than failing config resolution.
    dirs::home_dir().unwrap_or_default().join(APP_DIR)
}
