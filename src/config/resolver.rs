//! Four-layer configuration resolution.
//!
//! Per-field precedence, highest wins:
//!
//! 1. explicitly-supplied command-line flag
//! 2. environment variable
//! 3. config file value
//! 4. built-in default
//!
//! Each field resolves independently against its own (flag, env var, file
//! key, default) registry entry; `--api-base` from a flag never drags
//! `verify_tls` along with it. A present-but-empty environment variable or
//! flag counts as "not supplied" and falls through, so an unset shell
//! variable can never blank out a configured field.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::{file, BackendMode, ColorMode, Config, ConfigError};

/// Environment variable naming the config file, honored when `--config` is
/// not given.
const CONFIG_FILE_ENV: &str = "CONFIG_FILE";

/// Source of environment variables. Production uses [`ProcessEnv`]; tests
/// substitute a map so resolution never touches the real environment.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Flag-layer values. `None` means the flag was not given on the command
/// line, so a flag left at its built-in default never masks a file or
/// environment value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_base: Option<String>,
    pub api_prefix: Option<String>,
    pub verify_tls: Option<bool>,
    pub token_file: Option<PathBuf>,
    pub rewrite_localhost: Option<bool>,
    pub docker_host_gateway_name: Option<String>,
    pub keychain: Option<BackendMode>,
    pub color: Option<ColorMode>,
}

/// Pick the winning value for one field. The order of the arguments is the
/// precedence order.
fn pick<T>(flag: Option<T>, env: Option<T>, file: Option<T>, default: T) -> T {
    flag.or(env).or(file).unwrap_or(default)
}

/// Trimmed, non-empty string, or fall-through.
fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_str(env: &dyn EnvSource, key: &str) -> Option<String> {
    non_empty(env.var(key))
}

/// Parse a boolean environment variable. Accepts `1/true/yes/on` and
/// `0/false/no/off`, case-insensitive; anything else falls through with a
/// warning.
fn env_bool(env: &dyn EnvSource, key: &str) -> Option<bool> {
    let raw = env_str(env, key)?;
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!(var = key, value = %raw, "unrecognized boolean value; ignoring");
            None
        }
    }
}

fn env_parsed<T: std::str::FromStr>(env: &dyn EnvSource, key: &str) -> Option<T> {
    let raw = env_str(env, key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = key, value = %raw, "unrecognized value; ignoring");
            None
        }
    }
}

/// Location of the config file: `--config` flag, then `CONFIG_FILE`, then
/// `~/.labrig/config.yaml`.
pub fn config_file_path(flag: Option<PathBuf>, env: &dyn EnvSource) -> PathBuf {
    flag.or_else(|| env_str(env, CONFIG_FILE_ENV).map(PathBuf::from))
        .unwrap_or_else(super::default_config_file)
}

/// Resolve the runtime configuration from all four layers.
///
/// A missing config file contributes nothing; a malformed one aborts with
/// [`ConfigError`] naming the path. The result is normalized (§`Config::normalize`)
/// and immutable for the rest of the invocation.
pub fn resolve(
    config_file: &Path,
    env: &dyn EnvSource,
    flags: &Overrides,
) -> Result<Config, ConfigError> {
    let fc = file::load(config_file)?;
    let d = Config::default();

    let mut cfg = Config {
        api_base: pick(
            non_empty(flags.api_base.clone()),
            env_str(env, "API_BASE"),
            fc.api_base,
            d.api_base,
        ),
        api_prefix: pick(
            non_empty(flags.api_prefix.clone()),
            env_str(env, "API_PREFIX"),
            fc.api_prefix,
            d.api_prefix,
        ),
        verify_tls: pick(
            flags.verify_tls,
            env_bool(env, "VERIFY_TLS"),
            fc.verify_tls,
            d.verify_tls,
        ),
        token_file: pick(
            flags.token_file.clone().filter(|p| !p.as_os_str().is_empty()),
            env_str(env, "TOKEN_FILE").map(PathBuf::from),
            fc.token_file,
            d.token_file,
        ),
        rewrite_localhost: pick(
            flags.rewrite_localhost,
            env_bool(env, "REWRITE_LOCALHOST"),
            fc.rewrite_localhost,
            d.rewrite_localhost,
        ),
        docker_host_gateway_name: pick(
            non_empty(flags.docker_host_gateway_name.clone()),
            env_str(env, "DOCKER_HOST_GATEWAY_NAME"),
            fc.docker_host_gateway_name,
            d.docker_host_gateway_name,
        ),
        keychain: pick(
            flags.keychain,
            env_parsed(env, "KEYCHAIN"),
            fc.keychain,
            d.keychain,
        ),
        color: pick(flags.color, env_parsed(env, "COLOR"), fc.color, d.color),
    };

    cfg.normalize();
    Ok(cfg)
}
