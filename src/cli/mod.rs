//! Command-line definitions.
//!
//! Every global flag is `Option`al with no clap-level default, so "the flag
//! was explicitly supplied" is directly observable and a flag left unset can
//! never shadow an environment or config-file value. Defaults live in
//! `Config::default()` only.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{BackendMode, ColorMode, Overrides};

#[derive(Parser, Debug)]
#[command(
    name = "labrig",
    version,
    about = "CLI for the LabRig API (manage users, machines, and reservations)"
)]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to config file (YAML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the API (e.g. https://localhost/api)
    #[arg(long, global = true, value_name = "URL")]
    pub api_base: Option<String>,

    /// API prefix path prepended to every endpoint
    #[arg(long, global = true, value_name = "PATH")]
    pub api_prefix: Option<String>,

    /// Verify TLS certificates
    #[arg(long, global = true, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_name = "BOOL")]
    pub verify_tls: Option<bool>,

    /// Token cache file (used if the keychain is unavailable or disabled)
    #[arg(long, global = true, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Rewrite localhost/127.0.0.1 machine hosts to the docker gateway name
    #[arg(long, global = true, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_name = "BOOL")]
    pub rewrite_localhost: Option<bool>,

    /// Name used when rewriting localhost
    #[arg(long = "docker-host", global = true, value_name = "NAME")]
    pub docker_host: Option<String>,

    /// Keychain usage
    #[arg(long, global = true, value_enum, value_name = "MODE")]
    pub keychain: Option<BackendMode>,

    /// Colorize JSON output
    #[arg(long, global = true, value_enum, value_name = "MODE")]
    pub color: Option<ColorMode>,
}

impl GlobalArgs {
    /// Flag layer for config resolution.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            api_base: self.api_base.clone(),
            api_prefix: self.api_prefix.clone(),
            verify_tls: self.verify_tls,
            token_file: self.token_file.clone(),
            rewrite_localhost: self.rewrite_localhost,
            docker_host_gateway_name: self.docker_host.clone(),
            keychain: self.keychain,
            color: self.color,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Login and cache the token (OS keychain when available)
    Login {
        /// Username (prompted for when omitted)
        #[arg(short, long)]
        username: Option<String>,
        /// Password (omit to prompt without echo)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Delete the cached token
    Logout,

    /// Show current user info
    Whoami,

    /// Manage users (admin)
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },

    /// Self-register a new user
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Log in and cache the token after signup
        #[arg(long)]
        login: bool,
    },

    /// Manage machines
    Machines {
        #[command(subcommand)]
        command: MachinesCommand,
    },

    /// List active reservations
    Reservations,

    /// Reserve N machines
    Reserve {
        /// Number of machines
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// Duration in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,
        /// Reservation password to set on the machines
        #[arg(long)]
        password: String,
        /// Logical username to reserve for (defaults to the API user)
        #[arg(long = "as-user")]
        as_user: Option<String>,
    },

    /// Register machines from a YAML file (admin)
    Register {
        /// Path to a machines YAML document
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List users (admin)
    List,
    /// Create a user (admin)
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Grant admin rights
        #[arg(long)]
        admin: bool,
    },
    /// Delete a user (admin)
    Delete {
        #[arg(long)]
        username: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum MachinesCommand {
    /// List machines
    List,
    /// Add a machine (admin)
    Add {
        #[arg(long)]
        name: String,
        /// Machine host (rewritten if localhost/127.0.0.1)
        #[arg(long)]
        host: String,
        /// SSH port
        #[arg(long, default_value_t = 22)]
        port: u16,
        /// SSH user
        #[arg(long, default_value = "root")]
        user: String,
        /// SSH password
        #[arg(long)]
        password: String,
    },
    /// Delete a machine (admin)
    Delete {
        #[arg(long)]
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_unset_global_flags_are_none() {
        let cli = Cli::try_parse_from(["labrig", "whoami"]).expect("parse");
        let o = cli.globals.overrides();
        assert!(o.api_base.is_none());
        assert!(o.verify_tls.is_none());
        assert!(o.keychain.is_none());
    }

    #[test]
    fn test_explicit_flags_are_captured() {
        let cli = Cli::try_parse_from([
            "labrig",
            "--api-base",
            "https://lab",
            "--verify-tls",
            "--keychain",
            "off",
            "whoami",
        ])
        .expect("parse");
        let o = cli.globals.overrides();
        assert_eq!(o.api_base.as_deref(), Some("https://lab"));
        assert_eq!(o.verify_tls, Some(true));
        assert_eq!(o.keychain, Some(BackendMode::Off));
    }

    #[test]
    fn test_bool_flag_accepts_explicit_false() {
        let cli = Cli::try_parse_from(["labrig", "--rewrite-localhost=false", "whoami"])
            .expect("parse");
        assert_eq!(cli.globals.rewrite_localhost, Some(false));

        let cli = Cli::try_parse_from(["labrig", "--verify-tls", "whoami"]).expect("parse");
        assert_eq!(cli.globals.verify_tls, Some(true));
    }
}
