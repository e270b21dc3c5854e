//! Machine management, including batch registration from a YAML document.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::api::{ApiClient, ApiError};
use crate::auth::TokenSession;
use crate::cli::MachinesCommand;
use crate::config::Config;
use crate::models::MachineCreate;
use crate::output;

pub async fn run(config: &Config, command: MachinesCommand) -> Result<()> {
    match command {
        MachinesCommand::List => list(config).await,
        MachinesCommand::Add {
            name,
            host,
            port,
            user,
            password,
        } => {
            add(
                config,
                MachineCreate {
                    name,
                    host,
                    port,
                    user,
                    password,
                },
            )
            .await
        }
        MachinesCommand::Delete { name } => delete(config, name).await,
    }
}

async fn list(config: &Config) -> Result<()> {
    let token = TokenSession::new(config).auth_token()?;
    let client = ApiClient::new(config)?;
    let response = client.get("/machines", Some(&token)).await?;
    output::print_json(&response.body, config.color);
    Ok(())
}

async fn add(config: &Config, mut machine: MachineCreate) -> Result<()> {
    if !machine.is_complete() {
        bail!("all fields required: --name --host --port --user --password");
    }
    let token = TokenSession::new(config).auth_token()?;
    let client = ApiClient::new(config)?;
    if client.should_rewrite(&machine.host) {
        machine.host = config.docker_host_gateway_name.clone();
    }
    let response = client.post_json("/machines", Some(&token), &machine).await?;
    if !response.is_success() {
        return Err(ApiError::from_status(response.status, &response.body)).context("add failed");
    }
    output::print_json(&response.body, config.color);
    Ok(())
}

async fn delete(config: &Config, name: String) -> Result<()> {
    let token = TokenSession::new(config).auth_token()?;
    let client = ApiClient::new(config)?;
    let response = client
        .delete(&format!("/machines/{name}"), Some(&token))
        .await?;
    if !response.is_success() {
        return Err(ApiError::from_status(response.status, &response.body))
            .context("delete failed");
    }
    println!("Deleted {name}");
    Ok(())
}

/// Accepted shapes for a register document: a top-level list of machines, or
/// a mapping with a `machines:` list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RegisterDoc {
    List(Vec<MachineCreate>),
    Keyed { machines: Vec<MachineCreate> },
}

impl RegisterDoc {
    fn into_machines(self) -> Vec<MachineCreate> {
        match self {
            RegisterDoc::List(machines) | RegisterDoc::Keyed { machines } => machines,
        }
    }
}

/// Register every complete machine entry in the file, reporting per-machine
/// results. Incomplete entries are skipped; any failed registration makes
/// the whole command fail after the batch finishes.
pub async fn register(config: &Config, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let doc: RegisterDoc = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing {}", file.display()))?;
    let machines = doc.into_machines();

    if machines.is_empty() {
        println!("No machines to register.");
        return Ok(());
    }

    let token = TokenSession::new(config).auth_token()?;
    let client = ApiClient::new(config)?;

    let mut any_failed = false;
    for mut machine in machines {
        if !machine.is_complete() {
            println!("Skipping incomplete entry: {}", machine.name);
            continue;
        }
        if client.should_rewrite(&machine.host) {
            machine.host = config.docker_host_gateway_name.clone();
        }
        match client.post_json("/machines", Some(&token), &machine).await {
            Ok(response) if response.is_success() => {
                println!("Added {} ({}:{})", machine.name, machine.host, machine.port);
            }
            Ok(response) => {
                any_failed = true;
                println!(
                    "Failed to add {}: {} {}",
                    machine.name, response.status, response.body
                );
            }
            Err(err) => {
                any_failed = true;
                println!("Failed to add {}: {err}", machine.name);
            }
        }
    }

    if any_failed {
        bail!("one or more machines failed to register");
    }
    Ok(())
}
