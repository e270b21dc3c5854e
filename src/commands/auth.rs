//! login / logout / whoami.

use anyhow::{bail, Context, Result};
use dialoguer::{Input, Password};
use tracing::info;

use crate::api::ApiClient;
use crate::auth::TokenSession;
use crate::config::Config;
use crate::output;

pub async fn login(
    config: &Config,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = match username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
        Some(u) => u,
        None => Input::new()
            .with_prompt("Username")
            .interact_text()
            .context("reading username")?,
    };
    let password = match password.filter(|p| !p.is_empty()) {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("reading password")?,
    };
    if username.is_empty() || password.is_empty() {
        bail!("username and password are required");
    }

    let client = ApiClient::new(config)?;
    let (token, expires_at) = client.login(&username, &password).await?;
    info!(%expires_at, "login succeeded");

    let session = TokenSession::new(config);
    session.save_token(&token, Some(expires_at))?;

    if session.using_keyring() {
        println!("Logged in. Token stored in the OS keychain.");
    } else {
        println!("Logged in. Token cached at: {}", config.token_file.display());
    }
    Ok(())
}

pub fn logout(config: &Config) -> Result<()> {
    TokenSession::new(config).clear()?;
    println!("Logged out; cached token removed.");
    Ok(())
}

pub async fn whoami(config: &Config) -> Result<()> {
    let session = TokenSession::new(config);
    let token = session.auth_token()?;
    let client = ApiClient::new(config)?;
    let response = client.get("/whoami", Some(&token)).await?;
    output::print_json(&response.body, config.color);
    Ok(())
}
