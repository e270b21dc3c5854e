//! User management and self-service signup.

use anyhow::{Context, Result};

use crate::api::{ApiClient, ApiError};
use crate::auth::TokenSession;
use crate::cli::UsersCommand;
use crate::config::Config;
use crate::models::{UserCreate, UserSignup};
use crate::output;

pub async fn run(config: &Config, command: UsersCommand) -> Result<()> {
    match command {
        UsersCommand::List => list(config).await,
        UsersCommand::Create {
            username,
            password,
            admin,
        } => create(config, username, password, admin).await,
        UsersCommand::Delete { username } => delete(config, username).await,
    }
}

async fn list(config: &Config) -> Result<()> {
    let token = TokenSession::new(config).auth_token()?;
    let client = ApiClient::new(config)?;
    let response = client.get("/users", Some(&token)).await?;
    output::print_json(&response.body, config.color);
    Ok(())
}

async fn create(config: &Config, username: String, password: String, admin: bool) -> Result<()> {
    let token = TokenSession::new(config).auth_token()?;
    let client = ApiClient::new(config)?;
    let payload = UserCreate {
        username,
        password,
        is_admin: admin,
    };
    let response = client.post_json("/users", Some(&token), &payload).await?;
    if !response.is_success() {
        return Err(ApiError::from_status(response.status, &response.body))
            .context("create failed");
    }
    output::print_json(&response.body, config.color);
    Ok(())
}

async fn delete(config: &Config, username: String) -> Result<()> {
    let token = TokenSession::new(config).auth_token()?;
    let client = ApiClient::new(config)?;
    let response = client
        .delete(&format!("/users/{username}"), Some(&token))
        .await?;
    if !response.is_success() {
        return Err(ApiError::from_status(response.status, &response.body))
            .context("delete failed");
    }
    println!("Deleted user {username}");
    Ok(())
}

/// POST /register, no token required. Optionally logs in afterwards so the
/// new account is immediately usable.
pub async fn signup(
    config: &Config,
    username: String,
    password: String,
    auto_login: bool,
) -> Result<()> {
    let client = ApiClient::new(config)?;
    let payload = UserSignup {
        username: username.clone(),
        password: password.clone(),
    };
    let response = client.post_json("/register", None, &payload).await?;
    if !response.is_success() {
        return Err(ApiError::from_status(response.status, &response.body))
            .context("signup failed");
    }
    println!("Signup successful.");

    if auto_login {
        let (token, expires_at) = client.login(&username, &password).await?;
        let session = TokenSession::new(config);
        session.save_token(&token, Some(expires_at))?;
        if session.using_keyring() {
            println!("Logged in. Token stored in the OS keychain.");
        } else {
            println!("Logged in. Token cached at: {}", config.token_file.display());
        }
    }
    Ok(())
}
