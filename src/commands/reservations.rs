//! Reservation listing and creation.

use anyhow::{bail, Result};

use crate::api::ApiClient;
use crate::auth::TokenSession;
use crate::config::Config;
use crate::output;

pub async fn list(config: &Config) -> Result<()> {
    let token = TokenSession::new(config).auth_token()?;
    let client = ApiClient::new(config)?;
    let response = client.get("/reservations", Some(&token)).await?;
    output::print_json(&response.body, config.color);
    Ok(())
}

pub async fn reserve(
    config: &Config,
    count: u32,
    duration: u32,
    password: String,
    as_user: Option<String>,
) -> Result<()> {
    if count == 0 || duration == 0 || password.is_empty() {
        bail!("--count, --duration and --password are required and must be > 0");
    }

    let token = TokenSession::new(config).auth_token()?;
    let client = ApiClient::new(config)?;

    let mut query = vec![
        ("count", count.to_string()),
        ("duration", duration.to_string()),
        ("reservation_password", password),
    ];
    if let Some(user) = as_user.filter(|u| !u.is_empty()) {
        query.push(("username", user));
    }

    let response = client
        .get_with_query("/reserve", Some(&token), &query)
        .await?;
    output::print_json(&response.body, config.color);
    Ok(())
}
