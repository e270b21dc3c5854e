//! Token session on top of a selected backend.
//!
//! Adds expiry semantics to the raw save/load/delete operations and owns the
//! one user-facing contract the HTTP layer relies on: `auth_token` either
//! yields a bearer token or a single "log in first" error. Backend-specific
//! failure detail stays in the diagnostic log.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::Config;

use super::store::{self, StoreError, TokenRecord, TokenStore};

pub struct TokenSession {
    store: TokenStore,
    using_keyring: bool,
}

impl TokenSession {
    /// Select a backend for this configuration and wrap it.
    pub fn new(config: &Config) -> Self {
        let key = store::secret_key_for(&config.api_base, &config.api_prefix);
        let (store, using_keyring) =
            TokenStore::select(config.keychain, key, config.token_file.clone());
        Self {
            store,
            using_keyring,
        }
    }

    /// Wrap an already-selected store, bypassing backend selection.
    #[cfg(test)]
    pub fn with_store(store: TokenStore, using_keyring: bool) -> Self {
        Self {
            store,
            using_keyring,
        }
    }

    /// Whether the token lives in the OS keychain rather than the file.
    pub fn using_keyring(&self) -> bool {
        self.using_keyring
    }

    /// Persist a token. Propagates backend errors unchanged.
    pub fn save_token(
        &self,
        raw: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        self.store.save(&TokenRecord {
            access_token: raw.to_string(),
            expires_at,
        })
    }

    /// Load and validate the cached token.
    ///
    /// Fails with `TokenNotFound` if nothing is cached and `TokenExpired`
    /// (carrying the recorded expiry) if the record has one in the past. A
    /// record without an expiry is always valid.
    pub fn load_token(&self) -> Result<TokenRecord, StoreError> {
        let record = self.store.load()?;
        if record.access_token.is_empty() {
            return Err(StoreError::TokenNotFound);
        }
        if let Some(expires_at) = record.expires_at {
            if Utc::now() > expires_at {
                return Err(StoreError::TokenExpired(expires_at));
            }
        }
        Ok(record)
    }

    /// Bearer token for authenticated requests, or one re-login instruction.
    pub fn auth_token(&self) -> anyhow::Result<String> {
        match self.load_token() {
            Ok(record) => Ok(record.access_token),
            Err(err) => {
                // Malformed records get a distinct diagnostic; to the user
                // they all mean the same thing.
                match &err {
                    StoreError::MalformedRecord(_) => {
                        warn!(error = %err, "cached token record unreadable")
                    }
                    _ => debug!(error = %err, "no usable cached token"),
                }
                Err(anyhow!("no valid token found; run `labrig login` first"))
            }
        }
    }

    /// Delete the cached token. Nothing cached is success.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.delete()
    }
}
