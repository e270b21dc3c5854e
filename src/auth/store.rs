//! Token persistence backends.
//!
//! One credential record per distinct API endpoint, stored either in the OS
//! keychain (macOS Keychain, Windows Credential Manager, Linux Secret
//! Service) or in an access-restricted JSON file. Backend selection probes
//! the keychain with a real write because that is the only reliable signal
//! that a secret service exists and is unlocked in the current session.

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::BackendMode;

/// Keychain service identity shared by all labrig entries.
pub const SERVICE_NAME: &str = "labrig-cli";

/// Key used by the capability probe. Never holds real state.
const PROBE_KEY: &str = "__labrig-cli_probe__";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no cached token")]
    TokenNotFound,
    #[error("cached token expired at {0}")]
    TokenExpired(DateTime<Utc>),
    #[error("keychain unavailable: {0}")]
    Unavailable(#[source] keyring::Error),
    #[error("stored token record is malformed: {0}")]
    MalformedRecord(#[source] serde_json::Error),
    #[error("token file error: {0}")]
    Io(#[from] std::io::Error),
}

/// The persisted credential record. `expires_at` absent means "no known
/// expiry" and the record never expires on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A selected token backend. Uniform save/load/delete; neither variant ever
/// touches the other's storage.
#[derive(Debug)]
pub enum TokenStore {
    Keyring { key: String },
    File { path: PathBuf },
}

impl TokenStore {
    /// Select a backend for the given mode, probing the keychain when the
    /// mode calls for it. Returns the store and whether the keychain won.
    pub fn select(mode: BackendMode, key: String, file_path: PathBuf) -> (Self, bool) {
        Self::select_with(mode, key, file_path, keyring_available)
    }

    /// Selection with an injectable probe, so tests can cover the full
    /// decision table without a real keychain.
    ///
    /// | mode | probe | backend  | using keychain |
    /// |------|-------|----------|----------------|
    /// | on   | true  | keychain | true           |
    /// | on   | false | file     | false          |
    /// | off  | any   | file     | false          |
    /// | auto | true  | keychain | true           |
    /// | auto | false | file     | false          |
    pub fn select_with(
        mode: BackendMode,
        key: String,
        file_path: PathBuf,
        probe: impl FnOnce() -> bool,
    ) -> (Self, bool) {
        match mode {
            BackendMode::Off => (Self::File { path: file_path }, false),
            BackendMode::On | BackendMode::Auto => {
                if probe() {
                    (Self::Keyring { key }, true)
                } else {
                    if mode == BackendMode::On {
                        // Requested but unavailable: degrade rather than fail
                        // so the tool stays usable.
                        warn!("keychain requested but unavailable; using token file");
                    }
                    (Self::File { path: file_path }, false)
                }
            }
        }
    }

    pub fn save(&self, record: &TokenRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(record).map_err(StoreError::MalformedRecord)?;
        match self {
            Self::Keyring { key } => {
                let entry = Entry::new(SERVICE_NAME, key).map_err(StoreError::Unavailable)?;
                entry.set_password(&json).map_err(StoreError::Unavailable)
            }
            Self::File { path } => {
                if let Some(parent) = path.parent() {
                    let mut builder = std::fs::DirBuilder::new();
                    builder.recursive(true);
                    #[cfg(unix)]
                    {
                        use std::os::unix::fs::DirBuilderExt;
                        builder.mode(0o700);
                    }
                    builder.create(parent)?;
                }
                // Owner-only permissions are set at creation, not patched on
                // afterwards, so the record is never world-readable.
                let mut opts = std::fs::OpenOptions::new();
                opts.write(true).create(true).truncate(true);
                #[cfg(unix)]
                {
                    use std::os::unix::fs::OpenOptionsExt;
                    opts.mode(0o600);
                }
                let mut f = opts.open(path)?;
                f.write_all(json.as_bytes())?;
                Ok(())
            }
        }
    }

    pub fn load(&self) -> Result<TokenRecord, StoreError> {
        let json = match self {
            Self::Keyring { key } => {
                let entry = Entry::new(SERVICE_NAME, key).map_err(StoreError::Unavailable)?;
                match entry.get_password() {
                    Ok(secret) => secret,
                    Err(keyring::Error::NoEntry) => return Err(StoreError::TokenNotFound),
                    Err(err) => return Err(StoreError::Unavailable(err)),
                }
            }
            Self::File { path } => match std::fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StoreError::TokenNotFound);
                }
                Err(err) => return Err(err.into()),
            },
        };
        serde_json::from_str(&json).map_err(StoreError::MalformedRecord)
    }

    /// Delete the record. Nothing to delete is success.
    pub fn delete(&self) -> Result<(), StoreError> {
        match self {
            Self::Keyring { key } => {
                let entry = Entry::new(SERVICE_NAME, key).map_err(StoreError::Unavailable)?;
                match entry.delete_credential() {
                    Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                    Err(err) => Err(StoreError::Unavailable(err)),
                }
            }
            Self::File { path } => match std::fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err.into()),
            },
        }
    }
}

/// Probe the OS keychain by writing and deleting a sentinel secret.
///
/// Capability detection only: its own failures are swallowed and simply
/// report "unavailable". A leftover probe entry from a crashed run is
/// harmless and gets overwritten by the next probe.
pub fn keyring_available() -> bool {
    let entry = match Entry::new(SERVICE_NAME, PROBE_KEY) {
        Ok(entry) => entry,
        Err(err) => {
            debug!(error = %err, "keychain probe: entry creation failed");
            return false;
        }
    };
    let write = entry.set_password("ok");
    // Cleanup is attempted even after a failed write so no sentinel is ever
    // left behind.
    let delete = entry.delete_credential();
    probe_verdict(write, delete)
}

/// The probe succeeds only if both the sentinel write and its delete did; a
/// store that accepts writes but cannot delete them is not usable.
fn probe_verdict(write: Result<(), keyring::Error>, delete: Result<(), keyring::Error>) -> bool {
    if let Err(err) = write {
        debug!(error = %err, "keychain probe: write failed");
        return false;
    }
    if let Err(err) = delete {
        debug!(error = %err, "keychain probe: delete failed");
        return false;
    }
    true
}

/// Stable per-endpoint key so switching API targets never reads a stale
/// token for a different target.
pub fn secret_key_for(api_base: &str, api_prefix: &str) -> String {
    format!("api:{api_base}{api_prefix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file_store(dir: &tempfile::TempDir) -> TokenStore {
        TokenStore::File {
            path: dir.path().join("store").join("token.json"),
        }
    }

    fn record(expires_at: Option<DateTime<Utc>>) -> TokenRecord {
        TokenRecord {
            access_token: "tok-123".to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_selection_decision_table() {
        let cases = [
            (BackendMode::On, true, true),
            (BackendMode::On, false, false),
            (BackendMode::Off, true, false),
            (BackendMode::Auto, true, true),
            (BackendMode::Auto, false, false),
        ];
        for (mode, probe, expect_keyring) in cases {
            let (store, using) = TokenStore::select_with(
                mode,
                "api:x".to_string(),
                PathBuf::from("/tmp/t.json"),
                || probe,
            );
            assert_eq!(using, expect_keyring, "{mode:?} probe={probe}");
            match store {
                TokenStore::Keyring { .. } => assert!(expect_keyring),
                TokenStore::File { .. } => assert!(!expect_keyring),
            }
        }
    }

    #[test]
    fn test_probe_requires_both_write_and_delete() {
        assert!(probe_verdict(Ok(()), Ok(())));
        assert!(!probe_verdict(
            Err(keyring::Error::Invalid(
                "store".to_string(),
                "unavailable".to_string(),
            )),
            Err(keyring::Error::NoEntry),
        ));
        // A store that takes writes but cannot delete them is unusable.
        assert!(!probe_verdict(Ok(()), Err(keyring::Error::NoEntry)));
    }

    #[test]
    fn test_off_mode_never_probes() {
        let (_, using) = TokenStore::select_with(
            BackendMode::Off,
            "api:x".to_string(),
            PathBuf::from("/tmp/t.json"),
            || panic!("probe must not run in off mode"),
        );
        assert!(!using);
    }

    #[test]
    fn test_file_round_trip_exact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = file_store(&dir);
        let expiry = Utc.with_ymd_and_hms(2031, 5, 1, 12, 0, 0).unwrap();
        let rec = record(Some(expiry));
        store.save(&rec).expect("save");
        assert_eq!(store.load().expect("load"), rec);
    }

    #[test]
    fn test_file_round_trip_without_expiry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = file_store(&dir);
        store.save(&record(None)).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded.expires_at, None);
    }

    #[test]
    fn test_absent_expiry_is_omitted_from_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = file_store(&dir);
        store.save(&record(None)).expect("save");
        let raw = std::fs::read_to_string(dir.path().join("store").join("token.json"))
            .expect("read");
        assert!(raw.contains("access_token"));
        assert!(!raw.contains("expires_at"));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            file_store(&dir).load(),
            Err(StoreError::TokenNotFound)
        ));
    }

    #[test]
    fn test_load_garbage_is_malformed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").expect("write");
        let store = TokenStore::File { path };
        assert!(matches!(
            store.load(),
            Err(StoreError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = file_store(&dir);
        store.delete().expect("delete on empty store");
        store.save(&record(None)).expect("save");
        store.delete().expect("delete");
        store.delete().expect("second delete");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let store = file_store(&dir);
        store.save(&record(None)).expect("save");

        let file_mode = std::fs::metadata(dir.path().join("store").join("token.json"))
            .expect("file metadata")
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);

        let dir_mode = std::fs::metadata(dir.path().join("store"))
            .expect("dir metadata")
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn test_secret_key_is_per_endpoint() {
        assert_eq!(
            secret_key_for("https://lab.example.com", "/api"),
            "api:https://lab.example.com/api"
        );
        assert_ne!(
            secret_key_for("https://a", ""),
            secret_key_for("https://b", "")
        );
    }
}
