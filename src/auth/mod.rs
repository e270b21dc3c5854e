//! Credential handling: token persistence backends, session management, and
//! expiry derivation.
//!
//! - `TokenStore`: keychain or file backend behind one save/load/delete surface
//! - `TokenSession`: expiry-aware wrapper handing bearer tokens to the API layer
//! - `expiry`: server TTL / JWT claim / fallback expiry computation

pub mod expiry;
pub mod session;
pub mod store;

pub use session::TokenSession;
pub use store::{StoreError, TokenRecord, TokenStore};
