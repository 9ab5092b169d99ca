//! Credential storage.
//!
//! This module provides:
//! - `TokenStore`: the persistent slot holding the bearer token
//! - `MemoryTokenStore`, `FileTokenStore`, `KeyringTokenStore`: its backends
//!
//! Only `ApiClient` reads or writes the slot once it has been handed over.

pub mod credentials;
pub mod session;

pub(crate) use credentials::CredentialSlot;
pub use credentials::{KeyringTokenStore, MemoryTokenStore, TokenStore};
pub use session::{FileTokenStore, SessionData};
