//! Credential persistence: token pair, storage backends, and the vault that owns them.

pub mod credentials;
pub mod error;
pub mod store;
pub mod vault;

pub use credentials::Credentials;
pub use error::AuthError;
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use vault::CredentialVault;
