//! Key material and the primitives built on it.
//!
//! A [`KeyRing`] is loaded once at startup and handed to the components that
//! need it: the RSA private key decrypts incoming login passwords, the vault
//! key seals the stored provider password, and the session secret signs local
//! session tokens.

pub mod keyring;
pub mod session;
pub mod vault;

pub use keyring::{DecryptError, KeyRing};
pub use session::{SessionClaims, SessionCodec, SessionError};
pub use vault::{CredentialVault, VaultError};
