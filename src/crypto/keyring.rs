use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::Rng;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use super::session::SessionCodec;
use super::vault::CredentialVault;
use crate::config::SecurityConfig;

/// Returned for every decryption failure. The cause is deliberately not kept.
#[derive(Debug, Error)]
#[error("encrypted payload could not be decrypted")]
pub struct DecryptError;

/// Process-wide key material, loaded once at startup.
pub struct KeyRing {
    private_key: RsaPrivateKey,
    public_key_pem: String,
    vault_key: [u8; 32],
    session_secret: Vec<u8>,
}

impl KeyRing {
    /// Loads key material from `keys_dir`, generating any missing piece.
    ///
    /// RSA generation is CPU heavy; call this from a blocking task.
    pub fn load_or_generate(config: &SecurityConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.keys_dir)
            .with_context(|| format!("Failed to create keys directory: {}", config.keys_dir))?;

        let private_key = load_or_generate_private_key(&config.private_key_path(), config.rsa_key_bits)?;
        let vault_key = load_or_generate_secret(&config.vault_key_path())?;

        let session_secret = match &config.session_secret {
            Some(secret) if !secret.is_empty() => secret.as_bytes().to_vec(),
            _ => load_or_generate_secret(&config.session_secret_path())?.to_vec(),
        };

        Self::from_parts(private_key, vault_key, session_secret)
    }

    /// Builds an in-memory key ring that is never written to disk.
    pub fn generate(rsa_bits: usize) -> Result<Self> {
        let private_key = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, rsa_bits)
            .context("Failed to generate RSA key")?;
        let mut rng = rand::rng();
        Self::from_parts(private_key, rng.random(), rng.random::<[u8; 32]>().to_vec())
    }

    pub fn from_parts(
        private_key: RsaPrivateKey,
        vault_key: [u8; 32],
        session_secret: Vec<u8>,
    ) -> Result<Self> {
        let public_key_pem = RsaPublicKey::from(&private_key)
            .to_public_key_pem(LineEnding::LF)
            .context("Failed to encode public key")?;

        Ok(Self {
            private_key,
            public_key_pem,
            vault_key,
            session_secret,
        })
    }

    /// SubjectPublicKeyInfo PEM served to clients.
    #[must_use]
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey::from(&self.private_key)
    }

    /// Decodes base64 ciphertext and decrypts it with PKCS#1 v1.5 padding.
    pub fn decrypt_password(&self, encrypted: &str) -> Result<String, DecryptError> {
        let ciphertext = STANDARD
            .decode(encrypted.trim())
            .map_err(|_| DecryptError)?;

        let plaintext = self
            .private_key
            .decrypt(Pkcs1v15Encrypt, &ciphertext)
            .map_err(|_| DecryptError)?;

        String::from_utf8(plaintext).map_err(|_| DecryptError)
    }

    #[must_use]
    pub fn vault(&self) -> CredentialVault {
        CredentialVault::new(&self.vault_key)
    }

    #[must_use]
    pub fn session_codec(&self, ttl: chrono::Duration) -> SessionCodec {
        SessionCodec::new(&self.session_secret, ttl)
    }
}

fn load_or_generate_private_key(path: &Path, bits: usize) -> Result<RsaPrivateKey> {
    if path.exists() {
        let pem = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read private key: {}", path.display()))?;
        return RsaPrivateKey::from_pkcs8_pem(&pem)
            .with_context(|| format!("Failed to parse private key: {}", path.display()));
    }

    info!(bits, "Generating RSA key pair at {}", path.display());
    let key = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, bits)
        .context("Failed to generate RSA key")?;
    let pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .context("Failed to encode private key")?;
    write_private_file(path, pem.as_bytes())?;
    Ok(key)
}

fn load_or_generate_secret(path: &Path) -> Result<[u8; 32]> {
    if path.exists() {
        let encoded = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file: {}", path.display()))?;
        let bytes = STANDARD
            .decode(encoded.trim())
            .with_context(|| format!("Key file is not valid base64: {}", path.display()))?;
        return <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| anyhow::anyhow!("Key file must hold 32 bytes: {}", path.display()));
    }

    info!("Generating key file at {}", path.display());
    let secret: [u8; 32] = rand::rng().random();
    write_private_file(path, STANDARD.encode(secret).as_bytes())?;
    Ok(secret)
}

fn write_private_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write key file: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
            warn!("Failed to restrict permissions on {}: {}", path.display(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypt(ring: &KeyRing, plaintext: &str) -> String {
        let ciphertext = ring
            .public_key()
            .encrypt(&mut rsa::rand_core::OsRng, Pkcs1v15Encrypt, plaintext.as_bytes())
            .unwrap();
        STANDARD.encode(ciphertext)
    }

    #[test]
    fn test_decrypt_round_trip() {
        let ring = KeyRing::generate(1024).unwrap();
        let encrypted = encrypt(&ring, "hunter2");
        assert_eq!(ring.decrypt_password(&encrypted).unwrap(), "hunter2");
    }

    #[test]
    fn test_malformed_base64_is_rejected() {
        let ring = KeyRing::generate(1024).unwrap();
        assert!(ring.decrypt_password("%%% not base64 %%%").is_err());
    }

    #[test]
    fn test_foreign_ciphertext_is_rejected() {
        let ring = KeyRing::generate(1024).unwrap();
        let other = KeyRing::generate(1024).unwrap();
        let encrypted = encrypt(&other, "hunter2");
        assert!(ring.decrypt_password(&encrypted).is_err());
    }

    #[test]
    fn test_public_key_is_spki_pem() {
        let ring = KeyRing::generate(1024).unwrap();
        assert!(ring.public_key_pem().starts_with("-----BEGIN PUBLIC KEY-----"));
    }

    #[test]
    fn test_load_or_generate_persists_and_reloads() {
        let dir = std::env::temp_dir().join(format!("forumbridge-keys-{}", uuid::Uuid::new_v4()));
        let config = SecurityConfig {
            keys_dir: dir.to_string_lossy().to_string(),
            rsa_key_bits: 1024,
            ..SecurityConfig::default()
        };

        let first = KeyRing::load_or_generate(&config).unwrap();
        assert!(config.private_key_path().exists());
        assert!(config.vault_key_path().exists());
        assert!(config.session_secret_path().exists());

        let second = KeyRing::load_or_generate(&config).unwrap();
        assert_eq!(first.public_key_pem(), second.public_key_pem());

        let sealed = first.vault().seal("secret").unwrap();
        assert_eq!(second.vault().open(&sealed).unwrap(), "secret");

        let _ = std::fs::remove_dir_all(dir);
    }
}
