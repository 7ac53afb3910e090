//! RSA signature key material.
//!
//! The server signs texture payloads with an RSA key loaded from PEM
//! files at startup, generating a fresh 4096-bit pair on first run.
//! The private key is stored as PKCS#8 (`PRIVATE KEY`, mode 0600),
//! the public key as SubjectPublicKeyInfo (`PUBLIC KEY`, mode 0644),
//! which is the same PEM the `GET /` descriptor publishes.

use std::fs;
use std::path::Path;

use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::info;

/// Modulus size for generated keys.
pub const RSA_KEY_BITS: usize = 4096;

/// Key loading/signing errors.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key file io: {0}")]
    Io(#[from] std::io::Error),

    #[error("rsa: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("private key encoding: {0}")]
    Pkcs8(#[from] rsa::pkcs8::Error),

    #[error("public key encoding: {0}")]
    Spki(#[from] rsa::pkcs8::spki::Error),
}

/// The server signing key plus its published public half.
pub struct SignatureKeys {
    private: RsaPrivateKey,
    public_pem: String,
}

impl SignatureKeys {
    /// Load the keypair from PEM files, generating and persisting a
    /// fresh 4096-bit pair when the private key file is absent.
    pub fn load_or_generate(private_path: &Path, public_path: &Path) -> Result<Self, KeyError> {
        if private_path.exists() {
            let pem = fs::read_to_string(private_path)?;
            let private = RsaPrivateKey::from_pkcs8_pem(&pem)?;
            let public_pem = RsaPublicKey::from(&private).to_public_key_pem(LineEnding::LF)?;
            // Re-create the public file if it went missing; the
            // descriptor serves its content.
            if !public_path.exists() {
                write_key_file(public_path, &public_pem, 0o644)?;
            }
            return Ok(Self {
                private,
                public_pem,
            });
        }

        info!(
            path = %private_path.display(),
            bits = RSA_KEY_BITS,
            "no signature key found, generating"
        );
        let keys = Self::generate(RSA_KEY_BITS)?;
        let private_pem = keys.private.to_pkcs8_pem(LineEnding::LF)?;
        write_key_file(private_path, &private_pem, 0o600)?;
        write_key_file(public_path, &keys.public_pem, 0o644)?;
        Ok(keys)
    }

    /// Generate a fresh keypair without touching the filesystem.
    pub fn generate(bits: usize) -> Result<Self, KeyError> {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), bits)?;
        let public_pem = RsaPublicKey::from(&private).to_public_key_pem(LineEnding::LF)?;
        Ok(Self {
            private,
            public_pem,
        })
    }

    /// RSASSA-PKCS1-v1_5 signature over SHA-1 of `data`.
    ///
    /// SHA-1 is fixed by the protocol: clients verify texture
    /// signatures as `SHA1withRSA` against the published key.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        let digest = Sha1::digest(data);
        Ok(self.private.sign(Pkcs1v15Sign::new::<Sha1>(), &digest)?)
    }

    /// Verify a signature produced by [`SignatureKeys::sign`].
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let digest = Sha1::digest(data);
        RsaPublicKey::from(&self.private)
            .verify(Pkcs1v15Sign::new::<Sha1>(), &digest, signature)
            .is_ok()
    }

    /// The SubjectPublicKeyInfo PEM of the public key.
    pub fn public_key_pem(&self) -> &str {
        &self.public_pem
    }
}

fn write_key_file(path: &Path, contents: &str, mode: u32) -> Result<(), KeyError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Small modulus keeps test-time key generation fast; the signing
    // path is identical to the 4096-bit production case.
    const TEST_BITS: usize = 1024;

    #[test]
    fn sign_verify_round_trip() {
        let keys = SignatureKeys::generate(TEST_BITS).unwrap();
        let sig = keys.sign(b"payload").unwrap();
        assert!(keys.verify(b"payload", &sig));
        assert!(!keys.verify(b"tampered", &sig));
    }

    #[test]
    fn public_pem_is_spki() {
        let keys = SignatureKeys::generate(TEST_BITS).unwrap();
        assert!(keys.public_key_pem().starts_with("-----BEGIN PUBLIC KEY-----"));
    }

    #[test]
    fn load_or_generate_persists_and_reloads() {
        let dir = std::env::temp_dir().join(format!("askr-keys-{}", std::process::id()));
        let private = dir.join("private.pem");
        let public = dir.join("public.pem");
        let _ = fs::remove_dir_all(&dir);

        // First call generates 4096-bit keys; skip in unit tests and
        // exercise the reload path with a pre-generated pair instead.
        let keys = SignatureKeys::generate(TEST_BITS).unwrap();
        let pem = keys.private.to_pkcs8_pem(LineEnding::LF).unwrap();
        write_key_file(&private, &pem, 0o600).unwrap();

        let reloaded = SignatureKeys::load_or_generate(&private, &public).unwrap();
        assert_eq!(reloaded.public_key_pem(), keys.public_key_pem());
        assert!(public.exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
