//! Signing key management.
//!
//! Resolution order for the signing key:
//!
//!   1. environment material (`WRKR_PROOF_PRIVATE_KEY_B64`, optionally
//!      `WRKR_PROOF_PUBLIC_KEY_B64` and `WRKR_PROOF_KEY_ID`)
//!   2. the key file `proof-signing-key.json` in the governance store
//!   3. a freshly generated Ed25519 keypair, persisted with mode 0600
//!
//! Step 3 happens at most once per store: the key file is published with a
//! no-clobber rename, and a writer that loses the race loads the winner's key.
//!
//! Private keys are accepted as a 32-byte seed or as a 64-byte
//! seed-plus-public-key pair. A public key that is not the pair of the
//! private key is a fatal `KeyMismatch`.

use std::{collections::BTreeMap, fmt, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use wrkr_contracts::error::{WrkrError, WrkrResult};
use wrkr_core::{
    persist,
    traits::{RecordSigner, SignatureCheck, SignatureVerifier},
    StoreLayout,
};

pub const ENV_PRIVATE_KEY: &str = "WRKR_PROOF_PRIVATE_KEY_B64";
pub const ENV_PUBLIC_KEY: &str = "WRKR_PROOF_PUBLIC_KEY_B64";
pub const ENV_KEY_ID: &str = "WRKR_PROOF_KEY_ID";

/// Key material supplied through the environment.
///
/// Captured once per process so the rest of the crate never reads
/// process-global state.
#[derive(Debug, Clone, Default)]
pub struct KeyEnv {
    pub private_key_b64: Option<String>,
    pub public_key_b64: Option<String>,
    pub key_id: Option<String>,
}

impl KeyEnv {
    pub fn from_env() -> Self {
        Self {
            private_key_b64: env_value(ENV_PRIVATE_KEY),
            public_key_b64: env_value(ENV_PUBLIC_KEY),
            key_id: env_value(ENV_KEY_ID),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// On-disk key file.
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    key_id: String,
    public_key: String,
    /// Absent on verify-only hosts.
    #[serde(default)]
    private_key: String,
}

/// Derive a key id from a public key: first 8 bytes of SHA-256, hex.
pub fn derive_key_id(verifying_key: &VerifyingKey) -> String {
    let hash = Sha256::digest(verifying_key.as_bytes());
    hex::encode(&hash[..8])
}

/// A private signing key and its identity.
pub struct SigningKeyMaterial {
    signing_key: SigningKey,
    key_id: String,
}

impl fmt::Debug for SigningKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyMaterial")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl SigningKeyMaterial {
    /// Generate a new keypair from the OS RNG.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::from_signing_key(SigningKey::from_bytes(&seed), None)
    }

    fn from_signing_key(signing_key: SigningKey, key_id: Option<String>) -> Self {
        let key_id = key_id.unwrap_or_else(|| derive_key_id(&signing_key.verifying_key()));
        Self {
            signing_key,
            key_id,
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// The public half, for building a verifier.
    pub fn verifier_key(&self) -> VerifierKey {
        VerifierKey {
            verifying_key: self.verifying_key(),
            key_id: self.key_id.clone(),
        }
    }

    fn to_key_file(&self) -> KeyFile {
        KeyFile {
            key_id: self.key_id.clone(),
            public_key: STANDARD.encode(self.verifying_key().as_bytes()),
            private_key: STANDARD.encode(self.signing_key.to_bytes()),
        }
    }
}

impl RecordSigner for SigningKeyMaterial {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn sign(&self, digest: &[u8]) -> WrkrResult<String> {
        let signature: Signature = self.signing_key.sign(digest);
        Ok(STANDARD.encode(signature.to_bytes()))
    }
}

/// A public key and its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierKey {
    pub verifying_key: VerifyingKey,
    pub key_id: String,
}

/// Load the store's signing key, creating and persisting one on first use.
pub fn load_or_create_signing_key(
    layout: &StoreLayout,
    env: &KeyEnv,
) -> WrkrResult<SigningKeyMaterial> {
    if let Some(private_b64) = &env.private_key_b64 {
        let material = signing_from_parts(
            private_b64,
            env.public_key_b64.as_deref(),
            env.key_id.clone(),
            ENV_PRIVATE_KEY,
        )?;
        debug!(key_id = %material.key_id, "signing key loaded from environment");
        return Ok(material);
    }

    let path = layout.key_path();
    if path.exists() {
        return read_signing_key(&path);
    }

    let generated = SigningKeyMaterial::generate();
    let bytes = persist::to_pretty_json(&generated.to_key_file())?;
    if persist::write_new(&path, &bytes, Some(0o600))? {
        info!(
            key_id = %generated.key_id,
            path = %path.display(),
            "generated new proof signing key"
        );
        Ok(generated)
    } else {
        debug!(path = %path.display(), "signing key created concurrently; loading it");
        read_signing_key(&path)
    }
}

/// Load the public key used to verify the store's chain.
///
/// Never creates a key: a verifier with no key material is misconfigured.
pub fn load_verifier_key(layout: &StoreLayout, env: &KeyEnv) -> WrkrResult<VerifierKey> {
    if let Some(private_b64) = &env.private_key_b64 {
        let material = signing_from_parts(
            private_b64,
            env.public_key_b64.as_deref(),
            env.key_id.clone(),
            ENV_PRIVATE_KEY,
        )?;
        return Ok(material.verifier_key());
    }
    if let Some(public_b64) = &env.public_key_b64 {
        let verifying_key = decode_public(public_b64, ENV_PUBLIC_KEY)?;
        let key_id = env
            .key_id
            .clone()
            .unwrap_or_else(|| derive_key_id(&verifying_key));
        return Ok(VerifierKey {
            verifying_key,
            key_id,
        });
    }

    let path = layout.key_path();
    if !path.exists() {
        return Err(WrkrError::ConfigError {
            reason: format!(
                "no verifier key: set {ENV_PUBLIC_KEY} or provide '{}'",
                path.display()
            ),
        });
    }
    let file = read_key_file(&path)?;
    let verifying_key = decode_public(&file.public_key, "public_key")?;
    if !file.private_key.is_empty() {
        check_pair(&decode_private(&file.private_key, "private_key")?, &verifying_key, &file.key_id)?;
    }
    Ok(VerifierKey {
        verifying_key,
        key_id: file.key_id,
    })
}

fn read_signing_key(path: &Path) -> WrkrResult<SigningKeyMaterial> {
    let file = read_key_file(path)?;
    if file.private_key.is_empty() {
        return Err(WrkrError::ConfigError {
            reason: format!("key file '{}' has no private key", path.display()),
        });
    }
    let material = signing_from_parts(
        &file.private_key,
        Some(&file.public_key),
        Some(file.key_id),
        "private_key",
    )?;
    debug!(key_id = %material.key_id, path = %path.display(), "signing key loaded from file");
    Ok(material)
}

fn read_key_file(path: &Path) -> WrkrResult<KeyFile> {
    let text = std::fs::read_to_string(path).map_err(|e| WrkrError::ConfigError {
        reason: format!("failed to read key file '{}': {e}", path.display()),
    })?;
    serde_json::from_str(&text).map_err(|e| WrkrError::ConfigError {
        reason: format!("malformed key file '{}': {e}", path.display()),
    })
}

fn signing_from_parts(
    private_b64: &str,
    public_b64: Option<&str>,
    key_id: Option<String>,
    what: &str,
) -> WrkrResult<SigningKeyMaterial> {
    let signing_key = decode_private(private_b64, what)?;
    let material = SigningKeyMaterial::from_signing_key(signing_key, key_id);
    if let Some(public_b64) = public_b64 {
        let verifying_key = decode_public(public_b64, "public key")?;
        check_pair(&material.signing_key, &verifying_key, &material.key_id)?;
    }
    Ok(material)
}

fn check_pair(signing_key: &SigningKey, verifying_key: &VerifyingKey, key_id: &str) -> WrkrResult<()> {
    if signing_key.verifying_key() != *verifying_key {
        return Err(WrkrError::KeyMismatch {
            key_id: key_id.to_string(),
        });
    }
    Ok(())
}

fn decode_private(b64: &str, what: &str) -> WrkrResult<SigningKey> {
    let bytes = decode_b64(b64, what)?;
    match bytes.len() {
        32 => {
            let seed: [u8; 32] = bytes[..].try_into().map_err(|_| bad_length(what, 32))?;
            Ok(SigningKey::from_bytes(&seed))
        }
        64 => {
            let pair: [u8; 64] = bytes[..].try_into().map_err(|_| bad_length(what, 64))?;
            SigningKey::from_keypair_bytes(&pair).map_err(|_| WrkrError::KeyMismatch {
                key_id: what.to_string(),
            })
        }
        n => Err(WrkrError::ConfigError {
            reason: format!("{what}: expected 32 or 64 key bytes, got {n}"),
        }),
    }
}

fn decode_public(b64: &str, what: &str) -> WrkrResult<VerifyingKey> {
    let bytes = decode_b64(b64, what)?;
    let raw: [u8; 32] = bytes[..].try_into().map_err(|_| bad_length(what, 32))?;
    VerifyingKey::from_bytes(&raw).map_err(|e| WrkrError::ConfigError {
        reason: format!("{what}: not a valid Ed25519 public key: {e}"),
    })
}

fn decode_b64(b64: &str, what: &str) -> WrkrResult<Vec<u8>> {
    STANDARD.decode(b64.trim()).map_err(|e| WrkrError::ConfigError {
        reason: format!("{what}: invalid base64: {e}"),
    })
}

fn bad_length(what: &str, expected: usize) -> WrkrError {
    WrkrError::ConfigError {
        reason: format!("{what}: expected {expected} key bytes"),
    }
}

/// Public keys by id, for verifying chains written by several signers.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: BTreeMap<String, VerifyingKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: VerifierKey) -> Self {
        self.insert(key);
        self
    }

    /// Add or replace the key registered under `key.key_id`.
    pub fn insert(&mut self, key: VerifierKey) {
        self.keys.insert(key.key_id, key.verifying_key);
    }

    pub fn contains(&self, key_id: &str) -> bool {
        self.keys.contains_key(key_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SignatureVerifier for KeyRing {
    fn verify(&self, key_id: &str, digest: &[u8], signature: &str) -> SignatureCheck {
        let Some(verifying_key) = self.keys.get(key_id) else {
            return SignatureCheck::UnknownKey;
        };
        let Ok(bytes) = STANDARD.decode(signature) else {
            return SignatureCheck::Invalid;
        };
        let Ok(signature) = Signature::from_slice(&bytes) else {
            return SignatureCheck::Invalid;
        };
        match verifying_key.verify_strict(digest, &signature) {
            Ok(()) => SignatureCheck::Valid,
            Err(_) => SignatureCheck::Invalid,
        }
    }
}
