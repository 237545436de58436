//! Shared API bearer token.
//!
//! Machine clients authenticate with `Authorization: Bearer <token>`. The
//! token comes from `api.token` (or `FILEVAULT_API_TOKEN`); when neither is
//! set the binary generates an ephemeral one at startup.

use rand::distr::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::config::ApiConfig;
use crate::{Result, VaultError};

/// Length of generated tokens.
pub const GENERATED_TOKEN_LENGTH: usize = 40;

/// A configured API token. Only its SHA-256 digest is kept.
#[derive(Clone)]
pub struct ApiToken {
    digest: [u8; 32],
}

impl ApiToken {
    /// Create a token from its secret value.
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    /// Generate a random token, returning it with its secret value.
    pub fn generate() -> (Self, String) {
        let secret: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        (Self::new(&secret), secret)
    }

    /// Build the token from configuration, if one is set.
    pub fn from_config(config: &ApiConfig) -> Option<Self> {
        config
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }

    /// Check a raw token value.
    pub fn verify(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        // Constant time over the fixed-size digests
        self.digest
            .iter()
            .zip(candidate.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// Check an `Authorization` header value.
    pub fn verify_bearer(&self, header: Option<&str>) -> Result<()> {
        let header = header.ok_or_else(|| VaultError::Auth("token is missing".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VaultError::Auth("malformed authorization header".to_string()))?;

        if !self.verify(token) {
            return Err(VaultError::Auth("invalid token".to_string()));
        }
        Ok(())
    }

    /// Short hex fingerprint, safe to log.
    pub fn fingerprint(&self) -> String {
        self.digest[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiToken")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
