//! Request-signature verification.
//!
//! Every inbound request is signed: `X-Modeldesk-Signature` carries a hex
//! HMAC-SHA256 of the raw body, and `X-Modeldesk-Key-Identifier` names the
//! signing key. Keys rotate, so the verifier fetches the active key set from
//! the platform's metadata endpoint per request. Verification runs before
//! any parsing or pipeline work — an unsigned request never reaches the core.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::AgentError;

type HmacSha256 = Hmac<Sha256>;

/// One signing key from the platform's key set.
#[derive(Debug, Clone, Deserialize)]
pub struct SigningKey {
    pub key_identifier: String,
    /// Hex-encoded secret.
    pub key: String,
    #[serde(default)]
    pub is_current: bool,
}

/// The platform's active key set.
#[derive(Debug, Clone, Deserialize)]
pub struct SigningKeySet {
    pub keys: Vec<SigningKey>,
}

impl SigningKeySet {
    pub fn find(&self, key_identifier: &str) -> Option<&SigningKey> {
        self.keys.iter().find(|k| k.key_identifier == key_identifier)
    }
}

/// Verify `signature_hex` as HMAC-SHA256 over `body` with the hex secret.
///
/// Uses `Mac::verify_slice`, which compares in constant time.
pub fn verify_hmac(secret_hex: &str, body: &[u8], signature_hex: &str) -> Result<(), AgentError> {
    let secret = hex::decode(secret_hex)
        .map_err(|_| AgentError::Authentication("signing key is not valid hex".into()))?;
    let signature = hex::decode(signature_hex)
        .map_err(|_| AgentError::Authentication("signature is not valid hex".into()))?;

    let mut mac = HmacSha256::new_from_slice(&secret)
        .map_err(|_| AgentError::Authentication("signing key is unusable".into()))?;
    mac.update(body);
    mac.verify_slice(&signature)
        .map_err(|_| AgentError::Authentication("signature mismatch".into()))
}

/// Verifier seam; route tests substitute accept-all / reject-all fakes.
#[async_trait]
pub trait RequestVerifier: Send + Sync {
    async fn verify(
        &self,
        body: &[u8],
        signature_hex: &str,
        key_identifier: &str,
    ) -> Result<(), AgentError>;
}

/// `RequestVerifier` backed by the platform's signing-key endpoint.
pub struct KeyServiceVerifier {
    http: reqwest::Client,
    keys_url: String,
}

impl KeyServiceVerifier {
    pub fn new(http: reqwest::Client, keys_url: impl Into<String>) -> Self {
        Self {
            http,
            keys_url: keys_url.into(),
        }
    }

    async fn fetch_keys(&self) -> Result<SigningKeySet, AgentError> {
        let response = self
            .http
            .get(&self.keys_url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| AgentError::Authentication(format!("key fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Authentication(format!(
                "key fetch failed with status {}",
                status
            )));
        }

        response
            .json::<SigningKeySet>()
            .await
            .map_err(|e| AgentError::Authentication(format!("invalid key set: {}", e)))
    }
}

#[async_trait]
impl RequestVerifier for KeyServiceVerifier {
    async fn verify(
        &self,
        body: &[u8],
        signature_hex: &str,
        key_identifier: &str,
    ) -> Result<(), AgentError> {
        let key_set = self.fetch_keys().await?;
        let key = key_set.find(key_identifier).ok_or_else(|| {
            AgentError::Authentication(format!("unknown signing key '{}'", key_identifier))
        })?;
        verify_hmac(&key.key, body, signature_hex)
    }
}
