//! Actions secrets.
//!
//! GitHub only accepts secret values sealed against the repository's public
//! key with an anonymous sealed box (libsodium `crypto_box_seal`): the
//! transported value is base64 of `ephemeral_pk(32) || tag(16) || ciphertext`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crypto_box::aead::OsRng;
use serde_json::json;
use tracing::{debug, info};

use crate::client::GitHubClient;
use crate::error::{GitHubError, Result};
use crate::types::PublicKey;

const KEY_LEN: usize = 32;

/// Seal `value` for the holder of `public_key_b64` and base64 encode it.
pub fn seal_secret(public_key_b64: &str, value: &str) -> Result<String> {
    let key_bytes = STANDARD
        .decode(public_key_b64.trim())
        .map_err(|e| GitHubError::Encryption(format!("public key is not base64: {}", e)))?;

    let key: [u8; KEY_LEN] = key_bytes.try_into().map_err(|bytes: Vec<u8>| {
        GitHubError::Encryption(format!(
            "public key must be {} bytes, got {}",
            KEY_LEN,
            bytes.len()
        ))
    })?;

    let sealed = crypto_box::PublicKey::from(key)
        .seal(&mut OsRng, value.as_bytes())
        .map_err(|e| GitHubError::Encryption(e.to_string()))?;

    Ok(STANDARD.encode(sealed))
}

impl GitHubClient {
    pub async fn get_public_key(&self, repo: &str) -> Result<PublicKey> {
        debug!(repo, "Fetching Actions public key");

        let key = self
            .octocrab
            .get(self.repo_route(repo, "/actions/secrets/public-key"), None::<&()>)
            .await?;
        Ok(key)
    }

    /// Seal and store one Actions secret.
    pub async fn put_secret(
        &self,
        repo: &str,
        key: &PublicKey,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let body = json!({
            "encrypted_value": seal_secret(&key.key, value)?,
            "key_id": key.key_id,
        });

        let response = self
            .octocrab
            ._put(self.repo_route(repo, &format!("/actions/secrets/{}", name)), Some(&body))
            .await?;
        octocrab::map_github_error(response).await?;

        info!(repo, secret = name, "Stored Actions secret");
        Ok(())
    }
}
