use analytics_core::errors::{AnalyticsError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the provider's hex HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-alchemy-signature";

/// Checks that a notification body was signed with the deployment key.
#[derive(Clone)]
pub struct SignatureVerifier {
    signing_key: Option<Vec<u8>>,
}

impl SignatureVerifier {
    pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            signing_key: Some(signing_key.into()),
        }
    }

    /// Verifier without a key; it rejects every notification.
    pub fn unconfigured() -> Self {
        Self { signing_key: None }
    }

    pub fn is_configured(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Verifies `claimed` against the HMAC of the exact `body` bytes.
    ///
    /// The comparison runs in constant time.
    pub fn verify(&self, body: &[u8], claimed: Option<&str>) -> Result<()> {
        let Some(key) = self.signing_key.as_deref() else {
            warn!("webhook signing key is not configured");
            return Err(AnalyticsError::Unauthorized);
        };
        let claimed = claimed.ok_or(AnalyticsError::Unauthorized)?;
        let claimed = hex::decode(claimed.trim()).map_err(|_| AnalyticsError::Unauthorized)?;

        mac_for(key, body)?
            .verify_slice(&claimed)
            .map_err(|_| AnalyticsError::Unauthorized)
    }

    /// Hex signature of `body` under the configured key.
    pub fn sign(&self, body: &[u8]) -> Result<String> {
        let key = self.signing_key.as_deref().ok_or(AnalyticsError::Unauthorized)?;
        Ok(hex::encode(mac_for(key, body)?.finalize().into_bytes()))
    }
}

fn mac_for(key: &[u8], body: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|err| AnalyticsError::General(err.to_string()))?;
    mac.update(body);
    Ok(mac)
}
