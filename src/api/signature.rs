use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;

use crate::core::config::AppConfig;

/// Replay window: reject requests whose timestamp is older than this.
const MAX_TIMESTAMP_AGE_SECS: u64 = 300;
/// Small tolerance for clocks slightly ahead of ours.
const MAX_TIMESTAMP_SKEW_SECS: u64 = 60;

pub fn verify_slack_signature(
    request_body: &str,
    timestamp: &str,
    signature: &str,
    config: &AppConfig,
) -> bool {
    let now_secs = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(now) => now.as_secs(),
        Err(e) => {
            error!("System clock before epoch: {}", e);
            return false;
        }
    };
    verify_signature_at(
        request_body,
        timestamp,
        signature,
        &config.slack_signing_secret,
        now_secs,
    )
}

/// Clock-injected variant used by `verify_slack_signature` and tests.
///
/// Computes HMAC-SHA256 over `v0:{timestamp}:{body}` and compares against the
/// supplied signature in constant time via `Mac::verify_slice`.
pub fn verify_signature_at(
    request_body: &str,
    timestamp: &str,
    signature: &str,
    signing_secret: &str,
    now_secs: u64,
) -> bool {
    let Ok(ts) = timestamp.parse::<u64>() else {
        error!("Non-numeric request timestamp");
        return false;
    };

    if now_secs.saturating_sub(ts) > MAX_TIMESTAMP_AGE_SECS
        || ts > now_secs + MAX_TIMESTAMP_SKEW_SECS
    {
        error!("Timestamp out of range, potential replay attack");
        return false;
    }

    let base_string = format!("v0:{timestamp}:{request_body}");

    let mut mac = match Hmac::<Sha256>::new_from_slice(signing_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return false;
        }
    };
    mac.update(base_string.as_bytes());

    let Some(hex_sig) = signature.strip_prefix("v0=") else {
        error!("Signature missing v0= prefix");
        return false;
    };
    let Ok(supplied) = hex::decode(hex_sig) else {
        error!("Signature is not valid hex");
        return false;
    };

    mac.verify_slice(&supplied).is_ok()
}

#[must_use]
pub fn compute_signature(timestamp: &str, request_body: &str, signing_secret: &str) -> String {
    let base_string = format!("v0:{timestamp}:{request_body}");
    let mut mac = match Hmac::<Sha256>::new_from_slice(signing_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return String::new();
        }
    };
    mac.update(base_string.as_bytes());
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}
