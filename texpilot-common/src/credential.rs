//! API key format contract, enforced at settings-save time and again right
//! before any network attempt.

use crate::{Result, TexpilotError};

/// Anthropic keys all carry this prefix.
pub const API_KEY_PREFIX: &str = "sk-ant-";

/// Check a key's shape without touching the network. Pure and synchronous.
///
/// ```
/// use texpilot_common::credential::validate_api_key;
///
/// assert!(validate_api_key("sk-ant-api03-abc").is_ok());
/// assert!(validate_api_key("sk-proj-abc").is_err());
/// assert!(validate_api_key("").is_err());
/// ```
pub fn validate_api_key(key: &str) -> Result<()> {
    if key.is_empty() || !key.starts_with(API_KEY_PREFIX) {
        return Err(TexpilotError::InvalidCredential);
    }
    Ok(())
}
