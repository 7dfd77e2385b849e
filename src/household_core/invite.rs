//! Invite token validation
//!
//! The invite token is the household's 20-character document id; join flows
//! only check the format here, existence is checked against the store.

use crate::error::ValidationError;
use crate::model::DOCUMENT_ID_LEN;

/// Format check only: exactly 20 alphanumeric characters, no checksum.
pub fn validate_invite_token(token: &str) -> Result<(), ValidationError> {
    if token.len() != DOCUMENT_ID_LEN {
        return Err(ValidationError::new(
            "invite_token",
            format!("must be exactly {} characters, got {}", DOCUMENT_ID_LEN, token.len()),
        ));
    }
    if !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new(
            "invite_token",
            "must contain only alphanumeric characters",
        ));
    }
    Ok(())
}
