//! Session Tokens
//!
//! Cookie value format: `<session uuid>.<HMAC-SHA256 signature>`.

use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

pub fn issue(secret: &[u8; 32], session_id: Uuid) -> String {
    platform::crypto::sign_token(secret, &session_id.to_string())
}

/// Verify the signature and return the session id.
pub fn parse(secret: &[u8; 32], token: &str) -> AuthResult<Uuid> {
    let payload = platform::crypto::verify_token(secret, token).ok_or(AuthError::SessionInvalid)?;
    payload.parse().map_err(|_| AuthError::SessionInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_parse() {
        let secret = [9u8; 32];
        let id = Uuid::new_v4();
        let token = issue(&secret, id);
        assert_eq!(parse(&secret, &token).unwrap(), id);
    }

    #[test]
    fn test_rejects_foreign_or_malformed_tokens() {
        let id = Uuid::new_v4();
        let token = issue(&[9u8; 32], id);
        assert!(matches!(
            parse(&[8u8; 32], &token),
            Err(AuthError::SessionInvalid)
        ));

        // Validly signed but not a UUID
        let odd = platform::crypto::sign_token(&[9u8; 32], "not-a-uuid");
        assert!(parse(&[9u8; 32], &odd).is_err());
    }
}
