//! Password Hashing and Verification
//!
//! - Argon2id hashing (PHC strings) with an optional application pepper
//! - NFKC normalisation before length checks (NIST SP 800-63B)
//! - Clear text is zeroized on drop and redacted from `Debug`

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Passwords rejected outright, compared case-insensitively.
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "qwerty123",
    "qwertyuiop",
    "iloveyou",
    "letmein1",
    "welcome1",
    "admin123",
    "sunshine",
    "football",
    "baseball",
    "trustno1",
    "sloboda1",
    "svoboda1",
    "freedom1",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear text
// ============================================================================

/// Validated clear text password. Not `Clone`; wiped when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let raw = Zeroizing::new(raw);
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        // Code points, not bytes
        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized.chars().any(|c| c.is_control() && c != '\t') {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        if is_common_pattern(&normalized) {
            return Err(PasswordPolicyError::CommonPattern);
        }

        Ok(Self(normalized))
    }

    /// Skip policy checks. Sign-in uses this: a stored hash may predate the
    /// current policy and must still verify.
    pub fn for_verification(raw: String) -> Self {
        let raw = Zeroizing::new(raw);
        Self(raw.nfkc().collect())
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut bytes = self.0.as_bytes().to_vec();
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        Zeroizing::new(bytes)
    }

    /// Argon2id with default (OWASP) parameters and a random salt.
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(OsRng);
        let hash = Argon2::default()
            .hash_password(&self.peppered(pepper), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            phc: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hash
// ============================================================================

/// Argon2id hash in PHC string format, safe to store.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    phc: String,
}

impl HashedPassword {
    /// Parse a stored PHC string
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let phc = s.into();
        PasswordHash::new(&phc).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { phc })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.phc
    }

    /// Constant-time verification (inside argon2)
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.phc) else {
            return false;
        };

        Argon2::default()
            .verify_password(&password.peppered(pepper), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("phc", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn is_common_pattern(password: &str) -> bool {
    let lower = password.to_lowercase();

    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    if is_sequential_digits(&lower) {
        return true;
    }

    COMMON_PASSWORDS.contains(&lower.as_str())
}

/// "12345678", "98765432" and friends
fn is_sequential_digits(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 4 || digits.len() != s.chars().count() {
        return false;
    }

    let ascending = digits.windows(2).all(|w| w[1] == (w[0] + 1) % 10);
    let descending = digits.windows(2).all(|w| w[0] == (w[1] + 1) % 10);
    ascending || descending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_policy() {
        assert!(matches!(
            ClearTextPassword::new("short".into()),
            Err(PasswordPolicyError::TooShort { min: 8, actual: 5 })
        ));
        assert!(matches!(
            ClearTextPassword::new("x".repeat(MAX_PASSWORD_LENGTH + 1) + "y"),
            Err(PasswordPolicyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_blank_and_control() {
        assert_eq!(
            ClearTextPassword::new("        ".into()).unwrap_err(),
            PasswordPolicyError::EmptyOrWhitespace
        );
        assert_eq!(
            ClearTextPassword::new("abc\u{7}defghij".into()).unwrap_err(),
            PasswordPolicyError::InvalidCharacter
        );
    }

    #[test]
    fn test_common_patterns() {
        for weak in ["Password123", "aaaaaaaaaa", "12345678", "98765432", "sloboda1"] {
            assert_eq!(
                ClearTextPassword::new(weak.into()).unwrap_err(),
                PasswordPolicyError::CommonPattern,
                "{weak} should be rejected"
            );
        }
    }

    #[test]
    fn test_unicode_password_counts_code_points() {
        // 8 Cyrillic letters are 16 bytes but 8 code points
        assert!(ClearTextPassword::new("свободаЯ".into()).is_ok());
    }

    #[test]
    fn test_hash_and_verify_with_pepper() {
        let password = ClearTextPassword::new("Correct-Horse-7".into()).unwrap();
        let hashed = password.hash(Some(b"pepper")).unwrap();

        assert!(hashed.verify(&password, Some(b"pepper")));
        assert!(!hashed.verify(&password, None));

        let wrong = ClearTextPassword::for_verification("Correct-Horse-8".into());
        assert!(!hashed.verify(&wrong, Some(b"pepper")));
    }

    #[test]
    fn test_phc_roundtrip_and_invalid() {
        let password = ClearTextPassword::new("Correct-Horse-7".into()).unwrap();
        let hashed = password.hash(None).unwrap();
        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&password, None));

        assert!(HashedPassword::from_phc_string("not-a-hash").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let password = ClearTextPassword::for_verification("hunter22hunter".into());
        let out = format!("{:?}", password);
        assert!(out.contains("REDACTED"));
        assert!(!out.contains("hunter"));
    }
}
