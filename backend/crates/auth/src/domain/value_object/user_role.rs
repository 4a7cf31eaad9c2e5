//! User Role
//!
//! One ordered ladder covers both forum tiers and staff access:
//! `newcomer < member < active < trusted < moderator < admin`.
//! Comparisons (`>=`, `>`) are the access checks.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum UserRole {
    #[default]
    Newcomer = 0,
    Member = 1,
    Active = 2,
    Trusted = 3,
    Moderator = 4,
    Admin = 5,
}

impl UserRole {
    /// Every role, lowest first
    pub const ALL: [UserRole; 6] = [
        UserRole::Newcomer,
        UserRole::Member,
        UserRole::Active,
        UserRole::Trusted,
        UserRole::Moderator,
        UserRole::Admin,
    ];

    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Newcomer => "newcomer",
            Member => "member",
            Active => "active",
            Trusted => "trusted",
            Moderator => "moderator",
            Admin => "admin",
        }
    }

    /// Human title shown next to a member's name
    pub const fn title(&self) -> &'static str {
        use UserRole::*;
        match self {
            Newcomer => "Новичок",
            Member => "Участник",
            Active => "Активист",
            Trusted => "Доверенный",
            Moderator => "Модератор",
            Admin => "Администратор",
        }
    }

    #[inline]
    pub const fn is_staff(&self) -> bool {
        matches!(self, UserRole::Moderator | UserRole::Admin)
    }

    /// The role directly above this one
    pub fn next(&self) -> Option<UserRole> {
        UserRole::from_id(self.id() + 1)
    }

    pub fn from_id(id: i16) -> Option<Self> {
        use UserRole::*;
        match id {
            0 => Some(Newcomer),
            1 => Some(Member),
            2 => Some(Active),
            3 => Some(Trusted),
            4 => Some(Moderator),
            5 => Some(Admin),
            _ => None,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        UserRole::ALL.into_iter().find(|role| role.code() == code)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(UserRole::Newcomer < UserRole::Member);
        assert!(UserRole::Member < UserRole::Active);
        assert!(UserRole::Active < UserRole::Trusted);
        assert!(UserRole::Trusted < UserRole::Moderator);
        assert!(UserRole::Moderator < UserRole::Admin);
        assert_eq!(UserRole::default(), UserRole::Newcomer);
    }

    #[test]
    fn test_id_and_code_roundtrip() {
        for role in UserRole::ALL {
            assert_eq!(UserRole::from_id(role.id()), Some(role));
            assert_eq!(UserRole::from_code(role.code()), Some(role));
        }
        assert_eq!(UserRole::from_id(6), None);
        assert_eq!(UserRole::from_id(-1), None);
        assert_eq!(UserRole::from_code("super_admin"), None);
    }

    #[test]
    fn test_next() {
        assert_eq!(UserRole::Newcomer.next(), Some(UserRole::Member));
        assert_eq!(UserRole::Trusted.next(), Some(UserRole::Moderator));
        assert_eq!(UserRole::Admin.next(), None);
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&UserRole::Trusted).unwrap();
        assert_eq!(json, "\"trusted\"");
        let role: UserRole = serde_json::from_str("\"moderator\"").unwrap();
        assert_eq!(role, UserRole::Moderator);
    }

    #[test]
    fn test_staff() {
        assert!(!UserRole::Trusted.is_staff());
        assert!(UserRole::Moderator.is_staff());
        assert!(UserRole::Admin.is_staff());
    }
}
