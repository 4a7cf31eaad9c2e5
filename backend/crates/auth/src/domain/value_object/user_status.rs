//! User Status
//!
//! Account-level switch. Forum bans are separate and time-boxed; a disabled
//! account cannot sign in at all.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum UserStatus {
    #[default]
    Active = 0,
    Disabled = 1,
}

impl UserStatus {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }

    #[inline]
    pub const fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Active),
            1 => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ids() {
        assert_eq!(UserStatus::from_id(0), Some(UserStatus::Active));
        assert_eq!(UserStatus::from_id(1), Some(UserStatus::Disabled));
        assert_eq!(UserStatus::from_id(2), None);
    }

    #[test]
    fn test_can_login() {
        assert!(UserStatus::Active.can_login());
        assert!(!UserStatus::Disabled.can_login());
    }
}
