mod repository;

pub use repository::*;

use serde::{Deserialize, Serialize};

/// User as saved on database.
///
/// This service never writes users; accounts are managed elsewhere.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_active: bool,
    /// Role membership bitmask, see [`UserGroup`].
    pub groups: i32,
    pub created_at: chrono::NaiveDate,
}

/// Role a [`User`] may hold.
///
/// Membership is a capability set, not a hierarchy: a moderator does not
/// implicitly hold the regular bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum UserGroup {
    Regular = 1,
    Moderator = 1 << 1,
    Admin = 1 << 2,
}

impl User {
    /// Whether the user holds `group` membership.
    pub fn has_group(&self, group: UserGroup) -> bool {
        self.groups & group as i32 != 0
    }

    /// Whether the user may act on profiles other than their own.
    pub fn is_privileged(&self) -> bool {
        self.has_group(UserGroup::Moderator) || self.has_group(UserGroup::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(groups: i32) -> User {
        User {
            id: 1,
            username: "user".into(),
            is_active: true,
            groups,
            created_at: chrono::NaiveDate::default(),
        }
    }

    #[test]
    fn test_has_group() {
        let moderator = user(UserGroup::Regular as i32 | UserGroup::Moderator as i32);
        assert!(moderator.has_group(UserGroup::Regular));
        assert!(moderator.has_group(UserGroup::Moderator));
        assert!(!moderator.has_group(UserGroup::Admin));
    }

    #[test]
    fn test_is_privileged() {
        assert!(!user(UserGroup::Regular as i32).is_privileged());
        assert!(user(UserGroup::Moderator as i32).is_privileged());
        assert!(user(UserGroup::Admin as i32).is_privileged());
    }
}
