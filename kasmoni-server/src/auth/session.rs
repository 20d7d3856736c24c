//! Session context
//!
//! [`CurrentUser`] is the explicit session context handed to every service
//! call. It is built from the `users` row named by the token subject, so role
//! changes take effect on the next request.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shared::models::{Role, User};

/// Authenticated user, injected into request extensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    /// Linked member record (member-role accounts)
    pub member_id: Option<i64>,
}

impl CurrentUser {
    /// admin or super_user
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_super_user(&self) -> bool {
        self.role == Role::SuperUser
    }

    /// Admins see every member; others only their own linked record
    pub fn can_view_member(&self, member_id: i64) -> bool {
        self.is_admin() || self.member_id == Some(member_id)
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            member_id: user.member_id,
        }
    }
}

/// Seen sessions, keyed `(user_id, iat)` with the token expiry as value
///
/// A session is one issued token. The first request carrying it is recorded
/// in the auth log as `token_accepted`; later requests are not.
#[derive(Debug, Default)]
pub struct SessionTracker {
    seen: DashMap<(i64, i64), i64>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a session is observed
    pub fn first_use(&self, user_id: i64, issued_at: i64, expires_at: i64) -> bool {
        self.seen.insert((user_id, issued_at), expires_at).is_none()
    }

    /// Forget sessions whose token has expired
    pub fn prune_expired(&self, now_secs: i64) -> usize {
        let before = self.seen.len();
        self.seen.retain(|_, exp| *exp > now_secs);
        before - self.seen.len()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, member_id: Option<i64>) -> CurrentUser {
        CurrentUser {
            id: 1,
            email: "u@kasmoni.sr".into(),
            display_name: "U".into(),
            role,
            member_id,
        }
    }

    #[test]
    fn test_role_checks() {
        assert!(user(Role::SuperUser, None).is_admin());
        assert!(user(Role::SuperUser, None).is_super_user());
        assert!(user(Role::Admin, None).is_admin());
        assert!(!user(Role::Admin, None).is_super_user());
        assert!(!user(Role::Member, Some(5)).is_admin());
    }

    #[test]
    fn test_can_view_member() {
        assert!(user(Role::Admin, None).can_view_member(9));
        assert!(user(Role::Member, Some(9)).can_view_member(9));
        assert!(!user(Role::Member, Some(9)).can_view_member(10));
        assert!(!user(Role::Member, None).can_view_member(9));
    }

    #[test]
    fn test_session_tracker() {
        let tracker = SessionTracker::new();
        assert!(tracker.first_use(1, 100, 500));
        assert!(!tracker.first_use(1, 100, 500));
        assert!(tracker.first_use(1, 200, 900));
        assert_eq!(tracker.len(), 2);

        assert_eq!(tracker.prune_expired(600), 1);
        assert_eq!(tracker.len(), 1);
        assert!(!tracker.is_empty());
    }
}
