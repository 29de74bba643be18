//! Access control predicates
//!
//! Pure checks over the (optional) acting user. Handlers evaluate one policy
//! per endpoint and turn a refusal into `Unauthorized` for anonymous callers
//! or `Forbidden` for authenticated ones.

use crate::db::User;
use crate::messages::{MessageKey, Messages};
use crate::{Error, Result};

/// What the request wants to do with the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// list / retrieve
    Read,
    /// create
    Create,
    /// update / delete of an existing resource
    Modify,
}

impl Access {
    pub fn is_read(&self) -> bool {
        matches!(self, Access::Read)
    }
}

/// Permission policy applied to one endpoint family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Admin role or superuser for everything, reads included
    IsAdminOrSuperUser,
    /// Anyone reads, admin tier writes
    IsAdminOrReadOnly,
    /// Anyone reads, authenticated users create, authors and staff modify
    IsAuthorOrReadOnly,
}

/// Evaluate a policy; `author_id` is the owner of the addressed object, if any
pub fn allows(policy: Policy, actor: Option<&User>, access: Access, author_id: Option<i64>) -> bool {
    match policy {
        Policy::IsAdminOrSuperUser => actor.is_some_and(User::is_admin),
        Policy::IsAdminOrReadOnly => access.is_read() || actor.is_some_and(User::is_admin),
        Policy::IsAuthorOrReadOnly => {
            if access.is_read() {
                return true;
            }
            let Some(actor) = actor else {
                return false;
            };
            match access {
                Access::Create => true,
                _ => {
                    author_id == Some(actor.id) || actor.is_moderator() || actor.is_admin()
                }
            }
        }
    }
}

/// [`allows`], mapped onto the error taxonomy
pub fn enforce(
    messages: &Messages,
    policy: Policy,
    actor: Option<&User>,
    access: Access,
    author_id: Option<i64>,
) -> Result<()> {
    if allows(policy, actor, access, author_id) {
        return Ok(());
    }
    match actor {
        None => Err(Error::Unauthorized(
            messages.get(MessageKey::NotAuthenticated).to_string(),
        )),
        Some(_) => Err(Error::Forbidden(
            messages.get(MessageKey::PermissionDenied).to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AuthState, Role};

    fn user(id: i64, role: Role, is_superuser: bool) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role,
            is_superuser,
            auth_state: AuthState::Consumed,
            confirmation_code: None,
        }
    }

    #[test]
    fn test_admin_or_superuser_gate() {
        let admin = user(1, Role::Admin, false);
        let root = user(2, Role::User, true);
        let moderator = user(3, Role::Moderator, false);

        for access in [Access::Read, Access::Create, Access::Modify] {
            assert!(allows(Policy::IsAdminOrSuperUser, Some(&admin), access, None));
            assert!(allows(Policy::IsAdminOrSuperUser, Some(&root), access, None));
            assert!(!allows(Policy::IsAdminOrSuperUser, Some(&moderator), access, None));
            assert!(!allows(Policy::IsAdminOrSuperUser, None, access, None));
        }
    }

    #[test]
    fn test_admin_or_read_only() {
        let admin = user(1, Role::Admin, false);
        let plain = user(2, Role::User, false);

        assert!(allows(Policy::IsAdminOrReadOnly, None, Access::Read, None));
        assert!(allows(Policy::IsAdminOrReadOnly, Some(&plain), Access::Read, None));
        assert!(!allows(Policy::IsAdminOrReadOnly, Some(&plain), Access::Create, None));
        assert!(!allows(Policy::IsAdminOrReadOnly, None, Access::Modify, None));
        assert!(allows(Policy::IsAdminOrReadOnly, Some(&admin), Access::Modify, None));
    }

    #[test]
    fn test_author_or_read_only() {
        let author = user(1, Role::User, false);
        let stranger = user(2, Role::User, false);
        let moderator = user(3, Role::Moderator, false);
        let admin = user(4, Role::Admin, false);

        assert!(allows(Policy::IsAuthorOrReadOnly, None, Access::Read, Some(1)));
        assert!(!allows(Policy::IsAuthorOrReadOnly, None, Access::Create, None));
        assert!(allows(Policy::IsAuthorOrReadOnly, Some(&stranger), Access::Create, None));
        assert!(allows(Policy::IsAuthorOrReadOnly, Some(&author), Access::Modify, Some(1)));
        assert!(!allows(Policy::IsAuthorOrReadOnly, Some(&stranger), Access::Modify, Some(1)));
        assert!(allows(Policy::IsAuthorOrReadOnly, Some(&moderator), Access::Modify, Some(1)));
        assert!(allows(Policy::IsAuthorOrReadOnly, Some(&admin), Access::Modify, Some(1)));
    }

    #[test]
    fn test_enforce_distinguishes_anonymous_from_forbidden() {
        let messages = Messages::default();
        let plain = user(2, Role::User, false);

        let anonymous = enforce(&messages, Policy::IsAdminOrReadOnly, None, Access::Create, None);
        assert!(matches!(anonymous, Err(Error::Unauthorized(_))));

        let forbidden =
            enforce(&messages, Policy::IsAdminOrReadOnly, Some(&plain), Access::Create, None);
        assert!(matches!(forbidden, Err(Error::Forbidden(_))));
    }
}
