// SPDX-License-Identifier: MIT

//! Access policies for resource handlers.
//!
//! Each policy is a pair of pure predicates over (method, requester, owner).
//! Handlers evaluate the collection check before loading an object and the
//! object check after: a requester passing the collection check can still be
//! denied per-object (a non-owner editing someone else's book, say).

use crate::error::AppError;
use crate::middleware::auth::CurrentUser;
use axum::http::Method;

pub const MSG_NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
pub const MSG_FORBIDDEN: &str = "You do not have permission to perform this action.";

/// Safe methods are read-only: fetch and list.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Access policy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Any authenticated user at the collection level; only the owner per
    /// object. Used for reading lists.
    IsOwner,
    /// Reads open to everyone; writes require an authenticated requester at
    /// the collection level and staff-or-owner per object. Used for books
    /// and authors.
    IsAdminOrOwnerOrReadOnly,
    /// Reads open to everyone; writes are staff-only. Used for genres.
    IsAdminOrReadOnly,
}

impl Policy {
    /// Collection-level check, evaluated before any object is loaded.
    pub fn allows_collection(&self, method: &Method, requester: Option<&CurrentUser>) -> bool {
        match self {
            Policy::IsOwner => requester.is_some(),
            Policy::IsAdminOrOwnerOrReadOnly => is_safe_method(method) || requester.is_some(),
            Policy::IsAdminOrReadOnly => {
                is_safe_method(method) || requester.is_some_and(|u| u.is_staff)
            }
        }
    }

    /// Object-level check. `owner` is the object's owning user id, or `None`
    /// for unowned resources.
    pub fn allows_object(
        &self,
        method: &Method,
        requester: Option<&CurrentUser>,
        owner: Option<i64>,
    ) -> bool {
        match self {
            Policy::IsOwner => requester.is_some_and(|u| owner == Some(u.id)),
            Policy::IsAdminOrOwnerOrReadOnly => {
                is_safe_method(method)
                    || requester.is_some_and(|u| u.is_staff || owner == Some(u.id))
            }
            // No object-level override; the collection rule applies.
            Policy::IsAdminOrReadOnly => self.allows_collection(method, requester),
        }
    }

    pub fn check_collection(
        &self,
        method: &Method,
        requester: Option<&CurrentUser>,
    ) -> Result<(), AppError> {
        if self.allows_collection(method, requester) {
            Ok(())
        } else {
            Err(denial(requester))
        }
    }

    pub fn check_object(
        &self,
        method: &Method,
        requester: Option<&CurrentUser>,
        owner: Option<i64>,
    ) -> Result<(), AppError> {
        if self.allows_object(method, requester, owner) {
            Ok(())
        } else {
            Err(denial(requester))
        }
    }
}

/// Anonymous requesters get a 401, authenticated ones a 403.
fn denial(requester: Option<&CurrentUser>) -> AppError {
    match requester {
        None => AppError::Unauthorized(MSG_NOT_AUTHENTICATED.to_string()),
        Some(_) => AppError::PermissionDenied(MSG_FORBIDDEN.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, is_staff: bool) -> CurrentUser {
        CurrentUser {
            id,
            username: format!("user{id}"),
            is_staff,
        }
    }

    #[test]
    fn test_safe_methods() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::HEAD));
        assert!(is_safe_method(&Method::OPTIONS));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::PUT));
        assert!(!is_safe_method(&Method::PATCH));
        assert!(!is_safe_method(&Method::DELETE));
    }

    #[test]
    fn test_is_owner_collection_requires_authentication() {
        let policy = Policy::IsOwner;
        let alice = user(1, false);

        // Even safe methods require a requester.
        assert!(!policy.allows_collection(&Method::GET, None));
        assert!(policy.allows_collection(&Method::GET, Some(&alice)));
        assert!(policy.allows_collection(&Method::POST, Some(&alice)));
    }

    #[test]
    fn test_is_owner_object_requires_ownership() {
        let policy = Policy::IsOwner;
        let alice = user(1, false);
        let staff = user(2, true);

        assert!(policy.allows_object(&Method::PUT, Some(&alice), Some(1)));
        assert!(!policy.allows_object(&Method::PUT, Some(&alice), Some(2)));
        // Staff status does not bypass ownership for this policy.
        assert!(!policy.allows_object(&Method::GET, Some(&staff), Some(1)));
        assert!(!policy.allows_object(&Method::GET, None, Some(1)));
    }

    #[test]
    fn test_admin_or_owner_or_read_only_collection() {
        let policy = Policy::IsAdminOrOwnerOrReadOnly;
        let alice = user(1, false);

        assert!(policy.allows_collection(&Method::GET, None));
        assert!(!policy.allows_collection(&Method::POST, None));
        assert!(policy.allows_collection(&Method::POST, Some(&alice)));
    }

    #[test]
    fn test_admin_or_owner_or_read_only_object() {
        let policy = Policy::IsAdminOrOwnerOrReadOnly;
        let owner = user(1, false);
        let other = user(2, false);
        let staff = user(3, true);

        // Safe methods always allowed, even anonymously.
        assert!(policy.allows_object(&Method::GET, None, Some(1)));

        // Writes require staff or ownership.
        assert!(policy.allows_object(&Method::PUT, Some(&owner), Some(1)));
        assert!(policy.allows_object(&Method::DELETE, Some(&staff), Some(1)));
        assert!(!policy.allows_object(&Method::PUT, Some(&other), Some(1)));
        assert!(!policy.allows_object(&Method::PATCH, None, Some(1)));
    }

    #[test]
    fn test_admin_or_read_only() {
        let policy = Policy::IsAdminOrReadOnly;
        let plain = user(1, false);
        let staff = user(2, true);

        assert!(policy.allows_collection(&Method::GET, None));
        assert!(!policy.allows_collection(&Method::POST, None));
        assert!(!policy.allows_collection(&Method::POST, Some(&plain)));
        assert!(policy.allows_collection(&Method::POST, Some(&staff)));

        // Object-level rule is identical; owner is ignored.
        assert!(!policy.allows_object(&Method::DELETE, Some(&plain), None));
        assert!(policy.allows_object(&Method::DELETE, Some(&staff), None));
    }

    #[test]
    fn test_denial_distinguishes_anonymous_from_authenticated() {
        let policy = Policy::IsAdminOrReadOnly;
        let plain = user(1, false);

        match policy.check_collection(&Method::POST, None) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, MSG_NOT_AUTHENTICATED),
            other => panic!("expected Unauthorized, got {other:?}"),
        }
        match policy.check_collection(&Method::POST, Some(&plain)) {
            Err(AppError::PermissionDenied(msg)) => assert_eq!(msg, MSG_FORBIDDEN),
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
    }
}
