//! Object-level permission checks
//!
//! A book may be read by anyone; it may only be mutated by its owner or by a
//! staff user.

use crate::auth::AuthContext;
use crate::errors::{AppError, Result};
use axum::http::Method;

/// Read-only methods that bypass the object-level check
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Owner-or-staff decision for a book with the given owner
pub fn can_modify(actor: &AuthContext, owner_id: Option<i64>) -> bool {
    actor.is_staff || owner_id == Some(actor.user_id)
}

/// Full predicate over (method, actor, owner): allow if the method is safe,
/// the actor is staff, or the actor owns the object.
pub fn is_allowed(method: &Method, actor: &AuthContext, owner_id: Option<i64>) -> bool {
    is_safe_method(method) || can_modify(actor, owner_id)
}

/// Check the mutation predicate, failing with the fixed 403 on denial
pub fn authorize_mutation(actor: &AuthContext, owner_id: Option<i64>) -> Result<()> {
    if can_modify(actor, owner_id) {
        Ok(())
    } else {
        Err(AppError::permission_denied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(user_id: i64, is_staff: bool) -> AuthContext {
        AuthContext {
            user_id,
            username: format!("user{}", user_id),
            is_staff,
            request_id: "test".to_string(),
        }
    }

    #[test]
    fn test_owner_can_modify() {
        assert!(can_modify(&actor(1, false), Some(1)));
    }

    #[test]
    fn test_non_owner_cannot_modify() {
        assert!(!can_modify(&actor(2, false), Some(1)));
        assert!(!can_modify(&actor(2, false), None));
    }

    #[test]
    fn test_staff_can_modify_anything() {
        assert!(can_modify(&actor(2, true), Some(1)));
        assert!(can_modify(&actor(2, true), None));
    }

    #[test]
    fn test_safe_methods_always_allowed() {
        let stranger = actor(9, false);
        assert!(is_allowed(&Method::GET, &stranger, Some(1)));
        assert!(is_allowed(&Method::HEAD, &stranger, Some(1)));
        assert!(is_allowed(&Method::OPTIONS, &stranger, Some(1)));
        assert!(!is_allowed(&Method::PUT, &stranger, Some(1)));
        assert!(!is_allowed(&Method::DELETE, &stranger, Some(1)));
    }

    #[test]
    fn test_authorize_mutation_denial() {
        let err = authorize_mutation(&actor(2, false), Some(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "You do not have permission to perform this action."
        );
    }
}
