// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use raidplan_audit::{Actor, ActorKind};
use std::str::FromStr;

use crate::error::AuthError;

/// Actor roles for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Guild officers.
    ///
    /// Admins may additionally:
    /// - cancel events
    /// - edit and auto-assign rosters
    /// - act on behalf of any member
    Admin,
    /// Regular members acting for themselves.
    Member,
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(AuthError::AuthenticationFailed {
                reason: format!("Invalid role: '{s}'. Must be 'admin' or 'member'"),
            }),
        }
    }
}

/// An authenticated actor with an associated role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The actor's user id.
    pub id: i64,
    /// The role assigned to this actor.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    /// Converts this authenticated actor into an audit Actor.
    #[must_use]
    pub const fn to_audit_actor(&self) -> Actor {
        let kind: ActorKind = match self.role {
            Role::Admin => ActorKind::Admin,
            Role::Member => ActorKind::Member,
        };
        Actor::new(self.id, kind)
    }

    /// Whether this actor holds the Admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Stub authentication.
///
/// Accepts any positive actor id with the claimed role. Real identity
/// checks live in front of this service.
///
/// # Errors
///
/// Returns an error if the actor id is not positive.
pub fn authenticate_stub(actor_id: i64, role: Role) -> Result<AuthenticatedActor, AuthError> {
    if actor_id <= 0 {
        return Err(AuthError::AuthenticationFailed {
            reason: format!("Actor ID must be positive, got {actor_id}"),
        });
    }
    Ok(AuthenticatedActor::new(actor_id, role))
}

/// Authorization service for enforcing role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    fn require_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Member => Err(AuthError::Unauthorized {
                action: String::from(action),
                required_role: String::from("Admin"),
            }),
        }
    }

    /// Checks if an actor may act on a user's behalf.
    ///
    /// Members may only act for themselves; admins may act for anyone.
    ///
    /// # Errors
    ///
    /// Returns an error if a member targets another user.
    pub fn authorize_act_for_user(
        actor: &AuthenticatedActor,
        user_id: i64,
        action: &str,
    ) -> Result<(), AuthError> {
        if actor.id == user_id {
            return Ok(());
        }
        Self::require_admin(actor, action)
    }

    /// Checks if an actor may manage a plan.
    ///
    /// The plan's creator and admins may open, resolve or cancel it.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is neither the creator nor an admin.
    pub fn authorize_manage_plan(
        actor: &AuthenticatedActor,
        creator_id: i64,
        action: &str,
    ) -> Result<(), AuthError> {
        Self::authorize_act_for_user(actor, creator_id, action)
    }

    /// Checks if an actor is authorized to cancel an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_cancel_event(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "cancel_event")
    }

    /// Checks if an actor is authorized to edit or auto-assign a roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_manage_roster(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "manage_roster")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("MEMBER".parse::<Role>(), Ok(Role::Member));
        assert!("officer".parse::<Role>().is_err());
    }

    #[test]
    fn test_stub_rejects_non_positive_ids() {
        assert!(authenticate_stub(0, Role::Member).is_err());
        assert!(authenticate_stub(-3, Role::Admin).is_err());
        assert_eq!(
            authenticate_stub(4, Role::Member),
            Ok(AuthenticatedActor::new(4, Role::Member))
        );
    }

    #[test]
    fn test_audit_actor_carries_kind() {
        let actor = AuthenticatedActor::new(9, Role::Admin).to_audit_actor();
        assert_eq!(actor.id, 9);
        assert_eq!(actor.kind, ActorKind::Admin);
    }
}
