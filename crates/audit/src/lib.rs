// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

//! Audit records for raid planner state changes.
//!
//! Every successful transition produces exactly one [`AuditEvent`]. Events
//! are immutable once created and are scoped to the user, event or plan
//! whose state changed.

use serde::{Deserialize, Serialize};

/// The kind of entity that initiated a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// A community administrator.
    Admin,
    /// A regular member.
    Member,
    /// The service itself (for example the poll deadline sweeper).
    System,
}

impl ActorKind {
    /// Converts this kind to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The entity performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting user's id, or 0 for the system.
    pub id: i64,
    /// What kind of actor this is.
    pub kind: ActorKind,
}

impl Actor {
    /// Creates a new Actor.
    #[must_use]
    pub const fn new(id: i64, kind: ActorKind) -> Self {
        Self { id, kind }
    }

    /// The service acting on its own behalf.
    #[must_use]
    pub const fn system() -> Self {
        Self {
            id: 0,
            kind: ActorKind::System,
        }
    }
}

/// Why a change was initiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// Correlation id, such as a request id.
    pub id: String,
    /// Human-readable reason.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// What change was performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Action name, e.g. "`CreateWindow`" or "`ResolvePoll`".
    pub name: String,
    /// Optional details.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// A textual summary of the scoped state before or after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// The summary.
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }
}

/// The state an audit event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum AuditScope {
    /// A user's availability windows.
    User(i64),
    /// An event's roster and lifecycle.
    Event(i64),
    /// An event plan and its poll.
    Plan(i64),
}

impl std::fmt::Display for AuditScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Event(id) => write!(f, "event:{id}"),
            Self::Plan(id) => write!(f, "plan:{id}"),
        }
    }
}

/// An immutable record of one state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Id assigned on persistence; `None` before it is stored.
    pub event_id: Option<i64>,
    /// Whose state changed.
    pub scope: AuditScope,
    /// Who changed it.
    pub actor: Actor,
    /// Why.
    pub cause: Cause,
    /// What.
    pub action: Action,
    /// Scoped state before the change.
    pub before: StateSnapshot,
    /// Scoped state after the change.
    pub after: StateSnapshot,
}

impl AuditEvent {
    /// Creates a new, not yet persisted, `AuditEvent`.
    #[must_use]
    pub const fn new(
        scope: AuditScope,
        actor: Actor,
        cause: Cause,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            event_id: None,
            scope,
            actor,
            cause,
            action,
            before,
            after,
        }
    }

    /// Returns this event with its persisted id set.
    #[must_use]
    pub const fn with_event_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> AuditEvent {
        AuditEvent::new(
            AuditScope::Plan(12),
            Actor::new(5, ActorKind::Member),
            Cause::new(String::from("req-1"), String::from("Start poll")),
            Action::new(String::from("StartPoll"), Some(String::from("3 options"))),
            StateSnapshot::new(String::from("status=draft")),
            StateSnapshot::new(String::from("status=polling")),
        )
    }

    #[test]
    fn test_new_event_is_unpersisted() {
        let event: AuditEvent = sample_event();

        assert_eq!(event.event_id, None);
        assert_eq!(event.scope, AuditScope::Plan(12));
        assert_eq!(event.actor.kind, ActorKind::Member);
        assert_eq!(event.action.details.as_deref(), Some("3 options"));
    }

    #[test]
    fn test_with_event_id_keeps_payload() {
        let event: AuditEvent = sample_event();
        let stored: AuditEvent = event.clone().with_event_id(40);

        assert_eq!(stored.event_id, Some(40));
        assert_eq!(stored.before, event.before);
        assert_eq!(stored.after, event.after);
    }

    #[test]
    fn test_system_actor() {
        let actor: Actor = Actor::system();

        assert_eq!(actor.id, 0);
        assert_eq!(actor.kind.to_string(), "system");
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(AuditScope::User(3).to_string(), "user:3");
        assert_eq!(AuditScope::Event(8).to_string(), "event:8");
        assert_eq!(AuditScope::Plan(1).to_string(), "plan:1");
    }
}
