// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use raidplan_domain::DomainError;

/// Errors that can occur during state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The signup is not registered for the event.
    SignupNotFound {
        /// The event.
        event_id: i64,
        /// The requested signup.
        signup_id: i64,
    },
    /// The user already holds a signup for the event.
    AlreadySignedUp {
        /// The event.
        event_id: i64,
        /// The user.
        user_id: i64,
    },
    /// The event has already been cancelled.
    EventCancelled {
        /// The event.
        event_id: i64,
    },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::SignupNotFound {
                event_id,
                signup_id,
            } => write!(f, "Signup {signup_id} not found for event {event_id}"),
            Self::AlreadySignedUp { event_id, user_id } => {
                write!(f, "User {user_id} is already signed up for event {event_id}")
            }
            Self::EventCancelled { event_id } => write!(f, "Event {event_id} is cancelled"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
