// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use raidplan::CoreError;
use raidplan_domain::{DomainError, ErrorKind};
use raidplan_persistence::PersistenceError;
use thiserror::Error;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// Failures parsing request fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// A timestamp is not RFC 3339.
    #[error("'{value}' is not an RFC 3339 timestamp")]
    InvalidTimestamp { field: String, value: String },

    /// A field required by this request shape is absent.
    #[error("field is required")]
    MissingField { field: String },

    /// Only one of two mutually exclusive fields may be set.
    #[error("'{field}' cannot be combined with '{other}'")]
    ConflictingFields { field: String, other: String },

    /// An enumerated value is not recognized.
    #[error("'{value}' is not a valid {field}")]
    InvalidValue { field: String, value: String },
}

impl InputError {
    /// The request field this error refers to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidTimestamp { field, .. }
            | Self::MissingField { field }
            | Self::ConflictingFields { field, .. }
            | Self::InvalidValue { field, .. } => field,
        }
    }
}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// The target's lifecycle does not allow the operation.
    StateTransitionRejected {
        /// A human-readable description of the rejection.
        message: String,
    },
    /// A roster replacement batch was rejected as a whole.
    RosterBatchRejected {
        /// The signups that caused the rejection.
        signup_ids: Vec<i64>,
        /// A human-readable description of the rejection.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::StateTransitionRejected { message } => {
                write!(f, "Transition rejected: {message}")
            }
            Self::RosterBatchRejected {
                signup_ids,
                message,
            } => {
                write!(f, "Roster batch rejected (signups {signup_ids:?}): {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<InputError> for ApiError {
    fn from(err: InputError) -> Self {
        Self::InvalidInput {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Names the request field a validation error refers to.
const fn validation_field(err: &DomainError) -> &'static str {
    match err {
        DomainError::InvalidTimeWindow { .. } | DomainError::WindowTooLong { .. } => "time_range",
        DomainError::StatusNotUserEditable { .. }
        | DomainError::InvalidAvailabilityStatus(_)
        | DomainError::CommittedWindowImmutable { .. } => "status",
        DomainError::InvalidSlotDuration { .. } | DomainError::HeatmapTooLarge { .. } => {
            "slot_minutes"
        }
        DomainError::NegativeSlotCount { .. }
        | DomainError::RoleNotInConfig { .. }
        | DomainError::InvalidSlotConfigType(_) => "slot_config",
        DomainError::InvalidRosterRole(_) => "role",
        DomainError::InvalidRecurrenceUntil { .. } | DomainError::RecurrenceTooLong { .. } => {
            "recurrence.until"
        }
        DomainError::InvalidRecurrenceFrequency(_) => "recurrence.frequency",
        DomainError::InvalidTimezone(_) => "recurrence.timezone",
        DomainError::InvalidPollOptionCount { .. } => "options",
        DomainError::InvalidPollOption { .. } => "option_index",
        DomainError::InvalidPollMode(_) => "poll_mode",
        DomainError::InvalidPlanStatus(_) => "status",
        DomainError::InvalidPollDeadline { .. } => "poll_ends_at",
        DomainError::InvalidEventDuration { .. } => "duration_minutes",
        DomainError::EmptyTitle => "title",
        DomainError::DateArithmeticOverflow { .. } => "date",
        DomainError::WindowNotFound { .. }
        | DomainError::DuplicateRosterPosition { .. }
        | DomainError::DuplicateRosterSignup { .. }
        | DomainError::InvalidRosterPosition { .. }
        | DomainError::UnknownSignup { .. }
        | DomainError::InvalidPlanTransition { .. }
        | DomainError::PollNotOpen { .. }
        | DomainError::PollDeadlineNotReached { .. }
        | DomainError::PollDeadlinePassed { .. } => "request",
    }
}

/// Collects the signup ids a roster batch error names.
fn batch_signups(err: &DomainError) -> Vec<i64> {
    match err {
        DomainError::DuplicateRosterPosition { signup_ids, .. } => signup_ids.clone(),
        DomainError::DuplicateRosterSignup { signup_id }
        | DomainError::InvalidRosterPosition { signup_id, .. }
        | DomainError::UnknownSignup { signup_id } => vec![*signup_id],
        _ => Vec::new(),
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    match err.kind() {
        ErrorKind::Validation => ApiError::InvalidInput {
            field: String::from(validation_field(&err)),
            message,
        },
        ErrorKind::StateTransitionRejected => ApiError::StateTransitionRejected { message },
        ErrorKind::RosterBatchRejected => ApiError::RosterBatchRejected {
            signup_ids: batch_signups(&err),
            message,
        },
        ErrorKind::NotFound => ApiError::ResourceNotFound {
            resource_type: String::from("Availability window"),
            message,
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::SignupNotFound { .. } => ApiError::ResourceNotFound {
            resource_type: String::from("Signup"),
            message: err.to_string(),
        },
        CoreError::AlreadySignedUp { .. } | CoreError::EventCancelled { .. } => {
            ApiError::StateTransitionRejected {
                message: err.to_string(),
            }
        }
    }
}

/// Translates a persistence error into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    let resource_type: &str = match &err {
        PersistenceError::WindowNotFound(_) => "Availability window",
        PersistenceError::EventNotFound(_) => "Event",
        PersistenceError::RosterNotConfigured(_) => "Roster",
        PersistenceError::PlanNotFound(_) => "Plan",
        PersistenceError::AuditEventNotFound(_) => "Audit event",
        PersistenceError::PlanStatusChanged { .. } => {
            return ApiError::StateTransitionRejected {
                message: err.to_string(),
            };
        }
        PersistenceError::DatabaseError(_)
        | PersistenceError::DatabaseConnectionFailed(_)
        | PersistenceError::MigrationFailed(_)
        | PersistenceError::QueryFailed(_)
        | PersistenceError::ReconstructionError(_)
        | PersistenceError::SerializationError(_)
        | PersistenceError::InitializationError(_)
        | PersistenceError::ForeignKeyEnforcementNotEnabled => {
            return ApiError::Internal {
                message: err.to_string(),
            };
        }
    };
    ApiError::ResourceNotFound {
        resource_type: String::from(resource_type),
        message: err.to_string(),
    }
}
