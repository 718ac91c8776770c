// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use raidplan_domain::PlanStatus;

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// A stored row could not be turned back into a domain value.
    ReconstructionError(String),
    /// Serialization/deserialization error.
    SerializationError(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// The requested availability window was not found.
    WindowNotFound(i64),
    /// The requested event was not found.
    EventNotFound(i64),
    /// The event exists but has no roster configured.
    RosterNotConfigured(i64),
    /// The requested plan was not found.
    PlanNotFound(i64),
    /// The requested audit event was not found.
    AuditEventNotFound(i64),
    /// A plan changed status between load and commit.
    PlanStatusChanged {
        /// The plan.
        plan_id: i64,
        /// The status the writer loaded.
        expected: PlanStatus,
        /// The status currently stored.
        actual: PlanStatus,
    },
}

impl PersistenceError {
    /// Returns true for errors that name a missing record.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::WindowNotFound(_)
                | Self::EventNotFound(_)
                | Self::RosterNotConfigured(_)
                | Self::PlanNotFound(_)
                | Self::AuditEventNotFound(_)
        )
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::ReconstructionError(msg) => write!(f, "Stored data is invalid: {msg}"),
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::WindowNotFound(id) => write!(f, "Availability window not found: {id}"),
            Self::EventNotFound(id) => write!(f, "Event not found: {id}"),
            Self::RosterNotConfigured(id) => write!(f, "Event {id} has no roster"),
            Self::PlanNotFound(id) => write!(f, "Plan not found: {id}"),
            Self::AuditEventNotFound(id) => write!(f, "Audit event not found: {id}"),
            Self::PlanStatusChanged {
                plan_id,
                expected,
                actual,
            } => write!(
                f,
                "Plan {plan_id} is '{actual}', expected '{expected}'; another writer got there first"
            ),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
