// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the raid planner.
//!
//! Stores availability windows, events, rosters, plans and the audit log in
//! `SQLite` through Diesel, and issues every id. Callers hold the adapter
//! behind a single lock, which serializes writes per user and per event.
//!
//! Tests and the default server use a private in-memory database; a file
//! database runs in WAL mode.
//!
//! ## Write Model
//!
//! Each `persist_*` call stores the new scoped state of one transition
//! together with its audit event in one transaction, so state and audit log
//! never diverge.
//!
//! Poll resolution is committed with `UPDATE ... WHERE status = 'polling'`:
//! only the first writer whose update touches a row materializes an event.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;

use diesel::SqliteConnection;
use raidplan::{
    AvailabilityState, AvailabilityTransition, CancelResult, PlanState, PlanTransition,
    RosterState, RosterTransition, ScheduleResult,
};
use raidplan_audit::{AuditEvent, AuditScope};
use raidplan_domain::{AvailabilityWindow, PlanStatus, ScheduledEvent, TimeWindow, UserWindows};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

/// Global counter for unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter over a `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:raidplan_mem_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::initialize_database(&shared_memory_url)?;
        backend::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::initialize_database(path_str)?;
        backend::enable_wal_mode(&mut conn)?;
        backend::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Issues a fresh id.
    ///
    /// Ids come from one sequence shared by windows, signups, events and
    /// plans, so an id never repeats across record kinds.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence cannot be advanced.
    pub fn next_id(&mut self) -> Result<i64, PersistenceError> {
        mutations::sequence::next_id(&mut self.conn)
    }

    // ========================================================================
    // Availability
    // ========================================================================

    /// Loads every window owned by `user_id`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_availability_state(
        &mut self,
        user_id: i64,
    ) -> Result<AvailabilityState, PersistenceError> {
        queries::availability::get_availability_state(&mut self.conn, user_id)
    }

    /// Returns the user owning a window.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::WindowNotFound` if no such window exists.
    pub fn find_window_owner(&mut self, window_id: i64) -> Result<i64, PersistenceError> {
        queries::availability::find_window_owner(&mut self.conn, window_id)
    }

    /// Lists a user's windows, optionally restricted to those overlapping `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_windows(
        &mut self,
        user_id: i64,
        range: Option<&TimeWindow>,
    ) -> Result<Vec<AvailabilityWindow>, PersistenceError> {
        queries::availability::list_windows(&mut self.conn, user_id, range)
    }

    /// Collects heatmap input for the given users, in the order requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn heatmap_input(
        &mut self,
        user_ids: &[i64],
        range: &TimeWindow,
    ) -> Result<Vec<UserWindows>, PersistenceError> {
        queries::availability::heatmap_input(&mut self.conn, user_ids, range)
    }

    /// Returns the users holding a `committed` window for `event_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn users_committed_to_event(&mut self, event_id: i64) -> Result<Vec<i64>, PersistenceError> {
        queries::availability::users_committed_to_event(&mut self.conn, event_id)
    }

    /// Persists an availability transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn persist_availability(
        &mut self,
        transition: &AvailabilityTransition,
    ) -> Result<i64, PersistenceError> {
        mutations::availability::persist_availability(&mut self.conn, transition)
    }

    // ========================================================================
    // Events and Rosters
    // ========================================================================

    /// Loads an event.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::EventNotFound` if no such event exists.
    pub fn get_event(&mut self, event_id: i64) -> Result<ScheduledEvent, PersistenceError> {
        queries::events::get_event(&mut self.conn, event_id)
    }

    /// Lists the events of a recurring series, ordered by start.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_series(
        &mut self,
        recurrence_group_id: i64,
    ) -> Result<Vec<ScheduledEvent>, PersistenceError> {
        queries::events::get_series(&mut self.conn, recurrence_group_id)
    }

    /// Loads an event's roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not exist or has no roster.
    pub fn get_roster_state(&mut self, event_id: i64) -> Result<RosterState, PersistenceError> {
        queries::events::get_roster_state(&mut self.conn, event_id)
    }

    /// Persists a newly scheduled event or series.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn persist_schedule(
        &mut self,
        first_id: i64,
        result: &ScheduleResult,
    ) -> Result<(Vec<ScheduledEvent>, i64), PersistenceError> {
        mutations::events::persist_schedule(&mut self.conn, first_id, result)
    }

    /// Persists an event cancellation.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::EventNotFound` if the event does not exist.
    pub fn persist_event_cancel(&mut self, result: &CancelResult) -> Result<i64, PersistenceError> {
        mutations::events::persist_event_cancel(&mut self.conn, result)
    }

    /// Persists a roster transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not exist or has no roster.
    pub fn persist_roster(&mut self, transition: &RosterTransition) -> Result<i64, PersistenceError> {
        mutations::events::persist_roster(&mut self.conn, transition)
    }

    // ========================================================================
    // Plans
    // ========================================================================

    /// Loads a plan and its votes.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::PlanNotFound` if no such plan exists.
    pub fn get_plan_state(&mut self, plan_id: i64) -> Result<PlanState, PersistenceError> {
        queries::plans::get_plan_state(&mut self.conn, plan_id)
    }

    /// Returns the ids of polling plans whose deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn due_plans(&mut self, now: OffsetDateTime) -> Result<Vec<i64>, PersistenceError> {
        queries::plans::due_plans(&mut self.conn, now)
    }

    /// Persists a plan transition that does not resolve the poll.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn persist_plan(&mut self, transition: &PlanTransition) -> Result<i64, PersistenceError> {
        mutations::plans::persist_plan(&mut self.conn, transition)
    }

    /// Commits a poll resolution if the stored plan still has `expected` status.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::PlanStatusChanged` if another writer changed
    /// the plan first, or `PlanNotFound` if the plan does not exist.
    pub fn commit_plan_resolution(
        &mut self,
        transition: &PlanTransition,
        expected: PlanStatus,
    ) -> Result<Option<ScheduledEvent>, PersistenceError> {
        mutations::plans::commit_plan_resolution(&mut self.conn, transition, expected)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Persists an audit event, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn persist_audit_event(&mut self, event: &AuditEvent) -> Result<i64, PersistenceError> {
        mutations::audit::persist_audit_event(&mut self.conn, event)
    }

    /// Retrieves a single audit event by id.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::AuditEventNotFound` if no such event exists.
    pub fn get_audit_event(&mut self, audit_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, audit_id)
    }

    /// Returns every audit event for a scope, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_audit_timeline(
        &mut self,
        scope: AuditScope,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::get_audit_timeline(&mut self.conn, scope)
    }
}
