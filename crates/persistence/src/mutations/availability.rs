// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Availability writes.

use diesel::SqliteConnection;
use diesel::prelude::*;
use raidplan::AvailabilityTransition;
use tracing::debug;

use crate::data_models::WindowRecord;
use crate::diesel_schema::availability_windows;
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;

/// Persists an availability transition.
///
/// The user's stored windows are replaced by the transition's new state.
///
/// # Returns
///
/// The audit event id.
///
/// # Errors
///
/// Returns an error if any write fails; nothing is stored in that case.
pub fn persist_availability(
    conn: &mut SqliteConnection,
    transition: &AvailabilityTransition,
) -> Result<i64, PersistenceError> {
    let user_id: i64 = transition.new_state.user_id;
    let records: Vec<WindowRecord> = transition
        .new_state
        .windows
        .iter()
        .map(WindowRecord::from_domain)
        .collect::<Result<_, _>>()?;

    conn.transaction::<_, PersistenceError, _>(|conn| {
        diesel::delete(
            availability_windows::table.filter(availability_windows::user_id.eq(user_id)),
        )
        .execute(conn)?;

        if !records.is_empty() {
            diesel::insert_into(availability_windows::table)
                .values(&records)
                .execute(conn)?;
        }

        debug!(user_id, windows = records.len(), "Persisted availability");
        persist_audit_event(conn, &transition.audit_event)
    })
}
