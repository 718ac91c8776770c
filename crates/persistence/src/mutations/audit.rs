// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event writes.

use diesel::SqliteConnection;
use diesel::prelude::*;
use raidplan_audit::AuditEvent;
use tracing::debug;

use crate::backend::get_last_insert_rowid;
use crate::data_models::AuditRecord;
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Persists an audit event.
///
/// # Returns
///
/// The id assigned to the stored event.
///
/// # Errors
///
/// Returns an error if the event cannot be serialized or inserted.
pub fn persist_audit_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(audit_events::table)
        .values(AuditRecord::from_domain(event)?)
        .execute(conn)?;

    let audit_id: i64 = get_last_insert_rowid(conn)?;
    debug!(
        audit_id,
        scope = %event.scope,
        action = %event.action.name,
        "Persisted audit event"
    );
    Ok(audit_id)
}
