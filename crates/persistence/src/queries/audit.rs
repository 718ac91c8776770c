// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use raidplan_audit::{AuditEvent, AuditScope};

use crate::data_models::{AuditRow, scope_columns};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Retrieves an audit event by ID.
///
/// # Errors
///
/// Returns `PersistenceError::AuditEventNotFound` if no such event exists.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    audit_id: i64,
) -> Result<AuditEvent, PersistenceError> {
    let result = audit_events::table
        .filter(audit_events::audit_id.eq(audit_id))
        .select(AuditRow::as_select())
        .first::<AuditRow>(conn);

    match result {
        Ok(row) => row.into_domain(),
        Err(diesel::result::Error::NotFound) => {
            Err(PersistenceError::AuditEventNotFound(audit_id))
        }
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Returns every audit event for a scope, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be deserialized.
pub fn get_audit_timeline(
    conn: &mut SqliteConnection,
    scope: AuditScope,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let (kind, id): (&str, i64) = scope_columns(scope);

    audit_events::table
        .filter(audit_events::scope_kind.eq(kind))
        .filter(audit_events::scope_id.eq(id))
        .order(audit_events::audit_id.asc())
        .select(AuditRow::as_select())
        .load::<AuditRow>(conn)?
        .into_iter()
        .map(AuditRow::into_domain)
        .collect()
}
