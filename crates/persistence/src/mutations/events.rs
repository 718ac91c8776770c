// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Event and roster writes.

use diesel::SqliteConnection;
use diesel::prelude::*;
use raidplan::{CancelResult, RosterState, RosterTransition, ScheduleResult};
use raidplan_domain::{EventDraft, ScheduledEvent};
use tracing::{debug, info};

use crate::data_models::{AssignmentRecord, EventRecord, SignupRecord};
use crate::diesel_schema::{event_signups, events, roster_assignments};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::mutations::sequence::next_id;

/// Inserts an event under `id`.
///
/// An event drafted with a slot config starts with an empty roster.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_event(
    conn: &mut SqliteConnection,
    id: i64,
    draft: &EventDraft,
) -> Result<ScheduledEvent, PersistenceError> {
    let event: ScheduledEvent = ScheduledEvent {
        id,
        draft: draft.clone(),
        cancelled: false,
    };
    diesel::insert_into(events::table)
        .values(EventRecord::from_domain(&event)?)
        .execute(conn)?;
    Ok(event)
}

/// Persists a newly scheduled event or series.
///
/// The first draft is stored under `first_id`, which the caller used as the
/// series' group id. Later instances draw fresh ids.
///
/// # Returns
///
/// The stored events and the audit event id.
///
/// # Errors
///
/// Returns an error if any write fails; nothing is stored in that case.
pub fn persist_schedule(
    conn: &mut SqliteConnection,
    first_id: i64,
    result: &ScheduleResult,
) -> Result<(Vec<ScheduledEvent>, i64), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let mut stored: Vec<ScheduledEvent> = Vec::with_capacity(result.drafts.len());
        for (index, draft) in result.drafts.iter().enumerate() {
            let id: i64 = if index == 0 { first_id } else { next_id(conn)? };
            stored.push(insert_event(conn, id, draft)?);
        }
        info!(
            event_id = first_id,
            instances = stored.len(),
            "Scheduled event"
        );
        let audit_id: i64 = persist_audit_event(conn, &result.audit_event)?;
        Ok((stored, audit_id))
    })
}

/// Persists an event cancellation.
///
/// # Errors
///
/// Returns `PersistenceError::EventNotFound` if the event does not exist.
pub fn persist_event_cancel(
    conn: &mut SqliteConnection,
    result: &CancelResult,
) -> Result<i64, PersistenceError> {
    let event_id: i64 = result.event.id;
    let record: EventRecord = EventRecord::from_domain(&result.event)?;

    conn.transaction::<_, PersistenceError, _>(|conn| {
        let updated: usize = diesel::update(events::table.find(event_id))
            .set(&record)
            .execute(conn)?;
        if updated == 0 {
            return Err(PersistenceError::EventNotFound(event_id));
        }
        info!(event_id, "Cancelled event");
        persist_audit_event(conn, &result.audit_event)
    })
}

/// Persists a roster transition.
///
/// Signups and placements of the event are rewritten in the transition's
/// order, and the event's slot config follows the new state.
///
/// # Errors
///
/// Returns `EventNotFound` if the event does not exist, or
/// `RosterNotConfigured` if it has no roster.
pub fn persist_roster(
    conn: &mut SqliteConnection,
    transition: &RosterTransition,
) -> Result<i64, PersistenceError> {
    let state: &RosterState = &transition.new_state;
    let event_id: i64 = state.event_id;

    let signups: Vec<SignupRecord> = state
        .signups
        .iter()
        .enumerate()
        .map(|(sequence, signup)| SignupRecord::from_domain(event_id, sequence, signup))
        .collect::<Result<_, _>>()?;
    let assignments: Vec<AssignmentRecord> = state
        .assignments
        .iter()
        .enumerate()
        .map(|(sequence, placed)| AssignmentRecord::from_domain(event_id, sequence, placed))
        .collect::<Result<_, _>>()?;
    let slot_config_json: String = serde_json::to_string(&state.slot_config)?;

    conn.transaction::<_, PersistenceError, _>(|conn| {
        let stored_config: Option<String> = match events::table
            .find(event_id)
            .select(events::slot_config_json)
            .first::<Option<String>>(conn)
        {
            Ok(config) => config,
            Err(diesel::result::Error::NotFound) => {
                return Err(PersistenceError::EventNotFound(event_id));
            }
            Err(e) => return Err(PersistenceError::from(e)),
        };
        if stored_config.is_none() {
            return Err(PersistenceError::RosterNotConfigured(event_id));
        }

        diesel::update(events::table.find(event_id))
            .set((
                events::slot_config_json.eq(Some(slot_config_json.as_str())),
                events::auto_unbench.eq(i32::from(state.auto_unbench)),
            ))
            .execute(conn)?;

        diesel::delete(
            roster_assignments::table.filter(roster_assignments::event_id.eq(event_id)),
        )
        .execute(conn)?;
        diesel::delete(event_signups::table.filter(event_signups::event_id.eq(event_id)))
            .execute(conn)?;

        if !signups.is_empty() {
            diesel::insert_into(event_signups::table)
                .values(&signups)
                .execute(conn)?;
        }
        if !assignments.is_empty() {
            diesel::insert_into(roster_assignments::table)
                .values(&assignments)
                .execute(conn)?;
        }

        debug!(
            event_id,
            signups = signups.len(),
            placed = assignments.len(),
            "Persisted roster"
        );
        persist_audit_event(conn, &transition.audit_event)
    })
}
