// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Event and roster queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use raidplan::RosterState;
use raidplan_domain::{RosterAssignment, ScheduledEvent, Signup};

use crate::data_models::{AssignmentRow, EventRow, SignupRow};
use crate::diesel_schema::{event_signups, events, roster_assignments};
use crate::error::PersistenceError;

fn load_event_row(conn: &mut SqliteConnection, event_id: i64) -> Result<EventRow, PersistenceError> {
    match events::table
        .find(event_id)
        .select(EventRow::as_select())
        .first::<EventRow>(conn)
    {
        Ok(row) => Ok(row),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::EventNotFound(event_id)),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Loads an event.
///
/// # Errors
///
/// Returns `PersistenceError::EventNotFound` if no such event exists.
pub fn get_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<ScheduledEvent, PersistenceError> {
    load_event_row(conn, event_id)?.into_domain()
}

/// Lists the events of a recurring series, ordered by start.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn get_series(
    conn: &mut SqliteConnection,
    recurrence_group_id: i64,
) -> Result<Vec<ScheduledEvent>, PersistenceError> {
    events::table
        .filter(events::recurrence_group_id.eq(recurrence_group_id))
        .order((events::start_at.asc(), events::event_id.asc()))
        .select(EventRow::as_select())
        .load::<EventRow>(conn)?
        .into_iter()
        .map(EventRow::into_domain)
        .collect()
}

/// Loads an event's roster: its slot config, signups and placements.
///
/// Signups and placements come back in the order they were written.
///
/// # Errors
///
/// Returns `EventNotFound` if the event does not exist, or
/// `RosterNotConfigured` if it has no slot config.
pub fn get_roster_state(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<RosterState, PersistenceError> {
    let event: ScheduledEvent = get_event(conn, event_id)?;
    let Some(slot_config) = event.draft.slot_config else {
        return Err(PersistenceError::RosterNotConfigured(event_id));
    };

    let signups: Vec<Signup> = event_signups::table
        .filter(event_signups::event_id.eq(event_id))
        .order(event_signups::sequence.asc())
        .select(SignupRow::as_select())
        .load::<SignupRow>(conn)?
        .into_iter()
        .map(SignupRow::into_domain)
        .collect::<Result<_, _>>()?;

    let assignments: Vec<RosterAssignment> = roster_assignments::table
        .filter(roster_assignments::event_id.eq(event_id))
        .order(roster_assignments::sequence.asc())
        .select(AssignmentRow::as_select())
        .load::<AssignmentRow>(conn)?
        .into_iter()
        .map(AssignmentRow::into_domain)
        .collect::<Result<_, _>>()?;

    Ok(RosterState {
        event_id,
        slot_config,
        auto_unbench: event.draft.auto_unbench,
        signups,
        assignments,
    })
}
