// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Availability window queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use raidplan::AvailabilityState;
use raidplan_domain::{AvailabilityStatus, AvailabilityWindow, TimeWindow, UserWindows};
use tracing::debug;

use crate::data_models::{WindowRow, format_instant};
use crate::diesel_schema::availability_windows;
use crate::error::PersistenceError;

fn into_windows(rows: Vec<WindowRow>) -> Result<Vec<AvailabilityWindow>, PersistenceError> {
    rows.into_iter().map(WindowRow::into_domain).collect()
}

/// Loads every window owned by `user_id`, ordered by id.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn get_availability_state(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<AvailabilityState, PersistenceError> {
    debug!(user_id, "Loading availability state");
    let rows: Vec<WindowRow> = availability_windows::table
        .filter(availability_windows::user_id.eq(user_id))
        .order(availability_windows::window_id.asc())
        .select(WindowRow::as_select())
        .load::<WindowRow>(conn)?;

    Ok(AvailabilityState {
        user_id,
        windows: into_windows(rows)?,
    })
}

/// Returns the user owning a window.
///
/// # Errors
///
/// Returns `PersistenceError::WindowNotFound` if no such window exists.
pub fn find_window_owner(
    conn: &mut SqliteConnection,
    window_id: i64,
) -> Result<i64, PersistenceError> {
    match availability_windows::table
        .find(window_id)
        .select(availability_windows::user_id)
        .first::<i64>(conn)
    {
        Ok(user_id) => Ok(user_id),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::WindowNotFound(window_id)),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Lists a user's windows ordered by start, then id.
///
/// With a `range`, only windows overlapping it are returned. Stored instants
/// sort as text, so the overlap test runs in SQL.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_windows(
    conn: &mut SqliteConnection,
    user_id: i64,
    range: Option<&TimeWindow>,
) -> Result<Vec<AvailabilityWindow>, PersistenceError> {
    let mut query = availability_windows::table
        .filter(availability_windows::user_id.eq(user_id))
        .into_boxed();

    if let Some(range) = range {
        query = query
            .filter(availability_windows::start_at.lt(format_instant(range.end())?))
            .filter(availability_windows::end_at.gt(format_instant(range.start())?));
    }

    let rows: Vec<WindowRow> = query
        .order((
            availability_windows::start_at.asc(),
            availability_windows::window_id.asc(),
        ))
        .select(WindowRow::as_select())
        .load::<WindowRow>(conn)?;

    into_windows(rows)
}

/// Collects heatmap input for the given users, in the order requested.
///
/// # Errors
///
/// Returns an error if any user's windows cannot be loaded.
pub fn heatmap_input(
    conn: &mut SqliteConnection,
    user_ids: &[i64],
    range: &TimeWindow,
) -> Result<Vec<UserWindows>, PersistenceError> {
    user_ids
        .iter()
        .map(|&user_id| {
            Ok(UserWindows {
                user_id,
                windows: list_windows(conn, user_id, Some(range))?,
            })
        })
        .collect()
}

/// Returns the users holding a `committed` window for `event_id`, ascending.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn users_committed_to_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<Vec<i64>, PersistenceError> {
    Ok(availability_windows::table
        .filter(availability_windows::source_event_id.eq(event_id))
        .filter(availability_windows::status.eq(AvailabilityStatus::Committed.as_str()))
        .select(availability_windows::user_id)
        .distinct()
        .order(availability_windows::user_id.asc())
        .load::<i64>(conn)?)
}
