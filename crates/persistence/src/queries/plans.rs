// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plan and vote queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use raidplan::PlanState;
use raidplan_domain::{PlanStatus, PollVote};
use time::OffsetDateTime;

use crate::data_models::{PlanRow, VoteRow, format_instant};
use crate::diesel_schema::{event_plans, plan_votes};
use crate::error::PersistenceError;

/// Loads a plan and its votes, votes in the order cast.
///
/// # Errors
///
/// Returns `PersistenceError::PlanNotFound` if no such plan exists.
pub fn get_plan_state(
    conn: &mut SqliteConnection,
    plan_id: i64,
) -> Result<PlanState, PersistenceError> {
    let row: PlanRow = match event_plans::table
        .find(plan_id)
        .select(PlanRow::as_select())
        .first::<PlanRow>(conn)
    {
        Ok(row) => row,
        Err(diesel::result::Error::NotFound) => {
            return Err(PersistenceError::PlanNotFound(plan_id));
        }
        Err(e) => return Err(PersistenceError::from(e)),
    };

    let votes: Vec<PollVote> = plan_votes::table
        .filter(plan_votes::plan_id.eq(plan_id))
        .order(plan_votes::vote_id.asc())
        .select(VoteRow::as_select())
        .load::<VoteRow>(conn)?
        .into_iter()
        .map(VoteRow::into_domain)
        .collect::<Result<_, _>>()?;

    Ok(PlanState {
        plan: row.into_domain()?,
        votes,
    })
}

/// Returns a plan's stored status.
///
/// # Errors
///
/// Returns `PersistenceError::PlanNotFound` if no such plan exists.
pub fn get_plan_status(
    conn: &mut SqliteConnection,
    plan_id: i64,
) -> Result<PlanStatus, PersistenceError> {
    match event_plans::table
        .find(plan_id)
        .select(event_plans::status)
        .first::<String>(conn)
    {
        Ok(status) => status
            .parse()
            .map_err(|e: raidplan_domain::DomainError| {
                PersistenceError::ReconstructionError(e.to_string())
            }),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::PlanNotFound(plan_id)),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Returns the ids of polling plans whose deadline is at or before `now`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn due_plans(
    conn: &mut SqliteConnection,
    now: OffsetDateTime,
) -> Result<Vec<i64>, PersistenceError> {
    Ok(event_plans::table
        .filter(event_plans::status.eq(PlanStatus::Polling.as_str()))
        .filter(event_plans::poll_ends_at.le(format_instant(now)?))
        .order(event_plans::plan_id.asc())
        .select(event_plans::plan_id)
        .load::<i64>(conn)?)
}
