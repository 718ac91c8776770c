// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plan writes, including the guarded poll resolution.

use diesel::SqliteConnection;
use diesel::prelude::*;
use raidplan::{PlanState, PlanTransition};
use raidplan_domain::{PlanStatus, ScheduledEvent};
use tracing::{debug, info};

use crate::data_models::{PlanRecord, VoteRecord};
use crate::diesel_schema::{event_plans, plan_votes};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::mutations::events::insert_event;
use crate::mutations::sequence::next_id;
use crate::queries::plans::get_plan_status;

fn vote_records(state: &PlanState) -> Result<Vec<VoteRecord>, PersistenceError> {
    state
        .votes
        .iter()
        .map(|vote| VoteRecord::from_domain(state.plan.id, vote))
        .collect()
}

fn replace_votes(
    conn: &mut SqliteConnection,
    plan_id: i64,
    votes: &[VoteRecord],
) -> Result<(), PersistenceError> {
    diesel::delete(plan_votes::table.filter(plan_votes::plan_id.eq(plan_id))).execute(conn)?;
    if !votes.is_empty() {
        diesel::insert_into(plan_votes::table)
            .values(votes)
            .execute(conn)?;
    }
    Ok(())
}

/// Persists a plan transition that does not resolve the poll.
///
/// The plan row is inserted or overwritten and its votes are rewritten.
///
/// # Errors
///
/// Returns an error if any write fails; nothing is stored in that case.
pub fn persist_plan(
    conn: &mut SqliteConnection,
    transition: &PlanTransition,
) -> Result<i64, PersistenceError> {
    let state: &PlanState = &transition.new_state;
    let plan_id: i64 = state.plan.id;
    let record: PlanRecord = PlanRecord::from_domain(&state.plan)?;
    let votes: Vec<VoteRecord> = vote_records(state)?;

    conn.transaction::<_, PersistenceError, _>(|conn| {
        diesel::insert_into(event_plans::table)
            .values(&record)
            .on_conflict(event_plans::plan_id)
            .do_update()
            .set(&record)
            .execute(conn)?;
        replace_votes(conn, plan_id, &votes)?;

        debug!(plan_id, status = %state.plan.status, "Persisted plan");
        persist_audit_event(conn, &transition.audit_event)
    })
}

/// Commits a poll resolution if the stored plan still has `expected` status.
///
/// The plan row is updated only `WHERE status = expected`; when no row
/// matches, the whole transaction rolls back, including any event created
/// for the winning option.
///
/// # Errors
///
/// Returns `PersistenceError::PlanStatusChanged` if another writer changed
/// the plan first, or `PlanNotFound` if the plan does not exist.
pub fn commit_plan_resolution(
    conn: &mut SqliteConnection,
    transition: &PlanTransition,
    expected: PlanStatus,
) -> Result<Option<ScheduledEvent>, PersistenceError> {
    let plan_id: i64 = transition.new_state.plan.id;

    conn.transaction::<_, PersistenceError, _>(|conn| {
        let mut new_state: PlanState = transition.new_state.clone();
        let event: Option<ScheduledEvent> = match &transition.event_draft {
            Some(draft) => {
                let event_id: i64 = next_id(conn)?;
                new_state.plan.created_event_id = Some(event_id);
                Some(insert_event(conn, event_id, draft)?)
            }
            None => None,
        };

        let record: PlanRecord = PlanRecord::from_domain(&new_state.plan)?;
        let updated: usize = diesel::update(
            event_plans::table
                .filter(event_plans::plan_id.eq(plan_id))
                .filter(event_plans::status.eq(expected.as_str())),
        )
        .set(&record)
        .execute(conn)?;

        if updated == 0 {
            let actual: PlanStatus = get_plan_status(conn, plan_id)?;
            return Err(PersistenceError::PlanStatusChanged {
                plan_id,
                expected,
                actual,
            });
        }

        replace_votes(conn, plan_id, &vote_records(&new_state)?)?;

        info!(
            plan_id,
            status = %new_state.plan.status,
            event_id = ?new_state.plan.created_event_id,
            "Resolved plan"
        );
        persist_audit_event(conn, &transition.audit_event)?;
        Ok(event)
    })
}
