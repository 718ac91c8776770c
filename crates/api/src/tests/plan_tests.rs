// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use raidplan::FixedClock;
use raidplan_audit::ActorKind;
use raidplan_persistence::Persistence;
use time::macros::datetime;

use super::helpers::{create_polling_plan, create_test_cause, create_test_clock, create_test_member};
use crate::{
    ApiError, CastVoteRequest, PlanResponse, cast_vote, get_audit_timeline, get_plan, get_roster,
    resolve_due_plans, resolve_plan,
};

fn vote(
    persistence: &mut Persistence,
    clock: &FixedClock,
    plan_id: i64,
    user_id: i64,
    option_index: usize,
) -> PlanResponse {
    cast_vote(
        persistence,
        clock,
        plan_id,
        CastVoteRequest {
            option_index: Some(option_index),
            ..CastVoteRequest::default()
        },
        &create_test_member(user_id),
        create_test_cause(),
    )
    .unwrap()
}

#[test]
fn test_latest_vote_replaces_earlier_one() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let plan_id = create_polling_plan(&mut persistence, &clock);

    vote(&mut persistence, &clock, plan_id, 20, 0);
    let response = vote(&mut persistence, &clock, plan_id, 20, 1);

    assert_eq!(response.plan.status, "polling");
    assert_eq!(response.plan.voter_count, 1);
    assert_eq!(response.plan.options[0].votes, 0);
    assert_eq!(response.plan.options[1].votes, 1);
}

#[test]
fn test_vote_needs_exactly_one_choice() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let plan_id = create_polling_plan(&mut persistence, &clock);

    let both = cast_vote(
        &mut persistence,
        &clock,
        plan_id,
        CastVoteRequest {
            discord_id: None,
            option_index: Some(0),
            none_of_these: true,
        },
        &create_test_member(20),
        create_test_cause(),
    );
    let neither = cast_vote(
        &mut persistence,
        &clock,
        plan_id,
        CastVoteRequest::default(),
        &create_test_member(20),
        create_test_cause(),
    );

    assert!(matches!(
        both,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "option_index"
    ));
    assert!(matches!(
        neither,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "option_index"
    ));
}

#[test]
fn test_vote_for_unknown_option_is_rejected() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let plan_id = create_polling_plan(&mut persistence, &clock);

    let result = cast_vote(
        &mut persistence,
        &clock,
        plan_id,
        CastVoteRequest {
            option_index: Some(5),
            ..CastVoteRequest::default()
        },
        &create_test_member(20),
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
}

#[test]
fn test_discord_voters_count_separately() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let plan_id = create_polling_plan(&mut persistence, &clock);

    vote(&mut persistence, &clock, plan_id, 20, 0);
    let response = cast_vote(
        &mut persistence,
        &clock,
        plan_id,
        CastVoteRequest {
            discord_id: Some(String::from("184405311681986560")),
            option_index: Some(0),
            none_of_these: false,
        },
        &create_test_member(20),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(response.plan.voter_count, 2);
    assert_eq!(response.plan.options[0].votes, 2);
}

#[test]
fn test_resolve_before_deadline_is_rejected() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let plan_id = create_polling_plan(&mut persistence, &clock);

    let result = resolve_plan(
        &mut persistence,
        &clock,
        plan_id,
        &create_test_member(7),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::StateTransitionRejected { .. })
    ));
}

#[test]
fn test_resolution_materializes_winning_event() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let plan_id = create_polling_plan(&mut persistence, &clock);
    vote(&mut persistence, &clock, plan_id, 20, 1);
    vote(&mut persistence, &clock, plan_id, 21, 1);
    vote(&mut persistence, &clock, plan_id, 22, 0);

    clock.set(datetime!(2026-04-03 12:00 UTC));
    let response = resolve_plan(
        &mut persistence,
        &clock,
        plan_id,
        &create_test_member(7),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(response.plan.status, "completed");
    assert_eq!(response.plan.winning_option, Some(1));
    let event = response.created_event.unwrap();
    assert_eq!(response.plan.created_event_id, Some(event.id));
    assert_eq!(event.start, "2026-04-11T19:00:00Z");
    assert_eq!(event.end, "2026-04-11T22:00:00Z");
    assert_eq!(event.source_plan_id, Some(plan_id));
    assert_eq!(event.game_id, Some(3));

    // The materialized event carries a usable roster.
    let roster = get_roster(&mut persistence, event.id).unwrap();
    assert!(roster.assignments.is_empty());

    let again = resolve_plan(
        &mut persistence,
        &clock,
        plan_id,
        &create_test_member(7),
        create_test_cause(),
    );
    assert!(matches!(again, Err(ApiError::StateTransitionRejected { .. })));
}

#[test]
fn test_only_creator_or_admin_resolves() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let plan_id = create_polling_plan(&mut persistence, &clock);
    clock.set(datetime!(2026-04-03 12:00 UTC));

    let result = resolve_plan(
        &mut persistence,
        &clock,
        plan_id,
        &create_test_member(20),
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert_eq!(get_plan(&mut persistence, plan_id).unwrap().status, "polling");
}

#[test]
fn test_sweep_resolves_only_due_plans() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let voted = create_polling_plan(&mut persistence, &clock);
    let silent = create_polling_plan(&mut persistence, &clock);
    vote(&mut persistence, &clock, voted, 20, 0);

    assert!(
        resolve_due_plans(&mut persistence, &clock)
            .unwrap()
            .is_empty()
    );

    clock.set(datetime!(2026-04-03 12:00 UTC));
    let resolved = resolve_due_plans(&mut persistence, &clock).unwrap();

    assert_eq!(resolved.len(), 2);
    assert_eq!(get_plan(&mut persistence, voted).unwrap().status, "completed");
    assert_eq!(get_plan(&mut persistence, silent).unwrap().status, "expired");
    assert!(resolved.iter().any(|r| r.created_event.is_some()));

    // A second sweep finds nothing left to do.
    assert!(
        resolve_due_plans(&mut persistence, &clock)
            .unwrap()
            .is_empty()
    );

    let timeline = get_audit_timeline(&mut persistence, "plan", silent).unwrap();
    let last = timeline.last().unwrap();
    assert_eq!(last.action.name, "ResolvePoll");
    assert_eq!(last.actor.kind, ActorKind::System);
}

#[test]
fn test_unknown_timeline_scope_is_rejected() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let result = get_audit_timeline(&mut persistence, "guild", 1);

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "scope"
    ));
}
