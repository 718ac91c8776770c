// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{NOW, create_test_actor, create_test_cause, create_test_plan};
use crate::{CoreError, PlanCommand, PlanState, PlanTransition, apply_plan};
use raidplan_audit::AuditScope;
use raidplan_domain::{
    DomainError, ErrorKind, PlanStatus, PollMode, PollOption, VoteChoice, Voter,
};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const DEADLINE: OffsetDateTime = datetime!(2026-04-05 00:00 UTC);

fn options() -> Vec<PollOption> {
    vec![
        PollOption {
            date: datetime!(2026-04-10 19:00 UTC),
            label: String::from("Friday"),
        },
        PollOption {
            date: datetime!(2026-04-11 19:00 UTC),
            label: String::from("Saturday"),
        },
    ]
}

fn run(state: &PlanState, command: PlanCommand, now: OffsetDateTime) -> Result<PlanTransition, CoreError> {
    apply_plan(state, command, create_test_actor(), create_test_cause(), now)
}

fn polling(mode: PollMode) -> PlanState {
    run(
        &create_test_plan(mode),
        PlanCommand::StartPoll {
            options: options(),
            poll_ends_at: Some(DEADLINE),
        },
        NOW,
    )
    .unwrap()
    .new_state
}

fn vote(state: &PlanState, user_id: i64, choice: VoteChoice) -> PlanState {
    run(
        state,
        PlanCommand::CastVote {
            voter: Voter::User(user_id),
            choice,
        },
        NOW + Duration::minutes(user_id),
    )
    .unwrap()
    .new_state
}

#[test]
fn test_start_poll_moves_draft_to_polling() {
    let state: PlanState = polling(PollMode::Standard);

    assert_eq!(state.plan.status, PlanStatus::Polling);
    assert_eq!(state.plan.poll_options.len(), 2);
    assert_eq!(state.plan.poll_ends_at, Some(DEADLINE));
}

#[test]
fn test_start_poll_requires_future_deadline() {
    let result = run(
        &create_test_plan(PollMode::Standard),
        PlanCommand::StartPoll {
            options: options(),
            poll_ends_at: Some(NOW),
        },
        NOW,
    );

    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(DomainError::InvalidPollDeadline { .. }))
    ));
}

#[test]
fn test_start_poll_requires_two_options() {
    let result = run(
        &create_test_plan(PollMode::Standard),
        PlanCommand::StartPoll {
            options: options().into_iter().take(1).collect(),
            poll_ends_at: Some(DEADLINE),
        },
        NOW,
    );

    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(DomainError::InvalidPollOptionCount { count: 1, .. }))
    ));
}

#[test]
fn test_winning_poll_completes_and_materializes_event() {
    let mut state: PlanState = polling(PollMode::Standard);
    state = vote(&state, 1, VoteChoice::Option(1));
    state = vote(&state, 2, VoteChoice::Option(1));
    state = vote(&state, 3, VoteChoice::Option(0));

    let transition: PlanTransition = run(&state, PlanCommand::ResolvePoll, DEADLINE).unwrap();

    assert_eq!(transition.new_state.plan.status, PlanStatus::Completed);
    assert_eq!(transition.new_state.plan.winning_option, Some(1));
    let draft = transition.event_draft.unwrap();
    assert_eq!(draft.time_range.start(), datetime!(2026-04-11 19:00 UTC));
    assert_eq!(draft.time_range.end(), datetime!(2026-04-11 22:00 UTC));
    assert_eq!(draft.source_plan_id, Some(30));
    assert!(draft.reminders.one_hour);
    assert_eq!(transition.audit_event.scope, AuditScope::Plan(30));
}

#[test]
fn test_all_or_nothing_poll_expires_without_event() {
    let mut state: PlanState = polling(PollMode::AllOrNothing);
    state = vote(&state, 1, VoteChoice::Option(0));
    state = vote(&state, 2, VoteChoice::NoneOfThese);

    let transition: PlanTransition = run(&state, PlanCommand::ResolvePoll, DEADLINE).unwrap();

    assert_eq!(transition.new_state.plan.status, PlanStatus::Expired);
    assert!(transition.event_draft.is_none());
    assert_eq!(transition.new_state.plan.winning_option, None);
}

#[test]
fn test_resolve_twice_rejected() {
    let state: PlanState = vote(&polling(PollMode::Standard), 1, VoteChoice::Option(0));
    let resolved: PlanState = run(&state, PlanCommand::ResolvePoll, DEADLINE)
        .unwrap()
        .new_state;

    let err = run(&resolved, PlanCommand::ResolvePoll, DEADLINE).unwrap_err();

    match err {
        CoreError::DomainViolation(domain) => {
            assert_eq!(domain.kind(), ErrorKind::StateTransitionRejected);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_vote_after_deadline_rejected() {
    let state: PlanState = polling(PollMode::Standard);

    let result = run(
        &state,
        PlanCommand::CastVote {
            voter: Voter::Discord(String::from("raider#42")),
            choice: VoteChoice::Option(0),
        },
        DEADLINE,
    );

    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(DomainError::PollDeadlinePassed { .. }))
    ));
}

#[test]
fn test_cancel_from_draft_and_polling_only() {
    let draft: PlanState = create_test_plan(PollMode::Standard);
    let cancelled: PlanState = run(&draft, PlanCommand::CancelPlan, NOW).unwrap().new_state;
    assert_eq!(cancelled.plan.status, PlanStatus::Cancelled);

    let from_polling = run(&polling(PollMode::Standard), PlanCommand::CancelPlan, NOW).unwrap();
    assert_eq!(from_polling.new_state.plan.status, PlanStatus::Cancelled);

    assert!(run(&cancelled, PlanCommand::CancelPlan, NOW).is_err());
}

#[test]
fn test_create_plan_rejects_blank_title() {
    let result = crate::create_plan(
        crate::NewPlan {
            plan_id: 1,
            creator_id: 7,
            title: String::from("  "),
            duration_minutes: 60,
            slot_config: None,
            reminders: raidplan_domain::ReminderSettings::default(),
            game_id: None,
            poll_mode: PollMode::Standard,
        },
        create_test_actor(),
        create_test_cause(),
        NOW,
    );

    assert_eq!(
        result.unwrap_err(),
        CoreError::DomainViolation(DomainError::EmptyTitle)
    );
}
