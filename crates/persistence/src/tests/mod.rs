// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod availability_tests;
mod event_tests;

use raidplan::{
    AvailabilityCommand, AvailabilityState, AvailabilityTransition, NewEvent, NewPlan,
    PlanTransition, ScheduleResult, apply_availability, create_plan, schedule_event,
};
use raidplan_audit::{Actor, ActorKind, Cause};
use raidplan_domain::{
    AvailabilityStatus, PollMode, RecurrenceFrequency, RecurrenceRule, ReminderSettings,
    RosterSlotConfig, TimeWindow,
};
use time::OffsetDateTime;
use time::macros::datetime;

use crate::Persistence;

pub const NOW: OffsetDateTime = datetime!(2026-04-01 12:00 UTC);

pub fn create_test_actor() -> Actor {
    Actor::new(7, ActorKind::Member)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-789"), String::from("Persistence test"))
}

pub fn range(start: OffsetDateTime, end: OffsetDateTime) -> TimeWindow {
    TimeWindow::new(start, end).unwrap()
}

/// Creates and persists a window for `user_id`, returning its id.
pub fn create_window(
    persistence: &mut Persistence,
    user_id: i64,
    time_range: TimeWindow,
    status: AvailabilityStatus,
) -> i64 {
    let window_id: i64 = persistence.next_id().unwrap();
    let state: AvailabilityState = persistence.get_availability_state(user_id).unwrap();
    let transition: AvailabilityTransition = apply_availability(
        &state,
        AvailabilityCommand::CreateWindow {
            window_id,
            time_range,
            status: Some(status),
            game_id: None,
            replace_ids: Vec::new(),
        },
        create_test_actor(),
        create_test_cause(),
        NOW,
    )
    .unwrap();
    persistence.persist_availability(&transition).unwrap();
    window_id
}

/// Builds a schedule for a weekly raid with a roster, `weeks` instances long.
pub fn create_test_schedule(event_id: i64, weeks: i64) -> ScheduleResult {
    let start: OffsetDateTime = datetime!(2026-04-06 19:00 UTC);
    let recurrence = (weeks > 1).then(|| {
        (
            RecurrenceRule {
                frequency: RecurrenceFrequency::Weekly,
                until: start + time::Duration::weeks(weeks - 1) + time::Duration::hours(1),
            },
            String::from("UTC"),
        )
    });
    schedule_event(
        NewEvent {
            event_id,
            title: String::from("Weekly raid"),
            time_range: range(start, start + time::Duration::hours(3)),
            slot_config: Some(RosterSlotConfig::mmo(1, 1, 2, 0)),
            reminders: ReminderSettings::default(),
            game_id: Some(3),
            auto_unbench: true,
            recurrence,
        },
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap()
}

/// Creates and persists a draft plan, returning the transition.
pub fn create_test_plan(persistence: &mut Persistence) -> PlanTransition {
    let plan_id: i64 = persistence.next_id().unwrap();
    let transition: PlanTransition = create_plan(
        NewPlan {
            plan_id,
            creator_id: 7,
            title: String::from("Raid night"),
            duration_minutes: 120,
            slot_config: Some(RosterSlotConfig::generic(5, 2)),
            reminders: ReminderSettings::default(),
            game_id: None,
            poll_mode: PollMode::Standard,
        },
        create_test_actor(),
        create_test_cause(),
        NOW,
    )
    .unwrap();
    persistence.persist_plan(&transition).unwrap();
    transition
}

#[test]
fn test_ids_come_from_one_sequence() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    assert_eq!(persistence.next_id().unwrap(), 1);
    assert_eq!(persistence.next_id().unwrap(), 2);
    assert_eq!(persistence.next_id().unwrap(), 3);
}

#[test]
fn test_in_memory_databases_are_isolated() {
    let mut first = Persistence::new_in_memory().unwrap();
    let mut second = Persistence::new_in_memory().unwrap();

    assert_eq!(first.next_id().unwrap(), 1);
    assert_eq!(first.next_id().unwrap(), 2);
    assert_eq!(second.next_id().unwrap(), 1);
}
