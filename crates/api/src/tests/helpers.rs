// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use raidplan::FixedClock;
use raidplan_audit::Cause;
use raidplan_persistence::Persistence;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{
    AuthenticatedActor, CreateEventRequest, CreatePlanRequest, PollOptionRequest, Role,
    SlotConfigRequest, StartPollRequest, create_event, create_plan, start_poll,
};

pub const NOW: OffsetDateTime = datetime!(2026-04-01 12:00 UTC);

pub fn create_test_admin() -> AuthenticatedActor {
    AuthenticatedActor::new(1, Role::Admin)
}

pub fn create_test_member(id: i64) -> AuthenticatedActor {
    AuthenticatedActor::new(id, Role::Member)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

pub fn create_test_clock() -> FixedClock {
    FixedClock::new(NOW)
}

/// One tank, one healer and two dps.
pub fn create_test_slot_config() -> SlotConfigRequest {
    SlotConfigRequest {
        config_type: String::from("mmo"),
        counts: BTreeMap::from([
            (String::from("tank"), 1),
            (String::from("healer"), 1),
            (String::from("dps"), 2),
        ]),
    }
}

pub fn create_test_event_request(auto_unbench: bool) -> CreateEventRequest {
    CreateEventRequest {
        title: String::from("Raid night"),
        start: String::from("2026-04-06T19:00:00Z"),
        end: String::from("2026-04-06T22:00:00Z"),
        slot_config: Some(create_test_slot_config()),
        reminders: raidplan_domain::ReminderSettings::default(),
        game_id: Some(3),
        auto_unbench,
        recurrence: None,
    }
}

/// Schedules the test event and returns its id.
pub fn create_test_event(persistence: &mut Persistence, auto_unbench: bool) -> i64 {
    create_event(
        persistence,
        create_test_event_request(auto_unbench),
        &create_test_member(7),
        create_test_cause(),
        "UTC",
    )
    .unwrap()
    .events[0]
        .id
}

/// Creates a plan owned by member 7 and opens a two-option poll closing
/// two days after `NOW`. Returns the plan id.
pub fn create_polling_plan(persistence: &mut Persistence, clock: &FixedClock) -> i64 {
    let plan_id: i64 = create_plan(
        persistence,
        clock,
        CreatePlanRequest {
            title: String::from("Raid night"),
            duration_minutes: 180,
            slot_config: Some(create_test_slot_config()),
            reminders: raidplan_domain::ReminderSettings::default(),
            game_id: Some(3),
            poll_mode: None,
        },
        &create_test_member(7),
        create_test_cause(),
    )
    .unwrap()
    .plan
    .id;

    start_poll(
        persistence,
        clock,
        plan_id,
        StartPollRequest {
            options: vec![
                PollOptionRequest {
                    date: String::from("2026-04-10T19:00:00Z"),
                    label: String::from("Fri"),
                },
                PollOptionRequest {
                    date: String::from("2026-04-11T19:00:00Z"),
                    label: String::from("Sat"),
                },
            ],
            poll_ends_at: Some(String::from("2026-04-03T12:00:00Z")),
        },
        &create_test_member(7),
        create_test_cause(),
    )
    .unwrap();

    plan_id
}
