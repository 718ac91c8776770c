// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{NewPlan, PlanState, RosterState, create_plan};
use raidplan_audit::{Actor, ActorKind, Cause};
use raidplan_domain::{
    PollMode, ReminderSettings, RosterRole, RosterSlotConfig, Signup, TimeWindow,
};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

pub const NOW: OffsetDateTime = datetime!(2026-04-01 12:00 UTC);

pub fn create_test_actor() -> Actor {
    Actor::new(7, ActorKind::Member)
}

pub fn create_test_admin() -> Actor {
    Actor::new(1, ActorKind::Admin)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Member request"))
}

pub fn range(start: OffsetDateTime, end: OffsetDateTime) -> TimeWindow {
    TimeWindow::new(start, end).unwrap()
}

pub fn create_test_signup(signup_id: i64, role: Option<RosterRole>) -> Signup {
    Signup {
        signup_id,
        user_id: signup_id + 100,
        signed_up_at: NOW + Duration::minutes(signup_id),
        role,
        preferred_roles: Vec::new(),
    }
}

pub fn create_test_roster(auto_unbench: bool) -> RosterState {
    RosterState::new(50, RosterSlotConfig::mmo(1, 1, 2, 0), auto_unbench)
}

pub fn create_test_plan(poll_mode: PollMode) -> PlanState {
    create_plan(
        NewPlan {
            plan_id: 30,
            creator_id: 7,
            title: String::from("Raid night"),
            duration_minutes: 180,
            slot_config: Some(RosterSlotConfig::mmo(2, 4, 14, 0)),
            reminders: ReminderSettings {
                fifteen_minutes: true,
                one_hour: true,
                twenty_four_hours: false,
            },
            game_id: Some(3),
            poll_mode,
        },
        create_test_actor(),
        create_test_cause(),
        NOW,
    )
    .unwrap()
    .new_state
}
