// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{create_test_admin, create_test_cause, range};
use crate::{CoreError, NewEvent, ScheduleResult, cancel_event, schedule_event};
use raidplan_audit::AuditScope;
use raidplan_domain::{
    RecurrenceFrequency, RecurrenceRule, ReminderSettings, RosterSlotConfig, ScheduledEvent,
};
use time::macros::datetime;

fn new_event(recurrence: Option<(RecurrenceRule, String)>) -> NewEvent {
    NewEvent {
        event_id: 200,
        title: String::from("Weekly raid"),
        time_range: range(
            datetime!(2026-03-02 00:00 UTC),
            datetime!(2026-03-02 03:00 UTC),
        ),
        slot_config: Some(RosterSlotConfig::mmo(2, 4, 14, 0)),
        reminders: ReminderSettings::default(),
        game_id: Some(3),
        auto_unbench: true,
        recurrence,
    }
}

#[test]
fn test_single_event_has_no_group() {
    let result: ScheduleResult =
        schedule_event(new_event(None), create_test_admin(), create_test_cause()).unwrap();

    assert_eq!(result.drafts.len(), 1);
    assert_eq!(result.drafts[0].recurrence_group_id, None);
    assert!(result.drafts[0].auto_unbench);
    assert_eq!(result.audit_event.scope, AuditScope::Event(200));
}

#[test]
fn test_recurring_event_shares_group_id() {
    let rule: RecurrenceRule = RecurrenceRule {
        frequency: RecurrenceFrequency::Weekly,
        until: datetime!(2026-03-22 00:00 UTC),
    };

    let result: ScheduleResult = schedule_event(
        new_event(Some((rule, String::from("America/New_York")))),
        create_test_admin(),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(result.drafts.len(), 3);
    assert!(
        result
            .drafts
            .iter()
            .all(|d| d.recurrence_group_id == Some(200))
    );
    assert_eq!(
        result.drafts[1].time_range.start(),
        datetime!(2026-03-08 23:00 UTC)
    );
}

#[test]
fn test_cancel_twice_rejected() {
    let draft = schedule_event(new_event(None), create_test_admin(), create_test_cause())
        .unwrap()
        .drafts
        .remove(0);
    let event: ScheduledEvent = ScheduledEvent {
        id: 200,
        draft,
        cancelled: false,
    };

    let cancelled = cancel_event(&event, create_test_admin(), create_test_cause()).unwrap();
    assert!(cancelled.event.cancelled);
    assert_eq!(cancelled.audit_event.action.name, "CancelEvent");

    assert_eq!(
        cancel_event(&cancelled.event, create_test_admin(), create_test_cause()).unwrap_err(),
        CoreError::EventCancelled { event_id: 200 }
    );
}
