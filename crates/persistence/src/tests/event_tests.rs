// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{create_test_actor, create_test_cause, create_test_schedule, range};
use crate::{Persistence, PersistenceError};
use raidplan::{NewEvent, RosterCommand, apply_roster, cancel_event, schedule_event};
use raidplan_audit::AuditScope;
use raidplan_domain::{ReminderSettings, RosterRole, Signup};
use time::macros::datetime;

#[test]
fn test_series_instances_get_fresh_ids_and_share_group() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = persistence.next_id().unwrap();

    let (events, _) = persistence
        .persist_schedule(event_id, &create_test_schedule(event_id, 3))
        .unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].id, event_id);
    assert_eq!(events[1].id, event_id + 1);
    assert_eq!(events[2].id, event_id + 2);
    assert!(
        events
            .iter()
            .all(|e| e.draft.recurrence_group_id == Some(event_id))
    );
    assert_eq!(persistence.get_series(event_id).unwrap(), events);
    assert_eq!(persistence.next_id().unwrap(), event_id + 3);
}

#[test]
fn test_each_instance_gets_its_own_roster() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = persistence.next_id().unwrap();
    let (events, _) = persistence
        .persist_schedule(event_id, &create_test_schedule(event_id, 2))
        .unwrap();

    for event in &events {
        let roster = persistence.get_roster_state(event.id).unwrap();
        assert_eq!(roster.event_id, event.id);
        assert!(roster.auto_unbench);
        assert!(roster.signups.is_empty());
    }
}

#[test]
fn test_event_without_slot_config_has_no_roster() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = persistence.next_id().unwrap();
    let result = schedule_event(
        NewEvent {
            event_id,
            title: String::from("Social night"),
            time_range: range(datetime!(2026-04-06 19:00 UTC), datetime!(2026-04-06 21:00 UTC)),
            slot_config: None,
            reminders: ReminderSettings::default(),
            game_id: None,
            auto_unbench: false,
            recurrence: None,
        },
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    persistence.persist_schedule(event_id, &result).unwrap();

    assert_eq!(
        persistence.get_roster_state(event_id),
        Err(PersistenceError::RosterNotConfigured(event_id))
    );
    assert_eq!(
        persistence.get_roster_state(999),
        Err(PersistenceError::EventNotFound(999))
    );
}

#[test]
fn test_roster_transition_is_stored() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = persistence.next_id().unwrap();
    persistence
        .persist_schedule(event_id, &create_test_schedule(event_id, 1))
        .unwrap();

    let signup_id = persistence.next_id().unwrap();
    let state = persistence.get_roster_state(event_id).unwrap();
    let transition = apply_roster(
        &state,
        RosterCommand::AddSignup {
            signup: Signup {
                signup_id,
                user_id: 10,
                signed_up_at: datetime!(2026-04-01 12:00 UTC),
                role: Some(RosterRole::Tank),
                preferred_roles: Vec::new(),
            },
        },
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    persistence.persist_roster(&transition).unwrap();

    let stored = persistence.get_roster_state(event_id).unwrap();
    assert_eq!(stored.signups.len(), 1);
    assert_eq!(stored.assignments[0].slot, Some(RosterRole::Tank));

    let timeline = persistence
        .get_audit_timeline(AuditScope::Event(event_id))
        .unwrap();
    let names: Vec<&str> = timeline.iter().map(|e| e.action.name.as_str()).collect();
    assert_eq!(names, vec!["ScheduleEvent", "AddSignup"]);
}

#[test]
fn test_cancel_marks_event() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = persistence.next_id().unwrap();
    persistence
        .persist_schedule(event_id, &create_test_schedule(event_id, 1))
        .unwrap();

    let event = persistence.get_event(event_id).unwrap();
    let result = cancel_event(&event, create_test_actor(), create_test_cause()).unwrap();
    persistence.persist_event_cancel(&result).unwrap();

    assert!(persistence.get_event(event_id).unwrap().cancelled);
}

#[test]
fn test_cancel_unknown_event_fails() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let mut other = Persistence::new_in_memory().unwrap();
    let event_id = other.next_id().unwrap();
    other
        .persist_schedule(event_id, &create_test_schedule(event_id, 1))
        .unwrap();
    let event = other.get_event(event_id).unwrap();
    let result = cancel_event(&event, create_test_actor(), create_test_cause()).unwrap();

    assert_eq!(
        persistence.persist_event_cancel(&result),
        Err(PersistenceError::EventNotFound(event_id))
    );
}
