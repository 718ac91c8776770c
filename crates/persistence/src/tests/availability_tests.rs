// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{NOW, create_test_actor, create_test_cause, create_window, range};
use crate::{Persistence, PersistenceError};
use raidplan::{AvailabilityCommand, apply_availability};
use raidplan_audit::AuditScope;
use raidplan_domain::AvailabilityStatus;
use time::macros::datetime;

#[test]
fn test_windows_are_scoped_to_their_owner() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let first = create_window(
        &mut persistence,
        10,
        range(datetime!(2026-04-02 18:00 UTC), datetime!(2026-04-02 22:00 UTC)),
        AvailabilityStatus::Available,
    );
    let second = create_window(
        &mut persistence,
        11,
        range(datetime!(2026-04-02 18:00 UTC), datetime!(2026-04-02 22:00 UTC)),
        AvailabilityStatus::Blocked,
    );

    assert_eq!(
        persistence.get_availability_state(10).unwrap().windows.len(),
        1
    );
    assert_eq!(
        persistence.get_availability_state(11).unwrap().windows.len(),
        1
    );
    assert_eq!(persistence.find_window_owner(first), Ok(10));
    assert_eq!(persistence.find_window_owner(second), Ok(11));
    assert_eq!(
        persistence.find_window_owner(999),
        Err(PersistenceError::WindowNotFound(999))
    );
}

#[test]
fn test_delete_removes_stored_window() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let window_id = create_window(
        &mut persistence,
        10,
        range(datetime!(2026-04-02 18:00 UTC), datetime!(2026-04-02 22:00 UTC)),
        AvailabilityStatus::Available,
    );

    let state = persistence.get_availability_state(10).unwrap();
    let transition = apply_availability(
        &state,
        AvailabilityCommand::DeleteWindow { window_id },
        create_test_actor(),
        create_test_cause(),
        NOW,
    )
    .unwrap();
    persistence.persist_availability(&transition).unwrap();

    assert!(
        persistence
            .get_availability_state(10)
            .unwrap()
            .windows
            .is_empty()
    );
    assert!(persistence.find_window_owner(window_id).is_err());
}

#[test]
fn test_list_windows_filters_by_range_and_orders_by_start() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let late = create_window(
        &mut persistence,
        10,
        range(datetime!(2026-04-03 18:00 UTC), datetime!(2026-04-03 22:00 UTC)),
        AvailabilityStatus::Available,
    );
    let early = create_window(
        &mut persistence,
        10,
        range(datetime!(2026-04-02 18:00 UTC), datetime!(2026-04-02 22:00 UTC)),
        AvailabilityStatus::Available,
    );
    create_window(
        &mut persistence,
        10,
        range(datetime!(2026-04-09 18:00 UTC), datetime!(2026-04-09 22:00 UTC)),
        AvailabilityStatus::Blocked,
    );

    let listed = persistence.list_windows(
        10,
        Some(&range(
            datetime!(2026-04-02 00:00 UTC),
            datetime!(2026-04-05 00:00 UTC),
        )),
    )
    .unwrap();

    let ids: Vec<i64> = listed.iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![early, late]);
    assert_eq!(persistence.list_windows(10, None).unwrap().len(), 3);
}

#[test]
fn test_committed_users_are_found_by_event() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    for user_id in [10, 11] {
        let window_id = persistence.next_id().unwrap();
        let state = persistence.get_availability_state(user_id).unwrap();
        let transition = apply_availability(
            &state,
            AvailabilityCommand::CommitForEvent {
                window_id,
                event_id: 77,
                time_range: range(datetime!(2026-04-06 19:00 UTC), datetime!(2026-04-06 22:00 UTC)),
                game_id: None,
            },
            create_test_actor(),
            create_test_cause(),
            NOW,
        )
        .unwrap();
        persistence.persist_availability(&transition).unwrap();
    }

    assert_eq!(
        persistence.users_committed_to_event(77).unwrap(),
        vec![10, 11]
    );
    assert!(persistence.users_committed_to_event(78).unwrap().is_empty());
}

#[test]
fn test_each_write_records_one_audit_event() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    create_window(
        &mut persistence,
        10,
        range(datetime!(2026-04-02 18:00 UTC), datetime!(2026-04-02 22:00 UTC)),
        AvailabilityStatus::Available,
    );
    create_window(
        &mut persistence,
        10,
        range(datetime!(2026-04-03 18:00 UTC), datetime!(2026-04-03 22:00 UTC)),
        AvailabilityStatus::Available,
    );

    let timeline = persistence.get_audit_timeline(AuditScope::User(10)).unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].event_id, Some(1));
    assert_eq!(timeline[1].event_id, Some(2));
    assert_eq!(timeline[0].action.name, "CreateWindow");

    let fetched = persistence.get_audit_event(2).unwrap();
    assert_eq!(fetched, timeline[1]);
    assert_eq!(
        persistence.get_audit_event(3),
        Err(PersistenceError::AuditEventNotFound(3))
    );
}

#[test]
fn test_heatmap_input_keeps_requested_user_order() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    create_window(
        &mut persistence,
        10,
        range(datetime!(2026-04-02 18:00 UTC), datetime!(2026-04-02 22:00 UTC)),
        AvailabilityStatus::Available,
    );

    let input = persistence.heatmap_input(
        &[12, 10],
        &range(datetime!(2026-04-02 00:00 UTC), datetime!(2026-04-03 00:00 UTC)),
    )
    .unwrap();

    assert_eq!(input[0].user_id, 12);
    assert!(input[0].windows.is_empty());
    assert_eq!(input[1].user_id, 10);
    assert_eq!(input[1].windows.len(), 1);
}

#[test]
fn test_stored_window_keeps_every_field() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let window_id = persistence.next_id().unwrap();
    let state = persistence.get_availability_state(10).unwrap();
    let transition = apply_availability(
        &state,
        AvailabilityCommand::CommitForEvent {
            window_id,
            event_id: 77,
            time_range: range(
                datetime!(2026-04-06 19:00:00.5 UTC),
                datetime!(2026-04-06 22:00 UTC),
            ),
            game_id: Some(3),
        },
        create_test_actor(),
        create_test_cause(),
        NOW,
    )
    .unwrap();
    persistence.persist_availability(&transition).unwrap();

    let stored = persistence.get_availability_state(10).unwrap();
    assert_eq!(stored.windows, transition.new_state.windows);
    assert_eq!(stored.windows[0].status, AvailabilityStatus::Committed);
    assert_eq!(stored.windows[0].source_event_id, Some(77));
}
