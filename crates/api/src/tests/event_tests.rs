// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use raidplan_persistence::Persistence;

use super::helpers::{
    create_test_admin, create_test_cause, create_test_clock, create_test_event,
    create_test_event_request, create_test_member,
};
use crate::{
    ApiError, AssignmentRequest, CreateAvailabilityRequest, ListAvailabilityRequest,
    RecurrenceRequest, SignupRequest, SignupResponse, UpdateRosterRequest, cancel_event,
    create_availability, create_event, get_roster, get_series, list_availability, sign_up,
    update_roster, withdraw_signup,
};

fn join(persistence: &mut Persistence, event_id: i64, user_id: i64, role: &str) -> SignupResponse {
    sign_up(
        persistence,
        &create_test_clock(),
        event_id,
        &SignupRequest {
            user_id: None,
            role: Some(role.to_string()),
            preferred_roles: Vec::new(),
        },
        &create_test_member(user_id),
        create_test_cause(),
    )
    .unwrap()
}

#[test]
fn test_recurring_event_creates_series() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let mut request = create_test_event_request(false);
    request.recurrence = Some(RecurrenceRequest {
        frequency: String::from("weekly"),
        until: String::from("2026-04-21T00:00:00Z"),
        timezone: Some(String::from("Europe/Berlin")),
    });

    let response = create_event(
        &mut persistence,
        request,
        &create_test_member(7),
        create_test_cause(),
        "UTC",
    )
    .unwrap();

    let starts: Vec<&str> = response.events.iter().map(|e| e.start.as_str()).collect();
    assert_eq!(
        starts,
        vec![
            "2026-04-06T19:00:00Z",
            "2026-04-13T19:00:00Z",
            "2026-04-20T19:00:00Z"
        ]
    );
    let group = response.events[0].id;
    assert!(
        response
            .events
            .iter()
            .all(|e| e.recurrence_group_id == Some(group))
    );
}

#[test]
fn test_signup_places_and_commits_window() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = create_test_event(&mut persistence, false);
    create_availability(
        &mut persistence,
        &create_test_clock(),
        CreateAvailabilityRequest {
            user_id: None,
            start: String::from("2026-04-06T18:00:00Z"),
            end: String::from("2026-04-06T23:00:00Z"),
            status: None,
            game_id: None,
            replace_ids: Vec::new(),
        },
        &create_test_member(20),
        create_test_cause(),
    )
    .unwrap();

    let response = join(&mut persistence, event_id, 20, "tank");

    assert_eq!(response.assignment.slot.as_deref(), Some("tank"));
    assert_eq!(response.assignment.position, 1);
    let window = response.committed_window.unwrap();
    assert_eq!(window.status, "committed");
    assert_eq!(window.source_event_id, Some(event_id));
    assert_eq!(window.game_id, Some(3));
    assert_eq!(response.conflicts.len(), 1);
}

#[test]
fn test_full_role_sends_signup_to_pool() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = create_test_event(&mut persistence, false);

    join(&mut persistence, event_id, 20, "tank");
    let second = join(&mut persistence, event_id, 21, "tank");

    assert_eq!(second.assignment.slot, None);
    assert_eq!(second.roster.pool.len(), 1);
    assert_eq!(second.roster.pool[0].user_id, 21);
}

#[test]
fn test_duplicate_signup_is_rejected() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = create_test_event(&mut persistence, false);
    join(&mut persistence, event_id, 20, "tank");

    let result = sign_up(
        &mut persistence,
        &create_test_clock(),
        event_id,
        &SignupRequest {
            user_id: None,
            role: Some(String::from("dps")),
            preferred_roles: Vec::new(),
        },
        &create_test_member(20),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::StateTransitionRejected { .. })
    ));
}

#[test]
fn test_event_without_roster_rejects_signup() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let mut request = create_test_event_request(false);
    request.slot_config = None;
    let event_id = create_event(
        &mut persistence,
        request,
        &create_test_member(7),
        create_test_cause(),
        "UTC",
    )
    .unwrap()
    .events[0]
        .id;

    let result = sign_up(
        &mut persistence,
        &create_test_clock(),
        event_id,
        &SignupRequest::default(),
        &create_test_member(20),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "event_id"
    ));
}

#[test]
fn test_withdrawal_promotes_pool_member() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = create_test_event(&mut persistence, true);
    let first = join(&mut persistence, event_id, 20, "tank");
    let waiting = join(&mut persistence, event_id, 21, "tank");

    let response = withdraw_signup(
        &mut persistence,
        &create_test_clock(),
        event_id,
        first.signup_id,
        &create_test_member(20),
        create_test_cause(),
    )
    .unwrap();

    let promotion = response.promotion.unwrap();
    assert_eq!(promotion.signup_id, waiting.signup_id);
    assert_eq!(promotion.user_id, 21);
    assert_eq!(promotion.slot, "tank");
    assert_eq!(promotion.position, 1);
    assert!(response.roster.pool.is_empty());
}

#[test]
fn test_withdrawal_without_auto_unbench_leaves_pool() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = create_test_event(&mut persistence, false);
    let first = join(&mut persistence, event_id, 20, "tank");
    join(&mut persistence, event_id, 21, "tank");

    let response = withdraw_signup(
        &mut persistence,
        &create_test_clock(),
        event_id,
        first.signup_id,
        &create_test_member(20),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(response.promotion, None);
    assert_eq!(response.roster.pool.len(), 1);
}

#[test]
fn test_withdrawal_from_overfilled_role_promotes_no_one() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = create_test_event(&mut persistence, true);
    let first = join(&mut persistence, event_id, 20, "tank");
    let second = join(&mut persistence, event_id, 21, "tank");

    update_roster(
        &mut persistence,
        event_id,
        &UpdateRosterRequest {
            assignments: vec![
                AssignmentRequest {
                    signup_id: first.signup_id,
                    slot: Some(String::from("tank")),
                    position: 1,
                    is_override: false,
                },
                AssignmentRequest {
                    signup_id: second.signup_id,
                    slot: Some(String::from("tank")),
                    position: 2,
                    is_override: true,
                },
            ],
        },
        &create_test_admin(),
        create_test_cause(),
    )
    .unwrap();
    let waiting = join(&mut persistence, event_id, 22, "tank");
    assert_eq!(waiting.assignment.slot, None);

    let response = withdraw_signup(
        &mut persistence,
        &create_test_clock(),
        event_id,
        first.signup_id,
        &create_test_member(20),
        create_test_cause(),
    )
    .unwrap();

    // The remaining override still fills the only tank slot.
    assert_eq!(response.promotion, None);
    let tanks: Vec<i64> = response
        .roster
        .assignments
        .iter()
        .filter(|a| a.slot.as_deref() == Some("tank"))
        .map(|a| a.user_id)
        .collect();
    assert_eq!(tanks, vec![21]);
    let pool: Vec<i64> = response.roster.pool.iter().map(|a| a.user_id).collect();
    assert_eq!(pool, vec![22]);
}

#[test]
fn test_withdrawal_releases_committed_window() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = create_test_event(&mut persistence, false);
    let list = |persistence: &mut Persistence| {
        list_availability(
            persistence,
            &ListAvailabilityRequest {
                user_id: 20,
                start: None,
                end: None,
            },
        )
        .unwrap()
        .windows
    };

    let joined = join(&mut persistence, event_id, 20, "tank");
    let committed_id = joined.committed_window.unwrap().id;

    let response = withdraw_signup(
        &mut persistence,
        &create_test_clock(),
        event_id,
        joined.signup_id,
        &create_test_member(20),
        create_test_cause(),
    )
    .unwrap();
    assert_eq!(response.released_window_ids, vec![committed_id]);
    assert!(list(&mut persistence).is_empty());

    let rejoined = join(&mut persistence, event_id, 20, "tank");
    let windows = list(&mut persistence);
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].status, "committed");
    assert_eq!(windows[0].source_event_id, Some(event_id));
    assert_eq!(Some(windows[0].id), rejoined.committed_window.map(|w| w.id));
    assert!(rejoined.conflicts.is_empty());
}

#[test]
fn test_cancel_frees_committed_windows_once() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let event_id = create_test_event(&mut persistence, false);
    join(&mut persistence, event_id, 20, "tank");
    join(&mut persistence, event_id, 21, "healer");

    let response = cancel_event(
        &mut persistence,
        &clock,
        event_id,
        &create_test_admin(),
        create_test_cause(),
    )
    .unwrap();

    assert!(response.event.cancelled);
    assert_eq!(response.freed_user_ids, vec![20, 21]);
    let windows = list_availability(
        &mut persistence,
        &ListAvailabilityRequest {
            user_id: 20,
            start: None,
            end: None,
        },
    )
    .unwrap()
    .windows;
    assert_eq!(windows[0].status, "freed");
    assert_eq!(windows[0].source_event_id, Some(event_id));

    let again = cancel_event(
        &mut persistence,
        &clock,
        event_id,
        &create_test_admin(),
        create_test_cause(),
    );
    assert!(matches!(again, Err(ApiError::StateTransitionRejected { .. })));
}

#[test]
fn test_roster_batch_with_shared_position_is_rejected() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = create_test_event(&mut persistence, false);
    let a = join(&mut persistence, event_id, 20, "dps");
    let b = join(&mut persistence, event_id, 21, "dps");

    let result = update_roster(
        &mut persistence,
        event_id,
        &UpdateRosterRequest {
            assignments: vec![
                AssignmentRequest {
                    signup_id: a.signup_id,
                    slot: Some(String::from("dps")),
                    position: 1,
                    is_override: false,
                },
                AssignmentRequest {
                    signup_id: b.signup_id,
                    slot: Some(String::from("dps")),
                    position: 1,
                    is_override: false,
                },
            ],
        },
        &create_test_admin(),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::RosterBatchRejected { ref signup_ids, .. })
            if signup_ids == &vec![a.signup_id, b.signup_id]
    ));
    // Nothing was written.
    let roster = get_roster(&mut persistence, event_id).unwrap();
    assert_eq!(roster.assignments.len(), 2);
}

#[test]
fn test_off_role_placement_is_flagged_override() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = create_test_event(&mut persistence, false);
    let dps = join(&mut persistence, event_id, 20, "dps");

    let response = update_roster(
        &mut persistence,
        event_id,
        &UpdateRosterRequest {
            assignments: vec![AssignmentRequest {
                signup_id: dps.signup_id,
                slot: Some(String::from("tank")),
                position: 1,
                is_override: false,
            }],
        },
        &create_test_admin(),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(response.roster.assignments.len(), 1);
    assert!(response.roster.assignments[0].is_override);
    assert_eq!(response.roster.assignments[0].slot.as_deref(), Some("tank"));
}

#[test]
fn test_series_lookup_from_any_instance() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let mut request = create_test_event_request(false);
    request.recurrence = Some(RecurrenceRequest {
        frequency: String::from("biweekly"),
        until: String::from("2026-05-05T00:00:00Z"),
        timezone: None,
    });
    let created = create_event(
        &mut persistence,
        request,
        &create_test_member(7),
        create_test_cause(),
        "UTC",
    )
    .unwrap();

    let single_id: i64 = create_test_event(&mut persistence, false);
    let series = get_series(&mut persistence, created.events[2].id).unwrap();
    let single = get_series(&mut persistence, single_id).unwrap();

    assert_eq!(series, created.events);
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].recurrence_group_id, None);
}
