// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use raidplan_persistence::Persistence;

use super::helpers::{
    create_polling_plan, create_test_admin, create_test_cause, create_test_clock,
    create_test_event, create_test_member,
};
use crate::{
    ApiError, CreateAvailabilityRequest, SignupRequest, UpdateRosterRequest, cancel_event,
    cancel_plan, create_availability, sign_up, update_roster,
};

#[test]
fn test_member_cannot_create_window_for_someone_else() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();

    let result = create_availability(
        &mut persistence,
        &clock,
        CreateAvailabilityRequest {
            user_id: Some(11),
            start: String::from("2026-04-02T18:00:00Z"),
            end: String::from("2026-04-02T22:00:00Z"),
            status: None,
            game_id: None,
            replace_ids: Vec::new(),
        },
        &create_test_member(10),
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_admin_can_create_window_for_someone_else() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();

    let response = create_availability(
        &mut persistence,
        &clock,
        CreateAvailabilityRequest {
            user_id: Some(11),
            start: String::from("2026-04-02T18:00:00Z"),
            end: String::from("2026-04-02T22:00:00Z"),
            status: None,
            game_id: None,
            replace_ids: Vec::new(),
        },
        &create_test_admin(),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(response.window.user_id, 11);
}

#[test]
fn test_member_cannot_cancel_event() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let event_id = create_test_event(&mut persistence, false);

    let result = cancel_event(
        &mut persistence,
        &clock,
        event_id,
        &create_test_member(7),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::Unauthorized { ref required_role, .. }) if required_role == "Admin"
    ));
    assert!(!persistence.get_event(event_id).unwrap().cancelled);
}

#[test]
fn test_member_cannot_edit_roster() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let event_id = create_test_event(&mut persistence, false);

    let result = update_roster(
        &mut persistence,
        event_id,
        &UpdateRosterRequest {
            assignments: Vec::new(),
        },
        &create_test_member(7),
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_member_cannot_sign_up_someone_else() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let event_id = create_test_event(&mut persistence, false);

    let result = sign_up(
        &mut persistence,
        &clock,
        event_id,
        &SignupRequest {
            user_id: Some(20),
            role: Some(String::from("tank")),
            preferred_roles: Vec::new(),
        },
        &create_test_member(21),
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_only_creator_or_admin_manages_plan() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let clock = create_test_clock();
    let plan_id = create_polling_plan(&mut persistence, &clock);

    let result = cancel_plan(
        &mut persistence,
        &clock,
        plan_id,
        &create_test_member(99),
        create_test_cause(),
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));

    let response = cancel_plan(
        &mut persistence,
        &clock,
        plan_id,
        &create_test_admin(),
        create_test_cause(),
    )
    .unwrap();
    assert_eq!(response.plan.status, "cancelled");
}
