// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::{AvailabilityCommand, RosterCommand};
use crate::error::CoreError;
use crate::state::{AvailabilityState, AvailabilityTransition, RosterState, RosterTransition};
use raidplan_audit::{Action, Actor, AuditEvent, AuditScope, Cause, StateSnapshot};
use raidplan_domain::{
    AvailabilityStatus, AvailabilityWindow, DomainError, NewAvailabilityWindow, PromotionCandidate,
    RosterAssignment, WindowWrite, assign_roster, commit_window, create_window,
    free_windows_for_event, is_eligible, place_signup, promotion_candidate,
    release_windows_for_event, update_window, validate_assignment_batch,
};
use time::OffsetDateTime;

/// Builds the single audit event for a transition.
pub(crate) fn audit(
    scope: AuditScope,
    actor: Actor,
    cause: Cause,
    name: &str,
    details: String,
    before: StateSnapshot,
    after: StateSnapshot,
) -> AuditEvent {
    AuditEvent::new(
        scope,
        actor,
        cause,
        Action::new(String::from(name), Some(details)),
        before,
        after,
    )
}

/// Looks up a window the user may change directly.
fn editable_window(
    state: &AvailabilityState,
    window_id: i64,
) -> Result<&AvailabilityWindow, DomainError> {
    let window: &AvailabilityWindow = state
        .window(window_id)
        .ok_or(DomainError::WindowNotFound { window_id })?;
    if window.status == AvailabilityStatus::Committed {
        return Err(DomainError::CommittedWindowImmutable { window_id });
    }
    Ok(window)
}

/// Applies a command to one user's availability windows.
///
/// # Arguments
///
/// * `state` - The user's current windows (immutable)
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `now` - The current instant, stamped onto written windows
///
/// # Errors
///
/// Returns an error if:
/// - A referenced window does not belong to the user
/// - A committed window is edited, deleted or replaced
/// - The resulting window violates domain rules
#[allow(clippy::too_many_lines)]
pub fn apply_availability(
    state: &AvailabilityState,
    command: AvailabilityCommand,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<AvailabilityTransition, CoreError> {
    let before: StateSnapshot = state.to_snapshot();
    let scope: AuditScope = AuditScope::User(state.user_id);

    match command {
        AvailabilityCommand::CreateWindow {
            window_id,
            time_range,
            status,
            game_id,
            replace_ids,
        } => {
            for replaced in &replace_ids {
                editable_window(state, *replaced)?;
            }

            let request: NewAvailabilityWindow = NewAvailabilityWindow {
                user_id: state.user_id,
                time_range,
                status,
                game_id,
            };
            let write: WindowWrite =
                create_window(&state.windows, window_id, &request, &replace_ids, now)?;

            let mut windows: Vec<AvailabilityWindow> = state
                .windows
                .iter()
                .filter(|w| !replace_ids.contains(&w.id))
                .cloned()
                .collect();
            windows.push(write.window.clone());

            let new_state: AvailabilityState = AvailabilityState {
                user_id: state.user_id,
                windows,
            };
            let details: String = format!(
                "Created {} window {window_id} ({} conflicts, replaced {replace_ids:?})",
                write.window.status,
                write.conflicts.len()
            );
            let audit_event: AuditEvent = audit(
                scope,
                actor,
                cause,
                "CreateWindow",
                details,
                before,
                new_state.to_snapshot(),
            );

            Ok(AvailabilityTransition {
                new_state,
                audit_event,
                window: Some(write.window),
                conflicts: write.conflicts,
            })
        }
        AvailabilityCommand::UpdateWindow { window_id, patch } => {
            let write: WindowWrite = update_window(&state.windows, window_id, &patch, now)?;

            let mut new_state: AvailabilityState = state.clone();
            for window in &mut new_state.windows {
                if window.id == window_id {
                    *window = write.window.clone();
                }
            }

            let details: String = format!(
                "Updated window {window_id} ({} conflicts)",
                write.conflicts.len()
            );
            let audit_event: AuditEvent = audit(
                scope,
                actor,
                cause,
                "UpdateWindow",
                details,
                before,
                new_state.to_snapshot(),
            );

            Ok(AvailabilityTransition {
                new_state,
                audit_event,
                window: Some(write.window),
                conflicts: write.conflicts,
            })
        }
        AvailabilityCommand::DeleteWindow { window_id } => {
            editable_window(state, window_id)?;

            let mut new_state: AvailabilityState = state.clone();
            new_state.windows.retain(|w| w.id != window_id);

            let audit_event: AuditEvent = audit(
                scope,
                actor,
                cause,
                "DeleteWindow",
                format!("Deleted window {window_id}"),
                before,
                new_state.to_snapshot(),
            );

            Ok(AvailabilityTransition {
                new_state,
                audit_event,
                window: None,
                conflicts: Vec::new(),
            })
        }
        AvailabilityCommand::CommitForEvent {
            window_id,
            event_id,
            time_range,
            game_id,
        } => {
            let write: WindowWrite = commit_window(
                &state.windows,
                window_id,
                state.user_id,
                time_range,
                event_id,
                game_id,
                now,
            )?;

            let mut new_state: AvailabilityState = state.clone();
            new_state.windows.push(write.window.clone());

            let audit_event: AuditEvent = audit(
                scope,
                actor,
                cause,
                "CommitForEvent",
                format!("Committed window {window_id} for event {event_id}"),
                before,
                new_state.to_snapshot(),
            );

            Ok(AvailabilityTransition {
                new_state,
                audit_event,
                window: Some(write.window),
                conflicts: write.conflicts,
            })
        }
        AvailabilityCommand::FreeForEvent { event_id } => {
            let mut new_state: AvailabilityState = state.clone();
            let freed: Vec<i64> = free_windows_for_event(&mut new_state.windows, event_id, now);

            let audit_event: AuditEvent = audit(
                scope,
                actor,
                cause,
                "FreeForEvent",
                format!("Freed windows {freed:?} after event {event_id} was cancelled"),
                before,
                new_state.to_snapshot(),
            );

            Ok(AvailabilityTransition {
                new_state,
                audit_event,
                window: None,
                conflicts: Vec::new(),
            })
        }
        AvailabilityCommand::ReleaseForEvent { event_id } => {
            let mut new_state: AvailabilityState = state.clone();
            let released: Vec<i64> = release_windows_for_event(&mut new_state.windows, event_id);

            let audit_event: AuditEvent = audit(
                scope,
                actor,
                cause,
                "ReleaseForEvent",
                format!("Removed windows {released:?} after withdrawing from event {event_id}"),
                before,
                new_state.to_snapshot(),
            );

            Ok(AvailabilityTransition {
                new_state,
                audit_event,
                window: None,
                conflicts: Vec::new(),
            })
        }
    }
}

/// Applies a command to one event's roster.
///
/// # Arguments
///
/// * `state` - The current roster (immutable)
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
///
/// # Errors
///
/// Returns an error if:
/// - A signup is unknown, or a user signs up twice
/// - A replacement batch is rejected
#[allow(clippy::too_many_lines)]
pub fn apply_roster(
    state: &RosterState,
    command: RosterCommand,
    actor: Actor,
    cause: Cause,
) -> Result<RosterTransition, CoreError> {
    let before: StateSnapshot = state.to_snapshot();
    let scope: AuditScope = AuditScope::Event(state.event_id);

    match command {
        RosterCommand::AddSignup { signup } => {
            if state.signups.iter().any(|s| s.user_id == signup.user_id) {
                return Err(CoreError::AlreadySignedUp {
                    event_id: state.event_id,
                    user_id: signup.user_id,
                });
            }

            let placement: Option<RosterAssignment> =
                place_signup(&state.assignments, &signup, &state.slot_config);

            let mut new_state: RosterState = state.clone();
            new_state.signups.push(signup.clone());
            let details: String = match placement {
                Some(assignment) => {
                    let details = format!(
                        "Signup {} placed at {} position {}",
                        signup.signup_id,
                        assignment.slot.map_or("none", |s| s.as_str()),
                        assignment.position
                    );
                    new_state.assignments.push(assignment);
                    details
                }
                None => format!("Signup {} added to pool", signup.signup_id),
            };

            let audit_event: AuditEvent = audit(
                scope,
                actor,
                cause,
                "AddSignup",
                details,
                before,
                new_state.to_snapshot(),
            );

            Ok(RosterTransition {
                new_state,
                audit_event,
                promotion: None,
            })
        }
        RosterCommand::WithdrawSignup { signup_id } => {
            if state.signup(signup_id).is_none() {
                return Err(CoreError::SignupNotFound {
                    event_id: state.event_id,
                    signup_id,
                });
            }

            let vacated: Option<RosterAssignment> = state
                .assignments
                .iter()
                .find(|a| a.signup_id == signup_id)
                .cloned();

            let mut new_state: RosterState = state.clone();
            new_state.signups.retain(|s| s.signup_id != signup_id);
            new_state.assignments.retain(|a| a.signup_id != signup_id);

            let promotion: Option<PromotionCandidate> = if state.auto_unbench {
                vacated.as_ref().and_then(|v| {
                    v.slot.and_then(|slot| {
                        promotion_candidate(
                            slot,
                            v.position,
                            &new_state.assignments,
                            &new_state.pool(),
                            &new_state.signups,
                            &new_state.slot_config,
                        )
                    })
                })
            } else {
                None
            };

            if let Some(candidate) = &promotion {
                new_state.assignments.push(RosterAssignment {
                    signup_id: candidate.signup_id,
                    user_id: candidate.user_id,
                    slot: Some(candidate.slot),
                    position: candidate.position,
                    is_override: false,
                });
            }

            let details: String = promotion.as_ref().map_or_else(
                || format!("Signup {signup_id} withdrew"),
                |c| {
                    format!(
                        "Signup {signup_id} withdrew; signup {} promoted to {} position {}",
                        c.signup_id, c.slot, c.position
                    )
                },
            );
            let audit_event: AuditEvent = audit(
                scope,
                actor,
                cause,
                "WithdrawSignup",
                details,
                before,
                new_state.to_snapshot(),
            );

            Ok(RosterTransition {
                new_state,
                audit_event,
                promotion,
            })
        }
        RosterCommand::AutoAssign => {
            let mut new_state: RosterState = state.clone();
            new_state.assignments = assign_roster(&state.signups, &state.slot_config).assignments;

            let details: String = format!(
                "Auto-assigned {} of {} signups",
                new_state.assignments.len(),
                new_state.signups.len()
            );
            let audit_event: AuditEvent = audit(
                scope,
                actor,
                cause,
                "AutoAssign",
                details,
                before,
                new_state.to_snapshot(),
            );

            Ok(RosterTransition {
                new_state,
                audit_event,
                promotion: None,
            })
        }
        RosterCommand::ReplaceAssignments { assignments } => {
            validate_assignment_batch(&assignments, &state.slot_config, &state.signups)?;

            let mut placed: Vec<RosterAssignment> = assignments
                .iter()
                .filter_map(|entry| {
                    let slot = entry.slot?;
                    let signup = state.signup(entry.signup_id)?;
                    Some(RosterAssignment {
                        signup_id: signup.signup_id,
                        user_id: signup.user_id,
                        slot: Some(slot),
                        position: entry.position,
                        is_override: entry.is_override
                            || !is_eligible(signup, slot, &state.slot_config),
                    })
                })
                .collect();
            placed.sort_by_key(|a| (a.slot, a.position));

            let mut new_state: RosterState = state.clone();
            new_state.assignments = placed;

            let overrides: usize = new_state
                .assignments
                .iter()
                .filter(|a| a.is_override)
                .count();
            let details: String = format!(
                "Replaced roster with {} placements ({overrides} overrides)",
                new_state.assignments.len()
            );
            let audit_event: AuditEvent = audit(
                scope,
                actor,
                cause,
                "ReplaceAssignments",
                details,
                before,
                new_state.to_snapshot(),
            );

            Ok(RosterTransition {
                new_state,
                audit_event,
                promotion: None,
            })
        }
    }
}
