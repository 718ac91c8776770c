// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Every write loads the scoped state from persistence, applies a core
//! transition and persists the result together with its audit event. The
//! caller holds the persistence lock for the duration of a call.

use raidplan::{
    AvailabilityCommand, AvailabilityState, AvailabilityTransition, CancelResult, Clock,
    CoreError, NewEvent, NewPlan, PlanCommand, PlanState, PlanTransition, RosterCommand,
    RosterState, RosterTransition, ScheduleResult, apply_availability, apply_plan, apply_roster,
    cancel_event as cancel_event_transition, create_plan as create_plan_transition,
    schedule_event,
};
use raidplan_audit::{Actor, AuditEvent, AuditScope, Cause};
use raidplan_domain::{
    AvailabilityPatch, AvailabilityStatus, AvailabilityWindow, Conflict, DomainError,
    HeatmapGrid, HeatmapOptions, MAX_WINDOW_HOURS, PlanStatus, PollMode, PollOption, PollTally,
    RecurrenceFrequency, RecurrenceRule, RosterAssignment, RosterRole, RosterSlotConfig,
    ScheduledEvent, Signup, SlotConfigType, SlotPrecedence, SlotStatus, TimeWindow, UserWindows,
    VoteChoice, Voter, aggregate_heatmap, tally_votes,
};
use raidplan_persistence::{Persistence, PersistenceError};
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::{
    ApiError, InputError, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
use crate::request_response::{
    AssignmentInfo, CancelEventResponse, CastVoteRequest, ConflictInfo, CreateAvailabilityRequest,
    CreateEventRequest, CreateEventResponse, CreatePlanRequest, DeleteAvailabilityResponse,
    EventInfo, HeatmapRequest, HeatmapResponse, HeatmapRowInfo, ListAvailabilityRequest,
    ListAvailabilityResponse, PlanInfo, PlanResponse, PollOptionInfo, PromotionInfo,
    RecurrenceRequest, ResolvePlanResponse, RosterResponse, RosterWriteResponse, SignupRequest,
    SignupResponse, SlotConfigRequest, SlotInfo, StartPollRequest, UpdateAvailabilityRequest,
    UpdateRosterRequest, WindowInfo, WindowWriteResponse, WithdrawResponse,
};

// ============================================================================
// Parsing and Formatting
// ============================================================================

/// Parses an RFC 3339 timestamp field.
fn parse_timestamp(field: &str, value: &str) -> Result<OffsetDateTime, InputError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|_| InputError::InvalidTimestamp {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_optional_timestamp(
    field: &str,
    value: Option<&str>,
) -> Result<Option<OffsetDateTime>, InputError> {
    value.map(|v| parse_timestamp(field, v)).transpose()
}

fn parse_range(start: &str, end: &str) -> Result<TimeWindow, ApiError> {
    let start: OffsetDateTime = parse_timestamp("start", start)?;
    let end: OffsetDateTime = parse_timestamp("end", end)?;
    TimeWindow::new(start, end).map_err(translate_domain_error)
}

/// Parses an enumerated domain value from its name.
fn parse_named<T: FromStr<Err = DomainError>>(value: &str) -> Result<T, ApiError> {
    value.parse().map_err(translate_domain_error)
}

fn parse_slot_config(request: &SlotConfigRequest) -> Result<RosterSlotConfig, ApiError> {
    let config_type: SlotConfigType = parse_named(&request.config_type)?;
    let counts: Vec<(RosterRole, i64)> = request
        .counts
        .iter()
        .map(|(role, count)| parse_named::<RosterRole>(role).map(|r| (r, *count)))
        .collect::<Result<_, _>>()?;
    RosterSlotConfig::new(config_type, &counts).map_err(translate_domain_error)
}

fn parse_recurrence(
    request: &RecurrenceRequest,
    default_timezone: &str,
) -> Result<(RecurrenceRule, String), ApiError> {
    let frequency: RecurrenceFrequency = parse_named(&request.frequency)?;
    let until: OffsetDateTime = parse_timestamp("recurrence.until", &request.until)?;
    let timezone: String = request
        .timezone
        .clone()
        .unwrap_or_else(|| default_timezone.to_string());
    Ok((RecurrenceRule { frequency, until }, timezone))
}

fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

fn window_info(window: &AvailabilityWindow) -> WindowInfo {
    WindowInfo {
        id: window.id,
        user_id: window.user_id,
        start: format_timestamp(window.time_range.start()),
        end: format_timestamp(window.time_range.end()),
        status: window.status.to_string(),
        game_id: window.game_id,
        source_event_id: window.source_event_id,
    }
}

fn conflict_info(conflict: &Conflict) -> ConflictInfo {
    ConflictInfo {
        conflicting_id: conflict.conflicting_id,
        start: format_timestamp(conflict.time_range.start()),
        end: format_timestamp(conflict.time_range.end()),
        status: conflict.status.to_string(),
        game_id: conflict.game_id,
    }
}

fn event_info(event: &ScheduledEvent) -> EventInfo {
    let draft = &event.draft;
    EventInfo {
        id: event.id,
        title: draft.title.clone(),
        start: format_timestamp(draft.time_range.start()),
        end: format_timestamp(draft.time_range.end()),
        config_type: draft
            .slot_config
            .as_ref()
            .map(|c| c.config_type().to_string()),
        counts: draft
            .slot_config
            .as_ref()
            .map(|c| {
                c.counts()
                    .iter()
                    .map(|(role, count)| (role.to_string(), *count))
                    .collect()
            })
            .unwrap_or_default(),
        reminders: draft.reminders,
        game_id: draft.game_id,
        recurrence_group_id: draft.recurrence_group_id,
        source_plan_id: draft.source_plan_id,
        auto_unbench: draft.auto_unbench,
        cancelled: event.cancelled,
    }
}

fn assignment_info(assignment: &RosterAssignment) -> AssignmentInfo {
    AssignmentInfo {
        signup_id: assignment.signup_id,
        user_id: assignment.user_id,
        slot: assignment.slot.map(|s| s.to_string()),
        position: assignment.position,
        is_override: assignment.is_override,
    }
}

fn roster_response(state: &RosterState) -> RosterResponse {
    let roster = state.roster();
    RosterResponse {
        event_id: state.event_id,
        assignments: roster.assignments.iter().map(assignment_info).collect(),
        pool: roster.pool.iter().map(assignment_info).collect(),
    }
}

fn plan_info(state: &PlanState) -> PlanInfo {
    let plan = &state.plan;
    let tally: PollTally = tally_votes(plan.poll_options.len(), &state.votes);
    PlanInfo {
        id: plan.id,
        creator_id: plan.creator_id,
        title: plan.title.clone(),
        status: plan.status.to_string(),
        poll_mode: plan.poll_mode.to_string(),
        options: plan
            .poll_options
            .iter()
            .enumerate()
            .map(|(index, option)| PollOptionInfo {
                index,
                date: format_timestamp(option.date),
                label: option.label.clone(),
                votes: tally.option_counts.get(index).copied().unwrap_or(0),
            })
            .collect(),
        none_votes: tally.none_count,
        voter_count: tally.voter_count,
        poll_ends_at: plan.poll_ends_at.map(format_timestamp),
        duration_minutes: plan.duration_minutes,
        winning_option: plan.winning_option,
        created_event_id: plan.created_event_id,
    }
}

fn written_window(transition: &AvailabilityTransition) -> Result<WindowInfo, ApiError> {
    transition
        .window
        .as_ref()
        .map(window_info)
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Availability write produced no window"),
        })
}

// ============================================================================
// Availability
// ============================================================================

/// Creates an availability window.
///
/// Overlapping windows are reported as conflicts and never block the write.
///
/// # Errors
///
/// Returns an error if:
/// - A member creates a window for another user
/// - The range, status or replaced windows are invalid
pub fn create_availability(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    request: CreateAvailabilityRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<WindowWriteResponse, ApiError> {
    let user_id: i64 = request.user_id.unwrap_or(authenticated_actor.id);
    AuthorizationService::authorize_act_for_user(
        authenticated_actor,
        user_id,
        "create_availability",
    )?;

    let time_range: TimeWindow = parse_range(&request.start, &request.end)?;
    let status: Option<AvailabilityStatus> =
        request.status.as_deref().map(parse_named).transpose()?;

    let window_id: i64 = persistence.next_id().map_err(translate_persistence_error)?;
    let state: AvailabilityState = persistence
        .get_availability_state(user_id)
        .map_err(translate_persistence_error)?;
    let transition: AvailabilityTransition = apply_availability(
        &state,
        AvailabilityCommand::CreateWindow {
            window_id,
            time_range,
            status,
            game_id: request.game_id,
            replace_ids: request.replace_ids,
        },
        authenticated_actor.to_audit_actor(),
        cause,
        clock.now(),
    )
    .map_err(translate_core_error)?;
    let event_id: i64 = persistence
        .persist_availability(&transition)
        .map_err(translate_persistence_error)?;

    info!(
        user_id,
        window_id,
        conflicts = transition.conflicts.len(),
        "Created availability window"
    );

    Ok(WindowWriteResponse {
        window: written_window(&transition)?,
        conflicts: transition.conflicts.iter().map(conflict_info).collect(),
        event_id,
    })
}

/// Edits an availability window.
///
/// # Errors
///
/// Returns an error if:
/// - The window does not exist
/// - A member edits another user's window
/// - The window is committed or the patch is invalid
pub fn update_availability(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    window_id: i64,
    request: &UpdateAvailabilityRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<WindowWriteResponse, ApiError> {
    let user_id: i64 = persistence
        .find_window_owner(window_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::authorize_act_for_user(
        authenticated_actor,
        user_id,
        "update_availability",
    )?;

    let patch: AvailabilityPatch = AvailabilityPatch {
        start: parse_optional_timestamp("start", request.start.as_deref())?,
        end: parse_optional_timestamp("end", request.end.as_deref())?,
        status: request.status.as_deref().map(parse_named).transpose()?,
    };

    let state: AvailabilityState = persistence
        .get_availability_state(user_id)
        .map_err(translate_persistence_error)?;
    let transition: AvailabilityTransition = apply_availability(
        &state,
        AvailabilityCommand::UpdateWindow { window_id, patch },
        authenticated_actor.to_audit_actor(),
        cause,
        clock.now(),
    )
    .map_err(translate_core_error)?;
    let event_id: i64 = persistence
        .persist_availability(&transition)
        .map_err(translate_persistence_error)?;

    info!(user_id, window_id, "Updated availability window");

    Ok(WindowWriteResponse {
        window: written_window(&transition)?,
        conflicts: transition.conflicts.iter().map(conflict_info).collect(),
        event_id,
    })
}

/// Deletes an availability window.
///
/// # Errors
///
/// Returns an error if the window does not exist, belongs to another user,
/// or is committed.
pub fn delete_availability(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    window_id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<DeleteAvailabilityResponse, ApiError> {
    let user_id: i64 = persistence
        .find_window_owner(window_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::authorize_act_for_user(
        authenticated_actor,
        user_id,
        "delete_availability",
    )?;

    let state: AvailabilityState = persistence
        .get_availability_state(user_id)
        .map_err(translate_persistence_error)?;
    let transition: AvailabilityTransition = apply_availability(
        &state,
        AvailabilityCommand::DeleteWindow { window_id },
        authenticated_actor.to_audit_actor(),
        cause,
        clock.now(),
    )
    .map_err(translate_core_error)?;
    let event_id: i64 = persistence
        .persist_availability(&transition)
        .map_err(translate_persistence_error)?;

    info!(user_id, window_id, "Deleted availability window");

    Ok(DeleteAvailabilityResponse {
        window_id,
        event_id,
    })
}

/// Lists a user's windows, optionally filtered to a range.
///
/// # Errors
///
/// Returns an error if only one range bound is given or the range is invalid.
pub fn list_availability(
    persistence: &mut Persistence,
    request: &ListAvailabilityRequest,
) -> Result<ListAvailabilityResponse, ApiError> {
    let range: Option<TimeWindow> = match (&request.start, &request.end) {
        (Some(start), Some(end)) => Some(parse_range(start, end)?),
        (None, None) => None,
        (Some(_), None) => {
            return Err(InputError::MissingField {
                field: String::from("end"),
            }
            .into());
        }
        (None, Some(_)) => {
            return Err(InputError::MissingField {
                field: String::from("start"),
            }
            .into());
        }
    };

    let windows: Vec<AvailabilityWindow> = persistence
        .list_windows(request.user_id, range.as_ref())
        .map_err(translate_persistence_error)?;

    Ok(ListAvailabilityResponse {
        user_id: request.user_id,
        windows: windows.iter().map(window_info).collect(),
    })
}

/// Builds an availability heatmap for a set of users.
///
/// # Errors
///
/// Returns an error if the range, slot length or status ranking is invalid.
pub fn get_heatmap(
    persistence: &mut Persistence,
    request: &HeatmapRequest,
    default_slot_minutes: u32,
) -> Result<HeatmapResponse, ApiError> {
    let range: TimeWindow = parse_range(&request.start, &request.end)?;
    let precedence: SlotPrecedence = match &request.status_priority {
        Some(names) => SlotPrecedence::StatusPriority(
            names
                .iter()
                .map(|name| parse_named::<AvailabilityStatus>(name))
                .collect::<Result<_, _>>()?,
        ),
        None => SlotPrecedence::ListOrder,
    };
    let options: HeatmapOptions = HeatmapOptions {
        slot_duration_minutes: request.slot_minutes.unwrap_or(default_slot_minutes),
        precedence,
    };

    let users: Vec<UserWindows> = persistence
        .heatmap_input(&request.user_ids, &range)
        .map_err(translate_persistence_error)?;
    let grid: HeatmapGrid =
        aggregate_heatmap(&users, &range, &options).map_err(translate_domain_error)?;

    Ok(HeatmapResponse {
        slots: grid
            .slots
            .iter()
            .map(|slot| SlotInfo {
                index: slot.index,
                start: format_timestamp(slot.window.start()),
                end: format_timestamp(slot.window.end()),
                label: slot.label.clone(),
            })
            .collect(),
        rows: grid
            .rows
            .iter()
            .map(|row| HeatmapRowInfo {
                user_id: row.user_id,
                cells: row
                    .cells
                    .iter()
                    .map(|cell: &SlotStatus| cell.as_str().to_string())
                    .collect(),
            })
            .collect(),
        available_counts: grid.coverage().iter().map(|c| c.available).collect(),
    })
}

// ============================================================================
// Events
// ============================================================================

/// Schedules an event, expanding its recurrence into a series.
///
/// # Errors
///
/// Returns an error if the title, range, slot configuration or recurrence is
/// invalid.
pub fn create_event(
    persistence: &mut Persistence,
    request: CreateEventRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
    default_timezone: &str,
) -> Result<CreateEventResponse, ApiError> {
    let time_range: TimeWindow = parse_range(&request.start, &request.end)?;
    let slot_config: Option<RosterSlotConfig> =
        request.slot_config.as_ref().map(parse_slot_config).transpose()?;
    let recurrence: Option<(RecurrenceRule, String)> = request
        .recurrence
        .as_ref()
        .map(|r| parse_recurrence(r, default_timezone))
        .transpose()?;

    let event_id: i64 = persistence.next_id().map_err(translate_persistence_error)?;
    let result: ScheduleResult = schedule_event(
        NewEvent {
            event_id,
            title: request.title,
            time_range,
            slot_config,
            reminders: request.reminders,
            game_id: request.game_id,
            auto_unbench: request.auto_unbench,
            recurrence,
        },
        authenticated_actor.to_audit_actor(),
        cause,
    )
    .map_err(translate_core_error)?;

    let (events, audit_id): (Vec<ScheduledEvent>, i64) = persistence
        .persist_schedule(event_id, &result)
        .map_err(translate_persistence_error)?;

    info!(
        event_id,
        instances = events.len(),
        actor_id = authenticated_actor.id,
        "Created event"
    );

    Ok(CreateEventResponse {
        events: events.iter().map(event_info).collect(),
        event_id: audit_id,
    })
}

/// Loads an event.
///
/// # Errors
///
/// Returns an error if the event does not exist.
pub fn get_event(persistence: &mut Persistence, event_id: i64) -> Result<EventInfo, ApiError> {
    persistence
        .get_event(event_id)
        .map(|e| event_info(&e))
        .map_err(translate_persistence_error)
}

/// Lists the recurring series an event belongs to, in start order.
///
/// A one-off event is its own single-instance series.
///
/// # Errors
///
/// Returns an error if the event does not exist.
pub fn get_series(
    persistence: &mut Persistence,
    event_id: i64,
) -> Result<Vec<EventInfo>, ApiError> {
    let event: ScheduledEvent = persistence
        .get_event(event_id)
        .map_err(translate_persistence_error)?;
    let series: Vec<ScheduledEvent> = match event.draft.recurrence_group_id {
        Some(group) => persistence
            .get_series(group)
            .map_err(translate_persistence_error)?,
        None => vec![event],
    };
    Ok(series.iter().map(event_info).collect())
}

/// Cancels an event and frees every attendee's committed window.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The event does not exist or is already cancelled
pub fn cancel_event(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    event_id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CancelEventResponse, ApiError> {
    AuthorizationService::authorize_cancel_event(authenticated_actor)?;

    let event: ScheduledEvent = persistence
        .get_event(event_id)
        .map_err(translate_persistence_error)?;
    let actor: Actor = authenticated_actor.to_audit_actor();
    let result: CancelResult = cancel_event_transition(&event, actor.clone(), cause.clone())
        .map_err(translate_core_error)?;
    let audit_id: i64 = persistence
        .persist_event_cancel(&result)
        .map_err(translate_persistence_error)?;

    let now: OffsetDateTime = clock.now();
    let freed_user_ids: Vec<i64> = persistence
        .users_committed_to_event(event_id)
        .map_err(translate_persistence_error)?;
    for user_id in &freed_user_ids {
        let state: AvailabilityState = persistence
            .get_availability_state(*user_id)
            .map_err(translate_persistence_error)?;
        let transition: AvailabilityTransition = apply_availability(
            &state,
            AvailabilityCommand::FreeForEvent { event_id },
            actor.clone(),
            cause.clone(),
            now,
        )
        .map_err(translate_core_error)?;
        persistence
            .persist_availability(&transition)
            .map_err(translate_persistence_error)?;
    }

    info!(
        event_id,
        freed_users = freed_user_ids.len(),
        "Cancelled event"
    );

    Ok(CancelEventResponse {
        event: event_info(&result.event),
        freed_user_ids,
        event_id: audit_id,
    })
}

// ============================================================================
// Rosters
// ============================================================================

fn load_roster(persistence: &mut Persistence, event_id: i64) -> Result<RosterState, ApiError> {
    persistence.get_roster_state(event_id).map_err(|e| match e {
        PersistenceError::RosterNotConfigured(_) => ApiError::InvalidInput {
            field: String::from("event_id"),
            message: e.to_string(),
        },
        other => translate_persistence_error(other),
    })
}

/// Signs a user up for an event.
///
/// The signup is placed incrementally: primary role, then preferred roles,
/// then flex, otherwise the pool. The user also receives a committed window
/// covering the event.
///
/// # Errors
///
/// Returns an error if:
/// - A member signs up another user
/// - The event does not exist, is cancelled or has no roster
/// - The user is already signed up
/// - A role name is invalid
#[allow(clippy::too_many_lines)]
pub fn sign_up(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    event_id: i64,
    request: &SignupRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<SignupResponse, ApiError> {
    let user_id: i64 = request.user_id.unwrap_or(authenticated_actor.id);
    AuthorizationService::authorize_act_for_user(authenticated_actor, user_id, "sign_up")?;

    let event: ScheduledEvent = persistence
        .get_event(event_id)
        .map_err(translate_persistence_error)?;
    if event.cancelled {
        return Err(translate_core_error(CoreError::EventCancelled { event_id }));
    }
    let state: RosterState = load_roster(persistence, event_id)?;

    let role: Option<RosterRole> = request.role.as_deref().map(parse_named).transpose()?;
    let preferred_roles: Vec<RosterRole> = request
        .preferred_roles
        .iter()
        .map(|r| parse_named::<RosterRole>(r))
        .collect::<Result<_, _>>()?;

    let now: OffsetDateTime = clock.now();
    let signup_id: i64 = persistence.next_id().map_err(translate_persistence_error)?;
    let actor: Actor = authenticated_actor.to_audit_actor();
    let transition: RosterTransition = apply_roster(
        &state,
        RosterCommand::AddSignup {
            signup: Signup {
                signup_id,
                user_id,
                signed_up_at: now,
                role,
                preferred_roles,
            },
        },
        actor.clone(),
        cause.clone(),
    )
    .map_err(translate_core_error)?;
    let audit_id: i64 = persistence
        .persist_roster(&transition)
        .map_err(translate_persistence_error)?;

    let placed: Option<&RosterAssignment> = transition
        .new_state
        .assignments
        .iter()
        .find(|a| a.signup_id == signup_id);
    let assignment: AssignmentInfo = match placed {
        Some(a) => assignment_info(a),
        None => transition
            .new_state
            .pool()
            .iter()
            .find(|a| a.signup_id == signup_id)
            .map(assignment_info)
            .ok_or_else(|| ApiError::Internal {
                message: format!("Signup {signup_id} missing from roster"),
            })?,
    };

    // Events longer than an availability window get no committed window.
    let (committed_window, conflicts): (Option<WindowInfo>, Vec<ConflictInfo>) =
        if event.draft.time_range.within_max(MAX_WINDOW_HOURS) {
            let window_id: i64 = persistence.next_id().map_err(translate_persistence_error)?;
            let availability: AvailabilityState = persistence
                .get_availability_state(user_id)
                .map_err(translate_persistence_error)?;
            let committed: AvailabilityTransition = apply_availability(
                &availability,
                AvailabilityCommand::CommitForEvent {
                    window_id,
                    event_id,
                    time_range: event.draft.time_range,
                    game_id: event.draft.game_id,
                },
                actor,
                cause,
                now,
            )
            .map_err(translate_core_error)?;
            persistence
                .persist_availability(&committed)
                .map_err(translate_persistence_error)?;
            (
                Some(written_window(&committed)?),
                committed.conflicts.iter().map(conflict_info).collect(),
            )
        } else {
            (None, Vec::new())
        };

    info!(
        event_id,
        signup_id,
        user_id,
        slot = assignment.slot.as_deref().unwrap_or("pool"),
        "Signed up for event"
    );

    Ok(SignupResponse {
        signup_id,
        assignment,
        committed_window,
        conflicts,
        roster: roster_response(&transition.new_state),
        event_id: audit_id,
    })
}

/// Withdraws a signup, promoting a pool member when auto-unbench is set.
///
/// The user's window committed for the event is removed, so signing up
/// again commits exactly one window.
///
/// # Errors
///
/// Returns an error if the signup does not exist or a member withdraws
/// another user's signup.
pub fn withdraw_signup(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    event_id: i64,
    signup_id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<WithdrawResponse, ApiError> {
    let state: RosterState = load_roster(persistence, event_id)?;
    let user_id: i64 = state
        .signup(signup_id)
        .map(|signup: &Signup| signup.user_id)
        .ok_or_else(|| {
            translate_core_error(CoreError::SignupNotFound {
                event_id,
                signup_id,
            })
        })?;
    AuthorizationService::authorize_act_for_user(authenticated_actor, user_id, "withdraw_signup")?;

    let actor: Actor = authenticated_actor.to_audit_actor();
    let transition: RosterTransition = apply_roster(
        &state,
        RosterCommand::WithdrawSignup { signup_id },
        actor.clone(),
        cause.clone(),
    )
    .map_err(translate_core_error)?;
    let audit_id: i64 = persistence
        .persist_roster(&transition)
        .map_err(translate_persistence_error)?;

    let availability: AvailabilityState = persistence
        .get_availability_state(user_id)
        .map_err(translate_persistence_error)?;
    let released: AvailabilityTransition = apply_availability(
        &availability,
        AvailabilityCommand::ReleaseForEvent { event_id },
        actor,
        cause,
        clock.now(),
    )
    .map_err(translate_core_error)?;
    let released_window_ids: Vec<i64> = availability
        .windows
        .iter()
        .map(|w| w.id)
        .filter(|id| released.new_state.window(*id).is_none())
        .collect();
    if !released_window_ids.is_empty() {
        persistence
            .persist_availability(&released)
            .map_err(translate_persistence_error)?;
    }

    let promotion: Option<PromotionInfo> = transition.promotion.as_ref().map(|c| PromotionInfo {
        signup_id: c.signup_id,
        user_id: c.user_id,
        slot: c.slot.to_string(),
        position: c.position,
    });
    if let Some(promoted) = &promotion {
        info!(
            event_id,
            signup_id = promoted.signup_id,
            user_id = promoted.user_id,
            slot = %promoted.slot,
            position = promoted.position,
            "Promoted pool member"
        );
    }
    info!(
        event_id,
        signup_id,
        released = released_window_ids.len(),
        "Withdrew signup"
    );

    Ok(WithdrawResponse {
        promotion,
        roster: roster_response(&transition.new_state),
        released_window_ids,
        event_id: audit_id,
    })
}

/// Returns an event's placements and pool.
///
/// # Errors
///
/// Returns an error if the event does not exist or has no roster.
pub fn get_roster(persistence: &mut Persistence, event_id: i64) -> Result<RosterResponse, ApiError> {
    let state: RosterState = load_roster(persistence, event_id)?;
    Ok(roster_response(&state))
}

/// Re-runs automatic assignment over every signup.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the event has no roster.
pub fn auto_assign(
    persistence: &mut Persistence,
    event_id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<RosterWriteResponse, ApiError> {
    AuthorizationService::authorize_manage_roster(authenticated_actor)?;

    let state: RosterState = load_roster(persistence, event_id)?;
    let transition: RosterTransition = apply_roster(
        &state,
        RosterCommand::AutoAssign,
        authenticated_actor.to_audit_actor(),
        cause,
    )
    .map_err(translate_core_error)?;
    let audit_id: i64 = persistence
        .persist_roster(&transition)
        .map_err(translate_persistence_error)?;

    info!(
        event_id,
        placed = transition.new_state.assignments.len(),
        "Auto-assigned roster"
    );

    Ok(RosterWriteResponse {
        roster: roster_response(&transition.new_state),
        event_id: audit_id,
    })
}

/// Replaces an event's placements with an admin-edited batch.
///
/// The batch is validated as a whole; nothing is written if any entry is
/// rejected.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - A slot name is invalid
/// - The batch has duplicate positions, duplicate or unknown signups, or
///   positions below 1
pub fn update_roster(
    persistence: &mut Persistence,
    event_id: i64,
    request: &UpdateRosterRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<RosterWriteResponse, ApiError> {
    AuthorizationService::authorize_manage_roster(authenticated_actor)?;

    let state: RosterState = load_roster(persistence, event_id)?;
    let assignments: Vec<RosterAssignment> = request
        .assignments
        .iter()
        .map(|entry| -> Result<RosterAssignment, ApiError> {
            Ok(RosterAssignment {
                signup_id: entry.signup_id,
                user_id: state.signup(entry.signup_id).map_or(0, |s| s.user_id),
                slot: entry.slot.as_deref().map(parse_named).transpose()?,
                position: entry.position,
                is_override: entry.is_override,
            })
        })
        .collect::<Result<_, ApiError>>()?;

    let transition: RosterTransition = apply_roster(
        &state,
        RosterCommand::ReplaceAssignments { assignments },
        authenticated_actor.to_audit_actor(),
        cause,
    )
    .map_err(translate_core_error)?;
    let audit_id: i64 = persistence
        .persist_roster(&transition)
        .map_err(translate_persistence_error)?;

    info!(
        event_id,
        placed = transition.new_state.assignments.len(),
        "Replaced roster"
    );

    Ok(RosterWriteResponse {
        roster: roster_response(&transition.new_state),
        event_id: audit_id,
    })
}

// ============================================================================
// Plans
// ============================================================================

fn load_plan(persistence: &mut Persistence, plan_id: i64) -> Result<PlanState, ApiError> {
    persistence
        .get_plan_state(plan_id)
        .map_err(translate_persistence_error)
}

/// Applies a plan command and persists the result.
fn run_plan_command(
    persistence: &mut Persistence,
    state: &PlanState,
    command: PlanCommand,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<PlanResponse, ApiError> {
    let transition: PlanTransition =
        apply_plan(state, command, actor, cause, now).map_err(translate_core_error)?;
    let event_id: i64 = persistence
        .persist_plan(&transition)
        .map_err(translate_persistence_error)?;
    Ok(PlanResponse {
        plan: plan_info(&transition.new_state),
        event_id,
    })
}

/// Creates a draft plan owned by the actor.
///
/// # Errors
///
/// Returns an error if the title, duration, slot configuration or poll mode
/// is invalid.
pub fn create_plan(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    request: CreatePlanRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<PlanResponse, ApiError> {
    let slot_config: Option<RosterSlotConfig> =
        request.slot_config.as_ref().map(parse_slot_config).transpose()?;
    let poll_mode: PollMode = request
        .poll_mode
        .as_deref()
        .map(parse_named)
        .transpose()?
        .unwrap_or_default();

    let plan_id: i64 = persistence.next_id().map_err(translate_persistence_error)?;
    let transition: PlanTransition = create_plan_transition(
        NewPlan {
            plan_id,
            creator_id: authenticated_actor.id,
            title: request.title,
            duration_minutes: request.duration_minutes,
            slot_config,
            reminders: request.reminders,
            game_id: request.game_id,
            poll_mode,
        },
        authenticated_actor.to_audit_actor(),
        cause,
        clock.now(),
    )
    .map_err(translate_core_error)?;
    let event_id: i64 = persistence
        .persist_plan(&transition)
        .map_err(translate_persistence_error)?;

    info!(plan_id, creator_id = authenticated_actor.id, "Created plan");

    Ok(PlanResponse {
        plan: plan_info(&transition.new_state),
        event_id,
    })
}

/// Loads a plan with its current tally.
///
/// # Errors
///
/// Returns an error if the plan does not exist.
pub fn get_plan(persistence: &mut Persistence, plan_id: i64) -> Result<PlanInfo, ApiError> {
    load_plan(persistence, plan_id).map(|state| plan_info(&state))
}

/// Opens a plan's poll.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is neither the creator nor an admin
/// - The plan is not a draft
/// - The options or deadline are invalid
pub fn start_poll(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    plan_id: i64,
    request: StartPollRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<PlanResponse, ApiError> {
    let state: PlanState = load_plan(persistence, plan_id)?;
    AuthorizationService::authorize_manage_plan(
        authenticated_actor,
        state.plan.creator_id,
        "start_poll",
    )?;

    let options: Vec<PollOption> = request
        .options
        .into_iter()
        .map(|o| -> Result<PollOption, InputError> {
            Ok(PollOption {
                date: parse_timestamp("options.date", &o.date)?,
                label: o.label,
            })
        })
        .collect::<Result<_, InputError>>()?;
    let poll_ends_at: Option<OffsetDateTime> =
        parse_optional_timestamp("poll_ends_at", request.poll_ends_at.as_deref())?;

    let response: PlanResponse = run_plan_command(
        persistence,
        &state,
        PlanCommand::StartPoll {
            options,
            poll_ends_at,
        },
        authenticated_actor.to_audit_actor(),
        cause,
        clock.now(),
    )?;

    info!(
        plan_id,
        options = response.plan.options.len(),
        "Opened poll"
    );
    Ok(response)
}

/// Casts or replaces a vote.
///
/// A voter's latest vote replaces any earlier one.
///
/// # Errors
///
/// Returns an error if:
/// - Neither or both of an option and "none of these" are chosen
/// - The poll is not open, its deadline has passed, or the option is unknown
pub fn cast_vote(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    plan_id: i64,
    request: CastVoteRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<PlanResponse, ApiError> {
    let choice: VoteChoice = match (request.option_index, request.none_of_these) {
        (Some(index), false) => VoteChoice::Option(index),
        (None, true) => VoteChoice::NoneOfThese,
        (Some(_), true) => {
            return Err(InputError::ConflictingFields {
                field: String::from("option_index"),
                other: String::from("none_of_these"),
            }
            .into());
        }
        (None, false) => {
            return Err(InputError::MissingField {
                field: String::from("option_index"),
            }
            .into());
        }
    };
    let voter: Voter = request
        .discord_id
        .map_or(Voter::User(authenticated_actor.id), Voter::Discord);

    let state: PlanState = load_plan(persistence, plan_id)?;
    let response: PlanResponse = run_plan_command(
        persistence,
        &state,
        PlanCommand::CastVote { voter, choice },
        authenticated_actor.to_audit_actor(),
        cause,
        clock.now(),
    )?;

    info!(plan_id, actor_id = authenticated_actor.id, "Recorded vote");
    Ok(response)
}

/// Resolves one plan and commits it if it is still polling.
fn resolve_and_commit(
    persistence: &mut Persistence,
    plan_id: i64,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<ResolvePlanResponse, ApiError> {
    let state: PlanState = load_plan(persistence, plan_id)?;
    let expected: PlanStatus = state.plan.status;
    let transition: PlanTransition = apply_plan(&state, PlanCommand::ResolvePoll, actor, cause, now)
        .map_err(translate_core_error)?;
    let created: Option<ScheduledEvent> = persistence
        .commit_plan_resolution(&transition, expected)
        .map_err(translate_persistence_error)?;
    let resolved: PlanState = load_plan(persistence, plan_id)?;

    info!(
        plan_id,
        status = %resolved.plan.status,
        event_id = ?resolved.plan.created_event_id,
        "Resolved poll"
    );

    Ok(ResolvePlanResponse {
        plan: plan_info(&resolved),
        created_event: created.as_ref().map(event_info),
    })
}

/// Resolves a poll whose deadline has passed.
///
/// A completed poll materializes its event; only the first resolution of a
/// plan commits.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is neither the creator nor an admin
/// - The plan is not polling or its deadline has not passed
/// - Another resolution committed first
pub fn resolve_plan(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    plan_id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<ResolvePlanResponse, ApiError> {
    let creator_id: i64 = load_plan(persistence, plan_id)?.plan.creator_id;
    AuthorizationService::authorize_manage_plan(authenticated_actor, creator_id, "resolve_plan")?;

    resolve_and_commit(
        persistence,
        plan_id,
        authenticated_actor.to_audit_actor(),
        cause,
        clock.now(),
    )
}

/// Resolves every polling plan whose deadline has passed.
///
/// Runs as the system actor. Plans that fail to resolve are logged and
/// skipped.
///
/// # Errors
///
/// Returns an error if the due plans cannot be listed.
pub fn resolve_due_plans(
    persistence: &mut Persistence,
    clock: &dyn Clock,
) -> Result<Vec<ResolvePlanResponse>, ApiError> {
    let now: OffsetDateTime = clock.now();
    let mut resolved: Vec<ResolvePlanResponse> = Vec::new();
    let due: Vec<i64> = persistence
        .due_plans(now)
        .map_err(translate_persistence_error)?;

    for plan_id in due {
        let cause: Cause = Cause::new(
            format!("poll-sweep-{plan_id}"),
            String::from("Poll deadline passed"),
        );
        match resolve_and_commit(persistence, plan_id, Actor::system(), cause, now) {
            Ok(response) => resolved.push(response),
            Err(err) => warn!(plan_id, error = %err, "Failed to resolve due plan"),
        }
    }

    Ok(resolved)
}

/// Cancels a plan that has not resolved.
///
/// # Errors
///
/// Returns an error if the actor is neither the creator nor an admin, or the
/// plan is already terminal.
pub fn cancel_plan(
    persistence: &mut Persistence,
    clock: &dyn Clock,
    plan_id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<PlanResponse, ApiError> {
    let state: PlanState = load_plan(persistence, plan_id)?;
    AuthorizationService::authorize_manage_plan(
        authenticated_actor,
        state.plan.creator_id,
        "cancel_plan",
    )?;

    let response: PlanResponse = run_plan_command(
        persistence,
        &state,
        PlanCommand::CancelPlan,
        authenticated_actor.to_audit_actor(),
        cause,
        clock.now(),
    )?;

    info!(plan_id, "Cancelled plan");
    Ok(response)
}

// ============================================================================
// Audit
// ============================================================================

/// Retrieves a single audit event.
///
/// # Errors
///
/// Returns an error if the audit event does not exist.
pub fn get_audit_event(persistence: &mut Persistence, event_id: i64) -> Result<AuditEvent, ApiError> {
    persistence
        .get_audit_event(event_id)
        .map_err(translate_persistence_error)
}

/// Returns the audit timeline of one user, event or plan.
///
/// # Errors
///
/// Returns an error if the scope name is not `user`, `event` or `plan`.
pub fn get_audit_timeline(
    persistence: &mut Persistence,
    scope_type: &str,
    id: i64,
) -> Result<Vec<AuditEvent>, ApiError> {
    let scope: AuditScope = match scope_type {
        "user" => AuditScope::User(id),
        "event" => AuditScope::Event(id),
        "plan" => AuditScope::Plan(id),
        other => {
            return Err(InputError::InvalidValue {
                field: String::from("scope"),
                value: other.to_string(),
            }
            .into());
        }
    };
    persistence
        .get_audit_timeline(scope)
        .map_err(translate_persistence_error)
}
