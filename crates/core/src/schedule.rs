// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Event scheduling and plan transitions.

use crate::apply::audit;
use crate::command::{NewEvent, NewPlan, PlanCommand};
use crate::error::CoreError;
use crate::state::{CancelResult, PlanState, PlanTransition, ScheduleResult};
use raidplan_audit::{Actor, AuditEvent, AuditScope, Cause, StateSnapshot};
use raidplan_domain::{
    EventDraft, EventPlan, PlanStatus, PollResolution, PollVote, ScheduledEvent, TimeWindow,
    expand_recurrence, materialize_from_plan, resolve_poll, validate_duration,
    validate_poll_deadline, validate_poll_options, validate_title, validate_vote,
};
use time::OffsetDateTime;

/// Builds the drafts for a new event, expanding its recurrence.
///
/// A recurring series uses the originating event's id as its recurrence
/// group id.
///
/// # Errors
///
/// Returns an error if the title is blank or the recurrence is invalid.
pub fn schedule_event(
    request: NewEvent,
    actor: Actor,
    cause: Cause,
) -> Result<ScheduleResult, CoreError> {
    validate_title(&request.title)?;

    let (ranges, recurrence_group_id): (Vec<TimeWindow>, Option<i64>) = match &request.recurrence
    {
        Some((rule, timezone)) => {
            let series = expand_recurrence(
                request.time_range.start(),
                request.time_range.end(),
                rule,
                timezone,
                request.event_id,
            )?;
            (
                series.instances.into_iter().map(|i| i.time_range).collect(),
                Some(series.recurrence_group_id),
            )
        }
        None => (vec![request.time_range], None),
    };

    let drafts: Vec<EventDraft> = ranges
        .into_iter()
        .map(|time_range| EventDraft {
            title: request.title.clone(),
            time_range,
            slot_config: request.slot_config.clone(),
            reminders: request.reminders,
            game_id: request.game_id,
            recurrence_group_id,
            source_plan_id: None,
            auto_unbench: request.auto_unbench,
        })
        .collect();

    let details: String = format!(
        "Scheduled '{}' with {} instance(s)",
        request.title,
        drafts.len()
    );
    let audit_event: AuditEvent = audit(
        AuditScope::Event(request.event_id),
        actor,
        cause,
        "ScheduleEvent",
        details,
        StateSnapshot::new(format!("event_id={},exists=false", request.event_id)),
        StateSnapshot::new(format!(
            "event_id={},instances={}",
            request.event_id,
            drafts.len()
        )),
    );

    Ok(ScheduleResult {
        drafts,
        audit_event,
    })
}

/// Cancels an event.
///
/// Freeing the attendees' committed windows is a separate availability
/// transition per user.
///
/// # Errors
///
/// Returns `CoreError::EventCancelled` if the event is already cancelled.
pub fn cancel_event(
    event: &ScheduledEvent,
    actor: Actor,
    cause: Cause,
) -> Result<CancelResult, CoreError> {
    if event.cancelled {
        return Err(CoreError::EventCancelled { event_id: event.id });
    }

    let mut cancelled: ScheduledEvent = event.clone();
    cancelled.cancelled = true;

    let audit_event: AuditEvent = audit(
        AuditScope::Event(event.id),
        actor,
        cause,
        "CancelEvent",
        format!("Cancelled event '{}'", event.draft.title),
        StateSnapshot::new(format!("event_id={},cancelled=false", event.id)),
        StateSnapshot::new(format!("event_id={},cancelled=true", event.id)),
    );

    Ok(CancelResult {
        event: cancelled,
        audit_event,
    })
}

/// Creates a draft plan.
///
/// # Errors
///
/// Returns an error if the title is blank or the duration is zero.
pub fn create_plan(
    request: NewPlan,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<PlanTransition, CoreError> {
    validate_title(&request.title)?;
    validate_duration(request.duration_minutes)?;

    let new_state: PlanState = PlanState {
        plan: EventPlan {
            id: request.plan_id,
            creator_id: request.creator_id,
            title: request.title,
            status: PlanStatus::Draft,
            poll_options: Vec::new(),
            poll_mode: request.poll_mode,
            poll_ends_at: None,
            duration_minutes: request.duration_minutes,
            slot_config: request.slot_config,
            reminders: request.reminders,
            game_id: request.game_id,
            winning_option: None,
            created_event_id: None,
            created_at: now,
            updated_at: now,
        },
        votes: Vec::new(),
    };

    let audit_event: AuditEvent = audit(
        AuditScope::Plan(request.plan_id),
        actor,
        cause,
        "CreatePlan",
        format!(
            "Created plan '{}' in {} mode",
            new_state.plan.title, new_state.plan.poll_mode
        ),
        StateSnapshot::new(format!("plan_id={},exists=false", request.plan_id)),
        new_state.to_snapshot(),
    );

    Ok(PlanTransition {
        new_state,
        audit_event,
        event_draft: None,
    })
}

/// Applies a command to an event plan.
///
/// # Arguments
///
/// * `state` - The current plan and votes (immutable)
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `now` - The current instant
///
/// # Errors
///
/// Returns an error if:
/// - The plan status does not allow the command
/// - Poll options, deadline or vote are invalid
/// - The poll is resolved before its deadline
#[allow(clippy::too_many_lines)]
pub fn apply_plan(
    state: &PlanState,
    command: PlanCommand,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<PlanTransition, CoreError> {
    let before: StateSnapshot = state.to_snapshot();
    let scope: AuditScope = AuditScope::Plan(state.plan.id);
    let mut new_state: PlanState = state.clone();

    let (name, details, event_draft): (&str, String, Option<EventDraft>) = match command {
        PlanCommand::StartPoll {
            options,
            poll_ends_at,
        } => {
            new_state.plan.status = state.plan.status.transition_to(PlanStatus::Polling)?;
            validate_poll_options(&options)?;
            let deadline: OffsetDateTime = validate_poll_deadline(poll_ends_at, now)?;

            let details: String =
                format!("Poll opened with {} options until {deadline}", options.len());
            new_state.plan.poll_options = options;
            new_state.plan.poll_ends_at = Some(deadline);
            ("StartPoll", details, None)
        }
        PlanCommand::CastVote { voter, choice } => {
            validate_vote(&state.plan, choice, now)?;

            let details: String = format!("{voter:?} voted {choice:?}");
            new_state.votes.push(PollVote {
                voter,
                choice,
                cast_at: now,
            });
            ("CastVote", details, None)
        }
        PlanCommand::ResolvePoll => {
            let resolution: PollResolution = resolve_poll(&state.plan, &state.votes, now)?;
            new_state.plan.status = state
                .plan
                .status
                .transition_to(resolution.target_status())?;

            match resolution {
                PollResolution::Winner {
                    option_index,
                    tally,
                } => {
                    new_state.plan.winning_option = Some(option_index);
                    let draft: EventDraft = materialize_from_plan(&new_state.plan, option_index)?;
                    (
                        "ResolvePoll",
                        format!(
                            "Option {option_index} won with {:?} (none: {})",
                            tally.option_counts, tally.none_count
                        ),
                        Some(draft),
                    )
                }
                PollResolution::Expired { tally } => (
                    "ResolvePoll",
                    format!(
                        "Poll expired with {:?} (none: {})",
                        tally.option_counts, tally.none_count
                    ),
                    None,
                ),
            }
        }
        PlanCommand::CancelPlan => {
            new_state.plan.status = state.plan.status.transition_to(PlanStatus::Cancelled)?;
            ("CancelPlan", String::from("Plan cancelled"), None)
        }
    };

    if new_state.plan != state.plan {
        new_state.plan.updated_at = now;
    }

    let audit_event: AuditEvent = audit(
        scope,
        actor,
        cause,
        name,
        details,
        before,
        new_state.to_snapshot(),
    );

    Ok(PlanTransition {
        new_state,
        audit_event,
        event_draft,
    })
}
