// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::availability::AvailabilityStatus;
use crate::poll::PlanStatus;
use crate::roster::{RosterRole, SlotConfigType};
use time::OffsetDateTime;

/// Broad classification of a domain error.
///
/// Callers use this to tell "bad input" apart from "bad timing" and from
/// rejected roster batches without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input was malformed. Never retried.
    Validation,
    /// The requested transition is not valid in the current state.
    StateTransitionRejected,
    /// A submitted roster batch violated uniqueness and was not applied.
    RosterBatchRejected,
    /// A referenced record does not exist in the supplied data.
    NotFound,
}

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A time window ends at or before its start.
    InvalidTimeWindow {
        /// The window start.
        start: OffsetDateTime,
        /// The window end.
        end: OffsetDateTime,
    },
    /// An availability window is longer than the permitted maximum.
    WindowTooLong {
        /// The actual duration in minutes.
        duration_minutes: i64,
        /// The permitted maximum in hours.
        max_hours: u32,
    },
    /// The status cannot be set by a user edit.
    StatusNotUserEditable {
        /// The requested status.
        status: AvailabilityStatus,
    },
    /// A committed window can only change through the event workflow.
    CommittedWindowImmutable {
        /// The window that was targeted.
        window_id: i64,
    },
    /// The availability window does not exist.
    WindowNotFound {
        /// The requested window.
        window_id: i64,
    },
    /// The availability status string is not recognized.
    InvalidAvailabilityStatus(String),
    /// Heatmap slot duration is zero or longer than a day.
    InvalidSlotDuration {
        /// The requested slot duration in minutes.
        minutes: u32,
    },
    /// The heatmap range would slice into more slots than allowed.
    HeatmapTooLarge {
        /// The requested slot duration in minutes.
        slot_minutes: u32,
        /// The permitted number of slots.
        max_slots: usize,
    },
    /// A roster slot count is negative.
    NegativeSlotCount {
        /// The role carrying the negative count.
        role: RosterRole,
        /// The submitted count.
        count: i64,
    },
    /// The role does not belong to the slot configuration type.
    RoleNotInConfig {
        /// The offending role.
        role: RosterRole,
        /// The configuration type.
        config_type: SlotConfigType,
    },
    /// The roster role string is not recognized.
    InvalidRosterRole(String),
    /// The slot configuration type string is not recognized.
    InvalidSlotConfigType(String),
    /// Two assignments in a batch claim the same slot position.
    DuplicateRosterPosition {
        /// The contested slot.
        slot: RosterRole,
        /// The contested position.
        position: u32,
        /// The signups claiming the position.
        signup_ids: Vec<i64>,
    },
    /// A signup appears more than once in a batch.
    DuplicateRosterSignup {
        /// The repeated signup.
        signup_id: i64,
    },
    /// An assignment position is below 1.
    InvalidRosterPosition {
        /// The signup carrying the position.
        signup_id: i64,
        /// The submitted position.
        position: u32,
    },
    /// A batch references a signup that is not registered for the event.
    UnknownSignup {
        /// The unknown signup.
        signup_id: i64,
    },
    /// The recurrence end is not after the series start.
    InvalidRecurrenceUntil {
        /// The first occurrence start.
        start: OffsetDateTime,
        /// The requested end bound.
        until: OffsetDateTime,
    },
    /// The recurrence would produce more instances than allowed.
    RecurrenceTooLong {
        /// The maximum number of instances.
        max_instances: usize,
    },
    /// The recurrence frequency string is not recognized.
    InvalidRecurrenceFrequency(String),
    /// The timezone name is not a known IANA zone.
    InvalidTimezone(String),
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
    /// A poll must have between `min` and `max` dated options.
    InvalidPollOptionCount {
        /// The number of options submitted.
        count: usize,
        /// Minimum option count.
        min: usize,
        /// Maximum option count.
        max: usize,
    },
    /// A vote names an option index that does not exist.
    InvalidPollOption {
        /// The submitted index.
        index: usize,
        /// The number of dated options.
        option_count: usize,
    },
    /// The poll mode string is not recognized.
    InvalidPollMode(String),
    /// The plan status string is not recognized.
    InvalidPlanStatus(String),
    /// The plan cannot move from its current status to the target.
    InvalidPlanTransition {
        /// Current status.
        from: PlanStatus,
        /// Requested status.
        to: PlanStatus,
    },
    /// Votes are only accepted while a plan is polling.
    PollNotOpen {
        /// Current status.
        status: PlanStatus,
    },
    /// The poll deadline has not passed yet.
    PollDeadlineNotReached {
        /// The deadline.
        poll_ends_at: OffsetDateTime,
    },
    /// The poll deadline has already passed.
    PollDeadlinePassed {
        /// The deadline.
        poll_ends_at: OffsetDateTime,
    },
    /// A poll cannot start without a deadline in the future.
    InvalidPollDeadline {
        /// The submitted deadline, if any.
        poll_ends_at: Option<OffsetDateTime>,
    },
    /// Event duration must be positive.
    InvalidEventDuration {
        /// The submitted duration in minutes.
        minutes: u32,
    },
    /// Titles must not be empty.
    EmptyTitle,
}

impl DomainError {
    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPlanTransition { .. }
            | Self::PollNotOpen { .. }
            | Self::PollDeadlineNotReached { .. }
            | Self::PollDeadlinePassed { .. } => ErrorKind::StateTransitionRejected,
            Self::DuplicateRosterPosition { .. }
            | Self::DuplicateRosterSignup { .. }
            | Self::InvalidRosterPosition { .. }
            | Self::UnknownSignup { .. } => ErrorKind::RosterBatchRejected,
            Self::WindowNotFound { .. } => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }
}

impl std::fmt::Display for DomainError {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeWindow { start, end } => {
                write!(f, "Time window end {end} must be after start {start}")
            }
            Self::WindowTooLong {
                duration_minutes,
                max_hours,
            } => {
                write!(
                    f,
                    "Availability window of {duration_minutes} minutes exceeds the {max_hours} hour maximum"
                )
            }
            Self::StatusNotUserEditable { status } => {
                write!(f, "Status '{status}' cannot be set directly")
            }
            Self::CommittedWindowImmutable { window_id } => {
                write!(
                    f,
                    "Window {window_id} is committed to an event and cannot be edited"
                )
            }
            Self::WindowNotFound { window_id } => {
                write!(f, "Availability window {window_id} not found")
            }
            Self::InvalidAvailabilityStatus(s) => write!(f, "Invalid availability status: {s}"),
            Self::InvalidSlotDuration { minutes } => {
                write!(
                    f,
                    "Invalid slot duration: {minutes} minutes. Must be between 1 and 1440"
                )
            }
            Self::HeatmapTooLarge {
                slot_minutes,
                max_slots,
            } => {
                write!(
                    f,
                    "Heatmap range needs more than {max_slots} slots of {slot_minutes} minutes; narrow the range or widen the slots"
                )
            }
            Self::NegativeSlotCount { role, count } => {
                write!(f, "Slot count for role '{role}' must not be negative, got {count}")
            }
            Self::RoleNotInConfig { role, config_type } => {
                write!(
                    f,
                    "Role '{role}' is not valid for a '{config_type}' slot configuration"
                )
            }
            Self::InvalidRosterRole(s) => write!(f, "Invalid roster role: {s}"),
            Self::InvalidSlotConfigType(s) => write!(f, "Invalid slot configuration type: {s}"),
            Self::DuplicateRosterPosition {
                slot,
                position,
                signup_ids,
            } => {
                write!(
                    f,
                    "Slot '{slot}' position {position} is claimed by multiple signups: {signup_ids:?}"
                )
            }
            Self::DuplicateRosterSignup { signup_id } => {
                write!(f, "Signup {signup_id} appears more than once in the roster")
            }
            Self::InvalidRosterPosition {
                signup_id,
                position,
            } => {
                write!(
                    f,
                    "Signup {signup_id} has invalid position {position}. Positions start at 1"
                )
            }
            Self::UnknownSignup { signup_id } => {
                write!(f, "Signup {signup_id} is not registered for this event")
            }
            Self::InvalidRecurrenceUntil { start, until } => {
                write!(
                    f,
                    "Recurrence end {until} must be after the first occurrence {start}"
                )
            }
            Self::RecurrenceTooLong { max_instances } => {
                write!(
                    f,
                    "Recurrence would produce more than {max_instances} instances"
                )
            }
            Self::InvalidRecurrenceFrequency(s) => {
                write!(f, "Invalid recurrence frequency: {s}")
            }
            Self::InvalidTimezone(tz) => write!(f, "Invalid timezone: {tz}"),
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
            Self::InvalidPollOptionCount { count, min, max } => {
                write!(
                    f,
                    "Invalid poll option count: {count}. Must be between {min} and {max}"
                )
            }
            Self::InvalidPollOption {
                index,
                option_count,
            } => {
                write!(
                    f,
                    "Invalid poll option index {index}: poll has {option_count} options"
                )
            }
            Self::InvalidPollMode(s) => write!(f, "Invalid poll mode: {s}"),
            Self::InvalidPlanStatus(s) => write!(f, "Invalid plan status: {s}"),
            Self::InvalidPlanTransition { from, to } => {
                write!(f, "Cannot transition plan from '{from}' to '{to}'")
            }
            Self::PollNotOpen { status } => {
                write!(f, "Poll is not open for voting (plan is '{status}')")
            }
            Self::PollDeadlineNotReached { poll_ends_at } => {
                write!(f, "Poll cannot be resolved before {poll_ends_at}")
            }
            Self::PollDeadlinePassed { poll_ends_at } => {
                write!(f, "Poll closed at {poll_ends_at}")
            }
            Self::InvalidPollDeadline { poll_ends_at } => match poll_ends_at {
                Some(at) => write!(f, "Poll deadline {at} must be in the future"),
                None => write!(f, "Poll deadline is required"),
            },
            Self::InvalidEventDuration { minutes } => {
                write!(
                    f,
                    "Invalid event duration: {minutes} minutes. Must be greater than 0"
                )
            }
            Self::EmptyTitle => write!(f, "Title cannot be empty"),
        }
    }
}

impl std::error::Error for DomainError {}
