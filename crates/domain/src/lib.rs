// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod availability;
mod conflict;
mod error;
mod event;
mod heatmap;
mod interval;
mod poll;
mod recurrence;
mod roster;

#[cfg(test)]
mod tests;

pub use availability::{
    AvailabilityPatch, AvailabilityStatus, AvailabilityWindow, NewAvailabilityWindow, WindowWrite,
    commit_window, create_window, free_windows_for_event, list_by_user, release_windows_for_event,
    update_window,
};
pub use conflict::{Conflict, detect_conflicts};
pub use error::{DomainError, ErrorKind};
pub use event::{
    EventDraft, ScheduledEvent, materialize_from_plan, validate_duration, validate_title,
};
pub use heatmap::{
    DEFAULT_SLOT_MINUTES, HeatmapGrid, MAX_HEATMAP_SLOTS, HeatmapOptions, HeatmapRow, HeatmapSlot, SlotCoverage,
    SlotPrecedence, SlotStatus, UserWindows, aggregate_heatmap, slice_range,
};
pub use interval::{MAX_WINDOW_HOURS, TimeWindow, validate_availability_range};
pub use poll::{
    EventPlan, MAX_POLL_OPTIONS, MIN_POLL_OPTIONS, PlanStatus, PollMode, PollOption,
    PollResolution, PollTally, PollVote, ReminderSettings, VoteChoice, Voter, pick_winner,
    resolve_poll, tally_votes, validate_poll_deadline, validate_poll_options, validate_vote,
};
pub use recurrence::{
    MAX_RECURRENCE_INSTANCES, RecurrenceFrequency, RecurrenceInstance, RecurrenceRule,
    RecurrenceSeries, expand_recurrence, parse_timezone,
};
pub use roster::{
    PromotionCandidate, RosterAssignment, RosterResult, RosterRole, RosterSlotConfig,
    SlotConfigType, Signup, arrival_order, assign_roster, build_pool, is_eligible, place_signup,
    promotion_candidate, validate_assignment_batch,
};
