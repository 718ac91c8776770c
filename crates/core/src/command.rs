// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use raidplan_domain::{
    AvailabilityPatch, AvailabilityStatus, PollMode, PollOption, RecurrenceRule,
    ReminderSettings, RosterAssignment, RosterSlotConfig, Signup, TimeWindow, VoteChoice, Voter,
};
use time::OffsetDateTime;

/// A change to one user's availability windows.
///
/// Ids for new windows are issued by persistence before the command is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityCommand {
    /// Create a user-authored window.
    CreateWindow {
        /// Id for the new window.
        window_id: i64,
        /// The requested range.
        time_range: TimeWindow,
        /// Requested status; defaults to `available`.
        status: Option<AvailabilityStatus>,
        /// Optional game scope.
        game_id: Option<i64>,
        /// Existing windows to delete in the same write.
        replace_ids: Vec<i64>,
    },
    /// Edit a window.
    UpdateWindow {
        /// The window to edit.
        window_id: i64,
        /// The fields to change.
        patch: AvailabilityPatch,
    },
    /// Delete a window.
    DeleteWindow {
        /// The window to delete.
        window_id: i64,
    },
    /// Record the committed window produced by an event signup.
    CommitForEvent {
        /// Id for the new window.
        window_id: i64,
        /// The event signed up for.
        event_id: i64,
        /// The event's range.
        time_range: TimeWindow,
        /// The event's game scope.
        game_id: Option<i64>,
    },
    /// Free every window committed to a cancelled event.
    FreeForEvent {
        /// The cancelled event.
        event_id: i64,
    },
    /// Drop the window committed for an event the user withdrew from.
    ReleaseForEvent {
        /// The event the user left.
        event_id: i64,
    },
}

/// A change to one event's roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterCommand {
    /// Register a signup and place it if a slot is open.
    AddSignup {
        /// The new signup, with its issued id.
        signup: Signup,
    },
    /// Remove a signup, promoting from the pool when auto-unbench is on.
    WithdrawSignup {
        /// The signup to remove.
        signup_id: i64,
    },
    /// Recompute every placement from scratch.
    AutoAssign,
    /// Replace every placement with an administrator's batch.
    ReplaceAssignments {
        /// The full submitted roster. Entries with no slot stay in the pool.
        assignments: Vec<RosterAssignment>,
    },
}

/// A change to one event plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanCommand {
    /// Open the date poll.
    StartPoll {
        /// Dated options.
        options: Vec<PollOption>,
        /// Poll deadline.
        poll_ends_at: Option<OffsetDateTime>,
    },
    /// Record a vote.
    CastVote {
        /// The voter.
        voter: Voter,
        /// The selection.
        choice: VoteChoice,
    },
    /// Resolve the poll after its deadline.
    ResolvePoll,
    /// Cancel the plan.
    CancelPlan,
}

/// The fields of a new event plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlan {
    /// Id issued for the plan.
    pub plan_id: i64,
    /// The creating user.
    pub creator_id: i64,
    /// Title carried onto the event.
    pub title: String,
    /// Length of the resulting event.
    pub duration_minutes: u32,
    /// Roster configuration of the resulting event.
    pub slot_config: Option<RosterSlotConfig>,
    /// Reminder flags of the resulting event.
    pub reminders: ReminderSettings,
    /// Game scope.
    pub game_id: Option<i64>,
    /// Vote treatment.
    pub poll_mode: PollMode,
}

/// The fields of a new event, optionally recurring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Id issued for the originating event.
    pub event_id: i64,
    /// Event title.
    pub title: String,
    /// The originating event's range.
    pub time_range: TimeWindow,
    /// Roster configuration.
    pub slot_config: Option<RosterSlotConfig>,
    /// Reminder flags.
    pub reminders: ReminderSettings,
    /// Game scope.
    pub game_id: Option<i64>,
    /// Promote pool members automatically on withdrawal.
    pub auto_unbench: bool,
    /// Recurrence rule and IANA timezone.
    pub recurrence: Option<(RecurrenceRule, String)>,
}
