// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Timestamps cross the boundary as RFC 3339 strings; enumerations as their
//! lowercase names.

use raidplan_domain::ReminderSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Availability
// ============================================================================

/// API request to create an availability window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    /// The owning user; defaults to the actor.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Window start (RFC 3339).
    pub start: String,
    /// Window end (RFC 3339).
    pub end: String,
    /// `available` (default) or `blocked`.
    #[serde(default)]
    pub status: Option<String>,
    /// Game scope.
    #[serde(default)]
    pub game_id: Option<i64>,
    /// Windows to delete in the same write.
    #[serde(default)]
    pub replace_ids: Vec<i64>,
}

/// API request to edit an availability window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    /// New start (RFC 3339).
    #[serde(default)]
    pub start: Option<String>,
    /// New end (RFC 3339).
    #[serde(default)]
    pub end: Option<String>,
    /// New status.
    #[serde(default)]
    pub status: Option<String>,
}

/// API request to list a user's windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAvailabilityRequest {
    /// The user whose windows are listed.
    pub user_id: i64,
    /// Range filter start; requires `end`.
    #[serde(default)]
    pub start: Option<String>,
    /// Range filter end; requires `start`.
    #[serde(default)]
    pub end: Option<String>,
}

/// A window as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    /// Window id.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Start (RFC 3339).
    pub start: String,
    /// End (RFC 3339).
    pub end: String,
    /// Status name.
    pub status: String,
    /// Game scope.
    pub game_id: Option<i64>,
    /// The event that committed this window.
    pub source_event_id: Option<i64>,
}

/// An overlap reported with a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictInfo {
    /// The overlapping window.
    pub conflicting_id: i64,
    /// Its start (RFC 3339).
    pub start: String,
    /// Its end (RFC 3339).
    pub end: String,
    /// Its status name.
    pub status: String,
    /// Its game scope.
    pub game_id: Option<i64>,
}

/// API response for a window create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowWriteResponse {
    /// The written window.
    pub window: WindowInfo,
    /// Overlapping windows; informational only.
    pub conflicts: Vec<ConflictInfo>,
    /// The audit event id.
    pub event_id: i64,
}

/// API response for a window deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAvailabilityResponse {
    /// The deleted window.
    pub window_id: i64,
    /// The audit event id.
    pub event_id: i64,
}

/// API response listing windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAvailabilityResponse {
    /// The user.
    pub user_id: i64,
    /// Windows ordered by start.
    pub windows: Vec<WindowInfo>,
}

// ============================================================================
// Heatmap
// ============================================================================

/// API request for a heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapRequest {
    /// Users to include, in row order.
    pub user_ids: Vec<i64>,
    /// Range start (RFC 3339).
    pub start: String,
    /// Range end (RFC 3339).
    pub end: String,
    /// Slot length; the server default applies when absent.
    #[serde(default)]
    pub slot_minutes: Option<u32>,
    /// Status ranking for overlapping windows; list order when absent.
    #[serde(default)]
    pub status_priority: Option<Vec<String>>,
}

/// One slot on the heatmap axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    /// Slot index.
    pub index: usize,
    /// Start (RFC 3339).
    pub start: String,
    /// End (RFC 3339).
    pub end: String,
    /// `HH:00` on hour boundaries.
    pub label: Option<String>,
}

/// One user's row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapRowInfo {
    /// The user.
    pub user_id: i64,
    /// Status names per slot; `none` when uncovered.
    pub cells: Vec<String>,
}

/// API response for a heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapResponse {
    /// The slot axis.
    pub slots: Vec<SlotInfo>,
    /// One row per requested user.
    pub rows: Vec<HeatmapRowInfo>,
    /// Users available per slot.
    pub available_counts: Vec<usize>,
}

// ============================================================================
// Events and Rosters
// ============================================================================

/// A roster slot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfigRequest {
    /// `mmo` or `generic`.
    pub config_type: String,
    /// Count per role name.
    pub counts: BTreeMap<String, i64>,
}

/// A recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRequest {
    /// `weekly`, `biweekly` or `monthly`.
    pub frequency: String,
    /// Exclusive bound on instance starts (RFC 3339).
    pub until: String,
    /// IANA zone the series repeats in; the server default applies when absent.
    #[serde(default)]
    pub timezone: Option<String>,
}

/// API request to schedule an event or series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventRequest {
    /// Title.
    pub title: String,
    /// Start (RFC 3339).
    pub start: String,
    /// End (RFC 3339).
    pub end: String,
    /// Roster configuration; no roster when absent.
    #[serde(default)]
    pub slot_config: Option<SlotConfigRequest>,
    /// Reminder flags.
    #[serde(default)]
    pub reminders: ReminderSettings,
    /// Game scope.
    #[serde(default)]
    pub game_id: Option<i64>,
    /// Promote pool members into vacated positions.
    #[serde(default)]
    pub auto_unbench: bool,
    /// Repeat the event.
    #[serde(default)]
    pub recurrence: Option<RecurrenceRequest>,
}

/// An event as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    /// Event id.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Start (RFC 3339).
    pub start: String,
    /// End (RFC 3339).
    pub end: String,
    /// Slot configuration type, when the event has a roster.
    pub config_type: Option<String>,
    /// Count per role name.
    pub counts: BTreeMap<String, u32>,
    /// Reminder flags.
    pub reminders: ReminderSettings,
    /// Game scope.
    pub game_id: Option<i64>,
    /// Series membership.
    pub recurrence_group_id: Option<i64>,
    /// The plan this event came from.
    pub source_plan_id: Option<i64>,
    /// Promote pool members automatically.
    pub auto_unbench: bool,
    /// Whether the event is cancelled.
    pub cancelled: bool,
}

/// API response for scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventResponse {
    /// Every created instance, originating event first.
    pub events: Vec<EventInfo>,
    /// The audit event id.
    pub event_id: i64,
}

/// API response for cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelEventResponse {
    /// The cancelled event.
    pub event: EventInfo,
    /// Users whose committed windows were freed.
    pub freed_user_ids: Vec<i64>,
    /// The audit event id.
    pub event_id: i64,
}

/// API request to sign up for an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    /// The user signing up; defaults to the actor.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Confirmed role name.
    #[serde(default)]
    pub role: Option<String>,
    /// Further role names, in preference order.
    #[serde(default)]
    pub preferred_roles: Vec<String>,
}

/// A roster entry as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentInfo {
    /// Signup id.
    pub signup_id: i64,
    /// User id.
    pub user_id: i64,
    /// Role name; `None` for pool entries.
    pub slot: Option<String>,
    /// Slot position, or pool order.
    pub position: u32,
    /// Placed outside normal eligibility.
    pub is_override: bool,
}

/// API response for a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterResponse {
    /// The event.
    pub event_id: i64,
    /// Placed signups ordered by slot then position.
    pub assignments: Vec<AssignmentInfo>,
    /// Unplaced signups in priority order.
    pub pool: Vec<AssignmentInfo>,
}

/// API response for a roster write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterWriteResponse {
    /// The roster after the write.
    pub roster: RosterResponse,
    /// The audit event id.
    pub event_id: i64,
}

/// API response for a signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupResponse {
    /// The new signup.
    pub signup_id: i64,
    /// Where it landed; `slot` is `None` when pooled.
    pub assignment: AssignmentInfo,
    /// The committed window created for the user.
    pub committed_window: Option<WindowInfo>,
    /// Windows overlapping the committed window.
    pub conflicts: Vec<ConflictInfo>,
    /// The roster after the signup.
    pub roster: RosterResponse,
    /// The roster audit event id.
    pub event_id: i64,
}

/// A pool member moved into a vacated position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionInfo {
    /// Promoted signup.
    pub signup_id: i64,
    /// Promoted user, for notification.
    pub user_id: i64,
    /// Role name.
    pub slot: String,
    /// Position.
    pub position: u32,
}

/// API response for a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawResponse {
    /// The promotion performed, if any.
    pub promotion: Option<PromotionInfo>,
    /// The roster after withdrawal.
    pub roster: RosterResponse,
    /// Committed windows removed from the user's availability.
    pub released_window_ids: Vec<i64>,
    /// The audit event id.
    pub event_id: i64,
}

/// One entry of a roster replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    /// Signup id.
    pub signup_id: i64,
    /// Role name; `None` sends the signup to the pool.
    #[serde(default)]
    pub slot: Option<String>,
    /// Position, 1-based.
    pub position: u32,
    /// Force the placement regardless of eligibility.
    #[serde(default)]
    pub is_override: bool,
}

/// API request replacing a roster's placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRosterRequest {
    /// The full batch.
    pub assignments: Vec<AssignmentRequest>,
}

// ============================================================================
// Plans
// ============================================================================

/// API request to create a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlanRequest {
    /// Title.
    pub title: String,
    /// Length of the resulting event.
    pub duration_minutes: u32,
    /// Roster configuration of the resulting event.
    #[serde(default)]
    pub slot_config: Option<SlotConfigRequest>,
    /// Reminder flags of the resulting event.
    #[serde(default)]
    pub reminders: ReminderSettings,
    /// Game scope.
    #[serde(default)]
    pub game_id: Option<i64>,
    /// `standard` (default) or `all_or_nothing`.
    #[serde(default)]
    pub poll_mode: Option<String>,
}

/// A dated poll option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOptionRequest {
    /// Candidate start (RFC 3339).
    pub date: String,
    /// Display label.
    pub label: String,
}

/// API request to open a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPollRequest {
    /// Dated options.
    pub options: Vec<PollOptionRequest>,
    /// Deadline (RFC 3339); must lie in the future.
    #[serde(default)]
    pub poll_ends_at: Option<String>,
}

/// API request to vote.
///
/// Exactly one of `option_index` and `none_of_these` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVoteRequest {
    /// Vote through a chat identity instead of as the actor.
    #[serde(default)]
    pub discord_id: Option<String>,
    /// Chosen option.
    #[serde(default)]
    pub option_index: Option<usize>,
    /// Vote "none of these".
    #[serde(default)]
    pub none_of_these: bool,
}

/// A poll option as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOptionInfo {
    /// Option index.
    pub index: usize,
    /// Candidate start (RFC 3339).
    pub date: String,
    /// Display label.
    pub label: String,
    /// Current vote count.
    pub votes: u32,
}

/// A plan as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInfo {
    /// Plan id.
    pub id: i64,
    /// Creating user.
    pub creator_id: i64,
    /// Title.
    pub title: String,
    /// Status name.
    pub status: String,
    /// Poll mode name.
    pub poll_mode: String,
    /// Options with current counts.
    pub options: Vec<PollOptionInfo>,
    /// "None of these" votes.
    pub none_votes: u32,
    /// Distinct voters.
    pub voter_count: usize,
    /// Deadline (RFC 3339).
    pub poll_ends_at: Option<String>,
    /// Resulting event length.
    pub duration_minutes: u32,
    /// Winning option index.
    pub winning_option: Option<usize>,
    /// The event created on completion.
    pub created_event_id: Option<i64>,
}

/// API response for a plan write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResponse {
    /// The plan after the write.
    pub plan: PlanInfo,
    /// The audit event id.
    pub event_id: i64,
}

/// API response for poll resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvePlanResponse {
    /// The resolved plan.
    pub plan: PlanInfo,
    /// The created event, when the poll completed.
    pub created_event: Option<EventInfo>,
}
