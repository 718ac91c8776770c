// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use raidplan_audit::{AuditEvent, StateSnapshot};
use raidplan_domain::{
    AvailabilityStatus, AvailabilityWindow, Conflict, EventDraft, EventPlan, PollVote,
    PromotionCandidate, RosterAssignment, RosterResult, RosterSlotConfig, ScheduledEvent, Signup,
    build_pool,
};

/// All availability windows owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityState {
    /// The owning user.
    pub user_id: i64,
    /// The user's windows.
    pub windows: Vec<AvailabilityWindow>,
}

impl AvailabilityState {
    /// Creates an empty state for a user.
    #[must_use]
    pub const fn new(user_id: i64) -> Self {
        Self {
            user_id,
            windows: Vec::new(),
        }
    }

    /// Returns the window with `window_id`, if the user owns it.
    #[must_use]
    pub fn window(&self, window_id: i64) -> Option<&AvailabilityWindow> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    /// Converts the state to a snapshot for audit purposes.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        let committed: usize = self
            .windows
            .iter()
            .filter(|w| w.status == AvailabilityStatus::Committed)
            .count();
        StateSnapshot::new(format!(
            "user_id={},windows={},committed={committed}",
            self.user_id,
            self.windows.len()
        ))
    }
}

/// An event's signups and placements.
///
/// `assignments` holds placed entries only. The pool is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterState {
    /// The event.
    pub event_id: i64,
    /// The event's slot configuration.
    pub slot_config: RosterSlotConfig,
    /// Promote pool members into vacated positions.
    pub auto_unbench: bool,
    /// Every signup for the event.
    pub signups: Vec<Signup>,
    /// Placed signups.
    pub assignments: Vec<RosterAssignment>,
}

impl RosterState {
    /// Creates an empty roster.
    #[must_use]
    pub const fn new(event_id: i64, slot_config: RosterSlotConfig, auto_unbench: bool) -> Self {
        Self {
            event_id,
            slot_config,
            auto_unbench,
            signups: Vec::new(),
            assignments: Vec::new(),
        }
    }

    /// Returns the unplaced signups in priority order.
    #[must_use]
    pub fn pool(&self) -> Vec<RosterAssignment> {
        build_pool(&self.signups, &self.assignments)
    }

    /// Returns placements and pool together.
    #[must_use]
    pub fn roster(&self) -> RosterResult {
        RosterResult {
            assignments: self.assignments.clone(),
            pool: self.pool(),
        }
    }

    /// Returns the signup with `signup_id`.
    #[must_use]
    pub fn signup(&self, signup_id: i64) -> Option<&Signup> {
        self.signups.iter().find(|s| s.signup_id == signup_id)
    }

    /// Converts the state to a snapshot for audit purposes.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        StateSnapshot::new(format!(
            "event_id={},signups={},placed={},pool={}",
            self.event_id,
            self.signups.len(),
            self.assignments.len(),
            self.signups.len().saturating_sub(self.assignments.len())
        ))
    }
}

/// An event plan together with its votes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanState {
    /// The plan.
    pub plan: EventPlan,
    /// Every vote cast, in arrival order.
    pub votes: Vec<PollVote>,
}

impl PlanState {
    /// Converts the state to a snapshot for audit purposes.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        StateSnapshot::new(format!(
            "plan_id={},status={},options={},votes={}",
            self.plan.id,
            self.plan.status,
            self.plan.poll_options.len(),
            self.votes.len()
        ))
    }
}

/// The result of an availability transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityTransition {
    /// The user's windows after the transition.
    pub new_state: AvailabilityState,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
    /// The window created or edited, if any.
    pub window: Option<AvailabilityWindow>,
    /// Overlaps detected for `window`.
    pub conflicts: Vec<Conflict>,
}

/// The result of a roster transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterTransition {
    /// The roster after the transition.
    pub new_state: RosterState,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
    /// A pool member moved into a vacated position.
    pub promotion: Option<PromotionCandidate>,
}

/// The result of a plan transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanTransition {
    /// The plan after the transition.
    pub new_state: PlanState,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
    /// The event to materialize when a poll completes.
    pub event_draft: Option<EventDraft>,
}

/// The result of scheduling an event or series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleResult {
    /// One draft per instance; the first is the originating event.
    pub drafts: Vec<EventDraft>,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}

/// The result of cancelling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelResult {
    /// The event after cancellation.
    pub event: ScheduledEvent,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}
