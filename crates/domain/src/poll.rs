// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Event plans, date polls and their resolution.
//!
//! ## Lifecycle
//!
//! ```text
//! draft ──► polling ──► completed
//!   │          ├──────► expired
//!   │          └──────► cancelled
//!   └──────────────────► cancelled
//! ```
//!
//! `completed`, `expired` and `cancelled` are terminal.
//!
//! ## Resolution
//!
//! Each voter's last vote (by cast time) counts. The winner is the dated
//! option with the most votes; ties go to the earliest date, then the lowest
//! index. A poll expires instead when:
//! - Every dated option has zero votes
//! - In `all_or_nothing` mode, "none of these" has at least as many votes as
//!   every dated option

use crate::error::DomainError;
use crate::roster::RosterSlotConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use time::OffsetDateTime;

/// Minimum number of dated options in a poll.
pub const MIN_POLL_OPTIONS: usize = 2;

/// Maximum number of dated options in a poll.
pub const MAX_POLL_OPTIONS: usize = 9;

/// Lifecycle status of an event plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Being prepared; no poll yet.
    Draft,
    /// Poll is open.
    Polling,
    /// Resolved into an event.
    Completed,
    /// Resolved without a usable option.
    Expired,
    /// Abandoned by its creator.
    Cancelled,
}

impl PlanStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Polling => "polling",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired | Self::Cancelled)
    }

    /// Returns whether a transition to `target` is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Polling | Self::Cancelled)
                | (Self::Polling, Self::Completed | Self::Expired | Self::Cancelled)
        )
    }

    /// Validates a transition to `target`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPlanTransition` if the transition is not
    /// allowed.
    pub const fn transition_to(&self, target: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(DomainError::InvalidPlanTransition {
                from: *self,
                to: target,
            })
        }
    }
}

impl FromStr for PlanStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "polling" => Ok(Self::Polling),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidPlanStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How "none of these work" votes are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollMode {
    /// "None" votes are informational.
    #[default]
    Standard,
    /// The plan expires unless some dated option beats "none".
    AllOrNothing,
}

impl PollMode {
    /// Converts this mode to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::AllOrNothing => "all_or_nothing",
        }
    }
}

impl FromStr for PollMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "all_or_nothing" => Ok(Self::AllOrNothing),
            _ => Err(DomainError::InvalidPollMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for PollMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate date offered in a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Proposed start instant.
    pub date: OffsetDateTime,
    /// Display label.
    pub label: String,
}

/// Who cast a vote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voter {
    /// A registered user.
    User(i64),
    /// An anonymous Discord identity.
    Discord(String),
}

/// What a vote selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    /// A dated option by zero-based index.
    Option(usize),
    /// The implicit "none of these work" option.
    NoneOfThese,
}

/// A single cast vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollVote {
    /// The voter.
    pub voter: Voter,
    /// The selection.
    pub choice: VoteChoice,
    /// When the vote was cast.
    pub cast_at: OffsetDateTime,
}

/// Reminder flags copied onto the materialized event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    /// Remind 15 minutes before start.
    pub fifteen_minutes: bool,
    /// Remind one hour before start.
    pub one_hour: bool,
    /// Remind 24 hours before start.
    pub twenty_four_hours: bool,
}

/// A scheduling plan that polls for a date before becoming an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPlan {
    /// Canonical plan id.
    pub id: i64,
    /// The user who created the plan.
    pub creator_id: i64,
    /// Title carried onto the event.
    pub title: String,
    /// Lifecycle status.
    pub status: PlanStatus,
    /// Dated options; empty until the poll starts.
    pub poll_options: Vec<PollOption>,
    /// Vote treatment.
    pub poll_mode: PollMode,
    /// Poll deadline; set when the poll starts.
    pub poll_ends_at: Option<OffsetDateTime>,
    /// Length of the resulting event.
    pub duration_minutes: u32,
    /// Roster configuration of the resulting event.
    pub slot_config: Option<RosterSlotConfig>,
    /// Reminder flags of the resulting event.
    pub reminders: ReminderSettings,
    /// Game scope.
    pub game_id: Option<i64>,
    /// Index of the winning option once completed.
    pub winning_option: Option<usize>,
    /// The materialized event once completed.
    pub created_event_id: Option<i64>,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
    /// Last modification timestamp.
    pub updated_at: OffsetDateTime,
}

/// Vote counts after applying "last vote wins".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollTally {
    /// Count per dated option, by index.
    pub option_counts: Vec<u32>,
    /// Count for "none of these work".
    pub none_count: u32,
    /// Distinct voters whose vote was counted.
    pub voter_count: usize,
}

/// Outcome of resolving a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollResolution {
    /// A dated option won.
    Winner {
        /// Index of the winning option.
        option_index: usize,
        /// Final counts.
        tally: PollTally,
    },
    /// No option was usable; the plan expires.
    Expired {
        /// Final counts.
        tally: PollTally,
    },
}

impl PollResolution {
    /// Returns the plan status this resolution leads to.
    #[must_use]
    pub const fn target_status(&self) -> PlanStatus {
        match self {
            Self::Winner { .. } => PlanStatus::Completed,
            Self::Expired { .. } => PlanStatus::Expired,
        }
    }

    /// Returns the final counts.
    #[must_use]
    pub const fn tally(&self) -> &PollTally {
        match self {
            Self::Winner { tally, .. } | Self::Expired { tally } => tally,
        }
    }
}

/// Validates the dated options of a poll.
///
/// # Errors
///
/// Returns `DomainError::InvalidPollOptionCount` unless there are between
/// [`MIN_POLL_OPTIONS`] and [`MAX_POLL_OPTIONS`] options.
pub const fn validate_poll_options(options: &[PollOption]) -> Result<(), DomainError> {
    let count: usize = options.len();
    if count < MIN_POLL_OPTIONS || count > MAX_POLL_OPTIONS {
        return Err(DomainError::InvalidPollOptionCount {
            count,
            min: MIN_POLL_OPTIONS,
            max: MAX_POLL_OPTIONS,
        });
    }
    Ok(())
}

/// Validates a poll deadline against the current time.
///
/// # Errors
///
/// Returns `DomainError::InvalidPollDeadline` if the deadline is missing or
/// not after `now`.
pub fn validate_poll_deadline(
    poll_ends_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Result<OffsetDateTime, DomainError> {
    match poll_ends_at {
        Some(at) if at > now => Ok(at),
        other => Err(DomainError::InvalidPollDeadline {
            poll_ends_at: other,
        }),
    }
}

/// Validates that `choice` may be cast on `plan` at `now`.
///
/// # Errors
///
/// Returns an error if:
/// - The plan is not polling
/// - The deadline has passed
/// - The choice names an option that does not exist
pub fn validate_vote(
    plan: &EventPlan,
    choice: VoteChoice,
    now: OffsetDateTime,
) -> Result<(), DomainError> {
    if plan.status != PlanStatus::Polling {
        return Err(DomainError::PollNotOpen {
            status: plan.status,
        });
    }
    if let Some(poll_ends_at) = plan.poll_ends_at.filter(|at| now >= *at) {
        return Err(DomainError::PollDeadlinePassed { poll_ends_at });
    }
    match choice {
        VoteChoice::Option(index) if index >= plan.poll_options.len() => {
            Err(DomainError::InvalidPollOption {
                index,
                option_count: plan.poll_options.len(),
            })
        }
        _ => Ok(()),
    }
}

/// Counts votes, keeping only each voter's latest vote.
///
/// Votes are ordered by cast time; votes with equal cast times keep their
/// input order. Choices naming a nonexistent option are ignored.
#[must_use]
pub fn tally_votes(option_count: usize, votes: &[PollVote]) -> PollTally {
    let mut ordered: Vec<&PollVote> = votes.iter().collect();
    ordered.sort_by_key(|v| v.cast_at);

    let mut latest: HashMap<&Voter, VoteChoice> = HashMap::new();
    for vote in ordered {
        latest.insert(&vote.voter, vote.choice);
    }

    let mut option_counts: Vec<u32> = vec![0; option_count];
    let mut none_count: u32 = 0;
    let mut voter_count: usize = 0;

    for choice in latest.into_values() {
        match choice {
            VoteChoice::Option(index) => {
                if let Some(count) = option_counts.get_mut(index) {
                    *count += 1;
                    voter_count += 1;
                }
            }
            VoteChoice::NoneOfThese => {
                none_count += 1;
                voter_count += 1;
            }
        }
    }

    PollTally {
        option_counts,
        none_count,
        voter_count,
    }
}

/// Picks the winning option from a tally.
#[must_use]
pub fn pick_winner(options: &[PollOption], tally: PollTally, mode: PollMode) -> PollResolution {
    let best: Option<(usize, u32)> = tally
        .option_counts
        .iter()
        .copied()
        .enumerate()
        .zip(options)
        .max_by(|((a_idx, a_count), a_opt), ((b_idx, b_count), b_opt)| {
            a_count
                .cmp(b_count)
                .then_with(|| b_opt.date.cmp(&a_opt.date))
                .then_with(|| b_idx.cmp(a_idx))
        })
        .map(|(best, _)| best);

    match best {
        Some((option_index, count))
            if count > 0 && (mode == PollMode::Standard || count > tally.none_count) =>
        {
            PollResolution::Winner {
                option_index,
                tally,
            }
        }
        _ => PollResolution::Expired { tally },
    }
}

/// Resolves a polling plan whose deadline has passed.
///
/// # Errors
///
/// Returns an error if:
/// - The plan is not polling
/// - The deadline has not been reached
pub fn resolve_poll(
    plan: &EventPlan,
    votes: &[PollVote],
    now: OffsetDateTime,
) -> Result<PollResolution, DomainError> {
    if plan.status != PlanStatus::Polling {
        return Err(DomainError::InvalidPlanTransition {
            from: plan.status,
            to: PlanStatus::Completed,
        });
    }
    let poll_ends_at: OffsetDateTime = plan
        .poll_ends_at
        .ok_or(DomainError::InvalidPollDeadline { poll_ends_at: None })?;
    if now < poll_ends_at {
        return Err(DomainError::PollDeadlineNotReached { poll_ends_at });
    }

    let tally: PollTally = tally_votes(plan.poll_options.len(), votes);
    Ok(pick_winner(&plan.poll_options, tally, plan.poll_mode))
}
