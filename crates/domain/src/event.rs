// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Scheduled events and their materialization from plans.

use crate::error::DomainError;
use crate::interval::TimeWindow;
use crate::poll::{EventPlan, ReminderSettings};
use crate::roster::RosterSlotConfig;
use serde::{Deserialize, Serialize};
use time::Duration;

/// Everything needed to persist a new event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Event title.
    pub title: String,
    /// When the event runs.
    pub time_range: TimeWindow,
    /// Roster configuration; `None` means no roster.
    pub slot_config: Option<RosterSlotConfig>,
    /// Reminder flags.
    pub reminders: ReminderSettings,
    /// Game scope.
    pub game_id: Option<i64>,
    /// Series membership for recurring events.
    pub recurrence_group_id: Option<i64>,
    /// The plan this event was resolved from.
    pub source_plan_id: Option<i64>,
    /// Promote pool members into vacated positions automatically.
    pub auto_unbench: bool,
}

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Canonical event id.
    pub id: i64,
    /// The event's fields.
    #[serde(flatten)]
    pub draft: EventDraft,
    /// Whether the event has been cancelled.
    pub cancelled: bool,
}

/// Validates a title.
///
/// # Errors
///
/// Returns `DomainError::EmptyTitle` if the title is blank.
pub fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::EmptyTitle);
    }
    Ok(())
}

/// Validates an event duration.
///
/// # Errors
///
/// Returns `DomainError::InvalidEventDuration` for a zero duration.
pub const fn validate_duration(minutes: u32) -> Result<(), DomainError> {
    if minutes == 0 {
        return Err(DomainError::InvalidEventDuration { minutes });
    }
    Ok(())
}

/// Builds the event a completed plan turns into.
///
/// The event starts at the winning option's date and runs for the plan's
/// duration, carrying the plan's slot configuration, reminders and game.
///
/// # Errors
///
/// Returns an error if the option index does not exist, the plan's
/// duration is zero, or the event would end past the last representable date.
pub fn materialize_from_plan(plan: &EventPlan, option_index: usize) -> Result<EventDraft, DomainError> {
    let option = plan
        .poll_options
        .get(option_index)
        .ok_or(DomainError::InvalidPollOption {
            index: option_index,
            option_count: plan.poll_options.len(),
        })?;
    validate_duration(plan.duration_minutes)?;

    let end = option
        .date
        .checked_add(Duration::minutes(i64::from(plan.duration_minutes)))
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: String::from("computing the event end"),
        })?;

    Ok(EventDraft {
        title: plan.title.clone(),
        time_range: TimeWindow::new(option.date, end)?,
        slot_config: plan.slot_config.clone(),
        reminders: plan.reminders,
        game_id: plan.game_id,
        recurrence_group_id: None,
        source_plan_id: Some(plan.id),
        auto_unbench: false,
    })
}
