// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Availability windows and their lifecycle rules.
//!
//! ## Invariants
//!
//! - Every window satisfies `start < end` and lasts at most 24 hours
//! - `committed` windows are created only by event signup and carry a
//!   `source_event_id`
//! - `freed` windows keep the `source_event_id` of the cancelled event
//! - Event cancellation (`committed` → `freed`) is the only automatic status
//!   transition, and it preserves id, range, and game scope
//! - Overlapping windows are never merged; overlaps surface as conflicts

use crate::conflict::{Conflict, detect_conflicts};
use crate::error::DomainError;
use crate::interval::{TimeWindow, validate_availability_range};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// The status of an availability window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    /// The user is free during the window.
    #[default]
    Available,
    /// The window was produced by signing up for an event.
    Committed,
    /// The user is unavailable during the window.
    Blocked,
    /// A committed window whose event was cancelled.
    Freed,
}

impl AvailabilityStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Committed => "committed",
            Self::Blocked => "blocked",
            Self::Freed => "freed",
        }
    }

    /// Returns whether a user may set this status directly.
    #[must_use]
    pub const fn is_user_authored(&self) -> bool {
        matches!(self, Self::Available | Self::Blocked)
    }
}

impl FromStr for AvailabilityStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "committed" => Ok(Self::Committed),
            "blocked" => Ok(Self::Blocked),
            "freed" => Ok(Self::Freed),
            _ => Err(DomainError::InvalidAvailabilityStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A span of time a user has declared (or committed) for scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Canonical window id.
    pub id: i64,
    /// The owning user.
    pub user_id: i64,
    /// The covered range.
    pub time_range: TimeWindow,
    /// The window status.
    pub status: AvailabilityStatus,
    /// Optional game this window is scoped to.
    pub game_id: Option<i64>,
    /// The originating event for `committed` and `freed` windows.
    pub source_event_id: Option<i64>,
    /// Creation instant.
    pub created_at: OffsetDateTime,
    /// Last modification instant.
    pub updated_at: OffsetDateTime,
}

/// A user-authored window to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAvailabilityWindow {
    /// The owning user.
    pub user_id: i64,
    /// The requested range.
    pub time_range: TimeWindow,
    /// Requested status. Defaults to `available`.
    pub status: Option<AvailabilityStatus>,
    /// Optional game scope.
    pub game_id: Option<i64>,
}

/// A partial edit of an existing window. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityPatch {
    /// New start instant.
    pub start: Option<OffsetDateTime>,
    /// New end instant.
    pub end: Option<OffsetDateTime>,
    /// New status (user-authored statuses only).
    pub status: Option<AvailabilityStatus>,
}

/// A written window together with the conflicts detected for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowWrite {
    /// The window as written.
    pub window: AvailabilityWindow,
    /// Existing windows overlapping it.
    pub conflicts: Vec<Conflict>,
}

/// Builds a new user-authored window and reports its conflicts.
///
/// `replaced_ids` names windows the caller is replacing in the same write;
/// they are not reported as conflicts.
///
/// # Errors
///
/// Returns an error if:
/// - The window exceeds the 24 hour maximum
/// - The requested status is `committed` or `freed`
pub fn create_window(
    existing: &[AvailabilityWindow],
    window_id: i64,
    request: &NewAvailabilityWindow,
    replaced_ids: &[i64],
    now: OffsetDateTime,
) -> Result<WindowWrite, DomainError> {
    validate_availability_range(&request.time_range)?;

    let status: AvailabilityStatus = request.status.unwrap_or_default();
    if !status.is_user_authored() {
        return Err(DomainError::StatusNotUserEditable { status });
    }

    let conflicts: Vec<Conflict> = detect_conflicts(&request.time_range, replaced_ids, existing);

    Ok(WindowWrite {
        window: AvailabilityWindow {
            id: window_id,
            user_id: request.user_id,
            time_range: request.time_range,
            status,
            game_id: request.game_id,
            source_event_id: None,
            created_at: now,
            updated_at: now,
        },
        conflicts,
    })
}

/// Builds the `committed` window produced by an event signup.
///
/// # Errors
///
/// Returns an error if the event range exceeds the 24 hour maximum.
pub fn commit_window(
    existing: &[AvailabilityWindow],
    window_id: i64,
    user_id: i64,
    time_range: TimeWindow,
    event_id: i64,
    game_id: Option<i64>,
    now: OffsetDateTime,
) -> Result<WindowWrite, DomainError> {
    validate_availability_range(&time_range)?;

    let conflicts: Vec<Conflict> = detect_conflicts(&time_range, &[], existing);

    Ok(WindowWrite {
        window: AvailabilityWindow {
            id: window_id,
            user_id,
            time_range,
            status: AvailabilityStatus::Committed,
            game_id,
            source_event_id: Some(event_id),
            created_at: now,
            updated_at: now,
        },
        conflicts,
    })
}

/// Applies a user edit to one of `existing` and reports conflicts.
///
/// The edited window is excluded from its own conflict set by id.
///
/// # Errors
///
/// Returns an error if:
/// - The window does not exist
/// - The window is `committed`
/// - The patched range is empty, inverted, or longer than 24 hours
/// - The patched status is not user-authored
pub fn update_window(
    existing: &[AvailabilityWindow],
    window_id: i64,
    patch: &AvailabilityPatch,
    now: OffsetDateTime,
) -> Result<WindowWrite, DomainError> {
    let current: &AvailabilityWindow = existing
        .iter()
        .find(|w| w.id == window_id)
        .ok_or(DomainError::WindowNotFound { window_id })?;

    if current.status == AvailabilityStatus::Committed {
        return Err(DomainError::CommittedWindowImmutable { window_id });
    }

    let time_range: TimeWindow = TimeWindow::new(
        patch.start.unwrap_or_else(|| current.time_range.start()),
        patch.end.unwrap_or_else(|| current.time_range.end()),
    )?;
    validate_availability_range(&time_range)?;

    let mut updated: AvailabilityWindow = current.clone();
    updated.time_range = time_range;
    updated.updated_at = now;

    if let Some(status) = patch.status {
        if !status.is_user_authored() {
            return Err(DomainError::StatusNotUserEditable { status });
        }
        updated.status = status;
        updated.source_event_id = None;
    }

    let conflicts: Vec<Conflict> = detect_conflicts(&time_range, &[window_id], existing);

    Ok(WindowWrite {
        window: updated,
        conflicts,
    })
}

/// Lists a user's windows, optionally restricted to those overlapping `range`.
///
/// Results are ordered by start instant, then id.
#[must_use]
pub fn list_by_user(
    windows: &[AvailabilityWindow],
    user_id: i64,
    range: Option<&TimeWindow>,
) -> Vec<AvailabilityWindow> {
    let mut listed: Vec<AvailabilityWindow> = windows
        .iter()
        .filter(|w| w.user_id == user_id)
        .filter(|w| range.is_none_or(|r| w.time_range.overlaps(r)))
        .cloned()
        .collect();
    listed.sort_by_key(|w| (w.time_range.start(), w.id));
    listed
}

/// Frees every `committed` window that came from `event_id`.
///
/// Windows are changed in place. Already-freed windows and windows from
/// other events are untouched, so running this twice is a no-op.
///
/// Returns the ids of the windows that changed.
pub fn free_windows_for_event(
    windows: &mut [AvailabilityWindow],
    event_id: i64,
    now: OffsetDateTime,
) -> Vec<i64> {
    let mut freed: Vec<i64> = Vec::new();

    for window in windows.iter_mut() {
        if window.status == AvailabilityStatus::Committed
            && window.source_event_id == Some(event_id)
        {
            window.status = AvailabilityStatus::Freed;
            window.updated_at = now;
            freed.push(window.id);
        }
    }

    freed
}

/// Removes every `committed` window that came from `event_id`.
///
/// Used when a user withdraws from an event that still runs. Windows from
/// other events and freed windows stay.
///
/// Returns the ids of the removed windows.
pub fn release_windows_for_event(windows: &mut Vec<AvailabilityWindow>, event_id: i64) -> Vec<i64> {
    let mut released: Vec<i64> = Vec::new();
    windows.retain(|window| {
        let committed_here: bool = window.status == AvailabilityStatus::Committed
            && window.source_event_id == Some(event_id);
        if committed_here {
            released.push(window.id);
        }
        !committed_here
    });
    released
}
