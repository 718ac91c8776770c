// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Availability heatmap aggregation.
//!
//! The query range is sliced into fixed-size slots. Slicing starts at the top
//! of the hour at or before the range start and steps by the slot duration
//! until the range end; the last slot is truncated at the range end.
//!
//! Each `(user, slot)` cell holds the status of the first of the user's
//! windows that overlaps the slot, or `none`. Which window counts as "first"
//! is a named policy ([`SlotPrecedence`]):
//!
//! - `ListOrder` scans the user's windows in the order supplied
//! - `StatusPriority` scans them by a status ranking, falling back to list
//!   order within a status
//!
//! Axis labels are emitted only for slots that start on the hour.

use crate::availability::{AvailabilityStatus, AvailabilityWindow};
use crate::error::DomainError;
use crate::interval::TimeWindow;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, Time};

/// Default slot length in minutes.
pub const DEFAULT_SLOT_MINUTES: u32 = 30;

const MAX_SLOT_MINUTES: u32 = 24 * 60;

/// Most slots a single heatmap may hold.
pub const MAX_HEATMAP_SLOTS: usize = 2016;

/// How overlapping windows for one user are ranked when filling a cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotPrecedence {
    /// The first overlapping window in the caller's list wins.
    #[default]
    ListOrder,
    /// Windows are ranked by status, earliest in this list first.
    StatusPriority(Vec<AvailabilityStatus>),
}

impl SlotPrecedence {
    /// The suggested status ranking: committed, blocked, available, freed.
    #[must_use]
    pub fn default_status_priority() -> Self {
        Self::StatusPriority(vec![
            AvailabilityStatus::Committed,
            AvailabilityStatus::Blocked,
            AvailabilityStatus::Available,
            AvailabilityStatus::Freed,
        ])
    }

    fn rank(&self, status: AvailabilityStatus) -> usize {
        match self {
            Self::ListOrder => 0,
            Self::StatusPriority(order) => order
                .iter()
                .position(|s| *s == status)
                .unwrap_or(order.len()),
        }
    }
}

/// Options controlling heatmap slicing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapOptions {
    /// Slot length in minutes.
    pub slot_duration_minutes: u32,
    /// Cell precedence policy.
    pub precedence: SlotPrecedence,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            slot_duration_minutes: DEFAULT_SLOT_MINUTES,
            precedence: SlotPrecedence::ListOrder,
        }
    }
}

/// One user's windows as supplied to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWindows {
    /// The user.
    pub user_id: i64,
    /// The user's windows, in caller-controlled order.
    pub windows: Vec<AvailabilityWindow>,
}

/// The status of a single heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// A window with this status covers the slot.
    Status(AvailabilityStatus),
    /// No window overlaps the slot.
    None,
}

impl SlotStatus {
    /// Converts this cell status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Status(status) => status.as_str(),
            Self::None => "none",
        }
    }
}

/// A time slot on the heatmap axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapSlot {
    /// Zero-based slot index.
    pub index: usize,
    /// The slot's range.
    pub window: TimeWindow,
    /// `HH:00` when the slot starts on the hour.
    pub label: Option<String>,
}

/// One user's row of cells, aligned with the grid's slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapRow {
    /// The user.
    pub user_id: i64,
    /// One status per slot.
    pub cells: Vec<SlotStatus>,
}

/// How many users hold each status in one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCoverage {
    /// Users available.
    pub available: usize,
    /// Users committed to an event.
    pub committed: usize,
    /// Users blocked.
    pub blocked: usize,
    /// Users with a freed window.
    pub freed: usize,
    /// Users with no window.
    pub none: usize,
}

/// The aggregated `(user, slot)` grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    /// The slot axis.
    pub slots: Vec<HeatmapSlot>,
    /// One row per user, in input order.
    pub rows: Vec<HeatmapRow>,
}

impl HeatmapGrid {
    /// Returns the status for a user and slot, if both exist.
    #[must_use]
    pub fn cell(&self, user_id: i64, slot_index: usize) -> Option<SlotStatus> {
        self.rows
            .iter()
            .find(|row| row.user_id == user_id)
            .and_then(|row| row.cells.get(slot_index).copied())
    }

    /// Returns per-slot status counts across all users.
    #[must_use]
    pub fn coverage(&self) -> Vec<SlotCoverage> {
        let mut coverage: Vec<SlotCoverage> = vec![SlotCoverage::default(); self.slots.len()];

        for row in &self.rows {
            for (slot, cell) in coverage.iter_mut().zip(&row.cells) {
                match cell {
                    SlotStatus::Status(AvailabilityStatus::Available) => slot.available += 1,
                    SlotStatus::Status(AvailabilityStatus::Committed) => slot.committed += 1,
                    SlotStatus::Status(AvailabilityStatus::Blocked) => slot.blocked += 1,
                    SlotStatus::Status(AvailabilityStatus::Freed) => slot.freed += 1,
                    SlotStatus::None => slot.none += 1,
                }
            }
        }

        coverage
    }
}

/// Slices `range` into slots snapped to the top of the hour.
///
/// # Errors
///
/// Returns an error if the slot duration is zero or longer than a day, or
/// the range needs more than [`MAX_HEATMAP_SLOTS`] slots.
pub fn slice_range(
    range: &TimeWindow,
    slot_duration_minutes: u32,
) -> Result<Vec<HeatmapSlot>, DomainError> {
    if slot_duration_minutes == 0 || slot_duration_minutes > MAX_SLOT_MINUTES {
        return Err(DomainError::InvalidSlotDuration {
            minutes: slot_duration_minutes,
        });
    }

    let step: Duration = Duration::minutes(i64::from(slot_duration_minutes));
    let start: OffsetDateTime = range.start();
    let mut cursor: OffsetDateTime =
        start.replace_time(Time::MIDNIGHT) + Duration::hours(i64::from(start.hour()));

    let mut slots: Vec<HeatmapSlot> = Vec::new();
    while cursor < range.end() {
        if slots.len() == MAX_HEATMAP_SLOTS {
            return Err(DomainError::HeatmapTooLarge {
                slot_minutes: slot_duration_minutes,
                max_slots: MAX_HEATMAP_SLOTS,
            });
        }

        // Past the last representable instant the slot is cut at the range end.
        let next: Option<OffsetDateTime> = cursor.checked_add(step);
        let slot_end: OffsetDateTime = next.map_or(range.end(), |n| n.min(range.end()));
        let label: Option<String> =
            (cursor.minute() == 0).then(|| format!("{:02}:00", cursor.hour()));

        slots.push(HeatmapSlot {
            index: slots.len(),
            window: TimeWindow::new(cursor, slot_end)?,
            label,
        });

        match next {
            Some(n) => cursor = n,
            None => break,
        }
    }

    Ok(slots)
}

/// Aggregates many users' windows into a heatmap grid over `range`.
///
/// # Errors
///
/// Returns an error if the slot duration is invalid or the range needs more
/// than [`MAX_HEATMAP_SLOTS`] slots.
pub fn aggregate_heatmap(
    users: &[UserWindows],
    range: &TimeWindow,
    options: &HeatmapOptions,
) -> Result<HeatmapGrid, DomainError> {
    let slots: Vec<HeatmapSlot> = slice_range(range, options.slot_duration_minutes)?;

    let rows: Vec<HeatmapRow> = users
        .iter()
        .map(|user| {
            let mut ranked: Vec<&AvailabilityWindow> = user.windows.iter().collect();
            // Stable sort keeps list order within a rank.
            ranked.sort_by_key(|w| options.precedence.rank(w.status));

            let cells: Vec<SlotStatus> = slots
                .iter()
                .map(|slot| {
                    ranked
                        .iter()
                        .find(|w| w.time_range.overlaps(&slot.window))
                        .map_or(SlotStatus::None, |w| SlotStatus::Status(w.status))
                })
                .collect();

            HeatmapRow {
                user_id: user.user_id,
                cells,
            }
        })
        .collect();

    Ok(HeatmapGrid { slots, rows })
}
