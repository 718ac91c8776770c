// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Canonical time window representation.
//!
//! ## Invariants
//!
//! - `start < end` for every constructed window
//! - Both bounds are normalized to UTC
//! - Windows are half-open: touching endpoints do not overlap
//!
//! No timezone-sensitive logic lives here. Callers convert civil times to
//! instants before building a window.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

/// Maximum length of an availability window, in hours.
pub const MAX_WINDOW_HOURS: u32 = 24;

/// A half-open interval `[start, end)` between two UTC instants.
///
/// Deserialization goes through [`TimeWindow::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct TimeWindow {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

/// Unchecked wire form of a [`TimeWindow`].
#[derive(Deserialize)]
struct WindowBounds {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl TryFrom<WindowBounds> for TimeWindow {
    type Error = DomainError;

    fn try_from(bounds: WindowBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.start, bounds.end)
    }
}

impl TimeWindow {
    /// Creates a new window, normalizing both bounds to UTC.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTimeWindow` if `end <= start`.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, DomainError> {
        let start: OffsetDateTime = start.to_offset(UtcOffset::UTC);
        let end: OffsetDateTime = end.to_offset(UtcOffset::UTC);

        if end <= start {
            return Err(DomainError::InvalidTimeWindow { start, end });
        }

        Ok(Self { start, end })
    }

    /// Returns the inclusive start instant.
    #[must_use]
    pub const fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// Returns the exclusive end instant.
    #[must_use]
    pub const fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Returns true iff the two windows share any instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns the elapsed duration of the window.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns the window length in whole seconds.
    #[must_use]
    pub fn duration_seconds(&self) -> i64 {
        self.duration().whole_seconds()
    }

    /// Returns true if the window is no longer than `max_hours`.
    #[must_use]
    pub fn within_max(&self, max_hours: u32) -> bool {
        self.duration() <= Duration::hours(i64::from(max_hours))
    }
}

/// Validates that a window is usable as an availability window.
///
/// # Errors
///
/// Returns `DomainError::WindowTooLong` if the window exceeds
/// [`MAX_WINDOW_HOURS`].
pub fn validate_availability_range(window: &TimeWindow) -> Result<(), DomainError> {
    if !window.within_max(MAX_WINDOW_HOURS) {
        return Err(DomainError::WindowTooLong {
            duration_minutes: window.duration().whole_minutes(),
            max_hours: MAX_WINDOW_HOURS,
        });
    }
    Ok(())
}
