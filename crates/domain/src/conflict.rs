// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Overlap detection between a candidate window and a user's windows.
//!
//! Conflicts are informational. A write that produces conflicts still
//! succeeds; the conflicts are returned alongside it so the caller can warn.

use crate::availability::{AvailabilityStatus, AvailabilityWindow};
use crate::interval::TimeWindow;
use serde::{Deserialize, Serialize};

/// An existing window that overlaps a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// The overlapping window's id.
    pub conflicting_id: i64,
    /// The overlapping window's range.
    pub time_range: TimeWindow,
    /// The overlapping window's status.
    pub status: AvailabilityStatus,
    /// The overlapping window's game scope, if any.
    pub game_id: Option<i64>,
}

impl From<&AvailabilityWindow> for Conflict {
    fn from(window: &AvailabilityWindow) -> Self {
        Self {
            conflicting_id: window.id,
            time_range: window.time_range,
            status: window.status,
            game_id: window.game_id,
        }
    }
}

/// Returns every existing window that overlaps `candidate`.
///
/// Windows whose id appears in `exclude_ids` are skipped, which lets an
/// update ignore the window being edited. Exclusion is by id so a stale copy
/// of the edited window is still excluded.
///
/// Conflicts are reported in the order of `existing`.
#[must_use]
pub fn detect_conflicts(
    candidate: &TimeWindow,
    exclude_ids: &[i64],
    existing: &[AvailabilityWindow],
) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|window| !exclude_ids.contains(&window.id))
        .filter(|window| window.time_range.overlaps(candidate))
        .map(Conflict::from)
        .collect()
}
