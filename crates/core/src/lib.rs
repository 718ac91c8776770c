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

//! State transitions for the raid planner.
//!
//! Every change is a command applied to one scoped state (a user's
//! availability, an event's roster, or an event plan). A transition either
//! succeeds completely, returning the new state and exactly one audit event,
//! or fails without side effects.

mod apply;
mod clock;
mod command;
mod error;
mod schedule;
mod state;

#[cfg(test)]
mod tests;

pub use apply::{apply_availability, apply_roster};
pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{AvailabilityCommand, NewEvent, NewPlan, PlanCommand, RosterCommand};
pub use error::CoreError;
pub use schedule::{apply_plan, cancel_event, create_plan, schedule_event};
pub use state::{
    AvailabilityState, AvailabilityTransition, CancelResult, PlanState, PlanTransition,
    RosterState, RosterTransition, ScheduleResult,
};
