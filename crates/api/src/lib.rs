// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the raid planner.
//!
//! Translates request DTOs into core commands, enforces authorization,
//! persists transitions and translates every lower-layer error into
//! [`ApiError`].

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthorizationService, Role, authenticate_stub};
pub use error::{
    ApiError, AuthError, InputError, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use handlers::{
    auto_assign, cancel_event, cancel_plan, cast_vote, create_availability, create_event,
    create_plan, delete_availability, get_audit_event, get_audit_timeline, get_event,
    get_heatmap, get_plan, get_roster, get_series, list_availability, resolve_due_plans,
    resolve_plan, sign_up, start_poll, update_availability, update_roster, withdraw_signup,
};
pub use request_response::{
    AssignmentInfo, AssignmentRequest, CancelEventResponse, CastVoteRequest, ConflictInfo,
    CreateAvailabilityRequest, CreateEventRequest, CreateEventResponse, CreatePlanRequest,
    DeleteAvailabilityResponse, EventInfo, HeatmapRequest, HeatmapResponse, HeatmapRowInfo,
    ListAvailabilityRequest, ListAvailabilityResponse, PlanInfo, PlanResponse, PollOptionInfo,
    PollOptionRequest, PromotionInfo, RecurrenceRequest, ResolvePlanResponse, RosterResponse,
    RosterWriteResponse, SignupRequest, SignupResponse, SlotConfigRequest, SlotInfo,
    StartPollRequest, UpdateAvailabilityRequest, UpdateRosterRequest, WindowInfo,
    WindowWriteResponse, WithdrawResponse,
};
