// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row and record types shared by queries and mutations.
//!
//! `*Row` types are read with `Selectable`; `*Record` types are written with
//! `Insertable`. Each converts to or from its domain value.
//!
//! Instants are stored as fixed-width UTC text with nanosecond precision so
//! that text order is time order. Nested domain values (slot configs,
//! reminders, poll options, voters) are stored as JSON.

use diesel::prelude::*;
use num_traits::ToPrimitive;
use raidplan_audit::{Action, Actor, AuditEvent, AuditScope, Cause, StateSnapshot};
use raidplan_domain::{
    AvailabilityWindow, EventDraft, EventPlan, PollVote, RosterAssignment, RosterRole,
    RosterSlotConfig, ScheduledEvent, Signup, TimeWindow,
};
use std::fmt::Display;
use std::str::FromStr;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::diesel_schema::{
    audit_events, availability_windows, event_plans, event_signups, events, plan_votes,
    roster_assignments,
};
use crate::error::PersistenceError;

// ============================================================================
// Column codecs
// ============================================================================

/// Formats an instant as sortable UTC text.
///
/// # Errors
///
/// Returns an error if the instant cannot be expressed in UTC.
pub fn format_instant(at: OffsetDateTime) -> Result<String, PersistenceError> {
    let utc: OffsetDateTime = at.checked_to_offset(UtcOffset::UTC).ok_or_else(|| {
        PersistenceError::SerializationError(format!("{at} cannot be expressed in UTC"))
    })?;
    utc.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
    ))
    .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Parses text written by [`format_instant`].
///
/// # Errors
///
/// Returns an error if the text is not a stored instant.
pub fn parse_instant(text: &str) -> Result<OffsetDateTime, PersistenceError> {
    PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"),
    )
    .map(PrimitiveDateTime::assume_utc)
    .map_err(|e| PersistenceError::ReconstructionError(format!("instant '{text}': {e}")))
}

fn format_optional_instant(at: Option<OffsetDateTime>) -> Result<Option<String>, PersistenceError> {
    at.map(format_instant).transpose()
}

fn parse_optional_instant(text: Option<&str>) -> Result<Option<OffsetDateTime>, PersistenceError> {
    text.map(parse_instant).transpose()
}

fn parse_named<T>(text: &str) -> Result<T, PersistenceError>
where
    T: FromStr,
    T::Err: Display,
{
    text.parse()
        .map_err(|e: T::Err| PersistenceError::ReconstructionError(e.to_string()))
}

fn stored_range(start: &str, end: &str) -> Result<TimeWindow, PersistenceError> {
    TimeWindow::new(parse_instant(start)?, parse_instant(end)?)
        .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))
}

fn to_column<T: ToPrimitive + Display + Copy>(value: T, what: &str) -> Result<i32, PersistenceError> {
    value.to_i32().ok_or_else(|| {
        PersistenceError::SerializationError(format!("{what} {value} does not fit a column"))
    })
}

fn from_column_u32(value: i32, what: &str) -> Result<u32, PersistenceError> {
    value
        .to_u32()
        .ok_or_else(|| PersistenceError::ReconstructionError(format!("{what} {value} out of range")))
}

fn slot_config_json(config: Option<&RosterSlotConfig>) -> Result<Option<String>, PersistenceError> {
    config
        .map(serde_json::to_string)
        .transpose()
        .map_err(PersistenceError::from)
}

fn parse_slot_config(json: Option<&str>) -> Result<Option<RosterSlotConfig>, PersistenceError> {
    json.map(serde_json::from_str)
        .transpose()
        .map_err(PersistenceError::from)
}

// ============================================================================
// Availability windows
// ============================================================================

/// A stored availability window.
#[derive(Queryable, Selectable)]
#[diesel(table_name = availability_windows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WindowRow {
    window_id: i64,
    user_id: i64,
    start_at: String,
    end_at: String,
    status: String,
    game_id: Option<i64>,
    source_event_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl WindowRow {
    /// Rebuilds the domain window.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored column is malformed.
    pub fn into_domain(self) -> Result<AvailabilityWindow, PersistenceError> {
        Ok(AvailabilityWindow {
            id: self.window_id,
            user_id: self.user_id,
            time_range: stored_range(&self.start_at, &self.end_at)?,
            status: parse_named(&self.status)?,
            game_id: self.game_id,
            source_event_id: self.source_event_id,
            created_at: parse_instant(&self.created_at)?,
            updated_at: parse_instant(&self.updated_at)?,
        })
    }
}

/// An availability window to insert.
#[derive(Insertable)]
#[diesel(table_name = availability_windows)]
pub struct WindowRecord {
    window_id: i64,
    user_id: i64,
    start_at: String,
    end_at: String,
    status: String,
    game_id: Option<i64>,
    source_event_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl WindowRecord {
    /// Flattens a domain window into columns.
    ///
    /// # Errors
    ///
    /// Returns an error if an instant cannot be encoded.
    pub fn from_domain(window: &AvailabilityWindow) -> Result<Self, PersistenceError> {
        Ok(Self {
            window_id: window.id,
            user_id: window.user_id,
            start_at: format_instant(window.time_range.start())?,
            end_at: format_instant(window.time_range.end())?,
            status: window.status.as_str().to_string(),
            game_id: window.game_id,
            source_event_id: window.source_event_id,
            created_at: format_instant(window.created_at)?,
            updated_at: format_instant(window.updated_at)?,
        })
    }
}

// ============================================================================
// Events and rosters
// ============================================================================

/// A stored event.
#[derive(Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventRow {
    event_id: i64,
    title: String,
    start_at: String,
    end_at: String,
    slot_config_json: Option<String>,
    reminders_json: String,
    game_id: Option<i64>,
    recurrence_group_id: Option<i64>,
    source_plan_id: Option<i64>,
    auto_unbench: i32,
    cancelled: i32,
}

impl EventRow {
    /// Rebuilds the domain event.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored column is malformed.
    pub fn into_domain(self) -> Result<ScheduledEvent, PersistenceError> {
        Ok(ScheduledEvent {
            id: self.event_id,
            draft: EventDraft {
                title: self.title,
                time_range: stored_range(&self.start_at, &self.end_at)?,
                slot_config: parse_slot_config(self.slot_config_json.as_deref())?,
                reminders: serde_json::from_str(&self.reminders_json)?,
                game_id: self.game_id,
                recurrence_group_id: self.recurrence_group_id,
                source_plan_id: self.source_plan_id,
                auto_unbench: self.auto_unbench != 0,
            },
            cancelled: self.cancelled != 0,
        })
    }
}

/// An event to insert or overwrite.
#[derive(Insertable, AsChangeset)]
#[diesel(table_name = events)]
#[diesel(primary_key(event_id))]
#[diesel(treat_none_as_null = true)]
pub struct EventRecord {
    event_id: i64,
    title: String,
    start_at: String,
    end_at: String,
    slot_config_json: Option<String>,
    reminders_json: String,
    game_id: Option<i64>,
    recurrence_group_id: Option<i64>,
    source_plan_id: Option<i64>,
    auto_unbench: i32,
    cancelled: i32,
}

impl EventRecord {
    /// Flattens a domain event into columns.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be encoded.
    pub fn from_domain(event: &ScheduledEvent) -> Result<Self, PersistenceError> {
        let draft: &EventDraft = &event.draft;
        Ok(Self {
            event_id: event.id,
            title: draft.title.clone(),
            start_at: format_instant(draft.time_range.start())?,
            end_at: format_instant(draft.time_range.end())?,
            slot_config_json: slot_config_json(draft.slot_config.as_ref())?,
            reminders_json: serde_json::to_string(&draft.reminders)?,
            game_id: draft.game_id,
            recurrence_group_id: draft.recurrence_group_id,
            source_plan_id: draft.source_plan_id,
            auto_unbench: i32::from(draft.auto_unbench),
            cancelled: i32::from(event.cancelled),
        })
    }
}

/// A stored signup.
#[derive(Queryable, Selectable)]
#[diesel(table_name = event_signups)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SignupRow {
    signup_id: i64,
    user_id: i64,
    signed_up_at: String,
    role: Option<String>,
    preferred_roles_json: String,
}

impl SignupRow {
    /// Rebuilds the domain signup.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored column is malformed.
    pub fn into_domain(self) -> Result<Signup, PersistenceError> {
        Ok(Signup {
            signup_id: self.signup_id,
            user_id: self.user_id,
            signed_up_at: parse_instant(&self.signed_up_at)?,
            role: self.role.as_deref().map(parse_named::<RosterRole>).transpose()?,
            preferred_roles: serde_json::from_str(&self.preferred_roles_json)?,
        })
    }
}

/// A signup to insert.
#[derive(Insertable)]
#[diesel(table_name = event_signups)]
pub struct SignupRecord {
    signup_id: i64,
    event_id: i64,
    user_id: i64,
    signed_up_at: String,
    role: Option<String>,
    preferred_roles_json: String,
    sequence: i32,
}

impl SignupRecord {
    /// Flattens a signup held at `sequence` in its roster.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be encoded.
    pub fn from_domain(
        event_id: i64,
        sequence: usize,
        signup: &Signup,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            signup_id: signup.signup_id,
            event_id,
            user_id: signup.user_id,
            signed_up_at: format_instant(signup.signed_up_at)?,
            role: signup.role.map(|r| r.as_str().to_string()),
            preferred_roles_json: serde_json::to_string(&signup.preferred_roles)?,
            sequence: to_column(sequence, "signup sequence")?,
        })
    }
}

/// A stored placement.
#[derive(Queryable, Selectable)]
#[diesel(table_name = roster_assignments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssignmentRow {
    signup_id: i64,
    user_id: i64,
    slot: Option<String>,
    position: i32,
    is_override: i32,
}

impl AssignmentRow {
    /// Rebuilds the domain placement.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored column is malformed.
    pub fn into_domain(self) -> Result<RosterAssignment, PersistenceError> {
        Ok(RosterAssignment {
            signup_id: self.signup_id,
            user_id: self.user_id,
            slot: self.slot.as_deref().map(parse_named::<RosterRole>).transpose()?,
            position: from_column_u32(self.position, "position")?,
            is_override: self.is_override != 0,
        })
    }
}

/// A placement to insert.
#[derive(Insertable)]
#[diesel(table_name = roster_assignments)]
pub struct AssignmentRecord {
    signup_id: i64,
    event_id: i64,
    user_id: i64,
    slot: Option<String>,
    position: i32,
    is_override: i32,
    sequence: i32,
}

impl AssignmentRecord {
    /// Flattens a placement held at `sequence` in its roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the position does not fit a column.
    pub fn from_domain(
        event_id: i64,
        sequence: usize,
        assignment: &RosterAssignment,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            signup_id: assignment.signup_id,
            event_id,
            user_id: assignment.user_id,
            slot: assignment.slot.map(|r| r.as_str().to_string()),
            position: to_column(assignment.position, "position")?,
            is_override: i32::from(assignment.is_override),
            sequence: to_column(sequence, "assignment sequence")?,
        })
    }
}

// ============================================================================
// Plans
// ============================================================================

/// A stored plan.
#[derive(Queryable, Selectable)]
#[diesel(table_name = event_plans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PlanRow {
    plan_id: i64,
    creator_id: i64,
    title: String,
    status: String,
    poll_options_json: String,
    poll_mode: String,
    poll_ends_at: Option<String>,
    duration_minutes: i32,
    slot_config_json: Option<String>,
    reminders_json: String,
    game_id: Option<i64>,
    winning_option: Option<i32>,
    created_event_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl PlanRow {
    /// Rebuilds the domain plan.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored column is malformed.
    pub fn into_domain(self) -> Result<EventPlan, PersistenceError> {
        let winning_option: Option<usize> = self
            .winning_option
            .map(|index| {
                index.to_usize().ok_or_else(|| {
                    PersistenceError::ReconstructionError(format!(
                        "winning option {index} out of range"
                    ))
                })
            })
            .transpose()?;

        Ok(EventPlan {
            id: self.plan_id,
            creator_id: self.creator_id,
            title: self.title,
            status: parse_named(&self.status)?,
            poll_options: serde_json::from_str(&self.poll_options_json)?,
            poll_mode: parse_named(&self.poll_mode)?,
            poll_ends_at: parse_optional_instant(self.poll_ends_at.as_deref())?,
            duration_minutes: from_column_u32(self.duration_minutes, "duration")?,
            slot_config: parse_slot_config(self.slot_config_json.as_deref())?,
            reminders: serde_json::from_str(&self.reminders_json)?,
            game_id: self.game_id,
            winning_option,
            created_event_id: self.created_event_id,
            created_at: parse_instant(&self.created_at)?,
            updated_at: parse_instant(&self.updated_at)?,
        })
    }
}

/// A plan to insert or overwrite.
#[derive(Insertable, AsChangeset)]
#[diesel(table_name = event_plans)]
#[diesel(primary_key(plan_id))]
#[diesel(treat_none_as_null = true)]
pub struct PlanRecord {
    plan_id: i64,
    creator_id: i64,
    title: String,
    status: String,
    poll_options_json: String,
    poll_mode: String,
    poll_ends_at: Option<String>,
    duration_minutes: i32,
    slot_config_json: Option<String>,
    reminders_json: String,
    game_id: Option<i64>,
    winning_option: Option<i32>,
    created_event_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl PlanRecord {
    /// Flattens a domain plan into columns.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be encoded.
    pub fn from_domain(plan: &EventPlan) -> Result<Self, PersistenceError> {
        Ok(Self {
            plan_id: plan.id,
            creator_id: plan.creator_id,
            title: plan.title.clone(),
            status: plan.status.as_str().to_string(),
            poll_options_json: serde_json::to_string(&plan.poll_options)?,
            poll_mode: plan.poll_mode.as_str().to_string(),
            poll_ends_at: format_optional_instant(plan.poll_ends_at)?,
            duration_minutes: to_column(plan.duration_minutes, "duration")?,
            slot_config_json: slot_config_json(plan.slot_config.as_ref())?,
            reminders_json: serde_json::to_string(&plan.reminders)?,
            game_id: plan.game_id,
            winning_option: plan
                .winning_option
                .map(|index| to_column(index, "winning option"))
                .transpose()?,
            created_event_id: plan.created_event_id,
            created_at: format_instant(plan.created_at)?,
            updated_at: format_instant(plan.updated_at)?,
        })
    }
}

/// A stored vote.
#[derive(Queryable, Selectable)]
#[diesel(table_name = plan_votes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VoteRow {
    voter_json: String,
    choice_json: String,
    cast_at: String,
}

impl VoteRow {
    /// Rebuilds the domain vote.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored column is malformed.
    pub fn into_domain(self) -> Result<PollVote, PersistenceError> {
        Ok(PollVote {
            voter: serde_json::from_str(&self.voter_json)?,
            choice: serde_json::from_str(&self.choice_json)?,
            cast_at: parse_instant(&self.cast_at)?,
        })
    }
}

/// A vote to insert.
#[derive(Insertable)]
#[diesel(table_name = plan_votes)]
pub struct VoteRecord {
    plan_id: i64,
    voter_json: String,
    choice_json: String,
    cast_at: String,
}

impl VoteRecord {
    /// Flattens a vote on `plan_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be encoded.
    pub fn from_domain(plan_id: i64, vote: &PollVote) -> Result<Self, PersistenceError> {
        Ok(Self {
            plan_id,
            voter_json: serde_json::to_string(&vote.voter)?,
            choice_json: serde_json::to_string(&vote.choice)?,
            cast_at: format_instant(vote.cast_at)?,
        })
    }
}

// ============================================================================
// Audit
// ============================================================================

/// Splits a scope into its stored kind and id.
#[must_use]
pub const fn scope_columns(scope: AuditScope) -> (&'static str, i64) {
    match scope {
        AuditScope::User(id) => ("user", id),
        AuditScope::Event(id) => ("event", id),
        AuditScope::Plan(id) => ("plan", id),
    }
}

fn scope_from_columns(kind: &str, id: i64) -> Result<AuditScope, PersistenceError> {
    match kind {
        "user" => Ok(AuditScope::User(id)),
        "event" => Ok(AuditScope::Event(id)),
        "plan" => Ok(AuditScope::Plan(id)),
        other => Err(PersistenceError::ReconstructionError(format!(
            "unknown audit scope '{other}'"
        ))),
    }
}

/// A stored audit event.
#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditRow {
    audit_id: i64,
    scope_kind: String,
    scope_id: i64,
    actor_json: String,
    cause_json: String,
    action_json: String,
    before_snapshot_json: String,
    after_snapshot_json: String,
}

impl AuditRow {
    /// Rebuilds the domain audit event, id included.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored column is malformed.
    pub fn into_domain(self) -> Result<AuditEvent, PersistenceError> {
        let actor: Actor = serde_json::from_str(&self.actor_json)?;
        let cause: Cause = serde_json::from_str(&self.cause_json)?;
        let action: Action = serde_json::from_str(&self.action_json)?;
        let before: StateSnapshot = serde_json::from_str(&self.before_snapshot_json)?;
        let after: StateSnapshot = serde_json::from_str(&self.after_snapshot_json)?;

        Ok(AuditEvent::new(
            scope_from_columns(&self.scope_kind, self.scope_id)?,
            actor,
            cause,
            action,
            before,
            after,
        )
        .with_event_id(self.audit_id))
    }
}

/// An audit event to insert.
#[derive(Insertable)]
#[diesel(table_name = audit_events)]
pub struct AuditRecord {
    scope_kind: String,
    scope_id: i64,
    actor_json: String,
    cause_json: String,
    action_json: String,
    before_snapshot_json: String,
    after_snapshot_json: String,
}

impl AuditRecord {
    /// Flattens an audit event into columns.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn from_domain(event: &AuditEvent) -> Result<Self, PersistenceError> {
        let (scope_kind, scope_id): (&str, i64) = scope_columns(event.scope);
        Ok(Self {
            scope_kind: scope_kind.to_string(),
            scope_id,
            actor_json: serde_json::to_string(&event.actor)?,
            cause_json: serde_json::to_string(&event.cause)?,
            action_json: serde_json::to_string(&event.action)?,
            before_snapshot_json: serde_json::to_string(&event.before)?,
            after_snapshot_json: serde_json::to_string(&event.after)?,
        })
    }
}
