// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Recurrence expansion.
//!
//! A recurring event is expanded into concrete instances at creation time.
//! Wall-clock time is preserved in the event's IANA timezone, so an event at
//! 19:00 local stays at 19:00 local across DST changes while its UTC instant
//! moves by an hour.
//!
//! ## Rules
//!
//! - `weekly` adds 7 days and `biweekly` adds 14 days per instance
//! - `monthly` keeps the original day-of-month, clamped to the month's last
//!   day; every instance is computed from the original anchor, so Jan 31
//!   yields Feb 28 and then Mar 31
//! - Generation stops strictly before `until`
//! - The first instance is the originating event
//! - A local time inside a DST gap is shifted forward by the gap length
//! - An ambiguous local time resolves to the earlier instant

use crate::error::DomainError;
use crate::interval::TimeWindow;
use chrono::{DateTime, Days, LocalResult, Months, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Maximum number of instances a single series may contain.
pub const MAX_RECURRENCE_INSTANCES: usize = 104;

/// How often a series repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    /// Every 7 days.
    Weekly,
    /// Every 14 days.
    Biweekly,
    /// Same day each month.
    Monthly,
}

impl RecurrenceFrequency {
    /// Converts this frequency to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for RecurrenceFrequency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(DomainError::InvalidRecurrenceFrequency(s.to_string())),
        }
    }
}

impl std::fmt::Display for RecurrenceFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurrence rule attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Repeat frequency.
    pub frequency: RecurrenceFrequency,
    /// Exclusive upper bound on instance start times.
    pub until: OffsetDateTime,
}

/// One concrete occurrence of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceInstance {
    /// Zero-based index within the series.
    pub index: usize,
    /// The occurrence's time range.
    pub time_range: TimeWindow,
}

/// A fully expanded series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSeries {
    /// Identifier shared by every instance.
    pub recurrence_group_id: i64,
    /// Instances in chronological order.
    pub instances: Vec<RecurrenceInstance>,
}

/// Parses an IANA timezone name.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimezone` if the name is not recognized.
pub fn parse_timezone(name: &str) -> Result<Tz, DomainError> {
    name.parse()
        .map_err(|_| DomainError::InvalidTimezone(name.to_string()))
}

fn overflow(operation: &str) -> DomainError {
    DomainError::DateArithmeticOverflow {
        operation: operation.to_string(),
    }
}

fn to_chrono(at: OffsetDateTime) -> Result<DateTime<Utc>, DomainError> {
    DateTime::<Utc>::from_timestamp(at.unix_timestamp(), at.nanosecond())
        .ok_or_else(|| overflow("converting an instant to civil time"))
}

fn to_time(at: DateTime<Utc>) -> Result<OffsetDateTime, DomainError> {
    OffsetDateTime::from_unix_timestamp(at.timestamp())
        .and_then(|t| t.replace_nanosecond(at.timestamp_subsec_nanos()))
        .map_err(|_| overflow("converting civil time to an instant"))
}

/// Resolves a wall-clock time in `tz` to an instant.
fn resolve_local(tz: Tz, local: NaiveDateTime) -> Result<DateTime<Utc>, DomainError> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => Ok(at.with_timezone(&Utc)),
        LocalResult::None => {
            // Inside a gap: apply the offset in effect before the transition.
            let before: NaiveDateTime = local
                .checked_sub_signed(TimeDelta::days(1))
                .ok_or_else(|| overflow("resolving a skipped local time"))?;
            let offset_seconds: i32 = tz
                .offset_from_local_datetime(&before)
                .earliest()
                .ok_or_else(|| overflow("resolving a skipped local time"))?
                .fix()
                .local_minus_utc();
            let utc: NaiveDateTime = local
                .checked_sub_signed(TimeDelta::seconds(i64::from(offset_seconds)))
                .ok_or_else(|| overflow("resolving a skipped local time"))?;
            Ok(Utc.from_utc_datetime(&utc))
        }
    }
}

fn advance(
    anchor: NaiveDateTime,
    frequency: RecurrenceFrequency,
    step: u32,
) -> Result<NaiveDateTime, DomainError> {
    let advanced: Option<NaiveDateTime> = match frequency {
        RecurrenceFrequency::Weekly => anchor.checked_add_days(Days::new(7 * u64::from(step))),
        RecurrenceFrequency::Biweekly => anchor.checked_add_days(Days::new(14 * u64::from(step))),
        RecurrenceFrequency::Monthly => anchor.checked_add_months(Months::new(step)),
    };
    advanced.ok_or_else(|| overflow(&format!("advancing a {frequency} series")))
}

/// Expands a recurring event into its instances.
///
/// `start` and `end` describe the originating event, which becomes the first
/// instance. Every instance keeps the originating duration.
///
/// # Errors
///
/// Returns an error if:
/// - `end <= start`
/// - `until <= start`
/// - `timezone` is not a known IANA zone
/// - The series would exceed [`MAX_RECURRENCE_INSTANCES`]
pub fn expand_recurrence(
    start: OffsetDateTime,
    end: OffsetDateTime,
    rule: &RecurrenceRule,
    timezone: &str,
    recurrence_group_id: i64,
) -> Result<RecurrenceSeries, DomainError> {
    let first: TimeWindow = TimeWindow::new(start, end)?;
    if rule.until <= first.start() {
        return Err(DomainError::InvalidRecurrenceUntil {
            start: first.start(),
            until: rule.until,
        });
    }

    let tz: Tz = parse_timezone(timezone)?;
    let duration = first.duration();
    let anchor: NaiveDateTime = to_chrono(first.start())?.with_timezone(&tz).naive_local();

    let mut instances: Vec<RecurrenceInstance> = vec![RecurrenceInstance {
        index: 0,
        time_range: first,
    }];

    for step in 1_u32.. {
        let local: NaiveDateTime = advance(anchor, rule.frequency, step)?;
        let instance_start: OffsetDateTime = to_time(resolve_local(tz, local)?)?;
        if instance_start >= rule.until {
            break;
        }
        if instances.len() >= MAX_RECURRENCE_INSTANCES {
            return Err(DomainError::RecurrenceTooLong {
                max_instances: MAX_RECURRENCE_INSTANCES,
            });
        }
        let instance_end: OffsetDateTime = instance_start
            .checked_add(duration)
            .ok_or_else(|| overflow("computing an instance end"))?;
        instances.push(RecurrenceInstance {
            index: instances.len(),
            time_range: TimeWindow::new(instance_start, instance_end)?,
        });
    }

    Ok(RecurrenceSeries {
        recurrence_group_id,
        instances,
    })
}
