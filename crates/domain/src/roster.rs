// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Roster slot configuration and automatic assignment.
//!
//! ## Assignment Rules (Authoritative)
//!
//! Signups are processed in arrival order (signup time, then signup id).
//! Each signup is placed into the first role with remaining capacity among:
//! 1. Its primary (declared) role
//! 2. Each preferred role, in listed order
//! 3. `flex`, for `mmo` configurations
//!
//! Otherwise it stays in the pool (the implicit waitlist).
//!
//! ## Invariants
//!
//! - `(slot, position)` is unique among placed assignments
//! - Positions are 1-based and the automatic pass fills the lowest free one
//! - A role with a zero (or absent) count takes no automatic placements, and
//!   signups whose primary role is zero-count stay in the pool regardless of
//!   their preferences
//! - `bench` is an unbounded display bucket and never counts toward capacity
//! - The automatic pass never sets `is_override`

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::str::FromStr;
use time::OffsetDateTime;

/// The kind of slot configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotConfigType {
    /// Role-based MMO raid composition.
    Mmo,
    /// Plain player list with an overflow bench.
    Generic,
}

impl SlotConfigType {
    /// Converts this type to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mmo => "mmo",
            Self::Generic => "generic",
        }
    }

    /// Returns whether `role` belongs to this configuration type.
    #[must_use]
    pub const fn supports(&self, role: RosterRole) -> bool {
        match self {
            Self::Mmo => matches!(
                role,
                RosterRole::Tank | RosterRole::Healer | RosterRole::Dps | RosterRole::Flex
            ),
            Self::Generic => matches!(role, RosterRole::Player | RosterRole::Bench),
        }
    }
}

impl FromStr for SlotConfigType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mmo" => Ok(Self::Mmo),
            "generic" => Ok(Self::Generic),
            _ => Err(DomainError::InvalidSlotConfigType(s.to_string())),
        }
    }
}

impl std::fmt::Display for SlotConfigType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A roster role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterRole {
    /// MMO tank.
    Tank,
    /// MMO healer.
    Healer,
    /// MMO damage dealer.
    Dps,
    /// MMO flexible slot.
    Flex,
    /// Generic player.
    Player,
    /// Generic overflow bench.
    Bench,
}

impl RosterRole {
    /// Converts this role to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tank => "tank",
            Self::Healer => "healer",
            Self::Dps => "dps",
            Self::Flex => "flex",
            Self::Player => "player",
            Self::Bench => "bench",
        }
    }
}

impl FromStr for RosterRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tank" => Ok(Self::Tank),
            "healer" => Ok(Self::Healer),
            "dps" => Ok(Self::Dps),
            "flex" => Ok(Self::Flex),
            "player" => Ok(Self::Player),
            "bench" => Ok(Self::Bench),
            _ => Err(DomainError::InvalidRosterRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for RosterRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared slot counts for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSlotConfig {
    config_type: SlotConfigType,
    counts: BTreeMap<RosterRole, u32>,
}

impl RosterSlotConfig {
    /// Creates a validated slot configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any count is negative
    /// - A role does not belong to `config_type`
    /// - A count does not fit in `u32`
    pub fn new(config_type: SlotConfigType, counts: &[(RosterRole, i64)]) -> Result<Self, DomainError> {
        let mut validated: BTreeMap<RosterRole, u32> = BTreeMap::new();

        for &(role, count) in counts {
            if !config_type.supports(role) {
                return Err(DomainError::RoleNotInConfig { role, config_type });
            }
            if count < 0 {
                return Err(DomainError::NegativeSlotCount { role, count });
            }
            let count: u32 = u32::try_from(count).map_err(|_| DomainError::DateArithmeticOverflow {
                operation: format!("converting slot count for role '{role}'"),
            })?;
            validated.insert(role, count);
        }

        Ok(Self {
            config_type,
            counts: validated,
        })
    }

    /// Creates an MMO configuration.
    #[must_use]
    pub fn mmo(tank: u32, healer: u32, dps: u32, flex: u32) -> Self {
        Self {
            config_type: SlotConfigType::Mmo,
            counts: BTreeMap::from([
                (RosterRole::Tank, tank),
                (RosterRole::Healer, healer),
                (RosterRole::Dps, dps),
                (RosterRole::Flex, flex),
            ]),
        }
    }

    /// Creates a generic configuration.
    #[must_use]
    pub fn generic(player: u32, bench: u32) -> Self {
        Self {
            config_type: SlotConfigType::Generic,
            counts: BTreeMap::from([(RosterRole::Player, player), (RosterRole::Bench, bench)]),
        }
    }

    /// Returns the configuration type.
    #[must_use]
    pub const fn config_type(&self) -> SlotConfigType {
        self.config_type
    }

    /// Returns the configured count for `role` (zero when absent).
    #[must_use]
    pub fn count(&self, role: RosterRole) -> u32 {
        self.counts.get(&role).copied().unwrap_or(0)
    }

    /// Returns the declared role counts.
    #[must_use]
    pub const fn counts(&self) -> &BTreeMap<RosterRole, u32> {
        &self.counts
    }

    /// Returns the number of placeable seats, excluding the bench.
    #[must_use]
    pub fn total_capacity(&self) -> u32 {
        self.counts
            .iter()
            .filter(|(role, _)| **role != RosterRole::Bench)
            .map(|(_, count)| *count)
            .sum()
    }

    fn has_room(&self, role: RosterRole, occupied: usize) -> bool {
        if role == RosterRole::Bench {
            return true;
        }
        usize::try_from(self.count(role)).is_ok_and(|count| occupied < count)
    }
}

/// A user's registration for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signup {
    /// Canonical signup id.
    pub signup_id: i64,
    /// The registered user.
    pub user_id: i64,
    /// When the signup was made; earlier signups are placed first.
    pub signed_up_at: OffsetDateTime,
    /// Confirmed role, supplied by the caller.
    pub role: Option<RosterRole>,
    /// Additional roles the user is willing to fill, in preference order.
    pub preferred_roles: Vec<RosterRole>,
}

/// A signup's place on the roster.
///
/// `slot == None` marks a pool (waitlist) entry; its position is the pool order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterAssignment {
    /// The assigned signup.
    pub signup_id: i64,
    /// The signup's user.
    pub user_id: i64,
    /// The slot role, or `None` for the pool.
    pub slot: Option<RosterRole>,
    /// 1-based position within the slot.
    pub position: u32,
    /// Whether an administrator forced this placement.
    pub is_override: bool,
}

/// Result of an automatic assignment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterResult {
    /// Placed signups.
    pub assignments: Vec<RosterAssignment>,
    /// Unplaced signups in priority order.
    pub pool: Vec<RosterAssignment>,
}

/// A pool member chosen to fill a vacated position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionCandidate {
    /// The promoted signup.
    pub signup_id: i64,
    /// The promoted user.
    pub user_id: i64,
    /// The vacated slot.
    pub slot: RosterRole,
    /// The vacated position.
    pub position: u32,
}

/// Tracks which positions are taken per role.
#[derive(Debug, Default)]
struct Occupancy {
    taken: BTreeMap<RosterRole, BTreeSet<u32>>,
}

impl Occupancy {
    fn from_assignments(assignments: &[RosterAssignment]) -> Self {
        let mut occupancy: Self = Self::default();
        for assignment in assignments {
            if let Some(slot) = assignment.slot {
                occupancy.take(slot, assignment.position);
            }
        }
        occupancy
    }

    fn occupied(&self, role: RosterRole) -> usize {
        self.taken.get(&role).map_or(0, BTreeSet::len)
    }

    fn lowest_free(&self, role: RosterRole) -> u32 {
        let taken: Option<&BTreeSet<u32>> = self.taken.get(&role);
        let mut position: u32 = 1;
        while taken.is_some_and(|t| t.contains(&position)) {
            position += 1;
        }
        position
    }

    fn take(&mut self, role: RosterRole, position: u32) {
        self.taken.entry(role).or_default().insert(position);
    }
}

/// Returns the role a signup is primarily placed into.
fn primary_role(signup: &Signup, config: &RosterSlotConfig) -> Option<RosterRole> {
    let declared: Option<RosterRole> = signup
        .role
        .filter(|role| config.config_type().supports(*role));

    match config.config_type() {
        SlotConfigType::Generic => declared.or(Some(RosterRole::Player)),
        SlotConfigType::Mmo => declared,
    }
}

/// Returns the roles to try for a signup, in order.
fn placement_order(signup: &Signup, config: &RosterSlotConfig) -> Vec<RosterRole> {
    let primary: Option<RosterRole> = primary_role(signup, config);

    if primary.is_some_and(|role| role != RosterRole::Bench && config.count(role) == 0) {
        return Vec::new();
    }

    let mut order: Vec<RosterRole> = Vec::new();
    let candidates = primary
        .into_iter()
        .chain(signup.preferred_roles.iter().copied())
        .chain((config.config_type() == SlotConfigType::Mmo).then_some(RosterRole::Flex));

    for role in candidates {
        if config.config_type().supports(role) && !order.contains(&role) {
            order.push(role);
        }
    }

    order
}

/// Returns whether `role` is one a signup would be placed into automatically.
///
/// The bench is always eligible.
#[must_use]
pub fn is_eligible(signup: &Signup, role: RosterRole, config: &RosterSlotConfig) -> bool {
    role == RosterRole::Bench || placement_order(signup, config).contains(&role)
}

fn try_place(
    signup: &Signup,
    config: &RosterSlotConfig,
    occupancy: &mut Occupancy,
) -> Option<RosterAssignment> {
    for role in placement_order(signup, config) {
        if config.has_room(role, occupancy.occupied(role)) {
            let position: u32 = occupancy.lowest_free(role);
            occupancy.take(role, position);
            return Some(RosterAssignment {
                signup_id: signup.signup_id,
                user_id: signup.user_id,
                slot: Some(role),
                position,
                is_override: false,
            });
        }
    }
    None
}

/// Returns signups in arrival order.
#[must_use]
pub fn arrival_order(signups: &[Signup]) -> Vec<&Signup> {
    let mut ordered: Vec<&Signup> = signups.iter().collect();
    ordered.sort_by_key(|s| (s.signed_up_at, s.signup_id));
    ordered
}

/// Lists the signups not present in `placed`, as pool entries in arrival order.
#[must_use]
pub fn build_pool(signups: &[Signup], placed: &[RosterAssignment]) -> Vec<RosterAssignment> {
    let placed_ids: HashSet<i64> = placed
        .iter()
        .filter(|a| a.slot.is_some())
        .map(|a| a.signup_id)
        .collect();

    arrival_order(signups)
        .into_iter()
        .filter(|s| !placed_ids.contains(&s.signup_id))
        .zip(1_u32..)
        .map(|(signup, position)| RosterAssignment {
            signup_id: signup.signup_id,
            user_id: signup.user_id,
            slot: None,
            position,
            is_override: false,
        })
        .collect()
}

/// Runs the automatic assignment pass over all signups.
#[must_use]
pub fn assign_roster(signups: &[Signup], config: &RosterSlotConfig) -> RosterResult {
    let mut occupancy: Occupancy = Occupancy::default();

    let assignments: Vec<RosterAssignment> = arrival_order(signups)
        .into_iter()
        .filter_map(|signup| try_place(signup, config, &mut occupancy))
        .collect();
    let pool: Vec<RosterAssignment> = build_pool(signups, &assignments);

    RosterResult { assignments, pool }
}

/// Places one new signup against an existing roster.
///
/// Returns `None` when the signup belongs in the pool.
#[must_use]
pub fn place_signup(
    current: &[RosterAssignment],
    signup: &Signup,
    config: &RosterSlotConfig,
) -> Option<RosterAssignment> {
    let mut occupancy: Occupancy = Occupancy::from_assignments(current);
    try_place(signup, config, &mut occupancy)
}

/// Validates a full replacement roster submitted by an administrator.
///
/// Capacity is not enforced: administrators may overfill a role. Density is
/// not enforced either.
///
/// # Errors
///
/// Returns an error if:
/// - An entry references a signup not in `signups`
/// - A signup appears more than once
/// - A position is below 1
/// - A slot role does not belong to the configuration type
/// - Two entries claim the same `(slot, position)`
pub fn validate_assignment_batch(
    batch: &[RosterAssignment],
    config: &RosterSlotConfig,
    signups: &[Signup],
) -> Result<(), DomainError> {
    let known: HashSet<i64> = signups.iter().map(|s| s.signup_id).collect();
    let mut seen: HashSet<i64> = HashSet::new();
    let mut claims: BTreeMap<(RosterRole, u32), Vec<i64>> = BTreeMap::new();

    for entry in batch {
        if !known.contains(&entry.signup_id) {
            return Err(DomainError::UnknownSignup {
                signup_id: entry.signup_id,
            });
        }
        if !seen.insert(entry.signup_id) {
            return Err(DomainError::DuplicateRosterSignup {
                signup_id: entry.signup_id,
            });
        }
        if entry.position < 1 {
            return Err(DomainError::InvalidRosterPosition {
                signup_id: entry.signup_id,
                position: entry.position,
            });
        }
        if let Some(slot) = entry.slot {
            if !config.config_type().supports(slot) {
                return Err(DomainError::RoleNotInConfig {
                    role: slot,
                    config_type: config.config_type(),
                });
            }
            claims
                .entry((slot, entry.position))
                .or_default()
                .push(entry.signup_id);
        }
    }

    if let Some(((slot, position), signup_ids)) =
        claims.into_iter().find(|(_, ids)| ids.len() > 1)
    {
        return Err(DomainError::DuplicateRosterPosition {
            slot,
            position,
            signup_ids,
        });
    }

    Ok(())
}

/// Finds the pool member to promote into a vacated `(slot, position)`.
///
/// `placed` holds the placements left after the vacancy. The role must
/// still have room under its configured count, so a role overfilled by an
/// admin override stays as it is.
///
/// Pool entries are considered in pool order. A member qualifies when the
/// vacated role is one they would be placed into automatically. Bench
/// vacancies and zero-count roles never promote.
#[must_use]
pub fn promotion_candidate(
    vacated_slot: RosterRole,
    vacated_position: u32,
    placed: &[RosterAssignment],
    pool: &[RosterAssignment],
    signups: &[Signup],
    config: &RosterSlotConfig,
) -> Option<PromotionCandidate> {
    if vacated_slot == RosterRole::Bench || config.count(vacated_slot) == 0 {
        return None;
    }
    let occupancy: Occupancy = Occupancy::from_assignments(placed);
    if !config.has_room(vacated_slot, occupancy.occupied(vacated_slot)) {
        return None;
    }

    let mut ordered: Vec<&RosterAssignment> = pool.iter().filter(|a| a.slot.is_none()).collect();
    ordered.sort_by_key(|a| a.position);

    ordered.into_iter().find_map(|entry| {
        let signup: &Signup = signups.iter().find(|s| s.signup_id == entry.signup_id)?;
        placement_order(signup, config)
            .contains(&vacated_slot)
            .then(|| PromotionCandidate {
                signup_id: signup.signup_id,
                user_id: signup.user_id,
                slot: vacated_slot,
                position: vacated_position,
            })
    })
}
