//! Expeditions - timed marches from a settlement to a generated target
//!
//! ```text
//! Planning -> Marching -> Arrived -> Returning -> Completed
//!     \
//!      -> Cancelled
//! ```
//!
//! Timestamps drive `Marching -> Arrived` and `Returning -> Completed`. The
//! `Arrived -> Returning` edge needs a `BattleOutcome` from outside.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::campaign::battle::{BattleOutcome, BattleResolver};
use crate::campaign::travel;
use crate::campaign::worldgen::{GeneratedSettlement, WorldMap};
use crate::city::resource::Amounts;
use crate::city::settlement::Settlement;
use crate::core::error::{CommandRejection, GameError, NotFound};
use crate::core::types::{ExpeditionId, SettlementId, TileCoord, Timestamp};
use crate::military::unit::{army_size, Army};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpeditionKind {
    Raid,
    Siege,
    Conquer,
}

impl ExpeditionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExpeditionKind::Raid => "raid",
            ExpeditionKind::Siege => "siege",
            ExpeditionKind::Conquer => "conquer",
        }
    }
}

impl fmt::Display for ExpeditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExpeditionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raid" => Ok(ExpeditionKind::Raid),
            "siege" => Ok(ExpeditionKind::Siege),
            "conquer" => Ok(ExpeditionKind::Conquer),
            other => Err(format!("unknown expedition kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpeditionStatus {
    Planning,
    Marching,
    Arrived,
    Returning,
    Completed,
    Cancelled,
}

impl ExpeditionStatus {
    pub const ALL: [ExpeditionStatus; 6] = [
        ExpeditionStatus::Planning,
        ExpeditionStatus::Marching,
        ExpeditionStatus::Arrived,
        ExpeditionStatus::Returning,
        ExpeditionStatus::Completed,
        ExpeditionStatus::Cancelled,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExpeditionStatus::Planning => "planning",
            ExpeditionStatus::Marching => "marching",
            ExpeditionStatus::Arrived => "arrived",
            ExpeditionStatus::Returning => "returning",
            ExpeditionStatus::Completed => "completed",
            ExpeditionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExpeditionStatus::Completed | ExpeditionStatus::Cancelled
        )
    }

    /// The only edges of the state machine
    pub fn can_transition_to(&self, next: ExpeditionStatus) -> bool {
        use ExpeditionStatus::*;
        matches!(
            (self, next),
            (Planning, Marching)
                | (Planning, Cancelled)
                | (Marching, Arrived)
                | (Arrived, Returning)
                | (Returning, Completed)
        )
    }
}

impl fmt::Display for ExpeditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExpeditionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.name() == wanted)
            .ok_or_else(|| format!("unknown expedition status '{}'", s))
    }
}

/// Where the expedition is headed and what the generator placed there
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpeditionTarget {
    pub coord: TileCoord,
    pub info: GeneratedSettlement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expedition {
    pub id: ExpeditionId,
    pub kind: ExpeditionKind,
    pub status: ExpeditionStatus,
    pub origin_settlement: SettlementId,
    pub origin: TileCoord,
    pub target: ExpeditionTarget,
    /// Snapshot taken at creation
    pub army: Army,
    pub departure_time: Timestamp,
    pub arrival_time: Timestamp,
    pub return_time: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub carry_capacity: u32,
    pub loot: Option<Amounts>,
    pub losses: Army,
    pub distance: f64,
    /// Minutes per tile of the slowest unit
    pub travel_speed: f64,
    pub travel_minutes: u64,
}

/// Everything needed to plan a march
#[derive(Debug, Clone, PartialEq)]
pub struct ExpeditionRequest {
    pub target: TileCoord,
    pub army: Army,
    pub kind: ExpeditionKind,
    /// Delay before departure, in milliseconds
    pub departure_offset: u64,
}

impl ExpeditionRequest {
    pub fn new(target: TileCoord, army: Army, kind: ExpeditionKind) -> Self {
        Self {
            target,
            army,
            kind,
            departure_offset: 0,
        }
    }

    pub fn with_departure_offset(mut self, offset_ms: u64) -> Self {
        self.departure_offset = offset_ms;
        self
    }
}

/// Units of `settlement_id` tied up in expeditions that have not finished
pub fn reserved_units<'a, I>(expeditions: I, settlement_id: SettlementId) -> Army
where
    I: IntoIterator<Item = &'a Expedition>,
{
    let mut reserved = Army::new();
    for expedition in expeditions {
        if expedition.origin_settlement != settlement_id || expedition.status.is_terminal() {
            continue;
        }
        for (unit, count) in &expedition.army {
            *reserved.entry(*unit).or_insert(0) += count;
        }
    }
    reserved
}

/// Live army minus reserved units
pub fn available_army(settlement: &Settlement, reserved: &Army) -> Army {
    settlement
        .army
        .iter()
        .map(|(unit, count)| {
            let held = reserved.get(unit).copied().unwrap_or(0);
            (*unit, count.saturating_sub(held))
        })
        .filter(|(_, count)| *count > 0)
        .collect()
}

/// Validate a request and build an expedition in `Planning`
///
/// Checks run in order: non-empty army, each count against `available`, the
/// target differs from the origin, the generator has a settlement on the
/// target tile, and the departure and arrival times fit in a `Timestamp`.
pub fn plan(
    id: ExpeditionId,
    origin: &Settlement,
    available: &Army,
    request: &ExpeditionRequest,
    now: Timestamp,
    world: &mut WorldMap,
) -> Result<Expedition, GameError> {
    let army: Army = request
        .army
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(unit, count)| (*unit, *count))
        .collect();
    if army.is_empty() {
        return Err(CommandRejection::EmptyArmy.into());
    }
    for (unit, requested) in &army {
        let have = available.get(unit).copied().unwrap_or(0);
        if *requested > have {
            return Err(CommandRejection::ArmyExceedsAvailable {
                unit: *unit,
                requested: *requested,
                available: have,
            }
            .into());
        }
    }
    if request.target == origin.coord {
        return Err(CommandRejection::TargetIsOrigin(request.target).into());
    }
    let info = world
        .settlement_at(request.target)
        .ok_or(NotFound::Target(request.target))?;

    let distance = travel::distance(origin.coord, request.target);
    let travel_speed = travel::travel_speed(&army).ok_or(CommandRejection::EmptyArmy)?;
    let travel_minutes = travel::travel_minutes(distance, travel_speed);
    let out_of_range = CommandRejection::DepartureOutOfRange(request.departure_offset);
    let departure_time = now
        .checked_add(request.departure_offset)
        .ok_or_else(|| out_of_range.clone())?;
    let arrival_time = departure_time
        .checked_add(travel::leg_millis(travel_minutes))
        .ok_or(out_of_range)?;

    Ok(Expedition {
        id,
        kind: request.kind,
        status: ExpeditionStatus::Planning,
        origin_settlement: origin.id,
        origin: origin.coord,
        target: ExpeditionTarget {
            coord: request.target,
            info,
        },
        carry_capacity: travel::carry_capacity(&army),
        army,
        departure_time,
        arrival_time,
        return_time: None,
        resolved_at: None,
        loot: None,
        losses: Army::new(),
        distance,
        travel_speed,
        travel_minutes,
    })
}

impl Expedition {
    fn transition(&mut self, to: ExpeditionStatus) -> Result<(), CommandRejection> {
        if !self.status.can_transition_to(to) {
            return Err(CommandRejection::InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        tracing::debug!("{} {} -> {}", self.id, self.status, to);
        self.status = to;
        Ok(())
    }

    /// `Planning -> Marching`
    pub fn confirm(&mut self) -> Result<(), CommandRejection> {
        self.transition(ExpeditionStatus::Marching)
    }

    /// `Planning -> Cancelled`. The caller drops the expedition afterwards.
    pub fn cancel(&mut self) -> Result<(), CommandRejection> {
        self.transition(ExpeditionStatus::Cancelled)
    }

    /// `Marching -> Arrived` once the arrival time has passed
    pub fn arrive(&mut self, now: Timestamp) -> bool {
        self.status == ExpeditionStatus::Marching
            && now >= self.arrival_time
            && self.transition(ExpeditionStatus::Arrived).is_ok()
    }

    /// `Arrived -> Returning` with the fight's result
    ///
    /// Loot is capped at the carry capacity and losses at the snapshot's
    /// head counts. The return leg starts at `resolved_at`.
    pub fn attach_outcome(
        &mut self,
        outcome: BattleOutcome,
        resolved_at: Timestamp,
    ) -> Result<(), CommandRejection> {
        self.transition(ExpeditionStatus::Returning)?;

        let losses: Army = outcome
            .losses
            .iter()
            .filter_map(|(unit, lost)| {
                let sent = self.army.get(unit).copied().unwrap_or(0);
                let lost = (*lost).min(sent);
                (lost > 0).then_some((*unit, lost))
            })
            .collect();

        self.loot = Some(travel::cap_loot(&outcome.loot, self.carry_capacity));
        self.losses = losses;
        self.resolved_at = Some(resolved_at);
        self.return_time = Some(resolved_at.saturating_add(travel::leg_millis(self.travel_minutes)));
        Ok(())
    }

    /// `Returning -> Completed` once the return time has passed
    pub fn complete(&mut self, now: Timestamp) -> bool {
        let due = self.return_time.map_or(false, |t| now >= t);
        self.status == ExpeditionStatus::Returning
            && due
            && self.transition(ExpeditionStatus::Completed).is_ok()
    }

    /// Follow every edge `now` allows, asking `resolver` for outcomes on arrival
    ///
    /// A resolver outcome is treated as settled at the arrival time, so a long
    /// gap can carry an expedition from `Marching` to `Completed` in one call.
    pub fn advance(
        &mut self,
        now: Timestamp,
        resolver: Option<&dyn BattleResolver>,
    ) -> Vec<ExpeditionStatus> {
        let mut reached = Vec::new();
        if self.arrive(now) {
            reached.push(ExpeditionStatus::Arrived);
        }
        if self.status == ExpeditionStatus::Arrived {
            if let Some(outcome) = resolver.and_then(|r| r.resolve_battle(self)) {
                if self.attach_outcome(outcome, self.arrival_time).is_ok() {
                    reached.push(ExpeditionStatus::Returning);
                }
            }
        }
        if self.complete(now) {
            reached.push(ExpeditionStatus::Completed);
        }
        reached
    }

    /// Units that made it home, or are expected to
    pub fn survivors(&self) -> Army {
        self.army
            .iter()
            .map(|(unit, sent)| {
                let lost = self.losses.get(unit).copied().unwrap_or(0);
                (*unit, sent.saturating_sub(lost))
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Head count of the army that set out
    pub fn size(&self) -> u32 {
        army_size(&self.army)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::battle::ScriptedResolver;
    use crate::campaign::worldgen::{generate_chunk, ChunkCoord};
    use crate::city::resource::ResourceType;
    use crate::core::types::MILLIS_PER_MINUTE;
    use crate::military::unit::UnitType;

    fn target() -> GeneratedSettlement {
        generate_chunk(ChunkCoord::new(3, 0)).remove(0)
    }

    fn home() -> Settlement {
        Settlement::new(SettlementId(1), "Ashford".into(), TileCoord::new(0, 0), 0)
            .with_units(UnitType::LightCavalry, 10)
            .with_units(UnitType::Ram, 2)
    }

    fn army(units: &[(UnitType, u32)]) -> Army {
        units.iter().copied().collect()
    }

    fn planned(units: &[(UnitType, u32)]) -> Expedition {
        let s = home();
        let request = ExpeditionRequest::new(target().coord(), army(units), ExpeditionKind::Raid);
        plan(
            ExpeditionId(1),
            &s,
            &s.army,
            &request,
            1_000,
            &mut WorldMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_plan_computes_travel() {
        let exp = planned(&[(UnitType::LightCavalry, 5)]);
        let t = target();

        assert_eq!(exp.status, ExpeditionStatus::Planning);
        assert_eq!(exp.travel_speed, 10.0);
        assert_eq!(exp.distance, TileCoord::new(0, 0).distance(&t.coord()));
        assert_eq!(
            exp.travel_minutes,
            (exp.distance * 10.0).ceil() as u64
        );
        assert_eq!(exp.departure_time, 1_000);
        assert_eq!(
            exp.arrival_time,
            1_000 + exp.travel_minutes * MILLIS_PER_MINUTE
        );
        assert!(exp.arrival_time > exp.departure_time);
        assert_eq!(exp.carry_capacity, 400);
        assert_eq!(exp.size(), 5);
        assert_eq!(exp.target.info, t);
    }

    #[test]
    fn test_plan_uses_slowest_unit() {
        let exp = planned(&[(UnitType::LightCavalry, 5), (UnitType::Ram, 1)]);
        assert_eq!(exp.travel_speed, 30.0);
    }

    #[test]
    fn test_plan_rejections() {
        let s = home();
        let mut world = WorldMap::new();
        let t = target().coord();

        let empty = ExpeditionRequest::new(t, army(&[(UnitType::Ram, 0)]), ExpeditionKind::Raid);
        assert!(matches!(
            plan(ExpeditionId(1), &s, &s.army, &empty, 0, &mut world),
            Err(GameError::InvalidCommand(CommandRejection::EmptyArmy))
        ));

        let too_many =
            ExpeditionRequest::new(t, army(&[(UnitType::Ram, 3)]), ExpeditionKind::Siege);
        assert!(matches!(
            plan(ExpeditionId(1), &s, &s.army, &too_many, 0, &mut world),
            Err(GameError::InvalidCommand(CommandRejection::ArmyExceedsAvailable {
                requested: 3,
                available: 2,
                ..
            }))
        ));

        let at_home = ExpeditionRequest::new(
            s.coord,
            army(&[(UnitType::Ram, 1)]),
            ExpeditionKind::Conquer,
        );
        assert!(matches!(
            plan(ExpeditionId(1), &s, &s.army, &at_home, 0, &mut world),
            Err(GameError::InvalidCommand(CommandRejection::TargetIsOrigin(_)))
        ));
    }

    #[test]
    fn test_plan_empty_tile_not_found() {
        let s = home();
        let mut world = WorldMap::new();
        let chunk = ChunkCoord::new(5, 5);
        let taken: Vec<_> = generate_chunk(chunk).iter().map(|g| g.coord()).collect();
        let empty = (0..16)
            .map(|dx| TileCoord::new(chunk.origin().x + dx, chunk.origin().y))
            .find(|c| !taken.contains(c))
            .unwrap();

        let request =
            ExpeditionRequest::new(empty, army(&[(UnitType::Ram, 1)]), ExpeditionKind::Raid);
        assert!(matches!(
            plan(ExpeditionId(1), &s, &s.army, &request, 0, &mut world),
            Err(GameError::NotFound(NotFound::Target(_)))
        ));
    }

    #[test]
    fn test_plan_rejects_departure_past_end_of_time() {
        let s = home();
        let mut world = WorldMap::new();
        let raid = ExpeditionRequest::new(
            target().coord(),
            army(&[(UnitType::LightCavalry, 1)]),
            ExpeditionKind::Raid,
        );

        let never = raid.clone().with_departure_offset(u64::MAX);
        assert!(matches!(
            plan(ExpeditionId(1), &s, &s.army, &never, 1_000, &mut world),
            Err(GameError::InvalidCommand(CommandRejection::DepartureOutOfRange(u64::MAX)))
        ));

        // Departure fits but the march would end past the last timestamp
        let late = raid.with_departure_offset(u64::MAX - 1_000);
        assert!(matches!(
            plan(ExpeditionId(1), &s, &s.army, &late, 1_000, &mut world),
            Err(GameError::InvalidCommand(CommandRejection::DepartureOutOfRange(_)))
        ));
    }

    #[test]
    fn test_reserved_units_reduce_availability() {
        let s = home();
        let mut exp = planned(&[(UnitType::LightCavalry, 6)]);
        let reserved = reserved_units([&exp], s.id);
        let available = available_army(&s, &reserved);
        assert_eq!(available.get(&UnitType::LightCavalry), Some(&4));

        exp.cancel().unwrap();
        assert!(reserved_units([&exp], s.id).is_empty());
    }

    #[test]
    fn test_cancel_only_from_planning() {
        let mut exp = planned(&[(UnitType::Ram, 1)]);
        exp.confirm().unwrap();
        assert_eq!(
            exp.cancel(),
            Err(CommandRejection::InvalidTransition {
                id: ExpeditionId(1),
                from: ExpeditionStatus::Marching,
                to: ExpeditionStatus::Cancelled,
            })
        );
        assert_eq!(exp.status, ExpeditionStatus::Marching);
    }

    #[test]
    fn test_full_lifecycle_with_outcome() {
        let mut exp = planned(&[(UnitType::LightCavalry, 5)]);
        exp.confirm().unwrap();

        assert!(!exp.arrive(exp.arrival_time - 1));
        assert!(exp.arrive(exp.arrival_time));
        assert_eq!(exp.status, ExpeditionStatus::Arrived);

        let outcome = BattleOutcome::new(
            Amounts::from_pairs(&[(ResourceType::Gold, 1000.0)]),
            army(&[(UnitType::LightCavalry, 9)]),
        );
        let resolved_at = exp.arrival_time + 5_000;
        exp.attach_outcome(outcome, resolved_at).unwrap();

        assert_eq!(exp.loot.unwrap()[ResourceType::Gold], 400.0);
        assert_eq!(exp.losses.get(&UnitType::LightCavalry), Some(&5));
        assert!(exp.survivors().is_empty());
        let back = resolved_at + exp.travel_minutes * MILLIS_PER_MINUTE;
        assert_eq!(exp.return_time, Some(back));

        assert!(!exp.complete(back - 1));
        assert!(exp.complete(back));
        assert_eq!(exp.status, ExpeditionStatus::Completed);
    }

    #[test]
    fn test_outcome_rejected_before_arrival() {
        let mut exp = planned(&[(UnitType::Ram, 1)]);
        exp.confirm().unwrap();
        assert!(exp.attach_outcome(BattleOutcome::empty(), 0).is_err());
        assert!(exp.loot.is_none());
    }

    #[test]
    fn test_advance_waits_without_resolver() {
        let mut exp = planned(&[(UnitType::Ram, 1)]);
        assert!(exp.advance(u64::MAX / 2, None).is_empty());

        exp.confirm().unwrap();
        let far = exp.arrival_time * 10;
        assert_eq!(exp.advance(far, None), vec![ExpeditionStatus::Arrived]);
        assert!(exp.advance(far, None).is_empty());
    }

    #[test]
    fn test_advance_cascades_with_resolver() {
        let mut exp = planned(&[(UnitType::LightCavalry, 2)]);
        exp.confirm().unwrap();
        let resolver = ScriptedResolver::new().with_outcome(exp.id, BattleOutcome::empty());
        let leg = exp.travel_minutes * MILLIS_PER_MINUTE;

        let reached = exp.advance(exp.arrival_time + leg, Some(&resolver));
        assert_eq!(
            reached,
            vec![
                ExpeditionStatus::Arrived,
                ExpeditionStatus::Returning,
                ExpeditionStatus::Completed
            ]
        );
        assert_eq!(exp.resolved_at, Some(exp.arrival_time));
    }

    #[test]
    fn test_status_transitions_are_monotonic() {
        for from in ExpeditionStatus::ALL {
            for to in ExpeditionStatus::ALL {
                if from.can_transition_to(to) {
                    assert!(!from.is_terminal());
                    assert!(!to.can_transition_to(from));
                }
            }
        }
        assert_eq!("returning".parse::<ExpeditionStatus>(), Ok(ExpeditionStatus::Returning));
    }
}
