//! World query surface consumed by the squad AI.
//!
//! The AI never owns game state. Every tick it queries an implementation
//! of [`WorldView`] for synchronous, instantaneous snapshots that are
//! valid only for the current tick. The game simulation (or a test
//! fixture) provides the implementation.

use serde::{Deserialize, Serialize};

use crate::math::{CellPos, Fixed, WorldPos};

/// Unique identifier for live actors.
pub type ActorId = u32;

/// Unique identifier for frozen (fogged) actor impressions.
pub type FrozenActorId = u32;

/// Player slot index.
pub type PlayerId = u8;

/// Diplomatic stance between two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stance {
    /// Same team.
    Ally,
    /// Neither allied nor hostile.
    Neutral,
    /// Hostile.
    Enemy,
}

/// Movement domain of a unit, used for passability and targeting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitDomain {
    /// Ground vehicles and infantry.
    Ground,
    /// Aircraft; ignore ground terrain.
    Air,
    /// Ships; restricted to water.
    Naval,
}

/// Ammunition state for units that carry limited ammo (aircraft).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoState {
    /// Reloads without returning to a rearm structure.
    pub reloads_automatically: bool,
    /// Currently docked and rearming.
    pub rearming: bool,
    /// Has at least one shot loaded.
    pub has_ammo: bool,
    /// Fully loaded.
    pub full: bool,
}

/// Immutable per-tick snapshot of one actor.
///
/// Snapshots carry exactly the attributes the squad states and the
/// attack-or-flee evaluation read. The simulation layer fills them in
/// from its own richer representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// Actor id, stable across the actor's lifetime.
    pub id: ActorId,
    /// Owning player.
    pub owner: PlayerId,
    /// Center position in world units.
    pub pos: WorldPos,
    /// Current hit points.
    pub health: u32,
    /// Maximum hit points.
    pub max_health: u32,
    /// Movement domain.
    pub domain: UnitDomain,
    /// Static structure rather than a mobile unit.
    pub is_building: bool,
    /// Dead husk left on the map; never a valid target.
    pub is_husk: bool,
    /// Carries at least one usable weapon.
    pub can_attack: bool,
    /// Carries a weapon that can target aircraft.
    pub anti_air: bool,
    /// Structure that produces naval units.
    pub is_naval_production: bool,
    /// Nominal single-unit combat strength.
    pub attack_power: u32,
    /// Nominal movement speed in world units per tick.
    pub speed: u32,
    /// Ammo tracking for limited-ammo units.
    pub ammo: Option<AmmoState>,
    /// Already executing an attack activity this tick.
    pub busy_attacking: bool,
}

impl ActorSnapshot {
    /// A baseline mobile ground unit.
    #[must_use]
    pub fn unit(id: ActorId, owner: PlayerId, pos: WorldPos) -> Self {
        Self {
            id,
            owner,
            pos,
            health: 100,
            max_health: 100,
            domain: UnitDomain::Ground,
            is_building: false,
            is_husk: false,
            can_attack: true,
            anti_air: false,
            is_naval_production: false,
            attack_power: 10,
            speed: 64,
            ammo: None,
            busy_attacking: false,
        }
    }

    /// A baseline structure.
    #[must_use]
    pub fn building(id: ActorId, owner: PlayerId, pos: WorldPos) -> Self {
        Self {
            is_building: true,
            can_attack: false,
            speed: 0,
            ..Self::unit(id, owner, pos)
        }
    }

    /// Set the movement domain.
    #[must_use]
    pub fn with_domain(mut self, domain: UnitDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Set combat strength.
    #[must_use]
    pub fn with_power(mut self, power: u32) -> Self {
        self.attack_power = power;
        self
    }

    /// Set current and maximum health.
    #[must_use]
    pub fn with_health(mut self, health: u32, max_health: u32) -> Self {
        self.health = health;
        self.max_health = max_health;
        self
    }

    /// Mark as able to target aircraft.
    #[must_use]
    pub fn with_anti_air(mut self) -> Self {
        self.anti_air = true;
        self
    }

    /// Mark as a naval production structure.
    #[must_use]
    pub fn with_naval_production(mut self) -> Self {
        self.is_naval_production = true;
        self.is_building = true;
        self
    }

    /// Mark as a husk.
    #[must_use]
    pub fn with_husk(mut self) -> Self {
        self.is_husk = true;
        self.can_attack = false;
        self
    }

    /// Attach ammo tracking.
    #[must_use]
    pub fn with_ammo(mut self, ammo: AmmoState) -> Self {
        self.ammo = Some(ammo);
        self
    }

    /// Mark as currently attacking.
    #[must_use]
    pub fn with_busy_attacking(mut self) -> Self {
        self.busy_attacking = true;
        self
    }

    /// The cell containing this actor.
    #[must_use]
    pub fn cell(&self) -> CellPos {
        self.pos.to_cell()
    }
}

/// Synchronous world queries available to the squad AI.
///
/// Implementations must return results in a stable order: ties in
/// distance queries are broken by iteration order, never randomized,
/// so that all clients agree in lockstep.
pub trait WorldView {
    /// Resolve a live actor by id. `None` when dead or never existed.
    fn actor(&self, id: ActorId) -> Option<&ActorSnapshot>;

    /// Ids of all live actors, in stable order.
    fn actor_ids(&self) -> Vec<ActorId>;

    /// Actors whose center lies within `radius` world units of `center`,
    /// in stable order.
    fn actors_in_circle(&self, center: WorldPos, radius: Fixed) -> Vec<ActorId>;

    /// Position of a frozen actor impression, if it is still valid.
    fn frozen_actor_pos(&self, id: FrozenActorId) -> Option<WorldPos>;

    /// Whether `player` can currently see `actor`.
    fn visible_to(&self, actor: ActorId, player: PlayerId) -> bool;

    /// Whether a unit of `domain` can path from `from` to `to`.
    fn passable(&self, from: CellPos, to: CellPos, domain: UnitDomain) -> bool;

    /// Diplomatic stance of `a` towards `b`.
    fn stance(&self, a: PlayerId, b: PlayerId) -> Stance;

    /// Map size in cells (columns, rows).
    fn map_cells(&self) -> (i32, i32);
}

/// Collect snapshots for a set of actor ids, skipping dead ones.
pub fn snapshots<'w>(world: &'w dyn WorldView, ids: &[ActorId]) -> Vec<&'w ActorSnapshot> {
    ids.iter().filter_map(|&id| world.actor(id)).collect()
}

/// The id in `ids` whose actor is closest to `pos`.
///
/// Ties are broken by slice order: the first minimum wins.
pub fn closest_to(world: &dyn WorldView, ids: &[ActorId], pos: WorldPos) -> Option<ActorId> {
    let mut best: Option<(ActorId, i128)> = None;
    for &id in ids {
        let Some(actor) = world.actor(id) else {
            continue;
        };
        let dist = actor.pos.distance_squared(pos);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((id, dist)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_flags() {
        let a = ActorSnapshot::unit(1, 0, WorldPos::ZERO)
            .with_anti_air()
            .with_power(25);
        assert!(a.anti_air);
        assert_eq!(a.attack_power, 25);
        assert!(!a.is_building);

        let b = ActorSnapshot::building(2, 0, WorldPos::ZERO).with_naval_production();
        assert!(b.is_building && b.is_naval_production);
        assert!(!b.can_attack);
    }

    #[test]
    fn test_husk_cannot_attack() {
        let h = ActorSnapshot::unit(3, 1, WorldPos::ZERO).with_husk();
        assert!(h.is_husk);
        assert!(!h.can_attack);
    }
}
