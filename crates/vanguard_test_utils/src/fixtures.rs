//! World fixtures for squad AI tests.
//!
//! [`MockWorld`] is a scripted [`WorldView`] implementation: tests add
//! actor snapshots up front, mutate them between ticks, and toggle
//! visibility or passability to stage specific situations. Iteration
//! order is insertion order, which keeps distance tie-breaks stable.

use std::collections::HashSet;

use vanguard_core::math::{radius_squared, CellPos, Fixed, WorldPos};
use vanguard_core::world::{
    ActorId, ActorSnapshot, FrozenActorId, PlayerId, Stance, UnitDomain, WorldView,
};

/// Create a fixed-point value from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point value from a float (test-only convenience).
#[must_use]
pub fn fixed_f(f: f64) -> Fixed {
    Fixed::from_num(f)
}

/// Scripted world state backing the [`WorldView`] queries.
#[derive(Debug, Default)]
pub struct MockWorld {
    cols: i32,
    rows: i32,
    actors: Vec<ActorSnapshot>,
    frozen: Vec<(FrozenActorId, WorldPos)>,
    hidden: HashSet<ActorId>,
    blocked_domains: HashSet<UnitDomain>,
    neutral_players: HashSet<PlayerId>,
}

impl MockWorld {
    /// Empty world with the given map size in cells.
    #[must_use]
    pub fn new(cols: i32, rows: i32) -> Self {
        Self {
            cols,
            rows,
            ..Self::default()
        }
    }

    /// Add an actor. Ids must be unique within the fixture.
    pub fn add_actor(&mut self, actor: ActorSnapshot) {
        debug_assert!(
            self.actors.iter().all(|a| a.id != actor.id),
            "duplicate actor id in fixture"
        );
        self.actors.push(actor);
    }

    /// Remove an actor, simulating its death.
    pub fn remove_actor(&mut self, id: ActorId) {
        self.actors.retain(|a| a.id != id);
    }

    /// Mutable access to an actor, for moving or damaging it mid-test.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut ActorSnapshot> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    /// Register a frozen actor impression at a position.
    pub fn add_frozen(&mut self, id: FrozenActorId, pos: WorldPos) {
        self.frozen.retain(|&(f, _)| f != id);
        self.frozen.push((id, pos));
    }

    /// Expire a frozen actor impression.
    pub fn remove_frozen(&mut self, id: FrozenActorId) {
        self.frozen.retain(|&(f, _)| f != id);
    }

    /// Toggle whether an actor is visible (to every player).
    pub fn set_visible(&mut self, id: ActorId, visible: bool) {
        if visible {
            self.hidden.remove(&id);
        } else {
            self.hidden.insert(id);
        }
    }

    /// Make all paths impassable for a movement domain.
    pub fn block_domain(&mut self, domain: UnitDomain) {
        self.blocked_domains.insert(domain);
    }

    /// Mark a player as neutral towards everyone else.
    pub fn set_neutral(&mut self, player: PlayerId) {
        self.neutral_players.insert(player);
    }
}

impl WorldView for MockWorld {
    fn actor(&self, id: ActorId) -> Option<&ActorSnapshot> {
        self.actors.iter().find(|a| a.id == id)
    }

    fn actor_ids(&self) -> Vec<ActorId> {
        self.actors.iter().map(|a| a.id).collect()
    }

    fn actors_in_circle(&self, center: WorldPos, radius: Fixed) -> Vec<ActorId> {
        let limit = radius_squared(radius);
        self.actors
            .iter()
            .filter(|a| a.pos.distance_squared(center) <= limit)
            .map(|a| a.id)
            .collect()
    }

    fn frozen_actor_pos(&self, id: FrozenActorId) -> Option<WorldPos> {
        self.frozen
            .iter()
            .find(|&&(f, _)| f == id)
            .map(|&(_, pos)| pos)
    }

    fn visible_to(&self, actor: ActorId, _player: PlayerId) -> bool {
        !self.hidden.contains(&actor)
    }

    fn passable(&self, _from: CellPos, _to: CellPos, domain: UnitDomain) -> bool {
        !self.blocked_domains.contains(&domain)
    }

    fn stance(&self, a: PlayerId, b: PlayerId) -> Stance {
        if a == b {
            Stance::Ally
        } else if self.neutral_players.contains(&a) || self.neutral_players.contains(&b) {
            Stance::Neutral
        } else {
            Stance::Enemy
        }
    }

    fn map_cells(&self) -> (i32, i32) {
        (self.cols, self.rows)
    }
}
