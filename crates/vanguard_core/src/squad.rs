//! Squads: cohesive unit groups with a tactical objective.
//!
//! A squad owns its member list, its current target, a forked
//! deterministic RNG stream, and a state machine instance chosen by
//! squad type. Target validity is re-derived every tick, never cached
//! across ticks.

use serde::{Deserialize, Serialize};

use crate::config::BotConfig;
use crate::error::{CoreError, Result};
use crate::fsm::StateMachine;
use crate::math::WorldPos;
use crate::orders::OrderSink;
use crate::rng::DeterministicRng;
use crate::states::air::AirState;
use crate::states::ground::GroundState;
use crate::states::navy::NavyState;
use crate::states::protection::ProtectionState;
use crate::world::{ActorId, ActorSnapshot, FrozenActorId, PlayerId, WorldView};

/// Tactical role of a squad, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SquadType {
    /// Main ground force.
    Assault,
    /// Aircraft strike group.
    Air,
    /// Early-pressure ground force.
    Rush,
    /// Base defense group.
    Protection,
    /// Ship group.
    Naval,
}

/// What a squad is currently pursuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// No objective.
    None,
    /// A live actor.
    Actor(ActorId),
    /// A frozen actor impression under fog.
    Frozen(FrozenActorId),
    /// A fixed world position.
    Position(WorldPos),
}

/// Per-tick context threaded into every squad update.
///
/// Back-references (world, order queue, config) are borrowed here
/// instead of stored in the squad, so squads hold no owning cycles.
pub struct BotCtx<'a> {
    /// World query surface.
    pub world: &'a dyn WorldView,
    /// Destination for emitted orders.
    pub orders: &'a mut dyn OrderSink,
    /// Bot tuning values.
    pub config: &'a BotConfig,
    /// The player this bot controls.
    pub player: PlayerId,
}

/// Subject handed to squad states: the squad's data plus the tick context.
pub struct SquadStep<'a, 'c> {
    /// Mutable squad under update.
    pub squad: &'a mut SquadData,
    /// Borrowed tick context.
    pub bot: &'a mut BotCtx<'c>,
}

/// Mutable squad payload the states operate on.
#[derive(Debug)]
pub struct SquadData {
    /// Squad role.
    pub squad_type: SquadType,
    /// Member actor handles, no duplicates.
    pub units: Vec<ActorId>,
    /// Current objective.
    pub target: Target,
    /// Deterministic per-squad randomness stream.
    pub rng: DeterministicRng,
}

impl SquadData {
    /// A squad with no members is invalid and skipped on update.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.units.is_empty()
    }

    /// Add a member, ignoring duplicates.
    pub fn add_member(&mut self, id: ActorId) {
        if !self.units.contains(&id) {
            self.units.push(id);
        }
    }

    /// Remove a member if present.
    pub fn remove_member(&mut self, id: ActorId) {
        self.units.retain(|&u| u != id);
    }

    /// Whether the current target is still worth pursuing.
    ///
    /// Re-derived every tick: dead actors and expired frozen impressions
    /// invalidate the target, husks are never valid targets, and a bare
    /// position is always valid.
    #[must_use]
    pub fn is_target_valid(&self, world: &dyn WorldView) -> bool {
        match self.target {
            Target::None => false,
            Target::Actor(id) => world.actor(id).is_some_and(|a| !a.is_husk),
            Target::Frozen(id) => world.frozen_actor_pos(id).is_some(),
            Target::Position(_) => true,
        }
    }

    /// Whether the target is an actor the player can currently see.
    ///
    /// Non-actor targets are never "visible" in this sense.
    #[must_use]
    pub fn is_target_visible(&self, world: &dyn WorldView, player: PlayerId) -> bool {
        match self.target {
            Target::Actor(id) => world.visible_to(id, player),
            _ => false,
        }
    }

    /// Resolve the target actor's snapshot, if the target is a live actor.
    #[must_use]
    pub fn target_actor<'w>(&self, world: &'w dyn WorldView) -> Option<&'w ActorSnapshot> {
        match self.target {
            Target::Actor(id) => world.actor(id),
            _ => None,
        }
    }

    /// Current world position of the target, if it has one.
    #[must_use]
    pub fn target_position(&self, world: &dyn WorldView) -> Option<WorldPos> {
        match self.target {
            Target::None => None,
            Target::Actor(id) => world.actor(id).map(|a| a.pos),
            Target::Frozen(id) => world.frozen_actor_pos(id),
            Target::Position(pos) => Some(pos),
        }
    }

    /// Average position of the living members.
    #[must_use]
    pub fn center_position(&self, world: &dyn WorldView) -> WorldPos {
        let positions: Vec<WorldPos> = self
            .units
            .iter()
            .filter_map(|&id| world.actor(id).map(|a| a.pos))
            .collect();
        WorldPos::average(&positions)
    }

    /// Snapshot of the first living member, the squad's reference unit.
    #[must_use]
    pub fn first_member<'w>(&self, world: &'w dyn WorldView) -> Option<&'w ActorSnapshot> {
        self.units.iter().find_map(|&id| world.actor(id))
    }

    /// Snapshots of all living members.
    #[must_use]
    pub fn member_snapshots<'w>(&self, world: &'w dyn WorldView) -> Vec<&'w ActorSnapshot> {
        self.units
            .iter()
            .filter_map(|&id| world.actor(id))
            .collect()
    }
}

/// Domain-specific state machine instance.
#[derive(Debug)]
enum SquadFsm {
    Ground(StateMachine<GroundState>),
    Air(StateMachine<AirState>),
    Navy(StateMachine<NavyState>),
    Protection(StateMachine<ProtectionState>),
}

impl SquadFsm {
    fn initial(squad_type: SquadType) -> Self {
        match squad_type {
            SquadType::Assault | SquadType::Rush => Self::Ground(StateMachine::new(GroundState::Idle)),
            SquadType::Air => Self::Air(StateMachine::new(AirState::Idle)),
            SquadType::Naval => Self::Navy(StateMachine::new(NavyState::Idle)),
            SquadType::Protection => {
                Self::Protection(StateMachine::new(ProtectionState::Idle))
            }
        }
    }
}

/// A cohesive group of units with an owned state machine.
#[derive(Debug)]
pub struct Squad {
    /// Member list, target and randomness.
    pub data: SquadData,
    fsm: SquadFsm,
}

impl Squad {
    /// Create a squad with no target.
    ///
    /// `rng` should be forked from the bot's deterministic stream so the
    /// squad's draws are independent of sibling squads.
    #[must_use]
    pub fn new(squad_type: SquadType, rng: DeterministicRng) -> Self {
        Self::with_target(squad_type, Target::None, rng)
    }

    /// Create a squad with an initial target.
    #[must_use]
    pub fn with_target(squad_type: SquadType, target: Target, rng: DeterministicRng) -> Self {
        Self {
            data: SquadData {
                squad_type,
                units: Vec::new(),
                target,
                rng,
            },
            fsm: SquadFsm::initial(squad_type),
        }
    }

    /// Advance the squad one simulation step.
    ///
    /// A no-op for invalid (empty) squads; otherwise delegates to the
    /// active state's tick.
    pub fn update(&mut self, bot: &mut BotCtx<'_>) {
        if !self.data.is_valid() {
            return;
        }

        let mut step = SquadStep {
            squad: &mut self.data,
            bot,
        };
        match &mut self.fsm {
            SquadFsm::Ground(machine) => machine.tick(&mut step),
            SquadFsm::Air(machine) => machine.tick(&mut step),
            SquadFsm::Navy(machine) => machine.tick(&mut step),
            SquadFsm::Protection(machine) => machine.tick(&mut step),
        }
    }

    /// Name of the active state, for diagnostics.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        match &self.fsm {
            SquadFsm::Ground(m) => m.current().name(),
            SquadFsm::Air(m) => m.current().name(),
            SquadFsm::Navy(m) => m.current().name(),
            SquadFsm::Protection(m) => m.current().name(),
        }
    }

    /// Capture the squad into a persistence record.
    ///
    /// The state machine is intentionally not captured: on restore the
    /// squad re-enters its type's initial state.
    #[must_use]
    pub fn to_record(&self) -> SquadRecord {
        SquadRecord {
            squad_type: self.data.squad_type,
            units: self.data.units.clone(),
            target: self.data.target,
        }
    }

    /// Rebuild a squad from a persistence record.
    ///
    /// Members are resolved by id against the live world; ids that no
    /// longer resolve are dropped. An actor target that no longer
    /// resolves becomes [`Target::None`] (it would fail validity on the
    /// first tick anyway).
    #[must_use]
    pub fn from_record(
        record: &SquadRecord,
        world: &dyn WorldView,
        rng: DeterministicRng,
    ) -> Self {
        let mut squad = Squad::with_target(record.squad_type, record.target, rng);

        if let Target::Actor(id) = record.target {
            if world.actor(id).is_none() {
                tracing::debug!(actor = id, "dropping stale squad target on restore");
                squad.data.target = Target::None;
            }
        }

        for &id in &record.units {
            if world.actor(id).is_some() {
                squad.data.add_member(id);
            } else {
                tracing::debug!(actor = id, "dropping unknown member on restore");
            }
        }

        squad
    }
}

/// Serializable squad snapshot: type, member ids, tagged target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadRecord {
    /// Squad role.
    pub squad_type: SquadType,
    /// Member actor ids.
    pub units: Vec<ActorId>,
    /// Tagged target reference.
    pub target: Target,
}

impl SquadRecord {
    /// Encode to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Decode from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}
