//! Squad bookkeeping: ownership, the per-tick update loop, and
//! persistence of the squad set.
//!
//! The manager owns squads; squads hold no back-reference to it. All
//! collaborators (world, order queue, config) are borrowed per tick
//! through [`BotCtx`].

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::rng::DeterministicRng;
use crate::squad::{BotCtx, Squad, SquadRecord, SquadType, Target};
use crate::world::WorldView;

/// Owns and drives all squads of one bot.
#[derive(Debug)]
pub struct SquadManager {
    squads: Vec<Squad>,
    rng: DeterministicRng,
}

impl SquadManager {
    /// Create a manager whose squads fork from `rng`.
    ///
    /// Seed `rng` from the deterministic world RNG so squad decisions
    /// replay identically on every client.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            squads: Vec::new(),
            rng,
        }
    }

    /// Create a new squad and return a handle to populate it.
    pub fn new_squad(&mut self, squad_type: SquadType) -> &mut Squad {
        self.new_squad_with_target(squad_type, Target::None)
    }

    /// Create a new squad with an initial target.
    pub fn new_squad_with_target(&mut self, squad_type: SquadType, target: Target) -> &mut Squad {
        let child = self.rng.fork();
        self.squads.push(Squad::with_target(squad_type, target, child));
        self.squads
            .last_mut()
            .unwrap_or_else(|| unreachable!("squad was just pushed"))
    }

    /// Advance every valid squad one step, then drop squads that have
    /// lost all members.
    pub fn update(&mut self, bot: &mut BotCtx<'_>) {
        for squad in &mut self.squads {
            squad.update(bot);
        }

        let before = self.squads.len();
        self.squads.retain(|s| s.data.is_valid());
        let dissolved = before - self.squads.len();
        if dissolved > 0 {
            tracing::debug!(dissolved, remaining = self.squads.len(), "squads dissolved");
        }
    }

    /// The live squads.
    #[must_use]
    pub fn squads(&self) -> &[Squad] {
        &self.squads
    }

    /// Mutable access to the live squads.
    pub fn squads_mut(&mut self) -> &mut [Squad] {
        &mut self.squads
    }

    /// Capture all squads into a persistence snapshot.
    #[must_use]
    pub fn to_snapshot(&self) -> SquadManagerSnapshot {
        SquadManagerSnapshot {
            squads: self.squads.iter().map(Squad::to_record).collect(),
        }
    }

    /// Restore squads from a snapshot, resolving members against the
    /// live world. Squads left with no resolvable members are dropped.
    pub fn restore(&mut self, snapshot: &SquadManagerSnapshot, world: &dyn WorldView) {
        self.squads.clear();
        for record in &snapshot.squads {
            let child = self.rng.fork();
            let squad = Squad::from_record(record, world, child);
            if squad.data.is_valid() {
                self.squads.push(squad);
            } else {
                tracing::debug!(squad_type = ?record.squad_type, "dropping empty squad on restore");
            }
        }
    }
}

/// Serializable snapshot of the whole squad set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadManagerSnapshot {
    /// Per-squad records.
    pub squads: Vec<SquadRecord>,
}

impl SquadManagerSnapshot {
    /// Encode to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Decode from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_squad_returns_live_handle() {
        let mut mgr = SquadManager::new(DeterministicRng::from_seed(99));
        {
            let squad = mgr.new_squad(SquadType::Assault);
            squad.data.add_member(5);
        }
        assert_eq!(mgr.squads().len(), 1);
        assert_eq!(mgr.squads()[0].data.units, vec![5]);
    }

    #[test]
    fn test_new_squads_fork_distinct_rng_streams() {
        let mut mgr = SquadManager::new(DeterministicRng::from_seed(99));
        mgr.new_squad(SquadType::Assault);
        mgr.new_squad(SquadType::Rush);

        let pool: Vec<u32> = (0..1000).collect();
        let squads = mgr.squads_mut();
        let (a, b) = squads.split_at_mut(1);
        let draws_a: Vec<u32> = (0..8)
            .filter_map(|_| a[0].data.rng.pick(&pool).copied())
            .collect();
        let draws_b: Vec<u32> = (0..8)
            .filter_map(|_| b[0].data.rng.pick(&pool).copied())
            .collect();
        assert_ne!(draws_a, draws_b);
    }
}
