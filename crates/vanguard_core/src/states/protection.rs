//! Protection squad behavior: base defense.
//!
//! Protection squads chase threats near the base. When a tracked threat
//! slips out of sight, a backoff counter tolerates a few blind ticks
//! before the squad gives up and retreats.

use crate::fsm::{State, Transition};
use crate::math::dist_from_cells;
use crate::orders::Order;
use crate::squad::{SquadStep, Target};
use crate::states::common::{find_closest_enemy, go_to_random_own_building};

/// Invisible ticks tolerated before a protection squad gives up.
pub const BACKOFF_TICKS: i32 = 4;

/// Closed state set for protection squads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionState {
    /// Transient: immediately hands over to attack.
    Idle,
    /// Chase the nearest threat, tolerating brief loss of sight.
    Attack {
        /// Remaining invisible ticks before fleeing.
        backoff: i32,
    },
    /// Retreat to a friendly structure and dissolve.
    Flee,
}

impl ProtectionState {
    /// State name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Attack { .. } => "attack",
            Self::Flee => "flee",
        }
    }
}

impl State<SquadStep<'_, '_>> for ProtectionState {
    fn activate(&mut self, _step: &mut SquadStep<'_, '_>) {}

    fn tick(&mut self, step: &mut SquadStep<'_, '_>) -> Transition<Self> {
        match self {
            Self::Idle => Transition::To(Self::Attack {
                backoff: BACKOFF_TICKS,
            }),
            Self::Attack { backoff } => tick_attack(step, backoff),
            Self::Flee => tick_flee(step),
        }
    }

    fn deactivate(&mut self, step: &mut SquadStep<'_, '_>) {
        if matches!(self, Self::Flee) {
            step.squad.units.clear();
        }
    }
}

fn tick_attack(step: &mut SquadStep<'_, '_>, backoff: &mut i32) -> Transition<ProtectionState> {
    if !step.squad.is_target_valid(step.bot.world) {
        let center = step.squad.center_position(step.bot.world);
        let radius = dist_from_cells(step.bot.config.protection_scan_radius);
        match find_closest_enemy(step.bot, center, Some(radius)) {
            Some(threat) => step.squad.target = Target::Actor(threat),
            None => return Transition::To(ProtectionState::Flee),
        }
    }

    if !step
        .squad
        .is_target_visible(step.bot.world, step.bot.player)
    {
        // Tolerate brief loss of sight before giving up the chase.
        *backoff -= 1;
        if *backoff < 0 {
            tracing::debug!("protection squad lost its target, retreating");
            return Transition::To(ProtectionState::Flee);
        }
        return Transition::Stay;
    }

    if let Some(target_pos) = step.squad.target_position(step.bot.world) {
        let cell = target_pos.to_cell();
        for &unit in &step.squad.units {
            step.bot.orders.queue_order(Order::attack_move(unit, cell));
        }
    }

    Transition::Stay
}

fn tick_flee(step: &mut SquadStep<'_, '_>) -> Transition<ProtectionState> {
    go_to_random_own_building(step);
    Transition::To(ProtectionState::Idle)
}
