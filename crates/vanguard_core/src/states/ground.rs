//! Ground squad behavior: idle scan, attack-move with regroup, attack,
//! flee-and-dissolve.

use crate::fsm::{State, Transition};
use crate::fuzzy::attack_or_flee;
use crate::math::{dist_from_cells, Fixed};
use crate::orders::{Order, OrderTarget};
use crate::squad::{SquadStep, Target};
use crate::states::common::{
    busy_attack, find_closest_enemy, go_to_random_own_building, preferred_enemies_in_circle,
    should_flee,
};
use crate::world::{closest_to, snapshots};

/// Closed state set for ground squads (Assault and Rush types).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundState {
    /// Scan for a target worth committing to.
    Idle,
    /// Close on the target, keeping the squad together.
    AttackMove,
    /// Engage the current target.
    Attack,
    /// Retreat to a friendly structure and dissolve.
    Flee,
}

impl GroundState {
    /// State name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AttackMove => "attack_move",
            Self::Attack => "attack",
            Self::Flee => "flee",
        }
    }
}

impl State<SquadStep<'_, '_>> for GroundState {
    fn activate(&mut self, _step: &mut SquadStep<'_, '_>) {}

    fn tick(&mut self, step: &mut SquadStep<'_, '_>) -> Transition<Self> {
        match self {
            Self::Idle => tick_idle(step),
            Self::AttackMove => tick_attack_move(step),
            Self::Attack => tick_attack(step),
            Self::Flee => tick_flee(step),
        }
    }

    fn deactivate(&mut self, step: &mut SquadStep<'_, '_>) {
        // A squad that ran dissolves: losing its members invalidates it.
        if matches!(self, Self::Flee) {
            step.squad.units.clear();
        }
    }
}

fn tick_idle(step: &mut SquadStep<'_, '_>) -> Transition<GroundState> {
    if !step.squad.is_target_valid(step.bot.world) {
        let Some(from) = step.squad.first_member(step.bot.world).map(|a| a.pos) else {
            return Transition::Stay;
        };
        let Some(enemy) = find_closest_enemy(step.bot, from, None) else {
            return Transition::Stay;
        };
        step.squad.target = Target::Actor(enemy);
    }

    let Some(target_pos) = step.squad.target_position(step.bot.world) else {
        return Transition::Stay;
    };

    let radius = dist_from_cells(step.bot.config.idle_scan_radius);
    let enemy_ids = preferred_enemies_in_circle(step.bot, target_pos, radius);
    if enemy_ids.is_empty() {
        return Transition::Stay;
    }

    let own = step.squad.member_snapshots(step.bot.world);
    let enemies = snapshots(step.bot.world, &enemy_ids);
    if attack_or_flee(&own, &enemies) {
        // Sufficient strength gathered: move on the nearest enemy.
        let cell = target_pos.to_cell();
        for &unit in &step.squad.units {
            step.bot.orders.queue_order(Order::attack_move(unit, cell));
        }
        tracing::debug!(squad = ?step.squad.squad_type, "ground squad committing to attack-move");
        Transition::To(GroundState::AttackMove)
    } else {
        Transition::To(GroundState::Flee)
    }
}

fn tick_attack_move(step: &mut SquadStep<'_, '_>) -> Transition<GroundState> {
    if !step.squad.is_target_valid(step.bot.world) {
        let from = step
            .squad
            .first_member(step.bot.world)
            .map_or(step.squad.center_position(step.bot.world), |a| a.pos);
        match find_closest_enemy(step.bot, from, None) {
            Some(enemy) => step.squad.target = Target::Actor(enemy),
            None => return Transition::To(GroundState::Flee),
        }
    }

    let Some(target_pos) = step.squad.target_position(step.bot.world) else {
        return Transition::Stay;
    };
    let Some(leader) = closest_to(step.bot.world, &step.squad.units, target_pos) else {
        return Transition::Stay;
    };
    let Some(leader_pos) = step.bot.world.actor(leader).map(|a| a.pos) else {
        return Transition::Stay;
    };

    // Units of different speeds drift apart while approaching; rally
    // stragglers on the leader before pressing on.
    let cohesion = dist_from_cells(i32::try_from(step.squad.units.len()).unwrap_or(i32::MAX))
        / Fixed::from_num(3);
    let near_leader = step.bot.world.actors_in_circle(leader_pos, cohesion);
    let regrouped: Vec<_> = step
        .squad
        .units
        .iter()
        .copied()
        .filter(|id| near_leader.contains(id))
        .collect();

    let mut next = Transition::Stay;
    if regrouped.len() < step.squad.units.len() {
        let leader_cell = leader_pos.to_cell();
        step.bot.orders.queue_order(Order::stop(leader));
        for &unit in &step.squad.units {
            if !regrouped.contains(&unit) {
                step.bot
                    .orders
                    .queue_order(Order::attack_move(unit, leader_cell));
            }
        }
    } else {
        let radius = dist_from_cells(step.bot.config.attack_scan_radius);
        let enemies = preferred_enemies_in_circle(step.bot, leader_pos, radius);
        if let Some(victim) = closest_to(step.bot.world, &enemies, leader_pos) {
            step.squad.target = Target::Actor(victim);
            next = Transition::To(GroundState::Attack);
        } else {
            let cell = target_pos.to_cell();
            for &unit in &step.squad.units {
                step.bot.orders.queue_order(Order::attack_move(unit, cell));
            }
        }
    }

    // Flee is re-evaluated every tick regardless of the branch taken.
    if ground_should_flee(step) {
        return Transition::To(GroundState::Flee);
    }
    next
}

fn tick_attack(step: &mut SquadStep<'_, '_>) -> Transition<GroundState> {
    if !step.squad.is_target_valid(step.bot.world) {
        let from = step
            .squad
            .first_member(step.bot.world)
            .map_or(step.squad.center_position(step.bot.world), |a| a.pos);
        match find_closest_enemy(step.bot, from, None) {
            Some(enemy) => step.squad.target = Target::Actor(enemy),
            None => return Transition::To(GroundState::Flee),
        }
    }

    let Target::Actor(target) = step.squad.target else {
        return Transition::Stay;
    };
    for &unit in &step.squad.units {
        let busy = step.bot.world.actor(unit).is_some_and(busy_attack);
        if !busy {
            step.bot
                .orders
                .queue_order(Order::attack(unit, OrderTarget::Actor(target)));
        }
    }

    if ground_should_flee(step) {
        return Transition::To(GroundState::Flee);
    }
    Transition::Stay
}

fn tick_flee(step: &mut SquadStep<'_, '_>) -> Transition<GroundState> {
    go_to_random_own_building(step);
    tracing::debug!(squad = ?step.squad.squad_type, "ground squad fleeing and dissolving");
    Transition::To(GroundState::Idle)
}

/// Ground squads flee when the fuzzy evaluation says the nearby armed
/// enemies outmatch them.
pub(crate) fn ground_should_flee(step: &mut SquadStep<'_, '_>) -> bool {
    let own_ids = step.squad.units.clone();
    let world = step.bot.world;
    should_flee(step, |enemies| {
        !attack_or_flee(&snapshots(world, &own_ids), enemies)
    })
}
