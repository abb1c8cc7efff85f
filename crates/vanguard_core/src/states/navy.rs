//! Naval squad behavior.
//!
//! Mirrors the ground cycle, except target acquisition exploits enemy
//! naval production: a reachable enemy shipyard far from our base is a
//! better objective than whatever happens to be nearest (which is
//! usually on land and unreachable for ships).

use crate::fsm::{State, Transition};
use crate::fuzzy::attack_or_flee;
use crate::math::{dist_from_cells, radius_squared, Fixed};
use crate::orders::{Order, OrderTarget};
use crate::squad::{SquadStep, Target};
use crate::states::common::{
    busy_attack, find_closest_enemy, go_to_random_own_building, preferred_enemies_in_circle,
    should_flee,
};
use crate::world::{closest_to, snapshots, ActorId, Stance, UnitDomain};

/// Closed state set for naval squads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavyState {
    /// Scan for a target worth committing to.
    Idle,
    /// Close on the target, keeping the squad together.
    AttackMove,
    /// Engage the current target.
    Attack,
    /// Retreat to a friendly structure and dissolve.
    Flee,
}

impl NavyState {
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

impl State<SquadStep<'_, '_>> for NavyState {
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
        if matches!(self, Self::Flee) {
            step.squad.units.clear();
        }
    }
}

/// Closest enemy for a navy squad.
///
/// Prefers a reachable enemy naval production structure when it lies
/// beyond the base radius; within that radius naval combat is imminent
/// and the plain closest enemy makes more sense.
fn find_closest_enemy_navy(step: &SquadStep<'_, '_>) -> Option<ActorId> {
    let world = step.bot.world;
    let first = step.squad.first_member(world)?;

    let shipyards: Vec<ActorId> = world
        .actor_ids()
        .into_iter()
        .filter(|&id| {
            world.actor(id).is_some_and(|a| {
                a.is_naval_production
                    && !a.is_husk
                    && world.stance(step.bot.player, a.owner) == Stance::Enemy
                    && world.passable(first.cell(), a.cell(), UnitDomain::Naval)
            })
        })
        .collect();

    if let Some(nearest) = closest_to(world, &shipyards, first.pos) {
        if let Some(yard) = world.actor(nearest) {
            let max_base = dist_from_cells(step.bot.config.max_base_radius);
            if first.pos.distance_squared(yard.pos) > radius_squared(max_base) {
                return Some(nearest);
            }
        }
    }

    find_closest_enemy(step.bot, first.pos, None)
}

fn tick_idle(step: &mut SquadStep<'_, '_>) -> Transition<NavyState> {
    if !step.squad.is_target_valid(step.bot.world) {
        let Some(enemy) = find_closest_enemy_navy(step) else {
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
        let cell = target_pos.to_cell();
        for &unit in &step.squad.units {
            step.bot.orders.queue_order(Order::attack_move(unit, cell));
        }
        tracing::debug!("navy squad committing to attack-move");
        Transition::To(NavyState::AttackMove)
    } else {
        Transition::To(NavyState::Flee)
    }
}

fn tick_attack_move(step: &mut SquadStep<'_, '_>) -> Transition<NavyState> {
    if !step.squad.is_target_valid(step.bot.world) {
        match find_closest_enemy_navy(step) {
            Some(enemy) => step.squad.target = Target::Actor(enemy),
            None => return Transition::To(NavyState::Flee),
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
            next = Transition::To(NavyState::Attack);
        } else {
            let cell = target_pos.to_cell();
            for &unit in &step.squad.units {
                step.bot.orders.queue_order(Order::attack_move(unit, cell));
            }
        }
    }

    if navy_should_flee(step) {
        return Transition::To(NavyState::Flee);
    }
    next
}

fn tick_attack(step: &mut SquadStep<'_, '_>) -> Transition<NavyState> {
    if !step.squad.is_target_valid(step.bot.world) {
        match find_closest_enemy_navy(step) {
            Some(enemy) => step.squad.target = Target::Actor(enemy),
            None => return Transition::To(NavyState::Flee),
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

    if navy_should_flee(step) {
        return Transition::To(NavyState::Flee);
    }
    Transition::Stay
}

fn tick_flee(step: &mut SquadStep<'_, '_>) -> Transition<NavyState> {
    go_to_random_own_building(step);
    tracing::debug!("navy squad fleeing and dissolving");
    Transition::To(NavyState::Idle)
}

fn navy_should_flee(step: &mut SquadStep<'_, '_>) -> bool {
    let own_ids = step.squad.units.clone();
    let world = step.bot.world;
    should_flee(step, |enemies| {
        !attack_or_flee(&snapshots(world, &own_ids), enemies)
    })
}
