//! Air squad behavior.
//!
//! Aircraft weigh anti-air presence instead of raw strength: a position
//! is safe when the defenders' anti-air count, scaled by a missile
//! multiplier, stays below the squad size. Target selection scans the
//! map for defenseless spots in a randomized (but seeded) grid order.

use crate::fsm::{State, Transition};
use crate::math::{dist_from_cells, CellPos, WorldPos};
use crate::orders::{Order, OrderTarget};
use crate::squad::{SquadStep, Target};
use crate::states::common::{
    busy_attack, find_closest_enemy, preferred_enemies_in_circle, random_own_building_cell,
    should_flee,
};
use crate::world::{snapshots, ActorId, ActorSnapshot, UnitDomain};

/// Weight applied to anti-air defenders when judging safety.
pub const MISSILE_UNIT_MULTIPLIER: usize = 3;

/// Closed state set for air squads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirState {
    /// Scan the map for a defenseless victim.
    Idle,
    /// Strike the current target.
    Attack,
    /// Rearm or retreat, then dissolve into idle.
    Flee,
}

impl AirState {
    /// State name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Attack => "attack",
            Self::Flee => "flee",
        }
    }
}

impl State<SquadStep<'_, '_>> for AirState {
    fn activate(&mut self, _step: &mut SquadStep<'_, '_>) {}

    fn tick(&mut self, step: &mut SquadStep<'_, '_>) -> Transition<Self> {
        match self {
            Self::Idle => tick_idle(step),
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

/// Count units able to shoot at aircraft. Aircraft themselves are
/// excluded; so are units with no usable weapon.
#[must_use]
pub fn count_anti_air_units(units: &[&ActorSnapshot]) -> usize {
    units
        .iter()
        .filter(|a| a.domain != UnitDomain::Air && a.can_attack && a.anti_air)
        .count()
}

/// Whether the squad can loiter near `loc` safely. Also reports a
/// random enemy found there, usable as a strike target when the spot is
/// safe but occupied.
fn near_pos_safely(step: &mut SquadStep<'_, '_>, loc: WorldPos) -> (bool, Option<ActorId>) {
    let radius = dist_from_cells(step.bot.config.danger_scan_radius);
    let enemy_ids = preferred_enemies_in_circle(step.bot, loc, radius);
    if enemy_ids.is_empty() {
        return (true, None);
    }

    let enemies = snapshots(step.bot.world, &enemy_ids);
    if count_anti_air_units(&enemies) * MISSILE_UNIT_MULTIPLIER < step.squad.units.len() {
        let detected = step.squad.rng.pick(&enemy_ids).copied();
        return (true, detected);
    }

    (false, None)
}

/// Scan the map in danger-radius-sized steps, in a seeded random order,
/// for a cell the squad can approach safely.
///
/// With `need_target` set, safe but empty cells are skipped and only a
/// safe cell with a detected enemy is returned.
fn find_safe_place(
    step: &mut SquadStep<'_, '_>,
    need_target: bool,
) -> Option<(CellPos, Option<ActorId>)> {
    let (cols, rows) = step.bot.world.map_cells();
    let stride = step.bot.config.danger_scan_radius.max(1);
    let column_count = (cols + stride - 1) / stride;
    let row_count = (rows + stride - 1) / stride;
    if column_count <= 0 || row_count <= 0 {
        return None;
    }

    let mut indices: Vec<i32> = (0..column_count * row_count).collect();
    step.squad.rng.shuffle(&mut indices);

    for i in indices {
        let cell = CellPos::new(
            (i % column_count) * stride + stride / 2,
            (i / column_count) * stride + stride / 2,
        );
        let (safe, detected) = near_pos_safely(step, cell.center());
        if safe {
            if need_target && detected.is_none() {
                continue;
            }
            return Some((cell, detected));
        }
    }

    None
}

/// An enemy sitting somewhere the squad can strike without meaningful
/// anti-air opposition.
fn find_defenseless_target(step: &mut SquadStep<'_, '_>) -> Option<ActorId> {
    find_safe_place(step, true).and_then(|(_, detected)| detected)
}

/// Air squads flee when nearby anti-air, weighted by the missile
/// multiplier, outnumbers the squad.
fn air_should_flee(step: &mut SquadStep<'_, '_>) -> bool {
    let squad_size = step.squad.units.len();
    should_flee(step, |enemies| {
        count_anti_air_units(enemies) * MISSILE_UNIT_MULTIPLIER > squad_size
    })
}

fn tick_idle(step: &mut SquadStep<'_, '_>) -> Transition<AirState> {
    if air_should_flee(step) {
        return Transition::To(AirState::Flee);
    }

    let Some(victim) = find_defenseless_target(step) else {
        return Transition::Stay;
    };
    step.squad.target = Target::Actor(victim);
    tracing::debug!(target = victim, "air squad found defenseless target");
    Transition::To(AirState::Attack)
}

fn tick_attack(step: &mut SquadStep<'_, '_>) -> Transition<AirState> {
    if !step.squad.is_target_valid(step.bot.world) {
        // Re-acquire from a random member's viewpoint.
        let squad = &mut *step.squad;
        let probe = squad.rng.pick(&squad.units).copied();
        let probe_pos = probe.and_then(|id| step.bot.world.actor(id).map(|a| a.pos));
        let replacement =
            probe_pos.and_then(|pos| find_closest_enemy(step.bot, pos, None));
        match replacement {
            Some(enemy) => step.squad.target = Target::Actor(enemy),
            None => return Transition::To(AirState::Flee),
        }
    }

    let Some(target_pos) = step.squad.target_position(step.bot.world) else {
        return Transition::Stay;
    };
    if !near_pos_safely(step, target_pos).0 {
        return Transition::To(AirState::Flee);
    }

    let Target::Actor(target) = step.squad.target else {
        return Transition::Stay;
    };
    for &unit in &step.squad.units.clone() {
        let Some(actor) = step.bot.world.actor(unit) else {
            continue;
        };
        if busy_attack(actor) {
            continue;
        }

        if let Some(ammo) = actor.ammo {
            if !ammo.reloads_automatically {
                if ammo.rearming {
                    continue;
                }
                if !ammo.has_ammo {
                    step.bot.orders.queue_order(Order::return_to_base(unit));
                    continue;
                }
            }
        }

        if actor.can_attack {
            step.bot
                .orders
                .queue_order(Order::attack(unit, OrderTarget::Actor(target)));
        }
    }

    Transition::Stay
}

fn tick_flee(step: &mut SquadStep<'_, '_>) -> Transition<AirState> {
    for &unit in &step.squad.units.clone() {
        let Some(actor) = step.bot.world.actor(unit) else {
            continue;
        };

        if let Some(ammo) = actor.ammo {
            if !ammo.reloads_automatically && !ammo.full {
                if ammo.rearming {
                    continue;
                }
                step.bot.orders.queue_order(Order::return_to_base(unit));
                continue;
            }
        }

        let cell = random_own_building_cell(step);
        step.bot.orders.queue_order(Order::move_to(unit, cell));
    }

    tracing::debug!("air squad fleeing and dissolving");
    Transition::To(AirState::Idle)
}
