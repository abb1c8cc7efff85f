//! Shared tactical predicates used across the domain states.

use crate::math::{dist_from_cells, CellPos, Fixed, WorldPos};
use crate::orders::Order;
use crate::squad::{BotCtx, SquadStep};
use crate::world::{closest_to, snapshots, ActorId, ActorSnapshot, PlayerId, Stance, WorldView};

/// Whether `id` is a unit this bot should consider attacking.
///
/// Husks are dead weight on the map and never preferred.
#[must_use]
pub fn is_preferred_enemy(world: &dyn WorldView, player: PlayerId, id: ActorId) -> bool {
    world
        .actor(id)
        .is_some_and(|a| !a.is_husk && world.stance(player, a.owner) == Stance::Enemy)
}

/// Preferred enemies within `radius` world units of `center`, in the
/// world's stable iteration order.
#[must_use]
pub fn preferred_enemies_in_circle(
    bot: &BotCtx<'_>,
    center: WorldPos,
    radius: Fixed,
) -> Vec<ActorId> {
    bot.world
        .actors_in_circle(center, radius)
        .into_iter()
        .filter(|&id| is_preferred_enemy(bot.world, bot.player, id))
        .collect()
}

/// The preferred enemy closest to `from`, optionally capped to a radius.
///
/// Ties are broken by the world's iteration order, never randomized.
#[must_use]
pub fn find_closest_enemy(
    bot: &BotCtx<'_>,
    from: WorldPos,
    radius: Option<Fixed>,
) -> Option<ActorId> {
    let candidates: Vec<ActorId> = match radius {
        Some(r) => preferred_enemies_in_circle(bot, from, r),
        None => bot
            .world
            .actor_ids()
            .into_iter()
            .filter(|&id| is_preferred_enemy(bot.world, bot.player, id))
            .collect(),
    };
    closest_to(bot.world, &candidates, from)
}

/// Check the surroundings of a random squad member for enemies capable
/// of fighting back, and apply the domain's flee predicate to them.
///
/// Returns false when no armed enemy is near; the predicate is only
/// consulted when there is something to be afraid of.
pub fn should_flee(
    step: &mut SquadStep<'_, '_>,
    flee: impl FnOnce(&[&ActorSnapshot]) -> bool,
) -> bool {
    if !step.squad.is_valid() {
        return false;
    }

    let squad = &mut *step.squad;
    let Some(probe) = squad.rng.pick(&squad.units).copied() else {
        return false;
    };
    let Some(probe_pos) = step.bot.world.actor(probe).map(|a| a.pos) else {
        return false;
    };

    let radius = dist_from_cells(step.bot.config.danger_scan_radius);
    let armed_enemies: Vec<ActorId> = preferred_enemies_in_circle(step.bot, probe_pos, radius)
        .into_iter()
        .filter(|&id| step.bot.world.actor(id).is_some_and(|a| a.can_attack))
        .collect();

    if armed_enemies.is_empty() {
        return false;
    }

    flee(&snapshots(step.bot.world, &armed_enemies))
}

/// A member is busy when it is already executing an attack activity.
#[must_use]
pub fn busy_attack(actor: &ActorSnapshot) -> bool {
    actor.busy_attacking
}

/// Pick a random friendly structure's cell as a retreat destination,
/// falling back to the map center when the bot has no structures left.
#[must_use]
pub fn random_own_building_cell(step: &mut SquadStep<'_, '_>) -> CellPos {
    let buildings: Vec<ActorId> = step
        .bot
        .world
        .actor_ids()
        .into_iter()
        .filter(|&id| {
            step.bot
                .world
                .actor(id)
                .is_some_and(|a| a.is_building && !a.is_husk && a.owner == step.bot.player)
        })
        .collect();

    if let Some(&choice) = step.squad.rng.pick(&buildings) {
        if let Some(actor) = step.bot.world.actor(choice) {
            return actor.cell();
        }
    }

    let (cols, rows) = step.bot.world.map_cells();
    CellPos::new(cols / 2, rows / 2)
}

/// Order every member to retreat to a random friendly structure.
pub fn go_to_random_own_building(step: &mut SquadStep<'_, '_>) {
    let cell = random_own_building_cell(step);
    for &unit in &step.squad.units {
        step.bot.orders.queue_order(Order::move_to(unit, cell));
    }
}
