//! End-to-end squad behavior scenarios against a scripted world.

use vanguard_core::config::BotConfig;
use vanguard_core::math::WorldPos;
use vanguard_core::orders::{Order, OrderKind, OrderTarget};
use vanguard_core::rng::DeterministicRng;
use vanguard_core::squad::{BotCtx, Squad, SquadType, Target};
use vanguard_core::world::{ActorSnapshot, UnitDomain};
use vanguard_test_utils::fixtures::MockWorld;

fn tick(world: &MockWorld, squad: &mut Squad, orders: &mut Vec<Order>) {
    let config = BotConfig::default();
    let mut bot = BotCtx {
        world,
        orders,
        config: &config,
        player: 0,
    };
    squad.update(&mut bot);
}

#[test]
fn test_ground_idle_to_attack_move_orders_all_members() {
    let mut world = MockWorld::new(64, 64);
    for i in 0..5 {
        world.add_actor(ActorSnapshot::unit(
            i,
            0,
            WorldPos::from_ints(i32::try_from(i).unwrap() * 128, 0),
        ));
    }
    let enemy_pos = WorldPos::from_ints(5000, 0);
    world.add_actor(ActorSnapshot::unit(100, 1, enemy_pos));

    let mut squad = Squad::new(SquadType::Assault, DeterministicRng::from_seed(11));
    for i in 0..5 {
        squad.data.add_member(i);
    }

    let mut orders = Vec::new();
    tick(&world, &mut squad, &mut orders);

    assert_eq!(squad.state_name(), "attack_move");
    assert_eq!(squad.data.target, Target::Actor(100));
    assert_eq!(orders.len(), 5);
    for order in &orders {
        assert_eq!(order.kind, OrderKind::AttackMove);
        assert_eq!(order.target, OrderTarget::Cell(enemy_pos.to_cell()));
    }
    let mut subjects: Vec<_> = orders.iter().map(|o| o.subject).collect();
    subjects.sort_unstable();
    assert_eq!(subjects, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_outmatched_squad_flees_then_dissolves() {
    let mut world = MockWorld::new(64, 64);
    for i in 0..3 {
        world.add_actor(ActorSnapshot::unit(
            i,
            0,
            WorldPos::from_ints(i32::try_from(i).unwrap() * 128, 0),
        ));
    }
    // Overwhelming enemy force right on top of the squad.
    for i in 0..5 {
        world.add_actor(
            ActorSnapshot::unit(100 + i, 1, WorldPos::from_ints(4000, 0)).with_power(50),
        );
    }
    let base_pos = WorldPos::from_ints(20_000, 20_000);
    world.add_actor(ActorSnapshot::building(50, 0, base_pos));

    let mut squad = Squad::new(SquadType::Assault, DeterministicRng::from_seed(11));
    for i in 0..3 {
        squad.data.add_member(i);
    }

    let mut orders = Vec::new();
    tick(&world, &mut squad, &mut orders);
    assert_eq!(squad.state_name(), "flee");
    assert!(orders.is_empty());

    tick(&world, &mut squad, &mut orders);
    assert_eq!(orders.len(), 3);
    for order in &orders {
        assert_eq!(order.kind, OrderKind::Move);
        assert_eq!(order.target, OrderTarget::Cell(base_pos.to_cell()));
    }
    // Leaving Flee dissolves the squad.
    assert!(squad.data.units.is_empty());
    assert!(!squad.data.is_valid());
    assert_eq!(squad.state_name(), "idle");
}

#[test]
fn test_protection_backoff_flees_on_fifth_invisible_tick() {
    let mut world = MockWorld::new(64, 64);
    world.add_actor(ActorSnapshot::unit(1, 0, WorldPos::ZERO));
    world.add_actor(ActorSnapshot::unit(9, 1, WorldPos::from_ints(3000, 0)));
    world.set_visible(9, false);

    let mut squad = Squad::with_target(
        SquadType::Protection,
        Target::Actor(9),
        DeterministicRng::from_seed(5),
    );
    squad.data.add_member(1);

    let mut orders = Vec::new();
    tick(&world, &mut squad, &mut orders);
    assert_eq!(squad.state_name(), "attack");

    // Backoff tolerates four consecutive invisible ticks.
    for _ in 0..4 {
        tick(&world, &mut squad, &mut orders);
        assert_eq!(squad.state_name(), "attack");
        assert!(orders.is_empty());
    }

    tick(&world, &mut squad, &mut orders);
    assert_eq!(squad.state_name(), "flee");
}

#[test]
fn test_protection_regained_visibility_issues_orders() {
    let mut world = MockWorld::new(64, 64);
    world.add_actor(ActorSnapshot::unit(1, 0, WorldPos::ZERO));
    let threat_pos = WorldPos::from_ints(3000, 0);
    world.add_actor(ActorSnapshot::unit(9, 1, threat_pos));
    world.set_visible(9, false);

    let mut squad = Squad::with_target(
        SquadType::Protection,
        Target::Actor(9),
        DeterministicRng::from_seed(5),
    );
    squad.data.add_member(1);

    let mut orders = Vec::new();
    tick(&world, &mut squad, &mut orders);
    tick(&world, &mut squad, &mut orders);
    tick(&world, &mut squad, &mut orders);
    assert_eq!(squad.state_name(), "attack");
    assert!(orders.is_empty());

    // Sight regained: members are ordered in, no backoff consumed.
    world.set_visible(9, true);
    tick(&world, &mut squad, &mut orders);
    assert_eq!(squad.state_name(), "attack");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].kind, OrderKind::AttackMove);
    assert_eq!(orders[0].target, OrderTarget::Cell(threat_pos.to_cell()));

    // Lost again: the remaining budget is spent before fleeing.
    world.set_visible(9, false);
    orders.clear();
    tick(&world, &mut squad, &mut orders);
    tick(&world, &mut squad, &mut orders);
    assert_eq!(squad.state_name(), "attack");
    tick(&world, &mut squad, &mut orders);
    assert_eq!(squad.state_name(), "flee");
}

#[test]
fn test_air_squad_avoids_anti_air_concentration() {
    let mut world = MockWorld::new(64, 64);
    for i in 0..2 {
        world.add_actor(
            ActorSnapshot::unit(i, 0, WorldPos::from_ints(i32::try_from(i).unwrap() * 128, 0))
                .with_domain(UnitDomain::Air),
        );
    }
    world.add_actor(ActorSnapshot::unit(100, 1, WorldPos::from_ints(3000, 0)).with_anti_air());

    let mut squad = Squad::new(SquadType::Air, DeterministicRng::from_seed(2));
    for i in 0..2 {
        squad.data.add_member(i);
    }

    let mut orders = Vec::new();
    tick(&world, &mut squad, &mut orders);
    assert_eq!(squad.state_name(), "flee");
}

#[test]
fn test_air_squad_strikes_defenseless_target() {
    let mut world = MockWorld::new(64, 64);
    for i in 0..2 {
        world.add_actor(
            ActorSnapshot::unit(i, 0, WorldPos::from_ints(i32::try_from(i).unwrap() * 128, 0))
                .with_domain(UnitDomain::Air),
        );
    }
    world.add_actor(ActorSnapshot::unit(100, 1, WorldPos::from_ints(5000, 5000)));

    let mut squad = Squad::new(SquadType::Air, DeterministicRng::from_seed(2));
    for i in 0..2 {
        squad.data.add_member(i);
    }

    let mut orders = Vec::new();
    tick(&world, &mut squad, &mut orders);
    assert_eq!(squad.state_name(), "attack");
    assert_eq!(squad.data.target, Target::Actor(100));

    tick(&world, &mut squad, &mut orders);
    assert_eq!(orders.len(), 2);
    for order in &orders {
        assert_eq!(order.kind, OrderKind::Attack);
        assert_eq!(order.target, OrderTarget::Actor(100));
    }
}

#[test]
fn test_air_unit_out_of_ammo_returns_to_base() {
    let mut world = MockWorld::new(64, 64);
    world.add_actor(ActorSnapshot::unit(1, 0, WorldPos::ZERO).with_domain(UnitDomain::Air));
    world.add_actor(
        ActorSnapshot::unit(2, 0, WorldPos::from_ints(128, 0))
            .with_domain(UnitDomain::Air)
            .with_ammo(vanguard_core::world::AmmoState {
                reloads_automatically: false,
                rearming: false,
                has_ammo: false,
                full: false,
            }),
    );
    world.add_actor(ActorSnapshot::unit(100, 1, WorldPos::from_ints(5000, 5000)));

    let mut squad = Squad::new(SquadType::Air, DeterministicRng::from_seed(3));
    squad.data.add_member(1);
    squad.data.add_member(2);

    let mut orders = Vec::new();
    tick(&world, &mut squad, &mut orders);
    assert_eq!(squad.state_name(), "attack");

    tick(&world, &mut squad, &mut orders);
    let by_subject = |id| orders.iter().find(|o| o.subject == id).unwrap();
    assert_eq!(by_subject(1).kind, OrderKind::Attack);
    assert_eq!(by_subject(2).kind, OrderKind::ReturnToBase);
}

#[test]
fn test_navy_prefers_reachable_enemy_shipyard() {
    let mut world = MockWorld::new(64, 64);
    for i in 0..3 {
        world.add_actor(
            ActorSnapshot::unit(i, 0, WorldPos::from_ints(i32::try_from(i).unwrap() * 128, 0))
                .with_domain(UnitDomain::Naval),
        );
    }
    // A nearer land target and a distant shipyard.
    world.add_actor(ActorSnapshot::unit(100, 1, WorldPos::from_ints(6000, 0)));
    let shipyard_pos = WorldPos::from_ints(40_000, 0);
    world.add_actor(
        ActorSnapshot::building(200, 1, shipyard_pos).with_naval_production(),
    );

    let mut squad = Squad::new(SquadType::Naval, DeterministicRng::from_seed(8));
    for i in 0..3 {
        squad.data.add_member(i);
    }

    let mut orders = Vec::new();
    tick(&world, &mut squad, &mut orders);

    assert_eq!(squad.data.target, Target::Actor(200));
    assert_eq!(squad.state_name(), "attack_move");
    for order in &orders {
        assert_eq!(order.target, OrderTarget::Cell(shipyard_pos.to_cell()));
    }
}

#[test]
fn test_navy_falls_back_when_shipyard_unreachable() {
    let mut world = MockWorld::new(64, 64);
    world.add_actor(ActorSnapshot::unit(1, 0, WorldPos::ZERO).with_domain(UnitDomain::Naval));
    world.add_actor(ActorSnapshot::unit(100, 1, WorldPos::from_ints(6000, 0)));
    world.add_actor(
        ActorSnapshot::building(200, 1, WorldPos::from_ints(40_000, 0)).with_naval_production(),
    );
    world.block_domain(UnitDomain::Naval);

    let mut squad = Squad::new(SquadType::Naval, DeterministicRng::from_seed(8));
    squad.data.add_member(1);

    let mut orders = Vec::new();
    tick(&world, &mut squad, &mut orders);

    assert_eq!(squad.data.target, Target::Actor(100));
}
