//! Deterministic attack-or-flee evaluation.
//!
//! Every squad state asks the same question before committing to combat:
//! given our composition and theirs, do we fight or run? The answer must
//! be bit-identical on every client, so the evaluation is a pure
//! fixed-point function of the two unit collections. Inputs enter only
//! through sums and averages, making the result independent of
//! collection order.
//!
//! The shape is a small fuzzy rule base: relative strength and squad
//! health are graded through trapezoid memberships, a handful of rules
//! produce attack and flee activations, and the larger activation wins.

use crate::math::Fixed;
use crate::world::ActorSnapshot;

/// Centre of the relative-strength scale: 100 means parity.
const PARITY: i32 = 100;

/// Decide whether a squad can commit to attacking an enemy group.
///
/// Returns `true` to attack, `false` to flee. Side-effect-free and
/// deterministic: equal compositions always produce equal answers.
///
/// Edge cases: with no enemies in sight there is nothing to flee from
/// (`true`); an empty squad cannot fight (`false`).
#[must_use]
pub fn attack_or_flee(own: &[&ActorSnapshot], enemies: &[&ActorSnapshot]) -> bool {
    if own.is_empty() {
        return false;
    }
    if enemies.is_empty() {
        return true;
    }

    let power = relative_strength(own, enemies);
    let health = average_health_percent(own);

    // Memberships over the relative-strength axis.
    let weak = grade_down(power, Fixed::from_num(70), Fixed::from_num(PARITY));
    let even = triangle(
        power,
        Fixed::from_num(70),
        Fixed::from_num(PARITY),
        Fixed::from_num(130),
    );
    let strong = grade_up(power, Fixed::from_num(PARITY), Fixed::from_num(130));

    // Memberships over the squad-health axis.
    let hurt = grade_down(health, Fixed::from_num(30), Fixed::from_num(60));
    let healthy = grade_up(health, Fixed::from_num(40), Fixed::from_num(80));

    // Rule base:
    //   strong                -> attack
    //   even and healthy      -> attack
    //   weak                  -> flee
    //   even and hurt         -> flee
    let attack = strong.max(even.min(healthy));
    let flee = weak.max(even.min(hurt));

    attack >= flee
}

/// Combined combat strength of a group: per-unit power scaled by its
/// remaining health fraction, summed.
fn group_strength(units: &[&ActorSnapshot]) -> Fixed {
    let mut total = Fixed::ZERO;
    for unit in units {
        if !unit.can_attack {
            continue;
        }
        let power = Fixed::from_num(unit.attack_power);
        let frac = health_fraction(unit);
        total = total.saturating_add(power.saturating_mul(frac));
    }
    total
}

/// Own strength relative to enemy strength, scaled so parity is 100.
fn relative_strength(own: &[&ActorSnapshot], enemies: &[&ActorSnapshot]) -> Fixed {
    let ours = group_strength(own);
    let theirs = group_strength(enemies);

    if theirs == Fixed::ZERO {
        // Defenseless enemies: maximal advantage.
        return Fixed::from_num(2 * PARITY);
    }
    if ours == Fixed::ZERO {
        return Fixed::ZERO;
    }

    ours.saturating_mul(Fixed::from_num(PARITY)) / theirs
}

fn health_fraction(unit: &ActorSnapshot) -> Fixed {
    if unit.max_health == 0 {
        return Fixed::ZERO;
    }
    Fixed::from_num(unit.health) / Fixed::from_num(unit.max_health)
}

/// Average health of the group, 0..=100.
fn average_health_percent(units: &[&ActorSnapshot]) -> Fixed {
    if units.is_empty() {
        return Fixed::ZERO;
    }
    let mut total = Fixed::ZERO;
    for unit in units {
        total = total.saturating_add(health_fraction(unit));
    }
    total.saturating_mul(Fixed::from_num(100)) / Fixed::from_num(units.len() as i64)
}

/// 0 below `a`, 1 above `b`, linear in between.
fn grade_up(x: Fixed, a: Fixed, b: Fixed) -> Fixed {
    debug_assert!(a < b);
    if x <= a {
        Fixed::ZERO
    } else if x >= b {
        Fixed::ONE
    } else {
        (x - a) / (b - a)
    }
}

/// 1 below `a`, 0 above `b`, linear in between.
fn grade_down(x: Fixed, a: Fixed, b: Fixed) -> Fixed {
    Fixed::ONE - grade_up(x, a, b)
}

/// Peak 1 at `b`, 0 outside `(a, c)`.
fn triangle(x: Fixed, a: Fixed, b: Fixed, c: Fixed) -> Fixed {
    if x <= a || x >= c {
        Fixed::ZERO
    } else if x <= b {
        (x - a) / (b - a)
    } else {
        (c - x) / (c - b)
    }
}
