//! Order emission surface.
//!
//! Squad states never mutate world state directly. They emit [`Order`]s
//! into an [`OrderSink`]; the simulation applies them, and in multiplayer
//! the same records are bincode-encoded into the frame payloads that
//! travel the order wire protocol.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::math::{CellPos, WorldPos};
use crate::world::{ActorId, FrozenActorId};

/// Named order verbs the squad AI issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Move towards a location, engaging targets of opportunity.
    AttackMove,
    /// Attack a specific target.
    Attack,
    /// Move without engaging.
    Move,
    /// Cancel the current activity.
    Stop,
    /// Return to a rearm/repair structure.
    ReturnToBase,
}

/// What an order is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderTarget {
    /// No target (Stop, ReturnToBase).
    None,
    /// A live actor.
    Actor(ActorId),
    /// A frozen actor impression under fog.
    Frozen(FrozenActorId),
    /// A map cell.
    Cell(CellPos),
    /// An exact world position.
    Position(WorldPos),
}

/// A single order issued to one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order verb.
    pub kind: OrderKind,
    /// Unit the order applies to.
    pub subject: ActorId,
    /// Order target.
    pub target: OrderTarget,
    /// Queue behind the unit's current activity instead of replacing it.
    pub queued: bool,
}

impl Order {
    /// Attack-move `subject` towards a cell.
    #[must_use]
    pub const fn attack_move(subject: ActorId, cell: CellPos) -> Self {
        Self {
            kind: OrderKind::AttackMove,
            subject,
            target: OrderTarget::Cell(cell),
            queued: false,
        }
    }

    /// Attack a target.
    #[must_use]
    pub const fn attack(subject: ActorId, target: OrderTarget) -> Self {
        Self {
            kind: OrderKind::Attack,
            subject,
            target,
            queued: false,
        }
    }

    /// Move to a cell without engaging.
    #[must_use]
    pub const fn move_to(subject: ActorId, cell: CellPos) -> Self {
        Self {
            kind: OrderKind::Move,
            subject,
            target: OrderTarget::Cell(cell),
            queued: false,
        }
    }

    /// Stop the unit's current activity.
    #[must_use]
    pub const fn stop(subject: ActorId) -> Self {
        Self {
            kind: OrderKind::Stop,
            subject,
            target: OrderTarget::None,
            queued: false,
        }
    }

    /// Send the unit back to base to rearm.
    #[must_use]
    pub const fn return_to_base(subject: ActorId) -> Self {
        Self {
            kind: OrderKind::ReturnToBase,
            subject,
            target: OrderTarget::None,
            queued: false,
        }
    }

    /// Encode a batch of orders into an opaque wire payload.
    pub fn encode_batch(orders: &[Order]) -> Result<Vec<u8>> {
        bincode::serialize(orders).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Decode a wire payload back into orders.
    pub fn decode_batch(payload: &[u8]) -> Result<Vec<Order>> {
        bincode::deserialize(payload).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

/// Sink for orders emitted during a squad tick.
pub trait OrderSink {
    /// Enqueue one order for later application.
    fn queue_order(&mut self, order: Order);
}

impl OrderSink for Vec<Order> {
    fn queue_order(&mut self, order: Order) {
        self.push(order);
    }
}
