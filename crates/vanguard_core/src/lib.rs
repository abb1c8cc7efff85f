//! # Vanguard Core
//!
//! Deterministic bot squad AI core for Vanguard RTS.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math in decision paths (uses fixed-point)
//!
//! This separation enables:
//! - Lockstep multiplayer (identical bot decisions across clients)
//! - Headless server builds
//! - Replay systems
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`squad`] - Squad grouping and tactical target tracking
//! - [`fsm`] - Generic squad state machine driver
//! - [`states`] - Per-domain behavior states (ground, air, navy, protection)
//! - [`fuzzy`] - Deterministic attack-or-flee evaluation
//! - [`world`] - World query surface the AI consumes
//! - [`orders`] - Order emission surface
//! - [`manager`] - Squad bookkeeping and persistence
//! - [`rng`] - Seeded deterministic randomness
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod fsm;
pub mod fuzzy;
pub mod manager;
pub mod math;
pub mod orders;
pub mod rng;
pub mod squad;
pub mod states;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::BotConfig;
    pub use crate::error::{CoreError, Result};
    pub use crate::fsm::{State, StateMachine, Transition};
    pub use crate::manager::SquadManager;
    pub use crate::math::{CellPos, Fixed, WorldPos};
    pub use crate::orders::{Order, OrderKind, OrderSink, OrderTarget};
    pub use crate::rng::DeterministicRng;
    pub use crate::squad::{BotCtx, Squad, SquadData, SquadType, Target};
    pub use crate::world::{ActorId, ActorSnapshot, PlayerId, Stance, UnitDomain, WorldView};
}
