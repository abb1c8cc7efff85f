//! Per-domain squad behavior states.
//!
//! Each unit domain defines a closed set of states; shared tactical
//! predicates live in [`common`] as free functions taking the squad
//! step, not methods on a base type.

pub mod air;
pub mod common;
pub mod ground;
pub mod navy;
pub mod protection;
