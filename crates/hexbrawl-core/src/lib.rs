//! # Hexbrawl Core
//!
//! Physical-attack resolution for a hex-grid armored combat game.
//!
//! This crate takes the punches, kicks, charges, grapples and rams declared
//! in a round, decides how each one lands, applies the consequences to the
//! battlefield, and tells every player what they are allowed to know about
//! it.
//!
//! ## Architecture
//!
//! - **Arena**: units (BTreeMap by id), players, the board and pending
//!   piloting rolls
//! - **Queue**: declarations, deduplication, searchlights and pretreatment
//! - **Resolver**: one algorithm per attack kind, run in queue order
//! - **Lifecycle**: destruction and the cascade over linked units
//! - **Visibility**: double-blind unit updates and per-player report views
//! - **Services**: the damage, displacement, building, transport, sensor and
//!   broadcast collaborators, as object-safe traits with standard
//!   implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hexbrawl_core::engine::Engine;
//!
//! let mut engine = Engine::new(arena, options);
//! engine.declare(AttackAction::new(attacker, target, AttackKind::Kick { leg: LegSide::Right }));
//! engine.pretreat();
//! engine.resolve_physical_attacks();
//! engine.end_physical_phase();
//! engine.deliver_reports();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod arena;
pub mod config;
pub mod context;
pub mod damage;
pub mod dice;
pub mod engine;
pub mod entity;
pub mod error;
pub mod hit_table;
pub mod lifecycle;
pub mod queue;
pub mod report;
pub mod resolver;
pub mod services;
pub mod tohit;
pub mod visibility;

pub use action::{AttackAction, AttackKind, Target};
pub use arena::Arena;
pub use config::RuleOptions;
pub use engine::Engine;
pub use entity::{Entity, EntityId, EntityTag, PlayerId};
pub use error::{EngineError, ErrorSeverity};
pub use report::{Report, ReportLog};

#[cfg(test)]
mod tests;
