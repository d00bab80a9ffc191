//! Crate-level tests of the physical phase.
//!
//! - `integration.rs`: scripted scenarios through the [`crate::engine::Engine`]
//! - `attacks.rs`: one scripted round per attack kind
//! - `determinism.rs`: same seed, same declarations, same outcome
//! - `properties.rs`: proptest checks of the resolution invariants
//! - `helpers.rs`: unit factories and a shared packet recorder

mod determinism;
pub(crate) mod helpers;
mod integration;
mod properties;
