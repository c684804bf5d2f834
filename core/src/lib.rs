//! Tourney Desk core: deterministic prize allocation with a
//! two-phase preview/commit protocol over a SQLite back office.

pub mod allocator;
pub mod budget;
pub mod config;
pub mod desk;
pub mod error;
pub mod hashing;
pub mod rng;
pub mod selector;
pub mod store;
pub mod types;
