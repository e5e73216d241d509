//! Simulation core for a "collect the stars, then beat the boss" mini-game.
//!
//! The map-exploration phase (player movement, roaming enemies, bonus
//! pickups, the POI quest) and the side-view battle phase are plain data
//! plus frame-driven tick functions. Nothing in here touches a terminal,
//! a clock or a file: time, randomness and the viewport are injected so
//! every behaviour is deterministic under test.

pub mod battle;
pub mod clock;
pub mod config;
pub mod deferred;
pub mod enemies;
pub mod entities;
pub mod events;
pub mod exploration;
pub mod movement;
pub mod quest;
pub mod score;
pub mod session;
pub mod snapshot;
