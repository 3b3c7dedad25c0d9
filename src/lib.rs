//! Trail Arena simulation core
//!
//! A deterministic, single-threaded simulation of up to six players who
//! steer continuously across a toroidal world, each leaving a trail that
//! kills anyone who touches it. Trail is indexed in a uniform grid so every
//! collision query inspects a bounded neighbourhood.
//!
//! Hosts own the frame loop: build a `game::state::GameState`, feed key
//! events, and call `update(dt)` once per frame.

pub mod config;
pub mod game;
pub mod util;
