//! Battlefield Simulation Library
//!
//! A headless steering-and-combat engine for autonomous melee agents on a 2D
//! isometric battlefield. Two camps (peasants and sires) seek each other out,
//! steer along four isometric axes and trade randomized blows.
//!
//! The simulation core (`game`) is single-threaded and synchronous; the
//! binary drives it from a fixed-step frame clock and reads back
//! [`game::events::SimEvent`]s in place of a presentation layer.

pub mod config;
pub mod util;
pub mod game;
