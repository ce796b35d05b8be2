//! Platform abstraction layer
//!
//! Handles what the host feeds the simulation each frame:
//! - Input (polled once at the start of a frame)

pub mod input;

pub use input::{InputProvider, ScriptedInput};
