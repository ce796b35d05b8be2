//! Input providers
//!
//! The frame loop polls exactly one `FrameInput` per frame. Device polling
//! lives behind this trait; the simulation only sees the resulting snapshot.

use std::collections::VecDeque;

use crate::sim::tick::FrameInput;

/// Source of per-frame input snapshots
pub trait InputProvider {
    fn poll(&mut self) -> FrameInput;
}

impl<F> InputProvider for F
where
    F: FnMut() -> FrameInput,
{
    fn poll(&mut self) -> FrameInput {
        self()
    }
}

/// Plays back a fixed sequence of frames, then idles
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<FrameInput>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, input: FrameInput) -> &mut Self {
        self.frames.push_back(input);
        self
    }

    /// Queue the same input for `count` frames
    pub fn repeat(&mut self, input: FrameInput, count: usize) -> &mut Self {
        self.frames.extend(std::iter::repeat_n(input, count));
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputProvider for ScriptedInput {
    fn poll(&mut self) -> FrameInput {
        self.frames.pop_front().unwrap_or_default()
    }
}
