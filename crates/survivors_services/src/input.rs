//! Input abstraction and recording for replays

use serde::{Deserialize, Serialize};
use survivors_core::math::Vec2;

/// Movement intent for one tick. Each axis is bounded to `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    move_x: f32,
    move_y: f32,
}

impl InputState {
    /// Out-of-range axes are clamped; NaN reads as no input.
    pub fn new(move_x: f32, move_y: f32) -> Self {
        Self {
            move_x: clamp_axis(move_x),
            move_y: clamp_axis(move_y),
        }
    }

    pub fn move_vector(&self) -> Vec2 {
        Vec2::new(self.move_x, self.move_y)
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Supplies the movement vector once per tick.
pub trait InputSource: Send {
    fn poll(&mut self, tick: u64) -> InputState;
}

impl<F> InputSource for F
where
    F: FnMut(u64) -> InputState + Send,
{
    fn poll(&mut self, tick: u64) -> InputState {
        self(tick)
    }
}

/// Prerecorded input, one state per tick. Ticks past the end hold the last
/// state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputRecording {
    frames: Vec<InputState>,
}

impl InputRecording {
    pub fn new(frames: Vec<InputState>) -> Self {
        Self { frames }
    }

    pub fn push(&mut self, state: InputState) {
        self.frames.push(state);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Parse a recording saved as JSON. Frames are clamped on load.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let recording: Self = serde_json::from_str(text)?;
        let frames = recording
            .frames
            .into_iter()
            .map(|frame| InputState::new(frame.move_x, frame.move_y))
            .collect();
        Ok(Self { frames })
    }
}

impl InputSource for InputRecording {
    fn poll(&mut self, tick: u64) -> InputState {
        let index = usize::try_from(tick).unwrap_or(usize::MAX);
        self.frames
            .get(index)
            .or_else(|| self.frames.last())
            .copied()
            .unwrap_or_default()
    }
}
