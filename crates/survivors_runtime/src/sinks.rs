//! Collaborators for running without a UI, camera or player: everything
//! they receive goes to the log.

use survivors_core::math::Vec3;
use survivors_services::{InputSource, InputState};
use survivors_sim::{CameraSink, UiSink};
use tracing::{info, trace};

pub struct LogUi;

impl UiSink for LogUi {
    fn notify_game_over(&self) {
        info!("GAME OVER");
    }

    fn update_resource_count(&self, count: i32) {
        info!(gems = count, "resource count");
    }
}

pub struct LogCamera;

impl CameraSink for LogCamera {
    fn follow(&self, position: Vec3) {
        trace!(x = position.x, y = position.y, "camera");
    }
}

/// Walks the player in a slow circle.
pub fn circling_input(ticks_per_lap: u64) -> impl InputSource {
    let lap = ticks_per_lap.max(1) as f32;
    move |tick: u64| {
        let angle = (tick as f32 / lap) * std::f32::consts::TAU;
        InputState::new(-angle.sin(), angle.cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circling_input_is_full_strength() {
        let mut input = circling_input(240);
        for tick in [0, 60, 120, 239] {
            let length = input.poll(tick).move_vector().length();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }
}
