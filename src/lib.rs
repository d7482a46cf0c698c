//! Finish Dash - a single-screen runner playable
//!
//! Core modules:
//! - `layout`: Adaptive viewport/camera engine (device shape → world view)
//! - `sim`: Deterministic run simulation (physics, spawns, collisions, finish gate)
//! - `platform`: Frame clock and resize coalescing for the host loop
//! - `assets`: Intrinsic asset size lookups with fallbacks
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod error;
pub mod layout;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, ConfigResult};
pub use layout::{LayoutConfig, LayoutState, measure};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Design world dimensions (world units)
    pub const DESIGN_WORLD_WIDTH: f32 = 720.0;
    pub const DESIGN_WORLD_HEIGHT: f32 = 1280.0;

    /// Distance from the bottom of the design world to the running surface
    pub const PLAYER_GROUND_OFFSET: f32 = 280.0;

    /// Camera aspect cap for the wide-landscape bucket
    pub const WIDE_CAMERA_ASPECT_CAP: f32 = 1.65;

    /// Landscape screens shorter than this (CSS px) are "short landscape"
    pub const SHORT_LANDSCAPE_MAX_HEIGHT: f32 = 460.0;

    /// Largest simulation step accepted from the frame clock (seconds)
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Frame rate that per-tick decay constants are expressed against
    pub const REFERENCE_FPS: f32 = 60.0;

    /// Default jump apex height (world units)
    pub const JUMP_HEIGHT: f32 = 300.0;
}

/// Return `value` when it is finite, otherwise `fallback`
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Return `value` when it is finite and strictly positive, otherwise `fallback`
#[inline]
pub fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

/// Round to hundredths of a pixel (keeps CSS output stable across rebuilds)
#[inline]
pub fn round_px(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_or() {
        assert_eq!(finite_or(3.0, 1.0), 3.0);
        assert_eq!(finite_or(f32::NAN, 1.0), 1.0);
        assert_eq!(finite_or(f32::INFINITY, 1.0), 1.0);
        assert_eq!(finite_or(-2.0, 1.0), -2.0);
    }

    #[test]
    fn test_positive_or() {
        assert_eq!(positive_or(0.0, 5.0), 5.0);
        assert_eq!(positive_or(-1.0, 5.0), 5.0);
        assert_eq!(positive_or(2.5, 5.0), 2.5);
    }

    #[test]
    fn test_round_px() {
        assert_eq!(round_px(1.234), 1.23);
        assert_eq!(round_px(10.0), 10.0);
    }
}
