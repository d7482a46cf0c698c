//! Adaptive viewport/camera engine
//!
//! Pure function of a raw surface measurement; knows nothing about the run.

mod css;
pub mod engine;
pub mod projection;
pub mod publisher;

pub use engine::{
    Bucket, CameraTransform, FooterVariant, GameplayTokens, LandscapeBudgets, LayoutConfig,
    LayoutState, Orientation, OverlayMode, PlayerAnchorRatios, Rect, SafeInsets, SpawnBudget,
    SurfaceMeasurement, UiDensity, UiTokens, Zones, measure,
};
pub use projection::{page_to_world, screen_to_world, world_len_to_screen, world_to_screen};
pub use publisher::LayoutPublisher;
