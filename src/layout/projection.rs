//! World ↔ screen point conversion
//!
//! Both directions apply the camera transform relative to the camera view's own
//! origin. Screen coordinates are relative to the host's top-left; use
//! [`page_to_world`] for pointer events reported in page coordinates.

use glam::Vec2;

use super::engine::LayoutState;

/// World point → host-relative screen point
pub fn world_to_screen(layout: &LayoutState, world: Vec2) -> Vec2 {
    let t = &layout.camera_transform;
    let view = &layout.camera_view;
    Vec2::new(
        t.offset_x + (world.x - view.x) * t.scale,
        t.offset_y + (world.y - view.y) * t.scale,
    )
}

/// Host-relative screen point → world point
pub fn screen_to_world(layout: &LayoutState, screen: Vec2) -> Vec2 {
    let t = &layout.camera_transform;
    let view = &layout.camera_view;
    Vec2::new(
        (screen.x - t.offset_x) / t.scale + view.x,
        (screen.y - t.offset_y) / t.scale + view.y,
    )
}

/// Page point (e.g. `PointerEvent.clientX/Y`) → world point
pub fn page_to_world(layout: &LayoutState, page: Vec2) -> Vec2 {
    let origin = Vec2::new(layout.screen_rect.x, layout.screen_rect.y);
    screen_to_world(layout, page - origin)
}

/// World length → screen pixels
#[inline]
pub fn world_len_to_screen(layout: &LayoutState, len: f32) -> f32 {
    len * layout.camera_transform.scale
}
