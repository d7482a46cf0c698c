//! Browser surface measurement and overlay styling

use glam::Vec2;
use web_sys::{Element, HtmlElement, Window};

use crate::layout::{LayoutState, Rect, SafeInsets, SurfaceMeasurement};

/// Read the host element bounds, window size, visual-viewport insets and DPR
pub fn read_surface(window: &Window, root: Option<&Element>) -> SurfaceMeasurement {
    let inner_w = window.inner_width().ok().and_then(|v| v.as_f64()).map(|v| v as f32);
    let inner_h = window.inner_height().ok().and_then(|v| v.as_f64()).map(|v| v as f32);
    let window_size = match (inner_w, inner_h) {
        (Some(w), Some(h)) => Some(Vec2::new(w, h)),
        _ => None,
    };

    let host_rect = root.map(|el| {
        let r = el.get_bounding_client_rect();
        Rect::new(r.left() as f32, r.top() as f32, r.width() as f32, r.height() as f32)
    });

    // Best effort only; CSS env(safe-area-inset-*) remains the primary source
    let insets = window.visual_viewport().map(|vv| {
        let left = vv.offset_left() as f32;
        let top = vv.offset_top() as f32;
        let outer_w = inner_w.unwrap_or(vv.width() as f32);
        let outer_h = inner_h.unwrap_or(vv.height() as f32);
        SafeInsets {
            top,
            left,
            right: (outer_w - (left + vv.width() as f32)).max(0.0),
            bottom: (outer_h - (top + vv.height() as f32)).max(0.0),
        }
    });

    SurfaceMeasurement {
        host_rect,
        window_size,
        insets,
        device_pixel_ratio: Some(window.device_pixel_ratio() as f32),
    }
}

/// Push `--layout-*` variables and `data-layout-*` attributes onto the root
pub fn apply_layout(root: &HtmlElement, layout: &LayoutState) {
    let style = root.style();
    for (name, value) in layout.css_vars() {
        if let Err(e) = style.set_property(name, &value) {
            log::warn!("Failed to set {}: {:?}", name, e);
        }
    }
    for (name, value) in layout.data_attributes() {
        if let Err(e) = root.set_attribute(name, value) {
            log::warn!("Failed to set {}: {:?}", name, e);
        }
    }
}
