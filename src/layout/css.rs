//! CSS custom properties for the DOM overlay
//!
//! The overlay (HUD, footer, end screen) is owned by the host; it only needs the
//! layout as a flat list of `--layout-*` variables plus a few data attributes.

use super::engine::{FooterVariant, LayoutState, Orientation, OverlayMode, UiDensity};

fn px(value: f32) -> String {
    format!("{value}px")
}

impl LayoutState {
    /// Ordered `(name, value)` pairs for `style.setProperty`
    pub fn css_vars(&self) -> Vec<(&'static str, String)> {
        let screen = &self.screen_rect;
        let insets = &self.safe_insets;
        let viewport = &self.world_viewport_rect;
        let camera = &self.camera_view;
        let t = &self.camera_transform;
        let ui = &self.ui_tokens;
        let zones = &self.zones;
        let gameplay = &self.gameplay_tokens;

        let tutorial_text_screen_y =
            crate::round_px(t.offset_y + gameplay.tutorial_text_y * t.scale);
        let tutorial_hand_screen_y =
            crate::round_px(t.offset_y + gameplay.tutorial_hand_y * t.scale);

        vec![
            ("--layout-screen-x", px(screen.x)),
            ("--layout-screen-y", px(screen.y)),
            ("--layout-screen-w", px(screen.width)),
            ("--layout-screen-h", px(screen.height)),
            ("--layout-safe-top", px(insets.top)),
            ("--layout-safe-right", px(insets.right)),
            ("--layout-safe-bottom", px(insets.bottom)),
            ("--layout-safe-left", px(insets.left)),
            ("--layout-world-viewport-x", px(viewport.x)),
            ("--layout-world-viewport-y", px(viewport.y)),
            ("--layout-world-viewport-w", px(viewport.width)),
            ("--layout-world-viewport-h", px(viewport.height)),
            ("--layout-camera-world-w", camera.width.to_string()),
            ("--layout-camera-world-h", camera.height.to_string()),
            ("--layout-camera-scale", t.scale.to_string()),
            ("--layout-camera-offset-x", px(t.offset_x)),
            ("--layout-camera-offset-y", px(t.offset_y)),
            ("--layout-ui-scale", ui.ui_scale.to_string()),
            ("--layout-hud-pad-x", px(ui.hud_pad_x)),
            ("--layout-hud-pad-y", px(ui.hud_pad_y)),
            ("--layout-hud-gap", px(ui.hud_gap)),
            ("--layout-hud-heart-size", px(ui.hud_heart_size)),
            ("--layout-counter-image-w", px(ui.counter_image_w)),
            ("--layout-counter-font-size", px(ui.counter_font_size)),
            ("--layout-footer-h", px(ui.footer_height)),
            ("--layout-footer-pad-x", px(ui.footer_pad_x)),
            ("--layout-footer-pad-bottom", px(ui.footer_pad_bottom)),
            ("--layout-footer-cta-font", px(ui.footer_cta_font)),
            ("--layout-footer-cta-pad-x", px(ui.footer_cta_pad_x)),
            ("--layout-footer-cta-pad-y", px(ui.footer_cta_pad_y)),
            ("--layout-overlay-padding", px(ui.overlay_padding)),
            ("--layout-end-modal-max-w", px(ui.end_modal_max_width)),
            ("--layout-end-modal-max-h", px(ui.end_modal_max_height)),
            ("--layout-end-title-font", px(ui.end_title_font)),
            ("--layout-end-subtitle-font", px(ui.end_subtitle_font)),
            ("--layout-end-cta-font", px(ui.end_cta_font)),
            ("--layout-countdown-font", px(ui.countdown_font)),
            ("--layout-fail-image-max", px(ui.fail_image_max_size)),
            ("--layout-footer-x", px(zones.footer.x)),
            ("--layout-footer-y", px(zones.footer.y)),
            ("--layout-footer-w", px(zones.footer.width)),
            ("--layout-end-modal-x", px(zones.end_modal.x)),
            ("--layout-end-modal-y", px(zones.end_modal.y)),
            ("--layout-end-modal-w", px(zones.end_modal.width)),
            ("--layout-end-modal-h", px(zones.end_modal.height)),
            ("--layout-tutorial-text-screen-y", px(tutorial_text_screen_y)),
            ("--layout-tutorial-hand-screen-y", px(tutorial_hand_screen_y)),
        ]
    }

    /// `data-layout-*` attributes for CSS selectors
    pub fn data_attributes(&self) -> [(&'static str, &'static str); 5] {
        [
            ("data-layout-bucket", self.bucket.as_str()),
            (
                "data-layout-orientation",
                match self.orientation {
                    Orientation::Portrait => "portrait",
                    Orientation::Landscape => "landscape",
                },
            ),
            (
                "data-layout-ui-density",
                match self.ui_tokens.ui_density {
                    UiDensity::Normal => "normal",
                    UiDensity::Compact => "compact",
                },
            ),
            (
                "data-layout-footer-variant",
                match self.ui_tokens.footer_variant {
                    FooterVariant::Portrait => "portrait",
                    FooterVariant::Landscape => "landscape",
                },
            ),
            (
                "data-layout-overlay-mode",
                match self.ui_tokens.overlay_mode {
                    OverlayMode::Stack => "stack",
                    OverlayMode::CompactStack => "compact-stack",
                },
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use crate::layout::{LayoutConfig, SurfaceMeasurement, measure};

    #[test]
    fn test_css_vars_are_px_suffixed() {
        let layout = measure(
            &SurfaceMeasurement::from_size(390.0, 844.0),
            &LayoutConfig::default(),
        );
        let vars = layout.css_vars();
        let (_, width) = vars
            .iter()
            .find(|(name, _)| *name == "--layout-screen-w")
            .unwrap();
        assert_eq!(width, "390px");
        let (_, scale) = vars
            .iter()
            .find(|(name, _)| *name == "--layout-camera-scale")
            .unwrap();
        assert!(!scale.ends_with("px"));
    }

    #[test]
    fn test_data_attributes() {
        let layout = measure(
            &SurfaceMeasurement::from_size(1280.0, 800.0),
            &LayoutConfig::default(),
        );
        let attrs = layout.data_attributes();
        assert_eq!(attrs[0], ("data-layout-bucket", "landscape_regular"));
        assert_eq!(attrs[4], ("data-layout-overlay-mode", "compact-stack"));
    }
}
