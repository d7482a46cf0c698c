//! Adaptive viewport engine
//!
//! Turns one raw surface measurement into an immutable [`LayoutState`]:
//! bucket classification, safe rectangles, the capped camera view in world
//! units, the world→screen transform, and the UI/gameplay token sets.
//!
//! Policy is "fill height, crop width": the camera always spans the full design
//! height and the screen scale is `screen_height / camera_height`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigResult, require_positive};
use crate::{positive_or, round_px};

/// `min(max, max(min, v))`; never panics when the range is inverted
#[inline]
fn clamp_range(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Axis-aligned rectangle (top-left origin, y down)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Platform safe-area insets (notches, home indicators, browser chrome)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SafeInsets {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl SafeInsets {
    /// Clamp each inset to `[0, extent]`; anything non-finite becomes zero
    pub fn sanitized(self, width: f32, height: f32) -> Self {
        let fix = |v: f32, extent: f32| {
            if v.is_finite() {
                clamp_range(round_px(v), 0.0, extent)
            } else {
                0.0
            }
        };
        Self {
            top: fix(self.top, height),
            right: fix(self.right, width),
            bottom: fix(self.bottom, height),
            left: fix(self.left, width),
        }
    }
}

/// Everything the host could read about the display surface this refresh.
///
/// Fields are optional because every source is best-effort.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceMeasurement {
    /// Host element bounds in page coordinates
    pub host_rect: Option<Rect>,
    /// Platform window size, used when the host element can't be measured
    pub window_size: Option<Vec2>,
    pub insets: Option<SafeInsets>,
    pub device_pixel_ratio: Option<f32>,
}

impl SurfaceMeasurement {
    /// A host rectangle at the page origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self {
            host_rect: Some(Rect::new(0.0, 0.0, width, height)),
            ..Default::default()
        }
    }

    pub fn with_insets(mut self, insets: SafeInsets) -> Self {
        self.insets = Some(insets);
        self
    }
}

/// Device-shape classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    TallPortrait,
    RegularPortrait,
    TabletPortrait,
    ShortLandscape,
    RegularLandscape,
    WideLandscape,
}

impl Bucket {
    /// Classify by aspect ratio.
    ///
    /// Short landscape is tested before wide landscape so small landscape
    /// phones are never treated as wide desktops.
    pub fn classify(width: f32, height: f32) -> Self {
        let aspect = width / height;

        if aspect >= 1.0 && height < SHORT_LANDSCAPE_MAX_HEIGHT {
            Bucket::ShortLandscape
        } else if aspect >= 1.8 {
            Bucket::WideLandscape
        } else if aspect >= 1.0 {
            Bucket::RegularLandscape
        } else if aspect >= 0.75 {
            Bucket::TabletPortrait
        } else if aspect > 0.5 {
            Bucket::RegularPortrait
        } else {
            Bucket::TallPortrait
        }
    }

    pub fn is_landscape(self) -> bool {
        matches!(
            self,
            Bucket::ShortLandscape | Bucket::RegularLandscape | Bucket::WideLandscape
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::TallPortrait => "portrait_tall",
            Bucket::RegularPortrait => "portrait_regular",
            Bucket::TabletPortrait => "portrait_tablet",
            Bucket::ShortLandscape => "landscape_short",
            Bucket::RegularLandscape => "landscape_regular",
            Bucket::WideLandscape => "landscape_wide",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiDensity {
    Normal,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayMode {
    Stack,
    CompactStack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FooterVariant {
    Portrait,
    Landscape,
}

/// Player anchor X as a fraction of camera width, per bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerAnchorRatios {
    pub tall_portrait: f32,
    pub regular_portrait: f32,
    pub tablet_portrait: f32,
    pub short_landscape: f32,
    pub regular_landscape: f32,
    pub wide_landscape: f32,
}

impl Default for PlayerAnchorRatios {
    fn default() -> Self {
        Self {
            tall_portrait: 0.1,
            regular_portrait: 0.1,
            tablet_portrait: 0.12,
            short_landscape: 0.16,
            regular_landscape: 0.18,
            wide_landscape: 0.2,
        }
    }
}

impl PlayerAnchorRatios {
    pub fn for_bucket(&self, bucket: Bucket) -> f32 {
        match bucket {
            Bucket::TallPortrait => self.tall_portrait,
            Bucket::RegularPortrait => self.regular_portrait,
            Bucket::TabletPortrait => self.tablet_portrait,
            Bucket::ShortLandscape => self.short_landscape,
            Bucket::RegularLandscape => self.regular_landscape,
            Bucket::WideLandscape => self.wide_landscape,
        }
    }
}

/// Fixed pixel budget for one landscape bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnBudget {
    /// Pixels per spawn unit
    pub spawn_reference_px: f32,
    /// How far ahead of its threshold an entry fires
    pub spawn_lead_px: f32,
    /// How far past the camera's left edge an entity may drift before removal
    pub cleanup_behind_px: f32,
}

/// Landscape budgets, chosen empirically to cap live entity counts on wide screens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandscapeBudgets {
    pub short: SpawnBudget,
    pub regular: SpawnBudget,
    pub wide: SpawnBudget,
}

impl Default for LandscapeBudgets {
    fn default() -> Self {
        Self {
            short: SpawnBudget {
                spawn_reference_px: 1000.0,
                spawn_lead_px: 1000.0,
                cleanup_behind_px: 160.0,
            },
            regular: SpawnBudget {
                spawn_reference_px: 1150.0,
                spawn_lead_px: 1150.0,
                cleanup_behind_px: 200.0,
            },
            wide: SpawnBudget {
                spawn_reference_px: 1250.0,
                spawn_lead_px: 1250.0,
                cleanup_behind_px: 240.0,
            },
        }
    }
}

impl LandscapeBudgets {
    pub fn for_bucket(&self, bucket: Bucket) -> Option<SpawnBudget> {
        match bucket {
            Bucket::ShortLandscape => Some(self.short),
            Bucket::RegularLandscape => Some(self.regular),
            Bucket::WideLandscape => Some(self.wide),
            _ => None,
        }
    }
}

/// Layout engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub design_world_width: f32,
    pub design_world_height: f32,
    pub max_pixel_ratio: f32,
    pub player_ground_offset: f32,
    pub wide_camera_aspect_cap: f32,
    /// UI token multiplier for compact (landscape) density
    pub compact_factor: f32,
    pub jump_height: f32,
    pub player_anchor: PlayerAnchorRatios,
    pub landscape_budgets: LandscapeBudgets,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            design_world_width: DESIGN_WORLD_WIDTH,
            design_world_height: DESIGN_WORLD_HEIGHT,
            max_pixel_ratio: 2.0,
            player_ground_offset: PLAYER_GROUND_OFFSET,
            wide_camera_aspect_cap: WIDE_CAMERA_ASPECT_CAP,
            compact_factor: 0.9,
            jump_height: JUMP_HEIGHT,
            player_anchor: PlayerAnchorRatios::default(),
            landscape_budgets: LandscapeBudgets::default(),
        }
    }
}

impl LayoutConfig {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: LayoutConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        require_positive("design_world_width", self.design_world_width)?;
        require_positive("design_world_height", self.design_world_height)?;
        require_positive("max_pixel_ratio", self.max_pixel_ratio)?;
        require_positive("wide_camera_aspect_cap", self.wide_camera_aspect_cap)?;
        require_positive("compact_factor", self.compact_factor)?;
        require_positive("jump_height", self.jump_height)?;
        for budget in [
            self.landscape_budgets.short,
            self.landscape_budgets.regular,
            self.landscape_budgets.wide,
        ] {
            require_positive("landscape_budgets.spawn_reference_px", budget.spawn_reference_px)?;
            require_positive("landscape_budgets.spawn_lead_px", budget.spawn_lead_px)?;
            require_positive("landscape_budgets.cleanup_behind_px", budget.cleanup_behind_px)?;
        }
        Ok(())
    }
}

/// Uniform scale + offset mapping the camera view onto the host surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub content_screen_width: f32,
    pub content_screen_height: f32,
    pub viewport_screen_width: f32,
    pub viewport_screen_height: f32,
}

/// Scaled UI dimensions (CSS px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UiTokens {
    pub ui_scale: f32,
    pub ui_density: UiDensity,
    pub footer_variant: FooterVariant,
    pub overlay_mode: OverlayMode,
    pub hud_pad_x: f32,
    pub hud_pad_y: f32,
    pub hud_gap: f32,
    pub hud_heart_size: f32,
    pub counter_image_w: f32,
    pub counter_font_size: f32,
    pub footer_height: f32,
    pub footer_pad_x: f32,
    pub footer_pad_bottom: f32,
    pub footer_cta_font: f32,
    pub footer_cta_pad_x: f32,
    pub footer_cta_pad_y: f32,
    pub overlay_padding: f32,
    pub end_modal_max_width: f32,
    pub end_modal_max_height: f32,
    pub end_title_font: f32,
    pub end_subtitle_font: f32,
    pub end_cta_font: f32,
    pub countdown_font: f32,
    pub fail_image_max_size: f32,
}

/// Screen regions reserved for overlays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zones {
    pub hud: Rect,
    pub footer: Rect,
    pub start_overlay: Rect,
    pub end_modal: Rect,
}

/// Gameplay quantities derived from the camera (world units unless noted)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameplayTokens {
    pub runtime_world_w: f32,
    pub runtime_world_h: f32,
    pub world_to_screen_scale: f32,
    pub ground_y: f32,
    pub player_base_x: f32,
    pub player_visual_scale: f32,
    pub enemy_visual_scale: f32,
    pub obstacle_visual_scale: f32,
    /// Pixels per spawn unit
    pub spawn_reference_width: f32,
    pub spawn_lead_px: f32,
    pub cleanup_behind_px: f32,
    pub warning_label_scale: f32,
    pub tutorial_text_y: f32,
    pub tutorial_hand_y: f32,
    /// Screen px kept clear of the HUD at the top
    pub gameplay_safe_top: f32,
    /// Screen px kept clear of the footer at the bottom
    pub gameplay_safe_bottom: f32,
    pub jump_height: f32,
}

/// Immutable layout snapshot, rebuilt on every measured resize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutState {
    pub design_world: Vec2,
    pub pixel_ratio: f32,
    pub screen_rect: Rect,
    pub safe_rect: Rect,
    pub safe_insets: SafeInsets,
    pub bucket: Bucket,
    pub orientation: Orientation,
    pub world_viewport_rect: Rect,
    pub camera_view: Rect,
    pub camera_transform: CameraTransform,
    pub zones: Zones,
    pub ui_tokens: UiTokens,
    pub gameplay_tokens: GameplayTokens,
    pub wide_camera_aspect_cap: f32,
}

impl LayoutState {
    /// Camera view width / height
    pub fn camera_aspect(&self) -> f32 {
        self.camera_view.width / self.camera_view.height
    }
}

fn read_screen_rect(raw: &SurfaceMeasurement, config: &LayoutConfig) -> Rect {
    let window = raw
        .window_size
        .filter(|size| size.is_finite() && size.x > 0.0 && size.y > 0.0);
    let fallback_w = window.map_or(config.design_world_width, |s| s.x);
    let fallback_h = window.map_or(config.design_world_height, |s| s.y);

    let rect = match raw.host_rect {
        Some(rect) => rect,
        None => Rect::new(0.0, 0.0, fallback_w, fallback_h),
    };

    // A zero-area host (detached, display:none) gets a design-sized surface
    let (fallback_w, fallback_h) = if rect.width > 0.0 && rect.height > 0.0 {
        (fallback_w, fallback_h)
    } else {
        (config.design_world_width, config.design_world_height)
    };

    Rect {
        x: round_px(if rect.x.is_finite() { rect.x } else { 0.0 }),
        y: round_px(if rect.y.is_finite() { rect.y } else { 0.0 }),
        width: round_px(positive_or(rect.width, fallback_w)).max(1.0),
        height: round_px(positive_or(rect.height, fallback_h)).max(1.0),
    }
}

fn build_safe_rect(screen: Rect, insets: SafeInsets) -> Rect {
    Rect {
        x: screen.x + insets.left,
        y: screen.y + insets.top,
        width: (screen.width - insets.left - insets.right).max(1.0),
        height: (screen.height - insets.top - insets.bottom).max(1.0),
    }
}

fn camera_aspect_for_bucket(bucket: Bucket, screen_aspect: f32, cap: f32) -> f32 {
    if bucket == Bucket::WideLandscape {
        screen_aspect.min(cap)
    } else {
        screen_aspect
    }
}

fn build_camera_transform(viewport: Rect, camera_view: Rect) -> CameraTransform {
    let scale = viewport.height / camera_view.height;
    let content_width = camera_view.width * scale;

    CameraTransform {
        scale,
        offset_x: viewport.x + (viewport.width - content_width) * 0.5,
        offset_y: viewport.y,
        content_screen_width: content_width,
        content_screen_height: camera_view.height * scale,
        viewport_screen_width: viewport.width,
        viewport_screen_height: viewport.height,
    }
}

fn build_ui_tokens(safe: Rect, bucket: Bucket, compact_factor: f32) -> UiTokens {
    let landscape = bucket.is_landscape();
    let ref_scale = clamp_range(
        (safe.width / DESIGN_WORLD_WIDTH).min(safe.height / DESIGN_WORLD_HEIGHT),
        0.62,
        1.35,
    );
    let density = if landscape {
        UiDensity::Compact
    } else {
        UiDensity::Normal
    };
    let s = match density {
        UiDensity::Compact => ref_scale * compact_factor,
        UiDensity::Normal => ref_scale,
    };
    let token = |base: f32, min: f32, max: f32| round_px(clamp_range(base * s, min, max));

    let footer_height = if landscape {
        safe.height * 0.16
    } else {
        safe.height * 0.12
    };
    let modal_width = if landscape {
        clamp_range(safe.width * 0.62, 280.0, 560.0)
    } else {
        clamp_range(safe.width * 0.88, 280.0, 520.0)
    };

    UiTokens {
        ui_scale: round_px(s),
        ui_density: density,
        footer_variant: if landscape {
            FooterVariant::Landscape
        } else {
            FooterVariant::Portrait
        },
        overlay_mode: if landscape {
            OverlayMode::CompactStack
        } else {
            OverlayMode::Stack
        },
        hud_pad_x: token(14.0, 8.0, 20.0),
        hud_pad_y: token(14.0, 8.0, 20.0),
        hud_gap: token(8.0, 4.0, 10.0),
        hud_heart_size: token(24.0, 14.0, 28.0),
        counter_image_w: token(92.0, 54.0, 108.0),
        counter_font_size: token(22.0, 12.0, 24.0),
        footer_height: round_px(clamp_range(footer_height, 64.0, 156.0)),
        footer_pad_x: token(12.0, 8.0, 14.0),
        footer_pad_bottom: token(14.0, 6.0, 18.0),
        footer_cta_font: token(22.0, 10.0, 22.0),
        footer_cta_pad_x: token(18.0, 10.0, 20.0),
        footer_cta_pad_y: token(10.0, 6.0, 12.0),
        overlay_padding: token(18.0, 10.0, 28.0),
        end_modal_max_width: round_px(modal_width),
        end_modal_max_height: round_px(clamp_range(
            safe.height * 0.82,
            240.0,
            safe.height - 8.0,
        )),
        end_title_font: token(32.0, 18.0, 34.0),
        end_subtitle_font: token(20.0, 11.0, 22.0),
        end_cta_font: token(26.0, 12.0, 28.0),
        countdown_font: token(36.0, 18.0, 40.0),
        fail_image_max_size: round_px(clamp_range(
            safe.width.min(safe.height) * 0.55,
            120.0,
            420.0,
        )),
    }
}

fn build_zones(safe: Rect, ui: &UiTokens) -> Zones {
    let hud_height = round_px(clamp_range(ui.hud_heart_size * 2.2, 36.0, 72.0));
    Zones {
        hud: Rect::new(safe.x, safe.y, safe.width, hud_height),
        footer: Rect::new(
            safe.x,
            safe.y + safe.height - ui.footer_height,
            safe.width,
            ui.footer_height,
        ),
        start_overlay: safe,
        end_modal: Rect::new(
            round_px(safe.x + (safe.width - ui.end_modal_max_width) * 0.5),
            round_px(safe.y + (safe.height - ui.end_modal_max_height) * 0.5),
            ui.end_modal_max_width,
            ui.end_modal_max_height,
        ),
    }
}

fn build_gameplay_tokens(
    camera_view: Rect,
    transform: &CameraTransform,
    bucket: Bucket,
    ui: &UiTokens,
    config: &LayoutConfig,
) -> GameplayTokens {
    let compact = bucket.is_landscape();
    let camera_w = camera_view.width;
    let camera_h = camera_view.height;

    let (spawn_reference_width, spawn_lead_px, cleanup_behind_px) =
        match config.landscape_budgets.for_bucket(bucket) {
            Some(budget) => (
                budget.spawn_reference_px,
                budget.spawn_lead_px,
                budget.cleanup_behind_px,
            ),
            None => (
                camera_w,
                camera_w,
                round_px(clamp_range(camera_w * 0.15, 120.0, 360.0)),
            ),
        };

    GameplayTokens {
        runtime_world_w: camera_w,
        runtime_world_h: camera_h,
        world_to_screen_scale: transform.scale,
        ground_y: round_px(config.design_world_height - config.player_ground_offset),
        player_base_x: round_px(camera_w * config.player_anchor.for_bucket(bucket)),
        player_visual_scale: if compact { 0.96 } else { 1.0 },
        enemy_visual_scale: if compact { 0.94 } else { 1.0 },
        obstacle_visual_scale: 1.0,
        spawn_reference_width,
        spawn_lead_px,
        cleanup_behind_px,
        warning_label_scale: if compact { 0.9 } else { 1.0 },
        tutorial_text_y: round_px(camera_h * if compact { 0.52 } else { 0.57 }),
        tutorial_hand_y: round_px(camera_h * if compact { 0.71 } else { 0.74 }),
        gameplay_safe_top: round_px(ui.hud_pad_y + ui.hud_heart_size + 8.0),
        gameplay_safe_bottom: round_px(ui.footer_height + 12.0),
        jump_height: if compact {
            config.jump_height * 0.94
        } else {
            config.jump_height
        },
    }
}

/// Build a fresh layout snapshot from one raw surface measurement
pub fn measure(raw: &SurfaceMeasurement, config: &LayoutConfig) -> LayoutState {
    let screen_rect = read_screen_rect(raw, config);
    let safe_insets = raw
        .insets
        .unwrap_or_default()
        .sanitized(screen_rect.width, screen_rect.height);
    let safe_rect = build_safe_rect(screen_rect, safe_insets);

    let screen_aspect = screen_rect.width / screen_rect.height;
    let bucket = Bucket::classify(screen_rect.width, screen_rect.height);
    let orientation = if screen_aspect >= 1.0 {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };

    // Screen coordinates are relative to the host's top-left, not the page
    let world_viewport_rect = Rect::new(0.0, 0.0, screen_rect.width, screen_rect.height);

    let camera_aspect =
        camera_aspect_for_bucket(bucket, screen_aspect, config.wide_camera_aspect_cap);
    // Left edge stays anchored at world X=0; wider screens reveal more runway ahead
    let camera_view = Rect::new(
        0.0,
        0.0,
        config.design_world_height * camera_aspect,
        config.design_world_height,
    );
    let camera_transform = build_camera_transform(world_viewport_rect, camera_view);

    let ui_tokens = build_ui_tokens(safe_rect, bucket, config.compact_factor);
    let zones = build_zones(safe_rect, &ui_tokens);
    let gameplay_tokens =
        build_gameplay_tokens(camera_view, &camera_transform, bucket, &ui_tokens, config);

    let pixel_ratio = clamp_range(
        positive_or(raw.device_pixel_ratio.unwrap_or(1.0), 1.0),
        1.0,
        config.max_pixel_ratio.max(1.0),
    );

    log::debug!(
        "Layout measured: {}x{} bucket={} camera_w={:.1} scale={:.3}",
        screen_rect.width,
        screen_rect.height,
        bucket.as_str(),
        camera_view.width,
        camera_transform.scale
    );

    LayoutState {
        design_world: Vec2::new(config.design_world_width, config.design_world_height),
        pixel_ratio,
        screen_rect,
        safe_rect,
        safe_insets,
        bucket,
        orientation,
        world_viewport_rect,
        camera_view,
        camera_transform,
        zones,
        ui_tokens,
        gameplay_tokens,
        wide_camera_aspect_cap: config.wide_camera_aspect_cap,
    }
}
