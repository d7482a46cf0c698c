//! Hitbox geometry
//!
//! Entities are positioned by their feet: `pos` is the bottom-center of the
//! visual box. Hitboxes are derived from that box and never stored.

use glam::Vec2;
use serde::Serialize;

use crate::tuning::HitboxMetrics;
use crate::{finite_or, positive_or};

/// Axis-aligned box, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Visual box for a feet-anchored entity
    pub fn from_feet(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x - size.x * 0.5, pos.y - size.y, size.x, size.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Closest point inside the box to `p`
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.x, self.right().max(self.x)),
            p.y.clamp(self.y, self.bottom().max(self.y)),
        )
    }
}

/// Overlap test; boxes that only share an edge do not intersect
pub fn intersects(a: &Aabb, b: &Aabb) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// Narrower, feet-anchored box: shrink by `scale` and keep the bottom edge
fn shrink_to_feet(pos: Vec2, size: Vec2, scale_x: f32, scale_y: f32) -> Aabb {
    Aabb::from_feet(pos, Vec2::new(size.x * scale_x, size.y * scale_y))
}

fn metrics_or_default(metrics: Option<&HitboxMetrics>) -> HitboxMetrics {
    let d = HitboxMetrics::default();
    let Some(m) = metrics else {
        return d;
    };
    HitboxMetrics {
        player_scale_x: positive_or(m.player_scale_x, d.player_scale_x),
        player_scale_y: positive_or(m.player_scale_y, d.player_scale_y),
        enemy_scale_x: positive_or(m.enemy_scale_x, d.enemy_scale_x),
        enemy_scale_y: positive_or(m.enemy_scale_y, d.enemy_scale_y),
        obstacle_inset: finite_or(m.obstacle_inset, d.obstacle_inset).max(0.0),
        collectible_radius: finite_or(m.collectible_radius, d.collectible_radius).max(0.0),
    }
}

pub fn player_hitbox(pos: Vec2, size: Vec2, metrics: Option<&HitboxMetrics>) -> Aabb {
    let m = metrics_or_default(metrics);
    shrink_to_feet(pos, size, m.player_scale_x, m.player_scale_y)
}

pub fn enemy_hitbox(pos: Vec2, size: Vec2, metrics: Option<&HitboxMetrics>) -> Aabb {
    let m = metrics_or_default(metrics);
    shrink_to_feet(pos, size, m.enemy_scale_x, m.enemy_scale_y)
}

/// Visual box inset on all four sides; never inverts
pub fn obstacle_hitbox(pos: Vec2, size: Vec2, metrics: Option<&HitboxMetrics>) -> Aabb {
    let inset = metrics_or_default(metrics).obstacle_inset;
    let visual = Aabb::from_feet(pos, size);
    let inset_x = inset.min(visual.width * 0.5);
    let inset_y = inset.min(visual.height * 0.5);
    Aabb::new(
        visual.x + inset_x,
        visual.y + inset_y,
        visual.width - 2.0 * inset_x,
        visual.height - 2.0 * inset_y,
    )
}

/// Pickup radius from the metrics override or the default
pub fn collectible_radius(metrics: Option<&HitboxMetrics>) -> f32 {
    metrics_or_default(metrics).collectible_radius
}

/// Circle-vs-box pickup test.
///
/// The collectible is a point with `radius`; it is picked up when the nearest
/// point of the player box lies within that radius of the center.
pub fn collectible_intersects(player: &Aabb, center: Vec2, radius: f32) -> bool {
    if !center.is_finite() || !radius.is_finite() || radius < 0.0 {
        return false;
    }
    let nearest = player.clamp_point(center);
    nearest.distance_squared(center) <= radius * radius
}
