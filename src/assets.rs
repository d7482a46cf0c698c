//! Asset metrics provider
//!
//! The core never decodes images; it only asks the host for each visual's
//! intrinsic size. Missing or garbage sizes fall back to built-in constants so
//! a partially loaded asset set yields wrong proportions, never a bad hitbox.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Named visuals whose intrinsic size matters to gameplay or gate geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetId {
    Player,
    Enemy,
    Obstacle,
    CurrencyIcon,
    BonusCard,
    FinishFloor,
    FinishPoleLeft,
    FinishPoleRight,
    FinishTapeLeft,
    FinishTapeRight,
}

impl AssetId {
    pub const ALL: [AssetId; 10] = [
        AssetId::Player,
        AssetId::Enemy,
        AssetId::Obstacle,
        AssetId::CurrencyIcon,
        AssetId::BonusCard,
        AssetId::FinishFloor,
        AssetId::FinishPoleLeft,
        AssetId::FinishPoleRight,
        AssetId::FinishTapeLeft,
        AssetId::FinishTapeRight,
    ];

    /// Built-in size used when the provider has nothing usable
    pub fn fallback_size(self) -> Vec2 {
        match self {
            AssetId::Player => Vec2::new(96.0, 150.0),
            AssetId::Enemy => Vec2::new(300.0, 330.0),
            AssetId::Obstacle => Vec2::new(120.0, 110.0),
            AssetId::CurrencyIcon => Vec2::new(72.0, 72.0),
            AssetId::BonusCard => Vec2::new(150.0, 96.0),
            AssetId::FinishFloor => Vec2::new(400.0, 60.0),
            // Poles are authored lying down and rotated upright when drawn
            AssetId::FinishPoleLeft => Vec2::new(120.0, 24.0),
            AssetId::FinishPoleRight => Vec2::new(120.0, 24.0),
            AssetId::FinishTapeLeft => Vec2::new(140.0, 20.0),
            AssetId::FinishTapeRight => Vec2::new(140.0, 20.0),
        }
    }

    /// Key used by the host asset manifest
    pub fn key(self) -> &'static str {
        match self {
            AssetId::Player => "player",
            AssetId::Enemy => "enemy",
            AssetId::Obstacle => "obstacle",
            AssetId::CurrencyIcon => "collectibleIcon",
            AssetId::BonusCard => "bonusCard",
            AssetId::FinishFloor => "finishFloorPattern",
            AssetId::FinishPoleLeft => "finishPoleLeft",
            AssetId::FinishPoleRight => "finishPoleRight",
            AssetId::FinishTapeLeft => "finishTapeLeft",
            AssetId::FinishTapeRight => "finishTapeRight",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }
}

/// Source of intrinsic asset sizes (implemented by the host asset loader)
pub trait AssetMetrics {
    fn intrinsic_size(&self, asset: AssetId) -> Option<Vec2>;
}

/// Provider that knows nothing; every lookup uses the fallback size
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackMetrics;

impl AssetMetrics for FallbackMetrics {
    fn intrinsic_size(&self, _asset: AssetId) -> Option<Vec2> {
        None
    }
}

/// Sizes reported by the loader after decoding
#[derive(Debug, Clone, Default)]
pub struct StaticMetrics {
    sizes: HashMap<AssetId, Vec2>,
}

impl StaticMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: AssetId, width: f32, height: f32) {
        self.sizes.insert(asset, Vec2::new(width, height));
    }

    /// Build from a `{ "manifestKey": [w, h] }` map, ignoring unknown keys
    pub fn from_manifest<'a>(entries: impl IntoIterator<Item = (&'a str, [f32; 2])>) -> Self {
        let mut metrics = Self::new();
        for (key, [w, h]) in entries {
            match AssetId::from_key(key) {
                Some(id) => metrics.insert(id, w, h),
                None => log::debug!("Ignoring unknown asset key: {}", key),
            }
        }
        metrics
    }
}

impl AssetMetrics for StaticMetrics {
    fn intrinsic_size(&self, asset: AssetId) -> Option<Vec2> {
        self.sizes.get(&asset).copied()
    }
}

/// Intrinsic size with fallback when missing, non-finite or degenerate
pub fn size_or_fallback(metrics: &dyn AssetMetrics, asset: AssetId) -> Vec2 {
    match metrics.intrinsic_size(asset) {
        Some(size) if size.is_finite() && size.x > 0.0 && size.y > 0.0 => size,
        _ => asset.fallback_size(),
    }
}
