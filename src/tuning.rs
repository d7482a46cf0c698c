//! Game balance and timing
//!
//! Every gameplay constant the run uses lives here so a host can ship a JSON
//! override without rebuilding. Missing fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigResult, require_non_negative, require_positive};

/// Hitbox shaping ratios
///
/// Player and enemy boxes are narrower than their sprites and anchored at the
/// feet, which makes near misses read as misses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitboxMetrics {
    pub player_scale_x: f32,
    pub player_scale_y: f32,
    pub enemy_scale_x: f32,
    pub enemy_scale_y: f32,
    /// Pixels trimmed from every side of an obstacle box
    pub obstacle_inset: f32,
    /// Pickup radius around a collectible's center
    pub collectible_radius: f32,
}

impl Default for HitboxMetrics {
    fn default() -> Self {
        Self {
            player_scale_x: 0.55,
            player_scale_y: 0.82,
            enemy_scale_x: 0.5,
            enemy_scale_y: 0.78,
            obstacle_inset: 12.0,
            collectible_radius: 42.0,
        }
    }
}

/// Gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seed for confetti, bob phases and animation offsets
    pub seed: u64,

    // === Player ===
    pub max_health: u8,
    /// Seconds of invulnerability after a hit
    pub invincibility_secs: f32,
    /// Blink toggle period while invulnerable
    pub blink_interval_secs: f32,
    /// Seconds from takeoff to landing
    pub jump_duration_secs: f32,

    // === World motion ===
    /// Extra speed enemies run at on top of the scroll speed
    pub enemy_run_speed: f32,
    /// Hazards enter this far past the camera's right edge
    pub spawn_edge_padding: f32,
    /// Safety cap on spawn entries fired per tick
    pub max_spawns_per_tick: usize,
    /// Enemy base draw scale applied to its intrinsic size
    pub enemy_scale: f32,

    // === Tutorial ===
    /// Gap between the player and tutorial enemy hitboxes that pauses the run
    pub tutorial_trigger_distance: f32,

    // === Finish ===
    /// Per-frame speed multiplier while decelerating (at the reference frame rate)
    pub decel_rate: f32,
    /// Speed below which deceleration snaps to zero
    pub decel_floor: f32,
    /// Delay between stopping and the win screen
    pub win_delay_secs: f32,
    /// Duration of the tape-break animation
    pub tape_break_secs: f32,

    // === Scoring ===
    pub currency_value: f32,
    pub bonus_card_value: f32,
    /// Streak lengths that trigger a praise popup
    pub combo_milestones: Vec<u32>,
    pub popup_lifetime_secs: f32,

    // === Effects ===
    pub confetti_burst: usize,
    pub max_confetti: usize,
    pub confetti_lifetime_secs: f32,
    pub confetti_gravity: f32,

    pub hitbox: HitboxMetrics,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            seed: 0x5eed_f1a6,

            max_health: 3,
            invincibility_secs: 1.2,
            blink_interval_secs: 0.1,
            jump_duration_secs: 0.7,

            enemy_run_speed: 140.0,
            spawn_edge_padding: 40.0,
            max_spawns_per_tick: 3,
            enemy_scale: 0.44,

            tutorial_trigger_distance: 180.0,

            decel_rate: 0.9,
            decel_floor: 10.0,
            win_delay_secs: 0.8,
            tape_break_secs: 0.9,

            currency_value: 5.0,
            bonus_card_value: 25.0,
            combo_milestones: vec![3, 5, 8],
            popup_lifetime_secs: 0.9,

            confetti_burst: 48,
            max_confetti: 160,
            confetti_lifetime_secs: 1.8,
            confetti_gravity: 900.0,

            hitbox: HitboxMetrics::default(),
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning override (seed {:#x})", tuning.seed);
        Ok(tuning)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_health == 0 {
            return Err(crate::ConfigError::invalid("max_health", "must be at least 1"));
        }
        if self.max_spawns_per_tick == 0 {
            return Err(crate::ConfigError::invalid(
                "max_spawns_per_tick",
                "must be at least 1",
            ));
        }
        if !(self.decel_rate > 0.0 && self.decel_rate < 1.0) {
            return Err(crate::ConfigError::invalid(
                "decel_rate",
                format!("must be in (0, 1), got {}", self.decel_rate),
            ));
        }
        require_positive("decel_floor", self.decel_floor)?;
        require_positive("jump_duration_secs", self.jump_duration_secs)?;
        require_positive("tape_break_secs", self.tape_break_secs)?;
        require_positive("blink_interval_secs", self.blink_interval_secs)?;
        require_positive("enemy_scale", self.enemy_scale)?;
        require_non_negative("invincibility_secs", self.invincibility_secs)?;
        require_non_negative("win_delay_secs", self.win_delay_secs)?;
        require_non_negative("enemy_run_speed", self.enemy_run_speed)?;
        require_non_negative("spawn_edge_padding", self.spawn_edge_padding)?;
        require_non_negative("tutorial_trigger_distance", self.tutorial_trigger_distance)?;
        require_non_negative("hitbox.collectible_radius", self.hitbox.collectible_radius)?;
        require_non_negative("hitbox.obstacle_inset", self.hitbox.obstacle_inset)?;
        require_positive("hitbox.player_scale_x", self.hitbox.player_scale_x)?;
        require_positive("hitbox.player_scale_y", self.hitbox.player_scale_y)?;
        require_positive("hitbox.enemy_scale_x", self.hitbox.enemy_scale_x)?;
        require_positive("hitbox.enemy_scale_y", self.hitbox.enemy_scale_y)?;
        Ok(())
    }
}
