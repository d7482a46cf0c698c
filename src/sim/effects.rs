//! Transient celebration effects: combo popups and confetti
//!
//! Purely cosmetic. Randomness comes from the run's seeded RNG so a replay of
//! the same inputs produces the same particles.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::pacing::next_spawn_delay;
use super::state::{ComboPopup, ConfettiParticle, GameState};
use crate::tuning::Tuning;

/// Popup rise speed (world units / s)
const POPUP_RISE: f32 = 90.0;
/// Popups start this far above the pickup
const POPUP_OFFSET_Y: f32 = 120.0;
const POPUP_LABELS: [&str; 3] = ["Nice!", "Great!", "Amazing!"];

const CONFETTI_SPEED_MIN: f32 = 320.0;
const CONFETTI_SPEED_MAX: f32 = 760.0;
const CONFETTI_SPIN: f32 = 9.0;
const CONFETTI_COLORS: u8 = 6;
/// Horizontal velocity retained per second
const CONFETTI_DRAG: f32 = 0.6;

/// Count a pickup toward the streak and pop praise on milestones
pub fn register_pickup(state: &mut GameState, tuning: &Tuning, at: Vec2) {
    state.combo = if state.combo_timer > 0.0 {
        state.combo.saturating_add(1)
    } else {
        1
    };
    state.combo_timer = next_spawn_delay(state.score);

    let Some(rank) = tuning.combo_milestones.iter().position(|&m| m == state.combo) else {
        return;
    };
    let label = POPUP_LABELS[rank.min(POPUP_LABELS.len() - 1)];
    let id = state.next_entity_id();
    state.popups.push(ComboPopup {
        id,
        pos: at - Vec2::new(0.0, POPUP_OFFSET_Y),
        label,
        streak: state.combo,
        age: 0.0,
        lifetime: tuning.popup_lifetime_secs,
    });
    log::debug!("Combo x{} ({})", state.combo, label);
}

/// Launch a confetti burst upward from `origin`, respecting the live cap
pub fn spawn_confetti(state: &mut GameState, tuning: &Tuning, origin: Vec2) {
    let room = tuning.max_confetti.saturating_sub(state.confetti.len());
    let count = tuning.confetti_burst.min(room);
    for _ in 0..count {
        // Upward fan: y is down, so angles between -PI and 0 point up
        let angle = state.rng.random_range(-PI * 0.9..-PI * 0.1);
        let speed = state.rng.random_range(CONFETTI_SPEED_MIN..CONFETTI_SPEED_MAX);
        let lifetime = tuning.confetti_lifetime_secs * state.rng.random_range(0.7..1.0);
        let particle = ConfettiParticle {
            id: state.next_entity_id(),
            pos: origin,
            vel: Vec2::from_angle(angle) * speed,
            rotation: state.rng.random_range(0.0..TAU),
            spin: state.rng.random_range(-CONFETTI_SPIN..CONFETTI_SPIN),
            age: 0.0,
            lifetime,
            color_index: state.rng.random_range(0..CONFETTI_COLORS),
        };
        state.confetti.push(particle);
    }
}

/// Age the streak timer and move popups and particles
pub fn update_effects(state: &mut GameState, tuning: &Tuning, dt: f32) {
    if state.combo_timer > 0.0 {
        state.combo_timer = (state.combo_timer - dt).max(0.0);
        if state.combo_timer == 0.0 {
            state.combo = 0;
        }
    }

    for popup in &mut state.popups {
        popup.age += dt;
        popup.pos.y -= POPUP_RISE * dt;
    }
    state.popups.retain(|p| p.age < p.lifetime);

    let drag = CONFETTI_DRAG.powf(dt);
    for p in &mut state.confetti {
        p.vel.y += tuning.confetti_gravity * dt;
        p.vel.x *= drag;
        p.pos += p.vel * dt;
        p.rotation += p.spin * dt;
        p.age += dt;
    }
    state.confetti.retain(|p| p.age < p.lifetime);
}
