//! Run state and entity types
//!
//! Everything that changes between ticks lives in `GameState`. The tick
//! function is the only writer; the renderer reads it through a snapshot.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{self, Aabb};
use super::finish_gate::{FinishGateGeometry, FinishGateInput, compute_finish_gate_geometry};
use super::spawn::{CollectibleKind, SpawnCursor, SpawnSequence};
use crate::assets::AssetMetrics;
use crate::tuning::{HitboxMetrics, Tuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Win,
    Lose,
}

/// Run lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Assets still loading; nothing ticks
    Loading,
    /// Waiting for the first interaction
    Intro,
    Running,
    /// Frozen in front of the tutorial enemy until the player acts
    TutorialPause,
    /// Past the finish line, coasting to a stop
    Decelerating,
    Ended(RunOutcome),
}

impl RunPhase {
    /// Phases in which the world scrolls
    pub fn is_moving(self) -> bool {
        matches!(self, RunPhase::Running | RunPhase::Decelerating)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunPhase::Loading => "loading",
            RunPhase::Intro => "intro",
            RunPhase::Running => "running",
            RunPhase::TutorialPause => "tutorial_pause",
            RunPhase::Decelerating => "decelerating",
            RunPhase::Ended(RunOutcome::Win) => "ended_win",
            RunPhase::Ended(RunOutcome::Lose) => "ended_lose",
        }
    }
}

/// The runner. `pos` is the bottom-center of the sprite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    pub jumping: bool,
    /// 0..1 through the current jump
    pub jump_progress: f32,
    /// Seconds of invulnerability left
    pub invincibility: f32,
    pub blink_visible: bool,
    pub blink_timer: f32,
    pub health: u8,
    pub animation_time: f32,
}

impl Player {
    pub fn new(health: u8) -> Self {
        Self {
            pos: Vec2::ZERO,
            size: Vec2::ZERO,
            jumping: false,
            jump_progress: 0.0,
            invincibility: 0.0,
            blink_visible: true,
            blink_timer: 0.0,
            health,
            animation_time: 0.0,
        }
    }

    /// Start a jump; ignored while already airborne
    pub fn start_jump(&mut self) -> bool {
        if self.jumping {
            return false;
        }
        self.jumping = true;
        self.jump_progress = 0.0;
        true
    }

    /// Start a new jump from the take-off point, even mid-air
    pub fn restart_jump(&mut self) {
        self.jumping = true;
        self.jump_progress = 0.0;
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility > 0.0
    }

    pub fn hitbox(&self, metrics: &HitboxMetrics) -> Aabb {
        collision::player_hitbox(self.pos, self.size, Some(metrics))
    }
}

/// Per-kind entity data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    Enemy {
        /// Phase offset so enemies don't animate in lockstep
        animation_offset: u32,
        tutorial_trigger: bool,
    },
    Obstacle,
    Collectible {
        collectible: CollectibleKind,
        collected: bool,
        value: f32,
        bob_seed: f32,
    },
    /// Floating "!" that tracks another entity
    WarningLabel { target_id: u32, pulse_seed: f32 },
    /// `pos.x` is the gate anchor
    FinishLine {
        tape_broken: bool,
        tape_break_progress: f32,
    },
}

/// A world entity; `pos` is the bottom-center of its visual box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Entity {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    #[serde(flatten)]
    pub kind: EntityKind,
}

impl Entity {
    pub fn visual_box(&self) -> Aabb {
        Aabb::from_feet(self.pos, self.size)
    }

    /// Damage box for hazards; `None` for everything else
    pub fn hazard_hitbox(&self, metrics: &HitboxMetrics) -> Option<Aabb> {
        match self.kind {
            EntityKind::Enemy { .. } => Some(collision::enemy_hitbox(self.pos, self.size, Some(metrics))),
            EntityKind::Obstacle => Some(collision::obstacle_hitbox(self.pos, self.size, Some(metrics))),
            _ => None,
        }
    }

    /// Gate pieces for a finish line entity, placed at its anchor
    pub fn finish_gate(&self, metrics: &dyn AssetMetrics) -> Option<FinishGateGeometry> {
        let EntityKind::FinishLine {
            tape_broken,
            tape_break_progress,
        } = self.kind
        else {
            return None;
        };
        compute_finish_gate_geometry(
            &FinishGateInput {
                anchor_x: self.pos.x,
                ground_y: self.pos.y,
                tape_broken,
                tape_break_progress,
            },
            metrics,
        )
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.kind, EntityKind::Enemy { .. })
    }

    /// Moves with the world (labels follow their target instead)
    pub fn scrolls(&self) -> bool {
        !matches!(self.kind, EntityKind::WarningLabel { .. })
    }
}

/// Floating streak praise
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComboPopup {
    pub id: u32,
    pub pos: Vec2,
    pub label: &'static str,
    pub streak: u32,
    pub age: f32,
    pub lifetime: f32,
}

impl ComboPopup {
    /// 1 at spawn, 0 at expiry
    pub fn alpha(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 0.0;
        }
        (1.0 - self.age / self.lifetime).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfettiParticle {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub spin: f32,
    pub age: f32,
    pub lifetime: f32,
    pub color_index: u8,
}

impl ConfettiParticle {
    pub fn alpha(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 0.0;
        }
        (1.0 - self.age / self.lifetime).clamp(0.0, 1.0)
    }
}

/// Complete run state
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: RunPhase,
    pub player: Player,
    /// Live entities in spawn order
    pub entities: Vec<Entity>,
    pub popups: Vec<ComboPopup>,
    pub confetti: Vec<ConfettiParticle>,

    /// World units scrolled this run
    pub traveled: f32,
    pub score: f32,
    /// Sum of collected values
    pub earnings: f32,
    /// Current scroll speed (world units / s)
    pub speed: f32,
    pub combo: u32,
    /// Seconds left to extend the current streak
    pub combo_timer: f32,

    pub sequence: SpawnSequence,
    pub cursor: SpawnCursor,
    /// Enemy id armed to pause the run for the tutorial
    pub pending_tutorial_enemy: Option<u32>,
    /// Enemy animation frame captured when the tutorial pause began
    pub frozen_enemy_tick: Option<u32>,
    /// Set once the player crosses the finish trigger line
    pub finish_triggered: bool,
    /// Seconds left before the win screen (counting once stopped)
    pub win_delay: Option<f32>,

    /// Seconds since the run left the intro
    pub elapsed: f32,
    /// Ground pattern scroll, wraps at the tile width
    pub ground_scroll: f32,
    /// Backdrop parallax scroll, wraps at the camera width
    pub backdrop_scroll: f32,

    pub seed: u64,
    pub rng: Pcg32,
    next_id: u32,
}

impl GameState {
    pub fn new(tuning: &Tuning, sequence: SpawnSequence) -> Self {
        Self {
            phase: RunPhase::Loading,
            player: Player::new(tuning.max_health),
            entities: Vec::new(),
            popups: Vec::new(),
            confetti: Vec::new(),
            traveled: 0.0,
            score: 0.0,
            earnings: 0.0,
            speed: super::pacing::obstacle_speed(0.0),
            combo: 0,
            combo_timer: 0.0,
            sequence,
            cursor: SpawnCursor::default(),
            pending_tutorial_enemy: None,
            frozen_enemy_tick: None,
            finish_triggered: false,
            win_delay: None,
            elapsed: 0.0,
            ground_scroll: 0.0,
            backdrop_scroll: 0.0,
            seed: tuning.seed,
            rng: Pcg32::seed_from_u64(tuning.seed),
            next_id: 1,
        }
    }

    /// Assets are ready; show the intro
    pub fn finish_loading(&mut self) {
        if self.phase == RunPhase::Loading {
            self.phase = RunPhase::Intro;
            log::info!("Assets ready, entering intro");
        }
    }

    /// Back to the intro with a fresh run; the script and seed are kept
    pub fn reset(&mut self, tuning: &Tuning) {
        let sequence = std::mem::take(&mut self.sequence);
        let mut fresh = Self::new(tuning, sequence);
        fresh.phase = RunPhase::Intro;
        fresh.player.pos = self.player.pos;
        fresh.player.size = self.player.size;
        *self = fresh;
        log::info!("Run reset");
    }

    /// Allocate the next entity id (monotonic for the whole run)
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn finish_line(&self) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| matches!(e.kind, EntityKind::FinishLine { .. }))
    }

    /// Current enemy animation frame (10 fps of run time), held during the tutorial pause
    pub fn enemy_animation_tick(&self) -> u32 {
        self.frozen_enemy_tick
            .unwrap_or((self.elapsed.max(0.0) * ENEMY_ANIMATION_FPS) as u32)
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        match self.phase {
            RunPhase::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }
}

pub const ENEMY_ANIMATION_FPS: f32 = 10.0;
