//! Per-frame simulation tick
//!
//! Advances the run by one clamped real-time step. Within a moving tick the
//! order is fixed: scroll, spawn, move, tutorial trigger, finish trigger,
//! collisions, cleanup, then player motion and timers. Collisions always see
//! post-move positions and run before anything is culled.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::collision::{self, collectible_radius};
use super::effects::{register_pickup, spawn_confetti, update_effects};
use super::pacing::{compute_jump_y, decay_speed, obstacle_speed, score_step};
use super::spawn::{CollectibleKind, FiredSpawn, SpawnKind};
use super::state::{Entity, EntityKind, GameState, RunOutcome, RunPhase};
use crate::assets::{AssetId, AssetMetrics, size_or_fallback};
use crate::consts::MAX_FRAME_DT;
use crate::finite_or;
use crate::layout::LayoutState;
use crate::tuning::Tuning;

/// Width of one ground pattern tile (world units)
const GROUND_TILE: f32 = 96.0;
/// Backdrop scrolls at this fraction of the run speed
const BACKDROP_PARALLAX: f32 = 0.2;
/// Warning labels hover this far above their target
const WARNING_LABEL_GAP: f32 = 40.0;
const WARNING_LABEL_SIZE: f32 = 64.0;
/// Enemy run cycles have this many frames
const ENEMY_FRAMES: u32 = 8;
/// Autopilot jumps when contact is this many seconds away
const AUTOPILOT_LEAD_SECS: f32 = 0.15;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tap / click / space
    pub primary: bool,
    /// Start over from the end screen
    pub restart: bool,
    /// Demo mode: the sim presses primary for the player
    pub autopilot: bool,
}

/// Read-only collaborators for a tick
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    pub layout: &'a LayoutState,
    pub tuning: &'a Tuning,
    pub metrics: &'a dyn AssetMetrics,
}

/// Advance the run by `dt` seconds (clamped to the max frame step)
pub fn tick(state: &mut GameState, input: &TickInput, ctx: &TickContext, dt: f32) {
    let dt = finite_or(dt, 0.0).clamp(0.0, MAX_FRAME_DT);
    sync_player(state, ctx);

    let mut input = input.clone();
    if input.autopilot && autopilot_wants_primary(state, ctx) {
        input.primary = true;
    }
    handle_input(state, &input, ctx.tuning);

    if state.phase == RunPhase::Loading {
        return;
    }

    if state.phase.is_moving() {
        let distance = advance_scroll(state, ctx, dt);
        run_spawns(state, ctx);
        move_entities(state, ctx, distance, dt);
        check_tutorial_trigger(state, ctx);
        check_finish_trigger(state, ctx);
        resolve_collisions(state, ctx);
        cleanup(state, ctx);
        advance_player(state, ctx, dt);

        if state.phase.is_moving() {
            state.elapsed += dt;
        }
        advance_tape(state, ctx.tuning, dt);
        advance_win_delay(state, ctx.tuning, dt);
    } else if matches!(state.phase, RunPhase::Ended(_)) {
        // The gate keeps animating behind the end screen
        advance_tape(state, ctx.tuning, dt);
    }

    update_effects(state, ctx.tuning, dt);
}

/// Player X, ground line and size follow the current layout
fn sync_player(state: &mut GameState, ctx: &TickContext) {
    let tokens = &ctx.layout.gameplay_tokens;
    let player = &mut state.player;
    player.size = size_or_fallback(ctx.metrics, AssetId::Player) * tokens.player_visual_scale;
    player.pos.x = tokens.player_base_x;
    if !player.jumping {
        player.pos.y = tokens.ground_y;
    }
}

fn handle_input(state: &mut GameState, input: &TickInput, tuning: &Tuning) {
    if input.restart {
        if let RunPhase::Ended(_) = state.phase {
            state.reset(tuning);
        }
        return;
    }
    if !input.primary {
        return;
    }
    match state.phase {
        RunPhase::Intro => {
            state.phase = RunPhase::Running;
            log::info!("Run started");
        }
        RunPhase::Running => {
            state.player.start_jump();
        }
        RunPhase::TutorialPause => {
            state.phase = RunPhase::Running;
            state.frozen_enemy_tick = None;
            state.pending_tutorial_enemy = None;
            state.player.restart_jump();
            log::info!("Tutorial cleared");
        }
        // Decelerating: the run is won, input is ignored.
        // Ended: the end screen CTA belongs to the overlay.
        RunPhase::Loading | RunPhase::Decelerating | RunPhase::Ended(_) => {}
    }
}

/// Update speed and scroll; returns the distance scrolled this tick
fn advance_scroll(state: &mut GameState, ctx: &TickContext, dt: f32) -> f32 {
    match state.phase {
        RunPhase::Running => {
            state.speed = obstacle_speed(state.score);
            state.score += score_step(dt, state.speed);
        }
        RunPhase::Decelerating => {
            state.speed = decay_speed(
                state.speed,
                ctx.tuning.decel_rate,
                ctx.tuning.decel_floor,
                dt,
            );
        }
        _ => return 0.0,
    }

    let distance = state.speed * dt;
    state.traveled += distance;
    state.ground_scroll = (state.ground_scroll + distance) % GROUND_TILE;
    let wrap = ctx.layout.camera_view.width.max(1.0);
    state.backdrop_scroll = (state.backdrop_scroll + distance * BACKDROP_PARALLAX) % wrap;
    distance
}

fn run_spawns(state: &mut GameState, ctx: &TickContext) {
    let tokens = &ctx.layout.gameplay_tokens;
    let fired = state.cursor.poll(
        &state.sequence,
        state.traveled,
        tokens.spawn_reference_width,
        tokens.spawn_lead_px,
        ctx.tuning.max_spawns_per_tick,
    );
    for spawn in fired {
        spawn_entry(state, ctx, &spawn);
    }
}

fn spawn_entry(state: &mut GameState, ctx: &TickContext, spawn: &FiredSpawn) {
    let tokens = &ctx.layout.gameplay_tokens;
    let tuning = ctx.tuning;
    let entry = &spawn.entry;
    // Enter just past the right edge, pulled back by however late we are
    let edge = ctx.layout.camera_view.width + tuning.spawn_edge_padding - spawn.overshoot;
    let y = tokens.ground_y + entry.y_offset.unwrap_or(0.0);

    let (size, kind) = match entry.kind {
        SpawnKind::Enemy => {
            let size = size_or_fallback(ctx.metrics, AssetId::Enemy)
                * tuning.enemy_scale
                * tokens.enemy_visual_scale;
            let tutorial_trigger = entry.tutorial_pause && state.pending_tutorial_enemy.is_none();
            let kind = EntityKind::Enemy {
                animation_offset: state.rng.random_range(0..ENEMY_FRAMES),
                tutorial_trigger,
            };
            (size, kind)
        }
        SpawnKind::Obstacle => {
            let size = size_or_fallback(ctx.metrics, AssetId::Obstacle) * tokens.obstacle_visual_scale;
            (size, EntityKind::Obstacle)
        }
        SpawnKind::Collectible(collectible) => {
            let (asset, value) = match collectible {
                CollectibleKind::Currency => (AssetId::CurrencyIcon, tuning.currency_value),
                CollectibleKind::BonusCard => (AssetId::BonusCard, tuning.bonus_card_value),
            };
            let kind = EntityKind::Collectible {
                collectible,
                collected: false,
                value,
                bob_seed: state.rng.random_range(0.0..TAU),
            };
            (size_or_fallback(ctx.metrics, asset), kind)
        }
        SpawnKind::Finish => {
            spawn_finish(state, ctx, edge);
            return;
        }
    };

    let id = state.next_entity_id();
    let entity = Entity {
        id,
        pos: Vec2::new(edge + size.x * 0.5, y),
        size,
        kind,
    };
    if let EntityKind::Enemy {
        tutorial_trigger: true,
        ..
    } = kind
    {
        state.pending_tutorial_enemy = Some(id);
        log::debug!("Tutorial enemy {} armed", id);
    }
    state.entities.push(entity);

    if entry.warning_label {
        let label_id = state.next_entity_id();
        let pulse_seed = state.rng.random_range(0.0..TAU);
        let mut label = Entity {
            id: label_id,
            pos: Vec2::ZERO,
            size: Vec2::splat(WARNING_LABEL_SIZE * tokens.warning_label_scale),
            kind: EntityKind::WarningLabel {
                target_id: id,
                pulse_seed,
            },
        };
        place_label(&mut label, &entity);
        state.entities.push(label);
    }
    log::trace!("Spawned {:?} #{} at x={:.0}", entry.kind, id, entity.pos.x);
}

/// The gate's leftmost piece enters at `edge`
fn spawn_finish(state: &mut GameState, ctx: &TickContext, edge: f32) {
    let ground_y = ctx.layout.gameplay_tokens.ground_y;
    let mut gate = Entity {
        id: state.next_entity_id(),
        pos: Vec2::new(0.0, ground_y),
        size: Vec2::ZERO,
        kind: EntityKind::FinishLine {
            tape_broken: false,
            tape_break_progress: 0.0,
        },
    };
    let Some(geometry) = gate.finish_gate(ctx.metrics) else {
        log::warn!("Finish gate has no geometry; skipping");
        return;
    };
    gate.pos.x = edge - geometry.bounds.min.x;
    gate.size = Vec2::new(geometry.bounds.width(), geometry.bounds.height());
    log::debug!("Finish gate #{} at x={:.0}", gate.id, gate.pos.x);
    state.entities.push(gate);
}

fn place_label(label: &mut Entity, target: &Entity) {
    label.pos = Vec2::new(target.pos.x, target.pos.y - target.size.y - WARNING_LABEL_GAP);
}

fn move_entities(state: &mut GameState, ctx: &TickContext, distance: f32, dt: f32) {
    let run = ctx.tuning.enemy_run_speed * dt;
    for entity in state.entities.iter_mut().filter(|e| e.scrolls()) {
        entity.pos.x -= distance;
        if entity.is_enemy() {
            entity.pos.x -= run;
        }
    }

    // Labels track their targets' new positions
    let targets: Vec<(usize, Entity)> = state
        .entities
        .iter()
        .enumerate()
        .filter_map(|(i, e)| match e.kind {
            EntityKind::WarningLabel { target_id, .. } => {
                state.entity(target_id).map(|t| (i, *t))
            }
            _ => None,
        })
        .collect();
    for (i, target) in targets {
        place_label(&mut state.entities[i], &target);
    }
}

fn check_tutorial_trigger(state: &mut GameState, ctx: &TickContext) {
    if state.phase != RunPhase::Running {
        return;
    }
    let Some(enemy) = state.pending_tutorial_enemy.and_then(|id| state.entity(id)) else {
        return;
    };
    let hitbox = &ctx.tuning.hitbox;
    let Some(enemy_box) = enemy.hazard_hitbox(hitbox) else {
        return;
    };
    let gap = enemy_box.x - state.player.hitbox(hitbox).right();
    if gap <= ctx.tuning.tutorial_trigger_distance {
        state.frozen_enemy_tick = Some(state.enemy_animation_tick());
        state.phase = RunPhase::TutorialPause;
        log::info!("Tutorial pause (gap {:.0})", gap);
    }
}

fn check_finish_trigger(state: &mut GameState, ctx: &TickContext) {
    if state.finish_triggered || state.phase != RunPhase::Running {
        return;
    }
    let Some(geometry) = state.finish_line().and_then(|e| e.finish_gate(ctx.metrics)) else {
        return;
    };
    let leading_edge = state.player.hitbox(&ctx.tuning.hitbox).right();
    if leading_edge < geometry.tape.break_line_x {
        return;
    }

    state.finish_triggered = true;
    state.phase = RunPhase::Decelerating;
    for entity in &mut state.entities {
        if let EntityKind::FinishLine { tape_broken, .. } = &mut entity.kind {
            *tape_broken = true;
        }
    }
    let at = Vec2::new(geometry.tape.break_line_x, geometry.tape.break_line_y);
    spawn_confetti(state, ctx.tuning, at);
    log::info!("Finish line crossed at {:.0} units", state.traveled);
}

fn resolve_collisions(state: &mut GameState, ctx: &TickContext) {
    let tuning = ctx.tuning;
    let player_box = state.player.hitbox(&tuning.hitbox);

    // Once the tape is broken the run is won; hazards can no longer hurt
    if !state.player.is_invincible() && !state.finish_triggered {
        let hit = state.entities.iter().find(|e| {
            e.hazard_hitbox(&tuning.hitbox)
                .is_some_and(|b| collision::intersects(&player_box, &b))
        });
        if let Some(hazard) = hit {
            let hazard_id = hazard.id;
            let player = &mut state.player;
            player.health = player.health.saturating_sub(1);
            if player.health == 0 {
                state.phase = RunPhase::Ended(RunOutcome::Lose);
                log::info!("Run lost to #{}", hazard_id);
                return;
            }
            player.invincibility = tuning.invincibility_secs;
            player.blink_timer = 0.0;
            player.blink_visible = false;
            log::debug!("Hit by #{}, health {}", hazard_id, player.health);
        }
    }

    let radius = collectible_radius(Some(&tuning.hitbox));
    let mut picked: Vec<(Vec2, CollectibleKind)> = Vec::new();
    for entity in &mut state.entities {
        let center = entity.visual_box().center();
        let EntityKind::Collectible {
            collectible,
            collected,
            value,
            ..
        } = &mut entity.kind
        else {
            continue;
        };
        if !*collected && collision::collectible_intersects(&player_box, center, radius) {
            *collected = true;
            state.earnings += *value;
            picked.push((center, *collectible));
        }
    }
    for (center, collectible) in picked {
        register_pickup(state, tuning, center);
        if collectible == CollectibleKind::BonusCard {
            spawn_confetti(state, tuning, center);
        }
    }
}

fn cleanup(state: &mut GameState, ctx: &TickContext) {
    let behind = -ctx.layout.gameplay_tokens.cleanup_behind_px;
    let metrics = ctx.metrics;
    let before = state.entities.len();

    state.entities.retain(|e| match e.kind {
        EntityKind::Collectible { collected: true, .. } => false,
        EntityKind::FinishLine { .. } => e
            .finish_gate(metrics)
            .is_some_and(|g| g.bounds.max.x >= behind),
        EntityKind::WarningLabel { .. } => true,
        _ => e.visual_box().right() >= behind,
    });
    // Orphaned labels go with their targets
    let live: Vec<u32> = state.entities.iter().map(|e| e.id).collect();
    state.entities.retain(|e| match e.kind {
        EntityKind::WarningLabel { target_id, .. } => live.contains(&target_id),
        _ => true,
    });

    if state
        .pending_tutorial_enemy
        .is_some_and(|id| !live.contains(&id))
    {
        state.pending_tutorial_enemy = None;
    }
    let removed = before - state.entities.len();
    if removed > 0 {
        log::trace!("Cleaned up {} entities", removed);
    }
}

fn advance_player(state: &mut GameState, ctx: &TickContext, dt: f32) {
    if !state.phase.is_moving() {
        return;
    }
    let tokens = &ctx.layout.gameplay_tokens;
    let tuning = ctx.tuning;
    let player = &mut state.player;

    if player.jumping {
        player.jump_progress += dt / tuning.jump_duration_secs;
        if player.jump_progress >= 1.0 {
            player.jumping = false;
            player.jump_progress = 0.0;
        }
        player.pos.y = compute_jump_y(tokens.ground_y, player.jump_progress, tokens.jump_height);
    }

    if player.invincibility > 0.0 {
        player.invincibility = (player.invincibility - dt).max(0.0);
        player.blink_timer += dt;
        while player.blink_timer >= tuning.blink_interval_secs {
            player.blink_timer -= tuning.blink_interval_secs;
            player.blink_visible = !player.blink_visible;
        }
        if player.invincibility == 0.0 {
            player.blink_visible = true;
            player.blink_timer = 0.0;
        }
    }
    player.animation_time += dt;
}

fn advance_tape(state: &mut GameState, tuning: &Tuning, dt: f32) {
    for entity in &mut state.entities {
        if let EntityKind::FinishLine {
            tape_broken: true,
            tape_break_progress,
        } = &mut entity.kind
        {
            *tape_break_progress = (*tape_break_progress + dt / tuning.tape_break_secs).min(1.0);
        }
    }
}

fn advance_win_delay(state: &mut GameState, tuning: &Tuning, dt: f32) {
    if state.phase != RunPhase::Decelerating || state.speed > 0.0 {
        return;
    }
    let remaining = state.win_delay.get_or_insert(tuning.win_delay_secs);
    *remaining -= dt;
    if *remaining <= 0.0 {
        state.phase = RunPhase::Ended(RunOutcome::Win);
        log::info!(
            "Run won: {:.0} units, earnings {:.0}",
            state.traveled,
            state.earnings
        );
    }
}

/// Demo player: start, clear the tutorial, and jump shortly before contact
fn autopilot_wants_primary(state: &GameState, ctx: &TickContext) -> bool {
    match state.phase {
        RunPhase::Intro | RunPhase::TutorialPause => true,
        RunPhase::Running if !state.player.jumping => {
            let hitbox = &ctx.tuning.hitbox;
            let front = state.player.hitbox(hitbox).right();
            state.entities.iter().any(|e| {
                let Some(b) = e.hazard_hitbox(hitbox) else {
                    return false;
                };
                let closing = state.speed
                    + if e.is_enemy() {
                        ctx.tuning.enemy_run_speed
                    } else {
                        0.0
                    };
                let gap = b.x - front;
                gap >= 0.0 && gap <= closing * AUTOPILOT_LEAD_SECS
            })
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::FallbackMetrics;
    use crate::layout::{LayoutConfig, SurfaceMeasurement, measure};
    use crate::sim::spawn::{SpawnSequence, SpawnSequenceEntry};

    const DT: f32 = 1.0 / 60.0;

    fn layout() -> LayoutState {
        measure(&SurfaceMeasurement::from_size(390.0, 844.0), &LayoutConfig::default())
    }

    fn running_state(tuning: &Tuning, sequence: SpawnSequence) -> GameState {
        let mut state = GameState::new(tuning, sequence);
        state.finish_loading();
        state.phase = RunPhase::Running;
        state
    }

    fn obstacle_on_player(state: &mut GameState, layout: &LayoutState) {
        let id = state.next_entity_id();
        state.entities.push(Entity {
            id,
            pos: Vec2::new(
                layout.gameplay_tokens.player_base_x,
                layout.gameplay_tokens.ground_y,
            ),
            size: AssetId::Obstacle.fallback_size(),
            kind: EntityKind::Obstacle,
        });
    }

    fn empty_sequence() -> SpawnSequence {
        SpawnSequence::new(Vec::new()).unwrap()
    }

    #[test]
    fn test_loading_does_not_tick() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let mut state = GameState::new(&tuning, SpawnSequence::default());
        let primary = TickInput {
            primary: true,
            ..Default::default()
        };
        tick(&mut state, &primary, &ctx, DT);
        assert_eq!(state.phase, RunPhase::Loading);
        assert_eq!(state.traveled, 0.0);
    }

    #[test]
    fn test_intro_to_running_on_first_input() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let mut state = GameState::new(&tuning, SpawnSequence::default());
        state.finish_loading();

        tick(&mut state, &TickInput::default(), &ctx, DT);
        assert_eq!(state.phase, RunPhase::Intro);
        assert_eq!(state.traveled, 0.0);

        let primary = TickInput {
            primary: true,
            ..Default::default()
        };
        tick(&mut state, &primary, &ctx, DT);
        assert_eq!(state.phase, RunPhase::Running);
        assert!(state.traveled > 0.0);
        assert!(!state.player.jumping);
    }

    #[test]
    fn test_last_health_collision_ends_run_same_tick() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let mut state = running_state(&tuning, empty_sequence());
        state.player.health = 1;
        state.player.invincibility = 0.0;
        obstacle_on_player(&mut state, &layout);

        tick(&mut state, &TickInput::default(), &ctx, DT);
        assert_eq!(state.phase, RunPhase::Ended(RunOutcome::Lose));
        assert_eq!(state.player.health, 0);
    }

    #[test]
    fn test_hit_grants_invincibility_and_blinks() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let mut state = running_state(&tuning, empty_sequence());
        obstacle_on_player(&mut state, &layout);

        tick(&mut state, &TickInput::default(), &ctx, DT);
        assert_eq!(state.player.health, 2);
        assert!(state.player.is_invincible());

        // Still overlapping, but protected
        tick(&mut state, &TickInput::default(), &ctx, DT);
        assert_eq!(state.player.health, 2);

        let mut toggled = false;
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), &ctx, DT);
            toggled |= state.player.blink_visible;
        }
        assert!(toggled);
        assert!(!state.player.is_invincible());
        assert!(state.player.blink_visible);
    }

    #[test]
    fn test_jump_returns_to_ground() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let ground = layout.gameplay_tokens.ground_y;
        let mut state = running_state(&tuning, empty_sequence());
        let primary = TickInput {
            primary: true,
            ..Default::default()
        };
        tick(&mut state, &primary, &ctx, DT);
        assert!(state.player.jumping);
        assert!(state.player.pos.y < ground);

        let mut apex = ground;
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), &ctx, DT);
            apex = apex.min(state.player.pos.y);
        }
        assert!(!state.player.jumping);
        assert_eq!(state.player.pos.y, ground);
        assert!(ground - apex > layout.gameplay_tokens.jump_height * 0.95);
    }

    #[test]
    fn test_tutorial_pause_freezes_world_and_resumes_with_jump() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let sequence = SpawnSequence::new(vec![
            SpawnSequenceEntry::new(SpawnKind::Enemy, 1.2)
                .with_warning()
                .with_tutorial_pause(),
        ])
        .unwrap();
        let mut state = running_state(&tuning, sequence);

        let mut ticks = 0;
        while state.phase == RunPhase::Running {
            tick(&mut state, &TickInput::default(), &ctx, DT);
            ticks += 1;
            assert!(ticks < 600, "tutorial never triggered");
        }
        assert_eq!(state.phase, RunPhase::TutorialPause);
        assert!(state.pending_tutorial_enemy.is_some());
        assert!(state.entities.iter().any(|e| matches!(e.kind, EntityKind::WarningLabel { .. })));

        let frozen = state.enemy_animation_tick();
        let positions: Vec<Vec2> = state.entities.iter().map(|e| e.pos).collect();
        let traveled = state.traveled;
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), &ctx, DT);
        }
        assert_eq!(state.enemy_animation_tick(), frozen);
        assert_eq!(state.traveled, traveled);
        assert_eq!(state.entities.iter().map(|e| e.pos).collect::<Vec<_>>(), positions);

        let primary = TickInput {
            primary: true,
            ..Default::default()
        };
        tick(&mut state, &primary, &ctx, DT);
        assert_eq!(state.phase, RunPhase::Running);
        assert!(state.player.jumping);
        assert_eq!(state.pending_tutorial_enemy, None);

        // The jump clears the enemy
        for _ in 0..90 {
            tick(&mut state, &TickInput::default(), &ctx, DT);
        }
        assert_eq!(state.player.health, tuning.max_health);
    }

    #[test]
    fn test_tutorial_resume_restarts_jump_when_airborne() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let sequence = SpawnSequence::new(vec![
            SpawnSequenceEntry::new(SpawnKind::Enemy, 1.2).with_tutorial_pause(),
        ])
        .unwrap();
        let mut state = running_state(&tuning, sequence);
        while state.phase == RunPhase::Running {
            tick(&mut state, &TickInput::default(), &ctx, DT);
        }
        assert_eq!(state.phase, RunPhase::TutorialPause);

        // Caught on the way down when the pause hit
        let tokens = &layout.gameplay_tokens;
        state.player.jumping = true;
        state.player.jump_progress = 0.74;
        state.player.pos.y = compute_jump_y(tokens.ground_y, 0.74, tokens.jump_height);

        let primary = TickInput {
            primary: true,
            ..Default::default()
        };
        tick(&mut state, &primary, &ctx, DT);
        assert_eq!(state.phase, RunPhase::Running);
        assert!(state.player.jumping);
        assert!(state.player.jump_progress < 2.0 * DT / tuning.jump_duration_secs);

        for _ in 0..90 {
            tick(&mut state, &TickInput::default(), &ctx, DT);
        }
        assert_eq!(state.player.health, tuning.max_health);
    }

    #[test]
    fn test_second_tutorial_enemy_is_not_armed_while_one_is_pending() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let mut state = running_state(&tuning, empty_sequence());
        let fire = |distance_units: f32| FiredSpawn {
            index: 0,
            entry: SpawnSequenceEntry::new(SpawnKind::Enemy, distance_units).with_tutorial_pause(),
            overshoot: 0.0,
        };

        spawn_entry(&mut state, &ctx, &fire(1.0));
        let first = state.pending_tutorial_enemy.unwrap();
        assert!(matches!(
            state.entity(first).map(|e| e.kind),
            Some(EntityKind::Enemy {
                tutorial_trigger: true,
                ..
            })
        ));

        spawn_entry(&mut state, &ctx, &fire(2.0));
        let second = state.entities.last().unwrap();
        assert_ne!(second.id, first);
        assert!(matches!(
            second.kind,
            EntityKind::Enemy {
                tutorial_trigger: false,
                ..
            }
        ));
        assert_eq!(state.pending_tutorial_enemy, Some(first));
    }

    fn push_entity(state: &mut GameState, pos: Vec2, size: Vec2, kind: EntityKind) -> u32 {
        let id = state.next_entity_id();
        state.entities.push(Entity { id, pos, size, kind });
        id
    }

    fn label_for(target_id: u32) -> EntityKind {
        EntityKind::WarningLabel {
            target_id,
            pulse_seed: 0.0,
        }
    }

    #[test]
    fn test_cleanup_removes_hazards_past_margin_with_labels() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let behind = -layout.gameplay_tokens.cleanup_behind_px;
        let ground = layout.gameplay_tokens.ground_y;
        let enemy_size = AssetId::Enemy.fallback_size();
        let obstacle_size = AssetId::Obstacle.fallback_size();
        let enemy = EntityKind::Enemy {
            animation_offset: 0,
            tutorial_trigger: false,
        };

        let mut state = running_state(&tuning, empty_sequence());
        // Right edges one unit either side of the cleanup line
        let kept_enemy = push_entity(
            &mut state,
            Vec2::new(behind - enemy_size.x * 0.5 + 1.0, ground),
            enemy_size,
            enemy,
        );
        let gone_enemy = push_entity(
            &mut state,
            Vec2::new(behind - enemy_size.x * 0.5 - 1.0, ground),
            enemy_size,
            enemy,
        );
        let kept_label = push_entity(&mut state, Vec2::ZERO, Vec2::splat(64.0), label_for(kept_enemy));
        let gone_label = push_entity(&mut state, Vec2::ZERO, Vec2::splat(64.0), label_for(gone_enemy));
        let kept_obstacle = push_entity(
            &mut state,
            Vec2::new(behind - obstacle_size.x * 0.5 + 1.0, ground),
            obstacle_size,
            EntityKind::Obstacle,
        );
        let gone_obstacle = push_entity(
            &mut state,
            Vec2::new(behind - obstacle_size.x * 0.5 - 1.0, ground),
            obstacle_size,
            EntityKind::Obstacle,
        );
        state.pending_tutorial_enemy = Some(gone_enemy);

        cleanup(&mut state, &ctx);

        let ids: Vec<u32> = state.entities.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![kept_enemy, kept_label, kept_obstacle]);
        assert!(!ids.contains(&gone_enemy));
        assert!(!ids.contains(&gone_label));
        assert!(!ids.contains(&gone_obstacle));
        assert_eq!(state.pending_tutorial_enemy, None);
    }

    #[test]
    fn test_cleanup_keeps_finish_gate_until_bounds_pass_margin() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let behind = -layout.gameplay_tokens.cleanup_behind_px;
        let ground = layout.gameplay_tokens.ground_y;
        let gate = EntityKind::FinishLine {
            tape_broken: true,
            tape_break_progress: 1.0,
        };
        let at_origin = Entity {
            id: 0,
            pos: Vec2::new(0.0, ground),
            size: Vec2::ZERO,
            kind: gate,
        };
        // Gate's right reach relative to its anchor
        let reach = at_origin.finish_gate(&FallbackMetrics).unwrap().bounds.max.x;

        let mut state = running_state(&tuning, empty_sequence());
        let id = push_entity(&mut state, Vec2::new(behind - reach + 1.0, ground), Vec2::ZERO, gate);
        cleanup(&mut state, &ctx);
        assert_eq!(state.finish_line().map(|e| e.id), Some(id));

        state.entities[0].pos.x = behind - reach - 1.0;
        cleanup(&mut state, &ctx);
        assert!(state.finish_line().is_none());
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_hazards_are_harmless_after_finish_crossed() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let mut state = running_state(&tuning, empty_sequence());
        state.phase = RunPhase::Decelerating;
        state.finish_triggered = true;
        state.player.health = 1;
        obstacle_on_player(&mut state, &layout);

        tick(&mut state, &TickInput::default(), &ctx, DT);
        assert_eq!(state.phase, RunPhase::Decelerating);
        assert_eq!(state.player.health, 1);
    }

    #[test]
    fn test_collectibles_add_earnings_and_disappear() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let sequence = SpawnSequence::new(vec![
            SpawnSequenceEntry::new(SpawnKind::Collectible(CollectibleKind::Currency), 1.0),
            SpawnSequenceEntry::new(SpawnKind::Collectible(CollectibleKind::BonusCard), 1.2),
        ])
        .unwrap();
        let mut state = running_state(&tuning, sequence);
        // Long enough for both pickups, short of the streak expiring
        for _ in 0..150 {
            tick(&mut state, &TickInput::default(), &ctx, DT);
        }
        assert_eq!(state.earnings, tuning.currency_value + tuning.bonus_card_value);
        assert!(state.entities.is_empty());
        assert_eq!(state.combo, 2);
    }

    #[test]
    fn test_autopilot_finishes_default_run() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let mut state = GameState::new(&tuning, SpawnSequence::default());
        state.finish_loading();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };

        let mut saw_decel = false;
        for _ in 0..60 * 60 {
            tick(&mut state, &input, &ctx, DT);
            saw_decel |= state.phase == RunPhase::Decelerating;
            if matches!(state.phase, RunPhase::Ended(_)) {
                break;
            }
        }
        assert_eq!(state.outcome(), Some(RunOutcome::Win));
        assert!(saw_decel);
        assert!(state.finish_triggered);
        assert_eq!(state.speed, 0.0);
        assert!(state.cursor.is_finished(&state.sequence));
    }

    #[test]
    fn test_finish_trigger_matches_break_line() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let sequence =
            SpawnSequence::new(vec![SpawnSequenceEntry::new(SpawnKind::Finish, 1.0)]).unwrap();
        let mut state = running_state(&tuning, sequence);

        while state.phase == RunPhase::Running {
            tick(&mut state, &TickInput::default(), &ctx, DT);
        }
        assert_eq!(state.phase, RunPhase::Decelerating);
        let gate = state.finish_line().and_then(|e| e.finish_gate(&FallbackMetrics)).unwrap();
        let front = state.player.hitbox(&tuning.hitbox).right();
        assert!(front >= gate.tape.break_line_x);
        assert!(!state.confetti.is_empty());
    }

    #[test]
    fn test_restart_only_from_ended() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        let primary = TickInput {
            primary: true,
            ..Default::default()
        };

        let mut state = running_state(&tuning, SpawnSequence::default());
        tick(&mut state, &restart, &ctx, DT);
        assert_eq!(state.phase, RunPhase::Running);

        state.phase = RunPhase::Ended(RunOutcome::Lose);
        tick(&mut state, &primary, &ctx, DT);
        assert_eq!(state.phase, RunPhase::Ended(RunOutcome::Lose));

        tick(&mut state, &restart, &ctx, DT);
        assert_eq!(state.phase, RunPhase::Intro);
        assert_eq!(state.traveled, 0.0);
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_stalled_frame_is_clamped() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let mut state = running_state(&tuning, empty_sequence());
        tick(&mut state, &TickInput::default(), &ctx, 5.0);
        assert!(state.elapsed <= MAX_FRAME_DT + 1e-6);
        tick(&mut state, &TickInput::default(), &ctx, f32::NAN);
        assert!(state.elapsed <= MAX_FRAME_DT + 1e-6);
    }

    #[test]
    fn test_determinism() {
        let tuning = Tuning::default();
        let layout = layout();
        let ctx = TickContext {
            layout: &layout,
            tuning: &tuning,
            metrics: &FallbackMetrics,
        };
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        let mut a = GameState::new(&tuning, SpawnSequence::default());
        let mut b = GameState::new(&tuning, SpawnSequence::default());
        a.finish_loading();
        b.finish_loading();
        for _ in 0..600 {
            tick(&mut a, &input, &ctx, DT);
            tick(&mut b, &input, &ctx, DT);
        }
        assert_eq!(a.entities, b.entities);
        assert_eq!(a.confetti, b.confetti);
        assert_eq!(a.traveled, b.traveled);
        assert_eq!(a.phase, b.phase);
    }
}
