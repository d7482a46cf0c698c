//! Read-only frame snapshot for the renderer
//!
//! Borrows the run state and layout for the duration of one render pass. The
//! renderer gets everything it needs to draw without touching `GameState`.

use serde::Serialize;

use super::finish_gate::FinishGateGeometry;
use super::state::{ComboPopup, ConfettiParticle, Entity, GameState, Player, RunOutcome};
use crate::assets::AssetMetrics;
use crate::layout::LayoutState;

#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot<'a> {
    pub phase: &'static str,
    pub outcome: Option<RunOutcome>,
    pub elapsed: f32,
    pub traveled: f32,
    pub score: f32,
    pub earnings: f32,
    pub health: u8,
    pub max_health: u8,
    pub combo: u32,
    pub enemy_animation_tick: u32,
    pub tutorial_active: bool,
    pub ground_scroll: f32,
    pub backdrop_scroll: f32,
    pub player: &'a Player,
    pub entities: &'a [Entity],
    /// Gate pieces for this frame, if a finish line is live
    pub finish_gate: Option<FinishGateGeometry>,
    pub popups: &'a [ComboPopup],
    pub confetti: &'a [ConfettiParticle],
    pub layout: &'a LayoutState,
}

impl<'a> RenderSnapshot<'a> {
    pub fn capture(
        state: &'a GameState,
        layout: &'a LayoutState,
        max_health: u8,
        metrics: &dyn AssetMetrics,
    ) -> Self {
        Self {
            phase: state.phase.as_str(),
            outcome: state.outcome(),
            elapsed: state.elapsed,
            traveled: state.traveled,
            score: state.score,
            earnings: state.earnings,
            health: state.player.health,
            max_health,
            combo: state.combo,
            enemy_animation_tick: state.enemy_animation_tick(),
            tutorial_active: state.frozen_enemy_tick.is_some(),
            ground_scroll: state.ground_scroll,
            backdrop_scroll: state.backdrop_scroll,
            player: &state.player,
            entities: &state.entities,
            finish_gate: state.finish_line().and_then(|e| e.finish_gate(metrics)),
            popups: &state.popups,
            confetti: &state.confetti,
            layout,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
