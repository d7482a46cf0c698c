//! Run simulation
//!
//! All gameplay logic lives here:
//! - Real-time steps clamped by the caller's frame clock
//! - Seeded RNG only
//! - Entities kept in spawn order
//! - No rendering or platform dependencies

pub mod collision;
pub mod effects;
pub mod finish_gate;
pub mod keyframes;
pub mod pacing;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Aabb, collectible_intersects, intersects};
pub use finish_gate::{FinishGateGeometry, FinishGateInput, GateSprite, compute_finish_gate_geometry};
pub use keyframes::{Ease, KeyframeCurve};
pub use pacing::{compute_jump_y, next_spawn_delay, obstacle_speed, score_step};
pub use snapshot::RenderSnapshot;
pub use spawn::{
    CollectibleKind, SpawnCursor, SpawnKind, SpawnSequence, SpawnSequenceEntry, should_spawn,
    spawn_distance_to_px,
};
pub use state::{Entity, EntityKind, GameState, Player, RunOutcome, RunPhase};
pub use tick::{TickContext, TickInput, tick};
