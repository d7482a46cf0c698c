//! Scripted spawns keyed by traveled distance
//!
//! The run is a hand-authored list of events. Each entry's abstract distance is
//! converted to pixels with the current layout's spawn reference width, so the
//! same script paces consistently across device shapes.

use serde::{Deserialize, Serialize};

use crate::consts::DESIGN_WORLD_WIDTH;
use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    Currency,
    BonusCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnKind {
    Enemy,
    Obstacle,
    Collectible(CollectibleKind),
    Finish,
}

/// One scripted event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnSequenceEntry {
    pub kind: SpawnKind,
    pub distance_units: f32,
    /// Vertical offset from the ground line (negative is up)
    #[serde(default)]
    pub y_offset: Option<f32>,
    /// Show a warning label that follows the spawned entity
    #[serde(default)]
    pub warning_label: bool,
    /// This enemy pauses the run for the jump tutorial
    #[serde(default)]
    pub tutorial_pause: bool,
}

impl SpawnSequenceEntry {
    pub fn new(kind: SpawnKind, distance_units: f32) -> Self {
        Self {
            kind,
            distance_units,
            y_offset: None,
            warning_label: false,
            tutorial_pause: false,
        }
    }

    pub fn with_y_offset(mut self, y_offset: f32) -> Self {
        self.y_offset = Some(y_offset);
        self
    }

    pub fn with_warning(mut self) -> Self {
        self.warning_label = true;
        self
    }

    pub fn with_tutorial_pause(mut self) -> Self {
        self.tutorial_pause = true;
        self
    }
}

/// Validated, strictly increasing script
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnSequence {
    entries: Vec<SpawnSequenceEntry>,
}

impl Default for SpawnSequence {
    fn default() -> Self {
        use CollectibleKind::*;
        use SpawnKind::*;
        let entries = vec![
            SpawnSequenceEntry::new(Collectible(Currency), 0.6),
            SpawnSequenceEntry::new(Collectible(Currency), 0.85),
            SpawnSequenceEntry::new(Enemy, 1.4)
                .with_warning()
                .with_tutorial_pause(),
            SpawnSequenceEntry::new(Collectible(Currency), 2.0).with_y_offset(-180.0),
            SpawnSequenceEntry::new(Obstacle, 2.6),
            SpawnSequenceEntry::new(Collectible(BonusCard), 3.1).with_y_offset(-220.0),
            SpawnSequenceEntry::new(Enemy, 3.8).with_warning(),
            SpawnSequenceEntry::new(Collectible(Currency), 4.3),
            SpawnSequenceEntry::new(Obstacle, 4.9),
            SpawnSequenceEntry::new(Enemy, 5.9),
            SpawnSequenceEntry::new(Collectible(Currency), 6.4),
            SpawnSequenceEntry::new(Finish, 7.0),
        ];
        Self { entries }
    }
}

impl SpawnSequence {
    pub fn new(entries: Vec<SpawnSequenceEntry>) -> ConfigResult<Self> {
        let mut previous: Option<f32> = None;
        for (index, entry) in entries.iter().enumerate() {
            let d = entry.distance_units;
            if !d.is_finite() || d < 0.0 {
                return Err(ConfigError::invalid(
                    "distance_units",
                    format!("entry {index} has distance {d}"),
                ));
            }
            if let Some(prev) = previous.filter(|&prev| d <= prev) {
                return Err(ConfigError::UnorderedSequence {
                    index,
                    previous: prev,
                    next: d,
                });
            }
            if entry.tutorial_pause && entry.kind != SpawnKind::Enemy {
                return Err(ConfigError::invalid(
                    "tutorial_pause",
                    format!("entry {index} is not an enemy"),
                ));
            }
            if let Some(y) = entry.y_offset.filter(|y| !y.is_finite()) {
                return Err(ConfigError::invalid(
                    "y_offset",
                    format!("entry {index} has offset {y}"),
                ));
            }
            previous = Some(d);
        }
        Ok(Self { entries })
    }

    /// Parse a JSON array of entries and validate ordering
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let entries: Vec<SpawnSequenceEntry> = serde_json::from_str(json)?;
        let sequence = Self::new(entries)?;
        log::info!("Loaded spawn sequence with {} entries", sequence.len());
        Ok(sequence)
    }

    pub fn entries(&self) -> &[SpawnSequenceEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&SpawnSequenceEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Convert script distance to world pixels; an unusable width falls back to the design width
pub fn spawn_distance_to_px(distance_units: f32, reference_width: f32) -> f32 {
    let width = if reference_width.is_finite() && reference_width > 0.0 {
        reference_width
    } else {
        DESIGN_WORLD_WIDTH
    };
    distance_units * width
}

pub fn should_spawn(traveled: f32, threshold_px: f32, lead_px: f32) -> bool {
    traveled >= threshold_px - lead_px
}

/// An entry that fired this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiredSpawn {
    pub index: usize,
    pub entry: SpawnSequenceEntry,
    /// How far past its trigger point the entry fired (world units, >= 0)
    pub overshoot: f32,
}

/// In-order cursor over a spawn sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnCursor {
    next: usize,
}

impl SpawnCursor {
    pub fn next_index(&self) -> usize {
        self.next
    }

    pub fn is_finished(&self, sequence: &SpawnSequence) -> bool {
        self.next >= sequence.len()
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Fire every due entry, in order, up to `max_per_tick`.
    ///
    /// Entries left over stay due and fire on later ticks; none are skipped.
    pub fn poll(
        &mut self,
        sequence: &SpawnSequence,
        traveled: f32,
        reference_width: f32,
        lead_px: f32,
        max_per_tick: usize,
    ) -> Vec<FiredSpawn> {
        let mut fired = Vec::new();
        while fired.len() < max_per_tick {
            let Some(entry) = sequence.get(self.next) else {
                break;
            };
            let threshold = spawn_distance_to_px(entry.distance_units, reference_width);
            if !should_spawn(traveled, threshold, lead_px) {
                break;
            }
            fired.push(FiredSpawn {
                index: self.next,
                entry: *entry,
                overshoot: (traveled - (threshold - lead_px)).max(0.0),
            });
            self.next += 1;
        }
        if fired.len() == max_per_tick && !self.is_finished(sequence) {
            log::debug!("Spawn cap reached at entry {}", self.next);
        }
        fired
    }
}
