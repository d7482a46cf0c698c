//! Platform abstraction layer
//!
//! Handles the host loop plumbing shared by browser and native builds:
//! - Frame timing (clamped per-tick step)
//! - Resize notification coalescing
//! - Surface measurement and overlay styling (web only, see `web`)

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::consts::MAX_FRAME_DT;

/// Converts monotonic frame timestamps (ms) into clamped simulation steps.
///
/// The first frame yields zero; a stalled frame (background tab, debugger)
/// yields at most `max_step` so timers never jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    max_step: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_FRAME_DT)
    }
}

impl FrameClock {
    pub fn new(max_step: f32) -> Self {
        Self {
            last_ms: None,
            max_step,
        }
    }

    /// Seconds to simulate for a frame stamped `now_ms`
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) if now_ms.is_finite() && now_ms >= last => ((now_ms - last) / 1000.0) as f32,
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_ms = Some(now_ms);
        }
        dt.min(self.max_step)
    }

    /// Forget the last timestamp (e.g. when the tab becomes visible again)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Dirty flag consumed once per display refresh
#[derive(Debug, Clone, Default)]
pub struct ResizeCoalescer {
    dirty: bool,
    /// Notifications received since the last `take`
    pending: u32,
}

impl ResizeCoalescer {
    pub fn notify(&mut self) {
        self.dirty = true;
        self.pending = self.pending.saturating_add(1);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the flag, returning whether a rebuild is due
    pub fn take(&mut self) -> bool {
        if self.pending > 1 {
            log::debug!("Coalesced {} resize notifications", self.pending);
        }
        self.pending = 0;
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clock_first_frame_is_zero() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance(1000.0), 0.0);
        let dt = clock.advance(1016.0);
        assert!((dt - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_frame_clock_clamps_stalls() {
        let mut clock = FrameClock::new(0.05);
        clock.advance(0.0);
        assert_eq!(clock.advance(5000.0), 0.05);
    }

    #[test]
    fn test_frame_clock_ignores_backwards_time() {
        let mut clock = FrameClock::default();
        clock.advance(500.0);
        assert_eq!(clock.advance(400.0), 0.0);
        clock.reset();
        assert_eq!(clock.advance(900.0), 0.0);
    }

    #[test]
    fn test_coalescer_take_once() {
        let mut coalescer = ResizeCoalescer::default();
        assert!(!coalescer.take());
        coalescer.notify();
        coalescer.notify();
        assert!(coalescer.is_dirty());
        assert!(coalescer.take());
        assert!(!coalescer.take());
    }
}
