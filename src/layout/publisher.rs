//! Coalesced layout publication
//!
//! Raw resize/orientation/visual-viewport notifications only mark the layout
//! dirty. The host calls [`LayoutPublisher::on_frame`] once per display refresh,
//! which performs at most one measurement and swaps in a new snapshot. Readers
//! hold an `Rc` to whichever snapshot was current when they asked and never
//! observe a partial update.

use std::rc::Rc;

use super::engine::{LayoutConfig, LayoutState, SurfaceMeasurement, measure};
use crate::platform::ResizeCoalescer;

pub struct LayoutPublisher {
    config: LayoutConfig,
    current: Rc<LayoutState>,
    coalescer: ResizeCoalescer,
    /// Number of snapshots published (including the initial one)
    generation: u64,
}

impl LayoutPublisher {
    /// Measure immediately so there is always a current snapshot
    pub fn new(config: LayoutConfig, initial: &SurfaceMeasurement) -> Self {
        let current = Rc::new(measure(initial, &config));
        log::info!(
            "Initial layout: bucket={} camera={}x{}",
            current.bucket.as_str(),
            current.camera_view.width,
            current.camera_view.height
        );
        Self {
            config,
            current,
            coalescer: ResizeCoalescer::default(),
            generation: 1,
        }
    }

    /// Latest published snapshot
    pub fn current(&self) -> Rc<LayoutState> {
        Rc::clone(&self.current)
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a resize-like notification; cheap, may be called in bursts
    pub fn request_measure(&mut self) {
        self.coalescer.notify();
    }

    pub fn is_dirty(&self) -> bool {
        self.coalescer.is_dirty()
    }

    /// Per-refresh hook. Calls `read_surface` and republishes only when dirty.
    ///
    /// Returns the new snapshot when one was published.
    pub fn on_frame(
        &mut self,
        read_surface: impl FnOnce() -> SurfaceMeasurement,
    ) -> Option<Rc<LayoutState>> {
        if !self.coalescer.take() {
            return None;
        }

        let next = measure(&read_surface(), &self.config);
        if next == *self.current {
            log::debug!("Layout unchanged after resize notification");
            return None;
        }

        if next.bucket != self.current.bucket {
            log::info!(
                "Layout bucket {} -> {}",
                self.current.bucket.as_str(),
                next.bucket.as_str()
            );
        }
        self.current = Rc::new(next);
        self.generation += 1;
        Some(self.current())
    }
}
