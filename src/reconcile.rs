//! Bidirectional mapping between scroll offset and elapsed time.
//!
//! Both directions are pure functions of the timeline and a [`LayoutQuery`],
//! so they can be exercised against synthetic layouts.

use crate::{
    error::{EngineError, Result},
    layout::LayoutQuery,
    timeline::{Lookup, Timeline},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// A scroll position the host should apply to its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollCommand {
    pub offset: f64,
    pub behavior: ScrollBehavior,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciler {
    focal_position: f64,
    end_tolerance_px: f64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            focal_position: 0.5,
            end_tolerance_px: 2.0,
        }
    }
}

impl Reconciler {
    pub fn new(focal_position: f64, end_tolerance_px: f64) -> Result<Self> {
        let mut r = Self::default();
        r.set_focal_position(focal_position)?;
        r.end_tolerance_px = end_tolerance_px.max(0.0);
        Ok(r)
    }

    pub fn focal_position(&self) -> f64 {
        self.focal_position
    }

    pub fn set_focal_position(&mut self, focal: f64) -> Result<()> {
        if !(focal > 0.0 && focal < 1.0) {
            return Err(EngineError::InvalidFocalPosition(focal));
        }
        self.focal_position = focal;
        Ok(())
    }

    /// Scroll offset that puts time `t` on the focal line, or `None` when
    /// there is nothing to scroll to.
    pub fn time_to_scroll(
        &self,
        timeline: &Timeline,
        layout: &dyn LayoutQuery,
        t: f64,
    ) -> Option<f64> {
        if timeline.is_empty() {
            return None;
        }
        let (index, progress) = match timeline.segment_at(t) {
            Lookup::Active(i) => (i, timeline.progress(i, t)),
            Lookup::BeforeFirst => (0, 0.0),
            Lookup::Finished => (timeline.len() - 1, 1.0),
        };
        let rect = layout.segment_rect(index)?;
        let focal_px = layout.container_height() * self.focal_position;
        Some(rect.top - focal_px + rect.height * progress)
    }

    /// Elapsed time implied by the segment under the focal line at `scroll_top`.
    pub fn scroll_to_time(
        &self,
        timeline: &Timeline,
        layout: &dyn LayoutQuery,
        scroll_top: f64,
    ) -> f64 {
        if timeline.is_empty() {
            return 0.0;
        }

        let max_scroll = layout.max_scroll();
        if max_scroll > self.end_tolerance_px && scroll_top >= max_scroll - self.end_tolerance_px
        {
            return timeline.total();
        }

        let focal_y = scroll_top + layout.container_height() * self.focal_position;
        let count = timeline.len().min(layout.segment_count());

        for i in 0..count {
            let Some(rect) = layout.segment_rect(i) else {
                continue;
            };
            if focal_y < rect.top {
                // Above everything, or in the gap after segment i-1.
                return match i.checked_sub(1).and_then(|p| timeline.entry(p)) {
                    Some(prev) => prev.end,
                    None => 0.0,
                };
            }
            if focal_y < rect.bottom() {
                let Some(entry) = timeline.entry(i) else {
                    break;
                };
                let ratio = ((focal_y - rect.top) / rect.height).clamp(0.0, 1.0);
                return entry.start + ratio * entry.duration;
            }
        }

        timeline.total()
    }
}
