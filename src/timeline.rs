//! Cumulative time intervals derived from an ordered segment list.

use crate::model::Segment;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEntry {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// Where a point in time falls relative to the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    BeforeFirst,
    Active(usize),
    /// At or past the total duration, or no segments at all.
    Finished,
}

impl Lookup {
    pub fn active(self) -> Option<usize> {
        match self {
            Lookup::Active(i) => Some(i),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    total: f64,
}

/// Builds contiguous `[start, end)` entries, one per segment.
pub fn build_timeline(segments: &[Segment]) -> Timeline {
    let mut entries = Vec::with_capacity(segments.len());
    let mut cursor = 0.0;
    for seg in segments {
        let duration = seg.duration_ms as f64;
        entries.push(TimelineEntry {
            start: cursor,
            end: cursor + duration,
            duration,
        });
        cursor += duration;
    }
    Timeline {
        entries,
        total: cursor,
    }
}

impl Timeline {
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn segment_at(&self, t: f64) -> Lookup {
        if self.entries.is_empty() || t >= self.total {
            return Lookup::Finished;
        }
        if t < 0.0 {
            return Lookup::BeforeFirst;
        }
        // First entry whose end lies strictly after t; zero-length entries are skipped.
        let idx = self.entries.partition_point(|e| e.end <= t);
        Lookup::Active(idx)
    }

    /// Fraction of segment `index` covered at time `t`, in `[0, 1]`.
    pub fn progress(&self, index: usize, t: f64) -> f64 {
        match self.entries.get(index) {
            Some(e) if e.duration > 0.0 => ((t - e.start) / e.duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}
