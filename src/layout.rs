//! Layout queries: where each segment sits in the scrollable document.

use crate::model::Segment;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRect {
    pub top: f64,
    pub height: f64,
}

impl SegmentRect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Measurement capability supplied by the host's rendering surface.
pub trait LayoutQuery {
    fn segment_rect(&self, index: usize) -> Option<SegmentRect>;

    fn segment_count(&self) -> usize;

    fn container_height(&self) -> f64;

    /// Full scrollable height of the document.
    fn content_height(&self) -> f64;

    fn max_scroll(&self) -> f64 {
        (self.content_height() - self.container_height()).max(0.0)
    }
}

/// Segments stacked vertically with padding so the first and last lines can
/// reach the focal line.
#[derive(Debug, Clone)]
pub struct StackLayout {
    rects: Vec<SegmentRect>,
    container_height: f64,
    content_height: f64,
}

impl StackLayout {
    pub fn from_heights(heights: &[f64], gap: f64, container_height: f64, focal: f64) -> Self {
        let pad_top = container_height * focal;
        let pad_bottom = container_height * (1.0 - focal);

        let mut rects = Vec::with_capacity(heights.len());
        let mut cursor = pad_top;
        for (i, h) in heights.iter().enumerate() {
            if i > 0 {
                cursor += gap;
            }
            rects.push(SegmentRect {
                top: cursor,
                height: h.max(0.0),
            });
            cursor += h.max(0.0);
        }

        Self {
            rects,
            container_height,
            content_height: cursor + pad_bottom,
        }
    }

    /// Lays out segment text wrapped to `wrap_width` columns at `line_height` per line.
    pub fn from_text(segments: &[Segment], opts: &TextLayoutOptions) -> Self {
        let heights: Vec<f64> = segments
            .iter()
            .map(|s| {
                let text = s.text();
                let lines = textwrap::wrap(&text, opts.wrap_width.max(1)).len().max(1);
                lines as f64 * opts.line_height
            })
            .collect();
        Self::from_heights(
            &heights,
            opts.segment_gap,
            opts.container_height,
            opts.focal_position,
        )
    }
}

impl LayoutQuery for StackLayout {
    fn segment_rect(&self, index: usize) -> Option<SegmentRect> {
        self.rects.get(index).copied()
    }

    fn segment_count(&self) -> usize {
        self.rects.len()
    }

    fn container_height(&self) -> f64 {
        self.container_height
    }

    fn content_height(&self) -> f64 {
        self.content_height
    }
}

#[derive(Debug, Clone)]
pub struct TextLayoutOptions {
    pub wrap_width: usize,
    pub line_height: f64,
    pub segment_gap: f64,
    pub container_height: f64,
    pub focal_position: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_lets_last_segment_end_reach_focal_line() {
        let layout = StackLayout::from_heights(&[100.0, 50.0], 10.0, 400.0, 0.5);
        assert_eq!(layout.segment_rect(0).unwrap().top, 200.0);
        assert_eq!(layout.segment_rect(1).unwrap().top, 310.0);

        let last = layout.segment_rect(1).unwrap();
        assert_eq!(layout.max_scroll(), last.bottom() - 200.0);
    }

    #[test]
    fn text_wraps_into_taller_segments() {
        let segs = vec![
            Segment::from_text("one two three four five six seven eight", 1000),
            Segment::from_text("short", 1000),
        ];
        let opts = TextLayoutOptions {
            wrap_width: 10,
            line_height: 20.0,
            segment_gap: 0.0,
            container_height: 200.0,
            focal_position: 0.5,
        };
        let layout = StackLayout::from_text(&segs, &opts);

        assert!(layout.segment_rect(0).unwrap().height > 20.0);
        assert_eq!(layout.segment_rect(1).unwrap().height, 20.0);
        assert_eq!(layout.segment_count(), 2);
    }
}
