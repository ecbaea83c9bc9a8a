//! Render quality metrics snapshot.

use crate::config::Configuration;
use crate::histogram::Histogram;

/// Sentinel frame rate meaning no stable rate has been detected yet.
pub const FRAME_RATE_UNDETERMINED: f32 = -1.0;

/// Sentinel frame rate for 24fps content displayed with 3:2 pulldown on a
/// 60Hz display. Compared by equality only, never used arithmetically.
pub const FRAME_RATE_24_3_2_PULLDOWN: f32 = -2.0;

/// A variety of video render quality metrics.
///
/// Counters and histograms accumulate as frame lifecycle events arrive; the
/// scalar scores and rates are derived from them each time the snapshot is
/// read from the tracker.
#[derive(Debug, Clone)]
pub struct RenderQualityMetrics {
    /// The render time of the first video frame, 0 until one renders.
    pub first_render_time_us: i64,

    /// The number of frames released to be rendered.
    pub frame_released_count: i64,

    /// The number of frames actually rendered.
    pub frame_rendered_count: i64,

    /// The number of frames released but never rendered.
    pub frame_dropped_count: i64,

    /// The number of frames intentionally dropped by the app.
    pub frame_skipped_count: i64,

    /// Frame rate detected from the content stream's position timestamps.
    pub content_frame_rate: f32,

    /// Frame rate detected from the app's desired render times.
    pub desired_frame_rate: f32,

    /// Frame rate detected from the actual post-render timestamps.
    pub actual_frame_rate: f32,

    /// Durations of freezes caused by dropped/skipped frames, in ms.
    pub freeze_duration_ms_histogram: Histogram,

    /// Overall freeze score derived from the duration histogram and the
    /// configured score conversion table.
    pub freeze_score: i64,

    /// Fraction of the total playback duration that was frozen.
    pub freeze_rate: f32,

    /// Distances between consecutive freezes, in ms.
    pub freeze_distance_ms_histogram: Histogram,

    /// Judder scores of frames presented off content cadence.
    pub judder_score_histogram: Histogram,

    /// Overall judder score derived from the score histogram and the
    /// configured score conversion table.
    pub judder_score: i64,

    /// Fraction of presented frame opportunities that had judder.
    pub judder_rate: f32,
}

impl RenderQualityMetrics {
    /// Creates empty metrics with histograms sized from the configuration.
    pub(crate) fn new(config: &Configuration) -> Self {
        Self {
            first_render_time_us: 0,
            frame_released_count: 0,
            frame_rendered_count: 0,
            frame_dropped_count: 0,
            frame_skipped_count: 0,
            content_frame_rate: FRAME_RATE_UNDETERMINED,
            desired_frame_rate: FRAME_RATE_UNDETERMINED,
            actual_frame_rate: FRAME_RATE_UNDETERMINED,
            freeze_duration_ms_histogram: Histogram::new(
                &config.freeze_duration_ms_histogram_buckets,
            ),
            freeze_score: 0,
            freeze_rate: 0.0,
            freeze_distance_ms_histogram: Histogram::new(
                &config.freeze_distance_ms_histogram_buckets,
            ),
            judder_score_histogram: Histogram::new(&config.judder_score_histogram_buckets),
            judder_score: 0,
            judder_rate: 0.0,
        }
    }

    /// Resets all counters, rates, and histogram counts. Bucket layouts are
    /// preserved.
    pub(crate) fn clear(&mut self) {
        self.first_render_time_us = 0;
        self.frame_released_count = 0;
        self.frame_rendered_count = 0;
        self.frame_dropped_count = 0;
        self.frame_skipped_count = 0;
        self.content_frame_rate = FRAME_RATE_UNDETERMINED;
        self.desired_frame_rate = FRAME_RATE_UNDETERMINED;
        self.actual_frame_rate = FRAME_RATE_UNDETERMINED;
        self.freeze_duration_ms_histogram.clear();
        self.freeze_score = 0;
        self.freeze_rate = 0.0;
        self.freeze_distance_ms_histogram.clear();
        self.judder_score_histogram.clear();
        self.judder_score = 0;
        self.judder_rate = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_metrics_are_empty() {
        let m = RenderQualityMetrics::new(&Configuration::default());
        assert_eq!(m.first_render_time_us, 0);
        assert_eq!(m.frame_released_count, 0);
        assert_eq!(m.content_frame_rate, FRAME_RATE_UNDETERMINED);
        assert_eq!(m.freeze_duration_ms_histogram.bucket_count(), 13);
        assert_eq!(m.freeze_distance_ms_histogram.bucket_count(), 12);
        assert_eq!(m.judder_score_histogram.bucket_count(), 12);
    }

    #[test]
    fn clear_preserves_bucket_layout() {
        let mut m = RenderQualityMetrics::new(&Configuration::default());
        m.frame_released_count = 7;
        m.freeze_duration_ms_histogram.insert(50);
        m.clear();
        assert_eq!(m.frame_released_count, 0);
        assert_eq!(m.freeze_duration_ms_histogram.count(), 0);
        assert_eq!(m.freeze_duration_ms_histogram.bucket_count(), 13);
    }
}
