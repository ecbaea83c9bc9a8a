//! Tracker configuration.

/// Configurable elements of the quality metrics algorithms.
///
/// The configuration is immutable once a tracker is constructed; the
/// defaults are tuned for typical 20-60 fps content on consumer displays.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Whether render quality is tracked at all. When false, every event and
    /// the metrics snapshot become no-ops.
    pub enabled: bool,

    /// Whether frames the app intentionally decided not to render should be
    /// counted as dropped for all downstream metrics.
    pub are_skipped_frames_dropped: bool,

    /// How large a forward jump in content time is allowed before it is
    /// suspected to be a discontinuity (seek / playlist change) rather than
    /// an unusually long frame.
    pub max_expected_content_frame_duration_us: i64,

    /// Allowed deviation between frame durations when deciding whether two
    /// frames share the same frame rate.
    pub frame_rate_detection_tolerance_us: i64,

    /// A forward jump in content time can also be caused by frame drops on
    /// live content. The jump is compared against the desired-render-time
    /// gap with this tolerance; when they roughly agree the jump is treated
    /// as live-content frame drops instead of a seek.
    pub content_time_advanced_for_live_content_tolerance_us: i64,

    /// Bucket edges for the freeze-duration histogram, in milliseconds.
    pub freeze_duration_ms_histogram_buckets: Vec<i64>,

    /// Per-bucket divisors used to collapse the freeze-duration histogram
    /// into a scalar score. The score is only computed when this has the
    /// same length as the histogram's bucket list.
    pub freeze_duration_ms_histogram_to_score: Vec<i64>,

    /// Bucket edges for the distance-between-freezes histogram, in
    /// milliseconds.
    pub freeze_distance_ms_histogram_buckets: Vec<i64>,

    /// A judder error below this value is not scored as judder.
    pub judder_error_tolerance_us: i64,

    /// Bucket edges for the judder-score histogram.
    pub judder_score_histogram_buckets: Vec<i64>,

    /// Per-bucket divisors used to collapse the judder-score histogram into
    /// a scalar score, under the same length rule as the freeze score.
    pub judder_score_histogram_to_score: Vec<i64>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            enabled: true,

            // Assume the app skips frames because it detected they could not
            // be rendered in time.
            are_skipped_frames_dropped: true,

            // 400ms is 8 frames at 20fps and 24 frames at 60fps.
            max_expected_content_frame_duration_us: 400 * 1000,

            frame_rate_detection_tolerance_us: 2 * 1000,

            content_time_advanced_for_live_content_tolerance_us: 200 * 1000,

            freeze_duration_ms_histogram_buckets: vec![
                1, 20, 40, 60, 80, 100, 120, 150, 175, 225, 300, 400, 500,
            ],
            freeze_duration_ms_histogram_to_score: vec![1; 13],
            freeze_distance_ms_histogram_buckets: vec![
                0, 20, 100, 400, 1000, 2000, 3000, 4000, 8000, 15000, 30000, 60000,
            ],

            judder_error_tolerance_us: 2000,
            judder_score_histogram_buckets: vec![1, 4, 5, 9, 11, 20, 30, 40, 50, 60, 70, 80],
            judder_score_histogram_to_score: vec![1; 12],
        }
    }
}
