//! Classification of lost smoothness as freeze or judder.
//!
//! A freeze is a visible gap in presented frames caused by drops; judder is
//! a frame presented at a time that does not match the content cadence while
//! rendering is otherwise continuous. The two are mutually exclusive per
//! frame: windows containing a drop are scored as freeze only.

use crate::config::Configuration;
use crate::frame_duration::FrameDurationHistory;
use crate::metrics::RenderQualityMetrics;

/// Records a freeze that ended at `actual_render_time_us`.
///
/// The freeze duration spans from the previous render to the current one;
/// the distance histogram captures how long playback ran smoothly since the
/// end of the previous freeze, when there was one.
pub(crate) fn process_freeze(
    actual_render_time_us: i64,
    last_render_time_us: i64,
    last_freeze_end_time_us: i64,
    metrics: &mut RenderQualityMetrics,
) {
    let freeze_duration_ms = (actual_render_time_us - last_render_time_us) / 1000;
    metrics.freeze_duration_ms_histogram.insert(freeze_duration_ms);
    if last_freeze_end_time_us != -1 {
        let distance_since_last_freeze_ms = (last_render_time_us - last_freeze_end_time_us) / 1000;
        metrics
            .freeze_distance_ms_histogram
            .insert(distance_since_last_freeze_ms);
    }
}

/// Computes a judder score for the previously rendered frame.
///
/// The score describes the frame in slot 1 of the duration windows and is
/// only produced for three consecutive rendered frames; any drop in the
/// window is already accounted for as a freeze. Returns 0 when the frame is
/// not considered juddered.
pub(crate) fn compute_previous_judder_score(
    actual_frame_duration_us: &FrameDurationHistory,
    content_frame_duration_us: &FrameDurationHistory,
    config: &Configuration,
) -> i64 {
    // A dropped frame before or after means freeze, not judder.
    if actual_frame_duration_us[0] == -1
        || actual_frame_duration_us[1] == -1
        || actual_frame_duration_us[2] == -1
    {
        return 0;
    }

    // A long hold means playback was paused, rebuffering, or intentionally
    // playing below content rate (e.g. half-rate). An unintentional long
    // hold is expected to end in a frame drop and be scored as a freeze.
    if actual_frame_duration_us[1] >= 2 * content_frame_duration_us[1] {
        return 0;
    }

    let mut error_us = actual_frame_duration_us[1] - content_frame_duration_us[1];
    if error_us.abs() < config.judder_error_tolerance_us {
        return 0;
    }

    // Penalize a frame whose error amplifies the previous frame's error
    // instead of catching up for it: (50, 16, 16, 50) reads smoother than
    // (50, 16, 50, 16) even though the per-frame errors match.
    let previous_error_us = actual_frame_duration_us[2] - content_frame_duration_us[2];
    if previous_error_us.abs() >= config.judder_error_tolerance_us {
        error_us = error_us.abs() + (error_us + previous_error_us).abs();
    }

    // Ignore cadence-sized oscillations such as 3:2 pulldown.
    if error_us.abs() < content_frame_duration_us[1] / 4 {
        return 0;
    }

    // Report in milliseconds to keep scores small.
    error_us.abs() / 1000
}
