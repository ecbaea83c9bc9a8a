//! Frame-rate detection from short windows of frame durations.
//!
//! A rate is only reported while the recent durations are stable, with one
//! special case: the alternating 2-vsync/3-vsync cadence of 24fps content on
//! a 60Hz display (3:2 pulldown) is recognized as its own sentinel rate.

use crate::config::Configuration;
use crate::frame_duration::FrameDurationHistory;
use crate::metrics::{FRAME_RATE_24_3_2_PULLDOWN, FRAME_RATE_UNDETERMINED};

/// Overwrites `frame_rate` only when a rate can currently be detected, so a
/// previously detected rate sticks across transient instability.
pub(crate) fn update_frame_rate(
    frame_rate: &mut f32,
    durations: &FrameDurationHistory,
    config: &Configuration,
) {
    let new_frame_rate = detect_frame_rate(durations, config);
    if new_frame_rate != FRAME_RATE_UNDETERMINED {
        *frame_rate = new_frame_rate;
    }
}

/// Examines the recent frame durations to detect the current frame rate.
///
/// Returns [`FRAME_RATE_UNDETERMINED`] unless the last three durations agree
/// within tolerance, or [`FRAME_RATE_24_3_2_PULLDOWN`] when the window shows
/// a 3:2 pulldown cadence instead.
pub(crate) fn detect_frame_rate(
    durations: &FrameDurationHistory,
    config: &Configuration,
) -> f32 {
    // Three durations are necessary to call a rate stable.
    if durations[0] == -1 || durations[1] == -1 || durations[2] == -1 {
        return FRAME_RATE_UNDETERMINED;
    }
    let tolerance = config.frame_rate_detection_tolerance_us;
    if (durations[0] - durations[1]).abs() > tolerance
        || (durations[0] - durations[2]).abs() > tolerance
    {
        return if is_32_pulldown(durations, config) {
            FRAME_RATE_24_3_2_PULLDOWN
        } else {
            FRAME_RATE_UNDETERMINED
        };
    }
    1_000_000.0 / durations[0] as f32
}

/// Whether the duration window shows 24fps content on a 60Hz display, held
/// alternately for 2 vsyncs (~33.3ms) and 3 vsyncs (~50.0ms).
fn is_32_pulldown(durations: &FrameDurationHistory, config: &Configuration) -> bool {
    // A full pulldown cycle spans five frames.
    if durations[0] == -1
        || durations[1] == -1
        || durations[2] == -1
        || durations[3] == -1
        || durations[4] == -1
    {
        return false;
    }
    let tolerance = config.frame_rate_detection_tolerance_us;
    // Every other frame must have identical duration...
    if (durations[0] - durations[2]).abs() > tolerance
        || (durations[1] - durations[3]).abs() > tolerance
        || (durations[0] - durations[4]).abs() > tolerance
    {
        return false;
    }
    // ... alternating between 2-vsync and 3-vsync holds.
    ((durations[0] - 33_333).abs() < tolerance && (durations[1] - 50_000).abs() < tolerance)
        || ((durations[0] - 50_000).abs() < tolerance
            && (durations[1] - 33_333).abs() < tolerance)
}
