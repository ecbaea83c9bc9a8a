//! The event-driven render quality tracking state machine.
//!
//! The tracker consumes per-frame lifecycle events from the playback
//! pipeline (release, render, skip, tunnel-queue) and reconciles them into a
//! single rendered-frame timeline. Three timestamps drive the analysis:
//!
//! * the content timestamp embedded in the stream, giving each frame's
//!   position;
//! * the desired render time passed in by the app, giving the wall-clock
//!   time the frame was supposed to appear;
//! * the actual render time reported by the display subsystem.
//!
//! From these the tracker derives each frame's outcome (rendered, dropped,
//! skipped), detects the three frame rates, and classifies lost smoothness
//! as freeze or judder.
//!
//! All methods must be called from the single thread that owns the tracker;
//! nothing here blocks, spawns, or locks.

use std::collections::VecDeque;

use tracing::{info, warn};

use crate::clock::{MonotonicClock, SystemClock};
use crate::config::Configuration;
use crate::frame_duration::FrameDurationHistory;
use crate::frame_rate::update_frame_rate;
use crate::freeze_judder::{compute_previous_judder_score, process_freeze};
use crate::histogram::Histogram;
use crate::metrics::RenderQualityMetrics;

/// A released frame waiting for its render resolution.
#[derive(Debug, Clone, Copy)]
struct FrameInfo {
    content_time_us: i64,
    desired_render_time_us: i64,
}

/// Resolution used when a render event cannot be matched to a release.
const NO_FRAME: FrameInfo = FrameInfo {
    content_time_us: -1,
    desired_render_time_us: -1,
};

/// Tracks video render quality over one playback session.
///
/// # Example
///
/// ```
/// use render_quality::RenderQualityTracker;
///
/// let mut tracker = RenderQualityTracker::new();
/// tracker.on_frame_released_at(0, 0);
/// tracker.on_frame_rendered(0, 0);
/// assert_eq!(tracker.metrics().frame_rendered_count, 1);
/// ```
pub struct RenderQualityTracker {
    config: Configuration,

    /// Updated on every frame event; scalar scores and rates are derived
    /// when the snapshot is read.
    metrics: RenderQualityMetrics,

    /// The most recently released position in the content stream.
    last_content_time_us: i64,

    /// The wall-clock time the most recent frame was rendered.
    last_render_time_us: i64,

    /// The render time of the first frame after the most recent freeze.
    last_freeze_end_time_us: i64,

    /// Wall time between the first and the latest render, in ms.
    render_duration_ms: i64,

    /// Content times of frames skipped since the last render. Skips that
    /// turn out to precede end-of-playback are never counted, so they are
    /// held here until the next render proves playback continued.
    pending_skipped_frame_content_time_us: Vec<i64>,

    /// Released frames in release order. The display only signals rendered
    /// frames, so a drop is detected when a later frame renders while an
    /// earlier one is still queued here.
    next_expected_rendered_frames: VecDeque<FrameInfo>,

    /// In tunnel mode a P-frame is queued before the B-frames it follows in
    /// render order, so it is parked here instead of entering the expected
    /// queue out of order. -1 when empty.
    tunnel_frame_queued_content_time_us: i64,

    content_frame_duration_us: FrameDurationHistory,
    desired_frame_duration_us: FrameDurationHistory,
    actual_frame_duration_us: FrameDurationHistory,

    clock: Box<dyn MonotonicClock>,
}

impl RenderQualityTracker {
    /// Creates a tracker with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Configuration::default())
    }

    /// Creates a tracker with the given configuration.
    pub fn with_config(config: Configuration) -> Self {
        Self::with_config_and_clock(config, Box::new(SystemClock::new()))
    }

    /// Creates a tracker with the given configuration and monotonic clock.
    ///
    /// The clock is only consulted by [`on_frame_released`], which needs the
    /// current time as the desired render time.
    ///
    /// [`on_frame_released`]: Self::on_frame_released
    pub fn with_config_and_clock(config: Configuration, clock: Box<dyn MonotonicClock>) -> Self {
        let metrics = RenderQualityMetrics::new(&config);
        let mut tracker = Self {
            config,
            metrics,
            last_content_time_us: -1,
            last_render_time_us: -1,
            last_freeze_end_time_us: -1,
            render_duration_ms: 0,
            pending_skipped_frame_content_time_us: Vec::new(),
            next_expected_rendered_frames: VecDeque::new(),
            tunnel_frame_queued_content_time_us: -1,
            content_frame_duration_us: FrameDurationHistory::new(),
            desired_frame_duration_us: FrameDurationHistory::new(),
            actual_frame_duration_us: FrameDurationHistory::new(),
            clock,
        };
        tracker.clear();
        tracker
    }

    /// Called when a tunnel mode frame has been queued for display.
    ///
    /// Tunneled decoders queue frames to the display directly and can queue
    /// a P-frame before the B-frames that render ahead of it. The most
    /// recently queued frame is parked until a frame with a smaller content
    /// time shows up (it was the B-frame) or a larger one replaces it. This
    /// relies on encoders allowing B-frames to reference only one future
    /// P-frame per mini-GOP; streams violating that assumption will see
    /// misordered releases.
    pub fn on_tunnel_frame_queued(&mut self, content_time_us: i64) {
        if !self.config.enabled {
            return;
        }

        if self.tunnel_frame_queued_content_time_us == -1 {
            self.tunnel_frame_queued_content_time_us = content_time_us;
        } else if content_time_us < self.tunnel_frame_queued_content_time_us {
            // The incoming frame renders before the parked one. Releasing it
            // can reset session tracking (first release, seek), which clears
            // the park slot; the parked frame is still in flight, so keep it.
            let held = self.tunnel_frame_queued_content_time_us;
            self.on_frame_released_at(content_time_us, 0);
            self.tunnel_frame_queued_content_time_us = held;
        } else {
            let held = self.tunnel_frame_queued_content_time_us;
            self.on_frame_released_at(held, 0);
            self.tunnel_frame_queued_content_time_us = content_time_us;
        }
    }

    /// Called when the app intentionally decided not to render a frame.
    pub fn on_frame_skipped(&mut self, content_time_us: i64) {
        if !self.config.enabled {
            return;
        }

        // Skips before the first render are the app seeking to a start
        // position that isn't a key frame; they say nothing about quality.
        if self.last_render_time_us == -1 {
            return;
        }
        // Skips right before end-of-playback shouldn't count either, so they
        // are processed only once a later frame renders.
        self.pending_skipped_frame_content_time_us.push(content_time_us);
    }

    /// Called when the app asked for a frame to be rendered as soon as
    /// possible. The current monotonic time stands in for the desired
    /// render time.
    pub fn on_frame_released(&mut self, content_time_us: i64) {
        let desired_render_time_ns = self.clock.now_us() * 1000;
        self.on_frame_released_at(content_time_us, desired_render_time_ns);
    }

    /// Called when the app asked for a frame to be rendered at a specific
    /// point in time.
    pub fn on_frame_released_at(&mut self, content_time_us: i64, desired_render_time_ns: i64) {
        if !self.config.enabled {
            return;
        }

        let desired_render_time_us = desired_render_time_ns / 1000;
        self.reset_if_discontinuity(content_time_us, desired_render_time_us);
        self.metrics.frame_released_count += 1;
        self.next_expected_rendered_frames.push_back(FrameInfo {
            content_time_us,
            desired_render_time_us,
        });
        self.last_content_time_us = content_time_us;
    }

    /// Called when the display subsystem reports that a frame was actually
    /// rendered.
    pub fn on_frame_rendered(&mut self, content_time_us: i64, actual_render_time_ns: i64) {
        if !self.config.enabled {
            return;
        }

        let actual_render_time_us = actual_render_time_ns / 1000;

        if self.last_render_time_us != -1 {
            self.render_duration_ms += (actual_render_time_us - self.last_render_time_us) / 1000;
        }

        // Playback continued past the pending skips, so they were real skips
        // and not the tail of the session.
        let pending = std::mem::take(&mut self.pending_skipped_frame_content_time_us);
        for skipped_content_time_us in pending {
            self.process_metrics_for_skipped_frame(skipped_content_time_us);
        }

        // A parked tunnel frame that renders is the last frame of the video;
        // release it so it can resolve below.
        if content_time_us == self.tunnel_frame_queued_content_time_us
            && self.tunnel_frame_queued_content_time_us != -1
        {
            let held = self.tunnel_frame_queued_content_time_us;
            self.on_frame_released_at(held, 0);
            self.tunnel_frame_queued_content_time_us = -1;
        }

        let mut next_expected_frame = NO_FRAME;
        let mut resolved = false;
        while let Some(frame) = self.next_expected_rendered_frames.pop_front() {
            next_expected_frame = frame;
            // Happy path: the rendered frame is the one expected next.
            if content_time_us == frame.content_time_us {
                resolved = true;
                break;
            }
            // The next rendered frame should be the expected frame or, with
            // drops, one later in the content stream.
            if content_time_us < frame.content_time_us {
                warn!(
                    "rendered frame at {content_time_us}us is earlier than the next expected \
                     frame at {}us",
                    frame.content_time_us
                );
                resolved = true;
                break;
            }
            // The expected frame was passed over, so it was dropped.
            self.process_metrics_for_dropped_frame(
                frame.content_time_us,
                frame.desired_render_time_us,
            );
        }
        if !resolved {
            next_expected_frame = NO_FRAME;
        }
        self.process_metrics_for_rendered_frame(
            next_expected_frame.content_time_us,
            next_expected_frame.desired_render_time_us,
            actual_render_time_us,
        );
        self.last_render_time_us = actual_render_time_us;
    }

    /// Returns the metrics with the scalar scores and rates recomputed.
    pub fn metrics(&mut self) -> &RenderQualityMetrics {
        if !self.config.enabled {
            return &self.metrics;
        }

        self.metrics.freeze_score = compute_tail_score(
            &self.metrics.freeze_duration_ms_histogram,
            &self.config.freeze_duration_ms_histogram_to_score,
        );
        self.metrics.freeze_rate = ratio(
            self.metrics.freeze_duration_ms_histogram.sum(),
            self.render_duration_ms,
        );

        self.metrics.judder_score = compute_tail_score(
            &self.metrics.judder_score_histogram,
            &self.config.judder_score_histogram_to_score,
        );
        self.metrics.judder_rate = ratio(
            self.metrics.judder_score_histogram.count(),
            self.metrics.frame_released_count + self.metrics.frame_skipped_count,
        );

        &self.metrics
    }

    /// Resets all session tracking, e.g. because the codec was flushed.
    ///
    /// Metrics survive: counters and histograms accumulate across
    /// discontinuities, while the timeline state they are derived from does
    /// not.
    pub fn reset_for_discontinuity(&mut self) {
        self.last_content_time_us = -1;
        self.last_render_time_us = -1;
        self.last_freeze_end_time_us = -1;

        // Render timing around the discontinuity says nothing about content
        // smoothness, so in-flight frames are forgotten rather than resolved.
        self.next_expected_rendered_frames.clear();
        self.tunnel_frame_queued_content_time_us = -1;

        // Skips just prior to the discontinuity belong to the old position.
        self.pending_skipped_frame_content_time_us.clear();

        // All bets are off on what the render durations should be now.
        self.content_frame_duration_us.reset();
        self.desired_frame_duration_us.reset();
        self.actual_frame_duration_us.reset();
    }

    /// Clears all metrics and session tracking, e.g. because the codec was
    /// reconfigured.
    pub fn clear(&mut self) {
        self.render_duration_ms = 0;
        self.metrics.clear();
        self.reset_for_discontinuity();
    }

    /// Detects backward and forward seeks from the content time and resets
    /// session tracking when one occurred. Returns whether it reset.
    fn reset_if_discontinuity(&mut self, content_time_us: i64, desired_render_time_us: i64) -> bool {
        if self.last_content_time_us == -1 {
            self.reset_for_discontinuity();
            return true;
        }
        if content_time_us < self.last_content_time_us {
            info!(
                "playback jumped {}ms backwards in content time ({}ms -> {}ms)",
                (self.last_content_time_us - content_time_us) / 1000,
                self.last_content_time_us / 1000,
                content_time_us / 1000
            );
            self.reset_for_discontinuity();
            return true;
        }
        if content_time_us - self.last_content_time_us
            > self.config.max_expected_content_frame_duration_us
        {
            // Long content frames also come from frame drops on live
            // content. There the app keeps desired render times on cadence,
            // so the content jump and the desired-render gap roughly agree.
            // A false positive needs the user to seek forward by exactly the
            // time the seek took, which is possible but rare.
            let content_frame_duration_us = content_time_us - self.last_content_time_us;
            let desired_frame_duration_us = desired_render_time_us - self.last_render_time_us;
            let is_live_content_frame_drop = (content_frame_duration_us
                - desired_frame_duration_us)
                .abs()
                < self.config.content_time_advanced_for_live_content_tolerance_us;
            if !is_live_content_frame_drop {
                info!(
                    "playback jumped {}ms forward in content time ({}ms -> {}ms)",
                    (content_time_us - self.last_content_time_us) / 1000,
                    self.last_content_time_us / 1000,
                    content_time_us / 1000
                );
                self.reset_for_discontinuity();
                return true;
            }
        }
        false
    }

    fn process_metrics_for_skipped_frame(&mut self, content_time_us: i64) {
        self.metrics.frame_skipped_count += 1;
        if self.config.are_skipped_frames_dropped {
            self.process_metrics_for_dropped_frame(content_time_us, -1);
            return;
        }
        self.content_frame_duration_us.update(content_time_us);
        self.desired_frame_duration_us.update(-1);
        self.actual_frame_duration_us.update(-1);
        update_frame_rate(
            &mut self.metrics.content_frame_rate,
            &self.content_frame_duration_us,
            &self.config,
        );
    }

    fn process_metrics_for_dropped_frame(
        &mut self,
        content_time_us: i64,
        desired_render_time_us: i64,
    ) {
        self.metrics.frame_dropped_count += 1;
        self.content_frame_duration_us.update(content_time_us);
        self.desired_frame_duration_us.update(desired_render_time_us);
        self.actual_frame_duration_us.update(-1);
        update_frame_rate(
            &mut self.metrics.content_frame_rate,
            &self.content_frame_duration_us,
            &self.config,
        );
        update_frame_rate(
            &mut self.metrics.desired_frame_rate,
            &self.desired_frame_duration_us,
            &self.config,
        );
    }

    fn process_metrics_for_rendered_frame(
        &mut self,
        content_time_us: i64,
        desired_render_time_us: i64,
        actual_render_time_us: i64,
    ) {
        if self.metrics.first_render_time_us == 0 {
            self.metrics.first_render_time_us = actual_render_time_us;
        }

        self.metrics.frame_rendered_count += 1;

        // A content time of -1 means the frame rendered right after a
        // discontinuity with nothing queued; count it and move on, since
        // smoothness is meaningless at that boundary.
        if content_time_us == -1 {
            return;
        }
        self.content_frame_duration_us.update(content_time_us);
        self.desired_frame_duration_us.update(desired_render_time_us);
        self.actual_frame_duration_us.update(actual_render_time_us);
        update_frame_rate(
            &mut self.metrics.content_frame_rate,
            &self.content_frame_duration_us,
            &self.config,
        );
        update_frame_rate(
            &mut self.metrics.desired_frame_rate,
            &self.desired_frame_duration_us,
            &self.config,
        );
        update_frame_rate(
            &mut self.metrics.actual_frame_rate,
            &self.actual_frame_duration_us,
            &self.config,
        );

        // A missing duration one slot back means the prior frame dropped:
        // that's a freeze, provided something rendered before it.
        if self.actual_frame_duration_us[1] == -1 && self.last_render_time_us != -1 {
            process_freeze(
                actual_render_time_us,
                self.last_render_time_us,
                self.last_freeze_end_time_us,
                &mut self.metrics,
            );
            self.last_freeze_end_time_us = actual_render_time_us;
        }

        // Judder describes the previous frame, not the current one.
        let judder_score = compute_previous_judder_score(
            &self.actual_frame_duration_us,
            &self.content_frame_duration_us,
            &self.config,
        );
        if judder_score != 0 {
            self.metrics.judder_score_histogram.insert(judder_score);
        }
    }
}

impl Default for RenderQualityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapses a histogram into a scalar score: bucket `i` contributes the
/// count of samples at bucket `i` or above, divided by divisor `i`.
///
/// The score is 0 when the divisor vector doesn't match the bucket list or
/// contains a zero (score disabled rather than a division fault).
fn compute_tail_score(histogram: &Histogram, to_score: &[i64]) -> i64 {
    if to_score.len() != histogram.bucket_count() || to_score.contains(&0) {
        return 0;
    }
    let mut score = 0;
    for (i, divisor) in to_score.iter().enumerate() {
        let tail_count: i64 = (i..histogram.bucket_count()).map(|j| histogram.bucket(j)).sum();
        score += tail_count / divisor;
    }
    score
}

/// `numerator / denominator` as f32, 0.0 when the denominator is 0.
fn ratio(numerator: i64, denominator: i64) -> f32 {
    if denominator == 0 {
        0.0
    } else {
        (numerator as f64 / denominator as f64) as f32
    }
}
