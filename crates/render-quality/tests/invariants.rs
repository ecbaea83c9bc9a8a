//! Property-based checks of the tracker's accounting invariants.
//!
//! These drive the tracker with arbitrary well-formed event sequences (a
//! pipeline releasing, rendering, dropping, and skipping frames at a fixed
//! content cadence) and check the bookkeeping rules that must hold for every
//! such sequence.

use proptest::prelude::*;
use render_quality::{Configuration, RenderQualityTracker, FRAME_RATE_UNDETERMINED};

const CADENCE_US: i64 = 16_667;

/// One frame lifecycle outcome, as the pipeline would produce it.
#[derive(Debug, Clone)]
enum Step {
    /// Release the next frame and render it after holding the previous one
    /// on screen for `hold_ms`.
    Render { hold_ms: u8 },
    /// Release the next frame and never render it.
    Drop,
    /// Skip the next frame without releasing it.
    Skip,
}

fn steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            (1u8..50).prop_map(|hold_ms| Step::Render { hold_ms }),
            Just(Step::Drop),
            Just(Step::Skip),
        ],
        0..64,
    )
}

/// Replays steps against a tracker while advancing media and wall time.
struct Playback {
    tracker: RenderQualityTracker,
    media_time_us: i64,
    clock_time_ns: i64,
}

impl Playback {
    fn new(config: Configuration) -> Self {
        Self {
            tracker: RenderQualityTracker::with_config(config),
            media_time_us: 0,
            clock_time_ns: 0,
        }
    }

    fn apply(&mut self, step: &Step) {
        match step {
            Step::Render { hold_ms } => {
                self.clock_time_ns += i64::from(*hold_ms) * 1_000_000;
                self.tracker
                    .on_frame_released_at(self.media_time_us, self.clock_time_ns);
                self.tracker
                    .on_frame_rendered(self.media_time_us, self.clock_time_ns);
            }
            Step::Drop => {
                self.clock_time_ns += CADENCE_US * 1000;
                self.tracker
                    .on_frame_released_at(self.media_time_us, self.clock_time_ns);
            }
            Step::Skip => {
                self.clock_time_ns += CADENCE_US * 1000;
                self.tracker.on_frame_skipped(self.media_time_us);
            }
        }
        self.media_time_us += CADENCE_US;
    }
}

proptest! {
    /// Without skip reclassification, a frame only resolves through the
    /// expected queue, so resolutions can never outnumber releases; once a
    /// final render drains the queue the counts agree exactly.
    #[test]
    fn resolutions_never_exceed_releases(steps in steps()) {
        let config = Configuration {
            are_skipped_frames_dropped: false,
            ..Configuration::default()
        };
        let mut playback = Playback::new(config);
        for step in &steps {
            playback.apply(step);
            let metrics = playback.tracker.metrics();
            prop_assert!(
                metrics.frame_rendered_count + metrics.frame_dropped_count
                    <= metrics.frame_released_count
            );
        }
        playback.apply(&Step::Render { hold_ms: 16 });
        let metrics = playback.tracker.metrics();
        prop_assert_eq!(
            metrics.frame_rendered_count + metrics.frame_dropped_count,
            metrics.frame_released_count
        );
    }

    /// With skips reclassified as drops (the default), every resolved frame
    /// is still accounted to exactly one origin: a release or a skip.
    #[test]
    fn skip_reclassification_balances_against_skip_count(steps in steps()) {
        let mut playback = Playback::new(Configuration::default());
        for step in &steps {
            playback.apply(step);
            let metrics = playback.tracker.metrics();
            prop_assert!(
                metrics.frame_rendered_count + metrics.frame_dropped_count
                    <= metrics.frame_released_count + metrics.frame_skipped_count
            );
        }
        playback.apply(&Step::Render { hold_ms: 16 });
        let metrics = playback.tracker.metrics();
        prop_assert_eq!(
            metrics.frame_rendered_count + metrics.frame_dropped_count,
            metrics.frame_released_count + metrics.frame_skipped_count
        );
    }

    /// `clear` returns every counter, rate, and histogram to its initial
    /// state regardless of what came before.
    #[test]
    fn clear_zeroes_everything(steps in steps()) {
        let mut playback = Playback::new(Configuration::default());
        for step in &steps {
            playback.apply(step);
        }
        playback.tracker.clear();
        let metrics = playback.tracker.metrics();
        prop_assert_eq!(metrics.frame_released_count, 0);
        prop_assert_eq!(metrics.frame_rendered_count, 0);
        prop_assert_eq!(metrics.frame_dropped_count, 0);
        prop_assert_eq!(metrics.frame_skipped_count, 0);
        prop_assert_eq!(metrics.first_render_time_us, 0);
        prop_assert_eq!(metrics.content_frame_rate, FRAME_RATE_UNDETERMINED);
        prop_assert_eq!(metrics.desired_frame_rate, FRAME_RATE_UNDETERMINED);
        prop_assert_eq!(metrics.actual_frame_rate, FRAME_RATE_UNDETERMINED);
        prop_assert_eq!(metrics.freeze_duration_ms_histogram.count(), 0);
        prop_assert_eq!(metrics.freeze_distance_ms_histogram.count(), 0);
        prop_assert_eq!(metrics.judder_score_histogram.count(), 0);
        prop_assert_eq!(metrics.freeze_score, 0);
        prop_assert_eq!(metrics.judder_score, 0);
        prop_assert_eq!(metrics.freeze_rate, 0.0);
        prop_assert_eq!(metrics.judder_rate, 0.0);
    }

    /// A discontinuity reset wipes timeline state but leaves the
    /// accumulated metrics untouched.
    #[test]
    fn discontinuity_reset_preserves_metrics(steps in steps()) {
        let mut playback = Playback::new(Configuration::default());
        for step in &steps {
            playback.apply(step);
        }
        let before = playback.tracker.metrics().clone();
        playback.tracker.reset_for_discontinuity();
        let after = playback.tracker.metrics();
        prop_assert_eq!(after.frame_released_count, before.frame_released_count);
        prop_assert_eq!(after.frame_rendered_count, before.frame_rendered_count);
        prop_assert_eq!(after.frame_dropped_count, before.frame_dropped_count);
        prop_assert_eq!(after.frame_skipped_count, before.frame_skipped_count);
        prop_assert_eq!(
            after.freeze_duration_ms_histogram.count(),
            before.freeze_duration_ms_histogram.count()
        );
        prop_assert_eq!(
            after.freeze_distance_ms_histogram.count(),
            before.freeze_distance_ms_histogram.count()
        );
        prop_assert_eq!(
            after.judder_score_histogram.count(),
            before.judder_score_histogram.count()
        );
    }

    /// Frame rates only move from undetermined to a detected value, never
    /// back: transient instability keeps the previous reading.
    #[test]
    fn frame_rates_never_revert_to_undetermined(steps in steps()) {
        let mut playback = Playback::new(Configuration::default());
        let mut actual_was_determined = false;
        let mut content_was_determined = false;
        for step in &steps {
            playback.apply(step);
            let metrics = playback.tracker.metrics();
            if actual_was_determined {
                prop_assert_ne!(metrics.actual_frame_rate, FRAME_RATE_UNDETERMINED);
            }
            if content_was_determined {
                prop_assert_ne!(metrics.content_frame_rate, FRAME_RATE_UNDETERMINED);
            }
            actual_was_determined |= metrics.actual_frame_rate != FRAME_RATE_UNDETERMINED;
            content_was_determined |= metrics.content_frame_rate != FRAME_RATE_UNDETERMINED;
        }
    }

    /// Judder scores are positive millisecond values; zero-scored frames
    /// are never recorded.
    #[test]
    fn recorded_judder_scores_are_positive(steps in steps()) {
        let mut playback = Playback::new(Configuration::default());
        for step in &steps {
            playback.apply(step);
        }
        let metrics = playback.tracker.metrics();
        if metrics.judder_score_histogram.count() > 0 {
            prop_assert!(metrics.judder_score_histogram.min() > 0);
        }
    }
}
