//! render-quality: render quality tracking for video playback pipelines.
//!
//! This crate analyzes per-frame lifecycle events from a media pipeline to
//! measure how smoothly content is being presented. It contains:
//!
//! - The event-driven state machine: [`tracker`]
//! - The output snapshot and frame-rate sentinels: [`metrics`]
//! - Tuning knobs: [`config`]
//! - Counting histograms for freeze and judder distributions: [`histogram`]
//! - The injectable monotonic time source: [`clock`]
//!
//! The tracker is single-threaded by design: every event method and the
//! metrics read must be called from the thread that owns the tracker,
//! typically the pipeline's playback thread. Nothing blocks or allocates on
//! the per-frame path beyond bookkeeping for in-flight frames.
//!
//! # Usage
//!
//! ```
//! use render_quality::RenderQualityTracker;
//!
//! let mut tracker = RenderQualityTracker::new();
//!
//! // Driven by the pipeline for every frame:
//! tracker.on_frame_released_at(/* content */ 0, /* desired ns */ 0);
//! tracker.on_frame_rendered(/* content */ 0, /* actual ns */ 0);
//!
//! let metrics = tracker.metrics();
//! println!("rendered: {}", metrics.frame_rendered_count);
//! println!("freeze score: {}", metrics.freeze_score);
//! ```

pub mod clock;
pub mod config;
mod frame_duration;
mod frame_rate;
mod freeze_judder;
pub mod histogram;
pub mod metrics;
pub mod tracker;

pub use clock::{MonotonicClock, SystemClock};
pub use config::Configuration;
pub use histogram::Histogram;
pub use metrics::{RenderQualityMetrics, FRAME_RATE_24_3_2_PULLDOWN, FRAME_RATE_UNDETERMINED};
pub use tracker::RenderQualityTracker;
