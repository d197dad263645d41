//=========================================================================
// Frame Statistics
//=========================================================================
//
// Rolling frame-rate and frame-cost counters, summarized once per
// reporting window.
//
// A window opens on the first recorded frame and closes on the first
// frame at least `REPORT_INTERVAL_MS` later. The opening frame only marks
// the start; frames after it are counted.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

//=== Constants ===========================================================

/// Length of one reporting window, in frame-timestamp milliseconds.
pub const REPORT_INTERVAL_MS: f64 = 1000.0;

//=== PerfReport ==========================================================

/// Summary of one closed window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfReport {
    /// Delivered frames per second of timestamp time.
    pub fps: f64,
    /// Mean host time spent handling a frame.
    pub mean_frame_ms: f64,
    pub max_frame_ms: f64,
    /// Mean simulation steps run per frame.
    pub steps_per_frame: f64,
}

//=== FrameStats ==========================================================

#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    window_start_ms: Option<f64>,
    frames: u32,
    steps: u64,
    busy: Duration,
    max_busy: Duration,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame delivered at `timestamp_ms` that took `busy` to
    /// handle and ran `steps` simulation steps.
    ///
    /// Returns the summary when this frame closes the window.
    pub fn record(&mut self, timestamp_ms: f64, busy: Duration, steps: u32) -> Option<PerfReport> {
        let start = match self.window_start_ms {
            Some(start) => start,
            None => {
                self.window_start_ms = Some(timestamp_ms);
                return None;
            }
        };

        self.frames += 1;
        self.steps += u64::from(steps);
        self.busy += busy;
        self.max_busy = self.max_busy.max(busy);

        let elapsed = (timestamp_ms - start).abs();
        if elapsed < REPORT_INTERVAL_MS {
            return None;
        }

        let frames = f64::from(self.frames);
        let report = PerfReport {
            fps: frames * 1000.0 / elapsed,
            mean_frame_ms: self.busy.as_secs_f64() * 1000.0 / frames,
            max_frame_ms: self.max_busy.as_secs_f64() * 1000.0,
            steps_per_frame: self.steps as f64 / frames,
        };

        *self = Self {
            window_start_ms: Some(timestamp_ms),
            ..Self::default()
        };
        Some(report)
    }

    /// Drops the open window; the next frame starts a new one.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Frames counted in the open window.
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
