use std::fmt::Write as _;

/// Default averaging window for the frame-rate readout.
pub const FPS_INTERVAL_MS: u64 = 1000;

/// Frames-per-second accounting driven by millisecond ticks.
///
/// The counter never reads a clock itself; callers feed it the platform tick
/// value once per presented frame. Elapsed time is measured between readouts,
/// so the reported rate is an average over at least one `interval_ms` window.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    last_ticks: u64,
    frames: u32,
    value: f32,
    interval_ms: u64,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::with_interval(FPS_INTERVAL_MS)
    }

    pub fn with_interval(interval_ms: u64) -> Self {
        debug_assert!(interval_ms > 0);
        Self {
            last_ticks: 0,
            frames: 0,
            value: 0.0,
            interval_ms: interval_ms.max(1),
        }
    }

    /// Restarts the window at `now_ms` and drops any counted frames.
    pub fn reset(&mut self, now_ms: u64) {
        self.last_ticks = now_ms;
        self.frames = 0;
    }

    /// Counts one frame presented at `now_ms`.
    ///
    /// Returns the new rate when the window has elapsed, `None` otherwise.
    pub fn frame(&mut self, now_ms: u64) -> Option<f32> {
        self.frames = self.frames.saturating_add(1);

        // Ticks are monotonic; a regression reads as no time passing.
        let elapsed = now_ms.saturating_sub(self.last_ticks);
        if elapsed < self.interval_ms {
            return None;
        }

        self.value = (self.frames as f32 * 1000.0) / elapsed as f32;
        self.frames = 0;
        self.last_ticks = now_ms;

        Some(self.value)
    }

    /// Most recent readout; zero before the first window completes.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Frames counted in the current window.
    #[inline]
    pub fn pending_frames(&self) -> u32 {
        self.frames
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders `"<base> - <fps> FPS"` with one decimal place into `out`.
pub fn write_title(out: &mut String, base: &str, fps: f32) {
    out.clear();
    // Writing into a String cannot fail.
    let _ = write!(out, "{base} - {fps:.1} FPS");
}
