use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Wall-clock statistics for the display-refresh tick.
///
/// Simulation never reads these: the actor advances a fixed step per tick.
/// The numbers only feed the debug FPS log.
pub struct FrameTimer {
    pub frame_count: u64,
    pub real_dt: f64,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            frame_count: 0,
            real_dt: 0.0,
            last_instant: now,
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    pub fn begin_frame(&mut self) {
        self.record_frame(Instant::now());
    }

    fn record_frame(&mut self, now: Instant) {
        self.real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    /// True once every `FPS_SAMPLE_COUNT` frames, when the window of samples
    /// has been fully refreshed.
    pub fn sample_window_complete(&self) -> bool {
        self.frame_count > 0 && self.fps_sample_index == 0
    }

    /// Forget the gap accumulated while no frames were produced (paused loop).
    pub fn resume(&mut self) {
        self.last_instant = Instant::now();
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
