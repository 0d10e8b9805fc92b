//! Frame timing.
//!
//! [`Time`] is the render loop's single source of elapsed time, delta time
//! and frame rate. FPS is the number of frames counted in the last full
//! one-second window, so it is an integer and updates once per second.
//!
//! Two clocks come out of each update. The simulation clock stops while
//! paused; the frame delta is wall-clock time between redraws and never
//! stops.
//!
//! ```ignore
//! let mut time = Time::new();
//!
//! // In the redraw handler:
//! let (elapsed, delta) = time.update();
//! let frame_delta = time.frame_delta();
//! println!("{} FPS", time.fps());
//! ```

use std::time::{Duration, Instant};

/// Length of the FPS sampling window.
pub const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Time tracking for the render loop.
#[derive(Debug)]
pub struct Time {
    /// When the timer was created.
    start: Instant,
    /// When the last unpaused frame occurred.
    last_frame: Instant,
    /// When the last frame of any kind occurred.
    last_tick: Instant,
    /// Total elapsed time in seconds, excluding pauses.
    elapsed_secs: f32,
    /// Wall-clock seconds since the previous frame.
    frame_delta_secs: f32,
    /// Frames counted in the last complete window.
    fps: u32,
    /// Frames counted in the current window.
    window_frames: u32,
    /// Start of the current window.
    window_start: Instant,
    /// Whether time is paused.
    paused: bool,
    /// Total time spent paused.
    pause_elapsed: Duration,
}

impl Time {
    /// Create a new time tracker starting from now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last_frame: now,
            last_tick: now,
            elapsed_secs: 0.0,
            frame_delta_secs: 0.0,
            fps: 0,
            window_frames: 0,
            window_start: now,
            paused: false,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Update timing values. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` on the simulation clock; both
    /// hold still while paused.
    pub fn update(&mut self) -> (f32, f32) {
        self.tick(Instant::now())
    }

    fn tick(&mut self, now: Instant) -> (f32, f32) {
        // Frames are counted even while paused; the loop keeps drawing
        self.window_frames += 1;
        self.frame_delta_secs = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;

        let window = now.duration_since(self.window_start);
        if window >= FPS_WINDOW {
            self.fps = self.window_frames;
            self.window_frames = 0;
            self.window_start = now;
        }

        if self.paused {
            return (self.elapsed_secs, 0.0);
        }

        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let raw_elapsed = now.duration_since(self.start).saturating_sub(self.pause_elapsed);
        self.elapsed_secs = raw_elapsed.as_secs_f32();

        (self.elapsed_secs, delta)
    }

    /// Total elapsed time in seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Wall-clock seconds between the last two frames, paused or not.
    #[inline]
    pub fn frame_delta(&self) -> f32 {
        self.frame_delta_secs
    }

    /// Frames counted in the last full one-second window.
    #[inline]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Whether time is currently paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause time progression.
    ///
    /// While paused, `update` reports a zero delta and `elapsed()` stops
    /// increasing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume time progression after pausing.
    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    fn resume_at(&mut self, now: Instant) {
        if self.paused {
            self.pause_elapsed += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.elapsed(), 0.0);
        assert_eq!(time.fps(), 0);
        assert!(!time.is_paused());
    }

    #[test]
    fn test_time_update() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        let (elapsed, delta) = time.tick(start + Duration::from_millis(10));

        assert!((elapsed - 0.010).abs() < 1e-4);
        assert!((delta - 0.010).abs() < 1e-4);
        assert!((time.frame_delta() - 0.010).abs() < 1e-4);
    }

    #[test]
    fn test_fps_counts_frames_in_window() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        for i in 1..=60 {
            time.tick(start + Duration::from_micros(16_667 * i));
        }
        // 60 frames at 60 Hz close the first window on the last frame
        assert_eq!(time.fps(), 60);

        for i in 61..=90 {
            time.tick(start + Duration::from_micros(16_667 * i));
        }
        // Next window still open
        assert_eq!(time.fps(), 60);
    }

    #[test]
    fn test_time_pause() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        time.tick(start + Duration::from_millis(16));

        time.pause();
        assert!(time.is_paused());

        let elapsed_before = time.elapsed();
        let (_, delta) = time.tick(start + Duration::from_millis(500));

        // Elapsed should not increase while paused
        assert_eq!(time.elapsed(), elapsed_before);
        assert_eq!(delta, 0.0);

        time.resume_at(start + Duration::from_millis(600));
        let (elapsed, _) = time.tick(start + Duration::from_millis(616));
        assert!((elapsed - 0.032).abs() < 1e-3);
    }

    #[test]
    fn test_frame_delta_runs_while_paused() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        time.tick(start + Duration::from_millis(16));
        time.pause();

        let (_, delta) = time.tick(start + Duration::from_millis(48));
        assert_eq!(delta, 0.0);
        assert!((time.frame_delta() - 0.032).abs() < 1e-4);
    }
}
