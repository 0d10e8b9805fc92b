//! Render state machine and frame statistics.
//!
//! ```text
//! Loading ──ready──▶ Ready ──invalidate──▶ Rendering ──progress>99──▶ Idle
//!                                   ▲                                    │
//!                                   └──────────── invalidate ◀───────────┘
//! ```
//!
//! A failure while loading is terminal: the scheduler stays in `Loading`
//! and keeps the message for display.

/// Progress above this flips `Rendering` to `Idle`.
pub const PROGRESS_COMPLETE: f32 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Shaders compiling and buffers uploading, or initialization failed.
    Loading,
    /// Initialized, nothing drawn since.
    Ready,
    /// Something changed; the progress indicator is climbing.
    Rendering,
    /// Progress completed and nothing has changed since.
    Idle,
}

/// Tracks the render state and the "rendering in progress" percentage.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    state: RenderState,
    progress: f32,
    failure: Option<String>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            state: RenderState::Loading,
            progress: 0.0,
            failure: None,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Percentage in `[0, 100)`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// True once initialization succeeded.
    pub fn is_ready(&self) -> bool {
        self.state != RenderState::Loading
    }

    /// The initialization failure, if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Loading → Ready.
    pub fn mark_ready(&mut self) {
        if self.state == RenderState::Loading && self.failure.is_none() {
            log::debug!("Render state: Loading -> Ready");
            self.state = RenderState::Ready;
        }
    }

    /// Record a fatal initialization failure. The state stays `Loading`.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("Initialization failed: {}", message);
        self.state = RenderState::Loading;
        self.failure = Some(message);
    }

    /// A parameter, camera or window change happened.
    pub fn invalidate(&mut self) {
        match self.state {
            RenderState::Loading | RenderState::Rendering => {}
            RenderState::Ready | RenderState::Idle => {
                log::debug!("Render state: {:?} -> Rendering", self.state);
                self.state = RenderState::Rendering;
            }
        }
    }

    /// Advance the progress indicator by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if self.state != RenderState::Rendering {
            return;
        }
        self.progress += (100.0 - self.progress) * (10.0 * dt.max(0.0)).min(1.0);
        if self.progress > PROGRESS_COMPLETE {
            self.progress = 0.0;
            self.state = RenderState::Idle;
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-frame figures reported to the outside.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    pub fps: u32,
    /// Particles drawn, or pixels ray-marched.
    pub item_count: u64,
    pub item_label: &'static str,
    pub progress: f32,
    pub ready: bool,
}

impl FrameStats {
    /// One-line summary for the window title.
    pub fn title(&self, name: &str) -> String {
        format!("{} | {} FPS | {} {}", name, self.fps, self.item_count, self.item_label)
    }
}

/// Scale a window size by a quality factor, never below 1×1.
pub fn scaled_viewport(width: u32, height: u32, quality: f32) -> (u32, u32) {
    let q = if quality.is_finite() { quality.clamp(0.01, 1.0) } else { 1.0 };
    let w = ((width as f32 * q).round() as u32).max(1);
    let h = ((height as f32 * q).round() as u32).max(1);
    (w, h)
}
