use easel_core::Vector2;

/// Per-frame values shared by draw hooks and behaviors. Built once per
/// frame after stepping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInfo {
    pub frame: u64,
    /// Wall-clock seconds since the previous frame (capped).
    pub real_dt: f64,
    /// Simulated seconds since the loop started.
    pub total_time: f64,
    pub fps: f64,
    pub frame_time_ms: f64,
    /// How far the camera target moved this frame. Zero with no target.
    pub camera_displacement: Vector2,
    pub interpolation_alpha: f64,
    pub paused: bool,
}

/// Counters for the debug overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub steps: u32,
    pub faults: u32,
    pub entities: usize,
    pub draw_commands: usize,
    pub total_faults: u64,
}

impl FrameStats {
    pub(crate) fn begin_frame(&mut self) {
        self.steps = 0;
        self.faults = 0;
    }

    pub(crate) fn record_fault(&mut self) {
        self.faults += 1;
        self.total_faults += 1;
    }
}
