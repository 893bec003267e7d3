//! Frame timing: fixed-step accumulator, variable-step passthrough, and a
//! rolling-window FPS estimate suitable for on-screen display.
//!
//! Per frame the loop calls `begin_frame()`, then `while should_step()` runs
//! one simulation step of `step_dt()` seconds, then `end_frame()`.

use std::time::Instant;

use crate::config::{StepMode, TimingConfig};

const FPS_SAMPLE_COUNT: usize = 60;

pub struct TimeState {
    pub step_mode: StepMode,
    pub fixed_dt: f64,
    pub max_accumulator: f64,
    pub target_fps: f64,
    accumulator: f64,
    variable_step_pending: bool,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,
    pub interpolation_alpha: f64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self::from_config(&TimingConfig::default())
    }

    pub fn from_config(config: &TimingConfig) -> Self {
        let target_dt = 1.0 / config.target_fps;
        Self {
            step_mode: config.step_mode,
            fixed_dt: config.fixed_dt,
            max_accumulator: config.max_accumulator,
            target_fps: config.target_fps,
            accumulator: 0.0,
            variable_step_pending: false,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            interpolation_alpha: 0.0,
            fps_samples: [target_dt; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: config.target_fps,
            smoothed_frame_time_ms: target_dt * 1000.0,
        }
    }

    /// Apply new timing settings without discarding counters or FPS history.
    pub fn apply_config(&mut self, config: &TimingConfig) {
        self.step_mode = config.step_mode;
        self.fixed_dt = config.fixed_dt;
        self.max_accumulator = config.max_accumulator;
        self.target_fps = config.target_fps;
        self.accumulator = self.accumulator.min(self.max_accumulator);
    }

    /// Forget wall-clock time spent outside the loop (e.g. while paused), so
    /// the next frame does not try to catch up on it.
    pub fn reset_clock(&mut self) {
        self.last_instant = Instant::now();
        self.accumulator = 0.0;
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.begin_frame_with(real_dt);
    }

    /// Same as `begin_frame`, with the elapsed wall-clock time supplied by the
    /// caller. Headless runs and tests drive the loop through this.
    pub fn begin_frame_with(&mut self, real_dt: f64) {
        let elapsed = real_dt.max(0.0);
        self.real_dt = elapsed;

        // Spiral-of-death cap. Only the simulation sees the capped value.
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms, capping accumulator to {}ms",
                self.real_dt * 1000.0,
                self.max_accumulator * 1000.0
            );
            self.real_dt = self.max_accumulator;
        }

        match self.step_mode {
            StepMode::Fixed => self.accumulator += self.real_dt,
            StepMode::Variable => self.variable_step_pending = true,
        }
        self.steps_this_frame = 0;
        self.frame_count += 1;

        // FPS smoothing
        self.fps_samples[self.fps_sample_index] = elapsed;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    /// True while another whole step is owed. Fixed mode never runs a partial
    /// step; variable mode runs exactly one step per frame.
    pub fn should_step(&mut self) -> bool {
        match self.step_mode {
            StepMode::Fixed => {
                if self.accumulator >= self.fixed_dt {
                    self.accumulator -= self.fixed_dt;
                    self.total_time += self.fixed_dt;
                    self.fixed_step_count += 1;
                    self.steps_this_frame += 1;
                    true
                } else {
                    false
                }
            }
            StepMode::Variable => {
                if self.variable_step_pending {
                    self.variable_step_pending = false;
                    self.total_time += self.real_dt;
                    self.fixed_step_count += 1;
                    self.steps_this_frame += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Discard owed simulation time. Paused frames call this so resuming
    /// does not catch up on the pause.
    pub fn drop_pending_steps(&mut self) {
        self.accumulator = 0.0;
        self.variable_step_pending = false;
    }

    /// Owe exactly one step, whatever the accumulator held.
    pub fn grant_single_step(&mut self) {
        match self.step_mode {
            StepMode::Fixed => self.accumulator = self.fixed_dt,
            StepMode::Variable => self.variable_step_pending = true,
        }
    }

    /// Duration of the step `should_step` just granted.
    pub fn step_dt(&self) -> f64 {
        match self.step_mode {
            StepMode::Fixed => self.fixed_dt,
            StepMode::Variable => self.real_dt,
        }
    }

    pub fn end_frame(&mut self) {
        self.interpolation_alpha = match self.step_mode {
            StepMode::Fixed => self.accumulator / self.fixed_dt,
            StepMode::Variable => 0.0,
        };
    }

    pub fn target_frame_time(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.target_fps)
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}
