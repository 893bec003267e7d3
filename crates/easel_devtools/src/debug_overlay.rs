//! Debug window drawn with egui over the scene (toggled by F3).
//!
//! The overlay owns no renderer: the presenter runs egui once per frame and
//! calls `show` from inside that run, so the window lands on top of the
//! scene's background layer.

use easel_core::TimeState;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub entities: usize,
    pub draw_commands: usize,
    pub faults_this_frame: u32,
    pub total_faults: u64,
    /// Whether the loop is paused
    pub paused: bool,
    /// Config file being watched, if any
    pub config_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayActions {
    /// User clicked the pause toggle
    pub toggle_pause: bool,
    /// User clicked the single-step button (advance one step while paused)
    pub single_step: bool,
}

#[derive(Debug, Default)]
pub struct DebugOverlay {
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn show(
        &self,
        ctx: &egui::Context,
        time: &TimeState,
        stats: &OverlayStats,
    ) -> OverlayActions {
        let mut actions = OverlayActions::default();
        if !self.visible {
            return actions;
        }

        egui::Window::new("Debug")
            .default_pos([10.0, 10.0])
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1} / {:.0}", time.smoothed_fps, time.target_fps));
                ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
                ui.label(format!("Step mode: {:?}", time.step_mode));
                ui.label(format!("Steps this frame: {}", time.steps_this_frame));
                ui.label(format!("Total steps: {}", time.fixed_step_count));
                ui.label(format!("Frame: {}", time.frame_count));

                ui.separator();
                ui.label(format!("Entities: {}", stats.entities));
                ui.label(format!("Draw commands: {}", stats.draw_commands));
                ui.label(format!(
                    "Faults: {} (total {})",
                    stats.faults_this_frame, stats.total_faults
                ));
                if !stats.config_label.is_empty() {
                    ui.label(&stats.config_label);
                }

                ui.separator();
                ui.horizontal(|ui| {
                    let pause_label = if stats.paused { "Resume" } else { "Pause" };
                    if ui.button(pause_label).clicked() {
                        actions.toggle_pause = true;
                    }
                    if stats.paused && ui.button("Step").clicked() {
                        actions.single_step = true;
                    }
                });
                if stats.paused {
                    ui.label("\u{23f8} PAUSED");
                }
            });

        actions
    }
}
