//! Loop scheduler: run state and frame pacing.
//!
//! ```text
//!   Idle --start--> Ticking <--pause/resume--> Paused
//!                      \                        /
//!                       +-------> Stopped <----+
//! ```
//!
//! Requests never take effect mid-frame. They are latched and applied by
//! `begin_frame`, which also tells the loop what kind of frame to run.
//! `Stopped` is terminal.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Ticking,
    Paused,
    Stopped,
}

/// What the loop should do with the frame that is starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    /// Not running: no step, no draw.
    Halt,
    /// Step as owed, then draw.
    Advance,
    /// Paused: draw only.
    Hold,
    /// Paused, but run exactly one step before drawing.
    SingleStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Start,
    Pause,
    Resume,
    TogglePause,
}

pub struct Scheduler {
    state: SchedulerState,
    requests: VecDeque<Request>,
    stop_requested: bool,
    single_step_requested: bool,
    frame_interval: Duration,
    last_frame_start: Option<Instant>,
}

impl Scheduler {
    pub fn new(target_fps: f64) -> Self {
        Self {
            state: SchedulerState::Idle,
            requests: VecDeque::new(),
            stop_requested: false,
            single_step_requested: false,
            frame_interval: interval_for(target_fps),
            last_frame_start: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == SchedulerState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SchedulerState::Stopped
    }

    pub fn set_target_fps(&mut self, target_fps: f64) {
        self.frame_interval = interval_for(target_fps);
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn start(&mut self) {
        self.requests.push_back(Request::Start);
    }

    pub fn pause(&mut self) {
        self.requests.push_back(Request::Pause);
    }

    pub fn resume(&mut self) {
        self.requests.push_back(Request::Resume);
    }

    pub fn toggle_pause(&mut self) {
        self.requests.push_back(Request::TogglePause);
    }

    /// Takes priority over any other pending request.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    /// Honoured only if the scheduler is paused when the next frame begins.
    pub fn request_single_step(&mut self) {
        self.single_step_requested = true;
    }

    pub fn begin_frame(&mut self) -> FrameDecision {
        self.begin_frame_at(Instant::now())
    }

    /// Apply latched requests and decide the frame. `now` is recorded as
    /// the frame start for pacing.
    pub fn begin_frame_at(&mut self, now: Instant) -> FrameDecision {
        self.apply_requests();
        let single_step = std::mem::take(&mut self.single_step_requested);

        let decision = match self.state {
            SchedulerState::Idle | SchedulerState::Stopped => FrameDecision::Halt,
            SchedulerState::Ticking => FrameDecision::Advance,
            SchedulerState::Paused if single_step => FrameDecision::SingleStep,
            SchedulerState::Paused => FrameDecision::Hold,
        };
        if decision != FrameDecision::Halt {
            self.last_frame_start = Some(now);
        }
        decision
    }

    /// When the next frame is due, or `None` if no frame will run.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            SchedulerState::Idle | SchedulerState::Stopped => None,
            SchedulerState::Ticking | SchedulerState::Paused => Some(
                self.last_frame_start
                    .map_or_else(Instant::now, |start| start + self.frame_interval),
            ),
        }
    }

    /// Stop wins outright. Otherwise requests apply in the order they were made.
    fn apply_requests(&mut self) {
        if self.stop_requested {
            self.requests.clear();
            self.transition(SchedulerState::Stopped);
            return;
        }
        while let Some(request) = self.requests.pop_front() {
            self.apply(request);
        }
    }

    fn apply(&mut self, request: Request) {
        let next = match (self.state, request) {
            (SchedulerState::Stopped, _) => None,
            (SchedulerState::Idle, Request::Start) => Some(SchedulerState::Ticking),
            (SchedulerState::Idle, _) => {
                log::debug!("Ignoring {:?} before the loop has started", request);
                None
            }
            (_, Request::Start) => None,
            (SchedulerState::Ticking, Request::Pause | Request::TogglePause) => {
                Some(SchedulerState::Paused)
            }
            (SchedulerState::Paused, Request::Resume | Request::TogglePause) => {
                Some(SchedulerState::Ticking)
            }
            _ => None,
        };
        if let Some(next) = next {
            self.transition(next);
        }
    }

    fn transition(&mut self, next: SchedulerState) {
        if next != self.state {
            log::info!("Loop {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

fn interval_for(target_fps: f64) -> Duration {
    if target_fps > 0.0 {
        Duration::from_secs_f64(1.0 / target_fps)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticking() -> Scheduler {
        let mut s = Scheduler::new(60.0);
        s.start();
        assert_eq!(s.begin_frame(), FrameDecision::Advance);
        s
    }

    #[test]
    fn idle_until_started() {
        let mut s = Scheduler::new(60.0);
        assert_eq!(s.begin_frame(), FrameDecision::Halt);
        s.pause();
        assert_eq!(s.begin_frame(), FrameDecision::Halt);
        assert_eq!(s.state(), SchedulerState::Idle);
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn pause_is_latched_until_frame_boundary() {
        let mut s = ticking();
        s.pause();
        assert_eq!(s.state(), SchedulerState::Ticking);
        assert_eq!(s.begin_frame(), FrameDecision::Hold);
        assert!(s.is_paused());
        s.resume();
        assert_eq!(s.begin_frame(), FrameDecision::Advance);
    }

    #[test]
    fn toggle_flips_state() {
        let mut s = ticking();
        s.toggle_pause();
        s.begin_frame();
        assert!(s.is_paused());
        s.toggle_pause();
        s.begin_frame();
        assert_eq!(s.state(), SchedulerState::Ticking);
    }

    #[test]
    fn single_step_only_while_paused() {
        let mut s = ticking();
        s.request_single_step();
        assert_eq!(s.begin_frame(), FrameDecision::Advance);

        s.pause();
        s.begin_frame();
        s.request_single_step();
        assert_eq!(s.begin_frame(), FrameDecision::SingleStep);
        assert_eq!(s.begin_frame(), FrameDecision::Hold);
    }

    #[test]
    fn requests_made_in_one_frame_apply_in_order() {
        let mut s = Scheduler::new(60.0);
        s.start();
        s.pause();
        assert_eq!(s.begin_frame(), FrameDecision::Hold);
        assert!(s.is_paused());

        s.resume();
        s.toggle_pause();
        assert_eq!(s.begin_frame(), FrameDecision::Hold);

        s.toggle_pause();
        s.pause();
        s.resume();
        assert_eq!(s.begin_frame(), FrameDecision::Advance);
    }

    #[test]
    fn pause_before_start_is_ignored() {
        let mut s = Scheduler::new(60.0);
        s.pause();
        s.start();
        assert_eq!(s.begin_frame(), FrameDecision::Advance);
    }

    #[test]
    fn stop_wins_and_is_terminal() {
        let mut s = ticking();
        s.pause();
        s.stop();
        assert_eq!(s.begin_frame(), FrameDecision::Halt);
        assert!(s.is_stopped());
        s.start();
        s.resume();
        assert_eq!(s.begin_frame(), FrameDecision::Halt);
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn deadline_is_one_interval_after_frame_start() {
        let mut s = Scheduler::new(50.0);
        s.start();
        let start = Instant::now();
        s.begin_frame_at(start);
        assert_eq!(s.next_deadline(), Some(start + Duration::from_millis(20)));

        s.set_target_fps(100.0);
        assert_eq!(s.next_deadline(), Some(start + Duration::from_millis(10)));
    }
}
