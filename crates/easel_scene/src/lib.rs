pub mod entity;
pub mod frame;
pub mod scene;
pub mod scheduler;

pub use entity::{
    Behavior, Body, Capabilities, Commands, DrawContext, Entity, FnBehavior, StepContext,
};
pub use frame::{FrameInfo, FrameStats};
pub use scene::{DrawHook, Scene};
pub use scheduler::{FrameDecision, Scheduler, SchedulerState};
