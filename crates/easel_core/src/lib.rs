pub mod camera;
pub mod config;
pub mod error;
pub mod input;
pub mod time;
pub mod vector2;

pub use camera::Camera;
pub use config::{ConfigWatcher, EngineConfig, StepMode, SurfaceConfig, TimingConfig};
pub use error::{EaselError, EntityId, FramePhase};
pub use input::{InputState, Key, MouseBtn};
pub use time::TimeState;
pub use vector2::Vector2;
