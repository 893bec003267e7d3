pub mod draw_list;
pub mod gpu_context;
pub mod image;
pub mod line;
pub mod painter;
pub mod presenter;
pub mod style;
pub mod surface;

pub use draw_list::{DrawCommand, DrawList, Font, Stroke};
pub use gpu_context::GpuContext;
pub use image::{ImageData, ImageHandle};
pub use line::LineOptions;
pub use presenter::{PreparedFrame, Presenter};
pub use style::{Color, DrawStyle, PaintState};
pub use surface::{DrawSurface, SurfaceOptions};
