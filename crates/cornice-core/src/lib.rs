pub mod cache;
pub mod color;
pub mod config;
pub mod log;
pub mod occlusion;
pub mod protocol;
pub mod rect;
pub mod redraw;
pub mod region;

pub use cache::{AppliedStyle, DiffReport, TrackedCache, WindowHandle};
pub use color::Color;
pub use config::{Config, CornerToken, ModePreference, SettingsUpdate};
pub use protocol::ControlMessage;
pub use rect::Rect;
pub use redraw::RedrawPlan;
pub use region::Region;

/// A boxed error type for platform operations.
///
/// Any error type that implements the `Error` trait can be boxed into
/// this.
pub type ServiceResult<T> = Result<T, Box<dyn std::error::Error>>;
