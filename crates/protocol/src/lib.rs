pub mod commands;
pub mod shared_str;
pub mod types;
pub mod widgets;

pub use commands::RenderCommand;
pub use shared_str::SharedStr;
pub use types::{Color, ColorParseError, ItemId, ItemKey, Point, Rect, Viewport};
pub use widgets::{
    AudioHandle, CardAction, CardView, HostOp, WidgetEvent, WidgetHandle, WidgetSpec,
};
