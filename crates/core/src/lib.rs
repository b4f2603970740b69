//! Overlay-comment ("danmaku") engine.
//!
//! ```text
//!   host ──submit──▶ lanes + layout ──▶ live items ──tick──▶ RenderCommand[]
//!    ▲                                      │
//!    └──────── HostOp (widgets, audio) ◀────┘◀── pointer / widget events
//! ```

pub mod card;
pub mod config;
pub mod engine;
pub mod host;
pub mod interaction;
pub mod item;
pub mod lane;
pub mod layout;
mod render;
pub mod svg;
pub mod sync;

pub use card::Callbacks;
pub use config::{ConfigError, EngineConfig, SyncConfig};
pub use engine::Engine;
pub use host::{BufferedHost, FixedAdvance, Host, HostError, NullHost, TextMeasure};
pub use interaction::HoverState;
pub use item::{ItemKind, OverlayItem, Submission};
pub use sync::{AnchoredComment, PlaybackSync};
