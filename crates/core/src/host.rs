//! Capabilities the engine borrows from its host environment.
//!
//! The engine never touches a DOM, an audio device or a clipboard directly.
//! It asks the host through these traits, which keeps the core testable
//! with [`NullHost`] or [`BufferedHost`].

use danmaku_protocol::{AudioHandle, HostOp, Point, SharedStr, WidgetHandle, WidgetSpec};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("audio unavailable: {0}")]
    Audio(String),
    #[error("clipboard unavailable")]
    ClipboardUnavailable,
    #[error("clipboard write failed: {0}")]
    Clipboard(String),
}

/// Width of a single line of text at a font size, in logical pixels.
pub trait TextMeasure {
    fn measure_text(&self, text: &str, font_size: f64) -> f64;
}

/// Native controls positioned over the drawing surface.
pub trait WidgetProvider {
    fn create(&mut self, spec: WidgetSpec) -> WidgetHandle;
    fn update(&mut self, handle: WidgetHandle, spec: WidgetSpec);
    fn reposition(&mut self, handle: WidgetHandle, at: Point);
    fn destroy(&mut self, handle: WidgetHandle);
}

pub trait AudioBackend {
    fn open(&mut self, url: &str) -> Result<AudioHandle, HostError>;
    fn play(&mut self, handle: AudioHandle) -> Result<(), HostError>;
    fn pause(&mut self, handle: AudioHandle);
    fn release(&mut self, handle: AudioHandle);
}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), HostError>;
}

/// Everything an engine needs from its environment.
pub trait Host: TextMeasure + WidgetProvider + AudioBackend + Clipboard {}

impl<T: TextMeasure + WidgetProvider + AudioBackend + Clipboard> Host for T {}

/// Monospace approximation: every character advances `font_size * ratio`.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    pub ratio: f64,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { ratio: 0.6 }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.ratio
    }
}

/// A host that draws nothing, plays nothing and copies nothing.
#[derive(Debug, Default)]
pub struct NullHost {
    pub measure: FixedAdvance,
    next_handle: u32,
}

impl TextMeasure for NullHost {
    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        self.measure.measure_text(text, font_size)
    }
}

impl WidgetProvider for NullHost {
    fn create(&mut self, _spec: WidgetSpec) -> WidgetHandle {
        self.next_handle += 1;
        WidgetHandle(self.next_handle)
    }
    fn update(&mut self, _handle: WidgetHandle, _spec: WidgetSpec) {}
    fn reposition(&mut self, _handle: WidgetHandle, _at: Point) {}
    fn destroy(&mut self, _handle: WidgetHandle) {}
}

impl AudioBackend for NullHost {
    fn open(&mut self, _url: &str) -> Result<AudioHandle, HostError> {
        self.next_handle += 1;
        Ok(AudioHandle(self.next_handle))
    }
    fn play(&mut self, _handle: AudioHandle) -> Result<(), HostError> {
        Ok(())
    }
    fn pause(&mut self, _handle: AudioHandle) {}
    fn release(&mut self, _handle: AudioHandle) {}
}

impl Clipboard for NullHost {
    fn write_text(&mut self, _text: &str) -> Result<(), HostError> {
        Err(HostError::ClipboardUnavailable)
    }
}

/// Records every side effect as a [`HostOp`] for the caller to apply later.
///
/// Handles are allocated here, so the engine can keep working with them
/// before the real host has seen the matching `CreateWidget`/`OpenAudio`.
#[derive(Debug)]
pub struct BufferedHost<M> {
    pub measure: M,
    /// When false, clipboard writes fail instead of queueing `CopyText`.
    pub clipboard_enabled: bool,
    ops: Vec<HostOp>,
    next_widget: u32,
    next_audio: u32,
}

impl<M: TextMeasure> BufferedHost<M> {
    pub fn new(measure: M) -> Self {
        Self {
            measure,
            clipboard_enabled: true,
            ops: Vec::new(),
            next_widget: 0,
            next_audio: 0,
        }
    }

    /// Pending operations, oldest first.
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn drain(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }
}

impl<M: TextMeasure> TextMeasure for BufferedHost<M> {
    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        self.measure.measure_text(text, font_size)
    }
}

impl<M> WidgetProvider for BufferedHost<M> {
    fn create(&mut self, spec: WidgetSpec) -> WidgetHandle {
        self.next_widget += 1;
        let handle = WidgetHandle(self.next_widget);
        self.ops.push(HostOp::CreateWidget {
            handle,
            widget: spec,
        });
        handle
    }

    fn update(&mut self, handle: WidgetHandle, spec: WidgetSpec) {
        self.ops.push(HostOp::UpdateWidget {
            handle,
            widget: spec,
        });
    }

    fn reposition(&mut self, handle: WidgetHandle, at: Point) {
        self.ops.push(HostOp::MoveWidget { handle, at });
    }

    fn destroy(&mut self, handle: WidgetHandle) {
        self.ops.push(HostOp::DestroyWidget { handle });
    }
}

impl<M> AudioBackend for BufferedHost<M> {
    fn open(&mut self, url: &str) -> Result<AudioHandle, HostError> {
        self.next_audio += 1;
        let handle = AudioHandle(self.next_audio);
        self.ops.push(HostOp::OpenAudio {
            handle,
            url: url.to_string(),
        });
        Ok(handle)
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), HostError> {
        self.ops.push(HostOp::PlayAudio { handle });
        Ok(())
    }

    fn pause(&mut self, handle: AudioHandle) {
        self.ops.push(HostOp::PauseAudio { handle });
    }

    fn release(&mut self, handle: AudioHandle) {
        self.ops.push(HostOp::ReleaseAudio { handle });
    }
}

impl<M> Clipboard for BufferedHost<M> {
    fn write_text(&mut self, text: &str) -> Result<(), HostError> {
        if !self.clipboard_enabled {
            return Err(HostError::ClipboardUnavailable);
        }
        self.ops.push(HostOp::CopyText {
            text: SharedStr::from(text),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use danmaku_protocol::ItemKey;

    #[test]
    fn buffered_host_allocates_distinct_handles() {
        let mut host = BufferedHost::new(FixedAdvance::default());
        let a = host.create(WidgetSpec::Toast {
            message: "a".into(),
        });
        let b = host.create(WidgetSpec::VoiceButton {
            item: ItemKey(1),
            playing: false,
            size: 24.0,
        });
        assert_ne!(a, b);
        assert_eq!(host.drain().len(), 2);
        assert!(host.ops().is_empty());
    }

    #[test]
    fn disabled_clipboard_queues_nothing() {
        let mut host = BufferedHost::new(FixedAdvance::default());
        host.clipboard_enabled = false;
        assert_eq!(
            host.write_text("hi"),
            Err(HostError::ClipboardUnavailable)
        );
        assert!(host.ops().is_empty());
    }

    #[test]
    fn fixed_advance_counts_chars_not_bytes() {
        let m = FixedAdvance { ratio: 0.5 };
        assert_eq!(m.measure_text("弹幕", 20.0), 20.0);
    }
}
