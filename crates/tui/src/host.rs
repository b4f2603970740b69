//! Terminal-side host: widgets become cell overlays, audio is simulated on
//! the wall clock, and the clipboard is an in-process buffer.

use std::collections::BTreeMap;

use danmaku_core::host::{AudioBackend, Clipboard, WidgetProvider};
use danmaku_core::{HostError, TextMeasure};
use danmaku_protocol::{AudioHandle, Point, WidgetHandle, WidgetSpec};
use ratatui::text::Span;
use tracing::info;

/// Logical pixels per terminal column.
pub const COL_PX: f64 = 10.0;
/// Logical pixels per terminal row; one lane per row at the default lane height.
pub const ROW_PX: f64 = 30.0;

/// Length of a simulated voice clip.
const CLIP_MS: f64 = 3000.0;

#[derive(Debug, Clone)]
pub struct PlacedWidget {
    pub spec: WidgetSpec,
    pub at: Point,
}

#[derive(Debug)]
struct Clip {
    url: String,
    ends_at: Option<f64>,
}

#[derive(Debug, Default)]
pub struct TerminalHost {
    widgets: BTreeMap<WidgetHandle, PlacedWidget>,
    clips: BTreeMap<AudioHandle, Clip>,
    next_widget: u32,
    next_audio: u32,
    /// Wall clock of the current frame, in milliseconds.
    pub clock_ms: f64,
    pub clipboard: Option<String>,
}

impl TerminalHost {
    pub fn widgets(&self) -> impl Iterator<Item = (WidgetHandle, &PlacedWidget)> {
        self.widgets.iter().map(|(h, w)| (*h, w))
    }

    /// Clips whose simulated playback ran out by now.
    pub fn finished_clips(&mut self) -> Vec<AudioHandle> {
        let now = self.clock_ms;
        let mut done = Vec::new();
        for (handle, clip) in &mut self.clips {
            if clip.ends_at.is_some_and(|t| now >= t) {
                clip.ends_at = None;
                done.push(*handle);
            }
        }
        done
    }
}

impl TextMeasure for TerminalHost {
    fn measure_text(&self, text: &str, _font_size: f64) -> f64 {
        Span::raw(text).width() as f64 * COL_PX
    }
}

impl WidgetProvider for TerminalHost {
    fn create(&mut self, spec: WidgetSpec) -> WidgetHandle {
        self.next_widget += 1;
        let handle = WidgetHandle(self.next_widget);
        self.widgets.insert(
            handle,
            PlacedWidget {
                spec,
                at: Point::new(0.0, 0.0),
            },
        );
        handle
    }

    fn update(&mut self, handle: WidgetHandle, spec: WidgetSpec) {
        if let Some(w) = self.widgets.get_mut(&handle) {
            w.spec = spec;
        }
    }

    fn reposition(&mut self, handle: WidgetHandle, at: Point) {
        if let Some(w) = self.widgets.get_mut(&handle) {
            w.at = at;
        }
    }

    fn destroy(&mut self, handle: WidgetHandle) {
        self.widgets.remove(&handle);
    }
}

impl AudioBackend for TerminalHost {
    fn open(&mut self, url: &str) -> Result<AudioHandle, HostError> {
        self.next_audio += 1;
        let handle = AudioHandle(self.next_audio);
        self.clips.insert(
            handle,
            Clip {
                url: url.to_string(),
                ends_at: None,
            },
        );
        Ok(handle)
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), HostError> {
        let clip = self
            .clips
            .get_mut(&handle)
            .ok_or_else(|| HostError::Audio(format!("no clip {}", handle.0)))?;
        clip.ends_at = Some(self.clock_ms + CLIP_MS);
        info!(url = %clip.url, "playing voice clip");
        Ok(())
    }

    fn pause(&mut self, handle: AudioHandle) {
        if let Some(clip) = self.clips.get_mut(&handle) {
            clip.ends_at = None;
        }
    }

    fn release(&mut self, handle: AudioHandle) {
        self.clips.remove(&handle);
    }
}

impl Clipboard for TerminalHost {
    fn write_text(&mut self, text: &str) -> Result<(), HostError> {
        self.clipboard = Some(text.to_string());
        Ok(())
    }
}
