use danmaku_protocol::{AudioHandle, Color, ItemId, ItemKey, Rect, SharedStr, WidgetHandle};
use serde::Deserialize;

use crate::config::EngineConfig;
use crate::host::{AudioBackend, WidgetProvider};
use crate::layout;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ItemKind {
    Text,
    Voice {
        #[serde(rename = "audioUrl")]
        audio_reference: String,
    },
}

/// Arguments to [`crate::Engine::submit`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub text: String,
    #[serde(default, deserialize_with = "lenient_color")]
    pub color: Color,
    #[serde(flatten)]
    pub kind: ItemKind,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub owned: bool,
}

impl Submission {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: Color::WHITE,
            kind: ItemKind::Text,
            popularity: 0,
            id: None,
            liked: false,
            owned: false,
        }
    }

    pub fn voice(text: impl Into<String>, audio_reference: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Voice {
                audio_reference: audio_reference.into(),
            },
            ..Self::text(text)
        }
    }

    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_popularity(mut self, popularity: u32, liked: bool) -> Self {
        self.popularity = popularity;
        self.liked = liked;
        self
    }

    pub fn owned(mut self) -> Self {
        self.owned = true;
        self
    }
}

/// Hex colors from the host; anything unparseable becomes white.
fn lenient_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map_or(Color::WHITE, |s| Color::from_hex_or_white(&s)))
}

/// Host resources owned by a voice item. Each is released at most once.
#[derive(Debug, Default)]
pub struct VoiceAttachment {
    pub audio: Option<AudioHandle>,
    pub button: Option<WidgetHandle>,
    pub is_playing: bool,
}

impl VoiceAttachment {
    pub fn release(&mut self, host: &mut (impl AudioBackend + WidgetProvider)) {
        if let Some(audio) = self.audio.take() {
            host.pause(audio);
            host.release(audio);
        }
        if let Some(button) = self.button.take() {
            host.destroy(button);
        }
        self.is_playing = false;
    }
}

/// A comment in flight.
#[derive(Debug)]
pub struct OverlayItem {
    pub key: ItemKey,
    pub id: Option<ItemId>,
    pub text: SharedStr,
    pub lines: Vec<SharedStr>,
    pub color: Color,
    pub kind: ItemKind,
    pub voice: VoiceAttachment,
    /// Left edge; decreases every unpaused frame.
    pub x: f64,
    pub lane: usize,
    /// Baseline of the first line.
    pub baseline: f64,
    pub size: f64,
    pub bounding_width: f64,
    pub popularity: u32,
    pub liked: bool,
    pub owned: bool,
    /// Set while the pointer hovers this item.
    pub is_paused: bool,
}

impl OverlayItem {
    pub fn is_voice(&self) -> bool {
        matches!(self.kind, ItemKind::Voice { .. })
    }

    /// Any part still on screen.
    pub fn is_visible(&self) -> bool {
        self.x + self.bounding_width > 0.0
    }

    /// Tight box around the drawn text block (including a voice button).
    pub fn text_rect(&self, config: &EngineConfig) -> Rect {
        layout::text_rect(
            self.x,
            self.baseline,
            self.bounding_width,
            self.size,
            self.lines.len(),
            config.line_height_factor,
        )
    }

    /// Footprint of the action card anchored under the text block.
    pub fn card_rect(&self, config: &EngineConfig) -> Rect {
        let text = self.text_rect(config);
        Rect::new(
            text.x,
            text.bottom(),
            text.w.max(config.card_min_width),
            config.card_height,
        )
    }

    /// Text block plus card, padded. The pointer may travel anywhere inside
    /// it without losing the hover.
    pub fn hover_region(&self, config: &EngineConfig) -> Rect {
        self.text_rect(config)
            .union(&self.card_rect(config))
            .inflate(config.card_padding)
    }

    /// Top-left of the play button, vertically centered on the first line.
    pub fn button_origin(&self, config: &EngineConfig) -> danmaku_protocol::Point {
        danmaku_protocol::Point::new(
            self.x,
            self.baseline - self.size / 2.0 - config.voice_button_size / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_from_host_json() {
        let json = r##"{
            "text": "好听",
            "color": "#ff0000",
            "kind": "voice",
            "audioUrl": "/uploads/a.webm",
            "popularity": 12,
            "id": "65f0c",
            "owned": true
        }"##;
        let sub: Submission = serde_json::from_str(json).expect("submission parses");
        assert_eq!(sub.text, "好听");
        assert_eq!(sub.color.to_hex(), "#ff0000");
        assert_eq!(
            sub.kind,
            ItemKind::Voice {
                audio_reference: "/uploads/a.webm".to_string()
            }
        );
        assert_eq!(sub.popularity, 12);
        assert_eq!(sub.id, Some(ItemId::from("65f0c")));
        assert!(sub.owned);
        assert!(!sub.liked);
    }

    #[test]
    fn bad_color_falls_back_to_white() {
        let json = r#"{"text": "x", "color": "rainbow", "kind": "text"}"#;
        let sub: Submission =
            serde_json::from_str(json).expect("unknown colors still parse");
        assert_eq!(sub.color, Color::WHITE);
        assert_eq!(sub.kind, ItemKind::Text);
    }
}
