use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::types::{Color, ItemKey, Point};

/// A single, stateless draw instruction for one frame.
///
/// The engine emits a `Vec<RenderCommand>` per tick. Renderers replay the
/// list in order onto a 2D surface; later commands paint over earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RenderCommand {
    /// Clear the whole surface. Dimensions are logical, not device-scaled.
    Clear { width: f64, height: f64 },

    /// Draw one line of text with its left end of the baseline at `position`.
    DrawText {
        position: Point,
        text: SharedStr,
        color: Color,
        /// Stroke drawn under the fill, if any.
        outline: Option<Color>,
        font_size: f64,
    },

    /// Start the commands belonging to one overlay item. Renderers may use
    /// this for batching or accessibility.
    BeginGroup { item: ItemKey },

    /// End the current item group.
    EndGroup,
}

impl RenderCommand {
    pub fn text(&self) -> Option<&str> {
        match self {
            RenderCommand::DrawText { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_text_wire_shape() {
        let cmd = RenderCommand::DrawText {
            position: Point::new(1.0, 2.0),
            text: "hi".into(),
            color: Color::WHITE,
            outline: None,
            font_size: 24.0,
        };
        let json = serde_json::to_value(&cmd).expect("commands serialize");
        assert_eq!(json["cmd"], "drawText");
        assert_eq!(json["fontSize"], 24.0);
        assert_eq!(json["text"], "hi");
        assert!(json["outline"].is_null());
    }

    #[test]
    fn group_markers_parse() {
        let cmd: RenderCommand =
            serde_json::from_str(r#"{"cmd":"beginGroup","item":4}"#).expect("group marker parses");
        assert_eq!(cmd, RenderCommand::BeginGroup { item: ItemKey(4) });
        assert_eq!(RenderCommand::EndGroup.text(), None);
    }
}
