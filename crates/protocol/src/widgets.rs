//! Native controls layered over the drawing surface, and the host-side
//! operations that create, move and destroy them.

use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::types::{ItemKey, Point};

/// Opaque reference to a host widget (voice button, action card, toast).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetHandle(pub u32);

/// Opaque reference to a host audio resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioHandle(pub u32);

/// Everything an action card displays for the hovered item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub item: ItemKey,
    pub like_count: u32,
    pub liked: bool,
    /// Delete is offered only for the viewer's own comments.
    pub owned: bool,
    pub text: SharedStr,
    /// Card footprint; the width follows the hovered text block.
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WidgetSpec {
    /// Round play/pause button in front of a voice comment.
    VoiceButton { item: ItemKey, playing: bool, size: f64 },
    /// Like / copy / report / delete card shown under the hovered item.
    ActionCard(CardView),
    /// Short-lived confirmation message.
    Toast { message: SharedStr },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardAction {
    Like,
    Copy,
    Report,
    Delete,
}

/// Pointer events a host widget reports back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "action", rename_all = "camelCase")]
pub enum WidgetEvent {
    Click,
    PointerEnter,
    PointerLeave,
    Action(CardAction),
}

/// A side effect requested from the host, in the order it was issued.
///
/// Hosts that cannot be called synchronously (a JS page behind a wasm
/// boundary, a terminal) receive these in a batch after each engine call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum HostOp {
    CreateWidget { handle: WidgetHandle, widget: WidgetSpec },
    UpdateWidget { handle: WidgetHandle, widget: WidgetSpec },
    MoveWidget { handle: WidgetHandle, at: Point },
    DestroyWidget { handle: WidgetHandle },
    OpenAudio { handle: AudioHandle, url: String },
    PlayAudio { handle: AudioHandle },
    PauseAudio { handle: AudioHandle },
    ReleaseAudio { handle: AudioHandle },
    CopyText { text: SharedStr },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_op_wire_shape() {
        let op = HostOp::MoveWidget {
            handle: WidgetHandle(3),
            at: Point::new(10.0, 20.0),
        };
        let json = serde_json::to_string(&op).expect("host ops serialize");
        assert_eq!(
            json,
            r#"{"op":"moveWidget","handle":3,"at":{"x":10.0,"y":20.0}}"#
        );
    }

    #[test]
    fn widget_event_from_js() {
        let ev: WidgetEvent = serde_json::from_str(r#"{"type":"action","action":"copy"}"#)
            .expect("card action parses");
        assert_eq!(ev, WidgetEvent::Action(CardAction::Copy));
        let ev: WidgetEvent =
            serde_json::from_str(r#"{"type":"click"}"#).expect("click parses");
        assert_eq!(ev, WidgetEvent::Click);
    }
}
