use danmaku_protocol::{Color, Point, RenderCommand};

use crate::config::EngineConfig;
use crate::item::OverlayItem;

/// Append the draw commands for one item at its current position.
///
/// Voice text starts after the play button; wrapped lines stack downward
/// from the first baseline.
pub(crate) fn draw_item(item: &OverlayItem, config: &EngineConfig, out: &mut Vec<RenderCommand>) {
    let text_x = if item.is_voice() {
        item.x + config.voice_text_offset()
    } else {
        item.x
    };
    let line_advance = item.size * config.line_height_factor;

    out.push(RenderCommand::BeginGroup { item: item.key });
    for (i, line) in item.lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        out.push(RenderCommand::DrawText {
            position: Point::new(text_x, item.baseline + i as f64 * line_advance),
            text: line.clone(),
            color: item.color,
            outline: Some(Color::BLACK),
            font_size: item.size,
        });
    }
    out.push(RenderCommand::EndGroup);
}
