use danmaku_protocol::{Point, RenderCommand, WidgetHandle, WidgetSpec};
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::host::{COL_PX, PlacedWidget, ROW_PX, TerminalHost};

fn to_color(c: danmaku_protocol::Color) -> Color {
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb(byte(c.r), byte(c.g), byte(c.b))
}

/// Engine pixels to a cell inside `area`. `None` when off the area.
fn cell_at(area: Rect, x: f64, y: f64) -> Option<(u16, u16)> {
    let col = (x / COL_PX).floor();
    let row = (y / ROW_PX).floor();
    if col < 0.0 || row < 0.0 || col >= f64::from(area.width) || row >= f64::from(area.height) {
        return None;
    }
    Some((area.x + col as u16, area.y + row as u16))
}

/// Terminal cell back to the engine pixel at its center.
pub fn cell_to_point(area: Rect, column: u16, row: u16) -> Option<Point> {
    if column < area.x || row < area.y || column >= area.right() || row >= area.bottom() {
        return None;
    }
    Some(Point::new(
        (f64::from(column - area.x) + 0.5) * COL_PX,
        (f64::from(row - area.y) + 0.5) * ROW_PX,
    ))
}

/// Write `text` starting at engine x `x`, clipping glyphs left of the area.
fn put_text(buf: &mut Buffer, area: Rect, x: f64, row: u16, text: &str, style: Style) {
    let mut col = (x / COL_PX).floor() as i64;
    for ch in text.chars() {
        let mut tmp = [0u8; 4];
        let glyph: &str = ch.encode_utf8(&mut tmp);
        let w = Span::raw(glyph).width() as i64;
        if col >= 0 && col + w <= i64::from(area.width) {
            let cx = area.x + col as u16;
            buf[(cx, row)].set_symbol(glyph).set_style(style);
        }
        col += w;
        if col >= i64::from(area.width) {
            break;
        }
    }
}

/// Draw one engine frame into `area`.
pub fn draw_commands(buf: &mut Buffer, area: Rect, commands: &[RenderCommand]) {
    for cmd in commands {
        if let RenderCommand::DrawText {
            position,
            text,
            color,
            font_size,
            ..
        } = cmd
        {
            // Center of the glyph box picks the row.
            let Some((_, row)) = cell_at(area, 0.0, position.y - font_size / 2.0) else {
                continue;
            };
            let style = Style::default()
                .fg(to_color(*color))
                .add_modifier(Modifier::BOLD);
            put_text(buf, area, position.x, row, text, style);
        }
    }
}

/// Footprint of a widget in cells, for drawing and mouse hit tests.
pub fn widget_cells(area: Rect, widget: &PlacedWidget) -> Option<Rect> {
    let (w_px, h_px) = match &widget.spec {
        WidgetSpec::VoiceButton { size, .. } => (*size, *size),
        WidgetSpec::ActionCard(view) => (view.width, view.height),
        WidgetSpec::Toast { .. } => return None,
    };
    let x = widget.at.x.max(0.0);
    let (col, row) = cell_at(area, x, widget.at.y + ROW_PX / 2.0)
        .or_else(|| cell_at(area, x, widget.at.y))?;
    let cols = ((w_px / COL_PX).ceil() as u16).max(2);
    let rows = if matches!(widget.spec, WidgetSpec::ActionCard(_)) {
        ((h_px / ROW_PX).ceil() as u16).max(1) + 2
    } else {
        1
    };
    Some(Rect::new(col, row, cols, rows).intersection(area))
}

/// The topmost widget under a terminal cell.
pub fn widget_at(
    area: Rect,
    host: &TerminalHost,
    column: u16,
    row: u16,
) -> Option<(WidgetHandle, WidgetSpec)> {
    let cell = ratatui::layout::Position::new(column, row);
    host.widgets()
        .filter(|(_, w)| widget_cells(area, w).is_some_and(|r| r.contains(cell)))
        .last()
        .map(|(h, w)| (h, w.spec.clone()))
}

pub fn draw_widgets(frame: &mut Frame<'_>, area: Rect, host: &TerminalHost) {
    for (_, widget) in host.widgets() {
        match &widget.spec {
            WidgetSpec::VoiceButton { playing, .. } => {
                if let Some(cell) = widget_cells(area, widget) {
                    let glyph = if *playing { "⏸" } else { "▶" };
                    frame.render_widget(
                        Paragraph::new(glyph).style(Style::default().fg(Color::Cyan)),
                        cell,
                    );
                }
            }
            WidgetSpec::ActionCard(view) => {
                let Some(rect) = widget_cells(area, widget) else {
                    continue;
                };
                let heart = if view.liked { "♥" } else { "♡" };
                let mut actions = format!("{heart} {}  [l]ike [c]opy [r]eport", view.like_count);
                if view.owned {
                    actions.push_str(" [d]elete");
                }
                let width = (actions.chars().count() as u16 + 2).max(rect.width);
                let rect = Rect::new(rect.x, rect.y, width, rect.height).intersection(area);
                frame.render_widget(Clear, rect);
                frame.render_widget(
                    Paragraph::new(actions).block(
                        Block::default()
                            .borders(Borders::ALL)
                            .style(Style::default().fg(Color::White).bg(Color::DarkGray)),
                    ),
                    rect,
                );
            }
            WidgetSpec::Toast { message } => {
                let width = (message.chars().count() as u16 + 4).min(area.width);
                let rect = Rect::new(
                    area.x + area.width.saturating_sub(width) / 2,
                    area.bottom().saturating_sub(1),
                    width,
                    1,
                );
                frame.render_widget(Clear, rect);
                frame.render_widget(
                    Paragraph::new(format!("  {message}"))
                        .style(Style::default().fg(Color::Black).bg(Color::Green)),
                    rect,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_round_trip_to_engine_space() {
        let area = Rect::new(0, 1, 80, 10);
        let p = cell_to_point(area, 3, 2).expect("cell inside area");
        assert_eq!(p, Point::new(35.0, 45.0));
        assert_eq!(cell_at(area, p.x, p.y), Some((3, 2)));
        assert!(cell_to_point(area, 3, 0).is_none());
        assert!(cell_at(area, -1.0, 5.0).is_none());
    }

    #[test]
    fn text_left_of_area_is_clipped() {
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        put_text(&mut buf, area, -20.0, 0, "abcdef", Style::default());
        assert_eq!(buf[(0, 0)].symbol(), "c");
        assert_eq!(buf[(3, 0)].symbol(), "f");
        assert_eq!(buf[(4, 0)].symbol(), " ");
    }
}
