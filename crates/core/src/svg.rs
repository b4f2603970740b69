//! SVG snapshot: converts one frame of `RenderCommand`s into a standalone
//! SVG string. Useful for debugging layouts and for golden tests.

use danmaku_protocol::{Color, RenderCommand};

/// Render one frame as an SVG document string.
///
/// `width` and `height` define the viewBox. The background is transparent
/// unless `background` is given, matching an overlay drawn over video.
pub fn render_svg(
    commands: &[RenderCommand],
    width: f64,
    height: f64,
    background: Option<Color>,
) -> String {
    let mut svg = String::with_capacity(commands.len() * 160);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:Arial,sans-serif;font-weight:bold">"#,
    ));
    if let Some(bg) = background {
        svg.push_str(&format!(
            r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
            bg.to_hex(),
        ));
    }

    for cmd in commands {
        match cmd {
            RenderCommand::DrawText {
                position,
                text,
                color,
                outline,
                font_size,
            } => {
                // paint-order draws the stroke under the fill, like the
                // canvas stroke-then-fill sequence.
                let stroke = outline.map_or(String::new(), |c| {
                    format!(
                        r#" stroke="{}" stroke-width="3" paint-order="stroke""#,
                        c.to_hex()
                    )
                });
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" font-size="{font_size}" fill="{}" fill-opacity="{}"{stroke}>{}</text>"#,
                    position.x,
                    position.y,
                    color.to_hex(),
                    color.a,
                    escape_xml(text),
                ));
            }
            RenderCommand::BeginGroup { item } => {
                svg.push_str(&format!(r#"<g data-item="{}">"#, item.0));
            }
            RenderCommand::EndGroup => svg.push_str("</g>"),
            RenderCommand::Clear { .. } => {}
        }
    }

    svg.push_str("</svg>");
    svg
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use danmaku_protocol::{ItemKey, Point};

    #[test]
    fn outlined_text_in_item_group() {
        let cmds = vec![
            RenderCommand::Clear {
                width: 800.0,
                height: 450.0,
            },
            RenderCommand::BeginGroup { item: ItemKey(7) },
            RenderCommand::DrawText {
                position: Point::new(12.0, 27.0),
                text: "<3 & more".into(),
                color: Color::from_hex_or_white("#ff0000"),
                outline: Some(Color::BLACK),
                font_size: 24.0,
            },
            RenderCommand::EndGroup,
        ];
        let svg = render_svg(&cmds, 800.0, 450.0, None);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"<g data-item="7">"#));
        assert!(svg.contains("&lt;3 &amp; more"));
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains(r##"stroke="#000000""##));
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn optional_background() {
        let svg = render_svg(&[], 100.0, 50.0, Some(Color::BLACK));
        assert!(svg.contains(r##"<rect width="100" height="50" fill="#000000"/>"##));
    }
}
