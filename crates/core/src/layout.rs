//! Text wrapping and item geometry.

use danmaku_protocol::Rect;
use unicode_segmentation::UnicodeSegmentation;

use crate::host::TextMeasure;

/// Host measurements are trusted only when finite and non-negative;
/// anything else counts as zero width so the item still culls.
pub fn safe_width(measure: &dyn TextMeasure, text: &str, font_size: f64) -> f64 {
    let w = measure.measure_text(text, font_size);
    if w.is_finite() && w > 0.0 { w } else { 0.0 }
}

/// Split `text` into extended grapheme clusters, the units a line break
/// may fall between.
pub fn clusters(text: &str) -> Vec<&str> {
    text.graphemes(true).collect()
}

/// Greedy wrap: keep appending clusters to the current line until the next
/// one would overflow `max_width`, then start a new line.
///
/// Never returns an empty vector; empty input gives a single empty line.
/// A cluster wider than the budget on its own still gets its own line.
pub fn wrap_text(
    text: &str,
    font_size: f64,
    max_width: f64,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for cluster in clusters(text) {
        match cluster {
            "\r" => continue,
            "\n" | "\r\n" => {
                lines.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        let candidate = format!("{current}{cluster}");
        if !current.is_empty() && safe_width(measure, &candidate, font_size) > max_width {
            lines.push(std::mem::replace(&mut current, cluster.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Widest of the wrapped lines.
pub fn block_width(lines: &[String], font_size: f64, measure: &dyn TextMeasure) -> f64 {
    lines
        .iter()
        .map(|line| safe_width(measure, line, font_size))
        .fold(0.0, f64::max)
}

/// Baseline of the first line of an item in `lane`, centered in the lane.
pub fn baseline_for(lane: usize, lane_height: f64, size: f64) -> f64 {
    lane as f64 * lane_height + lane_height / 2.0 + size / 2.0
}

/// Tight box around the glyphs of a wrapped block whose first baseline is
/// `baseline`.
pub fn text_rect(
    x: f64,
    baseline: f64,
    width: f64,
    size: f64,
    line_count: usize,
    line_height_factor: f64,
) -> Rect {
    let lines = line_count.max(1) as f64;
    Rect::new(x, baseline - size, width, size * line_height_factor * lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every char is 10px wide regardless of font size.
    struct TenPx;

    impl TextMeasure for TenPx {
        fn measure_text(&self, text: &str, _font_size: f64) -> f64 {
            text.chars().count() as f64 * 10.0
        }
    }

    struct Broken;

    impl TextMeasure for Broken {
        fn measure_text(&self, _text: &str, _font_size: f64) -> f64 {
            f64::NAN
        }
    }

    #[test]
    fn wraps_at_budget() {
        let lines = wrap_text("ABCDEFGHIJ", 24.0, 40.0, &TenPx);
        assert_eq!(lines, vec!["ABCD", "EFGH", "IJ"]);
        assert_eq!(block_width(&lines, 24.0, &TenPx), 40.0);
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        let lines = wrap_text("", 24.0, 40.0, &TenPx);
        assert_eq!(lines, vec![String::new()]);
        assert_eq!(block_width(&lines, 24.0, &TenPx), 0.0);
    }

    #[test]
    fn never_splits_combining_sequences() {
        // "e" + combining acute counts as 20px with TenPx, but must stay whole.
        let text = "ae\u{301}b";
        assert_eq!(clusters(text), vec!["a", "e\u{301}", "b"]);
        let lines = wrap_text(text, 24.0, 20.0, &TenPx);
        assert_eq!(lines, vec!["a", "e\u{301}", "b"]);
    }

    #[test]
    fn joiner_sequences_stay_together() {
        let text = "👩\u{200D}💻x";
        assert_eq!(clusters(text), vec!["👩\u{200D}💻", "x"]);
    }

    /// Wrapping may only break between clusters of the original text.
    fn assert_breaks_on_clusters(text: &str, max_width: f64) -> Vec<String> {
        let lines = wrap_text(text, 24.0, max_width, &TenPx);
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| clusters(l)).collect();
        assert_eq!(rejoined, clusters(text), "{lines:?}");
        lines
    }

    #[test]
    fn flags_stay_whole() {
        assert_eq!(clusters("🇯🇵🇯🇵"), vec!["🇯🇵", "🇯🇵"]);
        assert_eq!(assert_breaks_on_clusters("🇯🇵🇯🇵", 30.0), vec!["🇯🇵", "🇯🇵"]);
    }

    #[test]
    fn devanagari_vowel_signs_stay_with_consonant() {
        assert_eq!(clusters("किताब"), vec!["कि", "ता", "ब"]);
        assert_eq!(assert_breaks_on_clusters("किताब", 30.0), vec!["कि", "ताब"]);
    }

    #[test]
    fn thai_marks_stay_with_consonant() {
        let lines = assert_breaks_on_clusters("กำลัง", 30.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| !l.starts_with('\u{e31}')));
    }

    #[test]
    fn arabic_harakat_stay_with_letter() {
        assert_eq!(clusters("مَرحَبًا"), vec!["مَ", "ر", "حَ", "بً", "ا"]);
        let lines = assert_breaks_on_clusters("مَرحَبًا", 30.0);
        assert!(lines.iter().all(|l| !l.starts_with('\u{64b}')));
    }

    #[test]
    fn oversized_cluster_gets_own_line() {
        let lines = wrap_text("AB", 24.0, 5.0, &TenPx);
        assert_eq!(lines, vec!["A", "B"]);
    }

    #[test]
    fn explicit_newlines_break() {
        let lines = wrap_text("ab\r\ncd", 24.0, 100.0, &TenPx);
        assert_eq!(lines, vec!["ab", "cd"]);
    }

    #[test]
    fn broken_measurement_reads_as_zero() {
        assert_eq!(safe_width(&Broken, "anything", 24.0), 0.0);
        let lines = wrap_text("abc", 24.0, 10.0, &Broken);
        assert_eq!(lines, vec!["abc"]);
    }

    #[test]
    fn baseline_centers_in_lane() {
        assert_eq!(baseline_for(0, 30.0, 24.0), 27.0);
        assert_eq!(baseline_for(2, 30.0, 24.0), 87.0);
    }

    #[test]
    fn text_rect_covers_all_lines() {
        let r = text_rect(100.0, 27.0, 40.0, 24.0, 3, 1.0);
        assert_eq!(r, Rect::new(100.0, 3.0, 40.0, 72.0));
    }
}
