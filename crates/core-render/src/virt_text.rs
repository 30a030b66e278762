//! Draw-instruction construction.
//!
//! Pure translation from classified lines to per-line overlay fragment
//! sequences. Issuance and clearing live in `engine`; nothing here touches
//! a host.

use core_host::{ChunkStyle, OverlayChunk};
use core_lines::Line;

/// Overlay content for one line: an ordered fragment sequence drawn as a
/// full-width replacement starting at column 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawInstruction {
    /// 1-based absolute line number.
    pub line: usize,
    pub chunks: Vec<OverlayChunk>,
}

/// Guide level to highlight for the cursor's block. Signed: the cursor can
/// sit too far left (or its line too shallow) for any guide to qualify, in
/// which case the level is negative and matches nothing.
pub fn context_level(cursor_col: usize, indent_width: usize, cursor_indent: usize) -> i64 {
    let width = indent_width.max(1);
    let by_col = (cursor_col / width) as i64 - 2;
    let by_indent = cursor_indent as i64 - 2;
    by_col.min(by_indent)
}

/// Build one instruction per line whose depth warrants guides. Lines at
/// depth 0 or 1 have no enclosing guide to show and produce nothing.
///
/// Fragment layout per instruction: a single leading space styled
/// `Normal`, then one fragment per guide level `i` in `0..indent - 1`,
/// each `indent_width - 1` padding spaces followed by `symbol`. The
/// fragment at the context level is styled `ActiveGuide` on context rows;
/// every other guide fragment is `Guide`.
pub fn build(
    lines: &[Line],
    context_level: Option<i64>,
    indent_width: usize,
    symbol: char,
) -> Vec<DrawInstruction> {
    let width = indent_width.max(1);
    let body: String = format!("{}{}", " ".repeat(width - 1), symbol);
    let mut out = Vec::new();
    for line in lines {
        if line.indent <= 1 {
            continue;
        }
        let mut chunks = Vec::with_capacity(line.indent);
        chunks.push(OverlayChunk::new(" ", ChunkStyle::Normal));
        for i in 0..line.indent - 1 {
            let style = if line.is_context && context_level == Some(i as i64) {
                ChunkStyle::ActiveGuide
            } else {
                ChunkStyle::Guide
            };
            chunks.push(OverlayChunk::new(body.clone(), style));
        }
        out.push(DrawInstruction {
            line: line.number,
            chunks,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_lines::{Window, classify};
    use pretty_assertions::assert_eq;

    fn lines_for(texts: &[&str], width: usize) -> Vec<Line> {
        classify(
            Window::new(1, texts.len()),
            texts.iter().map(|s| s.to_string()).collect(),
            width,
        )
    }

    fn styles(ins: &DrawInstruction) -> Vec<ChunkStyle> {
        ins.chunks.iter().map(|c| c.style).collect()
    }

    #[test]
    fn shallow_lines_get_no_instruction() {
        let lines = lines_for(&["top", "  one", "    two"], 2);
        let out = build(&lines, None, 2, '|');
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].line, 3);
    }

    #[test]
    fn depth_four_gets_three_guides_plus_lead() {
        let lines = lines_for(&["        deep"], 2);
        assert_eq!(lines[0].indent, 4);
        let out = build(&lines, None, 2, '|');
        assert_eq!(out[0].chunks.len(), 4);
        assert_eq!(out[0].chunks[0], OverlayChunk::new(" ", ChunkStyle::Normal));
        assert_eq!(
            styles(&out[0])[1..],
            [ChunkStyle::Guide, ChunkStyle::Guide, ChunkStyle::Guide]
        );
    }

    #[test]
    fn guide_fragment_is_padding_plus_symbol() {
        let lines = lines_for(&["        deep"], 4);
        assert_eq!(lines[0].indent, 2);
        let out = build(&lines, None, 4, '|');
        assert_eq!(out[0].chunks[1].text, "   |");

        let out = build(&lines, None, 4, '\u{2502}');
        assert_eq!(out[0].chunks[1].text, "   \u{2502}");
    }

    #[test]
    fn width_one_has_no_padding() {
        let lines = lines_for(&["  x"], 1);
        let out = build(&lines, None, 1, '|');
        assert_eq!(out[0].chunks[1].text, "|");
    }

    #[test]
    fn context_row_highlights_exactly_one_level() {
        let mut lines = lines_for(&["      deep"], 2);
        lines[0].is_context = true;
        let out = build(&lines, Some(1), 2, '|');
        assert_eq!(
            styles(&out[0]),
            vec![
                ChunkStyle::Normal,
                ChunkStyle::Guide,
                ChunkStyle::ActiveGuide,
            ]
        );
    }

    #[test]
    fn non_context_row_ignores_the_level() {
        let lines = lines_for(&["      deep"], 2);
        let out = build(&lines, Some(1), 2, '|');
        assert!(styles(&out[0]).iter().all(|s| *s != ChunkStyle::ActiveGuide));
    }

    #[test]
    fn negative_context_level_highlights_nothing() {
        let mut lines = lines_for(&["      deep"], 2);
        lines[0].is_context = true;
        let out = build(&lines, Some(-1), 2, '|');
        assert!(styles(&out[0]).iter().all(|s| *s != ChunkStyle::ActiveGuide));
    }

    #[test]
    fn context_level_is_clamped_by_both_terms() {
        // column allows level 2 but the cursor line depth caps it at 1
        assert_eq!(context_level(8, 2, 3), 1);
        // depth allows level 2 but the column caps it at 0
        assert_eq!(context_level(4, 2, 4), 0);
        // shallow cursor line drives the level negative
        assert_eq!(context_level(2, 2, 1), -1);
    }

    #[test]
    fn build_is_deterministic() {
        let lines = lines_for(&["    a", "      b", ""], 2);
        let first = build(&lines, Some(0), 2, '|');
        let second = build(&lines, Some(0), 2, '|');
        assert_eq!(first, second);
    }
}
