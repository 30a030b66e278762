//! Indent classification and context-range detection.
//!
//! Two passes over a window of raw lines:
//! 1. `classify` assigns every row its leading-whitespace count and indent
//!    depth, synthesizing a depth for blank rows from the nearest non-blank
//!    neighbors.
//! 2. `mark_context` walks outward from the cursor to find the block that
//!    encloses it and flags every row strictly between the two boundary
//!    rows.
//!
//! Column arithmetic is `char`-based throughout. Wide characters and tab
//! indentation are out of scope; only space-run indentation is modeled.

use crate::{Line, Pos, Window};
use tracing::trace;

/// Length of the leading whitespace run, in chars.
fn leading_whitespace(text: &str) -> usize {
    text.chars().take_while(|c| c.is_whitespace()).count()
}

/// 1-based column of the first non-whitespace char, if any.
fn first_nonblank_col(text: &str) -> Option<usize> {
    text.chars().position(|c| !c.is_whitespace()).map(|i| i + 1)
}

/// Classify the raw window contents into `Line`s with indent depths.
///
/// Non-blank rows get `indent = spaces / indent_width`. Blank rows have no
/// intrinsic indentation, so their depth is inferred: one deeper than the
/// shallower of the nearest non-blank neighbors. A blank row between
/// siblings at depth N thus keeps the deepest enclosing guide alive instead
/// of looking orphaned. A window with no non-blank rows at all resolves to
/// depth 0 everywhere.
///
/// `is_context` starts out false on every row; see [`mark_context`].
pub fn classify(window: Window, texts: Vec<String>, indent_width: usize) -> Vec<Line> {
    let width = indent_width.max(1);
    let mut lines: Vec<Line> = texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let spaces = leading_whitespace(&text);
            let indent = spaces / width;
            Line {
                number: window.line_at(i),
                text,
                indent,
                spaces,
                is_context: false,
            }
        })
        .collect();

    if lines.iter().all(|l| l.is_blank()) {
        return lines;
    }

    for i in 0..lines.len() {
        if !lines[i].is_blank() {
            continue;
        }
        // Scans skip blank rows, so only intrinsic depths are ever read and
        // the mutation order cannot feed a synthesized depth back in.
        let prev = lines[..i]
            .iter()
            .rev()
            .find(|l| !l.is_blank())
            .map_or(0, |l| l.indent);
        let next = lines[i + 1..]
            .iter()
            .find(|l| !l.is_blank())
            .map_or(0, |l| l.indent);
        lines[i].indent = prev.min(next) + 1;
    }

    lines
}

/// Reference column for context matching: the first non-whitespace column
/// of the cursor's row. When the cursor row has none, approximate it the
/// same way blank-row depths are approximated: take the minimum of the
/// first non-whitespace columns of the outermost anchors in the window
/// (nearest candidate scanning backward from the window end, and forward
/// from the window start). `None` when the window holds no such column at
/// all.
pub fn reference_column(lines: &[Line], cursor_index: usize) -> Option<usize> {
    if let Some(col) = first_nonblank_col(&lines[cursor_index].text) {
        return Some(col);
    }
    let from_end = lines.iter().rev().find_map(|l| first_nonblank_col(&l.text));
    let from_start = lines.iter().find_map(|l| first_nonblank_col(&l.text));
    match (from_end, from_start) {
        (Some(a), Some(b)) => Some(a.min(b)),
        _ => None,
    }
}

/// Probe one row at the effective guide column. The column is adjusted for
/// how hosts report combined base+virtual positions: probe `col - 2` when
/// `col` is even, `col - 3` when odd. The adjustment is a preserved quirk
/// of the position encoding, not something to normalize away. Out-of-range
/// reads count as whitespace.
fn boundary_char_hit(text: &str, col: usize) -> bool {
    let idx = if col % 2 == 0 {
        col.checked_sub(2)
    } else {
        col.checked_sub(3)
    };
    match idx.and_then(|i| text.chars().nth(i)) {
        Some(c) => !c.is_whitespace(),
        None => false,
    }
}

/// Flag every row strictly inside the block enclosing the cursor.
///
/// The effective column is the cursor column, pulled back to just before
/// the reference column when the cursor sits to the right of it. From the
/// cursor row, walk backward and forward until a row's probed char is
/// non-whitespace; those rows bound the block. Blank rows never stop a
/// walk. A walk that runs off the window leaves its boundary at
/// `cursor.line - 1`, which can only yield an empty range. Boundary rows
/// themselves are never flagged (strict inequality on both ends).
///
/// No-op when the cursor falls outside the window or the window has no
/// usable reference column.
pub fn mark_context(lines: &mut [Line], window: Window, cursor: Pos) {
    let Some(cursor_index) = window.index_of(cursor.line) else {
        return;
    };
    if cursor_index >= lines.len() {
        return;
    }
    let Some(reference) = reference_column(lines, cursor_index) else {
        return;
    };
    let col = if cursor.col > reference {
        reference - 1
    } else {
        cursor.col
    };

    let fallback = cursor.line.saturating_sub(1);

    let mut start_bound = fallback;
    let mut i = cursor_index;
    loop {
        let line = &lines[i];
        if !line.is_blank() && boundary_char_hit(&line.text, col) {
            start_bound = line.number;
            break;
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut end_bound = fallback;
    let mut i = cursor_index;
    while i < lines.len() {
        let line = &lines[i];
        if !line.is_blank() && boundary_char_hit(&line.text, col) {
            end_bound = line.number;
            break;
        }
        i += 1;
    }

    trace!(
        target: "classify",
        cursor_line = cursor.line,
        col,
        start_bound,
        end_bound,
        "context_bounds"
    );

    for line in lines.iter_mut() {
        line.is_context = line.number > start_bound && line.number < end_bound;
    }
}
