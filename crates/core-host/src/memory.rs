//! Deterministic in-memory host.
//!
//! Backs the integration tests and the demo binary. Keeps every issued
//! overlay in a flat record list, supports one-shot failure injection per
//! host call, and exposes an optional hook that fires on each overlay draw
//! so tests can interleave work mid-pipeline (generation staleness).

use crate::{ChunkStyle, Cursor, Host, HostError, Namespace, OverlayChunk, OverlayId, Trigger};
use core_lines::Window;
use std::cell::Cell;
use tracing::debug;

/// One issued overlay, as the host saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayRecord {
    pub id: OverlayId,
    pub namespace: Namespace,
    pub line: usize,
    pub col: usize,
    pub chunks: Vec<OverlayChunk>,
}

impl OverlayRecord {
    /// Concatenated fragment text, useful for display and assertions.
    pub fn text(&self) -> String {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn styles(&self) -> Vec<ChunkStyle> {
        self.chunks.iter().map(|c| c.style).collect()
    }
}

/// Which host call the next injected failure should hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Namespace,
    Setting,
    Range,
    Cursor,
    Lines,
    Overlay,
    Clear,
    Register,
}

/// Ordered record of the side-effecting host calls, for sequencing
/// assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOp {
    Clear(Namespace),
    Draw(OverlayId),
}

pub struct MemoryHost {
    lines: Vec<String>,
    cursor: Cursor,
    viewport: Window,
    indent_width: usize,
    namespaces: Vec<String>,
    overlays: Vec<OverlayRecord>,
    registered: Vec<Trigger>,
    ops: Vec<HostOp>,
    next_overlay: u64,
    // Cell because read-only host queries must also consume the latch.
    fail_next: Cell<Option<FailPoint>>,
    on_set_overlay: Option<Box<dyn FnMut()>>,
}

impl MemoryHost {
    pub fn new(lines: Vec<String>) -> Self {
        let end = lines.len().max(1);
        Self {
            lines,
            cursor: Cursor::new(1, 1, 0),
            viewport: Window::new(1, end),
            indent_width: 4,
            namespaces: Vec::new(),
            overlays: Vec::new(),
            registered: Vec::new(),
            ops: Vec::new(),
            next_overlay: 0,
            fail_next: Cell::new(None),
            on_set_overlay: None,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines().map(str::to_string).collect())
    }

    pub fn set_cursor(&mut self, line: usize, col: usize, virtual_col: usize) {
        self.cursor = Cursor::new(line, col, virtual_col);
    }

    pub fn set_viewport(&mut self, start: usize, end: usize) {
        self.viewport = Window::new(start, end);
    }

    pub fn set_indent_width(&mut self, width: usize) {
        self.indent_width = width;
    }

    /// Make the next host call matching `point` fail once.
    pub fn fail_next(&mut self, point: FailPoint) {
        self.fail_next.set(Some(point));
    }

    /// Invoke `hook` on every subsequent overlay draw.
    pub fn on_set_overlay(&mut self, hook: impl FnMut() + 'static) {
        self.on_set_overlay = Some(Box::new(hook));
    }

    pub fn overlays(&self) -> &[OverlayRecord] {
        &self.overlays
    }

    /// Overlay records for one line, in issue order.
    pub fn overlays_on(&self, line: usize) -> Vec<&OverlayRecord> {
        self.overlays.iter().filter(|o| o.line == line).collect()
    }

    pub fn registered(&self) -> &[Trigger] {
        &self.registered
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_text(&self, number: usize) -> Option<&str> {
        self.lines.get(number.checked_sub(1)?).map(String::as_str)
    }

    fn take_failure(&self, point: FailPoint) -> Result<(), HostError> {
        if self.fail_next.get() == Some(point) {
            self.fail_next.set(None);
            let msg = "injected failure".to_string();
            return Err(match point {
                FailPoint::Namespace => HostError::Namespace(msg),
                FailPoint::Setting => HostError::Setting(msg),
                FailPoint::Range => HostError::Range(msg),
                FailPoint::Cursor => HostError::Cursor(msg),
                FailPoint::Lines => HostError::Lines(msg),
                FailPoint::Overlay => HostError::Overlay(msg),
                FailPoint::Clear => HostError::Clear(msg),
                FailPoint::Register => HostError::Register(msg),
            });
        }
        Ok(())
    }
}

impl Host for MemoryHost {
    fn create_namespace(&mut self, name: &str) -> Result<Namespace, HostError> {
        self.take_failure(FailPoint::Namespace)?;
        if let Some(idx) = self.namespaces.iter().position(|n| n == name) {
            return Ok(Namespace(idx as u64 + 1));
        }
        self.namespaces.push(name.to_string());
        let handle = Namespace(self.namespaces.len() as u64);
        debug!(target: "host.memory", name, handle = handle.0, "namespace_created");
        Ok(handle)
    }

    fn indent_width(&self) -> Result<usize, HostError> {
        self.take_failure(FailPoint::Setting)?;
        Ok(self.indent_width)
    }

    fn visible_range(&self) -> Result<Window, HostError> {
        self.take_failure(FailPoint::Range)?;
        Ok(self.viewport)
    }

    fn buffer_range(&self) -> Result<Window, HostError> {
        self.take_failure(FailPoint::Range)?;
        Ok(Window::new(1, self.lines.len().max(1)))
    }

    fn cursor(&self) -> Result<Cursor, HostError> {
        self.take_failure(FailPoint::Cursor)?;
        Ok(self.cursor)
    }

    fn lines(&self, window: Window) -> Result<Vec<String>, HostError> {
        self.take_failure(FailPoint::Lines)?;
        let mut out = Vec::with_capacity(window.len());
        for number in window.start..=window.end {
            match self.line_text(number) {
                Some(text) => out.push(text.to_string()),
                None => break,
            }
        }
        Ok(out)
    }

    fn clear_overlays(&mut self, ns: Namespace, window: Window) -> Result<(), HostError> {
        self.take_failure(FailPoint::Clear)?;
        let before = self.overlays.len();
        self.overlays
            .retain(|o| o.namespace != ns || !window.contains(o.line));
        debug!(
            target: "host.memory",
            namespace = ns.0,
            removed = before - self.overlays.len(),
            "overlays_cleared"
        );
        self.ops.push(HostOp::Clear(ns));
        Ok(())
    }

    fn set_overlay(
        &mut self,
        ns: Namespace,
        line: usize,
        col: usize,
        chunks: Vec<OverlayChunk>,
    ) -> Result<OverlayId, HostError> {
        self.take_failure(FailPoint::Overlay)?;
        if let Some(hook) = self.on_set_overlay.as_mut() {
            hook();
        }
        self.next_overlay += 1;
        let id = OverlayId(self.next_overlay);
        self.overlays.push(OverlayRecord {
            id,
            namespace: ns,
            line,
            col,
            chunks,
        });
        self.ops.push(HostOp::Draw(id));
        Ok(id)
    }

    fn register_redraw(&mut self, triggers: &[Trigger]) -> Result<(), HostError> {
        self.take_failure(FailPoint::Register)?;
        self.registered = triggers.to_vec();
        debug!(target: "host.memory", count = triggers.len(), "redraw_registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn host() -> MemoryHost {
        MemoryHost::from_text("a\n  b\n    c\n")
    }

    #[test]
    fn namespace_is_idempotent_per_name() {
        let mut h = host();
        let a = h.create_namespace("guides").unwrap();
        let b = h.create_namespace("guides").unwrap();
        let c = h.create_namespace("other").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn lines_fetch_clamps_to_buffer_end() {
        let h = host();
        let fetched = h.lines(Window::new(2, 9)).unwrap();
        assert_eq!(fetched, vec!["  b".to_string(), "    c".to_string()]);
    }

    #[test]
    fn clear_removes_only_matching_namespace_and_range() {
        let mut h = host();
        let ns = h.create_namespace("guides").unwrap();
        let other = h.create_namespace("other").unwrap();
        h.set_overlay(ns, 1, 0, vec![OverlayChunk::new("|", ChunkStyle::Guide)])
            .unwrap();
        h.set_overlay(ns, 5, 0, vec![OverlayChunk::new("|", ChunkStyle::Guide)])
            .unwrap();
        h.set_overlay(other, 1, 0, vec![OverlayChunk::new("|", ChunkStyle::Guide)])
            .unwrap();

        h.clear_overlays(ns, Window::new(1, 3)).unwrap();
        let remaining: Vec<_> = h.overlays().iter().map(|o| (o.namespace, o.line)).collect();
        assert_eq!(remaining, vec![(ns, 5), (other, 1)]);
    }

    #[test]
    fn injected_failure_fires_once() {
        let mut h = host();
        h.fail_next(FailPoint::Lines);
        assert!(h.lines(Window::new(1, 2)).is_err());
        assert!(h.lines(Window::new(1, 2)).is_ok());

        h.fail_next(FailPoint::Clear);
        let ns = Namespace(1);
        assert!(h.clear_overlays(ns, Window::new(1, 1)).is_err());
        assert!(h.clear_overlays(ns, Window::new(1, 1)).is_ok());
    }

    #[test]
    fn mismatched_failure_point_does_not_fire() {
        let mut h = host();
        h.fail_next(FailPoint::Cursor);
        assert!(h.lines(Window::new(1, 2)).is_ok());
        assert!(h.cursor().is_err());
    }

    #[test]
    fn registration_records_triggers() {
        let mut h = host();
        h.register_redraw(&[Trigger::CursorHold, Trigger::BufEnter])
            .unwrap();
        assert_eq!(h.registered(), &[Trigger::CursorHold, Trigger::BufEnter]);
    }

    #[test]
    fn ops_record_issue_order() {
        let mut h = host();
        let ns = h.create_namespace("guides").unwrap();
        h.clear_overlays(ns, Window::new(1, 3)).unwrap();
        let id = h
            .set_overlay(ns, 2, 0, vec![OverlayChunk::new("|", ChunkStyle::Guide)])
            .unwrap();
        assert_eq!(h.ops(), &[HostOp::Clear(ns), HostOp::Draw(id)]);
    }
}
