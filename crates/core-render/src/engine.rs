//! Pipeline engine: fetch, classify, clear, draw.
//!
//! One `render` call is one full pipeline run; nothing is carried between
//! runs except the namespace handle, the resolved settings, and the record
//! of active overlay handles from the last completed run. Host failures
//! abort the run and leave that record untouched.

use anyhow::Result;
use core_config::{Scan, Settings};
use core_host::{Cursor, Generations, Host, Namespace, OverlayId, Trigger};
use core_lines::{Pos, Window, classify, mark_context};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::virt_text;

pub const PLUGIN_NAME: &str = "indentline";

/// What one render call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Overlays issued this run.
    pub drawn: usize,
    /// True when a newer generation was observed at completion and the
    /// issued handles were discarded instead of recorded.
    pub stale: bool,
}

#[derive(Debug, Default)]
pub struct RenderMetrics {
    runs: AtomicU64,
    clears: AtomicU64,
    overlays_drawn: AtomicU64,
    stale_discards: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderMetricsSnapshot {
    pub runs: u64,
    pub clears: u64,
    pub overlays_drawn: u64,
    pub stale_discards: u64,
}

impl RenderMetrics {
    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        RenderMetricsSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            overlays_drawn: self.overlays_drawn.load(Ordering::Relaxed),
            stale_discards: self.stale_discards.load(Ordering::Relaxed),
        }
    }
}

/// The indent-guide pipeline bound to one namespace.
///
/// Construction resolves the namespace handle once; `Settings` were
/// resolved once by the caller. Triggers registered by `attach` are
/// expected to funnel into `render`, the single no-argument entry point.
pub struct GuideEngine {
    settings: Settings,
    namespace: Namespace,
    generations: Generations,
    active: Vec<OverlayId>,
    metrics: RenderMetrics,
}

impl GuideEngine {
    pub fn new<H: Host>(host: &mut H, settings: Settings) -> Result<Self> {
        let namespace = host.create_namespace(PLUGIN_NAME)?;
        debug!(
            target: "render.engine",
            namespace = namespace.0,
            width = settings.indent_width,
            "engine_ready"
        );
        Ok(Self {
            settings,
            namespace,
            generations: Generations::new(),
            active: Vec::new(),
            metrics: RenderMetrics::default(),
        })
    }

    /// Register the redraw triggers with the host. Scroll refresh is
    /// opt-in via settings.
    pub fn attach<H: Host>(&self, host: &mut H) -> Result<()> {
        let mut triggers = vec![
            Trigger::CursorHold,
            Trigger::BufEnter,
            Trigger::TextChanged,
            Trigger::TextChangedInsert,
        ];
        if self.settings.refresh_on_scroll {
            triggers.push(Trigger::WinScrolled);
        }
        host.register_redraw(&triggers)?;
        Ok(())
    }

    /// Shared generation counter. Host event dispatch should invalidate it
    /// when a trigger arrives while a run is still in flight, so the older
    /// run's results get discarded.
    pub fn invalidation_handle(&self) -> Generations {
        self.generations.clone()
    }

    /// Overlay handles from the last completed, non-stale run.
    pub fn active_overlays(&self) -> &[OverlayId] {
        &self.active
    }

    pub fn metrics_snapshot(&self) -> RenderMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the full pipeline once: fetch window + cursor + lines, classify,
    /// clear the namespace over the whole buffer, draw, and swap the active
    /// handle record. The window follows the configured scan mode; clearing
    /// always covers the full buffer so stale guides cannot survive edits
    /// that shift line numbers.
    pub fn render<H: Host>(&mut self, host: &mut H) -> Result<RenderOutcome> {
        let token = self.generations.begin();
        self.metrics.runs.fetch_add(1, Ordering::Relaxed);

        let full = host.buffer_range()?;
        let window = match self.settings.scan {
            Scan::Buffer => full,
            Scan::Viewport => host.visible_range()?,
        };
        let cursor = host.cursor()?;
        let texts = host.lines(window)?;

        let mut lines = classify(window, texts, self.settings.indent_width);
        let pos = resolve_pos(cursor, window);
        if self.settings.context {
            if let Some(p) = pos {
                mark_context(&mut lines, window, p);
            }
        }
        let level = pos.and_then(|p| {
            let line = window.index_of(p.line).and_then(|i| lines.get(i))?;
            Some(virt_text::context_level(
                p.col,
                self.settings.indent_width,
                line.indent,
            ))
        });

        let instructions = virt_text::build(
            &lines,
            level,
            self.settings.indent_width,
            self.settings.symbol,
        );

        host.clear_overlays(self.namespace, full)?;
        self.metrics.clears.fetch_add(1, Ordering::Relaxed);

        let mut issued = Vec::with_capacity(instructions.len());
        for ins in &instructions {
            let id = host.set_overlay(self.namespace, ins.line, 0, ins.chunks.clone())?;
            issued.push(id);
        }

        if !self.generations.is_current(token) {
            self.metrics.stale_discards.fetch_add(1, Ordering::Relaxed);
            debug!(
                target: "render.engine",
                drawn = issued.len(),
                "stale_generation_discarded"
            );
            return Ok(RenderOutcome {
                drawn: issued.len(),
                stale: true,
            });
        }

        self.metrics
            .overlays_drawn
            .fetch_add(issued.len() as u64, Ordering::Relaxed);
        let drawn = issued.len();
        self.active = issued;
        debug!(
            target: "render.engine",
            drawn,
            window_start = window.start,
            window_end = window.end,
            "render_complete"
        );
        Ok(RenderOutcome {
            drawn,
            stale: false,
        })
    }
}

/// Combined cursor position, or `None` when the host-reported position is
/// degenerate (off the window, or not a real line).
fn resolve_pos(cursor: Cursor, window: Window) -> Option<Pos> {
    if cursor.line == 0 {
        return None;
    }
    window.index_of(cursor.line)?;
    Some(Pos::new(cursor.line, cursor.effective_col()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_cursor_resolves_to_none() {
        let w = Window::new(1, 5);
        assert_eq!(resolve_pos(Cursor::new(0, 1, 0), w), None);
        assert_eq!(resolve_pos(Cursor::new(9, 1, 0), w), None);
    }

    #[test]
    fn virtual_offset_is_folded_into_the_column() {
        let w = Window::new(1, 5);
        let pos = resolve_pos(Cursor::new(2, 3, 4), w).unwrap();
        assert_eq!(pos, Pos::new(2, 7));
    }
}
