//! Host environment boundary.
//!
//! The engine never owns a buffer, a cursor, or a screen; it queries a
//! `Host` for all of them and pushes overlay draw instructions back through
//! the same trait. Implementations wrap an actual editor API; `MemoryHost`
//! is the deterministic in-process reference used by tests and the demo
//! binary.
//!
//! Failures cross the boundary as typed `HostError` values and abort the
//! pipeline run that observed them; previously drawn overlays stay on
//! screen until the next successful run clears and redraws.

use core_lines::Window;
use thiserror::Error;

pub mod generation;
pub mod memory;

pub use generation::{Generations, Token};
pub use memory::{FailPoint, HostOp, MemoryHost, OverlayRecord};

/// Opaque scoping identifier grouping overlays for bulk clearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace(pub u64);

/// Opaque handle to one issued overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// Cursor location as hosts report it: a 1-based line, a 1-based base
/// column, and a virtual sub-column offset that is added to the base when
/// computing the effective column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub col: usize,
    pub virtual_col: usize,
}

impl Cursor {
    pub fn new(line: usize, col: usize, virtual_col: usize) -> Self {
        Self {
            line,
            col,
            virtual_col,
        }
    }

    /// Combined base + virtual column.
    pub fn effective_col(&self) -> usize {
        self.col + self.virtual_col
    }
}

/// Style tag carried by an overlay fragment. Hosts map these onto their own
/// highlight machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkStyle {
    /// Plain text, visually identical to buffer content.
    Normal,
    /// A guide at some enclosing indent level.
    Guide,
    /// The one guide representing the cursor's current block.
    ActiveGuide,
}

/// One `(text, style)` fragment of an overlay draw instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayChunk {
    pub text: String,
    pub style: ChunkStyle,
}

impl OverlayChunk {
    pub fn new(text: impl Into<String>, style: ChunkStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Host events that request a re-render. Each maps to the engine's single
/// no-argument render entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    CursorHold,
    BufEnter,
    TextChanged,
    TextChangedInsert,
    WinScrolled,
}

/// Failure at the host boundary. Hosts wrap their native error text; the
/// engine only needs to know which call failed.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("namespace creation failed: {0}")]
    Namespace(String),
    #[error("setting query failed: {0}")]
    Setting(String),
    #[error("range query failed: {0}")]
    Range(String),
    #[error("cursor query failed: {0}")]
    Cursor(String),
    #[error("line fetch failed: {0}")]
    Lines(String),
    #[error("overlay draw failed: {0}")]
    Overlay(String),
    #[error("overlay clear failed: {0}")]
    Clear(String),
    #[error("event registration failed: {0}")]
    Register(String),
}

/// Narrow query/command surface the engine needs from an editor.
///
/// Line numbers are 1-based and absolute throughout; `Window` ranges are
/// inclusive. `create_namespace` must be idempotent per name.
pub trait Host {
    fn create_namespace(&mut self, name: &str) -> Result<Namespace, HostError>;

    /// Configured indent width. Must be positive; a zero here is a host
    /// contract violation that settings resolution rejects.
    fn indent_width(&self) -> Result<usize, HostError>;

    fn visible_range(&self) -> Result<Window, HostError>;

    fn buffer_range(&self) -> Result<Window, HostError>;

    fn cursor(&self) -> Result<Cursor, HostError>;

    /// Raw text of every line in `window`, in order.
    fn lines(&self, window: Window) -> Result<Vec<String>, HostError>;

    /// Remove every overlay previously issued under `ns` within `window`.
    fn clear_overlays(&mut self, ns: Namespace, window: Window) -> Result<(), HostError>;

    /// Draw `chunks` as a full-width replacement overlay starting at
    /// `col` on `line`. Returns a handle usable for bookkeeping.
    fn set_overlay(
        &mut self,
        ns: Namespace,
        line: usize,
        col: usize,
        chunks: Vec<OverlayChunk>,
    ) -> Result<OverlayId, HostError>;

    /// Register interest in redraw triggers. The host is expected to call
    /// back into the engine's render entry point whenever one fires.
    fn register_redraw(&mut self, triggers: &[Trigger]) -> Result<(), HostError>;
}
