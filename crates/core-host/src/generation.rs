//! Per-trigger generation tokens.
//!
//! Host calls are issued over an asynchronous boundary in real editors, so
//! a trigger can fire while an earlier pipeline run still has overlay
//! issuance in flight. Each run captures a token at entry; if a later run
//! (or an explicit invalidation from the host's event dispatch) has bumped
//! the counter by the time the run completes, the run discards its results
//! instead of overwriting the newer run's record.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Token identifying one pipeline run. Stale once any later token exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token(u64);

/// Cloneable handle over a shared monotonic counter. Clones observe the
/// same generation; hand one to the host's event dispatch so queued
/// triggers can invalidate an in-flight run.
#[derive(Debug, Clone, Default)]
pub struct Generations {
    current: Arc<AtomicU64>,
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and return its token. Any previously issued
    /// token becomes stale.
    pub fn begin(&self) -> Token {
        Token(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Invalidate every outstanding token without starting a run.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, token: Token) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_current() {
        let g = Generations::new();
        let t = g.begin();
        assert!(g.is_current(t));
    }

    #[test]
    fn later_begin_stales_earlier_token() {
        let g = Generations::new();
        let first = g.begin();
        let second = g.begin();
        assert!(!g.is_current(first));
        assert!(g.is_current(second));
    }

    #[test]
    fn invalidate_stales_without_new_token() {
        let g = Generations::new();
        let t = g.begin();
        g.invalidate();
        assert!(!g.is_current(t));
    }

    #[test]
    fn clones_share_the_counter() {
        let g = Generations::new();
        let other = g.clone();
        let t = g.begin();
        other.invalidate();
        assert!(!g.is_current(t));
    }
}
