//! indentline entrypoint.
//!
//! Demo driver for the pipeline: loads a file into the in-memory host,
//! resolves settings, runs one render pass, and prints the buffer with
//! the issued overlays painted over the leading columns. Lets the guide
//! layout be inspected without a live editor attached.

use anyhow::{Context, Result};
use clap::Parser;
use core_config::{Settings, load_from};
use core_host::MemoryHost;
use core_render::GuideEngine;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "indentline", version, about = "Indent guide renderer")]
struct Args {
    /// UTF-8 text file to render guides for.
    pub path: PathBuf,
    /// Cursor position as LINE:COL (1-based), drives context highlighting.
    #[arg(long, default_value = "1:1")]
    pub cursor: String,
    /// Optional settings file path (overrides discovery of `indentline.toml`).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Indent width the host reports when the settings file has none.
    #[arg(long, default_value_t = 4)]
    pub width: usize,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let file_appender = tracing_appender::rolling::never(log_dir, "indentline.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        Err(_err) => {
            // Global subscriber already installed; drop the guard so the
            // writer shuts down.
            None
        }
    }
}

fn parse_cursor(spec: &str) -> Result<(usize, usize)> {
    let (line, col) = spec
        .split_once(':')
        .context("cursor must be given as LINE:COL")?;
    let line: usize = line.trim().parse().context("cursor line is not a number")?;
    let col: usize = col.trim().parse().context("cursor column is not a number")?;
    Ok((line, col))
}

/// Paint the overlay text over the leading columns of `text`, char-wise.
/// Overlays are full-width replacements, so the covered prefix of the
/// buffer text disappears behind them.
fn merge_overlay(text: &str, overlay: &str) -> String {
    let covered = overlay.chars().count();
    let mut out = overlay.to_string();
    out.extend(text.chars().skip(covered));
    out
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    let args = Args::parse();

    let text = std::fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let (line, col) = parse_cursor(&args.cursor)?;

    let mut host = MemoryHost::from_text(&text);
    host.set_indent_width(args.width);
    host.set_cursor(line, col, 0);

    let file = load_from(args.config.clone())?;
    let settings = Settings::resolve(&file, &host)?;
    let mut engine = GuideEngine::new(&mut host, settings)?;
    engine.attach(&mut host)?;
    let outcome = engine.render(&mut host)?;
    info!(
        target: "runtime",
        path = %args.path.display(),
        drawn = outcome.drawn,
        "render_complete"
    );

    let mut stdout = io::stdout().lock();
    for number in 1..=host.line_count() {
        let text = host.line_text(number).unwrap_or_default();
        let rendered = match host.overlays_on(number).first() {
            Some(overlay) => merge_overlay(text, &overlay.text()),
            None => text.to_string(),
        };
        writeln!(stdout, "{rendered}")?;
    }
    Ok(())
}
