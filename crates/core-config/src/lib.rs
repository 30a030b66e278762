//! Settings loading and resolution.
//!
//! Two stages. `load_from` parses `indentline.toml` (or an override path)
//! into a `SettingsFile`, falling back to defaults when the file is missing
//! or malformed. `Settings::resolve` then folds in the one host query the
//! engine depends on (the configured indent width) and produces the
//! immutable value that is constructed once at startup and passed by
//! reference into the pipeline. A width change in the host after resolution
//! is intentionally not observed; the resolve-once contract is part of the
//! design, not an oversight.

use anyhow::{Result, bail};
use core_host::Host;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

/// Which range of the buffer each pipeline run materializes. `Buffer`
/// widens to the whole buffer so the cursor's context can span beyond the
/// viewport; `Viewport` keeps runs cheap on large buffers at the cost of
/// context accuracy near the window edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scan {
    #[default]
    Buffer,
    Viewport,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GuidesSection {
    /// Single char drawn for each guide column.
    #[serde(default = "GuidesSection::default_symbol")]
    pub symbol: char,
    /// Highlight the guide of the block enclosing the cursor.
    #[serde(default = "GuidesSection::default_context")]
    pub context: bool,
    #[serde(default)]
    pub scan: Scan,
    /// Also re-render on viewport scroll. Off by default; scrolling is
    /// noisy and the guides only change when text or cursor do.
    #[serde(default)]
    pub refresh_on_scroll: bool,
}

impl GuidesSection {
    const fn default_symbol() -> char {
        '|'
    }
    const fn default_context() -> bool {
        true
    }
}

impl Default for GuidesSection {
    fn default() -> Self {
        Self {
            symbol: Self::default_symbol(),
            context: Self::default_context(),
            scan: Scan::default(),
            refresh_on_scroll: false,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct IndentSection {
    /// Overrides the host's indent width when present.
    #[serde(default)]
    pub width: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SettingsFile {
    #[serde(default)]
    pub guides: GuidesSection,
    #[serde(default)]
    pub indent: IndentSection,
}

/// Best-effort config path following platform conventions: a local
/// `indentline.toml` wins over the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("indentline.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("indentline").join("indentline.toml");
    }
    PathBuf::from("indentline.toml")
}

/// Parse the settings file, tolerating absence and malformed content by
/// falling back to defaults. Unknown fields are ignored so the format can
/// grow without breaking older files.
pub fn load_from(path: Option<PathBuf>) -> Result<SettingsFile> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<SettingsFile>(&content) {
            Ok(file) => Ok(file),
            Err(_e) => Ok(SettingsFile::default()),
        }
    } else {
        Ok(SettingsFile::default())
    }
}

/// Fully resolved settings. Constructed once; the pipeline borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub indent_width: usize,
    pub symbol: char,
    pub context: bool,
    pub scan: Scan,
    pub refresh_on_scroll: bool,
}

impl Settings {
    /// Fold the parsed file with the host-reported indent width. The host
    /// query happens at most once, and only when the file carries no
    /// override. A non-positive width is a host contract violation.
    pub fn resolve<H: Host>(file: &SettingsFile, host: &H) -> Result<Settings> {
        let (indent_width, from_file) = match file.indent.width {
            Some(w) => (w, true),
            None => (host.indent_width()?, false),
        };
        if indent_width == 0 {
            bail!("indent width must be positive (got 0)");
        }
        let settings = Settings {
            indent_width,
            symbol: file.guides.symbol,
            context: file.guides.context,
            scan: file.guides.scan,
            refresh_on_scroll: file.guides.refresh_on_scroll,
        };
        info!(
            target: "config",
            width = settings.indent_width,
            width_from_file = from_file,
            symbol = %settings.symbol,
            context = settings.context,
            scan = ?settings.scan,
            refresh_on_scroll = settings.refresh_on_scroll,
            "settings_resolved"
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_host::{FailPoint, MemoryHost};
    use std::path::PathBuf;

    #[test]
    fn default_settings_when_missing_file() {
        let file = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(file.guides.symbol, '|');
        assert!(file.guides.context);
        assert_eq!(file.guides.scan, Scan::Buffer);
        assert!(!file.guides.refresh_on_scroll);
        assert_eq!(file.indent.width, None);
    }

    #[test]
    fn parses_all_fields() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[guides]\nsymbol = \"\u{2502}\"\ncontext = false\nscan = \"viewport\"\nrefresh_on_scroll = true\n[indent]\nwidth = 8\n",
        )
        .unwrap();
        let file = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(file.guides.symbol, '\u{2502}');
        assert!(!file.guides.context);
        assert_eq!(file.guides.scan, Scan::Viewport);
        assert!(file.guides.refresh_on_scroll);
        assert_eq!(file.indent.width, Some(8));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[guides\nsymbol = ").unwrap();
        let file = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(file.guides.symbol, '|');
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[guides]\nfuture_flag = 3\n").unwrap();
        let file = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(file.guides.context);
    }

    #[test]
    fn resolve_prefers_file_width_over_host() {
        let mut host = MemoryHost::from_text("x\n");
        host.set_indent_width(4);
        let mut file = SettingsFile::default();
        file.indent.width = Some(2);
        let settings = Settings::resolve(&file, &host).unwrap();
        assert_eq!(settings.indent_width, 2);
    }

    #[test]
    fn resolve_queries_host_when_file_silent() {
        let mut host = MemoryHost::from_text("x\n");
        host.set_indent_width(8);
        let settings = Settings::resolve(&SettingsFile::default(), &host).unwrap();
        assert_eq!(settings.indent_width, 8);
    }

    #[test]
    fn resolve_rejects_zero_width() {
        let mut host = MemoryHost::from_text("x\n");
        host.set_indent_width(0);
        assert!(Settings::resolve(&SettingsFile::default(), &host).is_err());
    }

    #[test]
    fn resolve_propagates_host_failure() {
        let mut host = MemoryHost::from_text("x\n");
        host.fail_next(FailPoint::Setting);
        assert!(Settings::resolve(&SettingsFile::default(), &host).is_err());
    }
}
