//! Configuration loading and parsing.
//!
//! Parses `lle.toml` (or an override path provided by the binary). Three
//! sections are recognized:
//!
//! ```toml
//! [render]
//! cache_capacity = 128          # render cache entries, >= 1
//! tab_width = 8                 # 1..=16
//! synchronized_output = "auto"  # "auto" | "always" | "never"
//!
//! [theme]
//! name = "dark"                 # "dark" | "plain"
//!
//! [prompt]
//! text = "lle> "
//! ```
//!
//! Missing sections and fields take defaults. A file that fails to parse is
//! logged and replaced by defaults wholesale; a broken config must never keep
//! the editor from starting. Unknown fields are ignored so older binaries
//! tolerate newer files. Raw values are retained next to the clamped
//! effective values so the clamp can be reported.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const FILE_NAME: &str = "lle.toml";
pub const DEFAULT_CACHE_CAPACITY: usize = 128;
pub const DEFAULT_TAB_WIDTH: u16 = 8;
pub const MAX_TAB_WIDTH: u16 = 16;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenderConfig {
    #[serde(default = "RenderConfig::default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "RenderConfig::default_tab_width")]
    pub tab_width: u16,
    #[serde(default)]
    pub synchronized_output: SyncMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: Self::default_cache_capacity(),
            tab_width: Self::default_tab_width(),
            synchronized_output: SyncMode::default(),
        }
    }
}

impl RenderConfig {
    const fn default_cache_capacity() -> usize {
        DEFAULT_CACHE_CAPACITY
    }
    const fn default_tab_width() -> u16 {
        DEFAULT_TAB_WIDTH
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeConfig {
    #[serde(default = "ThemeConfig::default_name")]
    pub name: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
        }
    }
}

impl ThemeConfig {
    fn default_name() -> String {
        "dark".to_owned()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "PromptConfig::default_text")]
    pub text: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            text: Self::default_text(),
        }
    }
}

impl PromptConfig {
    fn default_text() -> String {
        "lle> ".to_owned()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Render settings after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveRender {
    pub cache_capacity: usize,
    pub tab_width: u16,
    pub synchronized_output: SyncMode,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub source: Option<PathBuf>,
    pub file: ConfigFile, // parsed (or default) data
    pub effective: EffectiveRender,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ConfigFile::default(), None, None)
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("lle").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_absent_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config::from_file(file, Some(content), Some(path)))
        }
        Err(e) => {
            warn!(
                target: "config",
                path = %path.display(),
                error = %e,
                "config_parse_failed_using_defaults"
            );
            Ok(Config::default())
        }
    }
}

impl Config {
    fn from_file(file: ConfigFile, raw: Option<String>, source: Option<PathBuf>) -> Self {
        let effective = clamp_render(&file.render);
        Self {
            raw,
            source,
            file,
            effective,
        }
    }

    pub fn theme_name(&self) -> &str {
        &self.file.theme.name
    }

    pub fn prompt(&self) -> &str {
        &self.file.prompt.text
    }
}

fn clamp_render(raw: &RenderConfig) -> EffectiveRender {
    let cache_capacity = raw.cache_capacity.max(1);
    let tab_width = raw.tab_width.clamp(1, MAX_TAB_WIDTH);
    if cache_capacity != raw.cache_capacity || tab_width != raw.tab_width {
        info!(
            target: "config",
            raw_cache_capacity = raw.cache_capacity,
            cache_capacity,
            raw_tab_width = raw.tab_width,
            tab_width,
            "render_config_clamped"
        );
    }
    EffectiveRender {
        cache_capacity,
        tab_width,
        synchronized_output: raw.synchronized_output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl Write for LockedWriter<'_> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_cfg(body: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        tmp
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.effective.cache_capacity, 128);
        assert_eq!(cfg.effective.tab_width, 8);
        assert_eq!(cfg.effective.synchronized_output, SyncMode::Auto);
        assert_eq!(cfg.theme_name(), "dark");
        assert_eq!(cfg.prompt(), "lle> ");
        assert!(cfg.source.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let tmp = write_cfg(
            "[render]\ncache_capacity = 32\ntab_width = 4\nsynchronized_output = \"never\"\n\
             [theme]\nname = \"plain\"\n[prompt]\ntext = \"$ \"\n",
        );
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective.cache_capacity, 32);
        assert_eq!(cfg.effective.tab_width, 4);
        assert_eq!(cfg.effective.synchronized_output, SyncMode::Never);
        assert_eq!(cfg.theme_name(), "plain");
        assert_eq!(cfg.prompt(), "$ ");
        assert!(cfg.raw.is_some());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let tmp = write_cfg("[render]\ntab_width = 2\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective.tab_width, 2);
        assert_eq!(cfg.effective.cache_capacity, 128);
        assert_eq!(cfg.prompt(), "lle> ");
    }

    #[test]
    fn multiline_prompt_round_trips() {
        let tmp = write_cfg("[prompt]\ntext = \"lle\\n> \"\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.prompt(), "lle\n> ");
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let tmp = write_cfg("[render\ncache_capacity = ");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective.cache_capacity, 128);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn unknown_sync_mode_is_a_parse_error() {
        let tmp = write_cfg("[render]\nsynchronized_output = \"sometimes\"\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective.synchronized_output, SyncMode::Auto);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn clamps_out_of_range_values() {
        let tmp = write_cfg("[render]\ncache_capacity = 0\ntab_width = 99\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.render.cache_capacity, 0);
        assert_eq!(cfg.effective.cache_capacity, 1);
        assert_eq!(cfg.effective.tab_width, MAX_TAB_WIDTH);
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let effective = with_default(subscriber, || {
            clamp_render(&RenderConfig {
                cache_capacity: 0,
                tab_width: 0,
                synchronized_output: SyncMode::Always,
            })
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("render_config_clamped"));
        assert_eq!(effective.tab_width, 1);
        assert_eq!(effective.synchronized_output, SyncMode::Always);
    }
}
