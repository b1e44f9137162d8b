//! Terminal capability detection.
//!
//! Detection runs once at startup and is never repeated per render: the
//! renderer must not query the terminal, so everything here comes from the
//! environment plus a single window-size ioctl. A resize event later updates
//! `width`/`height` through `with_size`.
//!
//! Inputs consulted:
//! * `NO_COLOR`, `COLORTERM`, `TERM`, `TERM_PROGRAM` for color depth.
//! * `LC_ALL` / `LC_CTYPE` / `LANG` for a UTF-8 locale.
//! * `TERM_PROGRAM` / `TERM` for synchronized output (mode 2026) support.
//!
//! The struct is non-exhaustive so further flags can be added without
//! breaking construction sites outside this crate.

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSupport {
    None,
    #[default]
    Ansi16,
    Ansi256,
    TrueColor,
}

impl ColorSupport {
    pub fn detect() -> Self {
        Self::from_env(|k| env::var(k).ok())
    }

    fn from_env(var: impl Fn(&str) -> Option<String>) -> Self {
        if var("NO_COLOR").is_some() {
            return Self::None;
        }
        if let Some(ct) = var("COLORTERM")
            && (ct == "truecolor" || ct == "24bit")
        {
            return Self::TrueColor;
        }
        if let Some(program) = var("TERM_PROGRAM") {
            let program = program.to_lowercase();
            if matches!(program.as_str(), "wezterm" | "iterm.app" | "vscode" | "ghostty") {
                return Self::TrueColor;
            }
        }
        match var("TERM") {
            Some(term) if term == "dumb" => Self::None,
            Some(term) if term.contains("256color") || term.contains("256-color") => Self::Ansi256,
            _ => Self::Ansi16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TerminalCapabilities {
    pub color: ColorSupport,
    pub supports_unicode: bool,
    pub width: u16,
    pub height: u16,
    /// Terminal honors `CSI ? 2026 h/l` synchronized update markers.
    pub synchronized_output: bool,
}

impl Default for TerminalCapabilities {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl TerminalCapabilities {
    /// Plain capabilities for a `width` x `height` terminal: 16 colors,
    /// unicode, no synchronized output. Mostly useful for tests and pipes.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            color: ColorSupport::Ansi16,
            supports_unicode: true,
            width,
            height,
            synchronized_output: false,
        }
    }

    pub fn detect() -> Self {
        let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
        let caps = Self::from_env(width, height, |k| env::var(k).ok());
        tracing::info!(
            target: "runtime",
            width = caps.width,
            height = caps.height,
            color = ?caps.color,
            unicode = caps.supports_unicode,
            sync = caps.synchronized_output,
            "terminal_capabilities"
        );
        caps
    }

    fn from_env(width: u16, height: u16, var: impl Fn(&str) -> Option<String>) -> Self {
        let locale = var("LC_ALL")
            .filter(|v| !v.is_empty())
            .or_else(|| var("LC_CTYPE").filter(|v| !v.is_empty()))
            .or_else(|| var("LANG"))
            .unwrap_or_default()
            .to_lowercase();
        let supports_unicode = locale.contains("utf-8") || locale.contains("utf8");
        let program = var("TERM_PROGRAM").unwrap_or_default().to_lowercase();
        let term = var("TERM").unwrap_or_default();
        let synchronized_output = matches!(
            program.as_str(),
            "wezterm" | "iterm.app" | "ghostty" | "contour" | "vscode"
        ) || term.starts_with("foot")
            || term == "xterm-kitty"
            || term.starts_with("alacritty");
        Self {
            color: ColorSupport::from_env(&var),
            supports_unicode,
            width: width.max(1),
            height: height.max(1),
            synchronized_output,
        }
    }

    pub fn with_color(mut self, color: ColorSupport) -> Self {
        self.color = color;
        self
    }

    pub fn with_unicode(mut self, supports_unicode: bool) -> Self {
        self.supports_unicode = supports_unicode;
        self
    }

    pub fn with_synchronized_output(mut self, enabled: bool) -> Self {
        self.synchronized_output = enabled;
        self
    }

    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}
