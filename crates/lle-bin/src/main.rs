//! `lle` entrypoint: an inline line editor driving the differential renderer.
//!
//! Reads keys in raw mode, edits a single `LineBuffer` and re-renders after
//! every event. Enter commits the line and starts a new session below it,
//! F2 toggles the theme, Ctrl-C / Ctrl-D exit. Logs go to a file, never to
//! the terminal being rendered.
use anyhow::Result;
use clap::Parser;
use core_config::{Config, SyncMode, load_from};
use core_model::{Edit, HighlightSpan, LineBuffer, Palette, Theme, highlight::highlight};
use core_render::{RenderOptions, Renderer, SyncPolicy, fallback_dump};
use core_terminal::{CrosstermBackend, TerminalCapabilities};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "lle.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "lle", version, about = "Inline line editor")]
struct Args {
    /// Optional configuration file path (overrides discovery of `lle.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Prompt text; `\n` inside the value is honored. Overrides `[prompt] text`.
    #[arg(long = "prompt")]
    prompt: Option<String>,
    /// Directory receiving `lle.log`.
    #[arg(long = "log-dir", default_value = ".")]
    log_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

fn configure_logging(log_dir: &Path) -> Result<Option<WorkerGuard>> {
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // Global subscriber already installed; drop guard so writer shuts down.
        Err(_) => Ok(None),
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn render_options(config: &Config) -> RenderOptions {
    let effective = config.effective;
    RenderOptions {
        cache_capacity: effective.cache_capacity,
        tab_width: effective.tab_width as usize,
        sync: match effective.synchronized_output {
            SyncMode::Auto => SyncPolicy::Auto,
            SyncMode::Always => SyncPolicy::Always,
            SyncMode::Never => SyncPolicy::Never,
        },
    }
}

fn initial_theme(config: &Config) -> Palette {
    let name = config.theme_name();
    Palette::by_name(name).unwrap_or_else(|| {
        warn!(target: "config", theme = name, "unknown_theme_using_dark");
        Palette::dark()
    })
}

struct Session {
    renderer: Renderer<Stdout>,
    buffer: LineBuffer,
    highlights: Vec<HighlightSpan>,
    prompt: String,
    theme: Palette,
    committed: u64,
}

impl Session {
    fn new(config: &Config, prompt: String) -> Self {
        let caps = TerminalCapabilities::detect();
        Self {
            renderer: Renderer::with_options(io::stdout(), caps, render_options(config)),
            buffer: LineBuffer::new(),
            highlights: Vec::new(),
            prompt,
            theme: initial_theme(config),
            committed: 0,
        }
    }

    fn run(&mut self) -> Result<()> {
        self.redraw();
        loop {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if self.handle_key(key)? == Flow::Exit {
                        break;
                    }
                }
                Event::Resize(width, height) => self.renderer.resize(width, height),
                _ => continue,
            }
            self.redraw();
        }
        self.renderer.finish_session()?;
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<Flow> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c' | 'd') if ctrl => return Ok(Flow::Exit),
            KeyCode::Char(ch) if !ctrl => {
                let edit = self.buffer.insert_char(ch);
                self.mark(edit);
            }
            KeyCode::Tab => {
                let edit = self.buffer.insert_char('\t');
                self.mark(edit);
            }
            KeyCode::Backspace => {
                if let Some(edit) = self.buffer.backspace() {
                    self.mark(edit);
                }
            }
            KeyCode::Delete => {
                if let Some(edit) = self.buffer.delete() {
                    self.mark(edit);
                }
            }
            KeyCode::Left => {
                self.buffer.move_left();
            }
            KeyCode::Right => {
                self.buffer.move_right();
            }
            KeyCode::Home => {
                self.buffer.move_home();
            }
            KeyCode::End => {
                self.buffer.move_end();
            }
            KeyCode::Enter => self.commit_line()?,
            KeyCode::F(2) => self.toggle_theme(),
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn mark(&mut self, edit: Edit) {
        // an allocation failure here already escalated to a full redraw
        if let Err(e) = self.renderer.mark_dirty_range(edit.start, edit.len) {
            warn!(target: "runtime", error = %e, "dirty_mark_failed");
        }
    }

    fn commit_line(&mut self) -> Result<()> {
        self.buffer.move_end();
        self.redraw();
        self.renderer.finish_session()?;
        let line = self.buffer.take();
        self.committed += 1;
        info!(
            target: "runtime",
            bytes = line.len(),
            committed = self.committed,
            "line_committed"
        );
        Ok(())
    }

    fn toggle_theme(&mut self) {
        self.theme = if self.theme.id() == Palette::dark().id() {
            Palette::plain()
        } else {
            Palette::dark()
        };
        self.renderer.invalidate_cache_all();
        self.renderer.mark_full_redraw();
        info!(target: "runtime", theme = self.theme.name(), "theme_switched");
    }

    fn redraw(&mut self) {
        self.highlights = highlight(self.buffer.text());
        let snapshot = self.buffer.snapshot().with_highlights(&self.highlights);
        let Err(e) = self.renderer.render(&snapshot, &self.prompt, &self.theme) else {
            return;
        };
        error!(target: "runtime", error = %e, "render_failed_dumping_raw");
        // Degrade to the raw text on a fresh line and restart the screen
        // model there; the old origin can no longer be trusted.
        let dump = fallback_dump(&snapshot);
        let out = self.renderer.sink_mut();
        let _ = write!(out, "\r\n{dump}\r\n");
        let _ = out.flush();
        let caps = self.renderer.capabilities();
        let options = self.renderer.options();
        self.renderer = Renderer::with_options(io::stdout(), caps, options);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging(&args.log_dir)?;
    install_panic_hook();
    info!(target: "runtime", "startup");

    let config = load_from(args.config.clone())?;
    let prompt = args
        .prompt
        .clone()
        .map(|p| p.replace("\\n", "\n"))
        .unwrap_or_else(|| config.prompt().to_owned());

    let mut backend = CrosstermBackend::new();
    let _guard = backend.enter_guard()?;
    let mut session = Session::new(&config, prompt);
    let result = session.run();
    let metrics = session.renderer.metrics_snapshot();
    info!(target: "runtime", ?metrics, committed = session.committed, "shutdown");
    result
}
