//! `logtail`: follow a sandbox's live log stream in the terminal.

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::bounded;
use logtail::actor::{InputActor, NullRenderer, TailRunner};
use logtail::config::{Cli, OutputMode, TailConfig};
use logtail::surface::{TracingStatus, WriterSurface};
use logtail::terminal::{LogView, Screen, StatusLine, TerminalConfig, TerminalGuard};
use logtail::LogStreamWidget;
use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How long the input thread waits for a terminal event before re-checking shutdown.
const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(50);

fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;
    init_tracing(&config)?;

    // No sandbox, nothing to show.
    let Some(sandbox_id) = config.sandbox_id.as_deref() else {
        tracing::debug!("no sandbox id given");
        return Ok(());
    };

    match config.mode {
        OutputMode::Plain => run_plain(&config, sandbox_id),
        OutputMode::Terminal => run_terminal(&config, sandbox_id),
    }
}

fn init_tracing(config: &TailConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match (&config.log_file, config.mode) {
        (Some(path), _) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (None, OutputMode::Plain) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
        // Anything written to the terminal would tear the full-screen view.
        (None, OutputMode::Terminal) => {}
    }
    Ok(())
}

fn run_plain(config: &TailConfig, sandbox_id: &str) -> anyhow::Result<()> {
    let surface = WriterSurface::new(io::stdout().lock(), sandbox_id);
    let Some(widget) = LogStreamWidget::init(surface, Some(TracingStatus), &config.origin, &config.widget) else {
        return Ok(());
    };

    let mut runner = TailRunner::new(widget, NullRenderer, config.transport.clone());
    runner.run()?;
    Ok(())
}

fn run_terminal(config: &TailConfig, sandbox_id: &str) -> anyhow::Result<()> {
    let (width, height) = TerminalGuard::size().context("cannot read terminal size")?;
    let _guard = TerminalGuard::enter(TerminalConfig::default()).context("cannot set up terminal")?;

    let screen = Screen::new(io::stdout(), width, height);
    let pane = screen.layout().log;
    let view = LogView::new(Some(sandbox_id)).with_viewport(pane.width, pane.height);
    let Some(widget) = LogStreamWidget::init(view, Some(StatusLine::new()), &config.origin, &config.widget) else {
        return Ok(());
    };

    let (ui_tx, ui_rx) = bounded(64);
    let input = InputActor::spawn(ui_tx, INPUT_POLL_TIMEOUT)?;

    let mut runner = TailRunner::new(widget, screen, config.transport.clone()).with_ui(ui_rx);
    let result = runner.run();
    input.join();
    result?;
    Ok(())
}
