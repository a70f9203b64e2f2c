//! Command-line interface and resolved configuration.

use crate::actor::TransportConfig;
use crate::error::Result;
use crate::target::PageOrigin;
use crate::widget::WidgetConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Origin used when none is given: the sandbox manager's default listen address.
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:3000";

/// Auto-scroll tolerance for the terminal pane, in rows.
pub const TERMINAL_SCROLL_TOLERANCE: u32 = 2;

/// Command-line interface for the `logtail` binary.
#[derive(Debug, Parser)]
#[command(name = "logtail")]
#[command(about = "Follow a sandbox's live log stream")]
#[command(version)]
pub struct Cli {
    /// Sandbox whose logs to stream. Without one, logtail exits quietly.
    pub sandbox_id: Option<String>,

    /// Origin of the sandbox manager (http, https, ws or wss)
    #[arg(long, env = "LOGTAIL_ORIGIN", default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    /// Delay before the first reconnect, in milliseconds
    #[arg(long = "initial-retry-ms", default_value_t = 1000)]
    pub initial_retry_ms: u64,

    /// Upper bound on the reconnect delay, in milliseconds
    #[arg(long = "max-retry-ms", default_value_t = 30_000)]
    pub max_retry_ms: u64,

    /// TCP connect timeout, in milliseconds
    #[arg(long = "connect-timeout-ms", default_value_t = 10_000)]
    pub connect_timeout_ms: u64,

    /// Write frames straight to stdout instead of the full-screen view
    #[arg(long)]
    pub plain: bool,

    /// Write diagnostics to this file (full-screen mode logs nowhere otherwise)
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

/// How log text is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Full-screen terminal view with scrolling and a status line.
    Terminal,
    /// Frames written verbatim to stdout; status goes to the log.
    Plain,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct TailConfig {
    /// Where the stream endpoint is served.
    pub origin: PageOrigin,
    /// The sandbox to follow, if any.
    pub sandbox_id: Option<String>,
    /// Widget settings.
    pub widget: WidgetConfig,
    /// Transport settings.
    pub transport: TransportConfig,
    /// Presentation.
    pub mode: OutputMode,
    /// Diagnostics destination.
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Validate the arguments and resolve them into a [`TailConfig`].
    pub fn into_config(self) -> Result<TailConfig> {
        let origin = PageOrigin::parse(&self.origin)?;
        let mode = if self.plain {
            OutputMode::Plain
        } else {
            OutputMode::Terminal
        };

        let mut widget = WidgetConfig {
            initial_retry_delay: Duration::from_millis(self.initial_retry_ms),
            max_retry_delay: Duration::from_millis(self.max_retry_ms),
            ..WidgetConfig::default()
        };
        if mode == OutputMode::Terminal {
            widget.scroll_tolerance = TERMINAL_SCROLL_TOLERANCE;
        }

        let transport = TransportConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            ..TransportConfig::default()
        };

        Ok(TailConfig {
            origin,
            sandbox_id: self.sandbox_id.filter(|id| !id.is_empty()),
            widget,
            transport,
            mode,
            log_file: self.log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("logtail").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["abc123"]).into_config().unwrap();
        assert_eq!(config.sandbox_id.as_deref(), Some("abc123"));
        assert!(!config.origin.is_secure());
        assert_eq!(config.origin.authority(), "127.0.0.1:3000");
        assert_eq!(config.widget.initial_retry_delay, Duration::from_millis(1000));
        assert_eq!(config.widget.max_retry_delay, Duration::from_millis(30_000));
        assert_eq!(config.widget.scroll_tolerance, TERMINAL_SCROLL_TOLERANCE);
        assert_eq!(config.mode, OutputMode::Terminal);
    }

    #[test]
    fn test_plain_mode_keeps_default_tolerance() {
        let config = parse(&["--plain", "--origin", "https://host", "x"])
            .into_config()
            .unwrap();
        assert_eq!(config.mode, OutputMode::Plain);
        assert!(config.origin.is_secure());
        assert_eq!(config.widget.scroll_tolerance, WidgetConfig::default().scroll_tolerance);
    }

    #[test]
    fn test_missing_or_empty_id() {
        assert!(parse(&[]).into_config().unwrap().sandbox_id.is_none());
        assert!(parse(&[""]).into_config().unwrap().sandbox_id.is_none());
    }

    #[test]
    fn test_retry_overrides() {
        let config = parse(&["--initial-retry-ms", "250", "--max-retry-ms", "4000", "x"])
            .into_config()
            .unwrap();
        assert_eq!(config.widget.initial_retry_delay, Duration::from_millis(250));
        assert_eq!(config.widget.max_retry_delay, Duration::from_millis(4000));
    }

    #[test]
    fn test_bad_origin_rejected() {
        assert!(parse(&["--origin", "gopher://x", "x"]).into_config().is_err());
    }
}
