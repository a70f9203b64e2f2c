//! The log stream widget: connection state, backoff and auto-scroll.
//!
//! [`LogStreamWidget`] is a pure state machine. It does not own a socket or
//! a timer; every transition that needs one returns an [`Effect`] for the
//! host loop to carry out ([`crate::actor::TailRunner`] in this crate).
//!
//! ```text
//!  Disconnected ──connect()──▶ Connecting ──on_open()──▶ Connected ◀─┐
//!       ▲                          │                        │   on_message()
//!       │                          └──on_close()────────────┤────────┘
//!       └──── retry timer ◀── ScheduleReconnect ◀───────────┘
//! ```

use crate::backoff::{format_seconds, RetryBackoff, INITIAL_RETRY_DELAY, MAX_RETRY_DELAY};
use crate::surface::{
    is_near_bottom, DisplaySurface, ScrollAction, StatusIndicator, StatusTone,
    DEFAULT_SCROLL_TOLERANCE,
};
use crate::target::{log_stream_url, PageOrigin, SessionTarget};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Status text while a connection is being established.
pub const STATUS_CONNECTING: &str = "connecting...";

/// Status text once the stream is open.
pub const STATUS_CONNECTED: &str = "connected";

/// Configuration for the widget.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Delay before the first reconnect and after every successful open.
    pub initial_retry_delay: Duration,
    /// Cap on the reconnect delay.
    pub max_retry_delay: Duration,
    /// Distance from the bottom, in surface units, that still counts as following.
    pub scroll_tolerance: u32,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            initial_retry_delay: INITIAL_RETRY_DELAY,
            max_retry_delay: MAX_RETRY_DELAY,
            scroll_tolerance: DEFAULT_SCROLL_TOLERANCE,
        }
    }
}

/// Connection state as seen by the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection; a reconnect may be pending.
    Disconnected,
    /// A connection was requested and has not opened yet.
    Connecting,
    /// The stream is open.
    Connected,
}

/// Work the host must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a new connection to this URL, replacing any previous one.
    Connect(Url),
    /// Close the current connection. Its close event drives the retry.
    Close,
    /// Call [`LogStreamWidget::connect`] once this delay has elapsed.
    ScheduleReconnect(Duration),
}

/// Live log view for one sandbox.
#[derive(Debug)]
pub struct LogStreamWidget<D, S> {
    display: D,
    status: Option<S>,
    target: SessionTarget,
    url: Url,
    state: ConnectionState,
    backoff: RetryBackoff,
    auto_scroll: bool,
    scroll_tolerance: u32,
}

impl<D: DisplaySurface, S: StatusIndicator> LogStreamWidget<D, S> {
    /// Bind the widget to a display surface.
    ///
    /// Returns `None` without touching either element when the surface
    /// carries no target id, so pages without a log pane stay untouched.
    /// An origin that cannot produce a URL is treated the same way.
    pub fn init(display: D, status: Option<S>, origin: &PageOrigin, config: &WidgetConfig) -> Option<Self> {
        let target = SessionTarget::new(display.target_id()?)?;
        let url = match log_stream_url(origin, &target) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, %target, "cannot build log stream URL");
                return None;
            }
        };

        Some(Self {
            display,
            status,
            target,
            url,
            state: ConnectionState::Disconnected,
            backoff: RetryBackoff::new(config.initial_retry_delay, config.max_retry_delay),
            auto_scroll: true,
            scroll_tolerance: config.scroll_tolerance,
        })
    }

    /// Begin a connection attempt.
    pub fn connect(&mut self) -> Effect {
        debug!(url = %self.url, "connecting");
        self.set_status(STATUS_CONNECTING, StatusTone::Caution);
        self.state = ConnectionState::Connecting;
        Effect::Connect(self.url.clone())
    }

    /// The connection opened. This is the only place the backoff resets.
    pub fn on_open(&mut self) {
        debug!(target_id = %self.target, "connected");
        self.set_status(STATUS_CONNECTED, StatusTone::Success);
        self.backoff.reset();
        self.state = ConnectionState::Connected;
    }

    /// A frame arrived: append it verbatim and follow if pinned.
    pub fn on_message(&mut self, text: &str) {
        self.display.append_text(text);
        self.scroll_to_bottom();
    }

    /// The connection ended, cleanly or not.
    ///
    /// Schedules the reconnect with the current delay and only then doubles
    /// the delay. Returns `None` when already disconnected.
    pub fn on_close(&mut self) -> Option<Effect> {
        if self.state == ConnectionState::Disconnected {
            return None;
        }
        self.state = ConnectionState::Disconnected;

        let delay = self.backoff.current();
        let text = format!("disconnected — retrying in {}s", format_seconds(delay));
        self.set_status(&text, StatusTone::Muted);
        let effect = Effect::ScheduleReconnect(delay);
        self.backoff.advance();
        debug!(?delay, next = ?self.backoff.current(), "reconnect scheduled");
        Some(effect)
    }

    /// The transport reported an error: close it and let the close handler retry.
    pub fn on_error(&mut self) -> Option<Effect> {
        (self.state != ConnectionState::Disconnected).then_some(Effect::Close)
    }

    /// The surface scrolled: recompute whether to follow new output.
    pub fn on_scroll(&mut self) {
        self.auto_scroll = is_near_bottom(
            self.display.scroll_height(),
            self.display.scroll_top(),
            self.display.client_height(),
            self.scroll_tolerance,
        );
    }

    /// Apply a host scroll gesture, then re-evaluate following.
    pub fn scroll(&mut self, action: ScrollAction) {
        let top = i64::from(self.display.scroll_top());
        let target = match action {
            ScrollAction::Lines(n) => top + i64::from(n) * i64::from(self.display.line_step()),
            ScrollAction::Pages(n) => {
                let page = i64::from(self.display.client_height().max(1));
                top + i64::from(n) * page
            }
            ScrollAction::Top => 0,
            ScrollAction::Bottom => i64::from(self.display.scroll_height()),
        };
        let clamped = u32::try_from(target.max(0)).unwrap_or(u32::MAX);
        self.display.set_scroll_top(clamped);
        self.on_scroll();
    }

    /// Change the surface geometry (e.g. a terminal resize).
    ///
    /// A following view stays pinned to the bottom afterwards.
    pub fn relayout(&mut self, f: impl FnOnce(&mut D)) {
        f(&mut self.display);
        self.scroll_to_bottom();
    }

    fn scroll_to_bottom(&mut self) {
        if self.auto_scroll {
            let height = self.display.scroll_height();
            self.display.set_scroll_top(height);
        }
    }

    fn set_status(&mut self, text: &str, tone: StatusTone) {
        if let Some(status) = self.status.as_mut() {
            status.set_status(text, tone);
        }
    }
}

impl<D, S> LogStreamWidget<D, S> {
    /// Current connection state.
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// The delay the next close will wait before reconnecting.
    pub const fn retry_delay(&self) -> Duration {
        self.backoff.current()
    }

    /// Whether new output scrolls the view.
    pub const fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// The sandbox being tailed.
    pub const fn target(&self) -> &SessionTarget {
        &self.target
    }

    /// The stream endpoint.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// The display surface.
    pub const fn display(&self) -> &D {
        &self.display
    }

    /// The status indicator, if one is attached.
    pub const fn status(&self) -> Option<&S> {
        self.status.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MemoryStatus, MemorySurface};

    type TestWidget = LogStreamWidget<MemorySurface, MemoryStatus>;

    fn origin() -> PageOrigin {
        PageOrigin::parse("https://host").unwrap()
    }

    fn widget_with(surface: MemorySurface) -> TestWidget {
        LogStreamWidget::init(surface, Some(MemoryStatus::new()), &origin(), &WidgetConfig::default())
            .unwrap()
    }

    fn widget() -> TestWidget {
        widget_with(MemorySurface::new(Some("abc123")).with_client_height(10))
    }

    fn status_text(widget: &TestWidget) -> &str {
        widget.status().unwrap().text().unwrap()
    }

    #[test]
    fn test_init_without_target_is_noop() {
        let surface = MemorySurface::new(None);
        let widget: Option<TestWidget> =
            LogStreamWidget::init(surface, Some(MemoryStatus::new()), &origin(), &WidgetConfig::default());
        assert!(widget.is_none());
    }

    #[test]
    fn test_init_with_empty_target_is_noop() {
        let surface = MemorySurface::new(Some(""));
        let widget: Option<TestWidget> =
            LogStreamWidget::init(surface, Some(MemoryStatus::new()), &origin(), &WidgetConfig::default());
        assert!(widget.is_none());
    }

    #[test]
    fn test_init_sets_no_status() {
        let widget = widget();
        assert!(widget.status().unwrap().history().is_empty());
        assert_eq!(widget.state(), ConnectionState::Disconnected);
        assert!(widget.auto_scroll());
    }

    #[test]
    fn test_connect_builds_url_and_status() {
        let mut widget = widget();
        let effect = widget.connect();
        let Effect::Connect(url) = effect else {
            panic!("expected connect, got {effect:?}");
        };
        assert_eq!(url.as_str(), "wss://host/ws/sandboxes/abc123/logs");
        assert_eq!(status_text(&widget), STATUS_CONNECTING);
        assert_eq!(widget.status().unwrap().tone(), Some(StatusTone::Caution));
        assert_eq!(widget.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_messages_append_in_order() {
        let mut widget = widget();
        widget.connect();
        widget.on_open();
        for chunk in ["a", "b\n", "", "c\r\n", "ünïcode"] {
            widget.on_message(chunk);
        }
        assert_eq!(widget.display().text(), "ab\nc\r\nünïcode");
    }

    #[test]
    fn test_open_close_scenario() {
        let mut widget = widget();
        widget.connect();
        widget.on_open();
        assert_eq!(status_text(&widget), STATUS_CONNECTED);
        widget.on_message("line1\n");
        widget.on_message("line2\n");
        // Abnormal close: the transport error arrives first.
        assert_eq!(widget.on_error(), Some(Effect::Close));
        let effect = widget.on_close();

        assert_eq!(widget.display().text(), "line1\nline2\n");
        assert_eq!(status_text(&widget), "disconnected — retrying in 1s");
        assert_eq!(widget.status().unwrap().tone(), Some(StatusTone::Muted));
        assert_eq!(effect, Some(Effect::ScheduleReconnect(Duration::from_millis(1000))));
        assert_eq!(widget.retry_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn test_close_while_disconnected_is_ignored() {
        let mut widget = widget();
        widget.connect();
        assert!(widget.on_close().is_some());
        assert_eq!(widget.on_close(), None);
        assert_eq!(widget.on_error(), None);
        assert_eq!(widget.retry_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn test_consecutive_failures_back_off() {
        let mut widget = widget();
        let mut waits = Vec::new();
        for _ in 0..7 {
            widget.connect();
            match widget.on_close() {
                Some(Effect::ScheduleReconnect(d)) => waits.push(d.as_millis()),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(waits, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
        assert_eq!(status_text(&widget), "disconnected — retrying in 30s");
    }

    #[test]
    fn test_open_resets_backoff() {
        let mut widget = widget();
        for _ in 0..5 {
            widget.connect();
            widget.on_close();
        }
        assert_eq!(widget.retry_delay(), Duration::from_millis(30_000));
        widget.connect();
        widget.on_open();
        assert_eq!(
            widget.on_close(),
            Some(Effect::ScheduleReconnect(Duration::from_millis(1000)))
        );
    }

    #[test]
    fn test_status_cycle() {
        let mut widget = widget();
        widget.connect();
        widget.on_open();
        widget.on_close();
        widget.connect();
        let tones: Vec<StatusTone> = widget
            .status()
            .unwrap()
            .history()
            .iter()
            .map(|(_, tone)| *tone)
            .collect();
        assert_eq!(
            tones,
            vec![
                StatusTone::Caution,
                StatusTone::Success,
                StatusTone::Muted,
                StatusTone::Caution
            ]
        );
    }

    #[test]
    fn test_scroll_tolerance_boundaries() {
        let mut surface = MemorySurface::new(Some("abc123")).with_client_height(600);
        surface.set_content_height(1000);
        let mut widget = widget_with(surface);

        widget.display.scroll_raw(350);
        widget.on_scroll();
        assert!(!widget.auto_scroll());

        widget.display.scroll_raw(351);
        widget.on_scroll();
        assert!(widget.auto_scroll());
    }

    #[test]
    fn test_auto_scroll_pins_to_bottom() {
        let mut widget = widget();
        widget.connect();
        widget.on_open();
        for i in 0..30 {
            widget.on_message(&format!("line {i}\n"));
        }
        let display = widget.display();
        assert_eq!(display.scroll_top(), display.scroll_height() - display.client_height());
    }

    #[test]
    fn test_paused_view_is_left_alone() {
        let config = WidgetConfig {
            scroll_tolerance: 2,
            ..WidgetConfig::default()
        };
        let surface = MemorySurface::new(Some("abc123")).with_client_height(10);
        let mut widget: TestWidget =
            LogStreamWidget::init(surface, Some(MemoryStatus::new()), &origin(), &config).unwrap();
        widget.connect();
        widget.on_open();
        for i in 0..40 {
            widget.on_message(&format!("line {i}\n"));
        }
        widget.scroll(ScrollAction::Top);
        assert!(!widget.auto_scroll());

        widget.on_message("more\n");
        assert_eq!(widget.display().scroll_top(), 0);
        assert!(widget.display().text().ends_with("more\n"));

        widget.scroll(ScrollAction::Bottom);
        assert!(widget.auto_scroll());
        widget.on_message("tail\n");
        let display = widget.display();
        assert_eq!(display.scroll_top(), display.scroll_height() - display.client_height());
    }

    #[test]
    fn test_scroll_actions() {
        let config = WidgetConfig {
            scroll_tolerance: 1,
            ..WidgetConfig::default()
        };
        let surface = MemorySurface::new(Some("abc123")).with_client_height(10);
        let mut widget: TestWidget =
            LogStreamWidget::init(surface, Some(MemoryStatus::new()), &origin(), &config).unwrap();
        for i in 0..50 {
            widget.on_message(&format!("{i}\n"));
        }
        assert_eq!(widget.display().scroll_top(), 40);

        widget.scroll(ScrollAction::Pages(-1));
        assert_eq!(widget.display().scroll_top(), 30);
        widget.scroll(ScrollAction::Lines(-3));
        assert_eq!(widget.display().scroll_top(), 27);
        widget.scroll(ScrollAction::Lines(-100));
        assert_eq!(widget.display().scroll_top(), 0);
        widget.scroll(ScrollAction::Pages(100));
        assert_eq!(widget.display().scroll_top(), 40);
        assert!(widget.auto_scroll());
    }

    #[test]
    fn test_relayout_keeps_following() {
        let mut widget = widget();
        for i in 0..30 {
            widget.on_message(&format!("{i}\n"));
        }
        let mut resized = MemorySurface::new(Some("abc123")).with_client_height(5);
        resized.append_text(widget.display().text());
        widget.relayout(|display| *display = resized);
        assert_eq!(widget.display().scroll_top(), 25);
    }

    #[test]
    fn test_without_status_indicator() {
        let surface = MemorySurface::new(Some("abc123"));
        let mut widget: TestWidget =
            LogStreamWidget::init(surface, None, &origin(), &WidgetConfig::default()).unwrap();
        widget.connect();
        widget.on_open();
        widget.on_message("x");
        assert!(widget.on_close().is_some());
        assert!(widget.status().is_none());
    }
}
