//! Runner: the control loop that drives a [`LogStreamWidget`].
//!
//! The runner waits on the next of {stream event, UI event, retry timer,
//! cancellation} with `select!`, feeds it to the widget, and carries out
//! the [`Effect`] the widget returns. All widget state is touched from this
//! one thread.

use super::connection::{ConnectionActor, TransportConfig};
use super::messages::{ConnectionId, StreamEvent, StreamEventKind, UiEvent};
use crate::surface::{DisplaySurface, StatusIndicator};
use crate::widget::{ConnectionState, Effect, LogStreamWidget};
use crossbeam_channel::{after, bounded, never, select, unbounded, Receiver, Sender};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use url::Url;

/// How long `run` blocks in one pump before looping.
const IDLE_TIMEOUT: Duration = Duration::from_millis(250);

/// Draws the widget for a particular front end.
pub trait Renderer<D, S> {
    /// The host area changed size.
    fn resize(&mut self, _width: u16, _height: u16, _widget: &mut LogStreamWidget<D, S>) {}

    /// Present the current widget state.
    fn render(&mut self, widget: &LogStreamWidget<D, S>) -> io::Result<()>;
}

/// Renderer for hosts whose surfaces present themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl<D, S> Renderer<D, S> for NullRenderer {
    fn render(&mut self, _widget: &LogStreamWidget<D, S>) -> io::Result<()> {
        Ok(())
    }
}

/// Stops a running [`TailRunner`] from any thread.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Sender<()>,
}

impl CancelToken {
    /// Request shutdown. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.try_send(());
    }
}

/// What a single [`TailRunner::pump`] handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pump {
    /// A stream event was processed.
    Stream,
    /// A UI event was processed.
    Ui,
    /// The retry timer fired and a new connection was started.
    Reconnected,
    /// Nothing arrived before the timeout.
    Idle,
    /// Cancelled or quit; the runner is stopped.
    Stopped,
}

/// Owns the widget, its single connection and the retry timer.
pub struct TailRunner<D, S, R> {
    widget: LogStreamWidget<D, S>,
    renderer: R,
    transport: TransportConfig,
    /// The live connection, if any.
    connection: Option<ConnectionActor>,
    next_id: u64,
    events_tx: Sender<StreamEvent>,
    events_rx: Receiver<StreamEvent>,
    ui_rx: Receiver<UiEvent>,
    /// One-shot timer armed by a scheduled reconnect.
    retry: Option<Receiver<Instant>>,
    pending_retry: Option<Duration>,
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
    stopped: bool,
}

impl<D, S, R> TailRunner<D, S, R>
where
    D: DisplaySurface,
    S: StatusIndicator,
    R: Renderer<D, S>,
{
    /// Create a runner. Nothing connects until [`start`](Self::start).
    pub fn new(widget: LogStreamWidget<D, S>, renderer: R, transport: TransportConfig) -> Self {
        let (events_tx, events_rx) = unbounded();
        let (cancel_tx, cancel_rx) = bounded(1);
        Self {
            widget,
            renderer,
            transport,
            connection: None,
            next_id: 0,
            events_tx,
            events_rx,
            ui_rx: never(),
            retry: None,
            pending_retry: None,
            cancel_tx,
            cancel_rx,
            stopped: false,
        }
    }

    /// Receive UI events (scroll, resize, quit) from `ui`.
    #[must_use]
    pub fn with_ui(mut self, ui: Receiver<UiEvent>) -> Self {
        self.ui_rx = ui;
        self
    }

    /// A token that stops [`run`](Self::run) from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            tx: self.cancel_tx.clone(),
        }
    }

    /// The widget being driven.
    pub const fn widget(&self) -> &LogStreamWidget<D, S> {
        &self.widget
    }

    /// The renderer.
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Delay of the reconnect currently waiting to fire.
    pub const fn pending_retry(&self) -> Option<Duration> {
        self.pending_retry
    }

    /// Whether the runner has been cancelled or quit.
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Open the first connection.
    pub fn start(&mut self) {
        let effect = self.widget.connect();
        self.apply(effect);
    }

    /// Run until cancelled or the UI asks to quit.
    pub fn run(&mut self) -> io::Result<()> {
        if self.connection.is_none() && self.retry.is_none() {
            self.start();
        }
        self.renderer.render(&self.widget)?;

        loop {
            match self.pump(IDLE_TIMEOUT) {
                Pump::Stopped => break,
                Pump::Idle => {}
                // Coalesce bursts of frames into one redraw.
                _ if !self.events_rx.is_empty() => {}
                _ => self.renderer.render(&self.widget)?,
            }
        }
        Ok(())
    }

    /// Wait up to `timeout` for one event and handle it.
    pub fn pump(&mut self, timeout: Duration) -> Pump {
        if self.stopped {
            return Pump::Stopped;
        }

        let events = self.events_rx.clone();
        let ui = self.ui_rx.clone();
        let retry = self.retry.clone().unwrap_or_else(never);
        let cancel = self.cancel_rx.clone();

        select! {
            recv(events) -> event => match event {
                Ok(event) => {
                    self.on_stream_event(event);
                    Pump::Stream
                }
                // We hold a sender, so this cannot disconnect.
                Err(_) => Pump::Idle,
            },
            recv(ui) -> event => match event {
                Ok(UiEvent::Quit) => self.stop(),
                Ok(event) => {
                    self.on_ui_event(event);
                    Pump::Ui
                }
                Err(_) => {
                    debug!("ui channel closed");
                    self.ui_rx = never();
                    Pump::Idle
                }
            },
            recv(retry) -> _ => {
                self.retry = None;
                self.pending_retry = None;
                let effect = self.widget.connect();
                self.apply(effect);
                Pump::Reconnected
            },
            recv(cancel) -> _ => self.stop(),
            default(timeout) => Pump::Idle,
        }
    }

    fn on_stream_event(&mut self, event: StreamEvent) {
        let current = self.connection.as_ref().map(ConnectionActor::id);
        if current != Some(event.connection) {
            trace!(connection = %event.connection, "ignoring event from superseded connection");
            return;
        }

        match event.kind {
            StreamEventKind::Opened => self.widget.on_open(),
            StreamEventKind::Frame(text) => self.widget.on_message(&text),
            StreamEventKind::Error(message) => {
                warn!(connection = %event.connection, %message, "log stream error");
                if let Some(effect) = self.widget.on_error() {
                    self.apply(effect);
                }
            }
            StreamEventKind::Closed(info) => {
                debug!(connection = %event.connection, code = ?info.code, reason = %info.reason, "log stream ended");
                if let Some(actor) = self.connection.take() {
                    actor.join();
                }
                if let Some(effect) = self.widget.on_close() {
                    self.apply(effect);
                }
            }
        }
    }

    fn on_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Scroll(action) => self.widget.scroll(action),
            UiEvent::Resize { width, height } => {
                self.renderer.resize(width, height, &mut self.widget);
            }
            UiEvent::Error(message) => warn!(%message, "input error"),
            UiEvent::Quit => {}
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Connect(url) => self.open(url),
            Effect::Close => {
                if let Some(actor) = &self.connection {
                    actor.shutdown();
                }
            }
            Effect::ScheduleReconnect(delay) => {
                self.retry = Some(after(delay));
                self.pending_retry = Some(delay);
            }
        }
    }

    fn open(&mut self, url: Url) {
        if let Some(previous) = self.connection.take() {
            previous.shutdown();
        }

        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        match ConnectionActor::spawn(id, url, &self.transport, self.events_tx.clone()) {
            Ok(actor) => self.connection = Some(actor),
            Err(e) => {
                // Same recovery path as a dropped connection.
                warn!(error = %e, "cannot start connection");
                if let Some(effect) = self.widget.on_close() {
                    self.apply(effect);
                }
            }
        }
    }

    fn stop(&mut self) -> Pump {
        self.stopped = true;
        self.retry = None;
        self.pending_retry = None;
        if let Some(actor) = self.connection.take() {
            // An open stream closes within one poll interval; a pending
            // connect may take much longer, so leave it to finish alone.
            if self.widget.state() == ConnectionState::Connected {
                actor.join();
            } else {
                actor.shutdown();
            }
        }
        debug!("log tail stopped");
        Pump::Stopped
    }
}
