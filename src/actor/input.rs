//! Input Actor: Dedicated thread for polling terminal events.
//!
//! This actor runs in its own thread and uses crossterm's event polling
//! to turn keys, mouse wheel and resizes into [`UiEvent`]s for the
//! control loop.

use super::messages::UiEvent;
use crate::error::{LogTailError, Result};
use crate::surface::ScrollAction;
use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lines moved per mouse wheel notch.
const WHEEL_LINES: i32 = 3;

/// Input actor that polls terminal events.
pub struct InputActor {
    /// Handle to the input thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl InputActor {
    /// Spawn the input actor thread.
    ///
    /// `poll_timeout` bounds how long the thread waits for an event before
    /// re-checking the shutdown flag.
    pub fn spawn(sender: Sender<UiEvent>, poll_timeout: Duration) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let name = "logtail-input".to_string();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                Self::run_loop(&sender, &shutdown_clone, poll_timeout);
            })
            .map_err(|source| LogTailError::Spawn { name, source })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    /// Signal the input thread to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the input thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main input polling loop.
    fn run_loop(sender: &Sender<UiEvent>, shutdown: &AtomicBool, poll_timeout: Duration) {
        while !shutdown.load(Ordering::Relaxed) {
            let event = match event::poll(poll_timeout) {
                Ok(true) => match event::read() {
                    Ok(event) => convert_event(&event),
                    Err(e) => Some(UiEvent::Error(e.to_string())),
                },
                Ok(false) => None,
                Err(e) => Some(UiEvent::Error(e.to_string())),
            };

            if let Some(event) = event {
                if sender.send(event).is_err() {
                    // Receiver dropped, exit
                    break;
                }
            }
        }
    }
}

impl Drop for InputActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Convert a crossterm event to a [`UiEvent`].
pub fn convert_event(event: &Event) -> Option<UiEvent> {
    match event {
        Event::Key(key) => convert_key(key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(UiEvent::Scroll(ScrollAction::Lines(-WHEEL_LINES))),
            MouseEventKind::ScrollDown => Some(UiEvent::Scroll(ScrollAction::Lines(WHEEL_LINES))),
            _ => None,
        },
        Event::Resize(width, height) => Some(UiEvent::Resize {
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

fn convert_key(key: &KeyEvent) -> Option<UiEvent> {
    // Only process key press events (not release or repeat)
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let scroll = |action| Some(UiEvent::Scroll(action));
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(UiEvent::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(UiEvent::Quit),
        KeyCode::Up | KeyCode::Char('k') => scroll(ScrollAction::Lines(-1)),
        KeyCode::Down | KeyCode::Char('j') => scroll(ScrollAction::Lines(1)),
        KeyCode::PageUp => scroll(ScrollAction::Pages(-1)),
        KeyCode::PageDown | KeyCode::Char(' ') => scroll(ScrollAction::Pages(1)),
        KeyCode::Home | KeyCode::Char('g') => scroll(ScrollAction::Top),
        KeyCode::End | KeyCode::Char('G') => scroll(ScrollAction::Bottom),
        _ => None,
    }
}
