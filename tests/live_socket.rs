//! End-to-end: a runner following a real WebSocket server on localhost.

use logtail::actor::{NullRenderer, Pump, TailRunner, TransportConfig};
use logtail::surface::{MemoryStatus, MemorySurface};
use logtail::{ConnectionState, LogStreamWidget, PageOrigin, WidgetConfig};
use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::{Duration, Instant};
use tungstenite::Message;

type Runner = TailRunner<MemorySurface, MemoryStatus, NullRenderer>;

fn runner(addr: SocketAddr, initial_retry: Duration) -> Runner {
    let origin = PageOrigin::parse(&format!("http://{addr}")).unwrap();
    let config = WidgetConfig {
        initial_retry_delay: initial_retry,
        ..WidgetConfig::default()
    };
    let surface = MemorySurface::new(Some("abc123")).with_client_height(10);
    let widget = LogStreamWidget::init(surface, Some(MemoryStatus::new()), &origin, &config).unwrap();
    TailRunner::new(widget, NullRenderer, TransportConfig::default())
}

/// Accept one client, check the request path, send `lines`, then drop the socket.
fn serve_once(listener: &TcpListener, lines: &[&str]) {
    let (stream, _) = listener.accept().unwrap();
    let mut ws = tungstenite::accept_hdr(stream, |request: &tungstenite::handshake::server::Request, response| {
        assert_eq!(request.uri().path(), "/ws/sandboxes/abc123/logs");
        Ok(response)
    })
    .unwrap();
    for line in lines {
        ws.send(Message::text(*line)).unwrap();
    }
    ws.flush().unwrap();
}

fn pump_until(runner: &mut Runner, mut done: impl FnMut(&Runner) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !done(runner) {
        assert!(Instant::now() < deadline, "timed out waiting on runner");
        runner.pump(Duration::from_millis(50));
    }
}

#[test]
fn test_frames_then_drop_schedules_retry() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || serve_once(&listener, &["line1\n", "line2\n"]));

    let mut runner = runner(addr, Duration::from_millis(1000));
    runner.start();
    pump_until(&mut runner, |r| r.pending_retry().is_some());
    server.join().unwrap();

    let widget = runner.widget();
    assert_eq!(widget.display().text(), "line1\nline2\n");
    assert_eq!(widget.state(), ConnectionState::Disconnected);
    assert_eq!(runner.pending_retry(), Some(Duration::from_millis(1000)));
    assert_eq!(widget.retry_delay(), Duration::from_millis(2000));
    assert_eq!(widget.status().unwrap().text(), Some("disconnected — retrying in 1s"));

    let history: Vec<&str> = widget.status().unwrap().history().iter().map(|(text, _)| text.as_str()).collect();
    assert_eq!(history, vec!["connecting...", "connected", "disconnected — retrying in 1s"]);
}

#[test]
fn test_reconnect_resets_backoff() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        serve_once(&listener, &["first\n"]);
        serve_once(&listener, &["second\n"]);
    });

    let mut runner = runner(addr, Duration::from_millis(20));
    runner.start();
    pump_until(&mut runner, |r| r.pending_retry().is_some());
    assert_eq!(runner.widget().retry_delay(), Duration::from_millis(40));

    // The retry fires, the second session opens and drops again.
    pump_until(&mut runner, |r| r.widget().display().text().ends_with("second\n"));
    pump_until(&mut runner, |r| r.pending_retry().is_some());
    server.join().unwrap();

    assert_eq!(runner.widget().display().text(), "first\nsecond\n");
    // Opening the second session reset the delay before it dropped.
    assert_eq!(runner.pending_retry(), Some(Duration::from_millis(20)));
    assert_eq!(runner.widget().retry_delay(), Duration::from_millis(40));
}

#[test]
fn test_stalled_upgrade_falls_back_to_retry() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
    // Accept, then never answer the upgrade request.
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let _ = done_rx.recv_timeout(Duration::from_secs(10));
        drop(stream);
    });

    let origin = PageOrigin::parse(&format!("http://{addr}")).unwrap();
    let surface = MemorySurface::new(Some("abc123")).with_client_height(10);
    let widget = LogStreamWidget::init(surface, Some(MemoryStatus::new()), &origin, &WidgetConfig::default()).unwrap();
    let transport = TransportConfig {
        connect_timeout: Duration::from_millis(300),
        ..TransportConfig::default()
    };
    let mut runner = TailRunner::new(widget, NullRenderer, transport);
    runner.start();
    pump_until(&mut runner, |r| r.pending_retry().is_some());
    done_tx.send(()).unwrap();
    server.join().unwrap();

    assert_eq!(runner.widget().state(), ConnectionState::Disconnected);
    assert_eq!(runner.pending_retry(), Some(Duration::from_millis(1000)));
    assert_eq!(
        runner.widget().status().unwrap().text(),
        Some("disconnected — retrying in 1s")
    );
}

#[test]
fn test_cancel_from_another_thread_ends_run() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    // Hold the session open until the client goes away.
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut ws = tungstenite::accept(stream).unwrap();
        ws.send(Message::text("hello\n")).unwrap();
        while ws.read().is_ok() {}
    });

    let mut runner = runner(addr, Duration::from_millis(1000));
    let token = runner.cancel_token();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        token.cancel();
    });

    runner.run().unwrap();
    canceller.join().unwrap();
    server.join().unwrap();

    assert!(runner.is_stopped());
    assert_eq!(runner.pump(Duration::from_millis(10)), Pump::Stopped);
    assert_eq!(runner.pending_retry(), None);
}

#[test]
fn test_missing_target_is_a_no_op() {
    let origin = PageOrigin::parse("https://manager.example").unwrap();
    let surface = MemorySurface::new(None);
    let widget = LogStreamWidget::init(surface, Some(MemoryStatus::new()), &origin, &WidgetConfig::default());
    assert!(widget.is_none());

    let empty = MemorySurface::new(Some(""));
    assert!(LogStreamWidget::init(empty, None::<MemoryStatus>, &origin, &WidgetConfig::default()).is_none());
}
