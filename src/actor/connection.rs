//! Connection Actor: Dedicated thread for one WebSocket connection.
//!
//! Each connection attempt runs on its own thread. The thread connects,
//! performs the handshake, then forwards frames to the control loop until
//! the stream ends or shutdown is requested. Reads use a short timeout so
//! the shutdown flag is checked regularly.
//!
//! Every connection emits exactly one [`StreamEventKind::Closed`], and it
//! is always the last event it sends.

use super::messages::{CloseInfo, ConnectionId, StreamEvent, StreamEventKind};
use crate::error::{LogTailError, Result, TransportError};
use crossbeam_channel::Sender;
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};
use tungstenite::handshake::HandshakeError;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Error as WsError, Message, WebSocket};
use url::Url;

/// Close code reported when the server's close frame carried no status.
const NO_STATUS_RECEIVED: u16 = 1005;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Configuration for the transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound on each connection phase: the TCP connect, then the
    /// WebSocket (and TLS) handshake.
    pub connect_timeout: Duration,
    /// How long a read may block before the shutdown flag is checked.
    pub poll_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Handle to a connection thread.
pub struct ConnectionActor {
    /// Connection id.
    id: ConnectionId,
    /// Handle to the connection thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl ConnectionActor {
    /// Spawn a thread that connects to `url` and reports on `events`.
    pub fn spawn(
        id: ConnectionId,
        url: Url,
        config: &TransportConfig,
        events: Sender<StreamEvent>,
    ) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let link = Link {
            id,
            events,
            shutdown: shutdown.clone(),
        };
        let config = config.clone();
        let name = format!("logtail-conn-{}", id.0);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || link.run(&url, &config))
            .map_err(|source| LogTailError::Spawn { name, source })?;

        Ok(Self {
            id,
            handle: Some(handle),
            shutdown,
        })
    }

    /// The id this connection reports under.
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Ask the thread to close the connection.
    ///
    /// The thread still emits its `Closed` event.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Signal shutdown and wait for the thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ConnectionActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// State owned by the connection thread.
struct Link {
    id: ConnectionId,
    events: Sender<StreamEvent>,
    shutdown: Arc<AtomicBool>,
}

impl Link {
    fn run(&self, url: &Url, config: &TransportConfig) {
        let close = match self.open(url, config) {
            Ok(mut socket) => {
                info!(connection = %self.id, %url, "log stream open");
                self.emit(StreamEventKind::Opened);
                self.read_loop(&mut socket)
            }
            Err(TransportError::Cancelled) => CloseInfo::default(),
            Err(e) => {
                debug!(connection = %self.id, error = %e, "connection attempt failed");
                self.emit(StreamEventKind::Error(e.to_string()));
                CloseInfo::default()
            }
        };
        debug!(connection = %self.id, ?close, "log stream closed");
        self.emit(StreamEventKind::Closed(close));
    }

    fn open(&self, url: &Url, config: &TransportConfig) -> std::result::Result<Socket, TransportError> {
        let addrs = url.socket_addrs(|| None).map_err(TransportError::Resolve)?;
        let stream = connect_any(&addrs, config.connect_timeout)?;
        stream
            .set_read_timeout(Some(config.poll_interval))
            .map_err(TransportError::Socket)?;
        // Latency matters more than throughput for small log frames.
        let _ = stream.set_nodelay(true);

        // Reads time out every poll interval, so a silent server surfaces
        // here as repeated interruptions.
        let deadline = Instant::now() + config.connect_timeout;
        let mut attempt = tungstenite::client_tls_with_config(url.as_str(), stream, None, None);
        loop {
            match attempt {
                Ok((socket, response)) => {
                    trace!(connection = %self.id, status = %response.status(), "handshake complete");
                    return Ok(socket);
                }
                Err(HandshakeError::Interrupted(mid)) => {
                    if self.cancelled() {
                        return Err(TransportError::Cancelled);
                    }
                    if Instant::now() >= deadline {
                        return Err(TransportError::HandshakeTimeout(config.connect_timeout));
                    }
                    attempt = mid.handshake();
                }
                Err(HandshakeError::Failure(e)) => {
                    return Err(TransportError::Handshake(Box::new(e)));
                }
            }
        }
    }

    fn read_loop(&self, socket: &mut Socket) -> CloseInfo {
        let mut close = CloseInfo::default();
        loop {
            if self.cancelled() {
                let _ = socket.close(None);
                let _ = socket.flush();
                break;
            }

            match socket.read() {
                Ok(Message::Text(text)) => {
                    self.emit(StreamEventKind::Frame(text.as_str().to_owned()));
                }
                Ok(Message::Binary(bytes)) => {
                    self.emit(StreamEventKind::Frame(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Ok(Message::Close(frame)) => {
                    close = frame.map_or(
                        CloseInfo {
                            code: Some(NO_STATUS_RECEIVED),
                            reason: String::new(),
                        },
                        |frame| CloseInfo {
                            code: Some(u16::from(frame.code)),
                            reason: frame.reason.as_str().to_owned(),
                        },
                    );
                }
                // Ping/pong are answered by tungstenite on the next read.
                Ok(_) => {}
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => break,
                Err(WsError::Io(e)) if is_timeout(&e) => {}
                Err(e) => {
                    self.emit(StreamEventKind::Error(e.to_string()));
                    break;
                }
            }
        }
        close
    }

    fn cancelled(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    fn emit(&self, kind: StreamEventKind) {
        // The control loop may already be gone during shutdown.
        let _ = self.events.send(StreamEvent {
            connection: self.id,
            kind,
        });
    }
}

fn connect_any(addrs: &[SocketAddr], timeout: Duration) -> std::result::Result<TcpStream, TransportError> {
    let mut last = io::Error::new(ErrorKind::AddrNotAvailable, "host resolved to no addresses");
    for addr in addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                trace!(%addr, error = %e, "connect attempt failed");
                last = e;
            }
        }
    }
    Err(TransportError::Connect(last))
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
