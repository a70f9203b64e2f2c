//! Session targets and stream endpoint URLs.
//!
//! The log endpoint lives at `/ws/sandboxes/<id>/logs` on the same host as
//! the page, with the WebSocket scheme mirroring the page's security.

use crate::error::{LogTailError, Result};
use std::fmt;
use url::Url;

/// Opaque identifier of the sandbox whose logs are streamed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionTarget(String);

impl SessionTarget {
    /// Wrap an identifier. Returns `None` for an empty id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The origin the stream endpoint is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrigin {
    secure: bool,
    /// Host plus explicit port, e.g. `localhost:3000` or `[::1]:8080`.
    authority: String,
}

impl PageOrigin {
    /// Parse an origin such as `https://host` or `ws://127.0.0.1:3000`.
    pub fn parse(origin: &str) -> Result<Self> {
        let invalid = |reason| LogTailError::InvalidOrigin {
            origin: origin.to_string(),
            reason,
        };

        let url = Url::parse(origin).map_err(|_| invalid("not a URL"))?;
        let secure = match url.scheme() {
            "https" | "wss" => true,
            "http" | "ws" => false,
            _ => return Err(invalid("scheme must be http, https, ws or wss")),
        };
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self { secure, authority })
    }

    /// Whether the page was served over a secure scheme.
    pub const fn is_secure(&self) -> bool {
        self.secure
    }

    /// `wss` for secure pages, `ws` otherwise.
    pub const fn transport_scheme(&self) -> &'static str {
        if self.secure {
            "wss"
        } else {
            "ws"
        }
    }

    /// Host and optional port.
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

/// Build the log stream endpoint for `target`.
pub fn log_stream_url(origin: &PageOrigin, target: &SessionTarget) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "{}://{}/",
        origin.transport_scheme(),
        origin.authority()
    ))?;

    url.path_segments_mut()
        .map_err(|()| LogTailError::InvalidOrigin {
            origin: origin.authority().to_string(),
            reason: "cannot carry a path",
        })?
        .clear()
        .extend(["ws", "sandboxes", target.as_str(), "logs"]);

    Ok(url)
}
