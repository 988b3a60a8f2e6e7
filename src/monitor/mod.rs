//! Monitor Session
//!
//! Owns the byte-stream connection to the emulator's monitor console and
//! performs one command round trip at a time: write a line, read until the
//! end-of-response marker, hand back the captured text.
//!
//! ## Ordering
//!
//! [`MonitorSession::send_and_receive`] takes `&mut self`, so a second
//! command cannot be written before the previous reply has been read. The
//! console has no request identifiers; a reply is only ever attributed to
//! the command sent right before it.
//!
//! ## Failure
//!
//! A timeout or a closed stream leaves the console at an unknown point in
//! its output. The session closes itself in both cases and refuses further
//! commands.

pub mod prompt;
pub mod telnet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use uuid::Uuid;

use crate::ansi::strip_ansi;
use crate::command::CommandLine;
use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use prompt::ResponseTerminator;
use telnet::TelnetFilter;

/// Read buffer size for monitor output
const READ_CHUNK_SIZE: usize = 4096;

/// Opens byte streams to a monitor endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    /// Stream type produced by this connector
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to `endpoint` (`host:port`)
    async fn connect(&self, endpoint: &str) -> io::Result<Self::Stream>;
}

/// Plain TCP connector (the monitor's telnet port)
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, endpoint: &str) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(endpoint).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Identity of the live monitor connection
#[derive(Debug, Clone, PartialEq)]
pub struct SessionHandle {
    /// Unique identifier for this session
    pub id: String,
    /// `host:port` the session is connected to
    pub endpoint: String,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
}

impl SessionHandle {
    fn new(endpoint: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            endpoint: endpoint.to_string(),
            connected_at: Utc::now(),
        }
    }
}

/// Text captured for one command, terminator included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    /// The command line that produced this reply
    pub command: String,
    /// Console output with telnet commands, ANSI escapes and CRs removed
    pub text: String,
}

/// Per-session console conventions
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub line_terminator: String,
    pub terminator: ResponseTerminator,
    pub negotiate_telnet: bool,
    pub prime_session: bool,
}

impl SessionOptions {
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        Ok(Self {
            connect_timeout: config.connect_timeout(),
            response_timeout: config.response_timeout(),
            line_terminator: config.line_terminator.clone(),
            terminator: ResponseTerminator::from_config(config)?,
            negotiate_telnet: config.negotiate_telnet,
            prime_session: config.prime_session,
        })
    }
}

/// A single persistent connection to the monitor console
pub struct MonitorSession<S> {
    handle: SessionHandle,
    stream: S,
    options: SessionOptions,
    telnet: TelnetFilter,
    closed: bool,
}

impl<S> MonitorSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Connect to the monitor and wait until its console is ready
    pub async fn open<C>(endpoint: &str, options: SessionOptions, connector: &C) -> Result<Self>
    where
        C: Connector<Stream = S>,
    {
        info!("Connecting to monitor at {}", endpoint);

        let stream = match timeout(options.connect_timeout, connector.connect(endpoint)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(Error::ConnectionFailed {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(Error::ConnectionFailed {
                    endpoint: endpoint.to_string(),
                    reason: format!("timed out after {:?}", options.connect_timeout),
                })
            }
        };

        let mut session = Self::from_stream(endpoint, stream, options);
        session.handshake().await?;

        info!(
            "Monitor session {} ready on {}",
            session.handle.id, session.handle.endpoint
        );
        Ok(session)
    }

    /// Wrap an already connected stream without any handshake
    pub fn from_stream(endpoint: &str, stream: S, options: SessionOptions) -> Self {
        Self {
            handle: SessionHandle::new(endpoint),
            stream,
            options,
            telnet: TelnetFilter::new(),
            closed: false,
        }
    }

    /// Consume the greeting and optionally prime the console
    async fn handshake(&mut self) -> Result<()> {
        let greeting = self.read_reply("<greeting>").await?;
        trace!("Monitor greeting: {:?}", greeting);

        // The first byte after connecting can be swallowed by the console,
        // so an empty line goes first.
        if self.options.prime_session {
            let prime = CommandLine::raw("")?;
            self.send_and_receive(&prime).await?;
        }

        Ok(())
    }

    /// Send one command line and read its reply
    pub async fn send_and_receive(&mut self, command: &CommandLine) -> Result<RawReply> {
        if self.closed {
            return Err(Error::ConnectionClosed {
                reason: "session is closed".to_string(),
            });
        }

        debug!("-> {}", command);
        self.write_line(command).await?;

        let text = self.read_reply(command.as_str()).await?;
        trace!("<- {:?}", text);

        Ok(RawReply {
            command: command.as_str().to_string(),
            text,
        })
    }

    /// Write a command line without waiting for a reply
    pub async fn send_only(&mut self, command: &CommandLine) -> Result<()> {
        if self.closed {
            return Err(Error::ConnectionClosed {
                reason: "session is closed".to_string(),
            });
        }
        debug!("-> {} (no reply expected)", command);
        self.write_line(command).await
    }

    async fn write_line(&mut self, command: &CommandLine) -> Result<()> {
        let mut bytes =
            Vec::with_capacity(command.as_str().len() + self.options.line_terminator.len());
        bytes.extend_from_slice(command.as_str().as_bytes());
        bytes.extend_from_slice(self.options.line_terminator.as_bytes());

        let written = async {
            self.stream.write_all(&bytes).await?;
            self.stream.flush().await
        }
        .await;

        if let Err(e) = written {
            error!("Write to monitor failed: {}", e);
            self.close().await;
            return Err(Error::ConnectionClosed {
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// Read until the end-of-response marker, bounded by the response timeout
    async fn read_reply(&mut self, command: &str) -> Result<String> {
        let duration = self.options.response_timeout;

        match timeout(duration, self.read_until_marker()).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                error!("Monitor session {} failed: {}", self.handle.id, e);
                self.close().await;
                Err(e)
            }
            Err(_) => {
                error!(
                    "No end-of-response marker for '{}' within {:?}",
                    command, duration
                );
                self.close().await;
                Err(Error::Timeout {
                    command: command.to_string(),
                    duration,
                })
            }
        }
    }

    async fn read_until_marker(&mut self) -> Result<String> {
        let mut captured = Vec::new();
        let mut buf = [0u8; READ_CHUNK_SIZE];

        loop {
            let n = self
                .stream
                .read(&mut buf)
                .await
                .map_err(|e| Error::ConnectionClosed {
                    reason: e.to_string(),
                })?;

            if n == 0 {
                return Err(Error::ConnectionClosed {
                    reason: "monitor closed the connection".to_string(),
                });
            }

            if self.options.negotiate_telnet {
                let filtered = self.telnet.filter(&buf[..n]);
                if !filtered.replies.is_empty() {
                    trace!("Refusing {} bytes of telnet options", filtered.replies.len());
                    self.stream
                        .write_all(&filtered.replies)
                        .await
                        .map_err(|e| Error::ConnectionClosed {
                            reason: e.to_string(),
                        })?;
                }
                captured.extend_from_slice(&filtered.data);
            } else {
                captured.extend_from_slice(&buf[..n]);
            }

            let text = normalize(&captured);
            if let Some(marker) = self.options.terminator.marker(&text) {
                if marker.end < text.len() {
                    debug!(
                        "Discarding {} bytes after end-of-response marker",
                        text.len() - marker.end
                    );
                }
                return Ok(text[..marker.end].to_string());
            }
        }
    }

    /// Close the connection; calling it again is a no-op
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.stream.shutdown().await {
            debug!("Ignoring error while closing monitor stream: {}", e);
        }
        info!("Monitor session {} closed", self.handle.id);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }
}

/// Decode captured bytes into comparable console text
fn normalize(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    strip_ansi(&text).replace('\r', "")
}
