//! Lifecycle Controller
//!
//! Owns the single monitor session of a bridge and moves it through
//! `Uninitialized -> Connected -> Closed`. Nothing outside this module
//! touches the session directly; every command goes through
//! [`MonitorBridge::execute`], which holds the session lock for the whole
//! round trip.
//!
//! The lock is a `tokio::sync::Mutex`. It is fair, so concurrent callers are
//! served in the order they arrived.
//!
//! The public [`BridgeState`] is mirrored in an atomic, so
//! [`MonitorBridge::state`] answers immediately even while a call holds the
//! lock.
//!
//! When `monitor.log_file` is set, the emulator log is pointed at that file
//! right after connecting and [`MonitorBridge::wait_for_log`] follows it.
//!
//! There is no way back from `Closed`. Reconnecting would silently drop
//! whatever state the emulator had built up, so a closed bridge fails every
//! call with [`Error::BridgeClosed`] instead.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::classifier::{ClassifiedResult, ReplyClassifier};
use crate::command::CommandLine;
use crate::config::{Config, MonitorConfig};
use crate::error::{Error, Result};
use crate::log_watch::{LogPattern, LogWatcher};
use crate::monitor::{
    Connector, MonitorSession, RawReply, SessionHandle, SessionOptions, TcpConnector,
};

/// Externally visible bridge state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeState {
    /// No session opened yet
    #[default]
    Uninitialized,
    /// Session is live
    Connected,
    /// Session torn down; terminal state
    Closed,
}

impl BridgeState {
    pub fn is_connected(&self) -> bool {
        matches!(self, BridgeState::Connected)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, BridgeState::Closed)
    }

    fn as_u8(self) -> u8 {
        match self {
            BridgeState::Uninitialized => 0,
            BridgeState::Connected => 1,
            BridgeState::Closed => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => BridgeState::Uninitialized,
            1 => BridgeState::Connected,
            _ => BridgeState::Closed,
        }
    }
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BridgeState::Uninitialized => "uninitialized",
            BridgeState::Connected => "connected",
            BridgeState::Closed => "closed",
        };
        f.write_str(name)
    }
}

enum LifecycleState<S> {
    Uninitialized,
    Connected(MonitorSession<S>),
    Closed,
}

/// Owner of the monitor session
pub struct MonitorBridge<C: Connector = TcpConnector> {
    monitor: MonitorConfig,
    options: SessionOptions,
    classifier: ReplyClassifier,
    connector: C,
    log: Option<LogWatcher>,
    state: Mutex<LifecycleState<C::Stream>>,
    public: AtomicU8,
}

impl<C: Connector> MonitorBridge<C> {
    /// Create a bridge; no connection is made until [`start`](Self::start)
    /// or the first command
    pub fn new(config: &Config, connector: C) -> Result<Self> {
        Ok(Self {
            monitor: config.monitor.clone(),
            options: SessionOptions::from_config(&config.monitor)?,
            classifier: ReplyClassifier::from_config(config)?,
            connector,
            log: config.monitor.log_file.as_ref().map(LogWatcher::new),
            state: Mutex::new(LifecycleState::Uninitialized),
            public: AtomicU8::new(BridgeState::Uninitialized.as_u8()),
        })
    }

    /// Open the session now (`Uninitialized -> Connected`)
    ///
    /// A failure here is fatal: the bridge moves to `Closed` and is not
    /// retried.
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_connected(&mut state).await.map(|_| ())
    }

    /// Run one command round trip, connecting first if needed
    pub async fn execute(&self, command: &CommandLine) -> Result<RawReply> {
        let mut state = self.state.lock().await;
        let session = self.ensure_connected(&mut state).await?;

        match session.send_and_receive(command).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                if e.is_session_fatal() {
                    error!("Closing bridge after session failure: {}", e);
                    session.close().await;
                    *state = LifecycleState::Closed;
                    self.publish(BridgeState::Closed);
                }
                Err(e)
            }
        }
    }

    /// Tear the session down; safe to call in any state and more than once
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        let previous = std::mem::replace(&mut *state, LifecycleState::Closed);
        self.publish(BridgeState::Closed);

        match previous {
            LifecycleState::Connected(mut session) => {
                if let Some(quit) = &self.monitor.quit_command {
                    let sent = match CommandLine::raw(quit) {
                        Ok(line) => session.send_only(&line).await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = sent {
                        warn!("Failed to send quit command '{}': {}", quit, e);
                    }
                }
                session.close().await;
                info!("Bridge shut down");
            }
            LifecycleState::Uninitialized => {
                debug!("Bridge shut down before a session was opened");
            }
            LifecycleState::Closed => {}
        }
    }

    /// Current state; never waits for an in-flight call
    pub fn state(&self) -> BridgeState {
        BridgeState::from_u8(self.public.load(Ordering::Acquire))
    }

    /// Wait for a new emulator log line matching `pattern`.
    ///
    /// Returns `false` if `timeout` expires first; `None` waits
    /// indefinitely. Needs `monitor.log_file`.
    pub async fn wait_for_log(
        &self,
        pattern: &str,
        is_regex: bool,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let log = self.log.as_ref().ok_or(Error::LogNotConfigured)?;
        let pattern = LogPattern::new(pattern, is_regex)?;

        debug!("Waiting for {:?} in {}", pattern, log.path().display());
        log.wait_for(&pattern, timeout).await
    }

    /// Identity of the live session, if any
    pub async fn session_handle(&self) -> Option<SessionHandle> {
        match &*self.state.lock().await {
            LifecycleState::Connected(session) => Some(session.handle().clone()),
            _ => None,
        }
    }

    pub fn endpoint(&self) -> String {
        self.monitor.endpoint()
    }

    async fn ensure_connected<'a>(
        &self,
        state: &'a mut LifecycleState<C::Stream>,
    ) -> Result<&'a mut MonitorSession<C::Stream>> {
        if let LifecycleState::Uninitialized = state {
            match self.open_session().await {
                Ok(session) => {
                    *state = LifecycleState::Connected(session);
                    self.publish(BridgeState::Connected);
                    info!("Bridge connected to {}", self.endpoint());
                }
                Err(e) => {
                    *state = LifecycleState::Closed;
                    self.publish(BridgeState::Closed);
                    error!("Bridge startup failed: {}", e);
                    return Err(e);
                }
            }
        }

        match state {
            LifecycleState::Connected(session) => Ok(session),
            _ => Err(Error::BridgeClosed),
        }
    }

    async fn open_session(&self) -> Result<MonitorSession<C::Stream>> {
        let endpoint = self.endpoint();
        let mut session =
            MonitorSession::open(&endpoint, self.options.clone(), &self.connector).await?;

        if let Err(e) = self.run_startup_commands(&mut session).await {
            session.close().await;
            return Err(e);
        }

        Ok(session)
    }

    fn publish(&self, state: BridgeState) {
        self.public.store(state.as_u8(), Ordering::Release);
    }

    async fn run_startup_commands(&self, session: &mut MonitorSession<C::Stream>) -> Result<()> {
        let mut commands = Vec::new();
        if let (Some(log), Some(command)) = (&self.log, self.monitor.log_file_command()) {
            // Only output logged from this session on counts
            log.skip_to_end().await?;
            commands.push(command);
        }
        commands.extend(self.monitor.startup_commands.iter().cloned());

        for command in &commands {
            let line = CommandLine::raw(command)?;
            let reply = session.send_and_receive(&line).await?;

            match self.classifier.classify_reply(&reply) {
                ClassifiedResult::Ok(_) => debug!("Startup command '{}' done", command),
                ClassifiedResult::Err(message) => {
                    warn!("Startup command '{}' failed: {}", command, message)
                }
            }
        }
        Ok(())
    }
}
