//! Monitor Bridge - remote keywords for an emulator's monitor console
//!
//! Test automation clients call keywords by name with loosely typed
//! arguments. Emulators such as Renode expose a line-oriented monitor console
//! over telnet instead. This crate sits between the two: every keyword
//! becomes one console line, and the console's reply becomes the keyword's
//! return value or failure.
//!
//! ## Module Organization
//!
//! - [`gateway`] - Keyword entry point (`invoke`, remote-keyword results, discovery)
//! - [`lifecycle`] - Owns the monitor session; connect, execute, shutdown
//! - [`monitor`] - Byte-stream session, telnet negotiation, prompt detection
//! - [`command`] - Rendering keyword calls into command lines
//! - [`classifier`] - Turning console replies into success or failure
//! - [`config`] - Configuration loading and validation
//! - [`ansi`] - Escape sequence stripping
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use monitor_bridge::{connect, Config};
//!
//! # async fn run() -> monitor_bridge::Result<()> {
//! let gateway = connect(&Config::default()).await?;
//! let version = gateway.invoke("version", &[]).await?;
//! println!("{:?}", version);
//! gateway.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The console has no request identifiers, so commands are strictly
//! serialized. A gateway can be shared between tasks; calls queue on the
//! bridge's session lock in arrival order.

#[macro_use]
extern crate tracing;

pub mod ansi;
pub mod classifier;
pub mod command;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod log_watch;
pub mod monitor;

pub use classifier::{ClassifiedResult, ReplyClassifier};
pub use command::CommandLine;
pub use config::loader::ConfigLoader;
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use gateway::{KeywordGateway, KeywordResult, KeywordStatus};
pub use lifecycle::{BridgeState, MonitorBridge};
pub use log_watch::{LogPattern, LogWatcher};
pub use monitor::{Connector, RawReply, SessionHandle, TcpConnector};

/// The current version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The package name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Build a gateway over TCP and open the monitor session.
///
/// The configuration is validated first. Connection failures are returned
/// here instead of on the first keyword.
pub async fn connect(config: &Config) -> Result<KeywordGateway> {
    config.validate()?;
    info!("Starting {} v{}", NAME, VERSION);

    let gateway = KeywordGateway::from_config(config, TcpConnector)?;
    gateway.start().await?;
    Ok(gateway)
}
