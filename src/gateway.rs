//! Dynamic keyword gateway
//!
//! The inbound surface of the bridge. Any keyword name is accepted and
//! forwarded to the monitor as a command line; the monitor decides whether
//! the command exists. There is no fixed keyword list because the monitor's
//! command set depends on the loaded platform and cannot be enumerated.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::classifier::{ClassifiedResult, ReplyClassifier};
use crate::command::CommandLine;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::lifecycle::{BridgeState, MonitorBridge};
use crate::monitor::{Connector, TcpConnector};

const LIBRARY_INTRO: &str = "\
Forwards keywords to an emulator monitor console.

Every keyword name is sent to the monitor as a command, followed by its \
arguments separated by spaces. Keyword arguments are sent as `name=value`. \
The reply text is returned as the keyword's value; a reply starting with an \
error marker (by default `Error:`) fails the keyword with the rest of the \
reply as the message.

The monitor's command set depends on the loaded platform and cannot be \
listed, so this library reports no keywords. Use the monitor's own `help` \
command to discover what is available.";

/// Keyword status in the remote-keyword result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeywordStatus {
    Pass,
    Fail,
}

/// Result of one keyword run, in the shape remote-keyword clients expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub status: KeywordStatus,

    #[serde(rename = "return")]
    pub return_value: Value,

    pub output: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,

    /// The bridge is unusable; the client should stop the run
    #[serde(default)]
    pub fatal: bool,

    /// The failure only affects this keyword
    #[serde(default)]
    pub continuable: bool,
}

impl KeywordResult {
    pub fn pass(value: Option<String>) -> Self {
        Self {
            status: KeywordStatus::Pass,
            return_value: value.map(Value::String).unwrap_or(Value::Null),
            output: String::new(),
            error: None,
            fatal: false,
            continuable: false,
        }
    }

    pub fn fail(error: &Error) -> Self {
        Self {
            status: KeywordStatus::Fail,
            return_value: Value::Null,
            output: String::new(),
            error: Some(error.to_string()),
            fatal: error.is_session_fatal() || matches!(error, Error::BridgeClosed),
            continuable: matches!(error, Error::MonitorReported { .. }),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == KeywordStatus::Pass
    }
}

/// Entry point for keyword invocations
pub struct KeywordGateway<C: Connector = TcpConnector> {
    bridge: MonitorBridge<C>,
    classifier: ReplyClassifier,
}

impl<C: Connector> KeywordGateway<C> {
    pub fn new(bridge: MonitorBridge<C>, classifier: ReplyClassifier) -> Self {
        Self { bridge, classifier }
    }

    /// Build a gateway and its bridge from configuration
    pub fn from_config(config: &Config, connector: C) -> Result<Self> {
        let bridge = MonitorBridge::new(config, connector)?;
        let classifier = ReplyClassifier::from_config(config)?;
        Ok(Self::new(bridge, classifier))
    }

    /// Connect eagerly instead of on the first keyword
    pub async fn start(&self) -> Result<()> {
        self.bridge.start().await
    }

    pub async fn shutdown(&self) {
        self.bridge.shutdown().await
    }

    pub fn state(&self) -> BridgeState {
        self.bridge.state()
    }

    /// See [`MonitorBridge::wait_for_log`]
    pub async fn wait_for_log(
        &self,
        pattern: &str,
        is_regex: bool,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        self.bridge.wait_for_log(pattern, is_regex, timeout).await
    }

    pub fn bridge(&self) -> &MonitorBridge<C> {
        &self.bridge
    }

    /// Run `name` with `args` on the monitor.
    ///
    /// An empty reply yields `None`. A reply carrying an error marker yields
    /// [`Error::MonitorReported`] with the monitor's message unchanged.
    pub async fn invoke(&self, name: &str, args: &[Value]) -> Result<Option<String>> {
        if self.bridge.state().is_closed() {
            return Err(Error::BridgeClosed);
        }
        let command = CommandLine::render(name, args)?;
        let reply = self.bridge.execute(&command).await?;

        match self.classifier.classify_reply(&reply) {
            ClassifiedResult::Ok(value) if value.is_empty() => Ok(None),
            ClassifiedResult::Ok(value) => Ok(Some(value)),
            ClassifiedResult::Err(message) => {
                warn!("Monitor rejected '{}': {}", command, message);
                Err(Error::MonitorReported {
                    command: command.to_string(),
                    message,
                })
            }
        }
    }

    /// [`invoke`](Self::invoke) mapped onto the remote-keyword result shape
    pub async fn run_keyword(&self, name: &str, args: &[Value]) -> KeywordResult {
        match self.invoke(name, args).await {
            Ok(value) => KeywordResult::pass(value),
            Err(e) => KeywordResult::fail(&e),
        }
    }

    /// Keyword names this library can list: none
    pub fn list_available(&self) -> Vec<String> {
        Vec::new()
    }

    /// Every keyword takes free-form positional arguments
    pub fn keyword_arguments(&self, _name: &str) -> Vec<String> {
        vec!["*args".to_string()]
    }

    pub fn keyword_documentation(&self, name: &str) -> String {
        match name {
            "__intro__" | "__init__" => LIBRARY_INTRO.to_string(),
            _ => String::new(),
        }
    }
}
