//! Telnet option handling
//!
//! Monitor consoles served "in telnet mode" open with option negotiation.
//! The bridge wants a plain byte stream, so it refuses every option the
//! server offers or requests and hides the protocol bytes from the reply
//! text. State is kept across reads because a command sequence can be split
//! between two TCP segments.

/// Interpret As Command
pub const IAC: u8 = 255;
pub const DONT: u8 = 254;
pub const DO: u8 = 253;
pub const WONT: u8 = 252;
pub const WILL: u8 = 251;
/// Subnegotiation begin
pub const SB: u8 = 250;
/// Subnegotiation end
pub const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum FilterState {
    #[default]
    Data,
    /// Saw IAC
    Command,
    /// Saw IAC followed by WILL/WONT/DO/DONT
    Option(u8),
    /// Inside IAC SB ... IAC SE
    Subnegotiation,
    /// Saw IAC inside a subnegotiation
    SubnegotiationCommand,
}

/// Output of one filtering pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Filtered {
    /// Console data with telnet commands removed
    pub data: Vec<u8>,
    /// Negotiation answers to write back to the server
    pub replies: Vec<u8>,
}

/// Incremental telnet command stripper
#[derive(Debug, Default)]
pub struct TelnetFilter {
    state: FilterState,
}

impl TelnetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter one chunk of bytes read from the monitor
    pub fn filter(&mut self, input: &[u8]) -> Filtered {
        let mut out = Filtered {
            data: Vec::with_capacity(input.len()),
            replies: Vec::new(),
        };

        for &byte in input {
            self.state = match (self.state, byte) {
                (FilterState::Data, IAC) => FilterState::Command,
                (FilterState::Data, b) => {
                    out.data.push(b);
                    FilterState::Data
                }
                // Escaped 0xFF data byte
                (FilterState::Command, IAC) => {
                    out.data.push(IAC);
                    FilterState::Data
                }
                (FilterState::Command, verb @ (WILL | WONT | DO | DONT)) => {
                    FilterState::Option(verb)
                }
                (FilterState::Command, SB) => FilterState::Subnegotiation,
                // NOP, GA, AYT and friends carry no option byte
                (FilterState::Command, _) => FilterState::Data,
                (FilterState::Option(verb), option) => {
                    match verb {
                        DO => out.replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => out.replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    FilterState::Data
                }
                (FilterState::Subnegotiation, IAC) => FilterState::SubnegotiationCommand,
                (FilterState::Subnegotiation, _) => FilterState::Subnegotiation,
                (FilterState::SubnegotiationCommand, SE) => FilterState::Data,
                (FilterState::SubnegotiationCommand, _) => FilterState::Subnegotiation,
            };
        }

        out
    }
}
