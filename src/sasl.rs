//! The SASL library, as consumed by the authentication handlers.
//!
//! The negotiation itself is mechanism logic inside the library; the
//! dispatch layer only shuttles byte payloads between the client and a
//! per-session [`SaslSession`], preserving the protocol's distinction
//! between "no payload" and "empty payload" (`Option<&[u8]>` throughout).

use std::net::SocketAddr;

use thiserror::Error;

/// An error reported by the SASL library.
///
/// Any backend error fails the authentication; the client sees a uniform
/// failure reply, the detail stays in the server log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sasl: {message}")]
pub struct SaslError {
    /// Library-provided detail, not forwarded to clients.
    pub message: String,
}

impl SaslError {
    /// A new error with the given detail.
    pub fn new(message: impl Into<String>) -> Self {
        SaslError {
            message: message.into(),
        }
    }
}

/// Outcome of one round of the SASL exchange.
///
/// The payload is the server-out challenge for the client; `None` means
/// "no payload", which is distinct from `Some(empty)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaslStep {
    /// More rounds are needed.
    Continue(Option<Vec<u8>>),

    /// The exchange succeeded and the client is authenticated.
    Complete(Option<Vec<u8>>),
}

impl SaslStep {
    /// The server-out payload of this round.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::Continue(d) | Self::Complete(d) => d.as_deref(),
        }
    }
}

/// Factory for per-session SASL negotiation state.
pub trait SaslBackend {
    /// Per-session negotiation state.
    type Session: SaslSession;

    /// Creates the context for one client.
    ///
    /// The socket addresses are rendered as `"IP;PORT"` (see
    /// [`address_pair`]) so mechanisms can bind to the channel; they are
    /// absent on non-IP transports.
    fn new_session(
        &self,
        service: &str,
        local_addr: Option<&str>,
        remote_addr: Option<&str>,
    ) -> Result<Self::Session, SaslError>;
}

/// One client's SASL negotiation.
pub trait SaslSession {
    /// The comma-separated list of mechanisms the library offers.
    fn mechanism_list(&self) -> Result<String, SaslError>;

    /// First round: the client has selected `mechanism` and may have sent
    /// an initial payload.
    fn start(&mut self, mechanism: &str, input: Option<&[u8]>) -> Result<SaslStep, SaslError>;

    /// Any subsequent round.
    fn step(&mut self, input: Option<&[u8]>) -> Result<SaslStep, SaslError>;
}

/// Renders a socket address in the `"IP;PORT"` form the SASL library
/// expects for channel binding.
pub fn address_pair(addr: &SocketAddr) -> String {
    format!("{};{}", addr.ip(), addr.port())
}
