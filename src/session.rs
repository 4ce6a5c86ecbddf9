//! Per-client session state.
//!
//! A session owns one buffer and is always in exactly one of two modes:
//! accumulating a request (RX) or draining a reply (TX). The transport
//! appends bytes while in RX and calls the dispatcher once
//! [`request_ready`] reports a full frame; the dispatcher leaves the
//! session in TX with the framed reply, and the transport flips it back by
//! draining. One message is in flight at a time; clients cannot pipeline.
//!
//! [`request_ready`]: Session::request_ready

use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::{
    envelope::expected_message_len,
    hypervisor::Hypervisor,
    limits::REMOTE_MESSAGE_MAX,
    sasl::{address_pair, SaslBackend},
    Error,
};

/// Transfer direction of a session's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Accumulating a request.
    Rx,
    /// Draining a reply.
    Tx,
}

/// Pending I/O direction of the TLS layer, meaningful only when the
/// session is TLS-wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsDirection {
    /// The TLS layer should be polled for reads.
    Read,
    /// The TLS layer should be polled for writes.
    Write,
}

/// Authentication scheme advertised to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AuthType {
    /// No authentication; sessions start authorized.
    None = 0,
    /// SASL negotiation required before non-auth procedures.
    Sasl = 1,
}

/// Authentication progress of a session.
#[derive(Debug)]
pub enum AuthState<C> {
    /// No authentication required, or negotiation completed.
    Authorized,

    /// Authentication required, negotiation not yet started.
    Pending,

    /// SASL negotiation in progress.
    Negotiating(C),
}

impl<C> AuthState<C> {
    /// Whether the auth gate is still closed for this session.
    pub fn required(&self) -> bool {
        !matches!(self, Self::Authorized)
    }
}

/// Initial parameters of a session, decided by the transport at accept
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Restrict this client to read-only hypervisor access.
    pub readonly: bool,

    /// The stream is TLS-wrapped.
    pub tls: bool,

    /// Authentication the client must complete.
    pub auth: AuthType,

    /// Local socket address, when the transport is IP-based.
    pub local_addr: Option<SocketAddr>,

    /// Peer socket address, when the transport is IP-based.
    pub remote_addr: Option<SocketAddr>,
}

/// The per-client state the dispatcher operates on.
pub struct Session<H: Hypervisor, S: SaslBackend> {
    buffer: BytesMut,
    offset: usize,
    mode: SessionMode,
    tls: bool,
    tls_direction: TlsDirection,
    readonly: bool,

    local_addr: Option<SocketAddr>,
    remote_addr: Option<SocketAddr>,

    pub(crate) advertised_auth: AuthType,
    pub(crate) auth: AuthState<S::Session>,
    pub(crate) conn: Option<H::Conn>,
}

impl<H: Hypervisor, S: SaslBackend> Session<H, S> {
    /// Creates a session in RX mode with an empty buffer.
    pub fn new(config: SessionConfig) -> Self {
        let auth = match config.auth {
            AuthType::None => AuthState::Authorized,
            AuthType::Sasl => AuthState::Pending,
        };

        Session {
            buffer: BytesMut::with_capacity(4096),
            offset: 0,
            mode: SessionMode::Rx,
            tls: config.tls,
            tls_direction: TlsDirection::Read,
            readonly: config.readonly,
            local_addr: config.local_addr,
            remote_addr: config.remote_addr,
            advertised_auth: config.auth,
            auth,
            conn: None,
        }
    }

    /// The session's current transfer mode.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Whether this client is restricted to read-only access.
    pub fn readonly(&self) -> bool {
        self.readonly
    }

    /// The I/O direction the TLS layer should poll for, when TLS is
    /// active.
    pub fn tls_direction(&self) -> Option<TlsDirection> {
        self.tls.then_some(self.tls_direction)
    }

    /// Whether the auth gate is still closed.
    pub fn auth_required(&self) -> bool {
        self.auth.required()
    }

    /// Whether an `OPEN` has succeeded without a matching `CLOSE` since.
    pub fn connection_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Appends received bytes to the request buffer.
    ///
    /// Fails with [`Error::OversizeMessage`] when the buffer would exceed
    /// `REMOTE_MESSAGE_MAX`; the transport must tear the session down.
    pub fn append(&mut self, data: &[u8]) -> Result<(), Error> {
        debug_assert_eq!(self.mode, SessionMode::Rx);

        let total = self.buffer.len() + data.len();
        if total > REMOTE_MESSAGE_MAX {
            return Err(Error::OversizeMessage(total));
        }

        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Whether the buffer holds at least one complete framed request.
    ///
    /// Propagates length-prefix violations so the transport can drop the
    /// client before buffering an oversize message.
    pub fn request_ready(&self) -> Result<bool, Error> {
        if self.buffer.len() < 4 {
            return Ok(false);
        }

        let want = expected_message_len(&self.buffer)?;
        Ok(self.buffer.len() >= want as usize)
    }

    /// Consumes the accumulated request, leaving the buffer empty for the
    /// reply.
    pub(crate) fn take_request(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    /// Installs the framed reply and transitions to TX.
    pub(crate) fn set_reply(&mut self, reply: &[u8]) {
        self.buffer.clear();
        self.buffer.extend_from_slice(reply);
        self.offset = 0;
        self.mode = SessionMode::Tx;
        if self.tls {
            self.tls_direction = TlsDirection::Write;
        }
    }

    /// The reply bytes not yet written to the socket.
    pub fn pending_reply(&self) -> &[u8] {
        match self.mode {
            SessionMode::Tx => &self.buffer[self.offset..],
            SessionMode::Rx => &[],
        }
    }

    /// Records that `n` reply bytes reached the socket; transitions back
    /// to RX once the reply is fully drained.
    pub fn reply_drained(&mut self, n: usize) {
        debug_assert_eq!(self.mode, SessionMode::Tx);

        self.offset = (self.offset + n).min(self.buffer.len());
        if self.offset == self.buffer.len() {
            self.buffer.clear();
            self.offset = 0;
            self.mode = SessionMode::Rx;
            if self.tls {
                self.tls_direction = TlsDirection::Read;
            }
        }
    }

    /// The local address in SASL `"IP;PORT"` form.
    pub(crate) fn sasl_local_addr(&self) -> Option<String> {
        self.local_addr.as_ref().map(address_pair)
    }

    /// The peer address in SASL `"IP;PORT"` form.
    pub(crate) fn sasl_remote_addr(&self) -> Option<String> {
        self.remote_addr.as_ref().map(address_pair)
    }

    /// Releases everything the session holds: the hypervisor connection
    /// (best effort) and any in-flight SASL context.
    ///
    /// Called on connection drop and on fatal dispatch errors; any
    /// in-flight result in the buffer is discarded with it.
    pub fn teardown(mut self, hv: &H) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = hv.close(&conn) {
                debug!(error = %e, "closing hypervisor connection on teardown");
            }
        }
        self.auth = AuthState::Authorized;
    }
}

impl<H: Hypervisor, S: SaslBackend> std::fmt::Debug for Session<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("buffered", &self.buffer.len())
            .field("readonly", &self.readonly)
            .field("auth_required", &self.auth.required())
            .field("connection_open", &self.conn.is_some())
            .finish()
    }
}
