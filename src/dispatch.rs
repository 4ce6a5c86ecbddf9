//! The request pump: one complete framed request in, one framed reply
//! out.
//!
//! [`dispatch_request`] runs to completion for a single request; all I/O
//! suspension lives in the enclosing transport, which calls in only once
//! the session buffer holds a full frame and drains the reply only after
//! the session has transitioned to TX.

use std::io::{Cursor, Write};

use tracing::{debug, warn};

use crate::{
    envelope::{unwrap_frame, Envelope, FrameWriter, DIRECTION_CALL, STATUS_ERROR, STATUS_OK},
    handlers::{self, CallContext, HandlerError},
    hypervisor::Hypervisor,
    limits::{REMOTE_PROGRAM, REMOTE_PROTOCOL_VERSION},
    procedure::Procedure,
    proto::ErrorRecord,
    sasl::SaslBackend,
    session::{Session, SessionMode},
    Error,
};

/// A failure after which the session cannot carry further requests.
///
/// Everything else - malformed arguments, rejected envelopes, library
/// failures - produces an error *reply* and leaves the connection open.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FatalError {
    /// Dispatch was invoked without a complete buffered request.
    #[error("session has no complete request buffered")]
    NotReady,

    /// The frame in the session buffer violates the framing rules the
    /// transport was supposed to enforce.
    #[error("request framing violated: {0}")]
    BadFrame(#[source] Error),

    /// A reply could not be framed; the partial reply is abandoned and
    /// the session must be torn down.
    #[error("reply could not be framed: {0}")]
    ReplyFraming(#[source] Error),
}

/// Dispatches the request buffered in `session`, leaving the framed reply
/// in its place and the session in TX mode.
///
/// On `Err` no reply is pending and the caller must tear the session
/// down.
pub fn dispatch_request<H: Hypervisor, S: SaslBackend>(
    hv: &H,
    sasl: &S,
    session: &mut Session<H, S>,
) -> Result<(), FatalError> {
    if session.mode() != SessionMode::Rx || !session.request_ready().map_err(FatalError::BadFrame)?
    {
        return Err(FatalError::NotReady);
    }

    let request = session.take_request();
    let body = unwrap_frame(&request).map_err(FatalError::BadFrame)?;
    let mut cursor = Cursor::new(body);

    // Step 1: the envelope. A request too short to carry one gets the
    // blind-error reply: a synthesised `{OPEN, serial 1}` envelope that any
    // client can correlate.
    let call = match Envelope::from_cursor(&mut cursor) {
        Ok(call) => call,
        Err(e) => {
            warn!(error = %e, "request envelope unparseable, sending blind error");
            let blind = Envelope {
                program: REMOTE_PROGRAM,
                version: REMOTE_PROTOCOL_VERSION,
                procedure: Procedure::Open as i32,
                direction: DIRECTION_CALL,
                serial: 1,
                status: STATUS_OK,
            };
            return send_error(session, &blind, ErrorRecord::rpc(e.to_string()));
        }
    };

    // Step 2: envelope constants, in fixed order. The reply echoes the
    // serial even for a rejected envelope.
    if let Some(rejection) = check_envelope(&call) {
        warn!(serial = call.serial, detail = ?rejection.message, "envelope rejected");
        return send_error(session, &call, rejection);
    }

    // Step 3: the auth gate. Unauthenticated sessions may only run the
    // auth procedures; everything else is refused before argument
    // decoding, unknown numbers included.
    let procedure = Procedure::from_i32(call.procedure);
    if session.auth_required() && !procedure.is_some_and(Procedure::allowed_before_auth) {
        debug!(procedure = call.procedure, "procedure blocked by auth gate");
        return send_error(session, &call, ErrorRecord::auth_required());
    }

    // Step 4: resolve the procedure.
    let Some(procedure) = procedure else {
        return send_error(
            session,
            &call,
            ErrorRecord::rpc(format!("unknown procedure {}", call.procedure)),
        );
    };

    // Steps 5 and 6: the handler decodes its own arguments and invokes
    // the hypervisor.
    debug!(?procedure, serial = call.serial, "dispatching");

    let handler = handlers::lookup::<H, S>(procedure);
    let mut ctx = CallContext {
        hv,
        sasl,
        session: &mut *session,
        args: cursor,
        reply: Vec::new(),
    };
    let outcome = handler(&mut ctx);
    let ret = ctx.reply;

    // Steps 7 and 8: frame the reply and hand the session to TX.
    match outcome {
        Ok(()) => send_ok(session, &call, &ret),
        Err(HandlerError::Hypervisor(e)) => {
            debug!(?procedure, serial = call.serial, error = %e, "hypervisor call failed");
            send_error(session, &call, ErrorRecord::from_hv(&e))
        }
        Err(HandlerError::Dispatch(rejection)) => send_error(session, &call, rejection),
        Err(HandlerError::Wire(e)) => {
            debug!(?procedure, serial = call.serial, error = %e, "argument decode failed");
            send_error(session, &call, ErrorRecord::rpc(e.to_string()))
        }
    }
}

/// Validates the envelope constants of a call, in protocol order.
fn check_envelope(call: &Envelope) -> Option<ErrorRecord> {
    if call.program != REMOTE_PROGRAM {
        return Some(ErrorRecord::rpc(format!(
            "program mismatch ({:#x})",
            call.program
        )));
    }
    if call.version != REMOTE_PROTOCOL_VERSION {
        return Some(ErrorRecord::rpc(format!(
            "version mismatch ({})",
            call.version
        )));
    }
    if call.direction != DIRECTION_CALL {
        return Some(ErrorRecord::rpc(format!(
            "direction ({}) != CALL",
            call.direction
        )));
    }
    if call.status != STATUS_OK {
        return Some(ErrorRecord::rpc(format!("status ({}) != OK", call.status)));
    }

    None
}

/// Frames a success reply around an encoded return body.
///
/// A body that cannot fit the message cap is downgraded to a
/// `PayloadTooLarge` error reply rather than torn down: the failure is the
/// payload's, not the session's.
fn send_ok<H: Hypervisor, S: SaslBackend>(
    session: &mut Session<H, S>,
    call: &Envelope,
    ret: &[u8],
) -> Result<(), FatalError> {
    let mut frame = FrameWriter::new();
    Envelope::reply_to(call, STATUS_OK)
        .serialise_into(frame.cursor())
        .map_err(|e| FatalError::ReplyFraming(e.into()))?;
    frame
        .cursor()
        .write_all(ret)
        .map_err(|e| FatalError::ReplyFraming(e.into()))?;

    match frame.finish() {
        Ok(reply) => {
            session.set_reply(&reply);
            Ok(())
        }
        Err(e @ Error::PayloadTooLarge) => {
            warn!(serial = call.serial, "reply exceeds message cap");
            send_error(session, call, ErrorRecord::rpc(e.to_string()))
        }
        Err(e) => Err(FatalError::ReplyFraming(e)),
    }
}

/// Frames an error reply. Error bodies are small by construction; one
/// that cannot be framed is a fatal dispatcher error.
fn send_error<H: Hypervisor, S: SaslBackend>(
    session: &mut Session<H, S>,
    call: &Envelope,
    rejection: ErrorRecord,
) -> Result<(), FatalError> {
    let mut frame = FrameWriter::new();
    Envelope::reply_to(call, STATUS_ERROR)
        .serialise_into(frame.cursor())
        .map_err(|e| FatalError::ReplyFraming(e.into()))?;
    rejection
        .serialise_into(frame.cursor())
        .map_err(|e| FatalError::ReplyFraming(e.into()))?;

    let reply = frame.finish().map_err(FatalError::ReplyFraming)?;
    session.set_reply(&reply);
    Ok(())
}
