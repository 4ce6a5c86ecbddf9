//! The fixed envelope prepended to every message, and the length-prefix
//! framing around it.
//!
//! A message on the wire is `{length, envelope, body}`:
//!
//! ```text
//! +------------+-------------+-------------+--------------+
//! | length (4) | program (4) | version (4) | procedure (4)|
//! +------------+-------------+-------------+--------------+
//! |direction(4)| serial (4)  | status (4)  |    body ...  |
//! +------------+-------------+-------------+--------------+
//! ```
//!
//! `length` covers itself plus envelope plus body. All fields are
//! big-endian.

use std::io::{Cursor, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{limits::REMOTE_MESSAGE_MAX, Error};

/// Byte length of the length prefix.
pub const MSG_HEADER_LEN: usize = 4;

/// Byte length of a serialised [`Envelope`].
pub const ENVELOPE_LEN: usize = 24;

/// Envelope direction of a request.
pub const DIRECTION_CALL: i32 = 0;

/// Envelope direction of a response.
pub const DIRECTION_REPLY: i32 = 1;

/// Envelope status of a request, and of a successful reply.
pub const STATUS_OK: i32 = 0;

/// Envelope status of a reply whose body is an error record.
pub const STATUS_ERROR: i32 = 1;

/// The fixed header on every message.
///
/// `direction` and `status` are kept as raw `i32` rather than enums:
/// constant validation happens *after* the whole envelope is parsed, so a
/// reply rejecting an out-of-range value can still echo the call's serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// The remote program number.
    pub program: u32,

    /// The protocol version.
    pub version: u32,

    /// The procedure number, possibly unknown to this server.
    pub procedure: i32,

    /// [`DIRECTION_CALL`] or [`DIRECTION_REPLY`].
    pub direction: i32,

    /// Client-chosen request identifier, echoed unchanged in the reply.
    pub serial: u32,

    /// [`STATUS_OK`] or [`STATUS_ERROR`].
    pub status: i32,
}

impl Envelope {
    /// Constructs a new `Envelope` by parsing the wire format read from `r`.
    ///
    /// `from_cursor` advances the position of `r` to the end of the
    /// `Envelope` structure.
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(Envelope {
            program: r.read_u32::<BigEndian>()?,
            version: r.read_u32::<BigEndian>()?,
            procedure: r.read_i32::<BigEndian>()?,
            direction: r.read_i32::<BigEndian>()?,
            serial: r.read_u32::<BigEndian>()?,
            status: r.read_i32::<BigEndian>()?,
        })
    }

    /// Serialises this `Envelope` into `buf`, advancing the cursor position
    /// by [`ENVELOPE_LEN`] bytes.
    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_u32::<BigEndian>(self.program)?;
        buf.write_u32::<BigEndian>(self.version)?;
        buf.write_i32::<BigEndian>(self.procedure)?;
        buf.write_i32::<BigEndian>(self.direction)?;
        buf.write_u32::<BigEndian>(self.serial)?;
        buf.write_i32::<BigEndian>(self.status)
    }

    /// Builds the reply envelope for `call`.
    ///
    /// `(program, version, procedure, serial)` are echoed unchanged.
    pub fn reply_to(call: &Envelope, status: i32) -> Self {
        Envelope {
            program: call.program,
            version: call.version,
            procedure: call.procedure,
            direction: DIRECTION_REPLY,
            serial: call.serial,
            status,
        }
    }
}

/// Reads the length prefix from `data` and returns the expected wire length
/// of the whole message, prefix included.
///
/// `data` must contain at least [`MSG_HEADER_LEN`] bytes. Lengths larger
/// than `REMOTE_MESSAGE_MAX` are rejected before any buffering decision is
/// made from them.
pub fn expected_message_len(data: &[u8]) -> Result<u32, Error> {
    if data.len() < MSG_HEADER_LEN {
        return Err(Error::IncompleteHeader);
    }

    let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);

    // The length covers the prefix itself.
    if (len as usize) < MSG_HEADER_LEN {
        return Err(Error::InvalidLength);
    }
    if len as usize > REMOTE_MESSAGE_MAX {
        return Err(Error::OversizeMessage(len as usize));
    }

    Ok(len)
}

/// Strips the length prefix from `data`, returning the envelope + body
/// bytes.
///
/// This function validates the length value in the prefix matches the
/// length of `data` exactly: the buffer must hold one whole message and
/// nothing else.
pub fn unwrap_frame(data: &[u8]) -> Result<&[u8], Error> {
    let want = expected_message_len(data)?;

    if data.len() != want as usize {
        return Err(Error::IncompleteMessage {
            buffer_len: data.len(),
            expected: want as usize,
        });
    }

    Ok(&data[MSG_HEADER_LEN..])
}

/// An in-progress outbound frame.
///
/// The length prefix is written last: `new` reserves the 4 bytes, the
/// caller serialises envelope and body through [`cursor`], and [`finish`]
/// rewinds to patch the true length in.
///
/// [`cursor`]: FrameWriter::cursor
/// [`finish`]: FrameWriter::finish
#[derive(Debug)]
pub struct FrameWriter {
    buf: Cursor<Vec<u8>>,
}

impl FrameWriter {
    /// Begins a frame with the length prefix reserved.
    pub fn new() -> Self {
        let mut buf = Cursor::new(Vec::with_capacity(MSG_HEADER_LEN + ENVELOPE_LEN));
        buf.set_position(MSG_HEADER_LEN as u64);
        FrameWriter { buf }
    }

    /// The cursor to serialise envelope and body into.
    pub fn cursor(&mut self) -> &mut Cursor<Vec<u8>> {
        &mut self.buf
    }

    /// Patches the length prefix and returns the completed frame.
    ///
    /// Fails with [`Error::PayloadTooLarge`] when the frame exceeds
    /// `REMOTE_MESSAGE_MAX`; the partial frame is discarded.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        let mut frame = self.buf.into_inner();

        // Position-past-reserve writes leave a hole only if the caller wrote
        // nothing at all; a bare prefix is still a valid (empty) frame.
        if frame.len() < MSG_HEADER_LEN {
            frame.resize(MSG_HEADER_LEN, 0);
        }
        if frame.len() > REMOTE_MESSAGE_MAX {
            return Err(Error::PayloadTooLarge);
        }

        let len = (frame.len() as u32).to_be_bytes();
        frame[..MSG_HEADER_LEN].copy_from_slice(&len);

        Ok(frame)
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}
