use thiserror::Error;

/// Error types returned by the wire layer.
///
/// These cover framing and codec failures only. Procedure-level failures
/// (object not found, permission denied, and so on) travel as
/// [`ErrorRecord`] bodies in an error reply and never surface here.
///
/// [`ErrorRecord`]: crate::proto::ErrorRecord
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// The length prefix indicates the message is longer than the amount of
    /// data in the buffer, or the buffer contains more than one message.
    #[error("incomplete message (got {buffer_len} bytes, expected {expected})")]
    IncompleteMessage {
        /// The length of the buffer provided.
        buffer_len: usize,

        /// The length expected from the length prefix.
        expected: usize,
    },

    /// The buffer is too small to contain the 4-byte length prefix.
    #[error("incomplete length prefix")]
    IncompleteHeader,

    /// The length prefix exceeds `REMOTE_MESSAGE_MAX`.
    ///
    /// A peer sending this is either broken or hostile; the session should
    /// be torn down rather than buffering the message.
    #[error("message length {0} exceeds REMOTE_MESSAGE_MAX")]
    OversizeMessage(usize),

    /// An encoded reply does not fit within `REMOTE_MESSAGE_MAX`.
    #[error("encoded message exceeds REMOTE_MESSAGE_MAX")]
    PayloadTooLarge,

    /// A variable length field has a length value which would exceed the
    /// remaining length of the buffer.
    #[error("invalid length in message")]
    InvalidLength,

    /// An optional-value presence flag was neither 0 nor 1.
    #[error("invalid presence flag {0}")]
    InvalidBool(u32),

    /// A tagged-union discriminant is not one of the values the protocol
    /// defines for that union.
    #[error("invalid {union} discriminant {value}")]
    InvalidDiscriminant {
        /// Name of the union being decoded.
        union: &'static str,

        /// The unrecognised discriminant.
        value: i32,
    },

    /// A client-supplied count or length exceeds its per-field protocol
    /// maximum.
    ///
    /// The check runs before any allocation is sized by the value, and the
    /// rendered message names the violated constant so clients can tell
    /// which bound they tripped.
    #[error("{field} > {limit}")]
    BoundExceeded {
        /// The protocol field holding the oversize value.
        field: &'static str,

        /// Name of the protocol constant that bounds it.
        limit: &'static str,
    },

    /// A string field contains non-UTF8 bytes.
    #[error("invalid string: {0}")]
    InvalidString(#[from] std::str::Utf8Error),

    /// An I/O error occurred when trying to parse the buffer.
    #[error("i/o error ({0:?}): {1}")]
    IOError(std::io::ErrorKind, String),
}

impl From<std::io::Error> for Error {
    fn from(v: std::io::Error) -> Self {
        Self::IOError(v.kind(), v.to_string())
    }
}
