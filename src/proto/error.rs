//! The error record carried as the body of a reply with status ERROR.

use std::io::{Cursor, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    hypervisor::HvError,
    proto::{DomainRef, NetworkRef},
    wire::{read_opt_string, read_presence, write_opt_string, write_presence},
    Error,
};

/// Error codes understood by clients.
///
/// The numbering is shared with the hypervisor library so its errors pass
/// through unchanged; only the subset the dispatch layer itself raises is
/// named here.
pub mod code {
    /// Internal error.
    pub const INTERNAL: i32 = 1;
    /// Operation not supported by the driver.
    pub const NO_SUPPORT: i32 = 3;
    /// The operation was attempted but did not succeed.
    pub const OPERATION_FAILED: i32 = 9;
    /// Protocol-level failure raised by the dispatch layer.
    pub const RPC: i32 = 39;
    /// No domain with the given identity.
    pub const NO_DOMAIN: i32 = 42;
    /// No network with the given identity.
    pub const NO_NETWORK: i32 = 43;
    /// Authentication was required and failed, or was not completed.
    pub const AUTH_FAILED: i32 = 45;
}

/// Subsystem an error originated from.
pub mod origin {
    /// No particular subsystem.
    pub const NONE: i32 = 0;
    /// The RPC layer.
    pub const RPC: i32 = 7;
    /// The remote dispatch layer.
    pub const REMOTE: i32 = 13;
}

/// Severity of a reported error.
pub const LEVEL_WARNING: i32 = 1;

/// Severity of a reported error.
pub const LEVEL_ERROR: i32 = 2;

/// The body of a reply whose envelope status is ERROR.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    /// One of the [`code`] constants, or a library code passed through.
    pub code: i32,

    /// One of the [`origin`] constants, or a library value passed through.
    pub domain: i32,

    /// Human-readable description.
    pub message: Option<String>,

    /// [`LEVEL_WARNING`] or [`LEVEL_ERROR`].
    pub level: i32,

    /// Domain the error relates to, if any.
    pub dom: Option<DomainRef>,

    /// Extra string detail.
    pub str1: Option<String>,

    /// Extra string detail.
    pub str2: Option<String>,

    /// Extra string detail.
    pub str3: Option<String>,

    /// Extra numeric detail.
    pub int1: i32,

    /// Extra numeric detail.
    pub int2: i32,

    /// Network the error relates to, if any.
    pub net: Option<NetworkRef>,
}

impl ErrorRecord {
    /// Builds a dispatch-layer protocol error with [`code::RPC`].
    pub fn rpc(message: impl Into<String>) -> Self {
        ErrorRecord {
            code: code::RPC,
            domain: origin::REMOTE,
            message: Some(message.into()),
            level: LEVEL_ERROR,
            dom: None,
            str1: None,
            str2: None,
            str3: None,
            int1: -1,
            int2: -1,
            net: None,
        }
    }

    /// The gate error for a procedure attempted before authentication.
    pub fn auth_required() -> Self {
        Self::rpc("authentication required")
    }

    /// The uniform failure reply for any broken authentication exchange.
    ///
    /// Deliberately detail-free: negotiation failures must not leak which
    /// step rejected the client.
    pub fn auth_failed() -> Self {
        ErrorRecord {
            code: code::AUTH_FAILED,
            ..Self::rpc("authentication failed")
        }
    }

    /// Forwards a structured hypervisor error to the client.
    pub fn from_hv(e: &HvError) -> Self {
        ErrorRecord {
            code: e.code,
            domain: e.origin,
            message: e.message.clone(),
            level: e.level,
            dom: None,
            str1: e.str1.clone(),
            str2: e.str2.clone(),
            str3: e.str3.clone(),
            int1: e.int1,
            int2: e.int2,
            net: None,
        }
    }

    /// Constructs a new `ErrorRecord` by parsing the wire format read from
    /// `r`.
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let code = r.read_i32::<BigEndian>()?;
        let domain = r.read_i32::<BigEndian>()?;
        let message = read_opt_string(r)?.map(str::to_owned);
        let level = r.read_i32::<BigEndian>()?;

        let dom = if read_presence(r)? {
            Some(DomainRef::from_cursor(r)?)
        } else {
            None
        };

        let str1 = read_opt_string(r)?.map(str::to_owned);
        let str2 = read_opt_string(r)?.map(str::to_owned);
        let str3 = read_opt_string(r)?.map(str::to_owned);
        let int1 = r.read_i32::<BigEndian>()?;
        let int2 = r.read_i32::<BigEndian>()?;

        let net = if read_presence(r)? {
            Some(NetworkRef::from_cursor(r)?)
        } else {
            None
        };

        Ok(ErrorRecord {
            code,
            domain,
            message,
            level,
            dom,
            str1,
            str2,
            str3,
            int1,
            int2,
            net,
        })
    }

    /// Serialises this `ErrorRecord` into `buf`.
    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i32::<BigEndian>(self.code)?;
        buf.write_i32::<BigEndian>(self.domain)?;
        write_opt_string(buf, self.message.as_deref())?;
        buf.write_i32::<BigEndian>(self.level)?;

        write_presence(buf, self.dom.is_some())?;
        if let Some(d) = &self.dom {
            d.serialise_into(buf)?;
        }

        write_opt_string(buf, self.str1.as_deref())?;
        write_opt_string(buf, self.str2.as_deref())?;
        write_opt_string(buf, self.str3.as_deref())?;
        buf.write_i32::<BigEndian>(self.int1)?;
        buf.write_i32::<BigEndian>(self.int2)?;

        write_presence(buf, self.net.is_some())?;
        if let Some(n) = &self.net {
            n.serialise_into(buf)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn test_rpc_error_round_trip() {
        let rec = ErrorRecord::rpc("program mismatch (0x20008087)");

        let mut buf = Vec::new();
        rec.serialise_into(&mut buf).unwrap();

        let got = ErrorRecord::from_cursor(&mut Cursor::new(buf.as_slice())).unwrap();
        assert_eq!(got, rec);
        assert_eq!(got.code, code::RPC);
        assert_eq!(got.level, LEVEL_ERROR);
    }

    #[test]
    fn test_error_with_object_refs_round_trip() {
        let rec = ErrorRecord {
            code: code::NO_DOMAIN,
            domain: origin::NONE,
            message: Some("domain not found".to_owned()),
            level: LEVEL_ERROR,
            dom: Some(DomainRef {
                name: "w".to_owned(),
                uuid: hex!("00112233445566778899aabbccddeeff"),
                id: -1,
            }),
            str1: Some("w".to_owned()),
            str2: None,
            str3: None,
            int1: 0,
            int2: 0,
            net: None,
        };

        let mut buf = Vec::new();
        rec.serialise_into(&mut buf).unwrap();

        let got = ErrorRecord::from_cursor(&mut Cursor::new(buf.as_slice())).unwrap();
        assert_eq!(got, rec);
    }

    #[test]
    fn test_auth_failed_has_no_detail() {
        let rec = ErrorRecord::auth_failed();
        assert_eq!(rec.code, code::AUTH_FAILED);
        assert_eq!(rec.message.as_deref(), Some("authentication failed"));
        assert_eq!(rec.str1, None);
    }
}
