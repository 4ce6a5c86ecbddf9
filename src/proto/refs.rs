//! Wire forms of server-side object references.

use std::io::{Cursor, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    hypervisor::{DomainIdent, NetworkIdent},
    limits::UUID_LEN,
    wire::{read_string, read_uuid, write_string},
    Error,
};

/// The wire form of a reference to a server-side domain object.
///
/// The `id` is advisory on the way in: reference resolution uses only
/// `(name, uuid)` and the server-side id is authoritative in every reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRef {
    /// Unique human-readable name.
    pub name: String,

    /// Immutable identity of the domain.
    pub uuid: [u8; UUID_LEN],

    /// Numeric id of a running domain, `-1` when inactive.
    pub id: i32,
}

impl DomainRef {
    /// Constructs a new `DomainRef` by parsing the wire format read from
    /// `r`.
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainRef {
            name: read_string(r)?.to_owned(),
            uuid: read_uuid(r)?,
            id: r.read_i32::<BigEndian>()?,
        })
    }

    /// Serialises this `DomainRef` into `buf`.
    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.name)?;
        buf.write_all(&self.uuid)?;
        buf.write_i32::<BigEndian>(self.id)
    }

    /// Copies a live handle's identity into a freshly owned reference.
    pub fn from_ident<D: DomainIdent>(d: &D) -> Self {
        DomainRef {
            name: d.name().to_owned(),
            uuid: *d.uuid(),
            id: d.id(),
        }
    }
}

/// The wire form of a reference to a server-side network object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRef {
    /// Unique human-readable name.
    pub name: String,

    /// Immutable identity of the network.
    pub uuid: [u8; UUID_LEN],
}

impl NetworkRef {
    /// Constructs a new `NetworkRef` by parsing the wire format read from
    /// `r`.
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(NetworkRef {
            name: read_string(r)?.to_owned(),
            uuid: read_uuid(r)?,
        })
    }

    /// Serialises this `NetworkRef` into `buf`.
    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.name)?;
        buf.write_all(&self.uuid)
    }

    /// Copies a live handle's identity into a freshly owned reference.
    pub fn from_ident<N: NetworkIdent>(n: &N) -> Self {
        NetworkRef {
            name: n.name().to_owned(),
            uuid: *n.uuid(),
        }
    }
}
