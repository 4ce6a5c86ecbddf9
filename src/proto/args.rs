//! Argument bodies, one per procedure that takes any.
//!
//! Decoded server-side from the request buffer; strings and byte arrays
//! borrow from it. Procedures with identical argument shapes share a
//! structure (`DomainArgs`, `NetworkArgs`, `ListNamesArgs`, ...). Field
//! names follow the on-wire protocol description.

#![allow(missing_docs)]

use std::io::{Cursor, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    limits::{REMOTE_CPUMAP_MAX, REMOTE_DOMAIN_SCHEDULER_PARAMETERS_MAX, REMOTE_MIGRATE_COOKIE_MAX},
    proto::{read_sasl_data, write_sasl_data, DomainRef, NetworkRef, SchedParam},
    wire::{
        read_array_len, read_opaque, read_opt_string, read_string, read_uuid, write_opaque,
        write_opt_string, write_string,
    },
    Error,
};

/// Arguments of `OPEN`.
///
/// `name = None` asks the hypervisor library for its default connection;
/// it is distinct from an explicit empty URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenArgs<'a> {
    pub name: Option<&'a str>,
    pub flags: u32,
}

impl<'a> OpenArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(OpenArgs {
            name: read_opt_string(r)?,
            flags: r.read_u32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_opt_string(buf, self.name)?;
        buf.write_u32::<BigEndian>(self.flags)
    }
}

/// Arguments of `GET_MAX_VCPUS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMaxVcpusArgs<'a> {
    pub ty: Option<&'a str>,
}

impl<'a> GetMaxVcpusArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(GetMaxVcpusArgs {
            ty: read_opt_string(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_opt_string(buf, self.ty)
    }
}

/// Arguments of `SUPPORTS_FEATURE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportsFeatureArgs {
    pub feature: i32,
}

impl SupportsFeatureArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(SupportsFeatureArgs {
            feature: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i32::<BigEndian>(self.feature)
    }
}

/// Arguments of `LIST_DOMAINS`: the client-supplied bound on the id list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListDomainsArgs {
    pub maxids: i32,
}

impl ListDomainsArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(ListDomainsArgs {
            maxids: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i32::<BigEndian>(self.maxids)
    }
}

/// Arguments of the name-list procedures (`LIST_DEFINED_DOMAINS`,
/// `LIST_NETWORKS`, `LIST_DEFINED_NETWORKS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListNamesArgs {
    pub maxnames: i32,
}

impl ListNamesArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(ListNamesArgs {
            maxnames: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i32::<BigEndian>(self.maxnames)
    }
}

/// Arguments of `DOMAIN_LOOKUP_BY_ID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainLookupByIdArgs {
    pub id: i32,
}

impl DomainLookupByIdArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainLookupByIdArgs {
            id: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i32::<BigEndian>(self.id)
    }
}

/// Arguments of `DOMAIN_LOOKUP_BY_NAME` and `NETWORK_LOOKUP_BY_NAME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupByNameArgs<'a> {
    pub name: &'a str,
}

impl<'a> LookupByNameArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(LookupByNameArgs {
            name: read_string(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, self.name)
    }
}

/// Arguments of `DOMAIN_LOOKUP_BY_UUID` and `NETWORK_LOOKUP_BY_UUID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupByUuidArgs {
    pub uuid: [u8; 16],
}

impl LookupByUuidArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(LookupByUuidArgs {
            uuid: read_uuid(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_all(&self.uuid)
    }
}

/// Arguments of `DOMAIN_CREATE_LINUX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainCreateLinuxArgs<'a> {
    pub xml_desc: &'a str,
    pub flags: u32,
}

impl<'a> DomainCreateLinuxArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(DomainCreateLinuxArgs {
            xml_desc: read_string(r)?,
            flags: r.read_u32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, self.xml_desc)?;
        buf.write_u32::<BigEndian>(self.flags)
    }
}

/// Arguments of the XML-definition procedures (`DOMAIN_DEFINE_XML`,
/// `NETWORK_CREATE_XML`, `NETWORK_DEFINE_XML`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlArgs<'a> {
    pub xml: &'a str,
}

impl<'a> XmlArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(XmlArgs {
            xml: read_string(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, self.xml)
    }
}

/// Arguments of every procedure whose only input is a domain reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainArgs {
    pub dom: DomainRef,
}

impl DomainArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainArgs {
            dom: DomainRef::from_cursor(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)
    }
}

/// Arguments of `DOMAIN_REBOOT` and `DOMAIN_GET_XML_DESC` (a domain plus
/// flags).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainFlagsArgs {
    pub dom: DomainRef,
    pub flags: u32,
}

impl DomainFlagsArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainFlagsArgs {
            dom: DomainRef::from_cursor(r)?,
            flags: r.read_u32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        buf.write_u32::<BigEndian>(self.flags)
    }
}

/// Arguments of `DOMAIN_SAVE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSaveArgs<'a> {
    pub dom: DomainRef,
    pub to: &'a str,
}

impl<'a> DomainSaveArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(DomainSaveArgs {
            dom: DomainRef::from_cursor(r)?,
            to: read_string(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        write_string(buf, self.to)
    }
}

/// Arguments of `DOMAIN_RESTORE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainRestoreArgs<'a> {
    pub from: &'a str,
}

impl<'a> DomainRestoreArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(DomainRestoreArgs {
            from: read_string(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, self.from)
    }
}

/// Arguments of `DOMAIN_CORE_DUMP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCoreDumpArgs<'a> {
    pub dom: DomainRef,
    pub to: &'a str,
    pub flags: u32,
}

impl<'a> DomainCoreDumpArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(DomainCoreDumpArgs {
            dom: DomainRef::from_cursor(r)?,
            to: read_string(r)?,
            flags: r.read_u32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        write_string(buf, self.to)?;
        buf.write_u32::<BigEndian>(self.flags)
    }
}

/// Arguments of `DOMAIN_SET_MAX_MEMORY` and `DOMAIN_SET_MEMORY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainMemoryArgs {
    pub dom: DomainRef,
    pub memory: u64,
}

impl DomainMemoryArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainMemoryArgs {
            dom: DomainRef::from_cursor(r)?,
            memory: r.read_u64::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        buf.write_u64::<BigEndian>(self.memory)
    }
}

/// Arguments of `DOMAIN_SET_VCPUS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSetVcpusArgs {
    pub dom: DomainRef,
    pub nvcpus: u32,
}

impl DomainSetVcpusArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainSetVcpusArgs {
            dom: DomainRef::from_cursor(r)?,
            nvcpus: r.read_u32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        buf.write_u32::<BigEndian>(self.nvcpus)
    }
}

/// Arguments of `DOMAIN_PIN_VCPU`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPinVcpuArgs<'a> {
    pub dom: DomainRef,
    pub vcpu: u32,
    pub cpumap: &'a [u8],
}

impl<'a> DomainPinVcpuArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(DomainPinVcpuArgs {
            dom: DomainRef::from_cursor(r)?,
            vcpu: r.read_u32::<BigEndian>()?,
            cpumap: read_opaque(r, REMOTE_CPUMAP_MAX, "cpumap", "REMOTE_CPUMAP_MAX")?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        buf.write_u32::<BigEndian>(self.vcpu)?;
        write_opaque(buf, self.cpumap)
    }
}

/// Arguments of `DOMAIN_GET_VCPUS`: client-supplied bounds on the info
/// array and on each pinning map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainGetVcpusArgs {
    pub dom: DomainRef,
    pub maxinfo: i32,
    pub maplen: i32,
}

impl DomainGetVcpusArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainGetVcpusArgs {
            dom: DomainRef::from_cursor(r)?,
            maxinfo: r.read_i32::<BigEndian>()?,
            maplen: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        buf.write_i32::<BigEndian>(self.maxinfo)?;
        buf.write_i32::<BigEndian>(self.maplen)
    }
}

/// Arguments of `DOMAIN_SET_AUTOSTART`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSetAutostartArgs {
    pub dom: DomainRef,
    pub autostart: i32,
}

impl DomainSetAutostartArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainSetAutostartArgs {
            dom: DomainRef::from_cursor(r)?,
            autostart: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        buf.write_i32::<BigEndian>(self.autostart)
    }
}

/// Arguments of `DOMAIN_ATTACH_DEVICE` and `DOMAIN_DETACH_DEVICE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainDeviceArgs<'a> {
    pub dom: DomainRef,
    pub xml: &'a str,
}

impl<'a> DomainDeviceArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(DomainDeviceArgs {
            dom: DomainRef::from_cursor(r)?,
            xml: read_string(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        write_string(buf, self.xml)
    }
}

/// Arguments of `DOMAIN_BLOCK_STATS` and `DOMAIN_INTERFACE_STATS` (a
/// domain plus a device path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStatsArgs<'a> {
    pub dom: DomainRef,
    pub path: &'a str,
}

impl<'a> DomainStatsArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(DomainStatsArgs {
            dom: DomainRef::from_cursor(r)?,
            path: read_string(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        write_string(buf, self.path)
    }
}

/// Arguments of `DOMAIN_GET_SCHEDULER_PARAMETERS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainGetSchedParamsArgs {
    pub dom: DomainRef,
    pub nparams: i32,
}

impl DomainGetSchedParamsArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainGetSchedParamsArgs {
            dom: DomainRef::from_cursor(r)?,
            nparams: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        buf.write_i32::<BigEndian>(self.nparams)
    }
}

/// Arguments of `DOMAIN_SET_SCHEDULER_PARAMETERS`.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSetSchedParamsArgs {
    pub dom: DomainRef,
    pub params: Vec<SchedParam>,
}

impl DomainSetSchedParamsArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let dom = DomainRef::from_cursor(r)?;

        let nparams = read_array_len(
            r,
            REMOTE_DOMAIN_SCHEDULER_PARAMETERS_MAX,
            "nparams",
            "REMOTE_DOMAIN_SCHEDULER_PARAMETERS_MAX",
        )?;

        let mut params = Vec::with_capacity(nparams as usize);
        for _ in 0..nparams {
            params.push(SchedParam::from_cursor(r)?);
        }

        Ok(DomainSetSchedParamsArgs { dom, params })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        buf.write_u32::<BigEndian>(self.params.len() as u32)?;
        for p in &self.params {
            p.serialise_into(buf)?;
        }
        Ok(())
    }
}

/// Arguments of `DOMAIN_MIGRATE_PREPARE`, run on the destination host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainMigratePrepareArgs<'a> {
    pub uri_in: Option<&'a str>,
    pub flags: u64,
    pub dname: Option<&'a str>,
    pub resource: u64,
}

impl<'a> DomainMigratePrepareArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(DomainMigratePrepareArgs {
            uri_in: read_opt_string(r)?,
            flags: r.read_u64::<BigEndian>()?,
            dname: read_opt_string(r)?,
            resource: r.read_u64::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_opt_string(buf, self.uri_in)?;
        buf.write_u64::<BigEndian>(self.flags)?;
        write_opt_string(buf, self.dname)?;
        buf.write_u64::<BigEndian>(self.resource)
    }
}

/// Arguments of `DOMAIN_MIGRATE_PERFORM`, run on the source host.
///
/// The cookie travels back to the destination uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainMigratePerformArgs<'a> {
    pub dom: DomainRef,
    pub cookie: &'a [u8],
    pub uri: &'a str,
    pub flags: u64,
    pub dname: Option<&'a str>,
    pub resource: u64,
}

impl<'a> DomainMigratePerformArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(DomainMigratePerformArgs {
            dom: DomainRef::from_cursor(r)?,
            cookie: read_opaque(r, REMOTE_MIGRATE_COOKIE_MAX, "cookie", "REMOTE_MIGRATE_COOKIE_MAX")?,
            uri: read_string(r)?,
            flags: r.read_u64::<BigEndian>()?,
            dname: read_opt_string(r)?,
            resource: r.read_u64::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)?;
        write_opaque(buf, self.cookie)?;
        write_string(buf, self.uri)?;
        buf.write_u64::<BigEndian>(self.flags)?;
        write_opt_string(buf, self.dname)?;
        buf.write_u64::<BigEndian>(self.resource)
    }
}

/// Arguments of `DOMAIN_MIGRATE_FINISH`, run on the destination host after
/// the perform phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainMigrateFinishArgs<'a> {
    pub dname: &'a str,
    pub cookie: &'a [u8],
    pub uri: &'a str,
    pub flags: u64,
}

impl<'a> DomainMigrateFinishArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(DomainMigrateFinishArgs {
            dname: read_string(r)?,
            cookie: read_opaque(r, REMOTE_MIGRATE_COOKIE_MAX, "cookie", "REMOTE_MIGRATE_COOKIE_MAX")?,
            uri: read_string(r)?,
            flags: r.read_u64::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, self.dname)?;
        write_opaque(buf, self.cookie)?;
        write_string(buf, self.uri)?;
        buf.write_u64::<BigEndian>(self.flags)
    }
}

/// Arguments of every procedure whose only input is a network reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkArgs {
    pub net: NetworkRef,
}

impl NetworkArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(NetworkArgs {
            net: NetworkRef::from_cursor(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.net.serialise_into(buf)
    }
}

/// Arguments of `NETWORK_DUMP_XML`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDumpXmlArgs {
    pub net: NetworkRef,
    pub flags: u32,
}

impl NetworkDumpXmlArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(NetworkDumpXmlArgs {
            net: NetworkRef::from_cursor(r)?,
            flags: r.read_u32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.net.serialise_into(buf)?;
        buf.write_u32::<BigEndian>(self.flags)
    }
}

/// Arguments of `NETWORK_SET_AUTOSTART`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSetAutostartArgs {
    pub net: NetworkRef,
    pub autostart: i32,
}

impl NetworkSetAutostartArgs {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(NetworkSetAutostartArgs {
            net: NetworkRef::from_cursor(r)?,
            autostart: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.net.serialise_into(buf)?;
        buf.write_i32::<BigEndian>(self.autostart)
    }
}

/// Arguments of `AUTH_SASL_START`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSaslStartArgs<'a> {
    pub mech: &'a str,
    pub data: Option<&'a [u8]>,
}

impl<'a> AuthSaslStartArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(AuthSaslStartArgs {
            mech: read_string(r)?,
            data: read_sasl_data(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, self.mech)?;
        write_sasl_data(buf, self.data)
    }
}

/// Arguments of `AUTH_SASL_STEP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSaslStepArgs<'a> {
    pub data: Option<&'a [u8]>,
}

impl<'a> AuthSaslStepArgs<'a> {
    pub fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(AuthSaslStepArgs {
            data: read_sasl_data(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_sasl_data(buf, self.data)
    }
}
