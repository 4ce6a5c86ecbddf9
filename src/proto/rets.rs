//! Return bodies, one per procedure that produces any, plus the plain
//! result structures shared verbatim with the hypervisor collaborator
//! (`NodeInfo`, `VcpuInfo`, `BlockStats`, `InterfaceStats`).
//!
//! Return values are owned: the handler hands the structure to the reply
//! encoder, which serialises it and drops it.

#![allow(missing_docs)]

use std::io::{Cursor, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    limits::{
        REMOTE_AUTH_TYPE_LIST_MAX, REMOTE_CPUMAPS_MAX, REMOTE_DOMAIN_ID_LIST_MAX,
        REMOTE_DOMAIN_NAME_LIST_MAX, REMOTE_DOMAIN_SCHEDULER_PARAMETERS_MAX,
        REMOTE_MIGRATE_COOKIE_MAX, REMOTE_NETWORK_NAME_LIST_MAX, REMOTE_VCPUINFO_MAX,
    },
    proto::{read_sasl_data, write_sasl_data, DomainRef, NetworkRef, SchedParam},
    wire::{read_array_len, read_opaque, read_opt_string, read_string, write_opaque,
        write_opt_string, write_string},
    Error,
};

/// Length of the model-name field in [`NodeInfo`].
pub const NODE_MODEL_LEN: usize = 32;

fn read_name_list(
    r: &mut Cursor<&[u8]>,
    max: u32,
    limit: &'static str,
) -> Result<Vec<String>, Error> {
    let n = read_array_len(r, max, "names", limit)?;

    let mut names = Vec::with_capacity(n as usize);
    for _ in 0..n {
        names.push(read_string(r)?.to_owned());
    }

    Ok(names)
}

fn write_name_list<W: Write>(buf: &mut W, names: &[String]) -> Result<(), std::io::Error> {
    buf.write_u32::<BigEndian>(names.len() as u32)?;
    for n in names {
        write_string(buf, n)?;
    }
    Ok(())
}

/// Return body of `GET_TYPE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetTypeRet {
    pub ty: String,
}

impl GetTypeRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(GetTypeRet {
            ty: read_string(r)?.to_owned(),
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.ty)
    }
}

/// Return body of `GET_VERSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetVersionRet {
    pub hv_ver: u64,
}

impl GetVersionRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(GetVersionRet {
            hv_ver: r.read_u64::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_u64::<BigEndian>(self.hv_ver)
    }
}

/// Return body of `GET_HOSTNAME`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetHostnameRet {
    pub hostname: String,
}

impl GetHostnameRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(GetHostnameRet {
            hostname: read_string(r)?.to_owned(),
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.hostname)
    }
}

/// Return body of `GET_CAPABILITIES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetCapabilitiesRet {
    pub capabilities: String,
}

impl GetCapabilitiesRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(GetCapabilitiesRet {
            capabilities: read_string(r)?.to_owned(),
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.capabilities)
    }
}

/// Return body of `GET_MAX_VCPUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetMaxVcpusRet {
    pub max_vcpus: i32,
}

impl GetMaxVcpusRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(GetMaxVcpusRet {
            max_vcpus: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i32::<BigEndian>(self.max_vcpus)
    }
}

/// Return body of `SUPPORTS_FEATURE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportsFeatureRet {
    pub supported: i32,
}

impl SupportsFeatureRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(SupportsFeatureRet {
            supported: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i32::<BigEndian>(self.supported)
    }
}

/// Host node description, returned by `NODE_GET_INFO` and by the
/// collaborator's `node_get_info` unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    /// CPU model name, NUL-filled to [`NODE_MODEL_LEN`] bytes on the wire.
    pub model: [u8; NODE_MODEL_LEN],
    pub memory: u64,
    pub cpus: i32,
    pub mhz: i32,
    pub nodes: i32,
    pub sockets: i32,
    pub cores: i32,
    pub threads: i32,
}

impl NodeInfo {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let raw = crate::wire::read_slice_bytes(r, NODE_MODEL_LEN as u32)?;
        let mut model = [0; NODE_MODEL_LEN];
        model.copy_from_slice(raw);

        Ok(NodeInfo {
            model,
            memory: r.read_u64::<BigEndian>()?,
            cpus: r.read_i32::<BigEndian>()?,
            mhz: r.read_i32::<BigEndian>()?,
            nodes: r.read_i32::<BigEndian>()?,
            sockets: r.read_i32::<BigEndian>()?,
            cores: r.read_i32::<BigEndian>()?,
            threads: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_all(&self.model)?;
        buf.write_u64::<BigEndian>(self.memory)?;
        buf.write_i32::<BigEndian>(self.cpus)?;
        buf.write_i32::<BigEndian>(self.mhz)?;
        buf.write_i32::<BigEndian>(self.nodes)?;
        buf.write_i32::<BigEndian>(self.sockets)?;
        buf.write_i32::<BigEndian>(self.cores)?;
        buf.write_i32::<BigEndian>(self.threads)
    }
}

/// Return body of `LIST_DOMAINS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDomainsRet {
    pub ids: Vec<i32>,
}

impl ListDomainsRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let n = read_array_len(r, REMOTE_DOMAIN_ID_LIST_MAX, "ids", "REMOTE_DOMAIN_ID_LIST_MAX")?;

        let mut ids = Vec::with_capacity(n as usize);
        for _ in 0..n {
            ids.push(r.read_i32::<BigEndian>()?);
        }

        Ok(ListDomainsRet { ids })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_u32::<BigEndian>(self.ids.len() as u32)?;
        for id in &self.ids {
            buf.write_i32::<BigEndian>(*id)?;
        }
        Ok(())
    }
}

/// Return body of the `NUM_OF_*` counters and `DOMAIN_GET_MAX_VCPUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumRet {
    pub num: i32,
}

impl NumRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(NumRet {
            num: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i32::<BigEndian>(self.num)
    }
}

/// Return body of `LIST_DEFINED_DOMAINS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDefinedDomainsRet {
    pub names: Vec<String>,
}

impl ListDefinedDomainsRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(ListDefinedDomainsRet {
            names: read_name_list(r, REMOTE_DOMAIN_NAME_LIST_MAX, "REMOTE_DOMAIN_NAME_LIST_MAX")?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_name_list(buf, &self.names)
    }
}

/// Return body of `LIST_NETWORKS` and `LIST_DEFINED_NETWORKS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNetworksRet {
    pub names: Vec<String>,
}

impl ListNetworksRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(ListNetworksRet {
            names: read_name_list(
                r,
                REMOTE_NETWORK_NAME_LIST_MAX,
                "REMOTE_NETWORK_NAME_LIST_MAX",
            )?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_name_list(buf, &self.names)
    }
}

/// Return body of every procedure that yields a domain reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRet {
    pub dom: DomainRef,
}

impl DomainRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainRet {
            dom: DomainRef::from_cursor(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.dom.serialise_into(buf)
    }
}

/// Return body of every procedure that yields a network reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRet {
    pub net: NetworkRef,
}

impl NetworkRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(NetworkRet {
            net: NetworkRef::from_cursor(r)?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        self.net.serialise_into(buf)
    }
}

/// Runtime state of a domain, returned by `DOMAIN_GET_INFO` and by the
/// collaborator's `domain_get_info` unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainInfo {
    pub state: u32,
    pub max_mem: u64,
    pub memory: u64,
    pub nr_virt_cpu: u32,
    pub cpu_time: u64,
}

impl DomainInfo {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainInfo {
            state: r.read_u32::<BigEndian>()?,
            max_mem: r.read_u64::<BigEndian>()?,
            memory: r.read_u64::<BigEndian>()?,
            nr_virt_cpu: r.read_u32::<BigEndian>()?,
            cpu_time: r.read_u64::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_u32::<BigEndian>(self.state)?;
        buf.write_u64::<BigEndian>(self.max_mem)?;
        buf.write_u64::<BigEndian>(self.memory)?;
        buf.write_u32::<BigEndian>(self.nr_virt_cpu)?;
        buf.write_u64::<BigEndian>(self.cpu_time)
    }
}

/// Return body of the unbounded-string queries (`DOMAIN_GET_XML_DESC`,
/// `NETWORK_DUMP_XML`, `GET_CAPABILITIES` has its own type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlRet {
    pub xml: String,
}

impl XmlRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(XmlRet {
            xml: read_string(r)?.to_owned(),
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.xml)
    }
}

/// Return body of `DOMAIN_GET_OS_TYPE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainGetOsTypeRet {
    pub os_type: String,
}

impl DomainGetOsTypeRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainGetOsTypeRet {
            os_type: read_string(r)?.to_owned(),
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.os_type)
    }
}

/// Return body of `DOMAIN_GET_MAX_MEMORY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainGetMaxMemoryRet {
    pub memory: u64,
}

impl DomainGetMaxMemoryRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainGetMaxMemoryRet {
            memory: r.read_u64::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_u64::<BigEndian>(self.memory)
    }
}

/// State of one virtual CPU, returned by `DOMAIN_GET_VCPUS` and by the
/// collaborator's `domain_get_vcpus` unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VcpuInfo {
    pub number: u32,
    pub state: i32,
    pub cpu_time: u64,
    pub cpu: i32,
}

impl VcpuInfo {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(VcpuInfo {
            number: r.read_u32::<BigEndian>()?,
            state: r.read_i32::<BigEndian>()?,
            cpu_time: r.read_u64::<BigEndian>()?,
            cpu: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_u32::<BigEndian>(self.number)?;
        buf.write_i32::<BigEndian>(self.state)?;
        buf.write_u64::<BigEndian>(self.cpu_time)?;
        buf.write_i32::<BigEndian>(self.cpu)
    }
}

/// Return body of `DOMAIN_GET_VCPUS`.
///
/// `cpumaps` is the row-major `info.len() * maplen` pinning block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainGetVcpusRet {
    pub info: Vec<VcpuInfo>,
    pub cpumaps: Vec<u8>,
}

impl DomainGetVcpusRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let n = read_array_len(r, REMOTE_VCPUINFO_MAX, "info", "REMOTE_VCPUINFO_MAX")?;

        let mut info = Vec::with_capacity(n as usize);
        for _ in 0..n {
            info.push(VcpuInfo::from_cursor(r)?);
        }

        let cpumaps = read_opaque(r, REMOTE_CPUMAPS_MAX, "cpumaps", "REMOTE_CPUMAPS_MAX")?.to_vec();

        Ok(DomainGetVcpusRet { info, cpumaps })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_u32::<BigEndian>(self.info.len() as u32)?;
        for i in &self.info {
            i.serialise_into(buf)?;
        }
        write_opaque(buf, &self.cpumaps)
    }
}

/// Return body of `DOMAIN_GET_AUTOSTART` and `NETWORK_GET_AUTOSTART`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetAutostartRet {
    pub autostart: i32,
}

impl GetAutostartRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(GetAutostartRet {
            autostart: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i32::<BigEndian>(self.autostart)
    }
}

/// Device throughput counters, returned by `DOMAIN_BLOCK_STATS` and by the
/// collaborator's `domain_block_stats` unchanged.
///
/// A counter the driver does not track is `-1`, not zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStats {
    pub rd_req: i64,
    pub rd_bytes: i64,
    pub wr_req: i64,
    pub wr_bytes: i64,
    pub errs: i64,
}

impl BlockStats {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(BlockStats {
            rd_req: r.read_i64::<BigEndian>()?,
            rd_bytes: r.read_i64::<BigEndian>()?,
            wr_req: r.read_i64::<BigEndian>()?,
            wr_bytes: r.read_i64::<BigEndian>()?,
            errs: r.read_i64::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i64::<BigEndian>(self.rd_req)?;
        buf.write_i64::<BigEndian>(self.rd_bytes)?;
        buf.write_i64::<BigEndian>(self.wr_req)?;
        buf.write_i64::<BigEndian>(self.wr_bytes)?;
        buf.write_i64::<BigEndian>(self.errs)
    }
}

/// Interface throughput counters, returned by `DOMAIN_INTERFACE_STATS` and
/// by the collaborator's `domain_interface_stats` unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceStats {
    pub rx_bytes: i64,
    pub rx_packets: i64,
    pub rx_errs: i64,
    pub rx_drop: i64,
    pub tx_bytes: i64,
    pub tx_packets: i64,
    pub tx_errs: i64,
    pub tx_drop: i64,
}

impl InterfaceStats {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(InterfaceStats {
            rx_bytes: r.read_i64::<BigEndian>()?,
            rx_packets: r.read_i64::<BigEndian>()?,
            rx_errs: r.read_i64::<BigEndian>()?,
            rx_drop: r.read_i64::<BigEndian>()?,
            tx_bytes: r.read_i64::<BigEndian>()?,
            tx_packets: r.read_i64::<BigEndian>()?,
            tx_errs: r.read_i64::<BigEndian>()?,
            tx_drop: r.read_i64::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i64::<BigEndian>(self.rx_bytes)?;
        buf.write_i64::<BigEndian>(self.rx_packets)?;
        buf.write_i64::<BigEndian>(self.rx_errs)?;
        buf.write_i64::<BigEndian>(self.rx_drop)?;
        buf.write_i64::<BigEndian>(self.tx_bytes)?;
        buf.write_i64::<BigEndian>(self.tx_packets)?;
        buf.write_i64::<BigEndian>(self.tx_errs)?;
        buf.write_i64::<BigEndian>(self.tx_drop)
    }
}

/// Return body of `DOMAIN_GET_SCHEDULER_TYPE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainGetSchedTypeRet {
    pub ty: String,
    pub nparams: i32,
}

impl DomainGetSchedTypeRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainGetSchedTypeRet {
            ty: read_string(r)?.to_owned(),
            nparams: r.read_i32::<BigEndian>()?,
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.ty)?;
        buf.write_i32::<BigEndian>(self.nparams)
    }
}

/// Return body of `DOMAIN_GET_SCHEDULER_PARAMETERS`.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainGetSchedParamsRet {
    pub params: Vec<SchedParam>,
}

impl DomainGetSchedParamsRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let n = read_array_len(
            r,
            REMOTE_DOMAIN_SCHEDULER_PARAMETERS_MAX,
            "nparams",
            "REMOTE_DOMAIN_SCHEDULER_PARAMETERS_MAX",
        )?;

        let mut params = Vec::with_capacity(n as usize);
        for _ in 0..n {
            params.push(SchedParam::from_cursor(r)?);
        }

        Ok(DomainGetSchedParamsRet { params })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_u32::<BigEndian>(self.params.len() as u32)?;
        for p in &self.params {
            p.serialise_into(buf)?;
        }
        Ok(())
    }
}

/// Return body of `DOMAIN_MIGRATE_PREPARE`.
///
/// The cookie and `uri_out` are produced by the destination and relayed to
/// `DOMAIN_MIGRATE_PERFORM` without interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainMigratePrepareRet {
    pub cookie: Vec<u8>,
    pub uri_out: Option<String>,
}

impl DomainMigratePrepareRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(DomainMigratePrepareRet {
            cookie: read_opaque(r, REMOTE_MIGRATE_COOKIE_MAX, "cookie", "REMOTE_MIGRATE_COOKIE_MAX")?
                .to_vec(),
            uri_out: read_opt_string(r)?.map(str::to_owned),
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_opaque(buf, &self.cookie)?;
        write_opt_string(buf, self.uri_out.as_deref())
    }
}

/// Return body of `NETWORK_GET_BRIDGE_NAME`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkGetBridgeNameRet {
    pub name: String,
}

impl NetworkGetBridgeNameRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(NetworkGetBridgeNameRet {
            name: read_string(r)?.to_owned(),
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.name)
    }
}

/// Return body of `AUTH_LIST`: the schemes the server will accept, in
/// preference order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthListRet {
    pub types: Vec<i32>,
}

impl AuthListRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let n = read_array_len(r, REMOTE_AUTH_TYPE_LIST_MAX, "types", "REMOTE_AUTH_TYPE_LIST_MAX")?;

        let mut types = Vec::with_capacity(n as usize);
        for _ in 0..n {
            types.push(r.read_i32::<BigEndian>()?);
        }

        Ok(AuthListRet { types })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_u32::<BigEndian>(self.types.len() as u32)?;
        for t in &self.types {
            buf.write_i32::<BigEndian>(*t)?;
        }
        Ok(())
    }
}

/// Return body of `AUTH_SASL_INIT`: the comma-separated mechanism list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSaslInitRet {
    pub mechlist: String,
}

impl AuthSaslInitRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(AuthSaslInitRet {
            mechlist: read_string(r)?.to_owned(),
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.mechlist)
    }
}

/// Return body of `AUTH_SASL_START` and `AUTH_SASL_STEP`.
///
/// `complete = 1` ends the negotiation; `data` is the server-out challenge
/// with nil-versus-empty preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSaslRet {
    pub complete: i32,
    pub data: Option<Vec<u8>>,
}

impl AuthSaslRet {
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Ok(AuthSaslRet {
            complete: r.read_i32::<BigEndian>()?,
            data: read_sasl_data(r)?.map(<[u8]>::to_vec),
        })
    }

    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        buf.write_i32::<BigEndian>(self.complete)?;
        write_sasl_data(buf, self.data.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_domains_ret_round_trip() {
        let ret = ListDomainsRet { ids: vec![1, 7, 42] };

        let mut buf = Vec::new();
        ret.serialise_into(&mut buf).unwrap();
        assert_eq!(buf.len(), 4 + 3 * 4);

        let got = ListDomainsRet::from_cursor(&mut Cursor::new(buf.as_slice())).unwrap();
        assert_eq!(got, ret);
    }

    #[test]
    fn test_name_list_bound_enforced_at_decode() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(REMOTE_NETWORK_NAME_LIST_MAX + 1).to_be_bytes());

        assert_eq!(
            ListNetworksRet::from_cursor(&mut Cursor::new(buf.as_slice())).unwrap_err(),
            Error::BoundExceeded {
                field: "names",
                limit: "REMOTE_NETWORK_NAME_LIST_MAX",
            }
        );
    }

    #[test]
    fn test_vcpus_ret_round_trip() {
        let ret = DomainGetVcpusRet {
            info: vec![
                VcpuInfo {
                    number: 0,
                    state: 1,
                    cpu_time: 12_345,
                    cpu: 2,
                },
                VcpuInfo {
                    number: 1,
                    state: 1,
                    cpu_time: 54_321,
                    cpu: 3,
                },
            ],
            cpumaps: vec![0b0000_0100, 0b0000_1000],
        };

        let mut buf = Vec::new();
        ret.serialise_into(&mut buf).unwrap();

        let got = DomainGetVcpusRet::from_cursor(&mut Cursor::new(buf.as_slice())).unwrap();
        assert_eq!(got, ret);
    }

    #[test]
    fn test_sasl_ret_nil_vs_empty() {
        let nil = AuthSaslRet {
            complete: 1,
            data: None,
        };
        let empty = AuthSaslRet {
            complete: 1,
            data: Some(Vec::new()),
        };

        let mut a = Vec::new();
        nil.serialise_into(&mut a).unwrap();
        let mut b = Vec::new();
        empty.serialise_into(&mut b).unwrap();

        assert_ne!(a, b);
        assert_eq!(AuthSaslRet::from_cursor(&mut Cursor::new(a.as_slice())).unwrap(), nil);
        assert_eq!(AuthSaslRet::from_cursor(&mut Cursor::new(b.as_slice())).unwrap(), empty);
    }

    #[test]
    fn test_node_info_round_trip() {
        let mut model = [0u8; NODE_MODEL_LEN];
        model[..6].copy_from_slice(b"x86_64");

        let ret = NodeInfo {
            model,
            memory: 16 * 1024 * 1024,
            cpus: 8,
            mhz: 2400,
            nodes: 1,
            sockets: 1,
            cores: 4,
            threads: 2,
        };

        let mut buf = Vec::new();
        ret.serialise_into(&mut buf).unwrap();
        assert_eq!(buf.len(), NODE_MODEL_LEN + 8 + 6 * 4);

        let got = NodeInfo::from_cursor(&mut Cursor::new(buf.as_slice())).unwrap();
        assert_eq!(got, ret);
    }
}
