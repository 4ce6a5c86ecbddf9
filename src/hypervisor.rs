//! The hypervisor management library, as consumed by the dispatch layer.
//!
//! Every operation the procedure handlers need is expressed on the
//! [`Hypervisor`] trait: synchronous calls that either succeed or return a
//! structured [`HvError`], which the dispatcher forwards to the client
//! verbatim. There is no last-error slot to read back.
//!
//! Handle discipline: lookups hand out owned `Domain`/`Network` handles
//! that must be returned through `release_domain`/`release_network`.
//! Handlers wrap them in [`ScopedDomain`]/[`ScopedNetwork`] so release
//! happens on every exit path exactly once; `DOMAIN_DESTROY` is the single
//! operation that releases its handle itself on success, and the guard is
//! disarmed for it.

use std::ops::Deref;

use thiserror::Error;

use crate::{
    limits::UUID_LEN,
    proto::{origin, BlockStats, DomainInfo, InterfaceStats, NodeInfo, SchedParam, VcpuInfo},
};

/// `OPEN` flag requesting a read-only connection.
///
/// ORed into the client-supplied flags unconditionally when the transport
/// marked the session read-only.
pub const OPEN_READONLY: u32 = 1;

/// A structured error returned by the hypervisor library.
///
/// Field for field this is the library's native error report; the
/// dispatcher copies it into the wire error record unchanged, so client
/// visible codes are the library's own.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("hypervisor error {code}: {}", .message.as_deref().unwrap_or("unknown"))]
pub struct HvError {
    /// Library error code.
    pub code: i32,

    /// Subsystem the error originated from.
    pub origin: i32,

    /// Severity, encoded as the wire error level.
    pub level: i32,

    /// Human-readable description.
    pub message: Option<String>,

    /// Extra string details.
    pub str1: Option<String>,

    /// Extra string details.
    pub str2: Option<String>,

    /// Extra string details.
    pub str3: Option<String>,

    /// Extra numeric detail.
    pub int1: i32,

    /// Extra numeric detail.
    pub int2: i32,
}

impl HvError {
    /// A minimal error with the given code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        HvError {
            code,
            origin: origin::NONE,
            level: crate::proto::LEVEL_ERROR,
            message: Some(message.into()),
            str1: None,
            str2: None,
            str3: None,
            int1: -1,
            int2: -1,
        }
    }
}

/// Identity of a live domain handle.
pub trait DomainIdent {
    /// Unique human-readable name.
    fn name(&self) -> &str;

    /// Immutable identity.
    fn uuid(&self) -> &[u8; UUID_LEN];

    /// Numeric id while running, `-1` when inactive.
    fn id(&self) -> i32;
}

/// Identity of a live network handle.
pub trait NetworkIdent {
    /// Unique human-readable name.
    fn name(&self) -> &str;

    /// Immutable identity.
    fn uuid(&self) -> &[u8; UUID_LEN];
}

/// The hypervisor management library.
///
/// All calls are synchronous and bounded by the library's own contract;
/// the dispatcher never suspends around them. Methods taking `&Conn`
/// leave the connection usable on failure (a failed `close` keeps the
/// session's slot occupied).
#[allow(missing_docs)] // methods mirror the library's operation names
pub trait Hypervisor {
    /// A live connection to the hypervisor.
    type Conn;

    /// A live domain handle, owned until released.
    type Domain: DomainIdent;

    /// A live network handle, owned until released.
    type Network: NetworkIdent;

    // Connection lifecycle.

    /// Opens a connection. `name = None` selects the library default;
    /// read-only is requested through [`OPEN_READONLY`] in `flags`.
    fn open(&self, name: Option<&str>, flags: u32) -> Result<Self::Conn, HvError>;

    /// Closes a connection. On failure the connection stays valid.
    fn close(&self, conn: &Self::Conn) -> Result<(), HvError>;

    // Host-level queries.

    fn get_type(&self, conn: &Self::Conn) -> Result<String, HvError>;
    fn get_version(&self, conn: &Self::Conn) -> Result<u64, HvError>;
    fn get_hostname(&self, conn: &Self::Conn) -> Result<String, HvError>;
    fn get_capabilities(&self, conn: &Self::Conn) -> Result<String, HvError>;
    fn get_max_vcpus(&self, conn: &Self::Conn, ty: Option<&str>) -> Result<i32, HvError>;
    fn node_get_info(&self, conn: &Self::Conn) -> Result<NodeInfo, HvError>;
    fn supports_feature(&self, conn: &Self::Conn, feature: i32) -> Result<bool, HvError>;

    // Domain enumeration. The `max*` arguments bound the result; the
    // library fills in up to that many entries.

    fn list_domains(&self, conn: &Self::Conn, maxids: usize) -> Result<Vec<i32>, HvError>;
    fn num_of_domains(&self, conn: &Self::Conn) -> Result<i32, HvError>;
    fn list_defined_domains(
        &self,
        conn: &Self::Conn,
        maxnames: usize,
    ) -> Result<Vec<String>, HvError>;
    fn num_of_defined_domains(&self, conn: &Self::Conn) -> Result<i32, HvError>;

    // Domain handles.

    /// Resolves a wire reference to a live handle by `(name, uuid)`.
    ///
    /// The server-side id is authoritative; an id carried on the wire is
    /// not consulted.
    fn domain_resolve(
        &self,
        conn: &Self::Conn,
        name: &str,
        uuid: &[u8; UUID_LEN],
    ) -> Result<Self::Domain, HvError>;

    fn domain_lookup_by_id(&self, conn: &Self::Conn, id: i32) -> Result<Self::Domain, HvError>;
    fn domain_lookup_by_name(&self, conn: &Self::Conn, name: &str)
        -> Result<Self::Domain, HvError>;
    fn domain_lookup_by_uuid(
        &self,
        conn: &Self::Conn,
        uuid: &[u8; UUID_LEN],
    ) -> Result<Self::Domain, HvError>;

    /// Returns a handle to the library.
    fn release_domain(&self, dom: Self::Domain);

    // Domain lifecycle and mutation.

    fn domain_create_linux(
        &self,
        conn: &Self::Conn,
        xml: &str,
        flags: u32,
    ) -> Result<Self::Domain, HvError>;
    fn domain_define_xml(&self, conn: &Self::Conn, xml: &str) -> Result<Self::Domain, HvError>;
    fn domain_undefine(&self, conn: &Self::Conn, dom: &Self::Domain) -> Result<(), HvError>;
    fn domain_create(&self, conn: &Self::Conn, dom: &Self::Domain) -> Result<(), HvError>;

    /// Destroys a running domain. On success the library has released the
    /// handle and the caller must not release it again; on failure the
    /// handle is still live.
    fn domain_destroy(&self, conn: &Self::Conn, dom: &Self::Domain) -> Result<(), HvError>;

    fn domain_shutdown(&self, conn: &Self::Conn, dom: &Self::Domain) -> Result<(), HvError>;
    fn domain_reboot(&self, conn: &Self::Conn, dom: &Self::Domain, flags: u32)
        -> Result<(), HvError>;
    fn domain_suspend(&self, conn: &Self::Conn, dom: &Self::Domain) -> Result<(), HvError>;
    fn domain_resume(&self, conn: &Self::Conn, dom: &Self::Domain) -> Result<(), HvError>;
    fn domain_save(&self, conn: &Self::Conn, dom: &Self::Domain, to: &str) -> Result<(), HvError>;
    fn domain_restore(&self, conn: &Self::Conn, from: &str) -> Result<(), HvError>;
    fn domain_core_dump(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        to: &str,
        flags: u32,
    ) -> Result<(), HvError>;
    fn domain_attach_device(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        xml: &str,
    ) -> Result<(), HvError>;
    fn domain_detach_device(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        xml: &str,
    ) -> Result<(), HvError>;

    // Domain queries and tuning.

    fn domain_get_info(&self, conn: &Self::Conn, dom: &Self::Domain)
        -> Result<DomainInfo, HvError>;
    fn domain_get_xml_desc(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        flags: u32,
    ) -> Result<String, HvError>;
    fn domain_get_os_type(&self, conn: &Self::Conn, dom: &Self::Domain)
        -> Result<String, HvError>;
    fn domain_get_max_memory(&self, conn: &Self::Conn, dom: &Self::Domain)
        -> Result<u64, HvError>;
    fn domain_set_max_memory(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        memory: u64,
    ) -> Result<(), HvError>;
    fn domain_set_memory(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        memory: u64,
    ) -> Result<(), HvError>;
    fn domain_get_max_vcpus(&self, conn: &Self::Conn, dom: &Self::Domain)
        -> Result<i32, HvError>;
    fn domain_set_vcpus(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        nvcpus: u32,
    ) -> Result<(), HvError>;
    fn domain_pin_vcpu(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        vcpu: u32,
        cpumap: &[u8],
    ) -> Result<(), HvError>;

    /// Fills in up to `maxinfo` vCPU records and, when `maplen > 0`, a
    /// row-major `maxinfo * maplen` pinning block.
    fn domain_get_vcpus(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        maxinfo: usize,
        maplen: usize,
    ) -> Result<(Vec<VcpuInfo>, Vec<u8>), HvError>;

    fn domain_get_autostart(&self, conn: &Self::Conn, dom: &Self::Domain)
        -> Result<bool, HvError>;
    fn domain_set_autostart(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        autostart: bool,
    ) -> Result<(), HvError>;
    fn domain_block_stats(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        path: &str,
    ) -> Result<BlockStats, HvError>;
    fn domain_interface_stats(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        path: &str,
    ) -> Result<InterfaceStats, HvError>;

    /// Returns the scheduler name and its parameter count.
    fn domain_get_scheduler_type(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
    ) -> Result<(String, i32), HvError>;
    fn domain_get_scheduler_parameters(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        nparams: usize,
    ) -> Result<Vec<SchedParam>, HvError>;
    fn domain_set_scheduler_parameters(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        params: &[SchedParam],
    ) -> Result<(), HvError>;

    // Migration. Cookies are opaque here; only the endpoints interpret
    // them.

    fn domain_migrate_prepare(
        &self,
        conn: &Self::Conn,
        uri_in: Option<&str>,
        flags: u64,
        dname: Option<&str>,
        resource: u64,
    ) -> Result<(Vec<u8>, Option<String>), HvError>;
    fn domain_migrate_perform(
        &self,
        conn: &Self::Conn,
        dom: &Self::Domain,
        cookie: &[u8],
        uri: &str,
        flags: u64,
        dname: Option<&str>,
        resource: u64,
    ) -> Result<(), HvError>;
    fn domain_migrate_finish(
        &self,
        conn: &Self::Conn,
        dname: &str,
        cookie: &[u8],
        uri: &str,
        flags: u64,
    ) -> Result<Self::Domain, HvError>;

    // Networks.

    fn network_resolve(
        &self,
        conn: &Self::Conn,
        name: &str,
        uuid: &[u8; UUID_LEN],
    ) -> Result<Self::Network, HvError>;
    fn network_lookup_by_name(
        &self,
        conn: &Self::Conn,
        name: &str,
    ) -> Result<Self::Network, HvError>;
    fn network_lookup_by_uuid(
        &self,
        conn: &Self::Conn,
        uuid: &[u8; UUID_LEN],
    ) -> Result<Self::Network, HvError>;

    /// Returns a handle to the library.
    fn release_network(&self, net: Self::Network);

    fn network_create_xml(&self, conn: &Self::Conn, xml: &str) -> Result<Self::Network, HvError>;
    fn network_define_xml(&self, conn: &Self::Conn, xml: &str) -> Result<Self::Network, HvError>;
    fn network_undefine(&self, conn: &Self::Conn, net: &Self::Network) -> Result<(), HvError>;
    fn network_create(&self, conn: &Self::Conn, net: &Self::Network) -> Result<(), HvError>;
    fn network_destroy(&self, conn: &Self::Conn, net: &Self::Network) -> Result<(), HvError>;
    fn network_dump_xml(
        &self,
        conn: &Self::Conn,
        net: &Self::Network,
        flags: u32,
    ) -> Result<String, HvError>;
    fn network_get_bridge_name(
        &self,
        conn: &Self::Conn,
        net: &Self::Network,
    ) -> Result<String, HvError>;
    fn network_get_autostart(&self, conn: &Self::Conn, net: &Self::Network)
        -> Result<bool, HvError>;
    fn network_set_autostart(
        &self,
        conn: &Self::Conn,
        net: &Self::Network,
        autostart: bool,
    ) -> Result<(), HvError>;

    fn list_networks(&self, conn: &Self::Conn, maxnames: usize) -> Result<Vec<String>, HvError>;
    fn num_of_networks(&self, conn: &Self::Conn) -> Result<i32, HvError>;
    fn list_defined_networks(
        &self,
        conn: &Self::Conn,
        maxnames: usize,
    ) -> Result<Vec<String>, HvError>;
    fn num_of_defined_networks(&self, conn: &Self::Conn) -> Result<i32, HvError>;
}

/// A per-call domain handle, released back to the library when the scope
/// ends.
pub struct ScopedDomain<'h, H: Hypervisor> {
    hv: &'h H,
    dom: Option<H::Domain>,
}

impl<'h, H: Hypervisor> ScopedDomain<'h, H> {
    /// Takes ownership of `dom`, to be released when the guard drops.
    pub fn new(hv: &'h H, dom: H::Domain) -> Self {
        ScopedDomain { hv, dom: Some(dom) }
    }

    /// Forgets the handle without releasing it.
    ///
    /// For `DOMAIN_DESTROY` only: the destroy operation releases the
    /// handle itself on success.
    pub fn disarm(mut self) {
        self.dom = None;
    }
}

impl<H: Hypervisor> Deref for ScopedDomain<'_, H> {
    type Target = H::Domain;

    fn deref(&self) -> &Self::Target {
        // Present from construction until disarm(), which consumes self.
        self.dom.as_ref().expect("scoped domain handle disarmed")
    }
}

impl<H: Hypervisor> Drop for ScopedDomain<'_, H> {
    fn drop(&mut self) {
        if let Some(dom) = self.dom.take() {
            self.hv.release_domain(dom);
        }
    }
}

impl<H: Hypervisor> std::fmt::Debug for ScopedDomain<'_, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedDomain")
            .field("name", &self.dom.as_ref().map(|d| d.name()))
            .finish()
    }
}

/// A per-call network handle, released back to the library when the scope
/// ends.
pub struct ScopedNetwork<'h, H: Hypervisor> {
    hv: &'h H,
    net: Option<H::Network>,
}

impl<'h, H: Hypervisor> ScopedNetwork<'h, H> {
    /// Takes ownership of `net`, to be released when the guard drops.
    pub fn new(hv: &'h H, net: H::Network) -> Self {
        ScopedNetwork { hv, net: Some(net) }
    }
}

impl<H: Hypervisor> Deref for ScopedNetwork<'_, H> {
    type Target = H::Network;

    fn deref(&self) -> &Self::Target {
        self.net.as_ref().expect("scoped network handle disarmed")
    }
}

impl<H: Hypervisor> Drop for ScopedNetwork<'_, H> {
    fn drop(&mut self) {
        if let Some(net) = self.net.take() {
            self.hv.release_network(net);
        }
    }
}

impl<H: Hypervisor> std::fmt::Debug for ScopedNetwork<'_, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedNetwork")
            .field("name", &self.net.as_ref().map(|n| n.name()))
            .finish()
    }
}
