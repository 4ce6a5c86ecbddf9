//! Procedure handlers: thin adapters from decoded arguments to the
//! hypervisor collaborator and back to an encoded return body.
//!
//! Each handler is a plain function; [`lookup`] is the static table from
//! procedure number to handler. A handler decodes its own arguments from
//! the call context's cursor, invokes the collaborator, and serialises the
//! return body into the reply sink. It never frames the reply itself and
//! never unwinds: every failure is one of the [`HandlerError`] outcomes,
//! which the dispatcher turns into a well-formed error reply.

use std::io::Cursor;

use crate::{
    hypervisor::{Hypervisor, HvError, ScopedDomain, ScopedNetwork},
    procedure::Procedure,
    proto::{code, DomainRef, ErrorRecord, NetworkRef},
    sasl::SaslBackend,
    session::Session,
    Error,
};

mod auth;
mod conn;
mod domain;
mod network;

/// How a handler failed.
#[derive(Debug)]
pub(crate) enum HandlerError {
    /// The hypervisor library rejected the operation; its structured error
    /// becomes the reply body verbatim.
    Hypervisor(HvError),

    /// The handler built the error reply body itself.
    Dispatch(ErrorRecord),

    /// Argument decoding or return encoding failed; the dispatcher renders
    /// the codec error as a protocol error reply.
    Wire(Error),
}

impl From<HvError> for HandlerError {
    fn from(e: HvError) -> Self {
        Self::Hypervisor(e)
    }
}

impl From<Error> for HandlerError {
    fn from(e: Error) -> Self {
        Self::Wire(e)
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(e: std::io::Error) -> Self {
        Self::Wire(e.into())
    }
}

/// Everything one procedure invocation may touch.
pub(crate) struct CallContext<'a, H: Hypervisor, S: SaslBackend> {
    pub(crate) hv: &'a H,
    pub(crate) sasl: &'a S,
    pub(crate) session: &'a mut Session<H, S>,

    /// Argument bytes, positioned after the envelope.
    pub(crate) args: Cursor<&'a [u8]>,

    /// Sink for the encoded return body.
    pub(crate) reply: Vec<u8>,
}

/// A procedure handler.
pub(crate) type Handler<H, S> = fn(&mut CallContext<'_, H, S>) -> Result<(), HandlerError>;

/// The error reply for procedures that need an open connection.
pub(crate) fn not_open() -> HandlerError {
    HandlerError::Dispatch(ErrorRecord {
        code: code::INTERNAL,
        ..ErrorRecord::rpc("connection not open")
    })
}

/// Resolves the session's hypervisor connection.
pub(crate) fn require_conn<'s, H: Hypervisor, S: SaslBackend>(
    session: &'s Session<H, S>,
) -> Result<&'s H::Conn, HandlerError> {
    session.conn.as_ref().ok_or_else(not_open)
}

/// Validates a client-supplied element count against its protocol bound,
/// before anything is allocated from it.
pub(crate) fn check_bound(
    value: i32,
    max: u32,
    field: &'static str,
    limit: &'static str,
) -> Result<usize, HandlerError> {
    if value < 0 {
        return Err(HandlerError::Wire(Error::InvalidLength));
    }
    if value as u32 > max {
        return Err(HandlerError::Wire(Error::BoundExceeded { field, limit }));
    }

    Ok(value as usize)
}

/// Acquires a scoped handle for a wire domain reference.
///
/// Resolution uses `(name, uuid)` only; the advisory wire id is ignored
/// and the handle carries the server-side id.
pub(crate) fn get_domain<'h, H: Hypervisor>(
    hv: &'h H,
    conn: &H::Conn,
    dom: &DomainRef,
) -> Result<ScopedDomain<'h, H>, HandlerError> {
    let handle = hv.domain_resolve(conn, &dom.name, &dom.uuid)?;
    Ok(ScopedDomain::new(hv, handle))
}

/// Acquires a scoped handle for a wire network reference.
pub(crate) fn get_network<'h, H: Hypervisor>(
    hv: &'h H,
    conn: &H::Conn,
    net: &NetworkRef,
) -> Result<ScopedNetwork<'h, H>, HandlerError> {
    let handle = hv.network_resolve(conn, &net.name, &net.uuid)?;
    Ok(ScopedNetwork::new(hv, handle))
}

/// The static procedure table.
///
/// Composes from the per-group modules; adding a procedure means adding a
/// numbered variant, an arg/ret body and one row here.
pub(crate) fn lookup<H: Hypervisor, S: SaslBackend>(procedure: Procedure) -> Handler<H, S> {
    use Procedure::*;

    match procedure {
        Open => conn::open,
        Close => conn::close,
        GetType => conn::get_type,
        GetVersion => conn::get_version,
        GetMaxVcpus => conn::get_max_vcpus,
        NodeGetInfo => conn::node_get_info,
        GetCapabilities => conn::get_capabilities,
        GetHostname => conn::get_hostname,
        SupportsFeature => conn::supports_feature,
        ListDomains => conn::list_domains,
        NumOfDomains => conn::num_of_domains,
        ListDefinedDomains => conn::list_defined_domains,
        NumOfDefinedDomains => conn::num_of_defined_domains,
        ListNetworks => conn::list_networks,
        NumOfNetworks => conn::num_of_networks,
        ListDefinedNetworks => conn::list_defined_networks,
        NumOfDefinedNetworks => conn::num_of_defined_networks,

        DomainLookupById => domain::lookup_by_id,
        DomainLookupByName => domain::lookup_by_name,
        DomainLookupByUuid => domain::lookup_by_uuid,
        DomainCreateLinux => domain::create_linux,
        DomainDefineXml => domain::define_xml,
        DomainUndefine => domain::undefine,
        DomainCreate => domain::create,
        DomainDestroy => domain::destroy,
        DomainShutdown => domain::shutdown,
        DomainReboot => domain::reboot,
        DomainSuspend => domain::suspend,
        DomainResume => domain::resume,
        DomainSave => domain::save,
        DomainRestore => domain::restore,
        DomainCoreDump => domain::core_dump,
        DomainGetInfo => domain::get_info,
        DomainGetXmlDesc => domain::get_xml_desc,
        DomainGetOsType => domain::get_os_type,
        DomainGetMaxMemory => domain::get_max_memory,
        DomainSetMaxMemory => domain::set_max_memory,
        DomainSetMemory => domain::set_memory,
        DomainGetMaxVcpus => domain::get_max_vcpus,
        DomainSetVcpus => domain::set_vcpus,
        DomainPinVcpu => domain::pin_vcpu,
        DomainGetVcpus => domain::get_vcpus,
        DomainGetAutostart => domain::get_autostart,
        DomainSetAutostart => domain::set_autostart,
        DomainAttachDevice => domain::attach_device,
        DomainDetachDevice => domain::detach_device,
        DomainBlockStats => domain::block_stats,
        DomainInterfaceStats => domain::interface_stats,
        DomainGetSchedulerType => domain::get_scheduler_type,
        DomainGetSchedulerParameters => domain::get_scheduler_parameters,
        DomainSetSchedulerParameters => domain::set_scheduler_parameters,
        DomainMigratePrepare => domain::migrate_prepare,
        DomainMigratePerform => domain::migrate_perform,
        DomainMigrateFinish => domain::migrate_finish,

        NetworkLookupByName => network::lookup_by_name,
        NetworkLookupByUuid => network::lookup_by_uuid,
        NetworkCreateXml => network::create_xml,
        NetworkDefineXml => network::define_xml,
        NetworkUndefine => network::undefine,
        NetworkCreate => network::create,
        NetworkDestroy => network::destroy,
        NetworkDumpXml => network::dump_xml,
        NetworkGetBridgeName => network::get_bridge_name,
        NetworkGetAutostart => network::get_autostart,
        NetworkSetAutostart => network::set_autostart,

        AuthList => auth::list,
        AuthSaslInit => auth::sasl_init,
        AuthSaslStart => auth::sasl_start,
        AuthSaslStep => auth::sasl_step,
    }
}
