//! Connection lifecycle, host-level queries and object enumeration.

use tracing::debug;

use crate::{
    handlers::{check_bound, not_open, require_conn, CallContext, HandlerError},
    hypervisor::{Hypervisor, OPEN_READONLY},
    limits::{
        REMOTE_DOMAIN_ID_LIST_MAX, REMOTE_DOMAIN_NAME_LIST_MAX, REMOTE_NETWORK_NAME_LIST_MAX,
    },
    proto::{
        code, ErrorRecord, GetCapabilitiesRet, GetHostnameRet, GetMaxVcpusArgs, GetMaxVcpusRet,
        GetTypeRet, GetVersionRet, ListDefinedDomainsRet, ListDomainsArgs, ListDomainsRet,
        ListNamesArgs, ListNetworksRet, NumRet, SupportsFeatureArgs, SupportsFeatureRet,
    },
    sasl::SaslBackend,
};

pub(crate) fn open<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = crate::proto::OpenArgs::from_cursor(&mut ctx.args)?;

    if ctx.session.conn.is_some() {
        return Err(HandlerError::Dispatch(ErrorRecord {
            code: code::INTERNAL,
            ..ErrorRecord::rpc("connection already open")
        }));
    }

    // A read-only transport overrides whatever the client asked for.
    let mut flags = args.flags;
    if ctx.session.readonly() {
        flags |= OPEN_READONLY;
    }

    let conn = ctx.hv.open(args.name, flags)?;
    ctx.session.conn = Some(conn);

    debug!(name = ?args.name, readonly = flags & OPEN_READONLY != 0, "connection opened");
    Ok(())
}

pub(crate) fn close<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let conn = ctx.session.conn.as_ref().ok_or_else(not_open)?;

    // The slot is cleared only once the library reports success; a failed
    // close leaves the connection usable.
    ctx.hv.close(conn)?;
    ctx.session.conn = None;

    debug!("connection closed");
    Ok(())
}

pub(crate) fn get_type<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let conn = require_conn(ctx.session)?;
    let ty = ctx.hv.get_type(conn)?;

    GetTypeRet { ty }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_version<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let conn = require_conn(ctx.session)?;
    let hv_ver = ctx.hv.get_version(conn)?;

    GetVersionRet { hv_ver }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_hostname<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let conn = require_conn(ctx.session)?;
    let hostname = ctx.hv.get_hostname(conn)?;

    GetHostnameRet { hostname }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_capabilities<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let conn = require_conn(ctx.session)?;
    let capabilities = ctx.hv.get_capabilities(conn)?;

    GetCapabilitiesRet { capabilities }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_max_vcpus<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = GetMaxVcpusArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;
    let max_vcpus = ctx.hv.get_max_vcpus(conn, args.ty)?;

    GetMaxVcpusRet { max_vcpus }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn node_get_info<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let conn = require_conn(ctx.session)?;
    let info = ctx.hv.node_get_info(conn)?;

    info.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn supports_feature<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = SupportsFeatureArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;
    let supported = ctx.hv.supports_feature(conn, args.feature)?;

    SupportsFeatureRet {
        supported: i32::from(supported),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn list_domains<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = ListDomainsArgs::from_cursor(&mut ctx.args)?;
    let maxids = check_bound(
        args.maxids,
        REMOTE_DOMAIN_ID_LIST_MAX,
        "maxids",
        "REMOTE_DOMAIN_ID_LIST_MAX",
    )?;

    let conn = require_conn(ctx.session)?;
    let ids = ctx.hv.list_domains(conn, maxids)?;

    ListDomainsRet { ids }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn num_of_domains<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let conn = require_conn(ctx.session)?;
    let num = ctx.hv.num_of_domains(conn)?;

    NumRet { num }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn list_defined_domains<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = ListNamesArgs::from_cursor(&mut ctx.args)?;
    let maxnames = check_bound(
        args.maxnames,
        REMOTE_DOMAIN_NAME_LIST_MAX,
        "maxnames",
        "REMOTE_DOMAIN_NAME_LIST_MAX",
    )?;

    let conn = require_conn(ctx.session)?;
    let names = ctx.hv.list_defined_domains(conn, maxnames)?;

    ListDefinedDomainsRet { names }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn num_of_defined_domains<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let conn = require_conn(ctx.session)?;
    let num = ctx.hv.num_of_defined_domains(conn)?;

    NumRet { num }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn list_networks<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = ListNamesArgs::from_cursor(&mut ctx.args)?;
    let maxnames = check_bound(
        args.maxnames,
        REMOTE_NETWORK_NAME_LIST_MAX,
        "maxnames",
        "REMOTE_NETWORK_NAME_LIST_MAX",
    )?;

    let conn = require_conn(ctx.session)?;
    let names = ctx.hv.list_networks(conn, maxnames)?;

    ListNetworksRet { names }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn num_of_networks<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let conn = require_conn(ctx.session)?;
    let num = ctx.hv.num_of_networks(conn)?;

    NumRet { num }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn list_defined_networks<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = ListNamesArgs::from_cursor(&mut ctx.args)?;
    let maxnames = check_bound(
        args.maxnames,
        REMOTE_NETWORK_NAME_LIST_MAX,
        "maxnames",
        "REMOTE_NETWORK_NAME_LIST_MAX",
    )?;

    let conn = require_conn(ctx.session)?;
    let names = ctx.hv.list_defined_networks(conn, maxnames)?;

    ListNetworksRet { names }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn num_of_defined_networks<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let conn = require_conn(ctx.session)?;
    let num = ctx.hv.num_of_defined_networks(conn)?;

    NumRet { num }.serialise_into(&mut ctx.reply)?;
    Ok(())
}
