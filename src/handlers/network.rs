//! Network procedures. Same handle discipline as the domain group; no
//! destroy exception here, network handles always release through the
//! guard.

use crate::{
    handlers::{get_network, require_conn, CallContext, HandlerError},
    hypervisor::{Hypervisor, ScopedNetwork},
    proto::{
        GetAutostartRet, LookupByNameArgs, LookupByUuidArgs, NetworkArgs, NetworkDumpXmlArgs,
        NetworkGetBridgeNameRet, NetworkRef, NetworkRet, NetworkSetAutostartArgs, XmlArgs, XmlRet,
    },
    sasl::SaslBackend,
};

pub(crate) fn lookup_by_name<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = LookupByNameArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = ScopedNetwork::new(ctx.hv, ctx.hv.network_lookup_by_name(conn, args.name)?);
    NetworkRet {
        net: NetworkRef::from_ident(&*net),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn lookup_by_uuid<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = LookupByUuidArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = ScopedNetwork::new(ctx.hv, ctx.hv.network_lookup_by_uuid(conn, &args.uuid)?);
    NetworkRet {
        net: NetworkRef::from_ident(&*net),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn create_xml<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = XmlArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = ScopedNetwork::new(ctx.hv, ctx.hv.network_create_xml(conn, args.xml)?);
    NetworkRet {
        net: NetworkRef::from_ident(&*net),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn define_xml<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = XmlArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = ScopedNetwork::new(ctx.hv, ctx.hv.network_define_xml(conn, args.xml)?);
    NetworkRet {
        net: NetworkRef::from_ident(&*net),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn undefine<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = NetworkArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = get_network(ctx.hv, conn, &args.net)?;
    ctx.hv.network_undefine(conn, &net)?;
    Ok(())
}

pub(crate) fn create<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = NetworkArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = get_network(ctx.hv, conn, &args.net)?;
    ctx.hv.network_create(conn, &net)?;
    Ok(())
}

pub(crate) fn destroy<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = NetworkArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = get_network(ctx.hv, conn, &args.net)?;
    ctx.hv.network_destroy(conn, &net)?;
    Ok(())
}

pub(crate) fn dump_xml<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = NetworkDumpXmlArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = get_network(ctx.hv, conn, &args.net)?;
    let xml = ctx.hv.network_dump_xml(conn, &net, args.flags)?;

    XmlRet { xml }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_bridge_name<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = NetworkArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = get_network(ctx.hv, conn, &args.net)?;
    let name = ctx.hv.network_get_bridge_name(conn, &net)?;

    NetworkGetBridgeNameRet { name }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_autostart<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = NetworkArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = get_network(ctx.hv, conn, &args.net)?;
    let autostart = ctx.hv.network_get_autostart(conn, &net)?;

    GetAutostartRet {
        autostart: i32::from(autostart),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn set_autostart<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = NetworkSetAutostartArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let net = get_network(ctx.hv, conn, &args.net)?;
    ctx.hv
        .network_set_autostart(conn, &net, args.autostart != 0)?;
    Ok(())
}
