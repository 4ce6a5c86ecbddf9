//! Domain procedures.
//!
//! Per-call handles are wrapped in [`ScopedDomain`] at acquisition, so
//! they are released on every exit path exactly once. `destroy` is the
//! lone exception: on success the library has already consumed the handle
//! and the guard is disarmed.
//!
//! [`ScopedDomain`]: crate::hypervisor::ScopedDomain

use crate::{
    handlers::{check_bound, get_domain, require_conn, CallContext, HandlerError},
    hypervisor::{Hypervisor, ScopedDomain},
    limits::{
        REMOTE_CPUMAPS_MAX, REMOTE_DOMAIN_SCHEDULER_PARAMETERS_MAX, REMOTE_VCPUINFO_MAX,
    },
    proto::{
        DomainArgs, DomainCoreDumpArgs, DomainCreateLinuxArgs, DomainFlagsArgs,
        DomainGetMaxMemoryRet, DomainGetOsTypeRet, DomainGetSchedParamsArgs,
        DomainGetSchedParamsRet, DomainGetSchedTypeRet, DomainGetVcpusArgs, DomainGetVcpusRet,
        DomainLookupByIdArgs, DomainMemoryArgs, DomainMigrateFinishArgs,
        DomainMigratePerformArgs, DomainMigratePrepareArgs, DomainMigratePrepareRet,
        DomainPinVcpuArgs, DomainRef, DomainRestoreArgs, DomainRet, DomainSaveArgs,
        DomainSetAutostartArgs, DomainSetSchedParamsArgs, DomainSetVcpusArgs, DomainDeviceArgs,
        DomainStatsArgs, GetAutostartRet, LookupByNameArgs, LookupByUuidArgs, NumRet, XmlArgs,
        XmlRet,
    },
    sasl::SaslBackend,
    Error,
};

pub(crate) fn lookup_by_id<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainLookupByIdArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = ScopedDomain::new(ctx.hv, ctx.hv.domain_lookup_by_id(conn, args.id)?);
    DomainRet {
        dom: DomainRef::from_ident(&*dom),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn lookup_by_name<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = LookupByNameArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = ScopedDomain::new(ctx.hv, ctx.hv.domain_lookup_by_name(conn, args.name)?);
    DomainRet {
        dom: DomainRef::from_ident(&*dom),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn lookup_by_uuid<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = LookupByUuidArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = ScopedDomain::new(ctx.hv, ctx.hv.domain_lookup_by_uuid(conn, &args.uuid)?);
    DomainRet {
        dom: DomainRef::from_ident(&*dom),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn create_linux<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainCreateLinuxArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = ScopedDomain::new(
        ctx.hv,
        ctx.hv.domain_create_linux(conn, args.xml_desc, args.flags)?,
    );
    DomainRet {
        dom: DomainRef::from_ident(&*dom),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn define_xml<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = XmlArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = ScopedDomain::new(ctx.hv, ctx.hv.domain_define_xml(conn, args.xml)?);
    DomainRet {
        dom: DomainRef::from_ident(&*dom),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn undefine<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_undefine(conn, &dom)?;
    Ok(())
}

pub(crate) fn create<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_create(conn, &dom)?;
    Ok(())
}

pub(crate) fn destroy<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_destroy(conn, &dom)?;

    // The destroy released the handle; a failed destroy drops the guard
    // and releases normally.
    dom.disarm();
    Ok(())
}

pub(crate) fn shutdown<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_shutdown(conn, &dom)?;
    Ok(())
}

pub(crate) fn reboot<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainFlagsArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_reboot(conn, &dom, args.flags)?;
    Ok(())
}

pub(crate) fn suspend<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_suspend(conn, &dom)?;
    Ok(())
}

pub(crate) fn resume<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_resume(conn, &dom)?;
    Ok(())
}

pub(crate) fn save<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainSaveArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_save(conn, &dom, args.to)?;
    Ok(())
}

pub(crate) fn restore<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainRestoreArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    ctx.hv.domain_restore(conn, args.from)?;
    Ok(())
}

pub(crate) fn core_dump<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainCoreDumpArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_core_dump(conn, &dom, args.to, args.flags)?;
    Ok(())
}

pub(crate) fn get_info<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let info = ctx.hv.domain_get_info(conn, &dom)?;

    info.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_xml_desc<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainFlagsArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let xml = ctx.hv.domain_get_xml_desc(conn, &dom, args.flags)?;

    XmlRet { xml }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_os_type<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let os_type = ctx.hv.domain_get_os_type(conn, &dom)?;

    DomainGetOsTypeRet { os_type }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_max_memory<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let memory = ctx.hv.domain_get_max_memory(conn, &dom)?;

    DomainGetMaxMemoryRet { memory }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn set_max_memory<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainMemoryArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_set_max_memory(conn, &dom, args.memory)?;
    Ok(())
}

pub(crate) fn set_memory<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainMemoryArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_set_memory(conn, &dom, args.memory)?;
    Ok(())
}

pub(crate) fn get_max_vcpus<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let num = ctx.hv.domain_get_max_vcpus(conn, &dom)?;

    NumRet { num }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn set_vcpus<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainSetVcpusArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_set_vcpus(conn, &dom, args.nvcpus)?;
    Ok(())
}

pub(crate) fn pin_vcpu<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainPinVcpuArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_pin_vcpu(conn, &dom, args.vcpu, args.cpumap)?;
    Ok(())
}

pub(crate) fn get_vcpus<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainGetVcpusArgs::from_cursor(&mut ctx.args)?;

    let maxinfo = check_bound(
        args.maxinfo,
        REMOTE_VCPUINFO_MAX,
        "maxinfo",
        "REMOTE_VCPUINFO_MAX",
    )?;
    if args.maplen < 0 {
        return Err(HandlerError::Wire(Error::InvalidLength));
    }
    // The flattened pinning block is bounded as a whole; widen before
    // multiplying so a hostile pair cannot wrap.
    if maxinfo as u64 * args.maplen as u64 > u64::from(REMOTE_CPUMAPS_MAX) {
        return Err(HandlerError::Wire(Error::BoundExceeded {
            field: "maxinfo * maplen",
            limit: "REMOTE_CPUMAPS_MAX",
        }));
    }

    let conn = require_conn(ctx.session)?;
    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let (info, cpumaps) = ctx
        .hv
        .domain_get_vcpus(conn, &dom, maxinfo, args.maplen as usize)?;

    DomainGetVcpusRet { info, cpumaps }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_autostart<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let autostart = ctx.hv.domain_get_autostart(conn, &dom)?;

    GetAutostartRet {
        autostart: i32::from(autostart),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn set_autostart<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainSetAutostartArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_set_autostart(conn, &dom, args.autostart != 0)?;
    Ok(())
}

pub(crate) fn attach_device<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainDeviceArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_attach_device(conn, &dom, args.xml)?;
    Ok(())
}

pub(crate) fn detach_device<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainDeviceArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_detach_device(conn, &dom, args.xml)?;
    Ok(())
}

pub(crate) fn block_stats<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainStatsArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let stats = ctx.hv.domain_block_stats(conn, &dom, args.path)?;

    stats.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn interface_stats<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainStatsArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let stats = ctx.hv.domain_interface_stats(conn, &dom, args.path)?;

    stats.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_scheduler_type<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let (ty, nparams) = ctx.hv.domain_get_scheduler_type(conn, &dom)?;

    DomainGetSchedTypeRet { ty, nparams }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn get_scheduler_parameters<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainGetSchedParamsArgs::from_cursor(&mut ctx.args)?;
    let nparams = check_bound(
        args.nparams,
        REMOTE_DOMAIN_SCHEDULER_PARAMETERS_MAX,
        "nparams",
        "REMOTE_DOMAIN_SCHEDULER_PARAMETERS_MAX",
    )?;

    let conn = require_conn(ctx.session)?;
    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    let params = ctx.hv.domain_get_scheduler_parameters(conn, &dom, nparams)?;

    DomainGetSchedParamsRet { params }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn set_scheduler_parameters<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainSetSchedParamsArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv
        .domain_set_scheduler_parameters(conn, &dom, &args.params)?;
    Ok(())
}

pub(crate) fn migrate_prepare<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainMigratePrepareArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let (cookie, uri_out) =
        ctx.hv
            .domain_migrate_prepare(conn, args.uri_in, args.flags, args.dname, args.resource)?;

    DomainMigratePrepareRet { cookie, uri_out }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn migrate_perform<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainMigratePerformArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let dom = get_domain(ctx.hv, conn, &args.dom)?;
    ctx.hv.domain_migrate_perform(
        conn,
        &dom,
        args.cookie,
        args.uri,
        args.flags,
        args.dname,
        args.resource,
    )?;
    Ok(())
}

pub(crate) fn migrate_finish<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = DomainMigrateFinishArgs::from_cursor(&mut ctx.args)?;
    let conn = require_conn(ctx.session)?;

    let ddom = ScopedDomain::new(
        ctx.hv,
        ctx.hv
            .domain_migrate_finish(conn, args.dname, args.cookie, args.uri, args.flags)?,
    );
    DomainRet {
        dom: DomainRef::from_ident(&*ddom),
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}
