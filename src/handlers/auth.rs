//! The authentication procedures and the SASL state machine.
//!
//! State lives on the session: `Pending` until `AUTH_SASL_INIT` creates
//! the context (`Negotiating`), then `AUTH_SASL_START`/`AUTH_SASL_STEP`
//! rounds run until the library completes (`Authorized`) or anything goes
//! wrong, which destroys the context and returns the session to
//! `Pending`. Failure replies are uniform; detail goes to the log only.

use tracing::{debug, warn};

use crate::{
    handlers::{CallContext, HandlerError},
    hypervisor::Hypervisor,
    limits::REMOTE_AUTH_SASL_DATA_MAX,
    proto::{AuthListRet, AuthSaslInitRet, AuthSaslRet, AuthSaslStartArgs, AuthSaslStepArgs,
        ErrorRecord},
    sasl::{SaslBackend, SaslSession, SaslStep},
    session::{AuthState, AuthType},
};

/// Service name registered with the SASL library.
const SASL_SERVICE: &str = "virtd";

fn fail_auth() -> HandlerError {
    HandlerError::Dispatch(ErrorRecord::auth_failed())
}

pub(crate) fn list<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    AuthListRet {
        types: vec![ctx.session.advertised_auth as i32],
    }
    .serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn sasl_init<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    if ctx.session.advertised_auth != AuthType::Sasl {
        warn!("client requested SASL auth but it is not offered");
        return Err(fail_auth());
    }
    if !matches!(ctx.session.auth, AuthState::Pending) {
        warn!("SASL init on a session that is negotiating or authorized");
        return Err(fail_auth());
    }

    let local = ctx.session.sasl_local_addr();
    let remote = ctx.session.sasl_remote_addr();

    let sasl = match ctx
        .sasl
        .new_session(SASL_SERVICE, local.as_deref(), remote.as_deref())
    {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "creating SASL context");
            return Err(fail_auth());
        }
    };

    let mechlist = match sasl.mechanism_list() {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "listing SASL mechanisms");
            return Err(fail_auth());
        }
    };

    debug!(mechlist = %mechlist, "SASL negotiation started");
    ctx.session.auth = AuthState::Negotiating(sasl);

    AuthSaslInitRet { mechlist }.serialise_into(&mut ctx.reply)?;
    Ok(())
}

pub(crate) fn sasl_start<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = AuthSaslStartArgs::from_cursor(&mut ctx.args)?;

    let AuthState::Negotiating(sasl) = &mut ctx.session.auth else {
        warn!("SASL start without init");
        return Err(fail_auth());
    };

    match sasl.start(args.mech, args.data) {
        Ok(step) => finish_round(ctx, step),
        Err(e) => {
            warn!(mech = %args.mech, error = %e, "SASL start rejected");
            ctx.session.auth = AuthState::Pending;
            Err(fail_auth())
        }
    }
}

pub(crate) fn sasl_step<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
) -> Result<(), HandlerError> {
    let args = AuthSaslStepArgs::from_cursor(&mut ctx.args)?;

    let AuthState::Negotiating(sasl) = &mut ctx.session.auth else {
        warn!("SASL step without start");
        return Err(fail_auth());
    };

    match sasl.step(args.data) {
        Ok(step) => finish_round(ctx, step),
        Err(e) => {
            warn!(error = %e, "SASL step rejected");
            ctx.session.auth = AuthState::Pending;
            Err(fail_auth())
        }
    }
}

/// Encodes one round's outcome, moving the session to `Authorized` when
/// the library reports completion.
fn finish_round<H: Hypervisor, S: SaslBackend>(
    ctx: &mut CallContext<'_, H, S>,
    step: SaslStep,
) -> Result<(), HandlerError> {
    // An oversize server-out payload cannot be framed; the negotiation is
    // unrecoverable.
    if step.data().map_or(0, <[u8]>::len) > REMOTE_AUTH_SASL_DATA_MAX as usize {
        warn!("SASL server-out payload exceeds REMOTE_AUTH_SASL_DATA_MAX");
        ctx.session.auth = AuthState::Pending;
        return Err(fail_auth());
    }

    let ret = match step {
        SaslStep::Continue(data) => AuthSaslRet { complete: 0, data },
        SaslStep::Complete(data) => {
            debug!("client authenticated");
            ctx.session.auth = AuthState::Authorized;
            AuthSaslRet { complete: 1, data }
        }
    };

    ret.serialise_into(&mut ctx.reply)?;
    Ok(())
}
