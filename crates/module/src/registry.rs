//! Domain registry handlers.
//!
//! Names are permanent once claimed: records are created here and never
//! deleted. Only `resolve_target` changes afterwards, and only at the owner's
//! request.

use registrar_types::{normalize, to_hex, Address, NameId, RegistryRecord, ZERO_ADDRESS};

use crate::error::RegistrarError;
use crate::events::RegistrarEvent;
use crate::handlers::{CallContext, HandlerResult};
use crate::state::RegistrarState;

/// Handle Register call.
pub fn handle_register(
    state: &mut RegistrarState,
    ctx: &CallContext,
    name: &str,
    owner: Address,
) -> HandlerResult<NameId> {
    state.registry.guard.ensure_not_paused()?;

    let name = normalize(name)?;
    let id = name.id();
    create_record(state, ctx, id, owner, name.to_string())?;

    Ok(id)
}

/// Register a bare name id on behalf of an auction winner.
///
/// Skips name validation; the event carries an empty name.
pub(crate) fn register_by_hash(
    state: &mut RegistrarState,
    ctx: &CallContext,
    id: NameId,
    owner: Address,
) -> HandlerResult<()> {
    state.registry.guard.ensure_not_paused()?;
    create_record(state, ctx, id, owner, String::new())
}

fn create_record(
    state: &mut RegistrarState,
    ctx: &CallContext,
    id: NameId,
    owner: Address,
    name: String,
) -> HandlerResult<()> {
    if state.registry.is_registered(&id) {
        return Err(RegistrarError::NameAlreadyRegistered(id));
    }

    state.registry.records.insert(
        id,
        RegistryRecord {
            owner,
            resolve_target: ZERO_ADDRESS,
            name: name.clone(),
            registered_at: ctx.timestamp,
        },
    );
    state.registry.names.push(id);
    tracing::debug!(id = %to_hex(&id), owner = %to_hex(&owner), name = %name, "name registered");
    state.emit(RegistrarEvent::NameRegistered { id, owner, name });

    Ok(())
}

/// Handle SetResolve call.
pub fn handle_set_resolve(
    state: &mut RegistrarState,
    ctx: &CallContext,
    name: &str,
    target: Address,
) -> HandlerResult<()> {
    state.registry.guard.ensure_not_paused()?;

    let id = normalize(name)?.id();
    let record = state
        .registry
        .records
        .get_mut(&id)
        .ok_or(RegistrarError::DomainNotRegistered(id))?;

    if record.owner != ctx.sender {
        return Err(RegistrarError::NotDomainOwner);
    }

    record.resolve_target = target;
    tracing::debug!(id = %to_hex(&id), target = %to_hex(&target), "resolve target set");
    state.emit(RegistrarEvent::ResolveSet { id, target });

    Ok(())
}
