//! Hazard scenarios (feature-gated)
//!
//! Each scenario here drives a documented misuse of the contracts to its
//! modeled conclusion: an object destroyed while a container still holds its
//! identity, and the use-after-free surfacing when that container is torn
//! down. The real-world counterpart terminates the process, which is why
//! these are compiled only with the `hazard-scenarios` feature and excluded
//! from default runs.
//!
//! The scenarios assert the refcount deltas and the teardown error; they
//! never dereference the dangling slot.

use crate::scenario::{Phase, Scenario, ScenarioCtx};
use refmodel_containers::{fixed, grow};
use refmodel_core::{Error, Result};

/// Suite registration (appended to the default suite by the registry).
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "hazard_fixed_self_replacement_destroys_sole_owner",
            run: fixed_self_replacement_destroys_sole_owner,
        },
        Scenario {
            name: "hazard_grow_self_replacement_destroys_sole_owner",
            run: grow_self_replacement_destroys_sole_owner,
        },
    ]
}

/// Replacing a slot with its sole-owner occupant destroys the occupant
/// before it is re-stored; the slot keeps the dangling identity and the
/// sequence teardown trips over it.
fn fixed_self_replacement_destroys_sole_owner(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    fixed::replace(ctx.heap_mut(), seq, 0, Some(value))?;
    ctx.disown(value); // the slot is now the only owner
    ctx.expect_refcount(value, 1);

    // The misuse: passing a reference the caller no longer owns. The
    // displaced-value release fires on the value itself and destroys it.
    fixed::replace(ctx.heap_mut(), seq, 0, Some(value))?;

    ctx.begin(Phase::Assert);
    ctx.expect_dead(value);
    // The slot still holds the dangling identity (asserted without
    // dereferencing it).
    let slot = fixed::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0 retains identity", slot, Some(value));
    // Tearing the sequence down walks into the dangling occupant.
    ctx.expect_teardown_error(Error::UseAfterFree(value));
    Ok(())
}

/// The same hazard through the growable sequence's checked replace.
fn grow_self_replacement_destroys_sole_owner(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(1);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    grow::replace(ctx.heap_mut(), seq, 0, Some(value))?;
    ctx.disown(value);
    ctx.expect_refcount(value, 1);

    grow::replace(ctx.heap_mut(), seq, 0, Some(value))?;

    ctx.begin(Phase::Assert);
    ctx.expect_dead(value);
    let slot = grow::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0 retains identity", slot, Some(value));
    ctx.expect_teardown_error(Error::UseAfterFree(value));
    Ok(())
}
