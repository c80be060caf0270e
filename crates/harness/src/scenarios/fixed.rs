//! Fixed-sequence scenarios
//!
//! The stealing `replace`, its consumption-on-failure policy, the raw
//! unchecked write with its documented leak, and the `pack` constructor.

use crate::scenario::{Phase, Scenario, ScenarioCtx};
use refmodel_containers::fixed;
use refmodel_core::{Error, Result};

/// Suite registration.
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario { name: "fixed_replace_steals", run: replace_steals },
        Scenario { name: "fixed_replace_steals_displacing", run: replace_steals_displacing },
        Scenario { name: "fixed_replace_with_same_value", run: replace_with_same_value },
        Scenario { name: "fixed_replace_empty_with_null", run: replace_empty_with_null },
        Scenario { name: "fixed_replace_null_then_value", run: replace_null_then_value },
        Scenario { name: "fixed_replace_fails_wrong_kind", run: replace_fails_wrong_kind },
        Scenario { name: "fixed_replace_fails_out_of_range", run: replace_fails_out_of_range },
        Scenario { name: "fixed_replace_rejects_finalized", run: replace_rejects_finalized },
        Scenario { name: "fixed_unchecked_replace_steals", run: unchecked_replace_steals },
        Scenario { name: "fixed_unchecked_replace_leaks_displaced", run: unchecked_replace_leaks_displaced },
        Scenario { name: "fixed_unchecked_replace_with_same_value", run: unchecked_replace_with_same_value },
        Scenario { name: "fixed_pack_acquires_arguments", run: pack_acquires_arguments },
    ]
}

/// A successful replace transfers ownership without touching the count.
fn replace_steals(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);
    let value = ctx.alloc("value");
    ctx.expect_refcount(seq, 1);
    ctx.expect_refcount(value, 1);

    ctx.begin(Phase::Act);
    fixed::replace(ctx.heap_mut(), seq, 0, Some(value))?;
    ctx.disown(value); // stolen: the sequence owns it now

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(value, 1);
    let slot = fixed::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(value));
    Ok(())
}

/// Replacing an occupied slot releases the displaced occupant once.
fn replace_steals_displacing(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);
    let first = ctx.alloc("first");

    ctx.begin(Phase::Act);
    fixed::replace(ctx.heap_mut(), seq, 0, Some(first))?;
    ctx.disown(first);
    ctx.expect_refcount(first, 1);

    let second = ctx.alloc("second");
    // Preserve both so the displacement and the container teardown stay
    // observable.
    ctx.heap_mut().acquire(first)?;
    ctx.own(first);
    ctx.heap_mut().acquire(second)?;
    ctx.own(second);
    ctx.expect_refcount(first, 2);
    ctx.expect_refcount(second, 2);

    fixed::replace(ctx.heap_mut(), seq, 0, Some(second))?;
    ctx.disown(second);

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(second, 2); // sequence + preserved caller reference
    ctx.expect_refcount(first, 1); // displaced: released by the sequence
    let slot = fixed::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(second));
    Ok(())
}

/// Replacing a slot with its current occupant fires the displaced-value
/// release on the occupant itself. Here a preserved reference keeps the
/// object alive so the extra decrement is visible; the sole-owner case is a
/// hazard scenario.
fn replace_with_same_value(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    fixed::replace(ctx.heap_mut(), seq, 0, Some(value))?;
    ctx.disown(value);
    ctx.expect_refcount(value, 1);

    // Preserve the value to track the bad behaviour.
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);
    ctx.expect_refcount(value, 2);

    fixed::replace(ctx.heap_mut(), seq, 0, Some(value))?;
    ctx.disown(value);

    ctx.begin(Phase::Assert);
    // Down one more than a store should cost: alive only because of the
    // preserved reference.
    ctx.expect_refcount(value, 1);
    let slot = fixed::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(value));
    // Hand the remaining count to the teardown so the sequence's release is
    // the one that destroys it.
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);
    Ok(())
}

/// Clearing an already-empty slot is legal and releases nothing.
fn replace_empty_with_null(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);

    ctx.begin(Phase::Act);
    fixed::replace(ctx.heap_mut(), seq, 0, None)?;

    ctx.begin(Phase::Assert);
    let slot = fixed::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, None);
    Ok(())
}

/// A cleared slot accepts a later steal with no phantom displaced release.
fn replace_null_then_value(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);

    ctx.begin(Phase::Act);
    fixed::replace(ctx.heap_mut(), seq, 0, None)?;

    let value = ctx.alloc("value");
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);
    ctx.expect_refcount(value, 2);

    fixed::replace(ctx.heap_mut(), seq, 0, Some(value))?;
    ctx.disown(value);

    ctx.begin(Phase::Assert);
    // No previous occupant, so nothing was released: sequence + caller.
    ctx.expect_refcount(value, 2);
    Ok(())
}

/// Wrong container kind: the error is signaled *and* the incoming value is
/// consumed anyway.
fn replace_fails_wrong_kind(ctx: &mut ScenarioCtx) -> Result<()> {
    let target = ctx.new_grow(1);
    let value = ctx.alloc("value");
    // Hold a second reference so the consumed one is observable.
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);
    ctx.expect_refcount(value, 2);

    ctx.begin(Phase::Act);
    let result = fixed::replace(ctx.heap_mut(), target, 0, Some(value));
    ctx.disown(value); // consumed on failure

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "replace on growable target",
        result,
        &Error::type_mismatch("fixed::replace", "FixedSeq", "GrowSeq"),
    );
    ctx.expect_refcount(value, 1);
    Ok(())
}

/// Out-of-range slot: same consumption-on-failure behavior.
fn replace_fails_out_of_range(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);
    let value = ctx.alloc("value");
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);
    ctx.expect_refcount(value, 2);

    ctx.begin(Phase::Act);
    let result = fixed::replace(ctx.heap_mut(), seq, 1, Some(value));
    ctx.disown(value);

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "replace past the end",
        result,
        &Error::IndexOutOfRange { index: 1, len: 1 },
    );
    ctx.expect_refcount(value, 1);
    Ok(())
}

/// A shared (finalized) sequence rejects replace through the kind-mismatch
/// channel, still consuming the value.
fn replace_rejects_finalized(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);
    ctx.heap_mut().acquire(seq)?;
    ctx.own(seq); // shared: no longer exclusively owned
    let value = ctx.alloc("value");
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);

    ctx.begin(Phase::Act);
    let result = fixed::replace(ctx.heap_mut(), seq, 0, Some(value));
    ctx.disown(value);

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "replace on shared sequence",
        result,
        &Error::type_mismatch("fixed::replace", "FixedSeq", "shared FixedSeq (finalized)"),
    );
    ctx.expect_refcount(value, 1);
    let slot = fixed::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0 unchanged", slot, None);
    Ok(())
}

/// The unchecked write transfers ownership exactly like the checked one.
fn unchecked_replace_steals(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    fixed::replace_unchecked(ctx.heap_mut(), seq, 0, Some(value));
    ctx.disown(value);

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(value, 1);
    let slot = fixed::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(value));
    Ok(())
}

/// The unchecked write abandons the displaced occupant: its reference is
/// never released and the object outlives every owner. Documented leak.
fn unchecked_replace_leaks_displaced(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);
    let first = ctx.alloc("first");

    ctx.begin(Phase::Act);
    fixed::replace_unchecked(ctx.heap_mut(), seq, 0, Some(first));
    ctx.disown(first);
    ctx.expect_refcount(first, 1);

    let second = ctx.alloc("second");
    fixed::replace_unchecked(ctx.heap_mut(), seq, 0, Some(second));
    ctx.disown(second);

    ctx.begin(Phase::Assert);
    // The displaced occupant still counts the reference nobody will release.
    ctx.expect_refcount(first, 1);
    ctx.expect_refcount(second, 1);
    let slot = fixed::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(second));
    ctx.expect_leaked(1);
    Ok(())
}

/// Because the unchecked write releases nothing, writing the current
/// occupant back is harmless.
fn unchecked_replace_with_same_value(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_fixed(1);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    fixed::replace_unchecked(ctx.heap_mut(), seq, 0, Some(value));
    ctx.disown(value);
    ctx.expect_refcount(value, 1);

    fixed::replace_unchecked(ctx.heap_mut(), seq, 0, Some(value));

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(value, 1);
    let slot = fixed::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(value));
    // Let the teardown watch the sequence release the final reference.
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);
    Ok(())
}

/// `pack` is the borrowed constructor: every argument is acquired and the
/// caller's references stay valid.
fn pack_acquires_arguments(ctx: &mut ScenarioCtx) -> Result<()> {
    let a = ctx.alloc("a");
    let b = ctx.alloc("b");

    ctx.begin(Phase::Act);
    let seq = fixed::pack(ctx.heap_mut(), &[a, b])?;
    ctx.own(seq);

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(a, 2);
    ctx.expect_refcount(b, 2);
    ctx.expect_eq("length", fixed::len(ctx.heap(), seq)?, 2);
    let slot0 = fixed::get(ctx.heap(), seq, 0)?;
    let slot1 = fixed::get(ctx.heap(), seq, 1)?;
    ctx.expect_eq("slot 0", slot0, Some(a));
    ctx.expect_eq("slot 1", slot1, Some(b));
    Ok(())
}
