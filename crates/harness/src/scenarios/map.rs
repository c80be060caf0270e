//! Associative-map scenarios
//!
//! The acquiring `set` with key retention and value displacement, the two
//! set-default flavors, `pop`'s ownership transfer, and the no-consumption
//! failure policy.

use crate::scenario::{Phase, Scenario, ScenarioCtx};
use refmodel_containers::map;
use refmodel_core::{Error, Result, SetDefaultOutcome};

/// Suite registration.
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario { name: "map_set_acquires_and_replaces", run: set_acquires_and_replaces },
        Scenario { name: "map_set_retains_stored_key_object", run: set_retains_stored_key_object },
        Scenario { name: "map_set_fails_wrong_kind", run: set_fails_wrong_kind },
        Scenario { name: "map_set_fails_unhashable_key", run: set_fails_unhashable_key },
        Scenario { name: "map_set_fails_null_arguments", run: set_fails_null_arguments },
        Scenario { name: "map_set_default_unused", run: set_default_unused },
        Scenario { name: "map_set_default_used", run: set_default_used },
        Scenario { name: "map_set_default_ref_unused", run: set_default_ref_unused },
        Scenario { name: "map_set_default_ref_used", run: set_default_ref_used },
        Scenario { name: "map_set_default_ref_overwrites_out", run: set_default_ref_overwrites_out },
        Scenario { name: "map_set_default_ref_failure_clears_out", run: set_default_ref_failure_clears_out },
        Scenario { name: "map_pop_transfers_value_ownership", run: pop_transfers_value_ownership },
        Scenario { name: "map_pop_absent_key", run: pop_absent_key },
    ]
}

/// The full set/replace/idempotent-re-set sequence: acquire both on insert,
/// release the displaced value on replace, retain the key throughout, and
/// stay net-zero on an identity-equal re-set.
fn set_acquires_and_replaces(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let key = ctx.alloc("key");
    let value_a = ctx.alloc("value-a");

    ctx.begin(Phase::Act);
    map::set(ctx.heap_mut(), m, Some(key), Some(value_a))?;
    ctx.expect_refcount(key, 2);
    ctx.expect_refcount(value_a, 2);
    let got = map::get(ctx.heap(), m, key)?;
    ctx.expect_eq("stored value", got, Some(value_a));

    // Replace the value under the same key.
    let value_b = ctx.alloc("value-b");
    map::set(ctx.heap_mut(), m, Some(key), Some(value_b))?;
    ctx.expect_refcount(key, 2); // key untouched
    ctx.expect_refcount(value_a, 1); // displaced value released
    ctx.expect_refcount(value_b, 2);
    let got = map::get(ctx.heap(), m, key)?;
    ctx.expect_eq("replaced value", got, Some(value_b));

    // Re-set with the identical value object: counts must not move.
    map::set(ctx.heap_mut(), m, Some(key), Some(value_b))?;

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(key, 2);
    ctx.expect_refcount(value_b, 2);
    ctx.expect_eq("length", map::len(ctx.heap(), m)?, 1);
    Ok(())
}

/// A value-equal (but distinct) probe key never displaces the stored key
/// object.
fn set_retains_stored_key_object(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let stored_key = ctx.alloc_exact("shared-key");
    let probe_key = ctx.alloc_exact("shared-key");
    let value_a = ctx.alloc("value-a");
    let value_b = ctx.alloc("value-b");

    ctx.begin(Phase::Act);
    map::set(ctx.heap_mut(), m, Some(stored_key), Some(value_a))?;
    map::set(ctx.heap_mut(), m, Some(probe_key), Some(value_b))?;

    ctx.begin(Phase::Assert);
    ctx.expect_eq("length", map::len(ctx.heap(), m)?, 1);
    ctx.expect_refcount(stored_key, 2); // retained
    ctx.expect_refcount(probe_key, 1); // never stored, never acquired
    ctx.expect_refcount(value_a, 1);
    ctx.expect_refcount(value_b, 2);
    Ok(())
}

fn set_fails_wrong_kind(ctx: &mut ScenarioCtx) -> Result<()> {
    let target = ctx.new_grow(0);
    let key = ctx.alloc("key");
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    let result = map::set(ctx.heap_mut(), target, Some(key), Some(value));

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "set on growable target",
        result,
        &Error::type_mismatch("map::set", "Map", "GrowSeq"),
    );
    // Nothing consumed on failure.
    ctx.expect_refcount(key, 1);
    ctx.expect_refcount(value, 1);
    Ok(())
}

fn set_fails_unhashable_key(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let bad_key = ctx.new_grow(0);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    let result = map::set(ctx.heap_mut(), m, Some(bad_key), Some(value));

    ctx.begin(Phase::Assert);
    ctx.expect_err("set with container key", result, &Error::Unhashable("GrowSeq"));
    ctx.expect_refcount(bad_key, 1);
    ctx.expect_refcount(value, 1);
    ctx.expect_eq("length unchanged", map::len(ctx.heap(), m)?, 0);
    Ok(())
}

fn set_fails_null_arguments(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let key = ctx.alloc("key");

    ctx.begin(Phase::Act);
    let missing_value = map::set(ctx.heap_mut(), m, Some(key), None);
    let missing_key = map::set(ctx.heap_mut(), m, None, None);

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "set with absent value",
        missing_value,
        &Error::NullArgument { op: "map::set" },
    );
    ctx.expect_err(
        "set with absent key",
        missing_key,
        &Error::NullArgument { op: "map::set" },
    );
    ctx.expect_refcount(key, 1);
    ctx.expect_eq("length unchanged", map::len(ctx.heap(), m)?, 0);
    Ok(())
}

/// Present key: the default is not stored and not acquired.
fn set_default_unused(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let key = ctx.alloc("key");
    let value = ctx.alloc("value");
    let default = ctx.alloc("default");

    ctx.begin(Phase::Act);
    map::set(ctx.heap_mut(), m, Some(key), Some(value))?;
    let result = map::set_default(ctx.heap_mut(), m, Some(key), Some(default))?;

    ctx.begin(Phase::Assert);
    ctx.expect_same("returned handle", result, value);
    ctx.expect_refcount(key, 2);
    ctx.expect_refcount(value, 2);
    ctx.expect_refcount(default, 1); // never stored: +1 would be a bug
    ctx.expect_eq("length", map::len(ctx.heap(), m)?, 1);
    Ok(())
}

/// Absent key: the default is stored exactly once (+1, not +2).
fn set_default_used(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let key = ctx.alloc("key");
    let default = ctx.alloc("default");

    ctx.begin(Phase::Act);
    let result = map::set_default(ctx.heap_mut(), m, Some(key), Some(default))?;

    ctx.begin(Phase::Assert);
    ctx.expect_same("returned handle", result, default);
    ctx.expect_eq("length", map::len(ctx.heap(), m)?, 1);
    ctx.expect_refcount(key, 2);
    ctx.expect_refcount(default, 2);
    Ok(())
}

/// Present key: the out-parameter receives a strong reference to the stored
/// value, on top of the map's ownership.
fn set_default_ref_unused(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let key = ctx.alloc("key");
    let value = ctx.alloc("value");
    let default = ctx.alloc("default");

    ctx.begin(Phase::Act);
    map::set(ctx.heap_mut(), m, Some(key), Some(value))?;
    let mut out = None;
    let outcome = map::set_default_ref(ctx.heap_mut(), m, Some(key), Some(default), &mut out)?;
    if let Some(result) = out {
        ctx.own(result); // the out-reference is ours to release
    }

    ctx.begin(Phase::Assert);
    ctx.expect_eq("outcome", outcome, SetDefaultOutcome::Existing);
    ctx.expect_eq("out handle", out, Some(value));
    // caller + map + out-reference
    ctx.expect_refcount(value, 3);
    ctx.expect_refcount(key, 2);
    ctx.expect_refcount(default, 1);
    Ok(())
}

/// Absent key: the default is stored *and* returned strongly: two acquires.
fn set_default_ref_used(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let key = ctx.alloc("key");
    let default = ctx.alloc("default");

    ctx.begin(Phase::Act);
    let mut out = None;
    let outcome = map::set_default_ref(ctx.heap_mut(), m, Some(key), Some(default), &mut out)?;
    if let Some(result) = out {
        ctx.own(result);
    }

    ctx.begin(Phase::Assert);
    ctx.expect_eq("outcome", outcome, SetDefaultOutcome::Inserted);
    ctx.expect_eq("out handle", out, Some(default));
    ctx.expect_refcount(key, 2);
    // caller + stored + out-reference
    ctx.expect_refcount(default, 3);
    Ok(())
}

/// A live object already sitting in the out-parameter is overwritten, not
/// released; managing it stays the caller's job.
fn set_default_ref_overwrites_out(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let key = ctx.alloc("key");
    let value = ctx.alloc("value");
    let default = ctx.alloc("default");
    let bystander = ctx.alloc("bystander");

    ctx.begin(Phase::Act);
    map::set(ctx.heap_mut(), m, Some(key), Some(value))?;
    let mut out = Some(bystander);
    let outcome = map::set_default_ref(ctx.heap_mut(), m, Some(key), Some(default), &mut out)?;
    if let Some(result) = out {
        ctx.own(result);
    }

    ctx.begin(Phase::Assert);
    ctx.expect_eq("outcome", outcome, SetDefaultOutcome::Existing);
    ctx.expect_eq("out handle", out, Some(value));
    // The bystander kept its single (caller) reference: overwritten, not
    // released.
    ctx.expect_refcount(bystander, 1);
    ctx.expect_refcount(value, 3);
    Ok(())
}

fn set_default_ref_failure_clears_out(ctx: &mut ScenarioCtx) -> Result<()> {
    let target = ctx.new_grow(0);
    let key = ctx.alloc("key");
    let default = ctx.alloc("default");
    let bystander = ctx.alloc("bystander");

    ctx.begin(Phase::Act);
    let mut out = Some(bystander);
    let result = map::set_default_ref(ctx.heap_mut(), target, Some(key), Some(default), &mut out);

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "set_default_ref on growable target",
        result,
        &Error::type_mismatch("map::set_default_ref", "Map", "GrowSeq"),
    );
    ctx.expect_eq("out invalidated", out, None);
    ctx.expect_refcount(key, 1);
    ctx.expect_refcount(default, 1);
    ctx.expect_refcount(bystander, 1);
    Ok(())
}

/// Popping hands the stored value reference to the caller and releases the
/// stored key.
fn pop_transfers_value_ownership(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let key = ctx.alloc("key");
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    map::set(ctx.heap_mut(), m, Some(key), Some(value))?;
    ctx.expect_refcount(key, 2);
    ctx.expect_refcount(value, 2);
    let popped = map::pop(ctx.heap_mut(), m, key)?;
    if let Some(result) = popped {
        ctx.own(result); // the map's reference is now ours
    }

    ctx.begin(Phase::Assert);
    ctx.expect_eq("popped handle", popped, Some(value));
    ctx.expect_eq("length", map::len(ctx.heap(), m)?, 0);
    ctx.expect_refcount(key, 1); // stored key released
    ctx.expect_refcount(value, 2); // count unchanged; ownership moved
    Ok(())
}

fn pop_absent_key(ctx: &mut ScenarioCtx) -> Result<()> {
    let m = ctx.new_map();
    let key = ctx.alloc("key");

    ctx.begin(Phase::Act);
    let popped = map::pop(ctx.heap_mut(), m, key)?;

    ctx.begin(Phase::Assert);
    ctx.expect_eq("popped handle", popped, None);
    ctx.expect_refcount(key, 1);
    Ok(())
}
