//! Growable-sequence scenarios
//!
//! Both contract families on one container: the stealing `replace` (with
//! consumption-on-failure) and the acquiring `append`/`insert` (with
//! clamping and no consumption on failure), plus the unchecked write.

use crate::scenario::{Phase, Scenario, ScenarioCtx};
use refmodel_containers::grow;
use refmodel_core::{Error, Result};

/// Suite registration.
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario { name: "grow_replace_steals", run: replace_steals },
        Scenario { name: "grow_replace_steals_displacing", run: replace_steals_displacing },
        Scenario { name: "grow_replace_with_same_value", run: replace_with_same_value },
        Scenario { name: "grow_replace_null_then_value", run: replace_null_then_value },
        Scenario { name: "grow_replace_fails_wrong_kind", run: replace_fails_wrong_kind },
        Scenario { name: "grow_replace_fails_out_of_range", run: replace_fails_out_of_range },
        Scenario { name: "grow_unchecked_replace_leaks_displaced", run: unchecked_replace_leaks_displaced },
        Scenario { name: "grow_unchecked_replace_with_same_value", run: unchecked_replace_with_same_value },
        Scenario { name: "grow_append_acquires", run: append_acquires },
        Scenario { name: "grow_append_then_caller_releases", run: append_then_caller_releases },
        Scenario { name: "grow_append_fails_wrong_kind", run: append_fails_wrong_kind },
        Scenario { name: "grow_append_fails_null", run: append_fails_null },
        Scenario { name: "grow_insert_acquires", run: insert_acquires },
        Scenario { name: "grow_insert_clamps_high_index", run: insert_clamps_high_index },
        Scenario { name: "grow_insert_clamps_negative_index", run: insert_clamps_negative_index },
        Scenario { name: "grow_insert_fails_wrong_kind", run: insert_fails_wrong_kind },
        Scenario { name: "grow_insert_fails_null", run: insert_fails_null },
    ]
}

fn replace_steals(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(1);
    let value = ctx.alloc("value");
    ctx.expect_refcount(seq, 1);
    ctx.expect_refcount(value, 1);

    ctx.begin(Phase::Act);
    grow::replace(ctx.heap_mut(), seq, 0, Some(value))?;
    ctx.disown(value);

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(value, 1);
    let slot = grow::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(value));
    Ok(())
}

fn replace_steals_displacing(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(1);
    let first = ctx.alloc("first");

    ctx.begin(Phase::Act);
    grow::replace(ctx.heap_mut(), seq, 0, Some(first))?;
    ctx.disown(first);

    let second = ctx.alloc("second");
    ctx.heap_mut().acquire(first)?;
    ctx.own(first);
    ctx.heap_mut().acquire(second)?;
    ctx.own(second);

    grow::replace(ctx.heap_mut(), seq, 0, Some(second))?;
    ctx.disown(second);

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(second, 2);
    ctx.expect_refcount(first, 1); // displaced, released once
    let slot = grow::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(second));
    Ok(())
}

fn replace_with_same_value(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(1);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    grow::replace(ctx.heap_mut(), seq, 0, Some(value))?;
    ctx.disown(value);
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);
    ctx.expect_refcount(value, 2);

    grow::replace(ctx.heap_mut(), seq, 0, Some(value))?;
    ctx.disown(value);

    ctx.begin(Phase::Assert);
    // One decrement more than a store should cost.
    ctx.expect_refcount(value, 1);
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);
    Ok(())
}

fn replace_null_then_value(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(1);

    ctx.begin(Phase::Act);
    grow::replace(ctx.heap_mut(), seq, 0, None)?;
    let value = ctx.alloc("value");
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);
    grow::replace(ctx.heap_mut(), seq, 0, Some(value))?;
    ctx.disown(value);

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(value, 2);
    ctx.expect_eq("length", grow::len(ctx.heap(), seq)?, 1);
    Ok(())
}

fn replace_fails_wrong_kind(ctx: &mut ScenarioCtx) -> Result<()> {
    let target = ctx.new_fixed(1);
    let value = ctx.alloc("value");
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);

    ctx.begin(Phase::Act);
    let result = grow::replace(ctx.heap_mut(), target, 0, Some(value));
    ctx.disown(value); // consumed on failure

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "replace on fixed target",
        result,
        &Error::type_mismatch("grow::replace", "GrowSeq", "FixedSeq"),
    );
    ctx.expect_refcount(value, 1);
    Ok(())
}

fn replace_fails_out_of_range(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(1);
    let value = ctx.alloc("value");
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);

    ctx.begin(Phase::Act);
    let result = grow::replace(ctx.heap_mut(), seq, 1, Some(value));
    ctx.disown(value);

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "replace past the end",
        result,
        &Error::IndexOutOfRange { index: 1, len: 1 },
    );
    ctx.expect_refcount(value, 1);
    ctx.expect_eq("length unchanged", grow::len(ctx.heap(), seq)?, 1);
    Ok(())
}

fn unchecked_replace_leaks_displaced(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(1);
    let first = ctx.alloc("first");

    ctx.begin(Phase::Act);
    grow::replace_unchecked(ctx.heap_mut(), seq, 0, Some(first));
    ctx.disown(first);
    let second = ctx.alloc("second");
    grow::replace_unchecked(ctx.heap_mut(), seq, 0, Some(second));
    ctx.disown(second);

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(first, 1); // abandoned in place
    let slot = grow::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(second));
    ctx.expect_leaked(1);
    Ok(())
}

fn unchecked_replace_with_same_value(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(1);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    grow::replace_unchecked(ctx.heap_mut(), seq, 0, Some(value));
    ctx.disown(value);
    grow::replace_unchecked(ctx.heap_mut(), seq, 0, Some(value));

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(value, 1);
    ctx.heap_mut().acquire(value)?;
    ctx.own(value);
    Ok(())
}

fn append_acquires(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(0);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    grow::append(ctx.heap_mut(), seq, Some(value))?;

    ctx.begin(Phase::Assert);
    // The sequence acquired; the caller's reference is untouched.
    ctx.expect_refcount(value, 2);
    ctx.expect_eq("length", grow::len(ctx.heap(), seq)?, 1);
    let slot = grow::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(value));
    Ok(())
}

/// The append-then-release idiom: the caller hands its own reference back
/// and the sequence remains the sole owner.
fn append_then_caller_releases(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(0);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    grow::append(ctx.heap_mut(), seq, Some(value))?;
    ctx.expect_refcount(value, 2);
    ctx.heap_mut().release(value)?;
    ctx.disown(value);

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(value, 1);
    let slot = grow::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(value));
    Ok(())
}

fn append_fails_wrong_kind(ctx: &mut ScenarioCtx) -> Result<()> {
    let target = ctx.new_fixed(1);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    let result = grow::append(ctx.heap_mut(), target, Some(value));

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "append on fixed target",
        result,
        &Error::type_mismatch("grow::append", "GrowSeq", "FixedSeq"),
    );
    // Nothing consumed.
    ctx.expect_refcount(value, 1);
    Ok(())
}

fn append_fails_null(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(0);

    ctx.begin(Phase::Act);
    let result = grow::append(ctx.heap_mut(), seq, None);

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "append with absent value",
        result,
        &Error::NullArgument { op: "grow::append" },
    );
    ctx.expect_eq("length unchanged", grow::len(ctx.heap(), seq)?, 0);
    Ok(())
}

fn insert_acquires(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(0);
    let value = ctx.alloc("value");
    ctx.expect_eq("length before", grow::len(ctx.heap(), seq)?, 0);

    ctx.begin(Phase::Act);
    grow::insert(ctx.heap_mut(), seq, 0, Some(value))?;

    ctx.begin(Phase::Assert);
    ctx.expect_eq("length", grow::len(ctx.heap(), seq)?, 1);
    ctx.expect_refcount(value, 2);
    let slot = grow::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(value));
    Ok(())
}

/// Insert at 4 into an empty sequence actually inserts at 0.
fn insert_clamps_high_index(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(0);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    grow::insert(ctx.heap_mut(), seq, 4, Some(value))?;

    ctx.begin(Phase::Assert);
    ctx.expect_eq("length", grow::len(ctx.heap(), seq)?, 1);
    ctx.expect_refcount(value, 2);
    let slot = grow::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", slot, Some(value));
    Ok(())
}

/// Insert at −1 actually inserts at 0.
fn insert_clamps_negative_index(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(0);
    let resident = ctx.alloc("resident");
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    grow::append(ctx.heap_mut(), seq, Some(resident))?;
    grow::insert(ctx.heap_mut(), seq, -1, Some(value))?;

    ctx.begin(Phase::Assert);
    ctx.expect_eq("length", grow::len(ctx.heap(), seq)?, 2);
    ctx.expect_refcount(value, 2);
    ctx.expect_refcount(resident, 2); // shifted, not released
    let front = grow::get(ctx.heap(), seq, 0)?;
    ctx.expect_eq("slot 0", front, Some(value));
    let back = grow::get(ctx.heap(), seq, 1)?;
    ctx.expect_eq("slot 1", back, Some(resident));
    Ok(())
}

fn insert_fails_wrong_kind(ctx: &mut ScenarioCtx) -> Result<()> {
    let target = ctx.new_fixed(1);
    let value = ctx.alloc("value");

    ctx.begin(Phase::Act);
    let result = grow::insert(ctx.heap_mut(), target, 1, Some(value));

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "insert on fixed target",
        result,
        &Error::type_mismatch("grow::insert", "GrowSeq", "FixedSeq"),
    );
    ctx.expect_refcount(value, 1);
    Ok(())
}

fn insert_fails_null(ctx: &mut ScenarioCtx) -> Result<()> {
    let seq = ctx.new_grow(1);

    ctx.begin(Phase::Act);
    let result = grow::insert(ctx.heap_mut(), seq, 1, None);

    ctx.begin(Phase::Assert);
    ctx.expect_err(
        "insert with absent value",
        result,
        &Error::NullArgument { op: "grow::insert" },
    );
    ctx.expect_eq("length unchanged", grow::len(ctx.heap(), seq)?, 1);
    Ok(())
}
