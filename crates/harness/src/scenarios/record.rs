//! Record scenarios
//!
//! The composite-object boundary: construct/destroy with field release,
//! strong-reference getters, acquire-then-release setters.

use crate::scenario::{Phase, Scenario, ScenarioCtx};
use refmodel_containers::record;
use refmodel_core::Result;

/// Suite registration.
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario { name: "record_destroy_releases_fields", run: destroy_releases_fields },
        Scenario { name: "record_getter_returns_strong_reference", run: getter_returns_strong_reference },
        Scenario { name: "record_setter_swaps_field_ownership", run: setter_swaps_field_ownership },
        Scenario { name: "record_setter_self_assignment_safe", run: setter_self_assignment_safe },
        Scenario { name: "record_full_name_is_caller_owned", run: full_name_is_caller_owned },
    ]
}

/// Destroying a record releases both field references exactly once.
fn destroy_releases_fields(ctx: &mut ScenarioCtx) -> Result<()> {
    let rec = ctx.new_record();
    let first = record::first(ctx.heap_mut(), rec)?;
    ctx.own(first);
    let last = record::last(ctx.heap_mut(), rec)?;
    ctx.own(last);
    ctx.expect_refcount(first, 2); // record + our getter reference
    ctx.expect_refcount(last, 2);

    ctx.begin(Phase::Act);
    ctx.heap_mut().release(rec)?;
    ctx.disown(rec);

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(first, 1);
    ctx.expect_refcount(last, 1);
    Ok(())
}

fn getter_returns_strong_reference(ctx: &mut ScenarioCtx) -> Result<()> {
    let rec = ctx.new_record();

    ctx.begin(Phase::Act);
    let field = record::first(ctx.heap_mut(), rec)?;
    ctx.own(field);

    ctx.begin(Phase::Assert);
    // The getter acquired on our behalf: record + caller.
    ctx.expect_refcount(field, 2);
    Ok(())
}

fn setter_swaps_field_ownership(ctx: &mut ScenarioCtx) -> Result<()> {
    let rec = ctx.new_record();
    let old = record::first(ctx.heap_mut(), rec)?;
    ctx.own(old);
    let replacement = ctx.alloc_exact("Ada");

    ctx.begin(Phase::Act);
    record::set_first(ctx.heap_mut(), rec, Some(replacement))?;

    ctx.begin(Phase::Assert);
    // Record released the displaced field; only our getter reference is left.
    ctx.expect_refcount(old, 1);
    // Record acquired the replacement; our allocation reference survives.
    ctx.expect_refcount(replacement, 2);
    let current = record::first(ctx.heap_mut(), rec)?;
    ctx.own(current);
    ctx.expect_same("current field", current, replacement);
    Ok(())
}

/// Setting a field to itself must not drop the count through zero: the
/// setter acquires before it releases.
fn setter_self_assignment_safe(ctx: &mut ScenarioCtx) -> Result<()> {
    let rec = ctx.new_record();
    let field = record::first(ctx.heap_mut(), rec)?;
    ctx.own(field);
    ctx.expect_refcount(field, 2);

    ctx.begin(Phase::Act);
    record::set_first(ctx.heap_mut(), rec, Some(field))?;

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(field, 2); // net zero, object alive throughout
    Ok(())
}

fn full_name_is_caller_owned(ctx: &mut ScenarioCtx) -> Result<()> {
    let rec = ctx.new_record();
    let first = ctx.alloc_exact("Ada");
    let last = ctx.alloc_exact("Lovelace");
    record::set_first(ctx.heap_mut(), rec, Some(first))?;
    record::set_last(ctx.heap_mut(), rec, Some(last))?;
    record::set_number(ctx.heap_mut(), rec, 7)?;

    ctx.begin(Phase::Act);
    let name = record::full_name(ctx.heap_mut(), rec)?;
    ctx.own(name);

    ctx.begin(Phase::Assert);
    ctx.expect_refcount(name, 1); // fresh object, caller-owned
    let text = ctx.heap().str_value(name)?.to_string();
    ctx.expect_eq("combined text", text, "Ada Lovelace".to_string());
    ctx.expect_eq("integer field", record::number(ctx.heap(), rec)?, 7);
    Ok(())
}
