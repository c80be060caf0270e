//! Container mutation contracts for RefModel
//!
//! Each module pairs a container variant with its mutation operations and
//! spells out, per operation, the reference-ownership contract:
//!
//! | Module | Variant | Flavor |
//! |--------|---------|--------|
//! | [`fixed`] | Fixed-length sequence | `replace` *steals*; failures still consume the incoming value |
//! | [`grow`] | Growable sequence | `replace` steals; `append`/`insert` *acquire* and never consume on failure |
//! | [`map`] | Associative map | `set` acquires key and value; replaced values released, stored keys retained |
//! | [`record`] | Two string fields + integer | setters acquire-then-release; getters hand out fresh strong references |
//!
//! The asymmetry is the point: these are models of an API family whose
//! operations have *distinct, easily-misused* contracts, reproduced here
//! faithfully, hazards included. `fixed::replace` and `grow::replace`
//! deliberately do not special-case replacing a slot with its current
//! occupant, and the unchecked variants deliberately abandon (leak) the
//! displaced occupant. See each module's docs for the exact rules.

pub mod fixed;
pub mod grow;
pub mod map;
pub mod record;
