//! Object payloads
//!
//! A payload is what a slot holds *besides* its refcount. Container payloads
//! store `ObjId`s of their occupants; every stored id represents exactly one
//! strong reference owned by the container (the invariant the destruction
//! cascade relies on).

use refmodel_core::{Kind, ObjId};

/// One key/value entry of a map payload
///
/// The key's payload hash is cached at insertion time so lookups can skip
/// the value-equality probe for non-colliding entries. Keys are scalars and
/// scalars are immutable, so the cache never goes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    /// Cached hash of the key payload
    pub hash: u64,
    /// Stored key (one strong reference)
    pub key: ObjId,
    /// Stored value (one strong reference)
    pub value: ObjId,
}

/// Payload of a live object
#[derive(Debug, Clone)]
pub enum Payload {
    /// Uniquely tagged string scalar. Owns nothing.
    Str(String),
    /// Fixed-length sequence of slots; `None` is an empty slot.
    FixedSeq(Box<[Option<ObjId>]>),
    /// Growable sequence of slots; `None` is an empty slot left by a
    /// replace-with-empty.
    GrowSeq(Vec<Option<ObjId>>),
    /// Associative map; entry order is an implementation detail.
    Map(Vec<MapEntry>),
    /// Composite record: two string fields plus a plain integer.
    Record {
        /// First string field (one strong reference)
        first: ObjId,
        /// Second string field (one strong reference)
        last: ObjId,
        /// Plain data, no ownership effect
        number: i64,
    },
}

impl Payload {
    /// Kind discriminator for this payload.
    pub fn kind(&self) -> Kind {
        match self {
            Payload::Str(_) => Kind::Str,
            Payload::FixedSeq(_) => Kind::FixedSeq,
            Payload::GrowSeq(_) => Kind::GrowSeq,
            Payload::Map(_) => Kind::Map,
            Payload::Record { .. } => Kind::Record,
        }
    }

    /// Every strong reference this payload owns, in deterministic order.
    ///
    /// Used by the destruction cascade; the returned ids are released exactly
    /// once each when the owning object dies.
    pub fn owned_refs(&self) -> Vec<ObjId> {
        match self {
            Payload::Str(_) => Vec::new(),
            Payload::FixedSeq(slots) => slots.iter().flatten().copied().collect(),
            Payload::GrowSeq(slots) => slots.iter().flatten().copied().collect(),
            Payload::Map(entries) => entries
                .iter()
                .flat_map(|e| [e.key, e.value])
                .collect(),
            Payload::Record { first, last, .. } => vec![*first, *last],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(Payload::Str("x".into()).kind(), Kind::Str);
        assert_eq!(Payload::GrowSeq(Vec::new()).kind(), Kind::GrowSeq);
        assert_eq!(Payload::Map(Vec::new()).kind(), Kind::Map);
    }

    #[test]
    fn owned_refs_skip_empty_slots() {
        let a = ObjId::from_raw(1, 0);
        let b = ObjId::from_raw(2, 0);
        let seq = Payload::FixedSeq(vec![Some(a), None, Some(b)].into_boxed_slice());
        assert_eq!(seq.owned_refs(), vec![a, b]);
    }

    #[test]
    fn owned_refs_cover_map_keys_and_values() {
        let k = ObjId::from_raw(1, 0);
        let v = ObjId::from_raw(2, 0);
        let map = Payload::Map(vec![MapEntry { hash: 0, key: k, value: v }]);
        assert_eq!(map.owned_refs(), vec![k, v]);
    }
}
