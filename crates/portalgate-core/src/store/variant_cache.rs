// ── Learned variant cache ──
//
// Remembers, per client, the payload shape and time encoding that last
// got an authorization through. A miss or a stale hit costs a brute-force
// search; a good hit costs one call.

use dashmap::DashMap;
use serde::Serialize;

use crate::model::{CandidatePayload, ClientKey, TimeEncoding};

/// A previously accepted payload shape, stored without its time field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnedVariant {
    pub payload: CandidatePayload,
    pub encoding: TimeEncoding,
}

/// Per-client memory of the last working variant.
///
/// No eviction: a failing entry stays until a later success overwrites it.
#[derive(Debug, Default)]
pub struct VariantCache {
    entries: DashMap<ClientKey, LearnedVariant>,
}

impl VariantCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ClientKey) -> Option<LearnedVariant> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn set(&self, key: ClientKey, payload: CandidatePayload, encoding: TimeEncoding) {
        self.entries
            .insert(key, LearnedVariant { payload, encoding });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
