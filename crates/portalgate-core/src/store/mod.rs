// ── Per-client process-lifetime state ──
//
// Both stores are in-memory `DashMap`s keyed by `ClientKey`. Nothing is
// persisted; entries live until the process exits.

pub mod grant_store;
pub mod variant_cache;

pub use grant_store::GrantStore;
pub use variant_cache::{LearnedVariant, VariantCache};
