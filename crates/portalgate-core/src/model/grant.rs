// ── Grant bookkeeping types ──

use serde::{Deserialize, Serialize};

/// Per-client access-expiry and seat-assignment timing.
///
/// All timestamps are epoch seconds; `0` means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    /// Reserved for short-lived grants.
    pub short_until: i64,
    /// When the kiosk seat was chosen.
    pub seat_at: i64,
    /// When the long-lived grant expires.
    pub long_until: i64,
    pub seat_chosen: bool,
}

/// Authorization state reported to the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GrantStatus {
    Authorized { expires: i64 },
    Unauthorized,
}

impl GrantStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized { .. })
    }
}
