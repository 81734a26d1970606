// ── Client grant store ──
//
// Per-client expiry and seat timing. The negotiation engine records long
// grants here; the portal's status, seat-selection and reveal endpoints
// read and write the same records through the helpers below.

use dashmap::DashMap;

use crate::model::{ClientKey, GrantRecord, GrantStatus};

/// Lazily populated map of [`GrantRecord`]s.
#[derive(Debug, Default)]
pub struct GrantStore {
    records: DashMap<ClientKey, GrantRecord>,
}

impl GrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the record for `key`, creating an empty one if needed.
    pub fn entry(&self, key: &ClientKey) -> GrantRecord {
        *self.records.entry(key.clone()).or_default()
    }

    /// Mutate the record for `key` in place, creating it if needed.
    pub fn update<R>(&self, key: &ClientKey, f: impl FnOnce(&mut GrantRecord) -> R) -> R {
        let mut record = self.records.entry(key.clone()).or_default();
        f(&mut record)
    }

    /// Mark a long-lived grant of `seconds` starting at `now`. Returns the expiry.
    pub fn record_long_grant(&self, key: &ClientKey, now: i64, seconds: u64) -> i64 {
        let until = now.saturating_add(i64::try_from(seconds).unwrap_or(i64::MAX));
        self.update(key, |record| record.long_until = until);
        until
    }

    /// Record the kiosk seat choice at `now`.
    pub fn choose_seat(&self, key: &ClientKey, now: i64) {
        self.update(key, |record| {
            record.seat_chosen = true;
            record.seat_at = now;
        });
    }

    /// Seconds left before the seat assignment may be revealed.
    ///
    /// The full delay until a seat is chosen, then counting down to zero.
    pub fn reveal_left(&self, key: &ClientKey, now: i64, reveal_delay_secs: u64) -> u64 {
        let record = self.entry(key);
        if record.seat_at <= 0 {
            return reveal_delay_secs;
        }
        let elapsed = u64::try_from(now.saturating_sub(record.seat_at)).unwrap_or(0);
        reveal_delay_secs.saturating_sub(elapsed)
    }

    /// Whether the client holds an unexpired long grant at `now`.
    pub fn status(&self, key: &ClientKey, now: i64) -> GrantStatus {
        let record = self.entry(key);
        if record.long_until > now {
            GrantStatus::Authorized {
                expires: record.long_until,
            }
        } else {
            GrantStatus::Unauthorized
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
