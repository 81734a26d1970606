// ── Authorization payload types ──
//
// A `CandidatePayload` is one guess at the field set the controller's
// ext-portal endpoint wants. A `TimeEncoding` decides how the grant length
// is attached before sending; exactly one time field goes out per request.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Controller `authType` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthType(pub u8);

impl AuthType {
    /// Trial order used by the variant search.
    pub const CANDIDATES: [Self; 3] = [Self(4), Self(8), Self(1)];

    pub fn code(self) -> u8 {
        self.0
    }
}

/// How the grant length is expressed on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum TimeEncoding {
    /// `duration`: seconds from now.
    #[serde(rename = "duration")]
    #[strum(serialize = "duration")]
    Duration,
    /// `time`: absolute expiry in microseconds since the epoch.
    #[serde(rename = "time")]
    #[strum(serialize = "time")]
    AbsoluteTime,
}

impl TimeEncoding {
    /// Order in which the brute-force search tries both encodings.
    pub fn trial_order(prefer_duration: bool) -> [Self; 2] {
        if prefer_duration {
            [Self::Duration, Self::AbsoluteTime]
        } else {
            [Self::AbsoluteTime, Self::Duration]
        }
    }

    /// The time field for a grant of `seconds` starting at `now` (epoch seconds).
    pub fn field(self, now: i64, seconds: u64) -> TimeField {
        match self {
            Self::Duration => TimeField::Duration(seconds),
            Self::AbsoluteTime => {
                let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
                TimeField::Time(now.saturating_add(seconds).saturating_mul(1_000_000))
            }
        }
    }
}

/// The single time field attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeField {
    Duration(u64),
    Time(i64),
}

/// One candidate request body, without its time field.
///
/// Optional fields are omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePayload {
    pub client_mac: String,
    pub site: String,
    pub auth_type: AuthType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radio_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ap_mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid_name: Option<String>,
}

impl CandidatePayload {
    /// Attach a time field, producing the body that goes on the wire.
    pub fn with_time(&self, time: TimeField) -> TimedPayload<'_> {
        TimedPayload { base: self, time }
    }
}

/// A candidate plus exactly one time field.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimedPayload<'a> {
    #[serde(flatten)]
    pub base: &'a CandidatePayload,
    #[serde(flatten)]
    pub time: TimeField,
}
