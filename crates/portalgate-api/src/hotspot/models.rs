// Hotspot API response types
//
// The controller wraps every hotspot response as
// `{ "errorCode": 0, "msg": "Success.", "result": { ... } }`.
// A missing `errorCode` is treated the same as zero.

use serde::Deserialize;
use strum::{AsRefStr, Display};

/// The standard hotspot response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotEnvelope<T> {
    pub error_code: Option<i64>,
    pub msg: Option<String>,
    pub result: Option<T>,
}

impl<T> HotspotEnvelope<T> {
    /// `true` when the controller reported no application-level error.
    pub fn is_success(&self) -> bool {
        self.error_code.is_none_or(|code| code == 0)
    }
}

/// `result` payload of a successful operator login.
#[derive(Debug, Deserialize)]
pub struct LoginResult {
    pub token: Option<String>,
}

/// Field name the operator login endpoint expects for the account name.
///
/// Firmware versions disagree, so login tries each in [`CredentialKey::ALL`]
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum CredentialKey {
    Name,
    Username,
}

impl CredentialKey {
    pub const ALL: [Self; 2] = [Self::Name, Self::Username];
}
