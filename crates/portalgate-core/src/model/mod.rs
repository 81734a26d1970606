// ── Domain model ──

pub mod context;
pub mod grant;
pub mod mac;
pub mod payload;

pub use context::{ClientContext, ClientKey, DEFAULT_SITE};
pub use grant::{GrantRecord, GrantStatus};
pub use mac::MacAddress;
pub use payload::{AuthType, CandidatePayload, TimeEncoding, TimeField, TimedPayload};
