//! Command dispatch: bridges CLI args -> core engine -> output formatting.

pub mod authorize;
pub mod config_cmd;
pub mod login;
pub mod util;
pub mod variants;
