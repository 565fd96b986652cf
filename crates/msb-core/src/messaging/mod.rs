//! Outbound messaging: the transport port, typed payloads and the reply helper
//! command handlers use.

pub mod port;
pub mod responder;
pub mod types;
