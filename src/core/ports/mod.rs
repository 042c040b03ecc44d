//! Directional port definitions for the clean architecture rings.
//! Inbound ports are what the server and CLI drive, outbound ports are the
//! services the application calls out to.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
