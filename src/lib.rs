//! Civic report lifecycle and assignment engine.
//!
//! - `features::reports`: state machine, routing and capability reconciliation
//! - `features::staff`: staff directory and capability-change events
//! - `features::notifications`: in-app and e-mail fan-out of state changes

pub mod core;
pub mod features;
pub mod modules;
pub mod shared;
