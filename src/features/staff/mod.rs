pub mod models;
pub mod services;

pub use services::{CapabilityListener, Directory, PgDirectory};
