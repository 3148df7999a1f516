mod capability_listener;
mod directory;

pub use capability_listener::CapabilityListener;
pub use directory::{Directory, PgDirectory};
