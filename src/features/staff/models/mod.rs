mod capability_event;
mod staff_member;

pub use capability_event::CapabilityLost;
pub use staff_member::{Capability, StaffMember, StaffRole};
