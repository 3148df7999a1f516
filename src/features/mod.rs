pub mod notifications;
pub mod reports;
pub mod staff;
