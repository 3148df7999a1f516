/// Subject line prefix for report status e-mails
pub const STATUS_EMAIL_SUBJECT_PREFIX: &str = "Update on your report";

/// Delay before a capability listener retries after a connection error
pub const LISTENER_RECONNECT_DELAY_SECS: u64 = 5;
