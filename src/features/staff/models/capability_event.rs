use serde::{Deserialize, Serialize};

use crate::features::reports::models::Office;

/// Raised when a staff member stops being eligible for some or all offices.
///
/// `office: None` means every capability is gone (member deleted or deactivated).
/// The payload shape matches what the database triggers publish via `pg_notify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityLost {
    pub staff_id: i64,
    #[serde(default)]
    pub office: Option<Office>,
}

impl CapabilityLost {
    pub fn office(staff_id: i64, office: Office) -> Self {
        Self {
            staff_id,
            office: Some(office),
        }
    }

    pub fn all(staff_id: i64) -> Self {
        Self {
            staff_id,
            office: None,
        }
    }
}
