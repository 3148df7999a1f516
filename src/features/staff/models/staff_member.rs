use serde::{Deserialize, Serialize};
use sqlx::Type;

use crate::features::reports::models::Office;

/// Staff role matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "staff_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    MunicipalAdministrator,
    MunicipalPublicRelationsOfficer,
    TechnicalOfficeStaff,
    Maintainer,
}

impl StaffRole {
    /// Whether holding this role for an office makes the member a routing candidate
    pub fn is_assignment_eligible(&self) -> bool {
        matches!(self, StaffRole::TechnicalOfficeStaff | StaffRole::Maintainer)
    }

    /// Lower ranks win routing ties; None for roles that never receive reports
    pub fn routing_rank(&self) -> Option<u8> {
        match self {
            StaffRole::TechnicalOfficeStaff => Some(0),
            StaffRole::Maintainer => Some(1),
            StaffRole::MunicipalAdministrator | StaffRole::MunicipalPublicRelationsOfficer => None,
        }
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffRole::MunicipalAdministrator => write!(f, "municipal_administrator"),
            StaffRole::MunicipalPublicRelationsOfficer => {
                write!(f, "municipal_public_relations_officer")
            }
            StaffRole::TechnicalOfficeStaff => write!(f, "technical_office_staff"),
            StaffRole::Maintainer => write!(f, "maintainer"),
        }
    }
}

/// A `(role, office)` pair held by a staff member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability {
    pub role: StaffRole,
    pub office: Office,
}

impl Capability {
    pub fn new(role: StaffRole, office: Office) -> Self {
        Self { role, office }
    }
}

/// Officer or maintainer known to the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub capabilities: Vec<Capability>,
}

impl StaffMember {
    /// Best routing rank this member holds for `office`, if any
    pub fn routing_rank_for(&self, office: Office) -> Option<u8> {
        if !self.active {
            return None;
        }

        self.capabilities
            .iter()
            .filter(|c| c.office == office)
            .filter_map(|c| c.role.routing_rank())
            .min()
    }

    pub fn is_eligible_for(&self, office: Office) -> bool {
        self.routing_rank_for(office).is_some()
    }

    /// Offices this member can currently receive reports for
    pub fn eligible_offices(&self) -> Vec<Office> {
        let mut offices: Vec<Office> = self
            .capabilities
            .iter()
            .filter(|c| self.active && c.role.is_assignment_eligible())
            .map(|c| c.office)
            .collect();
        offices.sort();
        offices.dedup();
        offices
    }
}
