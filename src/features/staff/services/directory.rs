use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::core::error::{AppError, Result};
use crate::features::reports::models::Office;
use crate::features::staff::models::{Capability, StaffMember, StaffRole};

/// Read-only lookup of staff members and their office capabilities
#[async_trait]
pub trait Directory: Send + Sync {
    /// Fails `NotFound` for an unknown staff id
    async fn get_member(&self, id: i64) -> Result<StaffMember>;

    /// Active members holding an assignment-eligible role for `office`, ordered by id
    async fn find_eligible(&self, office: Office) -> Result<Vec<StaffMember>>;
}

/// One member row joined with at most one capability
#[derive(Debug, FromRow)]
struct MemberCapabilityRow {
    id: i64,
    name: String,
    email: String,
    active: bool,
    role: Option<StaffRole>,
    office: Option<Office>,
}

/// Fold joined rows (ordered by member id) back into members
fn group_members(rows: Vec<MemberCapabilityRow>) -> Vec<StaffMember> {
    let mut members: Vec<StaffMember> = Vec::new();

    for row in rows {
        let capability = match (row.role, row.office) {
            (Some(role), Some(office)) => Some(Capability::new(role, office)),
            _ => None,
        };

        match members.last_mut() {
            Some(last) if last.id == row.id => last.capabilities.extend(capability),
            _ => members.push(StaffMember {
                id: row.id,
                name: row.name,
                email: row.email,
                active: row.active,
                capabilities: capability.into_iter().collect(),
            }),
        }
    }

    members
}

/// Postgres-backed directory over `staff_members` / `staff_capabilities`
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn get_member(&self, id: i64) -> Result<StaffMember> {
        let rows = sqlx::query_as::<_, MemberCapabilityRow>(
            r#"
            SELECT m.id, m.name, m.email, m.active, c.role, c.office
            FROM staff_members m
            LEFT JOIN staff_capabilities c ON c.staff_id = m.id
            WHERE m.id = $1
            ORDER BY m.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get staff member: {:?}", e);
            AppError::Database(e)
        })?;

        group_members(rows)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Staff member {} not found", id)))
    }

    async fn find_eligible(&self, office: Office) -> Result<Vec<StaffMember>> {
        let rows = sqlx::query_as::<_, MemberCapabilityRow>(
            r#"
            SELECT m.id, m.name, m.email, m.active, c.role, c.office
            FROM staff_members m
            JOIN staff_capabilities c ON c.staff_id = m.id
            WHERE m.active
            AND m.id IN (SELECT staff_id FROM staff_capabilities WHERE office = $1)
            ORDER BY m.id
            "#,
        )
        .bind(office)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find eligible staff: {:?}", e);
            AppError::Database(e)
        })?;

        let eligible: Vec<StaffMember> = group_members(rows)
            .into_iter()
            .filter(|m| m.is_eligible_for(office))
            .collect();

        tracing::debug!(
            "Directory found {} eligible staff for office {}",
            eligible.len(),
            office
        );

        Ok(eligible)
    }
}
