//! In-memory collaborators and fixtures for service tests

use async_trait::async_trait;
use chrono::Utc;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, Name};
use fake::Fake;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Mutex;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::notifications::models::{NewNotification, Notification, Recipient};
use crate::features::notifications::{NotificationRepository, NotificationSink};
use crate::features::reports::models::{
    check_assignment_invariant, AssigneeUpdate, CreateReport, Office, Report, ReportState,
};
use crate::features::reports::ReportStore;
use crate::features::staff::models::{Capability, StaffMember};
use crate::features::staff::Directory;
use crate::modules::mail::{Mailer, OutgoingEmail};

pub fn staff_member(id: i64, capabilities: Vec<Capability>) -> StaffMember {
    StaffMember {
        id,
        name: Name().fake(),
        email: SafeEmail().fake(),
        active: true,
        capabilities,
    }
}

/// Report authored by user 100
pub fn report_in_state(
    id: i64,
    category: Office,
    state: ReportState,
    assignee: Option<i64>,
) -> Report {
    Report {
        id,
        title: format!("Report {}", id),
        category,
        state,
        assigned_officer_id: assignee,
        reason: None,
        author_id: Some(100),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn pending_report(id: i64, category: Office, author_id: Option<i64>) -> Report {
    Report {
        author_id,
        ..report_in_state(id, category, ReportState::Pending, None)
    }
}

pub fn recipient(user_id: i64, email_notifications: bool) -> Recipient {
    Recipient {
        user_id,
        first_name: FirstName().fake(),
        email: Some(SafeEmail().fake()),
        email_notifications,
    }
}

// =============================================================================
// REPORT STORE
// =============================================================================

type ConcurrentWrite = Box<dyn FnOnce(&mut Report) + Send>;

#[derive(Default)]
pub struct InMemoryReportStore {
    reports: Mutex<BTreeMap<i64, Report>>,
    interleave: bool,
    concurrent_write: Mutex<Option<ConcurrentWrite>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield after every read so concurrent callers observe the same snapshot
    pub fn with_interleaving(mut self) -> Self {
        self.interleave = true;
        self
    }

    pub fn insert(&self, report: Report) {
        self.reports.lock().unwrap().insert(report.id, report);
    }

    /// Mutate the stored row once, right before the next `transition`
    /// compares it, as if another writer committed in between
    pub fn before_next_transition(&self, write: impl FnOnce(&mut Report) + Send + 'static) {
        *self.concurrent_write.lock().unwrap() = Some(Box::new(write));
    }

    pub fn snapshot(&self, id: i64) -> Option<Report> {
        self.reports.lock().unwrap().get(&id).cloned()
    }

    fn list_where(&self, keep: impl Fn(&Report) -> bool) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap()
            .values()
            .filter(|r| keep(r))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create(&self, data: &CreateReport) -> Result<Report> {
        data.validate()?;

        let mut reports = self.reports.lock().unwrap();
        let id = reports.keys().next_back().map_or(1, |last| last + 1);
        let report = Report {
            title: data.title.clone(),
            ..pending_report(id, data.category.unwrap_or(Office::Other), data.author_id)
        };
        reports.insert(id, report.clone());
        Ok(report)
    }

    async fn get(&self, id: i64) -> Result<Report> {
        let report = self.snapshot(id);
        if self.interleave {
            tokio::task::yield_now().await;
        }
        report.ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }

    async fn transition(
        &self,
        id: i64,
        expected: ReportState,
        expected_assignee: Option<i64>,
        new_state: ReportState,
        assignee: AssigneeUpdate,
        reason: Option<&str>,
    ) -> Result<Report> {
        check_assignment_invariant(expected, new_state, assignee)?;

        let concurrent_write = self.concurrent_write.lock().unwrap().take();
        let mut reports = self.reports.lock().unwrap();
        let report = reports
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        if let Some(write) = concurrent_write {
            write(report);
        }

        if report.state != expected || report.assigned_officer_id != expected_assignee {
            return Err(AppError::Conflict(format!(
                "Report {} is {} but {} (assignee {:?}) was expected",
                id, report.state, expected, expected_assignee
            )));
        }

        report.state = new_state;
        match assignee {
            AssigneeUpdate::Unchanged => {}
            AssigneeUpdate::Set(staff_id) => report.assigned_officer_id = Some(staff_id),
            AssigneeUpdate::Clear => report.assigned_officer_id = None,
        }
        report.reason = match new_state {
            ReportState::Declined => reason.map(str::to_string),
            _ => None,
        };
        report.updated_at = Utc::now();

        Ok(report.clone())
    }

    async fn list_operational_by_assignee(&self, staff_id: i64) -> Result<Vec<Report>> {
        Ok(self.list_where(|r| r.state.is_operational() && r.is_assigned_to(staff_id)))
    }

    async fn list_operational(&self) -> Result<Vec<Report>> {
        Ok(self.list_where(|r| r.state.is_operational()))
    }
}

// =============================================================================
// DIRECTORY
// =============================================================================

#[derive(Default)]
pub struct InMemoryDirectory {
    members: Mutex<BTreeMap<i64, StaffMember>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace
    pub fn insert(&self, member: StaffMember) {
        self.members.lock().unwrap().insert(member.id, member);
    }

    pub fn remove(&self, id: i64) {
        self.members.lock().unwrap().remove(&id);
    }

    pub fn remove_capability(&self, id: i64, capability: Capability) {
        if let Some(member) = self.members.lock().unwrap().get_mut(&id) {
            member.capabilities.retain(|c| *c != capability);
        }
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn get_member(&self, id: i64) -> Result<StaffMember> {
        self.members
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Staff member {} not found", id)))
    }

    async fn find_eligible(&self, office: Office) -> Result<Vec<StaffMember>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.is_eligible_for(office))
            .cloned()
            .collect())
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<Report>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }

    pub fn reports_for(&self, report_id: i64) -> Vec<Report> {
        self.all().into_iter().filter(|r| r.id == report_id).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn report_state_changed(&self, report: &Report) -> Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn report_state_changed(&self, _report: &Report) -> Result<()> {
        Err(AppError::ExternalServiceError(
            "notification store unavailable".to_string(),
        ))
    }
}

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    users: Mutex<BTreeMap<i64, Recipient>>,
    follows: Mutex<Vec<(i64, i64)>>,
    notifications: Mutex<Vec<Notification>>,
    next_id: AtomicI64,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: Recipient) {
        self.users.lock().unwrap().insert(user.user_id, user);
    }

    pub fn user(&self, user_id: i64) -> Option<Recipient> {
        self.users.lock().unwrap().get(&user_id).cloned()
    }

    pub fn follow(&self, user_id: i64, report_id: i64) {
        self.follows.lock().unwrap().push((user_id, report_id));
    }

    pub fn stored(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn recipients_for_report(&self, report: &Report) -> Result<Vec<Recipient>> {
        let follows = self.follows.lock().unwrap();
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| {
                report.author_id == Some(u.user_id)
                    || follows.contains(&(u.user_id, report.id))
            })
            .cloned()
            .collect())
    }

    async fn insert_many(&self, notifications: &[NewNotification]) -> Result<Vec<Notification>> {
        let stored: Vec<Notification> = notifications
            .iter()
            .map(|n| Notification {
                id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                recipient_id: n.recipient_id,
                report_id: n.report_id,
                kind: n.kind,
                message: n.message.clone(),
                read: false,
                created_at: Utc::now(),
            })
            .collect();

        self.notifications.lock().unwrap().extend(stored.clone());
        Ok(stored)
    }

    async fn list_for_user(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>> {
        let mut found: Vec<Notification> = self
            .stored()
            .into_iter()
            .filter(|n| n.recipient_id == user_id && (!unread_only || !n.read))
            .collect();
        found.reverse();
        Ok(found)
    }

    async fn mark_read(&self, id: i64, user_id: i64) -> Result<Notification> {
        let mut notifications = self.notifications.lock().unwrap();
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;

        if notification.recipient_id != user_id {
            return Err(AppError::Forbidden(
                "You can only mark your own notifications as read".to_string(),
            ));
        }

        notification.read = true;
        Ok(notification.clone())
    }
}

// =============================================================================
// MAIL
// =============================================================================

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    attempts: AtomicU32,
    failures_remaining: AtomicU32,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the first `failures` send attempts
    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures_remaining: AtomicU32::new(failures),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::ExternalServiceError("relay unavailable".to_string()));
        }

        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
