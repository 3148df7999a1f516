mod report;

pub use report::{check_assignment_invariant, AssigneeUpdate, CreateReport, Office, Report, ReportState};
