mod assignment_router;
mod lifecycle_engine;
mod reconciler;
mod report_store;
mod transition_policy;

pub use assignment_router::AssignmentRouter;
pub use lifecycle_engine::{LifecycleEngine, ReviewOutcome};
pub use reconciler::CapabilityReconciler;
pub use report_store::{PgReportStore, ReportStore};
pub use transition_policy::ActorKind;
