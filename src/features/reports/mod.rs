pub mod models;
pub mod services;
pub mod workers;

pub use services::{
    ActorKind, AssignmentRouter, CapabilityReconciler, LifecycleEngine, PgReportStore, ReportStore,
    ReviewOutcome,
};
pub use workers::CapabilityReconcilerWorker;
