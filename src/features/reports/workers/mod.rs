mod capability_reconciler;

pub use capability_reconciler::CapabilityReconcilerWorker;
