mod follow_service;
mod notification_repository;
mod notification_service;
mod notification_sink;

pub use follow_service::FollowService;
pub use notification_repository::{NotificationRepository, PgNotificationRepository};
pub use notification_service::NotificationService;
pub use notification_sink::NotificationSink;
