pub mod models;
pub mod services;

pub use services::{
    FollowService, NotificationRepository, NotificationService, NotificationSink,
    PgNotificationRepository,
};
