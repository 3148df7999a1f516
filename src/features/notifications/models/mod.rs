mod notification;

pub use notification::{
    build_status_message, NewNotification, Notification, NotificationKind, Recipient,
};
