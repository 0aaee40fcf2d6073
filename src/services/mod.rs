pub mod entry_detector;
pub mod notification_service;
pub mod subscription_service;

pub use entry_detector::EntryDetector;
pub use notification_service::{ChatNotificationService, ConsoleNotificationService, NotificationSink};
pub use subscription_service::SubscriptionService;
