pub mod delivery;
mod expiry_checker;

pub use delivery::{ChannelNotificationSink, LogNotificationSink, ReminderNotificationSink};
pub use expiry_checker::ExpiryChecker;
