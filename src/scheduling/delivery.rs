use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::reminder::Reminder;

/// Receives reminders that expired and were removed from the store.
///
/// Implementations decide where the alert is shown. The checker never waits for
/// a notification to finish before carrying on.
#[async_trait]
pub trait ReminderNotificationSink: Send + Sync + 'static {
    async fn notify_expired(&self, reminder: &Reminder);
}

pub fn get_message_text(reminder: &Reminder) -> String {
    format!("⏰ Expired: {reminder}\nReminder removed.")
}

pub struct LogNotificationSink;

#[async_trait]
impl ReminderNotificationSink for LogNotificationSink {
    async fn notify_expired(&self, reminder: &Reminder) {
        log::info!("{}", get_message_text(reminder));
    }
}

/// Hands expired reminders over to whichever thread owns the receiving end,
/// typically a UI event loop draining the channel on its own schedule.
pub struct ChannelNotificationSink {
    tx: mpsc::UnboundedSender<Reminder>,
}

impl ChannelNotificationSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Reminder>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ReminderNotificationSink for ChannelNotificationSink {
    async fn notify_expired(&self, reminder: &Reminder) {
        if self.tx.send(reminder.clone()).is_err() {
            log::warn!("Notification receiver is gone, dropping alert for {reminder}");
        }
    }
}
