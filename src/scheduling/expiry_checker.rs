use std::{sync::Arc, time::Duration};

use anyhow::ensure;
use tokio::{sync::watch, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{reminder::Reminder, storage::ReminderStore};

use super::delivery::ReminderNotificationSink;

/// Background task that polls a [`ReminderStore`] and expires due reminders.
///
/// Each tick looks up the reminder due in the current minute, hands it to the
/// notification sink and removes it from the store. At most one reminder is
/// expired per tick. The task stops when [`ExpiryChecker::stop`] is called or
/// the checker is dropped.
pub struct ExpiryChecker {
    task_handle: Option<JoinHandle<()>>,
    cancellation_token: CancellationToken,
    store: watch::Sender<Arc<ReminderStore>>,
}

impl ExpiryChecker {
    pub fn start(
        store: Arc<ReminderStore>,
        interval: Duration,
        sink: Arc<dyn ReminderNotificationSink>,
    ) -> anyhow::Result<Self> {
        ensure!(!interval.is_zero(), "Expiry check interval must be positive");

        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();
        let (store, store_rx) = watch::channel(store);

        let task_handle = tokio::spawn(async move {
            run_checks(task_cancellation_token, store_rx, interval, sink).await
        });

        log::info!("Started expiry checker with {interval:?} interval");

        Ok(Self {
            task_handle: Some(task_handle),
            cancellation_token,
            store,
        })
    }

    /// Points the checker at another store, starting with the next tick.
    pub fn set_store(&self, store: Arc<ReminderStore>) {
        self.store.send_replace(store);
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn stop(mut self, timeout: Duration) {
        self.cancellation_token.cancel();
        if let Some(task_handle) = self.task_handle.take() {
            if time::timeout(timeout, task_handle).await.is_err() {
                log::warn!("Expiry checker did not stop within {timeout:?}");
            }
        }
    }
}

impl Drop for ExpiryChecker {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

async fn run_checks(
    cancellation_token: CancellationToken,
    store: watch::Receiver<Arc<ReminderStore>>,
    interval: Duration,
    sink: Arc<dyn ReminderNotificationSink>,
) {
    while !cancellation_token.is_cancelled() {
        tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => break,
            _ = time::sleep(interval) => {}
        }

        let current_store = Arc::clone(&store.borrow());
        expire_due_reminder(&current_store, &sink);
    }

    log::info!("Expiry checker shutting down");
}

pub(crate) fn expire_due_reminder(
    store: &ReminderStore,
    sink: &Arc<dyn ReminderNotificationSink>,
) -> Option<Reminder> {
    let reminder = store.find_due_at(store.now())?;
    expire(store, &reminder, sink);
    Some(reminder)
}

/// Notifies the sink about `reminder` and removes it from `store`.
///
/// The reminder may already be gone if it was deleted or edited after it was
/// looked up; that removal failure is ignored.
pub(crate) fn expire(
    store: &ReminderStore,
    reminder: &Reminder,
    sink: &Arc<dyn ReminderNotificationSink>,
) {
    log::info!("Reminder expired: {reminder}");

    let task_sink = Arc::clone(sink);
    let notified = reminder.clone();
    tokio::spawn(async move {
        task_sink.notify_expired(&notified).await;
    });

    if let Err(e) = store.remove(reminder) {
        log::debug!("Expired reminder was already removed: {e}");
    }
}
