use std::{
    collections::{BTreeMap, btree_map::Entry},
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::NaiveDateTime;
use thiserror::Error;
use tokio::sync::watch;

use crate::{
    clock::{Clock, LocalClock},
    reminder::{Reminder, ReminderDueTime},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReminderStoreError {
    #[error("Date is not valid or is not in the future")]
    InvalidDate,

    #[error("Reminder description must not be empty")]
    InvalidDescription,

    #[error("A reminder is already due at {0}")]
    DuplicateEntry(ReminderDueTime),

    #[error("No such reminder due at {0}")]
    NotFound(ReminderDueTime),
}

pub type ReminderStoreResult<T> = Result<T, ReminderStoreError>;

type Entries = BTreeMap<ReminderDueTime, Reminder>;

/// Chronologically ordered reminders, at most one per minute.
///
/// Every operation takes the same lock for its whole duration, so operations are
/// linearizable. Successful mutations bump a revision counter that consumers can
/// follow through [`ReminderStore::subscribe`].
pub struct ReminderStore {
    entries: Mutex<Entries>,
    revision: watch::Sender<u64>,
    clock: Arc<dyn Clock>,
}

impl ReminderStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(LocalClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            revision: watch::Sender::new(0),
            clock,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn insert(
        &self,
        text: impl Into<String>,
        day: u32,
        month: u32,
        year: i32,
        hour: u32,
        minute: u32,
    ) -> ReminderStoreResult<Reminder> {
        let due_at = self.future_due_time(day, month, year, hour, minute)?;
        let reminder = Reminder::new(validated_text(text.into())?, due_at);

        match self.entries().entry(due_at) {
            Entry::Occupied(_) => return Err(ReminderStoreError::DuplicateEntry(due_at)),
            Entry::Vacant(e) => {
                e.insert(reminder.clone());
            }
        }

        log::debug!("Inserted reminder due at {due_at}");
        self.notify_changed();
        Ok(reminder)
    }

    /// Removes `reminder` only if the entry at its due time is that same reminder.
    pub fn remove(&self, reminder: &Reminder) -> ReminderStoreResult<()> {
        {
            let mut entries = self.entries();
            if entries.get(&reminder.due_at) != Some(reminder) {
                return Err(ReminderStoreError::NotFound(reminder.due_at));
            }
            entries.remove(&reminder.due_at);
        }

        log::debug!("Removed reminder due at {}", reminder.due_at);
        self.notify_changed();
        Ok(())
    }

    /// Replaces `existing` with a new reminder in one step.
    ///
    /// Fails without touching the store if the new due time is held by a different
    /// reminder or if `existing` is no longer stored.
    #[allow(clippy::too_many_arguments)]
    pub fn modify(
        &self,
        existing: &Reminder,
        text: impl Into<String>,
        day: u32,
        month: u32,
        year: i32,
        hour: u32,
        minute: u32,
    ) -> ReminderStoreResult<Reminder> {
        let due_at = self.future_due_time(day, month, year, hour, minute)?;
        let replacement = Reminder::new(validated_text(text.into())?, due_at);

        {
            let mut entries = self.entries();
            if entries
                .get(&due_at)
                .is_some_and(|occupant| occupant != existing)
            {
                return Err(ReminderStoreError::DuplicateEntry(due_at));
            }
            if entries.get(&existing.due_at) != Some(existing) {
                return Err(ReminderStoreError::NotFound(existing.due_at));
            }
            entries.remove(&existing.due_at);
            entries.insert(due_at, replacement.clone());
        }

        log::debug!(
            "Modified reminder due at {} to be due at {}",
            existing.due_at,
            due_at
        );
        self.notify_changed();
        Ok(replacement)
    }

    pub fn find_due_at(&self, at: NaiveDateTime) -> Option<Reminder> {
        self.entries().get(&ReminderDueTime::new(at)).cloned()
    }

    pub fn clear(&self) {
        self.entries().clear();
        self.notify_changed();
    }

    /// Removes every reminder due strictly before `reference`, returning how many were dropped.
    pub fn purge_expired(&self, reference: NaiveDateTime) -> usize {
        let removed = {
            let mut entries = self.entries();
            let before = entries.len();
            entries.retain(|due_at, _| *due_at.datetime() >= reference);
            before - entries.len()
        };

        if removed > 0 {
            log::info!("Purged {removed} expired reminders");
            self.notify_changed();
        }
        removed
    }

    pub fn purge_expired_now(&self) -> usize {
        self.purge_expired(self.now())
    }

    /// Replaces the whole content without validating due times.
    ///
    /// When two reminders share a due time the first one wins.
    pub fn restore(&self, reminders: impl IntoIterator<Item = Reminder>) -> usize {
        let mut restored = Entries::new();
        for reminder in reminders {
            match restored.entry(reminder.due_at) {
                Entry::Occupied(_) => log::warn!(
                    "Skipping reminder with duplicate due time {}",
                    reminder.due_at
                ),
                Entry::Vacant(e) => {
                    e.insert(reminder);
                }
            }
        }

        let count = restored.len();
        *self.entries() = restored;
        self.notify_changed();
        count
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Chronological copy of the content at a single point in time.
    pub fn snapshot(&self) -> Vec<Reminder> {
        self.entries().values().cloned().collect()
    }

    pub fn iter(&self) -> std::vec::IntoIter<Reminder> {
        self.snapshot().into_iter()
    }

    /// Receiver whose value changes after every successful mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub async fn wait_until_not_empty(&self) {
        let mut changes = self.subscribe();
        while self.is_empty() {
            if changes.changed().await.is_err() {
                break;
            }
        }
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify_changed(&self) {
        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
    }

    fn future_due_time(
        &self,
        day: u32,
        month: u32,
        year: i32,
        hour: u32,
        minute: u32,
    ) -> ReminderStoreResult<ReminderDueTime> {
        let due_at = ReminderDueTime::from_parts(day, month, year, hour, minute)
            .ok_or(ReminderStoreError::InvalidDate)?;

        if *due_at.datetime() <= self.now() {
            return Err(ReminderStoreError::InvalidDate);
        }

        Ok(due_at)
    }
}

impl Default for ReminderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReminderStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for reminder in self.entries().values() {
            writeln!(f, "{reminder}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ReminderStore {
    type Item = Reminder;
    type IntoIter = std::vec::IntoIter<Reminder>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn validated_text(text: String) -> ReminderStoreResult<String> {
    if text.trim().is_empty() {
        Err(ReminderStoreError::InvalidDescription)
    } else {
        Ok(text)
    }
}
