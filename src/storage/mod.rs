pub mod persistence;
mod reminder_store;

pub use reminder_store::{ReminderStore, ReminderStoreError, ReminderStoreResult};
