use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    clock::{Clock, LocalClock},
    reminder::Reminder,
};

use super::ReminderStore;

/// Writes a snapshot of `store` to `path` as a JSON list of reminders.
///
/// The snapshot is written to a sibling temporary file first and renamed over
/// `path`, so a failed save leaves the previous file intact.
pub fn save(path: impl AsRef<Path>, store: &ReminderStore) -> anyhow::Result<()> {
    let path = path.as_ref();
    let reminders = store.snapshot();
    let tmp_path = temporary_path(path);

    if let Err(e) = write_and_replace(&tmp_path, path, &reminders) {
        if tmp_path.exists() {
            if let Err(remove_error) = fs::remove_file(&tmp_path) {
                log::warn!(
                    "Could not remove {}: {remove_error}",
                    tmp_path.display()
                );
            }
        }
        return Err(e);
    }

    log::info!("Saved {} reminders to {}", reminders.len(), path.display());
    Ok(())
}

fn write_and_replace(tmp_path: &Path, path: &Path, reminders: &[Reminder]) -> anyhow::Result<()> {
    let file = File::create(tmp_path)
        .with_context(|| format!("Could not create {}", tmp_path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, reminders)
        .context("Could not serialize reminders")?;
    writer.flush()?;
    drop(writer);

    fs::rename(tmp_path, path)
        .with_context(|| format!("Could not replace {}", path.display()))
}

pub fn load(path: impl AsRef<Path>) -> anyhow::Result<ReminderStore> {
    load_with_clock(path, Arc::new(LocalClock))
}

/// Reads reminders saved by [`save`]. Due times are not checked against the clock.
pub fn load_with_clock(
    path: impl AsRef<Path>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<ReminderStore> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    let reminders: Vec<Reminder> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse reminders in {}", path.display()))?;

    let store = ReminderStore::with_clock(clock);
    let count = store.restore(reminders);

    log::info!("Loaded {count} reminders from {}", path.display());
    Ok(store)
}

pub fn save_to_file(path: impl AsRef<Path>, store: &ReminderStore) -> bool {
    match save(path, store) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Saving reminders failed: {e:#}");
            false
        }
    }
}

pub fn load_from_file(path: impl AsRef<Path>) -> Option<ReminderStore> {
    match load(path) {
        Ok(store) => Some(store),
        Err(e) => {
            log::warn!("Loading reminders failed: {e:#}");
            None
        }
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut file_name = path.file_name().unwrap_or_default().to_os_string();
    file_name.push(".tmp");
    path.with_file_name(file_name)
}
