use std::{sync::Arc, time::Duration};

use promemoria::{
    appsettings::AppSettings,
    scheduling::{ExpiryChecker, LogNotificationSink},
    storage::{ReminderStore, persistence},
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::formatted_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();

    let settings = AppSettings::new()?;
    log::info!("Starting with settings {settings:?}");

    let store = match persistence::load_from_file(&settings.storage.file) {
        Some(store) => store,
        None => {
            log::info!("Starting with an empty reminder list");
            ReminderStore::new()
        }
    };
    store.purge_expired_now();
    let store = Arc::new(store);

    let checker = ExpiryChecker::start(
        Arc::clone(&store),
        settings.checker.interval(),
        Arc::new(LogNotificationSink),
    )?;

    log::info!("Upcoming reminders:\n{store}");

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");

    checker.stop(SHUTDOWN_TIMEOUT).await;
    if !persistence::save_to_file(&settings.storage.file, &store) {
        anyhow::bail!(
            "Could not save reminders to {}",
            settings.storage.file.display()
        );
    }

    Ok(())
}
