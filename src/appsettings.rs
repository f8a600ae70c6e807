use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StorageSettings {
    pub file: PathBuf,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CheckerSettings {
    pub interval_secs: u64,
}

impl CheckerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub storage: StorageSettings,
    pub checker: CheckerSettings,
}

impl AppSettings {
    /// Reads `appsettings`, then `appsettings.local`, then `APP__*` environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("appsettings").required(false))
                .add_source(File::with_name("appsettings.local").required(false))
                .add_source(Environment::with_prefix("APP").separator("__")),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("storage.file", "reminders.json")?
            .set_default("checker.interval_secs", 10)?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    #[test]
    pub fn defaults_apply_without_sources() {
        let settings = AppSettings::from_config(Config::builder()).unwrap();

        assert_eq!(settings.storage.file, PathBuf::from("reminders.json"));
        assert_eq!(settings.checker.interval(), Duration::from_secs(10));
    }

    #[test]
    pub fn file_values_override_defaults() {
        let builder = Config::builder().add_source(File::from_str(
            "[storage]\nfile = \"/tmp/mine.json\"\n[checker]\ninterval_secs = 30\n",
            FileFormat::Toml,
        ));

        let settings = AppSettings::from_config(builder).unwrap();

        assert_eq!(settings.storage.file, PathBuf::from("/tmp/mine.json"));
        assert_eq!(settings.checker.interval_secs, 30);
    }
}
