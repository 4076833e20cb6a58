use std::env;

use chrono_tz::Tz;

use super::env::{
    AppConfig, ClassifierConfig, ConfigError, DirectoryConfig, LoggingConfig, SchedulerConfig,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let classifier = ClassifierConfig {
            enabled: parse_bool("CLASSIFIER_ENABLED", false)?,
            move_to_user_folders: parse_bool("AUTO_FILE_USER_FOLDERS", true)?,
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            snapshot_filename: env::var("SNAPSHOT_FILENAME")
                .unwrap_or_else(|_| "classifier.json".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let timezone = parse_timezone("APP_TIMEZONE")?;

        let scheduler = SchedulerConfig {
            save_crons: env::var("SAVE_CRONS")
                .map(|value| split_crons(&value))
                .unwrap_or_else(|_| vec!["0 */5 * * * *".to_string()]),
        };

        Ok(Self {
            classifier,
            directories,
            logging,
            timezone,
            scheduler,
        })
    }
}

fn split_crons(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn parse_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => parse_flag(&value).ok_or(ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

fn parse_timezone(key: &'static str) -> Result<Tz, ConfigError> {
    match env::var(key) {
        Ok(value) => parse_zone(&value).ok_or(ConfigError::Invalid { key, value }),
        Err(_) => Ok(Tz::UTC),
    }
}

fn parse_zone(value: &str) -> Option<Tz> {
    value.trim().parse().ok()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
