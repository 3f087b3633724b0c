use crate::error::ConfigurationError;
use crate::util;
use chrono_tz::Tz;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn default_mongodb_uri() -> String {
    env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string())
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("knowmark".to_string())
}

fn default_jwt_secret() -> String {
    env::var("JWT_SECRET").unwrap_or_else(|_| {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect()
    })
}

fn default_time_zone() -> Tz {
    env::var("SCHEDULE_TIME_ZONE")
        .ok()
        .and_then(|it| it.parse().ok())
        .unwrap_or(Tz::UTC)
}

fn default_max_schedule_days() -> u32 {
    731
}

fn default_conflict_check_concurrency() -> usize {
    16
}

fn default_admin_usernames() -> Vec<String> {
    vec![String::from("admin")]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    file_path: PathBuf,

    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,

    /// HS256 secret shared with whatever issues user tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Zone in which request timestamps are reduced to calendar dates.
    #[serde(default = "default_time_zone")]
    pub time_zone: Tz,
    /// Longest class date range that will be expanded into sessions.
    #[serde(default = "default_max_schedule_days")]
    pub max_schedule_days: u32,
    /// How many conflict queries a single class creation may have in flight.
    #[serde(default = "default_conflict_check_concurrency")]
    pub conflict_check_concurrency: usize,

    /// Users registered under one of these names always get the admin role.
    #[serde(default = "default_admin_usernames")]
    pub admin_usernames: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_path: config_dir().join("settings.yml"),
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            jwt_secret: default_jwt_secret(),
            time_zone: default_time_zone(),
            max_schedule_days: default_max_schedule_days(),
            conflict_check_concurrency: default_conflict_check_concurrency(),
            admin_usernames: default_admin_usernames(),
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        let config_file = util::find_first_subpath(
            config_dir(),
            &["settings.yml", "settings.yaml"],
            Path::exists,
        )
        .ok_or_else(|| ConfigurationError::NotFound(config_dir()))?;

        let file = File::open(&config_file)?;
        let mut config: Config = serde_yaml::from_reader(BufReader::new(file))?;
        config.file_path = config_file;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigurationError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.file_path)?;
        let mut out = BufWriter::new(file);
        serde_yaml::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }
}
