use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: Url,
    pub uploads_path: String,
    pub debug: bool,
    pub session_file: String,
    pub report_file: String,
    pub refetch_after_attendance: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Load from environment variables with PORTAL_ prefix
            .add_source(Environment::with_prefix("PORTAL").try_parsing(true))
            .set_default("api_base_url", "http://localhost:5000")?
            .set_default("uploads_path", "uploads")?
            .set_default("debug", false)?
            .set_default("session_file", ".lecture-portal-session.json")?
            .set_default("report_file", "LecturesReport.xlsx")?
            .set_default("refetch_after_attendance", false)?
            .build()?;

        config.try_deserialize()
    }
}
