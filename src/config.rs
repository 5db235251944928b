use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub log_level: String,
    pub content_dir: Option<PathBuf>,
    pub data_file: PathBuf,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let content_dir = std::env::var("CONTENT_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let data_file = std::env::var("DATA_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/learner_progress.json"));

        Self {
            log_level,
            content_dir,
            data_file,
        }
    }
}
