use std::{fs, path::PathBuf};

use serde::Deserialize;

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub model_path: PathBuf,
    pub static_dir: Option<PathBuf>,
    /// Serve predictions from the trained model file instead of keyword scoring.
    pub use_trained_model: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8000".into(),
            model_path: PathBuf::from("model/classifier.json"),
            static_dir: Some(PathBuf::from("app/static")),
            use_trained_model: false,
        }
    }
}

/// Keys accepted in `server.toml`; anything absent keeps its default.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind_addr: Option<String>,
    model_path: Option<PathBuf>,
    static_dir: Option<String>,
    use_trained_model: Option<FileFlag>,
}

/// A boolean written either bare (`true`) or quoted (`"yes"`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileFlag {
    Bool(bool),
    Text(String),
}

impl FileFlag {
    fn enabled(&self) -> bool {
        match self {
            FileFlag::Bool(value) => *value,
            FileFlag::Text(raw) => is_truthy(raw),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_config(&mut settings, &raw);
    }
    apply_env(&mut settings, |name| std::env::var(name).ok());
    settings
}

pub(crate) fn apply_file_config(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileConfig>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            tracing::warn!(file = SETTINGS_FILE, %error, "ignoring unparseable settings file");
            return;
        }
    };
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.model_path {
        settings.model_path = v;
    }
    if let Some(v) = file_cfg.static_dir {
        settings.static_dir = non_empty_path(&v);
    }
    if let Some(flag) = file_cfg.use_trained_model {
        settings.use_trained_model = flag.enabled();
    }
}

pub(crate) fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = lookup("MODEL_PATH") {
        settings.model_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("APP__MODEL_PATH") {
        settings.model_path = PathBuf::from(v);
    }

    if let Some(v) = lookup("STATIC_DIR") {
        settings.static_dir = non_empty_path(&v);
    }
    if let Some(v) = lookup("APP__STATIC_DIR") {
        settings.static_dir = non_empty_path(&v);
    }

    // Legacy switch: only the exact value "1" enables the trained model.
    if let Some(v) = lookup("USE_LEGACY") {
        settings.use_trained_model = v == "1";
    }
    if let Some(v) = lookup("APP__USE_TRAINED_MODEL") {
        settings.use_trained_model = is_truthy(&v);
    }
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| PathBuf::from(raw))
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
