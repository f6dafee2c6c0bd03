use dialoguer::{Input, Select, theme::ColorfulTheme};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::GlobalArgs;
use crate::client::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiConfig};
use crate::compat;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::types::{Board, LanguagePreference};

const SETTINGS_KEY: &str = "settings";

/// Persisted preferences, kept as `settings.json` next to the saved
/// projects. Every field is optional; command-line flags win.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub default_board: Option<Board>,
    pub default_language: Option<LanguagePreference>,
}

impl Settings {
    pub fn load(store: &dyn KeyValueStore) -> ServiceResult<Self> {
        match store.get(SETTINGS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| ServiceError::Config(format!("settings.json is invalid: {e}"))),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> ServiceResult<()> {
        let raw = serde_json::to_string_pretty(self)?;
        store.set(SETTINGS_KEY, &raw)?;
        Ok(())
    }
}

/// Everything a command needs, after flags, environment and settings have
/// been merged.
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub store: Arc<dyn KeyValueStore>,
    pub gemini: GeminiConfig,
    pub default_board: Board,
    pub default_language: LanguagePreference,
}

impl AppConfig {
    pub fn resolve(args: &GlobalArgs) -> ServiceResult<Self> {
        let data_dir = args.data_dir.clone().unwrap_or_else(FileStore::default_root);
        let disk = FileStore::new(&data_dir);
        let settings = Settings::load(&disk)?;

        let store: Arc<dyn KeyValueStore> = if args.ephemeral {
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(disk)
        };

        let gemini = GeminiConfig {
            endpoint: args
                .endpoint
                .clone()
                .or(settings.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: args
                .model
                .clone()
                .or(settings.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: args
                .api_key
                .clone()
                .or_else(|| std::env::var("API_KEY").ok()),
        };

        let default_board = settings.default_board.unwrap_or_default();
        let default_language = settings
            .default_language
            .filter(|l| compat::is_supported(default_board, *l))
            .unwrap_or_default();

        tracing::debug!(
            data_dir = %data_dir.display(),
            model = %gemini.model,
            ephemeral = args.ephemeral,
            "configuration resolved"
        );

        Ok(Self {
            data_dir,
            store,
            gemini,
            default_board,
            default_language,
        })
    }
}

/// Walk the user through every setting and return the edited copy.
pub fn edit_interactively(current: &Settings) -> ServiceResult<Settings> {
    let theme = ColorfulTheme::default();

    let model: String = Input::with_theme(&theme)
        .with_prompt("Model")
        .default(
            current
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        )
        .interact_text()?;

    let endpoint: String = Input::with_theme(&theme)
        .with_prompt("Endpoint")
        .default(
            current
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        )
        .interact_text()?;

    let board_items: Vec<String> = Board::ALL
        .iter()
        .map(|b| b.display_name().to_string())
        .collect();
    let board_index = current
        .default_board
        .and_then(|b| Board::ALL.iter().position(|x| *x == b))
        .unwrap_or(0);
    let board = Board::ALL[Select::with_theme(&theme)
        .with_prompt("Default board")
        .items(&board_items)
        .default(board_index)
        .interact()?];

    let languages = compat::supported_languages(board);
    let language_items: Vec<String> = languages.iter().map(|l| l.label().to_string()).collect();
    let language_index = current
        .default_language
        .and_then(|l| languages.iter().position(|x| *x == l))
        .unwrap_or(0);
    let language = languages[Select::with_theme(&theme)
        .with_prompt("Default language")
        .items(&language_items)
        .default(language_index)
        .interact()?];

    Ok(Settings {
        model: Some(model.trim().to_string()).filter(|m| m != DEFAULT_MODEL),
        endpoint: Some(endpoint.trim().to_string()).filter(|e| e != DEFAULT_ENDPOINT),
        default_board: Some(board),
        default_language: Some(language),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &std::path::Path) -> GlobalArgs {
        GlobalArgs {
            api_key: None,
            model: None,
            endpoint: None,
            data_dir: Some(dir.to_path_buf()),
            ephemeral: false,
        }
    }

    #[test]
    fn defaults_without_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::resolve(&args(dir.path())).unwrap();
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
        assert_eq!(config.gemini.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.default_board, Board::Rpi5);
        assert_eq!(config.default_language, LanguagePreference::Default);
    }

    #[test]
    fn flags_override_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            model: Some("from-settings".into()),
            endpoint: Some("http://settings.local".into()),
            default_board: Some(Board::Esp32),
            default_language: Some(LanguagePreference::Cpp),
        };
        settings.save(&FileStore::new(dir.path())).unwrap();

        let mut global = args(dir.path());
        global.model = Some("from-flag".into());
        let config = AppConfig::resolve(&global).unwrap();
        assert_eq!(config.gemini.model, "from-flag");
        assert_eq!(config.gemini.endpoint, "http://settings.local");
        assert_eq!(config.default_board, Board::Esp32);
        assert_eq!(config.default_language, LanguagePreference::Cpp);
    }

    #[test]
    fn incompatible_default_language_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        Settings {
            default_board: Some(Board::ArduinoNano),
            default_language: Some(LanguagePreference::MicroPython),
            ..Settings::default()
        }
        .save(&FileStore::new(dir.path()))
        .unwrap();

        let config = AppConfig::resolve(&args(dir.path())).unwrap();
        assert_eq!(config.default_language, LanguagePreference::Default);
    }

    #[test]
    fn invalid_settings_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::new(dir.path()).set(SETTINGS_KEY, "{oops").unwrap();
        let err = AppConfig::resolve(&args(dir.path())).err().unwrap();
        assert!(matches!(err, ServiceError::Config(_)));
    }
}
