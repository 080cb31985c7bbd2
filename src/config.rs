//! Startup configuration: `config.toml` plus environment overrides.
//!
//! Loading never fails. A problem is reported through [`LoadedConfig::error`]
//! and the caller keeps running on defaults with completions disabled.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use completion_provider_gemini::{GeminiProviderConfig, DEFAULT_PREAMBLE, GEMINI_PROVIDER_ID};
use completion_provider_mock::MOCK_PROVIDER_ID;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const CONFIG_PATH_ENV_VAR: &str = "STUDY_BUDDY_CONFIG";
pub const API_KEY_ENV_VAR: &str = "STUDY_BUDDY_API_KEY";
pub const MODEL_ENV_VAR: &str = "STUDY_BUDDY_MODEL";
pub const NO_ANIMATION_ENV_VAR: &str = "STUDY_BUDDY_NO_ANIMATION";
pub const LOG_ENV_VAR: &str = "STUDY_BUDDY_LOG";
pub const PROVIDER_ENV_VAR: &str = "STUDY_BUDDY_PROVIDER";

pub const DEFAULT_LOG_FILTER: &str = "warn";
pub const DEFAULT_CHAR_DELAY_MS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config file at {path} and {} is not set", API_KEY_ENV_VAR)]
    Missing { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("gemini.api_key is empty in {path}")]
    EmptyApiKey { path: PathBuf },

    #[error("gemini.timeout_sec must be greater than zero")]
    InvalidTimeout,

    #[error(
        "unsupported provider '{0}'. Available providers: {gemini}, {mock}",
        gemini = GEMINI_PROVIDER_ID,
        mock = MOCK_PROVIDER_ID
    )]
    UnknownProvider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Mock,
}

impl ProviderKind {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim() {
            GEMINI_PROVIDER_ID => Ok(Self::Gemini),
            MOCK_PROVIDER_ID => Ok(Self::Mock),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub preamble: String,
}

impl GeminiSettings {
    /// Provider config for these settings, `None` without a credential.
    #[must_use]
    pub fn provider_config(&self) -> Option<GeminiProviderConfig> {
        let api_key = self.api_key.as_deref()?;
        let mut config = GeminiProviderConfig::new(api_key).with_preamble(self.preamble.clone());
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        Some(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub char_delay: Duration,
    pub animate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub filter: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub gemini: GeminiSettings,
    pub render: RenderSettings,
    pub logging: LoggingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_file(FileConfig::default())
    }
}

/// Result of [`AppConfig::load`]: always a usable config, plus the first problem found.
#[derive(Debug)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: AppConfig,
    pub error: Option<ConfigError>,
}

impl LoadedConfig {
    /// Completions are only enabled for a clean configuration.
    #[must_use]
    pub fn completions_enabled(&self) -> bool {
        self.error.is_none()
    }

    /// Emits the load outcome. Call once the subscriber is installed.
    pub fn log_outcome(&self) {
        match &self.error {
            Some(error) => tracing::warn!(
                path = %self.path.display(),
                %error,
                "configuration problem, completions disabled"
            ),
            None => tracing::info!(
                path = %self.path.display(),
                provider = ?self.config.provider,
                "configuration loaded"
            ),
        }
    }
}

impl AppConfig {
    /// Loads from `STUDY_BUDDY_CONFIG` or `./config.toml`.
    pub fn load() -> LoadedConfig {
        let path = env_string_opt(CONFIG_PATH_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> LoadedConfig {
        let (file, mut error) = match read_file_config(path) {
            Ok(file) => (file, None),
            Err(error) => (None, Some(error)),
        };
        let file_present = file.is_some();

        let mut config = Self::from_file(file.unwrap_or_default());
        if let Err(override_error) = config.apply_env_overrides() {
            error = error.or(Some(override_error));
        }

        if error.is_none() {
            error = config.validate(path, file_present).err();
        }

        LoadedConfig {
            path: path.to_path_buf(),
            config,
            error,
        }
    }

    fn from_file(file: FileConfig) -> Self {
        Self {
            provider: ProviderKind::Gemini,
            gemini: GeminiSettings {
                api_key: file.gemini.api_key,
                model: file.gemini.model,
                base_url: file.gemini.base_url,
                timeout: file.gemini.timeout_sec.map(Duration::from_secs),
                preamble: file
                    .gemini
                    .preamble
                    .unwrap_or_else(|| DEFAULT_PREAMBLE.to_string()),
            },
            render: RenderSettings {
                char_delay: Duration::from_millis(file.render.char_delay_ms),
                animate: file.render.animate,
            },
            logging: LoggingSettings {
                filter: file
                    .logging
                    .filter
                    .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
                file: file.logging.file,
            },
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(api_key) = env_string_opt(API_KEY_ENV_VAR) {
            self.gemini.api_key = Some(api_key);
        }
        if let Some(model) = env_string_opt(MODEL_ENV_VAR) {
            self.gemini.model = Some(model);
        }
        if env_flag(NO_ANIMATION_ENV_VAR) {
            self.render.animate = false;
        }
        if let Some(filter) = env_string_opt(LOG_ENV_VAR) {
            self.logging.filter = filter;
        }
        if let Some(provider) = env_string_opt(PROVIDER_ENV_VAR) {
            self.provider = ProviderKind::parse(&provider)?;
        }
        Ok(())
    }

    fn validate(&self, path: &Path, file_present: bool) -> Result<(), ConfigError> {
        if self.gemini.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.provider == ProviderKind::Mock {
            return Ok(());
        }

        match self.gemini.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            Some(_) => Err(ConfigError::EmptyApiKey {
                path: path.to_path_buf(),
            }),
            None if file_present => Err(ConfigError::EmptyApiKey {
                path: path.to_path_buf(),
            }),
            None => Err(ConfigError::Missing {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// `Ok(None)` when the file does not exist.
fn read_file_config(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    gemini: GeminiSection,
    render: RenderSection,
    logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GeminiSection {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout_sec: Option<u64>,
    preamble: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RenderSection {
    char_delay_ms: u64,
    animate: bool,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            char_delay_ms: DEFAULT_CHAR_DELAY_MS,
            animate: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LoggingSection {
    filter: Option<String>,
    file: Option<PathBuf>,
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    fn clear_overrides() -> Vec<EnvGuard> {
        [
            API_KEY_ENV_VAR,
            MODEL_ENV_VAR,
            NO_ANIMATION_ENV_VAR,
            LOG_ENV_VAR,
            PROVIDER_ENV_VAR,
        ]
        .into_iter()
        .map(|key| set_env_guard(key, None))
        .collect()
    }

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("config should be written");
        (dir, path)
    }

    #[test]
    fn full_file_is_parsed() {
        let _lock = env_lock();
        let _guards = clear_overrides();
        let (_dir, path) = write_config(
            r#"
[gemini]
api_key = "secret"
model = "gemini-2.5-pro"
timeout_sec = 30
preamble = "Be brief:\n"

[render]
char_delay_ms = 0
animate = false

[logging]
filter = "study_buddy=debug"
file = "buddy.log"
"#,
        );

        let loaded = AppConfig::load_from(&path);

        assert!(loaded.error.is_none(), "{:?}", loaded.error);
        let config = loaded.config;
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.gemini.api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(config.gemini.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.gemini.preamble, "Be brief:\n");
        assert_eq!(config.render.char_delay, Duration::ZERO);
        assert!(!config.render.animate);
        assert_eq!(config.logging.filter, "study_buddy=debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("buddy.log")));
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let _lock = env_lock();
        let _guards = clear_overrides();
        let (_dir, path) = write_config("[gemini]\napi_key = \"k\"\n");

        let loaded = AppConfig::load_from(&path);

        assert!(loaded.completions_enabled());
        assert_eq!(loaded.config.gemini.preamble, DEFAULT_PREAMBLE);
        assert_eq!(loaded.config.gemini.model, None);
        assert_eq!(
            loaded.config.render.char_delay,
            Duration::from_millis(DEFAULT_CHAR_DELAY_MS)
        );
        assert!(loaded.config.render.animate);
        assert_eq!(loaded.config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn missing_file_without_env_key_is_reported() {
        let _lock = env_lock();
        let _guards = clear_overrides();
        let dir = tempfile::tempdir().expect("tempdir should be created");

        let loaded = AppConfig::load_from(&dir.path().join("absent.toml"));

        assert!(matches!(loaded.error, Some(ConfigError::Missing { .. })));
        assert_eq!(loaded.config, AppConfig::default());
    }

    #[test]
    fn env_key_replaces_missing_file() {
        let _lock = env_lock();
        let _guards = clear_overrides();
        let _key = set_env_guard(API_KEY_ENV_VAR, Some("from-env"));
        let dir = tempfile::tempdir().expect("tempdir should be created");

        let loaded = AppConfig::load_from(&dir.path().join("absent.toml"));

        assert!(loaded.error.is_none());
        assert_eq!(loaded.config.gemini.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn malformed_and_unknown_keys_are_parse_errors() {
        let _lock = env_lock();
        let _guards = clear_overrides();

        let (_dir, path) = write_config("[gemini\napi_key = 1");
        assert!(matches!(
            AppConfig::load_from(&path).error,
            Some(ConfigError::Parse { .. })
        ));

        let (_dir, path) = write_config("[gemini]\napi_key = \"k\"\nmodle = \"typo\"\n");
        let loaded = AppConfig::load_from(&path);
        assert!(matches!(loaded.error, Some(ConfigError::Parse { .. })));
        assert_eq!(loaded.config.gemini.api_key, None);
    }

    #[test]
    fn blank_key_and_zero_timeout_are_rejected() {
        let _lock = env_lock();
        let _guards = clear_overrides();

        let (_dir, path) = write_config("[gemini]\napi_key = \"  \"\n");
        assert!(matches!(
            AppConfig::load_from(&path).error,
            Some(ConfigError::EmptyApiKey { .. })
        ));

        let (_dir, path) = write_config("[gemini]\napi_key = \"k\"\ntimeout_sec = 0\n");
        assert!(matches!(
            AppConfig::load_from(&path).error,
            Some(ConfigError::InvalidTimeout)
        ));
    }

    #[test]
    fn env_overrides_apply_on_top_of_file() {
        let _lock = env_lock();
        let _guards = clear_overrides();
        let _model = set_env_guard(MODEL_ENV_VAR, Some("gemini-2.0-flash"));
        let _animation = set_env_guard(NO_ANIMATION_ENV_VAR, Some("1"));
        let _log = set_env_guard(LOG_ENV_VAR, Some("debug"));
        let (_dir, path) = write_config("[gemini]\napi_key = \"k\"\nmodel = \"file-model\"\n");

        let config = AppConfig::load_from(&path).config;

        assert_eq!(config.gemini.model.as_deref(), Some("gemini-2.0-flash"));
        assert!(!config.render.animate);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn mock_provider_needs_no_credential() {
        let _lock = env_lock();
        let _guards = clear_overrides();
        let _provider = set_env_guard(PROVIDER_ENV_VAR, Some("mock"));
        let dir = tempfile::tempdir().expect("tempdir should be created");

        let loaded = AppConfig::load_from(&dir.path().join("absent.toml"));

        assert!(loaded.error.is_none());
        assert_eq!(loaded.config.provider, ProviderKind::Mock);
    }

    #[test]
    fn unknown_provider_is_reported() {
        let _lock = env_lock();
        let _guards = clear_overrides();
        let _provider = set_env_guard(PROVIDER_ENV_VAR, Some("openai"));
        let (_dir, path) = write_config("[gemini]\napi_key = \"k\"\n");

        let error = AppConfig::load_from(&path).error.expect("error");

        assert!(error.to_string().contains("unsupported provider 'openai'"));
    }

    #[test]
    fn provider_config_requires_a_key() {
        let mut settings = AppConfig::default().gemini;
        assert!(settings.provider_config().is_none());

        settings.api_key = Some("k".to_string());
        settings.model = Some("gemini-2.5-pro".to_string());
        let config = settings.provider_config().expect("config");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.preamble, DEFAULT_PREAMBLE);
    }
}
