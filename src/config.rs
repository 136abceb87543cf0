//! Settings handling for adforge.
//!
//! Loads settings from `~/.config/adforge/config.toml` or a custom path, then
//! applies environment overrides (`GOOGLE_API_KEY`, `TEMPERATURE`, ...).
//! The resulting [`Settings`] value is built once at startup and passed by
//! reference into every client constructor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default base URL for the Gemini REST API.
pub const GOOGLE_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default base URL for the ElevenLabs REST API.
pub const ELEVENLABS_API_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Default text-to-speech voice ("Josh").
pub const DEFAULT_VOICE_ID: &str = "TxGEqnHWrfWFTfGW9XjX";

/// Process-wide settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub google: GoogleSettings,
    #[serde(default)]
    pub video: VideoSettings,
    #[serde(default)]
    pub elevenlabs: ElevenLabsSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GoogleSettings {
    pub api_key: String,
    pub base_url: String,
    pub fast_model: String,
    pub pro_model: String,
    pub image_generation_model: String,
    pub imagen_model: String,
    pub video_generation_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_concurrent_calls: usize,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: GOOGLE_API_BASE_URL.to_string(),
            fast_model: "gemini-2.0-flash".to_string(),
            pro_model: "gemini-2.5-pro-exp-03-25".to_string(),
            image_generation_model: "gemini-2.0-flash-exp-image-generation".to_string(),
            imagen_model: "imagen-3.0-generate-002".to_string(),
            video_generation_model: "veo-2.0-generate-001".to_string(),
            temperature: 0.5,
            max_tokens: 2048,
            max_concurrent_calls: 10,
        }
    }
}

/// Polling behavior for long-running video jobs.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct VideoSettings {
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 20,
            max_wait_secs: 600,
        }
    }
}

impl VideoSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ElevenLabsSettings {
    pub api_key: String,
    pub base_url: String,
    pub voice_id: String,
}

impl Default for ElevenLabsSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: ELEVENLABS_API_BASE_URL.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
        }
    }
}

/// Where pipeline artifacts are written.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    pub root: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Load settings from a file path.
    /// Returns defaults if the default file doesn't exist.
    /// Returns an error if an explicit file is missing or any file cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some();
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if !path.exists() {
            if explicit {
                return Err(ConfigError::NotFound { path });
            }
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            source: e,
        })?;
        let settings: Settings = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make the video poll loop spin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.video.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.poll_interval_secs",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Load settings and apply overrides from the process environment.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = Self::load(path)?;
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Empty values are ignored so an exported-but-blank variable doesn't
    /// wipe out a key from the config file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GOOGLE_API_KEY") {
            self.google.api_key = v;
        }
        if let Some(v) = get("ELEVEN_LABS_API_KEY") {
            self.elevenlabs.api_key = v;
        }
        if let Some(v) = get("GOOGLE_FAST_MODEL") {
            self.google.fast_model = v;
        }
        if let Some(v) = get("GOOGLE_PRO_MODEL") {
            self.google.pro_model = v;
        }
        if let Some(v) = get("GOOGLE_IMAGE_GENERATION_MODEL") {
            self.google.image_generation_model = v;
        }
        if let Some(v) = get("GOOGLE_IMAGEN_MODEL") {
            self.google.imagen_model = v;
        }
        if let Some(v) = get("GOOGLE_VIDEO_GENERATION_MODEL") {
            self.google.video_generation_model = v;
        }
        if let Some(v) = get("TEMPERATURE") {
            self.google.temperature = parse_env("TEMPERATURE", &v)?;
        }
        if let Some(v) = get("MAX_TOKENS") {
            self.google.max_tokens = parse_env("MAX_TOKENS", &v)?;
        }
        if let Some(v) = get("MAX_CONCURRENCE_CALLS") {
            self.google.max_concurrent_calls = parse_env("MAX_CONCURRENCE_CALLS", &v)?;
        }
        Ok(())
    }

    /// Render the settings as TOML with API keys masked.
    pub fn to_masked_toml(&self) -> Result<String, toml::ser::Error> {
        let mut masked = self.clone();
        masked.google.api_key = mask_secret(&masked.google.api_key);
        masked.elevenlabs.api_key = mask_secret(&masked.elevenlabs.api_key);
        toml::to_string_pretty(&masked)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

/// Secrets shorter than this are masked entirely.
const MIN_REVEALED_SECRET_LEN: usize = 8;

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    if secret.chars().count() < MIN_REVEALED_SECRET_LEN {
        return "********".to_string();
    }
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

/// Errors that can occur when loading settings.
#[derive(Debug)]
pub enum ConfigError {
    NotFound {
        path: PathBuf,
    },
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        key: &'static str,
        value: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound { path } => {
                write!(f, "Config file '{}' not found", path.display())
            }
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("adforge").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/adforge/config.toml")
        })
}

/// Default config file contents written by `adforge config init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# adforge configuration
# Environment variables (or a .env file) override the keys below.

[google]
# api_key = ""            # or GOOGLE_API_KEY
fast_model = "gemini-2.0-flash"
pro_model = "gemini-2.5-pro-exp-03-25"
image_generation_model = "gemini-2.0-flash-exp-image-generation"
imagen_model = "imagen-3.0-generate-002"
video_generation_model = "veo-2.0-generate-001"
temperature = 0.5
max_tokens = 2048
max_concurrent_calls = 10

[video]
# Seconds between status checks on a video job
poll_interval_secs = 20
# Give up on a video job after this many seconds
max_wait_secs = 600

[elevenlabs]
# api_key = ""            # or ELEVEN_LABS_API_KEY
voice_id = "TxGEqnHWrfWFTfGW9XjX"

[output]
# images/, sounds/ and videos/ are created under this directory
root = "."
"#;
