use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{errors::Error, Result};

const DEFAULT_SETTINGS_PATH: &str = "./data/settings.json";

/// Process-wide settings, loaded once at startup and never mutated.
///
/// The on-disk layout is a flat JSON object; field names match the file keys.
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub prefix: String,

    /// Cooldown between commands from the same (non-exempt) sender, in seconds.
    #[serde(default = "default_ratelimit")]
    pub ratelimit: i64,

    /// Commands anyone may invoke.
    #[serde(default)]
    pub command_list: Vec<String>,
    /// Commands only the bot's own account may invoke.
    #[serde(default)]
    pub admin_command_list: Vec<String>,
    #[serde(default)]
    pub help_messages: HashMap<String, String>,

    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub source_url: Option<String>,

    // Persisted state
    #[serde(default = "default_file_cache_path")]
    pub file_cache_path: PathBuf,
    #[serde(default = "default_emojis_path")]
    pub emojis_path: PathBuf,
    #[serde(default = "default_text_replace_path")]
    pub text_replace_path: PathBuf,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    #[serde(default = "default_emojis_folder_path")]
    pub emojis_folder_path: PathBuf,
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

impl Settings {
    /// Load settings from `MSB_SETTINGS` (default `./data/settings.json`).
    ///
    /// A `.env` file in the working directory is honored; `MSB_DEBUG` overrides
    /// the `debug` flag from the file.
    pub fn load() -> Result<Self> {
        load_dotenv(Path::new(".env"));

        let path = env_path("MSB_SETTINGS").unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
        if !path.is_file() {
            return Err(Error::Config(format!(
                "please create a settings file at {}",
                path.display()
            )));
        }

        let txt = fs::read_to_string(&path)?;
        let mut settings = Self::from_json(&txt)?;
        if let Some(debug) = env_bool("MSB_DEBUG") {
            settings.debug = debug;
        }
        Ok(settings)
    }

    pub fn from_json(txt: &str) -> Result<Self> {
        let mut settings: Settings = serde_json::from_str(txt)?;

        if settings.prefix.trim().is_empty() {
            return Err(Error::Config("prefix must not be empty".to_string()));
        }
        if settings.ratelimit < 0 {
            return Err(Error::Config("ratelimit must not be negative".to_string()));
        }
        // An empty source_url in the file means "no source link".
        settings.source_url = settings.source_url.and_then(non_empty);

        Ok(settings)
    }

    pub fn is_general_command(&self, command: &str) -> bool {
        self.command_list.iter().any(|c| c == command)
    }

    pub fn is_admin_command(&self, command: &str) -> bool {
        self.admin_command_list.iter().any(|c| c == command)
    }

    /// Help text for `key` with `{prefix}` substituted.
    pub fn help_text(&self, key: &str) -> Option<String> {
        self.help_messages
            .get(key)
            .map(|t| t.replace("{prefix}", &self.prefix))
    }
}

fn default_ratelimit() -> i64 {
    10
}

fn default_file_cache_path() -> PathBuf {
    PathBuf::from("./data/file_cache.json")
}

fn default_emojis_path() -> PathBuf {
    PathBuf::from("./data/emojis.json")
}

fn default_text_replace_path() -> PathBuf {
    PathBuf::from("./data/text_replace.json")
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("./data/credentials.json")
}

fn default_emojis_folder_path() -> PathBuf {
    PathBuf::from("./data/emojis/")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./data/cache")
}

/// Export `KEY=value` lines from a `.env` file (`MSB_SETTINGS`, `MSB_DEBUG`,
/// `MATRIX_PASSWORD`, `RUST_LOG`). Variables already set in the environment
/// win.
fn load_dotenv(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    let pairs = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), unquote(value.trim())))
        .filter(|(key, _)| !key.is_empty());

    for (key, value) in pairs {
        if env::var_os(key).is_none() {
            env::set_var(key, value);
        }
    }
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|q| value.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(value)
}

fn env_bool(key: &str) -> Option<bool> {
    env::var(key).ok().map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
    Settings::from_json(
        r#"{
            "prefix": "!",
            "ratelimit": 5,
            "command_list": ["help", "roll", "ping", "xkcd", "emoji_list"],
            "admin_command_list": ["shrug", "emoji_size"],
            "help_messages": {
                "help": "Commands: {prefix}help, {prefix}roll",
                "roll": "{prefix}roll [sides]"
            },
            "debug": false,
            "source_url": ""
        }"#,
    )
    .unwrap()
}
