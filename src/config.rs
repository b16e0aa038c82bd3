use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How a session ends: a countdown in seconds, or typing the whole target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Time,
    Words,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub word_list: String,
    pub mode: Mode,
    pub duration_secs: u64,
    /// words drawn for a timed test
    pub test_size: usize,
    /// words drawn for a words-mode test
    pub words_test_size: usize,
    pub words_per_line: usize,
    pub window_size: usize,
    pub allow_backspace: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            word_list: "english".to_string(),
            mode: Mode::Time,
            duration_secs: 30,
            test_size: 500,
            words_test_size: 25,
            words_per_line: 15,
            window_size: 3,
            allow_backspace: false,
            debug: false,
        }
    }
}

impl Config {
    /// Number of words drawn for the configured mode.
    pub fn effective_test_size(&self) -> usize {
        match self.mode {
            Mode::Time => self.test_size,
            Mode::Words => self.words_test_size,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "keyrace") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("keyrace_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
