use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub shell: ShellConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    pub prompt: String,
    pub confirm_overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub color: bool,
    pub log_to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: ShellConfig {
                prompt: "Enter command: ".to_string(),
                confirm_overwrite: true,
            },
            logging: LoggingConfig {
                color: true,
                log_to_file: true,
            },
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

pub struct ConfigManager {
    pub root_dir: PathBuf,
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let root_dir = directories::ProjectDirs::from("com", "bindex", "bindex")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".bindex"));

        let config_dir = root_dir.join("config");

        Ok(Self { root_dir, config_dir })
    }

    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_dir)?;
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(self.log_dir())?;

        let config_path = self.config_path();
        if !config_path.exists() {
            self.save_config(&Config::default())?;
        }

        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root_dir.join("log")
    }

    pub fn load_config(&self) -> Result<Config> {
        let path = self.config_path();
        if path.exists() {
            Config::load_from_file(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        let content = toml::to_string_pretty(config)?;
        std::fs::write(self.config_path(), content)?;
        Ok(())
    }
}
