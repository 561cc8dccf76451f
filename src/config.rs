//! Console configuration.
//!
//! Settings loaded from an INI file. Missing keys keep their defaults, so an
//! empty or partial file is valid.
//!
//! # Configuration File Format
//!
//! ```ini
//! [console]
//! history_size = 100
//! mode = command
//!
//! [script]
//! prefix = pw
//!
//! [domains]
//! writers = physics
//!
//! [log]
//! filter = info
//! ```

use crate::console::{ConsoleMode, DEFAULT_HISTORY_SIZE};
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

const DEFAULT_SCRIPT_PREFIX: &str = "pw";
const DEFAULT_WRITER_DOMAIN: &str = "physics";
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_CONFIG_PATH: &str = "./comconsole.ini";
/// Largest accepted `console.history_size`.
pub const MAX_HISTORY_SIZE: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Capacity of the command and return value histories.
    pub history_size: usize,
    /// Mode the console starts in.
    pub mode: ConsoleMode,
    /// Root table name of the scripting address space.
    pub script_prefix: String,
    /// Writer domains created at start-up.
    pub writer_domains: Vec<String>,
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub config_path: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleConfig {
    pub fn new() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            mode: ConsoleMode::Command,
            script_prefix: DEFAULT_SCRIPT_PREFIX.to_string(),
            writer_domains: vec![DEFAULT_WRITER_DOMAIN.to_string()],
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Returns an error if the file cannot be read or parsed. Invalid values
    /// are skipped with a warning.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);

        info!(
            "Loaded config: history={}, mode={}, prefix={}, writers={:?}",
            self.history_size, self.mode, self.script_prefix, self.writer_domains
        );
        Ok(())
    }

    /// Parse configuration from INI text instead of a file.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [console]
        match config.getuint("console", "history_size") {
            Ok(Some(size)) => {
                let size = usize::try_from(size).unwrap_or(usize::MAX);
                if size > MAX_HISTORY_SIZE {
                    warn!(
                        "console.history_size {} is above {}, clamping",
                        size, MAX_HISTORY_SIZE
                    );
                }
                self.history_size = size.min(MAX_HISTORY_SIZE);
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring console.history_size: {}", e),
        }
        if let Some(mode) = config.get("console", "mode") {
            match mode.parse::<ConsoleMode>() {
                Ok(mode) => self.mode = mode,
                Err(e) => warn!("Ignoring console.mode: {}", e),
            }
        }

        // [script]
        if let Some(prefix) = config.get("script", "prefix").filter(|p| !p.is_empty()) {
            self.script_prefix = prefix;
        }

        // [domains]
        if let Some(writers) = config.get("domains", "writers") {
            self.writer_domains = writers
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect();
        }

        // [log]
        if let Some(filter) = config.get("log", "filter").filter(|f| !f.is_empty()) {
            self.log_filter = filter;
        }
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("console", "history_size", Some(self.history_size.to_string()));
        config.set("console", "mode", Some(self.mode.to_string()));
        config.set("script", "prefix", Some(self.script_prefix.clone()));
        config.set("domains", "writers", Some(self.writer_domains.join(", ")));
        config.set("log", "filter", Some(self.log_filter.clone()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }
}
