//! Configuration for the witness calculator.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::slot_pool::DEFAULT_POOL_SIZE;

/// Top-level configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Number of lock/condvar slots shared by all components. Component `i`
    /// uses slot `i % mutex_pool_size`. Larger pools reduce false wakeups
    /// between unrelated components at the cost of more sync objects.
    #[serde(default = "SchedulerConfig::default_mutex_pool_size")]
    pub mutex_pool_size: usize,
    /// Track signal assignment and enforce constraints. Any violation aborts
    /// the process. Intended for debugging circuit compilers only.
    #[serde(default)]
    pub sanity_check: bool,
    /// Name prefix for threads running threaded components
    /// (`<prefix>-<component index>`).
    #[serde(default = "SchedulerConfig::default_thread_name_prefix")]
    pub thread_name_prefix: String,
    /// Stack size for component threads (e.g. "8MiB"). Unset = platform default.
    #[serde(default)]
    pub thread_stack_size: Option<String>,
}

impl SchedulerConfig {
    fn default_mutex_pool_size() -> usize {
        DEFAULT_POOL_SIZE
    }
    fn default_thread_name_prefix() -> String {
        "calcwit".to_string()
    }

    /// Parse `thread_stack_size` into bytes. `None` when unset or malformed;
    /// [`Config::validate`] rejects malformed values at load time.
    pub fn thread_stack_size_bytes(&self) -> Option<usize> {
        self.thread_stack_size.as_deref().and_then(parse_size)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mutex_pool_size: Self::default_mutex_pool_size(),
            sanity_check: false,
            thread_name_prefix: Self::default_thread_name_prefix(),
            thread_stack_size: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// Component whose name table resolves input names and which owns the
    /// circuit inputs.
    #[serde(default)]
    pub main_component: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { main_component: 0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("failed to parse config {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("invalid config {:?}", path))?;
        Ok(config)
    }

    /// Reject values that would otherwise be silently replaced by defaults.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(size) = &self.scheduler.thread_stack_size {
            anyhow::ensure!(
                parse_size(size).is_some(),
                "scheduler.thread_stack_size: cannot parse {:?} as a size (e.g. \"8MiB\")",
                size
            );
        }
        anyhow::ensure!(
            self.scheduler.mutex_pool_size > 0,
            "scheduler.mutex_pool_size must be at least 1"
        );
        Ok(())
    }
}

/// Parse a human-readable size string like "8MiB" or "512KiB" into bytes.
fn parse_size(s: &str) -> Option<usize> {
    let s = s.trim();
    let (digits, multiplier) = if let Some(n) = s.strip_suffix("GiB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MiB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("KiB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1_000_000)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1_000)
    } else {
        (s, 1)
    };
    digits.trim().parse::<usize>().ok()?.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("8MiB"), Some(8 * 1024 * 1024));
        assert_eq!(parse_size("512KiB"), Some(512 * 1024));
        assert_eq!(parse_size("2MB"), Some(2_000_000));
        assert_eq!(parse_size("4096"), Some(4096));
        assert_eq!(parse_size("lots"), None);
    }

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.scheduler.mutex_pool_size, 128);
        assert!(!cfg.scheduler.sanity_check);
        assert_eq!(cfg.scheduler.thread_name_prefix, "calcwit");
        assert_eq!(cfg.scheduler.thread_stack_size_bytes(), None);
        assert_eq!(cfg.driver.main_component, 0);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[scheduler]
mutex_pool_size = 16
sanity_check = true
thread_stack_size = "4MiB"

[logging]
level = "debug"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.scheduler.mutex_pool_size, 16);
        assert!(cfg.scheduler.sanity_check);
        assert_eq!(cfg.scheduler.thread_name_prefix, "calcwit");
        assert_eq!(cfg.scheduler.thread_stack_size_bytes(), Some(4 * 1024 * 1024));
        assert_eq!(cfg.driver.main_component, 0);
        assert_eq!(cfg.logging.level, "debug");
        cfg.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_malformed_values() {
        let cfg: Config = toml::from_str("[scheduler]\nthread_stack_size = \"8 megs\"\n").unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("8 megs"), "{}", err);

        let cfg: Config = toml::from_str("[scheduler]\nmutex_pool_size = 0\n").unwrap();
        assert!(cfg.validate().is_err());

        Config::default().validate().unwrap();
    }

    #[test]
    fn test_from_file_rejects_malformed_stack_size() {
        let path = std::env::temp_dir().join(format!("calcwit-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[scheduler]\nthread_stack_size = \"8 megs\"\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(format!("{:#}", err).contains("thread_stack_size"), "{:#}", err);
    }
}
