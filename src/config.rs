use serde::Deserialize;
use std::path::PathBuf;

/// Config file used when `CONFIG_FILE` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "sqlprof.toml";

/// Environment overrides, applied on top of the file.
pub const ENV_LOG_PATH: &str = "SQL_LOG_PATH";
pub const ENV_LOG_FREQ: &str = "SQL_LOG_FREQ";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilerConfig {
    #[serde(default)]
    pub profiler: ProfilerSection,
}

/// Both `sql_log_path` and `sql_log_freq` must be set for profiling to switch on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilerSection {
    pub sql_log_path: Option<String>,
    /// Probability in [0, 1] that an executed statement is logged.
    pub sql_log_freq: Option<f64>,
    /// Fixed RNG seed for reproducible sampling.
    pub seed: Option<u64>,
}

/// Resolved settings for an active profiler.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSettings {
    pub log_path: PathBuf,
    pub frequency: f64,
    pub seed: Option<u64>,
}

impl ProfilerConfig {
    /// Load from `CONFIG_FILE` (default `sqlprof.toml`), then apply `SQL_LOG_PATH` / `SQL_LOG_FREQ`.
    /// A missing file is not an error: it just contributes no settings.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(s) => toml::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(anyhow::anyhow!("read {}: {}", path, e)),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: ProfilerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Override file values with whatever `lookup` returns. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_LOG_PATH).filter(|v| !v.trim().is_empty()) {
            self.profiler.sql_log_path = Some(path);
        }
        if let Some(freq) = lookup(ENV_LOG_FREQ).filter(|v| !v.trim().is_empty()) {
            let freq: f64 = freq.trim().parse().map_err(|e| {
                anyhow::anyhow!("{} must be a number, got {:?}: {}", ENV_LOG_FREQ, freq, e)
            })?;
            self.profiler.sql_log_freq = Some(freq);
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(path) = &self.profiler.sql_log_path {
            anyhow::ensure!(
                !path.is_empty(),
                "profiler.sql_log_path must be non-empty"
            );
        }
        if let Some(freq) = self.profiler.sql_log_freq {
            anyhow::ensure!(
                (0.0..=1.0).contains(&freq),
                "profiler.sql_log_freq must be within [0, 1], got {}",
                freq
            );
        }
        Ok(())
    }

    /// `Some` only when both the log path and the frequency are configured.
    pub fn sampling(&self) -> Option<SamplingSettings> {
        let path = self.profiler.sql_log_path.as_ref()?;
        let frequency = self.profiler.sql_log_freq?;
        Some(SamplingSettings {
            log_path: PathBuf::from(path),
            frequency,
            seed: self.profiler.seed,
        })
    }
}
