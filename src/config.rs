/// Configuration management for the family tree engine
use crate::assembly::UnknownDatePlacement;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineSettings,
    pub ordering: OrderingSettings,
    pub age: AgeSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub parallel_reads: bool,
    /// Used when a request names no distance. Absent means unbounded.
    pub default_max_distance: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingSettings {
    pub female_marker: String,
    pub unknown_marriage_dates: UnknownDatePlacement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeSettings {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub thread_ids: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineSettings {
                parallel_reads: true,
                default_max_distance: None,
            },
            ordering: OrderingSettings {
                female_marker: "f".to_string(),
                unknown_marriage_dates: UnknownDatePlacement::MostRecent,
            },
            age: AgeSettings { as_of: None },
            logging: LoggingSettings {
                level: "info".to_string(),
                thread_ids: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from `FAMILY_TREE_*` variables looked up through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(parallel) = var("FAMILY_TREE_PARALLEL_READS") {
            self.engine.parallel_reads = parallel
                .parse()
                .with_context(|| format!("FAMILY_TREE_PARALLEL_READS={}", parallel))?;
        }

        if let Some(distance) = var("FAMILY_TREE_MAX_DISTANCE") {
            self.engine.default_max_distance = Some(
                distance
                    .parse()
                    .with_context(|| format!("FAMILY_TREE_MAX_DISTANCE={}", distance))?,
            );
        }

        if let Some(marker) = var("FAMILY_TREE_FEMALE_MARKER") {
            self.ordering.female_marker = marker;
        }

        if let Some(as_of) = var("FAMILY_TREE_AS_OF") {
            self.age.as_of = Some(
                NaiveDate::parse_from_str(&as_of, "%Y-%m-%d")
                    .with_context(|| format!("FAMILY_TREE_AS_OF={}", as_of))?,
            );
        }

        if let Some(level) = var("FAMILY_TREE_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge_with(&mut self, other: Config) {
        let defaults = Config::default();

        self.engine.parallel_reads = other.engine.parallel_reads;
        if other.engine.default_max_distance.is_some() {
            self.engine.default_max_distance = other.engine.default_max_distance;
        }

        if other.ordering.female_marker != defaults.ordering.female_marker {
            self.ordering.female_marker = other.ordering.female_marker;
        }
        self.ordering.unknown_marriage_dates = other.ordering.unknown_marriage_dates;

        if other.age.as_of.is_some() {
            self.age.as_of = other.age.as_of;
        }

        if other.logging.level != defaults.logging.level {
            self.logging.level = other.logging.level;
        }
        self.logging.thread_ids = other.logging.thread_ids;
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(distance) = self.engine.default_max_distance {
            if distance < 0 {
                return Err(anyhow::anyhow!(
                    "Default max distance must be non-negative, got {}",
                    distance
                ));
            }
        }

        if self.ordering.female_marker.trim().is_empty() {
            return Err(anyhow::anyhow!("Female marker must not be empty"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(anyhow::anyhow!("Log level must not be empty"));
        }

        Ok(())
    }
}
