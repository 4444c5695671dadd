use crate::reports::formatters::{JsonFormatter, ReportFormatter, TextFormatter};
use crate::types::LeveledView;
use anyhow::Result;
use serde::Serialize;

/// Report generator for creating various output formats
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate report in the specified format
    pub fn generate<V: LeveledView + Serialize>(&self, view: &V, format: &str) -> Result<String> {
        match format.to_lowercase().as_str() {
            "json" => JsonFormatter.format(view),
            "text" => TextFormatter.format(view),
            _ => Err(anyhow::anyhow!("Unsupported format: {}", format)),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
