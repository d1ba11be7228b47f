use std::path::PathBuf;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analyzer::AnalysisOptions;

pub const DEFAULT_PROJECT: &str = "tsconfig.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid `{field}` regex '{pattern}': {source}")]
    InvalidRegex {
        field: &'static str,
        pattern: String,
        source: regex::Error,
    },
}

/// A JSON serializable proxy for [UnusedExportsConfig].
///
/// Every field is optional so that configs from several sources (defaults,
/// a config file, command line flags) can be layered with [Self::merge].
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UnusedExportsJSONConfig {
    /// Path to the tsconfig.json of the project to analyze.
    ///
    /// Relative paths are resolved against the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Regex over reported file paths. Matching files are left out of the
    /// output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<String>,
    /// Regex over file paths. Imports made by matching files do not count
    /// as uses (e.g. `\.test\.ts$`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    /// Leave out exports that are only used inside their own module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unused_in_module: Option<bool>,
    /// Exit with a non-zero status when anything is reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
    /// Print the report as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
    /// Remove the `export` of unused symbols in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<bool>,
}

impl UnusedExportsJSONConfig {
    /// Layers `other` on top of `self`: fields set in `other` win.
    pub fn merge(self, other: UnusedExportsJSONConfig) -> UnusedExportsJSONConfig {
        UnusedExportsJSONConfig {
            project: other.project.or(self.project),
            ignore: other.ignore.or(self.ignore),
            skip: other.skip.or(self.skip),
            unused_in_module: other.unused_in_module.or(self.unused_in_module),
            error: other.error.or(self.error),
            json: other.json.or(self.json),
            fix: other.fix.or(self.fix),
        }
    }
}

/// Configuration of an unused exports run.
#[derive(Debug, Clone)]
pub struct UnusedExportsConfig {
    pub project: PathBuf,
    pub ignore: Option<Regex>,
    pub skip: Option<Regex>,
    pub unused_in_module: bool,
    pub error: bool,
    pub json: bool,
    pub fix: bool,
}

impl Default for UnusedExportsConfig {
    fn default() -> Self {
        Self {
            project: PathBuf::from(DEFAULT_PROJECT),
            ignore: None,
            skip: None,
            unused_in_module: false,
            error: false,
            json: false,
            fix: false,
        }
    }
}

impl UnusedExportsConfig {
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            skip: self.skip.clone(),
            unused_in_module: self.unused_in_module,
        }
    }
}

fn compile_regex(field: &'static str, pattern: Option<String>) -> Result<Option<Regex>, ConfigError> {
    pattern
        .map(|pattern| {
            Regex::new(&pattern).map_err(|source| ConfigError::InvalidRegex {
                field,
                pattern,
                source,
            })
        })
        .transpose()
}

impl TryFrom<UnusedExportsJSONConfig> for UnusedExportsConfig {
    type Error = ConfigError;
    fn try_from(value: UnusedExportsJSONConfig) -> Result<Self, Self::Error> {
        Ok(UnusedExportsConfig {
            project: PathBuf::from(
                value
                    .project
                    .unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
            ),
            ignore: compile_regex("ignore", value.ignore)?,
            skip: compile_regex("skip", value.skip)?,
            unused_in_module: value.unused_in_module.unwrap_or(false),
            error: value.error.unwrap_or(false),
            json: value.json.unwrap_or(false),
            fix: value.fix.unwrap_or(false),
        })
    }
}
