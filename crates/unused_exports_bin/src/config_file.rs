use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use unused_exports::UnusedExportsJSONConfig;

/// Key holding the config inside a package.json.
const PACKAGE_JSON_KEY: &str = "ts-prune";

/// Dedicated config files, in lookup order. Both are read as HJSON, which
/// also accepts plain JSON.
const RC_FILE_NAMES: &[&str] = &[".ts-prunerc", ".ts-prunerc.json"];

#[derive(Debug)]
pub struct FoundConfig {
    pub path: PathBuf,
    pub config: UnusedExportsJSONConfig,
}

/// Searches `start` and its ancestors for a config. In each directory a
/// package.json with a `"ts-prune"` key wins over the rc files.
pub fn find_config_file(start: &Path) -> Result<Option<FoundConfig>> {
    for dir in start.ancestors() {
        let package_json = dir.join("package.json");
        if package_json.is_file() {
            if let Some(config) = read_package_json_config(&package_json)? {
                return Ok(Some(FoundConfig {
                    path: package_json,
                    config,
                }));
            }
        }

        for name in RC_FILE_NAMES {
            let rc_path = dir.join(name);
            if rc_path.is_file() {
                let config = read_rc_file(&rc_path)?;
                return Ok(Some(FoundConfig {
                    path: rc_path,
                    config,
                }));
            }
        }
    }
    Ok(None)
}

fn read_rc_file(path: &Path) -> Result<UnusedExportsJSONConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_hjson::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn read_package_json_config(path: &Path) -> Result<Option<UnusedExportsJSONConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let package: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    package
        .get(PACKAGE_JSON_KEY)
        .map(|value| {
            serde_json::from_value(value.clone()).with_context(|| {
                format!(
                    "invalid \"{}\" config in {}",
                    PACKAGE_JSON_KEY,
                    path.display()
                )
            })
        })
        .transpose()
}
