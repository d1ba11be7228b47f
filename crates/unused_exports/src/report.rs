use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use path_slash::PathExt;
use regex::Regex;
use serde::Serialize;

use crate::state::{AnalysisResult, ResultSymbol};

/// Unused exports of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// `/`-separated path relative to the directory the report was made for.
    pub file: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub symbols: Vec<ResultSymbol>,
}

/// Report of unused exports within a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UnusedExportsReport {
    pub files: Vec<FileReport>,
}

fn relative_slash_path(path: &Path, relative_to: &Path) -> String {
    let relative = pathdiff::diff_paths(path, relative_to).unwrap_or_else(|| path.to_path_buf());
    relative.to_slash_lossy().to_string()
}

impl UnusedExportsReport {
    /// Builds a report from the unused results of a run, with paths relative
    /// to `relative_to`. Files whose relative path matches `ignore` are left
    /// out.
    pub fn new<'a>(
        unused: impl IntoIterator<Item = &'a AnalysisResult>,
        relative_to: &Path,
        ignore: Option<&Regex>,
    ) -> Self {
        let files = unused
            .into_iter()
            .map(|result| FileReport {
                file: relative_slash_path(&result.module, relative_to),
                path: result.module.clone(),
                symbols: result.symbols.clone(),
            })
            .filter(|report| !ignore.is_some_and(|re| re.is_match(&report.file)))
            .collect();
        Self { files }
    }

    /// Number of reported symbols, one per line of text output.
    pub fn count(&self) -> usize {
        self.files.iter().map(|f| f.symbols.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Display for UnusedExportsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for file in self.files.iter() {
            for symbol in file.symbols.iter() {
                match symbol.line {
                    Some(line) => write!(f, "{}:{} - {}", file.file, line, symbol.name)?,
                    None => write!(f, "{} - {}", file.file, symbol.name)?,
                }
                if symbol.used_in_module {
                    write!(f, " (used in module)")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::Classification;
    use pretty_assertions::assert_eq;

    fn unused(module: &str, symbols: Vec<ResultSymbol>) -> AnalysisResult {
        AnalysisResult {
            module: PathBuf::from(module),
            classification: Classification::PotentiallyUnused,
            symbols,
        }
    }

    fn symbol(name: &str, line: Option<u32>, used_in_module: bool) -> ResultSymbol {
        ResultSymbol {
            name: name.to_string(),
            line,
            used_in_module,
        }
    }

    #[test]
    fn test_text_lines() {
        let results = vec![
            unused(
                "/p/src/a.ts",
                vec![symbol("a", Some(1), false), symbol("b", Some(3), true)],
            ),
            unused("/p/src/index.ts", vec![symbol("star", None, false)]),
        ];
        let report = UnusedExportsReport::new(&results, Path::new("/p"), None);
        assert_eq!(
            report.to_string(),
            "src/a.ts:1 - a\nsrc/a.ts:3 - b (used in module)\nsrc/index.ts - star\n"
        );
        assert_eq!(report.count(), 3);
    }

    #[test]
    fn test_ignore_applies_before_counting() {
        let results = vec![
            unused("/p/src/a.ts", vec![symbol("a", Some(1), false)]),
            unused("/p/src/gen/b.ts", vec![symbol("b", Some(1), false)]),
        ];
        let ignore = Regex::new("^src/gen/").unwrap();
        let report = UnusedExportsReport::new(&results, Path::new("/p"), Some(&ignore));
        assert_eq!(report.count(), 1);
        assert_eq!(report.to_string(), "src/a.ts:1 - a\n");
    }

    #[test]
    fn test_json_shape() {
        let results = vec![unused("/p/a.ts", vec![symbol("a", Some(2), true)])];
        let report = UnusedExportsReport::new(&results, Path::new("/p"), None);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                { "file": "a.ts", "symbols": [{ "name": "a", "line": 2, "usedInModule": true }] }
            ])
        );
    }
}
