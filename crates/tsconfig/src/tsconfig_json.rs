use crate::error::TsConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// The subset of a tsconfig.json file that affects which files belong to a
/// project and how their imports resolve.
#[derive(Debug, Deserialize, PartialEq, Eq, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TsConfigJson {
    #[serde(default)]
    pub extends: Option<Extends>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub compiler_options: TsConfigCompilerOptions,
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
#[serde(untagged)]
pub enum Extends {
    One(String),
    Many(Vec<String>),
}

impl Extends {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Extends::One(one) => std::slice::from_ref(one),
            Extends::Many(many) => many,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TsConfigCompilerOptions {
    pub base_url: Option<String>,
    pub paths: Option<HashMap<String, Vec<String>>>,
    pub allow_js: Option<bool>,
    pub out_dir: Option<String>,
}

impl TsConfigJson {
    /// Parses tsconfig text. Strict JSON is tried first; tsconfig files commonly
    /// carry comments and trailing commas, so JSON5 is the fallback.
    pub fn parse(path: &Path, content: &str) -> Result<Self, TsConfigError> {
        let value: serde_json::Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(_) => json_five::from_str::<serde_json::Value>(content).map_err(|e| {
                TsConfigError::ParseError {
                    path: path.to_path_buf(),
                    message: format!("{:?}", e),
                }
            })?,
        };
        serde_json::from_value(value).map_err(|source| TsConfigError::SerdeError {
            path: path.to_path_buf(),
            source,
        })
    }

    // Reads and parses the tsconfig.json at the provided path
    pub fn from_path(path: &Path) -> Result<Self, TsConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| TsConfigError::IOError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_with_comments_and_trailing_commas() {
        let parsed = TsConfigJson::parse(
            Path::new("tsconfig.json"),
            r#"{
                // project settings
                "compilerOptions": {
                    "baseUrl": "./src",
                    "allowJs": true,
                },
                "files": ["src/index.ts",],
            }"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            TsConfigJson {
                files: Some(vec!["src/index.ts".to_string()]),
                compiler_options: TsConfigCompilerOptions {
                    base_url: Some("./src".to_string()),
                    allow_js: Some(true),
                    ..Default::default()
                },
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_extends_accepts_string_or_list() {
        let one = TsConfigJson::parse(Path::new("a.json"), r#"{"extends": "./base"}"#).unwrap();
        assert_eq!(one.extends.unwrap().as_slice(), &["./base".to_string()]);
        let many =
            TsConfigJson::parse(Path::new("a.json"), r#"{"extends": ["./a", "./b"]}"#).unwrap();
        assert_eq!(
            many.extends.unwrap().as_slice(),
            &["./a".to_string(), "./b".to_string()]
        );
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let err = TsConfigJson::parse(Path::new("bad.json"), "{ not json").unwrap_err();
        assert!(matches!(err, TsConfigError::ParseError { .. }));
    }
}
