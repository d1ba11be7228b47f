use crate::error::TsConfigError;
use crate::tsconfig_json::TsConfigJson;
use path_clean::PathClean;
use path_slash::PathExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A `compilerOptions.paths` entry, e.g. `"@app/*": ["src/app/*"]`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PathAlias {
    pub pattern: String,
    /// Target patterns, already made absolute against the paths base.
    pub targets: Vec<String>,
}

/// A tsconfig.json with its `extends` chain flattened.
///
/// Every path in here is absolute. Relative paths are resolved against the
/// directory of the config file that declared them, the way tsc does it.
/// Glob patterns are stored as `/`-separated strings.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TsConfig {
    pub config_path: PathBuf,
    pub files: Option<Vec<PathBuf>>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub base_url: Option<PathBuf>,
    pub paths: Vec<PathAlias>,
    pub allow_js: bool,
    pub out_dir: Option<PathBuf>,
}

// A value plus the directory of the config that declared it
type Scoped<T> = Option<(PathBuf, T)>;

#[derive(Debug, Default)]
struct MergedLayers {
    files: Scoped<Vec<String>>,
    include: Scoped<Vec<String>>,
    exclude: Scoped<Vec<String>>,
    base_url: Scoped<String>,
    paths: Scoped<HashMap<String, Vec<String>>>,
    allow_js: Option<bool>,
    out_dir: Scoped<String>,
}

impl MergedLayers {
    fn overlay(&mut self, other: MergedLayers) {
        self.files = other.files.or(self.files.take());
        self.include = other.include.or(self.include.take());
        self.exclude = other.exclude.or(self.exclude.take());
        self.base_url = other.base_url.or(self.base_url.take());
        self.paths = other.paths.or(self.paths.take());
        self.allow_js = other.allow_js.or(self.allow_js);
        self.out_dir = other.out_dir.or(self.out_dir.take());
    }

    fn from_json(dir: &Path, json: TsConfigJson) -> Self {
        let scoped = |v| (dir.to_path_buf(), v);
        let options = json.compiler_options;
        MergedLayers {
            files: json.files.map(scoped),
            include: json.include.map(scoped),
            exclude: json.exclude.map(scoped),
            base_url: options.base_url.map(|v| (dir.to_path_buf(), v)),
            paths: options.paths.map(|v| (dir.to_path_buf(), v)),
            allow_js: options.allow_js,
            out_dir: options.out_dir.map(|v| (dir.to_path_buf(), v)),
        }
    }
}

impl TsConfig {
    /// Loads a tsconfig and everything it extends.
    pub fn load(config_path: &Path) -> Result<Self, TsConfigError> {
        let config_path = config_path.to_path_buf().clean();
        let mut visiting = Vec::new();
        let merged = load_layers(&config_path, &mut visiting)?;

        let join_all = |scoped: Scoped<Vec<String>>| {
            scoped.map(|(dir, patterns)| {
                patterns
                    .iter()
                    .map(|p| dir.join(p).clean().to_slash_lossy().to_string())
                    .collect::<Vec<_>>()
            })
        };

        let base_url = merged
            .base_url
            .map(|(dir, base_url)| dir.join(base_url).clean());

        // `paths` targets are relative to baseUrl when present, and to the
        // declaring config otherwise
        let paths = match merged.paths {
            Some((dir, paths)) => {
                let paths_base = base_url.clone().unwrap_or(dir);
                let mut aliases = paths
                    .into_iter()
                    .map(|(pattern, targets)| PathAlias {
                        pattern,
                        targets: targets
                            .iter()
                            .map(|t| paths_base.join(t).clean().to_slash_lossy().to_string())
                            .collect(),
                    })
                    .collect::<Vec<_>>();
                aliases.sort_by(|a, b| a.pattern.cmp(&b.pattern));
                aliases
            }
            None => Vec::new(),
        };

        Ok(TsConfig {
            files: merged.files.map(|(dir, files)| {
                files.iter().map(|f| dir.join(f).clean()).collect()
            }),
            include: join_all(merged.include),
            exclude: join_all(merged.exclude),
            base_url,
            paths,
            allow_js: merged.allow_js.unwrap_or(false),
            out_dir: merged.out_dir.map(|(dir, out)| dir.join(out).clean()),
            config_path,
        })
    }

    /// The directory containing the root config file.
    pub fn root_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

fn load_layers(
    config_path: &Path,
    visiting: &mut Vec<PathBuf>,
) -> Result<MergedLayers, TsConfigError> {
    if visiting.iter().any(|p| p == config_path) {
        return Err(TsConfigError::CircularExtends {
            path: config_path.to_path_buf(),
        });
    }
    visiting.push(config_path.to_path_buf());

    let json = TsConfigJson::from_path(config_path)?;
    let dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut merged = MergedLayers::default();
    if let Some(extends) = &json.extends {
        // later entries in an extends list win over earlier ones
        for spec in extends.as_slice() {
            let parent_path = resolve_extends(&dir, spec, config_path)?;
            merged.overlay(load_layers(&parent_path, visiting)?);
        }
    }
    merged.overlay(MergedLayers::from_json(&dir, json));

    visiting.pop();
    Ok(merged)
}

fn resolve_extends(dir: &Path, spec: &str, from: &Path) -> Result<PathBuf, TsConfigError> {
    let try_file = |candidate: PathBuf| -> Option<PathBuf> {
        if candidate.is_file() {
            return Some(candidate.clean());
        }
        let mut with_ext = candidate.clone().into_os_string();
        with_ext.push(".json");
        let with_ext = PathBuf::from(with_ext);
        if with_ext.is_file() {
            return Some(with_ext.clean());
        }
        None
    };

    let found = if spec.starts_with('.') || Path::new(spec).is_absolute() {
        try_file(dir.join(spec))
    } else {
        // package specifier, looked up through node_modules like tsc does
        dir.ancestors().find_map(|ancestor| {
            let in_modules = ancestor.join("node_modules").join(spec);
            try_file(in_modules.clone()).or_else(|| try_file(in_modules.join("tsconfig.json")))
        })
    };

    found.ok_or_else(|| TsConfigError::ExtendsNotFound {
        extends: spec.to_string(),
        from: from.to_path_buf(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_tmpdir::test_tmpdir;

    #[test]
    fn test_extends_chain_resolves_relative_to_declaring_config() {
        let tmp = test_tmpdir!(
            "tsconfig.json" => r#"{
                "extends": "./configs/base",
                "files": ["src/main.ts"]
            }"#,
            "configs/base.json" => r#"{
                // shared options
                "compilerOptions": {
                    "baseUrl": "..",
                    "paths": { "@lib/*": ["lib/*"] },
                    "outDir": "../dist",
                },
                "include": ["../src"],
                "files": ["../ignored.ts"]
            }"#
        );

        let config = TsConfig::load(&tmp.root_join("tsconfig.json")).unwrap();
        assert_eq!(config.files, Some(vec![tmp.root_join("src/main.ts")]));
        assert_eq!(
            config.include,
            Some(vec![tmp.root_join("src").to_slash_lossy().to_string()])
        );
        assert_eq!(config.base_url, Some(tmp.root().to_path_buf()));
        assert_eq!(config.out_dir, Some(tmp.root_join("dist")));
        assert_eq!(
            config.paths,
            vec![PathAlias {
                pattern: "@lib/*".to_string(),
                targets: vec![tmp.root_join("lib/*").to_slash_lossy().to_string()],
            }]
        );
        assert!(!config.allow_js);
    }

    #[test]
    fn test_extends_from_node_modules_package() {
        let tmp = test_tmpdir!(
            "tsconfig.json" => r#"{ "extends": "@tsconfig/strictest" }"#,
            "node_modules/@tsconfig/strictest/tsconfig.json" => r#"{ "compilerOptions": { "allowJs": true } }"#
        );
        let config = TsConfig::load(&tmp.root_join("tsconfig.json")).unwrap();
        assert!(config.allow_js);
    }

    #[test]
    fn test_load_cleans_the_config_path() {
        let tmp = test_tmpdir!(
            "packages/app/tsconfig.json" => r#"{ "include": ["src"] }"#
        );
        let config =
            TsConfig::load(&tmp.root_join("packages/lib/../app/./tsconfig.json")).unwrap();
        assert_eq!(config.config_path, tmp.root_join("packages/app/tsconfig.json"));
        assert_eq!(
            config.include,
            Some(vec![tmp.root_join("packages/app/src").to_slash_lossy().to_string()])
        );
    }

    #[test]
    fn test_circular_extends_is_an_error() {
        let tmp = test_tmpdir!(
            "a.json" => r#"{ "extends": "./b.json" }"#,
            "b.json" => r#"{ "extends": "./a.json" }"#
        );
        let err = TsConfig::load(&tmp.root_join("a.json")).unwrap_err();
        assert!(matches!(err, TsConfigError::CircularExtends { .. }), "{err}");
    }

    #[test]
    fn test_missing_extends_is_an_error() {
        let tmp = test_tmpdir!(
            "tsconfig.json" => r#"{ "extends": "./nope.json" }"#
        );
        let err = TsConfig::load(&tmp.root_join("tsconfig.json")).unwrap_err();
        assert!(matches!(err, TsConfigError::ExtendsNotFound { .. }), "{err}");
    }
}
