use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use jwalk::WalkDir;
use logger::Logger;
use path_slash::PathExt;
use tsconfig::TsConfig;

const TS_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".mts", ".cts"];
const JS_EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs"];

/// Directories tsc leaves out when a config has no `exclude`.
const DEFAULT_EXCLUDED_DIRS: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

pub fn is_project_source_file(path: &Path, allow_js: bool) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };
    TS_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
        || (allow_js && JS_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
}

fn has_glob_chars(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}

/// A pattern naming a directory (no wildcard and no extension in its last
/// segment, or an existing directory) matches everything beneath it.
fn expand_directory_pattern(pattern: &str) -> Vec<String> {
    let trimmed = pattern.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let looks_like_dir =
        !has_glob_chars(last) && (!last.contains('.') || Path::new(trimmed).is_dir());
    if looks_like_dir {
        vec![trimmed.to_string(), format!("{trimmed}/**/*")]
    } else {
        vec![trimmed.to_string()]
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().flat_map(|p| expand_directory_pattern(p)) {
        let glob = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid tsconfig glob '{pattern}'"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// The directory an include pattern is rooted at: its segments up to the
/// first one containing a wildcard.
fn pattern_walk_root(pattern: &str) -> PathBuf {
    let mut root = PathBuf::from("/");
    let mut segments = Vec::new();
    for segment in pattern.split('/') {
        if has_glob_chars(segment) {
            break;
        }
        segments.push(segment);
    }
    if segments.len() == pattern.split('/').count() {
        // no wildcard at all, the pattern itself (file or directory)
        return PathBuf::from(pattern);
    }
    for segment in segments.into_iter().filter(|s| !s.is_empty()) {
        root.push(segment);
    }
    root
}

/// Lists the source files belonging to a tsconfig project: `files` plus
/// whatever `include` matches and `exclude` does not. The result is sorted.
pub fn walk_project_files(logger: impl Logger, tsconfig: &TsConfig) -> Result<Vec<PathBuf>> {
    let root_dir = tsconfig.root_dir();
    let root_slash = root_dir.to_slash_lossy().to_string();

    // tsc: "files" without "include" means no include at all
    let include = match (&tsconfig.include, &tsconfig.files) {
        (Some(include), _) => include.clone(),
        (None, Some(_)) => Vec::new(),
        (None, None) => vec![format!("{root_slash}/**/*")],
    };
    let exclude = match &tsconfig.exclude {
        Some(exclude) => exclude.clone(),
        None => {
            let mut defaults = DEFAULT_EXCLUDED_DIRS
                .iter()
                .map(|dir| format!("{root_slash}/{dir}"))
                .collect::<Vec<_>>();
            if let Some(out_dir) = &tsconfig.out_dir {
                defaults.push(out_dir.to_slash_lossy().to_string());
            }
            defaults
        }
    };

    let include_set = build_globset(&include)?;
    let exclude_set = build_globset(&exclude)?;

    let mut walk_roots = include
        .iter()
        .map(|p| pattern_walk_root(p))
        .collect::<Vec<_>>();
    walk_roots.sort();
    walk_roots.dedup();
    // drop roots nested under another root
    let walk_roots = walk_roots
        .iter()
        .filter(|root| !walk_roots.iter().any(|other| other != *root && root.starts_with(other)))
        .cloned()
        .collect::<Vec<_>>();

    let mut found = Vec::new();
    for walk_root in walk_roots {
        if !walk_root.exists() {
            logger.log(format!(
                "include root {} does not exist, skipping",
                walk_root.display()
            ));
            continue;
        }
        found.extend(walk_included_files(
            &logger,
            &walk_root,
            &include_set,
            &exclude_set,
            tsconfig.allow_js,
        ));
    }

    for file in tsconfig.files.iter().flatten() {
        if !file.is_file() {
            bail!(
                "file '{}' listed in {} does not exist",
                file.display(),
                tsconfig.config_path.display()
            );
        }
        found.push(file.clone());
    }

    found.sort();
    found.dedup();
    Ok(found)
}

fn walk_included_files(
    logger: impl Logger,
    walk_root: &Path,
    include_set: &GlobSet,
    exclude_set: &GlobSet,
    allow_js: bool,
) -> Vec<PathBuf> {
    let dir_excludes = exclude_set.clone();
    let walk_dir = WalkDir::new(walk_root).process_read_dir(move |_, children| {
        children.iter_mut().for_each(|dir_entry_res| {
            // never descend into dependencies or excluded directories
            if let Ok(dir_entry) = dir_entry_res {
                if dir_entry.file_type.is_dir()
                    && (dir_entry.file_name() == "node_modules"
                        || dir_excludes.is_match(dir_entry.path().to_slash_lossy().as_ref()))
                {
                    dir_entry.read_children_path = None;
                }
            }
        });
    });

    walk_dir
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                logger.warn(format!("error during walkdir: {e}"));
                None
            }
        })
        .filter(|entry| entry.file_type.is_file())
        .map(|entry| entry.path())
        .filter(|path| is_project_source_file(path, allow_js))
        .filter(|path| {
            let slashed = path.to_slash_lossy();
            include_set.is_match(slashed.as_ref()) && !exclude_set.is_match(slashed.as_ref())
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use logger::VecLogger;
    use pretty_assertions::assert_eq;
    use test_tmpdir::test_tmpdir;

    fn relative(tmp: &test_tmpdir::TmpDir, files: Vec<PathBuf>) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(tmp.root())
                    .unwrap()
                    .to_slash_lossy()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_default_include_skips_dependencies_and_out_dir() {
        let tmp = test_tmpdir!(
            "tsconfig.json" => r#"{ "compilerOptions": { "outDir": "dist" } }"#,
            "src/a.ts" => "",
            "src/b.tsx" => "",
            "src/c.d.ts" => "",
            "src/d.js" => "",
            "src/e.json" => "",
            "dist/a.d.ts" => "",
            "node_modules/pkg/index.ts" => ""
        );
        let config = TsConfig::load(&tmp.root_join("tsconfig.json")).unwrap();
        let logger = VecLogger::new();
        let files = walk_project_files(&logger, &config).unwrap();
        assert_eq!(
            relative(&tmp, files),
            vec!["src/a.ts", "src/b.tsx", "src/c.d.ts"]
        );
    }

    #[test]
    fn test_include_exclude_and_allow_js() {
        let tmp = test_tmpdir!(
            "tsconfig.json" => r#"{
                "compilerOptions": { "allowJs": true },
                "include": ["src", "scripts/*.ts"],
                "exclude": ["src/generated"]
            }"#,
            "src/a.ts" => "",
            "src/legacy.js" => "",
            "src/generated/out.ts" => "",
            "scripts/build.ts" => "",
            "scripts/nested/skip.ts" => "",
            "other/outside.ts" => ""
        );
        let config = TsConfig::load(&tmp.root_join("tsconfig.json")).unwrap();
        let logger = VecLogger::new();
        let files = walk_project_files(&logger, &config).unwrap();
        assert_eq!(
            relative(&tmp, files),
            vec!["scripts/build.ts", "src/a.ts", "src/legacy.js"]
        );
    }

    #[test]
    fn test_files_only() {
        let tmp = test_tmpdir!(
            "tsconfig.json" => r#"{ "files": ["src/main.ts"] }"#,
            "src/main.ts" => "",
            "src/other.ts" => ""
        );
        let config = TsConfig::load(&tmp.root_join("tsconfig.json")).unwrap();
        let logger = VecLogger::new();
        let files = walk_project_files(&logger, &config).unwrap();
        assert_eq!(relative(&tmp, files), vec!["src/main.ts"]);
    }

    #[test]
    fn test_missing_listed_file_is_an_error() {
        let tmp = test_tmpdir!(
            "tsconfig.json" => r#"{ "files": ["src/missing.ts"] }"#
        );
        let config = TsConfig::load(&tmp.root_join("tsconfig.json")).unwrap();
        let logger = VecLogger::new();
        assert!(walk_project_files(&logger, &config).is_err());
    }
}
