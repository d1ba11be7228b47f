use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use ahashmap::AHashSet;
use anyhow::{anyhow, bail, Result};
use path_clean::PathClean;
use path_slash::PathBufExt;
use swc_common::FileName;
use swc_ecma_loader::resolve::{Resolution, Resolve};
use tsconfig::{PathAlias, TsConfig};

/// Extensions probed when a specifier omits one, in tsc's preference order.
const PROBED_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".d.ts", ".mts", ".d.mts", ".cts", ".d.cts", ".js", ".jsx", ".mjs", ".cjs",
];

/// Compiled JS extensions and the TS sources they are emitted from.
/// `import './foo.js'` in a TS project refers to `foo.ts`.
const EMITTED_EXTENSIONS: &[(&str, &[&str])] = &[
    (".js", &[".ts", ".tsx", ".d.ts"]),
    (".jsx", &[".tsx"]),
    (".mjs", &[".mts", ".d.mts"]),
    (".cjs", &[".cts", ".d.cts"]),
];

#[derive(Debug)]
enum AliasPattern {
    Exact(String),
    Wildcard { prefix: String, suffix: String },
}

impl AliasPattern {
    fn parse(pattern: &str) -> Self {
        match pattern.split_once('*') {
            Some((prefix, suffix)) => AliasPattern::Wildcard {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            },
            None => AliasPattern::Exact(pattern.to_string()),
        }
    }

    // the text matched by `*`, if the specifier matches
    fn matches<'s>(&self, specifier: &'s str) -> Option<&'s str> {
        match self {
            AliasPattern::Exact(exact) => (exact == specifier).then_some(""),
            AliasPattern::Wildcard { prefix, suffix } => specifier
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(suffix.as_str())),
        }
    }

    // exact patterns first, then longest prefix first
    fn priority(&self) -> (bool, std::cmp::Reverse<usize>) {
        match self {
            AliasPattern::Exact(exact) => (false, std::cmp::Reverse(exact.len())),
            AliasPattern::Wildcard { prefix, .. } => (true, std::cmp::Reverse(prefix.len())),
        }
    }
}

/// Resolves module specifiers to files of the project being analyzed.
///
/// Resolution only ever lands on a file in `known_files`; anything else
/// (packages in node_modules, assets, missing files) fails to resolve.
#[derive(Debug)]
pub struct ProjectResolver<'a> {
    known_files: &'a AHashSet<PathBuf>,
    base_url: Option<PathBuf>,
    paths: Vec<(AliasPattern, Vec<String>)>,
}

impl<'a> ProjectResolver<'a> {
    pub fn new(known_files: &'a AHashSet<PathBuf>, tsconfig: &TsConfig) -> Self {
        Self::new_with_paths(known_files, tsconfig.base_url.clone(), &tsconfig.paths)
    }

    pub fn new_with_paths(
        known_files: &'a AHashSet<PathBuf>,
        base_url: Option<PathBuf>,
        aliases: &[PathAlias],
    ) -> Self {
        let mut paths = aliases
            .iter()
            .map(|alias| (AliasPattern::parse(&alias.pattern), alias.targets.clone()))
            .collect::<Vec<_>>();
        paths.sort_by_key(|(pattern, _)| pattern.priority());
        Self {
            known_files,
            base_url,
            paths,
        }
    }

    fn known(&self, path: &Path) -> Option<PathBuf> {
        self.known_files.contains(path).then(|| path.to_path_buf())
    }

    /// Tries `candidate` as a file, with TS source substitution for emitted
    /// extensions, with probed extensions, and as a directory with an index.
    fn resolve_candidate(&self, candidate: &Path) -> Option<PathBuf> {
        if let Some(found) = self.known(candidate) {
            return Some(found);
        }

        let candidate_str = candidate.to_string_lossy();
        for (emitted, sources) in EMITTED_EXTENSIONS {
            if let Some(stem) = candidate_str.strip_suffix(emitted) {
                for source in sources.iter() {
                    if let Some(found) = self.known(&PathBuf::from(format!("{stem}{source}"))) {
                        return Some(found);
                    }
                }
            }
        }

        let with_extension = |path: &Path, ext: &str| {
            let mut os: OsString = path.as_os_str().to_owned();
            os.push(ext);
            PathBuf::from(os)
        };
        PROBED_EXTENSIONS
            .iter()
            .find_map(|ext| self.known(&with_extension(candidate, ext)))
            .or_else(|| {
                let index = candidate.join("index");
                PROBED_EXTENSIONS
                    .iter()
                    .find_map(|ext| self.known(&with_extension(&index, ext)))
            })
    }

    fn resolve_path(&self, base_file: &Path, specifier: &str) -> Result<PathBuf> {
        let is_relative = specifier == "."
            || specifier == ".."
            || specifier.starts_with("./")
            || specifier.starts_with("../");

        if is_relative || Path::new(specifier).is_absolute() {
            let base_dir = base_file.parent().unwrap_or_else(|| Path::new(""));
            let candidate = base_dir.join(PathBuf::from_slash(specifier)).clean();
            return self
                .resolve_candidate(&candidate)
                .ok_or_else(|| anyhow!("no project file at {}", candidate.display()));
        }

        // https://www.typescriptlang.org/docs/handbook/module-resolution.html#path-mapping
        for (pattern, targets) in self.paths.iter() {
            if let Some(matched) = pattern.matches(specifier) {
                for target in targets.iter() {
                    let candidate = PathBuf::from_slash(target.replacen('*', matched, 1)).clean();
                    if let Some(found) = self.resolve_candidate(&candidate) {
                        return Ok(found);
                    }
                }
            }
        }

        if let Some(base_url) = &self.base_url {
            let candidate = base_url.join(PathBuf::from_slash(specifier)).clean();
            if let Some(found) = self.resolve_candidate(&candidate) {
                return Ok(found);
            }
        }

        bail!("'{specifier}' is not a project file")
    }
}

impl Resolve for ProjectResolver<'_> {
    fn resolve(&self, base: &FileName, module_specifier: &str) -> Result<Resolution> {
        let base_file = match base {
            FileName::Real(path) => path,
            other => bail!("cannot resolve '{module_specifier}' from non-file {other}"),
        };
        let resolved = self.resolve_path(base_file, module_specifier)?;
        Ok(Resolution {
            filename: FileName::Real(resolved),
            slug: None,
        })
    }
}
