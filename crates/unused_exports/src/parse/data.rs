use std::path::{Path, PathBuf};

use ahashmap::AHashMap;
use logger::Logger;
use swc_common::FileName;
use swc_ecma_loader::resolve::Resolve;

/// Comment text that excludes the following export from analysis.
pub const IGNORE_COMMENT: &str = "ts-prune-ignore-next";

/// Name under which a module's default export is tracked.
pub const DEFAULT_EXPORT: &str = "default";

/// An export declared in a module's own source text.
///
/// The same name can be declared more than once (overloads, declaration
/// merging). Collapsing those is left to the export collector.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DeclaredExport {
    pub name: String,
    pub line: u32,
    pub ignored: bool,
}

/// Names of a module used through some reference.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum UsedNames {
    /// Usage could not be narrowed, every export counts as used.
    All,
    /// Names in first-encounter order, without duplicates.
    Names(Vec<String>),
}

impl Default for UsedNames {
    fn default() -> Self {
        UsedNames::Names(Vec::new())
    }
}

impl UsedNames {
    pub fn push(&mut self, name: impl Into<String>) {
        if let UsedNames::Names(names) = self {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    pub fn merge(&mut self, other: UsedNames) {
        match other {
            UsedNames::All => *self = UsedNames::All,
            UsedNames::Names(names) => {
                for name in names {
                    self.push(name);
                }
            }
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, UsedNames::All)
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            UsedNames::All => true,
            UsedNames::Names(names) => names.iter().any(|n| n == name),
        }
    }
}

/// References that never name individual exports.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OtherReference {
    /// `import './polyfill'`
    SideEffectImport,
    /// `export * from './m'` and `export * as ns from './m'`
    StarReExport,
    /// `import m = require('./m')`
    ImportEquals,
}

/// A syntactic location in one module that can name exports of another.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ReferenceSite {
    /// `import a, { b as c } from './m'` records `["default", "b"]`. A
    /// namespace sub-import carries the names used through the namespace.
    NamedImportClause {
        names: Vec<String>,
        namespace: Option<UsedNames>,
    },
    /// `export { a as b } from './m'` records `["a"]`.
    ReExportClause { names: Vec<String> },
    /// `import('./m')` or `require('./m')`.
    DynamicImportCall,
    Other(OtherReference),
}

/// A reference site along with the raw module specifier it points at.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RawReference {
    pub specifier: String,
    pub site: ReferenceSite,
    pub line: u32,
}

/// What a single file declares and references, before module specifiers are
/// resolved against the project.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct RawModuleInfo {
    pub exports: Vec<DeclaredExport>,
    // `export * from './m'` generates ["./m"]
    pub star_reexports: Vec<String>,
    pub references: Vec<RawReference>,
    pub identifier_counts: AHashMap<String, u32>,
}

/// Index of a module in a [crate::graph::ProjectGraph].
pub type ModuleId = usize;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ResolvedReference {
    pub target: ModuleId,
    pub site: ReferenceSite,
    pub line: u32,
}

/// [RawModuleInfo] with every resolvable specifier mapped to a project module.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct ModuleInfo {
    pub path: PathBuf,
    pub exports: Vec<DeclaredExport>,
    pub star_reexports: Vec<ModuleId>,
    pub references: Vec<ResolvedReference>,
    pub identifier_counts: AHashMap<String, u32>,
}

impl RawModuleInfo {
    /// Resolves module specifiers to project modules.
    ///
    /// Specifiers that do not resolve to a module of the project (packages,
    /// missing files, assets) are dropped.
    pub fn resolve(
        self,
        logger: impl Logger,
        path: &Path,
        resolver: &impl Resolve,
        module_ids: &AHashMap<PathBuf, ModuleId>,
    ) -> ModuleInfo {
        let base = FileName::Real(path.to_path_buf());
        let resolve_id = |specifier: &str| -> Option<ModuleId> {
            match resolver.resolve(&base, specifier) {
                Ok(resolution) => match resolution.filename {
                    FileName::Real(resolved) => module_ids.get(&resolved).copied(),
                    _ => None,
                },
                Err(e) => {
                    logger::debug_logf!(
                        logger,
                        "{}: dropping unresolved import '{}' ({:#})",
                        path.display(),
                        specifier,
                        e
                    );
                    None
                }
            }
        };

        ModuleInfo {
            path: path.to_path_buf(),
            exports: self.exports,
            star_reexports: self
                .star_reexports
                .iter()
                .filter_map(|specifier| resolve_id(specifier))
                .collect(),
            references: self
                .references
                .into_iter()
                .filter_map(|reference| {
                    resolve_id(&reference.specifier).map(|target| ResolvedReference {
                        target,
                        site: reference.site,
                        line: reference.line,
                    })
                })
                .collect(),
            identifier_counts: self.identifier_counts,
        }
    }
}
