use std::path::{Path, PathBuf};

use ahashmap::{AHashMap, AHashSet};
use anyhow::{anyhow, Result};
use logger::Logger;
use rayon::{iter::Either, prelude::*};
use tsconfig::TsConfig;

use crate::{
    parse::{get_file_module_info, ModuleId, ModuleInfo, RawModuleInfo, ReferenceSite},
    resolve::ProjectResolver,
    walk::walk_project_files,
};

/// A reference from another module into the module it is indexed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingReference {
    pub from: ModuleId,
    pub site: ReferenceSite,
    pub line: u32,
}

/// Every module of a project, with module specifiers resolved and a reverse
/// index of which sites in other modules point at each module.
///
/// Modules are numbered in path order, so iterating over [ModuleId]s visits
/// files in a stable order across runs.
#[derive(Debug, Default)]
pub struct ProjectGraph {
    modules: Vec<ModuleInfo>,
    module_ids: AHashMap<PathBuf, ModuleId>,
    incoming: Vec<Vec<IncomingReference>>,
    entry_points: Vec<ModuleId>,
}

impl ProjectGraph {
    /// Walks, parses and resolves every file of the project described by
    /// `tsconfig`.
    pub fn load(logger: impl Logger + Sync, tsconfig: &TsConfig) -> Result<Self> {
        let files = walk_project_files(&logger, tsconfig)?;
        logger.log(format!("parsing {} project files", files.len()));

        let (parsed, errors): (Vec<(PathBuf, RawModuleInfo)>, Vec<anyhow::Error>) = files
            .into_par_iter()
            .map(|path| -> Result<(PathBuf, RawModuleInfo)> {
                let info = get_file_module_info(&logger, &path)?;
                Ok((path, info))
            })
            .partition_map(|r| match r {
                Ok(x) => Either::Left(x),
                Err(e) => Either::Right(e),
            });

        if let Some(err) = combine_errors(errors) {
            return Err(err);
        }

        let entry_points = tsconfig.files.clone().unwrap_or_default();
        Ok(Self::from_parsed(&logger, tsconfig, parsed, &entry_points))
    }

    /// Builds the graph from already-collected module info.
    pub fn from_parsed(
        logger: impl Logger + Sync,
        tsconfig: &TsConfig,
        mut parsed: Vec<(PathBuf, RawModuleInfo)>,
        entry_points: &[PathBuf],
    ) -> Self {
        // parallel parsing finishes in any order
        parsed.sort_by(|(a, _), (b, _)| a.cmp(b));

        let module_ids = parsed
            .iter()
            .enumerate()
            .map(|(id, (path, _))| (path.clone(), id))
            .collect::<AHashMap<PathBuf, ModuleId>>();
        let known_files = module_ids.keys().cloned().collect::<AHashSet<PathBuf>>();
        let resolver = ProjectResolver::new(&known_files, tsconfig);

        let modules = parsed
            .into_par_iter()
            .map(|(path, raw)| raw.resolve(&logger, &path, &resolver, &module_ids))
            .collect::<Vec<_>>();

        let mut incoming = vec![Vec::new(); modules.len()];
        for (from, module) in modules.iter().enumerate() {
            for reference in module.references.iter() {
                // a module importing itself is not evidence of use
                if reference.target == from {
                    continue;
                }
                incoming[reference.target].push(IncomingReference {
                    from,
                    site: reference.site.clone(),
                    line: reference.line,
                });
            }
        }

        let entry_points = entry_points
            .iter()
            .filter_map(|path| module_ids.get(path).copied())
            .collect();

        Self {
            modules,
            module_ids,
            incoming,
            entry_points,
        }
    }

    /// All module ids, in path order.
    pub fn list_modules(&self) -> impl Iterator<Item = ModuleId> {
        0..self.modules.len()
    }

    pub fn module(&self, id: ModuleId) -> &ModuleInfo {
        &self.modules[id]
    }

    pub fn path_of(&self, id: ModuleId) -> &Path {
        &self.modules[id].path
    }

    pub fn id_of(&self, path: &Path) -> Option<ModuleId> {
        self.module_ids.get(path).copied()
    }

    /// Sites in other modules that reference `id`.
    pub fn referencing_sites_for(&self, id: ModuleId) -> &[IncomingReference] {
        &self.incoming[id]
    }

    /// How many identifier tokens named `name` occur in the module.
    pub fn identifier_occurrences(&self, id: ModuleId, name: &str) -> u32 {
        self.modules[id]
            .identifier_counts
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Modules listed in the tsconfig `files`.
    pub fn entry_points(&self) -> &[ModuleId] {
        &self.entry_points
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn combine_errors(errors: Vec<anyhow::Error>) -> Option<anyhow::Error> {
    match errors.len() {
        0 => None,
        1 => errors.into_iter().next(),
        _ => Some(anyhow!(
            "Multiple errors occurred while parsing the project:\n{}",
            errors
                .into_iter()
                .map(|x| format!("{:#}", x))
                .collect::<Vec<_>>()
                .join("\n")
        )),
    }
}
