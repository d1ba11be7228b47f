use regex::Regex;

use crate::{
    graph::ProjectGraph,
    parse::{ModuleId, ReferenceSite, UsedNames},
};

/// Whether a module is excluded from contributing usage evidence.
pub fn is_skipped(graph: &ProjectGraph, id: ModuleId, skip: Option<&Regex>) -> bool {
    skip.is_some_and(|re| re.is_match(&graph.path_of(id).to_string_lossy()))
}

/// Names of `id` used by the other modules of the project.
///
/// Sites in modules matching `skip` are not counted. A dynamic import, or a
/// namespace import whose usage cannot be narrowed, uses every name.
pub fn referenced_names(graph: &ProjectGraph, id: ModuleId, skip: Option<&Regex>) -> UsedNames {
    let mut used = UsedNames::default();
    for incoming in graph.referencing_sites_for(id) {
        if is_skipped(graph, incoming.from, skip) {
            continue;
        }
        match &incoming.site {
            ReferenceSite::NamedImportClause { names, namespace } => {
                for name in names {
                    used.push(name.as_str());
                }
                if let Some(namespace) = namespace {
                    used.merge(namespace.clone());
                }
            }
            ReferenceSite::ReExportClause { names } => {
                for name in names {
                    used.push(name.as_str());
                }
            }
            ReferenceSite::DynamicImportCall => used = UsedNames::All,
            ReferenceSite::Other(_) => {}
        }
        if used.is_all() {
            break;
        }
    }
    used
}
