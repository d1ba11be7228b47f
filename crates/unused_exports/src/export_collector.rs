use ahashmap::AHashSet;

use crate::{
    graph::ProjectGraph,
    parse::{DeclaredExport, ModuleId, DEFAULT_EXPORT},
};

/// An export of a module, after merging all of its declaration sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSymbol {
    pub name: String,
    /// Undefined for names only reachable through `export * from`.
    pub line: Option<u32>,
    pub ignored: bool,
}

/// Collapses repeated declarations of a name (overloads, declaration
/// merging) into one symbol at the earliest line. The earliest declaration
/// decides whether the symbol is ignored.
pub fn merge_declarations(declared: &[DeclaredExport]) -> Vec<ExportSymbol> {
    let mut merged: Vec<ExportSymbol> = Vec::new();
    for decl in declared {
        match merged.iter_mut().find(|s| s.name == decl.name) {
            Some(existing) => {
                if existing.line.map_or(true, |line| decl.line < line) {
                    existing.line = Some(decl.line);
                    existing.ignored = decl.ignored;
                }
            }
            None => merged.push(ExportSymbol {
                name: decl.name.clone(),
                line: Some(decl.line),
                ignored: decl.ignored,
            }),
        }
    }
    merged.sort_by_key(|s| s.line);
    merged
}

/// Names a module exports through its `export * from` statements, in the
/// order those statements appear. `default` is never re-exported by a star.
fn star_exported_names(
    graph: &ProjectGraph,
    id: ModuleId,
    visited: &mut AHashSet<ModuleId>,
    out: &mut Vec<ExportSymbol>,
) {
    if !visited.insert(id) {
        return;
    }
    for &target in graph.module(id).star_reexports.iter() {
        for symbol in merge_declarations(&graph.module(target).exports) {
            if symbol.name == DEFAULT_EXPORT || out.iter().any(|s| s.name == symbol.name) {
                continue;
            }
            out.push(ExportSymbol {
                name: symbol.name,
                line: None,
                ignored: symbol.ignored,
            });
        }
        star_exported_names(graph, target, visited, out);
    }
}

/// Every export of a module, including ignored ones.
pub fn all_exports(graph: &ProjectGraph, id: ModuleId) -> Vec<ExportSymbol> {
    let mut exports = merge_declarations(&graph.module(id).exports);

    let mut star_names = Vec::new();
    star_exported_names(graph, id, &mut AHashSet::default(), &mut star_names);
    for symbol in star_names {
        // a local declaration shadows a star re-export of the same name
        if !exports.iter().any(|s| s.name == symbol.name) {
            exports.push(symbol);
        }
    }
    exports
}

/// The exports of a module that take part in analysis: every export not
/// preceded by the ignore comment.
pub fn collect_exports(graph: &ProjectGraph, id: ModuleId) -> Vec<ExportSymbol> {
    all_exports(graph, id)
        .into_iter()
        .filter(|s| !s.ignored)
        .collect()
}
