use regex::Regex;

use crate::{
    classifier::{is_skipped, referenced_names},
    export_collector::collect_exports,
    graph::ProjectGraph,
    parse::{ModuleId, OtherReference, ReferenceSite},
    state::{AnalysisResult, Classification, ProjectState, ResultSymbol},
};

/// Knobs of the analysis pass.
#[derive(Debug, Default, Clone)]
pub struct AnalysisOptions {
    /// Modules whose paths match never count as evidence of use.
    pub skip: Option<Regex>,
    /// Leave out exports that are used inside their own module.
    pub unused_in_module: bool,
}

/// Runs the analysis over every module of the graph, in path order.
pub fn analyze_project(graph: &ProjectGraph, options: &AnalysisOptions) -> ProjectState {
    let mut state = ProjectState::new();
    for id in graph.list_modules() {
        analyze_module(graph, id, options, |result| state.on_result(result));
    }
    // entry points are used by whoever runs the project
    for &id in graph.entry_points() {
        state.on_result(AnalysisResult {
            module: graph.path_of(id).to_path_buf(),
            classification: Classification::DefinitelyUsed,
            symbols: Vec::new(),
        });
    }
    state
}

/// Emits the results for a single module.
pub fn analyze_module(
    graph: &ProjectGraph,
    id: ModuleId,
    options: &AnalysisOptions,
    mut on_result: impl FnMut(AnalysisResult),
) {
    let skip = options.skip.as_ref();
    let path = graph.path_of(id);

    let exported = collect_exports(graph, id)
        .into_iter()
        .map(|symbol| ResultSymbol {
            used_in_module: graph.identifier_occurrences(id, &symbol.name) > 1,
            name: symbol.name,
            line: symbol.line,
        })
        .collect::<Vec<_>>();

    let referenced = referenced_names(graph, id, skip);
    if referenced.is_all() {
        on_result(AnalysisResult {
            module: path.to_path_buf(),
            classification: Classification::DefinitelyUsed,
            symbols: exported,
        });
    } else {
        let unused = exported
            .into_iter()
            .filter(|symbol| !referenced.contains(&symbol.name))
            .filter(|symbol| !(options.unused_in_module && symbol.used_in_module))
            .collect();
        on_result(AnalysisResult {
            module: path.to_path_buf(),
            classification: Classification::PotentiallyUnused,
            symbols: unused,
        });
    }

    if is_skipped(graph, id, skip) {
        return;
    }
    // side effect imports and star re-exports keep their targets alive
    for reference in graph.module(id).references.iter() {
        let keeps_target_alive = matches!(
            reference.site,
            ReferenceSite::Other(OtherReference::SideEffectImport)
                | ReferenceSite::Other(OtherReference::StarReExport)
        );
        if keeps_target_alive && reference.target != id {
            on_result(AnalysisResult {
                module: graph.path_of(reference.target).to_path_buf(),
                classification: Classification::DefinitelyUsed,
                symbols: Vec::new(),
            });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use logger::VecLogger;
    use pretty_assertions::assert_eq;
    use test_tmpdir::test_tmpdir;
    use tsconfig::TsConfig;

    fn load(tmp: &test_tmpdir::TmpDir) -> ProjectGraph {
        let config = TsConfig::load(&tmp.root_join("tsconfig.json")).unwrap();
        let logger = VecLogger::new();
        ProjectGraph::load(&logger, &config).unwrap()
    }

    fn unused_names(state: &ProjectState) -> Vec<(String, Vec<String>)> {
        state
            .definitely_unused()
            .into_iter()
            .map(|r| {
                (
                    r.module.file_name().unwrap().to_string_lossy().to_string(),
                    r.symbols.iter().map(|s| s.name.clone()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_used_in_module_flag() {
        let tmp = test_tmpdir!(
            "tsconfig.json" => "{}",
            "src/a.ts" => "export const helper = 1;\nexport const uses = helper + 1;\n"
        );
        let graph = load(&tmp);
        let a = graph.id_of(&tmp.root_join("src/a.ts")).unwrap();
        let mut results = Vec::new();
        analyze_module(&graph, a, &AnalysisOptions::default(), |r| results.push(r));
        assert_eq!(
            results,
            vec![AnalysisResult {
                module: tmp.root_join("src/a.ts"),
                classification: Classification::PotentiallyUnused,
                symbols: vec![
                    ResultSymbol {
                        name: "helper".to_string(),
                        line: Some(1),
                        used_in_module: true,
                    },
                    ResultSymbol {
                        name: "uses".to_string(),
                        line: Some(2),
                        used_in_module: false,
                    },
                ],
            }]
        );

        let options = AnalysisOptions {
            unused_in_module: true,
            ..Default::default()
        };
        let state = analyze_project(&graph, &options);
        assert_eq!(
            unused_names(&state),
            vec![("a.ts".to_string(), vec!["uses".to_string()])]
        );
    }

    #[test]
    fn test_star_reexport_and_side_effect_targets_are_used() {
        let tmp = test_tmpdir!(
            "tsconfig.json" => "{}",
            "src/index.ts" => "export * from './impl';\nimport './polyfill';\n",
            "src/impl.ts" => "export const impl = 1;\n",
            "src/polyfill.ts" => "export const patched = true;\n"
        );
        let graph = load(&tmp);
        let state = analyze_project(&graph, &AnalysisOptions::default());
        assert_eq!(
            unused_names(&state),
            vec![("index.ts".to_string(), vec!["impl".to_string()])]
        );
    }
}
