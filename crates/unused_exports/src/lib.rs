mod analyzer;
mod cfg;
mod classifier;
mod export_collector;
mod fixer;
mod graph;
pub mod parse;
mod report;
mod resolve;
mod state;
mod walk;

use std::path::Path;

use anyhow::{Context, Result};
use logger::Logger;
use tsconfig::TsConfig;

pub use analyzer::{analyze_module, analyze_project, AnalysisOptions};
pub use cfg::{ConfigError, UnusedExportsConfig, UnusedExportsJSONConfig, DEFAULT_PROJECT};
pub use classifier::referenced_names;
pub use export_collector::{collect_exports, ExportSymbol};
pub use fixer::{fix_unused_exports, FixSummary};
pub use graph::{IncomingReference, ProjectGraph};
pub use report::{FileReport, UnusedExportsReport};
pub use resolve::ProjectResolver;
pub use state::{AnalysisResult, Classification, ProjectState, ResultSymbol};
pub use walk::walk_project_files;

/// Loads the project named by `config.project` and reports its unused
/// exports, with paths relative to `cwd`.
pub fn find_unused_exports(
    logger: impl Logger + Sync,
    config: &UnusedExportsConfig,
    cwd: &Path,
) -> Result<UnusedExportsReport> {
    // walked paths and resolved imports must agree on one spelling of each file
    let tsconfig_path = std::fs::canonicalize(cwd.join(&config.project))
        .with_context(|| format!("could not find project {}", config.project.display()))?;
    let tsconfig = TsConfig::load(&tsconfig_path)
        .with_context(|| format!("failed to load {}", tsconfig_path.display()))?;
    logger.log(format!("loaded {}", tsconfig_path.display()));

    let graph = ProjectGraph::load(&logger, &tsconfig)?;
    let state = analyze_project(&graph, &config.analysis_options());
    logger.log(format!(
        "analyzed {} modules ({} results)",
        graph.len(),
        state.results().len()
    ));

    Ok(UnusedExportsReport::new(
        state.definitely_unused(),
        cwd,
        config.ignore.as_ref(),
    ))
}
