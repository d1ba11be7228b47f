pub mod data;
mod exports_visitor;
mod identifier_counts;
mod namespace_usage;
mod references_visitor;

use std::path::Path;

use anyhow::{Context, Result};
use logger::Logger;
use logger_srcfile::{SrcFileLogger, WrapFileLogger};
use swc_common::{Globals, Mark, GLOBALS};
use swc_ecma_ast::Module;
use swc_ecma_transforms::resolver;
use swc_ecma_visit::VisitMutWith;
use swc_utils_parse::ParsedSource;

pub use data::*;
pub use exports_visitor::{decl_names, has_ignore_comment, ExportsVisitor};
pub use identifier_counts::identifier_counts;
pub use namespace_usage::namespace_usage;
pub use references_visitor::ReferencesVisitor;

/// Binds identifiers to their declarations, then runs `f` over the module.
///
/// After resolution, identifiers naming the same binding share a
/// `(sym, ctxt)` [swc_ecma_ast::Id].
pub fn resolve_identifiers<R>(module: &mut Module, f: impl FnOnce(&Module) -> R) -> R {
    let globals = Globals::new();
    GLOBALS.set(&globals, || {
        let unresolved_mark = Mark::fresh(Mark::root());
        let top_level_mark = Mark::fresh(Mark::root());
        module.visit_mut_with(&mut resolver(unresolved_mark, top_level_mark, true));
        f(module)
    })
}

/// Collects exports, references and identifier counts from a parsed file.
pub fn get_module_info(parsed: &mut ParsedSource) -> RawModuleInfo {
    let exports_visitor =
        ExportsVisitor::new(&parsed.source_map, &parsed.comments).collect(&parsed.module.body);
    let source_map = parsed.source_map.clone();
    let (references, identifier_counts) = resolve_identifiers(&mut parsed.module, |module| {
        (
            ReferencesVisitor::new(&source_map, module).collect(),
            identifier_counts(module),
        )
    });

    RawModuleInfo {
        exports: exports_visitor.exports,
        star_reexports: exports_visitor.star_reexports,
        references,
        identifier_counts,
    }
}

/// Reads, parses and collects a single source file.
///
/// Syntax errors the parser recovers from are logged as warnings. An
/// unrecoverable syntax error fails the whole file.
pub fn get_file_module_info(logger: impl Logger, path: &Path) -> Result<RawModuleInfo> {
    let mut parsed = swc_utils_parse::parse_file(path)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    if !parsed.recovered_errors.is_empty() {
        let file_logger = WrapFileLogger::new(parsed.source_map.clone(), logger);
        for (span, message) in parsed.recovered_errors.iter() {
            file_logger.src_warn(span, message);
        }
    }

    Ok(get_module_info(&mut parsed))
}
