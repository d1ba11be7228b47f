use std::ops::Range;

use ahashmap::AHashSet;
use anyhow::{Context, Result};
use logger::Logger;
use logger_srcfile::{SrcFileLogger, WrapFileLogger};
use swc_common::Spanned;
use swc_ecma_ast::{DefaultDecl, ExportSpecifier, ModuleDecl, ModuleItem, NamedExport};
use swc_utils_parse::ParsedSource;

use crate::{parse::decl_names, parse::DEFAULT_EXPORT, report::UnusedExportsReport};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixSummary {
    pub files_changed: usize,
    pub exports_removed: usize,
}

/// Removes the `export` of every reported symbol with a known line,
/// rewriting the files in place.
///
/// Files are re-read from disk, so the report must be fresh.
pub fn fix_unused_exports(logger: impl Logger, report: &UnusedExportsReport) -> Result<FixSummary> {
    let mut summary = FixSummary::default();
    for file in report.files.iter() {
        // names only reachable through `export *` have no declaration here
        let unused = file
            .symbols
            .iter()
            .filter(|s| s.line.is_some())
            .map(|s| s.name.clone())
            .collect::<AHashSet<String>>();
        if unused.is_empty() {
            continue;
        }

        let parsed = swc_utils_parse::parse_file(&file.path)
            .with_context(|| format!("failed to parse {} for fixing", file.path.display()))?;
        let (fixed, removed) = remove_exports(&logger, &parsed, &unused);
        if removed == 0 {
            continue;
        }
        std::fs::write(&file.path, fixed)
            .with_context(|| format!("failed to write {}", file.path.display()))?;
        logger.log(format!(
            "removed {} export{} from {}",
            removed,
            if removed == 1 { "" } else { "s" },
            file.file
        ));
        summary.files_changed += 1;
        summary.exports_removed += removed;
    }
    Ok(summary)
}

/// Rewrites the source of `parsed` without the exports named in `unused`.
/// Returns the new text and how many exported names were removed.
pub fn remove_exports(
    logger: impl Logger,
    parsed: &ParsedSource,
    unused: &AHashSet<String>,
) -> (String, usize) {
    let logger = WrapFileLogger::new(parsed.source_map.clone(), logger);
    let src = parsed.src();
    let mut edits: Vec<Range<usize>> = Vec::new();
    let mut removed = 0;

    for item in parsed.module.body.iter() {
        let ModuleItem::ModuleDecl(decl) = item else {
            continue;
        };
        let start = parsed.offset_of(decl.span_lo());
        match decl {
            // export const a = 1;
            ModuleDecl::ExportDecl(export) => {
                let names = decl_names(&export.decl);
                let unused_count = names.iter().filter(|n| unused.contains(*n)).count();
                if unused_count == 0 {
                    continue;
                }
                if unused_count < names.len() {
                    logger.src_warn(
                        &decl.span(),
                        "not removing `export` of a declaration that also exports used names",
                    );
                    continue;
                }
                match keyword_prefix(src, start, &["export"]) {
                    Some(range) => {
                        edits.push(range);
                        removed += names.len();
                    }
                    None => warn_unfixable(&logger, decl),
                }
            }
            // export default function foo() {}
            ModuleDecl::ExportDefaultDecl(export) if unused.contains(DEFAULT_EXPORT) => {
                let keeps_declaration = match &export.decl {
                    DefaultDecl::Class(class) => class.ident.is_some(),
                    DefaultDecl::Fn(func) => func.ident.is_some(),
                    DefaultDecl::TsInterfaceDecl(_) => true,
                };
                let edit = if keeps_declaration {
                    keyword_prefix(src, start, &["export", "default"])
                } else {
                    Some(statement_range(parsed, decl))
                };
                match edit {
                    Some(range) => {
                        edits.push(range);
                        removed += 1;
                    }
                    None => warn_unfixable(&logger, decl),
                }
            }
            // export default foo;
            ModuleDecl::ExportDefaultExpr(_) if unused.contains(DEFAULT_EXPORT) => {
                edits.push(statement_range(parsed, decl));
                removed += 1;
            }
            // export { a, b as c } and export { a } from './a'
            ModuleDecl::ExportNamed(export) => {
                removed += named_export_edits(parsed, decl, export, unused, &mut edits);
            }
            // export import A = B.A;
            ModuleDecl::TsImportEquals(import)
                if import.is_export && unused.contains(import.id.sym.as_str()) =>
            {
                match keyword_prefix(src, start, &["export"]) {
                    Some(range) => {
                        edits.push(range);
                        removed += 1;
                    }
                    None => warn_unfixable(&logger, decl),
                }
            }
            _ => {}
        }
    }

    (apply_edits(src, edits), removed)
}

fn warn_unfixable(logger: &impl SrcFileLogger, decl: &ModuleDecl) {
    logger.src_warn(
        &decl.span(),
        "could not locate the export keyword, leaving the export in place",
    );
}

fn specifier_name(specifier: &ExportSpecifier) -> String {
    match specifier {
        ExportSpecifier::Named(named) => named
            .exported
            .as_ref()
            .unwrap_or(&named.orig)
            .atom()
            .to_string(),
        ExportSpecifier::Namespace(namespace) => namespace.name.atom().to_string(),
        ExportSpecifier::Default(default) => default.exported.sym.to_string(),
    }
}

fn named_export_edits(
    parsed: &ParsedSource,
    decl: &ModuleDecl,
    export: &NamedExport,
    unused: &AHashSet<String>,
    edits: &mut Vec<Range<usize>>,
) -> usize {
    let specifiers = &export.specifiers;
    let is_unused = specifiers
        .iter()
        .map(|s| unused.contains(&specifier_name(s)))
        .collect::<Vec<_>>();
    let removed = is_unused.iter().filter(|u| **u).count();
    if removed == 0 {
        return 0;
    }
    if removed == specifiers.len() {
        edits.push(statement_range(parsed, decl));
        return removed;
    }

    let lo = |i: usize| parsed.offset_of(specifiers[i].span_lo());
    let hi = |i: usize| parsed.offset_of(specifiers[i].span_hi());
    // at least one specifier is kept here
    let last_kept = is_unused.iter().rposition(|u| !*u).unwrap_or(0);
    for (i, _) in is_unused.iter().enumerate().filter(|(_, u)| **u) {
        if i < last_kept {
            // `a, ` up to the next specifier
            edits.push(lo(i)..lo(i + 1));
        }
    }
    if last_kept + 1 < specifiers.len() {
        // `, c, d` after the last kept specifier
        edits.push(hi(last_kept)..hi(specifiers.len() - 1));
    }
    removed
}

/// The whole statement, plus the line break that ends it.
fn statement_range(parsed: &ParsedSource, decl: &ModuleDecl) -> Range<usize> {
    let src = parsed.src();
    let start = parsed.offset_of(decl.span_lo());
    let mut end = parsed.offset_of(decl.span_hi());
    if src[end..].starts_with(';') {
        end += 1;
    }
    if src[end..].starts_with("\r\n") {
        end += 2;
    } else if src[end..].starts_with('\n') {
        end += 1;
    }
    start..end
}

/// The range covering `keywords` at `start`, each followed by whitespace.
fn keyword_prefix(src: &str, start: usize, keywords: &[&str]) -> Option<Range<usize>> {
    let mut end = start;
    for keyword in keywords {
        let rest = src.get(end..)?.strip_prefix(keyword)?;
        let trimmed = rest.trim_start();
        if trimmed.len() == rest.len() {
            // `exported` is not the `export` keyword
            return None;
        }
        end += keyword.len() + (rest.len() - trimmed.len());
    }
    Some(start..end)
}

/// Deletes the ranges from `src`, back to front. Overlapping ranges are
/// dropped.
fn apply_edits(src: &str, mut edits: Vec<Range<usize>>) -> String {
    edits.sort_by(|a, b| b.start.cmp(&a.start));
    let mut out = src.to_string();
    let mut floor = usize::MAX;
    for edit in edits {
        if edit.end > floor {
            continue;
        }
        out.replace_range(edit.clone(), "");
        floor = edit.start;
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use logger::VecLogger;
    use pretty_assertions::assert_eq;
    use swc_utils_parse::parse_ecma_src;

    fn fix(src: &str, unused: &[&str]) -> (String, usize) {
        let parsed = parse_ecma_src("test.ts", src).unwrap();
        let unused = unused.iter().map(|s| s.to_string()).collect();
        let logger = VecLogger::new();
        remove_exports(&logger, &parsed, &unused)
    }

    #[test]
    fn test_removes_export_keywords() {
        assert_eq!(
            fix(
                "export const a = 1;\nexport const used = 2;\nexport function f() {}\nexport interface I {}\n",
                &["a", "f", "I"]
            ),
            (
                "const a = 1;\nexport const used = 2;\nfunction f() {}\ninterface I {}\n".to_string(),
                3
            )
        );
    }

    #[test]
    fn test_partially_unused_declaration_is_left() {
        let parsed = parse_ecma_src("test.ts", "export const a = 1, b = 2;\n").unwrap();
        let unused = ["a".to_string()].into_iter().collect();
        let logger = VecLogger::new();
        let (fixed, removed) = remove_exports(&logger, &parsed, &unused);
        assert_eq!(fixed, "export const a = 1, b = 2;\n");
        assert_eq!(removed, 0);
        let logs = logger.get_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].starts_with("WARN: "));
    }

    #[test]
    fn test_default_exports() {
        assert_eq!(
            fix("export default function named() {}\n", &["default"]).0,
            "function named() {}\n"
        );
        assert_eq!(
            fix("const x = 1;\nexport default x;\n", &["default"]).0,
            "const x = 1;\n"
        );
        assert_eq!(
            fix("export default class {}\nexport const keep = 1;\n", &["default"]).0,
            "export const keep = 1;\n"
        );
    }

    #[test]
    fn test_export_lists() {
        assert_eq!(
            fix("const a = 1, b = 2, c = 3;\nexport { a, b, c };\n", &["a", "c"]),
            ("const a = 1, b = 2, c = 3;\nexport { b };\n".to_string(), 2)
        );
        assert_eq!(
            fix("export { x as y, z } from './m';\n", &["y"]).0,
            "export { z } from './m';\n"
        );
        assert_eq!(
            fix("export { gone } from './m';\nexport * as ns from './n';\n", &["gone", "ns"]).0,
            ""
        );
        assert_eq!(
            fix("export { a, b, c, d };\n", &["c", "d"]).0,
            "export { a, b };\n"
        );
    }

    #[test]
    fn test_apply_edits_skips_overlaps() {
        assert_eq!(apply_edits("0123456789", vec![2..4, 3..6, 8..9]), "012679");
    }
}
