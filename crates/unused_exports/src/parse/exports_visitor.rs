use super::data::{DeclaredExport, DEFAULT_EXPORT, IGNORE_COMMENT};
use ahashmap::AHashMap;
use swc_common::{
    comments::{Comments, SingleThreadedComments},
    BytePos, SourceMap, Spanned,
};
use swc_ecma_ast::{
    Decl, ExportAll, ExportDecl, ExportDefaultDecl, ExportDefaultExpr, ExportSpecifier,
    ModuleDecl, ModuleExportName, ModuleItem, NamedExport, ObjectPatProp, Pat, Stmt,
    TsImportEqualsDecl, TsModuleName,
};
use swc_ecma_visit::Visit;

// AST visitor that collects the exports a module declares in its own source text.
//
// Only top-level module items are inspected: `export` inside a namespace body
// does not make a module export.
pub struct ExportsVisitor<'a> {
    source_map: &'a SourceMap,
    comments: &'a SingleThreadedComments,
    // line of each top-level declaration, for `export { local }` lists
    local_decl_lines: AHashMap<String, (u32, bool)>,
    pub exports: Vec<DeclaredExport>,
    // `export * from './foo'` generates ["./foo"]
    pub star_reexports: Vec<String>,
}

impl<'a> ExportsVisitor<'a> {
    pub fn new(source_map: &'a SourceMap, comments: &'a SingleThreadedComments) -> Self {
        Self {
            source_map,
            comments,
            local_decl_lines: AHashMap::default(),
            exports: Vec::new(),
            star_reexports: Vec::new(),
        }
    }

    /// Collects exports from the top level of a module.
    pub fn collect(mut self, items: &[ModuleItem]) -> Self {
        for item in items {
            if let ModuleItem::Stmt(Stmt::Decl(decl)) = item {
                let line = self.line_of(decl.span_lo());
                let ignored = self.has_ignore_comment(decl.span_lo());
                for name in decl_names(decl) {
                    self.local_decl_lines
                        .entry(name)
                        .and_modify(|(l, _)| *l = (*l).min(line))
                        .or_insert((line, ignored));
                }
            }
        }
        for item in items {
            if let ModuleItem::ModuleDecl(decl) = item {
                self.visit_module_decl(decl);
            }
        }
        self
    }

    fn line_of(&self, pos: BytePos) -> u32 {
        self.source_map.lookup_char_pos(pos).line as u32
    }

    fn has_ignore_comment(&self, lo: BytePos) -> bool {
        has_ignore_comment(self.comments, lo)
    }

    fn push(&mut self, name: impl Into<String>, line: u32, ignored: bool) {
        self.exports.push(DeclaredExport {
            name: name.into(),
            line,
            ignored,
        });
    }

    /**
     * Handles local export lists
     * - `export { foo }`
     * - `export { foo as bar }`
     * - `export { foo as default }`
     *
     * The line reported is the line of the local declaration when there is one.
     */
    fn handle_local_specifiers(&mut self, export: &NamedExport) {
        let statement_ignored = self.has_ignore_comment(export.span_lo());
        for spec in export.specifiers.iter() {
            if let ExportSpecifier::Named(named) = spec {
                let local = named.orig.atom().to_string();
                let exported = named
                    .exported
                    .as_ref()
                    .map(|e| e.atom().to_string())
                    .unwrap_or_else(|| local.clone());
                let (line, decl_ignored) = self
                    .local_decl_lines
                    .get(&local)
                    .copied()
                    .unwrap_or_else(|| (self.line_of(named.span_lo()), false));
                let ignored = statement_ignored
                    || decl_ignored
                    || self.has_ignore_comment(named.span_lo());
                self.push(exported, line, ignored);
            }
        }
    }

    /**
     * Handles re-exports, which export names from this module at the line of
     * the re-export
     * - `export { foo as bar } from 'foo'`
     * - `export * as ns from 'foo'`
     */
    fn handle_from_specifiers(&mut self, export: &NamedExport) {
        let statement_ignored = self.has_ignore_comment(export.span_lo());
        for spec in export.specifiers.iter() {
            let name = match spec {
                ExportSpecifier::Namespace(ns) => ns.name.atom().to_string(),
                ExportSpecifier::Default(default) => default.exported.sym.to_string(),
                ExportSpecifier::Named(named) => named
                    .exported
                    .as_ref()
                    .unwrap_or(&named.orig)
                    .atom()
                    .to_string(),
            };
            let ignored = statement_ignored || self.has_ignore_comment(spec.span_lo());
            let line = self.line_of(spec.span_lo());
            self.push(name, line, ignored);
        }
    }
}

/// True if any comment in the leading comment run at `lo` is exactly the
/// ignore sentinel. A doc comment may sit before or after the sentinel.
pub fn has_ignore_comment(comments: &SingleThreadedComments, lo: BytePos) -> bool {
    if let Some(leading) = comments.get_leading(lo) {
        return leading.iter().any(|c| c.text.trim() == IGNORE_COMMENT);
    }
    false
}

/// Names bound by a declaration.
pub fn decl_names(decl: &Decl) -> Vec<String> {
    match decl {
        Decl::Class(decl) => vec![decl.ident.sym.to_string()],
        Decl::Fn(decl) => vec![decl.ident.sym.to_string()],
        Decl::Var(decl) => {
            let mut names = Vec::new();
            for d in decl.decls.iter() {
                pat_names(&d.name, &mut names);
            }
            names
        }
        Decl::Using(decl) => {
            let mut names = Vec::new();
            for d in decl.decls.iter() {
                pat_names(&d.name, &mut names);
            }
            names
        }
        Decl::TsInterface(decl) => vec![decl.id.sym.to_string()],
        Decl::TsTypeAlias(decl) => vec![decl.id.sym.to_string()],
        Decl::TsEnum(decl) => vec![decl.id.sym.to_string()],
        Decl::TsModule(decl) => match &decl.id {
            TsModuleName::Ident(ident) => vec![ident.sym.to_string()],
            // `declare module "foo"` augments another module
            TsModuleName::Str(_) => vec![],
        },
    }
}

/// Binding names introduced by a (possibly destructuring) pattern.
pub fn pat_names(pat: &Pat, out: &mut Vec<String>) {
    match pat {
        Pat::Ident(ident) => out.push(ident.sym.to_string()),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                pat_names(elem, out);
            }
        }
        Pat::Object(object) => {
            for prop in object.props.iter() {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pat_names(&kv.value, out),
                    ObjectPatProp::Assign(assign) => out.push(assign.key.sym.to_string()),
                    ObjectPatProp::Rest(rest) => pat_names(&rest.arg, out),
                }
            }
        }
        Pat::Rest(rest) => pat_names(&rest.arg, out),
        Pat::Assign(assign) => pat_names(&assign.left, out),
        Pat::Invalid(_) | Pat::Expr(_) => {}
    }
}

impl Visit for ExportsVisitor<'_> {
    // Handles `export const foo = 1`, `export class Foo {}`, `export interface Foo {}`, ...
    fn visit_export_decl(&mut self, export: &ExportDecl) {
        let ignored = self.has_ignore_comment(export.span_lo());
        match &export.decl {
            // each declarator reports its own line
            Decl::Var(var) => {
                for declarator in var.decls.iter() {
                    let line = self.line_of(declarator.span_lo());
                    let mut names = Vec::new();
                    pat_names(&declarator.name, &mut names);
                    for name in names {
                        self.push(name, line, ignored);
                    }
                }
            }
            decl => {
                let line = self.line_of(export.span_lo());
                for name in decl_names(decl) {
                    self.push(name, line, ignored);
                }
            }
        }
    }

    // Handles `export default function foo() {}` and `export default class {}`
    fn visit_export_default_decl(&mut self, decl: &ExportDefaultDecl) {
        let line = self.line_of(decl.span_lo());
        let ignored = self.has_ignore_comment(decl.span_lo());
        self.push(DEFAULT_EXPORT, line, ignored);
    }

    // Handles `export default foo`
    fn visit_export_default_expr(&mut self, expr: &ExportDefaultExpr) {
        let line = self.line_of(expr.span_lo());
        let ignored = self.has_ignore_comment(expr.span_lo());
        self.push(DEFAULT_EXPORT, line, ignored);
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        if export.src.is_some() {
            self.handle_from_specifiers(export);
        } else {
            self.handle_local_specifiers(export);
        }
    }

    // `export * from './foo'` exports whatever foo exports, expanded later
    fn visit_export_all(&mut self, export: &ExportAll) {
        self.star_reexports.push(export.src.value.to_string());
    }

    // `export import foo = require('./foo')` and `export import Bar = Foo.Bar`
    fn visit_ts_import_equals_decl(&mut self, decl: &TsImportEqualsDecl) {
        if decl.is_export {
            let line = self.line_of(decl.span_lo());
            let ignored = self.has_ignore_comment(decl.span_lo());
            self.push(decl.id.sym.to_string(), line, ignored);
        }
    }

    // `export = foo` and `export as namespace Foo` do not add named exports
    fn visit_module_decl(&mut self, decl: &ModuleDecl) {
        match decl {
            ModuleDecl::ExportDecl(d) => self.visit_export_decl(d),
            ModuleDecl::ExportNamed(d) => self.visit_named_export(d),
            ModuleDecl::ExportDefaultDecl(d) => self.visit_export_default_decl(d),
            ModuleDecl::ExportDefaultExpr(d) => self.visit_export_default_expr(d),
            ModuleDecl::ExportAll(d) => self.visit_export_all(d),
            ModuleDecl::TsImportEquals(d) => self.visit_ts_import_equals_decl(d),
            ModuleDecl::Import(_)
            | ModuleDecl::TsExportAssignment(_)
            | ModuleDecl::TsNamespaceExport(_) => {}
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use swc_utils_parse::parse_ecma_src;

    fn collect(src: &str) -> (Vec<(String, u32, bool)>, Vec<String>) {
        let parsed = parse_ecma_src("test.ts", src).unwrap();
        let visitor = ExportsVisitor::new(&parsed.source_map, &parsed.comments)
            .collect(&parsed.module.body);
        (
            visitor
                .exports
                .into_iter()
                .map(|e| (e.name, e.line, e.ignored))
                .collect(),
            visitor.star_reexports,
        )
    }

    fn export(name: &str, line: u32) -> (String, u32, bool) {
        (name.to_string(), line, false)
    }

    #[test]
    fn test_declarations() {
        let (exports, _) = collect(
            r#"export const a = 1, { b, c: [d] } = obj;
export function fn() {}
export class Cls {}
export interface Iface {}
export type Alias = string;
export enum Enum { A }
export namespace Ns { export const inner = 1; }
export default function () {}
export import Eq = Ns.inner;
"#,
        );
        assert_eq!(
            exports,
            vec![
                export("a", 1),
                export("b", 1),
                export("d", 1),
                export("fn", 2),
                export("Cls", 3),
                export("Iface", 4),
                export("Alias", 5),
                export("Enum", 6),
                export("Ns", 7),
                export("default", 8),
                export("Eq", 9),
            ]
        );
    }

    #[test]
    fn test_export_lists_use_declaration_line() {
        let (exports, _) = collect(
            r#"const a = 1;

function b() {}
export { a, b as renamed, a as default };
"#,
        );
        assert_eq!(
            exports,
            vec![export("a", 1), export("renamed", 3), export("default", 1)]
        );
    }

    #[test]
    fn test_reexports_use_specifier_line() {
        let (exports, stars) = collect(
            r#"export {
  x,
  y as z,
} from './other';
export * as ns from './ns';
export * from './star';
"#,
        );
        assert_eq!(exports, vec![export("x", 2), export("z", 3), export("ns", 5)]);
        assert_eq!(stars, vec!["./star".to_string()]);
    }

    #[test]
    fn test_ignore_comment_with_doc_comment() {
        let (exports, _) = collect(
            r#"// ts-prune-ignore-next
/** docs */
export const first = 1;
/** docs */
// ts-prune-ignore-next
export const second = 2;
// ts-prune-ignore-next-not-really
export const third = 3;
"#,
        );
        assert_eq!(
            exports,
            vec![
                ("first".to_string(), 3, true),
                ("second".to_string(), 6, true),
                ("third".to_string(), 8, false),
            ]
        );
    }

    #[test]
    fn test_export_assignment_is_not_a_named_export() {
        let (exports, _) = collect("const a = 1;\nexport = a;\n");
        assert_eq!(exports, vec![]);
    }
}
