use super::data::{OtherReference, RawReference, ReferenceSite, DEFAULT_EXPORT};
use super::namespace_usage::{namespace_usage, static_string};
use ahashmap::AHashSet;
use swc_common::{SourceMap, Spanned};
use swc_ecma_ast::{
    BindingIdent, CallExpr, Callee, ExportAll, ExportSpecifier, Id, ImportDecl, ImportSpecifier,
    Module, NamedExport, TsEntityName, TsImportEqualsDecl, TsImportType, TsModuleRef, VarDecl,
};
use swc_ecma_visit::{Visit, VisitWith};

// AST visitor that collects every site in a module that references another
// module: static imports, re-exports, dynamic imports and requires.
pub struct ReferencesVisitor<'a> {
    source_map: &'a SourceMap,
    // the module being visited, for tracking namespace imports
    module: &'a Module,
    // const foo = require; // <- Binding
    require_bindings: AHashSet<Id>,
    // inside `declare const ...`, which types a global rather than binding a local
    in_ambient_decl: bool,
    pub references: Vec<RawReference>,
}

impl<'a> ReferencesVisitor<'a> {
    pub fn new(source_map: &'a SourceMap, module: &'a Module) -> Self {
        Self {
            source_map,
            module,
            require_bindings: AHashSet::default(),
            in_ambient_decl: false,
            references: Vec::new(),
        }
    }

    pub fn collect(mut self) -> Vec<RawReference> {
        let module = self.module;
        module.visit_with(&mut self);
        self.references
    }

    fn push(&mut self, specifier: impl Into<String>, site: ReferenceSite, span: swc_common::Span) {
        let line = self.source_map.lookup_char_pos(span.lo).line as u32;
        self.references.push(RawReference {
            specifier: specifier.into(),
            site,
            line,
        });
    }
}

fn first_entity_name(entity: &TsEntityName) -> String {
    match entity {
        TsEntityName::Ident(ident) => ident.sym.to_string(),
        TsEntityName::TsQualifiedName(qualified) => first_entity_name(&qualified.left),
    }
}

impl Visit for ReferencesVisitor<'_> {
    // import foo, { bar as baz } from './foo';
    // import * as ns from './foo';
    // import './foo';
    fn visit_import_decl(&mut self, import: &ImportDecl) {
        let src = import.src.value.to_string();
        if import.specifiers.is_empty() {
            self.push(
                src,
                ReferenceSite::Other(OtherReference::SideEffectImport),
                import.span,
            );
            return;
        }

        let mut names = Vec::new();
        let mut namespace = None;
        for specifier in import.specifiers.iter() {
            match specifier {
                // import { foo as bar } from './foo' records `foo`
                ImportSpecifier::Named(named) => names.push(match &named.imported {
                    Some(imported) => imported.atom().to_string(),
                    None => named.local.sym.to_string(),
                }),
                ImportSpecifier::Default(_) => names.push(DEFAULT_EXPORT.to_string()),
                ImportSpecifier::Namespace(ns) => {
                    namespace = Some(namespace_usage(self.module, &ns.local.to_id()))
                }
            }
        }
        self.push(
            src,
            ReferenceSite::NamedImportClause { names, namespace },
            import.span,
        );
    }

    // export { foo, bar as baz } from './foo';
    // export * as ns from './foo';
    fn visit_named_export(&mut self, export: &NamedExport) {
        let Some(src) = &export.src else {
            return;
        };
        let mut names = Vec::new();
        let mut has_namespace = false;
        for specifier in export.specifiers.iter() {
            match specifier {
                ExportSpecifier::Named(named) => names.push(named.orig.atom().to_string()),
                ExportSpecifier::Default(_) => names.push(DEFAULT_EXPORT.to_string()),
                ExportSpecifier::Namespace(_) => has_namespace = true,
            }
        }
        if has_namespace {
            self.push(
                src.value.to_string(),
                ReferenceSite::Other(OtherReference::StarReExport),
                export.span,
            );
        }
        if !names.is_empty() {
            self.push(
                src.value.to_string(),
                ReferenceSite::ReExportClause { names },
                export.span,
            );
        }
    }

    // export * from './foo';
    fn visit_export_all(&mut self, export: &ExportAll) {
        self.push(
            export.src.value.to_string(),
            ReferenceSite::Other(OtherReference::StarReExport),
            export.span,
        );
    }

    // import foo = require('./foo');
    fn visit_ts_import_equals_decl(&mut self, decl: &TsImportEqualsDecl) {
        if let TsModuleRef::TsExternalModuleRef(external) = &decl.module_ref {
            self.push(
                external.expr.value.to_string(),
                ReferenceSite::Other(OtherReference::ImportEquals),
                decl.span,
            );
        }
    }

    // let x: import('./foo').Bar
    fn visit_ts_import_type(&mut self, import_type: &TsImportType) {
        import_type.visit_children_with(self);
        let site = match &import_type.qualifier {
            Some(qualifier) => ReferenceSite::NamedImportClause {
                names: vec![first_entity_name(qualifier)],
                namespace: None,
            },
            None => ReferenceSite::DynamicImportCall,
        };
        self.push(import_type.arg.value.to_string(), site, import_type.span);
    }

    // declare const require: (path: string) => any;
    fn visit_var_decl(&mut self, decl: &VarDecl) {
        let outer = self.in_ambient_decl;
        self.in_ambient_decl = outer || decl.declare;
        decl.visit_children_with(self);
        self.in_ambient_decl = outer;
    }

    fn visit_binding_ident(&mut self, binding: &BindingIdent) {
        binding.visit_children_with(self);
        if binding.sym == *"require" && !self.in_ambient_decl {
            self.require_bindings.insert(binding.id.to_id());
        }
    }

    // import('./foo')
    // or
    // require('./foo')
    fn visit_call_expr(&mut self, expr: &CallExpr) {
        expr.visit_children_with(self);
        let is_import = match &expr.callee {
            Callee::Import(_) => true,
            Callee::Expr(callee) => callee
                .as_ident()
                .map(|ident| {
                    ident.sym == "require" && !self.require_bindings.contains(&ident.to_id())
                })
                .unwrap_or(false),
            Callee::Super(_) => false,
        };
        if !is_import {
            return;
        }
        // a non-literal argument cannot be resolved to a module
        if let Some(specifier) = expr.args.first().and_then(|arg| static_string(&arg.expr)) {
            self.push(specifier, ReferenceSite::DynamicImportCall, expr.span());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse::{data::UsedNames, resolve_identifiers};
    use pretty_assertions::assert_eq;
    use swc_utils_parse::parse_ecma_src;

    fn references(src: &str) -> Vec<(String, ReferenceSite)> {
        let mut parsed = parse_ecma_src("test.ts", src).unwrap();
        let source_map = parsed.source_map.clone();
        resolve_identifiers(&mut parsed.module, |module| {
            ReferencesVisitor::new(&source_map, module)
                .collect()
                .into_iter()
                .map(|r| (r.specifier, r.site))
                .collect()
        })
    }

    fn named(names: &[&str]) -> ReferenceSite {
        ReferenceSite::NamedImportClause {
            names: names.iter().map(|s| s.to_string()).collect(),
            namespace: None,
        }
    }

    #[test]
    fn test_static_imports() {
        assert_eq!(
            references(
                r#"import def, { a, b as c } from './one';
import type { T } from './types';
import './polyfill';
import * as ns from './ns';
ns.used;
"#
            ),
            vec![
                ("./one".to_string(), named(&["default", "a", "b"])),
                ("./types".to_string(), named(&["T"])),
                (
                    "./polyfill".to_string(),
                    ReferenceSite::Other(OtherReference::SideEffectImport)
                ),
                (
                    "./ns".to_string(),
                    ReferenceSite::NamedImportClause {
                        names: vec![],
                        namespace: Some(UsedNames::Names(vec!["used".to_string()])),
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_reexports() {
        assert_eq!(
            references(
                r#"export { a, b as c } from './one';
export * from './two';
export * as three from './three';
export { local };
const local = 1;
"#
            ),
            vec![
                (
                    "./one".to_string(),
                    ReferenceSite::ReExportClause {
                        names: vec!["a".to_string(), "b".to_string()]
                    }
                ),
                (
                    "./two".to_string(),
                    ReferenceSite::Other(OtherReference::StarReExport)
                ),
                (
                    "./three".to_string(),
                    ReferenceSite::Other(OtherReference::StarReExport)
                ),
            ]
        );
    }

    #[test]
    fn test_dynamic_imports_and_requires() {
        assert_eq!(
            references(
                r#"const lazy = () => import('./lazy');
const tpl = import(`./tpl`);
const computed = import(someVariable);
const req = require('./req');
import legacy = require('./legacy');
let t: import('./typed').Shape.Inner;
"#
            ),
            vec![
                ("./lazy".to_string(), ReferenceSite::DynamicImportCall),
                ("./tpl".to_string(), ReferenceSite::DynamicImportCall),
                ("./req".to_string(), ReferenceSite::DynamicImportCall),
                (
                    "./legacy".to_string(),
                    ReferenceSite::Other(OtherReference::ImportEquals)
                ),
                ("./typed".to_string(), named(&["Shape"])),
            ]
        );
    }

    #[test]
    fn test_ambient_require_declaration_keeps_requires() {
        assert_eq!(
            references(
                r#"declare const require: (p: string) => any;
declare var module: { exports: unknown };
export const m = require('./m');
"#
            ),
            vec![("./m".to_string(), ReferenceSite::DynamicImportCall)]
        );
    }

    #[test]
    fn test_local_require_is_not_an_import() {
        assert_eq!(
            references(
                r#"function load(require: (p: string) => unknown) {
  return require('./not-a-module');
}
"#
            ),
            vec![]
        );
    }
}
