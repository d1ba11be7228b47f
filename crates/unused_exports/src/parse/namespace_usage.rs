//! Narrows `import * as X from './m'` down to the names of `./m` actually
//! reached through `X`.
//!
//! Runs over a module after identifier resolution, so occurrences of `X` are
//! matched by binding rather than by name: a shadowing local `X` in an inner
//! scope is not a use of the namespace.

use super::data::UsedNames;
use swc_common::SyntaxContext;
use swc_ecma_ast::{
    ExportNamedSpecifier, Expr, Id, Ident, ImportDecl, JSXMemberExpr, JSXObject, Lit, MemberExpr,
    MemberProp, Module, ObjectPatProp, Pat, PropName, TsEntityName, TsQualifiedName,
    VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Names of a module used through the namespace binding `binding`.
///
/// Returns [UsedNames::All] as soon as one occurrence is in a position that
/// cannot be narrowed to a static name.
pub fn namespace_usage(module: &Module, binding: &Id) -> UsedNames {
    let mut visitor = NamespaceUsageVisitor {
        binding,
        used: UsedNames::default(),
    };
    module.visit_with(&mut visitor);
    visitor.used
}

struct NamespaceUsageVisitor<'a> {
    binding: &'a Id,
    used: UsedNames,
}

impl NamespaceUsageVisitor<'_> {
    fn refers_to_binding(&self, ident: &Ident) -> bool {
        ident.sym == self.binding.0
            && (ident.ctxt == self.binding.1 || ident.ctxt == SyntaxContext::empty())
    }

    fn is_binding_expr(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Ident(ident) => self.refers_to_binding(ident),
            Expr::Paren(paren) => self.is_binding_expr(&paren.expr),
            Expr::TsAs(as_expr) => self.is_binding_expr(&as_expr.expr),
            Expr::TsNonNull(non_null) => self.is_binding_expr(&non_null.expr),
            _ => false,
        }
    }

    fn record(&mut self, name: impl Into<String>) {
        self.used.push(name);
    }

    fn give_up(&mut self) {
        self.used = UsedNames::All;
    }

    // `const { a, b: c } = X` records `a` and `b`. Nested patterns only
    // record the first-level key.
    fn record_destructured(&mut self, props: &[ObjectPatProp]) {
        for prop in props {
            match prop {
                ObjectPatProp::Assign(assign) => self.record(assign.key.sym.to_string()),
                ObjectPatProp::KeyValue(kv) => match static_prop_name(&kv.key) {
                    Some(name) => self.record(name),
                    None => self.give_up(),
                },
                // `...rest` captures every remaining export
                ObjectPatProp::Rest(_) => self.give_up(),
            }
        }
    }
}

fn static_prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        PropName::Computed(computed) => static_string(&computed.expr),
        PropName::Num(_) | PropName::BigInt(_) => None,
    }
}

/// The value of a string literal or a template literal with no substitutions.
pub fn static_string(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() && tpl.quasis.len() == 1 => {
            let quasi = &tpl.quasis[0];
            Some(
                quasi
                    .cooked
                    .as_ref()
                    .unwrap_or(&quasi.raw)
                    .to_string(),
            )
        }
        Expr::Paren(paren) => static_string(&paren.expr),
        _ => None,
    }
}

impl Visit for NamespaceUsageVisitor<'_> {
    // the import clause itself is not a use
    fn visit_import_decl(&mut self, _: &ImportDecl) {}

    // in `export { local as X }` only `local` is an occurrence
    fn visit_export_named_specifier(&mut self, specifier: &ExportNamedSpecifier) {
        specifier.orig.visit_with(self);
    }

    // `X.prop`, `X?.prop` and `X['prop']`
    fn visit_member_expr(&mut self, member: &MemberExpr) {
        if self.used.is_all() {
            return;
        }
        if !self.is_binding_expr(&member.obj) {
            member.visit_children_with(self);
            return;
        }
        match &member.prop {
            MemberProp::Ident(prop) => self.record(prop.sym.to_string()),
            MemberProp::Computed(computed) => match static_string(&computed.expr) {
                Some(name) => {
                    self.record(name);
                    computed.visit_children_with(self);
                }
                None => self.give_up(),
            },
            MemberProp::PrivateName(_) => self.give_up(),
        }
    }

    // `const { a, b: c } = X`
    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        if self.used.is_all() {
            return;
        }
        let destructures_binding = declarator
            .init
            .as_deref()
            .map(|init| self.is_binding_expr(init))
            .unwrap_or(false);
        match (&declarator.name, destructures_binding) {
            (Pat::Object(object), true) => {
                self.record_destructured(&object.props);
                // default values may mention the namespace too
                declarator.name.visit_with(self);
            }
            _ => declarator.visit_children_with(self),
        }
    }

    // `X.SomeType` in a type position, also `typeof X.value`
    fn visit_ts_qualified_name(&mut self, name: &TsQualifiedName) {
        if self.used.is_all() {
            return;
        }
        match &name.left {
            TsEntityName::Ident(left) if self.refers_to_binding(left) => {
                self.record(name.right.sym.to_string())
            }
            _ => name.visit_children_with(self),
        }
    }

    // `<X.Component />`
    fn visit_jsx_member_expr(&mut self, member: &JSXMemberExpr) {
        if self.used.is_all() {
            return;
        }
        match &member.obj {
            JSXObject::Ident(obj) if self.refers_to_binding(obj) => {
                self.record(member.prop.sym.to_string())
            }
            _ => member.visit_children_with(self),
        }
    }

    // any occurrence not consumed by one of the shapes above
    fn visit_ident(&mut self, ident: &Ident) {
        if self.refers_to_binding(ident) {
            self.give_up();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse::resolve_identifiers;
    use pretty_assertions::assert_eq;
    use swc_ecma_ast::{ImportSpecifier, ModuleDecl, ModuleItem};
    use swc_utils_parse::parse_ecma_src;

    fn names(items: &[&str]) -> UsedNames {
        UsedNames::Names(items.iter().map(|s| s.to_string()).collect())
    }

    fn track(src: &str) -> UsedNames {
        let mut parsed = parse_ecma_src("test.tsx", src).unwrap();
        resolve_identifiers(&mut parsed.module, |module| {
            let binding = module
                .body
                .iter()
                .find_map(|item| match item {
                    ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                        import.specifiers.iter().find_map(|s| match s {
                            ImportSpecifier::Namespace(ns) => Some(ns.local.to_id()),
                            _ => None,
                        })
                    }
                    _ => None,
                })
                .unwrap();
            namespace_usage(module, &binding)
        })
    }

    #[test]
    fn test_tracks_all_supported_shapes_in_order() {
        let used = track(
            r#"import * as foo from './foo';
const x = foo.x;
const { y } = foo;
const { z: { a } } = foo;
const w = foo['w'];
"#,
        );
        assert_eq!(used, names(&["x", "y", "z", "w"]));
    }

    #[test]
    fn test_renamed_destructuring_records_source_name() {
        let used = track(
            r#"import * as m from './m';
const { a, b: local, c = 1 } = m;
"#,
        );
        assert_eq!(used, names(&["a", "b", "c"]));
    }

    #[test]
    fn test_types_jsx_and_optional_chains() {
        let used = track(
            r#"import * as ui from './ui';
let value: ui.Props;
const el = <ui.Button />;
const maybe = ui?.helper;
type T = typeof ui.config;
"#,
        );
        assert_eq!(used, names(&["Props", "Button", "helper", "config"]));
    }

    #[test]
    fn test_dynamic_key_gives_up() {
        let used = track(
            r#"import * as m from './m';
const key = 'a';
m.known;
m[key];
"#,
        );
        assert_eq!(used, UsedNames::All);
    }

    #[test]
    fn test_value_escape_gives_up() {
        assert_eq!(
            track("import * as m from './m';\nconsole.log(m);\n"),
            UsedNames::All
        );
        assert_eq!(
            track("import * as m from './m';\nconst { a, ...rest } = m;\n"),
            UsedNames::All
        );
        assert_eq!(
            track("import * as m from './m';\nexport { m };\n"),
            UsedNames::All
        );
    }

    #[test]
    fn test_export_alias_with_namespace_name_is_not_a_use() {
        let used = track(
            r#"import * as X from './m';
const other = X.a;
export { other as X };
"#,
        );
        assert_eq!(used, names(&["a"]));
    }

    #[test]
    fn test_shadowed_binding_is_not_a_use() {
        let used = track(
            r#"import * as m from './m';
function inner(m: any) {
  return m;
}
m.used;
"#,
        );
        assert_eq!(used, names(&["used"]));
    }

    #[test]
    fn test_unused_namespace_uses_nothing() {
        assert_eq!(track("import * as m from './m';\n"), names(&[]));
    }
}
