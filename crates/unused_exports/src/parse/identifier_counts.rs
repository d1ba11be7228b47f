use ahashmap::AHashMap;
use swc_ecma_ast::{Ident, IdentName, Module};
use swc_ecma_visit::{Visit, VisitWith};

/// Counts every identifier token in a module by name: bindings, references,
/// property names and JSX names alike. Scopes are not considered.
pub fn identifier_counts(module: &Module) -> AHashMap<String, u32> {
    let mut visitor = IdentifierCounter::default();
    module.visit_with(&mut visitor);
    visitor.counts
}

#[derive(Default)]
struct IdentifierCounter {
    counts: AHashMap<String, u32>,
}

impl Visit for IdentifierCounter {
    fn visit_ident(&mut self, ident: &Ident) {
        *self.counts.entry(ident.sym.to_string()).or_default() += 1;
    }

    fn visit_ident_name(&mut self, ident: &IdentName) {
        *self.counts.entry(ident.sym.to_string()).or_default() += 1;
    }
}
