use super::Binding;
use crate::syntax::ExprId;
use log::trace;
use std::collections::HashMap;

/// Bindings recorded for expressions, keyed by expression id.
///
/// Locals and globals are kept apart: a local binding always wins on lookup. Writing a
/// binding for an expression that already has one replaces it; there is no removal.
#[derive(Debug, Default)]
pub struct BindingStore {
    locals: HashMap<ExprId, Binding>,
    globals: HashMap<ExprId, Binding>,
}

impl BindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_local(&mut self, expr: ExprId, binding: Binding) {
        trace!("record local {} -> {}", expr, binding);
        self.locals.insert(expr, binding);
    }

    pub fn record_global(&mut self, expr: ExprId, binding: Binding) {
        trace!("record global {} -> {}", expr, binding);
        self.globals.insert(expr, binding);
    }

    pub fn lookup(&self, expr: ExprId) -> Option<&Binding> {
        self.locals
            .get(&expr)
            .or_else(|| self.globals.get(&expr))
    }

    pub fn lookup_local(&self, expr: ExprId) -> Option<&Binding> {
        self.locals.get(&expr)
    }

    pub fn len(&self) -> usize {
        self.locals.len() + self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty() && self.globals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sem::TypeReference;
    use crate::syntax::ExprIdGenerator;

    #[test]
    fn local_wins_over_global() {
        let mut ids = ExprIdGenerator::new();
        let expr = ids.next_id();
        let type_ref = TypeReference::inferred();
        let mut store = BindingStore::new();

        store.record_global(expr, Binding::variable("a", &type_ref, true));
        store.record_local(expr, Binding::variable("a", &type_ref, false).at_depth(0));

        let binding = store.lookup(expr).unwrap();
        assert_eq!(binding.depth(), Some(0));
        assert!(store.lookup_local(expr).is_some());
    }

    #[test]
    fn later_write_replaces() {
        let mut ids = ExprIdGenerator::new();
        let expr = ids.next_id();
        let other = ids.next_id();
        let type_ref = TypeReference::inferred();
        let mut store = BindingStore::new();

        store.record_global(expr, Binding::global_candidate("f"));
        store.record_global(expr, Binding::variable("f", &type_ref, true));

        assert!(!store.lookup(expr).unwrap().is_global_candidate());
        assert!(store.lookup_local(expr).is_none());
        assert!(store.lookup(other).is_none());
        assert_eq!(store.len(), 1);
    }
}
