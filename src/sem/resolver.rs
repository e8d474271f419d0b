//! Name resolution: binds every variable, function and class reference to its declaration.
use super::binding::{ClassInfo, EnumInfo, FunctionSignature};
use super::errors::{InternalCompilerError, NameResolutionError, NameResolutionErrorKind};
use super::scope::{GlobalScope, GlobalSnapshot, Lookup, ScopeStack};
use super::{Binding, BindingStore, DiagnosticSink, SemanticAnalyzer, Type, TypeReference};
use crate::syntax::{
    Class, Expr, ExprId, ExprKind, Function, Identifier, Program, Stmt, StmtKind,
};
use log::debug;
use std::rc::Rc;

pub struct NameResolver<'s> {
    store: &'s mut BindingStore,
    globals: &'s mut GlobalScope,
    /// Index of the compilation unit being resolved.
    unit: usize,
    scopes: ScopeStack,
    function_depth: usize,
}

impl SemanticAnalyzer for NameResolver<'_> {
    fn analyze(
        &mut self,
        program: &mut Program,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError> {
        self.resolve(program, sink).map(|_| ())
    }
}

impl<'s> NameResolver<'s> {
    pub fn new(store: &'s mut BindingStore, globals: &'s mut GlobalScope, unit: usize) -> Self {
        Self {
            store,
            globals,
            unit,
            scopes: ScopeStack::new(),
            function_depth: 0,
        }
    }

    /// Resolves one unit and returns the global declarations visible afterwards.
    pub fn resolve(
        &mut self,
        program: &Program,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<GlobalSnapshot, InternalCompilerError> {
        debug!("name resolution: unit {}", self.unit);

        for stmt in &program.statements {
            self.resolve_stmt(stmt, sink);
        }

        if !self.scopes.is_empty() || self.function_depth != 0 {
            return Err(InternalCompilerError::new(
                "local scopes were not closed after name resolution",
            ));
        }

        Ok(self.globals.snapshot())
    }

    fn resolve_stmt(&mut self, stmt: &Stmt, sink: &mut dyn DiagnosticSink) {
        match &stmt.kind {
            StmtKind::Block(statements) => {
                self.scopes.push();
                for stmt in statements {
                    self.resolve_stmt(stmt, sink);
                }
                self.scopes.pop();
            }
            StmtKind::Class(class) => self.resolve_class(class, sink),
            StmtKind::Expression(expr) | StmtKind::Print(expr) => self.resolve_expr(expr, sink),
            StmtKind::Function(function) => {
                let signature = Rc::new(FunctionSignature::from_declaration(function));

                // Defined before its body to allow recursion.
                self.declare(&function.name, sink);
                self.define(&function.name, Binding::function(&signature), sink);
                self.resolve_function(function, sink);
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition, sink);
                self.resolve_stmt(then_branch, sink);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch, sink);
                }
            }
            StmtKind::Return(value) => {
                if self.function_depth == 0 {
                    sink.name_resolution_error(NameResolutionError {
                        position: stmt.position,
                        kind: NameResolutionErrorKind::TopLevelReturn,
                    });
                }
                if let Some(value) = value {
                    self.resolve_expr(value, sink);
                }
            }
            StmtKind::Var(var) => {
                self.declare(&var.name, sink);
                if let Some(initializer) = &var.initializer {
                    self.resolve_expr(initializer, sink);
                }
                self.define(
                    &var.name,
                    Binding::variable(var.name.as_str(), &var.type_ref, true),
                    sink,
                );
            }
            StmtKind::While { condition, body } => {
                self.resolve_expr(condition, sink);
                self.resolve_stmt(body, sink);
            }
            StmtKind::Enum(declaration) => {
                // Member initializers are constant expressions evaluated by type resolution.
                let info = Rc::new(EnumInfo::from_declaration(declaration));

                self.declare(&declaration.name, sink);
                self.define(&declaration.name, Binding::enumeration(&info), sink);
            }
        }
    }

    fn resolve_class(&mut self, class: &Class, sink: &mut dyn DiagnosticSink) {
        let info = Rc::new(ClassInfo::from_declaration(class));

        self.declare(&class.name, sink);
        self.define(&class.name, Binding::class(&info), sink);

        // Members are visible inside methods without `this.`.
        self.scopes.push();
        self.scopes.declare("this");
        self.scopes.define(Binding::variable(
            "this",
            &TypeReference::resolved(Type::Class(info.name.clone())),
            false,
        ));

        for (field, field_info) in class.fields.iter().zip(&info.fields) {
            self.declare(&field.name, sink);
            self.scopes.define(Binding::field(field_info));
        }
        for field in &class.fields {
            if let Some(initializer) = &field.initializer {
                self.resolve_expr(initializer, sink);
            }
        }
        for method in &class.methods {
            if !method.is_constructor {
                if let Some(signature) = info.method(method.name.as_str()) {
                    self.declare(&method.name, sink);
                    self.scopes.define(Binding::function(signature));
                }
            }
        }
        for method in &class.methods {
            self.resolve_function(method, sink);
        }

        self.scopes.pop();
    }

    fn resolve_function(&mut self, function: &Function, sink: &mut dyn DiagnosticSink) {
        self.function_depth += 1;
        self.scopes.push();

        for parameter in &function.parameters {
            self.declare(&parameter.name, sink);
            self.scopes.define(Binding::variable(
                parameter.name.as_str(),
                &parameter.type_ref,
                true,
            ));
        }
        for stmt in &function.body {
            self.resolve_stmt(stmt, sink);
        }

        self.scopes.pop();
        self.function_depth -= 1;
    }

    fn resolve_expr(&mut self, expr: &Expr, sink: &mut dyn DiagnosticSink) {
        match &expr.kind {
            ExprKind::Identifier(id) => {
                if let Some(binding) = self.resolve_name(id, sink) {
                    self.record(expr.id(), binding);
                }
            }
            ExprKind::Get { object, .. } => self.resolve_expr(object, sink),
            ExprKind::Call { callee, arguments } => {
                // The call and its callee share one binding, so an unresolvable name is
                // reported once.
                if let Some(id) = callee.identifier() {
                    if let Some(binding) = self.resolve_name(id, sink) {
                        self.record(callee.id(), binding.clone());
                        self.record(expr.id(), binding);
                    }
                } else {
                    self.resolve_expr(callee, sink);
                }
                for argument in arguments {
                    self.resolve_expr(argument, sink);
                }
            }
            ExprKind::Assign { target, value } => {
                self.resolve_expr(value, sink);
                self.resolve_assignment_target(expr.id(), target, sink);
            }
            ExprKind::Binary { lhs, rhs, .. } | ExprKind::Logical { lhs, rhs, .. } => {
                self.resolve_expr(lhs, sink);
                self.resolve_expr(rhs, sink);
            }
            ExprKind::UnaryPrefix { operand, .. } | ExprKind::Grouping(operand) => {
                self.resolve_expr(operand, sink);
            }
            ExprKind::UnaryPostfix { operand, .. } => {
                if let Some(id) = operand.identifier() {
                    if let Some(binding) = self.resolve_name(id, sink) {
                        self.record(operand.id(), binding.clone());
                        self.record(expr.id(), binding);
                    }
                } else {
                    self.resolve_expr(operand, sink);
                }
            }
            ExprKind::Index { indexee, argument } => {
                self.resolve_expr(indexee, sink);
                self.resolve_expr(argument, sink);
            }
            ExprKind::Literal(_) => {}
            ExprKind::New {
                class_name,
                arguments,
            } => {
                if let Some(binding) = self.resolve_name(class_name, sink) {
                    self.record(expr.id(), binding);
                }
                for argument in arguments {
                    self.resolve_expr(argument, sink);
                }
            }
            ExprKind::Collection(elements) => {
                for element in elements {
                    self.resolve_expr(element, sink);
                }
            }
        }
    }

    fn resolve_assignment_target(
        &mut self,
        assignment: ExprId,
        target: &Expr,
        sink: &mut dyn DiagnosticSink,
    ) {
        match &target.kind {
            ExprKind::Identifier(id) => {
                if let Some(binding) = self.resolve_name(id, sink) {
                    self.record(target.id(), binding.clone());
                    self.record(assignment, binding);
                }
            }
            ExprKind::Get { object, name } => {
                self.resolve_expr(object, sink);

                // `this.x = ...` binds to the field so immutability can be checked.
                if object.identifier().map(Identifier::as_str) == Some("this") {
                    if let Lookup::Found(binding) = self.scopes.lookup(name.as_str()) {
                        if binding.field_info().is_some() {
                            self.record(assignment, binding);
                        }
                    }
                }
            }
            _ => self.resolve_expr(target, sink),
        }
    }

    /// Finds the declaration a name refers to. Names not declared (yet) resolve to a global
    /// candidate which type resolution settles once every global of the unit is known.
    fn resolve_name(&mut self, id: &Identifier, sink: &mut dyn DiagnosticSink) -> Option<Binding> {
        match self.scopes.lookup(id.as_str()) {
            Lookup::Found(binding) => Some(binding),
            Lookup::NotReady => {
                sink.name_resolution_error(NameResolutionError {
                    position: id.position,
                    kind: NameResolutionErrorKind::ReadInOwnInitializer,
                });
                None
            }
            Lookup::Missing => Some(
                self.globals
                    .get(id.as_str())
                    .cloned()
                    .unwrap_or_else(|| Binding::global_candidate(id.as_str())),
            ),
        }
    }

    fn record(&mut self, expr: ExprId, binding: Binding) {
        if binding.is_local() {
            self.store.record_local(expr, binding);
        } else {
            self.store.record_global(expr, binding);
        }
    }

    /// Marks a local declaration as not ready. Globals are declared when defined.
    fn declare(&mut self, name: &Identifier, sink: &mut dyn DiagnosticSink) {
        if self.scopes.is_empty() {
            return;
        }
        if !self.scopes.declare(name.as_str()) {
            sink.name_resolution_error(NameResolutionError {
                position: name.position,
                kind: NameResolutionErrorKind::AlreadyDeclared,
            });
        }
    }

    fn define(&mut self, name: &Identifier, binding: Binding, sink: &mut dyn DiagnosticSink) {
        if !self.scopes.is_empty() {
            self.scopes.define(binding);
            return;
        }

        if let Err(kind) = self.globals.declare(binding, self.unit) {
            sink.name_resolution_error(NameResolutionError {
                position: name.position,
                kind: NameResolutionErrorKind::GlobalRedefinition {
                    kind,
                    name: name.name.clone(),
                },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sem::{BindingKind, Diagnostics, NativeRegistry, ObjectKind};
    use crate::syntax::Parser;
    use assert_matches::assert_matches;

    struct Resolved {
        program: Program,
        store: BindingStore,
        diagnostics: Diagnostics,
        snapshot: GlobalSnapshot,
    }

    fn resolve(src: &str) -> Resolved {
        let program = Parser::parse_string(src).unwrap();
        let mut store = BindingStore::new();
        let mut globals = GlobalScope::with_natives(&NativeRegistry::prelude());
        let mut diagnostics = Diagnostics::new();

        let snapshot = NameResolver::new(&mut store, &mut globals, 0)
            .resolve(&program, &mut diagnostics)
            .unwrap();

        Resolved {
            program,
            store,
            diagnostics,
            snapshot,
        }
    }

    fn messages(resolved: &Resolved) -> Vec<String> {
        resolved.diagnostics.messages()
    }

    // Expression of the `index`-th top-level statement, which must be an expression or print.
    fn expr_at(program: &Program, index: usize) -> &Expr {
        match &program.statements[index].kind {
            StmtKind::Expression(expr) | StmtKind::Print(expr) => expr,
            kind => panic!("unexpected statement {:?}", kind),
        }
    }

    #[test]
    fn global_variable() {
        let resolved = resolve("var a = 1; print a;");

        assert!(resolved.diagnostics.is_empty());

        let expr = expr_at(&resolved.program, 1);
        let binding = resolved.store.lookup(expr.id()).unwrap();

        assert_eq!(binding.name(), "a");
        assert_eq!(binding.depth(), None);
        assert_eq!(resolved.snapshot.get("a"), Some(ObjectKind::Variable));
    }

    #[test]
    fn own_initializer_in_local_scope() {
        let resolved = resolve("{ var a = 1; { var a = a; } }");

        assert_eq!(
            messages(&resolved),
            vec!["Cannot read local variable in its own initializer."]
        );
    }

    #[test]
    fn own_initializer_at_top_level_reads_previous_global() {
        let resolved = resolve("var a = 1; var a2 = 2; { var b = a; }");
        assert!(resolved.diagnostics.is_empty());

        let resolved = resolve("var a = a;");
        assert!(resolved.diagnostics.is_empty());

        let initializer = match &resolved.program.statements[0].kind {
            StmtKind::Var(var) => var.initializer.as_ref().unwrap(),
            _ => unreachable!(),
        };
        assert!(resolved
            .store
            .lookup(initializer.id())
            .unwrap()
            .is_global_candidate());
    }

    #[test]
    fn local_depth() {
        let resolved = resolve("fun f(a: int): void { { print a; } }");

        let block = match &resolved.program.statements[0].kind {
            StmtKind::Function(function) => &function.body[0],
            _ => unreachable!(),
        };
        let print = match &block.kind {
            StmtKind::Block(statements) => expr_at_stmt(&statements[0]),
            _ => unreachable!(),
        };

        let binding = resolved.store.lookup_local(print.id()).unwrap();
        assert_eq!(binding.depth(), Some(1));
    }

    fn expr_at_stmt(stmt: &Stmt) -> &Expr {
        match &stmt.kind {
            StmtKind::Expression(expr) | StmtKind::Print(expr) => expr,
            kind => panic!("unexpected statement {:?}", kind),
        }
    }

    #[test]
    fn forward_reference_is_a_candidate() {
        let resolved = resolve("f(); fun f(): void {}");

        assert!(resolved.diagnostics.is_empty());

        let call = expr_at(&resolved.program, 0);
        assert!(resolved.store.lookup(call.id()).unwrap().is_global_candidate());
    }

    #[test]
    fn already_declared_in_scope() {
        let resolved = resolve("{ var a = 1; var a = 2; }");

        assert_eq!(
            messages(&resolved),
            vec!["Variable with this name already declared in this scope."]
        );
    }

    #[test]
    fn duplicate_parameter() {
        let resolved = resolve("fun f(a: int, a: int): void {}");

        assert_eq!(
            messages(&resolved),
            vec!["Variable with this name already declared in this scope."]
        );
    }

    #[test]
    fn global_redefinition() {
        let resolved = resolve("class Foo {} fun Foo(): void {}");
        assert_eq!(
            messages(&resolved),
            vec!["Class Foo already defined; cannot redefine"]
        );

        let resolved = resolve("enum E { A } var E = 1;");
        assert_eq!(
            messages(&resolved),
            vec!["Enum E already defined; cannot redefine"]
        );

        let resolved = resolve("var Base64 = 1;");
        assert_eq!(
            messages(&resolved),
            vec!["Class Base64 already defined; cannot redefine"]
        );
    }

    #[test]
    fn top_level_return() {
        let resolved = resolve("return 1;");
        assert_eq!(messages(&resolved), vec!["Cannot return from top-level code."]);

        let resolved = resolve("fun f(): int { return 1; }");
        assert!(resolved.diagnostics.is_empty());
    }

    #[test]
    fn class_members() {
        let resolved = resolve(
            "class C {
                private x: int = 1;
                public f(): int { return x; }
                public g(): int { return this.f(); }
            }",
        );

        assert!(resolved.diagnostics.is_empty());

        let class = match &resolved.program.statements[0].kind {
            StmtKind::Class(class) => class,
            _ => unreachable!(),
        };
        let value = match &class.methods[0].body[0].kind {
            StmtKind::Return(Some(value)) => value,
            _ => unreachable!(),
        };

        let binding = resolved.store.lookup(value.id()).unwrap();
        assert_matches!(binding.kind(), BindingKind::Field(field) => {
            assert_eq!(field.class_name, "C");
        });
        assert_eq!(binding.depth(), Some(1));
    }

    #[test]
    fn field_assignment_through_this() {
        let resolved = resolve(
            "class C {
                private x: int;
                public constructor() { this.x = 1; }
            }",
        );

        let class = match &resolved.program.statements[0].kind {
            StmtKind::Class(class) => class,
            _ => unreachable!(),
        };
        let assignment = expr_at_stmt(&class.methods[0].body[0]);

        assert_matches!(
            resolved.store.lookup(assignment.id()).map(Binding::kind),
            Some(BindingKind::Field(_))
        );
    }

    #[test]
    fn native_names() {
        let resolved = resolve("Base64.encode(\"\"); ARGV.pop();");

        assert!(resolved.diagnostics.is_empty());
        assert_eq!(resolved.snapshot.get("ARGV"), Some(ObjectKind::Object));
    }
}
