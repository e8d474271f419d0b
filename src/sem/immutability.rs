//! Single assignment of immutable variables, functions, classes, native objects and fields.
//!
//! A field without an initializer must be assigned by every constructor of its class. An
//! immutable one may be assigned only once.
use super::errors::{
    ImmutabilityValidationError, ImmutabilityValidationErrorKind as Kind, InternalCompilerError,
};
use super::{BindingStore, DiagnosticSink, SemanticAnalyzer};
use crate::pick;
use crate::syntax::traverse::{traverse, NodePath, Visitor};
use crate::syntax::{Class, Expr, ExprId, ExprKind, Field, Function, Position, Program};
use log::debug;
use std::collections::HashSet;

pub struct ImmutabilityValidator<'s> {
    store: &'s BindingStore,
    // (class, field) pairs assigned by the constructor being visited.
    assigned_fields: HashSet<(String, String)>,
    errors: Vec<ImmutabilityValidationError>,
}

impl SemanticAnalyzer for ImmutabilityValidator<'_> {
    fn analyze(
        &mut self,
        program: &mut Program,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError> {
        self.validate(program, sink);
        Ok(())
    }
}

impl<'s> ImmutabilityValidator<'s> {
    pub fn new(store: &'s BindingStore) -> Self {
        Self {
            store,
            assigned_fields: HashSet::new(),
            errors: vec![],
        }
    }

    pub fn validate(&mut self, program: &Program, sink: &mut dyn DiagnosticSink) {
        traverse(self, program);

        debug!("immutability validation: {} error(s)", self.errors.len());
        for error in self.errors.drain(..) {
            sink.immutability_validation_error(error);
        }
    }

    fn error(&mut self, position: Position, kind: Kind) {
        self.errors
            .push(ImmutabilityValidationError { position, kind });
    }

    fn check_assignment(&mut self, path: &NodePath<'_>, expr: ExprId, position: Position) {
        let store = self.store;
        let binding = pick!(store.lookup(expr));

        if let Some(field) = binding.field_info() {
            let key = (field.class_name.clone(), field.name.clone());
            let in_constructor = path.is_in_constructor()
                && path.class().map_or(false, |c| c.name.name == field.class_name);

            if field.is_mutable {
                if in_constructor {
                    self.assigned_fields.insert(key);
                }
                return;
            }

            if field.has_initializer {
                self.error(
                    position,
                    Kind::FieldAlreadyInitialized {
                        field: field.name.clone(),
                    },
                );
            } else if self.assigned_fields.contains(&key) {
                self.error(
                    position,
                    Kind::FieldAlreadyAssigned {
                        field: field.name.clone(),
                    },
                );
            } else if in_constructor {
                self.assigned_fields.insert(key);
            }
        } else if binding.is_immutable() {
            self.error(
                position,
                Kind::Immutable {
                    kind: binding.object_kind(),
                    name: binding.name().to_string(),
                },
            );
        }
    }
}

// Fields that must be assigned by a constructor.
fn uninitialized_fields(class: &Class) -> impl Iterator<Item = &Field> {
    class.fields.iter().filter(|f| f.initializer.is_none())
}

impl Visitor for ImmutabilityValidator<'_> {
    fn enter_class(&mut self, _path: &mut NodePath<'_>, class: &Class) {
        if class.constructors().next().is_some() {
            return;
        }

        for field in uninitialized_fields(class) {
            self.error(
                field.name.position,
                Kind::FieldNotInitializedWithoutConstructor {
                    field: field.name.name.clone(),
                    class: class.name.name.clone(),
                },
            );
        }
    }

    fn enter_function(&mut self, path: &mut NodePath<'_>, function: &Function) {
        if !function.is_constructor {
            return;
        }
        if let Some(class) = path.class() {
            let class_name = &class.name.name;
            self.assigned_fields.retain(|(c, _)| c != class_name);
        }
    }

    fn exit_function(&mut self, path: &mut NodePath<'_>, function: &Function) {
        if !function.is_constructor {
            return;
        }
        let class = pick!(path.class());

        let missing: Vec<&Field> = uninitialized_fields(class)
            .filter(|f| {
                !self
                    .assigned_fields
                    .contains(&(class.name.name.clone(), f.name.name.clone()))
            })
            .collect();

        for field in missing {
            self.error(
                field.name.position,
                Kind::FieldNotInitialized {
                    field: field.name.name.clone(),
                    class: class.name.name.clone(),
                },
            );
        }
    }

    fn enter_expr(&mut self, path: &mut NodePath<'_>, expr: &Expr) {
        match &expr.kind {
            ExprKind::Assign { target, .. } => {
                self.check_assignment(path, expr.id(), target.position)
            }
            ExprKind::UnaryPostfix { operand, .. } => {
                self.check_assignment(path, expr.id(), operand.position)
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sem::{Diagnostics, GlobalScope, NameResolver, NativeRegistry, TypeResolver};
    use crate::syntax::Parser;

    fn validate(src: &str) -> Diagnostics {
        let mut program = Parser::parse_string(src).unwrap();
        let mut store = BindingStore::new();
        let mut globals = GlobalScope::with_natives(&NativeRegistry::prelude());
        let mut diagnostics = Diagnostics::new();

        NameResolver::new(&mut store, &mut globals, 0)
            .resolve(&program, &mut diagnostics)
            .unwrap();
        TypeResolver::new(&mut store, &globals)
            .resolve(&mut program, &mut diagnostics)
            .unwrap();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.messages());

        ImmutabilityValidator::new(&store).validate(&program, &mut diagnostics);
        diagnostics
    }

    fn messages(src: &str) -> Vec<String> {
        validate(src).messages()
    }

    #[test]
    fn reassigned_function() {
        assert_eq!(
            messages("fun f(): void {} f = 123;"),
            vec!["Function 'f' is immutable and cannot be modified."]
        );
    }

    #[test]
    fn immutable_entities() {
        assert_eq!(
            messages("class C {} C = 1;"),
            vec!["Class 'C' is immutable and cannot be modified."]
        );
        assert_eq!(
            messages("ARGV = 1;"),
            vec!["Object 'ARGV' is immutable and cannot be modified."]
        );
        assert!(messages("var i = 1; i = 2; i++;").is_empty());
    }

    #[test]
    fn field_without_constructor() {
        assert_eq!(
            messages("class C { public x: int; }"),
            vec!["Field 'x' in class 'C' was not initialized in field initializer, and no constructors have been defined."]
        );
        assert!(messages("class C { public x: int = 1; public mutable y: int = 2; }").is_empty());
        assert_eq!(
            messages("class C { public mutable y: int; }"),
            vec!["Field 'y' in class 'C' was not initialized in field initializer, and no constructors have been defined."]
        );
    }

    #[test]
    fn mutable_field_assigned_by_every_constructor() {
        assert_eq!(
            messages("class C { public mutable y: int; public constructor() { } }"),
            vec!["Field 'y' in class 'C' was not initialized in field initializer or constructor."]
        );
        assert!(messages(
            "class C {
                public mutable y: int;
                public constructor() { this.y = 1; y = 2; }
                public f(): void { y = 3; }
            }"
        )
        .is_empty());
    }

    #[test]
    fn missing_field_reported_at_field() {
        let diagnostics =
            validate("class C {\n    public x: int;\n    public constructor() { }\n}");

        let positions: Vec<_> = diagnostics.iter().map(|d| d.position()).collect();
        assert_eq!(positions.len(), 1);
        assert_eq!((positions[0].line, positions[0].character), (1, 11));
    }

    #[test]
    fn field_assigned_by_every_constructor() {
        assert!(messages(
            "class C {
                public x: int;
                public constructor() { this.x = 1; }
            }"
        )
        .is_empty());

        assert_eq!(
            messages(
                "class C {
                    public x: int;
                    public constructor() { this.x = 1; }
                    public constructor(a: int) { }
                }"
            ),
            vec!["Field 'x' in class 'C' was not initialized in field initializer or constructor."]
        );
    }

    #[test]
    fn field_assigned_twice() {
        assert_eq!(
            messages(
                "class C {
                    public x: int;
                    public constructor() { this.x = 1; x = 2; }
                }"
            ),
            vec!["Field 'x' cannot be assigned to; the field is immutable and has already been assigned to."]
        );
    }

    #[test]
    fn field_with_initializer() {
        assert_eq!(
            messages(
                "class C {
                    public x: int = 1;
                    public constructor() { this.x = 2; }
                }"
            ),
            vec!["Field 'x' cannot be assigned to; the field is immutable and has already been initialized."]
        );
        assert!(messages(
            "class C {
                public mutable x: int = 1;
                public constructor() { this.x = 2; }
                public f(): void { x++; }
            }"
        )
        .is_empty());
    }
}
