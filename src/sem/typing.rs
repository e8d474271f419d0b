//! Type resolution: computes the type of every expression and checks that operands,
//! arguments and assigned values fit the types they are used with.
//!
//! Explicit type annotations are resolved where they are declared, reporting unknown
//! names there. A declaration used before its annotation is reached is resolved silently
//! at the use site, so each problem is reported once.
use super::binding::{ClassInfo, EnumInfo, FunctionSignature};
use super::coercion::{can_be_coerced_into, LiteralValue};
use super::enums::{self, ConstantError};
use super::errors::{
    CalleeKind, CompilerWarning, InternalCompilerError, TypeValidationError,
    TypeValidationErrorKind as Kind, WarningKind,
};
use super::native::NativeMethod;
use super::operators;
use super::scope::GlobalScope;
use super::{
    Binding, BindingKind, BindingStore, DiagnosticSink, ObjectKind, SemanticAnalyzer, Type,
    TypeReference,
};
use crate::syntax::{
    BinaryOperator, Class, Enum, Expr, ExprId, ExprKind, Function, Identifier, Literal,
    Position, Program, Stmt, StmtKind, TypeSpecifier, UnaryOperator, Var,
};
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;

// The binding of a reference after global candidates are settled.
enum Bound {
    Binding(Binding),
    Undefined(String),
    // Nothing was recorded; the name resolver has already reported why.
    Missing,
}

enum Callable {
    User(Rc<FunctionSignature>),
    Native(Rc<NativeMethod>),
}

enum Member {
    // A field or an enum member.
    Value(Type),
    Method(Callable),
}

pub struct TypeResolver<'s> {
    store: &'s mut BindingStore,
    globals: &'s GlobalScope,
    // Classes and enums declared inside blocks are not global, but their members are still
    // reachable through values of their type.
    local_classes: HashMap<String, Rc<ClassInfo>>,
    local_enums: HashMap<String, Rc<EnumInfo>>,
}

impl SemanticAnalyzer for TypeResolver<'_> {
    fn analyze(
        &mut self,
        program: &mut Program,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError> {
        self.resolve(program, sink)
    }
}

impl<'s> TypeResolver<'s> {
    pub fn new(store: &'s mut BindingStore, globals: &'s GlobalScope) -> Self {
        Self {
            store,
            globals,
            local_classes: HashMap::new(),
            local_enums: HashMap::new(),
        }
    }

    pub fn resolve(
        &mut self,
        program: &mut Program,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError> {
        debug!("type resolution: {} statements", program.statements.len());

        for stmt in &mut program.statements {
            self.resolve_stmt(stmt, sink)?;
        }
        Ok(())
    }

    // --- Statements

    fn resolve_stmt(
        &mut self,
        stmt: &mut Stmt,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError> {
        match &mut stmt.kind {
            StmtKind::Block(statements) => {
                for stmt in statements {
                    self.resolve_stmt(stmt, sink)?;
                }
            }
            StmtKind::Class(class) => self.resolve_class(class, sink)?,
            StmtKind::Expression(expr) | StmtKind::Print(expr) => self.resolve_expr(expr, sink),
            StmtKind::Function(function) => self.resolve_function(function, sink)?,
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_condition("if", condition, sink);
                self.resolve_stmt(then_branch, sink)?;
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch, sink)?;
                }
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.resolve_expr(value, sink);
                }
            }
            StmtKind::Var(var) => self.resolve_var(var, sink)?,
            StmtKind::While { condition, body } => {
                self.resolve_condition("while", condition, sink);
                self.resolve_stmt(body, sink)?;
            }
            StmtKind::Enum(declaration) => self.resolve_enum(declaration, sink),
        }

        Ok(())
    }

    fn resolve_condition(
        &mut self,
        statement: &'static str,
        condition: &Expr,
        sink: &mut dyn DiagnosticSink,
    ) {
        self.resolve_expr(condition, sink);

        let ty = condition.r#type();
        if ty.is_resolved() && !ty.is_bool() {
            error(
                sink,
                condition.position,
                Kind::InvalidCondition {
                    statement,
                    condition: ty,
                },
            );
        }
    }

    fn resolve_var(
        &mut self,
        var: &Var,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError> {
        if let Some(initializer) = &var.initializer {
            self.resolve_expr(initializer, sink);
        }

        if var.type_ref.is_explicit() {
            self.resolve_declared(&var.type_ref, sink);
            if let Some(initializer) = &var.initializer {
                self.check_initializer(&var.type_ref.r#type(), initializer, sink);
            }
        } else {
            let ty = match &var.initializer {
                None => {
                    error(
                        sink,
                        var.name.position,
                        Kind::InferenceWithoutInitializer {
                            name: var.name.name.clone(),
                        },
                    );
                    Type::Unresolved
                }
                Some(initializer) if initializer.is_null_literal() => {
                    error(sink, initializer.position, Kind::NullToImplicitlyTyped);
                    Type::Unresolved
                }
                Some(initializer) => initializer.r#type(),
            };
            var.type_ref.set_type(ty);
        }

        if !var.type_ref.is_settled() {
            return Err(InternalCompilerError::new(format!(
                "type of variable '{}' was not settled",
                var.name
            )));
        }
        Ok(())
    }

    fn check_initializer(&self, target: &Type, initializer: &Expr, sink: &mut dyn DiagnosticSink) {
        if initializer.is_null_literal() && target.is_reference_type() {
            warning(sink, initializer.position, WarningKind::NullInitializer);
        }
        if !coerces(target, initializer) {
            error(
                sink,
                initializer.position,
                Kind::IncompatibleInitializer {
                    value: initializer.r#type(),
                    target: target.clone(),
                },
            );
        }
    }

    fn resolve_function(
        &mut self,
        function: &mut Function,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError> {
        for parameter in &function.parameters {
            if parameter.type_ref.is_explicit() {
                self.resolve_declared(&parameter.type_ref, sink);
            } else {
                error(
                    sink,
                    parameter.name.position,
                    Kind::UntypedParameter {
                        parameter: parameter.name.name.clone(),
                        function: function.name.name.clone(),
                    },
                );
                parameter.type_ref.set_type(Type::Unresolved);
            }
        }

        if function.return_type.is_explicit() {
            self.resolve_declared(&function.return_type, sink);
        } else if !function.return_type.is_settled() {
            function.return_type.set_type(Type::Void);
        }

        for stmt in &mut function.body {
            self.resolve_stmt(stmt, sink)?;
        }
        Ok(())
    }

    fn resolve_class(
        &mut self,
        class: &mut Class,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError> {
        if self.class_info(class.name.as_str()).is_none() {
            self.local_classes.insert(
                class.name.name.clone(),
                Rc::new(ClassInfo::from_declaration(class)),
            );
        }

        for field in &class.fields {
            self.resolve_declared(&field.type_ref, sink);
            if let Some(initializer) = &field.initializer {
                self.resolve_expr(initializer, sink);
                self.check_initializer(&field.type_ref.r#type(), initializer, sink);
            }
        }
        for method in &mut class.methods {
            self.resolve_function(method, sink)?;
        }
        Ok(())
    }

    fn resolve_enum(&mut self, declaration: &mut Enum, sink: &mut dyn DiagnosticSink) {
        if self.enum_info(declaration.name.as_str()).is_none() {
            self.local_enums.insert(
                declaration.name.name.clone(),
                Rc::new(EnumInfo::from_declaration(declaration)),
            );
        }

        let mut values = HashMap::new();
        let mut previous: Option<i128> = None;

        for member in &mut declaration.members {
            let value = match &member.initializer {
                Some(initializer) => match enums::evaluate(initializer, &values) {
                    Ok(value) => value,
                    Err(ConstantError::NotIntegral) => {
                        error(
                            sink,
                            initializer.position,
                            Kind::EnumInitializerNotIntegral {
                                member: member.name.name.clone(),
                            },
                        );
                        continue;
                    }
                    Err(ConstantError::Undefined(id)) => {
                        error(
                            sink,
                            id.position,
                            Kind::UndefinedIdentifier {
                                name: id.name.clone(),
                            },
                        );
                        continue;
                    }
                },
                None => previous.map_or(0, |previous| previous + 1),
            };

            if !enums::is_representable(value) {
                error(sink, member.name.position, Kind::EnumValueOverflow { value });
                continue;
            }

            if let Some(initializer) = &member.initializer {
                initializer
                    .type_ref()
                    .set_type(Type::of_integer_literal(value));
            }
            member.value = Some(value);
            values.insert(member.name.name.clone(), value);
            previous = Some(value);
        }

        let assigned: Vec<i128> = declaration.members.iter().filter_map(|m| m.value).collect();
        let underlying_type = match enums::underlying_type(&assigned) {
            Some(ty) => ty,
            None => {
                let value = assigned.iter().copied().max().unwrap_or_default();
                error(sink, declaration.name.position, Kind::EnumValueOverflow { value });
                Type::Unresolved
            }
        };

        debug!(
            "enum {}: underlying type {}",
            declaration.name, underlying_type
        );
        declaration.underlying_type.set_type(underlying_type);
    }

    // --- Expressions

    fn resolve_expr(&mut self, expr: &Expr, sink: &mut dyn DiagnosticSink) {
        let ty = match &expr.kind {
            ExprKind::Identifier(id) => match self.bound(expr.id()) {
                Bound::Binding(binding) => self.type_of(&binding),
                Bound::Undefined(name) => {
                    error(sink, id.position, Kind::UndefinedIdentifier { name });
                    Type::Unresolved
                }
                Bound::Missing => Type::Unresolved,
            },
            ExprKind::Get { object, name } => {
                self.resolve_expr(object, sink);
                match self.member(object, name, sink) {
                    Some(Member::Value(ty)) => ty,
                    Some(Member::Method(callable)) => self.return_type(&callable),
                    None => Type::Unresolved,
                }
            }
            ExprKind::Call { callee, arguments } => {
                self.resolve_call(expr, callee, arguments, sink)
            }
            ExprKind::Assign { target, value } => {
                self.resolve_assignment(expr, target, value, sink)
            }
            ExprKind::Binary { operator, lhs, rhs } => {
                self.resolve_binary(*operator, lhs, rhs, expr.position, sink)
            }
            ExprKind::Logical { operator, lhs, rhs } => {
                for operand in &[lhs, rhs] {
                    self.resolve_expr(operand, sink);

                    let ty = operand.r#type();
                    if ty.is_resolved() && !ty.is_bool() {
                        error(
                            sink,
                            operand.position,
                            Kind::InvalidLogicalOperand {
                                operator: *operator,
                                operand: ty,
                            },
                        );
                    }
                }
                Type::Bool
            }
            ExprKind::UnaryPrefix { operator, operand } => {
                self.resolve_expr(operand, sink);
                match operator {
                    UnaryOperator::Not => Type::Bool,
                    UnaryOperator::Minus => operand.r#type(),
                }
            }
            ExprKind::UnaryPostfix { operand, .. } => {
                self.resolve_expr(operand, sink);

                // The operand may have been re-bound to a global declared later.
                if let Some(binding) = self.store.lookup(operand.id()).cloned() {
                    if !binding.is_local() {
                        self.store.record_global(expr.id(), binding);
                    }
                }
                operand.r#type()
            }
            ExprKind::Index { indexee, argument } => {
                self.resolve_index(indexee, argument, expr.position, sink)
            }
            ExprKind::Grouping(inner) => {
                self.resolve_expr(inner, sink);
                inner.r#type()
            }
            ExprKind::Literal(literal) => literal_type(literal),
            ExprKind::New {
                class_name,
                arguments,
            } => self.resolve_new(expr, class_name, arguments, sink),
            ExprKind::Collection(elements) => {
                for element in elements {
                    self.resolve_expr(element, sink);
                }
                self.collection_type(elements, expr.position, sink)
            }
        };

        expr.type_ref().set_type(ty);
    }

    fn resolve_call(
        &mut self,
        call: &Expr,
        callee: &Expr,
        arguments: &[Expr],
        sink: &mut dyn DiagnosticSink,
    ) -> Type {
        for argument in arguments {
            self.resolve_expr(argument, sink);
        }

        let (callable, kind, name) = match &callee.kind {
            ExprKind::Identifier(id) => {
                let binding = match self.bound(call.id()) {
                    Bound::Binding(binding) => binding,
                    Bound::Undefined(name) => {
                        error(sink, id.position, Kind::UndefinedFunction { name });
                        callee.type_ref().set_type(Type::Unresolved);
                        return Type::Unresolved;
                    }
                    Bound::Missing => {
                        callee.type_ref().set_type(Type::Unresolved);
                        return Type::Unresolved;
                    }
                };

                if !binding.is_local() {
                    self.store.record_global(callee.id(), binding.clone());
                }

                let ty = self.type_of(&binding);
                callee.type_ref().set_type(ty.clone());

                match binding.signature() {
                    Some(signature) => (
                        Callable::User(Rc::clone(signature)),
                        CalleeKind::Function,
                        id.name.clone(),
                    ),
                    // Calling a variable or class is left for the runtime to reject.
                    None => return ty,
                }
            }
            ExprKind::Get { object, name } => {
                self.resolve_expr(object, sink);

                match self.member(object, name, sink) {
                    Some(Member::Method(callable)) => {
                        callee.type_ref().set_type(self.return_type(&callable));
                        (callable, CalleeKind::Method, name.name.clone())
                    }
                    Some(Member::Value(ty)) => {
                        callee.type_ref().set_type(ty.clone());
                        return ty;
                    }
                    None => {
                        callee.type_ref().set_type(Type::Unresolved);
                        return Type::Unresolved;
                    }
                }
            }
            _ => {
                self.resolve_expr(callee, sink);
                return callee.r#type();
            }
        };

        self.check_arguments(&callable, kind, &name, arguments, call.position, sink);
        self.return_type(&callable)
    }

    fn check_arguments(
        &self,
        callable: &Callable,
        kind: CalleeKind,
        name: &str,
        arguments: &[Expr],
        position: Position,
        sink: &mut dyn DiagnosticSink,
    ) {
        let (parameters, is_variadic): (Vec<(String, Type)>, bool) = match callable {
            Callable::User(signature) => {
                self.settle_signature(signature);
                let parameters = signature
                    .parameters
                    .iter()
                    .map(|p| (p.name.clone(), p.type_ref.r#type()))
                    .collect();
                (parameters, false)
            }
            Callable::Native(method) => (method.parameters.clone(), method.is_variadic),
        };

        let expected = parameters.len();
        let found = arguments.len();
        let arity_matches = if is_variadic {
            found >= expected
        } else {
            found == expected
        };

        if !arity_matches {
            error(
                sink,
                position,
                Kind::ArgumentCountMismatch {
                    callee: kind,
                    name: name.to_string(),
                    expected,
                    found,
                },
            );
            return;
        }

        // Extra arguments of a variadic callee are not checked.
        for (argument, (parameter, parameter_type)) in arguments.iter().zip(parameters) {
            if argument.is_null_literal() {
                warning(
                    sink,
                    argument.position,
                    WarningKind::NullParameter {
                        parameter: parameter.clone(),
                    },
                );
            }
            if !coerces(&parameter_type, argument) {
                error(
                    sink,
                    argument.position,
                    Kind::ArgumentTypeMismatch {
                        argument: argument.r#type(),
                        parameter,
                        parameter_type,
                        function: name.to_string(),
                    },
                );
            }
        }
    }

    fn resolve_assignment(
        &mut self,
        assignment: &Expr,
        target: &Expr,
        value: &Expr,
        sink: &mut dyn DiagnosticSink,
    ) -> Type {
        self.resolve_expr(value, sink);

        let target_type = match &target.kind {
            ExprKind::Identifier(id) => match self.bound(assignment.id()) {
                Bound::Binding(binding) => {
                    if !binding.is_local() {
                        self.store.record_global(target.id(), binding.clone());
                    }

                    let ty = self.type_of(&binding);
                    target.type_ref().set_type(ty.clone());

                    // Assigning to functions, classes and objects is an immutability error.
                    match binding.kind() {
                        BindingKind::Variable { .. } | BindingKind::Field(_) => Some(ty),
                        _ => None,
                    }
                }
                Bound::Undefined(name) => {
                    error(sink, id.position, Kind::UndefinedIdentifier { name });
                    target.type_ref().set_type(Type::Unresolved);
                    None
                }
                Bound::Missing => {
                    target.type_ref().set_type(Type::Unresolved);
                    None
                }
            },
            _ => {
                self.resolve_expr(target, sink);
                Some(target.r#type())
            }
        };

        let target_type = match target_type {
            Some(ty) => ty,
            None => return value.r#type(),
        };

        if value.is_null_literal() {
            warning(sink, value.position, WarningKind::NullAssignment);
        }
        if !coerces(&target_type, value) {
            error(
                sink,
                value.position,
                Kind::IncompatibleAssignment {
                    value: value.r#type(),
                    target: target_type.clone(),
                },
            );
        }

        target_type
    }

    fn resolve_binary(
        &mut self,
        operator: BinaryOperator,
        lhs: &Expr,
        rhs: &Expr,
        position: Position,
        sink: &mut dyn DiagnosticSink,
    ) -> Type {
        self.resolve_expr(lhs, sink);
        self.resolve_expr(rhs, sink);

        let lhs = lhs.r#type();
        let rhs = rhs.r#type();

        if !lhs.is_resolved() || !rhs.is_resolved() {
            return Type::Unresolved;
        }

        match operators::binary_result(operator, &lhs, &rhs) {
            Some(ty) => ty,
            None => {
                let kind = if operator.is_compound_assignment() {
                    Kind::IncompatibleAssignment {
                        value: rhs,
                        target: lhs,
                    }
                } else {
                    Kind::InvalidOperands {
                        operator: operator.to_string(),
                        lhs,
                        rhs,
                    }
                };
                error(sink, position, kind);
                Type::Unresolved
            }
        }
    }

    fn resolve_index(
        &mut self,
        indexee: &Expr,
        argument: &Expr,
        position: Position,
        sink: &mut dyn DiagnosticSink,
    ) -> Type {
        self.resolve_expr(indexee, sink);
        self.resolve_expr(argument, sink);

        let indexee_type = indexee.r#type();
        let index_type = argument.r#type();

        if !indexee_type.is_resolved() || !index_type.is_resolved() {
            return Type::Unresolved;
        }

        let integral_index = coerces(&Type::Int32, argument);

        match &indexee_type {
            Type::Null => {
                error(sink, position, Kind::NullIndexed);
                Type::Unresolved
            }
            Type::Array(element_type) => {
                if !integral_index {
                    error(
                        sink,
                        position,
                        Kind::ArrayIndexMismatch {
                            array: (**element_type).clone(),
                            index: index_type,
                        },
                    );
                }
                (**element_type).clone()
            }
            // Strings with a fixed character width.
            Type::AsciiString | Type::Utf16String => {
                if !integral_index {
                    error(
                        sink,
                        position,
                        Kind::IndexMismatch {
                            indexee: indexee_type.clone(),
                            index: index_type,
                        },
                    );
                }
                Type::Char
            }
            Type::Dictionary(key_type, value_type) => {
                if !coerces(key_type, argument) {
                    error(
                        sink,
                        position,
                        Kind::IndexMismatch {
                            indexee: indexee_type.clone(),
                            index: index_type,
                        },
                    );
                }
                (**value_type).clone()
            }
            _ => {
                error(
                    sink,
                    position,
                    Kind::IndexNotSupported {
                        indexee: indexee_type.clone(),
                    },
                );
                Type::Unresolved
            }
        }
    }

    fn resolve_new(
        &mut self,
        new: &Expr,
        class_name: &Identifier,
        arguments: &[Expr],
        sink: &mut dyn DiagnosticSink,
    ) -> Type {
        for argument in arguments {
            self.resolve_expr(argument, sink);
        }

        let class = match self.bound(new.id()) {
            Bound::Binding(binding) => binding.class_info().cloned(),
            Bound::Undefined(_) => None,
            Bound::Missing => return Type::Unresolved,
        };
        let class = match class {
            Some(class) => class,
            None => {
                error(
                    sink,
                    class_name.position,
                    Kind::ClassNotFound {
                        name: class_name.name.clone(),
                    },
                );
                return Type::Unresolved;
            }
        };

        match class.constructors.as_slice() {
            [] if !arguments.is_empty() => error(
                sink,
                new.position,
                Kind::ArgumentCountMismatch {
                    callee: CalleeKind::Method,
                    name: class_name.name.clone(),
                    expected: 0,
                    found: arguments.len(),
                },
            ),
            [] => {}
            [constructor] => self.check_arguments(
                &Callable::User(Rc::clone(constructor)),
                CalleeKind::Method,
                class_name.as_str(),
                arguments,
                new.position,
                sink,
            ),
            constructors => match constructors.iter().find(|c| self.accepts(c, arguments)) {
                Some(constructor) => self.check_arguments(
                    &Callable::User(Rc::clone(constructor)),
                    CalleeKind::Method,
                    class_name.as_str(),
                    arguments,
                    new.position,
                    sink,
                ),
                None => {
                    let arities: Vec<String> = class
                        .constructor_arities()
                        .iter()
                        .map(usize::to_string)
                        .collect();
                    error(
                        sink,
                        new.position,
                        Kind::NoMatchingConstructor {
                            class: class_name.name.clone(),
                            arities: arities.join(" or "),
                            found: arguments.len(),
                        },
                    );
                }
            },
        }

        class.r#type()
    }

    // Whether `signature` takes exactly `arguments`, without reporting anything.
    fn accepts(&self, signature: &FunctionSignature, arguments: &[Expr]) -> bool {
        self.settle_signature(signature);

        signature.parameters.len() == arguments.len()
            && signature
                .parameters
                .iter()
                .zip(arguments)
                .all(|(parameter, argument)| coerces(&parameter.type_ref.r#type(), argument))
    }

    fn collection_type(
        &self,
        elements: &[Expr],
        position: Position,
        sink: &mut dyn DiagnosticSink,
    ) -> Type {
        let types: Vec<Type> = elements.iter().map(Expr::r#type).collect();

        // An empty collection takes its type from where it is used.
        match types.split_first() {
            None => Type::Unresolved,
            Some(_) if types.iter().any(|ty| !ty.is_resolved()) => Type::Unresolved,
            Some((first, rest)) if rest.iter().all(|ty| ty == first) => {
                Type::array_of(first.clone())
            }
            Some(_) => {
                error(sink, position, Kind::CollectionElementsMismatch);
                Type::Unresolved
            }
        }
    }

    // --- Bindings and members

    /// Returns the binding recorded for `expr`, re-binding a global candidate to the global
    /// it names.
    ///
    /// Only declarations may be referred to before they appear. A variable that was not
    /// declared when the name was resolved is undefined at that point.
    fn bound(&mut self, expr: ExprId) -> Bound {
        let binding = match self.store.lookup(expr) {
            Some(binding) => binding.clone(),
            None => return Bound::Missing,
        };

        if !binding.is_global_candidate() {
            return Bound::Binding(binding);
        }

        match self.globals.get(binding.name()) {
            Some(global) if global.object_kind() != ObjectKind::Variable => {
                self.store.record_global(expr, global.clone());
                Bound::Binding(global.clone())
            }
            _ => Bound::Undefined(binding.name().to_string()),
        }
    }

    fn type_of(&self, binding: &Binding) -> Type {
        if let Some(signature) = binding.signature() {
            self.settle_signature(signature);
            return signature.return_type.r#type();
        }

        match binding.type_reference() {
            Some(type_ref) => {
                self.settle(&type_ref);
                type_ref.r#type()
            }
            None => Type::Unresolved,
        }
    }

    fn return_type(&self, callable: &Callable) -> Type {
        match callable {
            Callable::User(signature) => {
                self.settle_signature(signature);
                signature.return_type.r#type()
            }
            Callable::Native(method) => method.return_type.clone(),
        }
    }

    fn member(
        &mut self,
        object: &Expr,
        name: &Identifier,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Member> {
        let object_type = object.r#type();

        let not_found = |sink: &mut dyn DiagnosticSink, class: String| {
            error(
                sink,
                name.position,
                Kind::MemberNotFound {
                    member: name.name.clone(),
                    class,
                },
            );
        };

        match &object_type {
            Type::Class(class_name) => {
                let class = self.class_info(class_name)?;

                if let Some(field) = class.field(name.as_str()) {
                    self.settle(&field.type_ref);
                    return Some(Member::Value(field.type_ref.r#type()));
                }
                if let Some(method) = class.method(name.as_str()) {
                    return Some(Member::Method(Callable::User(Rc::clone(method))));
                }

                not_found(sink, class_name.clone());
                None
            }
            Type::Enum(enum_name) => {
                let info = self.enum_info(enum_name)?;

                if info.has_member(name.as_str()) {
                    return Some(Member::Value(object_type.clone()));
                }

                error(
                    sink,
                    name.position,
                    Kind::EnumMemberNotFound {
                        member: name.name.clone(),
                        enum_name: enum_name.clone(),
                    },
                );
                None
            }
            Type::NativeClass(class_name) => {
                let class = self.globals.native_class(class_name)?;

                match class.method(name.as_str()) {
                    Some(method) => Some(Member::Method(Callable::Native(Rc::clone(method)))),
                    None => {
                        not_found(sink, class_name.clone());
                        None
                    }
                }
            }
            Type::Unresolved => None,
            other => {
                not_found(sink, other.to_string());
                None
            }
        }
    }

    fn class_info(&self, name: &str) -> Option<Rc<ClassInfo>> {
        self.globals
            .get(name)
            .and_then(Binding::class_info)
            .cloned()
            .or_else(|| self.local_classes.get(name).cloned())
    }

    fn enum_info(&self, name: &str) -> Option<Rc<EnumInfo>> {
        match self.globals.get(name).map(Binding::kind) {
            Some(BindingKind::Enum(info)) => Some(Rc::clone(info)),
            _ => self.local_enums.get(name).cloned(),
        }
    }

    // --- Type names

    fn lookup_type(&self, specifier: &TypeSpecifier) -> Result<Type, Kind> {
        let element_type = match Type::from_name(&specifier.name) {
            Some(Type::Void) if specifier.is_array => return Err(Kind::VoidArray),
            Some(ty) => ty,
            None => {
                if let Some(class) = self.class_info(&specifier.name) {
                    class.r#type()
                } else if let Some(info) = self.enum_info(&specifier.name) {
                    info.r#type()
                } else if let Some(class) = self.globals.native_class(&specifier.name) {
                    class.r#type()
                } else {
                    return Err(Kind::TypeNotFound {
                        name: specifier.name.clone(),
                    });
                }
            }
        };

        if specifier.is_array {
            Ok(Type::array_of(element_type))
        } else {
            Ok(element_type)
        }
    }

    /// Resolves an explicit annotation at its declaration, reporting failures.
    fn resolve_declared(&self, type_ref: &TypeReference, sink: &mut dyn DiagnosticSink) {
        if type_ref.is_resolved() {
            return;
        }
        let specifier = match type_ref.specifier() {
            Some(specifier) => specifier,
            None => return,
        };

        match self.lookup_type(specifier) {
            Ok(ty) => type_ref.set_type(ty),
            Err(kind) => {
                type_ref.set_type(Type::Unresolved);
                error(sink, specifier.position, kind);
            }
        }
    }

    /// Resolves an explicit annotation ahead of its declaration, without reporting.
    fn settle(&self, type_ref: &TypeReference) {
        if type_ref.is_settled() {
            return;
        }
        if let Some(specifier) = type_ref.specifier() {
            type_ref.set_type(self.lookup_type(specifier).unwrap_or(Type::Unresolved));
        }
    }

    fn settle_signature(&self, signature: &FunctionSignature) {
        for parameter in &signature.parameters {
            self.settle(&parameter.type_ref);
        }

        self.settle(&signature.return_type);
        if !signature.return_type.is_explicit() && !signature.return_type.is_settled() {
            signature.return_type.set_type(Type::Void);
        }
    }
}

fn literal_type(literal: &Literal) -> Type {
    match literal {
        Literal::Integer(value) => Type::of_integer_literal(*value),
        Literal::Float(_) => Type::Double,
        Literal::String(value) => Type::of_string_literal(value),
        Literal::Char(_) => Type::Char,
        Literal::Bool(_) => Type::Bool,
        Literal::Null => Type::Null,
    }
}

fn coerces(target: &Type, source: &Expr) -> bool {
    let literal = source.literal().and_then(LiteralValue::from_literal);
    can_be_coerced_into(target, &source.r#type(), literal)
}

fn error(sink: &mut dyn DiagnosticSink, position: Position, kind: Kind) {
    sink.type_validation_error(TypeValidationError { position, kind });
}

fn warning(sink: &mut dyn DiagnosticSink, position: Position, kind: WarningKind) {
    sink.compiler_warning(CompilerWarning { position, kind });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sem::{Diagnostics, NameResolver, NativeRegistry};
    use crate::syntax::Parser;
    use assert_matches::assert_matches;

    fn check(src: &str) -> (Program, Diagnostics) {
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

        (program, diagnostics)
    }

    fn messages(src: &str) -> Vec<String> {
        check(src).1.messages()
    }

    fn var_type(program: &Program, index: usize) -> Type {
        match &program.statements[index].kind {
            StmtKind::Var(var) => var.type_ref.r#type(),
            kind => panic!("unexpected statement {:?}", kind),
        }
    }

    #[test]
    fn literal_types() {
        let (program, diagnostics) =
            check("var a = 1; var b = 4294967295; var c = \"åäö\"; var d = 1.5; var e = 'x';");

        assert!(diagnostics.is_empty());
        assert_eq!(var_type(&program, 0), Type::Int32);
        assert_eq!(var_type(&program, 1), Type::UInt32);
        assert_eq!(var_type(&program, 2), Type::Utf8String);
        assert_eq!(var_type(&program, 3), Type::Double);
        assert_eq!(var_type(&program, 4), Type::Char);
    }

    #[test]
    fn undefined_names() {
        assert_eq!(messages("print x;"), vec!["Undefined identifier 'x'"]);
        assert_eq!(
            messages("f();"),
            vec!["Attempting to call undefined function 'f'"]
        );
        assert_eq!(messages("x = 1;"), vec!["Undefined identifier 'x'"]);
    }

    #[test]
    fn forward_references() {
        let (program, diagnostics) = check(
            "var x: int = f(); fun f(): int { return g(); } fun g(): int { var c = new C(); return 1; } class C {}",
        );

        assert!(diagnostics.is_empty(), "{:?}", diagnostics.messages());
        assert_eq!(var_type(&program, 0), Type::Int32);
    }

    #[test]
    fn variable_used_before_declaration() {
        assert_eq!(
            messages("print x; var x = 1;"),
            vec!["Undefined identifier 'x'"]
        );
        assert_eq!(
            messages("fun f(): int { return g; } var g = 1;"),
            vec!["Undefined identifier 'g'"]
        );
        assert_eq!(messages("var y = y;"), vec!["Undefined identifier 'y'"]);
        assert!(messages("var x = 1; print x;").is_empty());
    }

    #[test]
    fn argument_count() {
        assert_eq!(
            messages("fun f(a: int, b: int): void {} f(1);"),
            vec!["Function 'f' has 2 parameter(s) but was called with 1 argument(s)"]
        );
        assert_eq!(
            messages("fun f(a: int, b: int): void {} f(1, 2, 3);"),
            vec!["Function 'f' has 2 parameter(s) but was called with 3 argument(s)"]
        );
        assert!(messages("fun f(a: int, b: int): void {} f(1, 2);").is_empty());
    }

    #[test]
    fn argument_types() {
        assert_eq!(
            messages("fun f(i: int): void {} f(\"x\");"),
            vec!["Cannot pass ASCIIString argument as parameter 'i: int' to f()"]
        );
        assert_eq!(
            messages("fun f(s: string): void {} f(null);"),
            vec!["Null parameter detected for 's'"]
        );
        assert!(messages("fun f(l: long): void {} f(1);").is_empty());
    }

    #[test]
    fn variable_coercion() {
        assert!(messages("var l: long = 1; var u: uint = 4294967295;").is_empty());
        assert_eq!(
            messages("var i: int = 4294967295;"),
            vec!["Cannot assign uint to int variable"]
        );
        assert_eq!(
            messages("var i = 1; var u: uint = i;"),
            vec!["Cannot assign int to uint variable"]
        );
        assert_eq!(
            messages("var l: long = 1; var i: int = l;"),
            vec!["Cannot assign long to int variable"]
        );
        assert!(messages("var i = 1; var l: long = i; var d: double = l;").is_empty());
    }

    #[test]
    fn variable_declarations() {
        assert_eq!(
            messages("var x;"),
            vec!["Type inference for variable 'x' cannot be performed when initializer is not specified. Either provide an initializer, or specify the type explicitly."]
        );
        assert_eq!(
            messages("var x = null;"),
            vec!["Cannot assign null to an implicitly typed local variable"]
        );
        assert_eq!(
            messages("var s: string = null;"),
            vec!["Initializing variable to null detected"]
        );
        assert_eq!(
            messages("var i: int = null;"),
            vec!["Cannot assign null to int variable"]
        );
        assert_eq!(messages("var x: Foo = 1;"), vec!["Type not found: Foo"]);
        assert_eq!(messages("var x: void[];"), vec!["void arrays are not supported"]);
    }

    #[test]
    fn assignments() {
        assert_eq!(
            messages("var i = 1; i = \"s\";"),
            vec!["Cannot assign 'ASCIIString' to 'int' variable"]
        );
        assert_eq!(
            messages("var s: string = \"a\"; s = null;"),
            vec!["Null assignment detected"]
        );
        assert_eq!(
            messages("var s = \"a\"; s -= 1;"),
            vec!["Cannot assign 'int' to 'ASCIIString' variable"]
        );
        assert!(messages("var i = 1; i += 2; i++;").is_empty());
        // Left to immutability validation.
        assert!(messages("fun f(): void {} f = 123;").is_empty());
    }

    #[test]
    fn operators() {
        let (program, diagnostics) = check("var x = 1 + \"a\"; var y = 2 ** 3; var z = 1 < 2;");

        assert!(diagnostics.is_empty());
        assert_eq!(var_type(&program, 0), Type::AsciiString);
        assert_eq!(var_type(&program, 1), Type::BigInt);
        assert_eq!(var_type(&program, 2), Type::Bool);

        assert_eq!(
            messages("var b = true + 1;"),
            vec!["Invalid arguments to operator + specified."]
        );
        assert_eq!(
            messages("var b = 1 && true;"),
            vec!["'int' is not a valid && operand."]
        );
        // The failed operand is not reported a second time.
        assert_eq!(messages("var b = (x + 1) * 2;"), vec!["Undefined identifier 'x'"]);
    }

    #[test]
    fn conditions() {
        assert_eq!(
            messages("if (1) print 1;"),
            vec!["'int' is not a valid 'if' condition."]
        );
        assert_eq!(
            messages("while (\"x\") print 1;"),
            vec!["'ASCIIString' is not a valid 'while' condition."]
        );
        assert!(messages("var i = 0; while (i < 10) i++;").is_empty());
    }

    #[test]
    fn functions() {
        assert_eq!(
            messages("fun f(a): void {}"),
            vec!["Inferred typing is not yet supported for parameter 'a' to function 'f'"]
        );
        assert_eq!(messages("fun f(): Foo {}"), vec!["Type not found: Foo"]);

        let (program, diagnostics) = check("fun f() {} var x = f();");
        assert!(diagnostics.is_empty());
        assert_eq!(var_type(&program, 1), Type::Void);
    }

    #[test]
    fn unknown_type_reported_once() {
        assert_eq!(
            messages("fun g(): void { var y = h(); } fun h(): Nope { }"),
            vec!["Type not found: Nope"]
        );
    }

    #[test]
    fn class_members() {
        assert_eq!(
            messages(
                "class C {
                    public x: int = 1;
                    public f(): int { return this.x + x; }
                }
                var c = new C();
                var y: int = c.x;
                var z: int = c.f();
                c.g();"
            ),
            vec!["Failed to locate symbol 'g' in class C"]
        );
        assert_eq!(
            messages("class C { public f(a: int): void {} } var c = new C(); c.f();"),
            vec!["Method 'f' has 1 parameter(s) but was called with 0 argument(s)"]
        );
    }

    #[test]
    fn instantiation() {
        assert_eq!(
            messages("var c = new D();"),
            vec!["Type 'D' could not be found"]
        );
        assert_eq!(
            messages("class C { public constructor(a: int) {} } var c = new C();"),
            vec!["Method 'C' has 1 parameter(s) but was called with 0 argument(s)"]
        );

        let (program, diagnostics) = check("class C {} var c: C = new C();");
        assert!(diagnostics.is_empty());
        assert_eq!(var_type(&program, 1), Type::Class("C".into()));
    }

    #[test]
    fn instantiation_picks_matching_constructor() {
        let class = "class C {
            public x: int;
            public constructor() { this.x = 1; }
            public constructor(a: int) { this.x = a; }
            public constructor(a: string, b: int) { this.x = b; }
        }";

        for call in &["new C()", "new C(1)", "new C(\"s\", 2)"] {
            assert!(
                messages(&format!("{} var c = {};", class, call)).is_empty(),
                "{}",
                call
            );
        }
        assert_eq!(
            messages(&format!("{} var c = new C(true);", class)),
            vec!["No constructor of class 'C' accepts 1 argument(s) of the given types; constructors take 0 or 1 or 2 parameter(s)"]
        );
        assert_eq!(
            messages(&format!("{} var c = new C(1, 2, 3);", class)).len(),
            1
        );
    }

    fn enum_values(program: &Program, index: usize) -> (Vec<Option<i128>>, Type) {
        match &program.statements[index].kind {
            StmtKind::Enum(declaration) => (
                declaration.members.iter().map(|m| m.value).collect(),
                declaration.underlying_type.r#type(),
            ),
            kind => panic!("unexpected statement {:?}", kind),
        }
    }

    #[test]
    fn enum_widening() {
        let (program, diagnostics) = check("enum Color { RED, GREEN = 4294967295, BLUE }");

        assert!(diagnostics.is_empty());
        assert_eq!(
            enum_values(&program, 0),
            (
                vec![Some(0), Some(4294967295), Some(4294967296)],
                Type::Int64
            )
        );
    }

    #[test]
    fn enum_negative_values() {
        let (program, diagnostics) = check("enum E { A = 1, B = -1, C }");

        assert!(diagnostics.is_empty());
        assert_eq!(
            enum_values(&program, 0),
            (vec![Some(1), Some(-1), Some(0)], Type::Int32)
        );
    }

    #[test]
    fn enum_references_earlier_members() {
        let (program, diagnostics) = check("enum Flags { A = 1, B = A << 1, C = B + 1, D }");

        assert!(diagnostics.is_empty());
        assert_eq!(
            enum_values(&program, 0),
            (vec![Some(1), Some(2), Some(3), Some(4)], Type::Int32)
        );
    }

    #[test]
    fn enum_errors() {
        assert_eq!(
            messages("enum E { A = \"x\" }"),
            vec!["Enum member 'A' initializer must be an integral constant expression"]
        );
        assert_eq!(
            messages("enum E { A = 18446744073709551615, B }"),
            vec!["incremented enumerator value 18446744073709551616 is not representable in the largest integer type"]
        );
        assert_eq!(messages("enum E { A = B }"), vec!["Undefined identifier 'B'"]);
    }

    #[test]
    fn enum_members() {
        let (program, diagnostics) = check("enum E { A } var e = E.A; var f = E.B;");

        assert_eq!(
            diagnostics.messages(),
            vec!["Enum member 'B' not found in enum 'E'"]
        );
        assert_eq!(var_type(&program, 1), Type::Enum("E".into()));
    }

    #[test]
    fn native_members() {
        assert_eq!(
            messages(
                "var s: string = Base64.encode(\"x\");
                 var p: int = Libc.getpid();
                 var a: string = ARGV.pop();
                 Base64.nope();"
            ),
            vec!["Failed to locate symbol 'nope' in class Base64"]
        );
        assert_eq!(
            messages("Base64.encode();"),
            vec!["Method 'encode' has 1 parameter(s) but was called with 0 argument(s)"]
        );
    }

    #[test]
    fn indexing() {
        assert_eq!(
            messages("var a = [1, 2]; var x: int = a[0]; var y = a[\"s\"];"),
            vec!["Array of type 'int' cannot be indexed by 'ASCIIString'"]
        );
        assert!(messages("var s = \"abc\"; var c: char = s[0];").is_empty());
        assert_eq!(
            messages("var s: string = \"abc\"; var c = s[0];"),
            vec!["Unable to index object of type 'string': operation not supported"]
        );
        assert_eq!(
            messages("var env = Libc.environ(); var v: string = env[\"PATH\"]; var w = env[1];"),
            vec!["'Dictionary<string, string>' cannot be indexed by 'int'"]
        );
    }

    #[test]
    fn collections() {
        assert_eq!(
            messages("var a = [1, \"a\"];"),
            vec!["All elements in a collection initializer must have the same type"]
        );

        let (program, _) = check("var a = [\"a\", \"b\"];");
        assert_matches!(var_type(&program, 0), Type::Array(element) => {
            assert_eq!(*element, Type::AsciiString);
        });
    }
}
