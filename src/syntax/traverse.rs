use crate::syntax::tree::*;

/// The position of a node in the tree, as seen by a [`Visitor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NodePath<'a> {
    skipped: bool,
    class: Option<&'a Class>,
    function: Option<&'a Function>,
}

impl<'a> NodePath<'a> {
    fn child(&self) -> Self {
        Self {
            skipped: false,
            ..*self
        }
    }

    /// The innermost class enclosing the node, unless a function declared outside of it is
    /// closer.
    pub fn class(&self) -> Option<&'a Class> {
        self.class
    }

    /// The innermost function or method enclosing the node.
    pub fn function(&self) -> Option<&'a Function> {
        self.function
    }

    pub fn is_in_constructor(&self) -> bool {
        self.class.is_some() && self.function.map_or(false, |f| f.is_constructor)
    }

    /// skips traversing the children and `exit` of the current path.
    pub fn skip(&mut self) {
        self.skipped = true;
    }
}

#[allow(unused_variables)]
pub trait Visitor {
    fn enter_program(&mut self, path: &mut NodePath<'_>, program: &Program) {}
    fn exit_program(&mut self, path: &mut NodePath<'_>, program: &Program) {}

    fn enter_stmt(&mut self, path: &mut NodePath<'_>, stmt: &Stmt) {}
    fn exit_stmt(&mut self, path: &mut NodePath<'_>, stmt: &Stmt) {}

    fn enter_class(&mut self, path: &mut NodePath<'_>, class: &Class) {}
    fn exit_class(&mut self, path: &mut NodePath<'_>, class: &Class) {}

    fn enter_function(&mut self, path: &mut NodePath<'_>, function: &Function) {}
    fn exit_function(&mut self, path: &mut NodePath<'_>, function: &Function) {}

    fn enter_expr(&mut self, path: &mut NodePath<'_>, expr: &Expr) {}
    fn exit_expr(&mut self, path: &mut NodePath<'_>, expr: &Expr) {}
}

pub fn traverse(visitor: &mut dyn Visitor, program: &Program) {
    let mut path = NodePath::default();

    visitor.enter_program(&mut path, program);
    if path.skipped {
        return;
    }
    for stmt in &program.statements {
        traverse_stmt(visitor, &path, stmt);
    }
    visitor.exit_program(&mut path, program);
}

fn traverse_stmt<'a>(visitor: &mut dyn Visitor, parent: &NodePath<'a>, stmt: &'a Stmt) {
    let mut path = parent.child();

    visitor.enter_stmt(&mut path, stmt);
    if path.skipped {
        return;
    }

    match &stmt.kind {
        StmtKind::Block(statements) => {
            for stmt in statements {
                traverse_stmt(visitor, &path, stmt);
            }
        }
        StmtKind::Class(class) => traverse_class(visitor, &path, class),
        StmtKind::Expression(expr) | StmtKind::Print(expr) => traverse_expr(visitor, &path, expr),
        StmtKind::Function(function) => traverse_function(visitor, &path, function),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            traverse_expr(visitor, &path, condition);
            traverse_stmt(visitor, &path, then_branch);
            if let Some(else_branch) = else_branch {
                traverse_stmt(visitor, &path, else_branch);
            }
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                traverse_expr(visitor, &path, value);
            }
        }
        StmtKind::Var(var) => {
            if let Some(initializer) = &var.initializer {
                traverse_expr(visitor, &path, initializer);
            }
        }
        StmtKind::While { condition, body } => {
            traverse_expr(visitor, &path, condition);
            traverse_stmt(visitor, &path, body);
        }
        StmtKind::Enum(declaration) => {
            for initializer in declaration.members.iter().filter_map(|m| m.initializer.as_ref()) {
                traverse_expr(visitor, &path, initializer);
            }
        }
    }

    visitor.exit_stmt(&mut path, stmt);
}

fn traverse_class<'a>(visitor: &mut dyn Visitor, parent: &NodePath<'a>, class: &'a Class) {
    let mut path = NodePath {
        class: Some(class),
        function: None,
        ..parent.child()
    };

    visitor.enter_class(&mut path, class);
    if path.skipped {
        return;
    }

    for field in &class.fields {
        if let Some(initializer) = &field.initializer {
            traverse_expr(visitor, &path, initializer);
        }
    }
    for method in &class.methods {
        traverse_function(visitor, &path, method);
    }

    visitor.exit_class(&mut path, class);
}

fn traverse_function<'a>(visitor: &mut dyn Visitor, parent: &NodePath<'a>, function: &'a Function) {
    let mut path = NodePath {
        function: Some(function),
        ..parent.child()
    };

    visitor.enter_function(&mut path, function);
    if path.skipped {
        return;
    }
    for stmt in &function.body {
        traverse_stmt(visitor, &path, stmt);
    }
    visitor.exit_function(&mut path, function);
}

fn traverse_expr<'a>(visitor: &mut dyn Visitor, parent: &NodePath<'a>, expr: &'a Expr) {
    let mut path = parent.child();

    visitor.enter_expr(&mut path, expr);
    if path.skipped {
        return;
    }

    match &expr.kind {
        ExprKind::Identifier(_) | ExprKind::Literal(_) => {}
        ExprKind::Get { object, .. } => traverse_expr(visitor, &path, object),
        ExprKind::Call { callee, arguments } => {
            traverse_expr(visitor, &path, callee);
            for argument in arguments {
                traverse_expr(visitor, &path, argument);
            }
        }
        ExprKind::Assign { target, value } => {
            traverse_expr(visitor, &path, target);
            traverse_expr(visitor, &path, value);
        }
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Logical { lhs, rhs, .. } => {
            traverse_expr(visitor, &path, lhs);
            traverse_expr(visitor, &path, rhs);
        }
        ExprKind::UnaryPrefix { operand, .. } | ExprKind::UnaryPostfix { operand, .. } => {
            traverse_expr(visitor, &path, operand)
        }
        ExprKind::Index { indexee, argument } => {
            traverse_expr(visitor, &path, indexee);
            traverse_expr(visitor, &path, argument);
        }
        ExprKind::Grouping(inner) => traverse_expr(visitor, &path, inner),
        ExprKind::New { arguments, .. } | ExprKind::Collection(arguments) => {
            for argument in arguments {
                traverse_expr(visitor, &path, argument);
            }
        }
    }

    visitor.exit_expr(&mut path, expr);
}
