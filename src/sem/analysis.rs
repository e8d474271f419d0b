//! Warnings for code that is legal but easy to misread.
use super::errors::{CompilerWarning, InternalCompilerError, WarningKind};
use super::{DiagnosticSink, SemanticAnalyzer};
use crate::syntax::traverse::{traverse, NodePath, Visitor};
use crate::syntax::{Expr, ExprKind, LogicalOperator, Program};

#[derive(Debug, Default)]
pub struct CodeAnalysisValidator {
    warnings: Vec<CompilerWarning>,
}

impl SemanticAnalyzer for CodeAnalysisValidator {
    fn analyze(
        &mut self,
        program: &mut Program,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError> {
        self.validate(program, sink);
        Ok(())
    }
}

impl CodeAnalysisValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&mut self, program: &Program, sink: &mut dyn DiagnosticSink) {
        traverse(self, program);

        for warning in self.warnings.drain(..) {
            sink.compiler_warning(warning);
        }
    }
}

// `a && b || c` parses unambiguously, but readers disagree about its meaning.
fn mixes_with(operand: &Expr, operator: LogicalOperator) -> bool {
    match &operand.kind {
        ExprKind::Logical { operator: inner, .. } => *inner != operator,
        _ => false,
    }
}

impl Visitor for CodeAnalysisValidator {
    fn enter_expr(&mut self, _path: &mut NodePath<'_>, expr: &Expr) {
        if let ExprKind::Logical { operator, lhs, rhs } = &expr.kind {
            if mixes_with(lhs, *operator) || mixes_with(rhs, *operator) {
                self.warnings.push(CompilerWarning {
                    position: expr.position,
                    kind: WarningKind::AmbiguousBooleanOperators,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sem::Diagnostics;
    use crate::syntax::Parser;

    fn warnings(src: &str) -> usize {
        let program = Parser::parse_string(src).unwrap();
        let mut diagnostics = Diagnostics::new();

        CodeAnalysisValidator::new().validate(&program, &mut diagnostics);
        assert!(!diagnostics.has_errors());
        diagnostics.warnings().count()
    }

    #[test]
    fn mixed_boolean_operators() {
        assert_eq!(warnings("var a = true && false || true;"), 1);
        assert_eq!(warnings("var a = true || false && true;"), 1);
        assert_eq!(warnings("if (true && false || true && true) print 1;"), 1);
    }

    #[test]
    fn grouped_or_uniform_operators() {
        assert_eq!(warnings("var a = (true && false) || true;"), 0);
        assert_eq!(warnings("var a = true && false && true;"), 0);
        assert_eq!(warnings("var a = true || false || true;"), 0);
    }
}
