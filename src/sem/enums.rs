//! Values and underlying types of enum members.
use super::Type;
use crate::syntax::{BinaryOperator, Expr, ExprKind, Identifier, Literal, UnaryOperator};
use std::collections::HashMap;
use std::convert::TryFrom;

#[derive(Debug, PartialEq)]
pub enum ConstantError<'a> {
    /// Not an integer, or not computable at compile time.
    NotIntegral,
    Undefined(&'a Identifier),
}

/// Evaluates an enum member initializer. `members` holds the values of the members declared
/// before it.
pub fn evaluate<'a>(
    expr: &'a Expr,
    members: &HashMap<String, i128>,
) -> Result<i128, ConstantError<'a>> {
    match &expr.kind {
        ExprKind::Literal(Literal::Integer(value)) => Ok(*value),
        ExprKind::Grouping(inner) => evaluate(inner, members),
        ExprKind::Identifier(id) => members
            .get(id.as_str())
            .copied()
            .ok_or(ConstantError::Undefined(id)),
        ExprKind::UnaryPrefix {
            operator: UnaryOperator::Minus,
            operand,
        } => evaluate(operand, members)?
            .checked_neg()
            .ok_or(ConstantError::NotIntegral),
        ExprKind::Binary { operator, lhs, rhs } => {
            let lhs = evaluate(lhs, members)?;
            let rhs = evaluate(rhs, members)?;

            let value = match operator {
                BinaryOperator::Add => lhs.checked_add(rhs),
                BinaryOperator::Subtract => lhs.checked_sub(rhs),
                BinaryOperator::Multiply => lhs.checked_mul(rhs),
                BinaryOperator::Divide => lhs.checked_div(rhs),
                BinaryOperator::Modulo => lhs.checked_rem(rhs),
                BinaryOperator::ShiftLeft => u32::try_from(rhs)
                    .ok()
                    .and_then(|rhs| lhs.checked_shl(rhs)),
                BinaryOperator::ShiftRight => u32::try_from(rhs)
                    .ok()
                    .and_then(|rhs| lhs.checked_shr(rhs)),
                _ => None,
            };

            value.ok_or(ConstantError::NotIntegral)
        }
        _ => Err(ConstantError::NotIntegral),
    }
}

/// Whether `value` is representable by one of the enum underlying types.
pub fn is_representable(value: i128) -> bool {
    i64::try_from(value).is_ok() || u64::try_from(value).is_ok()
}

/// The narrowest of `int`, `uint`, `long` and `ulong` holding every value.
pub fn underlying_type(values: &[i128]) -> Option<Type> {
    let all = |fits: fn(i128) -> bool| values.iter().all(|v| fits(*v));

    if all(|v| i32::try_from(v).is_ok()) {
        Some(Type::Int32)
    } else if all(|v| u32::try_from(v).is_ok()) {
        Some(Type::UInt32)
    } else if all(|v| i64::try_from(v).is_ok()) {
        Some(Type::Int64)
    } else if all(|v| u64::try_from(v).is_ok()) {
        Some(Type::UInt64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Parser, StmtKind};
    use assert_matches::assert_matches;

    fn eval(src: &str, members: &[(&str, i128)]) -> Result<i128, String> {
        let program = Parser::parse_string(&format!("{};", src)).unwrap();
        let members = members
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();

        match &program.statements[0].kind {
            StmtKind::Expression(expr) => evaluate(expr, &members).map_err(|e| match e {
                ConstantError::NotIntegral => "not integral".to_string(),
                ConstantError::Undefined(id) => format!("undefined {}", id),
            }),
            _ => unreachable!(),
        }
    }

    #[test]
    fn constant_expressions() {
        assert_eq!(eval("42", &[]), Ok(42));
        assert_eq!(eval("-(2 + 3) * 4", &[]), Ok(-20));
        assert_eq!(eval("1 << 32", &[]), Ok(4294967296));
        assert_eq!(eval("A + 1", &[("A", 9)]), Ok(10));
    }

    #[test]
    fn not_constant() {
        assert_eq!(eval("\"red\"", &[]), Err("not integral".to_string()));
        assert_eq!(eval("1.5", &[]), Err("not integral".to_string()));
        assert_eq!(eval("1 / 0", &[]), Err("not integral".to_string()));
        assert_eq!(eval("B", &[]), Err("undefined B".to_string()));
    }

    #[test]
    fn underlying_types() {
        assert_eq!(underlying_type(&[]), Some(Type::Int32));
        assert_eq!(underlying_type(&[0, 1, -1]), Some(Type::Int32));
        assert_eq!(underlying_type(&[0, 4294967295]), Some(Type::UInt32));
        assert_eq!(underlying_type(&[-1, 4294967295]), Some(Type::Int64));
        assert_eq!(underlying_type(&[0, 4294967296]), Some(Type::Int64));
        assert_eq!(
            underlying_type(&[0, 18446744073709551615]),
            Some(Type::UInt64)
        );
        assert_matches!(underlying_type(&[-1, 18446744073709551615]), None);
    }

    #[test]
    fn representable() {
        assert!(is_representable(18446744073709551615));
        assert!(!is_representable(18446744073709551616));
        assert!(is_representable(-9223372036854775808));
    }
}
