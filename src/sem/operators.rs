//! Operand types accepted by the binary operators and the types they produce.
use super::Type;
use crate::syntax::BinaryOperator;

/// Returns the result type of `lhs operator rhs`, or `None` if the operand types are not
/// supported by the operator.
pub fn binary_result(operator: BinaryOperator, lhs: &Type, rhs: &Type) -> Option<Type> {
    use BinaryOperator::*;

    match operator {
        Add => concatenation(lhs, rhs).or_else(|| arithmetic(lhs, rhs)),
        Subtract | Multiply | Divide | Modulo => arithmetic(lhs, rhs),
        AddAssign | SubtractAssign => compound_assignment(lhs, rhs),
        ShiftLeft | ShiftRight => shift(lhs, rhs),
        Power => power(lhs, rhs),
        Less | LessEqual | Greater | GreaterEqual => comparison(lhs, rhs).map(|_| Type::Bool),
        // Values of any two types can be compared for equality.
        Equal | NotEqual => Some(Type::Bool),
    }
}

// int, long, uint
fn is_small_integer(ty: &Type) -> bool {
    matches!(ty, Type::Int32 | Type::Int64 | Type::UInt32)
}

fn is_unsigned(ty: &Type) -> bool {
    matches!(ty, Type::UInt32 | Type::UInt64)
}

// Numbers with a fixed size representation.
fn is_fixed_numeric(ty: &Type) -> bool {
    ty.is_numeric() && *ty != Type::BigInt
}

fn involves(lhs: &Type, rhs: &Type, ty: &Type) -> bool {
    lhs == ty || rhs == ty
}

fn concatenation(lhs: &Type, rhs: &Type) -> Option<Type> {
    let result = match (lhs, rhs) {
        (Type::String, r) if r.is_string() => Type::String,
        (l, Type::String) if l.is_string() => Type::String,
        (Type::AsciiString, Type::AsciiString) => Type::AsciiString,
        (Type::Utf8String, Type::Utf8String)
        | (Type::AsciiString, Type::Utf8String)
        | (Type::Utf8String, Type::AsciiString) => Type::Utf8String,
        (l, r) if l.is_string() && r.is_numeric() => l.clone(),
        (l, r) if l.is_numeric() && r.is_string() => r.clone(),
        _ => return None,
    };

    Some(result)
}

fn arithmetic(lhs: &Type, rhs: &Type) -> Option<Type> {
    let result = match (lhs, rhs) {
        (Type::Int32, Type::Int32) => Type::Int32,
        (Type::UInt32, Type::UInt32) => Type::UInt32,
        (Type::Int64, Type::Int64) => Type::Int64,
        (l, r) if is_unsigned(l) && is_unsigned(r) => Type::UInt64,
        (l, r) if is_small_integer(l) && is_small_integer(r) => Type::Int64,
        (l, r) if is_fixed_numeric(l) && is_fixed_numeric(r) && involves(l, r, &Type::Double) => {
            Type::Double
        }
        (l, r) if is_fixed_numeric(l) && is_fixed_numeric(r) && involves(l, r, &Type::Float) => {
            Type::Float
        }
        (l, r) if l.is_integer() && r.is_integer() && involves(l, r, &Type::BigInt) => {
            Type::BigInt
        }
        _ => return None,
    };

    Some(result)
}

fn compound_assignment(lhs: &Type, rhs: &Type) -> Option<Type> {
    let result = match (lhs, rhs) {
        (Type::Int32, Type::Int32) => Type::Int32,
        (Type::UInt32, Type::UInt32) => Type::UInt32,
        (Type::UInt64, r) if is_unsigned(r) => Type::UInt64,
        (l, r) if is_small_integer(l) && is_small_integer(r) => Type::Int64,
        // float += double is rejected; it would lose precision silently.
        (Type::Float, r) if is_fixed_numeric(r) && *r != Type::Double => Type::Float,
        (Type::Double, r) if is_fixed_numeric(r) => Type::Double,
        (l, r) if l.is_integer() && r.is_integer() && involves(l, r, &Type::BigInt) => {
            Type::BigInt
        }
        _ => return None,
    };

    Some(result)
}

fn shift(lhs: &Type, rhs: &Type) -> Option<Type> {
    if lhs.is_integer() && *rhs == Type::Int32 {
        Some(lhs.clone())
    } else {
        None
    }
}

fn power(lhs: &Type, rhs: &Type) -> Option<Type> {
    if lhs.is_integer() && *rhs == Type::Int32 {
        Some(Type::BigInt)
    } else if (is_fixed_numeric(lhs) && rhs.is_floating_point())
        || (lhs.is_floating_point() && is_fixed_numeric(rhs))
    {
        Some(Type::Double)
    } else {
        None
    }
}

fn comparison(lhs: &Type, rhs: &Type) -> Option<()> {
    let supported = (is_small_integer(lhs) && is_small_integer(rhs))
        || (is_unsigned(lhs) && is_unsigned(rhs))
        || (is_fixed_numeric(lhs)
            && is_fixed_numeric(rhs)
            && (lhs.is_floating_point() || rhs.is_floating_point()))
        || (lhs.is_integer() && rhs.is_integer() && involves(lhs, rhs, &Type::BigInt));

    if supported {
        Some(())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BinaryOperator::*;

    #[test]
    fn integer_arithmetic() {
        assert_eq!(binary_result(Add, &Type::Int32, &Type::Int32), Some(Type::Int32));
        assert_eq!(binary_result(Divide, &Type::Int32, &Type::Int64), Some(Type::Int64));
        assert_eq!(binary_result(Subtract, &Type::UInt32, &Type::Int32), Some(Type::Int64));
        assert_eq!(binary_result(Multiply, &Type::UInt32, &Type::UInt64), Some(Type::UInt64));
        assert_eq!(binary_result(Modulo, &Type::Int64, &Type::BigInt), Some(Type::BigInt));
        assert_eq!(binary_result(Add, &Type::Int32, &Type::UInt64), None);
    }

    #[test]
    fn floating_point_arithmetic() {
        assert_eq!(binary_result(Add, &Type::Float, &Type::Double), Some(Type::Double));
        assert_eq!(binary_result(Add, &Type::Int32, &Type::Float), Some(Type::Float));
        assert_eq!(binary_result(Add, &Type::BigInt, &Type::Double), None);
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(binary_result(Add, &Type::String, &Type::AsciiString), Some(Type::String));
        assert_eq!(
            binary_result(Add, &Type::AsciiString, &Type::Utf8String),
            Some(Type::Utf8String)
        );
        assert_eq!(binary_result(Add, &Type::AsciiString, &Type::Int32), Some(Type::AsciiString));
        assert_eq!(binary_result(Add, &Type::Double, &Type::String), Some(Type::String));
        assert_eq!(binary_result(Subtract, &Type::String, &Type::String), None);
        assert_eq!(binary_result(Add, &Type::String, &Type::Bool), None);
    }

    #[test]
    fn shift_and_power() {
        assert_eq!(binary_result(ShiftLeft, &Type::UInt64, &Type::Int32), Some(Type::UInt64));
        assert_eq!(binary_result(ShiftRight, &Type::Int32, &Type::Int64), None);
        assert_eq!(binary_result(Power, &Type::Int32, &Type::Int32), Some(Type::BigInt));
        assert_eq!(binary_result(Power, &Type::Int32, &Type::Double), Some(Type::Double));
        assert_eq!(binary_result(Power, &Type::Int32, &Type::Int64), None);
    }

    #[test]
    fn comparisons() {
        assert_eq!(binary_result(Less, &Type::Int32, &Type::UInt32), Some(Type::Bool));
        assert_eq!(binary_result(Greater, &Type::UInt64, &Type::Int32), None);
        assert_eq!(binary_result(LessEqual, &Type::UInt64, &Type::Double), Some(Type::Bool));
        assert_eq!(binary_result(Less, &Type::String, &Type::String), None);
        assert_eq!(binary_result(Equal, &Type::String, &Type::Int32), Some(Type::Bool));
        assert_eq!(binary_result(NotEqual, &Type::Null, &Type::Int32), Some(Type::Bool));
    }

    #[test]
    fn compound_assignments() {
        assert_eq!(binary_result(AddAssign, &Type::Int32, &Type::Int32), Some(Type::Int32));
        assert_eq!(binary_result(AddAssign, &Type::UInt64, &Type::UInt32), Some(Type::UInt64));
        assert_eq!(binary_result(SubtractAssign, &Type::Float, &Type::Int32), Some(Type::Float));
        assert_eq!(binary_result(AddAssign, &Type::Float, &Type::Double), None);
        assert_eq!(binary_result(AddAssign, &Type::Double, &Type::Float), Some(Type::Double));
        assert_eq!(binary_result(AddAssign, &Type::String, &Type::String), None);
    }

    #[test]
    fn null_operands() {
        assert_eq!(binary_result(Add, &Type::Null, &Type::Int32), None);
        assert_eq!(binary_result(Add, &Type::String, &Type::Null), None);
    }
}
