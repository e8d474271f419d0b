//! Implicit conversions between types.
use super::Type;
use crate::syntax::Literal;

/// Compile-time value of a numeric literal source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue {
    Integer(i128),
    Float(f64),
}

impl LiteralValue {
    pub fn from_literal(literal: &Literal) -> Option<Self> {
        match literal {
            Literal::Integer(i) => Some(LiteralValue::Integer(*i)),
            Literal::Float(x) => Some(LiteralValue::Float(*x)),
            _ => None,
        }
    }
}

// Number of bits needed to hold a value. `None` stands for unbounded.
type Width = Option<u32>;

const UNBOUNDED: Width = None;

/// Returns `true` if a value of type `source` may be used where `target` is expected.
///
/// `literal` carries the value when the source is a numeric literal; literals coerce by the
/// magnitude of their value rather than by their own type. Unresolved types are accepted
/// since the failure that produced them has already been reported.
pub fn can_be_coerced_into(target: &Type, source: &Type, literal: Option<LiteralValue>) -> bool {
    if !target.is_resolved() || !source.is_resolved() {
        return true;
    }
    if target == source {
        return true;
    }
    if is_assignable(target, source) {
        return true;
    }
    if source.is_null() {
        return target.is_reference_type();
    }

    match literal {
        Some(LiteralValue::Integer(value)) if source.is_integer() => {
            integer_literal_fits(target, value)
        }
        Some(LiteralValue::Float(_)) if source.is_floating_point() => target.is_floating_point(),
        _ => widens_into(target, source),
    }
}

fn is_assignable(target: &Type, source: &Type) -> bool {
    match target {
        Type::String => source.is_string(),
        Type::Object => source.is_reference_type(),
        _ => false,
    }
}

fn integer_literal_fits(target: &Type, value: i128) -> bool {
    let magnitude = if value < 0 { -(value + 1) } else { value };
    let bits = 128 - magnitude.leading_zeros();

    let width: Width = match target {
        Type::UInt32 if value >= 0 => Some(32),
        Type::UInt64 if value >= 0 => Some(64),
        Type::Int32 => Some(31),
        Type::Int64 => Some(63),
        Type::BigInt => UNBOUNDED,
        Type::Float => Some(32),
        Type::Double => Some(64),
        _ => return false,
    };

    width.map_or(true, |width| bits <= width)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Signed,
    Unsigned,
    Floating,
}

fn numeric_width(ty: &Type, family: Family) -> Option<Width> {
    let width = match (family, ty) {
        (Family::Signed, Type::Int32) => Some(31),
        (Family::Signed, Type::Int64) => Some(63),
        (Family::Unsigned, Type::UInt32) => Some(32),
        (Family::Unsigned, Type::UInt64) => Some(64),
        (Family::Signed, Type::BigInt) | (Family::Unsigned, Type::BigInt) => UNBOUNDED,
        (Family::Floating, Type::Float) => Some(32),
        (Family::Floating, Type::Double) => Some(64),
        _ => return None,
    };

    Some(width)
}

fn is_at_least(target: Width, source: Width) -> bool {
    match (target, source) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(target), Some(source)) => source <= target,
    }
}

fn widens_into(target: &Type, source: &Type) -> bool {
    for family in &[Family::Signed, Family::Unsigned, Family::Floating] {
        if let (Some(target_width), Some(source_width)) = (
            numeric_width(target, *family),
            numeric_width(source, *family),
        ) {
            if is_at_least(target_width, source_width) {
                return true;
            }
        }
    }

    // int -> float, long -> double
    if let (Some(Some(target_width)), Some(Some(source_width))) = (
        numeric_width(target, Family::Floating),
        numeric_width(source, Family::Signed),
    ) {
        return source_width < target_width;
    }

    false
}
