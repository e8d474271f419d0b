use crate::syntax::TypeSpecifier;
use std::cell::RefCell;
use std::convert::TryFrom;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int32,
    Int64,
    BigInt,
    UInt32,
    UInt64,
    Float,
    Double,
    Bool,
    Char,
    String,
    AsciiString,
    Utf8String,
    Utf16String,
    Object,
    // Unit type.
    Void,
    // The type of the `null` literal.
    Null,
    Array(Box<Type>),
    Dictionary(Box<Type>, Box<Type>),
    Class(String),
    NativeClass(String),
    Enum(String),
    /// The type of a node whose resolution failed. Checks involving it are skipped so one
    /// mistake is reported once.
    Unresolved,
}

impl Type {
    /// Looks up a built-in type by its keyword or alias.
    pub fn from_name(name: &str) -> Option<Type> {
        let ty = match name {
            "int" | "Int32" => Type::Int32,
            "long" | "Int64" => Type::Int64,
            "bigint" | "BigInteger" => Type::BigInt,
            "uint" | "UInt32" => Type::UInt32,
            "ulong" | "UInt64" => Type::UInt64,
            "float" | "Float" => Type::Float,
            "double" | "Double" => Type::Double,
            "bool" | "Bool" => Type::Bool,
            "char" | "Char" => Type::Char,
            "string" | "String" => Type::String,
            "ASCIIString" => Type::AsciiString,
            "UTF8String" => Type::Utf8String,
            "UTF16String" => Type::Utf16String,
            "object" => Type::Object,
            "void" => Type::Void,
            _ => return None,
        };

        Some(ty)
    }

    /// The narrowest type able to represent an integer literal.
    pub fn of_integer_literal(value: i128) -> Type {
        if i32::try_from(value).is_ok() {
            Type::Int32
        } else if u32::try_from(value).is_ok() {
            Type::UInt32
        } else if i64::try_from(value).is_ok() {
            Type::Int64
        } else if u64::try_from(value).is_ok() {
            Type::UInt64
        } else {
            Type::BigInt
        }
    }

    pub fn of_string_literal(value: &str) -> Type {
        if value.is_ascii() {
            Type::AsciiString
        } else {
            Type::Utf8String
        }
    }

    pub fn array_of(element_type: Type) -> Type {
        Type::Array(Box::new(element_type))
    }

    pub fn dictionary_of(key_type: Type, value_type: Type) -> Type {
        Type::Dictionary(Box::new(key_type), Box::new(value_type))
    }

    pub fn element_type(&self) -> Option<&Type> {
        if let Type::Array(element_type) = self {
            Some(element_type)
        } else {
            None
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Type::Unresolved)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Type::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Type::Int32 | Type::Int64 | Type::BigInt | Type::UInt32 | Type::UInt64
        )
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, Type::Float | Type::Double)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating_point()
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self,
            Type::String | Type::AsciiString | Type::Utf8String | Type::Utf16String
        )
    }

    /// Values of reference types may be `null`.
    pub fn is_reference_type(&self) -> bool {
        self.is_string()
            || matches!(
                self,
                Type::Object
                    | Type::Array(_)
                    | Type::Dictionary(..)
                    | Type::Class(_)
                    | Type::NativeClass(_)
            )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int32 => write!(f, "int"),
            Type::Int64 => write!(f, "long"),
            Type::BigInt => write!(f, "bigint"),
            Type::UInt32 => write!(f, "uint"),
            Type::UInt64 => write!(f, "ulong"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::Bool => write!(f, "bool"),
            Type::Char => write!(f, "char"),
            Type::String => write!(f, "string"),
            Type::AsciiString => write!(f, "ASCIIString"),
            Type::Utf8String => write!(f, "UTF8String"),
            Type::Utf16String => write!(f, "UTF16String"),
            Type::Object => write!(f, "object"),
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "null"),
            Type::Array(element_type) => write!(f, "{}[]", element_type),
            Type::Dictionary(key_type, value_type) => {
                write!(f, "Dictionary<{}, {}>", key_type, value_type)
            }
            Type::Class(name) | Type::NativeClass(name) | Type::Enum(name) => {
                write!(f, "{}", name)
            }
            Type::Unresolved => write!(f, "<unresolved>"),
        }
    }
}

/// The type slot of an expression or declaration.
///
/// Clones share the same slot: a binding holding a clone of a declaration's reference sees
/// the type as soon as the declaration is resolved, and vice versa.
#[derive(Debug, Clone, Default)]
pub struct TypeReference {
    inner: Rc<TypeSlot>,
}

#[derive(Debug, Default)]
struct TypeSlot {
    specifier: Option<TypeSpecifier>,
    resolved: RefCell<Option<Type>>,
}

impl TypeReference {
    /// A reference whose type is inferred from its context.
    pub fn inferred() -> Self {
        Self::default()
    }

    /// A reference written out in source.
    pub fn explicit(specifier: TypeSpecifier) -> Self {
        Self {
            inner: Rc::new(TypeSlot {
                specifier: Some(specifier),
                resolved: RefCell::new(None),
            }),
        }
    }

    /// An already known type, used for built-in and native declarations.
    pub fn resolved(ty: Type) -> Self {
        Self {
            inner: Rc::new(TypeSlot {
                specifier: None,
                resolved: RefCell::new(Some(ty)),
            }),
        }
    }

    pub fn specifier(&self) -> Option<&TypeSpecifier> {
        self.inner.specifier.as_ref()
    }

    pub fn is_explicit(&self) -> bool {
        self.inner.specifier.is_some()
    }

    pub fn get(&self) -> Option<Type> {
        self.inner.resolved.borrow().clone()
    }

    /// The resolved type, `Type::Unresolved` if the reference has not been resolved.
    pub fn r#type(&self) -> Type {
        self.get().unwrap_or(Type::Unresolved)
    }

    pub fn set_type(&self, ty: Type) {
        self.inner.resolved.replace(Some(ty));
    }

    /// Whether a type has been assigned, including `Type::Unresolved` after a failure.
    pub fn is_settled(&self) -> bool {
        self.inner.resolved.borrow().is_some()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*self.inner.resolved.borrow(), Some(ty) if ty.is_resolved())
    }

    pub fn is_null(&self) -> bool {
        matches!(&*self.inner.resolved.borrow(), Some(Type::Null))
    }

    pub fn shares_slot_with(&self, other: &TypeReference) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.get(), self.specifier()) {
            (Some(ty), _) if ty.is_resolved() => write!(f, "{}", ty),
            (_, Some(specifier)) => write!(f, "{}", specifier),
            _ => write!(f, "<inferred>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Position;

    #[test]
    fn builtin_names() {
        assert_eq!(Type::from_name("int"), Some(Type::Int32));
        assert_eq!(Type::from_name("Int32"), Some(Type::Int32));
        assert_eq!(Type::from_name("BigInteger"), Some(Type::BigInt));
        assert_eq!(Type::from_name("ASCIIString"), Some(Type::AsciiString));
        assert_eq!(Type::from_name("Circle"), None);
    }

    #[test]
    fn integer_literal_types() {
        assert_eq!(Type::of_integer_literal(0), Type::Int32);
        assert_eq!(Type::of_integer_literal(-1), Type::Int32);
        assert_eq!(Type::of_integer_literal(2147483647), Type::Int32);
        assert_eq!(Type::of_integer_literal(2147483648), Type::UInt32);
        assert_eq!(Type::of_integer_literal(4294967295), Type::UInt32);
        assert_eq!(Type::of_integer_literal(-4294967295), Type::Int64);
        assert_eq!(Type::of_integer_literal(4294967296), Type::Int64);
        assert_eq!(Type::of_integer_literal(9223372036854775808), Type::UInt64);
        assert_eq!(Type::of_integer_literal(18446744073709551616), Type::BigInt);
        assert_eq!(Type::of_integer_literal(-9223372036854775809), Type::BigInt);
    }

    #[test]
    fn string_literal_types() {
        assert_eq!(Type::of_string_literal("abc"), Type::AsciiString);
        assert_eq!(Type::of_string_literal("åäö"), Type::Utf8String);
    }

    #[test]
    fn display() {
        assert_eq!(Type::array_of(Type::Int32).to_string(), "int[]");
        assert_eq!(
            Type::dictionary_of(Type::String, Type::String).to_string(),
            "Dictionary<string, string>"
        );
        assert_eq!(Type::Class("Circle".into()).to_string(), "Circle");
        assert_eq!(Type::UInt64.to_string(), "ulong");
    }

    #[test]
    fn reference_types() {
        assert!(Type::String.is_reference_type());
        assert!(Type::array_of(Type::Int32).is_reference_type());
        assert!(Type::Class("C".into()).is_reference_type());
        assert!(!Type::Int32.is_reference_type());
        assert!(!Type::Enum("E".into()).is_reference_type());
        assert!(!Type::Null.is_reference_type());
    }

    #[test]
    fn clones_share_the_slot() {
        let specifier = TypeSpecifier {
            name: "int".to_string(),
            is_array: false,
            position: Position::default(),
        };
        let declared = TypeReference::explicit(specifier);
        let bound = declared.clone();

        assert!(!bound.is_resolved());
        declared.set_type(Type::Int32);
        assert_eq!(bound.get(), Some(Type::Int32));
        assert!(bound.shares_slot_with(&declared));
        assert!(!bound.shares_slot_with(&TypeReference::inferred()));
    }

    #[test]
    fn unresolved_is_settled_but_not_resolved() {
        let type_ref = TypeReference::inferred();

        type_ref.set_type(Type::Unresolved);
        assert!(type_ref.is_settled());
        assert!(!type_ref.is_resolved());
    }
}
