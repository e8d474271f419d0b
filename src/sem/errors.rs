use super::{ObjectKind, Type};
use crate::syntax::{LogicalOperator, Position};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("{kind} at {position}")]
pub struct NameResolutionError {
    pub position: Position,
    pub kind: NameResolutionErrorKind,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NameResolutionErrorKind {
    #[error("Variable with this name already declared in this scope.")]
    AlreadyDeclared,
    #[error("Cannot read local variable in its own initializer.")]
    ReadInOwnInitializer,
    #[error("{kind} {name} already defined; cannot redefine")]
    GlobalRedefinition { kind: ObjectKind, name: String },
    #[error("Cannot return from top-level code.")]
    TopLevelReturn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalleeKind {
    Function,
    Method,
}

impl fmt::Display for CalleeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalleeKind::Function => write!(f, "Function"),
            CalleeKind::Method => write!(f, "Method"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("{kind} at {position}")]
pub struct TypeValidationError {
    pub position: Position,
    pub kind: TypeValidationErrorKind,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TypeValidationErrorKind {
    #[error("Undefined identifier '{name}'")]
    UndefinedIdentifier { name: String },
    #[error("Attempting to call undefined function '{name}'")]
    UndefinedFunction { name: String },
    #[error("Invalid arguments to operator {operator} specified.")]
    InvalidOperands {
        operator: String,
        lhs: Type,
        rhs: Type,
    },
    #[error("'{operand}' is not a valid {operator} operand.")]
    InvalidLogicalOperand {
        operator: LogicalOperator,
        operand: Type,
    },
    #[error("'{condition}' is not a valid '{statement}' condition.")]
    InvalidCondition {
        statement: &'static str,
        condition: Type,
    },
    #[error("{callee} '{name}' has {expected} parameter(s) but was called with {found} argument(s)")]
    ArgumentCountMismatch {
        callee: CalleeKind,
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Cannot pass {argument} argument as parameter '{parameter}: {parameter_type}' to {function}()")]
    ArgumentTypeMismatch {
        argument: Type,
        parameter: String,
        parameter_type: Type,
        function: String,
    },
    #[error("Cannot assign {value} to {target} variable")]
    IncompatibleInitializer { value: Type, target: Type },
    #[error("Cannot assign '{value}' to '{target}' variable")]
    IncompatibleAssignment { value: Type, target: Type },
    #[error("Cannot assign null to an implicitly typed local variable")]
    NullToImplicitlyTyped,
    #[error("Type inference for variable '{name}' cannot be performed when initializer is not specified. Either provide an initializer, or specify the type explicitly.")]
    InferenceWithoutInitializer { name: String },
    #[error("Type not found: {name}")]
    TypeNotFound { name: String },
    #[error("Inferred typing is not yet supported for parameter '{parameter}' to function '{function}'")]
    UntypedParameter { parameter: String, function: String },
    #[error("void arrays are not supported")]
    VoidArray,
    #[error("Failed to locate symbol '{member}' in class {class}")]
    MemberNotFound { member: String, class: String },
    #[error("Enum member '{member}' not found in enum '{enum_name}'")]
    EnumMemberNotFound { member: String, enum_name: String },
    #[error("Enum member '{member}' initializer must be an integral constant expression")]
    EnumInitializerNotIntegral { member: String },
    #[error("incremented enumerator value {value} is not representable in the largest integer type")]
    EnumValueOverflow { value: i128 },
    #[error("Type '{name}' could not be found")]
    ClassNotFound { name: String },
    #[error("No constructor of class '{class}' accepts {found} argument(s) of the given types; constructors take {arities} parameter(s)")]
    NoMatchingConstructor {
        class: String,
        arities: String,
        found: usize,
    },
    #[error("All elements in a collection initializer must have the same type")]
    CollectionElementsMismatch,
    #[error("'null' reference cannot be indexed")]
    NullIndexed,
    #[error("Unable to index object of type '{indexee}': operation not supported")]
    IndexNotSupported { indexee: Type },
    #[error("Array of type '{array}' cannot be indexed by '{index}'")]
    ArrayIndexMismatch { array: Type, index: Type },
    #[error("'{indexee}' cannot be indexed by '{index}'")]
    IndexMismatch { indexee: Type, index: Type },
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("{kind} at {position}")]
pub struct ImmutabilityValidationError {
    pub position: Position,
    pub kind: ImmutabilityValidationErrorKind,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ImmutabilityValidationErrorKind {
    #[error("Field '{field}' cannot be assigned to; the field is immutable and has already been initialized.")]
    FieldAlreadyInitialized { field: String },
    #[error("Field '{field}' cannot be assigned to; the field is immutable and has already been assigned to.")]
    FieldAlreadyAssigned { field: String },
    #[error("{kind} '{name}' is immutable and cannot be modified.")]
    Immutable { kind: ObjectKind, name: String },
    #[error("Field '{field}' in class '{class}' was not initialized in field initializer or constructor.")]
    FieldNotInitialized { field: String, class: String },
    #[error("Field '{field}' in class '{class}' was not initialized in field initializer, and no constructors have been defined.")]
    FieldNotInitializedWithoutConstructor { field: String, class: String },
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("{kind} at {position}")]
pub struct CompilerWarning {
    pub position: Position,
    pub kind: WarningKind,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum WarningKind {
    #[error("Null parameter detected for '{parameter}'")]
    NullParameter { parameter: String },
    #[error("Initializing variable to null detected")]
    NullInitializer,
    #[error("Null assignment detected")]
    NullAssignment,
    #[error("Invalid combination of boolean operators: && and ||. To avoid ambiguity for the reader, grouping parentheses () must be used.")]
    AmbiguousBooleanOperators,
}

/// A broken assumption inside the analyzer. Aborts the pipeline instead of being reported
/// as a diagnostic.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Internal compiler error: {message}")]
pub struct InternalCompilerError {
    pub message: String,
}

impl InternalCompilerError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}
