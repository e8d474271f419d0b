//! Static semantic analysis of parsed programs.
//!
//! The passes run in order over one unit at a time, sharing a [`BindingStore`] and a
//! [`GlobalScope`]:
//!
//! 1. [`NameResolver`] binds every name reference to a local declaration, a global, or a
//!    candidate to be settled later.
//! 2. [`TypeResolver`] computes and checks types, settling candidates against globals.
//! 3. [`ImmutabilityValidator`] checks assignments against immutability.
//! 4. [`CodeAnalysisValidator`] warns about ambiguous code.
//!
//! Problems are reported to a [`DiagnosticSink`] and analysis carries on. Only a broken
//! internal assumption stops a pass, as an [`InternalCompilerError`].
mod analysis;
mod binding;
mod coercion;
mod diagnostics;
mod enums;
pub mod errors;
mod immutability;
mod native;
mod operators;
mod resolver;
mod scope;
mod session;
mod store;
mod types;
mod typing;

pub use analysis::CodeAnalysisValidator;
pub use binding::{
    Binding, BindingKind, ClassInfo, EnumInfo, FieldInfo, FunctionSignature, ObjectKind,
    ParameterInfo,
};
pub use coercion::{can_be_coerced_into, LiteralValue};
pub use diagnostics::{Diagnostic, DiagnosticSink, Diagnostics, Severity};
pub use errors::InternalCompilerError;
pub use immutability::ImmutabilityValidator;
pub use native::{NativeClass, NativeMethod, NativeObject, NativeRegistry};
pub use resolver::NameResolver;
pub use scope::{GlobalScope, GlobalSnapshot};
pub use session::{Analysis, AnalysisError, Session};
pub use store::BindingStore;
pub use types::{Type, TypeReference};
pub use typing::TypeResolver;

use crate::syntax::Program;

/// A pass over a whole unit.
pub trait SemanticAnalyzer {
    fn analyze(
        &mut self,
        program: &mut Program,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError>;
}
