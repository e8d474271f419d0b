use super::errors::{
    CompilerWarning, ImmutabilityValidationError, NameResolutionError, TypeValidationError,
};
use crate::syntax::Position;
use log::debug;
use std::fmt;

/// Receives the diagnostics of the semantic passes.
pub trait DiagnosticSink {
    fn name_resolution_error(&mut self, error: NameResolutionError);
    fn type_validation_error(&mut self, error: TypeValidationError);
    fn immutability_validation_error(&mut self, error: ImmutabilityValidationError);
    fn compiler_warning(&mut self, warning: CompilerWarning);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    NameResolution(NameResolutionError),
    TypeValidation(TypeValidationError),
    Immutability(ImmutabilityValidationError),
    Warning(CompilerWarning),
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::Warning(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Diagnostic::NameResolution(e) => e.position,
            Diagnostic::TypeValidation(e) => e.position,
            Diagnostic::Immutability(e) => e.position,
            Diagnostic::Warning(w) => w.position,
        }
    }

    /// The message without position.
    pub fn message(&self) -> String {
        match self {
            Diagnostic::NameResolution(e) => e.kind.to_string(),
            Diagnostic::TypeValidation(e) => e.kind.to_string(),
            Diagnostic::Immutability(e) => e.kind.to_string(),
            Diagnostic::Warning(w) => w.kind.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NameResolution(e) => write!(f, "{}", e),
            Diagnostic::TypeValidation(e) => write!(f, "{}", e),
            Diagnostic::Immutability(e) => write!(f, "{}", e),
            Diagnostic::Warning(w) => write!(f, "{}", w),
        }
    }
}

/// Collects diagnostics in the order they were reported.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CompilerWarning> {
        self.entries.iter().filter_map(|d| match d {
            Diagnostic::Warning(w) => Some(w),
            _ => None,
        })
    }

    pub fn name_resolution_errors(&self) -> impl Iterator<Item = &NameResolutionError> {
        self.entries.iter().filter_map(|d| match d {
            Diagnostic::NameResolution(e) => Some(e),
            _ => None,
        })
    }

    pub fn type_validation_errors(&self) -> impl Iterator<Item = &TypeValidationError> {
        self.entries.iter().filter_map(|d| match d {
            Diagnostic::TypeValidation(e) => Some(e),
            _ => None,
        })
    }

    pub fn immutability_validation_errors(
        &self,
    ) -> impl Iterator<Item = &ImmutabilityValidationError> {
        self.entries.iter().filter_map(|d| match d {
            Diagnostic::Immutability(e) => Some(e),
            _ => None,
        })
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// All messages without positions, errors and warnings alike.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(Diagnostic::message).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        debug!("{}: {}", diagnostic.severity(), diagnostic);
        self.entries.push(diagnostic);
    }
}

impl DiagnosticSink for Diagnostics {
    fn name_resolution_error(&mut self, error: NameResolutionError) {
        self.push(Diagnostic::NameResolution(error));
    }

    fn type_validation_error(&mut self, error: TypeValidationError) {
        self.push(Diagnostic::TypeValidation(error));
    }

    fn immutability_validation_error(&mut self, error: ImmutabilityValidationError) {
        self.push(Diagnostic::Immutability(error));
    }

    fn compiler_warning(&mut self, warning: CompilerWarning) {
        self.push(Diagnostic::Warning(warning));
    }
}
