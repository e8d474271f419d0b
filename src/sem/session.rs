//! Analysis of successive units against shared state, as an interactive host needs.
use super::analysis::CodeAnalysisValidator;
use super::immutability::ImmutabilityValidator;
use super::resolver::NameResolver;
use super::scope::GlobalScope;
use super::typing::TypeResolver;
use super::{
    BindingStore, DiagnosticSink, Diagnostics, InternalCompilerError, NativeRegistry,
    SemanticAnalyzer,
};
use crate::syntax::{ExprIdGenerator, ParseError, Parser, Program, Tokenizer};
use log::{debug, info};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    ParseError(#[from] ParseError),

    #[error(transparent)]
    InternalCompilerError(#[from] InternalCompilerError),
}

/// An analyzed unit with everything reported about it.
#[derive(Debug)]
pub struct Analysis {
    pub program: Program,
    pub diagnostics: Diagnostics,
}

impl Analysis {
    /// Whether the unit may be executed.
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Owns the state that outlives a single unit: recorded bindings, globals and expression
/// ids. Units must be analyzed one at a time.
#[derive(Debug)]
pub struct Session {
    store: BindingStore,
    globals: GlobalScope,
    natives: NativeRegistry,
    ids: ExprIdGenerator,
    units: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_natives(NativeRegistry::prelude())
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_natives(natives: NativeRegistry) -> Self {
        Self {
            store: BindingStore::new(),
            globals: GlobalScope::with_natives(&natives),
            natives,
            ids: ExprIdGenerator::new(),
            units: 0,
        }
    }

    pub fn bindings(&self) -> &BindingStore {
        &self.store
    }

    pub fn globals(&self) -> &GlobalScope {
        &self.globals
    }

    pub fn natives(&self) -> &NativeRegistry {
        &self.natives
    }

    /// The number of units analyzed so far.
    pub fn units(&self) -> usize {
        self.units
    }

    /// Parses a unit. Expression ids continue from the previous unit.
    pub fn parse(&mut self, src: &str) -> Result<Program, ParseError> {
        Parser::new(Tokenizer::from_string(src), &mut self.ids).parse()
    }

    /// Runs every pass over `program`, reporting to `sink`.
    pub fn analyze(
        &mut self,
        program: &mut Program,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), InternalCompilerError> {
        let unit = self.units;
        self.units += 1;
        debug!("unit {}: {} statements", unit, program.statements.len());

        NameResolver::new(&mut self.store, &mut self.globals, unit).analyze(program, sink)?;
        TypeResolver::new(&mut self.store, &self.globals).analyze(program, sink)?;
        ImmutabilityValidator::new(&self.store).analyze(program, sink)?;
        CodeAnalysisValidator::new().analyze(program, sink)?;

        Ok(())
    }

    pub fn check_source(&mut self, src: &str) -> Result<Analysis, AnalysisError> {
        let mut program = self.parse(src)?;
        let mut diagnostics = Diagnostics::new();

        self.analyze(&mut program, &mut diagnostics)?;

        info!(
            "unit {}: {} diagnostic(s)",
            self.units - 1,
            diagnostics.len()
        );
        Ok(Analysis {
            program,
            diagnostics,
        })
    }
}
