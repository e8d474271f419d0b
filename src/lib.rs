#![deny(unused, nonstandard_style, rust_2018_idioms)]

pub mod compiler;
pub mod sem;
pub mod syntax;

mod util;

pub use sem::{Analysis, AnalysisError, Session};
