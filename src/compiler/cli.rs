use clap::{App, Arg};
use io::Read;
use log::debug;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::iter::ExactSizeIterator;
use std::str::FromStr;

use super::CompilerError;
use crate::sem::{AnalysisError, Diagnostics, Session, Severity};
use crate::syntax::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn variants() -> impl Iterator<Item = ReportFormat> {
        vec![Self::Text, Self::Json].into_iter()
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::variants()
            .find(|x| x.to_string() == s)
            .ok_or_else(|| format!("Unknown format option: `{}`", s))
    }
}

#[derive(Debug)]
pub struct CheckOptions {
    format: ReportFormat,
    warnings_as_errors: bool,
    filepaths: Vec<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            warnings_as_errors: false,
            filepaths: vec![],
        }
    }
}

impl CheckOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }
}

/// The rendered report and whether the checked units may be executed.
#[derive(Debug)]
pub struct CheckOutcome {
    pub report: String,
    pub success: bool,
}

#[derive(Debug, PartialEq, Serialize)]
struct ReportEntry {
    source: String,
    severity: String,
    line: usize,
    character: usize,
    message: String,
}

impl ReportEntry {
    fn new(source: &str, severity: Severity, position: Position, message: String) -> Self {
        Self {
            source: source.to_string(),
            severity: severity.to_string(),
            line: position.line + 1,
            character: position.character + 1,
            message,
        }
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.source, self.line, self.character, self.severity, self.message
        )
    }
}

#[derive(Debug, Default)]
pub struct Command {}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(
        &self,
        args: impl ExactSizeIterator<Item = String>,
    ) -> Result<CheckOutcome, CompilerError> {
        let options = parse_options(args)?;

        let sources = if options.filepaths.is_empty() {
            vec![("<stdin>".to_string(), read_from_stdin()?)]
        } else {
            options
                .filepaths
                .iter()
                .map(|path| Ok((path.clone(), read_from_file(path)?)))
                .collect::<io::Result<Vec<_>>>()?
        };

        check_sources(&sources, &options)
    }
}

/// Analyzes `sources` as successive units of one session.
pub fn check_sources(
    sources: &[(String, String)],
    options: &CheckOptions,
) -> Result<CheckOutcome, CompilerError> {
    let mut session = Session::new();
    let mut entries = vec![];
    let mut failed = false;

    for (name, src) in sources {
        debug!("checking {}", name);

        match session.check_source(src) {
            Ok(analysis) => {
                failed |= is_failure(&analysis.diagnostics, options.warnings_as_errors);
                entries.extend(analysis.diagnostics.iter().map(|d| {
                    ReportEntry::new(name, d.severity(), d.position(), d.message())
                }));
            }
            Err(AnalysisError::ParseError(err)) => {
                failed = true;
                entries.push(ReportEntry::new(
                    name,
                    Severity::Error,
                    err.position,
                    err.kind.to_string(),
                ));
            }
            Err(AnalysisError::InternalCompilerError(err)) => return Err(err.into()),
        }
    }

    let report = match options.format {
        ReportFormat::Text => entries.iter().map(|e| format!("{}\n", e)).collect(),
        ReportFormat::Json => format!("{}\n", serde_json::to_string_pretty(&entries)?),
    };

    Ok(CheckOutcome {
        report,
        success: !failed,
    })
}

fn is_failure(diagnostics: &Diagnostics, warnings_as_errors: bool) -> bool {
    diagnostics.has_errors() || (warnings_as_errors && diagnostics.has_warnings())
}

fn parse_options(
    args: impl ExactSizeIterator<Item = String>,
) -> Result<CheckOptions, CompilerError> {
    let mut options = CheckOptions::new();

    let format_possible_values = ReportFormat::variants()
        .map(|f| f.to_string())
        .collect::<Vec<_>>();
    let format_possible_values: Vec<&str> =
        format_possible_values.iter().map(AsRef::as_ref).collect();

    let matches = App::new("perlang-check")
        .about("Reports semantic errors and warnings in Perlang programs")
        .arg(
            Arg::with_name("format")
                .long("format")
                .takes_value(true)
                .possible_values(&format_possible_values),
        )
        .arg(
            Arg::with_name("warnings-as-errors")
                .long("warnings-as-errors")
                .help("Fails when warnings are reported"),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the input files to check, in order")
                .required(false)
                .multiple(true)
                .index(1),
        )
        .get_matches_from(args);

    if let Some(format) = matches.value_of("format") {
        options.format = format.parse::<ReportFormat>()?;
    }

    options.warnings_as_errors = matches.is_present("warnings-as-errors");

    if let Some(filepaths) = matches.values_of("INPUT") {
        options.filepaths = filepaths.map(str::to_string).collect();
    }

    Ok(options)
}

fn read_from_stdin() -> Result<String, io::Error> {
    let mut content = String::new();

    io::stdin().read_to_string(&mut content)?;

    Ok(content)
}

fn read_from_file(filename: &str) -> io::Result<String> {
    fs::read_to_string(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sources(units: &[&str]) -> Vec<(String, String)> {
        units
            .iter()
            .enumerate()
            .map(|(i, src)| (format!("unit{}.perlang", i), src.to_string()))
            .collect()
    }

    #[test]
    fn text_report() {
        let outcome = check_sources(
            &sources(&["var a = 1;\nprint b;"]),
            &CheckOptions::new(),
        )
        .unwrap();

        assert!(!outcome.success);
        assert_eq!(
            outcome.report,
            "unit0.perlang:2:7: error: Undefined identifier 'b'\n"
        );
    }

    #[test]
    fn json_report() {
        let outcome = check_sources(
            &sources(&["var s: string = null;"]),
            &CheckOptions::new().format(ReportFormat::Json),
        )
        .unwrap();

        assert!(outcome.success);

        let report: serde_json::Value = serde_json::from_str(&outcome.report).unwrap();
        assert_eq!(report[0]["severity"], "warning");
        assert_eq!(report[0]["message"], "Initializing variable to null detected");
        assert_eq!(report[0]["line"], 1);
    }

    #[test]
    fn warnings_as_errors() {
        let units = sources(&["var b = true && false || true;"]);

        assert!(check_sources(&units, &CheckOptions::new()).unwrap().success);
        assert!(
            !check_sources(&units, &CheckOptions::new().warnings_as_errors(true))
                .unwrap()
                .success
        );
    }

    #[test]
    fn units_share_globals() {
        let outcome = check_sources(
            &sources(&["fun f(): int { return 1; }", "var x: int = f();"]),
            &CheckOptions::new(),
        )
        .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.report, "");
    }

    #[test]
    fn parse_errors_are_reported() {
        let outcome =
            check_sources(&sources(&["var = ;", "print 1;"]), &CheckOptions::new()).unwrap();

        assert!(!outcome.success);
        assert!(outcome.report.starts_with("unit0.perlang:1:"));
        assert_eq!(outcome.report.lines().count(), 1);
    }

    #[test]
    fn options() {
        let args = ["perlang-check", "--format", "json", "--warnings-as-errors", "a", "b"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        let options = parse_options(args.into_iter()).unwrap();

        assert_eq!(options.format, ReportFormat::Json);
        assert!(options.warnings_as_errors);
        assert_eq!(options.filepaths, vec!["a", "b"]);

        assert_matches!("xml".parse::<ReportFormat>(), Err(_));
    }
}
