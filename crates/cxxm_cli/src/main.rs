//! cxxm: parse C++ sources and print their declaration model.
//!
//! Usage:
//!   cxxm [options] file...

mod expand;
mod outline;

use clap::Parser as ClapParser;
use cxxm_core::intern::StringInterner;
use cxxm_core::LineMap;
use cxxm_diagnostics::{Diagnostic, DiagnosticCategory};
use cxxm_options::ParserOptions;
use cxxm_parser::ParseSession;
use miette::{IntoDiagnostic, WrapErr};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "cxxm", about = "cxxm - C++ declaration model builder", version)]
struct Cli {
    /// C++ source files to parse.
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Path to a cxxmodel.json; looked up from the current directory otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parse member function bodies where they appear.
    #[arg(long = "no-defer")]
    no_defer: bool,

    /// Print the model as JSON.
    #[arg(long)]
    json: bool,

    /// Print the names left in the global scope.
    #[arg(long)]
    symbols: bool,

    /// Log at debug level unless CXXM_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// What parsing one file produced, rendered for printing.
struct FileReport {
    output: String,
    diagnostics: Vec<String>,
    warnings: Vec<String>,
    error_count: usize,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let code = run(&cli)?;
    if code != 0 {
        process::exit(code);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CXXM_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> miette::Result<i32> {
    let start = Instant::now();
    let options = load_options(cli)?;
    let use_color = is_terminal();

    let reports: Vec<miette::Result<FileReport>> = cli
        .files
        .par_iter()
        .map(|path| parse_file(path, &options, cli, use_color))
        .collect();

    let mut errors = 0;
    for report in reports {
        let report = report?;
        print!("{}", report.output);
        for warning in &report.warnings {
            print_warning(warning, use_color);
        }
        for diagnostic in &report.diagnostics {
            eprintln!("{diagnostic}");
        }
        errors += report.error_count;
    }

    let elapsed = start.elapsed();
    if errors > 0 {
        let plural = if errors == 1 { "" } else { "s" };
        if use_color {
            eprintln!("\n{RED}Found {errors} error{plural}.{RESET}");
        } else {
            eprintln!("\nFound {errors} error{plural}.");
        }
        return Ok(2);
    }
    if use_color {
        eprintln!("{GRAY}Parsed {} file(s) in {:.2}s.{RESET}", cli.files.len(), elapsed.as_secs_f64());
    }
    Ok(0)
}

/// Options from `--config`, else from a `cxxmodel.json` found upwards of
/// the current directory, else the defaults; flags override the file.
fn load_options(cli: &Cli) -> miette::Result<ParserOptions> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => std::env::current_dir()
            .ok()
            .and_then(|dir| cxxm_options::find_config_file(&dir)),
    };
    let mut options = match path {
        Some(path) => cxxm_options::parse_options_file(&path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to load {}", path.display()))?,
        None => ParserOptions::default(),
    };
    if cli.no_defer {
        options.defer_member_bodies = false;
    }
    Ok(options)
}

fn parse_file(path: &Path, options: &ParserOptions, cli: &Cli, use_color: bool) -> miette::Result<FileReport> {
    let interner = StringInterner::new();
    let mut expanded = expand::expand(path, &options.include_paths, &interner).into_diagnostic()?;
    let main = path.display().to_string();

    let mut session = ParseSession::new(options.clone(), interner);
    session.parse_translation_unit(&main, std::mem::take(&mut expanded.stream));

    let mut output = if cli.json {
        let mut json = serde_json::to_string_pretty(session.store().files()).into_diagnostic()?;
        json.push('\n');
        json
    } else {
        session.store().files().iter().map(outline::render).collect::<String>()
    };
    if cli.symbols {
        output.push_str(&global_symbols(&session));
    }

    let stored = session.store().files().iter().flat_map(|f| f.diagnostics.diagnostics());
    let all: Vec<&Diagnostic> = expanded
        .scan_diagnostics
        .iter()
        .chain(stored)
        .filter(|d| cli.verbose || d.category != DiagnosticCategory::Message)
        .collect();
    let error_count = all.iter().filter(|d| d.is_error()).count();
    let diagnostics = all
        .into_iter()
        .map(|d| format_diagnostic(d, &expanded, use_color))
        .collect();
    Ok(FileReport {
        output,
        diagnostics,
        warnings: expanded.warnings,
        error_count,
    })
}

fn global_symbols(session: &ParseSession) -> String {
    let symtab = session.symtab();
    let mut names: Vec<&str> = symtab
        .scope(symtab.global())
        .entries()
        .map(|(name, _)| session.interner().resolve(name))
        .collect();
    names.sort_unstable();
    let mut out = String::from("symbols:\n");
    for name in names {
        out.push_str("  ");
        out.push_str(name);
        out.push('\n');
    }
    out
}

/// `file(line,col): error CXX{code}: message`, 1-based.
fn format_diagnostic(diagnostic: &Diagnostic, expanded: &expand::Expanded, use_color: bool) -> String {
    let file = diagnostic.file.as_deref().unwrap_or("<unknown>");
    let location = diagnostic
        .span
        .zip(expanded.text_of(file))
        .map(|(span, text)| {
            let lc = LineMap::new(text).line_and_column_of(span.start);
            format!("({},{})", lc.line + 1, lc.column + 1)
        })
        .unwrap_or_default();
    if use_color {
        let color = if diagnostic.is_error() { RED } else { YELLOW };
        format!(
            "{CYAN}{file}{location}{RESET}: {BOLD}{color}{}{RESET} {GRAY}CXX{}{RESET}: {}",
            diagnostic.category, diagnostic.code, diagnostic.message_text
        )
    } else {
        format!(
            "{file}{location}: {} CXX{}: {}",
            diagnostic.category, diagnostic.code, diagnostic.message_text
        )
    }
}

fn print_warning(message: &str, use_color: bool) {
    if use_color {
        eprintln!("{BOLD}{YELLOW}warning{RESET}: {message}");
    } else {
        eprintln!("warning: {message}");
    }
}

fn is_terminal() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::isatty(2) != 0 }
    }
    #[cfg(not(unix))]
    {
        true
    }
}
