use colored::Colorize;
use std::fmt;
use std::process;

pub const EXIT_ERROR: i32 = 1;

/// Unified error type for CLI operations.
pub enum CliError {
    /// Error from the pipeline layer.
    Pipeline(proxprep_pipeline::PrepError),
    /// Bad file path, unreadable config, parse failure.
    Input(String),
    /// Argument / usage errors.
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Pipeline(e) => write!(f, "{} {e}", "error:".red().bold()),
            CliError::Input(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Usage(msg) => write!(
                f,
                "{} {msg}\n  {} run 'proxprep --help' for usage",
                "error:".red().bold(),
                "help:".cyan().bold(),
            ),
        }
    }
}

impl From<proxprep_pipeline::PrepError> for CliError {
    fn from(e: proxprep_pipeline::PrepError) -> Self {
        CliError::Pipeline(e)
    }
}

pub type CliResult<T> = Result<T, CliError>;

/// Print the error to stderr and exit with a non-zero status.
pub fn exit_with_error(e: CliError) -> ! {
    eprintln!("{e}");
    process::exit(EXIT_ERROR);
}
