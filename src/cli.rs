use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};

/// Exit status for usage errors and failed runs.
pub const FAILURE: exitcode::ExitCode = 1;

#[derive(Parser, Debug)]
#[command(
    name = "flowtag",
    rename_all = "kebab-case",
    version = crate::get_version(),
    about = "Tag flow log records by destination port and protocol and count them"
)]
pub struct Opts {
    /// Flow log to classify, one whitespace-delimited record per line.
    pub flow_log: PathBuf,

    /// CSV lookup table of `dstport,protocol,tag` rows. The header row is optional.
    pub lookup_table: PathBuf,

    /// CSV protocol numbers file of `decimal,keyword,...` rows. The first row is
    /// always treated as a header.
    pub protocol_numbers: PathBuf,

    /// Report file to create or overwrite.
    pub output: PathBuf,

    /// Enable more detailed internal logging. Repeat to increase level. Overridden by `--quiet`.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Reduce detail of internal logging. Repeat to reduce further. Overrides `--verbose`.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Set the logging format
    #[arg(long, default_value = "text", env = "FLOWTAG_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Control when ANSI terminal formatting is used.
    ///
    /// By default `flowtag` will try and detect if `stderr` is a terminal, if it is
    /// ANSI will be enabled. Otherwise it will be disabled. By providing this flag with
    /// the `--color always` option will always enable ANSI terminal formatting. `--color never`
    /// will disable all ANSI terminal formatting. `--color auto` will attempt
    /// to detect it automatically.
    #[arg(long, default_value = "auto", env = "FLOWTAG_COLOR")]
    pub color: Color,
}

impl Opts {
    /// Parses the process arguments.
    ///
    /// Help and version requests yield `Err(exitcode::OK)` after printing;
    /// any other argument error prints usage and yields `Err(FAILURE)`.
    pub fn get_matches() -> Result<Self, exitcode::ExitCode> {
        Self::from_args(std::env::args_os())
    }

    pub fn from_args<I, T>(args: I) -> Result<Self, exitcode::ExitCode>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|error| {
            // Printing can only fail if stdout/stderr are gone.
            _ = error.print();
            match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exitcode::OK,
                _ => FAILURE,
            }
        })
    }

    pub const fn log_level(&self) -> &'static str {
        match self.quiet {
            0 => match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                3..=255 => "trace",
            },
            1 => "error",
            2..=255 => "off",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Color {
    Auto,
    Always,
    Never,
}

impl Color {
    pub fn use_color(self) -> bool {
        match self {
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
