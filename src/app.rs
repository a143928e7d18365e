//! The linear load, scan and report pipeline.

use std::path::{Path, PathBuf};

use colored::Colorize;
use snafu::{ResultExt, Snafu};

use crate::{
    aggregate::{self, Counts},
    cli::{FAILURE, LogFormat, Opts},
    csv_file::LoadError,
    internal_events::{StageFailed, error_stage, error_type},
    lookup_table::LookupTable,
    protocol_map::ProtocolMap,
    report, trace,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("reading lookup table: {source}"))]
    LookupTable { source: LoadError },

    #[snafu(display("reading protocol numbers file: {source}"))]
    ProtocolNumbers { source: LoadError },

    #[snafu(display("reading flow log file: {source}"))]
    FlowLog { source: aggregate::Error },

    #[snafu(display("writing output file: {source}"))]
    Output { source: report::Error },
}

impl Error {
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::LookupTable { .. } => error_stage::LOOKUP_TABLE,
            Self::ProtocolNumbers { .. } => error_stage::PROTOCOL_NUMBERS,
            Self::FlowLog { .. } => error_stage::FLOW_LOG,
            Self::Output { .. } => error_stage::REPORT,
        }
    }

    const fn error_type(&self) -> &'static str {
        match self {
            Self::Output { .. } => error_type::WRITER_FAILED,
            _ => error_type::READER_FAILED,
        }
    }
}

/// Input and output locations for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paths {
    pub flow_log: PathBuf,
    pub lookup_table: PathBuf,
    pub protocol_numbers: PathBuf,
    pub output: PathBuf,
}

impl From<&Opts> for Paths {
    fn from(opts: &Opts) -> Self {
        Self {
            flow_log: opts.flow_log.clone(),
            lookup_table: opts.lookup_table.clone(),
            protocol_numbers: opts.protocol_numbers.clone(),
            output: opts.output.clone(),
        }
    }
}

/// Runs every stage in order, stopping at the first failure. Nothing is
/// written unless all inputs were read successfully.
pub fn run(paths: &Paths) -> Result<Counts, Error> {
    let lookup = LookupTable::load(&paths.lookup_table).context(LookupTableSnafu)?;
    let protocols = ProtocolMap::load(&paths.protocol_numbers).context(ProtocolNumbersSnafu)?;
    let counts =
        aggregate::aggregate_file(&paths.flow_log, &protocols, &lookup).context(FlowLogSnafu)?;
    report::write_report_file(&paths.output, &counts).context(OutputSnafu)?;

    Ok(counts)
}

/// Parses arguments, sets up logging, runs the pipeline and reports the
/// outcome. Returns the process exit status.
pub fn run_from_args() -> exitcode::ExitCode {
    let opts = match Opts::get_matches() {
        Ok(opts) => opts,
        Err(code) => return code,
    };

    let color = opts.color.use_color();
    colored::control::set_override(color);
    trace::init(
        color,
        opts.log_format == LogFormat::Json,
        &trace::levels(opts.log_level()),
    );

    let paths = Paths::from(&opts);
    match run(&paths) {
        Ok(_) => {
            print_success(&paths.output);
            exitcode::OK
        }
        Err(error) => {
            emit!(StageFailed {
                stage: error.stage(),
                error_type: error.error_type(),
                error: &error,
            });
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{} {error}", "Error:".red());
            }
            FAILURE
        }
    }
}

fn print_success(output: &Path) {
    #[allow(clippy::print_stdout)]
    {
        println!("Output written to {}", output.display());
    }
}
