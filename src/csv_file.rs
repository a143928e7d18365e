//! Row-oriented access to the comma-separated input tables.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use csv::StringRecord;
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum LoadError {
    #[snafu(display("could not open {}: {source}", path.display()))]
    Open { path: PathBuf, source: io::Error },

    #[snafu(display("could not read {}: {source}", path.display()))]
    Read { path: PathBuf, source: csv::Error },

    #[snafu(display("{} contains no rows", path.display()))]
    Empty { path: PathBuf },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Open { path, .. } | Self::Read { path, .. } | Self::Empty { path } => path,
        }
    }
}

/// A headerless, flexible CSV reader that numbers the rows it yields.
///
/// Quoting follows RFC 4180 and rows may have any number of fields. Blank
/// lines are not rows, except that a blank first line is read as an empty
/// first row so it can stand in for a header.
pub struct CsvRows<R> {
    path: PathBuf,
    reader: csv::Reader<BufReader<R>>,
    row: u64,
}

impl CsvRows<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).context(OpenSnafu { path })?;
        Ok(Self::from_reader(file, path))
    }
}

impl<R: io::Read> CsvRows<R> {
    /// Wraps an already open source. `path` is only used in diagnostics.
    pub fn from_reader(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: builder().from_reader(BufReader::new(reader)),
            row: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The 1-based number of the row last read, or 0 before the first read.
    pub fn row(&self) -> u64 {
        self.row
    }

    /// Reads the next row into `record`, returning `false` at end of input.
    pub fn read_row(&mut self, record: &mut StringRecord) -> Result<bool, LoadError> {
        let read = self
            .reader
            .read_record(record)
            .context(ReadSnafu { path: &self.path })?;
        if read {
            self.row += 1;
        }
        Ok(read)
    }

    /// Reads the first row, failing if the input has none. Must be called
    /// before any other read.
    pub fn read_first_row(&mut self, record: &mut StringRecord) -> Result<(), LoadError> {
        if self.starts_with_blank_line()? {
            // The csv reader skips the blank line itself on the next read.
            record.clear();
            self.row = 1;
            return Ok(());
        }

        if self.read_row(record)? {
            Ok(())
        } else {
            EmptySnafu { path: &self.path }.fail()
        }
    }

    // Nothing has been handed to the csv parser yet, so the underlying
    // buffer still starts at the first byte of input.
    fn starts_with_blank_line(&mut self) -> Result<bool, LoadError> {
        let buffer = self
            .reader
            .get_mut()
            .fill_buf()
            .map_err(csv::Error::from)
            .context(ReadSnafu { path: &self.path })?;
        Ok(matches!(buffer.first(), Some(b'\n' | b'\r')))
    }
}

fn builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true);
    builder
}
