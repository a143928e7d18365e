//! Plain-text rendering of [`Counts`].

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use snafu::{ResultExt, Snafu};

use crate::{aggregate::Counts, internal_events::ReportWritten};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("could not create {}: {source}", path.display()))]
    Create { path: PathBuf, source: io::Error },

    #[snafu(display("could not write {}: {source}", path.display()))]
    Write { path: PathBuf, source: io::Error },
}

/// Writes the tag section followed by the port/protocol section.
///
/// Tags are ordered case-insensitively; tags that only differ in case keep
/// their first-seen order. Port/protocol rows are ordered by port and then by
/// protocol name.
pub fn write_report<W: Write>(writer: &mut W, counts: &Counts) -> io::Result<()> {
    let mut tags = counts.tags().collect::<Vec<_>>();
    tags.sort_by_cached_key(|(tag, _)| tag.to_lowercase());

    writeln!(writer, "Tag Counts:")?;
    writeln!(writer, "Tag, Count")?;
    for (tag, count) in tags {
        writeln!(writer, "{tag},{count}")?;
    }

    writeln!(writer)?;
    writeln!(writer, "Port/Protocol Combination Counts:")?;
    writeln!(writer, "Port,Protocol,Count")?;
    for (port, protocol, count) in counts.port_protocols() {
        writeln!(writer, "{port},{protocol},{count}")?;
    }

    Ok(())
}

/// Creates (or truncates) `path` and writes the report into it.
pub fn write_report_file(path: impl AsRef<Path>, counts: &Counts) -> Result<(), Error> {
    let path = path.as_ref();
    let file = File::create(path).context(CreateSnafu { path })?;

    let mut writer = BufWriter::new(file);
    write_report(&mut writer, counts).context(WriteSnafu { path })?;
    writer.flush().context(WriteSnafu { path })?;

    emit!(ReportWritten {
        path,
        tags: counts.tag_len(),
        combinations: counts.port_protocol_len(),
    });

    Ok(())
}
