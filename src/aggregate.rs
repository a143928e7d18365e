//! Tag and port/protocol counting over a flow log.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use snafu::{ResultExt, Snafu};

use crate::{
    Port,
    flow_log::{FlowRecord, try_parse_line},
    internal_events::{FlowLogLineSkipped, FlowLogProcessed},
    lookup_table::LookupTable,
    protocol_map::ProtocolMap,
};

/// Tag counted for records with no lookup table entry.
pub const UNTAGGED: &str = "Untagged";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("could not open {}: {source}", path.display()))]
    Open { path: PathBuf, source: io::Error },

    #[snafu(display("could not read {} at line {line}: {source}", path.display()))]
    Read {
        path: PathBuf,
        line: u64,
        source: io::Error,
    },
}

/// Occurrence counts for one flow log.
///
/// Both maps are incremented exactly once per parsed record, so their totals
/// always agree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    // Insertion order is kept so tags that compare equal ignoring case are
    // reported in the order they were first seen.
    tags: IndexMap<String, u64>,
    port_protocols: BTreeMap<(Port, String), u64>,
}

impl Counts {
    pub fn record(&mut self, record: &FlowRecord<'_>, lookup: &LookupTable) {
        let protocol = record.protocol.as_ref();

        *self
            .port_protocols
            .entry((record.dstport, protocol.to_owned()))
            .or_default() += 1;

        let tag = lookup.get(protocol, record.dstport).unwrap_or(UNTAGGED);
        match self.tags.get_mut(tag) {
            Some(count) => *count += 1,
            None => {
                self.tags.insert(tag.to_owned(), 1);
            }
        }
    }

    /// Tag counts in first-seen order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, u64)> {
        self.tags.iter().map(|(tag, count)| (tag.as_str(), *count))
    }

    /// Port/protocol counts ordered by port, then protocol.
    pub fn port_protocols(&self) -> impl Iterator<Item = (Port, &str, u64)> {
        self.port_protocols
            .iter()
            .map(|((port, protocol), count)| (*port, protocol.as_str(), *count))
    }

    pub fn tag_count(&self, tag: &str) -> u64 {
        self.tags.get(tag).copied().unwrap_or_default()
    }

    pub fn port_protocol_count(&self, port: Port, protocol: &str) -> u64 {
        self.port_protocols
            .get(&(port, protocol.to_owned()))
            .copied()
            .unwrap_or_default()
    }

    pub fn tag_len(&self) -> usize {
        self.tags.len()
    }

    pub fn port_protocol_len(&self) -> usize {
        self.port_protocols.len()
    }

    /// Number of records counted.
    pub fn total(&self) -> u64 {
        self.tags.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Drives the line parser and owns the running counts.
pub struct Aggregator<'a> {
    lookup: &'a LookupTable,
    protocols: &'a ProtocolMap,
    counts: Counts,
    lines: u64,
    skipped: u64,
}

impl<'a> Aggregator<'a> {
    pub fn new(lookup: &'a LookupTable, protocols: &'a ProtocolMap) -> Self {
        Self {
            lookup,
            protocols,
            counts: Counts::default(),
            lines: 0,
            skipped: 0,
        }
    }

    /// Counts one raw line. Returns whether it held a record.
    pub fn process_line(&mut self, line: &str) -> bool {
        self.lines += 1;
        match try_parse_line(line, self.protocols) {
            Ok(record) => {
                self.counts.record(&record, self.lookup);
                true
            }
            Err(reason) => {
                self.skipped += 1;
                emit!(FlowLogLineSkipped {
                    line: self.lines,
                    reason,
                });
                false
            }
        }
    }

    /// Counts every line of `reader`. Lines end at `\n`, `\r\n` or a bare
    /// `\r`. On error, returns the failing line number alongside the I/O
    /// error.
    pub fn process_reader<R: BufRead>(
        &mut self,
        mut reader: R,
    ) -> Result<(), (u64, io::Error)> {
        let mut buffer = String::new();
        loop {
            buffer.clear();
            match reader.read_line(&mut buffer) {
                Ok(0) => return Ok(()),
                Ok(_) => {}
                Err(error) => return Err((self.lines + 1, error)),
            }

            let text = buffer.strip_suffix('\n').unwrap_or(&buffer);
            let text = text.strip_suffix('\r').unwrap_or(text);
            for line in text.split('\r') {
                self.process_line(line);
            }
        }
    }

    /// Lines seen so far, including skipped ones.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    pub fn finish(self) -> Counts {
        self.counts
    }
}

/// Counts every record in the flow log at `path`.
pub fn aggregate_file(
    path: impl AsRef<Path>,
    protocols: &ProtocolMap,
    lookup: &LookupTable,
) -> Result<Counts, Error> {
    let path = path.as_ref();
    let file = File::open(path).context(OpenSnafu { path })?;

    let mut aggregator = Aggregator::new(lookup, protocols);
    aggregator
        .process_reader(BufReader::new(file))
        .map_err(|(line, source)| Error::Read {
            path: path.to_path_buf(),
            line,
            source,
        })?;

    emit!(FlowLogProcessed {
        path,
        records: aggregator.counts().total(),
        skipped: aggregator.skipped(),
    });

    Ok(aggregator.finish())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use proptest::prelude::*;

    use super::*;
    use crate::ProtocolNumber;

    fn lookup() -> LookupTable {
        let mut lookup = LookupTable::new();
        lookup.insert("tcp", 25, "sv_P1");
        lookup.insert("tcp", 23, "sv_P2");
        lookup.insert("udp", 68, "sv_P2");
        lookup
    }

    fn protocols() -> ProtocolMap {
        let mut protocols = ProtocolMap::new();
        protocols.insert(6, "tcp");
        protocols.insert(17, "udp");
        protocols
    }

    fn line(dstport: Port, protocol: ProtocolNumber) -> String {
        format!(
            "2 123456789012 eni-0a1b2c3d 10.0.1.201 198.51.100.2 443 {dstport} {protocol} 25 20000 1620140761 1620140821 ACCEPT OK"
        )
    }

    #[test]
    fn counts_tagged_and_untagged_records() {
        let (lookup, protocols) = (lookup(), protocols());
        let mut aggregator = Aggregator::new(&lookup, &protocols);

        assert!(aggregator.process_line(&line(25, 6)));
        assert!(aggregator.process_line(&line(23, 6)));
        assert!(aggregator.process_line(&line(68, 17)));
        assert!(aggregator.process_line(&line(25, 17)));
        assert!(aggregator.process_line(&line(25, 6)));

        let counts = aggregator.finish();
        assert_eq!(counts.tag_count("sv_P1"), 2);
        assert_eq!(counts.tag_count("sv_P2"), 2);
        assert_eq!(counts.tag_count(UNTAGGED), 1);
        assert_eq!(counts.port_protocol_count(25, "tcp"), 2);
        assert_eq!(counts.port_protocol_count(25, "udp"), 1);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn unmapped_protocol_number_is_untagged() {
        let lookup = lookup();
        let protocols = ProtocolMap::new();
        let mut aggregator = Aggregator::new(&lookup, &protocols);

        aggregator.process_line(&line(25, 6));

        let counts = aggregator.finish();
        assert_eq!(counts.port_protocol_count(25, "6"), 1);
        assert_eq!(counts.tag_count(UNTAGGED), 1);
        assert_eq!(counts.tag_count("sv_P1"), 0);
    }

    #[test]
    fn counts_negative_and_wide_numbers() {
        let (lookup, protocols) = (lookup(), protocols());
        let mut aggregator = Aggregator::new(&lookup, &protocols);

        assert!(aggregator.process_line(&line(99_999_999_999, 6)));
        assert!(aggregator.process_line(&line(-25, 6)));
        assert!(aggregator.process_line(&line(25, -6)));

        let counts = aggregator.finish();
        assert_eq!(counts.port_protocol_count(99_999_999_999, "tcp"), 1);
        assert_eq!(counts.port_protocol_count(-25, "tcp"), 1);
        assert_eq!(counts.port_protocol_count(25, "-6"), 1);
        assert_eq!(counts.tag_count(UNTAGGED), 3);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn skipped_lines_are_not_counted() {
        let (lookup, protocols) = (lookup(), protocols());
        let mut aggregator = Aggregator::new(&lookup, &protocols);
        let input = format!(
            "# header\n\n{}\nnot a flow record\n{}\n",
            line(25, 6),
            line(23, 6).replace(" 23 6 ", " x 6 ")
        );

        aggregator.process_reader(input.as_bytes()).unwrap();

        assert_eq!(aggregator.lines(), 5);
        assert_eq!(aggregator.skipped(), 4);
        assert_eq!(aggregator.counts().total(), 1);
    }

    #[test]
    fn bare_carriage_returns_end_lines() {
        let (lookup, protocols) = (lookup(), protocols());
        let mut aggregator = Aggregator::new(&lookup, &protocols);
        let input = format!("{}\r{}\r\n{}\r", line(25, 6), line(23, 6), line(68, 17));

        aggregator.process_reader(input.as_bytes()).unwrap();

        assert_eq!(aggregator.lines(), 3);
        assert_eq!(aggregator.skipped(), 0);
        assert_eq!(aggregator.counts().tag_count("sv_P1"), 1);
        assert_eq!(aggregator.counts().tag_count("sv_P2"), 2);
    }

    #[test]
    fn tags_keep_first_seen_order() {
        let mut lookup = LookupTable::new();
        lookup.insert("tcp", 1, "beta");
        lookup.insert("tcp", 2, "Alpha");
        let protocols = protocols();
        let mut aggregator = Aggregator::new(&lookup, &protocols);

        aggregator.process_line(&line(1, 6));
        aggregator.process_line(&line(3, 6));
        aggregator.process_line(&line(2, 6));

        let tags = aggregator.counts().tags().map(|(tag, _)| tag).collect::<Vec<_>>();
        assert_eq!(tags, vec!["beta", UNTAGGED, "Alpha"]);
    }

    #[test]
    fn aggregates_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "# version account-id interface-id srcaddr dstaddr srcport dstport protocol ..."
        )
        .unwrap();
        writeln!(file, "{}", line(25, 6)).unwrap();
        writeln!(file, "{}", line(993, 6)).unwrap();

        let counts = aggregate_file(file.path(), &protocols(), &lookup()).unwrap();

        assert_eq!(counts.tag_count("sv_P1"), 1);
        assert_eq!(counts.tag_count(UNTAGGED), 1);
        assert_eq!(counts.port_protocol_count(993, "tcp"), 1);
    }

    #[test]
    fn empty_file_yields_empty_counts() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let counts = aggregate_file(file.path(), &protocols(), &lookup()).unwrap();

        assert!(counts.is_empty());
        assert_eq!(counts.port_protocol_len(), 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = aggregate_file(dir.path().join("flows.log"), &protocols(), &lookup())
            .unwrap_err();

        assert!(matches!(error, Error::Open { .. }));
    }

    #[test]
    fn invalid_utf8_is_a_read_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", line(25, 6)).unwrap();
        file.write_all(b"\xff\xfe\n").unwrap();

        let error = aggregate_file(file.path(), &protocols(), &lookup()).unwrap_err();

        assert!(matches!(error, Error::Read { line: 2, .. }));
    }

    proptest! {
        #[test]
        fn both_totals_match_parsed_records(
            flows in prop::collection::vec((-5..100i64, prop::sample::select(vec![1i64, 6, 17, 47, -6])), 0..64),
            noise in 0..8usize,
        ) {
            let (lookup, protocols) = (lookup(), protocols());
            let mut aggregator = Aggregator::new(&lookup, &protocols);
            for (dstport, protocol) in &flows {
                aggregator.process_line(&line(*dstport, *protocol));
            }
            for _ in 0..noise {
                aggregator.process_line("# comment");
            }

            let counts = aggregator.finish();
            let port_protocol_total = counts.port_protocols().map(|(_, _, count)| count).sum::<u64>();
            prop_assert_eq!(counts.total(), flows.len() as u64);
            prop_assert_eq!(port_protocol_total, flows.len() as u64);
        }
    }
}
