//! Protocol number to protocol keyword translation.

use std::{borrow::Cow, collections::HashMap, fs::File, io, path::Path};

use csv::StringRecord;

use crate::{
    ProtocolNumber,
    csv_file::{CsvRows, LoadError},
    internal_events::{TableHeaderSkipped, TableLoaded, TableRowSkipped},
    parse_number,
};

const TABLE: &str = "protocol_numbers";

/// Lowercase protocol keywords keyed by protocol number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtocolMap {
    names: HashMap<ProtocolNumber, String>,
}

impl ProtocolMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the map from a CSV file of `decimal,keyword,...` rows.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_rows(CsvRows::<File>::from_path(path)?)
    }

    /// The first row is always treated as a header and discarded, even when
    /// it holds data.
    pub fn from_rows<R: io::Read>(mut rows: CsvRows<R>) -> Result<Self, LoadError> {
        let mut map = Self::new();
        let mut record = StringRecord::new();
        let mut skipped = 0;

        rows.read_first_row(&mut record)?;
        emit!(TableHeaderSkipped {
            table: TABLE,
            row: rows.row(),
        });

        while rows.read_row(&mut record)? {
            let reason = match (record.get(0), record.get(1)) {
                (Some(decimal), Some(keyword)) => match parse_number(decimal) {
                    Some(number) => {
                        map.insert(number, keyword);
                        continue;
                    }
                    None => "invalid_protocol_number",
                },
                _ => "too_few_fields",
            };

            skipped += 1;
            emit!(TableRowSkipped {
                table: TABLE,
                row: rows.row(),
                reason,
            });
        }

        emit!(TableLoaded {
            table: TABLE,
            path: rows.path(),
            entries: map.len(),
            skipped,
        });

        Ok(map)
    }

    /// Names protocol `number`, replacing any earlier name. The keyword is
    /// trimmed and lowercased.
    pub fn insert(&mut self, number: ProtocolNumber, keyword: &str) -> Option<String> {
        self.names.insert(number, keyword.trim().to_lowercase())
    }

    pub fn get(&self, number: ProtocolNumber) -> Option<&str> {
        self.names.get(&number).map(String::as_str)
    }

    /// Resolves a protocol number to its name, falling back to the decimal
    /// representation of unknown numbers.
    pub fn resolve(&self, number: ProtocolNumber) -> Cow<'_, str> {
        match self.get(number) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(number.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn map(input: &str) -> ProtocolMap {
        ProtocolMap::from_rows(CsvRows::from_reader(input.as_bytes(), "protocols.csv")).unwrap()
    }

    #[test]
    fn loads_iana_style_rows() {
        let map = map(indoc! {r#"
            Decimal,Keyword,Protocol,IPv6 Extension Header,Reference
            1,ICMP,Internet Control Message,,[RFC792]
            6,TCP,Transmission Control,,"[RFC9293]"
            17,UDP,User Datagram,,"[RFC768][Jon_Postel]"
        "#});

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(1), Some("icmp"));
        assert_eq!(map.get(6), Some("tcp"));
        assert_eq!(map.get(17), Some("udp"));
    }

    #[test]
    fn always_discards_first_row() {
        let map = map("6,tcp\n17,udp\n");

        assert_eq!(map.get(6), None);
        assert_eq!(map.get(17), Some("udp"));
    }

    #[test]
    fn blank_first_line_is_the_discarded_row() {
        let map = map("\n6,tcp\n17,udp\n");

        assert_eq!(map.get(6), Some("tcp"));
        assert_eq!(map.get(17), Some("udp"));
    }

    #[test]
    fn skips_malformed_rows() {
        let map = map(indoc! {"
            Decimal,Keyword
            146-252,,Unassigned
            6
            17, UDP
        "});

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(17), Some("udp"));
    }

    #[test]
    fn later_rows_override_earlier_ones() {
        let map = map("Decimal,Keyword\n6,tcp\n6,TCP-ALT\n");

        assert_eq!(map.get(6), Some("tcp-alt"));
    }

    #[test]
    fn resolves_unknown_numbers_to_decimal() {
        let mut map = ProtocolMap::new();
        map.insert(6, "TCP");

        assert_eq!(map.resolve(6), "tcp");
        assert_eq!(map.resolve(99), "99");
    }

    #[test]
    fn empty_file_is_an_error() {
        let error = ProtocolMap::from_rows(CsvRows::from_reader(&b""[..], "protocols.csv"))
            .unwrap_err();

        assert!(matches!(error, LoadError::Empty { .. }));
    }
}
