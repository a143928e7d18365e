//! Parsing of individual whitespace-delimited flow log lines.
//!
//! Only the destination port and protocol columns are interpreted; addresses,
//! byte counts, timestamps and the remaining fields are ignored.

use std::{borrow::Cow, fmt};

use crate::{Port, ProtocolNumber, parse_number, protocol_map::ProtocolMap};

/// Lines with fewer fields than this are not flow records.
pub const MIN_FIELDS: usize = 14;

const DSTPORT_FIELD: usize = 6;
const PROTOCOL_FIELD: usize = 7;

/// The part of a flow log line that takes part in classification.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlowRecord<'a> {
    pub dstport: Port,
    /// Lowercase protocol name.
    pub protocol: Cow<'a, str>,
}

/// Why a line did not produce a [`FlowRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    Comment,
    TooFewFields { count: usize },
    InvalidDstPort,
    InvalidProtocol,
}

impl SkipReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Comment => "comment",
            Self::TooFewFields { .. } => "too_few_fields",
            Self::InvalidDstPort => "invalid_dstport",
            Self::InvalidProtocol => "invalid_protocol",
        }
    }

    /// Whether the line looked like a record but could not be read as one.
    pub const fn is_malformed(&self) -> bool {
        !matches!(self, Self::Blank | Self::Comment)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewFields { count } => {
                write!(f, "expected at least {MIN_FIELDS} fields, found {count}")
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Parses one line, or explains why it holds no record.
pub fn try_parse_line<'a>(
    line: &str,
    protocols: &'a ProtocolMap,
) -> Result<FlowRecord<'a>, SkipReason> {
    let line = line.trim();
    if line.is_empty() {
        return Err(SkipReason::Blank);
    }
    if line.starts_with('#') {
        return Err(SkipReason::Comment);
    }

    let fields = line.split_whitespace().collect::<Vec<_>>();
    if fields.len() < MIN_FIELDS {
        return Err(SkipReason::TooFewFields {
            count: fields.len(),
        });
    }

    let dstport = parse_number::<Port>(fields[DSTPORT_FIELD]).ok_or(SkipReason::InvalidDstPort)?;
    let protocol = parse_number::<ProtocolNumber>(fields[PROTOCOL_FIELD])
        .ok_or(SkipReason::InvalidProtocol)?;

    Ok(FlowRecord {
        dstport,
        protocol: protocols.resolve(protocol),
    })
}

/// Parses one line, yielding `None` for blank, comment and malformed lines.
pub fn parse_line<'a>(line: &str, protocols: &'a ProtocolMap) -> Option<FlowRecord<'a>> {
    try_parse_line(line, protocols).ok()
}
