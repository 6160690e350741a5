// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeMap;

use tracing::warn;

use crate::escape::unescape;
use crate::error::{Result, SysError};

/// Shape of one command's `-Y` output
#[derive(Debug, Clone, Copy)]
pub struct HeaderFormat {
    pub command: &'static str,
    /// Format-version columns dropped from the front of every line
    pub leading: usize,
    /// Text printed instead of a table when there is nothing to list
    pub empty_sentinel: Option<&'static str>,
}

pub const SNAPSHOT_LISTING: HeaderFormat = HeaderFormat {
    command: "mmlssnapshot",
    leading: 6,
    empty_sentinel: Some("No snapshots in file system"),
};

pub const FILESYSTEM_LISTING: HeaderFormat = HeaderFormat {
    command: "mmlsfs",
    leading: 7,
    empty_sentinel: None,
};

pub const FILESET_LISTING: HeaderFormat = HeaderFormat {
    command: "mmlsfileset",
    leading: 7,
    empty_sentinel: None,
};

/// One data line keyed by header column, in header order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<(String, String)> {
        self.fields
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.strip_suffix(':').unwrap_or(line).split(':').collect()
}

fn is_empty_listing(format: &HeaderFormat, line: &str) -> bool {
    format
        .empty_sentinel
        .is_some_and(|sentinel| line.contains(sentinel))
}

/// Parse `-Y` output into one [`Record`] per data line.
pub fn parse_records(format: &HeaderFormat, output: &str) -> Result<Vec<Record>> {
    let mut lines = output
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty());

    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    if is_empty_listing(format, header) {
        return Ok(Vec::new());
    }

    let header_fields = split_fields(header);
    if header_fields.len() <= format.leading {
        return Err(SysError::malformed(
            format.command,
            header,
            format!("header has no columns past the first {}", format.leading),
        ));
    }
    let keys: Vec<String> = header_fields[format.leading..]
        .iter()
        .map(|key| key.to_string())
        .collect();

    let mut records = Vec::new();
    for line in lines {
        if is_empty_listing(format, line) {
            return Ok(Vec::new());
        }

        let fields = split_fields(line);
        if fields.get(2) == Some(&"HEADER") {
            continue;
        }

        if fields.len() != format.leading + keys.len() {
            return Err(SysError::malformed(
                format.command,
                line,
                format!(
                    "expected {} fields, found {}",
                    format.leading + keys.len(),
                    fields.len()
                ),
            ));
        }

        let fields = keys
            .iter()
            .cloned()
            .zip(fields[format.leading..].iter().map(|value| unescape(value)))
            .collect();
        records.push(Record { fields });
    }

    Ok(records)
}

/// How a recognized column is consumed
#[derive(Debug, Clone, Copy)]
pub(crate) enum Column<F> {
    /// Moved into a dedicated struct field
    Typed(F),
    /// Known, kept in the attribute map
    Attribute,
}

/// Lookup table from header names to record fields for one command
pub(crate) struct Columns<F: 'static> {
    pub command: &'static str,
    pub known: &'static [(&'static str, Column<F>)],
    pub known_prefixes: &'static [&'static str],
}

/// A record split into typed columns and leftover attributes
pub(crate) struct Bound<F> {
    typed: BTreeMap<F, String>,
    pub attributes: BTreeMap<String, String>,
}

impl<F: Ord> Bound<F> {
    pub fn take(&mut self, field: F) -> Option<String> {
        self.typed.remove(&field)
    }

    /// Like [`Bound::take`] but maps empty values to `None`.
    pub fn take_non_empty(&mut self, field: F) -> Option<String> {
        self.take(field).filter(|value| !value.is_empty())
    }
}

impl<F: Copy + Ord> Columns<F> {
    fn lookup(&self, name: &str) -> Option<Column<F>> {
        if let Some((_, column)) = self.known.iter().find(|(known, _)| *known == name) {
            return Some(*column);
        }
        self.known_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix))
            .then_some(Column::Attribute)
    }

    /// Log every column of the listing that has no entry in the table.
    pub fn warn_unrecognized(&self, records: &[Record]) {
        let Some(first) = records.first() else {
            return;
        };
        for (name, _) in first.fields() {
            if self.lookup(name).is_none() {
                warn!(command = self.command, column = %name, "unrecognized column");
            }
        }
    }

    pub fn bind(&self, record: Record) -> Bound<F> {
        let mut bound = Bound {
            typed: BTreeMap::new(),
            attributes: BTreeMap::new(),
        };
        for (name, value) in record.into_fields() {
            match self.lookup(&name) {
                Some(Column::Typed(field)) => {
                    bound.typed.insert(field, value);
                }
                Some(Column::Attribute) | None => {
                    bound.attributes.insert(name, value);
                }
            }
        }
        bound
    }
}
