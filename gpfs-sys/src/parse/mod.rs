// SPDX-License-Identifier: GPL-3.0-only

//! Parsers for the two GPFS output styles
//!
//! - `header`: colon-delimited `-Y` output whose first line names the columns
//! - `legacy`: human-oriented whitespace tables, read through rule tables

pub mod header;
pub mod legacy;

pub use header::{FILESET_LISTING, FILESYSTEM_LISTING, HeaderFormat, Record, SNAPSHOT_LISTING, parse_records};
