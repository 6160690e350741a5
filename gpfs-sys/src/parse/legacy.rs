// SPDX-License-Identifier: GPL-3.0-only

//! Building blocks for the whitespace tables printed by `mmlscluster`,
//! `mmlsnsd`, `mmlsmgr` and `mmlspool`
//!
//! Each command describes its line shapes as an ordered `&[LineRule<T>]`;
//! the first rule whose matcher accepts a line decides how it is read.

use std::str::FromStr;

use crate::error::{Result, SysError};

/// Substring test selecting which rule applies to a line
#[derive(Debug, Clone, Copy)]
pub(crate) enum Matcher {
    Contains(&'static str),
    ContainsAll(&'static [&'static str]),
    Any,
}

impl Matcher {
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::Contains(needle) => line.contains(needle),
            Self::ContainsAll(needles) => needles.iter().all(|needle| line.contains(needle)),
            Self::Any => true,
        }
    }
}

/// One line shape: a matcher plus what to extract when it matches
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineRule<T: 'static> {
    pub matcher: Matcher,
    pub action: T,
}

pub(crate) fn first_match<'r, T>(rules: &'r [LineRule<T>], line: &str) -> Option<&'r T> {
    rules
        .iter()
        .find(|rule| rule.matcher.matches(line))
        .map(|rule| &rule.action)
}

/// Dash and equals rules separating sections of a listing
pub(crate) fn is_separator(line: &str) -> bool {
    line.contains("----------") || line.contains("==========")
}

/// A whitespace-split line that reports missing columns as malformed output
pub(crate) struct Tokens<'a> {
    command: &'static str,
    line: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> Tokens<'a> {
    pub fn new(command: &'static str, line: &'a str) -> Self {
        Self {
            command,
            line,
            tokens: line.split_whitespace().collect(),
        }
    }

    pub fn require(&self, count: usize) -> Result<()> {
        if self.tokens.len() < count {
            return Err(self.malformed(format!(
                "expected at least {count} columns, found {}",
                self.tokens.len()
            )));
        }
        Ok(())
    }

    pub fn get(&self, position: usize) -> Result<&'a str> {
        self.tokens
            .get(position)
            .copied()
            .ok_or_else(|| self.malformed(format!("missing column {position}")))
    }

    pub fn optional(&self, position: usize) -> Option<&'a str> {
        self.tokens.get(position).copied()
    }

    pub fn parse<T: FromStr>(&self, position: usize, what: &str) -> Result<T> {
        let raw = self.get(position)?;
        raw.parse()
            .map_err(|_| self.malformed(format!("{what} {raw:?} is not a number")))
    }

    pub fn malformed(&self, reason: String) -> SysError {
        SysError::malformed(self.command, self.line, reason)
    }
}

pub(crate) fn split_servers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|server| !server.is_empty())
        .map(ToString::to_string)
        .collect()
}
