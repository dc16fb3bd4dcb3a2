//! Column and row range resolvers
//!
//! User-facing operations accept range endpoints in either order ("F:V" and
//! "V:F" select the same columns, matching spreadsheet UI selection), so the
//! resolvers swap reversed endpoints instead of rejecting them. Only an
//! endpoint that fails to decode is an error.

use crate::coordinate::column_name_to_number;
use crate::error::{Error, Result};
use crate::MAX_ROWS;

/// An inclusive span of 1-based column indices, normalized so `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRange {
    /// First column in the span
    pub start: u32,
    /// Last column in the span (inclusive)
    pub end: u32,
}

impl ColumnRange {
    /// Resolve two column-name endpoints, swapping if reversed.
    pub fn from_names(start: &str, end: &str) -> Result<Self> {
        let start = column_name_to_number(start)?;
        let end = column_name_to_number(end)?;
        Ok(Self::from_numbers(start, end))
    }

    /// Build a span from numeric endpoints, swapping if reversed.
    pub fn from_numbers(start: u32, end: u32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Parse a column range expression: a bare name ("F") or a pair ("F:V").
    ///
    /// Both endpoints must decode before the range is produced; a single bad
    /// endpoint fails the whole expression.
    pub fn parse(columns: &str) -> Result<Self> {
        match columns.split_once(':') {
            Some((start, end)) => Self::from_names(start, end),
            None => Self::from_names(columns, columns),
        }
    }

    /// Check whether a column index falls inside the span.
    pub fn contains(&self, col: u32) -> bool {
        col >= self.start && col <= self.end
    }

    /// Iterate over the 1-based column indices in the span.
    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// An inclusive span of 1-based row numbers, normalized so `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    /// First row in the span
    pub start: u32,
    /// Last row in the span (inclusive)
    pub end: u32,
}

impl RowRange {
    /// Resolve two row endpoints, swapping if reversed.
    ///
    /// Fails with [`Error::RowNumber`] when an endpoint is outside
    /// `1..=1048576`.
    pub fn new(start: u32, end: u32) -> Result<Self> {
        for row in [start, end] {
            if row < 1 || row > MAX_ROWS {
                return Err(Error::RowNumber(row));
            }
        }
        if start <= end {
            Ok(Self { start, end })
        } else {
            Ok(Self {
                start: end,
                end: start,
            })
        }
    }

    /// Check whether a row number falls inside the span.
    pub fn contains(&self, row: u32) -> bool {
        row >= self.start && row <= self.end
    }
}
