//! Delimited-text tokenising shared by the readers.

use std::path::Path;

use crate::error::ReadError;

/// One non-blank line split into fields.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Row<'a> {
    /// 1-based line number in the source text.
    pub line: usize,
    pub fields: Vec<&'a str>,
}

impl Row<'_> {
    /// Fail with `FieldCount` unless the row has exactly `expected` fields.
    pub fn expect_fields(&self, expected: usize) -> Result<(), ReadError> {
        if self.fields.len() == expected {
            Ok(())
        } else {
            Err(ReadError::FieldCount {
                line: self.line,
                expected,
                got: self.fields.len(),
            })
        }
    }

    /// Field `index` as a finite number.
    pub fn number(&self, index: usize) -> Result<f64, ReadError> {
        parse_finite(self.fields[index], self.line)
    }

    /// Every field as a finite number.
    pub fn numbers(&self) -> Result<Vec<f64>, ReadError> {
        self.fields
            .iter()
            .map(|token| parse_finite(token, self.line))
            .collect()
    }
}

/// Split `content` into rows. Fields are separated by commas and/or
/// whitespace; empty fields and blank lines are dropped.
pub(crate) fn rows(content: &str) -> Vec<Row<'_>> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let fields: Vec<&str> = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|field| !field.is_empty())
                .collect();
            (!fields.is_empty()).then_some(Row { line: i + 1, fields })
        })
        .collect()
}

/// Rows of `content`, failing with `Empty` if there are none.
pub(crate) fn non_empty_rows(content: &str) -> Result<Vec<Row<'_>>, ReadError> {
    let rows = rows(content);
    if rows.is_empty() {
        return Err(ReadError::Empty);
    }
    Ok(rows)
}

fn parse_finite(token: &str, line: usize) -> Result<f64, ReadError> {
    let value: f64 = token.parse().map_err(|_| ReadError::InvalidNumber {
        line,
        token: token.into(),
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ReadError::NonFiniteValue { line })
    }
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, ReadError> {
    std::fs::read_to_string(path).map_err(|e| ReadError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
