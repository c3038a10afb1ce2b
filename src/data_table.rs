// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Data table][1] support for step handlers.
//!
//! [1]: https://cucumber.io/docs/gherkin/reference#data-tables

use std::fmt;

use derive_more::with_trait::{Display, Error};
use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};

use crate::pickle::StepArgument;

/// Header-keyed row of a [`DataTable`], preserving the column order.
pub type Record = LinkedHashMap<String, String>;

/// Extracts [`Record`]s from the argument a step handler receives.
///
/// The first row provides the headers, every following row becomes a
/// [`Record`]. A cell without a header is keyed as `Column N` (1-based).
///
/// ```rust
/// # use cucumber_harness::{data_table::{self, DataTable}, pickle::StepArgument};
/// let arg = StepArgument::DataTable(DataTable::from(vec![
///     vec!["Name", "Age"],
///     vec!["Alice", "30"],
///     vec!["Bob", "25"],
/// ]));
///
/// let records = data_table::records(Some(&arg)).unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1]["Name"], "Bob");
/// ```
///
/// # Errors
///
/// If there is no argument, or it's not a [`DataTable`].
pub fn records(
    argument: Option<&StepArgument>,
) -> Result<Vec<Record>, DataTableError> {
    argument
        .and_then(StepArgument::data_table)
        .map(DataTable::records)
        .ok_or(DataTableError::Missing)
}

/// Error of extracting a [`DataTable`] from a step argument.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum DataTableError {
    /// Step has no data table attached.
    #[display("No data table argument provided")]
    Missing,
}

/// Data table of a step.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DataTable {
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Creates a new [`DataTable`] out of the given rows.
    #[must_use]
    pub const fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Returns all the rows, header included.
    #[must_use]
    pub fn raw(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the rows following the header.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// Returns the header row, if any.
    #[must_use]
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Converts the rows following the header into [`Record`]s.
    ///
    /// See [`records()`] for details.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        let Some((header, rows)) = self.rows.split_first() else {
            return Vec::new();
        };

        rows.iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        let key = header
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| format!("Column {}", i + 1));
                        (key, cell.clone())
                    })
                    .collect()
            })
            .collect()
    }

    /// Alias for [`DataTable::records()`].
    #[must_use]
    pub fn hashes(&self) -> Vec<Record> {
        self.records()
    }

    /// Converts a two-column table into a key-value [`Record`], with the
    /// first column being the keys.
    ///
    /// Returns [`None`] if any row isn't exactly 2 cells wide.
    #[must_use]
    pub fn rows_hash(&self) -> Option<Record> {
        self.rows
            .iter()
            .map(|row| match row.as_slice() {
                [k, v] => Some((k.clone(), v.clone())),
                _ => None,
            })
            .collect()
    }

    /// Returns this [`DataTable`] with rows and columns swapped.
    ///
    /// Rows wider than the first one are truncated.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let width = self.width();
        Self::new(
            (0..width)
                .map(|i| {
                    self.rows
                        .iter()
                        .filter_map(|row| row.get(i).cloned())
                        .collect()
                })
                .collect(),
        )
    }

    /// Returns only the columns with the given headers, in the given order.
    #[must_use]
    pub fn columns(&self, names: &[&str]) -> Self {
        let Some(header) = self.header() else {
            return Self::default();
        };
        let indices = names
            .iter()
            .filter_map(|name| header.iter().position(|h| h == name))
            .collect::<Vec<_>>();

        Self::new(
            self.rows
                .iter()
                .map(|row| {
                    indices.iter().filter_map(|&i| row.get(i).cloned()).collect()
                })
                .collect(),
        )
    }

    /// Indicates whether this [`DataTable`] has no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows, header included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns the width of the first row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

impl From<Vec<Vec<&str>>> for DataTable {
    fn from(rows: Vec<Vec<&str>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(str::to_owned).collect())
                .collect(),
        )
    }
}

impl From<Vec<Vec<String>>> for DataTable {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
    }
}

impl From<&gherkin::Table> for DataTable {
    fn from(table: &gherkin::Table) -> Self {
        Self::new(table.rows.clone())
    }
}

impl fmt::Display for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "| {} |", row.join(" | "))?;
        }
        Ok(())
    }
}
