//! Turns logical tables into header-plus-records sets.

use std::collections::BTreeMap;

use serde::ser::{Serialize, Serializer};

use crate::model::LogicalTable;

/// Name of the column that carries each table's heading.
pub const HEADING_COLUMN: &str = "heading";

/// Caller-supplied rewrite applied to every materialized table.
pub type TableTransform = Box<dyn Fn(TableRecords) -> TableRecords + Send + Sync>;

/// One logical table as named columns and string records.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TableRecords {
    pub key: String,
    pub heading: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableRecords {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// The record at `index` as `(column, value)` pairs.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<Vec<(&str, &str)>> {
        self.rows.get(index).map(|row| {
            self.headers
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect()
        })
    }

    /// Drops every column not named in `keep`, preserving column order.
    #[must_use]
    pub fn select_columns(mut self, keep: &[&str]) -> Self {
        let kept = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, header)| keep.contains(&header.as_str()))
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        self.headers = kept.iter().map(|index| self.headers[*index].clone()).collect();
        for row in &mut self.rows {
            *row = kept
                .iter()
                .map(|index| row.get(*index).cloned().unwrap_or_default())
                .collect();
        }
        self
    }
}

/// Materialized tables keyed by their stringified id, in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMap {
    tables: BTreeMap<u32, TableRecords>,
}

impl TableMap {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TableRecords> {
        key.parse().ok().and_then(|id: u32| self.tables.get(&id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableRecords> {
        self.tables.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.tables.values().map(|table| table.key.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a TableMap {
    type Item = &'a TableRecords;
    type IntoIter = std::collections::btree_map::Values<'a, u32, TableRecords>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.values()
    }
}

impl Serialize for TableMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.tables.values().map(|table| (&table.key, table)))
    }
}

/// Builds the records of one table: the first grid row names the columns and
/// the heading is written into every record.
#[must_use]
pub fn materialize_table(table: &LogicalTable) -> TableRecords {
    let mut headers = table.header().cloned().unwrap_or_default();
    let width = table
        .body()
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(headers.len());
    for index in headers.len()..width {
        headers.push(format!("col_{index}"));
    }

    let heading_index = headers
        .iter()
        .position(|header| header == HEADING_COLUMN)
        .unwrap_or_else(|| {
            headers.push(HEADING_COLUMN.to_string());
            headers.len() - 1
        });

    let rows = table
        .body()
        .iter()
        .map(|row| {
            let mut record = row.clone();
            record.resize(headers.len(), String::new());
            record[heading_index].clone_from(&table.heading);
            record
        })
        .collect();

    TableRecords {
        key: table.key(),
        heading: table.heading.clone(),
        headers,
        rows,
    }
}

/// Materializes every table, applying `transform` to each one.
#[must_use]
pub fn materialize(tables: &[LogicalTable], transform: Option<&TableTransform>) -> TableMap {
    let tables = tables
        .iter()
        .map(|table| {
            let records = materialize_table(table);
            let records = match transform {
                Some(transform) => transform(records),
                None => records,
            };
            (table.id, records)
        })
        .collect();
    TableMap { tables }
}
