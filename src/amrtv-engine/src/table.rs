// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use crate::common::{DiagnosticKind, Report, Result};
use crate::config::Config;
use crate::expr::Fields;
use crate::input_err;

/// Ordered column names of a sample file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    names: Vec<String>,
    offsets: HashMap<String, usize>,
}

impl Header {
    pub fn new(names: Vec<String>) -> Self {
        let mut offsets = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            // the first of two identically named columns wins
            offsets.entry(name.clone()).or_insert(i);
        }
        Header { names, offsets }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn offset(&self, column: &str) -> Option<usize> {
        self.offsets.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One row of the sample file.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Value of the id column, possibly empty before normalization.
    pub id: String,
    /// 1-based data row this sample was read from.
    pub row: usize,
    header: Arc<Header>,
    values: Vec<Option<String>>,
}

impl Sample {
    pub fn get(&self, column: &str) -> Option<&str> {
        let i = self.header.offset(column)?;
        self.values.get(i).and_then(|v| v.as_deref())
    }

    /// `(column, value)` for every header column, in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.header
            .names()
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    /// Replace every value for which `is_null` holds with an absent one.
    pub fn clear_values<F>(&mut self, is_null: F)
    where
        F: Fn(&str) -> bool,
    {
        for value in self.values.iter_mut() {
            if value.as_deref().is_some_and(&is_null) {
                *value = None;
            }
        }
    }
}

impl Fields for Sample {
    fn field(&self, column: &str) -> Option<&str> {
        self.get(column)
    }
}

/// Insertion-ordered mapping from sample id to sample.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleTable {
    header: Arc<Header>,
    node_id: String,
    samples: Vec<Sample>,
    index: HashMap<String, usize>,
    rows_read: usize,
}

impl SampleTable {
    pub fn new(header: Vec<String>, node_id: &str) -> Self {
        SampleTable {
            header: Arc::new(Header::new(header)),
            node_id: node_id.to_owned(),
            samples: Vec::new(),
            index: HashMap::new(),
            rows_read: 0,
        }
    }

    /// Build a table from in-memory rows; a convenience for callers that
    /// already hold parsed data.  Duplicate ids are resolved like
    /// `read_table` does.
    pub fn from_rows<S: AsRef<str>>(header: &[S], node_id: &str, rows: &[Vec<S>]) -> Self {
        let mut table = SampleTable::new(
            header.iter().map(|s| s.as_ref().to_owned()).collect(),
            node_id,
        );
        for row in rows {
            table.push_row(row.iter().map(|s| Some(s.as_ref().to_owned())).collect());
        }
        table
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Append a row, padding short rows with absent values.  Returns the
    /// replaced row number when the id was already present; the new values
    /// take the position of the first occurrence.
    pub fn push_row(&mut self, mut values: Vec<Option<String>>) -> Option<usize> {
        values.resize(self.header.len(), None);
        self.rows_read += 1;
        let row = self.rows_read;
        let id = self
            .header
            .offset(&self.node_id)
            .and_then(|i| values[i].clone())
            .unwrap_or_default();
        let sample = Sample {
            id: id.clone(),
            row,
            header: self.header.clone(),
            values,
        };

        if id.is_empty() {
            self.samples.push(sample);
            return None;
        }
        match self.index.get(&id) {
            Some(&pos) => {
                let replaced = self.samples[pos].row;
                self.samples[pos] = sample;
                Some(replaced)
            }
            None => {
                self.index.insert(id, self.samples.len());
                self.samples.push(sample);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Sample> {
        self.index.get(id).map(|&i| &self.samples[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Read a delimited sample file with a header row.
pub fn read_table(reader: impl Read, config: &Config) -> Result<(SampleTable, Report)> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(config.delimiter_byte()?)
        .flexible(true)
        .from_reader(reader);

    let header: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_owned()).collect();
    if header.iter().all(String::is_empty) {
        return input_err!(MissingHeader, "sample file has no header row".to_owned());
    }
    if !header.contains(&config.node_id) {
        return input_err!(
            MissingColumn,
            format!("id column '{}' is not in the header", config.node_id)
        );
    }

    let id_offset = header
        .iter()
        .position(|h| h == &config.node_id)
        .unwrap_or_default();
    let mut table = SampleTable::new(header, &config.node_id);
    let mut report = Report::new();
    for result in rdr.records() {
        let record = result?;
        let values: Vec<Option<String>> = record
            .iter()
            .take(table.header().len())
            .map(|field| Some(field.to_owned()))
            .collect();
        let row = table.rows_read + 1;
        if let Some(replaced) = table.push_row(values) {
            let id = record
                .get(id_offset)
                .map(str::to_owned)
                .unwrap_or_default();
            report.push(
                Some(row),
                Some(&id),
                DiagnosticKind::DuplicateSample,
                format!("duplicate sample id '{id}' replaces row {replaced}"),
            );
        }
    }

    tracing::debug!(
        rows = table.rows_read,
        samples = table.len(),
        "read sample table"
    );
    Ok((table, report))
}

/// Open and read a sample file from disk.
#[cfg(feature = "file_io")]
pub fn open_table(path: impl AsRef<std::path::Path>, config: &Config) -> Result<(SampleTable, Report)> {
    let file = std::fs::File::open(path)?;
    read_table(std::io::BufReader::new(file), config)
}
