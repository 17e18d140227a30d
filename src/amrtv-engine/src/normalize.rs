// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Row-level cleanup between reading a sample file and laying it out.

use std::collections::HashSet;

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};

use crate::common::{DiagnosticKind, Error, ErrorCode, ErrorKind, Report, Result};
use crate::config::Config;
use crate::config_err;
use crate::table::{Sample, SampleTable};

/// A sample that survived normalization, with its parsed date.
#[derive(Clone, Debug, PartialEq)]
pub struct DatedSample {
    pub sample: Sample,
    pub date: NaiveDate,
}

impl DatedSample {
    pub fn id(&self) -> &str {
        &self.sample.id
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.sample.get(column)
    }
}

/// Fails on strftime strings chrono cannot interpret.
pub fn check_date_format(option: &str, format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return config_err!(
            BadDateFormat,
            format!("{option} '{format}' is not a valid date format")
        );
    }
    Ok(())
}

/// Parse `value` under `format`.  Formats without a day of the month (such
/// as `%B %Y`) resolve to the first of the month, and year-only formats to
/// the first of January.
pub fn parse_date(value: &str, format: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let err = match NaiveDate::parse_from_str(value, format) {
        Ok(date) => return Ok(date),
        Err(err) => err,
    };
    for (value_suffix, format_suffix) in [(" 1", " %d"), (" 1 1", " %m %d")] {
        let (padded, padded_format) = (
            format!("{value}{value_suffix}"),
            format!("{format}{format_suffix}"),
        );
        if let Ok(date) = NaiveDate::parse_from_str(&padded, &padded_format) {
            return Ok(date);
        }
    }
    Err(Error::new(
        ErrorKind::DateParse,
        ErrorCode::UnparseableDate,
        Some(format!("'{value}' does not match '{format}': {err}")),
    ))
}

/// The inclusive date window configured by `date_range`, if any.
pub fn date_window(config: &Config) -> Result<Option<(NaiveDate, NaiveDate)>> {
    let Some((start, end)) = &config.date_range else {
        return Ok(None);
    };
    let parse = |value: &str| {
        parse_date(value, &config.date_format).map_err(|err| {
            Error::new(
                ErrorKind::Config,
                ErrorCode::BadDateRange,
                err.get_details(),
            )
        })
    };
    let (start, end) = (parse(start)?, parse(end)?);
    if start > end {
        return config_err!(
            BadDateRange,
            format!("date_range starts at {start}, after its end {end}")
        );
    }
    Ok(Some((start, end)))
}

/// Apply null substitution, drop unusable rows and parse dates.
///
/// Dropped rows are recorded in `report`; the survivors keep table order.
pub fn normalize(table: &SampleTable, config: &Config, report: &mut Report) -> Result<Vec<DatedSample>> {
    check_date_format("date_format", &config.date_format)?;
    let window = date_window(config)?;
    let null_vals: HashSet<&str> = config.null_vals.iter().map(String::as_str).collect();
    let is_null = |v: &str| null_vals.contains(v) || (config.empty_strings_are_null && v.is_empty());
    let track = config.track_columns();

    let mut out = Vec::with_capacity(table.len());
    let mut out_of_range = 0;
    for sample in table.iter() {
        let mut sample = sample.clone();
        sample.clear_values(is_null);

        let id = config_id(&sample, config);
        let Some(id) = id else {
            report.push(
                Some(sample.row),
                None,
                DiagnosticKind::MissingSampleId,
                format!("row {} has no '{}'", sample.row, config.node_id),
            );
            continue;
        };
        sample.id = id.clone();

        let Some(raw_date) = sample.get(&config.date_attr) else {
            report.push(
                Some(sample.row),
                Some(&id),
                DiagnosticKind::MissingDate,
                format!("no value for '{}'", config.date_attr),
            );
            continue;
        };
        let date = match parse_date(raw_date, &config.date_format) {
            Ok(date) => date,
            Err(err) => {
                report.push(
                    Some(sample.row),
                    Some(&id),
                    DiagnosticKind::DateParse,
                    err.get_details().unwrap_or_default(),
                );
                continue;
            }
        };

        if let Some(column) = track.iter().find(|c| sample.get(c).is_none()) {
            report.push(
                Some(sample.row),
                Some(&id),
                DiagnosticKind::MissingTrack,
                format!("no value for track column '{column}'"),
            );
            continue;
        }

        if let Some((start, end)) = window
            && (date < start || date > end)
        {
            out_of_range += 1;
            continue;
        }

        out.push(DatedSample { sample, date });
    }

    tracing::debug!(
        kept = out.len(),
        dropped = table.len() - out.len(),
        out_of_range,
        "normalized samples"
    );
    Ok(out)
}

fn config_id(sample: &Sample, config: &Config) -> Option<String> {
    sample
        .get(&config.node_id)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}
