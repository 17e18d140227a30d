// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Date (x) and track (y) axes, facet lines and overview ticks.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::normalize::DatedSample;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Axis {
    pub range: [f64; 2],
    pub tickvals: Vec<usize>,
    pub ticktext: Vec<String>,
}

impl Axis {
    fn from_labels(ticktext: Vec<String>) -> Self {
        let n = ticktext.len();
        Axis {
            range: [0.0, (n + 1) as f64],
            tickvals: (1..=n).collect(),
            ticktext,
        }
    }

    pub fn len(&self) -> usize {
        self.tickvals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickvals.is_empty()
    }
}

/// Distinct sample dates, ascending, at positions 1..N.
#[derive(Clone, Debug, Default)]
pub struct DateAxis {
    pub dates: Vec<NaiveDate>,
    positions: HashMap<NaiveDate, usize>,
    pub axis: Axis,
}

impl DateAxis {
    pub fn build(samples: &[DatedSample], output_format: &str) -> Self {
        let dates: Vec<NaiveDate> = samples
            .iter()
            .map(|s| s.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let positions = dates.iter().enumerate().map(|(i, d)| (*d, i + 1)).collect();
        let ticktext = dates
            .iter()
            .map(|d| d.format(output_format).to_string())
            .collect();
        DateAxis {
            dates,
            positions,
            axis: Axis::from_labels(ticktext),
        }
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.positions.get(&date).copied()
    }
}

/// Distinct track tuples at positions 1..M.
///
/// Tuples are grouped by their primary (first) value, primaries in
/// first-seen order, and within a primary in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct TrackAxis {
    pub tracks: Vec<Vec<String>>,
    positions: HashMap<Vec<String>, usize>,
    pub axis: Axis,
}

impl TrackAxis {
    pub fn build(samples: &[DatedSample], columns: &[String]) -> Self {
        let mut primaries: IndexMap<String, Vec<Vec<String>>> = IndexMap::new();
        let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();

        for sample in samples {
            let Some(tuple) = track_tuple(sample, columns) else {
                continue;
            };
            if !seen.insert(tuple.clone()) {
                continue;
            }
            primaries.entry(tuple[0].clone()).or_default().push(tuple);
        }

        let tracks: Vec<Vec<String>> = primaries.into_values().flatten().collect();
        let positions = tracks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i + 1))
            .collect();
        let ticktext = tracks.iter().map(|t| t.join("<br>")).collect();
        TrackAxis {
            tracks,
            positions,
            axis: Axis::from_labels(ticktext),
        }
    }

    pub fn position(&self, sample: &DatedSample, columns: &[String]) -> Option<usize> {
        let tuple = track_tuple(sample, columns)?;
        self.positions.get(&tuple).copied()
    }

    /// Facet lines spanning `0..=x_count + 1`: first at primary changes,
    /// then at secondary changes inside one primary.
    pub fn facets(&self, x_count: usize) -> (Facets, Facets) {
        let mut primary = Facets::default();
        let mut secondary = Facets::default();
        let x_end = (x_count + 1) as f64;

        for (i, pair) in self.tracks.windows(2).enumerate() {
            let (above, below) = (&pair[0], &pair[1]);
            let y = (i + 1) as f64 + 0.5;
            if above[0] != below[0] {
                primary.push(0.0, x_end, y);
            } else if above.len() > 1 && below.len() > 1 && above[1] != below[1] {
                secondary.push(0.0, x_end, y);
            }
        }
        (primary, secondary)
    }
}

fn track_tuple(sample: &DatedSample, columns: &[String]) -> Option<Vec<String>> {
    if columns.is_empty() {
        return None;
    }
    columns
        .iter()
        .map(|c| sample.get(c).map(str::to_owned))
        .collect()
}

/// Horizontal line segments in the plotting library's `None`-separated form.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Facets {
    pub x: Vec<Option<f64>>,
    pub y: Vec<Option<f64>>,
}

impl Facets {
    fn push(&mut self, x0: f64, x1: f64, y: f64) {
        self.x.extend([Some(x0), Some(x1), None]);
        self.y.extend([Some(y), Some(y), None]);
    }

    pub fn len(&self) -> usize {
        self.x.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Ticks {
    pub tickvals: Vec<usize>,
    pub ticktext: Vec<String>,
}

/// Every `stride`-th tick of `axis`, thinned so that roughly
/// `max_ticks * magnification` remain.
pub fn zoomed_out_ticks(axis: &Axis, max_ticks: usize, magnification: f64) -> Ticks {
    let budget = (max_ticks as f64 * magnification).max(1.0);
    let stride = ((axis.len() as f64 / budget).ceil() as usize).max(1);
    Ticks {
        tickvals: axis.tickvals.iter().copied().step_by(stride).collect(),
        ticktext: axis.ticktext.iter().cloned().step_by(stride).collect(),
    }
}
