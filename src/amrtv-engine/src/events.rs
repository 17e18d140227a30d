// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Transmission events derived by the isolate database.
//!
//! Each event pairs two (organism group, genotype set) clusters where the
//! earlier cluster's genotypes are a proper subset of the later one's.  The
//! clusters become samples and the events become explicit edges of a single
//! `transmission` link group.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::common::{DiagnosticKind, Report, Result};
use crate::config::{Config, LinkConfig};
use crate::links::{Candidates, ExplicitEdge, LinkGroup};
use crate::normalize::{normalize, parse_date};
use crate::table::SampleTable;
use crate::view::{Rendered, layout_view};

pub const TRANSMISSION_ATTR: &str = "transmission";

const ID_COLUMN: &str = "sample_id";
const GENOTYPES_COLUMN: &str = "amr_genotypes";
const ORGANISM_COLUMN: &str = "organism_group";
const DATE_COLUMN: &str = "min_date";

/// One row of the transmission-events query.  Deserializes from either a
/// JSON object or a six-element array in column order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionEvent {
    pub amr_genotypes_one: String,
    pub organism_group_one: String,
    pub min_date_one: String,
    pub amr_genotypes_two: String,
    pub organism_group_two: String,
    pub min_date_two: String,
}

/// One endpoint of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cluster<'a> {
    amr_genotypes: &'a str,
    organism_group: &'a str,
    min_date: &'a str,
}

impl<'a> Cluster<'a> {
    fn id(&self) -> String {
        format!(
            "{}|{}|{}",
            self.organism_group,
            self.min_date,
            genotype_set(self.amr_genotypes)
                .into_iter()
                .collect::<Vec<_>>()
                .join(";")
        )
    }
}

impl TransmissionEvent {
    pub fn new(row: [&str; 6]) -> Self {
        TransmissionEvent {
            amr_genotypes_one: row[0].to_owned(),
            organism_group_one: row[1].to_owned(),
            min_date_one: row[2].to_owned(),
            amr_genotypes_two: row[3].to_owned(),
            organism_group_two: row[4].to_owned(),
            min_date_two: row[5].to_owned(),
        }
    }

    fn one(&self) -> Cluster<'_> {
        Cluster {
            amr_genotypes: &self.amr_genotypes_one,
            organism_group: &self.organism_group_one,
            min_date: &self.min_date_one,
        }
    }

    fn two(&self) -> Cluster<'_> {
        Cluster {
            amr_genotypes: &self.amr_genotypes_two,
            organism_group: &self.organism_group_two,
            min_date: &self.min_date_two,
        }
    }

    /// Genotypes present in the later cluster only.
    pub fn gained_genotypes(&self) -> Vec<String> {
        let before = genotype_set(&self.amr_genotypes_one);
        genotype_set(&self.amr_genotypes_two)
            .into_iter()
            .filter(|g| !before.contains(g))
            .collect()
    }

    /// Configuration matching the columns of `events_to_network`.
    pub fn default_config() -> Config {
        let mut config = Config::new(ID_COLUMN, &[ORGANISM_COLUMN], DATE_COLUMN);
        config.node_color_attr = Some(ORGANISM_COLUMN.to_owned());
        config.attr_link_list = vec![LinkConfig::new(TRANSMISSION_ATTR)];
        config
    }
}

/// Parse a genotype set written as a database array (`{a,b}`) or as a
/// `;`-separated list.
pub fn genotype_set(raw: &str) -> BTreeSet<String> {
    let raw = raw.trim();
    let inner = raw
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .unwrap_or(raw);
    let sep = if raw.starts_with('{') { ',' } else { ';' };
    inner
        .split(sep)
        .map(|g| g.trim().trim_matches('"').trim())
        .filter(|g| !g.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Keep events whose organism-group pair is selected: `selected[one]`
/// must exist and contain `two`.
pub fn filter_transmission_events(
    selected: &BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    events: &[TransmissionEvent],
) -> Vec<TransmissionEvent> {
    events
        .iter()
        .filter(|e| {
            selected
                .get(&e.organism_group_one)
                .is_some_and(|inner| inner.contains_key(&e.organism_group_two))
        })
        .cloned()
        .collect()
}

/// Deduplicate event endpoints into samples and collect the event edges.
pub fn events_to_network(events: &[TransmissionEvent]) -> (SampleTable, Vec<ExplicitEdge>) {
    let mut table = SampleTable::new(
        [ID_COLUMN, GENOTYPES_COLUMN, ORGANISM_COLUMN, DATE_COLUMN]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ID_COLUMN,
    );
    let mut edges = Vec::with_capacity(events.len());
    let mut seen = BTreeSet::new();

    for event in events {
        let (one, two) = (event.one(), event.two());
        for cluster in [one, two] {
            let id = cluster.id();
            if seen.insert(id.clone()) {
                table.push_row(vec![
                    Some(id),
                    Some(cluster.amr_genotypes.to_owned()),
                    Some(cluster.organism_group.to_owned()),
                    Some(cluster.min_date.to_owned()),
                ]);
            }
        }
        edges.push(ExplicitEdge {
            from: one.id(),
            to: two.id(),
            label: event.gained_genotypes().join(";"),
        });
    }
    (table, edges)
}

/// Why an event cannot be drawn, if it cannot.
fn check_event(event: &TransmissionEvent, config: &Config) -> Option<String> {
    let date = |raw: &str| parse_date(raw, &config.date_format).ok();
    match (
        date(event.min_date_one.as_str()),
        date(event.min_date_two.as_str()),
    ) {
        (Some(one), Some(two)) if one >= two => {
            return Some(format!("{one} is not before {two}"));
        }
        (Some(_), Some(_)) => {}
        _ => {
            return Some(format!(
                "unparseable dates '{}' and '{}'",
                event.min_date_one, event.min_date_two
            ));
        }
    }

    let (one, two) = (
        genotype_set(&event.amr_genotypes_one),
        genotype_set(&event.amr_genotypes_two),
    );
    if !(one.is_subset(&two) && one.len() < two.len()) {
        return Some(format!(
            "'{}' is not a proper subset of '{}'",
            event.amr_genotypes_one, event.amr_genotypes_two
        ));
    }
    None
}

/// Lay out a transmission network with the same pipeline as sample files.
///
/// `config` must describe the columns produced by `events_to_network`;
/// `TransmissionEvent::default_config` is a suitable starting point.  The
/// `transmission` entry of `attr_link_list`, when present, supplies the
/// link options.
pub fn generate_event_view(events: &[TransmissionEvent], config: &Config) -> Result<Rendered> {
    config.check_options()?;

    let mut report = Report::new();
    let valid: Vec<TransmissionEvent> = events
        .iter()
        .enumerate()
        .filter_map(|(i, event)| match check_event(event, config) {
            Some(reason) => {
                report.push(
                    Some(i + 1),
                    None,
                    DiagnosticKind::BadTransmissionEvent,
                    reason,
                );
                None
            }
            None => Some(event.clone()),
        })
        .collect();

    let (table, edges) = events_to_network(&valid);
    let mut column_config = config.clone();
    column_config
        .attr_link_list
        .retain(|l| l.attr != TRANSMISSION_ATTR);
    column_config.check_columns(table.header().names())?;

    let link = config
        .attr_link_list
        .iter()
        .find(|l| l.attr == TRANSMISSION_ATTR)
        .cloned()
        .unwrap_or_else(|| LinkConfig::new(TRANSMISSION_ATTR));
    let group = LinkGroup {
        link,
        candidates: Candidates::Explicit(edges),
    };

    let samples = normalize(&table, config, &mut report)?;
    tracing::debug!(
        events = events.len(),
        valid = valid.len(),
        clusters = samples.len(),
        "built transmission network"
    );
    layout_view(&samples, &[group], config, report)
}
