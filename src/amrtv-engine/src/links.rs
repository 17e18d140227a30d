// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Link groups: candidate edges between samples, filtering, spanning-forest
//! reduction and render geometry.
//!
//! Groups are processed in configuration order.  An edge whose chord would
//! be drawn over the chord of an edge from an earlier group is bent into a
//! quadratic arc; successive arcs over the same chord alternate sides and
//! move further out, so every group stays visible.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::common::{DiagnosticKind, Report};
use crate::config::{Config, LinkConfig};
use crate::expr::evaluate_weight;
use crate::geometry::{Chord, Point, QuadCurve, format_number};
use crate::graph::GraphBuilder;
use crate::normalize::DatedSample;
use crate::style::{Rgb, link_color, link_dash};

/// An edge supplied directly rather than derived from a shared value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplicitEdge {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// Where a group's candidate edges come from.
#[derive(Clone, Debug, PartialEq)]
pub enum Candidates {
    /// Every pair of samples sharing a non-null value of the link attribute.
    SharedValue,
    Explicit(Vec<ExplicitEdge>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkGroup {
    pub link: LinkConfig,
    pub candidates: Candidates,
}

impl LinkGroup {
    pub fn shared_value(link: LinkConfig) -> Self {
        LinkGroup {
            link,
            candidates: Candidates::SharedValue,
        }
    }

    pub fn attr(&self) -> &str {
        &self.link.attr
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Straight,
    Arc,
}

/// An emitted edge, oriented from the earlier to the later sample.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedEdge {
    pub attr: String,
    pub from: String,
    pub to: String,
    /// Indices into the sample list the links were built from.
    pub ends: (usize, usize),
    pub days: i64,
    pub weight: Option<f64>,
    pub kind: EdgeKind,
    pub control: Option<(f64, f64)>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Segments {
    pub x: Vec<Option<f64>>,
    pub y: Vec<Option<f64>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Arcs {
    pub x: Vec<[f64; 3]>,
    pub y: Vec<[f64; 3]>,
    pub path: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Arrowheads {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub ax: Vec<f64>,
    pub ay: Vec<f64>,
    pub arrowwidth: f64,
    pub arrowsize: f64,
}

impl Arrowheads {
    fn new(config: &Config) -> Self {
        Arrowheads {
            arrowwidth: config.layout.arrowhead_width,
            arrowsize: config.layout.arrowhead_size,
            ..Default::default()
        }
    }

    fn push(&mut self, tip: Point, base: Point) {
        self.x.push(tip.x);
        self.y.push(tip.y);
        self.ax.push(base.x);
        self.ay.push(base.y);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Labels {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub text: Vec<String>,
    pub textangle: Vec<f64>,
}

impl Labels {
    fn push(&mut self, at: Point, text: String, angle: f64) {
        self.x.push(at.x);
        self.y.push(at.y);
        self.text.push(text);
        self.textangle.push(angle);
    }
}

/// Range of evaluated weights, for the legend's weight slider.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeightSliderInfo {
    pub min: f64,
    pub max: f64,
    /// Currently selected `[low, high]` bounds.
    pub value: [f64; 2],
    /// Every distinct weight, ascending.
    pub marks: IndexMap<String, String>,
}

impl WeightSliderInfo {
    fn new(sorted: &[f64], link: &LinkConfig) -> Option<Self> {
        let (&min, &max) = (sorted.first()?, sorted.last()?);
        let marks = sorted
            .iter()
            .map(|&w| (format_number(w), format_number(w)))
            .collect();
        let low = link.weight_filters.lt.map_or(min, |lt| lt.clamp(min, max));
        let high = link.weight_filters.gt.map_or(max, |gt| gt.clamp(min, max));
        Some(WeightSliderInfo {
            min,
            max,
            value: [low, high.max(low)],
            marks,
        })
    }
}

/// One checkbox of a weight filter form.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeightOption {
    pub label: String,
    pub value: f64,
}

/// Checklist over the distinct weights of a group; a weight is checked
/// unless `neq` hides it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeightFilterForm {
    pub options: Vec<WeightOption>,
    pub value: Vec<f64>,
}

impl WeightFilterForm {
    fn new(distinct: &[f64], link: &LinkConfig) -> Self {
        WeightFilterForm {
            options: distinct
                .iter()
                .map(|&value| WeightOption {
                    label: format_number(value),
                    value,
                })
                .collect(),
            value: distinct
                .iter()
                .copied()
                .filter(|&w| !link.weight_filters.is_excluded(w))
                .collect(),
        }
    }
}

/// Finite weights, ascending, without repeats.
fn distinct_weights(weights: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = weights.iter().copied().filter(|w| w.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted
}

/// Render-ready output of every link group, keyed by attribute in
/// configuration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Links {
    pub links_dict: IndexMap<String, Segments>,
    pub arcs_dict: IndexMap<String, Arcs>,
    pub link_arrowheads_dict: IndexMap<String, Arrowheads>,
    pub arc_arrowheads_dict: IndexMap<String, Arrowheads>,
    pub link_labels_dict: IndexMap<String, Labels>,
    pub arc_labels_dict: IndexMap<String, Labels>,
    pub color_dict: IndexMap<String, Rgb>,
    pub dash_dict: IndexMap<String, String>,
    pub weight_slider_info: IndexMap<String, WeightSliderInfo>,
    pub weight_filter_form: IndexMap<String, WeightFilterForm>,
    pub edges: Vec<RenderedEdge>,
}

/// A candidate edge, oriented earlier -> later.
#[derive(Clone, Debug)]
struct Candidate {
    earlier: usize,
    later: usize,
    days: i64,
    text: String,
    weight: Option<f64>,
}

/// Sample indices sorted by (date, id), so that orientation and the day
/// span of any pair follow from their order.
fn sort_by_date(members: &mut [usize], samples: &[DatedSample]) {
    members.sort_by(|&a, &b| {
        (samples[a].date, samples[a].id()).cmp(&(samples[b].date, samples[b].id()))
    });
}

fn orient(a: usize, b: usize, samples: &[DatedSample]) -> (usize, usize) {
    let key = |i: usize| (samples[i].date, samples[i].id());
    if key(a) <= key(b) { (a, b) } else { (b, a) }
}

fn day_span(a: usize, b: usize, samples: &[DatedSample]) -> i64 {
    (samples[b].date - samples[a].date).num_days().abs()
}

fn is_excluded(sample: &DatedSample, link: &LinkConfig) -> bool {
    link.attr_filters
        .keys()
        .any(|column| sample.get(column).is_some_and(|v| link.is_ignored(column, v)))
}

/// Complete graphs over samples sharing a value of the link attribute.
fn shared_value_candidates(
    link: &LinkConfig,
    samples: &[DatedSample],
    max_days: Option<i64>,
) -> Vec<Candidate> {
    let mut groups: IndexMap<&str, SmallVec<[usize; 8]>> = IndexMap::new();
    for (i, sample) in samples.iter().enumerate() {
        let Some(value) = sample.get(&link.attr) else {
            continue;
        };
        if !is_excluded(sample, link) {
            groups.entry(value).or_default().push(i);
        }
    }

    let mut candidates = Vec::new();
    for (value, mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        sort_by_date(&mut members, samples);
        for (pos, &earlier) in members.iter().enumerate() {
            for &later in &members[pos + 1..] {
                let days = day_span(earlier, later, samples);
                if max_days.is_some_and(|max| days > max) {
                    // members are date-sorted, so every later pair is wider
                    break;
                }
                candidates.push(Candidate {
                    earlier,
                    later,
                    days,
                    text: value.to_owned(),
                    weight: None,
                });
            }
        }
    }
    candidates
}

fn explicit_candidates(
    edges: &[ExplicitEdge],
    samples: &[DatedSample],
    max_days: Option<i64>,
) -> Vec<Candidate> {
    let index: HashMap<&str, usize> = samples.iter().enumerate().map(|(i, s)| (s.id(), i)).collect();
    edges
        .iter()
        .filter_map(|edge| {
            let (&a, &b) = (index.get(edge.from.as_str())?, index.get(edge.to.as_str())?);
            if a == b {
                return None;
            }
            let (earlier, later) = orient(a, b, samples);
            let days = day_span(earlier, later, samples);
            if max_days.is_some_and(|max| days > max) {
                return None;
            }
            Some(Candidate {
                earlier,
                later,
                days,
                text: edge.label.clone(),
                weight: None,
            })
        })
        .collect()
}

/// Keep a minimum spanning forest of `candidates`, weighted by day span.
fn minimize_loops(candidates: Vec<Candidate>, samples: &[DatedSample]) -> Vec<Candidate> {
    let mut builder = GraphBuilder::new();
    let mut by_pair: HashMap<(String, String), usize> = HashMap::new();
    for (i, c) in candidates.iter().enumerate() {
        let (a, b) = (samples[c.earlier].id(), samples[c.later].id());
        let pair = if a <= b { (a, b) } else { (b, a) };
        by_pair.insert((pair.0.to_owned(), pair.1.to_owned()), i);
        builder.add_edge(a.to_owned(), b.to_owned(), c.days as f64);
    }

    let mut keep = vec![false; candidates.len()];
    for edge in builder.build().minimum_spanning_forest() {
        let pair = if edge.from <= edge.to {
            (edge.from, edge.to)
        } else {
            (edge.to, edge.from)
        };
        if let Some(&i) = by_pair.get(&pair) {
            keep[i] = true;
        }
    }
    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(c, k)| k.then_some(c))
        .collect()
}

/// Lays out link groups one after another, remembering emitted chords so
/// later groups can avoid drawing over them.
struct LinkLayout<'a> {
    config: &'a Config,
    samples: &'a [DatedSample],
    positions: &'a [Point],
    arc_step: f64,
    /// Chords emitted by groups already finished.
    earlier_chords: Vec<Chord>,
    /// Chords of every arc emitted so far.
    arc_chords: Vec<Chord>,
    out: Links,
}

impl<'a> LinkLayout<'a> {
    fn new(config: &'a Config, samples: &'a [DatedSample], positions: &'a [Point]) -> Self {
        let mean_magnification = (config.x_magnification + config.y_magnification) / 2.0;
        LinkLayout {
            config,
            samples,
            positions,
            arc_step: config.layout.arc_offset / mean_magnification,
            earlier_chords: Vec::new(),
            arc_chords: Vec::new(),
            out: Links::default(),
        }
    }

    fn candidates(&self, group: &LinkGroup) -> Vec<Candidate> {
        match &group.candidates {
            Candidates::SharedValue => {
                shared_value_candidates(&group.link, self.samples, self.config.max_day_range)
            }
            Candidates::Explicit(edges) => {
                explicit_candidates(edges, self.samples, self.config.max_day_range)
            }
        }
    }

    fn same_primary_track(&self, a: usize, b: usize) -> bool {
        let track = self.config.track_columns();
        let Some(primary) = track.first() else {
            return true;
        };
        self.samples[a].get(primary) == self.samples[b].get(primary)
    }

    /// Apply the y and weight filters; returns survivors and every weight
    /// that evaluated.
    fn filter(
        &self,
        link: &LinkConfig,
        candidates: Vec<Candidate>,
        report: &mut Report,
    ) -> (Vec<Candidate>, Vec<f64>) {
        let mut weights = Vec::new();
        let mut kept = Vec::with_capacity(candidates.len());
        for mut c in candidates {
            if !self.config.links_across_y && !self.same_primary_track(c.earlier, c.later) {
                continue;
            }
            if let Some(exp) = &link.weight_exp {
                let (earlier, later) = (&self.samples[c.earlier], &self.samples[c.later]);
                match evaluate_weight(exp, &earlier.sample, &later.sample) {
                    Ok(w) => {
                        weights.push(w);
                        if !link.weight_filters.keeps(w) {
                            continue;
                        }
                        c.weight = Some(w);
                        c.text = format_number(w);
                    }
                    Err(err) => {
                        report.push(
                            Some(later.sample.row),
                            Some(later.id()),
                            DiagnosticKind::WeightExpression,
                            format!(
                                "{} link {} -> {}: {err}",
                                link.attr,
                                earlier.id(),
                                later.id()
                            ),
                        );
                        continue;
                    }
                }
            }
            kept.push(c);
        }
        (kept, weights)
    }

    fn add_group(&mut self, index: usize, group: &LinkGroup, report: &mut Report) {
        let attr = group.attr();
        self.out.color_dict.insert(attr.to_owned(), link_color(index));
        self.out.dash_dict.insert(attr.to_owned(), link_dash(index).to_owned());

        let mut segments = Segments::default();
        let mut arcs = Arcs::default();
        let mut link_arrowheads = Arrowheads::new(self.config);
        let mut arc_arrowheads = Arrowheads::new(self.config);
        let mut link_labels = Labels::default();
        let mut arc_labels = Labels::default();

        if self.config.is_link_filtered(attr) {
            tracing::debug!(attr, "link group hidden");
        } else {
            let candidates = self.candidates(group);
            let candidate_count = candidates.len();
            let (mut edges, weights) = self.filter(&group.link, candidates, report);
            let distinct = distinct_weights(&weights);
            if group.link.weight_exp.is_some()
                && let Some(info) = WeightSliderInfo::new(&distinct, &group.link)
            {
                self.out.weight_slider_info.insert(attr.to_owned(), info);
                self.out
                    .weight_filter_form
                    .insert(attr.to_owned(), WeightFilterForm::new(&distinct, &group.link));
            }
            if group.link.minimize_loops {
                edges = minimize_loops(edges, self.samples);
            }

            let mut group_chords = Vec::with_capacity(edges.len());
            let mut arc_count = 0;
            for c in edges {
                let (p0, p1) = (self.positions[c.earlier], self.positions[c.later]);
                let chord = Chord::new(p0, p1);
                let eps = self.config.layout.collision_epsilon;
                let is_arc = self.earlier_chords.iter().any(|o| chord.collides(o, eps));

                let (kind, control) = if is_arc {
                    let k = 1 + self.arc_chords.iter().filter(|o| chord.collides(o, eps)).count();
                    let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
                    let offset = chord.unit_normal() * (sign * k as f64 * self.arc_step);
                    let curve = QuadCurve {
                        start: p0,
                        control: chord.midpoint() + offset,
                        end: p1,
                    };

                    arcs.x.push([p0.x, curve.control.x, p1.x]);
                    arcs.y.push([p0.y, curve.control.y, p1.y]);
                    arcs.path.push(curve.svg_path());
                    if group.link.show_arrowheads
                        && let Some(base) = self.arrow_base(&chord, curve.end_tangent())
                    {
                        arc_arrowheads.push(p1, base);
                    }
                    arc_labels.push(curve.midpoint(), c.text.clone(), 0.0);
                    self.arc_chords.push(chord);
                    arc_count += 1;
                    (EdgeKind::Arc, Some((curve.control.x, curve.control.y)))
                } else {
                    segments.x.extend([Some(p0.x), Some(p1.x), None]);
                    segments.y.extend([Some(p0.y), Some(p1.y), None]);
                    if group.link.show_arrowheads
                        && let Some(base) = self.arrow_base(&chord, chord.delta())
                    {
                        link_arrowheads.push(p1, base);
                    }
                    link_labels.push(chord.midpoint(), c.text.clone(), chord.text_angle());
                    (EdgeKind::Straight, None)
                };

                group_chords.push(chord);
                self.out.edges.push(RenderedEdge {
                    attr: attr.to_owned(),
                    from: self.samples[c.earlier].id().to_owned(),
                    to: self.samples[c.later].id().to_owned(),
                    ends: (c.earlier, c.later),
                    days: c.days,
                    weight: c.weight,
                    kind,
                    control,
                });
            }

            tracing::debug!(
                attr,
                candidates = candidate_count,
                edges = group_chords.len(),
                arcs = arc_count,
                "built link group"
            );
            self.earlier_chords.extend(group_chords);
        }

        self.out.links_dict.insert(attr.to_owned(), segments);
        self.out.arcs_dict.insert(attr.to_owned(), arcs);
        self.out.link_arrowheads_dict.insert(attr.to_owned(), link_arrowheads);
        self.out.arc_arrowheads_dict.insert(attr.to_owned(), arc_arrowheads);
        self.out.link_labels_dict.insert(attr.to_owned(), link_labels);
        self.out.arc_labels_dict.insert(attr.to_owned(), arc_labels);
    }

    /// Arrowhead tail: back from the chord's end along `direction`, by a
    /// fixed fraction of the chord length.
    fn arrow_base(&self, chord: &Chord, direction: Point) -> Option<Point> {
        let standoff = self.config.layout.arrowhead_standoff * chord.length();
        if standoff <= 0.0 {
            return None;
        }
        let unit = direction.unit()?;
        Some(chord.end - unit * standoff)
    }
}

/// Build every link group.  `positions[i]` is the rendered position of
/// `samples[i]`.
pub fn build_links(
    groups: &[LinkGroup],
    samples: &[DatedSample],
    positions: &[Point],
    config: &Config,
    report: &mut Report,
) -> Links {
    let mut layout = LinkLayout::new(config, samples, positions);
    for (index, group) in groups.iter().enumerate() {
        layout.add_group(index, group, report);
    }
    layout.out
}
