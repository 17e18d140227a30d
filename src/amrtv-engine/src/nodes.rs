// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::axis::{DateAxis, TrackAxis};
use crate::config::Config;
use crate::geometry::Point;
use crate::normalize::DatedSample;
use crate::style::{DEFAULT_NODE_COLOR, DEFAULT_SYMBOL, node_color, node_symbol};

/// Marker trace for the main figure, one entry per sample.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NodeTrace {
    pub ids: Vec<String>,
    pub x: Vec<usize>,
    pub y: Vec<usize>,
    pub text: Vec<String>,
    pub hovertext: Vec<String>,
    pub marker_color: Vec<String>,
    pub marker_symbol: Vec<String>,
    pub marker_opacity: Vec<f64>,
    pub textfont_color: Vec<String>,
}

impl NodeTrace {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn position(&self, i: usize) -> Point {
        Point::new(self.x[i] as f64, self.y[i] as f64)
    }

    /// Keep the markers whose entry in `keep` is true.
    pub fn retain_mask(&mut self, keep: &[bool]) {
        fn apply<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut flags = keep.iter();
            values.retain(|_| flags.next().copied().unwrap_or(true));
        }
        apply(&mut self.ids, keep);
        apply(&mut self.x, keep);
        apply(&mut self.y, keep);
        apply(&mut self.text, keep);
        apply(&mut self.hovertext, keep);
        apply(&mut self.marker_color, keep);
        apply(&mut self.marker_symbol, keep);
        apply(&mut self.marker_opacity, keep);
        apply(&mut self.textfont_color, keep);
    }
}

/// A row of the symbol legend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SymbolUse {
    pub symbol: String,
    /// Attribute values drawn with this symbol, in first-use order.
    pub values: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Nodes {
    pub trace: NodeTrace,
    /// Attribute value to CSS color, in first-seen order.
    pub color_dict: IndexMap<String, String>,
    pub symbols_used: Vec<SymbolUse>,
}

/// Build the node trace.  Every sample must have a position on both axes.
pub fn build_nodes(
    samples: &[DatedSample],
    x_axis: &DateAxis,
    y_axis: &TrackAxis,
    config: &Config,
) -> Nodes {
    let track = config.track_columns();
    let labels = config.label_columns();
    let has_selection = config.has_selection();

    let mut nodes = Nodes::default();
    let mut symbols: IndexSet<String> = IndexSet::new();

    for sample in samples {
        let (Some(x), Some(y)) = (
            x_axis.position(sample.date),
            y_axis.position(sample, &track),
        ) else {
            continue;
        };
        let trace = &mut nodes.trace;
        trace.ids.push(sample.id().to_owned());
        trace.x.push(x);
        trace.y.push(y);

        let label: Vec<&str> = labels.iter().filter_map(|c| sample.get(c)).collect();
        trace.text.push(label.join("<br>"));
        let hover: Vec<String> = sample
            .sample
            .iter()
            .map(|(column, value)| format!("{column}: {}", value.unwrap_or_default()))
            .collect();
        trace.hovertext.push(hover.join("<br>"));

        let color_value = config.node_color_attr.as_deref().and_then(|c| sample.get(c));
        let color = match color_value {
            Some(value) => {
                let next = nodes.color_dict.len();
                nodes
                    .color_dict
                    .entry(value.to_owned())
                    .or_insert_with(|| node_color(next).to_css())
                    .clone()
            }
            None => DEFAULT_NODE_COLOR.to_owned(),
        };
        trace.marker_color.push(color);

        let symbol_value = config.node_symbol_attr.as_deref().and_then(|c| sample.get(c));
        let symbol = match symbol_value {
            Some(value) => {
                let (i, new) = symbols.insert_full(value.to_owned());
                let symbol = node_symbol(i);
                if new {
                    match nodes.symbols_used.iter_mut().find(|u| u.symbol == symbol) {
                        Some(used) => used.values.push(value.to_owned()),
                        None => nodes.symbols_used.push(SymbolUse {
                            symbol: symbol.to_owned(),
                            values: vec![value.to_owned()],
                        }),
                    }
                }
                symbol
            }
            None => DEFAULT_SYMBOL,
        };
        trace.marker_symbol.push(symbol.to_owned());

        let selected = !has_selection || config.is_selected(sample.id());
        trace.marker_opacity.push(if selected {
            1.0
        } else {
            config.layout.unselected_opacity
        });
        trace
            .textfont_color
            .push(if selected { "black" } else { "grey" }.to_owned());
    }

    tracing::debug!(
        nodes = nodes.trace.len(),
        colors = nodes.color_dict.len(),
        symbols = nodes.symbols_used.len(),
        "built nodes"
    );
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Report;
    use crate::config::OneOrMany;
    use crate::normalize::normalize;
    use crate::table::SampleTable;

    fn build(config: &Config) -> Nodes {
        let table = SampleTable::from_rows(
            &["s", "loc", "d", "species", "st"],
            "s",
            &[
                vec!["A", "X", "2021-01-01", "E. coli", "131"],
                vec!["B", "Y", "2021-01-02", "K. pneumoniae", "258"],
                vec!["C", "X", "2021-01-02", "E. coli", ""],
            ],
        );
        let samples = normalize(&table, config, &mut Report::new()).unwrap();
        let x = DateAxis::build(&samples, "%Y-%m-%d");
        let y = TrackAxis::build(&samples, &config.track_columns());
        build_nodes(&samples, &x, &y, config)
    }

    #[test]
    fn test_positions_and_defaults() {
        let config = Config::new("s", &["loc"], "d");
        let nodes = build(&config);
        let trace = &nodes.trace;

        assert_eq!(trace.ids, vec!["A", "B", "C"]);
        assert_eq!(trace.x, vec![1, 2, 2]);
        assert_eq!(trace.y, vec![1, 2, 1]);
        assert_eq!(trace.marker_symbol, vec!["circle"; 3]);
        assert_eq!(trace.marker_color, vec!["lightgrey"; 3]);
        assert_eq!(trace.marker_opacity, vec![1.0; 3]);
        assert_eq!(trace.textfont_color, vec!["black"; 3]);
        assert_eq!(trace.text, vec![""; 3]);
        assert_eq!(
            trace.hovertext[2],
            "s: C<br>loc: X<br>d: 2021-01-02<br>species: E. coli<br>st: "
        );
        assert!(nodes.color_dict.is_empty());
        assert!(nodes.symbols_used.is_empty());
    }

    #[test]
    fn test_color_symbol_and_label() {
        let mut config = Config::new("s", &["loc"], "d");
        config.node_color_attr = Some("species".to_owned());
        config.node_symbol_attr = Some("st".to_owned());
        config.label_attr = Some(OneOrMany::Many(vec!["s".to_owned(), "st".to_owned()]));
        let nodes = build(&config);
        let trace = &nodes.trace;

        assert_eq!(
            trace.marker_color,
            vec!["rgb(141, 211, 199)", "rgb(255, 255, 179)", "rgb(141, 211, 199)"]
        );
        assert_eq!(
            nodes
                .color_dict
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>(),
            vec!["E. coli", "K. pneumoniae"]
        );
        assert_eq!(trace.marker_symbol, vec!["circle", "square", "circle"]);
        assert_eq!(nodes.symbols_used.len(), 2);
        assert_eq!(nodes.symbols_used[1].symbol, "square");
        assert_eq!(nodes.symbols_used[1].values, vec!["258"]);
        assert_eq!(trace.text, vec!["A<br>131", "B<br>258", "C"]);
    }

    #[test]
    fn test_selection_opacity() {
        let mut config = Config::new("s", &["loc"], "d");
        config
            .selected_points
            .insert("B".to_owned(), serde_json::Value::Null);
        let nodes = build(&config);
        assert_eq!(nodes.trace.marker_opacity, vec![0.2, 1.0, 0.2]);
        assert_eq!(nodes.trace.textfont_color, vec!["grey", "black", "grey"]);
    }

    #[test]
    fn test_retain_mask() {
        let config = Config::new("s", &["loc"], "d");
        let mut trace = build(&config).trace;
        trace.retain_mask(&[true, false, true]);
        assert_eq!(trace.ids, vec!["A", "C"]);
        assert_eq!(trace.x, vec![1, 2]);
        assert_eq!(trace.hovertext.len(), 2);
        assert_eq!(trace.textfont_color.len(), 2);
    }
}
