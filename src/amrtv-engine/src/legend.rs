// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::Config;
use crate::links::{LinkGroup, Links};
use crate::nodes::Nodes;

/// The node-symbol legend figure, one row per symbol, top row first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SymbolLegend {
    pub y: Vec<usize>,
    pub marker_symbol: Vec<String>,
    pub text: Vec<String>,
    pub marker_opacity: Vec<f64>,
    pub textfont_color: Vec<String>,
}

/// Dimmed style for a legend row whose nodes are hidden.
fn row_style(filtered: bool) -> (f64, String) {
    if filtered {
        (0.5, "grey".to_owned())
    } else {
        (1.0, "black".to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinkLegendRow {
    pub attr: String,
    pub label: String,
    pub color: String,
    pub dash: String,
    pub is_filtered: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorLegendRow {
    pub value: String,
    pub color: String,
    pub marker_opacity: f64,
    pub textfont_color: String,
}

pub fn symbol_legend(nodes: &Nodes, config: &Config) -> SymbolLegend {
    let n = nodes.symbols_used.len();
    let (marker_opacity, textfont_color) = nodes
        .symbols_used
        .iter()
        .map(|u| row_style(config.is_symbol_filtered(&u.symbol)))
        .unzip();
    SymbolLegend {
        y: (1..=n).rev().collect(),
        marker_symbol: nodes.symbols_used.iter().map(|u| u.symbol.clone()).collect(),
        text: nodes.symbols_used.iter().map(|u| u.values.join(", ")).collect(),
        marker_opacity,
        textfont_color,
    }
}

pub fn link_legend(groups: &[LinkGroup], links: &Links, config: &Config) -> Vec<LinkLegendRow> {
    groups
        .iter()
        .map(|group| {
            let attr = group.attr();
            LinkLegendRow {
                attr: attr.to_owned(),
                label: group.link.display_label().to_owned(),
                color: links
                    .color_dict
                    .get(attr)
                    .map(|c| c.to_hex())
                    .unwrap_or_default(),
                dash: links.dash_dict.get(attr).cloned().unwrap_or_default(),
                is_filtered: config.is_link_filtered(attr),
            }
        })
        .collect()
}

/// Rows for the node-color legend; only values drawn on some node appear.
pub fn color_legend(
    color_dict: &IndexMap<String, String>,
    config: &Config,
) -> Vec<ColorLegendRow> {
    color_dict
        .iter()
        .map(|(value, color)| {
            let (marker_opacity, textfont_color) = row_style(config.is_color_filtered(color));
            ColorLegendRow {
                value: value.clone(),
                color: color.clone(),
                marker_opacity,
                textfont_color,
            }
        })
        .collect()
}
