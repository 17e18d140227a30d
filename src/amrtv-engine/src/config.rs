// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! User configuration for one engine call.
//!
//! A config is normally read from the JSON file produced by the front-end's
//! "create config" form.  Selection state and zoom factors are merged in by
//! the caller on every interaction; the engine never remembers them.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::config_err;

/// Geometric constants for the main figure.
///
/// All distances are in axis units, where neighboring dates and neighboring
/// tracks are exactly 1.0 apart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Opacity of nodes that are not selected while a selection exists.
    pub unselected_opacity: f64,
    /// Perpendicular offset of the first arc at magnification 1.
    pub arc_offset: f64,
    /// Tolerance used when testing chords for collisions.
    pub collision_epsilon: f64,
    /// Fraction of the chord length between an arrowhead's tip and base.
    pub arrowhead_standoff: f64,
    pub arrowhead_width: f64,
    pub arrowhead_size: f64,
    /// Tick budget for the zoomed-out overview at magnification 1.
    pub zoomed_out_max_ticks: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            unselected_opacity: 0.2,
            arc_offset: 0.25,
            collision_epsilon: 1e-6,
            arrowhead_standoff: 0.1,
            arrowhead_width: 1.0,
            arrowhead_size: 1.5,
            zoomed_out_max_ticks: 10,
        }
    }
}

/// A single column name or an ordered list of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(vec![])
    }
}

/// Edge filters applied to evaluated link weights.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightFilters {
    /// Drop edges whose weight is below this value.
    pub lt: Option<f64>,
    /// Drop edges whose weight is above this value.
    pub gt: Option<f64>,
    /// Drop edges whose weight equals any of these.
    pub neq: Vec<f64>,
}

impl WeightFilters {
    pub fn keeps(&self, weight: f64) -> bool {
        if let Some(lt) = self.lt
            && weight < lt
        {
            return false;
        }
        if let Some(gt) = self.gt
            && weight > gt
        {
            return false;
        }
        !self.is_excluded(weight)
    }

    /// Whether `weight` is one of the `neq` values.
    pub fn is_excluded(&self, weight: f64) -> bool {
        self.neq
            .iter()
            .any(|v| float_cmp::approx_eq!(f64, *v, weight, ulps = 4))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub attr: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub minimize_loops: bool,
    #[serde(default = "default_true")]
    pub show_arrowheads: bool,
    #[serde(default)]
    pub weight_exp: Option<String>,
    #[serde(default)]
    pub weight_filters: WeightFilters,
    /// Per-column values ignored when grouping samples for this link.
    #[serde(default)]
    pub attr_filters: BTreeMap<String, Vec<String>>,
}

impl LinkConfig {
    pub fn new(attr: &str) -> Self {
        LinkConfig {
            attr: attr.to_owned(),
            label: None,
            minimize_loops: false,
            show_arrowheads: true,
            weight_exp: None,
            weight_filters: WeightFilters::default(),
            attr_filters: BTreeMap::new(),
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.attr)
    }

    pub fn is_ignored(&self, column: &str, value: &str) -> bool {
        self.attr_filters
            .get(column)
            .is_some_and(|vals| vals.iter().any(|v| v == value))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LinkConfigRepr {
    Attr(String),
    Full(LinkConfig),
}

impl From<LinkConfigRepr> for LinkConfig {
    fn from(repr: LinkConfigRepr) -> Self {
        match repr {
            LinkConfigRepr::Attr(attr) => LinkConfig::new(&attr),
            LinkConfigRepr::Full(link) => link,
        }
    }
}

fn deserialize_links<'de, D>(deserializer: D) -> std::result::Result<Vec<LinkConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let reprs: Vec<LinkConfigRepr> = Vec::deserialize(deserializer)?;
    Ok(reprs.into_iter().map(LinkConfig::from).collect())
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> String {
    "\t".to_owned()
}

fn default_node_id() -> String {
    "sample_id".to_owned()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_owned()
}

fn default_magnification() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_node_id")]
    pub node_id: String,
    pub track: OneOrMany,
    pub date_attr: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub date_output_format: Option<String>,
    #[serde(default)]
    pub label_attr: Option<OneOrMany>,
    #[serde(default, deserialize_with = "deserialize_links")]
    pub attr_link_list: Vec<LinkConfig>,
    #[serde(default)]
    pub node_color_attr: Option<String>,
    #[serde(default)]
    pub node_symbol_attr: Option<String>,
    #[serde(default = "default_true")]
    pub links_across_y: bool,
    #[serde(default)]
    pub max_day_range: Option<i64>,
    #[serde(default)]
    pub null_vals: Vec<String>,
    #[serde(default = "default_true")]
    pub empty_strings_are_null: bool,
    #[serde(default)]
    pub selected_points: BTreeMap<String, serde_json::Value>,
    #[serde(default = "default_magnification")]
    pub x_magnification: f64,
    #[serde(default = "default_magnification")]
    pub y_magnification: f64,
    #[serde(default)]
    pub date_range: Option<(String, String)>,
    #[serde(default)]
    pub filtered_link_types: Vec<String>,
    /// Marker symbols whose nodes are hidden.
    #[serde(default)]
    pub filtered_node_symbols: Vec<String>,
    /// Marker colors whose nodes are hidden.
    #[serde(default)]
    pub filtered_node_colors: Vec<String>,
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl Config {
    /// A config with every optional field at its default.
    pub fn new(node_id: &str, track: &[&str], date_attr: &str) -> Self {
        Config {
            delimiter: default_delimiter(),
            node_id: node_id.to_owned(),
            track: OneOrMany::Many(track.iter().map(|s| s.to_string()).collect()),
            date_attr: date_attr.to_owned(),
            date_format: default_date_format(),
            date_output_format: None,
            label_attr: None,
            attr_link_list: vec![],
            node_color_attr: None,
            node_symbol_attr: None,
            links_across_y: true,
            max_day_range: None,
            null_vals: vec![],
            empty_strings_are_null: true,
            selected_points: BTreeMap::new(),
            x_magnification: 1.0,
            y_magnification: 1.0,
            date_range: None,
            filtered_link_types: vec![],
            filtered_node_symbols: vec![],
            filtered_node_colors: vec![],
            layout: LayoutConfig::default(),
        }
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let config: Config = serde_json::from_reader(reader)?;
        config.check_options()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.check_options()?;
        Ok(config)
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_str() {
            "\t" | "tab" => Ok(b'\t'),
            "," | "comma" => Ok(b','),
            other => config_err!(
                BadDelimiter,
                format!("delimiter must be tab or comma, not {other:?}")
            ),
        }
    }

    pub fn track_columns(&self) -> Vec<String> {
        self.track.to_vec()
    }

    pub fn label_columns(&self) -> Vec<String> {
        self.label_attr
            .as_ref()
            .map(OneOrMany::to_vec)
            .unwrap_or_default()
    }

    pub fn output_date_format(&self) -> &str {
        self.date_output_format
            .as_deref()
            .unwrap_or(&self.date_format)
    }

    pub fn is_selected(&self, sample_id: &str) -> bool {
        self.selected_points.contains_key(sample_id)
    }

    pub fn has_selection(&self) -> bool {
        !self.selected_points.is_empty()
    }

    pub fn is_link_filtered(&self, attr: &str) -> bool {
        self.filtered_link_types.iter().any(|a| a == attr)
    }

    pub fn is_symbol_filtered(&self, symbol: &str) -> bool {
        self.filtered_node_symbols.iter().any(|s| s == symbol)
    }

    pub fn is_color_filtered(&self, color: &str) -> bool {
        self.filtered_node_colors.iter().any(|c| c == color)
    }

    /// Checks the options that do not depend on the sample file.
    pub fn check_options(&self) -> Result<()> {
        self.delimiter_byte()?;
        if self.track_columns().is_empty() {
            return config_err!(MissingColumn, "track needs at least one column".to_owned());
        }
        if !(self.x_magnification > 0.0 && self.y_magnification > 0.0) {
            return config_err!(
                Generic,
                "magnification factors must be positive".to_owned()
            );
        }
        if let Some(days) = self.max_day_range
            && days < 0
        {
            return config_err!(
                Generic,
                format!("max_day_range must not be negative, got {days}")
            );
        }
        Ok(())
    }

    /// Checks every configured column against the sample file header.
    pub fn check_columns(&self, header: &[String]) -> Result<()> {
        let known: HashSet<&str> = header.iter().map(String::as_str).collect();
        let check = |option: &str, column: &str| -> Result<()> {
            if known.contains(column) {
                Ok(())
            } else {
                config_err!(
                    UnknownColumn,
                    format!("{option} column '{column}' is not in the header")
                )
            }
        };

        for column in self.track_columns() {
            check("track", &column)?;
        }
        check("date_attr", &self.date_attr)?;
        for column in self.label_columns() {
            check("label_attr", &column)?;
        }
        if let Some(column) = &self.node_color_attr {
            check("node_color_attr", column)?;
        }
        if let Some(column) = &self.node_symbol_attr {
            check("node_symbol_attr", column)?;
        }
        for link in &self.attr_link_list {
            check("attr_link_list", &link.attr)?;
            for column in link.attr_filters.keys() {
                check("attr_filters", column)?;
            }
        }
        Ok(())
    }
}
