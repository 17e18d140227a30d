// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Assembles every render primitive into the flat mapping the front-end
//! consumes.

use std::io::Read;

use indexmap::IndexMap;
use serde::Serialize;

use crate::axis::{DateAxis, Facets, TrackAxis, zoomed_out_ticks};
use crate::common::{Report, Result};
use crate::config::Config;
use crate::geometry::Point;
use crate::legend::{ColorLegendRow, LinkLegendRow, color_legend, link_legend, symbol_legend};
use crate::links::{
    Arcs, Arrowheads, LinkGroup, Labels, RenderedEdge, Segments, WeightFilterForm,
    WeightSliderInfo, build_links,
};
use crate::nodes::build_nodes;
use crate::normalize::{DatedSample, check_date_format, normalize};
use crate::style::Rgb;
use crate::table::{SampleTable, read_table};

/// The engine's output: one flat JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct View {
    pub main_fig_nodes_x: Vec<usize>,
    pub main_fig_nodes_y: Vec<usize>,
    pub main_fig_nodes_text: Vec<String>,
    pub main_fig_nodes_hovertext: Vec<String>,
    pub main_fig_nodes_marker_color: Vec<String>,
    pub main_fig_nodes_marker_symbol: Vec<String>,
    pub main_fig_nodes_marker_opacity: Vec<f64>,
    pub main_fig_nodes_textfont_color: Vec<String>,

    pub main_fig_xaxis_range: [f64; 2],
    pub main_fig_xaxis_tickvals: Vec<usize>,
    pub main_fig_xaxis_ticktext: Vec<String>,
    pub main_fig_yaxis_range: [f64; 2],
    pub main_fig_yaxis_tickvals: Vec<usize>,
    pub main_fig_yaxis_ticktext: Vec<String>,

    pub main_fig_primary_facet_x: Vec<Option<f64>>,
    pub main_fig_primary_facet_y: Vec<Option<f64>>,
    pub main_fig_secondary_facet_x: Vec<Option<f64>>,
    pub main_fig_secondary_facet_y: Vec<Option<f64>>,

    pub main_fig_links_dict: IndexMap<String, Segments>,
    pub main_fig_arcs_dict: IndexMap<String, Arcs>,
    pub main_fig_link_arrowheads_dict: IndexMap<String, Arrowheads>,
    pub main_fig_arc_arrowheads_dict: IndexMap<String, Arrowheads>,
    pub main_fig_link_labels_dict: IndexMap<String, Labels>,
    pub main_fig_arc_labels_dict: IndexMap<String, Labels>,

    pub link_color_dict: IndexMap<String, Rgb>,
    pub node_color_attr_dict: IndexMap<String, String>,

    pub node_shape_legend_fig_nodes_y: Vec<usize>,
    pub node_shape_legend_fig_nodes_marker_symbol: Vec<String>,
    pub node_shape_legend_fig_nodes_text: Vec<String>,
    pub node_shape_legend_fig_nodes_marker_opacity: Vec<f64>,
    pub node_shape_legend_fig_nodes_textfont_color: Vec<String>,
    pub node_color_legend_fig_nodes_marker_opacity: Vec<f64>,
    pub node_color_legend_fig_nodes_textfont_color: Vec<String>,

    pub zoomed_out_main_fig_xaxis_tickvals: Vec<usize>,
    pub zoomed_out_main_fig_xaxis_ticktext: Vec<String>,
    pub zoomed_out_main_fig_yaxis_tickvals: Vec<usize>,
    pub zoomed_out_main_fig_yaxis_ticktext: Vec<String>,

    pub link_dash_dict: IndexMap<String, String>,
    pub link_legend: Vec<LinkLegendRow>,
    pub node_color_legend: Vec<ColorLegendRow>,
    pub weight_slider_info_dict: IndexMap<String, WeightSliderInfo>,
    pub weight_filter_form_dict: IndexMap<String, WeightFilterForm>,
}

/// A view together with what happened while building it.
#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    pub view: View,
    pub report: Report,
    /// Emitted edges in render order; not part of the serialized view.
    pub edges: Vec<RenderedEdge>,
}

/// One link group per configured link attribute.
pub fn configured_groups(config: &Config) -> Vec<LinkGroup> {
    config
        .attr_link_list
        .iter()
        .cloned()
        .map(LinkGroup::shared_value)
        .collect()
}

/// Build the view for a sample table.
pub fn generate_view(table: &SampleTable, config: &Config) -> Result<Rendered> {
    config.check_options()?;
    config.check_columns(table.header().names())?;

    let mut report = Report::new();
    let samples = normalize(table, config, &mut report)?;
    layout_view(&samples, &configured_groups(config), config, report)
}

/// Read a sample file and build its view; row problems found while reading
/// are included in the report.
pub fn generate_view_from_reader(reader: impl Read, config: &Config) -> Result<Rendered> {
    let (table, read_report) = read_table(reader, config)?;
    let mut rendered = generate_view(&table, config)?;
    let mut report = read_report;
    report.extend(rendered.report);
    rendered.report = report;
    Ok(rendered)
}

/// Lay out already-normalized samples with the given link groups.
pub(crate) fn layout_view(
    samples: &[DatedSample],
    groups: &[LinkGroup],
    config: &Config,
    mut report: Report,
) -> Result<Rendered> {
    check_date_format("date_output_format", config.output_date_format())?;
    let track = config.track_columns();

    let x_axis = DateAxis::build(samples, config.output_date_format());
    let y_axis = TrackAxis::build(samples, &track);
    let (primary, secondary) = y_axis.facets(x_axis.axis.len());

    // normalized samples always have a date and every track column
    let (placed, positions): (Vec<DatedSample>, Vec<Point>) = samples
        .iter()
        .filter_map(|s| {
            let x = x_axis.position(s.date)?;
            let y = y_axis.position(s, &track)?;
            Some((s.clone(), Point::new(x as f64, y as f64)))
        })
        .unzip();

    let mut nodes = build_nodes(&placed, &x_axis, &y_axis, config);
    let visible: Vec<bool> = nodes
        .trace
        .marker_symbol
        .iter()
        .zip(&nodes.trace.marker_color)
        .map(|(symbol, color)| {
            !(config.is_symbol_filtered(symbol) || config.is_color_filtered(color))
        })
        .collect();
    let (placed, positions) = if visible.iter().all(|&v| v) {
        (placed, positions)
    } else {
        nodes.trace.retain_mask(&visible);
        tracing::debug!(
            hidden = visible.iter().filter(|&&v| !v).count(),
            "hid filtered nodes"
        );
        placed
            .into_iter()
            .zip(positions)
            .zip(&visible)
            .filter_map(|(pair, &keep)| keep.then_some(pair))
            .unzip()
    };

    let links = build_links(groups, &placed, &positions, config, &mut report);
    let symbols = symbol_legend(&nodes, config);
    let zoomed_x = zoomed_out_ticks(
        &x_axis.axis,
        config.layout.zoomed_out_max_ticks,
        config.x_magnification,
    );
    let zoomed_y = zoomed_out_ticks(
        &y_axis.axis,
        config.layout.zoomed_out_max_ticks,
        config.y_magnification,
    );
    let link_legend = link_legend(groups, &links, config);
    let node_color_legend = color_legend(&nodes.color_dict, config);
    let (color_legend_opacity, color_legend_textfont) = node_color_legend
        .iter()
        .map(|row| (row.marker_opacity, row.textfont_color.clone()))
        .unzip();

    let Facets {
        x: primary_facet_x,
        y: primary_facet_y,
    } = primary;
    let Facets {
        x: secondary_facet_x,
        y: secondary_facet_y,
    } = secondary;
    let trace = nodes.trace;

    let view = View {
        main_fig_nodes_x: trace.x,
        main_fig_nodes_y: trace.y,
        main_fig_nodes_text: trace.text,
        main_fig_nodes_hovertext: trace.hovertext,
        main_fig_nodes_marker_color: trace.marker_color,
        main_fig_nodes_marker_symbol: trace.marker_symbol,
        main_fig_nodes_marker_opacity: trace.marker_opacity,
        main_fig_nodes_textfont_color: trace.textfont_color,

        main_fig_xaxis_range: x_axis.axis.range,
        main_fig_xaxis_tickvals: x_axis.axis.tickvals,
        main_fig_xaxis_ticktext: x_axis.axis.ticktext,
        main_fig_yaxis_range: y_axis.axis.range,
        main_fig_yaxis_tickvals: y_axis.axis.tickvals,
        main_fig_yaxis_ticktext: y_axis.axis.ticktext,

        main_fig_primary_facet_x: primary_facet_x,
        main_fig_primary_facet_y: primary_facet_y,
        main_fig_secondary_facet_x: secondary_facet_x,
        main_fig_secondary_facet_y: secondary_facet_y,

        main_fig_links_dict: links.links_dict,
        main_fig_arcs_dict: links.arcs_dict,
        main_fig_link_arrowheads_dict: links.link_arrowheads_dict,
        main_fig_arc_arrowheads_dict: links.arc_arrowheads_dict,
        main_fig_link_labels_dict: links.link_labels_dict,
        main_fig_arc_labels_dict: links.arc_labels_dict,

        link_color_dict: links.color_dict,
        node_color_attr_dict: nodes.color_dict,

        node_shape_legend_fig_nodes_y: symbols.y,
        node_shape_legend_fig_nodes_marker_symbol: symbols.marker_symbol,
        node_shape_legend_fig_nodes_text: symbols.text,
        node_shape_legend_fig_nodes_marker_opacity: symbols.marker_opacity,
        node_shape_legend_fig_nodes_textfont_color: symbols.textfont_color,
        node_color_legend_fig_nodes_marker_opacity: color_legend_opacity,
        node_color_legend_fig_nodes_textfont_color: color_legend_textfont,

        zoomed_out_main_fig_xaxis_tickvals: zoomed_x.tickvals,
        zoomed_out_main_fig_xaxis_ticktext: zoomed_x.ticktext,
        zoomed_out_main_fig_yaxis_tickvals: zoomed_y.tickvals,
        zoomed_out_main_fig_yaxis_ticktext: zoomed_y.ticktext,

        link_dash_dict: links.dash_dict,
        link_legend,
        node_color_legend,
        weight_slider_info_dict: links.weight_slider_info,
        weight_filter_form_dict: links.weight_filter_form,
    };

    tracing::debug!(
        nodes = view.main_fig_nodes_x.len(),
        edges = links.edges.len(),
        diagnostics = report.diagnostics.len(),
        "generated view"
    );
    Ok(Rendered {
        view,
        report,
        edges: links.edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ErrorCode, ErrorKind};
    use crate::config::LinkConfig;

    fn minimal() -> (SampleTable, Config) {
        let table = SampleTable::from_rows(
            &["s", "loc", "d", "g"],
            "s",
            &[
                vec!["A", "X", "2021-01-01", "1"],
                vec!["B", "Y", "2021-01-02", "1"],
            ],
        );
        let mut config = Config::new("s", &["loc"], "d");
        config.attr_link_list = vec![LinkConfig::new("g")];
        (table, config)
    }

    #[test]
    fn test_minimal_view() {
        let (table, config) = minimal();
        let rendered = generate_view(&table, &config).unwrap();
        let view = &rendered.view;

        assert_eq!(view.main_fig_nodes_x, vec![1, 2]);
        assert_eq!(view.main_fig_nodes_y, vec![1, 2]);
        assert_eq!(view.main_fig_xaxis_range, [0.0, 3.0]);
        assert_eq!(view.main_fig_xaxis_ticktext, vec!["2021-01-01", "2021-01-02"]);
        assert_eq!(view.main_fig_yaxis_ticktext, vec!["X", "Y"]);
        assert_eq!(view.link_color_dict.get("g").unwrap().to_hex(), "#e41a1c");
        assert_eq!(rendered.edges.len(), 1);
        assert!(rendered.report.is_empty());
    }

    #[test]
    fn test_view_keys() {
        let (table, config) = minimal();
        let view = generate_view(&table, &config).unwrap().view;
        let json = serde_json::to_value(&view).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();

        for key in [
            "main_fig_nodes_marker_opacity",
            "main_fig_secondary_facet_y",
            "main_fig_arc_labels_dict",
            "node_shape_legend_fig_nodes_marker_symbol",
            "zoomed_out_main_fig_yaxis_ticktext",
            "weight_slider_info_dict",
            "weight_filter_form_dict",
            "node_color_legend_fig_nodes_textfont_color",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(keys.len(), 42);
        assert_eq!(json["main_fig_links_dict"]["g"]["x"][2], serde_json::Value::Null);
        assert_eq!(json["link_color_dict"]["g"], serde_json::json!([228, 26, 28]));
    }

    #[test]
    fn test_unknown_column_is_fatal() {
        let (table, mut config) = minimal();
        config.node_symbol_attr = Some("st".to_owned());
        let err = generate_view(&table, &config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert_eq!(err.code, ErrorCode::UnknownColumn);
    }

    #[test]
    fn test_deterministic() {
        let (table, config) = minimal();
        let a = generate_view(&table, &config).unwrap();
        let b = generate_view(&table, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.view).unwrap(),
            serde_json::to_string(&b.view).unwrap()
        );
    }

    #[test]
    fn test_filtered_nodes_are_hidden() {
        let table = SampleTable::from_rows(
            &["s", "loc", "d", "g", "species"],
            "s",
            &[
                vec!["A", "X", "2021-01-01", "1", "E. coli"],
                vec!["B", "X", "2021-01-02", "1", "K. pneumoniae"],
                vec!["C", "X", "2021-01-03", "1", "E. coli"],
            ],
        );
        let mut config = Config::new("s", &["loc"], "d");
        config.attr_link_list = vec![LinkConfig::new("g")];
        config.node_color_attr = Some("species".to_owned());
        config.filtered_node_colors = vec!["rgb(255, 255, 179)".to_owned()];

        let rendered = generate_view(&table, &config).unwrap();
        let view = &rendered.view;
        assert_eq!(view.main_fig_nodes_x, vec![1, 3]);
        assert_eq!(view.main_fig_xaxis_ticktext.len(), 3);
        assert_eq!(rendered.edges.len(), 1);
        assert_eq!(rendered.edges[0].from, "A");
        assert_eq!(rendered.edges[0].to, "C");
        assert_eq!(view.node_color_legend_fig_nodes_marker_opacity, vec![1.0, 0.5]);
        assert_eq!(
            view.node_color_legend_fig_nodes_textfont_color,
            vec!["black", "grey"]
        );
        assert_eq!(view.node_color_attr_dict.len(), 2);
    }
}
