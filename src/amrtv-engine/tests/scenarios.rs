// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::io::Write;

use float_cmp::approx_eq;

use amrtv_engine::links::EdgeKind;
use amrtv_engine::{
    Config, DiagnosticKind, ErrorCode, ErrorKind, Rendered, SampleTable, eval_expr,
    generate_view, generate_view_from_reader, open_table,
};

const MINIMAL_CONFIG: &str = r#"{
    "node_id": "s",
    "track": "loc",
    "date_attr": "d",
    "date_format": "%Y-%m-%d",
    "attr_link_list": ["g"]
}"#;

fn tsv(rows: &[&str]) -> String {
    let mut out = String::from("s\tloc\td\tg\th\n");
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}

fn render(config: &Config, rows: &[&str]) -> Rendered {
    let input = tsv(rows);
    generate_view_from_reader(input.as_bytes(), config)
        .unwrap_or_else(|e| panic!("view failed: {e}"))
}

fn edge_pairs(rendered: &Rendered) -> Vec<(&str, &str)> {
    rendered
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect()
}

#[test]
fn minimal() {
    let config = Config::from_json(MINIMAL_CONFIG).unwrap();
    let rendered = render(
        &config,
        &["A\tX\t2021-01-01\t1\t", "B\tY\t2021-01-02\t1\t"],
    );
    let view = &rendered.view;

    assert_eq!(view.main_fig_nodes_x, vec![1, 2]);
    assert_eq!(view.main_fig_nodes_y, vec![1, 2]);
    assert_eq!(edge_pairs(&rendered), vec![("A", "B")]);
    assert_eq!(rendered.edges[0].kind, EdgeKind::Straight);
    assert_eq!(view.link_color_dict.get("g").unwrap().to_hex(), "#e41a1c");
    assert_eq!(view.link_legend[0].color, "#e41a1c");
    assert!(rendered.report.is_empty());
}

#[test]
fn null_filter() {
    let mut config = Config::from_json(MINIMAL_CONFIG).unwrap();
    config.null_vals = vec!["-".to_owned()];
    let rendered = render(
        &config,
        &[
            "A\tX\t2021-01-01\t1\t",
            "B\tY\t2021-01-02\t1\t",
            "C\t-\t2021-01-03\t1\t",
        ],
    );

    assert_eq!(rendered.view.main_fig_nodes_x.len(), 2);
    assert_eq!(rendered.report.count(DiagnosticKind::MissingTrack), 1);
    let diag = &rendered.report.diagnostics[0];
    assert_eq!(diag.sample_id.as_deref(), Some("C"));
    assert_eq!(diag.row, Some(3));
}

#[test]
fn day_range_filter() {
    let mut config = Config::from_json(MINIMAL_CONFIG).unwrap();
    config.max_day_range = Some(5);
    let rendered = render(
        &config,
        &[
            "A\tX\t2021-01-01\t1\t",
            "B\tY\t2021-01-02\t1\t",
            "D\tY\t2021-02-01\t1\t",
        ],
    );

    assert_eq!(rendered.view.main_fig_nodes_x.len(), 3);
    assert_eq!(edge_pairs(&rendered), vec![("A", "B")]);
}

#[test]
fn mst_reduction() {
    let config = Config::from_json(
        r#"{
            "node_id": "s",
            "track": "loc",
            "date_attr": "d",
            "attr_link_list": [{"attr": "g", "minimize_loops": true}]
        }"#,
    )
    .unwrap();
    let rendered = render(
        &config,
        &[
            "A\tX\t2021-01-01\t1\t",
            "B\tY\t2021-01-02\t1\t",
            "C\tX\t2021-01-05\t1\t",
        ],
    );

    assert_eq!(edge_pairs(&rendered), vec![("A", "B"), ("B", "C")]);
    let days: Vec<i64> = rendered.edges.iter().map(|e| e.days).collect();
    assert_eq!(days, vec![1, 3]);
}

#[test]
fn arc() {
    let mut config = Config::from_json(MINIMAL_CONFIG).unwrap();
    config.attr_link_list.push(amrtv_engine::LinkConfig::new("h"));
    let rendered = render(
        &config,
        &["A\tX\t2021-01-01\t1\t5", "B\tY\t2021-01-02\t1\t5"],
    );

    let kinds: Vec<EdgeKind> = rendered.edges.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EdgeKind::Straight, EdgeKind::Arc]);

    let view = &rendered.view;
    let straight = view.main_fig_links_dict.get("g").unwrap();
    assert_eq!(straight.x, vec![Some(1.0), Some(2.0), None]);
    let arcs = view.main_fig_arcs_dict.get("h").unwrap();
    assert_eq!(arcs.x.len(), 1);

    // the control point sits off the chord, on its perpendicular bisector
    let (cx, cy) = rendered.edges[1].control.unwrap();
    let (mx, my) = (1.5, 1.5);
    let (dx, dy) = (1.0, 1.0);
    assert!(approx_eq!(f64, (cx - mx) * dx + (cy - my) * dy, 0.0, epsilon = 1e-12));
    let offset = ((cx - mx).powi(2) + (cy - my).powi(2)).sqrt();
    assert!(approx_eq!(f64, offset, 0.25, epsilon = 1e-12));
    assert!(arcs.path[0].starts_with("M 1,1 Q "));
}

#[test]
fn expression() {
    assert!(approx_eq!(f64, eval_expr("2 + 3 * -4").unwrap(), -10.0));
    let err = eval_expr("x + 1").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Expression);
    assert_eq!(err.code, ErrorCode::UnsupportedSyntax);
}

#[test]
fn empty_table() {
    let config = Config::from_json(MINIMAL_CONFIG).unwrap();
    let table = SampleTable::from_rows(&["s", "loc", "d", "g"], "s", &[] as &[Vec<&str>]);
    let rendered = generate_view(&table, &config).unwrap();
    let view = &rendered.view;

    assert!(view.main_fig_nodes_x.is_empty());
    assert!(view.main_fig_xaxis_tickvals.is_empty());
    assert_eq!(view.main_fig_xaxis_range, [0.0, 1.0]);
    assert_eq!(view.main_fig_yaxis_range, [0.0, 1.0]);
    assert!(rendered.edges.is_empty());
    assert!(view.main_fig_links_dict.get("g").unwrap().x.is_empty());
}

#[test]
fn single_sample() {
    let config = Config::from_json(MINIMAL_CONFIG).unwrap();
    let rendered = render(&config, &["A\tX\t2021-01-01\t1\t"]);
    assert_eq!(rendered.view.main_fig_nodes_x, vec![1]);
    assert!(rendered.edges.is_empty());
}

#[test]
fn all_same_date() {
    let config = Config::from_json(MINIMAL_CONFIG).unwrap();
    let rendered = render(
        &config,
        &[
            "A\tX\t2021-01-01\t1\t",
            "B\tY\t2021-01-01\t1\t",
            "C\tZ\t2021-01-01\t2\t",
        ],
    );
    let view = &rendered.view;
    assert_eq!(view.main_fig_xaxis_tickvals, vec![1]);
    assert_eq!(view.main_fig_xaxis_range, [0.0, 2.0]);
    assert_eq!(view.main_fig_nodes_x, vec![1, 1, 1]);
    // equal dates orient by id
    assert_eq!(edge_pairs(&rendered), vec![("A", "B")]);
}

#[test]
fn unknown_link_column_is_fatal() {
    let mut config = Config::from_json(MINIMAL_CONFIG).unwrap();
    config.attr_link_list.push(amrtv_engine::LinkConfig::new("mlst"));
    let input = tsv(&["A\tX\t2021-01-01\t1\t"]);
    let err = generate_view_from_reader(input.as_bytes(), &config).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Config);
    assert_eq!(err.code, ErrorCode::UnknownColumn);
}

#[test]
fn comma_separated_file() {
    let mut config = Config::from_json(MINIMAL_CONFIG).unwrap();
    config.delimiter = ",".to_owned();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "s,loc,d,g").unwrap();
    writeln!(file, "A,X,2021-01-01,1").unwrap();
    writeln!(file, "B,Y,2021-01-04,1").unwrap();
    writeln!(file, "A,Y,2021-01-02,1").unwrap();
    file.flush().unwrap();

    let (table, report) = open_table(file.path(), &config).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(report.count(DiagnosticKind::DuplicateSample), 1);

    // the later duplicate replaces the first, keeping its position
    let rendered = generate_view(&table, &config).unwrap();
    assert_eq!(rendered.view.main_fig_nodes_y, vec![1, 1]);
    assert_eq!(
        rendered.view.main_fig_xaxis_ticktext,
        vec!["2021-01-02", "2021-01-04"]
    );
    assert_eq!(edge_pairs(&rendered), vec![("A", "B")]);
}

#[test]
fn view_serializes_flat() {
    let config = Config::from_json(MINIMAL_CONFIG).unwrap();
    let rendered = render(
        &config,
        &["A\tX\t2021-01-01\t1\t", "B\tY\t2021-01-02\t1\t"],
    );
    let json = serde_json::to_value(&rendered.view).unwrap();
    let object = json.as_object().unwrap();

    assert_eq!(object.len(), 42);
    assert_eq!(json["main_fig_xaxis_range"], serde_json::json!([0.0, 3.0]));
    assert_eq!(json["main_fig_links_dict"]["g"]["x"], serde_json::json!([1.0, 2.0, null]));
    assert_eq!(json["link_legend"][0]["attr"], "g");
    assert!(object.values().all(|v| !v.is_null()));
}
