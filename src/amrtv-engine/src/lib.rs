// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod common;
pub mod config;
pub mod table;
pub mod normalize;
pub mod axis;
pub mod style;
pub mod geometry;
pub mod graph;
pub mod nodes;
pub mod links;
pub mod legend;
pub mod expr;
pub mod view;
pub mod events;

pub use self::common::{Diagnostic, DiagnosticKind, Error, ErrorCode, ErrorKind, Report, Result};
pub use self::config::{Config, LayoutConfig, LinkConfig, WeightFilters};
pub use self::events::{
    TransmissionEvent, events_to_network, filter_transmission_events, generate_event_view,
};
pub use self::expr::{eval_expr, evaluate_weight};
#[cfg(feature = "file_io")]
pub use self::table::open_table;
pub use self::table::{SampleTable, read_table};
pub use self::view::{Rendered, View, generate_view, generate_view_from_reader};
