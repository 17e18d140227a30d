// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Palettes, dash patterns and marker symbols.
//!
//! Every assignment is positional (by link index or by first-seen value), so
//! equal inputs always produce equal styles.

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Serialized as an `[r, g, b]` triple.
impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.0, self.1, self.2].serialize(serializer)
    }
}

/// Color Brewer Set1, used for link groups.
pub const LINK_PALETTE: [Rgb; 9] = [
    Rgb(0xe4, 0x1a, 0x1c),
    Rgb(0x37, 0x7e, 0xb8),
    Rgb(0x4d, 0xaf, 0x4a),
    Rgb(0x98, 0x4e, 0xa3),
    Rgb(0xff, 0x7f, 0x00),
    Rgb(0xff, 0xff, 0x33),
    Rgb(0xa6, 0x56, 0x28),
    Rgb(0xf7, 0x81, 0xbf),
    Rgb(0x99, 0x99, 0x99),
];

/// Color Brewer Set3, used for node attribute values.
pub const NODE_PALETTE: [Rgb; 12] = [
    Rgb(0x8d, 0xd3, 0xc7),
    Rgb(0xff, 0xff, 0xb3),
    Rgb(0xbe, 0xba, 0xda),
    Rgb(0xfb, 0x80, 0x72),
    Rgb(0x80, 0xb1, 0xd3),
    Rgb(0xfd, 0xb4, 0x62),
    Rgb(0xb3, 0xde, 0x69),
    Rgb(0xfc, 0xcd, 0xe5),
    Rgb(0xd9, 0xd9, 0xd9),
    Rgb(0xbc, 0x80, 0xbd),
    Rgb(0xcc, 0xeb, 0xc5),
    Rgb(0xff, 0xed, 0x6f),
];

pub const DEFAULT_NODE_COLOR: &str = "lightgrey";

pub const DASHES: [&str; 6] = ["solid", "dot", "dash", "longdash", "dashdot", "longdashdot"];

pub const SYMBOLS: [&str; 10] = [
    "circle",
    "square",
    "diamond",
    "cross",
    "x",
    "triangle-up",
    "triangle-down",
    "pentagon",
    "hexagon",
    "star",
];

pub const DEFAULT_SYMBOL: &str = "circle";

pub fn link_color(index: usize) -> Rgb {
    LINK_PALETTE[index % LINK_PALETTE.len()]
}

pub fn link_dash(index: usize) -> &'static str {
    DASHES[index % DASHES.len()]
}

pub fn node_color(index: usize) -> Rgb {
    NODE_PALETTE[index % NODE_PALETTE.len()]
}

pub fn node_symbol(index: usize) -> &'static str {
    SYMBOLS[index % SYMBOLS.len()]
}
