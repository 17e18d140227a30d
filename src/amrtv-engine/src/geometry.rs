// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

/// 2D position/vector in axis units.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 2D cross product: z-component of the 3D cross product.
    pub fn cross_2d(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn unit(self) -> Option<Self> {
        let len = self.length();
        if is_zero(len) {
            None
        } else {
            Some(Self::new(self.x / len, self.y / len))
        }
    }

    fn approx_eq(self, other: Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Point {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

pub fn is_zero(n: f64) -> bool {
    n.abs() < 0.0000001
}

pub fn rad_to_deg(r: f64) -> f64 {
    (r * 180.0) / PI
}

/// Format a number the way the plotting front-end prints it: integers
/// without a trailing `.0`, everything else with minimal decimals.
pub fn format_number(n: f64) -> String {
    // integers exactly representable in an f64 print without a fraction
    if n.is_finite() && n == n.trunc() && n.abs() < 9.007_199_254_740_992e15 {
        return format!("{}", n as i64);
    }
    format!("{n}")
}

/// A straight segment between two rendered node positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Chord {
    pub start: Point,
    pub end: Point,
}

impl Chord {
    pub fn new(start: Point, end: Point) -> Self {
        Chord { start, end }
    }

    pub fn delta(&self) -> Point {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.delta().length()
    }

    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// Unit normal `(-dy, dx) / |chord|`; `(0, 1)` for degenerate chords.
    pub fn unit_normal(&self) -> Point {
        let d = self.delta();
        Point::new(-d.y, d.x)
            .unit()
            .unwrap_or_else(|| Point::new(0.0, 1.0))
    }

    /// Angle of the chord in degrees, folded into [-90, 90] so that label
    /// text is never upside down.
    pub fn text_angle(&self) -> f64 {
        let d = self.delta();
        let mut angle = rad_to_deg(d.y.atan2(d.x));
        if angle > 90.0 {
            angle -= 180.0;
        } else if angle < -90.0 {
            angle += 180.0;
        }
        angle
    }

    fn shared_endpoints(&self, other: &Chord, eps: f64) -> usize {
        let mut shared = 0;
        for p in [self.start, self.end] {
            if p.approx_eq(other.start, eps) || p.approx_eq(other.end, eps) {
                shared += 1;
            }
        }
        shared
    }

    /// Whether two chords would overlap visually when drawn straight.
    ///
    /// Chords collide when they join the same two positions (in either
    /// orientation), when they share no endpoint and intersect, or when they
    /// share exactly one endpoint and run along the same line.
    pub fn collides(&self, other: &Chord, eps: f64) -> bool {
        let same = (self.start.approx_eq(other.start, eps) && self.end.approx_eq(other.end, eps))
            || (self.start.approx_eq(other.end, eps) && self.end.approx_eq(other.start, eps));
        if same {
            return true;
        }

        match self.shared_endpoints(other, eps) {
            0 => segments_intersect(self, other, eps),
            1 => collinear_overlap(self, other, eps) > eps,
            _ => false,
        }
    }
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b - a).cross_2d(c - a)
}

fn on_segment(p: Point, seg: &Chord, eps: f64) -> bool {
    p.x >= seg.start.x.min(seg.end.x) - eps
        && p.x <= seg.start.x.max(seg.end.x) + eps
        && p.y >= seg.start.y.min(seg.end.y) - eps
        && p.y <= seg.start.y.max(seg.end.y) + eps
}

/// Closed-segment intersection test with tolerance `eps`.
pub fn segments_intersect(a: &Chord, b: &Chord, eps: f64) -> bool {
    let d1 = orientation(b.start, b.end, a.start);
    let d2 = orientation(b.start, b.end, a.end);
    let d3 = orientation(a.start, a.end, b.start);
    let d4 = orientation(a.start, a.end, b.end);

    let straddles = |p: f64, q: f64| (p > eps && q < -eps) || (p < -eps && q > eps);
    if straddles(d1, d2) && straddles(d3, d4) {
        return true;
    }

    (d1.abs() <= eps && on_segment(a.start, b, eps))
        || (d2.abs() <= eps && on_segment(a.end, b, eps))
        || (d3.abs() <= eps && on_segment(b.start, a, eps))
        || (d4.abs() <= eps && on_segment(b.end, a, eps))
}

/// Length of the common stretch of two collinear segments; 0 when they are
/// not collinear or only touch.
pub fn collinear_overlap(a: &Chord, b: &Chord, eps: f64) -> f64 {
    let Some(dir) = a.delta().unit() else {
        return 0.0;
    };
    if orientation(a.start, a.end, b.start).abs() > eps
        || orientation(a.start, a.end, b.end).abs() > eps
    {
        return 0.0;
    }

    let project = |p: Point| (p - a.start).dot(dir);
    let (a0, a1) = (0.0_f64, a.length());
    let (b0, b1) = {
        let (s, e) = (project(b.start), project(b.end));
        (s.min(e), s.max(e))
    };
    (a1.min(b1) - a0.max(b0)).max(0.0)
}

/// A quadratic Bézier curve from `start` to `end` bent towards `control`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadCurve {
    pub start: Point,
    pub control: Point,
    pub end: Point,
}

impl QuadCurve {
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        self.start * (u * u) + self.control * (2.0 * u * t) + self.end * (t * t)
    }

    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    /// Tangent direction where the curve arrives at `end`.
    pub fn end_tangent(&self) -> Point {
        self.end - self.control
    }

    pub fn svg_path(&self) -> String {
        format!(
            "M {},{} Q {},{} {},{}",
            format_number(self.start.x),
            format_number(self.start.y),
            format_number(self.control.x),
            format_number(self.control.y),
            format_number(self.end.x),
            format_number(self.end.y),
        )
    }
}
