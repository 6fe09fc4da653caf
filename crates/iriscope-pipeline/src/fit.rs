//! Circle fitting from a class mask via contour analysis.
//!
//! The region of a class is reduced to a single circle: binarize the
//! mask, trace external contours (Suzuki-Abe border following via
//! `imageproc::contours::find_contours`), compress collinear runs to
//! polygon vertices, keep the largest-area contour, take its
//! polygon-moment centroid, and report the radius of the disk with
//! equal area. The effective radius is a deliberate simplification,
//! not a geometric fit to the boundary, and is preserved exactly for
//! compatibility with existing consumers.

#![allow(clippy::cast_possible_truncation)]

use image::GrayImage;
use imageproc::contours::{find_contours, Contour};
use imageproc::point::Point;

use crate::types::{Circle, ClassMask, EyeClass};

/// Fit a circle to the largest region of `class` in the mask.
///
/// Returns `None` when the mask contains no region of the class, or
/// when the largest region's contour compresses to fewer than 5
/// polygon vertices (too small or degenerate to fit reliably; any
/// axis-aligned rectangle compresses to its 4 corners and is
/// rejected). Absence is an expected outcome, never an error.
#[must_use]
pub fn fit_circle(mask: &ClassMask, class: EyeClass) -> Option<Circle> {
    let binary = binarize(mask, class);
    let contours: Vec<Contour<u32>> = find_contours(&binary);

    // External contours only: borders with a parent sit inside a hole
    // of some other region and must not compete for selection.
    let (points, area) = contours
        .iter()
        .filter(|c| c.parent.is_none())
        .map(|c| {
            let points = compress_collinear(&c.points);
            let area = polygon_area(&points);
            (points, area)
        })
        .max_by(|(_, a), (_, b)| a.total_cmp(b))?;

    if points.len() < 5 {
        return None;
    }

    let (x, y) = polygon_centroid(&points).unwrap_or_else(|| enclosing_center(&points));
    let radius = (area / std::f64::consts::PI).sqrt();
    Some(Circle { x, y, radius })
}

/// Reduce a closed pixel contour to its polygon vertices by dropping
/// every point interior to a straight run (horizontal, vertical, or
/// diagonal), the chain-approximation vertex count. The dropped
/// points are collinear, so polygon area and moments are unchanged;
/// only the 5-vertex floor observes the difference.
fn compress_collinear(points: &[Point<u32>]) -> Vec<(f64, f64)> {
    let as_pair = |p: Point<u32>| (f64::from(p.x), f64::from(p.y));
    let step = |a: Point<u32>, b: Point<u32>| {
        (
            i64::from(b.x) - i64::from(a.x),
            i64::from(b.y) - i64::from(a.y),
        )
    };

    let n = points.len();
    if n < 3 {
        return points.iter().copied().map(as_pair).collect();
    }
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| as_pair(points[i]))
        .collect()
}

/// Foreground = pixels the mask assigned to `class`.
fn binarize(mask: &ClassMask, class: EyeClass) -> GrayImage {
    let (height, width) = mask.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        if mask[[y as usize, x as usize]] == class.id() {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}

/// Unsigned polygon area via the shoelace formula.
fn polygon_area(points: &[(f64, f64)]) -> f64 {
    (signed_cross_sum(points) / 2.0).abs()
}

/// Sum of cross products over the closed polygon's edges: twice the
/// signed area.
fn signed_cross_sum(points: &[(f64, f64)]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        sum += x0.mul_add(y1, -(x1 * y0));
    }
    sum
}

/// Area-weighted centroid from the polygon's first moments
/// (cx = M10/M00, cy = M01/M00).
///
/// Returns `None` when the signed area vanishes: a zero-area contour
/// (e.g. a one-pixel-wide line traced out and back) has no moment
/// centroid and the caller falls back to the minimal enclosing circle.
fn polygon_centroid(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let n = points.len();
    let mut double_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        let cross = x0.mul_add(y1, -(x1 * y0));
        double_area += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    if double_area.abs() < f64::EPSILON {
        return None;
    }
    let scale = 3.0 * double_area;
    Some((cx / scale, cy / scale))
}

/// Center of the minimal enclosing circle of a point set, via Welzl's
/// algorithm. Contours are short enough that the plain recursive form
/// (no randomized reordering) is fine.
fn enclosing_center(points: &[(f64, f64)]) -> (f64, f64) {
    let (x, y, _) = welzl(points, &mut Vec::with_capacity(3));
    (x, y)
}

/// Relative slack when testing circle membership, to absorb floating
/// point error in circumcenter computation.
const MEMBERSHIP_EPS: f64 = 1e-9;

fn welzl(points: &[(f64, f64)], boundary: &mut Vec<(f64, f64)>) -> (f64, f64, f64) {
    if points.is_empty() || boundary.len() == 3 {
        return trivial_circle(boundary);
    }
    let (rest, &[p]) = points.split_at(points.len() - 1) else {
        return trivial_circle(boundary);
    };
    let (cx, cy, r) = welzl(rest, boundary);
    if distance((cx, cy), p) <= r * (1.0 + MEMBERSHIP_EPS) + MEMBERSHIP_EPS {
        return (cx, cy, r);
    }
    boundary.push(p);
    let circle = welzl(rest, boundary);
    boundary.pop();
    circle
}

/// Smallest circle through 0, 1, 2, or 3 boundary points. The
/// recursion caps the boundary at 3, so the rest-pattern in the last
/// arm never matches extra points in practice.
fn trivial_circle(boundary: &[(f64, f64)]) -> (f64, f64, f64) {
    match *boundary {
        [] => (0.0, 0.0, 0.0),
        [(x, y)] => (x, y, 0.0),
        [a, b] => diameter_circle(a, b),
        [a, b, c, ..] => circumcircle(a, b, c),
    }
}

fn diameter_circle(a: (f64, f64), b: (f64, f64)) -> (f64, f64, f64) {
    let cx = (a.0 + b.0) / 2.0;
    let cy = (a.1 + b.1) / 2.0;
    (cx, cy, distance((cx, cy), a))
}

/// Circumcircle of a triangle; collinear points degrade to the
/// diameter circle of the farthest pair.
fn circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> (f64, f64, f64) {
    let d = 2.0 * (a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1));
    if d.abs() < f64::EPSILON {
        let pairs = [(a, b), (a, c), (b, c)];
        let farthest = pairs
            .iter()
            .copied()
            .max_by(|(p, q), (s, t)| distance(*p, *q).total_cmp(&distance(*s, *t)));
        return farthest.map_or((0.0, 0.0, 0.0), |(p, q)| diameter_circle(p, q));
    }
    let a2 = a.0.mul_add(a.0, a.1 * a.1);
    let b2 = b.0.mul_add(b.0, b.1 * b.1);
    let c2 = c.0.mul_add(c.0, c.1 * c.1);
    let ux = (a2 * (b.1 - c.1) + b2 * (c.1 - a.1) + c2 * (a.1 - b.1)) / d;
    let uy = (a2 * (c.0 - b.0) + b2 * (a.0 - c.0) + c2 * (b.0 - a.0)) / d;
    (ux, uy, distance((ux, uy), a))
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx.mul_add(dx, dy * dy).sqrt()
}
