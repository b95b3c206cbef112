//! Outer borders of mask regions and the area filter applied to them.

use crate::Mask;
use image::{imageops, GrayImage};
use imageproc::contours::{self as borders, BorderType};
use imageproc::point::Point;
use log::*;

/// Regions must enclose strictly more than this to be kept
pub const DEFAULT_MIN_AREA: f64 = 1000.0;

/// How many boundary points a contour keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainApprox {
    /// Every boundary pixel
    None,
    /// Only the end points of horizontal, vertical and diagonal runs
    Simple,
}

impl Default for ChainApprox {
    fn default() -> ChainApprox {
        ChainApprox::Simple
    }
}

/// Closed boundary of one 8-connected region of a mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Contour {
        Contour { points }
    }

    /// Area enclosed by the point sequence (shoelace formula).
    ///
    /// Points sit on pixel centers, so a filled `w` x `h` rectangle has an
    /// area of `(w - 1) * (h - 1)`.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }

        let mut twice = 0i64;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            twice += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
        }
        twice.abs() as f64 / 2.0
    }

    /// Drop points that sit in the middle of a straight run
    pub fn simplify(&self) -> Contour {
        let n = self.points.len();
        if n < 3 {
            return self.clone();
        }

        let points = (0..n)
            .filter(|&i| {
                let prev = self.points[(i + n - 1) % n];
                let cur = self.points[i];
                let next = self.points[(i + 1) % n];
                (cur.x - prev.x, cur.y - prev.y) != (next.x - cur.x, next.y - cur.y)
            })
            .map(|i| self.points[i])
            .collect();

        Contour { points }
    }

    /// `(min_x, min_y, max_x, max_y)`
    pub fn bounds(&self) -> Option<(i32, i32, i32, i32)> {
        let first = self.points.first()?;
        Some(self.points.iter().fold(
            (first.x, first.y, first.x, first.y),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        ))
    }
}

/// Outer borders of all top level regions, in raster discovery order.
/// Holes, and regions nested inside holes, are not reported.
pub fn find_external(mask: &Mask, approx: ChainApprox) -> Vec<Contour> {
    let (width, height) = mask.dimensions();

    // border following needs an off pixel on every side of a region, even
    // for regions touching the frame
    let mut framed = GrayImage::new(width + 2, height + 2);
    imageops::replace(&mut framed, mask, 1, 1);

    let contours: Vec<Contour> = borders::find_contours::<i32>(&framed)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            let contour = Contour::new(points);
            match approx {
                ChainApprox::None => contour,
                ChainApprox::Simple => contour.simplify(),
            }
        })
        .collect();

    debug!("found {} external contours", contours.len());
    contours
}

/// Keep contours with `area > min_area`, preserving their order
pub fn filter_by_area(contours: Vec<Contour>, min_area: f64) -> Vec<Contour> {
    let total = contours.len();
    let kept: Vec<Contour> = contours
        .into_iter()
        .filter(|c| {
            let area = c.area();
            trace!("contour area={}, keep={}", area, area > min_area);
            area > min_area
        })
        .collect();

    debug!(
        "kept {} of {} contours with area > {}",
        kept.len(),
        total,
        min_area
    );
    kept
}
