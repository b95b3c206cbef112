//! Binary erosion and dilation with small structuring elements.

use crate::classify::{OFF, ON};
use crate::Mask;
use image::{GrayImage, Luma};
use imageproc::morphology::{self as morph, grayscale_dilate, grayscale_erode};
use log::*;

/// Largest width or height of a structuring element
pub const MAX_ELEMENT_SIZE: u32 = 511;

/// Shape used to erode and dilate a mask, anchored at its center
#[derive(Debug, Clone, PartialEq)]
pub struct StructuringElement {
    cells: GrayImage,
}

impl Default for StructuringElement {
    /// A 1x1 ellipse, which leaves masks untouched
    fn default() -> StructuringElement {
        StructuringElement::ellipse(1, 1)
    }
}

#[inline]
fn clamp_size(width: u32, height: u32) -> (u32, u32) {
    (
        width.max(1).min(MAX_ELEMENT_SIZE),
        height.max(1).min(MAX_ELEMENT_SIZE),
    )
}

impl StructuringElement {
    /// Filled `width` x `height` rectangle
    pub fn rect(width: u32, height: u32) -> StructuringElement {
        let (width, height) = clamp_size(width, height);
        StructuringElement {
            cells: GrayImage::from_pixel(width, height, Luma([ON])),
        }
    }

    /// Center row and center column
    pub fn cross(width: u32, height: u32) -> StructuringElement {
        let (width, height) = clamp_size(width, height);
        let (cx, cy) = (width / 2, height / 2);
        StructuringElement {
            cells: GrayImage::from_fn(width, height, |x, y| {
                if x == cx || y == cy {
                    Luma([ON])
                } else {
                    Luma([OFF])
                }
            }),
        }
    }

    /// Ellipse inscribed in a `width` x `height` box.
    ///
    /// Each row spans `c ± round(c * sqrt(1 - dy²/r²))` where `r` and `c` are
    /// the half height and half width, clipped to the box.
    pub fn ellipse(width: u32, height: u32) -> StructuringElement {
        let (width, height) = clamp_size(width, height);
        let r = i64::from(height / 2);
        let c = i64::from(width / 2);
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        let mut cells = GrayImage::new(width, height);
        for i in 0..i64::from(height) {
            let dy = i - r;
            if dy.abs() > r {
                continue;
            }
            let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i64;
            let j1 = (c - dx).max(0);
            let j2 = (c + dx + 1).min(i64::from(width));
            for j in j1..j2 {
                cells.put_pixel(j as u32, i as u32, Luma([ON]));
            }
        }

        StructuringElement { cells }
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.cells.dimensions()
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.cells.get_pixel(x, y)[0] != OFF
    }

    /// The element as an imageproc mask, anchored at its center cell
    fn to_mask(&self) -> morph::Mask {
        let (width, height) = self.dimensions();
        // sides are capped at 511, so the anchor fits a u8
        morph::Mask::from_image(&self.cells, (width / 2) as u8, (height / 2) as u8)
    }
}

/// Keep pixels whose whole neighborhood is on. Neighbors outside the frame
/// are ignored.
pub fn erode(mask: &Mask, element: &StructuringElement, iterations: u32) -> Mask {
    let kernel = element.to_mask();
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = grayscale_erode(&out, &kernel);
    }
    out
}

/// Turn on pixels with any on neighbor
pub fn dilate(mask: &Mask, element: &StructuringElement, iterations: u32) -> Mask {
    let kernel = element.to_mask();
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = grayscale_dilate(&out, &kernel);
    }
    out
}

/// Morphological opening: erode, then dilate, `iterations` times each
pub fn denoise(mask: &Mask, element: &StructuringElement, iterations: u32) -> Mask {
    trace!(
        "opening with a {:?} element, {} iterations",
        element.dimensions(),
        iterations
    );
    let eroded = erode(mask, element, iterations);
    dilate(&eroded, element, iterations)
}
