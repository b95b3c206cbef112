//! Rebuilding a clean mask from the kept contours, and measuring it.

use crate::classify::{OFF, ON};
use crate::contour::Contour;
use crate::error::{Error, Result};
use crate::Mask;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;
use std::collections::VecDeque;

const OUTSIDE: u8 = 1;

/// Rasterize the closed outline of `contour` onto `canvas`, whose top left
/// corner sits at `origin` in frame coordinates
fn trace_outline(canvas: &mut GrayImage, contour: &Contour, origin: (i32, i32), value: u8) {
    let points = &contour.points;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let (px, py) = (p.x - origin.0, p.y - origin.1);
        let (qx, qy) = (q.x - origin.0, q.y - origin.1);
        canvas.put_pixel(px as u32, py as u32, Luma([value]));
        draw_line_segment_mut(
            canvas,
            (px as f32, py as f32),
            (qx as f32, qy as f32),
            Luma([value]),
        );
    }
}

/// Solid fill of a single contour on a canvas covering its bounds plus a
/// one pixel margin. Returns the canvas and its origin.
fn fill_one(contour: &Contour) -> Option<(GrayImage, (i32, i32))> {
    let (min_x, min_y, max_x, max_y) = contour.bounds()?;
    let origin = (min_x - 1, min_y - 1);
    let width = (max_x - min_x + 3) as u32;
    let height = (max_y - min_y + 3) as u32;

    let mut canvas = GrayImage::new(width, height);
    trace_outline(&mut canvas, contour, origin, ON);

    // Walk the background in from the margin, 4-connected so it can't slip
    // between the diagonal steps of an 8-connected outline.
    let mut queue = VecDeque::new();
    for x in 0..width {
        queue.push_back((x, 0));
        queue.push_back((x, height - 1));
    }
    for y in 0..height {
        queue.push_back((0, y));
        queue.push_back((width - 1, y));
    }

    while let Some((x, y)) = queue.pop_front() {
        if canvas.get_pixel(x, y)[0] != OFF {
            continue;
        }
        canvas.put_pixel(x, y, Luma([OUTSIDE]));

        if x > 0 {
            queue.push_back((x - 1, y));
        }
        if y > 0 {
            queue.push_back((x, y - 1));
        }
        if x + 1 < width {
            queue.push_back((x + 1, y));
        }
        if y + 1 < height {
            queue.push_back((x, y + 1));
        }
    }

    Some((canvas, origin))
}

/// Solid fill of the contours: their outlines and everything each of them
/// encloses. Every contour is filled on its own, so background that several
/// contours only surround together stays off.
pub fn fill(width: u32, height: u32, contours: &[Contour]) -> Mask {
    let mut filled = GrayImage::new(width, height);

    for (canvas, (ox, oy)) in contours.iter().filter_map(fill_one) {
        for (x, y, px) in canvas.enumerate_pixels() {
            if px[0] == OUTSIDE {
                continue;
            }
            let (fx, fy) = (x as i32 + ox, y as i32 + oy);
            if fx >= 0 && fy >= 0 && (fx as u32) < width && (fy as u32) < height {
                filled.put_pixel(fx as u32, fy as u32, Luma([ON]));
            }
        }
    }
    filled
}

/// Fill the kept contours and intersect the result with the denoised mask.
/// Pixels that are off in `denoised` stay off, so do regions whose contour
/// didn't survive filtering.
pub fn compose(denoised: &Mask, contours: &[Contour]) -> Mask {
    let (width, height) = denoised.dimensions();
    let mut filled = fill(width, height, contours);

    for (out, src) in filled.pixels_mut().zip(denoised.pixels()) {
        if src[0] == OFF {
            *out = Luma([OFF]);
        }
    }
    filled
}

/// Number of on pixels in a mask
pub fn count_on(mask: &Mask) -> u64 {
    mask.pixels().filter(|p| p[0] != OFF).count() as u64
}

/// Share of on pixels, in percent
pub fn skin_percent(mask: &Mask) -> Result<f64> {
    let (width, height) = mask.dimensions();
    let total = u64::from(width) * u64::from(height);
    if total == 0 {
        return Err(Error::DivisionByZero);
    }

    Ok(count_on(mask) as f64 / total as f64 * 100.0)
}
