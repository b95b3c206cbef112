//! Drawing detection results onto images.

use crate::classify::OFF;
use crate::contour::Contour;
use crate::Mask;
use image::{Luma, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::region_labelling::{connected_components, Connectivity};
use log::*;
use rand::Rng;
use std::collections::HashMap;

pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const DEFAULT_THICKNESS: u32 = 2;

/// Copy `image` and draw the closed outline of every contour on the copy
pub fn outline(
    image: &RgbImage,
    contours: &[Contour],
    color: Rgb<u8>,
    thickness: u32,
) -> RgbImage {
    let mut canvas = image.clone();

    // a stroke of width t covers offsets -t/2 .. t - t/2 around the path
    let thickness = thickness.max(1) as i32;
    let lo = -(thickness / 2);
    let hi = thickness - thickness / 2;

    for contour in contours {
        let points = &contour.points;
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            for dy in lo..hi {
                for dx in lo..hi {
                    draw_line_segment_mut(
                        &mut canvas,
                        ((p.x + dx) as f32, (p.y + dy) as f32),
                        ((q.x + dx) as f32, (q.y + dy) as f32),
                        color,
                    );
                }
            }
        }
    }

    debug!("drew {} contours", contours.len());
    canvas
}

/// Paint every 8-connected region of `mask` onto `image` with its own random
/// color. Meant for eyeballing what the detector grouped together.
pub fn colorize_regions(image: &mut RgbImage, mask: &Mask) {
    if image.dimensions() != mask.dimensions() {
        warn!(
            "mask is {:?} but image is {:?}, not colorizing",
            mask.dimensions(),
            image.dimensions()
        );
        return;
    }

    let labels = connected_components(mask, Connectivity::Eight, Luma([OFF]));

    let mut rng = rand::thread_rng();
    let mut colors = HashMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }

        let color = *colors
            .entry(label)
            .or_insert_with(|| Rgb::<u8>([rng.gen(), rng.gen(), rng.gen()]));
        image.put_pixel(x, y, color);
    }

    debug!("colorized {} regions", colors.len());
}
