//! RGB to HSV conversion with an explicit hue domain.
//!
//! The two classifiers disagree on what a hue value means: the range
//! classifier thresholds 8-bit half-degree hues (0..=180), the rule classifier
//! compares plain degrees (0..360). Every [`HsvImage`] carries the domain it
//! was built in so the two can't be mixed up.

use crate::error::{Error, Result};
use image::{ImageBuffer, Rgb, RgbImage};

/// How hue is encoded in an [`HsvImage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HueDomain {
    /// Half degrees, 0..=180, fits a byte
    Scaled180,
    /// Degrees, 0..360
    Degrees360,
}

impl HueDomain {
    /// Exclusive upper bound of the hue channel
    #[inline]
    pub fn max_hue(self) -> u16 {
        match self {
            HueDomain::Scaled180 => 180,
            HueDomain::Degrees360 => 360,
        }
    }
}

/// An image in HSV space. Saturation and value are always 0..=255.
#[derive(Debug, Clone)]
pub struct HsvImage {
    domain: HueDomain,
    pixels: ImageBuffer<Rgb<u16>, Vec<u16>>,
}

impl HsvImage {
    #[inline]
    pub fn domain(&self) -> HueDomain {
        self.domain
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// `(hue, saturation, value)` at `(x, y)`
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> (u16, u16, u16) {
        let px = self.pixels.get_pixel(x, y);
        (px[0], px[1], px[2])
    }

    /// Raw channel data, three values per pixel in row-major order
    #[inline]
    pub fn as_raw(&self) -> &[u16] {
        self.pixels.as_raw()
    }

    /// Narrow a `Scaled180` image to bytes so it can go through 8-bit filters
    pub fn to_rgb8(&self) -> Result<RgbImage> {
        if self.domain != HueDomain::Scaled180 {
            return Err(Error::invalid_image(
                "only half-degree hsv images fit in 8 bits",
            ));
        }
        let (width, height) = self.dimensions();
        Ok(RgbImage::from_fn(width, height, |x, y| {
            let px = self.pixels.get_pixel(x, y);
            Rgb([px[0] as u8, px[1] as u8, px[2] as u8])
        }))
    }
}

#[inline]
pub(crate) fn max3(r: f32, g: f32, b: f32) -> f32 {
    r.max(g).max(b)
}

#[inline]
pub(crate) fn min3(r: f32, g: f32, b: f32) -> f32 {
    r.min(g).min(b)
}

/// Hue in degrees, saturation and value both scaled to 0..=255
fn hsv_degrees(rgb: Rgb<u8>) -> (f32, f32, f32) {
    let r = f32::from(rgb[0]);
    let g = f32::from(rgb[1]);
    let b = f32::from(rgb[2]);

    let v = max3(r, g, b);
    let dif = v - min3(r, g, b);

    let s = if v == 0.0 { 0.0 } else { 255.0 * dif / v };

    if dif == 0.0 {
        return (0.0, s, v);
    }

    let mut h = if v == r {
        60.0 * (g - b) / dif
    } else if v == g {
        120.0 + 60.0 * (b - r) / dif
    } else {
        240.0 + 60.0 * (r - g) / dif
    };

    if h < 0.0 {
        h += 360.0;
    }

    (h, s, v)
}

/// Convert a single pixel
pub fn pixel_to_hsv(rgb: Rgb<u8>, domain: HueDomain) -> Rgb<u16> {
    let (h, s, v) = hsv_degrees(rgb);

    let h = match domain {
        HueDomain::Scaled180 => (h / 2.0).round() as u16,
        HueDomain::Degrees360 => h.round() as u16,
    };
    let h = if h >= domain.max_hue() { 0 } else { h };

    Rgb([h, s.round() as u16, v as u16])
}

/// Convert an image into HSV, encoding hue in `domain`
pub fn to_hsv(image: &RgbImage, domain: HueDomain) -> Result<HsvImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::invalid_image(format!(
            "degenerate dimensions {}x{}",
            width, height
        )));
    }

    let pixels = ImageBuffer::from_fn(width, height, |x, y| {
        pixel_to_hsv(*image.get_pixel(x, y), domain)
    });

    Ok(HsvImage { domain, pixels })
}
