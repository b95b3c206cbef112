//! Pixel classification into skin masks.
//!
//! Two strategies are available and they are deliberately kept apart: the
//! [`RangeClassifier`] is a cheap band test on a blurred half-degree HSV
//! image, the [`RuleClassifier`] evaluates an explicit per-pixel predicate on
//! raw RGB plus degree HSV. Pick one through [`Classifier`].

use crate::error::Result;
use crate::hsv::{self, HsvImage, HueDomain};
use crate::Mask;
use image::{GrayImage, ImageBuffer, Rgb, RgbImage};
use imageproc::filter::separable_filter_equal;
use log::*;
use rayon::prelude::*;

/// Mask value of a skin pixel
pub const ON: u8 = 255;
/// Mask value of a non-skin pixel
pub const OFF: u8 = 0;

/// 3-tap gaussian, the kernel a 3x3 blur with a derived sigma uses
const GAUSSIAN_3: [f32; 3] = [0.25, 0.5, 0.25];

/// Mirror an out-of-frame index back inside `0..len` without repeating the
/// edge pixel, so -1 reads 1 and `len` reads `len - 2`
fn reflect_101(i: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    let i = if i < 0 { -i } else { i };
    let i = if i >= len { 2 * len - 2 - i } else { i };
    i as u32
}

/// 3x3 gaussian blur of an 8-bit image. Sums are kept in `f32` and rounded to
/// the nearest level once, out-of-frame taps are mirrored (reflect-101).
fn gaussian_blur_3(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let (w, h) = (i64::from(width), i64::from(height));

    let padded: ImageBuffer<Rgb<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width + 2, height + 2, |x, y| {
            let src = image.get_pixel(
                reflect_101(i64::from(x) - 1, w),
                reflect_101(i64::from(y) - 1, h),
            );
            Rgb([f32::from(src[0]), f32::from(src[1]), f32::from(src[2])])
        });
    let blurred = separable_filter_equal(&padded, &GAUSSIAN_3);

    RgbImage::from_fn(width, height, |x, y| {
        let px = blurred.get_pixel(x + 1, y + 1);
        let level = |c: f32| c.round().max(0.0).min(255.0) as u8;
        Rgb([level(px[0]), level(px[1]), level(px[2])])
    })
}

/// Skin band on half-degree HSV, inclusive on both ends
#[derive(Debug, Clone, PartialEq)]
pub struct RangeClassifier {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
    /// Blur the HSV image with a 3x3 gaussian before thresholding
    pub blur: bool,
}

impl Default for RangeClassifier {
    fn default() -> RangeClassifier {
        RangeClassifier {
            lower: [0, 48, 120],
            upper: [20, 255, 255],
            blur: true,
        }
    }
}

impl RangeClassifier {
    pub const HUE_DOMAIN: HueDomain = HueDomain::Scaled180;

    pub fn classify(&self, image: &RgbImage) -> Result<Mask> {
        let hsv = hsv::to_hsv(image, Self::HUE_DOMAIN)?;
        self.classify_hsv(&hsv)
    }

    pub fn classify_hsv(&self, hsv: &HsvImage) -> Result<Mask> {
        let mut hsv = hsv.to_rgb8()?;
        if self.blur {
            trace!("blurring hsv image before thresholding");
            hsv = gaussian_blur_3(&hsv);
        }

        let (width, height) = hsv.dimensions();
        Ok(GrayImage::from_fn(width, height, |x, y| {
            if self.in_range(*hsv.get_pixel(x, y)) {
                image::Luma([ON])
            } else {
                image::Luma([OFF])
            }
        }))
    }

    #[inline]
    pub fn in_range(&self, hsv: Rgb<u8>) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

/// Which number the rule classifier reads as "saturation"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaturationSource {
    /// The raw green channel. This is what the detector has always done,
    /// even though the condition is written against HSV saturation.
    GreenChannel,
    /// Real HSV saturation, 0..=255
    Hsv,
}

/// Explicit RGB + HSV skin predicate, hue in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct RuleClassifier {
    pub saturation: SaturationSource,
}

impl Default for RuleClassifier {
    fn default() -> RuleClassifier {
        RuleClassifier {
            saturation: SaturationSource::GreenChannel,
        }
    }
}

impl RuleClassifier {
    pub const HUE_DOMAIN: HueDomain = HueDomain::Degrees360;

    pub fn classify(&self, image: &RgbImage) -> Result<Mask> {
        let hsv = hsv::to_hsv(image, Self::HUE_DOMAIN)?;

        let (width, height) = image.dimensions();
        let mut mask = GrayImage::new(width, height);

        let rgb = image.as_raw();
        let hsv = hsv.as_raw();
        let row_len = width as usize;
        let saturation = self.saturation;

        let buf: &mut [u8] = &mut mask;
        buf.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let i = (y * row_len + x) * 3;
                let px = Rgb([rgb[i], rgb[i + 1], rgb[i + 2]]);
                let hv = Rgb([hsv[i], hsv[i + 1], hsv[i + 2]]);
                *out = if classify_pixel(px, hv, saturation) {
                    ON
                } else {
                    OFF
                };
            }
        });

        Ok(mask)
    }
}

/// Evaluate the rule predicate on one pixel. `hsv` must be in degrees.
pub fn classify_pixel(rgb: Rgb<u8>, hsv: Rgb<u16>, saturation: SaturationSource) -> bool {
    let r = f32::from(rgb[0]);
    let g = f32::from(rgb[1]);
    let b = f32::from(rgb[2]);

    // bright, highlighted skin
    let rgb_cond_1 = r > 220.0
        && g > 210.0
        && b > 170.0
        && (r - g).abs() > 15.0
        && r > b
        && g > b;

    // skin under normal light
    let rgb_cond_2 = r > 95.0
        && g > 40.0
        && b > 20.0
        && (hsv::max3(r, g, b) - hsv::min3(r, g, b)) > 15.0
        && (r - g).abs() > 15.0
        && r > g
        && r > b;

    if !(rgb_cond_1 || rgb_cond_2) {
        return false;
    }

    let h = hsv[0];
    let s = match saturation {
        SaturationSource::GreenChannel => u16::from(rgb[1]),
        SaturationSource::Hsv => hsv[1],
    };
    let v = hsv[2];

    (h <= 50 || (340..=360).contains(&h)) && s > 51 && v > 89
}

/// The classification strategy a detector runs
#[derive(Debug, Clone, PartialEq)]
pub enum Classifier {
    Range(RangeClassifier),
    Rule(RuleClassifier),
}

impl Default for Classifier {
    fn default() -> Classifier {
        Classifier::Range(RangeClassifier::default())
    }
}

impl Classifier {
    /// Hue domain the strategy thresholds against
    pub fn hue_domain(&self) -> HueDomain {
        match self {
            Classifier::Range(_) => RangeClassifier::HUE_DOMAIN,
            Classifier::Rule(_) => RuleClassifier::HUE_DOMAIN,
        }
    }

    /// Build a skin mask with the same dimensions as `image`
    pub fn classify(&self, image: &RgbImage) -> Result<Mask> {
        match self {
            Classifier::Range(c) => {
                debug!("classifying with hsv range {:?}..={:?}", c.lower, c.upper);
                c.classify(image)
            }
            Classifier::Rule(c) => {
                debug!("classifying with pixel rules, saturation from {:?}", c.saturation);
                c.classify(image)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hsv::pixel_to_hsv;

    fn rule(rgb: [u8; 3], saturation: SaturationSource) -> bool {
        let rgb = Rgb(rgb);
        classify_pixel(rgb, pixel_to_hsv(rgb, HueDomain::Degrees360), saturation)
    }

    #[test]
    fn test_classify_pixel() {
        let green = SaturationSource::GreenChannel;
        assert!(rule([175, 125, 102], green));
        assert!(rule([127, 83, 58], green));
        assert!(!rule([112, 110, 89], green));
        assert!(!rule([0, 0, 255], green));
    }

    #[test]
    fn test_classify_pixel_highlight() {
        assert!(rule([240, 220, 180], SaturationSource::GreenChannel));
        // blue must stay below red
        assert!(!rule([240, 220, 240], SaturationSource::GreenChannel));
    }

    #[test]
    fn test_green_channel_stands_in_for_saturation() {
        // rgb rules pass and the hsv saturation is high, but green is only 45
        assert!(!rule([200, 45, 30], SaturationSource::GreenChannel));
        assert!(rule([200, 45, 30], SaturationSource::Hsv));
    }

    #[test]
    fn test_hue_wraparound_band() {
        // 343 degrees; in half degrees this would read 171 and fail
        let rgb = Rgb([200, 60, 100]);
        assert!(classify_pixel(
            rgb,
            pixel_to_hsv(rgb, HueDomain::Degrees360),
            SaturationSource::GreenChannel
        ));
        assert!(!classify_pixel(
            rgb,
            pixel_to_hsv(rgb, HueDomain::Scaled180),
            SaturationSource::GreenChannel
        ));
    }

    #[test]
    fn test_in_range_bounds_are_inclusive() {
        let c = RangeClassifier::default();
        assert!(c.in_range(Rgb([0, 48, 120])));
        assert!(c.in_range(Rgb([20, 255, 255])));
        assert!(!c.in_range(Rgb([21, 100, 200])));
        assert!(!c.in_range(Rgb([10, 47, 200])));
        assert!(!c.in_range(Rgb([10, 100, 119])));
    }

    /// Four columns of one color per row
    fn rows(colors: &[[u8; 3]]) -> RgbImage {
        RgbImage::from_fn(4, colors.len() as u32, |_, y| Rgb(colors[y as usize]))
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(0, 5), 0);
        assert_eq!(reflect_101(4, 5), 4);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(-1, 1), 0);
        assert_eq!(reflect_101(1, 1), 0);
    }

    #[test]
    fn test_blur_rounds_to_nearest() {
        // middle row: 0.25 * 120 + 0.5 * 119 + 0.25 * 121 = 119.75
        let blurred = gaussian_blur_3(&rows(&[[0, 0, 120], [0, 0, 119], [0, 0, 121]]));
        assert_eq!(blurred.get_pixel(2, 1)[2], 120);
        // top row mirrors row 1: 0.25 * 119 + 0.5 * 120 + 0.25 * 119 = 119.5
        assert_eq!(blurred.get_pixel(2, 0)[2], 120);
        assert_eq!(blurred.get_pixel(2, 2)[2], 120);
    }

    #[test]
    fn test_blur_mirrors_frame_edge() {
        // reflect-101 reads row 1 above row 0: 0.25 * 121 + 0.5 * 119 + 0.25 * 121
        let blurred = gaussian_blur_3(&rows(&[[0, 0, 119], [0, 0, 121]]));
        assert_eq!(blurred.get_pixel(0, 0)[2], 120);
        assert_eq!(blurred.get_pixel(3, 1)[2], 120);
    }

    #[test]
    fn test_blur_keeps_solid_image() {
        let img = RgbImage::from_pixel(5, 3, Rgb([11, 102, 200]));
        assert_eq!(gaussian_blur_3(&img), img);
    }

    #[test]
    fn test_range_value_at_band_edge() {
        // hue 11, saturation ~102, value 120 / 119 / 121
        let img = rows(&[[120, 90, 72], [119, 89, 71], [121, 91, 73]]);
        let plain = RangeClassifier {
            blur: false,
            ..RangeClassifier::default()
        };
        assert_eq!(plain.classify(&img).unwrap().get_pixel(1, 1)[0], OFF);

        let mask = RangeClassifier::default().classify(&img).unwrap();
        assert!(mask.pixels().all(|p| p[0] == ON));
    }

    #[test]
    fn test_range_value_at_frame_edge() {
        let img = rows(&[[119, 89, 71], [121, 91, 73]]);
        let plain = RangeClassifier {
            blur: false,
            ..RangeClassifier::default()
        };
        assert_eq!(plain.classify(&img).unwrap().get_pixel(0, 0)[0], OFF);

        let mask = RangeClassifier::default().classify(&img).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], ON);
        assert_eq!(mask.get_pixel(3, 1)[0], ON);
    }

    #[test]
    fn test_masks_match_input_dimensions() {
        let img = RgbImage::from_fn(37, 19, |x, y| Rgb([(x * 7) as u8, (y * 13) as u8, 90]));
        for classifier in &[
            Classifier::default(),
            Classifier::Range(RangeClassifier {
                blur: false,
                ..RangeClassifier::default()
            }),
            Classifier::Rule(RuleClassifier::default()),
        ] {
            let mask = classifier.classify(&img).unwrap();
            assert_eq!(mask.dimensions(), (37, 19));
            assert!(mask.pixels().all(|p| p[0] == ON || p[0] == OFF));
        }
    }

    #[test]
    fn test_range_solid_skin() {
        let img = RgbImage::from_pixel(8, 6, Rgb([200, 150, 120]));
        let mask = Classifier::default().classify(&img).unwrap();
        assert!(mask.pixels().all(|p| p[0] == ON));
    }

    #[test]
    fn test_rule_matches_per_pixel_predicate() {
        let img = RgbImage::from_fn(16, 9, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([175, 125, 102])
            } else {
                Rgb([112, 110, 89])
            }
        });
        let mask = RuleClassifier::default().classify(&img).unwrap();
        for (x, y, p) in mask.enumerate_pixels() {
            let expected = if (x + y) % 2 == 0 { ON } else { OFF };
            assert_eq!(p[0], expected, "x={}, y={}", x, y);
        }
    }

    #[test]
    fn test_classifier_hue_domains() {
        assert_eq!(Classifier::default().hue_domain(), HueDomain::Scaled180);
        assert_eq!(
            Classifier::Rule(RuleClassifier::default()).hue_domain(),
            HueDomain::Degrees360
        );
    }
}
