//! ```rust,no_run
//! let img = image::open("photo.jpg").expect("failed to open");
//! let detection = skinmask::scan(&img).expect("failed to scan");
//! println!("skin={:.2}%", detection.skin_percent);
//! detection.annotated.save("annotated.jpg").expect("failed to save");
//! ```

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use log::*;

pub mod annotate;
pub mod batch;
pub mod classify;
pub mod composite;
pub mod contour;
pub mod error;
pub mod hsv;
pub mod morphology;

pub use crate::classify::{Classifier, RangeClassifier, RuleClassifier, SaturationSource};
pub use crate::contour::{ChainApprox, Contour};
pub use crate::error::{Error, Result};
pub use crate::hsv::{HsvImage, HueDomain};
pub use crate::morphology::StructuringElement;

/// Binary skin mask, 255 for skin and 0 for everything else
pub type Mask = GrayImage;

/// Tunables of the per-image pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub classifier: Classifier,
    /// Structuring element of the denoising opening
    pub element: StructuringElement,
    /// Erosions, then as many dilations
    pub iterations: u32,
    /// Contours must enclose strictly more than this
    pub min_area: f64,
    pub approx: ChainApprox,
    pub outline_color: Rgb<u8>,
    pub outline_thickness: u32,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            classifier: Classifier::default(),
            element: StructuringElement::default(),
            iterations: 1,
            min_area: contour::DEFAULT_MIN_AREA,
            approx: ChainApprox::default(),
            outline_color: annotate::GREEN,
            outline_thickness: annotate::DEFAULT_THICKNESS,
        }
    }
}

impl Config {
    pub fn with_classifier(mut self, classifier: Classifier) -> Config {
        self.classifier = classifier;
        self
    }

    pub fn with_element(mut self, element: StructuringElement, iterations: u32) -> Config {
        self.element = element;
        self.iterations = iterations;
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Config {
        self.min_area = min_area;
        self
    }
}

/// The result of running the detector on one image
#[derive(Debug, Clone)]
pub struct Detection {
    /// Copy of the input with the kept regions outlined
    pub annotated: RgbImage,
    /// Denoised mask restricted to the kept regions
    pub mask: Mask,
    /// Outlines of the kept regions, in discovery order
    pub contours: Vec<Contour>,
    /// Percentage of the image covered by `mask`
    pub skin_percent: f64,
    /// Percentage straight out of the classifier, before any cleanup
    pub raw_skin_percent: f64,
}

impl Detection {
    /// Paint every kept region with a random color, for debugging
    pub fn colorize_regions(&self, img: &mut RgbImage) {
        annotate::colorize_regions(img, &self.mask);
    }
}

/// Runs classification, denoising, contour filtering and annotation
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: Config,
}

impl Detector {
    pub fn new(config: Config) -> Detector {
        Detector { config }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn detect(&self, image: &RgbImage) -> Result<Detection> {
        let config = &self.config;
        let (width, height) = image.dimensions();
        debug!("detecting skin in {}x{} image", width, height);

        let raw = config.classifier.classify(image)?;
        let raw_skin_percent = composite::skin_percent(&raw)?;
        debug!("classifier marked {}% as skin", raw_skin_percent);

        let denoised = morphology::denoise(&raw, &config.element, config.iterations);

        let contours = contour::find_external(&denoised, config.approx);
        let contours = contour::filter_by_area(contours, config.min_area);

        let mask = composite::compose(&denoised, &contours);
        let skin_percent = composite::skin_percent(&mask)?;
        debug!("total skin percent is {}%", skin_percent);

        let annotated = annotate::outline(
            image,
            &contours,
            config.outline_color,
            config.outline_thickness,
        );

        Ok(Detection {
            annotated,
            mask,
            contours,
            skin_percent,
            raw_skin_percent,
        })
    }
}

/// Scan an image for skin regions with the default configuration
pub fn scan(image: &DynamicImage) -> Result<Detection> {
    Detector::default().detect(&image.to_rgb8())
}
