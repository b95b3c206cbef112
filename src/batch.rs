//! Running the detector over a directory of photographs.
//!
//! Everything is checked before the first image is classified: the source
//! must hold at least one image, every image must decode and, when a size is
//! configured, every image must have exactly that size. Only then is the
//! output directory recreated and the batch processed.

use crate::error::{Error, Result};
use crate::{Config, Detection, Detector};
use image::RgbImage;
use log::*;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Where to read, where to write and how to detect
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Lowercase file extensions, without the dot
    pub extensions: Vec<String>,
    /// Every image must be exactly `(width, height)` when set
    pub expected_size: Option<(u32, u32)>,
    /// Paint kept regions with random colors instead of outlining them
    pub colorize: bool,
    pub detector: Config,
}

impl Default for BatchConfig {
    fn default() -> BatchConfig {
        BatchConfig {
            source: PathBuf::from("assets/img/contribs"),
            output: PathBuf::from("out/detected-skins"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            expected_size: Some((800, 450)),
            colorize: false,
            detector: Config::default(),
        }
    }
}

/// A decoded image and where it came from
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub image: RgbImage,
}

/// Outcome for one image of the batch
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub index: usize,
    pub source: PathBuf,
    pub output: PathBuf,
    pub skin_percent: f64,
    pub raw_skin_percent: f64,
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}

/// All files below `dir` with one of `extensions`, sorted by path
pub fn find_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound {
            dir: dir.to_path_buf(),
        });
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            Error::io(path, err.into())
        })?;

        let path = entry.path();
        if entry.file_type().is_file() && has_extension(path, extensions) {
            trace!("found image {:?}", path);
            images.push(path.to_path_buf());
        }
    }

    if images.is_empty() {
        return Err(Error::SourceEmpty {
            dir: dir.to_path_buf(),
        });
    }

    images.sort();
    info!("found {} images in {:?}", images.len(), dir);
    Ok(images)
}

/// Decode every path, failing on the first one that doesn't decode
pub fn load_images(paths: &[PathBuf]) -> Result<Vec<SourceImage>> {
    paths
        .par_iter()
        .map(|path| -> Result<SourceImage> {
            debug!("decoding {:?}", path);
            let image = image::open(path).map_err(|cause| Error::Decode {
                path: path.clone(),
                cause,
            })?;
            Ok(SourceImage {
                path: path.clone(),
                image: image.to_rgb8(),
            })
        })
        .collect()
}

/// Make sure every image is exactly `expected` (width, height)
pub fn validate_dimensions(expected: (u32, u32), images: &[SourceImage]) -> Result<()> {
    let (expected_width, expected_height) = expected;
    for img in images {
        let (actual_width, actual_height) = img.image.dimensions();
        if (actual_width, actual_height) != expected {
            return Err(Error::InvalidDimensions {
                path: img.path.clone(),
                expected_width,
                expected_height,
                actual_width,
                actual_height,
            });
        }
    }
    Ok(())
}

/// Remove `dir` if it exists and create it again, empty
pub fn prepare_output(dir: &Path) -> Result<()> {
    if dir.exists() {
        debug!("removing previous output {:?}", dir);
        fs::remove_dir_all(dir).map_err(|err| Error::io(dir, err))?;
    }
    fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))
}

/// `p<percent>-<index>.jpg`, percent with two decimals, index padded to four digits
pub fn output_filename(percent: f64, index: usize) -> String {
    format!("p{:.2}-{:04}.jpg", percent, index)
}

/// Write an annotated image into `dir` and return its path
pub fn save(dir: &Path, percent: f64, index: usize, image: &RgbImage) -> Result<PathBuf> {
    let path = dir.join(output_filename(percent, index));
    image.save(&path).map_err(|cause| Error::Image {
        path: path.clone(),
        cause,
    })?;
    Ok(path)
}

/// Run the detector on every image of the source directory
pub fn run(config: &BatchConfig) -> Result<Vec<Report>> {
    let paths = find_images(&config.source, &config.extensions)?;
    let images = load_images(&paths)?;

    if let Some(expected) = config.expected_size {
        validate_dimensions(expected, &images)?;
    }

    prepare_output(&config.output)?;

    let detector = Detector::new(config.detector.clone());
    let detections = images
        .par_iter()
        .map(|img| detector.detect(&img.image))
        .collect::<Result<Vec<Detection>>>()?;

    let mut reports = Vec::with_capacity(images.len());
    for (index, (img, detection)) in images.iter().zip(detections).enumerate() {
        let annotated = if config.colorize {
            let mut canvas = img.image.clone();
            detection.colorize_regions(&mut canvas);
            canvas
        } else {
            detection.annotated
        };

        let output = save(&config.output, detection.skin_percent, index, &annotated)?;
        info!(
            "{:?}: skin={:.2}% -> {:?}",
            img.path, detection.skin_percent, output
        );

        reports.push(Report {
            index,
            source: img.path.clone(),
            output,
            skin_percent: detection.skin_percent,
            raw_skin_percent: detection.raw_skin_percent,
        });
    }

    Ok(reports)
}
