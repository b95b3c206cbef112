use clap::{Parser, ValueEnum};
use log::*;
use skinmask::batch::{self, BatchConfig};
use skinmask::morphology::MAX_ELEMENT_SIZE;
use skinmask::{
    Classifier, Config, RangeClassifier, RuleClassifier, SaturationSource, StructuringElement,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Threshold a blurred HSV image against a fixed band
    Range,
    /// Evaluate the explicit RGB + HSV pixel rules
    Rule,
}

#[derive(Parser)]
#[command(name = "skinmask")]
#[command(about = "Outline skin regions in a directory of photographs")]
struct Cli {
    /// Directory to search for images, recursively
    #[arg(value_name = "SOURCE", default_value = "assets/img/contribs")]
    source: PathBuf,

    /// Output directory, removed and recreated on every run
    #[arg(short, long, value_name = "DIR", default_value = "out/detected-skins")]
    out: PathBuf,

    #[arg(short, long, value_enum, default_value = "range")]
    classifier: Strategy,

    /// Skip the gaussian blur of the range classifier
    #[arg(long)]
    no_blur: bool,

    /// Read real HSV saturation in the rule classifier instead of the green channel
    #[arg(long)]
    hsv_saturation: bool,

    /// Keep regions enclosing strictly more than this area
    #[arg(long, default_value_t = skinmask::contour::DEFAULT_MIN_AREA)]
    min_area: f64,

    /// Required image size
    #[arg(long, value_name = "WxH", default_value = "800x450", value_parser = parse_size)]
    size: (u32, u32),

    /// Accept images of any size
    #[arg(long, conflicts_with = "size")]
    any_size: bool,

    /// Size of the elliptical denoising kernel
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_ELEMENT_SIZE))
    )]
    kernel: u32,

    /// Erosion and dilation passes
    #[arg(long, default_value_t = 1)]
    iterations: u32,

    /// Image file extensions to pick up
    #[arg(
        long = "ext",
        value_name = "EXT",
        default_values_t = vec!["jpg".to_string(), "png".to_string()]
    )]
    extensions: Vec<String>,

    /// Paint each kept region with a random color instead of outlining it
    #[arg(long)]
    colorize: bool,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let mut parts = s.splitn(2, |c: char| c == 'x' || c == 'X');
    let width = parts.next().and_then(|w| w.trim().parse().ok());
    let height = parts.next().and_then(|h| h.trim().parse().ok());
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(format!("expected WIDTHxHEIGHT, got {:?}", s)),
    }
}

impl Cli {
    fn classifier(&self) -> Classifier {
        match self.classifier {
            Strategy::Range => Classifier::Range(RangeClassifier {
                blur: !self.no_blur,
                ..RangeClassifier::default()
            }),
            Strategy::Rule => Classifier::Rule(RuleClassifier {
                saturation: if self.hsv_saturation {
                    SaturationSource::Hsv
                } else {
                    SaturationSource::GreenChannel
                },
            }),
        }
    }

    fn into_config(self) -> BatchConfig {
        let detector = Config::default()
            .with_classifier(self.classifier())
            .with_element(
                StructuringElement::ellipse(self.kernel, self.kernel),
                self.iterations,
            )
            .with_min_area(self.min_area);

        BatchConfig {
            source: self.source,
            output: self.out,
            extensions: self.extensions.iter().map(|e| e.to_lowercase()).collect(),
            expected_size: if self.any_size { None } else { Some(self.size) },
            colorize: self.colorize,
            detector,
        }
    }
}

fn main() -> Result<(), failure::Error> {
    env_logger::init();

    let config = Cli::parse().into_config();
    debug!("config: {:?}", config);

    let reports = batch::run(&config)?;
    for report in &reports {
        println!(
            "{:.2}%\t{}\t{}",
            report.skin_percent,
            report.source.display(),
            report.output.display()
        );
    }
    info!("processed {} images", reports.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("800x450"), Ok((800, 450)));
        assert_eq!(parse_size("640X480"), Ok((640, 480)));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let config = Cli::parse_from(&["skinmask"]).into_config();
        assert_eq!(config.source, PathBuf::from("assets/img/contribs"));
        assert_eq!(config.output, PathBuf::from("out/detected-skins"));
        assert_eq!(config.expected_size, Some((800, 450)));
        assert_eq!(config.extensions, vec!["jpg", "png"]);
        assert_eq!(config.detector, Config::default());
    }

    #[test]
    fn test_cli_rule_classifier() {
        let config = Cli::parse_from(&[
            "skinmask",
            "photos",
            "--classifier",
            "rule",
            "--hsv-saturation",
            "--any-size",
            "--ext",
            "JPG",
        ])
        .into_config();
        assert_eq!(config.source, PathBuf::from("photos"));
        assert_eq!(config.expected_size, None);
        assert_eq!(config.extensions, vec!["jpg"]);
        assert_eq!(
            config.detector.classifier,
            Classifier::Rule(RuleClassifier {
                saturation: SaturationSource::Hsv
            })
        );
    }

    #[test]
    fn test_cli_kernel_bounds() {
        let config =
            Cli::parse_from(&["skinmask", "--kernel", "5", "--iterations", "2"]).into_config();
        assert_eq!(config.detector.element, StructuringElement::ellipse(5, 5));
        assert_eq!(config.detector.iterations, 2);

        assert!(Cli::try_parse_from(&["skinmask", "--kernel", "511"]).is_ok());
        assert!(Cli::try_parse_from(&["skinmask", "--kernel", "70000"]).is_err());
        assert!(Cli::try_parse_from(&["skinmask", "--kernel", "0"]).is_err());
    }
}
