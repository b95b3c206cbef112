use skinmask::{Classifier, Config, Detector, RuleClassifier};
use std::env;
use std::time::Instant;

fn main() {
    env_logger::init();

    let imgs = env::args()
        .skip(1)
        .map(|path| image::open(path).map(|img| img.to_rgb8()))
        .collect::<Result<Vec<_>, _>>()
        .expect("Failed to load images");

    let rule = Config::default().with_classifier(Classifier::Rule(RuleClassifier::default()));
    let detectors = vec![
        ("range", Detector::default()),
        ("rule", Detector::new(rule)),
    ];

    for (name, detector) in detectors {
        let start = Instant::now();

        for img in &imgs {
            for _ in 0..10 {
                let _ = detector.detect(img);
            }
        }

        let elapsed = start.elapsed();
        println!("{}: {}ms ({}s)", name, elapsed.as_millis(), elapsed.as_secs());
    }
}
