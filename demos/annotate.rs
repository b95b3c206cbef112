#[macro_use]
extern crate log;

use image::GenericImageView;
use std::env;

fn main() {
    env_logger::init();

    let path = env::args().nth(1).expect("argv[1]");

    let img = image::open(path).expect("failed to open");
    info!("dimensions {:?}", img.dimensions());

    let detection = skinmask::scan(&img).expect("failed to scan");
    detection.annotated.save("output.jpg").expect("failed to save");

    let mut colorized = img.to_rgb8();
    detection.colorize_regions(&mut colorized);
    colorized.save("regions.jpg").expect("failed to save");
}
