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
    println!(
        "skin={:.2}% raw={:.2}% regions={}",
        detection.skin_percent,
        detection.raw_skin_percent,
        detection.contours.len()
    );
}
