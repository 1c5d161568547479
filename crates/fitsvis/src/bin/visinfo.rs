use std::process;

use fitsvis::codec::{decode, gunzip, is_gzipped};
use fitsvis::histogram::Histogram;
use fitsvis::image::FitsImage;
use fitsvis::pipeline::{ByteSource, FileSource, ReadLimits};
use fitsvis::wcs::WcsRepresentation;

fn describe_representation(image: &FitsImage) -> &'static str {
    match image.wcs().representation {
        Some(WcsRepresentation::Classic { .. }) => "CDELT/CROTA2",
        Some(WcsRepresentation::CdMatrix { aips_style: false, .. }) => "CD matrix",
        Some(WcsRepresentation::CdMatrix { aips_style: true, .. }) => "CD matrix (AIPS keys)",
        Some(WcsRepresentation::PcMatrix { .. }) => "PC matrix",
        Some(WcsRepresentation::Plate(_)) => "plate solution",
        None => "none",
    }
}

fn format_plane(index: usize, image: &FitsImage) -> String {
    let mini = image.mini();
    let mut out = String::new();
    out.push_str(&format!("Plane {}\n", index));
    out.push_str(&format!("  BITPIX: {}\n", mini.bitpix));
    out.push_str(&format!(
        "  Dimensions: {} x {}\n",
        image.width(),
        image.height()
    ));
    if mini.bscale != 1.0 || mini.bzero != 0.0 {
        out.push_str(&format!(
            "  Calibration: bscale={} bzero={}\n",
            mini.bscale, mini.bzero
        ));
    }
    if let Some(blank) = mini.blank {
        out.push_str(&format!("  Blank value: {}\n", blank));
    }
    if let Some(units) = image.flux_units() {
        out.push_str(&format!("  Flux units: {}\n", units));
    }
    out.push_str(&format!("  WCS: {}\n", describe_representation(image)));

    let hist = Histogram::build(image.pixels(), None, None, mini.blank);
    out.push_str(&format!(
        "  Samples: {} good, {:?} past bounds\n",
        hist.good_pix(),
        hist.tail_counts()
    ));
    out.push_str(&format!(
        "  Range: [{}, {}]\n",
        hist.data_min(),
        hist.data_max()
    ));
    out.push_str(&format!(
        "  Percentiles: 1%={} 50%={} 99%={}\n",
        hist.get_pct(1.0, false),
        hist.get_pct(50.0, false),
        hist.get_pct(99.0, false)
    ));
    out
}

fn run(path: &str) -> Result<String, fitsvis::Error> {
    let bytes = FileSource::new(path, ReadLimits::default()).fetch()?;
    let bytes = if is_gzipped(&bytes) {
        gunzip(&bytes)?
    } else {
        bytes
    };
    let images = decode(&bytes)?;

    let mut report = format!("{}: {} image plane(s)\n", path, images.len());
    for (i, image) in images.iter().enumerate() {
        report.push_str(&format_plane(i, image));
    }
    Ok(report)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: visinfo <file.fits[.gz]>");
        process::exit(2);
    }

    match run(&args[1]) {
        Ok(report) => print!("{report}"),
        Err(e) => {
            eprintln!("visinfo: {e}");
            process::exit(1);
        }
    }
}
