use std::process;

use fitsvis::colortable;
use fitsvis::pipeline::{CropBox, CropRequest, Pipeline, PipelineRequest, ReadLimits};
use fitsvis::stretch::{render_indexed, RangeValues, ScaleKind, StretchBound};
use fitsvis::transform::decimate;

struct Options {
    input: String,
    output: String,
    flip: bool,
    crop: Option<(i64, i64, i64, i64)>,
    decimate: usize,
    table: usize,
    scale: ScaleKind,
    percent: (f64, f64),
}

fn usage() -> ! {
    eprintln!(
        "Usage: visrender [--flip] [--crop X1 Y1 X2 Y2] [--decimate N] \
         [--table ID] [--scale linear|log|loglog|equal|sqrt|squared] \
         [--pct LOW HIGH] <input.fits[.gz]> <output.ppm>"
    );
    process::exit(2);
}

fn parse_scale(name: &str) -> Option<ScaleKind> {
    match name {
        "linear" => Some(ScaleKind::Linear),
        "log" => Some(ScaleKind::Log),
        "loglog" => Some(ScaleKind::LogLog),
        "equal" => Some(ScaleKind::Equal),
        "sqrt" => Some(ScaleKind::Sqrt),
        "squared" => Some(ScaleKind::Squared),
        _ => None,
    }
}

fn parse_args() -> Options {
    let mut opts = Options {
        input: String::new(),
        output: String::new(),
        flip: false,
        crop: None,
        decimate: 1,
        table: colortable::GRAY,
        scale: ScaleKind::Linear,
        percent: (1.0, 99.0),
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut positional = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--flip" => opts.flip = true,
            "--crop" => {
                if i + 4 >= args.len() {
                    usage();
                }
                let mut corner = [0i64; 4];
                for (k, c) in corner.iter_mut().enumerate() {
                    *c = args[i + 1 + k].parse().unwrap_or_else(|_| usage());
                }
                opts.crop = Some((corner[0], corner[1], corner[2], corner[3]));
                i += 4;
            }
            "--decimate" => {
                if i + 1 >= args.len() {
                    usage();
                }
                opts.decimate = args[i + 1].parse().unwrap_or_else(|_| usage());
                i += 1;
            }
            "--table" => {
                if i + 1 >= args.len() {
                    usage();
                }
                opts.table = args[i + 1].parse().unwrap_or_else(|_| usage());
                i += 1;
            }
            "--scale" => {
                if i + 1 >= args.len() {
                    usage();
                }
                opts.scale = parse_scale(&args[i + 1]).unwrap_or_else(|| usage());
                i += 1;
            }
            "--pct" => {
                if i + 2 >= args.len() {
                    usage();
                }
                let lo = args[i + 1].parse().unwrap_or_else(|_| usage());
                let hi = args[i + 2].parse().unwrap_or_else(|_| usage());
                opts.percent = (lo, hi);
                i += 2;
            }
            other if other.starts_with("--") => usage(),
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    if positional.len() != 2 {
        usage();
    }
    opts.input = positional.remove(0);
    opts.output = positional.remove(0);
    opts
}

fn run(opts: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let request = PipelineRequest {
        flip: opts.flip,
        rotate: None,
        crop: opts.crop.map(|(min_x, min_y, max_x, max_y)| {
            CropRequest::Box(CropBox::Pixels {
                min_x,
                min_y,
                max_x,
                max_y,
            })
        }),
    };

    let outcome = Pipeline::new().run_file(&opts.input, ReadLimits::default(), &request)?;
    let mut image = outcome.images.into_iter().next().expect("decode yields at least one plane");
    if opts.decimate > 1 {
        image = decimate(&image, opts.decimate)?;
    }

    let range = RangeValues::new(
        StretchBound::Percent(opts.percent.0),
        StretchBound::Percent(opts.percent.1),
        opts.scale,
    );
    let raster = render_indexed(&image, &range, opts.table)?;
    let rgb = raster.to_rgb_bytes()?;

    let mut ppm = format!("P6\n{} {}\n255\n", raster.width(), raster.height()).into_bytes();
    ppm.extend_from_slice(&rgb);
    std::fs::write(&opts.output, ppm)?;
    Ok(())
}

fn main() {
    let opts = parse_args();
    if let Err(e) = run(&opts) {
        eprintln!("visrender: {e}");
        process::exit(1);
    }
}
