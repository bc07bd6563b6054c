//! vifq CLI - Integer VIF image quality metric
//!
//! Compare a reference image against a distorted version and report the four
//! per-scale VIF scores.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ColorChoice, Parser, ValueEnum};
use colored::Colorize;
use imgref::Img;
use serde::Serialize;
use vifq::{PictureRef, VifExtractor, VifScores};

/// Integer VIF (Visual Information Fidelity) image quality metric
///
/// Computes how much of the reference image's visual information survives in
/// the distorted image, at four spatial scales. Scores close to 1.0 mean the
/// distortion preserved nearly everything; scores near 0.0 mean heavy damage.
/// Finer scales (scale 0) react to high-frequency loss such as blur and
/// noise; coarser scales to large-structure damage.
#[derive(Parser, Debug)]
#[command(name = "vifq")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Compare two images:
        vifq original.png compressed.jpg

    Output JSON for scripting:
        vifq --json original.png compressed.jpg

    CI mode - fail if any scale drops below a threshold:
        vifq --min-score 0.95 original.png compressed.jpg

    10-bit sources (16-bit PNG input):
        vifq --bit-depth 10 master.png encode.png

EXIT CODES:
    0 - Success (scores above threshold if --min-score specified)
    1 - A score fell below the --min-score threshold
    2 - Error (file not found, invalid image, dimension mismatch, ...)")]
struct Cli {
    /// Reference image (original/source)
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Distorted image (compressed/modified)
    #[arg(value_name = "DISTORTED")]
    distorted: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output JSON (shorthand for --format json)
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Sample bit depth to score at (8, 10 or 12)
    ///
    /// With --bit-depth 10/12, 16-bit source images are rescaled to the
    /// requested depth; 8-bit sources are shifted up.
    #[arg(long, default_value = "8", value_name = "BITS")]
    bit_depth: u32,

    /// Minimum acceptable score at every scale (exit code 1 if violated)
    ///
    /// Useful for CI pipelines to enforce encode quality. Typical
    /// thresholds: 0.98 (near-lossless), 0.9 (good), 0.8 (acceptable).
    #[arg(long, value_name = "SCORE")]
    min_score: Option<f64>,

    /// Quiet mode - only output the four score numbers
    #[arg(long, short = 's')]
    quiet: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Per-scale score table
    Text,
    /// JSON with all four scores
    Json,
    /// Minimal - four score numbers, one per line
    Score,
}

#[derive(Serialize)]
struct JsonOutput {
    reference: String,
    distorted: String,
    width: usize,
    height: usize,
    bit_depth: u32,
    scores: JsonScores,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_violated: Option<bool>,
}

#[derive(Serialize)]
struct JsonScores {
    scale0: f64,
    scale1: f64,
    scale2: f64,
    scale3: f64,
}

/// Single-plane image at the scoring depth.
enum LumaImage {
    L8(Vec<u8>, usize, usize),
    L16(Vec<u16>, usize, usize),
}

impl LumaImage {
    fn dimensions(&self) -> (usize, usize) {
        match self {
            Self::L8(_, w, h) | Self::L16(_, w, h) => (*w, *h),
        }
    }

    fn as_picture(&self) -> PictureRef<'_> {
        match self {
            Self::L8(data, w, h) => PictureRef::Luma8(Img::new(&data[..], *w, *h)),
            Self::L16(data, w, h) => PictureRef::Luma16(Img::new(&data[..], *w, *h)),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_colors(&cli);

    match run(&cli) {
        Ok(exit) => exit,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, String> {
    if !matches!(cli.bit_depth, 8 | 10 | 12) {
        return Err(format!(
            "unsupported bit depth {} (expected 8, 10 or 12)",
            cli.bit_depth
        ));
    }

    let reference = load_luma(&cli.reference, cli.bit_depth)?;
    let distorted = load_luma(&cli.distorted, cli.bit_depth)?;

    let (w, h) = reference.dimensions();
    let (dw, dh) = distorted.dimensions();
    if (w, h) != (dw, dh) {
        return Err(format!("dimension mismatch: {w}x{h} vs {dw}x{dh}"));
    }

    let mut extractor = VifExtractor::new(cli.bit_depth, w, h)
        .map_err(|e| format!("failed to set up extractor: {e}"))?;
    let scores = extractor
        .scores(reference.as_picture(), distorted.as_picture())
        .map_err(|e| format!("extraction failed: {e}"))?;

    let violated = cli
        .min_score
        .map(|min| scores.ratios().iter().any(|&r| r < min));

    output_result(cli, &scores, w, h, violated)?;

    Ok(if violated == Some(true) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn load_luma(path: &Path, bit_depth: u32) -> Result<LumaImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("failed to load '{}': {}", path.display(), e))?;

    if bit_depth == 8 {
        let luma = img.to_luma8();
        let (w, h) = (luma.width() as usize, luma.height() as usize);
        Ok(LumaImage::L8(luma.into_raw(), w, h))
    } else {
        // Decode at 16 bits and rescale down to the scoring depth.
        let luma = img.to_luma16();
        let (w, h) = (luma.width() as usize, luma.height() as usize);
        let shift = 16 - bit_depth;
        let data = luma.into_raw().iter().map(|&v| v >> shift).collect();
        Ok(LumaImage::L16(data, w, h))
    }
}

fn score_color(r: f64) -> colored::Color {
    use colored::Color;
    if r >= 0.95 {
        Color::Green
    } else if r >= 0.8 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn output_result(
    cli: &Cli,
    scores: &VifScores,
    width: usize,
    height: usize,
    violated: Option<bool>,
) -> Result<(), String> {
    let format = if cli.json {
        OutputFormat::Json
    } else if cli.quiet {
        OutputFormat::Score
    } else {
        cli.format
    };
    let ratios = scores.ratios();

    match format {
        OutputFormat::Score => {
            for r in ratios {
                println!("{r:.6}");
            }
        }
        OutputFormat::Text => {
            for (scale, r) in ratios.iter().enumerate() {
                let line = format!("{r:.6}");
                println!("VIF scale {scale}: {}", line.color(score_color(*r)));
            }
            if let Some(min) = cli.min_score {
                if violated == Some(true) {
                    println!(
                        "{}",
                        format!("Threshold violated: a scale scored below {min}")
                            .red()
                            .bold()
                    );
                } else {
                    println!("{}", format!("All scales at or above {min}").green());
                }
            }
        }
        OutputFormat::Json => {
            let output = JsonOutput {
                reference: cli.reference.display().to_string(),
                distorted: cli.distorted.display().to_string(),
                width,
                height,
                bit_depth: cli.bit_depth,
                scores: JsonScores {
                    scale0: ratios[0],
                    scale1: ratios[1],
                    scale2: ratios[2],
                    scale3: ratios[3],
                },
                threshold_violated: violated,
            };
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| format!("failed to serialize JSON: {e}"))?;
            println!("{json}");
        }
    }

    Ok(())
}
