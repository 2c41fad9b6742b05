//! # certpdf
//!
//! Render a maintenance certificate from a JSON manifest.
//!
//! ```bash
//! # Writes <certificateCode>.pdf into the current directory
//! certpdf visit.json
//!
//! # Explicit output, 3 x 3 photo grid, no image downsampling
//! certpdf visit.json -o out/cert.pdf --policy uniform --no-preprocess
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use certpdf::{Error, EvidencePolicy, RenderOptions, input};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    /// Portraits four per row, then landscapes two per row
    Grouped,
    /// 2 x 3 grid
    Dense,
    /// 3 x 3 grid
    Uniform,
}

impl From<Policy> for EvidencePolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::Grouped => EvidencePolicy::Grouped,
            Policy::Dense => EvidencePolicy::Dense,
            Policy::Uniform => EvidencePolicy::Uniform,
        }
    }
}

/// Render a maintenance certificate PDF from a JSON manifest
#[derive(Parser, Debug)]
#[command(name = "certpdf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Manifest describing the certificate
    manifest: PathBuf,

    /// Output file (defaults to the certificate's own file name)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Photo appendix layout
    #[arg(long, value_enum, default_value = "grouped")]
    policy: Policy,

    /// Longest image edge in pixels before downsampling
    #[arg(long, default_value = "1400")]
    max_edge: u32,

    /// JPEG quality for downsampled images (1-100)
    #[arg(long, default_value = "82", value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Embed images exactly as given
    #[arg(long)]
    no_preprocess: bool,

    /// Log layout decisions
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let content = input::load_manifest(&cli.manifest)?;
    let options = RenderOptions {
        evidence_policy: cli.policy.into(),
        preprocess_images: !cli.no_preprocess,
        max_long_edge: cli.max_edge,
        jpeg_quality: cli.quality,
        ..RenderOptions::default()
    };

    let cert = certpdf::generate(&content, &options)?;
    let output = cli.output.unwrap_or_else(|| PathBuf::from(&cert.filename));
    std::fs::write(&output, &cert.bytes)?;

    for skipped in cert.report.skipped() {
        if let Err(s) = &skipped.result {
            log::warn!("{:?}: {}", skipped.slot, s.reason);
        }
    }
    println!(
        "{} ({} pages, {} bytes)",
        output.display(),
        cert.report.page_count,
        cert.bytes.len()
    );
    Ok(())
}
