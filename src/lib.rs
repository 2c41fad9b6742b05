mod error;
mod fonts;
mod images;
mod model;
mod pdf;
mod theme;

#[cfg(feature = "cli")]
pub mod input;

pub use error::Error;
pub use images::{ImageCodec, RasterCodec};
pub use model::{
    Client, CompanyRepresentative, DocumentContent, Equipment, EvidenceItem, Orientation,
    PLACEHOLDER, Signatures, Technician, certificate_filename, checklist_label, long_date_es,
    short_date_es,
};
pub use pdf::{Bounds, ColumnPlan, ImageOutcome, ImageSlot, PagePlan, Placed, RenderReport, Skipped};
pub use theme::{
    EvidencePolicy, LayoutTheme, Metrics, PageOrientation, PageSize, Palette, RenderOptions, Rgb,
};

use std::path::{Path, PathBuf};
use std::time::Instant;

/// A finished certificate: PDF bytes, the file name to store it under and a
/// report of what was drawn.
#[derive(Clone, Debug)]
pub struct Certificate {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub report: RenderReport,
}

pub fn generate(content: &DocumentContent, options: &RenderOptions) -> Result<Certificate, Error> {
    generate_with_codec(content, options, &RasterCodec)
}

/// Like [`generate`], with a caller-supplied image codec.
pub fn generate_with_codec(
    content: &DocumentContent,
    options: &RenderOptions,
    codec: &dyn ImageCodec,
) -> Result<Certificate, Error> {
    let t0 = Instant::now();

    let resolved = content.resolve();
    let t_resolve = t0.elapsed();

    let rendered = pdf::render(&resolved, options, codec)?;
    let t_total = t0.elapsed();

    let report = rendered.report;
    log::info!(
        "Timing: resolve={:.1}ms, render={:.1}ms, total={:.1}ms ({} pages, {} images, {} skipped, output {} bytes)",
        t_resolve.as_secs_f64() * 1000.0,
        (t_total - t_resolve).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        report.page_count,
        report.images.len(),
        report.skipped().count(),
        rendered.bytes.len(),
    );

    Ok(Certificate {
        bytes: rendered.bytes,
        filename: resolved.filename,
        report,
    })
}

/// Generate and write the certificate into `dir` under its deterministic
/// file name. Returns the written path.
pub fn generate_to_file(
    content: &DocumentContent,
    options: &RenderOptions,
    dir: &Path,
) -> Result<PathBuf, Error> {
    let t0 = Instant::now();

    let cert = generate(content, options)?;
    let t_generate = t0.elapsed();

    let path = dir.join(&cert.filename);
    std::fs::write(&path, &cert.bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: generate={:.1}ms, write={:.1}ms, total={:.1}ms ({})",
        t_generate.as_secs_f64() * 1000.0,
        (t_total - t_generate).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        path.display(),
    );

    Ok(path)
}
