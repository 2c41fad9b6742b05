mod chrome;
mod components;
mod evidence;
mod header_footer;
mod layout;
mod surface;

use std::borrow::Cow;

use crate::error::Error;
use crate::images::{ImageCodec, Limits, Prepared, preprocess};
use crate::model::{Orientation, ResolvedContent, short_date_es};
use crate::theme::RenderOptions;

use components::SignatureCell;
use evidence::EvidenceImage;
use header_footer::Chrome;
use layout::{ColumnBounds, Field};

pub use evidence::PagePlan;
pub use layout::ColumnPlan;
pub use surface::{Bounds, Placed, Skipped};

pub(crate) const CLIENT_SECTION: &str = "INFORMACIÓN DEL CLIENTE";
pub(crate) const EQUIPMENT_SECTION: &str = "EQUIPOS INSTALADOS";
pub(crate) const CHECKLIST_SECTION: &str = "VERIFICACIÓN REALIZADA";
pub(crate) const REQUESTS_SECTION: &str = "SOLICITUDES DEL CLIENTE";
pub(crate) const OBSERVATIONS_SECTION: &str = "OBSERVACIONES Y RECOMENDACIONES";
pub(crate) const EVIDENCE_SECTION: &str = evidence::SECTION_TITLE;

/// Starting widths of the client-info rows; the address gets the widest column.
const CLIENT_START: [f32; 3] = [0.30, 0.30, 0.40];
const CLIENT_MIN: [f32; 3] = [0.28, 0.28, 0.36];
const CLIENT_MAX: [f32; 3] = [0.46, 0.36, 0.56];

/// Where an image was meant to go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageSlot {
    /// Header logo on the given 1-based page.
    Logo { page: usize },
    TechnicianSignature,
    RepresentativeSignature,
    /// Evidence item `index` (input order) on the given 1-based page.
    Evidence { index: usize, page: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageOutcome {
    pub slot: ImageSlot,
    pub result: Result<Placed, Skipped>,
}

/// What went into the document. Skipped images are listed here rather than
/// failing the render.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    pub page_count: usize,
    /// Section titles in drawing order; the evidence title repeats per page.
    pub sections: Vec<&'static str>,
    pub images: Vec<ImageOutcome>,
    /// Column widths the client-info block settled on.
    pub client_columns: ColumnPlan,
    pub evidence_pages: Vec<PagePlan>,
}

impl RenderReport {
    pub fn skipped(&self) -> impl Iterator<Item = &ImageOutcome> {
        self.images.iter().filter(|o| o.result.is_err())
    }
}

pub(crate) struct Rendered {
    pub(crate) bytes: Vec<u8>,
    pub(crate) report: RenderReport,
}

struct Prepare<'c> {
    codec: &'c dyn ImageCodec,
    limits: Option<Limits>,
}

impl Prepare<'_> {
    fn run<'a>(&self, bytes: &Cow<'a, [u8]>) -> Prepared<'a> {
        match self.limits {
            Some(limits) => preprocess(self.codec, bytes.clone(), limits),
            None => Prepared {
                bytes: bytes.clone(),
                dimensions: self.codec.decode_dimensions(bytes).ok(),
            },
        }
    }
}

pub(crate) fn render(
    content: &ResolvedContent,
    options: &RenderOptions,
    codec: &dyn ImageCodec,
) -> Result<Rendered, Error> {
    let theme = &options.theme;
    theme.validate()?;

    // One image at a time, before anything is drawn.
    let prepare = Prepare {
        codec,
        limits: options.preprocess_images.then_some(Limits {
            max_long_edge: options.max_long_edge,
            quality: options.jpeg_quality,
        }),
    };
    let logo = content.logo.as_ref().map(|b| prepare.run(b));
    let technician_signature = content.technician_signature.as_ref().map(|b| prepare.run(b));
    let representative_signature = content.representative_signature.as_ref().map(|b| prepare.run(b));
    let evidence: Vec<EvidenceImage> = content
        .evidence
        .iter()
        .map(|item| {
            let mut prepared = prepare.run(&item.image);
            prepared.dimensions = prepared.dimensions.or_else(|| item.declared_dimensions());
            let orientation = item.orientation.unwrap_or_else(|| {
                prepared
                    .dimensions
                    .map(|(w, h)| Orientation::from_dimensions(w, h))
                    .unwrap_or(Orientation::Landscape)
            });
            EvidenceImage {
                prepared,
                orientation,
            }
        })
        .collect();

    let mut surface = surface::Surface::new(theme.page_size())?;
    let generated_text = short_date_es(options.generated_on);
    let chrome = Chrome {
        title: &options.title,
        subtitle: &content.system_label,
        date_text: &content.date_text,
        code_text: &content.code_text,
        generated_text: &generated_text,
        organization_line: &options.organization_line,
        logo: logo.as_ref(),
    };

    let mut images = Vec::new();
    let mut sections = Vec::new();

    if let Some(result) = header_footer::header(&mut surface, theme, &chrome) {
        images.push(ImageOutcome {
            slot: ImageSlot::Logo { page: 1 },
            result,
        });
    }

    let mut y = theme.margin + 36.0;

    sections.push(CLIENT_SECTION);
    y = chrome::section_title(&mut surface, theme, y, CLIENT_SECTION);
    let bounds = ColumnBounds {
        min: CLIENT_MIN.to_vec(),
        max: CLIENT_MAX.to_vec(),
    };
    let first = layout::plan_row(
        &[
            Field {
                label: "Cliente",
                value: &content.client_name,
            },
            Field {
                label: "RUT",
                value: &content.client_tax_id,
            },
            Field {
                label: "Dirección",
                value: &content.client_address,
            },
        ],
        &ColumnPlan::new(CLIENT_START.to_vec()),
        Some(&bounds),
        theme,
    );
    y = layout::draw_row(&mut surface, theme, &first, y);
    let second = layout::plan_row(
        &[
            Field {
                label: "Contacto",
                value: &content.client_contact,
            },
            Field {
                label: "Email",
                value: &content.client_email,
            },
            Field {
                label: "Técnico",
                value: &content.technician_name,
            },
        ],
        &first.plan,
        None,
        theme,
    );
    y = layout::draw_row(&mut surface, theme, &second, y) + 6.0;

    sections.push(EQUIPMENT_SECTION);
    y = chrome::section_title(&mut surface, theme, y, EQUIPMENT_SECTION);
    y = components::equipment(
        &mut surface,
        theme,
        y,
        [
            ("Cámaras IP:", content.camera_count_ip),
            ("Cámaras Analógicas:", content.camera_count_analog),
            ("Monitores:", content.monitor_count),
        ],
        &content.equipment_tags,
    );

    sections.push(CHECKLIST_SECTION);
    y = chrome::section_title(&mut surface, theme, y, CHECKLIST_SECTION);
    y = components::checklist(&mut surface, theme, y, &content.checklist);

    for (title, text) in [
        (REQUESTS_SECTION, content.client_requests.as_deref()),
        (OBSERVATIONS_SECTION, content.observations.as_deref()),
    ] {
        if let Some(text) = text {
            sections.push(title);
            y = chrome::section_title(&mut surface, theme, y, title);
            y = components::paragraph_box(&mut surface, theme, y, text);
        }
    }

    let anchor = components::signature_anchor(y, theme);
    let [technician, representative] = components::signatures(
        &mut surface,
        theme,
        anchor,
        [
            SignatureCell {
                role: "Técnico Responsable",
                name: &content.technician_name,
                image: technician_signature.as_ref(),
            },
            SignatureCell {
                role: "Representante Empresa",
                name: &content.representative_name,
                image: representative_signature.as_ref(),
            },
        ],
    );
    for (slot, outcome) in [
        (ImageSlot::TechnicianSignature, technician),
        (ImageSlot::RepresentativeSignature, representative),
    ] {
        if let Some(result) = outcome {
            images.push(ImageOutcome { slot, result });
        }
    }

    header_footer::footer(&mut surface, theme, &chrome);

    let evidence_pages = evidence::render_pages(
        &mut surface,
        theme,
        &chrome,
        &evidence,
        options.evidence_policy,
        &mut images,
    )?;
    sections.extend(evidence_pages.iter().map(|_| EVIDENCE_SECTION));

    let page_count = surface.page_count();
    let bytes = surface.finish(&options.title);

    Ok(Rendered {
        bytes,
        report: RenderReport {
            page_count,
            sections,
            images,
            client_columns: first.plan,
            evidence_pages,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::RasterCodec;
    use crate::model::{DocumentContent, EvidenceItem};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([90, 120, 200]));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn blank_paragraphs_are_omitted() {
        let content = DocumentContent {
            client_requests: Some("  ".into()),
            observations: None,
            ..DocumentContent::default()
        };
        let rendered = render(&content.resolve(), &RenderOptions::default(), &RasterCodec).unwrap();
        let report = rendered.report;
        assert_eq!(
            report.sections,
            vec![CLIENT_SECTION, EQUIPMENT_SECTION, CHECKLIST_SECTION]
        );
        assert_eq!(report.page_count, 1);
        assert!(report.images.is_empty());
        assert!(report.evidence_pages.is_empty());
    }

    #[test]
    fn orientation_comes_from_the_image_when_undeclared() {
        let content = DocumentContent {
            evidence: vec![
                EvidenceItem {
                    image: png(30, 60),
                    ..EvidenceItem::default()
                },
                EvidenceItem {
                    image: png(60, 30),
                    ..EvidenceItem::default()
                },
            ],
            ..DocumentContent::default()
        };
        let rendered = render(&content.resolve(), &RenderOptions::default(), &RasterCodec).unwrap();
        let plans = rendered.report.evidence_pages;
        assert_eq!(plans.len(), 1);
        assert_eq!((plans[0].portrait, plans[0].landscape), (1, 1));
        assert_eq!(rendered.report.page_count, 2);
    }

    #[test]
    fn rotated_phone_photo_counts_as_portrait() {
        let content = DocumentContent {
            evidence: vec![EvidenceItem {
                image: crate::images::tests::oriented_jpeg(1600, 1200, 6),
                ..EvidenceItem::default()
            }],
            ..DocumentContent::default()
        };
        let rendered = render(&content.resolve(), &RenderOptions::default(), &RasterCodec).unwrap();
        let plan = &rendered.report.evidence_pages[0];
        assert_eq!((plan.portrait, plan.landscape), (1, 0));
        let placed = rendered.report.images[0].result.as_ref().unwrap();
        assert!(placed.pixel_height > placed.pixel_width);
        assert!(placed.bounds.height > placed.bounds.width);
    }

    #[test]
    fn skipped_images_are_reported() {
        let content = DocumentContent {
            evidence: vec![EvidenceItem {
                image: b"definitely not a picture".to_vec(),
                pixel_width: 800,
                pixel_height: 600,
                ..EvidenceItem::default()
            }],
            ..DocumentContent::default()
        };
        let rendered = render(&content.resolve(), &RenderOptions::default(), &RasterCodec).unwrap();
        let skipped: Vec<_> = rendered.report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].slot, ImageSlot::Evidence { index: 0, page: 2 });
    }
}
