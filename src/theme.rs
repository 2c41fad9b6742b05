use chrono::NaiveDate;

use crate::error::Error;

pub type Rgb = [u8; 3];

pub const MM_PER_PT: f32 = 25.4 / 72.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

/// Physical page size in millimetres, portrait-oriented.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 210.0,
        height: 297.0,
    };

    pub fn oriented(self, orientation: PageOrientation) -> PageSize {
        let (short, long) = (self.width.min(self.height), self.width.max(self.height));
        match orientation {
            PageOrientation::Portrait => PageSize {
                width: short,
                height: long,
            },
            PageOrientation::Landscape => PageSize {
                width: long,
                height: short,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct Palette {
    pub brand: Rgb,
    pub gray_dark: Rgb,
    pub gray_light: Rgb,
    pub almost_black: Rgb,
    pub ink: Rgb,
    pub heading: Rgb,
    pub subtitle: Rgb,
    pub wash: Rgb,
    pub page_background: Rgb,
    pub card_fill: Rgb,
    pub tag_fill: Rgb,
    pub check: Rgb,
    pub frame: Rgb,
    pub signature_rule: Rgb,
    pub footer_contact: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            brand: [67, 105, 231],
            gray_dark: [55, 65, 81],
            gray_light: [226, 232, 240],
            almost_black: [31, 41, 55],
            ink: [17, 24, 39],
            heading: [30, 41, 59],
            subtitle: [75, 85, 99],
            wash: [239, 246, 255],
            page_background: [255, 255, 255],
            card_fill: [248, 250, 252],
            tag_fill: [241, 245, 249],
            check: [16, 185, 129],
            frame: [229, 231, 235],
            signature_rule: [107, 114, 128],
            footer_contact: [51, 65, 85],
        }
    }
}

/// Metrics shared by several renderers. Lengths in mm, font sizes in pt.
#[derive(Clone, Debug)]
pub struct Metrics {
    pub body_size: f32,
    pub line_height: f32,
    pub section_title_size: f32,
    pub section_bar_height: f32,
    pub section_bar_width: f32,
    pub section_title_advance: f32,
    pub section_gap: f32,
    pub gradient_steps: usize,
    pub rule_width: f32,
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics {
            body_size: 7.2,
            line_height: 3.9,
            section_title_size: 9.5,
            section_bar_height: 8.0,
            section_bar_width: 1.1,
            section_title_advance: 5.2,
            section_gap: 7.5,
            gradient_steps: 56,
            rule_width: 0.3,
        }
    }
}

/// Immutable geometry and style passed into every renderer.
#[derive(Clone, Debug)]
pub struct LayoutTheme {
    pub page: PageSize,
    pub orientation: PageOrientation,
    pub margin: f32,
    pub palette: Palette,
    pub metrics: Metrics,
}

impl Default for LayoutTheme {
    fn default() -> Self {
        LayoutTheme {
            page: PageSize::A4,
            orientation: PageOrientation::Portrait,
            margin: 15.0,
            palette: Palette::default(),
            metrics: Metrics::default(),
        }
    }
}

impl LayoutTheme {
    pub fn page_size(&self) -> PageSize {
        self.page.oriented(self.orientation)
    }

    pub fn page_width(&self) -> f32 {
        self.page_size().width
    }

    pub fn page_height(&self) -> f32 {
        self.page_size().height
    }

    pub fn content_left(&self) -> f32 {
        self.margin
    }

    pub fn content_right(&self) -> f32 {
        self.page_width() - self.margin
    }

    /// Page width minus left and right margins.
    pub fn content_width(&self) -> f32 {
        self.page_width() - 2.0 * self.margin
    }

    /// Top of the footer rule; content below this line belongs to the footer.
    pub fn footer_top(&self) -> f32 {
        self.page_height() - self.margin - 8.0
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        let size = self.page_size();
        let sane = size.width.is_finite()
            && size.height.is_finite()
            && size.width > 0.0
            && size.height > 0.0
            && self.margin.is_finite()
            && self.margin >= 0.0
            && self.content_width() > 0.0
            && self.page_height() - 2.0 * self.margin > 0.0;
        if sane {
            Ok(())
        } else {
            Err(Error::InvalidPage {
                width: size.width,
                height: size.height,
            })
        }
    }
}

/// Grid used for the photo appendix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvidencePolicy {
    /// Portraits four per row, then landscapes two per row; eight items per
    /// page, shrunk to fit when the rows would reach the footer.
    #[default]
    Grouped,
    /// Uniform 2 x 3 grid, six items per page.
    Dense,
    /// Uniform 3 x 3 grid, nine items per page.
    Uniform,
}

impl EvidencePolicy {
    pub fn per_page(self) -> usize {
        match self {
            EvidencePolicy::Grouped => 8,
            EvidencePolicy::Dense => 6,
            EvidencePolicy::Uniform => 9,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub theme: LayoutTheme,
    pub title: String,
    /// Fixed contact line printed under the validation line of every footer.
    pub organization_line: String,
    /// Date printed as the generation date in the footer.
    pub generated_on: NaiveDate,
    pub evidence_policy: EvidencePolicy,
    pub preprocess_images: bool,
    /// Images with a longer edge than this (in pixels) are downsampled.
    pub max_long_edge: u32,
    pub jpeg_quality: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            theme: LayoutTheme::default(),
            title: "CERTIFICADO DE MANTENIMIENTO".to_string(),
            organization_line:
                "Redes y CCTV  •  María Eugenia López 9726, Antofagasta  •  www.redesycctv.cl  •  +56 9 630 671 69"
                    .to_string(),
            generated_on: chrono::Local::now().date_naive(),
            evidence_policy: EvidencePolicy::default(),
            preprocess_images: true,
            max_long_edge: 1400,
            jpeg_quality: 82,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_content_width_leaves_margins() {
        let theme = LayoutTheme::default();
        assert_eq!(theme.content_width(), 180.0);
        assert_eq!(theme.content_right(), 195.0);
        assert!(theme.validate().is_ok());
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let theme = LayoutTheme {
            orientation: PageOrientation::Landscape,
            ..LayoutTheme::default()
        };
        assert_eq!(theme.page_width(), 297.0);
        assert_eq!(theme.page_height(), 210.0);
    }

    #[test]
    fn margins_consuming_the_page_are_rejected() {
        let theme = LayoutTheme {
            margin: 105.0,
            ..LayoutTheme::default()
        };
        assert!(matches!(
            theme.validate(),
            Err(Error::InvalidPage { .. })
        ));
    }
}
