use crate::error::Error;
use crate::images::Prepared;
use crate::model::Orientation;
use crate::theme::{EvidencePolicy, LayoutTheme};

use super::chrome::section_title;
use super::header_footer::{Chrome, footer, header};
use super::surface::{Bounds, ColorRole, Paint, Surface};
use super::{ImageOutcome, ImageSlot};

pub(crate) const SECTION_TITLE: &str = "Evidencia fotográfica";

/// Pixel size assumed for an image whose dimensions could not be read.
const FALLBACK_PIXELS: (u32, u32) = (1000, 1000);

const PORTRAIT_PER_ROW: usize = 4;
const PORTRAIT_GAP: f32 = 7.0;
const PORTRAIT_ASPECT: f32 = 1.35;
const LANDSCAPE_PER_ROW: usize = 2;
const LANDSCAPE_GAP: f32 = 10.0;
const LANDSCAPE_ASPECT: f32 = 0.62;
const GRID_GAP: f32 = 10.0;
/// Clearance kept above the footer rule by the fixed grids.
const GRID_BOTTOM_CLEARANCE: f32 = 4.0;

/// One appendix page: which evidence items it holds, in input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PagePlan {
    pub items: Vec<usize>,
    pub portrait: usize,
    pub landscape: usize,
}

/// Evidence ready to be placed: bounded bytes, known or unknown pixel size,
/// and a settled orientation.
pub(crate) struct EvidenceImage<'a> {
    pub(crate) prepared: Prepared<'a>,
    pub(crate) orientation: Orientation,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct EvidenceCell {
    pub(crate) item: usize,
    pub(crate) cell: Bounds,
}

/// Split evidence into consecutive pages of `per_page` items.
pub(crate) fn paginate(orientations: &[Orientation], per_page: usize) -> Vec<PagePlan> {
    let per_page = per_page.max(1);
    let indices: Vec<usize> = (0..orientations.len()).collect();
    indices
        .chunks(per_page)
        .map(|chunk| {
            let portrait = chunk
                .iter()
                .filter(|&&i| orientations[i] == Orientation::Portrait)
                .count();
            PagePlan {
                items: chunk.to_vec(),
                portrait,
                landscape: chunk.len() - portrait,
            }
        })
        .collect()
}

/// Largest box with the image's aspect ratio that fits `cell`, centred in it.
/// Unknown or zero dimensions are treated as square.
pub(crate) fn contain_fit(cell: Bounds, pixels: Option<(u32, u32)>) -> Bounds {
    let (w, h) = match pixels {
        Some((w, h)) if w > 0 && h > 0 => (w, h),
        _ => FALLBACK_PIXELS,
    };
    let ratio = w as f32 / h as f32;
    let mut draw_h = cell.height;
    let mut draw_w = draw_h * ratio;
    if draw_w > cell.width {
        draw_w = cell.width;
        draw_h = draw_w / ratio;
    }
    Bounds::new(
        cell.x + (cell.width - draw_w) / 2.0,
        cell.y + (cell.height - draw_h) / 2.0,
        draw_w,
        draw_h,
    )
}

struct RowSpec {
    per_row: usize,
    gap: f32,
    aspect: f32,
}

const PORTRAIT_ROWS: RowSpec = RowSpec {
    per_row: PORTRAIT_PER_ROW,
    gap: PORTRAIT_GAP,
    aspect: PORTRAIT_ASPECT,
};

const LANDSCAPE_ROWS: RowSpec = RowSpec {
    per_row: LANDSCAPE_PER_ROW,
    gap: LANDSCAPE_GAP,
    aspect: LANDSCAPE_ASPECT,
};

impl RowSpec {
    fn cell_width(&self, theme: &LayoutTheme) -> f32 {
        (theme.content_width() - self.gap * (self.per_row - 1) as f32) / self.per_row as f32
    }

    /// Height of `count` items laid out in rows, without the trailing gap.
    fn block_height(&self, count: usize, theme: &LayoutTheme, scale: f32) -> f32 {
        let rows = count.div_ceil(self.per_row);
        if rows == 0 {
            return 0.0;
        }
        let cell_h = self.cell_width(theme) * self.aspect * scale;
        rows as f32 * cell_h + (rows - 1) as f32 * self.gap
    }

    fn place(
        &self,
        items: &[usize],
        theme: &LayoutTheme,
        scale: f32,
        y: &mut f32,
        out: &mut Vec<EvidenceCell>,
    ) {
        let cell_w = self.cell_width(theme) * scale;
        let cell_h = cell_w * self.aspect;
        let row_w = self.per_row as f32 * cell_w + (self.per_row - 1) as f32 * self.gap;
        let left = theme.content_left() + (theme.content_width() - row_w) / 2.0;
        for row in items.chunks(self.per_row) {
            for (c, &item) in row.iter().enumerate() {
                out.push(EvidenceCell {
                    item,
                    cell: Bounds::new(left + c as f32 * (cell_w + self.gap), *y, cell_w, cell_h),
                });
            }
            *y += cell_h + self.gap;
        }
    }
}

/// Portraits first, four to a row in tall cells; then landscapes, two to a
/// row in wide cells. Relative order is kept within each group. When the rows
/// would reach into the footer every cell shrinks by the same factor and the
/// rows stay centred.
pub(crate) fn grouped_cells(
    plan: &PagePlan,
    orientations: &[Orientation],
    theme: &LayoutTheme,
    top: f32,
) -> Vec<EvidenceCell> {
    let (portraits, landscapes): (Vec<usize>, Vec<usize>) = plan
        .items
        .iter()
        .partition(|&&i| orientations[i] == Orientation::Portrait);

    let between = if portraits.is_empty() || landscapes.is_empty() {
        0.0
    } else {
        PORTRAIT_GAP
    };
    let block = |scale: f32| {
        PORTRAIT_ROWS.block_height(portraits.len(), theme, scale)
            + LANDSCAPE_ROWS.block_height(landscapes.len(), theme, scale)
            + between
    };
    let natural = block(1.0);
    let gaps_only = block(0.0);
    let available = theme.footer_top() - GRID_BOTTOM_CLEARANCE - top;
    let scale = if natural > available && natural > gaps_only {
        ((available - gaps_only) / (natural - gaps_only)).clamp(0.0, 1.0)
    } else {
        1.0
    };
    if scale < 1.0 {
        log::debug!("evidence rows scaled by {scale:.3} to clear the footer");
    }

    let mut cells = Vec::with_capacity(plan.items.len());
    let mut y = top;
    PORTRAIT_ROWS.place(&portraits, theme, scale, &mut y, &mut cells);
    LANDSCAPE_ROWS.place(&landscapes, theme, scale, &mut y, &mut cells);
    cells
}

/// Uniform `columns` x `rows` grid filling the space between `top` and the
/// footer, in input order.
pub(crate) fn grid_cells(
    plan: &PagePlan,
    columns: usize,
    rows: usize,
    theme: &LayoutTheme,
    top: f32,
) -> Vec<EvidenceCell> {
    let columns = columns.max(1);
    let rows = rows.max(1);
    let cell_w = (theme.content_width() - GRID_GAP * (columns - 1) as f32) / columns as f32;
    let available = theme.footer_top() - GRID_BOTTOM_CLEARANCE - top - GRID_GAP * (rows - 1) as f32;
    let cell_h = (available / rows as f32).max(0.0);

    plan.items
        .iter()
        .enumerate()
        .map(|(slot, &item)| {
            let (r, c) = (slot / columns, slot % columns);
            EvidenceCell {
                item,
                cell: Bounds::new(
                    theme.content_left() + c as f32 * (cell_w + GRID_GAP),
                    top + r as f32 * (cell_h + GRID_GAP),
                    cell_w,
                    cell_h,
                ),
            }
        })
        .collect()
}

pub(crate) fn page_cells(
    policy: EvidencePolicy,
    plan: &PagePlan,
    orientations: &[Orientation],
    theme: &LayoutTheme,
    top: f32,
) -> Vec<EvidenceCell> {
    match policy {
        EvidencePolicy::Grouped => grouped_cells(plan, orientations, theme, top),
        EvidencePolicy::Dense => grid_cells(plan, 2, 3, theme, top),
        EvidencePolicy::Uniform => grid_cells(plan, 3, 3, theme, top),
    }
}

/// Append the photo pages. Nothing is added for an empty list. Each page
/// repeats the header, the section title and the footer.
pub(crate) fn render_pages(
    surface: &mut Surface,
    theme: &LayoutTheme,
    chrome: &Chrome,
    images: &[EvidenceImage],
    policy: EvidencePolicy,
    outcomes: &mut Vec<ImageOutcome>,
) -> Result<Vec<PagePlan>, Error> {
    let orientations: Vec<Orientation> = images.iter().map(|e| e.orientation).collect();
    let plans = paginate(&orientations, policy.per_page());

    for plan in &plans {
        surface.new_page(theme.page_size())?;
        let page = surface.page_count();
        log::debug!(
            "evidence page {page}: items {:?} ({} portrait, {} landscape)",
            plan.items,
            plan.portrait,
            plan.landscape
        );

        if let Some(result) = header(surface, theme, chrome) {
            outcomes.push(ImageOutcome {
                slot: ImageSlot::Logo { page },
                result,
            });
        }
        let top = section_title(surface, theme, theme.margin + 32.0, SECTION_TITLE);

        for EvidenceCell { item, cell } in page_cells(policy, plan, &orientations, theme, top) {
            surface.set_color(ColorRole::Stroke, theme.palette.frame);
            surface.set_line_width(theme.metrics.rule_width);
            surface.rect(cell, Paint::Stroke);

            let image = &images[item].prepared;
            let result = surface.image(&image.bytes, contain_fit(cell, image.dimensions));
            outcomes.push(ImageOutcome {
                slot: ImageSlot::Evidence { index: item, page },
                result,
            });
        }

        footer(surface, theme, chrome);
    }

    Ok(plans)
}
