use crate::fonts::Weight;
use crate::images::Prepared;
use crate::theme::LayoutTheme;

use super::evidence::contain_fit;
use super::surface::{Bounds, ColorRole, Paint, Placed, Skipped, Surface, TextStyle};

const CARD_COLUMNS: usize = 4;
const CARD_GAP: f32 = 6.0;
const CARD_HEIGHT: f32 = 12.0;
const CARD_RADIUS: f32 = 2.5;
const CARD_LABEL_SIZE: f32 = 7.5;
const CARD_VALUE_SIZE: f32 = 9.5;
const CARD_PAD: f32 = 1.2;

const TAG_HEIGHT: f32 = 6.2;
const TAG_GAP: f32 = 2.5;
const TAG_PAD_X: f32 = 2.8;
const TAG_RADIUS: f32 = 2.0;
const TAG_BAR: f32 = 0.9;

/// Equipment counts as three metric cards, with the optional NVR/DVR/JOYSTICK
/// tags stacked in the fourth column. Returns the cursor below the taller of
/// the two.
pub(crate) fn equipment(
    surface: &mut Surface,
    theme: &LayoutTheme,
    y: f32,
    counts: [(&str, u32); 3],
    tags: &[(&str, String)],
) -> f32 {
    let p = &theme.palette;
    let col_w = (theme.content_width() - CARD_GAP * (CARD_COLUMNS - 1) as f32) / CARD_COLUMNS as f32;
    let col_x = |i: usize| theme.content_left() + i as f32 * (col_w + CARD_GAP);

    for (i, (label, value)) in counts.iter().enumerate() {
        let card = Bounds::new(col_x(i), y, col_w, CARD_HEIGHT);
        surface.set_color(ColorRole::Fill, p.card_fill);
        surface.set_color(ColorRole::Stroke, p.gray_light);
        surface.set_line_width(theme.metrics.rule_width);
        surface.rounded_or_plain(card, CARD_RADIUS, Paint::FillStroke);

        let value = value.to_string();
        let label_w = surface.measure_text(label, CARD_LABEL_SIZE, Weight::Bold);
        let value_w = surface.measure_text(&value, CARD_VALUE_SIZE, Weight::Bold);
        let start = card.x + (col_w - (label_w + CARD_PAD + value_w)) / 2.0;
        let baseline = y + 7.0;

        surface.set_color(ColorRole::Text, p.gray_dark);
        surface.text(label, start, baseline, TextStyle::bold(CARD_LABEL_SIZE));
        surface.set_color(ColorRole::Text, p.brand);
        surface.text(&value, start + label_w + CARD_PAD, baseline, TextStyle::bold(CARD_VALUE_SIZE));
    }

    let tags_h = tag_column_height(tags.len());
    let x = col_x(CARD_COLUMNS - 1);
    let size = theme.metrics.body_size;
    let mut ty = y;
    for (label, value) in tags {
        let pill = Bounds::new(x, ty, col_w, TAG_HEIGHT);
        surface.set_color(ColorRole::Fill, p.tag_fill);
        surface.set_color(ColorRole::Stroke, p.gray_light);
        surface.rounded_or_plain(pill, TAG_RADIUS, Paint::FillStroke);
        surface.set_color(ColorRole::Fill, p.brand);
        surface.rect(Bounds::new(x, ty, TAG_BAR, TAG_HEIGHT), Paint::Fill);

        let label = format!("{label}: ");
        let label_w = surface.measure_text(&label, size, Weight::Bold);
        let text_x = x + TAG_BAR + TAG_PAD_X;
        let baseline = ty + (TAG_HEIGHT - 1.9);
        surface.set_color(ColorRole::Text, p.ink);
        surface.text(&label, text_x, baseline, TextStyle::bold(size));
        surface.text(value, text_x + label_w, baseline, TextStyle::regular(size));
        ty += TAG_HEIGHT + TAG_GAP;
    }

    y + CARD_HEIGHT.max(tags_h) + 8.0
}

fn tag_column_height(count: usize) -> f32 {
    if count == 0 {
        0.0
    } else {
        count as f32 * TAG_HEIGHT + (count - 1) as f32 * TAG_GAP
    }
}

pub(crate) const CHECKLIST_COLUMNS: usize = 4;
pub(crate) const CHECKLIST_PER_COLUMN: usize = 2;
const CHECKLIST_GAP: f32 = 10.0;
const CHECKLIST_ROW: f32 = 5.8;
const CHECK_BOX: f32 = 3.6;

/// Grid cell `(column, row)` of the `index`-th checked item. Items fill down a
/// column before moving right; once every column holds `per_column` items the
/// next band of rows starts again at the first column.
pub(crate) fn checklist_cell(index: usize, per_column: usize, columns: usize) -> (usize, usize) {
    let per_column = per_column.max(1);
    let columns = columns.max(1);
    let band = index / (per_column * columns);
    let column = (index / per_column) % columns;
    let row = band * per_column + index % per_column;
    (column, row)
}

fn checklist_rows(count: usize, per_column: usize, columns: usize) -> usize {
    (0..count)
        .map(|i| checklist_cell(i, per_column, columns).1 + 1)
        .max()
        .unwrap_or(0)
}

pub(crate) fn checklist(surface: &mut Surface, theme: &LayoutTheme, y: f32, items: &[String]) -> f32 {
    let col_w = (theme.content_width() - CHECKLIST_GAP * (CHECKLIST_COLUMNS - 1) as f32)
        / CHECKLIST_COLUMNS as f32;

    for (i, label) in items.iter().enumerate() {
        let (col, row) = checklist_cell(i, CHECKLIST_PER_COLUMN, CHECKLIST_COLUMNS);
        let x = theme.content_left() + col as f32 * (col_w + CHECKLIST_GAP);
        check_item(surface, theme, x, y + row as f32 * CHECKLIST_ROW, label);
    }

    let rows = checklist_rows(items.len(), CHECKLIST_PER_COLUMN, CHECKLIST_COLUMNS);
    log::debug!("checklist: {} item(s) in {rows} row(s)", items.len());
    y + rows as f32 * CHECKLIST_ROW + 6.0
}

fn check_item(surface: &mut Surface, theme: &LayoutTheme, x: f32, baseline: f32, label: &str) {
    let top = baseline - CHECK_BOX + 1.3;
    surface.set_color(ColorRole::Stroke, theme.palette.check);
    surface.set_line_width(0.3);
    surface.rect(Bounds::new(x, top, CHECK_BOX, CHECK_BOX), Paint::Stroke);

    surface.set_line_width(0.4);
    surface.line(x + 0.85, top + 2.1, x + 1.45, top + 2.8);
    surface.line(x + 1.45, top + 2.8, x + 2.6, top + 1.05);

    surface.set_color(ColorRole::Text, theme.palette.almost_black);
    surface.text(label, x + CHECK_BOX + 2.0, baseline, TextStyle::regular(theme.metrics.body_size));
}

const PARAGRAPH_PAD_X: f32 = 4.0;
const PARAGRAPH_PAD_Y: f32 = 3.0;
const PARAGRAPH_RADIUS: f32 = 2.0;
/// From the top padding to the first baseline.
const PARAGRAPH_ASCENT: f32 = 3.2;
/// The box is pulled up this far into the gap left under the section title.
const PARAGRAPH_TUCK: f32 = 4.0;

/// Box height for `lines` wrapped lines: no minimum, no slack.
pub(crate) fn paragraph_height(lines: usize, line_height: f32) -> f32 {
    lines as f32 * line_height + 2.0 * PARAGRAPH_PAD_Y
}

/// Number of `count` lines, the first with its baseline at `first_baseline`,
/// whose baseline stays at or above `limit`.
pub(crate) fn lines_above(first_baseline: f32, line_height: f32, count: usize, limit: f32) -> usize {
    if count == 0 || first_baseline > limit || line_height <= 0.0 {
        return 0;
    }
    (((limit - first_baseline) / line_height).floor() as usize + 1).min(count)
}

/// Body of a free-text section; `y` is the cursor returned by the section
/// title. The caller omits the section entirely for blank text. Lines that
/// would run into the footer are dropped with a warning.
pub(crate) fn paragraph_box(surface: &mut Surface, theme: &LayoutTheme, y: f32, text: &str) -> f32 {
    let m = &theme.metrics;
    let top = y - PARAGRAPH_TUCK;
    let mut lines = surface.wrap_text(
        text,
        theme.content_width() - 2.0 * PARAGRAPH_PAD_X,
        m.body_size,
        Weight::Regular,
    );
    let first_baseline = top + PARAGRAPH_PAD_Y + PARAGRAPH_ASCENT;
    // last baseline that still keeps the box bottom on the footer rule
    let limit = theme.footer_top() - PARAGRAPH_PAD_Y - m.line_height + PARAGRAPH_ASCENT;
    let kept = lines_above(first_baseline, m.line_height, lines.len(), limit);
    if kept < lines.len() {
        log::warn!(
            "paragraph: {} of {} line(s) would run into the footer and were dropped",
            lines.len() - kept,
            lines.len()
        );
        lines.truncate(kept);
    }
    if lines.is_empty() {
        return y;
    }
    let height = paragraph_height(lines.len(), m.line_height);

    surface.set_color(ColorRole::Fill, theme.palette.card_fill);
    surface.set_color(ColorRole::Stroke, theme.palette.gray_light);
    surface.set_line_width(m.rule_width);
    surface.rounded_or_plain(
        Bounds::new(theme.content_left(), top, theme.content_width(), height),
        PARAGRAPH_RADIUS,
        Paint::FillStroke,
    );

    surface.set_color(ColorRole::Text, theme.palette.almost_black);
    let mut baseline = first_baseline;
    for line in &lines {
        surface.text(line, theme.content_left() + PARAGRAPH_PAD_X, baseline, TextStyle::regular(m.body_size));
        baseline += m.line_height;
    }

    top + height + 10.0
}

const SIGNATURE_GAP: f32 = 20.0;
const SIGNATURE_IMAGE_W: f32 = 40.0;
const SIGNATURE_IMAGE_H: f32 = 14.0;
const SIGNATURE_RULE_OFFSET: f32 = 22.0;
/// From the block anchor to just below the name line.
pub(crate) const SIGNATURE_BLOCK_HEIGHT: f32 = SIGNATURE_RULE_OFFSET + 10.0;
/// Preferred distance of the block anchor from the bottom of the page.
const SIGNATURE_FROM_BOTTOM: f32 = 68.0;

/// Anchor for the signature block: its usual spot near the bottom of the page,
/// pushed down by tall content but never into the footer.
pub(crate) fn signature_anchor(cursor: f32, theme: &LayoutTheme) -> f32 {
    let preferred = theme.page_height() - SIGNATURE_FROM_BOTTOM;
    let latest = theme.footer_top() - SIGNATURE_BLOCK_HEIGHT;
    let wanted = cursor.max(preferred);
    if wanted > latest {
        log::warn!(
            "page content ends at {cursor:.1} mm; signature block held at {latest:.1} mm and may overlap it"
        );
        latest
    } else {
        wanted
    }
}

pub(crate) struct SignatureCell<'s, 'a> {
    pub(crate) role: &'s str,
    pub(crate) name: &'s str,
    pub(crate) image: Option<&'s Prepared<'a>>,
}

/// Two side-by-side signature cells anchored at `y`. Returns the outcome of
/// each cell's image, `None` where no image was supplied.
pub(crate) fn signatures(
    surface: &mut Surface,
    theme: &LayoutTheme,
    y: f32,
    cells: [SignatureCell; 2],
) -> [Option<Result<Placed, Skipped>>; 2] {
    let cell_w = (theme.content_width() - SIGNATURE_GAP) / 2.0;
    let size = theme.metrics.body_size;

    let mut outcomes: [Option<Result<Placed, Skipped>>; 2] = [None, None];
    for (i, cell) in cells.iter().enumerate() {
        let x = theme.content_left() + i as f32 * (cell_w + SIGNATURE_GAP);
        let center = x + cell_w / 2.0;

        if let Some(image) = cell.image {
            let slot = Bounds::new(
                center - SIGNATURE_IMAGE_W / 2.0,
                y + 2.0,
                SIGNATURE_IMAGE_W,
                SIGNATURE_IMAGE_H,
            );
            outcomes[i] = Some(surface.image(&image.bytes, contain_fit(slot, image.dimensions)));
        }

        let rule_w = cell_w * 0.62;
        let rule_y = y + SIGNATURE_RULE_OFFSET;
        surface.set_color(ColorRole::Stroke, theme.palette.signature_rule);
        surface.set_line_width(0.4);
        surface.line(center - rule_w / 2.0, rule_y, center + rule_w / 2.0, rule_y);

        surface.set_color(ColorRole::Text, theme.palette.ink);
        surface.text(cell.role, center, rule_y + 5.0, TextStyle::bold(size).centered());
        surface.set_color(ColorRole::Text, theme.palette.almost_black);
        surface.text(cell.name, center, rule_y + 9.2, TextStyle::regular(size).centered());
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_items_fill_the_first_column() {
        let cells: Vec<_> = (0..2)
            .map(|i| checklist_cell(i, CHECKLIST_PER_COLUMN, CHECKLIST_COLUMNS))
            .collect();
        assert_eq!(cells, vec![(0, 0), (0, 1)]);
        assert!(cells.iter().all(|(col, _)| *col != 1));
    }

    #[test]
    fn eight_items_fill_four_columns_down_first() {
        let cells: Vec<_> = (0..8)
            .map(|i| checklist_cell(i, CHECKLIST_PER_COLUMN, CHECKLIST_COLUMNS))
            .collect();
        assert_eq!(
            cells,
            vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1), (3, 0), (3, 1)]
        );
        assert_eq!(checklist_rows(8, 2, 4), 2);
    }

    #[test]
    fn overflow_wraps_to_a_new_band_of_rows() {
        assert_eq!(checklist_cell(8, 2, 4), (0, 2));
        assert_eq!(checklist_cell(9, 2, 4), (0, 3));
        assert_eq!(checklist_cell(10, 2, 4), (1, 2));
        assert_eq!(checklist_rows(9, 2, 4), 4);
        assert_eq!(checklist_rows(0, 2, 4), 0);
    }

    #[test]
    fn placement_is_deterministic() {
        let a: Vec<_> = (0..12).map(|i| checklist_cell(i, 2, 4)).collect();
        let b: Vec<_> = (0..12).map(|i| checklist_cell(i, 2, 4)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn paragraph_height_has_no_minimum() {
        assert!((paragraph_height(1, 3.9) - 9.9).abs() < 1e-5);
        assert!((paragraph_height(4, 3.9) - (4.0 * 3.9 + 6.0)).abs() < 1e-5);
    }

    #[test]
    fn lines_stop_at_the_limit() {
        assert_eq!(lines_above(100.0, 4.0, 10, 200.0), 10);
        assert_eq!(lines_above(100.0, 4.0, 10, 112.0), 4);
        assert_eq!(lines_above(100.0, 4.0, 10, 99.0), 0);
        assert_eq!(lines_above(100.0, 4.0, 0, 200.0), 0);
    }

    #[test]
    fn long_paragraph_stays_above_the_footer() {
        let theme = LayoutTheme::default();
        let mut surface = Surface::new(theme.page_size()).unwrap();
        let text = (1..=60).map(|i| format!("Observación {i}")).collect::<Vec<_>>().join("\n");
        let cursor = paragraph_box(&mut surface, &theme, 150.0, &text);
        assert!(cursor - 10.0 <= theme.footer_top() + 1e-4, "cursor {cursor}");

        let short = paragraph_box(&mut surface, &theme, 150.0, "Sin novedades.");
        assert!((short - (146.0 + paragraph_height(1, theme.metrics.line_height) + 10.0)).abs() < 1e-4);
    }

    #[test]
    fn signature_anchor_prefers_bottom_and_avoids_footer() {
        let theme = LayoutTheme::default();
        assert!((signature_anchor(120.0, &theme) - 229.0).abs() < 1e-4);
        assert!((signature_anchor(235.0, &theme) - 235.0).abs() < 1e-4);
        let clamped = signature_anchor(280.0, &theme);
        assert!(clamped + SIGNATURE_BLOCK_HEIGHT <= theme.footer_top() + 1e-4);
    }

    #[test]
    fn tag_column_is_empty_without_tags() {
        assert_eq!(tag_column_height(0), 0.0);
        assert!((tag_column_height(3) - (3.0 * 6.2 + 2.0 * 2.5)).abs() < 1e-5);
    }
}
