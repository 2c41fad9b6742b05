use crate::fonts::{Weight, text_width, wrap_text};
use crate::theme::LayoutTheme;

use super::surface::{ColorRole, Surface, TextStyle};

/// Redistribution passes per row; residual overflow after this just wraps.
const MAX_REBALANCE_PASSES: usize = 8;
const COLUMN_GAP: f32 = 4.5;
/// Space between a label and the first value line.
const LABEL_PAD: f32 = 1.6;
/// Slack subtracted from the value wrap width so glyphs never touch the next column.
const WRAP_SLACK: f32 = 2.0;
const MIN_VALUE_WIDTH: f32 = 10.0;
const ROW_BOTTOM: f32 = 1.2;

/// Share moved per pass from the donor with the most spare width, and from
/// every other single-line donor.
const PRIMARY_STEP: f32 = 0.015;
const SECONDARY_STEP: f32 = 0.004;

/// Relative column widths of one row, summing to 1.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnPlan {
    pub widths: Vec<f32>,
}

impl ColumnPlan {
    pub fn new(widths: Vec<f32>) -> Self {
        let sum: f32 = widths.iter().sum();
        if sum > 0.0 {
            ColumnPlan {
                widths: widths.iter().map(|w| w / sum).collect(),
            }
        } else {
            let n = widths.len().max(1);
            ColumnPlan {
                widths: vec![1.0 / n as f32; n],
            }
        }
    }

    pub fn total(&self) -> f32 {
        self.widths.iter().sum()
    }
}

/// Per-column lower and upper bounds on relative width.
#[derive(Clone, Debug)]
pub(crate) struct ColumnBounds {
    pub(crate) min: Vec<f32>,
    pub(crate) max: Vec<f32>,
}

impl ColumnBounds {
    pub(crate) fn contains(&self, plan: &ColumnPlan, eps: f32) -> bool {
        plan.widths
            .iter()
            .zip(self.min.iter().zip(&self.max))
            .all(|(w, (lo, hi))| *w >= lo - eps && *w <= hi + eps)
    }
}

/// One redistribution step. Each overflowing column below its maximum takes
/// width from the single-line columns: a larger share from the donor with the
/// most spare width above its minimum, a small share from the rest. Transfers
/// never push a donor below its minimum or a receiver above its maximum, so a
/// plan that starts inside its bounds stays inside them and keeps summing to 1.
pub(crate) fn rebalance(widths: &[f32], overflow: &[bool], bounds: &ColumnBounds) -> Vec<f32> {
    let mut next = widths.to_vec();
    let n = next.len();

    for receiver in 0..n {
        if !overflow[receiver] {
            continue;
        }
        let mut capacity = (bounds.max[receiver] - next[receiver]).max(0.0);
        if capacity <= 0.0 {
            continue;
        }

        let mut donors: Vec<usize> = (0..n).filter(|&j| !overflow[j]).collect();
        donors.sort_by(|&a, &b| {
            let spare_a = next[a] - bounds.min[a];
            let spare_b = next[b] - bounds.min[b];
            spare_b.total_cmp(&spare_a)
        });

        for (rank, donor) in donors.into_iter().enumerate() {
            let step = if rank == 0 { PRIMARY_STEP } else { SECONDARY_STEP };
            let spare = (next[donor] - bounds.min[donor]).max(0.0);
            let take = step.min(spare).min(capacity);
            if take <= 0.0 {
                continue;
            }
            next[donor] -= take;
            next[receiver] += take;
            capacity -= take;
        }
    }

    let sum: f32 = next.iter().sum();
    if sum > 0.0 {
        for w in &mut next {
            *w /= sum;
        }
    }
    next
}

pub(crate) struct Field<'a> {
    pub(crate) label: &'a str,
    pub(crate) value: &'a str,
}

#[derive(Debug)]
pub(crate) struct ColumnLayout {
    pub(crate) x: f32,
    pub(crate) width: f32,
    pub(crate) label: String,
    pub(crate) label_width: f32,
    pub(crate) lines: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct RowLayout {
    pub(crate) plan: ColumnPlan,
    pub(crate) columns: Vec<ColumnLayout>,
    pub(crate) height: f32,
    pub(crate) passes: usize,
}

impl RowLayout {
    pub(crate) fn line_counts(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.lines.len()).collect()
    }
}

fn measure_columns(
    fields: &[Field],
    plan: &ColumnPlan,
    theme: &LayoutTheme,
) -> Vec<ColumnLayout> {
    let size = theme.metrics.body_size;
    let gaps = COLUMN_GAP * fields.len().saturating_sub(1) as f32;
    let usable = theme.content_width() - gaps;
    let mut x = theme.content_left();

    fields
        .iter()
        .zip(&plan.widths)
        .map(|(field, rel)| {
            let width = rel * usable;
            let label = format!("{}: ", field.label);
            let label_width = text_width(&label, size, Weight::Bold);
            let value_width = (width - label_width - WRAP_SLACK).max(MIN_VALUE_WIDTH);
            let value = if field.value.trim().is_empty() {
                "-"
            } else {
                field.value
            };
            let lines = wrap_text(value, value_width, size, Weight::Regular);
            let column = ColumnLayout {
                x,
                width,
                label,
                label_width,
                lines,
            };
            x += width + COLUMN_GAP;
            column
        })
        .collect()
}

/// Lay out one row of label/value pairs. With `bounds` set and exactly three
/// fields, width is moved toward overflowing columns for at most
/// `MAX_REBALANCE_PASSES` passes; otherwise `start` is used as given.
pub(crate) fn plan_row(
    fields: &[Field],
    start: &ColumnPlan,
    bounds: Option<&ColumnBounds>,
    theme: &LayoutTheme,
) -> RowLayout {
    let mut plan = start.clone();
    let mut columns = measure_columns(fields, &plan, theme);
    let mut passes = 0;

    if let Some(bounds) = bounds
        && fields.len() == 3
    {
        while passes < MAX_REBALANCE_PASSES {
            let overflow: Vec<bool> = columns.iter().map(|c| c.lines.len() > 1).collect();
            if !overflow.iter().any(|&o| o) {
                break;
            }
            let next = rebalance(&plan.widths, &overflow, bounds);
            passes += 1;
            if next == plan.widths {
                break;
            }
            plan.widths = next;
            columns = measure_columns(fields, &plan, theme);
        }
        log::debug!(
            "column plan after {passes} pass(es): {:?} lines={:?}",
            plan.widths,
            columns.iter().map(|c| c.lines.len()).collect::<Vec<_>>()
        );
    }

    let max_lines = columns.iter().map(|c| c.lines.len()).max().unwrap_or(1).max(1);
    RowLayout {
        plan,
        columns,
        height: max_lines as f32 * theme.metrics.line_height + ROW_BOTTOM,
        passes,
    }
}

/// Draw a planned row with label baselines at `y`; returns the cursor below it.
pub(crate) fn draw_row(surface: &mut Surface, theme: &LayoutTheme, row: &RowLayout, y: f32) -> f32 {
    let size = theme.metrics.body_size;
    let line_h = theme.metrics.line_height;
    for col in &row.columns {
        surface.set_color(ColorRole::Text, theme.palette.ink);
        surface.text(&col.label, col.x, y, TextStyle::bold(size));

        surface.set_color(ColorRole::Text, theme.palette.almost_black);
        let mut lines = col.lines.iter();
        if let Some(first) = lines.next() {
            surface.text(first, col.x + col.label_width + LABEL_PAD, y, TextStyle::regular(size));
        }
        for (i, line) in lines.enumerate() {
            surface.text(line, col.x, y + (i + 1) as f32 * line_h, TextStyle::regular(size));
        }
    }
    y + row.height
}
