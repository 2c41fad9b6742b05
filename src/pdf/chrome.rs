use crate::theme::{LayoutTheme, Rgb};

use super::surface::{Bounds, ColorRole, Paint, Surface, TextStyle};

/// Horizontal overdraw per band so adjacent bands leave no hairline seams.
const BAND_OVERLAP: f32 = 0.2;

/// Bands approximating a left-to-right gradient: `steps` equal slices of `w`,
/// colour interpolated linearly per channel and rounded.
pub(crate) fn gradient_bands(
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    from: Rgb,
    to: Rgb,
    steps: usize,
) -> Vec<(Bounds, Rgb)> {
    let steps = steps.max(1);
    let step_w = w / steps as f32;
    (0..steps)
        .map(|i| {
            let t = if steps > 1 {
                i as f32 / (steps - 1) as f32
            } else {
                0.0
            };
            let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
            let color = [lerp(from[0], to[0]), lerp(from[1], to[1]), lerp(from[2], to[2])];
            let band = Bounds::new(x + i as f32 * step_w, y, step_w + BAND_OVERLAP, h);
            (band, color)
        })
        .collect()
}

pub(crate) fn horizontal_gradient(
    surface: &mut Surface,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    from: Rgb,
    to: Rgb,
    steps: usize,
) {
    for (band, color) in gradient_bands(x, y, w, h, from, to, steps) {
        surface.set_color(ColorRole::Fill, color);
        surface.rect(band, Paint::Fill);
    }
}

/// Titled section header: accent bar, gradient wash, bold title on the
/// baseline `y`, then a rule. Returns the cursor for the section body.
pub(crate) fn section_title(surface: &mut Surface, theme: &LayoutTheme, y: f32, title: &str) -> f32 {
    let m = &theme.metrics;
    let p = &theme.palette;
    let left = theme.content_left();
    let bar_top = y - (m.section_bar_height - 3.0);

    let wash_x = left + m.section_bar_width;
    horizontal_gradient(
        surface,
        wash_x,
        bar_top,
        theme.content_right() - wash_x,
        m.section_bar_height,
        p.wash,
        p.page_background,
        m.gradient_steps,
    );

    surface.set_color(ColorRole::Fill, p.brand);
    surface.rect(
        Bounds::new(left, bar_top, m.section_bar_width, m.section_bar_height),
        Paint::Fill,
    );

    surface.set_color(ColorRole::Text, p.heading);
    surface.text(title, left + 5.0, y, TextStyle::bold(m.section_title_size));

    let rule_y = y + m.section_title_advance;
    surface.set_color(ColorRole::Stroke, p.gray_light);
    surface.set_line_width(m.rule_width);
    surface.line(left, rule_y, theme.content_right(), rule_y);

    rule_y + m.section_gap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_width_and_interpolate_endpoints() {
        let bands = gradient_bands(10.0, 5.0, 100.0, 8.0, [239, 246, 255], [255, 255, 255], 56);
        assert_eq!(bands.len(), 56);
        assert_eq!(bands[0].1, [239, 246, 255]);
        assert_eq!(bands[55].1, [255, 255, 255]);
        let last = bands[55].0;
        assert!((last.right() - (110.0 + BAND_OVERLAP)).abs() < 1e-3);
        for pair in bands.windows(2) {
            assert!(pair[1].0.x <= pair[0].0.right());
        }
    }

    #[test]
    fn single_band_uses_start_colour() {
        let bands = gradient_bands(0.0, 0.0, 10.0, 1.0, [0, 0, 0], [255, 255, 255], 1);
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].1, [0, 0, 0]);
    }

    #[test]
    fn gradient_is_deterministic() {
        let a = gradient_bands(3.0, 4.0, 50.0, 2.0, [10, 20, 30], [200, 100, 0], 12);
        let b = gradient_bands(3.0, 4.0, 50.0, 2.0, [10, 20, 30], [200, 100, 0], 12);
        assert_eq!(a, b);
    }

    #[test]
    fn section_title_advances_by_fixed_block() {
        let theme = LayoutTheme::default();
        let mut surface = Surface::new(theme.page_size()).unwrap();
        let next = section_title(&mut surface, &theme, 51.0, "INFORMACIÓN DEL CLIENTE");
        let m = &theme.metrics;
        assert!((next - (51.0 + m.section_title_advance + m.section_gap)).abs() < 1e-4);
    }
}
