use crate::fonts::Weight;
use crate::images::Prepared;
use crate::theme::LayoutTheme;

use super::evidence::contain_fit;
use super::surface::{Bounds, ColorRole, Placed, Skipped, Surface, TextStyle};

const LOGO_W: f32 = 28.0;
const LOGO_H: f32 = 14.0;
const TITLE_SIZE: f32 = 14.0;
const SUBTITLE_SIZE: f32 = 10.5;
const META_SIZE: f32 = 9.0;
const FOOTER_SIZE: f32 = 8.0;

/// Everything the page chrome prints. Identical for every page of a document.
pub(crate) struct Chrome<'s, 'a> {
    pub(crate) title: &'s str,
    pub(crate) subtitle: &'s str,
    pub(crate) date_text: &'s str,
    pub(crate) code_text: &'s str,
    pub(crate) generated_text: &'s str,
    pub(crate) organization_line: &'s str,
    pub(crate) logo: Option<&'s Prepared<'a>>,
}

/// Draws the page header and reports how the logo went, if there is one.
pub(crate) fn header(
    surface: &mut Surface,
    theme: &LayoutTheme,
    chrome: &Chrome,
) -> Option<Result<Placed, Skipped>> {
    let p = &theme.palette;
    let m = theme.margin;
    let left = theme.content_left();
    let right = theme.content_right();
    let center = theme.page_width() / 2.0;

    let logo = chrome.logo.map(|logo| {
        let slot = Bounds::new(left, m - 2.0, LOGO_W, LOGO_H);
        surface.image(&logo.bytes, contain_fit(slot, logo.dimensions))
    });

    surface.set_color(ColorRole::Text, p.almost_black);
    surface.text(chrome.title, center, m + 6.0, TextStyle::bold(TITLE_SIZE).centered());
    surface.set_color(ColorRole::Text, p.subtitle);
    surface.text(chrome.subtitle, center, m + 11.5, TextStyle::bold(SUBTITLE_SIZE).centered());

    surface.set_color(ColorRole::Stroke, p.gray_light);
    surface.set_line_width(theme.metrics.rule_width);
    surface.line(left, m + 15.0, right, m + 15.0);

    let meta_y = m + 21.0;
    surface.set_color(ColorRole::Text, p.almost_black);

    let date_label = "Fecha Mantenimiento:";
    let date_label_w = surface.measure_text(date_label, META_SIZE, Weight::Bold);
    surface.text(date_label, left, meta_y, TextStyle::bold(META_SIZE));
    surface.text(chrome.date_text, left + date_label_w + 2.0, meta_y, TextStyle::regular(META_SIZE));

    let code_label = "Certificado N°:";
    let code_w = surface.measure_text(chrome.code_text, META_SIZE, Weight::Regular);
    surface.text(code_label, right - code_w - 3.0, meta_y, TextStyle::bold(META_SIZE).right());
    surface.text(chrome.code_text, right, meta_y, TextStyle::regular(META_SIZE).right());

    surface.line(left, meta_y + 6.0, right, meta_y + 6.0);

    logo
}

pub(crate) fn footer(surface: &mut Surface, theme: &LayoutTheme, chrome: &Chrome) {
    let footer_y = theme.footer_top();
    let center = theme.page_width() / 2.0;

    surface.set_color(ColorRole::Stroke, theme.palette.frame);
    surface.set_line_width(theme.metrics.rule_width);
    surface.line(theme.content_left(), footer_y, theme.content_right(), footer_y);

    surface.set_color(ColorRole::Text, theme.palette.subtitle);
    surface.text(
        &validation_line(chrome.generated_text, chrome.code_text),
        center,
        footer_y + 5.0,
        TextStyle::regular(FOOTER_SIZE).centered(),
    );
    surface.set_color(ColorRole::Text, theme.palette.footer_contact);
    surface.text(
        chrome.organization_line,
        center,
        footer_y + 10.0,
        TextStyle::regular(FOOTER_SIZE).centered(),
    );
}

pub(crate) fn validation_line(generated: &str, code: &str) -> String {
    format!(
        "Generado el: {generated} | Puede validar este certificado en nuestra web usando este código: {code}"
    )
}
