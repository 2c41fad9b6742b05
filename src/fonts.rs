use pdf_writer::{Name, Pdf, Ref};

use crate::theme::MM_PER_PT;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Weight {
    Regular,
    Bold,
}

impl Weight {
    fn base_font(self) -> &'static [u8] {
        match self {
            Weight::Regular => b"Helvetica",
            Weight::Bold => b"Helvetica-Bold",
        }
    }

    pub(crate) fn pdf_name(self) -> &'static str {
        match self {
            Weight::Regular => "F1",
            Weight::Bold => "F2",
        }
    }
}

pub(crate) struct FontEntry {
    pub(crate) weight: Weight,
    pub(crate) font_ref: Ref,
}

pub(crate) fn register_font(pdf: &mut Pdf, weight: Weight, font_ref: Ref) -> FontEntry {
    pdf.type1_font(font_ref)
        .base_font(Name(weight.base_font()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    FontEntry { weight, font_ref }
}

/// Helvetica AFM advance widths for ASCII 32..=126 at 1000 units/em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // a-z
    334, 260, 334, 584, // {..~
];

/// Helvetica-Bold AFM advance widths for ASCII 32..=126 at 1000 units/em.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389,
    556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Accented Latin-1 letters share the advance of their base letter in Helvetica.
fn base_letter(ch: char) -> char {
    match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => ch,
    }
}

pub(crate) fn char_width_1000(weight: Weight, ch: char) -> f32 {
    let bold = weight == Weight::Bold;
    let ch = base_letter(ch);
    let code = ch as u32;
    if (32..=126).contains(&code) {
        let table = if bold {
            &HELVETICA_BOLD_WIDTHS
        } else {
            &HELVETICA_WIDTHS
        };
        return table[(code - 32) as usize] as f32;
    }
    match ch {
        '°' => 400.0,
        '•' => 350.0,
        '–' | '€' => 556.0,
        '—' | '…' => 1000.0,
        '‘' | '’' => {
            if bold {
                278.0
            } else {
                222.0
            }
        }
        '“' | '”' => {
            if bold {
                500.0
            } else {
                333.0
            }
        }
        '¡' => 333.0,
        '¿' => 611.0,
        'ª' => 370.0,
        'º' => 365.0,
        '\u{00A0}' => 278.0,
        _ if char_to_winansi(ch) == 0 => 0.0,
        _ => 556.0,
    }
}

/// Width of `text` in millimetres at `font_size` points.
pub(crate) fn text_width(text: &str, font_size: f32, weight: Weight) -> f32 {
    let units: f32 = text.chars().map(|ch| char_width_1000(weight, ch)).sum();
    units * font_size / 1000.0 * MM_PER_PT
}

/// Greedy word wrap to `max_width` millimetres. Explicit newlines always break;
/// a word wider than the line is split at character boundaries. Always returns
/// at least one line.
pub(crate) fn wrap_text(text: &str, max_width: f32, font_size: f32, weight: Weight) -> Vec<String> {
    let space_w = text_width(" ", font_size, weight);
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in paragraph.split_whitespace() {
            let ww = text_width(word, font_size, weight);
            let proposed = if current.is_empty() {
                ww
            } else {
                current_w + space_w + ww
            };
            if proposed <= max_width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_w = proposed;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_w = 0.0;
            }
            if ww <= max_width {
                current.push_str(word);
                current_w = ww;
                continue;
            }
            for ch in word.chars() {
                let cw = char_width_1000(weight, ch) * font_size / 1000.0 * MM_PER_PT;
                if !current.is_empty() && current_w + cw > max_width {
                    lines.push(std::mem::take(&mut current));
                    current_w = 0.0;
                }
                current.push(ch);
                current_w += cw;
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Characters without a WinAnsi code point are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_is_wider_than_regular() {
        let regular = text_width("Dirección", 7.2, Weight::Regular);
        let bold = text_width("Dirección", 7.2, Weight::Bold);
        assert!(bold > regular);
    }

    #[test]
    fn accented_letters_measure_as_base() {
        assert_eq!(
            text_width("Técnico", 9.0, Weight::Regular),
            text_width("Tecnico", 9.0, Weight::Regular)
        );
    }

    #[test]
    fn wrap_breaks_on_words() {
        let lines = wrap_text("uno dos tres cuatro cinco seis", 15.0, 7.2, Weight::Regular);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 7.2, Weight::Regular) <= 15.0);
        }
        assert_eq!(lines.join(" "), "uno dos tres cuatro cinco seis");
    }

    #[test]
    fn wrap_splits_overlong_word() {
        let word = "contacto@empresa-muy-larga.example.com";
        let lines = wrap_text(word, 12.0, 7.2, Weight::Regular);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn wrap_keeps_explicit_newlines() {
        let lines = wrap_text("linea uno\nlinea dos", 500.0, 7.2, Weight::Regular);
        assert_eq!(lines, vec!["linea uno".to_string(), "linea dos".to_string()]);
    }

    #[test]
    fn wrap_of_empty_text_is_one_empty_line() {
        assert_eq!(wrap_text("", 50.0, 7.2, Weight::Regular), vec![String::new()]);
    }

    #[test]
    fn winansi_drops_unmappable_chars() {
        assert_eq!(to_winansi_bytes("N°1 ✓"), vec![b'N', 0xB0, b'1', b' ']);
        assert_eq!(to_winansi_bytes("•"), vec![0x95]);
    }
}
