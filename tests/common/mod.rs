#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use certpdf::{
    Client, CompanyRepresentative, DocumentContent, Equipment, EvidenceItem, Orientation,
    RenderOptions, Signatures, Technician,
};
use chrono::NaiveDate;

pub fn png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// Clear background with one dark stroke across the middle, like a scanned
/// signature or a logo cut-out.
pub fn transparent_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |_, y| {
        if y == height / 2 {
            image::Rgba([20, 20, 20, 255])
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    });
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// Pseudo-random pixels; compresses badly, like a photo.
pub fn noise_png(width: u32, height: u32, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    let img = image::RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        image::Rgb([r, g, b])
    });
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .unwrap();
    out
}

pub fn photo(orientation: Orientation) -> EvidenceItem {
    let (w, h) = match orientation {
        Orientation::Portrait => (30, 40),
        Orientation::Landscape => (40, 30),
    };
    EvidenceItem {
        image: png(w, h, [120, 140, 160]),
        pixel_width: w,
        pixel_height: h,
        orientation: Some(orientation),
    }
}

pub fn photos(portrait: usize, landscape: usize) -> Vec<EvidenceItem> {
    let mut items: Vec<EvidenceItem> = (0..portrait).map(|_| photo(Orientation::Portrait)).collect();
    items.extend((0..landscape).map(|_| photo(Orientation::Landscape)));
    items
}

pub fn sample_content(evidence: Vec<EvidenceItem>) -> DocumentContent {
    DocumentContent {
        client: Client {
            name: Some("Minera Los Andes".into()),
            tax_id: Some("76.123.456-7".into()),
            contact: Some("Carla Díaz".into()),
            email: Some("cdiaz@losandes.cl".into()),
            address: Some("Av. Grecia 1234, Antofagasta".into()),
        },
        technician: Technician {
            name: Some("Pedro Rojas".into()),
        },
        company: CompanyRepresentative {
            name: Some("Ana Soto".into()),
            logo: Some(png(56, 28, [67, 105, 231])),
            signature: None,
        },
        maintenance_date: NaiveDate::from_ymd_opt(2025, 11, 6),
        certificate_code: Some("CCTV-0042".into()),
        system_label: None,
        equipment: Equipment {
            camera_count_ip: 12,
            camera_count_analog: 4,
            monitor_count: 2,
            nvr_label: Some("Hikvision 16ch".into()),
            dvr_label: None,
            joystick_label: Some("DS-1200KI".into()),
        },
        checklist: vec!["grabaciones".into(), "enfoques".into(), "filtros".into()],
        client_requests: Some("Revisar la cámara del acceso norte.".into()),
        observations: Some("Se recomienda ampliar el almacenamiento a 4 TB.".into()),
        signatures: Signatures {
            technician: Some(png(80, 28, [20, 20, 20])),
            representative: Some(jpeg(80, 28)),
        },
        evidence,
    }
}

pub fn options() -> RenderOptions {
    RenderOptions {
        generated_on: NaiveDate::from_ymd_opt(2025, 11, 7).unwrap(),
        ..RenderOptions::default()
    }
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

pub fn page_count(pdf: &[u8]) -> usize {
    count(pdf, b"/Type /Page") - count(pdf, b"/Type /Pages")
}

pub fn image_xobject_count(pdf: &[u8]) -> usize {
    // Soft masks are image XObjects too; the fixtures are all opaque.
    count(pdf, b"/Subtype /Image")
}

/// Decompressed page content streams, in file order.
pub fn content_streams(pdf: &[u8]) -> Vec<Vec<u8>> {
    let mut streams = Vec::new();
    let mut from = 0;
    while let Some(pos) = find(&pdf[from..], b"stream\n") {
        let start = from + pos + b"stream\n".len();
        let Some(len) = find(&pdf[start..], b"endstream") else {
            break;
        };
        let dict_from = pdf[..from + pos]
            .windows(3)
            .rposition(|w| w == b"obj")
            .unwrap_or(0);
        let dict = &pdf[dict_from..from + pos];
        let data = &pdf[start..start + len];
        if find(dict, b"/Image").is_none()
            && let Ok(raw) = miniz_oxide::inflate::decompress_to_vec_zlib(trim_eol(data))
        {
            streams.push(raw);
        }
        from = start + len + b"endstream".len();
    }
    streams
}

fn trim_eol(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\n").unwrap_or(data)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Strings shown on each page, decoded from WinAnsi.
pub fn page_text(pdf: &[u8]) -> Vec<Vec<String>> {
    content_streams(pdf).iter().map(|s| shown_strings(s)).collect()
}

fn shown_strings(content: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < content.len() {
        match content[i] {
            b'(' => {
                let mut bytes = Vec::new();
                let mut depth = 1;
                i += 1;
                while i < content.len() {
                    let b = content[i];
                    match b {
                        b'\\' => {
                            i += 1;
                            let e = content.get(i).copied().unwrap_or(b'\\');
                            if (b'0'..=b'7').contains(&e) {
                                let digits: Vec<u8> = content[i..]
                                    .iter()
                                    .take(3)
                                    .take_while(|d| (b'0'..=b'7').contains(*d))
                                    .copied()
                                    .collect();
                                let value = digits.iter().fold(0u32, |acc, d| acc * 8 + (d - b'0') as u32);
                                bytes.push(value as u8);
                                i += digits.len() - 1;
                            } else {
                                bytes.push(match e {
                                    b'n' => b'\n',
                                    b'r' => b'\r',
                                    b't' => b'\t',
                                    other => other,
                                });
                            }
                        }
                        b'(' => {
                            depth += 1;
                            bytes.push(b);
                        }
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            bytes.push(b);
                        }
                        _ => bytes.push(b),
                    }
                    i += 1;
                }
                out.push(winansi_to_string(&bytes));
            }
            b'<' if content.get(i + 1) != Some(&b'<') => {
                let end = content[i..].iter().position(|&b| b == b'>').map(|p| i + p);
                let Some(end) = end else { break };
                let hex: Vec<u8> = content[i + 1..end]
                    .iter()
                    .copied()
                    .filter(|b| b.is_ascii_hexdigit())
                    .collect();
                let bytes: Vec<u8> = hex
                    .chunks(2)
                    .filter_map(|pair| {
                        let s = std::str::from_utf8(pair).ok()?;
                        u8::from_str_radix(&format!("{s:0<2}"), 16).ok()
                    })
                    .collect();
                out.push(winansi_to_string(&bytes));
                i = end;
            }
            _ => {}
        }
        i += 1;
    }
    out
}

fn winansi_to_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x95 => '•',
            0x96 => '–',
            0x97 => '—',
            0x80 => '€',
            _ => b as char,
        })
        .collect()
}

pub fn output_path(name: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output");
    fs::create_dir_all(&dir).ok();
    dir.join(name)
}

pub fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn log_csv(csv_name: &str, header: &str, row: &str) {
    let csv_path = PathBuf::from("tests/output").join(csv_name);
    fs::create_dir_all("tests/output").ok();
    let write_header = !csv_path.exists();
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&csv_path)
        .expect("Cannot open CSV file");
    if write_header {
        writeln!(file, "{header}").unwrap();
    }
    writeln!(file, "{row}").unwrap();
}

pub fn human_size(bytes: usize) -> String {
    if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.0}kB", bytes as f64 / 1_000.0)
    } else {
        format!("{bytes}B")
    }
}

/// Fresh per-process scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("certpdf-{}-{name}", std::process::id()));
    fs::remove_dir_all(&dir).ok();
    fs::create_dir_all(&dir).unwrap();
    dir
}
