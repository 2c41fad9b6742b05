use std::borrow::Cow;

use chrono::{Datelike, NaiveDate};

pub const PLACEHOLDER: &str = "-";

#[derive(Clone, Debug, Default)]
pub struct Client {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Technician {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CompanyRepresentative {
    pub name: Option<String>,
    pub logo: Option<Vec<u8>>,
    pub signature: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default)]
pub struct Equipment {
    pub camera_count_ip: u32,
    pub camera_count_analog: u32,
    pub monitor_count: u32,
    pub nvr_label: Option<String>,
    pub dvr_label: Option<String>,
    pub joystick_label: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Signatures {
    pub technician: Option<Vec<u8>>,
    pub representative: Option<Vec<u8>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Taller-than-wide is portrait; square and wider are landscape.
    pub fn from_dimensions(width: u32, height: u32) -> Orientation {
        if height > width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

/// One photographic attachment. `pixel_width`/`pixel_height` may be 0 when
/// unknown; `orientation` may be omitted and is then derived from the pixels.
#[derive(Clone, Debug, Default)]
pub struct EvidenceItem {
    pub image: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub orientation: Option<Orientation>,
}

/// Everything printed on one certificate. Built by the caller, never mutated
/// by rendering.
#[derive(Clone, Debug, Default)]
pub struct DocumentContent {
    pub client: Client,
    pub technician: Technician,
    pub company: CompanyRepresentative,
    pub maintenance_date: Option<NaiveDate>,
    pub certificate_code: Option<String>,
    /// Subtitle under the document title.
    pub system_label: Option<String>,
    pub equipment: Equipment,
    /// Checklist keys in the order they were ticked.
    pub checklist: Vec<String>,
    pub client_requests: Option<String>,
    pub observations: Option<String>,
    pub signatures: Signatures,
    pub evidence: Vec<EvidenceItem>,
}

const CHECKLIST_LABELS: &[(&str, &str)] = &[
    ("grabaciones", "Grabaciones"),
    ("limpieza_camaras", "Limpieza de cámaras"),
    ("fecha_hora", "Fecha y hora"),
    ("enfoques", "Enfoques"),
    ("configuraciones", "Configuraciones"),
    ("filtros", "Filtros"),
    ("revision_cables", "Revisión de cables y conectores"),
    ("revision_almacenamiento", "Revisión de almacenamiento"),
];

/// Label for a checklist key; unknown keys print as themselves.
pub fn checklist_label(key: &str) -> &str {
    CHECKLIST_LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
        .unwrap_or(key)
}

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// `6 de noviembre de 2025`
pub fn long_date_es(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        MONTHS_ES[date.month0() as usize],
        date.year()
    )
}

/// `6/11/2025`
pub fn short_date_es(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

/// Deterministic artifact name for a certificate code. Characters outside
/// `[A-Za-z0-9_-]` become `_`; a blank code yields `CERT.pdf`.
pub fn certificate_filename(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return "CERT.pdf".to_string();
    }
    let stem: String = trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.pdf")
}

fn text_or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_empty_image(image: Option<&Vec<u8>>) -> Option<Cow<'_, [u8]>> {
    image
        .filter(|bytes| !bytes.is_empty())
        .map(|bytes| Cow::Borrowed(bytes.as_slice()))
}

pub(crate) struct ResolvedEvidence<'a> {
    pub(crate) image: Cow<'a, [u8]>,
    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,
    /// Declared, or derived from declared pixel dimensions; `None` when both
    /// are missing and the image itself has to be measured.
    pub(crate) orientation: Option<Orientation>,
}

impl ResolvedEvidence<'_> {
    /// Declared pixel dimensions, if both are known.
    pub(crate) fn declared_dimensions(&self) -> Option<(u32, u32)> {
        (self.pixel_width > 0 && self.pixel_height > 0).then_some((self.pixel_width, self.pixel_height))
    }
}

/// Content with every default applied: text fields hold `-` when absent,
/// optional blocks are `None` when blank, checklist keys are deduplicated.
/// Renderers only ever see this form.
pub(crate) struct ResolvedContent<'a> {
    pub(crate) client_name: String,
    pub(crate) client_tax_id: String,
    pub(crate) client_contact: String,
    pub(crate) client_email: String,
    pub(crate) client_address: String,
    pub(crate) technician_name: String,
    pub(crate) representative_name: String,
    pub(crate) logo: Option<Cow<'a, [u8]>>,
    pub(crate) date_text: String,
    pub(crate) code_text: String,
    pub(crate) system_label: String,
    pub(crate) camera_count_ip: u32,
    pub(crate) camera_count_analog: u32,
    pub(crate) monitor_count: u32,
    /// Only the auxiliary tags that carry a value, in NVR, DVR, JOYSTICK order.
    pub(crate) equipment_tags: Vec<(&'static str, String)>,
    pub(crate) checklist: Vec<String>,
    pub(crate) client_requests: Option<String>,
    pub(crate) observations: Option<String>,
    pub(crate) technician_signature: Option<Cow<'a, [u8]>>,
    pub(crate) representative_signature: Option<Cow<'a, [u8]>>,
    pub(crate) evidence: Vec<ResolvedEvidence<'a>>,
    pub(crate) filename: String,
}

impl DocumentContent {
    pub(crate) fn resolve(&self) -> ResolvedContent<'_> {
        let eq = &self.equipment;
        let equipment_tags: Vec<(&'static str, String)> = [
            ("NVR", eq.nvr_label.as_deref()),
            ("DVR", eq.dvr_label.as_deref()),
            ("JOYSTICK", eq.joystick_label.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| non_blank(value).map(|v| (label, v)))
        .collect();

        let mut seen: Vec<&str> = Vec::with_capacity(self.checklist.len());
        for key in &self.checklist {
            let key = key.trim();
            if !key.is_empty() && !seen.contains(&key) {
                seen.push(key);
            }
        }
        let checklist: Vec<String> = seen
            .iter()
            .map(|key| checklist_label(key).to_string())
            .collect();

        let evidence = self
            .evidence
            .iter()
            .map(|item| ResolvedEvidence {
                image: Cow::Borrowed(item.image.as_slice()),
                pixel_width: item.pixel_width,
                pixel_height: item.pixel_height,
                orientation: item.orientation.or_else(|| {
                    (item.pixel_width > 0 && item.pixel_height > 0)
                        .then(|| Orientation::from_dimensions(item.pixel_width, item.pixel_height))
                }),
            })
            .collect();

        let code = self.certificate_code.as_deref().unwrap_or("");

        ResolvedContent {
            client_name: text_or_dash(self.client.name.as_deref()),
            client_tax_id: text_or_dash(self.client.tax_id.as_deref()),
            client_contact: text_or_dash(self.client.contact.as_deref()),
            client_email: text_or_dash(self.client.email.as_deref()),
            client_address: text_or_dash(self.client.address.as_deref()),
            technician_name: text_or_dash(self.technician.name.as_deref()),
            representative_name: text_or_dash(self.company.name.as_deref()),
            logo: non_empty_image(self.company.logo.as_ref()),
            date_text: self
                .maintenance_date
                .map(long_date_es)
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            code_text: text_or_dash(Some(code)),
            system_label: non_blank(self.system_label.as_deref())
                .unwrap_or_else(|| "SISTEMA CCTV".to_string()),
            camera_count_ip: eq.camera_count_ip,
            camera_count_analog: eq.camera_count_analog,
            monitor_count: eq.monitor_count,
            equipment_tags,
            checklist,
            client_requests: non_blank(self.client_requests.as_deref()),
            observations: non_blank(self.observations.as_deref()),
            technician_signature: non_empty_image(self.signatures.technician.as_ref()),
            representative_signature: non_empty_image(
                self.signatures
                    .representative
                    .as_ref()
                    .or(self.company.signature.as_ref()),
            ),
            evidence,
            filename: certificate_filename(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_resolve_to_placeholder() {
        let content = DocumentContent {
            client: Client {
                name: Some("   ".into()),
                email: Some("ops@example.com".into()),
                ..Client::default()
            },
            ..DocumentContent::default()
        };
        let resolved = content.resolve();
        assert_eq!(resolved.client_name, "-");
        assert_eq!(resolved.client_email, "ops@example.com");
        assert_eq!(resolved.code_text, "-");
        assert_eq!(resolved.date_text, "-");
        assert!(resolved.client_requests.is_none());
        assert!(resolved.equipment_tags.is_empty());
    }

    #[test]
    fn checklist_keeps_first_occurrence_order() {
        let content = DocumentContent {
            checklist: vec![
                "enfoques".into(),
                "grabaciones".into(),
                "enfoques".into(),
                "bateria_respaldo".into(),
            ],
            ..DocumentContent::default()
        };
        assert_eq!(
            content.resolve().checklist,
            vec!["Enfoques", "Grabaciones", "bateria_respaldo"]
        );
    }

    #[test]
    fn orientation_derived_when_absent() {
        let content = DocumentContent {
            evidence: vec![
                EvidenceItem {
                    pixel_width: 600,
                    pixel_height: 800,
                    ..EvidenceItem::default()
                },
                EvidenceItem {
                    pixel_width: 800,
                    pixel_height: 800,
                    ..EvidenceItem::default()
                },
                EvidenceItem {
                    pixel_width: 600,
                    pixel_height: 800,
                    orientation: Some(Orientation::Landscape),
                    ..EvidenceItem::default()
                },
                EvidenceItem::default(),
            ],
            ..DocumentContent::default()
        };
        let orientations: Vec<Option<Orientation>> = content
            .resolve()
            .evidence
            .iter()
            .map(|e| e.orientation)
            .collect();
        assert_eq!(
            orientations,
            vec![
                Some(Orientation::Portrait),
                Some(Orientation::Landscape),
                Some(Orientation::Landscape),
                None
            ]
        );
    }

    #[test]
    fn dates_format_in_spanish() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 6).unwrap();
        assert_eq!(long_date_es(date), "6 de noviembre de 2025");
        assert_eq!(short_date_es(date), "6/11/2025");
    }

    #[test]
    fn filename_is_sanitized_and_never_empty() {
        assert_eq!(certificate_filename("CCTV-0042"), "CCTV-0042.pdf");
        assert_eq!(certificate_filename("A/B 7"), "A_B_7.pdf");
        assert_eq!(certificate_filename(""), "CERT.pdf");
        assert_eq!(certificate_filename("  "), "CERT.pdf");
    }

    #[test]
    fn equipment_tags_skip_blank_labels() {
        let content = DocumentContent {
            equipment: Equipment {
                nvr_label: Some("Hikvision 8ch".into()),
                dvr_label: Some(" ".into()),
                joystick_label: Some("DS-1200".into()),
                ..Equipment::default()
            },
            ..DocumentContent::default()
        };
        let tags = content.resolve().equipment_tags;
        assert_eq!(
            tags,
            vec![
                ("NVR", "Hikvision 8ch".to_string()),
                ("JOYSTICK", "DS-1200".to_string())
            ]
        );
    }
}
