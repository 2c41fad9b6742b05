//! JSON manifest for the command-line front end.
//!
//! Field names are camelCase. Image fields hold either a path, resolved
//! relative to the manifest's directory, or a `data:image/...;base64,` URL.
//! Anything that cannot be read is logged and treated as absent, the same way
//! the renderer treats a missing field.

use std::path::Path;

use base64::Engine;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Error;
use crate::model::{
    Client, CompanyRepresentative, DocumentContent, Equipment, EvidenceItem, Orientation,
    Signatures, Technician,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Manifest {
    client: ManifestClient,
    technician: ManifestTechnician,
    company: ManifestCompany,
    maintenance_date: Option<String>,
    certificate_code: Option<String>,
    system_label: Option<String>,
    equipment: ManifestEquipment,
    checklist: Vec<String>,
    client_requests: Option<String>,
    observations: Option<String>,
    signatures: ManifestSignatures,
    evidence: Vec<ManifestEvidence>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ManifestClient {
    name: Option<String>,
    tax_id: Option<String>,
    contact: Option<String>,
    email: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestTechnician {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestCompany {
    name: Option<String>,
    logo: Option<String>,
    signature: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ManifestEquipment {
    #[serde(alias = "cameraCountIP")]
    camera_count_ip: u32,
    camera_count_analog: u32,
    monitor_count: u32,
    nvr_label: Option<String>,
    dvr_label: Option<String>,
    joystick_label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestSignatures {
    technician: Option<String>,
    representative: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ManifestEvidence {
    image: String,
    pixel_width: u32,
    pixel_height: u32,
    orientation: Option<String>,
}

pub fn load_manifest(path: &Path) -> Result<DocumentContent, Error> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| Error::Manifest(format!("{}: {e}", path.display())))?;
    let base = path.parent().unwrap_or(Path::new("."));
    parse_manifest(&json, base)
}

/// Parse manifest JSON; relative image paths are resolved against `base_dir`.
pub fn parse_manifest(json: &str, base_dir: &Path) -> Result<DocumentContent, Error> {
    let m: Manifest = serde_json::from_str(json).map_err(|e| Error::Manifest(e.to_string()))?;

    let evidence = m
        .evidence
        .iter()
        .enumerate()
        .map(|(i, ev)| EvidenceItem {
            image: load_image(&ev.image, base_dir, &format!("evidence[{i}]")).unwrap_or_default(),
            pixel_width: ev.pixel_width,
            pixel_height: ev.pixel_height,
            orientation: ev.orientation.as_deref().and_then(parse_orientation),
        })
        .collect();

    Ok(DocumentContent {
        client: Client {
            name: m.client.name,
            tax_id: m.client.tax_id,
            contact: m.client.contact,
            email: m.client.email,
            address: m.client.address,
        },
        technician: Technician {
            name: m.technician.name,
        },
        company: CompanyRepresentative {
            name: m.company.name,
            logo: optional_image(m.company.logo.as_deref(), base_dir, "company.logo"),
            signature: optional_image(m.company.signature.as_deref(), base_dir, "company.signature"),
        },
        maintenance_date: m.maintenance_date.as_deref().and_then(parse_date),
        certificate_code: m.certificate_code,
        system_label: m.system_label,
        equipment: Equipment {
            camera_count_ip: m.equipment.camera_count_ip,
            camera_count_analog: m.equipment.camera_count_analog,
            monitor_count: m.equipment.monitor_count,
            nvr_label: m.equipment.nvr_label,
            dvr_label: m.equipment.dvr_label,
            joystick_label: m.equipment.joystick_label,
        },
        checklist: m.checklist,
        client_requests: m.client_requests,
        observations: m.observations,
        signatures: Signatures {
            technician: optional_image(m.signatures.technician.as_deref(), base_dir, "signatures.technician"),
            representative: optional_image(
                m.signatures.representative.as_deref(),
                base_dir,
                "signatures.representative",
            ),
        },
        evidence,
    })
}

/// `YYYY-MM-DD`, optionally followed by a time part, which is ignored.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split(['T', ' ']).next().unwrap_or("");
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            log::warn!("maintenanceDate {raw:?} not understood ({e}); printing as missing");
            None
        }
    }
}

fn parse_orientation(raw: &str) -> Option<Orientation> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "portrait" | "vertical" => Some(Orientation::Portrait),
        "landscape" | "horizontal" => Some(Orientation::Landscape),
        other => {
            log::warn!("unknown orientation {other:?}; deriving from pixels");
            None
        }
    }
}

fn optional_image(src: Option<&str>, base_dir: &Path, field: &str) -> Option<Vec<u8>> {
    src.filter(|s| !s.trim().is_empty())
        .and_then(|s| load_image(s, base_dir, field))
}

fn load_image(src: &str, base_dir: &Path, field: &str) -> Option<Vec<u8>> {
    let src = src.trim();
    if src.is_empty() {
        log::warn!("{field}: no image given");
        return None;
    }
    let loaded = if src.starts_with("data:") {
        decode_data_url(src)
    } else {
        std::fs::read(base_dir.join(src)).map_err(|e| format!("{src}: {e}"))
    };
    match loaded {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("{field}: {e}; left out");
            None
        }
    }
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, String> {
    let Some((meta, payload)) = url.split_once(',') else {
        return Err("data URL without payload".to_string());
    };
    if !meta.ends_with(";base64") {
        return Err(format!("unsupported data URL encoding: {meta}"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}
